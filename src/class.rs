//! Classes and instances.
//!
//! A class value plays two roles: it is a callable (instantiation) and it is
//! its own "instance" for static member access, answering the same get/set
//! contract instances do.  Method and static lookup walk the superclass list
//! in declaration order and return the first match; there is no linearization
//! or diamond merge.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::callable::LoxFunction;
use crate::error::{LoxError, Result};
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

pub struct LoxClass {
    name: String,

    /// Ordered as declared; the order is significant for method lookup and
    /// for the `super(Name)` index map.
    superclasses: Vec<Rc<LoxClass>>,

    methods: HashMap<String, Rc<LoxFunction>>,

    /// Static methods, reached through the class value itself.
    statics: HashMap<String, Rc<LoxFunction>>,

    /// The class's *own* `init`, cached at construction.
    initializer: Option<Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclasses: Vec<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
        statics: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        let initializer = methods.get("init").cloned();

        LoxClass {
            name,
            superclasses,
            methods,
            statics,
            initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The class's own method if present, else the first match walking the
    /// superclasses in declaration order (depth first).
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclasses
            .iter()
            .find_map(|superclass| superclass.find_method(name))
    }

    /// Same first-match walk as [`Self::find_method`], over the static tables.
    fn find_static(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(function) = self.statics.get(name) {
            return Some(Rc::clone(function));
        }

        self.superclasses
            .iter()
            .find_map(|superclass| superclass.find_static(name))
    }

    /// Static member read: the class acting as its own instance.
    pub fn get_static(&self, name: &Token) -> Result<Value> {
        self.find_static(&name.lexeme)
            .map(Value::Function)
            .ok_or_else(|| {
                LoxError::runtime(
                    name.line,
                    format!("Undefined property '{}'.", name.lexeme),
                )
            })
    }

    /// Instantiate: allocate a fresh instance, then run constructors.
    ///
    /// With an own `init`, that one runs, bound to the new instance.  Without
    /// one, *every* initializer found on the declared superclasses runs in
    /// order, each bound to the instance, and each must match the argument
    /// count exactly.  Initializer return values are discarded; the instance
    /// is the only observable result.
    pub fn instantiate(
        class: &Rc<LoxClass>,
        interpreter: &mut Interpreter,
        paren: &Token,
        arguments: &[Value],
    ) -> Result<Value> {
        debug!("Instantiating class {}", class.name);

        let instance = Value::Instance(Rc::new(RefCell::new(LoxInstance::new(Rc::clone(class)))));

        if let Some(initializer) = &class.initializer {
            if arguments.len() != initializer.arity() {
                return Err(LoxError::runtime(
                    paren.line,
                    format!(
                        "Expected {} arguments but got {}.",
                        initializer.arity(),
                        arguments.len()
                    ),
                ));
            }

            initializer.bind(instance.clone()).call(interpreter, arguments)?;
        } else {
            for superclass in &class.superclasses {
                let Some(initializer) = superclass.find_method("init") else {
                    continue;
                };

                if arguments.len() != initializer.arity() {
                    return Err(LoxError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {} for initializer of superclass '{}'.",
                            initializer.arity(),
                            arguments.len(),
                            superclass.name
                        ),
                    ));
                }

                initializer.bind(instance.clone()).call(interpreter, arguments)?;
            }
        }

        Ok(instance)
    }
}

impl fmt::Debug for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxClass")
            .field("name", &self.name)
            .field("superclasses", &self.superclasses.len())
            .field("methods", &self.methods.len())
            .field("statics", &self.statics.len())
            .finish()
    }
}

/// A class instance: its owning class plus a dynamic field table.
#[derive(Debug)]
pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    /// Property read: own field first, else a method bound to this instance,
    /// else "undefined property".
    ///
    /// Takes the `Rc` rather than `&self` because binding a method needs a
    /// handle to the receiver.
    pub fn get(instance: &Rc<RefCell<LoxInstance>>, name: &Token) -> Result<Value> {
        if let Some(value) = instance.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        let class = Rc::clone(&instance.borrow().class);
        if let Some(method) = class.find_method(&name.lexeme) {
            let bound = method.bind(Value::Instance(Rc::clone(instance)));
            return Ok(Value::Function(Rc::new(bound)));
        }

        Err(LoxError::runtime(
            name.line,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    /// Property write.  Fields need no declaration, so this cannot fail.
    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}
