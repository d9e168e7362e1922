//! Runtime values.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::callable::LoxFunction;
use crate::class::{LoxClass, LoxInstance};

/// Every value a ferrolox program can produce or store.
///
/// The `Superclasses` and `Uninit` variants are internal plumbing: the first
/// lives only in the synthetic `super` slot injected around method bodies,
/// the second only in slots of `var` declarations without an initializer.
/// Neither is ever observable from interpreted code.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,

    Bool(bool),

    Number(f64),

    String(String),

    /// Host-provided builtin.  A plain fn pointer keeps the variant `Clone`
    /// and comparable without allocation.
    NativeFunction {
        name: &'static str,
        arity: usize,
        func: fn(&[Value]) -> Result<Value, String>,
    },

    /// User-defined function or bound method.
    Function(Rc<LoxFunction>),

    Class(Rc<LoxClass>),

    Instance(Rc<RefCell<LoxInstance>>),

    /// Ordered superclass list bound to the synthetic `super` slot.
    Superclasses(Rc<Vec<Rc<LoxClass>>>),

    /// Sentinel stored by `var x;` until the first assignment.
    Uninit,
}

impl Value {
    /// Name reported by the native `type` builtin.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::NativeFunction { .. } => "native function",
            Value::Function(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
            Value::Superclasses(_) | Value::Uninit => "internal",
        }
    }
}

impl PartialEq for Value {
    /// Value equality with no type coercion: primitives compare by value,
    /// functions, classes and instances by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (
                Value::NativeFunction { func: a, .. },
                Value::NativeFunction { func: b, .. },
            ) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::NativeFunction { name, .. } => write!(f, "<native fn {}>", name),

            Value::Function(fun) => write!(f, "{}", fun),

            Value::Class(class) => write!(f, "<class {}>", class.name()),

            Value::Instance(instance) => {
                write!(f, "<instance {}>", instance.borrow().class_name())
            }

            // Internal variants; unreachable from interpreted code.
            Value::Superclasses(_) => write!(f, "<superclasses>"),
            Value::Uninit => write!(f, "nil"),
        }
    }
}
