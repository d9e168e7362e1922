//! User-defined functions and the closure machinery.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::environment::Environment;
use crate::error::Result;
use crate::expr::FunctionExpr;
use crate::interpreter::{Flow, Interpreter};
use crate::value::Value;

/// A function value: a declaration plus the frame that was active when the
/// value was created.  Methods are ordinary `LoxFunction`s whose closure gains
/// one extra `this` frame through [`LoxFunction::bind`].
#[derive(Debug)]
pub struct LoxFunction {
    declaration: Rc<FunctionExpr>,

    /// Captured defining frame; `None` for values created at the top level.
    closure: Option<Rc<RefCell<Environment>>>,

    /// Initializers ignore any returned value and always yield the bound
    /// instance instead.
    is_initializer: bool,

    /// Declared name, if any; anonymous function literals have none.
    name: Option<String>,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionExpr>,
        closure: Option<Rc<RefCell<Environment>>>,
        is_initializer: bool,
        name: Option<String>,
    ) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
            name,
        }
    }

    /// Number of declared parameters.  The call site checks this for an exact
    /// match before invoking.
    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    pub fn is_initializer(&self) -> bool {
        self.is_initializer
    }

    /// A copy of this function whose closure is a fresh single-slot frame
    /// holding `this = instance`, chained onto the original closure.  The same
    /// method body serves every instance; each bound copy closes over a
    /// different receiver.
    pub fn bind(&self, instance: Value) -> LoxFunction {
        debug!("Binding {} to {}", self, instance);

        let mut frame = Environment::with_enclosing(self.closure.clone());
        frame.define(instance);

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: Some(Rc::new(RefCell::new(frame))),
            is_initializer: self.is_initializer,
            name: self.name.clone(),
        }
    }

    /// Execute the body in a new frame chained onto the captured closure.
    ///
    /// Parameters are defined positionally, in declared order, so their slot
    /// indices match the resolver's view of the parameter scope.  Arity has
    /// already been checked by the call site.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: &[Value]) -> Result<Value> {
        debug!("Calling {} with {} argument(s)", self, arguments.len());

        let mut frame = Environment::with_enclosing(self.closure.clone());
        for argument in arguments {
            frame.define(argument.clone());
        }
        let frame = Rc::new(RefCell::new(frame));

        let flow = interpreter.execute_block(&self.declaration.body, frame)?;

        let value = match flow {
            Flow::Return(value) if !self.is_initializer => value,
            Flow::Normal if !self.is_initializer => Value::Nil,

            // Initializers yield the bound instance, whether the body returned
            // explicitly or fell off the end.
            Flow::Return(_) | Flow::Normal => self.bound_receiver(),

            // The resolver rejects `break` outside a loop, and a loop never
            // spans a function boundary.
            Flow::Break => unreachable!("break signal escaped a function body"),
        };

        Ok(value)
    }

    /// The `this` slot of the frame injected by [`LoxFunction::bind`].
    fn bound_receiver(&self) -> Value {
        let closure = self
            .closure
            .as_ref()
            .expect("initializer invoked without a bound receiver");

        Environment::get_at(closure, 0, 0)
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "<fun {}>", name),
            None => write!(f, "<fun>"),
        }
    }
}
