//! Tree-walking evaluator.
//!
//! Executes a resolved AST.  Locals are reached through the binding table the
//! resolver filled in ([`Interpreter::resolve`]): (depth, slot) pairs that
//! index directly into the frame chain with no hashing.  Names without a
//! binding are globals and go through the flat name-keyed table, which is the
//! only lookup path the REPL's incremental redefinition keeps safe.
//!
//! Control transfer for `return` and `break` rides on [`Flow`], an explicit
//! signal threaded through statement execution.  It is deliberately not an
//! error: runtime errors unwind to the top-level statement loop, while a
//! `break` is consumed by the nearest loop and a `return` by the nearest call.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::callable::LoxFunction;
use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::expr::{Expr, NodeId};
use crate::natives;
use crate::stmt::{FunDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Resolved coordinates of a local variable occurrence: walk `depth`
/// enclosing links, then index slot `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub depth: usize,
    pub slot: usize,
}

/// Outcome of executing one statement.
///
/// `Break` and `Return` are non-local exits, not errors; each statement
/// executor propagates them outward until a loop (for `Break`) or a call
/// frame (for `Return`) consumes them.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Break,
    Return(Value),
}

pub struct Interpreter {
    /// Top-level bindings, name-keyed.  Never slotted: the REPL may redefine
    /// any global at any time.
    globals: HashMap<String, Value>,

    /// Innermost frame, or `None` between frames at the top level.
    environment: Option<Rc<RefCell<Environment>>>,

    /// Binding table produced by the resolver.  Read-only during evaluation.
    locals: HashMap<NodeId, Binding>,

    /// Sink for `print`; stdout in production, a capture buffer in tests.
    output: Box<dyn Write>,
}

impl Interpreter {
    /// An interpreter printing to stdout, with the native catalog installed.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// An interpreter printing to the given sink.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let mut globals = HashMap::new();
        natives::install(&mut globals);

        Self {
            globals,
            environment: None,
            locals: HashMap::new(),
            output,
        }
    }

    /// Record a resolved local.  Called by the resolver; later fragments of a
    /// REPL session extend the same table (node ids never repeat).
    pub fn resolve(&mut self, id: NodeId, depth: usize, slot: usize) {
        self.locals.insert(id, Binding { depth, slot });
    }

    /// Interpret a resolved program.  Either runs to completion or stops at
    /// the first runtime error, leaving the interpreter reusable for the next
    /// REPL line.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statement(s)", statements.len());

        for statement in statements {
            match self.execute(statement)? {
                Flow::Normal => {}
                Flow::Break | Flow::Return(_) => {
                    unreachable!("non-local exit escaped to the top level")
                }
            }
        }

        self.output.flush()?;
        info!("Interpretation completed successfully");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                debug!("Printing value: {}", value);
                writeln!(self.output, "{}", value)?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    // Reading this sentinel is a runtime error; assigning
                    // over it is the normal first write.
                    None => Value::Uninit,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.define_variable(name, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let frame = Rc::new(RefCell::new(Environment::with_enclosing(
                    self.environment.clone(),
                )));
                self.execute_block(statements, frame)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    match self.execute(body)? {
                        Flow::Normal => {}
                        // Consumed here; a break never travels past the
                        // innermost loop.
                        Flow::Break => break,
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Break { .. } => Ok(Flow::Break),

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Return signal with value {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::FunDef(FunDecl { name, function }) => {
                let function = LoxFunction::new(
                    Rc::clone(function),
                    self.environment.clone(),
                    false,
                    Some(name.lexeme.clone()),
                );

                debug!("Defining function '{}'", name.lexeme);
                self.define_variable(name, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Class {
                id,
                name,
                superclasses,
                methods,
                statics,
            } => self.execute_class(*id, name, superclasses, methods, statics),
        }
    }

    /// Execute `statements` inside `frame`, restoring the previous frame on
    /// every exit path (normal, break, return, or error).
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        frame: Rc<RefCell<Environment>>,
    ) -> Result<Flow> {
        let previous = self.environment.replace(frame);

        let mut outcome = Ok(Flow::Normal);
        for statement in statements {
            match self.execute(statement) {
                Ok(Flow::Normal) => {}
                other => {
                    outcome = other;
                    break;
                }
            }
        }

        self.environment = previous;
        outcome
    }

    fn execute_class(
        &mut self,
        id: NodeId,
        name: &Token,
        superclass_exprs: &[Expr],
        methods: &[FunDecl],
        statics: &[FunDecl],
    ) -> Result<Flow> {
        debug!("Declaring class '{}'", name.lexeme);

        let mut superclasses = Vec::with_capacity(superclass_exprs.len());
        for expr in superclass_exprs {
            match self.evaluate(expr)? {
                Value::Class(class) => superclasses.push(class),
                other => {
                    return Err(LoxError::runtime(
                        expr.line(),
                        format!("Superclass must be a class, got {}.", other.type_name()),
                    ));
                }
            }
        }

        // Reserve the binding first so the slot index agrees with the
        // resolver; the real class value lands below.
        self.define_variable(name, Value::Nil);

        // Method closures capture a frame whose slot 0 holds the ordered
        // superclass list; `super` expressions resolve into it.
        let previous = self.environment.clone();
        if !superclasses.is_empty() {
            let mut frame = Environment::with_enclosing(self.environment.clone());
            frame.define(Value::Superclasses(Rc::new(superclasses.clone())));
            self.environment = Some(Rc::new(RefCell::new(frame)));
        }

        let mut method_table = HashMap::new();
        for decl in methods {
            let is_initializer = decl.name.lexeme == "init";
            let function = LoxFunction::new(
                Rc::clone(&decl.function),
                self.environment.clone(),
                is_initializer,
                Some(decl.name.lexeme.clone()),
            );
            method_table.insert(decl.name.lexeme.clone(), Rc::new(function));
        }

        let mut static_table = HashMap::new();
        for decl in statics {
            let function = LoxFunction::new(
                Rc::clone(&decl.function),
                self.environment.clone(),
                false,
                Some(format!("{}.{}", name.lexeme, decl.name.lexeme)),
            );
            static_table.insert(decl.name.lexeme.clone(), Rc::new(function));
        }

        self.environment = previous;

        let class = LoxClass::new(
            name.lexeme.clone(),
            superclasses,
            method_table,
            static_table,
        );

        self.store_variable(id, name, Value::Class(Rc::new(class)));
        Ok(Flow::Normal)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(token) => self.evaluate_literal(token),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                // Short-circuit: the unneeded side is never evaluated.
                let take_left = match operator.token_type {
                    TokenType::OR => is_truthy(&left),
                    TokenType::AND => !is_truthy(&left),
                    _ => unreachable!("parser produced a non-logical operator"),
                };

                if take_left {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.evaluate(then_expr)
                } else {
                    self.evaluate(else_expr)
                }
            }

            Expr::Variable { id, name } => self.lookup_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;
                self.assign_variable(*id, name, value.clone())?;
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut argument_values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    argument_values.push(self.evaluate(argument)?);
                }

                self.invoke_callable(callee, paren, &argument_values)
            }

            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;
                match object {
                    Value::Instance(instance) => LoxInstance::get(&instance, name),

                    // The class value acting as its own instance.
                    Value::Class(class) => class.get_static(name),

                    other => Err(LoxError::runtime(
                        name.line,
                        format!("Only instances have properties, got {}.", other.type_name()),
                    )),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object = self.evaluate(object)?;
                match object {
                    Value::Instance(instance) => {
                        let value = self.evaluate(value)?;
                        instance.borrow_mut().set(name, value.clone());
                        Ok(value)
                    }

                    // Statics are declared in the class body only.
                    Value::Class(_) => Err(LoxError::runtime(
                        name.line,
                        format!("Can't assign to static member '{}'.", name.lexeme),
                    )),

                    other => Err(LoxError::runtime(
                        name.line,
                        format!("Only instances have fields, got {}.", other.type_name()),
                    )),
                }
            }

            Expr::This { id, keyword } => self.lookup_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
                parent,
            } => self.evaluate_super(*id, keyword, method, parent.as_ref()),

            Expr::Function(function) => {
                let function = LoxFunction::new(
                    Rc::clone(function),
                    self.environment.clone(),
                    false,
                    None,
                );
                Ok(Value::Function(Rc::new(function)))
            }
        }
    }

    fn evaluate_literal(&self, token: &Token) -> Result<Value> {
        let value = match &token.token_type {
            TokenType::NUMBER(n) => Value::Number(*n),
            TokenType::STRING(s) => Value::String(s.clone()),
            TokenType::TRUE => Value::Bool(true),
            TokenType::FALSE => Value::Bool(false),
            TokenType::NIL => Value::Nil,
            _ => {
                return Err(LoxError::runtime(
                    token.line,
                    format!("Invalid literal '{}'.", token.lexeme),
                ));
            }
        };

        Ok(value)
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operand must be a number.",
                )),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&right))),

            _ => Err(LoxError::runtime(
                operator.line,
                format!("Invalid unary operator '{}'.", operator.lexeme),
            )),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        let numbers_error = || {
            LoxError::runtime(operator.line, "Operands must be numbers.")
        };

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                // Mixed string/number concatenates, coercing the number to
                // its display form ("12" from 1 + "2").
                (Value::String(a), b @ Value::Number(_)) => {
                    Ok(Value::String(format!("{}{}", a, b)))
                }
                (a @ Value::Number(_), Value::String(b)) => {
                    Ok(Value::String(format!("{}{}", a, b)))
                }

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
                _ => Err(numbers_error()),
            },

            TokenType::STAR => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
                _ => Err(numbers_error()),
            },

            TokenType::SLASH => match (left, right) {
                (Value::Number(a), Value::Number(b)) => {
                    if b == 0.0 {
                        // Not IEEE infinity; a user-facing error.
                        Err(LoxError::runtime(operator.line, "Division by zero."))
                    } else {
                        Ok(Value::Number(a / b))
                    }
                }
                _ => Err(numbers_error()),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            TokenType::GREATER => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),
                _ => Err(numbers_error()),
            },

            TokenType::GREATER_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),
                _ => Err(numbers_error()),
            },

            TokenType::LESS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),
                _ => Err(numbers_error()),
            },

            TokenType::LESS_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),
                _ => Err(numbers_error()),
            },

            _ => Err(LoxError::runtime(
                operator.line,
                format!("Invalid binary operator '{}'.", operator.lexeme),
            )),
        }
    }

    fn evaluate_super(
        &mut self,
        id: NodeId,
        keyword: &Token,
        method: &Token,
        parent: Option<&Token>,
    ) -> Result<Value> {
        // The resolver guarantees a binding for every accepted `super`.
        let binding = *self
            .locals
            .get(&id)
            .unwrap_or_else(|| panic!("unresolved 'super' on line {}", keyword.line));

        let environment = self
            .environment
            .clone()
            .expect("'super' evaluated outside any frame");

        let superclasses =
            match Environment::get_at(&environment, binding.depth, binding.slot) {
                Value::Superclasses(list) => list,
                other => panic!("'super' slot holds {} instead of a superclass list", other),
            };

        // `super(Name)` picks a specific ancestor; bare `super` means the
        // first superclass in declaration order.
        let index = match parent {
            Some(parent) => superclasses
                .iter()
                .position(|class| class.name() == parent.lexeme)
                .ok_or_else(|| {
                    LoxError::runtime(
                        parent.line,
                        format!("'{}' is not a superclass.", parent.lexeme),
                    )
                })?,
            None => 0,
        };

        // `this` lives one scope further in than `super`.
        let receiver = Environment::get_at(&environment, binding.depth - 1, 0);

        let function = superclasses[index]
            .find_method(&method.lexeme)
            .ok_or_else(|| {
                LoxError::runtime(
                    method.line,
                    format!("Undefined property '{}'.", method.lexeme),
                )
            })?;

        Ok(Value::Function(Rc::new(function.bind(receiver))))
    }

    fn invoke_callable(
        &mut self,
        callee: Value,
        paren: &Token,
        arguments: &[Value],
    ) -> Result<Value> {
        match callee {
            Value::NativeFunction { name, arity, func } => {
                if arguments.len() != arity {
                    return Err(arity_error(paren, arity, arguments.len()));
                }

                debug!("Calling native function '{}'", name);
                func(arguments).map_err(|message| LoxError::runtime(paren.line, message))
            }

            Value::Function(function) => {
                if arguments.len() != function.arity() {
                    return Err(arity_error(paren, function.arity(), arguments.len()));
                }

                function.call(self, arguments)
            }

            // Classes check arity internally: without an own `init` the
            // requirement is per inherited superclass initializer.
            Value::Class(class) => LoxClass::instantiate(&class, self, paren, arguments),

            other => Err(LoxError::runtime(
                paren.line,
                format!("Can only call functions and classes, got {}.", other.type_name()),
            )),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Variable access
    // ─────────────────────────────────────────────────────────────────────────

    /// Slot access for resolved locals, name lookup for globals.
    fn lookup_variable(&self, id: NodeId, name: &Token) -> Result<Value> {
        let value = match self.locals.get(&id) {
            Some(binding) => {
                let environment = self
                    .environment
                    .as_ref()
                    .unwrap_or_else(|| panic!("resolved local '{}' without a frame", name.lexeme));

                Environment::get_at(environment, binding.depth, binding.slot)
            }

            None => self
                .globals
                .get(&name.lexeme)
                .cloned()
                .ok_or_else(|| {
                    LoxError::runtime(
                        name.line,
                        format!("Undefined variable '{}'.", name.lexeme),
                    )
                })?,
        };

        if matches!(value, Value::Uninit) {
            return Err(LoxError::runtime(
                name.line,
                format!("Uninitialized variable '{}'.", name.lexeme),
            ));
        }

        Ok(value)
    }

    fn assign_variable(&mut self, id: NodeId, name: &Token, value: Value) -> Result<()> {
        match self.locals.get(&id) {
            Some(binding) => {
                let environment = self
                    .environment
                    .as_ref()
                    .unwrap_or_else(|| panic!("resolved local '{}' without a frame", name.lexeme));

                Environment::assign_at(environment, binding.depth, binding.slot, value);
                Ok(())
            }

            None => {
                if !self.globals.contains_key(&name.lexeme) {
                    return Err(LoxError::runtime(
                        name.line,
                        format!("Undefined variable '{}'.", name.lexeme),
                    ));
                }

                self.globals.insert(name.lexeme.clone(), value);
                Ok(())
            }
        }
    }

    /// Fresh definition: appends a slot in the current frame, or (at the top
    /// level) inserts into the global table.
    fn define_variable(&mut self, name: &Token, value: Value) {
        match &self.environment {
            Some(environment) => {
                environment.borrow_mut().define(value);
            }
            None => {
                self.globals.insert(name.lexeme.clone(), value);
            }
        }
    }

    /// Write through an already reserved binding (class installation).
    fn store_variable(&mut self, id: NodeId, name: &Token, value: Value) {
        match self.locals.get(&id) {
            Some(binding) => {
                let environment = self
                    .environment
                    .as_ref()
                    .unwrap_or_else(|| panic!("resolved local '{}' without a frame", name.lexeme));

                Environment::assign_at(environment, binding.depth, binding.slot, value);
            }

            None => {
                self.globals.insert(name.lexeme.clone(), value);
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn arity_error(paren: &Token, expected: usize, got: usize) -> LoxError {
    LoxError::runtime(
        paren.line,
        format!("Expected {} arguments but got {}.", expected, got),
    )
}

/// Only `nil` and `false` are falsy; everything else, `0` and `""` included,
/// is truthy.
pub fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Nil | Value::Bool(false))
}
