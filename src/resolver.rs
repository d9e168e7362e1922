//! Static resolver pass.
//!
//! One left-to-right AST walk that does three things:
//! 1. Build lexical scopes (a stack of per-scope symbol tables tracking
//!    declared/defined/used plus a slot index per name).
//! 2. Report static errors: redeclaration, forward-read in an initializer,
//!    unused locals, illegal `this`/`super`/`return`/`break`, classes
//!    inheriting from themselves.
//! 3. Record, for *each* variable occurrence, whether it is a local -- and at
//!    what (depth, slot) -- by calling back into the interpreter.  Occurrences
//!    left unrecorded are globals, looked up by name at runtime.
//!
//! Errors are accumulated, not fatal to the pass, so one run surfaces as many
//! as possible.  The driver must refuse to interpret a program for which this
//! pass produced any error.
//!
//! Slot discipline: `declare` assigns the next free index in the innermost
//! scope, in source order.  The interpreter appends to frames in the same
//! order, which is what makes the indices line up at runtime.

use crate::error::LoxError;
use crate::expr::{Expr, FunctionExpr, NodeId};
use crate::interpreter::Interpreter;
use crate::stmt::{FunDecl, Stmt};
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;

/// What kind of callable body are we inside?  Gates `return`, `this`
/// and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    StaticMethod,
    Initializer,
}

/// Are we inside a class body, and does that class have superclasses?
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Per-name bookkeeping within one scope.
#[derive(Debug)]
struct VarState {
    /// Declaration token, kept for the unused-local report.
    token: Token,

    /// False between `declare` and `define`; reading then is the
    /// read-in-own-initializer error.
    defined: bool,

    /// Any resolved reference -- read or write -- marks a name used.
    used: bool,

    /// Slot index inside the runtime frame for this scope.
    slot: usize,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances (locals vs. globals) by calling back into the interpreter.
pub struct Resolver<'interp> {
    interpreter: &'interp mut Interpreter,
    scopes: Vec<HashMap<String, VarState>>,
    current_function: FunctionType,
    current_class: ClassType,

    /// True anywhere lexically inside a static method, including nested
    /// function literals; statics have no `this` frame at runtime, so `this`
    /// and `super` must be rejected for the whole region.
    in_static: bool,

    /// Loops entered in the current function body; `break` needs one.
    loop_depth: usize,

    errors: Vec<LoxError>,
}

impl<'interp> Resolver<'interp> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'interp mut Interpreter) -> Self {
        info!("Resolver instantiated");

        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            in_static: false,
            loop_depth: 0,
            errors: Vec::new(),
        }
    }

    /// Walk all top-level statements.  Returns every static error found;
    /// an empty list means the program may be interpreted.
    pub fn resolve(mut self, statements: &[Stmt]) -> Vec<LoxError> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements);

        self.errors
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    fn error(&mut self, line: usize, message: impl Into<String>) {
        self.errors.push(LoxError::resolve(line, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        debug!("Resolving stmt: {:?}", stmt);

        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define, so the initializer
                // cannot read the variable it is initializing.
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.loop_depth += 1;
                self.resolve_stmt(body);
                self.loop_depth -= 1;
            }

            Stmt::Break { keyword } => {
                if self.loop_depth == 0 {
                    self.error(keyword.line, "Can't use 'break' outside of a loop.");
                }
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword.line, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword.line, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }

            Stmt::FunDef(FunDecl { name, function }) => {
                // The name is visible inside its own body, enabling recursion.
                self.declare(name);
                self.define(name);
                self.resolve_function(function, FunctionType::Function);
            }

            Stmt::Class {
                id,
                name,
                superclasses,
                methods,
                statics,
            } => {
                self.resolve_class(*id, name, superclasses, methods, statics);
            }
        }
    }

    fn resolve_class(
        &mut self,
        id: NodeId,
        name: &Token,
        superclasses: &[Expr],
        methods: &[FunDecl],
        statics: &[FunDecl],
    ) {
        self.declare(name);
        self.define(name);
        // The declaration installs the class value through this binding.
        self.resolve_local(id, &name.lexeme);

        for superclass in superclasses {
            if let Expr::Variable { name: super_name, .. } = superclass {
                if super_name.lexeme == name.lexeme {
                    self.error(super_name.line, "A class can't inherit from itself.");
                    continue;
                }
            }
            self.resolve_expr(superclass);
        }

        let enclosing_class = self.current_class;
        self.current_class = if superclasses.is_empty() {
            ClassType::Class
        } else {
            ClassType::Subclass
        };

        // A class declared inside a static body starts a fresh receiver
        // context: its instance methods get a real `this` frame through
        // `bind`, so only its own statics re-enter the static region.
        let enclosing_static = self.in_static;
        self.in_static = false;

        // Mirror of the runtime frame layout: a `super` frame around the
        // methods (only when there are superclasses), a `this` frame injected
        // per bind around instance methods, then the parameter scope.
        let has_superclasses = !superclasses.is_empty();
        if has_superclasses {
            self.begin_scope();
            self.declare_synthetic("super", name);
        }

        // Statics are never bound to a receiver, so their bodies resolve
        // without the `this` scope; the runtime invokes them unbound.
        for decl in statics {
            self.resolve_function(&decl.function, FunctionType::StaticMethod);
        }

        self.begin_scope();
        self.declare_synthetic("this", name);

        for decl in methods {
            let function_type = if decl.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(&decl.function, function_type);
        }

        self.end_scope();
        if has_superclasses {
            self.end_scope();
        }

        self.in_static = enclosing_static;
        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        debug!("Resolving expr: {:?}", expr);

        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_expr);
                self.resolve_expr(else_expr);
            }

            Expr::Variable { id, name } => {
                let in_own_initializer = self
                    .scopes
                    .last()
                    .and_then(|scope| scope.get(&name.lexeme))
                    .is_some_and(|state| !state.defined);

                if in_own_initializer {
                    self.error(
                        name.line,
                        "Can't read local variable in its own initializer.",
                    );
                }

                self.resolve_local(*id, &name.lexeme);
            }

            Expr::Assign { id, name, value } => {
                // RHS first, then bind the target; the write counts as a use.
                self.resolve_expr(value);
                self.resolve_local(*id, &name.lexeme);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }

            Expr::Get { object, .. } => {
                // Property names are dynamic; only the object resolves.
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword.line, "Can't use 'this' outside of a class.");
                    return;
                }
                if self.in_static {
                    self.error(keyword.line, "Can't use 'this' in a static method.");
                    return;
                }

                self.resolve_local(*id, "this");
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(keyword.line, "Can't use 'super' outside of a class.");
                        return;
                    }
                    ClassType::Class => {
                        self.error(
                            keyword.line,
                            "Can't use 'super' in a class with no superclass.",
                        );
                        return;
                    }
                    ClassType::Subclass => {}
                }
                if self.in_static {
                    self.error(keyword.line, "Can't use 'super' in a static method.");
                    return;
                }

                self.resolve_local(*id, "super");
            }

            Expr::Function(function) => {
                self.resolve_function(function, FunctionType::Function);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, function: &FunctionExpr, function_type: FunctionType) {
        let enclosing_function = self.current_function;
        let enclosing_static = self.in_static;
        let enclosing_loop_depth = self.loop_depth;

        self.current_function = function_type;
        self.in_static = enclosing_static || function_type == FunctionType::StaticMethod;
        // `break` cannot cross a call boundary.
        self.loop_depth = 0;

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&function.body);
        self.end_scope();

        self.current_function = enclosing_function;
        self.in_static = enclosing_static;
        self.loop_depth = enclosing_loop_depth;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope and report every local that was never
    /// referenced.  Deliberately an error, not a warning.
    fn end_scope(&mut self) {
        let scope = self.scopes.pop().expect("end_scope without begin_scope");

        let mut unused: Vec<(&String, &VarState)> =
            scope.iter().filter(|(_, state)| !state.used).collect();
        // Report in declaration order, not hash order.
        unused.sort_by_key(|(_, state)| state.slot);

        for (name, state) in unused {
            self.errors.push(LoxError::resolve(
                state.token.line,
                format!("Local variable '{}' defined but never used.", name),
            ));
        }
    }

    /// Add `name` to the innermost scope as declared-but-not-defined and hand
    /// it the next slot index.  Redeclaring in the same scope is an error
    /// (shadowing across scopes is fine); no-op at the top level, which is
    /// dynamically name-keyed.
    fn declare(&mut self, name: &Token) {
        if self.scopes.is_empty() {
            return;
        }

        if self.scopes.last().is_some_and(|s| s.contains_key(&name.lexeme)) {
            self.error(
                name.line,
                format!(
                    "There is already a variable with name '{}' in this scope.",
                    name.lexeme
                ),
            );
            return;
        }

        let scope = self.scopes.last_mut().expect("scope stack checked non-empty");
        let slot = scope.len();
        scope.insert(
            name.lexeme.clone(),
            VarState {
                token: name.clone(),
                defined: false,
                used: false,
                slot,
            },
        );
    }

    /// Mark the innermost scope's entry as ready to be read.
    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if let Some(state) = scope.get_mut(&name.lexeme) {
                state.defined = true;
            }
        }
    }

    /// Declare a `this`/`super` entry the parser never sees.  Synthetics are
    /// born used so the unused-local rule ignores them.
    fn declare_synthetic(&mut self, name: &str, anchor: &Token) {
        let scope = self
            .scopes
            .last_mut()
            .expect("synthetic declaration outside any scope");

        let slot = scope.len();
        scope.insert(
            name.to_string(),
            VarState {
                token: anchor.clone(),
                defined: true,
                used: true,
                slot,
            },
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as either a local at (depth, slot), or a global
    /// if the name is in no scope.  Either way a hit marks the name used.
    fn resolve_local(&mut self, id: NodeId, name: &str) {
        for (depth, scope) in self.scopes.iter_mut().rev().enumerate() {
            if let Some(state) = scope.get_mut(name) {
                state.used = true;
                debug!("Resolved '{}' at depth {}, slot {}", name, depth, state.slot);
                self.interpreter.resolve(id, depth, state.slot);
                return;
            }
        }

        debug!("Resolved '{}' as global", name);
    }
}
