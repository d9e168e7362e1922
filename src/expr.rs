//! Expression nodes of the AST.
//!
//! The tree is a plain tagged union walked with exhaustive `match` by both the
//! resolver and the interpreter.  Nodes carry the [`Token`]s they were built
//! from purely for diagnostics.
//!
//! Variable-like occurrences (`Variable`, `Assign`, `This`, `Super`, and the
//! class declaration statement) additionally carry a [`NodeId`]: a parser-issued
//! identity the resolver's binding table is keyed on.  An id without a table
//! entry means "resolve by name in the global table at runtime".

use std::rc::Rc;

use crate::stmt::Stmt;
use crate::token::Token;

/// Identity of a resolvable AST node.  Issued by the parser, unique across
/// every program fragment fed to one interpreter (the REPL threads the
/// counter through successive lines).
pub type NodeId = usize;

/// Parameter list and body shared by named functions, methods and anonymous
/// function literals.  Reference-counted because a `LoxFunction` value keeps
/// its declaration alive past the statement that produced it.
#[derive(Debug, Clone)]
pub struct FunctionExpr {
    /// Source line of the declaration header, for diagnostics; present even
    /// when the parameter list is empty.
    pub line: usize,

    /// Parameter name tokens, in declaration order.
    pub params: Vec<Token>,

    /// Body statements, executed in a fresh frame per call.
    pub body: Vec<Stmt>,
}

/// **Abstract-syntax-tree node** representing every kind of *expression*.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    /// The token carries the decoded value in its `NUMBER`/`STRING` payload.
    Literal(Token),

    /// Parenthesised sub-expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Prefix unary operator expression, e.g. `!isReady` or `-42`.
    Unary {
        /// The operator token (`!` or `-`).
        operator: Token,
        right: Box<Expr>,
    },

    /// Infix binary operator expression, e.g. `a + b`, `x <= y`.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short-circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `condition ? then_expr : else_expr`; exactly one branch is evaluated.
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },

    /// Variable access.
    Variable { id: NodeId, name: Token },

    /// Assignment expression: `identifier "=" expression`.
    Assign {
        id: NodeId,
        name: Token,
        value: Box<Expr>,
    },

    /// Function-, method- or class-call expression.
    Call {
        /// Expression that evaluates to a callable (variable, property, etc.).
        callee: Box<Expr>,
        /// The closing `)` token, retained for error reporting.
        paren: Token,
        /// Argument list (may be empty), evaluated left to right.
        arguments: Vec<Expr>,
    },

    /// Property read: `object.name`.
    Get { object: Box<Expr>, name: Token },

    /// Property write: `object.name = value`.
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method.
    This { id: NodeId, keyword: Token },

    /// `super.method` or `super(Parent).method`.  The optional `parent` token
    /// disambiguates between multiple superclasses; absent means the first
    /// superclass in declaration order.
    Super {
        id: NodeId,
        keyword: Token,
        method: Token,
        parent: Option<Token>,
    },

    /// Anonymous function literal: `fun (params) { … }`.
    Function(Rc<FunctionExpr>),
}

impl Expr {
    /// Source line of the token anchoring this node, for diagnostics.
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal(token) => token.line,
            Expr::Grouping(inner) => inner.line(),
            Expr::Unary { operator, .. } => operator.line,
            Expr::Binary { operator, .. } => operator.line,
            Expr::Logical { operator, .. } => operator.line,
            Expr::Ternary { condition, .. } => condition.line(),
            Expr::Variable { name, .. } => name.line,
            Expr::Assign { name, .. } => name.line,
            Expr::Call { paren, .. } => paren.line,
            Expr::Get { name, .. } => name.line,
            Expr::Set { name, .. } => name.line,
            Expr::This { keyword, .. } => keyword.line,
            Expr::Super { keyword, .. } => keyword.line,
            Expr::Function(function) => function.line,
        }
    }
}
