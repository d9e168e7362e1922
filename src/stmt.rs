//! Statement nodes of the AST.

use std::rc::Rc;

use crate::expr::{Expr, FunctionExpr, NodeId};
use crate::token::Token;

/// A named function declaration: `fun name(params) { … }`, or one
/// method / static method inside a class body.
#[derive(Debug, Clone)]
pub struct FunDecl {
    pub name: Token,
    pub function: Rc<FunctionExpr>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// Stand-alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement; writes through the interpreter's output sink.
    Print(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    /// Without an initializer the slot holds an uninitialized sentinel;
    /// reading it before the first assignment is a runtime error.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements,
    /// executed in a fresh child frame.
    Block(Vec<Stmt>),

    /// `if` / `else` conditional.
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop; consumes a `break` signalled from its body.
    While { condition: Expr, body: Box<Stmt> },

    /// `break;` -- unwinds to the innermost enclosing loop.
    Break { keyword: Token },

    /// `return` with an optional value -- unwinds to the enclosing call.
    Return {
        keyword: Token,
        value: Option<Expr>,
    },

    /// Named function declaration.
    FunDef(FunDecl),

    /// Class declaration with an ordered (possibly empty) superclass list,
    /// instance methods and static methods.  Carries a [`NodeId`] because the
    /// declaration itself is a resolvable write of the class value.
    Class {
        id: NodeId,
        name: Token,
        superclasses: Vec<Expr>,
        methods: Vec<FunDecl>,
        statics: Vec<FunDecl>,
    },
}
