//! Recursive-descent parser.
//!
//! One method per grammar rule, precedence encoded by the call chain.  Errors
//! do not abort the parse: the offending statement is dropped, the parser
//! synchronizes to the next statement boundary, and parsing continues so a
//! single run reports as many syntax errors as possible.
//!
//! The parser also issues [`NodeId`]s for every resolvable node (variable
//! reads, assignments, `this`, `super`, class declarations).  The counter can
//! be seeded with [`Parser::starting_at`] so successive REPL fragments never
//! reuse an id against the interpreter's accumulated binding table.

use std::rc::Rc;

use log::debug;

use crate::error::LoxError;
use crate::expr::{Expr, FunctionExpr, NodeId};
use crate::stmt::{FunDecl, Stmt};
use crate::token::{Token, TokenType};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    next_id: NodeId,
    errors: Vec<LoxError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::starting_at(tokens, 0)
    }

    /// A parser whose id counter starts at `first_id`.  The REPL threads the
    /// previous fragment's [`Parser::next_id`] through so ids stay unique for
    /// the lifetime of one interpreter.
    pub fn starting_at(tokens: Vec<Token>, first_id: NodeId) -> Self {
        Parser {
            tokens,
            current: 0,
            next_id: first_id,
            errors: Vec::new(),
        }
    }

    /// First id the *next* fragment should start at.
    pub fn next_id(&self) -> NodeId {
        self.next_id
    }

    /// Syntax errors collected during [`Parser::parse`].  A non-empty slice
    /// means the returned statements are incomplete and must not run.
    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    /// Parse the whole token stream into a statement list.
    pub fn parse(&mut self) -> Vec<Stmt> {
        debug!("Parsing {} token(s)", self.tokens.len());

        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }

        statements
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Declarations
    // ─────────────────────────────────────────────────────────────────────────

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.matches(&[TokenType::CLASS]) {
            self.class_declaration()
        } else if self.check(TokenType::FUN) && self.check_next(TokenType::IDENTIFIER) {
            // `fun` followed by anything but a name is a function literal and
            // belongs to expression territory.
            self.advance();
            self.function("function").map(Stmt::FunDef)
        } else if self.matches(&[TokenType::VAR]) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(statement) => Some(statement),
            Err(error) => {
                self.errors.push(error);
                self.synchronize();
                None
            }
        }
    }

    /// `"class" IDENT (":" IDENT ("," IDENT)*)? "{" ("static"? method)* "}"`
    fn class_declaration(&mut self) -> Result<Stmt, LoxError> {
        let name = self.consume(TokenType::IDENTIFIER, "Expect class name.")?;
        let id = self.issue_id();

        let mut superclasses = Vec::new();
        if self.matches(&[TokenType::COLON]) {
            loop {
                let superclass = self.consume(TokenType::IDENTIFIER, "Expect superclass name.")?;
                superclasses.push(Expr::Variable {
                    id: self.issue_id(),
                    name: superclass,
                });

                if !self.matches(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        self.consume(TokenType::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        let mut statics = Vec::new();
        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if self.matches(&[TokenType::STATIC]) {
                statics.push(self.function("static method")?);
            } else {
                methods.push(self.function("method")?);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after class body.")?;

        debug!(
            "Parsed class '{}' with {} superclass(es), {} method(s), {} static(s)",
            name.lexeme,
            superclasses.len(),
            methods.len(),
            statics.len()
        );

        Ok(Stmt::Class {
            id,
            name,
            superclasses,
            methods,
            statics,
        })
    }

    /// Named function or method: `IDENT "(" params? ")" block`.
    fn function(&mut self, kind: &str) -> Result<FunDecl, LoxError> {
        let name = self.consume(TokenType::IDENTIFIER, &format!("Expect {} name.", kind))?;
        let function = self.function_body(kind)?;

        Ok(FunDecl {
            name,
            function: Rc::new(function),
        })
    }

    /// Parameter list plus body, shared by declarations and `fun` literals.
    fn function_body(&mut self, kind: &str) -> Result<FunctionExpr, LoxError> {
        let paren = self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expect '(' after {} name.", kind),
        )?;
        let line = paren.line;

        let mut params = Vec::new();
        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= 255 {
                    let token = self.peek().clone();
                    self.errors
                        .push(self.error_at(&token, "Can't have more than 255 parameters."));
                }

                params.push(self.consume(TokenType::IDENTIFIER, "Expect parameter name.")?);

                if !self.matches(&[TokenType::COMMA]) {
                    break;
                }
            }
        }
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;

        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expect '{{' before {} body.", kind),
        )?;
        let body = self.block_statements()?;

        Ok(FunctionExpr { line, params, body })
    }

    fn var_declaration(&mut self) -> Result<Stmt, LoxError> {
        let name = self.consume(TokenType::IDENTIFIER, "Expect variable name.")?;

        let initializer = if self.matches(&[TokenType::EQUAL]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    fn statement(&mut self) -> Result<Stmt, LoxError> {
        if self.matches(&[TokenType::PRINT]) {
            return self.print_statement();
        }
        if self.matches(&[TokenType::LEFT_BRACE]) {
            return Ok(Stmt::Block(self.block_statements()?));
        }
        if self.matches(&[TokenType::IF]) {
            return self.if_statement();
        }
        if self.matches(&[TokenType::WHILE]) {
            return self.while_statement();
        }
        if self.matches(&[TokenType::FOR]) {
            return self.for_statement();
        }
        if self.matches(&[TokenType::BREAK]) {
            let keyword = self.previous().clone();
            self.consume(TokenType::SEMICOLON, "Expect ';' after 'break'.")?;
            return Ok(Stmt::Break { keyword });
        }
        if self.matches(&[TokenType::RETURN]) {
            return self.return_statement();
        }

        self.expression_statement()
    }

    fn print_statement(&mut self) -> Result<Stmt, LoxError> {
        let value = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Expect ';' after value.")?;
        Ok(Stmt::Print(value))
    }

    fn expression_statement(&mut self) -> Result<Stmt, LoxError> {
        let expr = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    /// Statements up to (and consuming) the closing `}`.
    fn block_statements(&mut self) -> Result<Vec<Stmt>, LoxError> {
        let mut statements = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn if_statement(&mut self) -> Result<Stmt, LoxError> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.matches(&[TokenType::ELSE]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, LoxError> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    /// `for` desugars into the equivalent block/while tree; the later stages
    /// never see a dedicated loop node.
    fn for_statement(&mut self) -> Result<Stmt, LoxError> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer = if self.matches(&[TokenType::SEMICOLON]) {
            None
        } else if self.matches(&[TokenType::VAR]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if self.check(TokenType::SEMICOLON) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment = if self.check(TokenType::RIGHT_PAREN) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let condition = condition.unwrap_or_else(|| {
            Expr::Literal(Token::new(TokenType::TRUE, "true", self.previous().line))
        });
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn return_statement(&mut self) -> Result<Stmt, LoxError> {
        let keyword = self.previous().clone();

        let value = if self.check(TokenType::SEMICOLON) {
            None
        } else {
            Some(self.expression()?)
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions, highest rule first
    // ─────────────────────────────────────────────────────────────────────────

    fn expression(&mut self) -> Result<Expr, LoxError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, LoxError> {
        let expr = self.ternary()?;

        if self.matches(&[TokenType::EQUAL]) {
            let equals = self.previous().clone();
            let value = Box::new(self.assignment()?);

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: self.issue_id(),
                    name,
                    value,
                }),

                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value,
                }),

                // Reported but not fatal: the left side still parsed.
                _ => {
                    self.errors
                        .push(self.error_at(&equals, "Invalid assignment target."));
                    Ok(*value)
                }
            };
        }

        Ok(expr)
    }

    /// `condition "?" expression ":" ternary` -- right associative.
    fn ternary(&mut self) -> Result<Expr, LoxError> {
        let condition = self.logic_or()?;

        if self.matches(&[TokenType::QUESTION]) {
            let then_expr = Box::new(self.expression()?);
            self.consume(TokenType::COLON, "Expect ':' in ternary expression.")?;
            let else_expr = Box::new(self.ternary()?);

            return Ok(Expr::Ternary {
                condition: Box::new(condition),
                then_expr,
                else_expr,
            });
        }

        Ok(condition)
    }

    fn logic_or(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.logic_and()?;

        while self.matches(&[TokenType::OR]) {
            let operator = self.previous().clone();
            let right = self.logic_and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logic_and(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.equality()?;

        while self.matches(&[TokenType::AND]) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.comparison()?;

        while self.matches(&[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.term()?;

        while self.matches(&[
            TokenType::GREATER,
            TokenType::GREATER_EQUAL,
            TokenType::LESS,
            TokenType::LESS_EQUAL,
        ]) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.factor()?;

        while self.matches(&[TokenType::MINUS, TokenType::PLUS]) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.unary()?;

        while self.matches(&[TokenType::SLASH, TokenType::STAR]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, LoxError> {
        if self.matches(&[TokenType::BANG, TokenType::MINUS]) {
            let operator = self.previous().clone();
            let right = Box::new(self.unary()?);
            return Ok(Expr::Unary { operator, right });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.primary()?;

        loop {
            if self.matches(&[TokenType::LEFT_PAREN]) {
                expr = self.finish_call(expr)?;
            } else if self.matches(&[TokenType::DOT]) {
                let name =
                    self.consume(TokenType::IDENTIFIER, "Expect property name after '.'.")?;
                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, LoxError> {
        let mut arguments = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= 255 {
                    let token = self.peek().clone();
                    self.errors
                        .push(self.error_at(&token, "Can't have more than 255 arguments."));
                }

                arguments.push(self.expression()?);

                if !self.matches(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        let paren = self.consume(TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr, LoxError> {
        if self.matches(&[
            TokenType::FALSE,
            TokenType::TRUE,
            TokenType::NIL,
            TokenType::NUMBER(0.0),
            TokenType::STRING(String::new()),
        ]) {
            return Ok(Expr::Literal(self.previous().clone()));
        }

        if self.matches(&[TokenType::LEFT_PAREN]) {
            let expr = self.expression()?;
            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }

        if self.matches(&[TokenType::IDENTIFIER]) {
            return Ok(Expr::Variable {
                id: self.issue_id(),
                name: self.previous().clone(),
            });
        }

        if self.matches(&[TokenType::THIS]) {
            return Ok(Expr::This {
                id: self.issue_id(),
                keyword: self.previous().clone(),
            });
        }

        if self.matches(&[TokenType::SUPER]) {
            return self.super_expression();
        }

        if self.matches(&[TokenType::FUN]) {
            let function = self.function_body("function")?;
            return Ok(Expr::Function(Rc::new(function)));
        }

        let token = self.peek().clone();
        Err(self.error_at(&token, "Expect expression."))
    }

    /// `"super" ("(" IDENT ")")? "." IDENT`.  The parenthesised name picks a
    /// specific superclass; without it the first one applies.
    fn super_expression(&mut self) -> Result<Expr, LoxError> {
        let keyword = self.previous().clone();

        let parent = if self.matches(&[TokenType::LEFT_PAREN]) {
            let parent = self.consume(TokenType::IDENTIFIER, "Expect superclass name.")?;
            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after superclass name.")?;
            Some(parent)
        } else {
            None
        };

        self.consume(TokenType::DOT, "Expect '.' after 'super'.")?;
        let method = self.consume(TokenType::IDENTIFIER, "Expect superclass method name.")?;

        Ok(Expr::Super {
            id: self.issue_id(),
            keyword,
            method,
            parent,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Token-stream plumbing
    // ─────────────────────────────────────────────────────────────────────────

    fn issue_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Consume the current token if it matches any of `types`.
    fn matches(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type.clone()) {
                self.advance();
                return true;
            }
        }

        false
    }

    fn check(&self, token_type: TokenType) -> bool {
        !self.is_at_end() && self.peek().token_type == token_type
    }

    fn check_next(&self, token_type: TokenType) -> bool {
        match self.tokens.get(self.current + 1) {
            Some(token) => token.token_type != TokenType::EOF && token.token_type == token_type,
            None => false,
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<Token, LoxError> {
        if self.check(token_type) {
            return Ok(self.advance().clone());
        }

        let token = self.peek().clone();
        Err(self.error_at(&token, message))
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    fn error_at(&self, token: &Token, message: &str) -> LoxError {
        let place = if token.token_type == TokenType::EOF {
            String::from("end")
        } else {
            format!("'{}'", token.lexeme)
        };

        LoxError::parse(token.line, format!("Error at {}: {}", place, message))
    }

    /// Skip to the next likely statement boundary after a syntax error.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::SEMICOLON {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN
                | TokenType::BREAK => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}
