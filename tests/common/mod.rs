//! Shared end-to-end harness: run a source string through the full
//! scan/parse/resolve/interpret pipeline and capture what it printed.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use ferrolox as lox;

use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::Scanner;
use lox::token::Token;

/// `Write` adapter that shares its buffer with the test body, so the
/// interpreter can own a sink the test can still read afterwards.
#[derive(Clone, Default)]
pub struct CaptureBuf(Rc<RefCell<Vec<u8>>>);

impl CaptureBuf {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("captured output is UTF-8")
    }
}

impl Write for CaptureBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `source` to completion and return everything it printed.  Panics on
/// any error so behavioral tests read as plain input/output pairs.
pub fn run(source: &str) -> String {
    try_run(source).unwrap_or_else(|errors| {
        panic!("program failed: {}", errors.join("\n"))
    })
}

/// Run `source`; on failure return every collected error message (all static
/// errors from the failing stage, or the single runtime error).
pub fn try_run(source: &str) -> Result<String, Vec<String>> {
    let buffer = CaptureBuf::default();
    let mut interpreter = Interpreter::with_output(Box::new(buffer.clone()));

    let statements = analyze(source, &mut interpreter)?;

    interpreter
        .interpret(&statements)
        .map_err(|e| vec![e.to_string()])?;

    Ok(buffer.contents())
}

/// Scan, parse and resolve only; the error messages of the first failing
/// stage, or `Ok` with the ready-to-run statements.
fn analyze(
    source: &str,
    interpreter: &mut Interpreter,
) -> Result<Vec<lox::stmt::Stmt>, Vec<String>> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut lex_errors: Vec<String> = Vec::new();

    for item in Scanner::new(source.as_bytes()) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => lex_errors.push(e.to_string()),
        }
    }
    if !lex_errors.is_empty() {
        return Err(lex_errors);
    }

    let mut parser = Parser::new(tokens);
    let statements = parser.parse();
    if !parser.errors().is_empty() {
        return Err(parser.errors().iter().map(ToString::to_string).collect());
    }

    let resolve_errors = Resolver::new(interpreter).resolve(&statements);
    if !resolve_errors.is_empty() {
        return Err(resolve_errors.iter().map(ToString::to_string).collect());
    }

    Ok(statements)
}

/// The error messages `source` fails with.  Panics if it does not fail.
pub fn errors_of(source: &str) -> Vec<String> {
    match try_run(source) {
        Ok(output) => panic!("expected failure, program printed: {:?}", output),
        Err(errors) => errors,
    }
}

/// Assert that `source` fails and its first error message contains `needle`.
pub fn assert_error_contains(source: &str, needle: &str) {
    let errors = errors_of(source);
    assert!(
        errors.iter().any(|e| e.contains(needle)),
        "expected an error containing {:?}, got: {:?}",
        needle,
        errors
    );
}
