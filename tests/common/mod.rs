#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::ast::Stmt;
use rox::config::InterpreterConfig;
use rox::error::{LoxError, RunError};
use rox::parser::Parser;
use rox::scanner::scan_tokens;
use rox::session::Session;

/// In-memory output sink that stays readable after being handed to the
/// interpreter.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn session(config: InterpreterConfig) -> (Session, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let session = Session::with_output(config, Box::new(buffer.clone()));
    (session, buffer)
}

pub fn run_with(config: InterpreterConfig, source: &str) -> (String, Result<(), RunError>) {
    let (mut session, buffer) = session(config);
    let result = session.run(source);
    (buffer.contents(), result)
}

/// Runs with default settings (expression statements echo).
pub fn run(source: &str) -> (String, Result<(), RunError>) {
    run_with(InterpreterConfig::default(), source)
}

/// Runs with expression-statement echo switched off.
pub fn run_quiet(source: &str) -> (String, Result<(), RunError>) {
    run_with(InterpreterConfig::default().with_echo(false), source)
}

/// Output of a program that must succeed.
pub fn output(source: &str) -> String {
    let (out, result) = run_quiet(source);
    if let Err(e) = result {
        panic!("program failed: {:?}\n--- source ---\n{}", e, source);
    }
    out
}

/// Message of the runtime error a program must fail with.
pub fn runtime_error(source: &str) -> LoxError {
    match run_quiet(source).1 {
        Err(RunError::Runtime(e)) => e,
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

pub fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
    let (tokens, errors) = scan_tokens(source);
    assert!(errors.is_empty(), "unexpected lexical errors: {:?}", errors);
    Parser::new(&tokens).parse()
}

pub fn parse_ok(source: &str) -> Vec<Stmt> {
    match parse(source) {
        Ok(statements) => statements,
        Err(errors) => panic!("parse failed: {:?}", errors),
    }
}

pub fn parse_errors(source: &str) -> Vec<String> {
    match parse(source) {
        Ok(_) => panic!("expected parse errors for {:?}", source),
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    }
}
