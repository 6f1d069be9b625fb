//! Scan → parse → execute pipeline.
//!
//! A [`Session`] owns one interpreter, so globals survive from one
//! [`Session::run`] to the next (the REPL feeds it line by line). Failures
//! come back as a [`RunError`] for the caller to report; nothing here
//! prints diagnostics or exits the process.

use std::io::Write;

use log::{debug, info};

use crate::ast::{Expr, Stmt};
use crate::config::InterpreterConfig;
use crate::error::RunError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::scanner::scan_tokens;
use crate::value::Value;

pub struct Session {
    interpreter: Interpreter,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}

impl Session {
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            interpreter: Interpreter::with_config(config),
        }
    }

    pub fn with_output(config: InterpreterConfig, out: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(config, out),
        }
    }

    pub fn interpreter(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Run a whole program. Nothing executes if any lexical or parse error
    /// was found; all of them are returned together.
    pub fn run(&mut self, source: &str) -> Result<(), RunError> {
        let statements = parse_program(source)?;

        info!("Executing {} statement(s)", statements.len());

        self.interpreter
            .interpret(&statements)
            .map_err(RunError::Runtime)
    }

    /// Evaluate a single expression and return its value.
    pub fn evaluate(&mut self, source: &str) -> Result<Value, RunError> {
        let expr = parse_expression(source)?;

        self.interpreter
            .evaluate(&expr)
            .map_err(RunError::Runtime)
    }
}

/// Scan and parse `source` as a program. Lexical errors come first in the
/// returned list, followed by parse errors.
pub fn parse_program(source: &str) -> Result<Vec<Stmt>, RunError> {
    let (tokens, mut errors) = scan_tokens(source);

    match Parser::new(&tokens).parse() {
        Ok(statements) if errors.is_empty() => Ok(statements),
        Ok(_) => Err(RunError::Syntax(errors)),
        Err(parse_errors) => {
            debug!("{} parse error(s)", parse_errors.len());
            errors.extend(parse_errors);
            Err(RunError::Syntax(errors))
        }
    }
}

/// Scan and parse `source` as exactly one expression.
pub fn parse_expression(source: &str) -> Result<Expr, RunError> {
    let (tokens, mut errors) = scan_tokens(source);

    match Parser::new(&tokens).parse_expression() {
        Ok(expr) if errors.is_empty() => Ok(expr),
        Ok(_) => Err(RunError::Syntax(errors)),
        Err(parse_errors) => {
            errors.extend(parse_errors);
            Err(RunError::Syntax(errors))
        }
    }
}
