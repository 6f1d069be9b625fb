//! Centralised error hierarchy for the interpreter.
//!
//! Every subsystem (scanner, parser, runtime) converts its failure modes into
//! one of the [`LoxError`] variants defined here. Syntax errors (lexical and
//! parse) and runtime errors stay distinct variants; the driver groups them
//! into a [`RunError`] that also selects the process exit status.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

/// Exit status for command-line misuse.
pub const EX_USAGE: i32 = 64;

/// Exit status when the source contained syntax errors.
pub const EX_DATAERR: i32 = 65;

/// Exit status when execution aborted with a runtime error.
pub const EX_SOFTWARE: i32 = 70;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error. `location` is empty, ` at end` or
    /// ` at 'lexeme'`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error, tied to the token that caused it.
    #[error("{message}\n[line {}]", .token.line)]
    Runtime { message: String, token: Token },

    /// Wrapper around `std::io::Error` (transparent). Raised when the
    /// interpreter cannot write printed output.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**; the location is derived from
    /// the offending token.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        let location = if token.token_type == TokenType::EOF {
            " at end".to_string()
        } else {
            format!(" at '{}'", token.lexeme)
        };

        info!(
            "Creating Parse error: line={}{}, msg={}",
            token.line, location, message
        );

        LoxError::Parse {
            message,
            line: token.line,
            location,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            token: token.clone(),
        }
    }

    /// Source line the error points at, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoxError::Lex { line, .. } | LoxError::Parse { line, .. } => Some(*line),
            LoxError::Runtime { token, .. } => Some(token.line),
            LoxError::Io(_) => None,
        }
    }

    /// The bare message, without the line decoration.
    pub fn message(&self) -> String {
        match self {
            LoxError::Lex { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Runtime { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, LoxError::Lex { .. } | LoxError::Parse { .. })
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Why running a piece of source failed, as seen by the driver.
#[derive(Debug, Error)]
pub enum RunError {
    /// One or more lexical/parse errors; nothing was executed.
    #[error("{} syntax error(s)", .0.len())]
    Syntax(Vec<LoxError>),

    /// Execution started and was aborted by the first runtime error.
    #[error("{0}")]
    Runtime(LoxError),
}

impl RunError {
    /// Process exit status conventionally associated with this failure.
    pub const fn exit_code(&self) -> i32 {
        match self {
            RunError::Syntax(_) => EX_DATAERR,
            RunError::Runtime(_) => EX_SOFTWARE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_name_their_location() {
        let semicolon = Token::new(TokenType::SEMICOLON, ";", 3);
        let eof = Token::new(TokenType::EOF, "", 7);

        assert_eq!(
            LoxError::parse(&semicolon, "Expect expression.").to_string(),
            "[line 3] Error at ';': Expect expression."
        );
        assert_eq!(
            LoxError::parse(&eof, "Expect ';' after value.").to_string(),
            "[line 7] Error at end: Expect ';' after value."
        );
    }

    #[test]
    fn runtime_errors_put_the_line_last() {
        let minus = Token::new(TokenType::MINUS, "-", 2);
        let err = LoxError::runtime(&minus, "Operand must be a number.");

        assert_eq!(err.to_string(), "Operand must be a number.\n[line 2]");
        assert_eq!(err.line(), Some(2));
        assert!(!err.is_syntax());
    }

    #[test]
    fn exit_codes() {
        let lex = LoxError::lex(1, "Unexpected character: @");
        assert!(lex.is_syntax());
        assert_eq!(RunError::Syntax(vec![lex]).exit_code(), EX_DATAERR);

        let token = Token::new(TokenType::IDENTIFIER, "x", 1);
        let runtime = LoxError::runtime(&token, "Undefined variable 'x'.");
        assert_eq!(RunError::Runtime(runtime).exit_code(), EX_SOFTWARE);
    }
}
