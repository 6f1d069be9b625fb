//! Runtime knobs for the interpreter.
//!
//! Two of these switch between behaviours the language has historically had:
//! bare expression statements echo their value, and `var x;` leaves `x`
//! unbound. Both defaults keep that behaviour; the CLI exposes flags to
//! change them.

/// Default limit on nested user-function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Print the value of every expression statement, like `print` does.
    pub echo_expression_statements: bool,

    /// Bind `var x;` to `nil` instead of leaving `x` undefined.
    pub bind_uninitialized_to_nil: bool,

    /// Nested call depth at which execution aborts with "Stack overflow.".
    pub max_call_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            echo_expression_statements: true,
            bind_uninitialized_to_nil: false,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl InterpreterConfig {
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo_expression_statements = echo;
        self
    }

    pub fn with_nil_vars(mut self, bind: bool) -> Self {
        self.bind_uninitialized_to_nil = bind;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}
