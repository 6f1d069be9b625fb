//! Tree-walking evaluator.
//!
//! Statements run through [`Interpreter::execute`], which returns a [`Flow`]
//! instead of unwinding for `return`: blocks and loops stop at the first
//! `Flow::Return` and hand it outward until the function-call machinery in
//! [`crate::callable::LoxFunction`] turns it into the call's value. Runtime
//! errors travel separately as `Err(LoxError::Runtime { .. })` and abort the
//! whole program.

use std::cell::RefCell;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::ast::{Expr, LiteralValue, Stmt};
use crate::callable::{Callable, LoxFunction, NativeFn, NativeFunction};
use crate::config::InterpreterConfig;
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use crate::value::{format_number, Value};

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Ran to the end; execution continues with the next statement.
    Completed,

    /// A `return` executed; carries the function's result.
    Return(Value),
}

/// An active user-level call, innermost last.
#[derive(Debug)]
struct CallFrame {
    callee: String,
    paren: Token,
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    config: InterpreterConfig,
    out: Box<dyn Write>,
    frames: Vec<CallFrame>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter with default settings printing to stdout.
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        Self::with_output(config, Box::new(io::stdout()))
    }

    /// Interpreter whose `print` output (and echoed expression values) go
    /// to `out`. Natives such as `clock` are already registered.
    pub fn with_output(config: InterpreterConfig, out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter with {:?}", config);

        let globals = Rc::new(RefCell::new(Environment::new()));

        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            config,
            out,
            frames: Vec::new(),
        };

        debug!("Defining native function 'clock'");
        interpreter.define_native("clock", 0, clock);

        interpreter
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn globals(&self) -> &Rc<RefCell<Environment>> {
        &self.globals
    }

    /// Bind `name` in the global scope.
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.globals.borrow_mut().define(name, value);
    }

    /// Register a host function under `name`.
    pub fn define_native(&mut self, name: &str, arity: usize, func: NativeFn) {
        let native: Rc<dyn Callable> = Rc::new(NativeFunction::new(name, arity, func));
        self.define_global(name, Value::Callable(native));
    }

    /// Runtime error attributed to the innermost active call site. Meant for
    /// native functions, which have no token of their own.
    pub fn call_site_error(&self, message: impl Into<String>) -> LoxError {
        match self.frames.last() {
            Some(frame) => {
                debug!("Native error inside '{}'", frame.callee);
                LoxError::runtime(&frame.paren, message)
            }
            None => LoxError::runtime(&Token::new(TokenType::EOF, "", 0), message),
        }
    }

    /// Current nesting of user-visible calls.
    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    /// Interprets a list of statements (a "program"). Stops at the first
    /// runtime error. Globals persist across calls, which is what the REPL
    /// relies on.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                // The parser rejects top-level `return`; nothing to unwind to.
                debug!("Top-level return of {}", value);
                break;
            }
        }

        self.out.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Executes a single statement in the current environment.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                let value = self.evaluate(expr)?;

                if self.config.echo_expression_statements {
                    writeln!(self.out, "{}", value)?;
                }

                Ok(Flow::Completed)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Completed)
            }

            Stmt::Var { name, initializer } => {
                match initializer {
                    Some(expr) => {
                        let value = self.evaluate(expr)?;
                        debug!("Defining variable '{}' = {}", name.lexeme, value);
                        self.environment.borrow_mut().define(&name.lexeme, value);
                    }

                    None if self.config.bind_uninitialized_to_nil => {
                        self.environment
                            .borrow_mut()
                            .define(&name.lexeme, Value::Nil);
                    }

                    None => {
                        debug!("No initializer, '{}' left unbound", name.lexeme);
                    }
                }

                Ok(Flow::Completed)
            }

            Stmt::Block(statements) => {
                let scope = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, Rc::new(RefCell::new(scope)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Completed)
                }
            }

            Stmt::While {
                condition,
                body,
                increment,
            } => {
                debug!("Entering while loop");

                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }

                    if let Some(increment) = increment {
                        self.evaluate(increment)?;
                    }
                }

                Ok(Flow::Completed)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                );

                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Value::Callable(Rc::new(function)),
                );

                Ok(Flow::Completed)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }
        }
    }

    /// Runs `statements` with `environment` as the current scope, restoring
    /// the previous scope afterwards whether they complete, return or fail.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<Flow> {
        let previous = mem::replace(&mut self.environment, environment);

        let result = self.execute_all(statements);

        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Completed)
    }

    /// Evaluates an expression in the current environment.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Variable(name) => self.environment.borrow().get(name),

            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment
                    .borrow_mut()
                    .assign(name, value.clone())?;
                debug!("Assigned {} to '{}'", value, name.lexeme);
                Ok(value)
            }

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
                    },
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
                }
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let short_circuit = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                let Value::Callable(function) = callee else {
                    return Err(LoxError::runtime(
                        paren,
                        "Can only call functions and classes.",
                    ));
                };

                if values.len() != function.arity() {
                    return Err(LoxError::runtime(
                        paren,
                        format!(
                            "Expected {} arguments but got {}.",
                            function.arity(),
                            values.len()
                        ),
                    ));
                }

                self.call(function, paren, values)
            }
        }
    }

    /// Invokes `function`, tracking the call frame for the depth limit and
    /// for errors raised by natives.
    fn call(
        &mut self,
        function: Rc<dyn Callable>,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        if self.frames.len() >= self.config.max_call_depth {
            debug!("Call depth limit {} reached", self.config.max_call_depth);
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        debug!("Calling '{}' with {} argument(s)", function.name(), arguments.len());

        self.frames.push(CallFrame {
            callee: function.name().to_string(),
            paren: paren.clone(),
        });

        let result = function.call(self, arguments);

        self.frames.pop();
        result
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        if operator.token_type == TokenType::COMMA {
            self.evaluate(left)?;
            return self.evaluate(right);
        }

        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                (Value::String(a), Value::Number(b)) => Ok(Value::String(a + &format_number(b))),
                (Value::Number(a), Value::String(b)) => Ok(Value::String(format_number(a) + &b)),
                _ => Err(LoxError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            _ => {
                let (a, b) = number_operands(operator, &left, &right)?;

                match operator.token_type {
                    TokenType::MINUS => Ok(Value::Number(a - b)),
                    TokenType::STAR => Ok(Value::Number(a * b)),
                    TokenType::SLASH if b == 0.0 => {
                        Err(LoxError::runtime(operator, "Division by zero."))
                    }
                    TokenType::SLASH => Ok(Value::Number(a / b)),
                    TokenType::GREATER => Ok(Value::Bool(a > b)),
                    TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
                    TokenType::LESS => Ok(Value::Bool(a < b)),
                    TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
                    _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
                }
            }
        }
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => {
            debug!(
                "'{}' applied to {} and {}",
                operator.lexeme,
                left.type_name(),
                right.type_name()
            );
            Err(LoxError::runtime(operator, "Operands must be numbers."))
        }
    }
}

/// `clock()`: seconds since the Unix epoch.
fn clock(interpreter: &mut Interpreter, _arguments: &[Value]) -> Result<Value> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| interpreter.call_site_error(format!("Clock error: {}", e)))?;

    Ok(Value::Number(elapsed.as_secs_f64()))
}
