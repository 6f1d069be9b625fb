use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One lexical scope. Scopes form a chain through `enclosing`, rooted at the
/// global scope. Blocks and calls push a child; closures keep their
/// defining scope alive through the shared `Rc`.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in this scope, replacing any binding of the same name
    /// here. Outer bindings are shadowed, never touched.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up, walking outward to the global scope.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Overwrite the nearest existing binding of `name`. Never creates one.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Whether `name` is bound in this scope itself (ignores enclosing ones).
    pub fn contains_local(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("a", Value::Number(1.0));

        let mut inner = Environment::with_enclosing(Rc::clone(&global));
        inner.define("a", Value::Number(2.0));

        assert_eq!(inner.get(&ident("a")).ok(), Some(Value::Number(2.0)));
        assert_eq!(global.borrow().get(&ident("a")).ok(), Some(Value::Number(1.0)));
    }

    #[test]
    fn assign_mutates_the_outer_binding() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("a", Value::Number(1.0));

        let mut inner = Environment::with_enclosing(Rc::clone(&global));
        assert!(inner.assign(&ident("a"), Value::Number(5.0)).is_ok());

        assert!(!inner.contains_local("a"));
        assert_eq!(global.borrow().get(&ident("a")).ok(), Some(Value::Number(5.0)));
    }

    #[test]
    fn missing_names_are_runtime_errors() {
        let mut env = Environment::new();

        let err = env.get(&ident("nope")).unwrap_err();
        assert_eq!(err.message(), "Undefined variable 'nope'.");

        let err = env.assign(&ident("nope"), Value::Nil).unwrap_err();
        assert_eq!(err.message(), "Undefined variable 'nope'.");
        assert!(!env.contains_local("nope"));
    }
}
