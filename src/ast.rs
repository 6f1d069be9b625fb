//! Abstract syntax tree produced by [`crate::parser::Parser`].
//!
//! Nodes are built once and never mutated afterwards; the interpreter walks
//! them by shared reference. Function declarations are reference counted so
//! that function values can keep their body alive after the statement list
//! that declared them is gone (REPL lines, returned closures).
//!
//! Both trees free themselves iteratively: children are unlinked onto a
//! work list before a node is released, so dropping a tree nested
//! arbitrarily deep takes constant host stack.

use std::mem;
use std::rc::Rc;

use serde::Serialize;

use crate::token::Token;

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    /// Numeric literal, stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

/// Every kind of *expression*.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Literal(LiteralValue),

    /// Prefix unary operator expression: `!ready`, `-42`.
    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    /// Infix binary operator expression: `a + b`, `x <= y`, and the comma
    /// operator `a, b`.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `condition ? then_branch : else_branch`
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    Variable(Token),

    Assign {
        name: Token,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        /// The closing `)`, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },
}

/// A named function: `fun name(params) { body }`.
#[derive(Debug, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

/// Every kind of *statement*. A program is a `Vec<Stmt>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    Expression(Expr),

    Print(Expr),

    /// `"var" IDENT ("=" initializer)? ";"`
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop. `for` loops are desugared into this, with the loop's
    /// increment clause kept apart so it runs after every iteration of
    /// `body` without being treated as an expression statement.
    While {
        condition: Expr,
        body: Box<Stmt>,
        increment: Option<Expr>,
    },

    Function(Rc<FunctionDecl>),

    Return {
        /// The `return` keyword token.
        keyword: Token,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },
}

impl Expr {
    fn is_leaf(&self) -> bool {
        matches!(self, Expr::Literal(_) | Expr::Variable(_))
    }

    /// Moves every non-leaf child onto `pending`, leaving `nil` behind.
    fn detach_children(&mut self, pending: &mut Vec<Expr>) {
        fn take(slot: &mut Box<Expr>, pending: &mut Vec<Expr>) {
            if !slot.is_leaf() {
                pending.push(mem::replace(&mut **slot, Expr::Literal(LiteralValue::Nil)));
            }
        }

        match self {
            Expr::Literal(_) | Expr::Variable(_) => {}

            Expr::Unary { right: child, .. }
            | Expr::Grouping(child)
            | Expr::Assign { value: child, .. } => take(child, pending),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                take(left, pending);
                take(right, pending);
            }

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                take(condition, pending);
                take(then_branch, pending);
                take(else_branch, pending);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                take(callee, pending);
                pending.append(arguments);
            }
        }
    }
}

impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);

        while let Some(mut expr) = pending.pop() {
            expr.detach_children(&mut pending);
        }
    }
}

impl Stmt {
    fn is_nested(&self) -> bool {
        match self {
            Stmt::Block(statements) => !statements.is_empty(),
            Stmt::If { .. } | Stmt::While { .. } => true,
            _ => false,
        }
    }

    /// Moves nested child statements onto `pending`, leaving empty blocks
    /// behind. Expressions take care of themselves.
    fn detach_children(&mut self, pending: &mut Vec<Stmt>) {
        fn take(slot: &mut Box<Stmt>, pending: &mut Vec<Stmt>) {
            if slot.is_nested() {
                pending.push(mem::replace(&mut **slot, Stmt::Block(Vec::new())));
            }
        }

        match self {
            Stmt::Block(statements) => pending.append(statements),

            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                take(then_branch, pending);
                if let Some(else_branch) = else_branch {
                    take(else_branch, pending);
                }
            }

            Stmt::While { body, .. } => take(body, pending),

            _ => {}
        }
    }
}

impl Drop for Stmt {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);

        while let Some(mut stmt) = pending.pop() {
            stmt.detach_children(&mut pending);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenType};

    #[test]
    fn dropping_deeply_nested_expressions_is_iterative() {
        let mut expr = Expr::Literal(LiteralValue::Number(1.0));

        for _ in 0..200_000 {
            expr = Expr::Unary {
                operator: Token::new(TokenType::MINUS, "-", 1),
                right: Box::new(expr),
            };
        }

        drop(expr);
    }

    #[test]
    fn dropping_deeply_nested_blocks_is_iterative() {
        let mut stmt = Stmt::Print(Expr::Literal(LiteralValue::Nil));

        for _ in 0..200_000 {
            stmt = Stmt::Block(vec![stmt]);
        }

        drop(stmt);
    }
}
