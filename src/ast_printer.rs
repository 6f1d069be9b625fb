use crate::ast::{Expr, LiteralValue, Stmt};
use crate::token::TokenType;
use crate::value::format_number;

/// Converts an AST back to canonical source text.
///
/// Every compound expression is fully parenthesised, so the output parses
/// back into a tree with the same evaluation behaviour regardless of
/// precedence and associativity. Statements are printed one per line with
/// four-space indentation inside blocks.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => format!("\"{}\"", s),

                LiteralValue::Number(n) => format_number(*n),
            },

            // Compound nodes already print their own parentheses, and
            // `((x))` reads the same as `(x)`.
            Expr::Grouping(inner) => match inner.as_ref() {
                Expr::Binary { .. }
                | Expr::Logical { .. }
                | Expr::Conditional { .. }
                | Expr::Assign { .. }
                | Expr::Grouping(_) => Self::print(inner),
                _ => format!("({})", Self::print(inner)),
            },

            Expr::Unary { operator, right } => {
                format!("{}{}", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            } if operator.token_type == TokenType::COMMA => {
                format!("({}, {})", Self::print(left), Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                Self::print(left),
                operator.lexeme,
                Self::print(right)
            ),

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "({} ? {} : {})",
                Self::print(condition),
                Self::print(then_branch),
                Self::print(else_branch)
            ),

            Expr::Variable(name) => name.lexeme.clone(),

            Expr::Assign { name, value } => format!("({} = {})", name.lexeme, Self::print(value)),

            Expr::Call {
                callee, arguments, ..
            } => {
                let args: Vec<String> = arguments.iter().map(Self::print).collect();
                format!("{}({})", Self::print(callee), args.join(", "))
            }
        }
    }

    /// Prints a whole program, one top-level statement per line.
    pub fn program(statements: &[Stmt]) -> String {
        let mut out = String::new();

        for stmt in statements {
            Self::write_stmt(&mut out, stmt, 0);
        }

        out
    }

    fn write_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
        let indent = "    ".repeat(depth);

        if let Some(parts) = ForParts::of(stmt) {
            out.push_str(&indent);
            Self::write_for(out, parts, depth);
            return;
        }

        match stmt {
            Stmt::Expression(expr) => {
                out.push_str(&format!("{}{};\n", indent, Self::print(expr)));
            }

            Stmt::Print(expr) => {
                out.push_str(&format!("{}print {};\n", indent, Self::print(expr)));
            }

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => out.push_str(&format!(
                    "{}var {} = {};\n",
                    indent,
                    name.lexeme,
                    Self::print(init)
                )),
                None => out.push_str(&format!("{}var {};\n", indent, name.lexeme)),
            },

            Stmt::Block(statements) => {
                out.push_str(&format!("{}{{\n", indent));
                Self::write_block_tail(out, statements, depth);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push_str(&format!("{}if ({})", indent, Self::header(condition)));

                // A bare else-less `if` here would capture our `else`.
                match (then_branch.as_ref(), else_branch) {
                    (Stmt::If { else_branch: None, .. }, Some(_)) => {
                        let wrapped = Stmt::Block(vec![then_branch.as_ref().clone()]);
                        Self::write_body(out, &wrapped, depth);
                    }
                    _ => Self::write_body(out, then_branch, depth),
                }

                if let Some(else_branch) = else_branch {
                    out.push_str(&format!("{}else", indent));
                    Self::write_body(out, else_branch, depth);
                }
            }

            Stmt::While {
                condition, body, ..
            } => {
                out.push_str(&format!("{}while ({})", indent, Self::header(condition)));
                Self::write_body(out, body, depth);
            }

            Stmt::Function(decl) => {
                let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();

                out.push_str(&format!(
                    "{}fun {}({}) {{\n",
                    indent,
                    decl.name.lexeme,
                    params.join(", ")
                ));
                Self::write_block_tail(out, &decl.body, depth);
            }

            Stmt::Return { value, .. } => match value {
                Some(value) => {
                    out.push_str(&format!("{}return {};\n", indent, Self::print(value)))
                }
                None => out.push_str(&format!("{}return;\n", indent)),
            },
        }
    }

    /// Writes `for (init cond; inc)` plus its body; the caller has already
    /// written the indentation.
    fn write_for(out: &mut String, parts: ForParts<'_>, depth: usize) {
        let initializer = match parts.initializer {
            Some(init) => {
                let mut text = String::new();
                Self::write_stmt(&mut text, init, 0);
                text.trim_end().to_string()
            }
            None => ";".to_string(),
        };

        out.push_str(&format!(
            "for ({} {}; {})",
            initializer,
            Self::print(parts.condition),
            Self::print(parts.increment)
        ));
        Self::write_body(out, parts.body, depth);
    }

    /// Body of `if`, `else`, `while` or `for`. Plain blocks stay on the
    /// header line; anything else goes on its own, indented, line.
    fn write_body(out: &mut String, body: &Stmt, depth: usize) {
        match body {
            Stmt::Block(statements) if ForParts::of(body).is_none() => {
                out.push_str(" {\n");
                Self::write_block_tail(out, statements, depth);
            }
            _ => {
                out.push('\n');
                Self::write_stmt(out, body, depth + 1);
            }
        }
    }

    fn write_block_tail(out: &mut String, statements: &[Stmt], depth: usize) {
        for inner in statements {
            Self::write_stmt(out, inner, depth + 1);
        }
        out.push_str(&format!("{}}}\n", "    ".repeat(depth)));
    }

    /// Condition text for `if (...)` / `while (...)`, without the outer
    /// parentheses a compound expression would otherwise repeat.
    fn header(expr: &Expr) -> String {
        let text = Self::print(expr);

        if Self::self_parenthesised(expr) {
            text[1..text.len() - 1].to_string()
        } else {
            text
        }
    }

    fn self_parenthesised(expr: &Expr) -> bool {
        match expr {
            Expr::Binary { .. }
            | Expr::Logical { .. }
            | Expr::Conditional { .. }
            | Expr::Assign { .. } => true,
            Expr::Grouping(inner) => Self::self_parenthesised(inner),
            _ => false,
        }
    }
}

/// A desugared `for` loop: a `while` with an increment, alone or in a block
/// right after its initializer.
struct ForParts<'a> {
    initializer: Option<&'a Stmt>,
    condition: &'a Expr,
    increment: &'a Expr,
    body: &'a Stmt,
}

impl<'a> ForParts<'a> {
    fn of(stmt: &'a Stmt) -> Option<Self> {
        let (initializer, looped) = match stmt {
            Stmt::While { .. } => (None, stmt),
            Stmt::Block(statements) => match statements.as_slice() {
                [looped @ Stmt::While { .. }] => (None, looped),
                [init @ (Stmt::Var { .. } | Stmt::Expression(_)), looped @ Stmt::While { .. }] => {
                    (Some(init), looped)
                }
                _ => return None,
            },
            _ => return None,
        };

        match looped {
            Stmt::While {
                condition,
                body,
                increment: Some(increment),
            } => Some(ForParts {
                initializer,
                condition,
                increment,
                body: body.as_ref(),
            }),
            _ => None,
        }
    }
}
