mod common;

#[cfg(test)]
mod parser_tests {
    use pretty_assertions::assert_eq;

    use rox::ast::{Expr, LiteralValue, Stmt};
    use rox::ast_printer::AstPrinter;
    use rox::error::RunError;
    use rox::session;

    use crate::common::{parse_errors, parse_ok};

    fn expr(source: &str) -> Expr {
        match session::parse_expression(source) {
            Ok(expr) => expr,
            Err(e) => panic!("failed to parse {:?}: {:?}", source, e),
        }
    }

    fn shape(source: &str) -> String {
        AstPrinter::print(&expr(source))
    }

    // ───────────────────────── precedence ─────────────────────────

    #[test]
    fn test_parser_01_arithmetic_precedence() {
        assert_eq!(shape("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(shape("(1 + 2) * 3"), "((1 + 2) * 3)");
        assert_eq!(shape("-1 * 2"), "(-1 * 2)");
        assert_eq!(shape("!-1"), "!-1");
    }

    #[test]
    fn test_parser_02_binary_operators_are_left_associative() {
        assert_eq!(shape("1 - 2 - 3"), "((1 - 2) - 3)");
        assert_eq!(shape("8 / 4 / 2"), "((8 / 4) / 2)");
        assert_eq!(shape("1 < 2 == true"), "((1 < 2) == true)");
    }

    #[test]
    fn test_parser_03_conditional_is_right_associative() {
        assert_eq!(shape("a ? b : c ? d : e"), "(a ? b : (c ? d : e))");
        assert_eq!(shape("a ? b ? c : d : e"), "(a ? (b ? c : d) : e)");
    }

    #[test]
    fn test_parser_04_assignment_is_right_associative() {
        assert_eq!(shape("a = b = 1"), "(a = (b = 1))");
        assert_eq!(shape("a = b ? 1 : 2"), "(a = (b ? 1 : 2))");
    }

    #[test]
    fn test_parser_05_logical_and_comma_levels() {
        assert_eq!(shape("a or b and c"), "(a or (b and c))");
        assert_eq!(shape("1, 2, 3"), "((1, 2), 3)");
        assert_eq!(shape("x == 1, y"), "((x == 1), y)");
        assert_eq!(shape("a, b ? c : d"), "((a, b) ? c : d)");
        assert_eq!(shape("a or b, c"), "((a or b), c)");
    }

    #[test]
    fn test_parser_06_call_arguments_are_not_comma_expressions() {
        let call = expr("f(1, 2)");
        let Expr::Call { arguments, .. } = &call else {
            panic!("expected a call");
        };
        assert_eq!(arguments.len(), 2);

        let call = expr("f((1, 2))");
        let Expr::Call { arguments, .. } = &call else {
            panic!("expected a call");
        };
        assert_eq!(arguments.len(), 1);

        assert_eq!(shape("f(1)(2, g())"), "f(1)(2, g())");
    }

    // ───────────────────────── statements ─────────────────────────

    #[test]
    fn test_parser_07_for_loop_desugars_to_while() {
        let program = parse_ok("for (var i = 0; i < 3; i = i + 1) print i;");
        assert_eq!(program.len(), 1);

        let Stmt::Block(statements) = &program[0] else {
            panic!("expected a block, got {:?}", program[0]);
        };
        assert_eq!(statements.len(), 2);
        assert!(matches!(statements[0], Stmt::Var { .. }));

        match &statements[1] {
            Stmt::While {
                condition,
                body,
                increment: Some(increment),
            } => {
                assert_eq!(AstPrinter::print(condition), "(i < 3)");
                assert!(matches!(body.as_ref(), Stmt::Print(_)));
                assert_eq!(AstPrinter::print(increment), "(i = (i + 1))");
            }
            other => panic!("expected a while with increment, got {:?}", other),
        }
    }

    #[test]
    fn test_parser_08_empty_for_clauses() {
        let program = parse_ok("for (;;) print 1;");

        let Stmt::Block(statements) = &program[0] else {
            panic!("expected a block");
        };
        assert_eq!(statements.len(), 1);

        assert!(matches!(
            &statements[0],
            Stmt::While {
                condition: Expr::Literal(LiteralValue::True),
                increment: None,
                ..
            }
        ));
    }

    #[test]
    fn test_parser_09_function_declarations() {
        let program = parse_ok("fun add(a, b) { return a + b; }\nfun nothing() {}");
        assert_eq!(program.len(), 2);

        let Stmt::Function(decl) = &program[0] else {
            panic!("expected a function");
        };
        assert_eq!(decl.name.lexeme, "add");

        let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
        assert_eq!(params, vec!["a", "b"]);
        assert!(matches!(decl.body[0], Stmt::Return { value: Some(_), .. }));

        let Stmt::Function(decl) = &program[1] else {
            panic!("expected a function");
        };
        assert!(decl.params.is_empty());
        assert!(decl.body.is_empty());
    }

    #[test]
    fn test_parser_10_dangling_else_binds_to_nearest_if() {
        let program = parse_ok("if (a) if (b) print 1; else print 2;");

        let Stmt::If {
            then_branch,
            else_branch: None,
            ..
        } = &program[0]
        else {
            panic!("outer if must not own the else");
        };

        assert!(matches!(
            then_branch.as_ref(),
            Stmt::If {
                else_branch: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_parser_11_ast_serializes_to_json() {
        let program = parse_ok("print 1;");
        let json = serde_json::to_value(&program).unwrap();

        assert_eq!(json[0]["Print"]["Literal"]["Number"], serde_json::json!(1.0));
    }

    #[test]
    fn test_parser_12_deeply_nested_trees_parse_and_drop() {
        let program = parse_ok(&format!("print {}1;", "-".repeat(100_000)));
        assert_eq!(program.len(), 1);
        drop(program);

        let depth = 50_000;
        let program = parse_ok(&format!("{}print 1;{}", "{".repeat(depth), "}".repeat(depth)));
        assert!(matches!(program[0], Stmt::Block(_)));
        drop(program);
    }

    // ───────────────────────── errors ─────────────────────────

    #[test]
    fn test_parser_error_invalid_assignment_target() {
        assert_eq!(
            parse_errors("1 = 2;"),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
        assert_eq!(
            parse_errors("a + b = c;"),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
    }

    #[test]
    fn test_parser_error_recovery_reports_every_statement() {
        assert_eq!(
            parse_errors("var = 1; print ;"),
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 1] Error at ';': Expect expression.",
            ]
        );

        assert_eq!(
            parse_errors("print 1;\nprint (;\nprint 3"),
            vec![
                "[line 2] Error at ';': Expect expression.",
                "[line 3] Error at end: Expect ';' after value.",
            ]
        );
    }

    #[test]
    fn test_parser_error_at_end() {
        assert_eq!(
            parse_errors("print 1"),
            vec!["[line 1] Error at end: Expect ';' after value."]
        );
        assert_eq!(
            parse_errors("{ var a = 1;"),
            vec!["[line 1] Error at end: Expect '}' after block."]
        );
    }

    #[test]
    fn test_parser_error_unfinished_conditional() {
        assert_eq!(
            parse_errors("a ? b;"),
            vec!["[line 1] Error at ';': Expect ':' after then branch of conditional expression."]
        );
    }

    #[test]
    fn test_parser_error_top_level_return() {
        assert_eq!(
            parse_errors("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );

        parse_ok("fun f() { if (true) return 1; return; }");
    }

    #[test]
    fn test_parser_error_too_many_arguments() {
        let args = vec!["0"; 256].join(", ");
        let source = format!("f({});", args);

        assert_eq!(
            parse_errors(&source),
            vec!["[line 1] Error at '0': Can't have more than 255 arguments."]
        );
    }

    #[test]
    fn test_parser_error_trailing_tokens_in_expression() {
        match session::parse_expression("1 2") {
            Err(RunError::Syntax(errors)) => {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                assert_eq!(messages, vec!["[line 1] Error at '2': Expect end of expression."]);
            }
            other => panic!("expected a syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_lexical_errors_come_before_parse_errors() {
        let Err(error) = session::parse_program("print @; var = 2;") else {
            panic!("expected syntax errors");
        };
        assert_eq!(error.exit_code(), 65);

        let RunError::Syntax(errors) = error else {
            panic!("expected syntax errors");
        };

        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec![
                "[line 1] Error: Unexpected character: @",
                "[line 1] Error at ';': Expect expression.",
                "[line 1] Error at '=': Expect variable name.",
            ]
        );
        assert!(errors.iter().all(|e| e.is_syntax()));
    }
}
