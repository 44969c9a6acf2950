mod common;

#[cfg(test)]
mod interpreter_tests {
    use pretty_assertions::assert_eq;
    use rox::{Config, RunStatus, Value};

    use super::common::{run, run_with, session};

    #[test]
    fn test_arithmetic_and_number_rendering() {
        let outcome = run("print 10 / 2;\nprint 1 / 3;\nprint 1 + 2 * 3;\nprint -2.5;");

        assert_eq!(outcome.status, RunStatus::Ok);
        assert_eq!(outcome.lines(), vec!["5", "0.3333333333333333", "7", "-2.5"]);
    }

    #[test]
    fn test_strings_nil_and_equality() {
        let outcome = run(r#"
            print "lox" + "ing";
            print nil;
            print 1 == "1";
            print nil == nil;
            print nil == false;
            print "a" != "b";
        "#);

        assert_eq!(
            outcome.lines(),
            vec!["loxing", "null", "false", "true", "false", "true"]
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        let outcome = run(r#"
            print nil or "fallback";
            print 0 and 2;
            print false and missing;
            print "first" or missing;
        "#);

        assert_eq!(outcome.status, RunStatus::Ok);
        assert_eq!(outcome.lines(), vec!["fallback", "2", "false", "first"]);
    }

    #[test]
    fn test_ternary_evaluates_one_branch() {
        let outcome = run(r#"
            fun boom() { print "boom"; return 0; }
            print false ? boom() : 3;
            print 1 < 2 ? "yes" : boom();
        "#);

        assert_eq!(outcome.lines(), vec!["3", "yes"]);
    }

    #[test]
    fn test_shadowing_is_resolved_statically() {
        let outcome = run(r#"
            var a = "global";
            {
                fun showA() { print a; }
                showA();
                var a = "block";
                showA();
                print a;
            }
        "#);

        assert_eq!(outcome.status, RunStatus::Ok);
        assert_eq!(outcome.lines(), vec!["global", "global", "block"]);
    }

    #[test]
    fn test_closures_capture_by_reference() {
        let outcome = run(r#"
            fun makeCounter() {
                var i = 0;
                fun count() { i = i + 1; return i; }
                return count;
            }
            var counter = makeCounter();
            print counter();
            print counter();

            var f;
            {
                var x = 1;
                fun get() { return x; }
                f = get;
                x = 2;
            }
            print f();
        "#);

        assert_eq!(outcome.lines(), vec!["1", "2", "2"]);
    }

    #[test]
    fn test_break_exits_nearest_loop() {
        let outcome = run(r#"
            var i = 0;
            while (true) {
                if (i == 3) break;
                i = i + 1;
            }
            print i;

            for (var j = 0; j < 10; j = j + 1) {
                if (j == 2) break;
                for (var k = 0; k < 10; k = k + 1) {
                    if (k == 1) break;
                    print j + k;
                }
            }
        "#);

        assert_eq!(outcome.status, RunStatus::Ok);
        assert_eq!(outcome.lines(), vec!["3", "0", "1"]);
    }

    #[test]
    fn test_return_unwinds_loops() {
        let outcome = run(r#"
            fun find() {
                for (var k = 0; k < 10; k = k + 1) {
                    while (true) {
                        if (k == 4) return k;
                        break;
                    }
                }
                return -1;
            }
            fun nothing() { return; }
            print find();
            print nothing();
        "#);

        assert_eq!(outcome.lines(), vec!["4", "null"]);
    }

    #[test]
    fn test_division_by_zero_is_not_fatal() {
        let outcome = run("print 1 / 0;\nprint \"after\";");

        assert_eq!(outcome.status, RunStatus::Ok);
        assert_eq!(outcome.lines(), vec!["0", "after"]);
        assert_eq!(outcome.diagnostics, vec!["Division by zero; result is 0."]);

        let diagnostic = &outcome.reporter.diagnostics()[0];
        assert_eq!(diagnostic.line, 1);
        assert_eq!(diagnostic.location, " at '/'");
    }

    #[test]
    fn test_undefined_variable_aborts_run_once() {
        let outcome = run("print \"before\";\nprint missing;\nprint \"after\";");

        assert_eq!(outcome.status, RunStatus::RuntimeError);
        assert_eq!(outcome.lines(), vec!["before"]);
        assert_eq!(outcome.diagnostics, vec!["Undefined variable 'missing'."]);
        assert_eq!(outcome.reporter.diagnostics()[0].line, 2);
    }

    #[test]
    fn test_static_error_suppresses_execution() {
        let outcome = run("print \"never\";\n{ var a = 1; var a = 2; print a; }");

        assert_eq!(outcome.status, RunStatus::StaticError);
        assert_eq!(outcome.output, "");
        assert_eq!(
            outcome.diagnostics,
            vec!["Already a variable with this name in this scope."]
        );

        let outcome = run("print \"ok\";\nbreak;");

        assert_eq!(outcome.status, RunStatus::StaticError);
        assert_eq!(outcome.output, "");
        assert_eq!(
            outcome.diagnostics,
            vec!["Can't use 'break' outside of a loop."]
        );
        assert_eq!(outcome.reporter.diagnostics()[0].line, 2);
    }

    #[test]
    fn test_parse_errors_are_all_reported() {
        let outcome = run("print ;\nvar = 1;\nprint \"never\";");

        assert_eq!(outcome.status, RunStatus::StaticError);
        assert_eq!(outcome.output, "");
        assert_eq!(outcome.diagnostics.len(), 2);
    }

    #[test]
    fn test_operand_faults() {
        let cases = [
            ("print -\"x\";", "Operand must be a number."),
            ("print 1 + \"a\";", "Operands must be two numbers or two strings."),
            ("print 1 < \"a\";", "Operands must be numbers."),
            ("print \"a\" * 2;", "Operands must be numbers."),
        ];

        for (source, message) in cases {
            let outcome = run(source);
            assert_eq!(outcome.status, RunStatus::RuntimeError, "{}", source);
            assert_eq!(outcome.diagnostics, vec![message], "{}", source);
        }
    }

    #[test]
    fn test_call_faults() {
        let outcome = run("\"x\"();");
        assert_eq!(
            outcome.diagnostics,
            vec!["Can only call functions and classes."]
        );

        let outcome = run("fun f(a) { return a; }\nf();");
        assert_eq!(outcome.diagnostics, vec!["Expected 1 arguments but got 0."]);
    }

    #[test]
    fn test_runaway_recursion_is_a_fault() {
        let config = Config {
            max_call_depth: 32,
            ..Config::default()
        };
        let outcome = run_with(config, "fun r(n) { return r(n + 1); }\nr(0);");

        assert_eq!(outcome.status, RunStatus::RuntimeError);
        assert_eq!(outcome.diagnostics, vec!["Stack overflow."]);
    }

    #[test]
    fn test_default_call_depth_is_reachable() {
        let countdown = "fun countdown(n) { if (n > 0) return countdown(n - 1); return 0; }";
        let limit = Config::DEFAULT_MAX_CALL_DEPTH;

        // `countdown(limit - 1)` nests exactly `limit` calls.
        let outcome = run(&format!("{}\nprint countdown({});", countdown, limit - 1));
        assert_eq!(outcome.status, RunStatus::Ok);
        assert_eq!(outcome.lines(), vec!["0"]);

        let outcome = run(&format!("{}\nprint countdown({});", countdown, limit));
        assert_eq!(outcome.status, RunStatus::RuntimeError);
        assert_eq!(outcome.diagnostics, vec!["Stack overflow."]);
    }

    #[test]
    fn test_lambdas_and_natives() {
        let outcome = run(r#"
            var add = fun (a, b) { return a + b; };
            print add(1, 2);
            print add;
            print clock;
            print clock() > 0;
            print str(12) + "!";
            print str(nil);
        "#);

        assert_eq!(
            outcome.lines(),
            vec!["3", "<fn anonymous>", "<native fn clock>", "true", "12!", "null"]
        );
    }

    #[test]
    fn test_function_rendering() {
        let outcome = run("fun hello() {}\nprint hello;");

        assert_eq!(outcome.lines(), vec!["<fn hello>"]);
    }

    #[test]
    fn test_environment_is_restored_after_a_fault() {
        let (mut session, out, reporter) = session(Config::repl());

        assert_eq!(
            session.run("{ var inner = 1; print inner; print missing; }"),
            RunStatus::RuntimeError
        );
        assert_eq!(session.run("var kept = \"yes\";"), RunStatus::Ok);
        assert_eq!(
            session.run("fun show() { print kept; }\nshow();"),
            RunStatus::Ok
        );

        assert_eq!(out.contents(), "1\nyes\n");
        assert_eq!(reporter.messages(), vec!["Undefined variable 'missing'."]);
    }

    #[test]
    fn test_repl_lines_share_state_and_echo_expressions() {
        let (mut session, out, reporter) = session(Config::repl());

        assert_eq!(session.run_line("1 + 2"), RunStatus::Ok);
        assert_eq!(session.run_line("var a = 4;"), RunStatus::Ok);
        assert_eq!(session.run_line("a * 2"), RunStatus::Ok);
        assert_eq!(session.run_line("print a;"), RunStatus::Ok);

        assert_eq!(out.contents(), "3\n8\n4\n");
        assert!(reporter.messages().is_empty());
    }

    #[test]
    fn test_evaluate_single_expression() {
        let (mut session, _, reporter) = session(Config::default());

        assert_eq!(
            session.evaluate("2 * (3 + 4)").ok(),
            Some(Value::Number(14.0))
        );
        assert_eq!(
            session.evaluate("\"a\" + \"b\"").ok(),
            Some(Value::String("ab".into()))
        );
        assert_eq!(session.evaluate("-nil").err(), Some(RunStatus::RuntimeError));
        assert_eq!(session.evaluate("1 +").err(), Some(RunStatus::StaticError));
        assert_eq!(reporter.messages().len(), 2);
    }
}
