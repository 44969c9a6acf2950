mod common;

#[cfg(test)]
mod classes_tests {
    use pretty_assertions::assert_eq;
    use rox::RunStatus;

    use super::common::run;

    #[test]
    fn test_fields_methods_and_rendering() {
        let outcome = run(r#"
            class Point {
                init(x, y) { this.x = x; this.y = y; }
                sum() { return this.x + this.y; }
            }
            var p = Point(1, 2);
            print p.sum();
            print p;
            print Point;
            var m = p.sum;
            p.y = 10;
            print m();
        "#);

        assert_eq!(outcome.status, RunStatus::Ok);
        assert_eq!(
            outcome.lines(),
            vec!["3", "<Point instance {x=1, y=2}>", "<class Point>", "11"]
        );
    }

    #[test]
    fn test_initializer_always_yields_instance() {
        let outcome = run(r#"
            class Foo {
                init() { this.v = 1; return; }
            }
            var f = Foo();
            print f.init();
            print Foo() == f;
        "#);

        assert_eq!(outcome.lines(), vec!["<Foo instance {v=1}>", "false"]);
    }

    #[test]
    fn test_class_arity_follows_initializer() {
        let outcome = run("class Pair { init(a, b) { this.a = a; } }\nPair(1);");
        assert_eq!(outcome.diagnostics, vec!["Expected 2 arguments but got 1."]);

        let outcome = run("class Empty {}\nEmpty(1);");
        assert_eq!(outcome.diagnostics, vec!["Expected 0 arguments but got 1."]);
    }

    #[test]
    fn test_inheritance_and_super() {
        let outcome = run(r#"
            class A {
                init(n) { this.n = n; }
                greet() { return "A"; }
            }
            class B < A {
                greet() { return "B+" + super.greet(); }
            }
            var b = B(7);
            print b.greet();
            print b.n;
        "#);

        assert_eq!(outcome.status, RunStatus::Ok);
        assert_eq!(outcome.lines(), vec!["B+A", "7"]);
    }

    #[test]
    fn test_static_methods() {
        let outcome = run(r#"
            class Math {
                static square(n) { return n * n; }
                static self() { return this; }
            }
            class Geometry < Math {
                static cube(n) { return n * super.square(n); }
            }
            print Math.square(3);
            print Geometry.square(4);
            print Geometry.cube(2);
            print Math.self();
        "#);

        assert_eq!(outcome.status, RunStatus::Ok);
        assert_eq!(outcome.lines(), vec!["9", "16", "8", "<class Math>"]);
    }

    #[test]
    fn test_static_methods_are_not_instance_methods() {
        let outcome = run(r#"
            class Math { static square(n) { return n * n; } }
            print Math().square(2);
        "#);

        assert_eq!(outcome.status, RunStatus::RuntimeError);
        assert_eq!(outcome.diagnostics, vec!["Undefined property 'square'."]);
    }

    #[test]
    fn test_methods_see_their_class_by_name() {
        let outcome = run(r#"
            class Node {
                make() { return Node(); }
            }
            print Node().make();
        "#);

        assert_eq!(outcome.lines(), vec!["<Node instance {}>"]);
    }

    #[test]
    fn test_fields_shadow_methods() {
        let outcome = run(r#"
            class S { m() { return 1; } }
            var s = S();
            print s.m();
            s.m = 2;
            print s.m;
        "#);

        assert_eq!(outcome.lines(), vec!["1", "2"]);
    }

    #[test]
    fn test_cyclic_instances_print_finitely() {
        let outcome = run(r#"
            class N {}
            var a = N();
            a.me = a;
            a.tag = "x";
            print a;
        "#);

        assert_eq!(outcome.lines(), vec!["<N instance {me=<N instance>, tag=x}>"]);
    }

    #[test]
    fn test_property_faults() {
        let cases = [
            ("var n = 1;\nn.x = 2;", "Only instances have fields."),
            ("class K {}\nK.x = 1;", "Only instances have fields."),
            ("var n = 1;\nprint n.x;", "Only instances have properties."),
            ("class E {}\nprint E().missing;", "Undefined property 'missing'."),
            ("class E {}\nprint E.missing;", "Undefined property 'missing'."),
            (
                "var NotClass = 1;\nclass S < NotClass {}",
                "Superclass must be a class.",
            ),
        ];

        for (source, message) in cases {
            let outcome = run(source);
            assert_eq!(outcome.status, RunStatus::RuntimeError, "{}", source);
            assert_eq!(outcome.diagnostics, vec![message], "{}", source);
            assert_eq!(outcome.reporter.diagnostics()[0].line, 2, "{}", source);
        }
    }
}
