//! Static-analysis rules: everything the resolver must reject before a
//! program is allowed to run.

mod common;

use common::{assert_error_contains, errors_of, run};

// ─────────────────────────────────────────────────────────────────────────────
// break / return placement
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn break_outside_a_loop_is_rejected() {
    assert_error_contains("break;", "Can't use 'break' outside of a loop.");
}

#[test]
fn break_cannot_cross_a_function_boundary() {
    assert_error_contains(
        r#"
            while (true) {
                fun f() { break; }
                f();
            }
        "#,
        "Can't use 'break' outside of a loop.",
    );
}

#[test]
fn break_inside_a_loop_inside_a_function_is_fine() {
    let output = run(r#"
        fun countTo(limit) {
            var n = 0;
            while (true) {
                n = n + 1;
                if (n == limit) break;
            }
            return n;
        }
        print countTo(4);
    "#);
    assert_eq!(output, "4\n");
}

#[test]
fn return_at_top_level_is_rejected() {
    assert_error_contains("return 1;", "Can't return from top-level code.");
}

#[test]
fn returning_a_value_from_an_initializer_is_rejected() {
    assert_error_contains(
        "class A { init() { return 1; } }",
        "Can't return a value from an initializer.",
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Declarations
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn redeclaring_in_the_same_scope_is_rejected() {
    assert_error_contains(
        "{ var a = 1; var a = 2; print a; }",
        "There is already a variable with name 'a' in this scope.",
    );
}

#[test]
fn shadowing_across_scopes_is_allowed() {
    let output = run(r#"
        {
            var a = "outer";
            {
                var a = "inner";
                print a;
            }
            print a;
        }
    "#);
    assert_eq!(output, "inner\nouter\n");
}

#[test]
fn reading_a_local_in_its_own_initializer_is_rejected() {
    assert_error_contains(
        r#"
            var a = "outer";
            {
                var a = a;
                print a;
            }
        "#,
        "Can't read local variable in its own initializer.",
    );
}

#[test]
fn unused_locals_are_rejected() {
    assert_error_contains(
        "{ var unused = 1; }",
        "Local variable 'unused' defined but never used.",
    );
}

#[test]
fn unused_locals_are_reported_in_declaration_order() {
    let errors = errors_of("{ var first = 1; var second = 2; }");
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("'first'"), "got: {:?}", errors);
    assert!(errors[1].contains("'second'"), "got: {:?}", errors);
}

#[test]
fn an_assignment_counts_as_a_use() {
    // Writing to a local is a reference like any other; only a name that is
    // never mentioned again after its declaration is unused.
    assert_eq!(run("{ var a; a = 2; }"), "");
    assert_eq!(run("{ var b = 1; b = b + 1; print b; }"), "2\n");
}

#[test]
fn unused_globals_are_fine() {
    assert_eq!(run("var lingering = 1; print 2;"), "2\n");
}

// ─────────────────────────────────────────────────────────────────────────────
// this / super placement
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn this_outside_a_class_is_rejected() {
    assert_error_contains("print this;", "Can't use 'this' outside of a class.");
    assert_error_contains(
        "fun f() { return this; } f();",
        "Can't use 'this' outside of a class.",
    );
}

#[test]
fn super_outside_a_class_is_rejected() {
    assert_error_contains("print super.m;", "Can't use 'super' outside of a class.");
}

#[test]
fn super_in_a_class_without_superclasses_is_rejected() {
    assert_error_contains(
        "class A { m() { return super.m(); } }",
        "Can't use 'super' in a class with no superclass.",
    );
}

#[test]
fn this_in_a_static_method_is_rejected() {
    assert_error_contains(
        "class A { static s() { return this; } }",
        "Can't use 'this' in a static method.",
    );
}

#[test]
fn this_in_a_function_literal_inside_a_static_is_rejected() {
    assert_error_contains(
        r#"
            class A {
                static s() {
                    var f = fun () { return this; };
                    return f;
                }
            }
        "#,
        "Can't use 'this' in a static method.",
    );
}

#[test]
fn super_in_a_static_method_is_rejected() {
    assert_error_contains(
        r#"
            class B {
                m() { return 1; }
            }
            class A : B {
                static s() { return super.m(); }
            }
        "#,
        "Can't use 'super' in a static method.",
    );
}

#[test]
fn a_class_declared_inside_a_static_method_can_use_this() {
    let output = run(r#"
        class Factory {
            static build(name) {
                class Product {
                    init(name) { this.name = name; }
                    label() { return this.name; }
                }
                return Product(name);
            }
        }
        print Factory.build("widget").label();
    "#);
    assert_eq!(output, "widget\n");
}

#[test]
fn statics_of_a_class_nested_in_a_static_still_reject_this() {
    assert_error_contains(
        r#"
            class Outer {
                static make() {
                    class Inner {
                        static peek() { return this; }
                    }
                    return Inner;
                }
            }
        "#,
        "Can't use 'this' in a static method.",
    );
}

#[test]
fn this_in_a_function_literal_inside_a_method_is_fine() {
    let output = run(r#"
        class Greeter {
            init(name) { this.name = name; }
            maker() {
                return fun () { return "hello " + this.name; };
            }
        }
        var hello = Greeter("world").maker();
        print hello();
    "#);
    assert_eq!(output, "hello world\n");
}

// ─────────────────────────────────────────────────────────────────────────────
// Class declarations
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn a_class_cannot_inherit_from_itself() {
    assert_error_contains(
        "class Pie : Pie {}",
        "A class can't inherit from itself.",
    );
}

#[test]
fn a_class_cannot_list_itself_among_several_superclasses() {
    assert_error_contains(
        "class Crust {} class Pie : Crust, Pie {}",
        "A class can't inherit from itself.",
    );
}

#[test]
fn multiple_errors_are_all_reported() {
    let errors = errors_of("break; return 1;");
    assert_eq!(errors.len(), 2);
}
