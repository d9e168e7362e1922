//! End-to-end behavior of expressions, variables, functions and control flow.

mod common;

use common::{assert_error_contains, run};

// ─────────────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn arithmetic_precedence() {
    assert_eq!(run("print 1 + 2 * 3 - 4 / 2;"), "5\n");
}

#[test]
fn numbers_print_without_trailing_zero() {
    assert_eq!(run("print 2.5 * 2;"), "5\n");
    assert_eq!(run("print 0.5 + 0.25;"), "0.75\n");
    assert_eq!(run("print -0.0 + 3;"), "3\n");
}

#[test]
fn string_concatenation() {
    assert_eq!(run(r#"print "foo" + "bar";"#), "foobar\n");
}

#[test]
fn mixed_concatenation_coerces_the_number() {
    assert_eq!(run(r#"print 1 + "2";"#), "12\n");
    assert_eq!(run(r#"print "n = " + 4;"#), "n = 4\n");
}

#[test]
fn equality_is_strict_across_types() {
    assert_eq!(run(r#"print 1 == "1";"#), "false\n");
    assert_eq!(run("print nil == nil;"), "true\n");
    assert_eq!(run(r#"print "a" == "a";"#), "true\n");
    assert_eq!(run("print 1 != 2;"), "true\n");
}

#[test]
fn only_nil_and_false_are_falsy() {
    assert_eq!(run("print !nil;"), "true\n");
    assert_eq!(run("print !false;"), "true\n");
    assert_eq!(run("print !0;"), "false\n");
    assert_eq!(run(r#"print !"";"#), "false\n");
}

#[test]
fn ternary_is_right_associative_and_lazy() {
    assert_eq!(run("print true ? 1 : true ? 2 : 3;"), "1\n");
    assert_eq!(run("print false ? 1 : true ? 2 : 3;"), "2\n");
    // The untaken branch must not evaluate.
    assert_eq!(run("print true ? 1 : 1 / 0;"), "1\n");
}

#[test]
fn logical_operators_short_circuit() {
    let output = run(r#"
        var called = false;
        fun touch() {
            called = true;
            return true;
        }
        print false and touch();
        print called;
        print true or touch();
        print called;
    "#);
    assert_eq!(output, "false\nfalse\ntrue\nfalse\n");
}

#[test]
fn logical_operators_return_the_deciding_operand() {
    assert_eq!(run(r#"print nil or "fallback";"#), "fallback\n");
    assert_eq!(run(r#"print "first" and "second";"#), "second\n");
}

// ─────────────────────────────────────────────────────────────────────────────
// Variables and scoping
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn block_scopes_shadow_and_restore() {
    let output = run(r#"
        var a = "global";
        {
            var a = "local";
            print a;
        }
        print a;
    "#);
    assert_eq!(output, "local\nglobal\n");
}

#[test]
fn assignment_is_an_expression() {
    assert_eq!(run("var a = 1; print a = 2;"), "2\n");
}

#[test]
fn uninitialized_variable_read_is_an_error() {
    assert_error_contains("var x; print x;", "Uninitialized variable 'x'.");
}

#[test]
fn uninitialized_variable_can_be_assigned_first() {
    assert_eq!(run("var x; x = 7; print x;"), "7\n");
}

#[test]
fn undefined_variable_read_is_an_error() {
    assert_error_contains("print missing;", "Undefined variable 'missing'.");
}

#[test]
fn undefined_variable_assignment_is_an_error() {
    assert_error_contains("missing = 1;", "Undefined variable 'missing'.");
}

// ─────────────────────────────────────────────────────────────────────────────
// Control flow
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn while_loop_with_break() {
    let output = run(r#"
        var i = 0;
        while (true) {
            i = i + 1;
            if (i == 3) break;
        }
        print i;
    "#);
    assert_eq!(output, "3\n");
}

#[test]
fn break_stops_only_the_innermost_loop() {
    let output = run(r#"
        var total = 0;
        for (var i = 0; i < 3; i = i + 1) {
            var j = 0;
            while (true) {
                j = j + 1;
                if (j == 2) break;
            }
            total = total + j;
        }
        print total;
    "#);
    assert_eq!(output, "6\n");
}

#[test]
fn for_loop_desugars_correctly() {
    assert_eq!(
        run("for (var i = 0; i < 3; i = i + 1) print i;"),
        "0\n1\n2\n"
    );
}

#[test]
fn if_else_branches() {
    assert_eq!(run(r#"if (1 < 2) print "then"; else print "else";"#), "then\n");
    assert_eq!(run(r#"if (1 > 2) print "then"; else print "else";"#), "else\n");
}

// ─────────────────────────────────────────────────────────────────────────────
// Functions and closures
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn recursive_function() {
    let output = run(r#"
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 2) + fib(n - 1);
        }
        print fib(10);
    "#);
    assert_eq!(output, "55\n");
}

#[test]
fn return_without_value_yields_nil() {
    let output = run(r#"
        fun noisy() {
            print "side";
            return;
        }
        print noisy();
    "#);
    assert_eq!(output, "side\nnil\n");
}

#[test]
fn falling_off_the_end_yields_nil() {
    assert_eq!(run("fun quiet() {} print quiet();"), "nil\n");
}

#[test]
fn return_unwinds_through_a_loop() {
    let output = run(r#"
        fun firstOver(limit) {
            var n = 0;
            while (true) {
                n = n + 1;
                if (n > limit) return n;
            }
        }
        print firstOver(3);
    "#);
    assert_eq!(output, "4\n");
}

#[test]
fn closures_keep_their_defining_frame_alive() {
    let output = run(r#"
        fun makeCounter() {
            var count = 0;
            fun increment() {
                count = count + 1;
                return count;
            }
            return increment;
        }
        var counter = makeCounter();
        print counter();
        print counter();
    "#);
    assert_eq!(output, "1\n2\n");
}

#[test]
fn closures_capture_the_variable_not_its_value() {
    let output = run(r#"
        var getter = nil;
        {
            var value = "first";
            fun read() { return value; }
            getter = read;
            value = "second";
        }
        print getter();
    "#);
    assert_eq!(output, "second\n");
}

#[test]
fn two_closures_share_one_captured_slot() {
    let output = run(r#"
        var bump = nil;
        var read = nil;
        {
            var shared = 0;
            fun doBump() { shared = shared + 1; }
            fun doRead() { return shared; }
            bump = doBump;
            read = doRead;
        }
        bump();
        bump();
        print read();
    "#);
    assert_eq!(output, "2\n");
}

#[test]
fn anonymous_functions_are_values() {
    let output = run(r#"
        var twice = fun (f, x) { return f(f(x)); };
        print twice(fun (n) { return n + 1; }, 5);
    "#);
    assert_eq!(output, "7\n");
}

#[test]
fn functions_display_by_name() {
    assert_eq!(run("fun greet() { return 1; } print greet;"), "<fun greet>\n");
    assert_eq!(run("print time;"), "<native fn time>\n");
}

// ─────────────────────────────────────────────────────────────────────────────
// Natives
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn type_reports_runtime_types() {
    let output = run(r#"
        fun f() {}
        print type(1);
        print type("s");
        print type(nil);
        print type(true);
        print type(f);
        print type(time);
    "#);
    assert_eq!(
        output,
        "number\nstring\nnil\nboolean\nfunction\nnative function\n"
    );
}

#[test]
fn tonumber_parses_strings() {
    assert_eq!(run(r#"print tonumber("42") + 1;"#), "43\n");
    assert_error_contains(r#"tonumber("pear");"#, "Can't convert");
}

#[test]
fn time_is_monotonic_enough() {
    assert_eq!(run("var t = time(); print t > 0;"), "true\n");
}

// ─────────────────────────────────────────────────────────────────────────────
// Runtime error taxonomy
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn division_by_zero_is_an_error() {
    assert_error_contains("print 1 / 0;", "Division by zero.");
    assert_eq!(run("print 0 / 1;"), "0\n");
}

#[test]
fn unary_minus_requires_a_number() {
    assert_error_contains(r#"print -"muffin";"#, "Operand must be a number.");
}

#[test]
fn plus_rejects_incompatible_operands() {
    assert_error_contains(
        "print 1 + true;",
        "Operands must be two numbers or two strings.",
    );
}

#[test]
fn comparisons_require_numbers() {
    assert_error_contains(r#"print 1 < "2";"#, "Operands must be numbers.");
}

#[test]
fn calling_a_non_callable_is_an_error() {
    assert_error_contains(r#""totally"();"#, "Can only call functions and classes");
}

#[test]
fn function_arity_is_checked() {
    assert_error_contains(
        "fun f(a) { return a; } f(1, 2);",
        "Expected 1 arguments but got 2.",
    );
}

#[test]
fn runtime_errors_carry_a_line_number() {
    let errors = common::errors_of("var a = 1;\nprint a + nil;");
    assert!(errors[0].contains("[line 2]"), "got: {:?}", errors);
}
