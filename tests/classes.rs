//! End-to-end behavior of classes: fields, methods, `this`, initializers,
//! multi-superclass inheritance, `super`, and static methods.

mod common;

use common::{assert_error_contains, run};

// ─────────────────────────────────────────────────────────────────────────────
// Instances, fields, methods
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn classes_and_instances_display() {
    let output = run(r#"
        class Bagel {}
        var bagel = Bagel();
        print Bagel;
        print bagel;
    "#);
    assert_eq!(output, "<class Bagel>\n<instance Bagel>\n");
}

#[test]
fn fields_are_created_on_first_write() {
    let output = run(r#"
        class Bagel {}
        var bagel = Bagel();
        bagel.flavor = "sesame";
        print bagel.flavor;
    "#);
    assert_eq!(output, "sesame\n");
}

#[test]
fn methods_see_this() {
    let output = run(r#"
        class Person {
            init(name) { this.name = name; }
            greet() { return "Hi, " + this.name; }
        }
        print Person("Ada").greet();
    "#);
    assert_eq!(output, "Hi, Ada\n");
}

#[test]
fn extracted_methods_stay_bound() {
    let output = run(r#"
        class Counter {
            init() { this.count = 0; }
            bump() {
                this.count = this.count + 1;
                return this.count;
            }
        }
        var counter = Counter();
        var bump = counter.bump;
        print bump();
        print bump();
    "#);
    assert_eq!(output, "1\n2\n");
}

#[test]
fn fields_shadow_methods() {
    let output = run(r#"
        class Box {
            label() { return "method"; }
        }
        var box = Box();
        print box.label();
        box.label = fun () { return "field"; };
        print box.label();
    "#);
    assert_eq!(output, "method\nfield\n");
}

#[test]
fn instances_compare_by_identity() {
    let output = run(r#"
        class Thing {}
        var a = Thing();
        var b = Thing();
        print a == a;
        print a == b;
    "#);
    assert_eq!(output, "true\nfalse\n");
}

#[test]
fn undefined_property_is_an_error() {
    assert_error_contains("class A {} A().ghost;", "Undefined property 'ghost'.");
}

#[test]
fn property_access_requires_an_instance() {
    assert_error_contains("42 .foo;", "Only instances have properties");
    assert_error_contains("var n = 42; n.foo = 1;", "Only instances have fields");
}

// ─────────────────────────────────────────────────────────────────────────────
// Initializers
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn init_arity_is_checked() {
    assert_error_contains(
        r#"
            class Person {
                init(name) { this.name = name; }
            }
            Person("a", "b");
        "#,
        "Expected 1 arguments but got 2.",
    );
}

#[test]
fn init_invoked_as_a_method_returns_the_instance() {
    let output = run(r#"
        class Person {
            init(name) { this.name = name; }
        }
        var person = Person("Ada");
        print person.init("Grace").name;
    "#);
    assert_eq!(output, "Grace\n");
}

#[test]
fn bare_return_exits_init_early() {
    let output = run(r#"
        class Flagged {
            init(flag) {
                if (flag) return;
                this.tag = "set";
            }
        }
        print Flagged(false).tag;
    "#);
    assert_eq!(output, "set\n");
}

// ─────────────────────────────────────────────────────────────────────────────
// Inheritance
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn methods_are_inherited_and_overridable() {
    let output = run(r#"
        class Doughnut {
            cook() { return "fry until golden"; }
        }
        class BostonCream : Doughnut {
            cook() { return super.cook() + ", then fill"; }
        }
        print BostonCream().cook();
    "#);
    assert_eq!(output, "fry until golden, then fill\n");
}

#[test]
fn method_lookup_takes_the_first_match_in_declaration_order() {
    let output = run(r#"
        class Walker {
            move() { return "walks"; }
        }
        class Swimmer {
            move() { return "swims"; }
            splash() { return "splash"; }
        }
        class Duck : Walker, Swimmer {}
        var duck = Duck();
        print duck.move();
        print duck.splash();
    "#);
    assert_eq!(output, "walks\nsplash\n");
}

#[test]
fn super_with_a_parent_name_picks_that_superclass() {
    let output = run(r#"
        class Walker {
            move() { return "walks"; }
        }
        class Swimmer {
            move() { return "swims"; }
        }
        class Duck : Walker, Swimmer {
            move() { return super(Swimmer).move(); }
            walk() { return super.move(); }
        }
        var duck = Duck();
        print duck.move();
        print duck.walk();
    "#);
    assert_eq!(output, "swims\nwalks\n");
}

#[test]
fn super_with_an_unrelated_class_is_an_error() {
    assert_error_contains(
        r#"
            class A {
                m() { return 1; }
            }
            class B {}
            class C : A {
                m() { return super(B).m(); }
            }
            C().m();
        "#,
        "'B' is not a superclass.",
    );
}

#[test]
fn super_method_missing_is_an_error() {
    assert_error_contains(
        r#"
            class A {}
            class B : A {
                m() { return super.m(); }
            }
            B().m();
        "#,
        "Undefined property 'm'.",
    );
}

#[test]
fn without_own_init_every_superclass_initializer_runs() {
    let output = run(r#"
        class Named {
            init(tag) { this.name = tag; }
        }
        class Aged {
            init(tag) { this.age = tag; }
        }
        class Tagged : Named, Aged {}
        var tagged = Tagged("x");
        print tagged.name;
        print tagged.age;
    "#);
    assert_eq!(output, "x\nx\n");
}

#[test]
fn inherited_initializer_arity_names_the_superclass() {
    assert_error_contains(
        r#"
            class Pair {
                init(a, b) { this.a = a; this.b = b; }
            }
            class Solo : Pair {}
            Solo(1);
        "#,
        "Expected 2 arguments but got 1 for initializer of superclass 'Pair'.",
    );
}

#[test]
fn own_init_suppresses_superclass_initializers() {
    let output = run(r#"
        class Base {
            init() { this.base = true; }
        }
        class Derived : Base {
            init() { this.own = true; }
        }
        print Derived().own;
    "#);
    assert_eq!(output, "true\n");

    assert_error_contains(
        r#"
            class Base {
                init() { this.base = true; }
            }
            class Derived : Base {
                init() { this.own = true; }
            }
            Derived().base;
        "#,
        "Undefined property 'base'.",
    );
}

#[test]
fn superclass_must_be_a_class_value() {
    assert_error_contains(
        "var NotClass = 1; class Sub : NotClass {}",
        "Superclass must be a class",
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Static methods
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn statics_are_called_on_the_class() {
    let output = run(r#"
        class Circle {
            init(r) { this.r = r; }
            static unit() { return 1; }
        }
        print Circle.unit();
    "#);
    assert_eq!(output, "1\n");
}

#[test]
fn statics_are_inherited() {
    let output = run(r#"
        class Shape {
            static kind() { return "shape"; }
        }
        class Square : Shape {}
        print Square.kind();
    "#);
    assert_eq!(output, "shape\n");
}

#[test]
fn statics_are_not_reachable_through_instances() {
    assert_error_contains(
        r#"
            class Circle {
                static unit() { return 1; }
            }
            Circle().unit();
        "#,
        "Undefined property 'unit'.",
    );
}

#[test]
fn statics_cannot_be_assigned() {
    assert_error_contains(
        r#"
            class Circle {
                static unit() { return 1; }
            }
            Circle.unit = 3;
        "#,
        "Can't assign to static member 'unit'.",
    );
}

#[test]
fn statics_can_call_other_globals() {
    let output = run(r#"
        fun double(n) { return n * 2; }
        class Math {
            static twice(n) { return double(n); }
        }
        print Math.twice(21);
    "#);
    assert_eq!(output, "42\n");
}

#[test]
fn classes_declared_in_local_scopes_work() {
    let output = run(r#"
        var make = nil;
        {
            var suffix = "!";
            class Shout {
                init(word) { this.word = word; }
                render() { return this.word + suffix; }
            }
            fun build(word) { return Shout(word); }
            make = build;
        }
        print make("hey").render();
    "#);
    assert_eq!(output, "hey!\n");
}
