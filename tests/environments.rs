//! Identifier resolution, declaration instantiation and scoping.

mod common;

use common::*;
use jsrt::ast::*;
use jsrt::builder::*;

fn join(parts: Vec<Expression>) -> Expression {
    parts
        .into_iter()
        .reduce(|acc, e| binary(BinaryOp::Add, binary(BinaryOp::Add, acc, string(",")), e))
        .unwrap_or_else(|| string(""))
}

#[test]
fn closures_share_their_captured_environment() {
    // function counter() { var n = 0; return function () { return ++n; }; }
    // var c = counter(); c(); c(); c()
    let v = eval_display(vec![
        function_decl(
            "counter",
            &[],
            vec![
                var("n", num(0.0)),
                ret(function_expr(None, &[], vec![ret(update(UpdateOp::Increment, true, ident("n")))])),
            ],
        ),
        var("c", call(ident("counter"), vec![])),
        expr_stmt(call(ident("c"), vec![])),
        expr_stmt(call(ident("c"), vec![])),
        expr_stmt(call(ident("c"), vec![])),
    ]);
    assert_eq!(v, "3");
}

#[test]
fn lexical_bindings_are_in_the_temporal_dead_zone() {
    // { x; let x = 1; }
    let err = thrown(vec![block(vec![expr_stmt(ident("x")), let_("x", num(1.0))])]);
    assert!(err.starts_with("ReferenceError"), "{err}");

    // typeof is not a shield for uninitialized bindings.
    let err = thrown(vec![block(vec![expr_stmt(typeof_(ident("y"))), let_("y", num(1.0))])]);
    assert!(err.starts_with("ReferenceError"), "{err}");
}

#[test]
fn const_bindings_reject_assignment() {
    let err = thrown(vec![const_("k", num(1.0)), expr_stmt(assign(ident("k"), num(2.0)))]);
    assert!(err.starts_with("TypeError"), "{err}");
}

#[test]
fn var_and_function_declarations_are_hoisted() {
    // var r = typeof v + "," + f(); var v = 1; function f() { return "hoisted"; } r
    let v = eval_display(vec![
        var("r", join(vec![typeof_(ident("v")), call(ident("f"), vec![])])),
        var("v", num(1.0)),
        function_decl("f", &[], vec![ret(string("hoisted"))]),
        expr_stmt(ident("r")),
    ]);
    assert_eq!(v, "undefined,hoisted");
}

#[test]
fn for_let_creates_a_binding_per_iteration() {
    // var fs = []; for (let i = 0; i < 3; i++) fs.push(() => i); fs[0]() + "," + fs[1]() + "," + fs[2]()
    let v = eval_display(vec![
        var("fs", array(vec![])),
        for_(
            Some(let_("i", num(0.0))),
            Some(binary(BinaryOp::Lt, ident("i"), num(3.0))),
            Some(update(UpdateOp::Increment, false, ident("i"))),
            expr_stmt(method_call(ident("fs"), "push", vec![arrow(&[], ident("i"))])),
        ),
        expr_stmt(join(vec![
            call(index(ident("fs"), num(0.0)), vec![]),
            call(index(ident("fs"), num(1.0)), vec![]),
            call(index(ident("fs"), num(2.0)), vec![]),
        ])),
    ]);
    assert_eq!(v, "0,1,2");
}

#[test]
fn for_var_shares_one_binding() {
    let v = eval_display(vec![
        var("fs", array(vec![])),
        for_(
            Some(var("i", num(0.0))),
            Some(binary(BinaryOp::Lt, ident("i"), num(3.0))),
            Some(update(UpdateOp::Increment, false, ident("i"))),
            expr_stmt(method_call(ident("fs"), "push", vec![arrow(&[], ident("i"))])),
        ),
        expr_stmt(join(vec![call(index(ident("fs"), num(0.0)), vec![]), call(index(ident("fs"), num(2.0)), vec![])])),
    ]);
    assert_eq!(v, "3,3");
}

#[test]
fn block_scopes_shadow_outer_bindings() {
    // let x = "outer"; { let x = "inner"; } x
    let v = eval_display(vec![
        let_("x", string("outer")),
        block(vec![let_("x", string("inner"))]),
        expr_stmt(ident("x")),
    ]);
    assert_eq!(v, "outer");
}

#[test]
fn global_var_lives_on_the_global_object_but_let_does_not() {
    // var v = 1; let l = 2; globalThis.v + "," + globalThis.l + "," + l
    let v = eval_display(vec![
        var("v", num(1.0)),
        let_("l", num(2.0)),
        expr_stmt(join(vec![member(ident("globalThis"), "v"), member(ident("globalThis"), "l"), ident("l")])),
    ]);
    assert_eq!(v, "1,undefined,2");
}

#[test]
fn lexical_declarations_persist_across_scripts() {
    let mut interp = jsrt::Interpreter::new().unwrap();
    interp.run(&script(vec![let_("shared", num(41.0))])).unwrap();
    let v = interp
        .run(&script(vec![expr_stmt(binary(BinaryOp::Add, ident("shared"), num(1.0)))]))
        .unwrap();
    assert_eq!(v.as_number(), Some(42.0));

    // Redeclaring a lexical name in a later script is an early SyntaxError.
    let err = interp.run(&script(vec![var("shared", num(0.0))])).unwrap_err();
    assert!(err.to_string().contains("SyntaxError"), "{err}");
}

#[test]
fn unresolvable_writes_create_globals_only_in_sloppy_mode() {
    let v = eval_display(vec![
        expr_stmt(assign(ident("implicit"), num(5.0))),
        expr_stmt(member(ident("globalThis"), "implicit")),
    ]);
    assert_eq!(v, "5");

    let err = thrown_strict(vec![expr_stmt(assign(ident("implicit"), num(5.0)))]);
    assert!(err.starts_with("ReferenceError"), "{err}");
}

#[test]
fn with_resolves_through_the_object_and_honours_unscopables() {
    // var o = { a: 1, b: 2 }; o[Symbol.unscopables] = { b: true }; var b = "outer";
    // with (o) { a + "," + b }
    let v = eval_display(vec![
        var("o", object(vec![prop("a", num(1.0)), prop("b", num(2.0))])),
        expr_stmt(assign(
            index(ident("o"), member(ident("Symbol"), "unscopables")),
            object(vec![prop("b", boolean(true))]),
        )),
        var("b", string("outer")),
        with(ident("o"), block(vec![expr_stmt(join(vec![ident("a"), ident("b")]))])),
    ]);
    assert_eq!(v, "1,outer");
}

#[test]
fn with_assignment_targets_the_object() {
    // var o = { x: 1 }; with (o) { x = 2; } o.x
    let v = eval_display(vec![
        var("o", object(vec![prop("x", num(1.0))])),
        with(ident("o"), block(vec![expr_stmt(assign(ident("x"), num(2.0)))])),
        expr_stmt(member(ident("o"), "x")),
    ]);
    assert_eq!(v, "2");
}

#[test]
fn destructuring_declarations_with_defaults_and_rest() {
    // var { a, b = 2, ...others } = { a: 1, c: 3, d: 4 }; var [x, , y = 9, ...tail] = [5, 6, undefined, 7, 8];
    // a + b + "," + Object.keys(others).join("") + "," + x + y + "," + tail.join("")
    let v = eval_display(vec![
        decl(
            VarKind::Var,
            object_pat(vec![
                ("a", pat("a")),
                ("b", pat_default(pat("b"), num(2.0))),
                ("others", rest(pat("others"))),
            ]),
            Some(object(vec![prop("a", num(1.0)), prop("c", num(3.0)), prop("d", num(4.0))])),
        ),
        decl(
            VarKind::Var,
            array_pat(vec![Some(pat("x")), None, Some(pat_default(pat("y"), num(9.0))), Some(rest(pat("tail")))]),
            Some(array(vec![num(5.0), num(6.0), undefined(), num(7.0), num(8.0)])),
        ),
        expr_stmt(join(vec![
            binary(BinaryOp::Add, ident("a"), ident("b")),
            method_call(method_call(ident("Object"), "keys", vec![ident("others")]), "join", vec![string("")]),
            binary(BinaryOp::Add, ident("x"), ident("y")),
            method_call(ident("tail"), "join", vec![string("")]),
        ])),
    ]);
    assert_eq!(v, "3,cd,14,78");
}

#[test]
fn destructuring_null_throws() {
    let err = thrown(vec![decl(VarKind::Let, object_pat(vec![("a", pat("a"))]), Some(null()))]);
    assert!(err.starts_with("TypeError"), "{err}");
}

#[test]
fn sloppy_arguments_alias_parameters() {
    // function f(a) { arguments[0] = 5; return a; } f(1)
    let body = || {
        vec![
            expr_stmt(assign(index(ident("arguments"), num(0.0)), num(5.0))),
            ret(ident("a")),
        ]
    };
    let v = eval_display(vec![function_decl("f", &["a"], body()), expr_stmt(call(ident("f"), vec![num(1.0)]))]);
    assert_eq!(v, "5");

    let mut strict_body = vec![use_strict()];
    strict_body.extend(body());
    let v = eval_display(vec![function_decl("f", &["a"], strict_body), expr_stmt(call(ident("f"), vec![num(1.0)]))]);
    assert_eq!(v, "1");
}

#[test]
fn arguments_length_counts_passed_values() {
    // function f(a, b) { return arguments.length + ":" + f.length; } f(1, 2, 3)
    let v = eval_display(vec![
        function_decl(
            "f",
            &["a", "b"],
            vec![ret(binary(
                BinaryOp::Add,
                binary(BinaryOp::Add, member(ident("arguments"), "length"), string(":")),
                member(ident("f"), "length"),
            ))],
        ),
        expr_stmt(call(ident("f"), vec![num(1.0), num(2.0), num(3.0)])),
    ]);
    assert_eq!(v, "3:2");
}

#[test]
fn catch_parameter_is_scoped_to_the_handler() {
    // var e = "outer"; try { throw "inner"; } catch (e) { e; } e
    let v = eval_display(vec![
        var("e", string("outer")),
        try_catch(vec![throw(string("inner"))], Some("e"), vec![expr_stmt(ident("e"))]),
        expr_stmt(ident("e")),
    ]);
    assert_eq!(v, "outer");
}

#[test]
fn undeclared_reads_throw_reference_errors() {
    let err = thrown(vec![expr_stmt(ident("nowhere"))]);
    assert_eq!(err, "ReferenceError: nowhere is not defined");
}
