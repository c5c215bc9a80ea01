//! Completion records through statements: loops, labels, switch and try.

mod common;

use common::*;
use jsrt::ast::*;
use jsrt::builder::*;
use jsrt::{Completion, Interpreter, JsValue};

fn concat(parts: Vec<Expression>) -> Expression {
    parts
        .into_iter()
        .reduce(|acc, e| binary(BinaryOp::Add, acc, e))
        .unwrap_or_else(|| string(""))
}

fn append(target: &str, value: Expression) -> Statement {
    expr_stmt(assign_op(AssignOp::AddAssign, ident(target), value))
}

#[test]
fn finally_return_overrides_a_throw() {
    // function f() { try { throw new Error("lost"); } finally { return 1; } } f()
    let v = eval_display(vec![
        function_decl(
            "f",
            &[],
            vec![try_finally(
                vec![throw(new(ident("Error"), vec![string("lost")]))],
                vec![ret(num(1.0))],
            )],
        ),
        expr_stmt(call(ident("f"), vec![])),
    ]);
    assert_eq!(v, "1");
}

#[test]
fn finally_runs_on_every_exit() {
    // var log = ""; function f(k) { try { if (k) return "r"; log += "body"; } finally { log += "|fin"; } }
    // f(true); f(false); for (;;) { try { break; } finally { log += "|brk"; } } log
    let v = eval_display(vec![
        var("log", string("")),
        function_decl(
            "f",
            &["k"],
            vec![try_finally(
                vec![
                    if_(ident("k"), ret(string("r")), None),
                    append("log", string("body")),
                ],
                vec![append("log", string("|fin"))],
            )],
        ),
        expr_stmt(call(ident("f"), vec![boolean(true)])),
        expr_stmt(call(ident("f"), vec![boolean(false)])),
        for_(None, None, None, block(vec![try_finally(vec![break_(None)], vec![append("log", string("|brk"))])])),
        expr_stmt(ident("log")),
    ]);
    assert_eq!(v, "|finbody|fin|brk");
}

#[test]
fn throw_script_returns_the_raw_completion() {
    let mut interp = Interpreter::new().unwrap();
    let completion = interp.evaluate_script(&script(vec![throw(num(7.0))])).unwrap();
    match completion {
        Completion::Throw(JsValue::Number(n)) => assert_eq!(n, 7.0),
        other => panic!("expected a throw completion, got {other:?}"),
    }
}

#[test]
fn catch_then_rethrow() {
    // try { try { throw 1; } catch (e) { throw e + 1; } } catch (e) { e * 10 }
    let v = eval_display(vec![try_catch(
        vec![try_catch(
            vec![throw(num(1.0))],
            Some("e"),
            vec![throw(binary(BinaryOp::Add, ident("e"), num(1.0)))],
        )],
        Some("e"),
        vec![expr_stmt(binary(BinaryOp::Mul, ident("e"), num(10.0)))],
    )]);
    assert_eq!(v, "20");
}

#[test]
fn catch_without_binding() {
    let v = eval_display(vec![try_catch(vec![throw(num(1.0))], None, vec![expr_stmt(string("handled"))])]);
    assert_eq!(v, "handled");
}

#[test]
fn statement_list_keeps_the_last_value() {
    // 1; var x = 2;  ->  1
    assert_eq!(eval_display(vec![expr_stmt(num(1.0)), var("x", num(2.0))]), "1");
    // if (true) { "then" } else { "else" }
    assert_eq!(
        eval_display(vec![if_(
            boolean(true),
            block(vec![expr_stmt(string("then"))]),
            Some(block(vec![expr_stmt(string("else"))])),
        )]),
        "then"
    );
}

#[test]
fn loops_produce_the_last_body_value() {
    // var i = 0; while (i < 3) { i++; i * 2 }
    let v = eval_display(vec![
        var("i", num(0.0)),
        while_(
            binary(BinaryOp::Lt, ident("i"), num(3.0)),
            block(vec![
                expr_stmt(update(UpdateOp::Increment, false, ident("i"))),
                expr_stmt(binary(BinaryOp::Mul, ident("i"), num(2.0))),
            ]),
        ),
    ]);
    assert_eq!(v, "6");
}

#[test]
fn do_while_runs_the_body_first() {
    // var n = 0; do { n++; } while (false); n
    let v = eval_display(vec![
        var("n", num(0.0)),
        do_while(block(vec![expr_stmt(update(UpdateOp::Increment, false, ident("n")))]), boolean(false)),
        expr_stmt(ident("n")),
    ]);
    assert_eq!(v, "1");
}

#[test]
fn labeled_continue_and_break() {
    // var out = ""; outer: for (var i = 0; i < 3; i++) { for (var j = 0; j < 3; j++) {
    //   if (j === 1) continue outer; if (i === 2) break outer; out += i + "" + j + ";"; } } out
    let v = eval_display(vec![
        var("out", string("")),
        labeled(
            "outer",
            for_(
                Some(var("i", num(0.0))),
                Some(binary(BinaryOp::Lt, ident("i"), num(3.0))),
                Some(update(UpdateOp::Increment, false, ident("i"))),
                block(vec![for_(
                    Some(var("j", num(0.0))),
                    Some(binary(BinaryOp::Lt, ident("j"), num(3.0))),
                    Some(update(UpdateOp::Increment, false, ident("j"))),
                    block(vec![
                        if_(binary(BinaryOp::StrictEq, ident("j"), num(1.0)), continue_(Some("outer")), None),
                        if_(binary(BinaryOp::StrictEq, ident("i"), num(2.0)), break_(Some("outer")), None),
                        append("out", concat(vec![ident("i"), string(""), ident("j"), string(";")])),
                    ]),
                )]),
            ),
        ),
        expr_stmt(ident("out")),
    ]);
    assert_eq!(v, "00;10;");
}

#[test]
fn labeled_block_break() {
    // var r = "a"; l: { r += "b"; break l; r += "c"; } r
    let v = eval_display(vec![
        var("r", string("a")),
        labeled(
            "l",
            block(vec![append("r", string("b")), break_(Some("l")), append("r", string("c"))]),
        ),
        expr_stmt(ident("r")),
    ]);
    assert_eq!(v, "ab");
}

#[test]
fn switch_falls_through_and_finds_default_in_the_middle() {
    // function s(x) { var r = ""; switch (x) { case 1: r += "1"; default: r += "d"; case 2: r += "2"; break; case 3: r += "3"; } return r; }
    // s(1) + "," + s(2) + "," + s(3) + "," + s(9)
    let body = vec![
        var("r", string("")),
        switch(
            ident("x"),
            vec![
                case(num(1.0), vec![append("r", string("1"))]),
                default_case(vec![append("r", string("d"))]),
                case(num(2.0), vec![append("r", string("2")), break_(None)]),
                case(num(3.0), vec![append("r", string("3"))]),
            ],
        ),
        ret(ident("r")),
    ];
    let v = eval_display(vec![
        function_decl("s", &["x"], body),
        expr_stmt(concat(vec![
            call(ident("s"), vec![num(1.0)]),
            string(","),
            call(ident("s"), vec![num(2.0)]),
            string(","),
            call(ident("s"), vec![num(3.0)]),
            string(","),
            call(ident("s"), vec![num(9.0)]),
        ])),
    ]);
    assert_eq!(v, "1d2,2,3,d2");
}

#[test]
fn switch_uses_strict_equality() {
    // switch ("1") { case 1: "number"; break; case "1": "string"; }
    let v = eval_display(vec![switch(
        string("1"),
        vec![
            case(num(1.0), vec![expr_stmt(string("number")), break_(None)]),
            case(string("1"), vec![expr_stmt(string("string"))]),
        ],
    )]);
    assert_eq!(v, "string");
}

#[test]
fn for_in_visits_enumerable_keys_once() {
    // var p = { a: 1, shared: 1 }; var o = Object.create(p); o.b = 1; o.shared = 2;
    // Object.defineProperty(o, "hidden", { value: 1, enumerable: false }); var ks = ""; for (var k in o) ks += k; ks
    let v = eval_display(vec![
        var("p", object(vec![prop("a", num(1.0)), prop("shared", num(1.0))])),
        var("o", method_call(ident("Object"), "create", vec![ident("p")])),
        expr_stmt(assign(member(ident("o"), "b"), num(1.0))),
        expr_stmt(assign(member(ident("o"), "shared"), num(2.0))),
        expr_stmt(method_call(
            ident("Object"),
            "defineProperty",
            vec![ident("o"), string("hidden"), object(vec![prop("value", num(1.0)), prop("enumerable", boolean(false))])],
        )),
        var("ks", string("")),
        for_in(VarKind::Var, pat("k"), ident("o"), append("ks", ident("k"))),
        expr_stmt(ident("ks")),
    ]);
    assert_eq!(v, "bshareda");
}

#[test]
fn for_in_over_nullish_does_nothing() {
    let v = eval_display(vec![
        var("n", num(0.0)),
        for_in(VarKind::Var, pat("k"), null(), expr_stmt(update(UpdateOp::Increment, false, ident("n")))),
        expr_stmt(ident("n")),
    ]);
    assert_eq!(v, "0");
}

#[test]
fn for_of_break_closes_the_iterator() {
    // var closed = false; var it = { [Symbol.iterator]() { return this; }, next() { return { value: 1, done: false }; },
    //   return() { closed = true; return {}; } }; for (const x of it) break; closed
    let v = eval_display(vec![
        var("closed", boolean(false)),
        var(
            "it",
            object(vec![
                computed_prop(member(ident("Symbol"), "iterator"), function_expr(None, &[], vec![ret(this())])),
                method_prop("next", &[], vec![ret(object(vec![prop("value", num(1.0)), prop("done", boolean(false))]))]),
                method_prop(
                    "return",
                    &[],
                    vec![expr_stmt(assign(ident("closed"), boolean(true))), ret(object(vec![]))],
                ),
            ]),
        ),
        for_of(VarKind::Const, pat("x"), ident("it"), break_(None)),
        expr_stmt(ident("closed")),
    ]);
    assert_eq!(v, "true");
}

#[test]
fn for_of_destructures_entries() {
    // var s = ""; for (const [k, v] of [["a", 1], ["b", 2]]) s += k + v; s
    let v = eval_display(vec![
        var("s", string("")),
        for_of(
            VarKind::Const,
            array_pat(vec![Some(pat("k")), Some(pat("v"))]),
            array(vec![array(vec![string("a"), num(1.0)]), array(vec![string("b"), num(2.0)])]),
            append("s", binary(BinaryOp::Add, ident("k"), ident("v"))),
        ),
        expr_stmt(ident("s")),
    ]);
    assert_eq!(v, "a1b2");
}

#[test]
fn for_of_over_non_iterables_throws() {
    let err = thrown(vec![for_of(VarKind::Const, pat("x"), num(1.0), block(vec![]))]);
    assert!(err.starts_with("TypeError"), "{err}");
}

#[test]
fn loose_equality_truth_table() {
    let cases: Vec<(Expression, Expression, bool)> = vec![
        (num(1.0), string("1"), true),
        (null(), undefined(), true),
        (null(), num(0.0), false),
        (ident("NaN"), ident("NaN"), false),
        (array(vec![]), not(array(vec![])), true),
        (array(vec![num(1.0), num(2.0)]), string("1,2"), true),
        (boolean(true), string("1"), true),
        (bigint("1"), num(1.0), true),
    ];
    for (left, right, expected) in cases {
        let v = eval(vec![expr_stmt(binary(BinaryOp::Eq, left, right))]);
        assert_eq!(v.as_boolean(), Some(expected));
    }
}

#[test]
fn short_circuit_and_nullish_operators() {
    // var calls = 0; function f() { calls++; return 1; } (0 && f()) + "," + (0 || f()) + "," + (0 ?? f()) + "," + (null ?? f()) + "," + calls
    let f = || call(ident("f"), vec![]);
    let v = eval_display(vec![
        var("calls", num(0.0)),
        function_decl(
            "f",
            &[],
            vec![expr_stmt(update(UpdateOp::Increment, false, ident("calls"))), ret(num(1.0))],
        ),
        expr_stmt(concat(vec![
            logical(LogicalOp::And, num(0.0), f()),
            string(","),
            logical(LogicalOp::Or, num(0.0), f()),
            string(","),
            logical(LogicalOp::NullishCoalescing, num(0.0), f()),
            string(","),
            logical(LogicalOp::NullishCoalescing, null(), f()),
            string(","),
            ident("calls"),
        ])),
    ]);
    assert_eq!(v, "0,1,0,1,2");
}

#[test]
fn logical_assignment_only_assigns_when_needed() {
    // var a = null; var b = 1; a ??= "set"; b ||= "skipped"; a + "," + b
    let v = eval_display(vec![
        var("a", null()),
        var("b", num(1.0)),
        expr_stmt(assign_op(AssignOp::NullishAssign, ident("a"), string("set"))),
        expr_stmt(assign_op(AssignOp::LogicalOrAssign, ident("b"), string("skipped"))),
        expr_stmt(concat(vec![ident("a"), string(","), ident("b")])),
    ]);
    assert_eq!(v, "set,1");
}

#[test]
fn optional_chains_short_circuit() {
    // var o = { a: null }; typeof o.a?.b + "," + typeof o.missing?.() + "," + o?.a
    let v = eval_display(vec![
        var("o", object(vec![prop("a", null())])),
        expr_stmt(concat(vec![
            typeof_(optional_member(member(ident("o"), "a"), "b")),
            string(","),
            typeof_(optional_call(member(ident("o"), "missing"), vec![])),
            string(","),
            optional_member(ident("o"), "a"),
        ])),
    ]);
    assert_eq!(v, "undefined,undefined,null");
}

#[test]
fn conditional_and_comma() {
    // (1, 2) > 1 ? "yes" : "no"
    let v = eval_display(vec![expr_stmt(cond(
        binary(BinaryOp::Gt, seq(vec![num(1.0), num(2.0)]), num(1.0)),
        string("yes"),
        string("no"),
    ))]);
    assert_eq!(v, "yes");
}

#[test]
fn debugger_and_empty_statements_are_no_ops() {
    let v = eval_display(vec![expr_stmt(num(3.0)), Statement::Debugger, Statement::Empty]);
    assert_eq!(v, "3");
}
