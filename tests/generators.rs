//! Generator objects driven through the iteration protocol.

mod common;

use common::*;
use jsrt::ast::*;
use jsrt::builder::*;
use std::rc::Rc;

fn join(parts: Vec<Expression>) -> Expression {
    parts
        .into_iter()
        .reduce(|acc, e| binary(BinaryOp::Add, binary(BinaryOp::Add, acc, string(",")), e))
        .unwrap_or_else(|| string(""))
}

fn yield_num(n: f64) -> Statement {
    expr_stmt(yield_(Some(num(n))))
}

/// `function* g() { yield 1; yield 2; yield 3; }`
fn one_two_three() -> Statement {
    generator_decl("g", &[], vec![yield_num(1.0), yield_num(2.0), yield_num(3.0)])
}

fn next_of(it: &str, args: Vec<Expression>) -> Expression {
    method_call(ident(it), "next", args)
}

fn step_summary(step: Expression) -> Expression {
    // step.value + ":" + step.done
    let tmp = "__step";
    let summary = binary(
        BinaryOp::Add,
        binary(BinaryOp::Add, member(ident(tmp), "value"), string(":")),
        member(ident(tmp), "done"),
    );
    call(arrow(&[tmp], summary), vec![step])
}

#[test]
fn spread_drains_a_generator() {
    // [...g()].join()
    let v = eval_display(vec![
        one_two_three(),
        expr_stmt(method_call(array(vec![spread(call(ident("g"), vec![]))]), "join", vec![])),
    ]);
    assert_eq!(v, "1,2,3");
}

#[test]
fn exhausted_generators_keep_reporting_done() {
    // var it = g(); it.next(); it.next(); it.next(); it.next(); it.next()
    let v = eval_display(vec![
        one_two_three(),
        var("it", call(ident("g"), vec![])),
        expr_stmt(next_of("it", vec![])),
        expr_stmt(next_of("it", vec![])),
        expr_stmt(next_of("it", vec![])),
        expr_stmt(join(vec![
            step_summary(next_of("it", vec![])),
            step_summary(next_of("it", vec![])),
        ])),
    ]);
    assert_eq!(v, "undefined:true,undefined:true");
}

#[test]
fn a_return_statement_sets_the_final_value() {
    // function* g() { yield 1; return "end"; } var it = g(); it.next(); it.next()
    let v = eval_display(vec![
        generator_decl("g", &[], vec![yield_num(1.0), ret(string("end"))]),
        var("it", call(ident("g"), vec![])),
        expr_stmt(next_of("it", vec![])),
        expr_stmt(step_summary(next_of("it", vec![]))),
    ]);
    assert_eq!(v, "end:true");
}

#[test]
fn the_body_does_not_run_until_the_first_next() {
    // var log = ""; function* g() { log += "started"; yield 1; } var it = g(); var before = log; it.next(); before + "|" + log
    let v = eval_display(vec![
        var("log", string("")),
        generator_decl(
            "g",
            &[],
            vec![expr_stmt(assign_op(AssignOp::AddAssign, ident("log"), string("started"))), yield_num(1.0)],
        ),
        var("it", call(ident("g"), vec![])),
        var("before", ident("log")),
        expr_stmt(next_of("it", vec![])),
        expr_stmt(binary(BinaryOp::Add, binary(BinaryOp::Add, ident("before"), string("|")), ident("log"))),
    ]);
    assert_eq!(v, "|started");
}

#[test]
fn arguments_and_this_are_captured_at_call_time() {
    // var o = { k: 10, *m(a) { yield this.k + a; yield arguments.length; } }; [...o.m(1, 2)].join()
    let mut node = FunctionNode::clone(&function_node(
        FunctionKind::Method,
        None,
        &["a"],
        vec![
            expr_stmt(yield_(Some(binary(BinaryOp::Add, member(this(), "k"), ident("a"))))),
            expr_stmt(yield_(Some(member(ident("arguments"), "length")))),
        ],
    ));
    node.is_generator = true;
    let method = PropertyDefinition::Method(PropertyName::Identifier("m".into()), Rc::new(node), MethodKind::Method);
    let v = eval_display(vec![
        var("o", object(vec![prop("k", num(10.0)), method])),
        expr_stmt(method_call(
            array(vec![spread(method_call(ident("o"), "m", vec![num(1.0), num(2.0)]))]),
            "join",
            vec![],
        )),
    ]);
    assert_eq!(v, "11,2");
}

#[test]
fn next_while_running_throws_a_type_error() {
    // var it; function* g() { it.next(); } it = g(); it.next()
    let err = thrown(vec![
        var_decl("it"),
        generator_decl("g", &[], vec![expr_stmt(next_of("it", vec![]))]),
        expr_stmt(assign(ident("it"), call(ident("g"), vec![]))),
        expr_stmt(next_of("it", vec![])),
    ]);
    assert!(err.starts_with("TypeError"), "{err}");
}

#[test]
fn return_runs_pending_finally_blocks_and_may_be_overridden() {
    // function* g() { try { yield 1; } finally { yield "cleanup"; } }
    // var it = g(); it.next(); var a = it.return(5); var b = it.next();
    // a.value + ":" + a.done + "," + b.value + ":" + b.done
    let v = eval_display(vec![
        generator_decl(
            "g",
            &[],
            vec![try_finally(vec![yield_num(1.0)], vec![expr_stmt(yield_(Some(string("cleanup"))))])],
        ),
        var("it", call(ident("g"), vec![])),
        expr_stmt(next_of("it", vec![])),
        var("a", method_call(ident("it"), "return", vec![num(5.0)])),
        var("b", next_of("it", vec![])),
        expr_stmt(join(vec![step_summary(ident("a")), step_summary(ident("b"))])),
    ]);
    assert_eq!(v, "cleanup:false,5:true");
}

#[test]
fn return_on_a_fresh_generator_completes_immediately() {
    let v = eval_display(vec![
        one_two_three(),
        var("it", call(ident("g"), vec![])),
        var("r", method_call(ident("it"), "return", vec![string("early")])),
        expr_stmt(join(vec![step_summary(ident("r")), step_summary(next_of("it", vec![]))])),
    ]);
    assert_eq!(v, "early:true,undefined:true");
}

#[test]
fn throw_is_delivered_at_the_suspended_yield() {
    // function* g() { while (true) { try { yield 1; } catch (e) { yield "caught " + e; } } }
    // var it = g(); it.next(); it.throw("x").value
    let v = eval_display(vec![
        generator_decl(
            "g",
            &[],
            vec![while_(
                boolean(true),
                block(vec![try_catch(
                    vec![yield_num(1.0)],
                    Some("e"),
                    vec![expr_stmt(yield_(Some(binary(BinaryOp::Add, string("caught "), ident("e")))))],
                )]),
            )],
        ),
        var("it", call(ident("g"), vec![])),
        expr_stmt(next_of("it", vec![])),
        expr_stmt(member(method_call(ident("it"), "throw", vec![string("x")]), "value")),
    ]);
    assert_eq!(v, "caught x");
}

#[test]
fn uncaught_throw_escapes_and_finishes_the_generator() {
    // var it = g(); it.next(); try { it.throw(new Error("boom")); } catch (e) { e.message + "," + it.next().done }
    let v = eval_display(vec![
        one_two_three(),
        var("it", call(ident("g"), vec![])),
        expr_stmt(next_of("it", vec![])),
        try_catch(
            vec![expr_stmt(method_call(ident("it"), "throw", vec![new(ident("Error"), vec![string("boom")])]))],
            Some("e"),
            vec![expr_stmt(join(vec![member(ident("e"), "message"), member(next_of("it", vec![]), "done")]))],
        ),
    ]);
    assert_eq!(v, "boom,true");
}

#[test]
fn yield_star_forwards_sent_values_and_returns_the_delegate_result() {
    // function* inner() { var x = yield "i1"; return "inner got " + x; }
    // function* outer() { var r = yield* inner(); yield r; }
    // var it = outer(); it.next(); it.next("hi").value
    let v = eval_display(vec![
        generator_decl(
            "inner",
            &[],
            vec![
                var("x", yield_(Some(string("i1")))),
                ret(binary(BinaryOp::Add, string("inner got "), ident("x"))),
            ],
        ),
        generator_decl(
            "outer",
            &[],
            vec![var("r", yield_star(call(ident("inner"), vec![]))), expr_stmt(yield_(Some(ident("r"))))],
        ),
        var("it", call(ident("outer"), vec![])),
        expr_stmt(next_of("it", vec![])),
        expr_stmt(member(next_of("it", vec![string("hi")]), "value")),
    ]);
    assert_eq!(v, "inner got hi");
}

#[test]
fn yield_star_accepts_any_iterable() {
    // function* g() { yield* [1, 2]; yield* "ab"; } [...g()].join("")
    let v = eval_display(vec![
        generator_decl(
            "g",
            &[],
            vec![
                expr_stmt(yield_star(array(vec![num(1.0), num(2.0)]))),
                expr_stmt(yield_star(string("ab"))),
            ],
        ),
        expr_stmt(method_call(array(vec![spread(call(ident("g"), vec![]))]), "join", vec![string("")])),
    ]);
    assert_eq!(v, "12ab");
}

#[test]
fn breaking_out_of_for_of_returns_the_generator() {
    // var log = []; function* g() { try { yield 1; yield 2; } finally { log.push("closed"); } }
    // for (var x of g()) { log.push(x); break; } log.join()
    let v = eval_display(vec![
        var("log", array(vec![])),
        generator_decl(
            "g",
            &[],
            vec![try_finally(
                vec![yield_num(1.0), yield_num(2.0)],
                vec![expr_stmt(method_call(ident("log"), "push", vec![string("closed")]))],
            )],
        ),
        for_of(
            VarKind::Var,
            pat("x"),
            call(ident("g"), vec![]),
            block(vec![expr_stmt(method_call(ident("log"), "push", vec![ident("x")])), break_(None)]),
        ),
        expr_stmt(method_call(ident("log"), "join", vec![])),
    ]);
    assert_eq!(v, "1,closed");
}

#[test]
fn array_destructuring_closes_partially_consumed_generators() {
    // var closed = false; function* g() { try { yield 1; yield 2; } finally { closed = true; } }
    // var [a] = g(); a + "," + closed
    let v = eval_display(vec![
        var("closed", boolean(false)),
        generator_decl(
            "g",
            &[],
            vec![try_finally(
                vec![yield_num(1.0), yield_num(2.0)],
                vec![expr_stmt(assign(ident("closed"), boolean(true)))],
            )],
        ),
        decl(VarKind::Var, array_pat(vec![Some(pat("a"))]), Some(call(ident("g"), vec![]))),
        expr_stmt(join(vec![ident("a"), ident("closed")])),
    ]);
    assert_eq!(v, "1,true");
}

#[test]
fn sent_values_accumulate_across_a_loop() {
    // function* acc() { var total = 0; while (true) { total += yield total; } }
    // var it = acc(); it.next(); it.next(1); it.next(2); it.next(3).value
    let v = eval_display(vec![
        generator_decl(
            "acc",
            &[],
            vec![
                var("total", num(0.0)),
                while_(
                    boolean(true),
                    block(vec![expr_stmt(assign_op(AssignOp::AddAssign, ident("total"), yield_(Some(ident("total")))))]),
                ),
            ],
        ),
        var("it", call(ident("acc"), vec![])),
        expr_stmt(next_of("it", vec![])),
        expr_stmt(next_of("it", vec![num(1.0)])),
        expr_stmt(next_of("it", vec![num(2.0)])),
        expr_stmt(member(next_of("it", vec![num(3.0)]), "value")),
    ]);
    assert_eq!(v, "6");
}

#[test]
fn generator_objects_inherit_from_the_function_prototype_property() {
    // var it = g(); (Object.getPrototypeOf(it) === g.prototype) + "," + (it[Symbol.iterator]() === it) + "," +
    //   Object.prototype.toString.call(it) + "," + Object.getPrototypeOf(g).constructor.name
    let get_proto = |e: Expression| method_call(ident("Object"), "getPrototypeOf", vec![e]);
    let v = eval_display(vec![
        one_two_three(),
        var("it", call(ident("g"), vec![])),
        expr_stmt(join(vec![
            binary(BinaryOp::StrictEq, get_proto(ident("it")), member(ident("g"), "prototype")),
            binary(
                BinaryOp::StrictEq,
                call(index(ident("it"), member(ident("Symbol"), "iterator")), vec![]),
                ident("it"),
            ),
            method_call(
                member(member(ident("Object"), "prototype"), "toString"),
                "call",
                vec![ident("it")],
            ),
            member(member(get_proto(ident("g")), "constructor"), "name"),
        ])),
    ]);
    assert_eq!(v, "true,true,[object Generator],GeneratorFunction");
}

#[test]
fn generator_functions_are_not_constructors() {
    let err = thrown(vec![one_two_three(), expr_stmt(new(ident("g"), vec![]))]);
    assert!(err.starts_with("TypeError"), "{err}");
}

#[test]
fn generator_methods_on_classes() {
    // class Range { constructor(n) { this.n = n; } *each() { for (let i = 0; i < this.n; i++) yield i; } }
    // [...new Range(4).each()].join()
    let v = eval_display(vec![
        class_decl(
            "Range",
            None,
            vec![
                constructor(&["n"], vec![expr_stmt(assign(member(this(), "n"), ident("n")))]),
                generator_method(
                    "each",
                    &[],
                    vec![for_(
                        Some(let_("i", num(0.0))),
                        Some(binary(BinaryOp::Lt, ident("i"), member(this(), "n"))),
                        Some(update(UpdateOp::Increment, false, ident("i"))),
                        expr_stmt(yield_(Some(ident("i")))),
                    )],
                ),
            ],
        ),
        expr_stmt(method_call(
            array(vec![spread(method_call(new(ident("Range"), vec![num(4.0)]), "each", vec![]))]),
            "join",
            vec![],
        )),
    ]);
    assert_eq!(v, "0,1,2,3");
}

#[test]
fn yield_inside_switch_and_labeled_loops() {
    // function* g() { outer: for (var i = 0; i < 3; i++) { switch (i) { case 1: yield "one"; continue outer; default: yield i; } } }
    let v = eval_display(vec![
        generator_decl(
            "g",
            &[],
            vec![labeled(
                "outer",
                for_(
                    Some(var("i", num(0.0))),
                    Some(binary(BinaryOp::Lt, ident("i"), num(3.0))),
                    Some(update(UpdateOp::Increment, false, ident("i"))),
                    block(vec![switch(
                        ident("i"),
                        vec![
                            case(num(1.0), vec![expr_stmt(yield_(Some(string("one")))), continue_(Some("outer"))]),
                            default_case(vec![expr_stmt(yield_(Some(ident("i"))))]),
                        ],
                    )]),
                ),
            )],
        ),
        expr_stmt(method_call(array(vec![spread(call(ident("g"), vec![]))]), "join", vec![])),
    ]);
    assert_eq!(v, "0,one,2");
}

#[test]
fn generator_methods_reject_foreign_receivers() {
    // var next = g().next; next.call({})
    let err = thrown(vec![
        one_two_three(),
        var("next", member(call(ident("g"), vec![]), "next")),
        expr_stmt(method_call(ident("next"), "call", vec![object(vec![])])),
    ]);
    assert!(err.starts_with("TypeError"), "{err}");
}
