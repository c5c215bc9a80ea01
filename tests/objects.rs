//! Property descriptors, prototype chains and the array length invariant.

mod common;

use common::*;
use jsrt::ast::*;
use jsrt::builder::*;

fn object_static(name: &str, args: Vec<Expression>) -> Expression {
    method_call(ident("Object"), name, args)
}

fn descriptor(props: Vec<PropertyDefinition>) -> Expression {
    object(props)
}

#[test]
fn inherited_data_properties_are_shadowed_on_write() {
    // var p = { k: 1 }; var c = Object.create(p); c.k = 2; p.k + "," + c.k
    let v = eval_display(vec![
        var("p", object(vec![prop("k", num(1.0))])),
        var("c", object_static("create", vec![ident("p")])),
        expr_stmt(assign(member(ident("c"), "k"), num(2.0))),
        expr_stmt(binary(
            BinaryOp::Add,
            binary(BinaryOp::Add, member(ident("p"), "k"), string(",")),
            member(ident("c"), "k"),
        )),
    ]);
    assert_eq!(v, "1,2");
}

#[test]
fn deep_prototype_lookup() {
    // var a = { x: "deep" }; var b = Object.create(a); var c = Object.create(b); c.x
    let v = eval_display(vec![
        var("a", object(vec![prop("x", string("deep"))])),
        var("b", object_static("create", vec![ident("a")])),
        var("c", object_static("create", vec![ident("b")])),
        expr_stmt(member(ident("c"), "x")),
    ]);
    assert_eq!(v, "deep");
}

#[test]
fn read_only_inherited_property_blocks_assignment() {
    // var p = Object.defineProperty({}, "k", { value: 1 }); var c = Object.create(p);
    // c.k = 2; c.k + ":" + c.hasOwnProperty("k")
    let setup = || {
        vec![
            var(
                "p",
                object_static("defineProperty", vec![object(vec![]), string("k"), descriptor(vec![prop("value", num(1.0))])]),
            ),
            var("c", object_static("create", vec![ident("p")])),
            expr_stmt(assign(member(ident("c"), "k"), num(2.0))),
        ]
    };
    let mut body = setup();
    body.push(expr_stmt(binary(
        BinaryOp::Add,
        binary(BinaryOp::Add, member(ident("c"), "k"), string(":")),
        method_call(ident("c"), "hasOwnProperty", vec![string("k")]),
    )));
    assert_eq!(eval_display(body), "1:false");

    assert!(thrown_strict(setup()).starts_with("TypeError"));
}

#[test]
fn frozen_data_property_rejects_redefinition() {
    // var o = {}; Object.defineProperty(o, "x", { value: 1 });
    // Reflect.defineProperty(o, "x", { value: 2 }) + ":" + o.x
    let base = || {
        vec![
            var("o", object(vec![])),
            expr_stmt(object_static("defineProperty", vec![ident("o"), string("x"), descriptor(vec![prop("value", num(1.0))])])),
        ]
    };
    let mut body = base();
    body.push(expr_stmt(binary(
        BinaryOp::Add,
        binary(
            BinaryOp::Add,
            method_call(ident("Reflect"), "defineProperty", vec![ident("o"), string("x"), descriptor(vec![prop("value", num(2.0))])]),
            string(":"),
        ),
        member(ident("o"), "x"),
    )));
    assert_eq!(eval_display(body), "false:1");

    // Same value is not a change.
    let mut body = base();
    body.push(expr_stmt(method_call(
        ident("Reflect"),
        "defineProperty",
        vec![ident("o"), string("x"), descriptor(vec![prop("value", num(1.0))])],
    )));
    assert_eq!(eval_display(body), "true");

    let mut body = base();
    body.push(expr_stmt(object_static(
        "defineProperty",
        vec![ident("o"), string("x"), descriptor(vec![prop("value", num(2.0))])],
    )));
    assert!(thrown(body).starts_with("TypeError"));
}

#[test]
fn descriptor_defaults_and_round_trip() {
    // var o = {}; Object.defineProperty(o, "x", { value: 1 });
    // var d = Object.getOwnPropertyDescriptor(o, "x"); "" + d.writable + d.enumerable + d.configurable
    let v = eval_display(vec![
        var("o", object(vec![])),
        expr_stmt(object_static("defineProperty", vec![ident("o"), string("x"), descriptor(vec![prop("value", num(1.0))])])),
        var("d", object_static("getOwnPropertyDescriptor", vec![ident("o"), string("x")])),
        expr_stmt(binary(
            BinaryOp::Add,
            binary(
                BinaryOp::Add,
                binary(BinaryOp::Add, string(""), member(ident("d"), "writable")),
                member(ident("d"), "enumerable"),
            ),
            member(ident("d"), "configurable"),
        )),
    ]);
    assert_eq!(v, "falsefalsefalse");
}

#[test]
fn mixed_descriptor_is_rejected() {
    let err = thrown(vec![expr_stmt(object_static(
        "defineProperty",
        vec![
            object(vec![]),
            string("x"),
            descriptor(vec![prop("value", num(1.0)), prop("get", function_expr(None, &[], vec![]))]),
        ],
    ))]);
    assert!(err.starts_with("TypeError"));
}

#[test]
fn array_length_tracks_indices() {
    // var a = [1, 2]; a[5] = "x"; var l = a.length; a.length = 1; l + ":" + a.length + ":" + a[5]
    let v = eval_display(vec![
        var("a", array(vec![num(1.0), num(2.0)])),
        expr_stmt(assign(index(ident("a"), num(5.0)), string("x"))),
        var("l", member(ident("a"), "length")),
        expr_stmt(assign(member(ident("a"), "length"), num(1.0))),
        expr_stmt(binary(
            BinaryOp::Add,
            binary(
                BinaryOp::Add,
                binary(BinaryOp::Add, binary(BinaryOp::Add, ident("l"), string(":")), member(ident("a"), "length")),
                string(":"),
            ),
            index(ident("a"), num(5.0)),
        )),
    ]);
    assert_eq!(v, "6:1:undefined");
}

#[test]
fn array_length_stops_at_non_configurable_elements() {
    // var a = [1, 2, 3]; Object.defineProperty(a, 1, { value: 9, configurable: false });
    // a.length = 0; a.length
    let v = eval_display(vec![
        var("a", array(vec![num(1.0), num(2.0), num(3.0)])),
        expr_stmt(object_static(
            "defineProperty",
            vec![ident("a"), num(1.0), descriptor(vec![prop("value", num(9.0)), prop("configurable", boolean(false))])],
        )),
        expr_stmt(assign(member(ident("a"), "length"), num(0.0))),
        expr_stmt(member(ident("a"), "length")),
    ]);
    assert_eq!(v, "2");
}

#[test]
fn invalid_array_length_is_a_range_error() {
    let err = thrown(vec![
        var("a", array(vec![])),
        expr_stmt(assign(member(ident("a"), "length"), num(-1.0))),
    ]);
    assert!(err.starts_with("RangeError"));
}

#[test]
fn same_value_differs_from_strict_equality() {
    // Object.is(NaN, NaN) + "," + (NaN === NaN) + "," + Object.is(0, -0) + "," + (0 === -0)
    let nan = || ident("NaN");
    let neg_zero = || unary(UnaryOp::Minus, num(0.0));
    let v = eval_display(vec![expr_stmt(binary(
        BinaryOp::Add,
        binary(
            BinaryOp::Add,
            binary(
                BinaryOp::Add,
                binary(
                    BinaryOp::Add,
                    binary(
                        BinaryOp::Add,
                        binary(BinaryOp::Add, object_static("is", vec![nan(), nan()]), string(",")),
                        binary(BinaryOp::StrictEq, nan(), nan()),
                    ),
                    string(","),
                ),
                object_static("is", vec![num(0.0), neg_zero()]),
            ),
            string(","),
        ),
        binary(BinaryOp::StrictEq, num(0.0), neg_zero()),
    ))]);
    assert_eq!(v, "true,false,false,true");
}

#[test]
fn accessors_receive_the_original_receiver() {
    // var p = { get full() { return this.first + " " + this.last; }, set full(v) { this.first = v; } };
    // var c = Object.create(p); c.last = "B"; c.full = "A"; c.full + ":" + p.hasOwnProperty("first")
    let v = eval_display(vec![
        var(
            "p",
            object(vec![
                getter_prop(
                    "full",
                    vec![ret(binary(
                        BinaryOp::Add,
                        binary(BinaryOp::Add, member(this(), "first"), string(" ")),
                        member(this(), "last"),
                    ))],
                ),
                setter_prop("full", "v", vec![expr_stmt(assign(member(this(), "first"), ident("v")))]),
            ]),
        ),
        var("c", object_static("create", vec![ident("p")])),
        expr_stmt(assign(member(ident("c"), "last"), string("B"))),
        expr_stmt(assign(member(ident("c"), "full"), string("A"))),
        expr_stmt(binary(
            BinaryOp::Add,
            binary(BinaryOp::Add, member(ident("c"), "full"), string(":")),
            method_call(ident("p"), "hasOwnProperty", vec![string("first")]),
        )),
    ]);
    assert_eq!(v, "A B:false");
}

#[test]
fn own_keys_order_integers_first() {
    // Object.keys({ b: 1, 10: 1, a: 1, 2: 1 }).join()
    let v = eval_display(vec![expr_stmt(method_call(
        object_static(
            "keys",
            vec![object(vec![prop("b", num(1.0)), prop("10", num(1.0)), prop("a", num(1.0)), prop("2", num(1.0))])],
        ),
        "join",
        vec![],
    ))]);
    assert_eq!(v, "2,10,b,a");
}

#[test]
fn freeze_is_observable_and_strict_writes_throw() {
    let setup = || vec![var("o", object_static("freeze", vec![object(vec![prop("x", num(1.0))])]))];

    let mut body = setup();
    body.push(expr_stmt(assign(member(ident("o"), "x"), num(2.0))));
    body.push(expr_stmt(binary(
        BinaryOp::Add,
        member(ident("o"), "x"),
        object_static("isFrozen", vec![ident("o")]),
    )));
    // 1 + true
    assert_eq!(eval_display(body), "2");

    let mut body = setup();
    body.push(expr_stmt(assign(member(ident("o"), "x"), num(2.0))));
    assert!(thrown_strict(body).starts_with("TypeError"));

    let mut body = setup();
    body.push(expr_stmt(assign(member(ident("o"), "y"), num(2.0))));
    assert!(thrown_strict(body).starts_with("TypeError"));
}

#[test]
fn delete_respects_configurability() {
    // var o = { a: 1 }; Object.defineProperty(o, "b", { value: 2 }); (delete o.a) + "," + (delete o.b) + "," + ("a" in o)
    let setup = || {
        vec![
            var("o", object(vec![prop("a", num(1.0))])),
            expr_stmt(object_static("defineProperty", vec![ident("o"), string("b"), descriptor(vec![prop("value", num(2.0))])])),
        ]
    };
    let mut body = setup();
    body.push(expr_stmt(binary(
        BinaryOp::Add,
        binary(
            BinaryOp::Add,
            binary(
                BinaryOp::Add,
                binary(BinaryOp::Add, delete(member(ident("o"), "a")), string(",")),
                delete(member(ident("o"), "b")),
            ),
            string(","),
        ),
        binary(BinaryOp::In, string("a"), ident("o")),
    )));
    assert_eq!(eval_display(body), "true,false,false");

    let mut body = setup();
    body.push(expr_stmt(delete(member(ident("o"), "b"))));
    assert!(thrown_strict(body).starts_with("TypeError"));
}

#[test]
fn object_spread_copies_own_enumerable_properties() {
    // var s = Symbol("s"); var src = { a: 1 }; src[s] = 2; Object.defineProperty(src, "h", { value: 3 });
    // var o = { ...src, b: 4 }; Object.keys(o).join() + ":" + o[s] + ":" + o.h
    let v = eval_display(vec![
        var("s", call(ident("Symbol"), vec![string("s")])),
        var("src", object(vec![prop("a", num(1.0))])),
        expr_stmt(assign(index(ident("src"), ident("s")), num(2.0))),
        expr_stmt(object_static("defineProperty", vec![ident("src"), string("h"), descriptor(vec![prop("value", num(3.0))])])),
        var("o", object(vec![spread_prop(ident("src")), prop("b", num(4.0))])),
        expr_stmt(binary(
            BinaryOp::Add,
            binary(
                BinaryOp::Add,
                binary(
                    BinaryOp::Add,
                    binary(BinaryOp::Add, method_call(object_static("keys", vec![ident("o")]), "join", vec![]), string(":")),
                    index(ident("o"), ident("s")),
                ),
                string(":"),
            ),
            member(ident("o"), "h"),
        )),
    ]);
    assert_eq!(v, "a,b:2:undefined");
}

#[test]
fn prototype_cycles_are_rejected() {
    // var a = {}; var b = Object.create(a); Reflect.setPrototypeOf(a, b)
    let v = eval_display(vec![
        var("a", object(vec![])),
        var("b", object_static("create", vec![ident("a")])),
        expr_stmt(method_call(ident("Reflect"), "setPrototypeOf", vec![ident("a"), ident("b")])),
    ]);
    assert_eq!(v, "false");
    let err = thrown(vec![
        var("a", object(vec![])),
        var("b", object_static("create", vec![ident("a")])),
        expr_stmt(object_static("setPrototypeOf", vec![ident("a"), ident("b")])),
    ]);
    assert!(err.starts_with("TypeError"));
}

#[test]
fn string_objects_expose_read_only_indices() {
    // var s = new String("hi"); s[0] = "x"; s[0] + s.length + Object.getOwnPropertyNames(s).join()
    let v = eval_display(vec![
        var("s", new(ident("String"), vec![string("hi")])),
        expr_stmt(assign(index(ident("s"), num(0.0)), string("x"))),
        expr_stmt(binary(
            BinaryOp::Add,
            binary(BinaryOp::Add, index(ident("s"), num(0.0)), member(ident("s"), "length")),
            method_call(object_static("getOwnPropertyNames", vec![ident("s")]), "join", vec![]),
        )),
    ]);
    assert_eq!(v, "h20,1,length");
}
