//! Proxy trap forwarding and invariant enforcement.

mod common;

use common::*;
use jsrt::ast::*;
use jsrt::builder::*;

fn concat(parts: Vec<Expression>) -> Expression {
    parts
        .into_iter()
        .reduce(|acc, e| binary(BinaryOp::Add, acc, e))
        .unwrap_or_else(|| string(""))
}

fn proxy(target: Expression, handler: Expression) -> Expression {
    new(ident("Proxy"), vec![target, handler])
}

fn trap(name: &str, params: &[&str], body: Vec<Statement>) -> PropertyDefinition {
    method_prop(name, params, body)
}

fn non_configurable_constant(target: &str, key: &str, value: Expression) -> Statement {
    expr_stmt(method_call(
        ident("Object"),
        "defineProperty",
        vec![ident(target), string(key), object(vec![prop("value", value)])],
    ))
}

#[test]
fn get_trap_sees_target_key_and_receiver() {
    // var p = new Proxy({ a: 1 }, { get(t, k, r) { return k === "a" ? t[k] * 10 : (r === p) + ""; } }); p.a + "," + p.other
    let v = eval_display(vec![
        var(
            "p",
            proxy(
                object(vec![prop("a", num(1.0))]),
                object(vec![trap(
                    "get",
                    &["t", "k", "r"],
                    vec![ret(cond(
                        binary(BinaryOp::StrictEq, ident("k"), string("a")),
                        binary(BinaryOp::Mul, index(ident("t"), ident("k")), num(10.0)),
                        binary(BinaryOp::Add, binary(BinaryOp::StrictEq, ident("r"), ident("p")), string("")),
                    ))],
                )]),
            ),
        ),
        expr_stmt(concat(vec![member(ident("p"), "a"), string(","), member(ident("p"), "other")])),
    ]);
    assert_eq!(v, "10,true");
}

#[test]
fn missing_traps_forward_to_the_target() {
    // var t = {}; var p = new Proxy(t, {}); p.x = 3; delete p.y; t.x + "," + ("x" in p) + "," + Object.keys(p).join()
    let v = eval_display(vec![
        var("t", object(vec![])),
        var("p", proxy(ident("t"), object(vec![]))),
        expr_stmt(assign(member(ident("p"), "x"), num(3.0))),
        expr_stmt(concat(vec![
            member(ident("t"), "x"),
            string(","),
            binary(BinaryOp::In, string("x"), ident("p")),
            string(","),
            method_call(method_call(ident("Object"), "keys", vec![ident("p")]), "join", vec![]),
        ])),
    ]);
    assert_eq!(v, "3,true,x");
}

#[test]
fn get_trap_cannot_misreport_a_frozen_value() {
    // var t = {}; Object.defineProperty(t, "k", { value: 1 }); var p = new Proxy(t, { get() { return 2; } }); p.k
    let err = thrown(vec![
        var("t", object(vec![])),
        non_configurable_constant("t", "k", num(1.0)),
        var("p", proxy(ident("t"), object(vec![trap("get", &[], vec![ret(num(2.0))])]))),
        expr_stmt(member(ident("p"), "k")),
    ]);
    assert!(err.starts_with("TypeError"), "{err}");
}

#[test]
fn get_trap_may_report_the_same_frozen_value() {
    let v = eval_display(vec![
        var("t", object(vec![])),
        non_configurable_constant("t", "k", num(1.0)),
        var("p", proxy(ident("t"), object(vec![trap("get", &[], vec![ret(num(1.0))])]))),
        expr_stmt(member(ident("p"), "k")),
    ]);
    assert_eq!(v, "1");
}

#[test]
fn has_trap_drives_the_in_operator() {
    // var p = new Proxy({}, { has(t, k) { return k === "magic"; } }); ("magic" in p) + "," + ("other" in p)
    let v = eval_display(vec![
        var(
            "p",
            proxy(
                object(vec![]),
                object(vec![trap("has", &["t", "k"], vec![ret(binary(BinaryOp::StrictEq, ident("k"), string("magic")))])]),
            ),
        ),
        expr_stmt(concat(vec![
            binary(BinaryOp::In, string("magic"), ident("p")),
            string(","),
            binary(BinaryOp::In, string("other"), ident("p")),
        ])),
    ]);
    assert_eq!(v, "true,false");
}

#[test]
fn has_trap_cannot_hide_non_configurable_properties() {
    let err = thrown(vec![
        var("t", object(vec![])),
        non_configurable_constant("t", "k", num(1.0)),
        var("p", proxy(ident("t"), object(vec![trap("has", &[], vec![ret(boolean(false))])]))),
        expr_stmt(binary(BinaryOp::In, string("k"), ident("p"))),
    ]);
    assert!(err.starts_with("TypeError"), "{err}");
}

#[test]
fn set_trap_returning_false_throws_only_in_strict_code() {
    let body = || {
        vec![
            var("p", proxy(object(vec![]), object(vec![trap("set", &[], vec![ret(boolean(false))])]))),
            expr_stmt(assign(member(ident("p"), "x"), num(1.0))),
            expr_stmt(string("done")),
        ]
    };
    assert_eq!(eval_display(body()), "done");
    assert!(thrown_strict(body()).starts_with("TypeError"));
}

#[test]
fn delete_trap_result_is_reported() {
    // var log = []; var p = new Proxy({ a: 1 }, { deleteProperty(t, k) { log.push(k); return delete t[k]; } });
    // (delete p.a) + log.join() + ("a" in p)
    let v = eval_display(vec![
        var("log", array(vec![])),
        var(
            "p",
            proxy(
                object(vec![prop("a", num(1.0))]),
                object(vec![trap(
                    "deleteProperty",
                    &["t", "k"],
                    vec![
                        expr_stmt(method_call(ident("log"), "push", vec![ident("k")])),
                        ret(delete(index(ident("t"), ident("k")))),
                    ],
                )]),
            ),
        ),
        expr_stmt(concat(vec![
            delete(member(ident("p"), "a")),
            method_call(ident("log"), "join", vec![]),
            binary(BinaryOp::In, string("a"), ident("p")),
        ])),
    ]);
    assert_eq!(v, "trueafalse");
}

#[test]
fn own_keys_trap_feeds_key_enumeration() {
    // var p = new Proxy({}, { ownKeys() { return ["b", "a"]; },
    //   getOwnPropertyDescriptor(t, k) { return { value: k, enumerable: true, configurable: true }; } });
    // Object.keys(p).join() + ":" + Reflect.ownKeys(p).length
    let v = eval_display(vec![
        var(
            "p",
            proxy(
                object(vec![]),
                object(vec![
                    trap("ownKeys", &[], vec![ret(array(vec![string("b"), string("a")]))]),
                    trap(
                        "getOwnPropertyDescriptor",
                        &["t", "k"],
                        vec![ret(object(vec![
                            prop("value", ident("k")),
                            prop("enumerable", boolean(true)),
                            prop("configurable", boolean(true)),
                        ]))],
                    ),
                ]),
            ),
        ),
        expr_stmt(concat(vec![
            method_call(method_call(ident("Object"), "keys", vec![ident("p")]), "join", vec![]),
            string(":"),
            member(method_call(ident("Reflect"), "ownKeys", vec![ident("p")]), "length"),
        ])),
    ]);
    assert_eq!(v, "b,a:2");
}

#[test]
fn own_keys_trap_rejects_duplicates_and_missing_fixed_keys() {
    let err = thrown(vec![
        var("p", proxy(object(vec![]), object(vec![trap("ownKeys", &[], vec![ret(array(vec![string("a"), string("a")]))])]))),
        expr_stmt(method_call(ident("Reflect"), "ownKeys", vec![ident("p")])),
    ]);
    assert!(err.starts_with("TypeError"), "{err}");

    let err = thrown(vec![
        var("t", object(vec![])),
        non_configurable_constant("t", "fixed", num(1.0)),
        var("p", proxy(ident("t"), object(vec![trap("ownKeys", &[], vec![ret(array(vec![]))])]))),
        expr_stmt(method_call(ident("Reflect"), "ownKeys", vec![ident("p")])),
    ]);
    assert!(err.starts_with("TypeError"), "{err}");
}

#[test]
fn own_keys_of_a_non_extensible_target_must_match_exactly() {
    // var t = Object.preventExtensions({ a: 1 });
    let target = || var("t", method_call(ident("Object"), "preventExtensions", vec![object(vec![prop("a", num(1.0))])]));
    let keys_proxy = |keys: Vec<Expression>| {
        var("p", proxy(ident("t"), object(vec![trap("ownKeys", &[], vec![ret(array(keys))])])))
    };

    // new Proxy(t, { ownKeys() { return ["a", "b"]; } }) has an extra key
    let err = thrown(vec![
        target(),
        keys_proxy(vec![string("a"), string("b")]),
        expr_stmt(method_call(ident("Reflect"), "ownKeys", vec![ident("p")])),
    ]);
    assert!(err.starts_with("TypeError"), "{err}");

    // new Proxy(t, { ownKeys() { return []; } }) drops a configurable key
    let err = thrown(vec![
        target(),
        keys_proxy(vec![]),
        expr_stmt(method_call(ident("Reflect"), "ownKeys", vec![ident("p")])),
    ]);
    assert!(err.starts_with("TypeError"), "{err}");

    let v = eval_display(vec![
        target(),
        keys_proxy(vec![string("a")]),
        expr_stmt(method_call(method_call(ident("Reflect"), "ownKeys", vec![ident("p")]), "join", vec![])),
    ]);
    assert_eq!(v, "a");
}

#[test]
fn is_extensible_trap_must_agree_with_the_target() {
    // var p = new Proxy({}, { isExtensible() { return false; } }); Object.isExtensible(p)
    let err = thrown(vec![
        var("p", proxy(object(vec![]), object(vec![trap("isExtensible", &[], vec![ret(boolean(false))])]))),
        expr_stmt(method_call(ident("Object"), "isExtensible", vec![ident("p")])),
    ]);
    assert!(err.starts_with("TypeError"), "{err}");

    // var p = new Proxy(Object.preventExtensions({}), { isExtensible() { return 1; } }); Reflect.isExtensible(p)
    let err = thrown(vec![
        var(
            "p",
            proxy(
                method_call(ident("Object"), "preventExtensions", vec![object(vec![])]),
                object(vec![trap("isExtensible", &[], vec![ret(num(1.0))])]),
            ),
        ),
        expr_stmt(method_call(ident("Reflect"), "isExtensible", vec![ident("p")])),
    ]);
    assert!(err.starts_with("TypeError"), "{err}");

    // var p = new Proxy({}, { isExtensible(t) { return Reflect.isExtensible(t); } }); Object.isExtensible(p)
    let v = eval_display(vec![
        var(
            "p",
            proxy(
                object(vec![]),
                object(vec![trap(
                    "isExtensible",
                    &["t"],
                    vec![ret(method_call(ident("Reflect"), "isExtensible", vec![ident("t")]))],
                )]),
            ),
        ),
        expr_stmt(method_call(ident("Object"), "isExtensible", vec![ident("p")])),
    ]);
    assert_eq!(v, "true");
}

#[test]
fn prevent_extensions_trap_must_agree_with_the_target() {
    // var p = new Proxy({}, { preventExtensions() { return true; } }); Reflect.preventExtensions(p)
    let err = thrown(vec![
        var("p", proxy(object(vec![]), object(vec![trap("preventExtensions", &[], vec![ret(boolean(true))])]))),
        expr_stmt(method_call(ident("Reflect"), "preventExtensions", vec![ident("p")])),
    ]);
    assert!(err.starts_with("TypeError"), "{err}");

    // var t = {}; var p = new Proxy(t, { preventExtensions(t) { Object.preventExtensions(t); return true; } });
    // Reflect.preventExtensions(p) + "," + Object.isExtensible(t)
    let v = eval_display(vec![
        var("t", object(vec![])),
        var(
            "p",
            proxy(
                ident("t"),
                object(vec![trap(
                    "preventExtensions",
                    &["t"],
                    vec![
                        expr_stmt(method_call(ident("Object"), "preventExtensions", vec![ident("t")])),
                        ret(boolean(true)),
                    ],
                )]),
            ),
        ),
        expr_stmt(concat(vec![
            method_call(ident("Reflect"), "preventExtensions", vec![ident("p")]),
            string(","),
            method_call(ident("Object"), "isExtensible", vec![ident("t")]),
        ])),
    ]);
    assert_eq!(v, "true,false");
}

#[test]
fn define_property_trap_cannot_fake_non_configurability() {
    // var p = new Proxy({}, { defineProperty() { return true; } });
    // Object.defineProperty(p, "x", { value: 1, configurable: false })
    let err = thrown(vec![
        var("p", proxy(object(vec![]), object(vec![trap("defineProperty", &[], vec![ret(boolean(true))])]))),
        expr_stmt(method_call(
            ident("Object"),
            "defineProperty",
            vec![ident("p"), string("x"), object(vec![prop("value", num(1.0)), prop("configurable", boolean(false))])],
        )),
    ]);
    assert!(err.starts_with("TypeError"), "{err}");
}

#[test]
fn prototype_traps_are_checked_against_non_extensible_targets() {
    // var t = Object.preventExtensions({}); var p = new Proxy(t, { getPrototypeOf() { return Array.prototype; } });
    // Object.getPrototypeOf(p)
    let err = thrown(vec![
        var("t", method_call(ident("Object"), "preventExtensions", vec![object(vec![])])),
        var(
            "p",
            proxy(
                ident("t"),
                object(vec![trap("getPrototypeOf", &[], vec![ret(member(ident("Array"), "prototype"))])]),
            ),
        ),
        expr_stmt(method_call(ident("Object"), "getPrototypeOf", vec![ident("p")])),
    ]);
    assert!(err.starts_with("TypeError"), "{err}");
}

#[test]
fn apply_and_construct_traps() {
    // function f(a) { return a; } var p = new Proxy(f, { apply(t, self, args) { return args[0] * 2; },
    //   construct(t, args) { return { made: args[0] }; } }); p(4) + "," + new p(5).made + "," + typeof p
    let v = eval_display(vec![
        function_decl("f", &["a"], vec![ret(ident("a"))]),
        var(
            "p",
            proxy(
                ident("f"),
                object(vec![
                    trap(
                        "apply",
                        &["t", "self", "args"],
                        vec![ret(binary(BinaryOp::Mul, index(ident("args"), num(0.0)), num(2.0)))],
                    ),
                    trap(
                        "construct",
                        &["t", "args"],
                        vec![ret(object(vec![prop("made", index(ident("args"), num(0.0)))]))],
                    ),
                ]),
            ),
        ),
        expr_stmt(concat(vec![
            call(ident("p"), vec![num(4.0)]),
            string(","),
            member(new(ident("p"), vec![num(5.0)]), "made"),
            string(","),
            typeof_(ident("p")),
        ])),
    ]);
    assert_eq!(v, "8,5,function");
}

#[test]
fn construct_trap_must_return_an_object() {
    let err = thrown(vec![
        function_decl("f", &[], vec![]),
        var("p", proxy(ident("f"), object(vec![trap("construct", &[], vec![ret(num(1.0))])]))),
        expr_stmt(new(ident("p"), vec![])),
    ]);
    assert!(err.starts_with("TypeError"), "{err}");
}

#[test]
fn proxies_of_plain_objects_are_not_callable() {
    let err = thrown(vec![
        var("p", proxy(object(vec![]), object(vec![]))),
        expr_stmt(call(ident("p"), vec![])),
    ]);
    assert!(err.starts_with("TypeError"), "{err}");
}

#[test]
fn revocation_disables_every_trap() {
    // var r = Proxy.revocable(function () {}, {}); r.revoke(); typeof r.proxy
    let v = eval_display(vec![
        var("r", method_call(ident("Proxy"), "revocable", vec![function_expr(None, &[], vec![]), object(vec![])])),
        expr_stmt(method_call(ident("r"), "revoke", vec![])),
        expr_stmt(typeof_(member(ident("r"), "proxy"))),
    ]);
    assert_eq!(v, "function");

    let err = thrown(vec![
        var("r", method_call(ident("Proxy"), "revocable", vec![object(vec![]), object(vec![])])),
        expr_stmt(method_call(ident("r"), "revoke", vec![])),
        expr_stmt(binary(BinaryOp::In, string("x"), member(ident("r"), "proxy"))),
    ]);
    assert!(err.starts_with("TypeError"), "{err}");
}

#[test]
fn traps_throwing_propagate() {
    let err = thrown(vec![
        var(
            "p",
            proxy(object(vec![]), object(vec![trap("get", &[], vec![throw(new(ident("RangeError"), vec![string("trap")]))])])),
        ),
        expr_stmt(member(ident("p"), "x")),
    ]);
    assert_eq!(err, "RangeError: trap");
}

#[test]
fn proxy_as_prototype_intercepts_inherited_lookups() {
    // var o = Object.create(new Proxy({}, { get(t, k) { return "from proxy " + k; } })); o.anything
    let v = eval_display(vec![
        var(
            "o",
            method_call(
                ident("Object"),
                "create",
                vec![proxy(
                    object(vec![]),
                    object(vec![trap("get", &["t", "k"], vec![ret(binary(BinaryOp::Add, string("from proxy "), ident("k")))])]),
                )],
            ),
        ),
        expr_stmt(member(ident("o"), "anything")),
    ]);
    assert_eq!(v, "from proxy anything");
}
