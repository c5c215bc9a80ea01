//! %Function%, %Function.prototype% and %ThrowTypeError% (§20.2, §10.2.4.1).

use super::*;

pub(super) fn init(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    let proto = interp.realm_intrinsic(realm, Intrinsic::FunctionPrototype)?;
    interp.set_function_length(proto, 0.0)?;
    interp.set_function_name(proto, &PropertyKey::String(JsString::empty()), None)?;

    let ctor = interp.create_builtin_constructor(function_constructor, 1, "Function", proto, None)?;
    interp.set_intrinsic(realm, Intrinsic::Function, ctor)?;

    interp.define_builtin_method(proto, "apply", function_apply, 2)?;
    interp.define_builtin_method(proto, "bind", function_bind, 1)?;
    interp.define_builtin_method(proto, "call", function_call, 1)?;
    interp.define_builtin_method(proto, "toString", function_to_string, 0)?;

    let has_instance = PropertyKey::Symbol(interp.well_known_symbol(WellKnownSymbol::HasInstance));
    let f = interp.create_builtin_function(function_has_instance, 1, has_instance.clone(), None, None)?;
    interp.define_property_or_throw(proto, has_instance, PropertyDescriptor::data(JsValue::Object(f), false, false, false))?;

    let thrower = create_throw_type_error(interp)?;
    interp.set_intrinsic(realm, Intrinsic::ThrowTypeError, thrower)?;

    // §10.2.4 AddRestrictedFunctionProperties(F, realm)
    let thrower = JsValue::Object(thrower);
    for name in ["caller", "arguments"] {
        let desc = PropertyDescriptor::accessor(thrower.clone(), thrower.clone(), false, true);
        interp.define_property_or_throw(proto, name.into(), desc)?;
    }
    Ok(())
}

// §10.2.4.1 %ThrowTypeError%
fn create_throw_type_error(interp: &mut Interpreter) -> JsResult<ObjectId> {
    let f = interp.create_builtin_function(throw_type_error, 0, "", None, None)?;
    for key in ["length", "name"] {
        let desc = PropertyDescriptor {
            configurable: Some(false),
            ..Default::default()
        };
        interp.define_property_or_throw(f, key.into(), desc)?;
    }
    interp.prevent_extensions(f)?;
    Ok(f)
}

fn throw_type_error(interp: &mut Interpreter, _call: &NativeCall<'_>) -> JsResult<JsValue> {
    Err(interp.type_error(
        "'caller', 'callee', and 'arguments' properties may not be accessed on strict mode functions or the arguments objects for calls to them",
    ))
}

// §20.2.1.1 Function(...parameterArgs, bodyArg)
//
// Creating functions from source text needs a parser, which the host owns.
fn function_constructor(interp: &mut Interpreter, _call: &NativeCall<'_>) -> JsResult<JsValue> {
    Err(interp.create_error(ErrorKind::EvalError, "Code generation from strings is not supported"))
}

fn require_callable(interp: &mut Interpreter, this: &JsValue, method: &str) -> JsResult<()> {
    if !interp.is_callable(this)? {
        return Err(interp.type_error(format!("Function.prototype.{method} called on a non-function")));
    }
    Ok(())
}

// §20.2.3.1 Function.prototype.apply(thisArg, argArray)
fn function_apply(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    require_callable(interp, call.this, "apply")?;
    let arg_array = call.arg(1);
    if arg_array.is_nullish() {
        return interp.call(call.this, &call.arg(0), &[]);
    }
    let args = interp.create_list_from_array_like(&arg_array)?;
    interp.call(call.this, &call.arg(0), &args)
}

// §20.2.3.2 Function.prototype.bind(thisArg, ...args)
fn function_bind(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    require_callable(interp, call.this, "bind")?;
    let JsValue::Object(target) = call.this else {
        return Err(EngineError::Internal("callable non-object").into());
    };
    let target = *target;
    let bound_args = call.args.get(1..).unwrap_or_default().to_vec();
    let arg_count = bound_args.len() as f64;
    let f = interp.bound_function_create(target, call.arg(0), bound_args)?;

    let mut length = 0.0;
    if interp.has_own_property(target, &"length".into())? {
        let target_len = interp.get(target, &"length".into())?;
        if let JsValue::Number(n) = target_len {
            length = if n == f64::INFINITY {
                f64::INFINITY
            } else if n == f64::NEG_INFINITY {
                0.0
            } else {
                (to_integer_or_infinity(n) - arg_count).max(0.0)
            };
        }
    }
    interp.set_function_length(f, length)?;

    let name = match interp.get(target, &"name".into())? {
        JsValue::String(s) => s,
        _ => JsString::empty(),
    };
    interp.set_function_name(f, &PropertyKey::String(name), Some("bound"))?;
    Ok(JsValue::Object(f))
}

// §20.2.3.3 Function.prototype.call(thisArg, ...args)
fn function_call(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    require_callable(interp, call.this, "call")?;
    let args = call.args.get(1..).unwrap_or_default();
    interp.call(call.this, &call.arg(0), args)
}

// §20.2.3.5 Function.prototype.toString()
//
// Functions built from trees that carry no source text render as
// NativeFunction syntax.
fn function_to_string(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    require_callable(interp, call.this, "toString")?;
    let JsValue::Object(f) = call.this else {
        return Err(EngineError::Internal("callable non-object").into());
    };
    let name = match &interp.heap.object(*f)?.kind {
        ObjectKind::Function(data) => {
            if let Some(source) = &data.node.source_text {
                return Ok(JsValue::String(JsString::from_str(source)));
            }
            data.node.name.clone().unwrap_or_default()
        }
        ObjectKind::Builtin(b) => b.initial_name.as_ref().map(|n| n.to_rust_string()).unwrap_or_default(),
        _ => String::new(),
    };
    Ok(JsValue::String(JsString::from_str(&format!("function {name}() {{ [native code] }}"))))
}

// §20.2.3.6 Function.prototype[@@hasInstance](V)
fn function_has_instance(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let result = interp.ordinary_has_instance(call.this, &call.arg(0))?;
    Ok(JsValue::Boolean(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;

    fn run(body: Vec<Statement>) -> JsValue {
        let mut interp = Interpreter::new().unwrap();
        interp.run(&script(body)).unwrap()
    }

    fn add_decl() -> Statement {
        function_decl("add", &["a", "b"], vec![ret(binary(BinaryOp::Add, ident("a"), ident("b")))])
    }

    #[test]
    fn call_and_apply_forward_this_and_arguments() {
        let v = run(vec![
            function_decl("f", &["x"], vec![ret(binary(BinaryOp::Add, member(this(), "base"), ident("x")))]),
            var("o", object(vec![prop("base", num(10.0))])),
            expr_stmt(binary(
                BinaryOp::Add,
                method_call(ident("f"), "call", vec![ident("o"), num(1.0)]),
                method_call(ident("f"), "apply", vec![ident("o"), array(vec![num(2.0)])]),
            )),
        ]);
        assert_eq!(v.as_number(), Some(23.0));
    }

    #[test]
    fn bind_fixes_leading_arguments_and_derives_name_and_length() {
        let mut interp = Interpreter::new().unwrap();
        let v = interp
            .run(&script(vec![
                add_decl(),
                var("inc", method_call(ident("add"), "bind", vec![null(), num(1.0)])),
                expr_stmt(call(ident("inc"), vec![num(41.0)])),
            ]))
            .unwrap();
        assert_eq!(v.as_number(), Some(42.0));
        let name = interp.run(&script(vec![expr_stmt(member(ident("inc"), "name"))])).unwrap();
        assert_eq!(name.as_string().map(|s| s.to_rust_string()), Some("bound add".into()));
        let length = interp.run(&script(vec![expr_stmt(member(ident("inc"), "length"))])).unwrap();
        assert_eq!(length.as_number(), Some(1.0));
    }

    #[test]
    fn bound_constructors_ignore_bound_this() {
        // function P(x) { this.x = x } var B = P.bind({}, 5); new B() instanceof P && new B().x
        let v = run(vec![
            function_decl("P", &["x"], vec![expr_stmt(assign(member(this(), "x"), ident("x")))]),
            var("B", method_call(ident("P"), "bind", vec![object(vec![]), num(5.0)])),
            expr_stmt(logical(
                LogicalOp::And,
                binary(BinaryOp::Instanceof, new(ident("B"), vec![]), ident("P")),
                member(new(ident("B"), vec![]), "x"),
            )),
        ]);
        assert_eq!(v.as_number(), Some(5.0));
    }

    #[test]
    fn apply_rejects_non_callable_receivers() {
        let mut interp = Interpreter::new().unwrap();
        let err = interp
            .run(&script(vec![expr_stmt(call(
                member(member(member(ident("Function"), "prototype"), "apply"), "call"),
                vec![object(vec![])],
            ))]))
            .unwrap_err();
        assert!(err.to_string().contains("TypeError"));
    }

    #[test]
    fn function_constructor_refuses_source_text() {
        let mut interp = Interpreter::new().unwrap();
        let err = interp
            .run(&script(vec![expr_stmt(call(ident("Function"), vec![string("return 1")]))]))
            .unwrap_err();
        assert!(err.to_string().starts_with("uncaught exception: EvalError"));
    }

    #[test]
    fn throw_type_error_is_frozen_in_shape() {
        let mut interp = Interpreter::new().unwrap();
        let thrower = interp.intrinsic(Intrinsic::ThrowTypeError).unwrap();
        assert!(!interp.is_extensible(thrower).unwrap());
        let length = interp.get_own_property(thrower, &"length".into()).unwrap().unwrap();
        assert!(!length.configurable);
        assert!(interp.call_function(&JsValue::Object(thrower), &JsValue::Undefined, &[]).is_err());
    }
}
