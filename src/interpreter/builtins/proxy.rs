//! %Proxy% (§28.2).

use super::*;

pub(super) fn init(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    // §28.2.2: %Proxy% is a constructor without a "prototype" property.
    let ctor = interp.create_builtin_function(proxy_constructor, 2, "Proxy", Some(realm), None)?;
    if let ObjectKind::Builtin(b) = &mut interp.heap.object_mut(ctor)?.kind {
        b.is_constructor = true;
    }
    interp.define_builtin_method(ctor, "revocable", proxy_revocable, 2)?;
    interp.set_intrinsic(realm, Intrinsic::Proxy, ctor)?;
    Ok(())
}

// §28.2.1.1 Proxy(target, handler)
fn proxy_constructor(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    if call.new_target.is_none() {
        return Err(interp.type_error("Constructor Proxy requires 'new'"));
    }
    Ok(JsValue::Object(interp.proxy_create(&call.arg(0), &call.arg(1))?))
}

// §28.2.2.1 Proxy.revocable(target, handler)
fn proxy_revocable(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let proxy = interp.proxy_create(&call.arg(0), &call.arg(1))?;
    let revoke = interp.create_builtin_closure(proxy_revoke_function, 0, "", vec![JsValue::Object(proxy)])?;
    let result = interp.new_plain_object()?;
    interp.create_data_property_or_throw(result, "proxy".into(), JsValue::Object(proxy))?;
    interp.create_data_property_or_throw(result, "revoke".into(), JsValue::Object(revoke))?;
    Ok(JsValue::Object(result))
}

// §28.2.2.1.1 Proxy Revocation Functions
fn proxy_revoke_function(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    if let JsValue::Object(p) = interp.builtin_slot(call.callee, 0)? {
        interp.set_builtin_slots(call.callee, vec![JsValue::Null])?;
        interp.proxy_revoke(p)?;
    }
    Ok(JsValue::Undefined)
}
