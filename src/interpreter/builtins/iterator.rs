//! Iterator prototypes (§27.1.2, §23.1.5, §22.1.5, §14.7.5.10) and the
//! generator intrinsics (§27.3, §27.5).

use super::*;

pub(super) fn init(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    // §27.1.2 %IteratorPrototype%
    let iterator_proto = interp.new_prototype_object(realm, None)?;
    let iterator_key = PropertyKey::Symbol(interp.well_known_symbol(WellKnownSymbol::Iterator));
    interp.define_builtin_method(iterator_proto, iterator_key, iterator_proto_iterator, 0)?;
    interp.set_intrinsic(realm, Intrinsic::IteratorPrototype, iterator_proto)?;

    let array_iterator = interp.new_prototype_object(realm, Some(iterator_proto))?;
    interp.define_builtin_method(array_iterator, "next", array_iterator_next, 0)?;
    interp.define_to_string_tag(array_iterator, "Array Iterator")?;
    interp.set_intrinsic(realm, Intrinsic::ArrayIteratorPrototype, array_iterator)?;

    let string_iterator = interp.new_prototype_object(realm, Some(iterator_proto))?;
    interp.define_builtin_method(string_iterator, "next", string_iterator_next, 0)?;
    interp.define_to_string_tag(string_iterator, "String Iterator")?;
    interp.set_intrinsic(realm, Intrinsic::StringIteratorPrototype, string_iterator)?;

    let for_in_iterator = interp.new_prototype_object(realm, Some(iterator_proto))?;
    interp.define_builtin_method(for_in_iterator, "next", for_in_iterator_next, 0)?;
    interp.set_intrinsic(realm, Intrinsic::ForInIteratorPrototype, for_in_iterator)?;
    Ok(())
}

// §27.3.3 %GeneratorFunction.prototype%, §27.5.1 %GeneratorPrototype%
pub(super) fn init_generators(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    let function_proto = interp.realm_intrinsic(realm, Intrinsic::FunctionPrototype)?;
    let function_ctor = interp.realm_intrinsic(realm, Intrinsic::Function)?;
    let iterator_proto = interp.realm_intrinsic(realm, Intrinsic::IteratorPrototype)?;

    let generator_function_proto = interp.new_prototype_object(realm, Some(function_proto))?;
    let generator_function = interp.create_builtin_constructor(
        generator_function_constructor,
        1,
        "GeneratorFunction",
        generator_function_proto,
        Some(function_ctor),
    )?;
    // §27.3.3.1 GeneratorFunction.prototype.constructor is read-only.
    interp.define_property_or_throw(
        generator_function_proto,
        "constructor".into(),
        PropertyDescriptor::data(JsValue::Object(generator_function), false, false, true),
    )?;
    interp.define_to_string_tag(generator_function_proto, "GeneratorFunction")?;

    let generator_proto = interp.new_prototype_object(realm, Some(iterator_proto))?;
    interp.define_property_or_throw(
        generator_function_proto,
        "prototype".into(),
        PropertyDescriptor::data(JsValue::Object(generator_proto), false, false, true),
    )?;
    interp.define_property_or_throw(
        generator_proto,
        "constructor".into(),
        PropertyDescriptor::data(JsValue::Object(generator_function_proto), false, false, true),
    )?;
    interp.define_builtin_method(generator_proto, "next", generator_next, 1)?;
    interp.define_builtin_method(generator_proto, "return", generator_return, 1)?;
    interp.define_builtin_method(generator_proto, "throw", generator_throw, 1)?;
    interp.define_to_string_tag(generator_proto, "Generator")?;

    interp.set_intrinsic(realm, Intrinsic::GeneratorFunction, generator_function)?;
    interp.set_intrinsic(realm, Intrinsic::GeneratorFunctionPrototype, generator_function_proto)?;
    interp.set_intrinsic(realm, Intrinsic::GeneratorPrototype, generator_proto)?;
    Ok(())
}

// §27.1.2.1 %IteratorPrototype%[@@iterator]()
fn iterator_proto_iterator(_interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    Ok(call.this.clone())
}

// §23.1.5.2.1 %ArrayIteratorPrototype%.next()
fn array_iterator_next(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let slots = match call.this {
        JsValue::Object(it) => match &interp.heap.object(*it)?.kind {
            ObjectKind::ArrayIterator(data) => Some((*it, data.object, data.next_index, data.kind)),
            _ => None,
        },
        _ => None,
    };
    let Some((it, object, index, kind)) = slots else {
        return Err(interp.type_error("next method called on incompatible receiver"));
    };
    let Some(array) = object else {
        return interp.create_iter_result_object(JsValue::Undefined, true);
    };
    let length = match &interp.heap.object(array)?.kind {
        ObjectKind::TypedArray(t) => t.length as u64,
        _ => interp.length_of_array_like(array)?,
    };
    if index >= length {
        if let ObjectKind::ArrayIterator(data) = &mut interp.heap.object_mut(it)?.kind {
            data.object = None;
        }
        return interp.create_iter_result_object(JsValue::Undefined, true);
    }
    if let ObjectKind::ArrayIterator(data) = &mut interp.heap.object_mut(it)?.kind {
        data.next_index = index + 1;
    }
    let result = match kind {
        EnumerableKind::Key => JsValue::Number(index as f64),
        EnumerableKind::Value => {
            let key = interp.index_key(index);
            interp.get(array, &key)?
        }
        EnumerableKind::KeyValue => {
            let key = interp.index_key(index);
            let value = interp.get(array, &key)?;
            JsValue::Object(interp.create_array_from_list(vec![JsValue::Number(index as f64), value])?)
        }
    };
    interp.create_iter_result_object(result, false)
}

// §22.1.5.1 %StringIteratorPrototype%.next(), stepping by code point
fn string_iterator_next(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let slots = match call.this {
        JsValue::Object(it) => match &interp.heap.object(*it)?.kind {
            ObjectKind::StringIterator(data) => Some((*it, data.string.clone(), data.position)),
            _ => None,
        },
        _ => None,
    };
    let Some((it, string, position)) = slots else {
        return Err(interp.type_error("next method called on incompatible receiver"));
    };
    let Some(string) = string else {
        return interp.create_iter_result_object(JsValue::Undefined, true);
    };
    let units = string.as_code_units();
    if position >= units.len() {
        if let ObjectKind::StringIterator(data) = &mut interp.heap.object_mut(it)?.kind {
            data.string = None;
        }
        return interp.create_iter_result_object(JsValue::Undefined, true);
    }
    let first = units[position];
    let paired = (0xD800..=0xDBFF).contains(&first)
        && units.get(position + 1).is_some_and(|u| (0xDC00..=0xDFFF).contains(u));
    let end = if paired { position + 2 } else { position + 1 };
    let code_point = string.slice_utf16(position, end);
    if let ObjectKind::StringIterator(data) = &mut interp.heap.object_mut(it)?.kind {
        data.position = end;
    }
    interp.create_iter_result_object(JsValue::String(code_point), false)
}

// §14.7.5.10.2.1 %ForInIteratorPrototype%.next()
fn for_in_iterator_next(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let it = match call.this {
        JsValue::Object(it) if matches!(interp.heap.object(*it)?.kind, ObjectKind::ForInIterator(_)) => *it,
        _ => return Err(interp.type_error("next method called on incompatible receiver")),
    };
    match interp.for_in_iterator_next(it)? {
        Some(key) => interp.create_iter_result_object(key, false),
        None => interp.create_iter_result_object(JsValue::Undefined, true),
    }
}

// §27.3.1.1 GeneratorFunction(...parameterArgs, bodyArg)
fn generator_function_constructor(interp: &mut Interpreter, _call: &NativeCall<'_>) -> JsResult<JsValue> {
    Err(interp.create_error(ErrorKind::EvalError, "Code generation from strings is not supported"))
}

// §27.5.1.2 %GeneratorPrototype%.next(value)
fn generator_next(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    interp.generator_resume(call.this, Resumption::Next(call.arg(0)), "next")
}

// §27.5.1.3 %GeneratorPrototype%.return(value)
fn generator_return(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    interp.generator_resume(call.this, Resumption::Return(call.arg(0)), "return")
}

// §27.5.1.4 %GeneratorPrototype%.throw(exception)
fn generator_throw(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    interp.generator_resume(call.this, Resumption::Throw(call.arg(0)), "throw")
}
