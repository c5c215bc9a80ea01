//! The seed builtin catalog.
//!
//! Every builtin wires itself into a realm through the same handful of
//! primitives: [`Interpreter::create_builtin_function`], property definition
//! and the realm's intrinsic table. Each submodule owns one constructor
//! family and exposes an `init` that runs with the new realm as the current
//! one.

mod array;
mod error;
mod function;
mod iterator;
mod object;
mod primitives;
mod proxy;
mod reflect;
mod symbol;
mod typed_array;

use super::*;

// §9.3.2 CreateIntrinsics and §9.3.4 SetDefaultGlobalBindings
//
// %Object.prototype% and %Function.prototype% already exist; the order below
// follows the dependencies between the remaining intrinsics. Error
// prototypes come first so that setup failures can be reported as throws.
pub(crate) fn initialize_realm(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    error::init(interp, realm)?;
    function::init(interp, realm)?;
    object::init(interp, realm)?;
    symbol::init(interp, realm)?;
    iterator::init(interp, realm)?;
    array::init(interp, realm)?;
    primitives::init(interp, realm)?;
    typed_array::init(interp, realm)?;
    reflect::init(interp, realm)?;
    proxy::init(interp, realm)?;
    iterator::init_generators(interp, realm)?;
    init_globals(interp, realm)
}

/// Behaviour of %Function.prototype% itself: accepts any arguments and
/// returns undefined (§20.2.3).
pub(crate) fn function_prototype_call(_interp: &mut Interpreter, _call: &NativeCall<'_>) -> JsResult<JsValue> {
    Ok(JsValue::Undefined)
}

// §19.1 Value Properties of the Global Object, §19.3 Constructor Properties
fn init_globals(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    let global = interp.realm_global_object(realm)?;
    interp.define_property_or_throw(
        global,
        "globalThis".into(),
        PropertyDescriptor::data(JsValue::Object(global), true, false, true),
    )?;
    let constants = [
        ("undefined", JsValue::Undefined),
        ("NaN", JsValue::Number(f64::NAN)),
        ("Infinity", JsValue::Number(f64::INFINITY)),
    ];
    for (name, value) in constants {
        interp.define_property_or_throw(global, name.into(), PropertyDescriptor::data(value, false, false, false))?;
    }

    let mut constructors = vec![
        ("Object", Intrinsic::Object),
        ("Function", Intrinsic::Function),
        ("Array", Intrinsic::Array),
        ("Boolean", Intrinsic::Boolean),
        ("Number", Intrinsic::Number),
        ("String", Intrinsic::String),
        ("Symbol", Intrinsic::Symbol),
        ("BigInt", Intrinsic::BigInt),
        ("Proxy", Intrinsic::Proxy),
        ("Reflect", Intrinsic::Reflect),
        ("ArrayBuffer", Intrinsic::ArrayBuffer),
    ];
    for kind in ErrorKind::ALL {
        constructors.push((kind.name(), Intrinsic::NativeError(kind)));
    }
    for kind in TypedArrayKind::ALL {
        constructors.push((kind.name(), Intrinsic::TypedArrayConstructor(kind)));
    }
    for (name, which) in constructors {
        let value = JsValue::Object(interp.realm_intrinsic(realm, which)?);
        interp.define_property_or_throw(global, name.into(), PropertyDescriptor::data(value, true, false, true))?;
    }

    interp.define_builtin_method(global, "isNaN", global_is_nan, 1)?;
    interp.define_builtin_method(global, "isFinite", global_is_finite, 1)?;
    Ok(())
}

// §19.2.3 isNaN(number)
fn global_is_nan(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let n = interp.to_number(&call.arg(0))?;
    Ok(JsValue::Boolean(n.is_nan()))
}

// §19.2.2 isFinite(number)
fn global_is_finite(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let n = interp.to_number(&call.arg(0))?;
    Ok(JsValue::Boolean(n.is_finite()))
}

impl Interpreter {
    /// Installs a built-in method on `target` with the default attributes of
    /// §18: writable, configurable, not enumerable.
    pub(crate) fn define_builtin_method(
        &mut self,
        target: ObjectId,
        name: impl Into<PropertyKey>,
        behavior: NativeFn,
        length: u32,
    ) -> JsResult<ObjectId> {
        let key = name.into();
        let f = self.create_builtin_function(behavior, length, key.clone(), None, None)?;
        self.create_method_property(target, key, JsValue::Object(f))?;
        Ok(f)
    }

    /// Installs a configurable, non-enumerable accessor with only a getter.
    pub(crate) fn define_builtin_getter(
        &mut self,
        target: ObjectId,
        name: impl Into<PropertyKey>,
        getter: NativeFn,
    ) -> JsResult<()> {
        let key = name.into();
        let get = self.create_builtin_function(getter, 0, key.clone(), None, None)?;
        self.set_function_name(get, &key, Some("get"))?;
        let desc = PropertyDescriptor::accessor(JsValue::Object(get), JsValue::Undefined, false, true);
        self.define_property_or_throw(target, key, desc)
    }

    /// A value property that is writable and configurable but hidden from
    /// enumeration.
    pub(crate) fn define_builtin_value(
        &mut self,
        target: ObjectId,
        name: impl Into<PropertyKey>,
        value: JsValue,
    ) -> JsResult<()> {
        self.define_property_or_throw(target, name.into(), PropertyDescriptor::data(value, true, false, true))
    }

    /// A frozen value property, as used for constants such as `Number.NaN`.
    pub(crate) fn define_builtin_constant(
        &mut self,
        target: ObjectId,
        name: impl Into<PropertyKey>,
        value: JsValue,
    ) -> JsResult<()> {
        self.define_property_or_throw(target, name.into(), PropertyDescriptor::data(value, false, false, false))
    }

    /// `@@toStringTag`, which §18 makes non-writable but configurable.
    pub(crate) fn define_to_string_tag(&mut self, target: ObjectId, tag: &str) -> JsResult<()> {
        let key = PropertyKey::Symbol(self.well_known_symbol(WellKnownSymbol::ToStringTag));
        let desc = PropertyDescriptor::data(JsValue::String(JsString::from_str(tag)), false, false, true);
        self.define_property_or_throw(target, key, desc)
    }

    /// Replaces the captured slots of a built-in function.
    pub(crate) fn set_builtin_slots(&mut self, f: ObjectId, slots: Vec<JsValue>) -> EngineResult<()> {
        match &mut self.heap.object_mut(f)?.kind {
            ObjectKind::Builtin(b) => {
                b.slots = slots;
                Ok(())
            }
            _ => Err(EngineError::Internal("slots set on a non-builtin")),
        }
    }

    /// The prototype object every builtin constructor gets: an ordinary
    /// object inheriting from `parent`, or %Object.prototype% by default.
    pub(crate) fn new_prototype_object(&mut self, realm: RealmId, parent: Option<ObjectId>) -> JsResult<ObjectId> {
        let parent = match parent {
            Some(p) => p,
            None => self.realm_intrinsic(realm, Intrinsic::ObjectPrototype)?,
        };
        Ok(self.ordinary_object_create(Some(parent)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;

    #[test]
    fn globals_have_spec_attributes() {
        let mut interp = Interpreter::new().unwrap();
        let global = interp.global_object();
        let undefined = interp.get_own_property(global, &"undefined".into()).unwrap().unwrap();
        assert!(!undefined.configurable && !undefined.enumerable);
        assert_eq!(undefined.writable(), Some(false));

        let object = interp.get_own_property(global, &"Object".into()).unwrap().unwrap();
        assert!(object.configurable && !object.enumerable);
        assert_eq!(object.writable(), Some(true));
    }

    #[test]
    fn global_this_is_the_global_object() {
        let mut interp = Interpreter::new().unwrap();
        let v = interp
            .run(&script(vec![expr_stmt(binary(BinaryOp::StrictEq, ident("globalThis"), this()))]))
            .unwrap();
        assert_eq!(v.as_boolean(), Some(true));
    }

    #[test]
    fn function_prototype_is_callable_and_returns_undefined() {
        let mut interp = Interpreter::new().unwrap();
        let proto = interp.intrinsic(Intrinsic::FunctionPrototype).unwrap();
        let v = interp
            .call_function(&JsValue::Object(proto), &JsValue::Undefined, &[JsValue::Number(1.0)])
            .unwrap();
        assert!(v.is_undefined());
    }

    #[test]
    fn every_intrinsic_key_is_populated() {
        let interp = Interpreter::new().unwrap();
        let mut keys = vec![
            Intrinsic::Object,
            Intrinsic::ObjectPrototype,
            Intrinsic::Function,
            Intrinsic::FunctionPrototype,
            Intrinsic::Array,
            Intrinsic::ArrayPrototype,
            Intrinsic::ArrayPrototypeValues,
            Intrinsic::ArrayIteratorPrototype,
            Intrinsic::StringIteratorPrototype,
            Intrinsic::IteratorPrototype,
            Intrinsic::ForInIteratorPrototype,
            Intrinsic::GeneratorFunction,
            Intrinsic::GeneratorFunctionPrototype,
            Intrinsic::GeneratorPrototype,
            Intrinsic::ThrowTypeError,
            Intrinsic::Boolean,
            Intrinsic::BooleanPrototype,
            Intrinsic::Number,
            Intrinsic::NumberPrototype,
            Intrinsic::String,
            Intrinsic::StringPrototype,
            Intrinsic::Symbol,
            Intrinsic::SymbolPrototype,
            Intrinsic::BigInt,
            Intrinsic::BigIntPrototype,
            Intrinsic::Proxy,
            Intrinsic::Reflect,
            Intrinsic::ArrayBuffer,
            Intrinsic::ArrayBufferPrototype,
            Intrinsic::TypedArray,
            Intrinsic::TypedArrayPrototype,
        ];
        keys.extend(ErrorKind::ALL.iter().flat_map(|k| [Intrinsic::NativeError(*k), Intrinsic::NativeErrorPrototype(*k)]));
        keys.extend(
            TypedArrayKind::ALL
                .iter()
                .flat_map(|k| [Intrinsic::TypedArrayConstructor(*k), Intrinsic::TypedArrayConstructorPrototype(*k)]),
        );
        for key in keys {
            assert!(interp.intrinsic(key).is_ok(), "{key:?} missing");
        }
    }
}
