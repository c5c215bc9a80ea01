//! Error objects (§20.5) and the helpers the engine throws them through.

use super::*;

pub(super) fn init(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    let error_proto = interp.new_prototype_object(realm, None)?;
    let error_ctor = interp.create_builtin_constructor(error_constructor, 1, "Error", error_proto, None)?;
    interp.set_builtin_slots(error_ctor, vec![JsValue::Number(0.0)])?;
    interp.set_intrinsic(realm, Intrinsic::NativeError(ErrorKind::Error), error_ctor)?;
    interp.set_intrinsic(realm, Intrinsic::NativeErrorPrototype(ErrorKind::Error), error_proto)?;
    interp.define_builtin_value(error_proto, "name", JsValue::string("Error"))?;
    interp.define_builtin_value(error_proto, "message", JsValue::string(""))?;
    interp.define_builtin_method(error_proto, "toString", error_to_string, 0)?;

    // §20.5.6 NativeError Object Structure
    for (index, kind) in ErrorKind::ALL.iter().enumerate().skip(1) {
        let proto = interp.new_prototype_object(realm, Some(error_proto))?;
        let ctor = interp.create_builtin_constructor(error_constructor, 1, kind.name(), proto, Some(error_ctor))?;
        interp.set_builtin_slots(ctor, vec![JsValue::Number(index as f64)])?;
        interp.define_builtin_value(proto, "name", JsValue::string(kind.name()))?;
        interp.define_builtin_value(proto, "message", JsValue::string(""))?;
        interp.set_intrinsic(realm, Intrinsic::NativeError(*kind), ctor)?;
        interp.set_intrinsic(realm, Intrinsic::NativeErrorPrototype(*kind), proto)?;
    }
    Ok(())
}

fn error_kind(interp: &Interpreter, callee: ObjectId) -> EngineResult<ErrorKind> {
    let index = interp.builtin_slot(callee, 0)?.as_number().unwrap_or(0.0) as usize;
    ErrorKind::ALL
        .get(index)
        .copied()
        .ok_or(EngineError::Internal("error constructor without a kind"))
}

// §20.5.1.1 Error(message [, options]), §20.5.6.1.1 NativeError(message [, options])
fn error_constructor(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let kind = error_kind(interp, call.callee)?;
    let new_target = call.new_target.unwrap_or(call.callee);
    let o = interp.ordinary_create_from_constructor(new_target, Intrinsic::NativeErrorPrototype(kind), ObjectKind::Error)?;
    let message = call.arg(0);
    if !message.is_undefined() {
        let message = interp.to_string(&message)?;
        interp.create_non_enumerable_data_property_or_throw(o, "message".into(), JsValue::String(message))?;
    }
    interp.install_error_cause(o, &call.arg(1))?;
    Ok(JsValue::Object(o))
}

// §20.5.3.4 Error.prototype.toString()
fn error_to_string(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let JsValue::Object(o) = call.this else {
        return Err(interp.type_error("Error.prototype.toString requires that 'this' be an Object"));
    };
    let o = *o;
    let name = match interp.get(o, &"name".into())? {
        JsValue::Undefined => JsString::from_str("Error"),
        v => interp.to_string(&v)?,
    };
    let message = match interp.get(o, &"message".into())? {
        JsValue::Undefined => JsString::empty(),
        v => interp.to_string(&v)?,
    };
    if name.is_empty() {
        return Ok(JsValue::String(message));
    }
    if message.is_empty() {
        return Ok(JsValue::String(name));
    }
    Ok(JsValue::String(name.concat(&JsString::from_str(": ")).concat(&message)))
}

impl Interpreter {
    // §20.5.8.1 InstallErrorCause(O, options)
    fn install_error_cause(&mut self, o: ObjectId, options: &JsValue) -> JsResult<()> {
        if let JsValue::Object(options) = options
            && self.has_property(*options, &"cause".into())?
        {
            let cause = self.get(*options, &"cause".into())?;
            self.create_non_enumerable_data_property_or_throw(o, "cause".into(), cause)?;
        }
        Ok(())
    }

    fn new_error_object(&mut self, kind: ErrorKind, message: &str) -> JsResult<ObjectId> {
        let proto = self.intrinsic(Intrinsic::NativeErrorPrototype(kind))?;
        let o = self.object_with_kind(Some(proto), ObjectKind::Error);
        self.create_non_enumerable_data_property_or_throw(o, "message".into(), JsValue::string(message))?;
        Ok(o)
    }

    /// A throw completion carrying a fresh `kind` error from the current
    /// realm. Failing to build the error object yields that failure instead.
    pub(crate) fn create_error(&mut self, kind: ErrorKind, message: impl Into<String>) -> JsError {
        let message = message.into();
        match self.new_error_object(kind, &message) {
            Ok(o) => JsError::Throw(JsValue::Object(o)),
            Err(e) => e,
        }
    }

    pub(crate) fn type_error(&mut self, message: impl Into<String>) -> JsError {
        self.create_error(ErrorKind::TypeError, message)
    }

    pub(crate) fn range_error(&mut self, message: impl Into<String>) -> JsError {
        self.create_error(ErrorKind::RangeError, message)
    }

    pub(crate) fn reference_error(&mut self, message: impl Into<String>) -> JsError {
        self.create_error(ErrorKind::ReferenceError, message)
    }

    pub(crate) fn syntax_error(&mut self, message: impl Into<String>) -> JsError {
        self.create_error(ErrorKind::SyntaxError, message)
    }
}
