//! Proxy exotic objects (§10.5).
//!
//! Every internal method looks up its trap on the handler, forwards to the
//! target when the trap is absent, and otherwise checks the trap's answer
//! against the target's actual state before returning it.

use super::*;

pub(crate) struct ProxyData {
    /// Both `None` once revoked.
    pub(crate) target: Option<ObjectId>,
    pub(crate) handler: Option<ObjectId>,
    pub(crate) callable: bool,
    pub(crate) constructor: bool,
}

impl Trace for ProxyData {
    fn trace(&self, tracer: &mut Tracer) {
        if let Some(t) = self.target {
            tracer.object(t);
        }
        if let Some(h) = self.handler {
            tracer.object(h);
        }
    }
}

impl Interpreter {
    // §10.5.14 ProxyCreate(target, handler)
    pub(crate) fn proxy_create(&mut self, target: &JsValue, handler: &JsValue) -> JsResult<ObjectId> {
        let (JsValue::Object(t), JsValue::Object(h)) = (target, handler) else {
            return Err(self.type_error("Cannot create proxy with a non-object as target or handler"));
        };
        let callable = self.is_callable(target)?;
        let constructor = self.is_constructor(target)?;
        let data = ProxyData {
            target: Some(*t),
            handler: Some(*h),
            callable,
            constructor,
        };
        Ok(self.object_with_kind(None, ObjectKind::Proxy(data)))
    }

    /// Nulls the target and handler; every later operation throws.
    pub(crate) fn proxy_revoke(&mut self, p: ObjectId) -> EngineResult<()> {
        if let ObjectKind::Proxy(data) = &mut self.heap.object_mut(p)?.kind {
            data.target = None;
            data.handler = None;
        }
        Ok(())
    }

    /// The live target and handler, or a TypeError naming `operation`.
    fn proxy_parts(&mut self, p: ObjectId, operation: &str) -> JsResult<(ObjectId, ObjectId)> {
        let parts = match &self.heap.object(p)?.kind {
            ObjectKind::Proxy(data) => data.target.zip(data.handler),
            _ => return Err(EngineError::Internal("expected a proxy").into()),
        };
        match parts {
            Some(parts) => Ok(parts),
            None => Err(self.type_error(format!("Cannot perform '{operation}' on a proxy that has been revoked"))),
        }
    }

    fn proxy_trap(&mut self, handler: ObjectId, name: &str) -> JsResult<Option<JsValue>> {
        self.get_method(&JsValue::Object(handler), &name.into())
    }

    fn call_trap(&mut self, trap: &JsValue, handler: ObjectId, args: &[JsValue]) -> JsResult<JsValue> {
        self.call(trap, &JsValue::Object(handler), args)
    }

    // §10.5.1 [[GetPrototypeOf]]()
    pub(crate) fn proxy_get_prototype_of(&mut self, p: ObjectId) -> JsResult<Option<ObjectId>> {
        let (target, handler) = self.proxy_parts(p, "getPrototypeOf")?;
        let Some(trap) = self.proxy_trap(handler, "getPrototypeOf")? else {
            return self.get_prototype_of(target);
        };
        let handler_proto = match self.call_trap(&trap, handler, &[JsValue::Object(target)])? {
            JsValue::Object(o) => Some(o),
            JsValue::Null => None,
            _ => return Err(self.type_error("'getPrototypeOf' on proxy: trap returned neither object nor null")),
        };
        if self.is_extensible(target)? {
            return Ok(handler_proto);
        }
        let target_proto = self.get_prototype_of(target)?;
        if handler_proto != target_proto {
            return Err(self.type_error(
                "'getPrototypeOf' on proxy: proxy target is non-extensible but the trap did not return its actual prototype",
            ));
        }
        Ok(handler_proto)
    }

    // §10.5.2 [[SetPrototypeOf]](V)
    pub(crate) fn proxy_set_prototype_of(&mut self, p: ObjectId, proto: Option<ObjectId>) -> JsResult<bool> {
        let (target, handler) = self.proxy_parts(p, "setPrototypeOf")?;
        let Some(trap) = self.proxy_trap(handler, "setPrototypeOf")? else {
            return self.set_prototype_of(target, proto);
        };
        let v = proto.map_or(JsValue::Null, JsValue::Object);
        let result = self.call_trap(&trap, handler, &[JsValue::Object(target), v])?;
        if !to_boolean(&result) {
            return Ok(false);
        }
        if self.is_extensible(target)? {
            return Ok(true);
        }
        if self.get_prototype_of(target)? != proto {
            return Err(self.type_error(
                "'setPrototypeOf' on proxy: trap returned truish for setting a new prototype on the non-extensible proxy target",
            ));
        }
        Ok(true)
    }

    // §10.5.3 [[IsExtensible]]()
    pub(crate) fn proxy_is_extensible(&mut self, p: ObjectId) -> JsResult<bool> {
        let (target, handler) = self.proxy_parts(p, "isExtensible")?;
        let Some(trap) = self.proxy_trap(handler, "isExtensible")? else {
            return self.is_extensible(target);
        };
        let result = to_boolean(&self.call_trap(&trap, handler, &[JsValue::Object(target)])?);
        if result != self.is_extensible(target)? {
            return Err(self.type_error("'isExtensible' on proxy: trap result does not reflect extensibility of proxy target"));
        }
        Ok(result)
    }

    // §10.5.4 [[PreventExtensions]]()
    pub(crate) fn proxy_prevent_extensions(&mut self, p: ObjectId) -> JsResult<bool> {
        let (target, handler) = self.proxy_parts(p, "preventExtensions")?;
        let Some(trap) = self.proxy_trap(handler, "preventExtensions")? else {
            return self.prevent_extensions(target);
        };
        let result = to_boolean(&self.call_trap(&trap, handler, &[JsValue::Object(target)])?);
        if result && self.is_extensible(target)? {
            return Err(self.type_error("'preventExtensions' on proxy: trap returned truish but the proxy target is extensible"));
        }
        Ok(result)
    }

    // §10.5.5 [[GetOwnProperty]](P)
    pub(crate) fn proxy_get_own_property(&mut self, p: ObjectId, key: &PropertyKey) -> JsResult<Option<Property>> {
        let (target, handler) = self.proxy_parts(p, "getOwnPropertyDescriptor")?;
        let Some(trap) = self.proxy_trap(handler, "getOwnPropertyDescriptor")? else {
            return self.get_own_property(target, key);
        };
        let trap_result = self.call_trap(&trap, handler, &[JsValue::Object(target), key.to_value()])?;
        if !trap_result.is_object() && !trap_result.is_undefined() {
            return Err(self.type_error(format!(
                "'getOwnPropertyDescriptor' on proxy: trap returned neither object nor undefined for property '{key}'"
            )));
        }
        let target_desc = self.get_own_property(target, key)?;
        if trap_result.is_undefined() {
            let Some(target_desc) = target_desc else {
                return Ok(None);
            };
            if !target_desc.configurable {
                return Err(self.type_error(format!(
                    "'getOwnPropertyDescriptor' on proxy: trap returned undefined for property '{key}' which is non-configurable in the proxy target"
                )));
            }
            if !self.is_extensible(target)? {
                return Err(self.type_error(format!(
                    "'getOwnPropertyDescriptor' on proxy: trap returned undefined for property '{key}' which exists in the non-extensible proxy target"
                )));
            }
            return Ok(None);
        }
        let extensible_target = self.is_extensible(target)?;
        let result_desc = self.to_property_descriptor(&trap_result)?;
        let complete = result_desc.complete();
        let complete_desc = PropertyDescriptor::from(&complete);
        if !is_compatible_property_descriptor(extensible_target, &complete_desc, target_desc.as_ref()) {
            return Err(self.type_error(format!(
                "'getOwnPropertyDescriptor' on proxy: trap returned descriptor for property '{key}' that is incompatible with the existing property in the proxy target"
            )));
        }
        if !complete.configurable {
            match &target_desc {
                Some(t) if !t.configurable => {
                    if result_desc.writable == Some(false) && t.writable() == Some(true) {
                        return Err(self.type_error(format!(
                            "'getOwnPropertyDescriptor' on proxy: trap reported non-configurable and writable for property '{key}' which is non-configurable, non-writable in the proxy target"
                        )));
                    }
                }
                _ => {
                    return Err(self.type_error(format!(
                        "'getOwnPropertyDescriptor' on proxy: trap reported non-configurability for property '{key}' which is either non-existent or configurable in the proxy target"
                    )));
                }
            }
        }
        Ok(Some(complete))
    }

    // §10.5.6 [[DefineOwnProperty]](P, Desc)
    pub(crate) fn proxy_define_own_property(
        &mut self,
        p: ObjectId,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<bool> {
        let (target, handler) = self.proxy_parts(p, "defineProperty")?;
        let Some(trap) = self.proxy_trap(handler, "defineProperty")? else {
            return self.define_own_property(target, key, desc);
        };
        let desc_obj = self.from_property_descriptor(Some(&desc))?;
        let result = self.call_trap(&trap, handler, &[JsValue::Object(target), key.to_value(), desc_obj])?;
        if !to_boolean(&result) {
            return Ok(false);
        }
        let target_desc = self.get_own_property(target, &key)?;
        let extensible_target = self.is_extensible(target)?;
        let setting_config_false = desc.configurable == Some(false);
        match target_desc {
            None => {
                if !extensible_target {
                    return Err(self.type_error(format!(
                        "'defineProperty' on proxy: trap returned truish for adding property '{key}' to the non-extensible proxy target"
                    )));
                }
                if setting_config_false {
                    return Err(self.type_error(format!(
                        "'defineProperty' on proxy: trap returned truish for defining non-configurable property '{key}' which is non-existent in the proxy target"
                    )));
                }
            }
            Some(t) => {
                if !is_compatible_property_descriptor(extensible_target, &desc, Some(&t)) {
                    return Err(self.type_error(format!(
                        "'defineProperty' on proxy: trap returned truish for adding property '{key}' that is incompatible with the existing property in the proxy target"
                    )));
                }
                if setting_config_false && t.configurable {
                    return Err(self.type_error(format!(
                        "'defineProperty' on proxy: trap returned truish for defining non-configurable property '{key}' which is configurable in the proxy target"
                    )));
                }
                if t.is_data() && !t.configurable && t.writable() == Some(true) && desc.writable == Some(false) {
                    return Err(self.type_error(format!(
                        "'defineProperty' on proxy: trap returned truish for defining non-configurable property '{key}' which cannot be non-writable, unless there exists a corresponding non-configurable, non-writable own property of the target object"
                    )));
                }
            }
        }
        Ok(true)
    }

    // §10.5.7 [[HasProperty]](P)
    pub(crate) fn proxy_has_property(&mut self, p: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        let (target, handler) = self.proxy_parts(p, "has")?;
        let Some(trap) = self.proxy_trap(handler, "has")? else {
            return self.has_property(target, key);
        };
        let result = to_boolean(&self.call_trap(&trap, handler, &[JsValue::Object(target), key.to_value()])?);
        if !result && let Some(target_desc) = self.get_own_property(target, key)? {
            if !target_desc.configurable {
                return Err(self.type_error(format!(
                    "'has' on proxy: trap returned falsish for property '{key}' which exists in the proxy target as non-configurable"
                )));
            }
            if !self.is_extensible(target)? {
                return Err(self.type_error(format!(
                    "'has' on proxy: trap returned falsish for property '{key}' but the proxy target is not extensible"
                )));
            }
        }
        Ok(result)
    }

    // §10.5.8 [[Get]](P, Receiver)
    pub(crate) fn proxy_get(&mut self, p: ObjectId, key: &PropertyKey, receiver: &JsValue) -> JsResult<JsValue> {
        let (target, handler) = self.proxy_parts(p, "get")?;
        let Some(trap) = self.proxy_trap(handler, "get")? else {
            return self.internal_get(target, key, receiver);
        };
        let trap_result =
            self.call_trap(&trap, handler, &[JsValue::Object(target), key.to_value(), receiver.clone()])?;
        if let Some(target_desc) = self.get_own_property(target, key)?
            && !target_desc.configurable
        {
            match &target_desc.value {
                PropertyValue::Data { value, writable: false } if !same_value(&trap_result, value) => {
                    return Err(self.type_error(format!(
                        "'get' on proxy: property '{key}' is a read-only and non-configurable data property on the proxy target but the proxy did not return its actual value"
                    )));
                }
                PropertyValue::Accessor { get, .. } if get.is_undefined() && !trap_result.is_undefined() => {
                    return Err(self.type_error(format!(
                        "'get' on proxy: property '{key}' is a non-configurable accessor property on the proxy target and does not have a getter function, but the trap did not return 'undefined'"
                    )));
                }
                _ => {}
            }
        }
        Ok(trap_result)
    }

    // §10.5.9 [[Set]](P, V, Receiver)
    pub(crate) fn proxy_set(
        &mut self,
        p: ObjectId,
        key: PropertyKey,
        value: JsValue,
        receiver: &JsValue,
    ) -> JsResult<bool> {
        let (target, handler) = self.proxy_parts(p, "set")?;
        let Some(trap) = self.proxy_trap(handler, "set")? else {
            return self.internal_set(target, key, value, receiver);
        };
        let args = [JsValue::Object(target), key.to_value(), value.clone(), receiver.clone()];
        if !to_boolean(&self.call_trap(&trap, handler, &args)?) {
            return Ok(false);
        }
        if let Some(target_desc) = self.get_own_property(target, &key)?
            && !target_desc.configurable
        {
            match &target_desc.value {
                PropertyValue::Data {
                    value: target_value,
                    writable: false,
                } if !same_value(&value, target_value) => {
                    return Err(self.type_error(format!(
                        "'set' on proxy: trap returned truish for property '{key}' which exists in the proxy target as a non-configurable and non-writable data property with a different value"
                    )));
                }
                PropertyValue::Accessor { set, .. } if set.is_undefined() => {
                    return Err(self.type_error(format!(
                        "'set' on proxy: trap returned truish for property '{key}' which exists in the proxy target as a non-configurable and non-writable accessor property without a setter"
                    )));
                }
                _ => {}
            }
        }
        Ok(true)
    }

    // §10.5.10 [[Delete]](P)
    pub(crate) fn proxy_delete(&mut self, p: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        let (target, handler) = self.proxy_parts(p, "deleteProperty")?;
        let Some(trap) = self.proxy_trap(handler, "deleteProperty")? else {
            return self.delete(target, key);
        };
        if !to_boolean(&self.call_trap(&trap, handler, &[JsValue::Object(target), key.to_value()])?) {
            return Ok(false);
        }
        let Some(target_desc) = self.get_own_property(target, key)? else {
            return Ok(true);
        };
        if !target_desc.configurable {
            return Err(self.type_error(format!(
                "'deleteProperty' on proxy: trap returned truish for property '{key}' which is non-configurable in the proxy target"
            )));
        }
        if !self.is_extensible(target)? {
            return Err(self.type_error(format!(
                "'deleteProperty' on proxy: trap returned truish for property '{key}' but the proxy target is non-extensible"
            )));
        }
        Ok(true)
    }

    // §10.5.11 [[OwnPropertyKeys]]()
    pub(crate) fn proxy_own_property_keys(&mut self, p: ObjectId) -> JsResult<Vec<PropertyKey>> {
        let (target, handler) = self.proxy_parts(p, "ownKeys")?;
        let Some(trap) = self.proxy_trap(handler, "ownKeys")? else {
            return self.own_property_keys(target);
        };
        let trap_result_array = self.call_trap(&trap, handler, &[JsValue::Object(target)])?;
        let mut trap_result: Vec<PropertyKey> = Vec::new();
        for element in self.create_list_from_array_like(&trap_result_array)? {
            let key = match element {
                JsValue::String(s) => PropertyKey::String(s),
                JsValue::Symbol(s) => PropertyKey::Symbol(s),
                other => return Err(self.type_error(format!("{other} is not a valid property name"))),
            };
            if trap_result.contains(&key) {
                return Err(self.type_error(format!("'ownKeys' on proxy: trap returned duplicate entries ('{key}')")));
            }
            trap_result.push(key);
        }

        let extensible_target = self.is_extensible(target)?;
        let target_keys = self.own_property_keys(target)?;
        let mut configurable_keys = Vec::new();
        let mut nonconfigurable_keys = Vec::new();
        for key in target_keys {
            match self.get_own_property(target, &key)? {
                Some(desc) if !desc.configurable => nonconfigurable_keys.push(key),
                _ => configurable_keys.push(key),
            }
        }
        if extensible_target && nonconfigurable_keys.is_empty() {
            return Ok(trap_result);
        }

        // unchecked[i] is cleared once trap_result[i] matches a target key.
        let mut unchecked = vec![true; trap_result.len()];
        let mut claim = |key: &PropertyKey| match trap_result.iter().position(|k| k == key) {
            Some(i) if unchecked[i] => {
                unchecked[i] = false;
                true
            }
            _ => false,
        };
        for key in &nonconfigurable_keys {
            if !claim(key) {
                let message = format!("'ownKeys' on proxy: trap result did not include '{key}'");
                return Err(self.type_error(message));
            }
        }
        if extensible_target {
            return Ok(trap_result);
        }
        for key in &configurable_keys {
            if !claim(key) {
                let message = format!("'ownKeys' on proxy: trap result did not include '{key}'");
                return Err(self.type_error(message));
            }
        }
        if unchecked.contains(&true) {
            return Err(self.type_error(
                "'ownKeys' on proxy: trap returned extra keys but proxy target is non-extensible",
            ));
        }
        Ok(trap_result)
    }

    // §10.5.12 [[Call]](thisArgument, argumentsList)
    pub(crate) fn proxy_call(&mut self, p: ObjectId, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        let (target, handler) = self.proxy_parts(p, "apply")?;
        let Some(trap) = self.proxy_trap(handler, "apply")? else {
            return self.call(&JsValue::Object(target), this, args);
        };
        let arg_array = JsValue::Object(self.create_array_from_list(args.to_vec())?);
        self.call_trap(&trap, handler, &[JsValue::Object(target), this.clone(), arg_array])
    }

    // §10.5.13 [[Construct]](argumentsList, newTarget)
    pub(crate) fn proxy_construct(&mut self, p: ObjectId, args: &[JsValue], new_target: ObjectId) -> JsResult<ObjectId> {
        let (target, handler) = self.proxy_parts(p, "construct")?;
        let Some(trap) = self.proxy_trap(handler, "construct")? else {
            return self.construct(target, args, Some(new_target));
        };
        let arg_array = JsValue::Object(self.create_array_from_list(args.to_vec())?);
        let new_obj = self.call_trap(&trap, handler, &[JsValue::Object(target), arg_array, JsValue::Object(new_target)])?;
        match new_obj {
            JsValue::Object(o) => Ok(o),
            _ => Err(self.type_error("proxy [[Construct]] must return an object")),
        }
    }
}
