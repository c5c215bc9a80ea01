//! Arguments exotic objects (§10.4.4).
//!
//! Instead of a separate [[ParameterMap]] object, a mapped arguments object
//! records which parameter name each index still aliases and reads or writes
//! that binding of the function environment directly.

use super::*;

pub(crate) struct ArgumentsData {
    env: Option<EnvId>,
    /// `mapped[i]` is the parameter bound to index `i` while the alias holds.
    mapped: Vec<Option<String>>,
}

impl ArgumentsData {
    pub(crate) fn is_mapped(&self) -> bool {
        self.env.is_some() && self.mapped.iter().any(Option::is_some)
    }

    fn mapped_name(&self, key: &PropertyKey) -> Option<(EnvId, String)> {
        let env = self.env?;
        let index = key.as_array_index()? as usize;
        self.mapped.get(index)?.clone().map(|name| (env, name))
    }

    fn unmap(&mut self, key: &PropertyKey) {
        if let Some(index) = key.as_array_index()
            && let Some(slot) = self.mapped.get_mut(index as usize)
        {
            *slot = None;
        }
    }
}

impl Trace for ArgumentsData {
    fn trace(&self, tracer: &mut Tracer) {
        if let Some(env) = self.env {
            tracer.env(env);
        }
    }
}

impl Interpreter {
    // §10.4.4.6 CreateUnmappedArgumentsObject(argumentsList)
    pub(crate) fn create_unmapped_arguments_object(&mut self, args: &[JsValue]) -> JsResult<ObjectId> {
        let obj = self.new_arguments_object(args, None, Vec::new())?;
        let thrower = JsValue::Object(self.intrinsic(Intrinsic::ThrowTypeError)?);
        let callee = PropertyDescriptor::accessor(thrower.clone(), thrower, false, false);
        self.define_property_or_throw(obj, "callee".into(), callee)?;
        Ok(obj)
    }

    // §10.4.4.7 CreateMappedArgumentsObject(func, formals, argumentsList, env)
    pub(crate) fn create_mapped_arguments_object(
        &mut self,
        f: ObjectId,
        parameter_names: &[String],
        args: &[JsValue],
        env: EnvId,
    ) -> JsResult<ObjectId> {
        let mut mapped: Vec<Option<String>> = vec![None; args.len()];
        // Later parameters win when a name repeats.
        for (index, name) in parameter_names.iter().enumerate().rev() {
            if index < args.len() && !mapped.iter().flatten().any(|n| n == name) {
                mapped[index] = Some(name.clone());
            }
        }
        let obj = self.new_arguments_object(args, Some(env), mapped)?;
        let callee = PropertyDescriptor::data(JsValue::Object(f), true, false, true);
        self.define_property_or_throw(obj, "callee".into(), callee)?;
        Ok(obj)
    }

    fn new_arguments_object(
        &mut self,
        args: &[JsValue],
        env: Option<EnvId>,
        mapped: Vec<Option<String>>,
    ) -> JsResult<ObjectId> {
        let proto = self.intrinsic(Intrinsic::ObjectPrototype)?;
        let mut data = ObjectData::new(Some(proto), ObjectKind::Arguments(ArgumentsData { env, mapped }));
        for (i, value) in args.iter().enumerate() {
            data.properties
                .insert(PropertyKey::from_index(i as u32), Property::data(value.clone(), true, true, true));
        }
        data.properties.insert(
            "length".into(),
            Property::data(JsValue::Number(args.len() as f64), true, false, true),
        );
        let obj = self.alloc_object(data);
        let values = JsValue::Object(self.intrinsic(Intrinsic::ArrayPrototypeValues)?);
        let iterator_key = PropertyKey::from(self.well_known_symbol(WellKnownSymbol::Iterator));
        self.define_property_or_throw(obj, iterator_key, PropertyDescriptor::data(values, true, false, true))?;
        Ok(obj)
    }

    fn arguments_data(&mut self, o: ObjectId) -> EngineResult<&mut ArgumentsData> {
        match &mut self.heap.object_mut(o)?.kind {
            ObjectKind::Arguments(data) => Ok(data),
            _ => Err(EngineError::Internal("expected an arguments object")),
        }
    }

    fn arguments_mapping(&mut self, o: ObjectId, key: &PropertyKey) -> EngineResult<Option<(EnvId, String)>> {
        Ok(self.arguments_data(o)?.mapped_name(key))
    }

    // §10.4.4.1 [[GetOwnProperty]](P)
    pub(crate) fn arguments_get_own_property(&mut self, o: ObjectId, key: &PropertyKey) -> JsResult<Option<Property>> {
        let Some(mut desc) = self.ordinary_get_own_property(o, key)? else {
            return Ok(None);
        };
        if let Some((env, name)) = self.arguments_mapping(o, key)? {
            let value = self.env_get_binding_value(env, &name, false)?;
            if let PropertyValue::Data { writable, .. } = desc.value {
                desc.value = PropertyValue::Data { value, writable };
            }
        }
        Ok(Some(desc))
    }

    // §10.4.4.2 [[DefineOwnProperty]](P, Desc)
    pub(crate) fn arguments_define_own_property(
        &mut self,
        o: ObjectId,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<bool> {
        let mapping = self.arguments_mapping(o, &key)?;
        let mut new_arg_desc = desc.clone();
        if let Some((env, name)) = &mapping
            && desc.is_data_descriptor()
            && desc.value.is_none()
            && desc.writable == Some(false)
        {
            new_arg_desc.value = Some(self.env_get_binding_value(*env, name, false)?);
        }
        if !self.ordinary_define_own_property(o, key.clone(), new_arg_desc)? {
            return Ok(false);
        }
        if let Some((env, name)) = mapping {
            if desc.is_accessor_descriptor() {
                self.arguments_data(o)?.unmap(&key);
            } else {
                if let Some(value) = desc.value {
                    self.env_set_mutable_binding(env, &name, value, false)?;
                }
                if desc.writable == Some(false) {
                    self.arguments_data(o)?.unmap(&key);
                }
            }
        }
        Ok(true)
    }

    // §10.4.4.3 [[Get]](P, Receiver)
    pub(crate) fn arguments_get(&mut self, o: ObjectId, key: &PropertyKey, receiver: &JsValue) -> JsResult<JsValue> {
        match self.arguments_mapping(o, key)? {
            Some((env, name)) => self.env_get_binding_value(env, &name, false),
            None => self.ordinary_get(o, key, receiver),
        }
    }

    // §10.4.4.4 [[Set]](P, V, Receiver)
    pub(crate) fn arguments_set(
        &mut self,
        o: ObjectId,
        key: PropertyKey,
        value: JsValue,
        receiver: &JsValue,
    ) -> JsResult<bool> {
        let same_receiver = matches!(receiver, JsValue::Object(r) if *r == o);
        if same_receiver && let Some((env, name)) = self.arguments_mapping(o, &key)? {
            self.env_set_mutable_binding(env, &name, value.clone(), false)?;
        }
        self.ordinary_set(o, key, value, receiver)
    }

    // §10.4.4.5 [[Delete]](P)
    pub(crate) fn arguments_delete(&mut self, o: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        let mapped = self.arguments_mapping(o, key)?.is_some();
        let result = self.ordinary_delete(o, key)?;
        if result && mapped {
            self.arguments_data(o)?.unmap(key);
        }
        Ok(result)
    }
}
