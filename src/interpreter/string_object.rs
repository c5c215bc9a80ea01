//! String exotic objects (§10.4.3).

use super::*;

impl Interpreter {
    // §10.4.3.4 StringCreate(value, prototype)
    pub(crate) fn string_create(&mut self, value: JsString, proto: Option<ObjectId>) -> JsResult<ObjectId> {
        let proto = match proto {
            Some(p) => p,
            None => self.intrinsic(Intrinsic::StringPrototype)?,
        };
        let length = value.len();
        let mut data = ObjectData::new(Some(proto), ObjectKind::String(value));
        data.properties.insert(
            "length".into(),
            Property::data(JsValue::Number(length as f64), false, false, false),
        );
        Ok(self.alloc_object(data))
    }

    fn string_data(&self, o: ObjectId) -> EngineResult<&JsString> {
        match &self.heap.object(o)?.kind {
            ObjectKind::String(s) => Ok(s),
            _ => Err(EngineError::Internal("expected a String exotic object")),
        }
    }

    // §10.4.3.5 StringGetOwnProperty(S, P)
    fn string_index_property(&self, o: ObjectId, key: &PropertyKey) -> EngineResult<Option<Property>> {
        let PropertyKey::String(name) = key else {
            return Ok(None);
        };
        let Some(index) = canonical_numeric_index_string(name) else {
            return Ok(None);
        };
        if index.fract() != 0.0 || (index == 0.0 && index.is_sign_negative()) || index < 0.0 {
            return Ok(None);
        }
        let s = self.string_data(o)?;
        if index >= s.len() as f64 {
            return Ok(None);
        }
        let i = index as usize;
        let unit = s.slice_utf16(i, i + 1);
        Ok(Some(Property::data(JsValue::String(unit), false, true, false)))
    }

    // §10.4.3.1 [[GetOwnProperty]](P)
    pub(crate) fn string_get_own_property(&self, o: ObjectId, key: &PropertyKey) -> EngineResult<Option<Property>> {
        if let Some(desc) = self.ordinary_get_own_property(o, key)? {
            return Ok(Some(desc));
        }
        self.string_index_property(o, key)
    }

    // §10.4.3.2 [[DefineOwnProperty]](P, Desc)
    pub(crate) fn string_define_own_property(
        &mut self,
        o: ObjectId,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<bool> {
        if let Some(string_desc) = self.string_index_property(o, &key)? {
            let extensible = self.heap.object(o)?.extensible;
            return Ok(is_compatible_property_descriptor(extensible, &desc, Some(&string_desc)));
        }
        self.ordinary_define_own_property(o, key, desc)
    }

    // §10.4.3.3 [[OwnPropertyKeys]]()
    pub(crate) fn string_own_property_keys(&self, o: ObjectId) -> EngineResult<Vec<PropertyKey>> {
        let len = self.string_data(o)?.len();
        let mut keys: Vec<PropertyKey> = (0..len as u32).map(PropertyKey::from_index).collect();
        // Own index keys can only sit at or past the string's length.
        keys.extend(self.heap.object(o)?.properties.ordered_keys());
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(interp: &mut Interpreter, s: &str) -> ObjectId {
        interp.string_create(JsString::from_str(s), None).unwrap()
    }

    #[test]
    fn indices_are_read_only_enumerable_properties() {
        let mut interp = Interpreter::new().unwrap();
        let o = wrap(&mut interp, "ab");
        let p = interp.get_own_property(o, &PropertyKey::from_index(1)).unwrap().unwrap();
        assert_eq!(p.data_value().and_then(|v| v.as_string()).map(|s| s.to_rust_string()), Some("b".into()));
        assert!(p.enumerable && !p.configurable && p.writable() == Some(false));
        assert!(interp.get_own_property(o, &PropertyKey::from_index(2)).unwrap().is_none());
        assert!(interp.get_own_property(o, &"-0".into()).unwrap().is_none());
    }

    #[test]
    fn redefining_an_index_must_be_compatible() {
        let mut interp = Interpreter::new().unwrap();
        let o = wrap(&mut interp, "ab");
        let same = PropertyDescriptor::value_only(JsValue::string("a"));
        assert!(interp.define_own_property(o, PropertyKey::from_index(0), same).unwrap());
        let other = PropertyDescriptor::value_only(JsValue::string("z"));
        assert!(!interp.define_own_property(o, PropertyKey::from_index(0), other).unwrap());
    }

    #[test]
    fn own_keys_put_string_indices_first() {
        let mut interp = Interpreter::new().unwrap();
        let o = wrap(&mut interp, "hi");
        interp.create_data_property(o, "x".into(), JsValue::Null).unwrap();
        interp.create_data_property(o, PropertyKey::from_index(5), JsValue::Null).unwrap();
        let keys: Vec<String> = interp
            .own_property_keys(o)
            .unwrap()
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, ["0", "1", "5", "length", "x"]);
    }
}
