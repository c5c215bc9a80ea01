use super::*;

/// Heap representation of every object.
pub(crate) struct ObjectData {
    pub(crate) prototype: Option<ObjectId>,
    pub(crate) extensible: bool,
    /// Set on %Object.prototype%, an immutable prototype exotic object.
    pub(crate) immutable_prototype: bool,
    pub(crate) properties: PropertyMap,
    pub(crate) private_elements: Vec<PrivateElement>,
    pub(crate) kind: ObjectKind,
}

/// Internal slots that distinguish object flavors.
pub(crate) enum ObjectKind {
    Ordinary,
    Array,
    Error,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Symbol(JsSymbol),
    BigInt(JsBigInt),
    Arguments(ArgumentsData),
    Function(Box<FunctionData>),
    Builtin(Box<BuiltinData>),
    BoundFunction(Box<BoundFunctionData>),
    Proxy(ProxyData),
    ArrayBuffer(ArrayBufferData),
    TypedArray(TypedArrayData),
    Generator(Box<GeneratorData>),
    ArrayIterator(ArrayIteratorData),
    StringIterator(StringIteratorData),
    ForInIterator(ForInIteratorData),
}

/// Which internal-method table an object uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Dispatch {
    Ordinary,
    Array,
    Arguments,
    String,
    TypedArray,
    Proxy,
}

impl ObjectData {
    pub(crate) fn new(prototype: Option<ObjectId>, kind: ObjectKind) -> Self {
        Self {
            prototype,
            extensible: true,
            immutable_prototype: false,
            properties: PropertyMap::default(),
            private_elements: Vec::new(),
            kind,
        }
    }

    fn dispatch(&self) -> Dispatch {
        match &self.kind {
            ObjectKind::Array => Dispatch::Array,
            ObjectKind::Arguments(args) if args.is_mapped() => Dispatch::Arguments,
            ObjectKind::String(_) => Dispatch::String,
            ObjectKind::TypedArray(_) => Dispatch::TypedArray,
            ObjectKind::Proxy(_) => Dispatch::Proxy,
            _ => Dispatch::Ordinary,
        }
    }
}

impl Trace for ObjectData {
    fn trace(&self, tracer: &mut Tracer) {
        if let Some(p) = self.prototype {
            tracer.object(p);
        }
        for prop in self.properties.values() {
            match &prop.value {
                PropertyValue::Data { value, .. } => tracer.value(value),
                PropertyValue::Accessor { get, set } => {
                    tracer.value(get);
                    tracer.value(set);
                }
            }
        }
        for element in &self.private_elements {
            element.trace(tracer);
        }
        match &self.kind {
            ObjectKind::Arguments(a) => a.trace(tracer),
            ObjectKind::Function(f) => f.trace(tracer),
            ObjectKind::Builtin(b) => tracer.values(&b.slots),
            ObjectKind::BoundFunction(b) => b.trace(tracer),
            ObjectKind::Proxy(p) => p.trace(tracer),
            ObjectKind::TypedArray(t) => tracer.object(t.buffer),
            ObjectKind::Generator(g) => g.trace(tracer),
            ObjectKind::ArrayIterator(it) => {
                if let Some(o) = it.object {
                    tracer.object(o);
                }
            }
            ObjectKind::ForInIterator(it) => it.trace(tracer),
            ObjectKind::Ordinary
            | ObjectKind::Array
            | ObjectKind::Error
            | ObjectKind::Boolean(_)
            | ObjectKind::Number(_)
            | ObjectKind::String(_)
            | ObjectKind::Symbol(_)
            | ObjectKind::BigInt(_)
            | ObjectKind::ArrayBuffer(_)
            | ObjectKind::StringIterator(_) => {}
        }
    }
}

/// A private name (§6.2.12). Two names with the same description are still
/// distinct; identity is the id.
#[derive(Clone, Debug)]
pub struct PrivateName {
    pub(crate) id: u64,
    pub(crate) description: JsString,
}

impl PartialEq for PrivateName {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PrivateName {}

#[derive(Clone, Debug)]
pub(crate) struct PrivateElement {
    pub(crate) key: PrivateName,
    pub(crate) kind: PrivateElementKind,
}

#[derive(Clone, Debug)]
pub(crate) enum PrivateElementKind {
    Field(JsValue),
    Method(JsValue),
    Accessor { get: JsValue, set: JsValue },
}

impl Trace for PrivateElement {
    fn trace(&self, tracer: &mut Tracer) {
        match &self.kind {
            PrivateElementKind::Field(v) | PrivateElementKind::Method(v) => tracer.value(v),
            PrivateElementKind::Accessor { get, set } => {
                tracer.value(get);
                tracer.value(set);
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum IntegrityLevel {
    Sealed,
    Frozen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EnumerableKind {
    Key,
    Value,
    KeyValue,
}

impl Interpreter {
    pub(crate) fn alloc_object(&mut self, data: ObjectData) -> ObjectId {
        self.heap.alloc_object(data)
    }

    // §10.1.12 OrdinaryObjectCreate(proto)
    pub fn ordinary_object_create(&mut self, proto: Option<ObjectId>) -> ObjectId {
        self.alloc_object(ObjectData::new(proto, ObjectKind::Ordinary))
    }

    pub(crate) fn object_with_kind(&mut self, proto: Option<ObjectId>, kind: ObjectKind) -> ObjectId {
        self.alloc_object(ObjectData::new(proto, kind))
    }

    /// An ordinary object whose prototype is %Object.prototype%.
    pub fn new_plain_object(&mut self) -> JsResult<ObjectId> {
        let proto = self.intrinsic(Intrinsic::ObjectPrototype)?;
        Ok(self.ordinary_object_create(Some(proto)))
    }

    // §10.1.13 OrdinaryCreateFromConstructor(constructor, intrinsicDefaultProto)
    pub(crate) fn ordinary_create_from_constructor(
        &mut self,
        constructor: ObjectId,
        default_proto: Intrinsic,
        kind: ObjectKind,
    ) -> JsResult<ObjectId> {
        let proto = self.get_prototype_from_constructor(constructor, default_proto)?;
        Ok(self.object_with_kind(Some(proto), kind))
    }

    // §10.1.14 GetPrototypeFromConstructor(constructor, intrinsicDefaultProto)
    pub(crate) fn get_prototype_from_constructor(
        &mut self,
        constructor: ObjectId,
        default_proto: Intrinsic,
    ) -> JsResult<ObjectId> {
        let proto = self.get(constructor, &"prototype".into())?;
        if let JsValue::Object(p) = proto {
            return Ok(p);
        }
        let realm = self.get_function_realm(constructor)?;
        Ok(self.realm_intrinsic(realm, default_proto)?)
    }

    pub(crate) fn dispatch(&self, o: ObjectId) -> EngineResult<Dispatch> {
        Ok(self.heap.object(o)?.dispatch())
    }

    // ---- Internal method dispatch (§10.1, §10.4, §10.5) ----

    pub fn get_prototype_of(&mut self, o: ObjectId) -> JsResult<Option<ObjectId>> {
        match self.dispatch(o)? {
            Dispatch::Proxy => self.proxy_get_prototype_of(o),
            _ => Ok(self.heap.object(o)?.prototype),
        }
    }

    pub fn set_prototype_of(&mut self, o: ObjectId, proto: Option<ObjectId>) -> JsResult<bool> {
        match self.dispatch(o)? {
            Dispatch::Proxy => self.proxy_set_prototype_of(o, proto),
            _ => Ok(self.ordinary_set_prototype_of(o, proto)?),
        }
    }

    pub fn is_extensible(&mut self, o: ObjectId) -> JsResult<bool> {
        match self.dispatch(o)? {
            Dispatch::Proxy => self.proxy_is_extensible(o),
            _ => Ok(self.heap.object(o)?.extensible),
        }
    }

    pub fn prevent_extensions(&mut self, o: ObjectId) -> JsResult<bool> {
        match self.dispatch(o)? {
            Dispatch::Proxy => self.proxy_prevent_extensions(o),
            _ => {
                self.heap.object_mut(o)?.extensible = false;
                Ok(true)
            }
        }
    }

    pub fn get_own_property(&mut self, o: ObjectId, key: &PropertyKey) -> JsResult<Option<Property>> {
        match self.dispatch(o)? {
            Dispatch::Proxy => self.proxy_get_own_property(o, key),
            Dispatch::String => Ok(self.string_get_own_property(o, key)?),
            Dispatch::TypedArray => self.typed_array_get_own_property(o, key),
            Dispatch::Arguments => self.arguments_get_own_property(o, key),
            Dispatch::Ordinary | Dispatch::Array => Ok(self.ordinary_get_own_property(o, key)?),
        }
    }

    pub fn define_own_property(
        &mut self,
        o: ObjectId,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<bool> {
        match self.dispatch(o)? {
            Dispatch::Proxy => self.proxy_define_own_property(o, key, desc),
            Dispatch::Array => self.array_define_own_property(o, key, desc),
            Dispatch::String => self.string_define_own_property(o, key, desc),
            Dispatch::TypedArray => self.typed_array_define_own_property(o, key, desc),
            Dispatch::Arguments => self.arguments_define_own_property(o, key, desc),
            Dispatch::Ordinary => self.ordinary_define_own_property(o, key, desc),
        }
    }

    pub fn has_property(&mut self, o: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        match self.dispatch(o)? {
            Dispatch::Proxy => self.proxy_has_property(o, key),
            Dispatch::TypedArray => self.typed_array_has_property(o, key),
            _ => self.ordinary_has_property(o, key),
        }
    }

    /// [[Get]](P, Receiver)
    pub fn internal_get(&mut self, o: ObjectId, key: &PropertyKey, receiver: &JsValue) -> JsResult<JsValue> {
        match self.dispatch(o)? {
            Dispatch::Proxy => self.proxy_get(o, key, receiver),
            Dispatch::TypedArray => self.typed_array_get(o, key, receiver),
            Dispatch::Arguments => self.arguments_get(o, key, receiver),
            _ => self.ordinary_get(o, key, receiver),
        }
    }

    /// [[Set]](P, V, Receiver)
    pub fn internal_set(
        &mut self,
        o: ObjectId,
        key: PropertyKey,
        value: JsValue,
        receiver: &JsValue,
    ) -> JsResult<bool> {
        match self.dispatch(o)? {
            Dispatch::Proxy => self.proxy_set(o, key, value, receiver),
            Dispatch::TypedArray => self.typed_array_set(o, key, value, receiver),
            Dispatch::Arguments => self.arguments_set(o, key, value, receiver),
            _ => self.ordinary_set(o, key, value, receiver),
        }
    }

    /// [[Delete]](P)
    pub fn delete(&mut self, o: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        match self.dispatch(o)? {
            Dispatch::Proxy => self.proxy_delete(o, key),
            Dispatch::TypedArray => self.typed_array_delete(o, key),
            Dispatch::Arguments => self.arguments_delete(o, key),
            _ => self.ordinary_delete(o, key),
        }
    }

    pub fn own_property_keys(&mut self, o: ObjectId) -> JsResult<Vec<PropertyKey>> {
        match self.dispatch(o)? {
            Dispatch::Proxy => self.proxy_own_property_keys(o),
            Dispatch::String => Ok(self.string_own_property_keys(o)?),
            Dispatch::TypedArray => Ok(self.typed_array_own_property_keys(o)?),
            _ => Ok(self.heap.object(o)?.properties.ordered_keys()),
        }
    }

    // ---- Ordinary internal methods ----

    // §10.1.2.1 OrdinarySetPrototypeOf(O, V)
    pub(crate) fn ordinary_set_prototype_of(&mut self, o: ObjectId, proto: Option<ObjectId>) -> EngineResult<bool> {
        let data = self.heap.object(o)?;
        if data.prototype == proto {
            return Ok(true);
        }
        if !data.extensible || data.immutable_prototype {
            return Ok(false);
        }
        let mut p = proto;
        while let Some(current) = p {
            if current == o {
                return Ok(false);
            }
            let pdata = self.heap.object(current)?;
            if pdata.dispatch() == Dispatch::Proxy {
                break;
            }
            p = pdata.prototype;
        }
        self.heap.object_mut(o)?.prototype = proto;
        Ok(true)
    }

    // §10.1.5.1 OrdinaryGetOwnProperty(O, P)
    pub(crate) fn ordinary_get_own_property(&self, o: ObjectId, key: &PropertyKey) -> EngineResult<Option<Property>> {
        Ok(self.heap.object(o)?.properties.get(key).cloned())
    }

    // §10.1.6.1 OrdinaryDefineOwnProperty(O, P, Desc)
    pub(crate) fn ordinary_define_own_property(
        &mut self,
        o: ObjectId,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<bool> {
        let current = self.get_own_property(o, &key)?;
        let extensible = self.is_extensible(o)?;
        let data = self.heap.object_mut(o)?;
        Ok(validate_and_apply_property_descriptor(
            Some((&mut data.properties, key)),
            extensible,
            &desc,
            current.as_ref(),
        ))
    }

    // §10.1.7.1 OrdinaryHasProperty(O, P)
    pub(crate) fn ordinary_has_property(&mut self, o: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        if self.get_own_property(o, key)?.is_some() {
            return Ok(true);
        }
        match self.get_prototype_of(o)? {
            Some(parent) => self.has_property(parent, key),
            None => Ok(false),
        }
    }

    // §10.1.8.1 OrdinaryGet(O, P, Receiver)
    pub(crate) fn ordinary_get(&mut self, o: ObjectId, key: &PropertyKey, receiver: &JsValue) -> JsResult<JsValue> {
        let Some(desc) = self.get_own_property(o, key)? else {
            return match self.get_prototype_of(o)? {
                Some(parent) => self.internal_get(parent, key, receiver),
                None => Ok(JsValue::Undefined),
            };
        };
        match desc.value {
            PropertyValue::Data { value, .. } => Ok(value),
            PropertyValue::Accessor { get, .. } => {
                if get.is_undefined() {
                    return Ok(JsValue::Undefined);
                }
                self.call(&get, receiver, &[])
            }
        }
    }

    // §10.1.9.1 OrdinarySet(O, P, V, Receiver)
    pub(crate) fn ordinary_set(
        &mut self,
        o: ObjectId,
        key: PropertyKey,
        value: JsValue,
        receiver: &JsValue,
    ) -> JsResult<bool> {
        let own_desc = self.get_own_property(o, &key)?;
        self.ordinary_set_with_own_descriptor(o, key, value, receiver, own_desc)
    }

    // §10.1.9.2 OrdinarySetWithOwnDescriptor(O, P, V, Receiver, ownDesc)
    pub(crate) fn ordinary_set_with_own_descriptor(
        &mut self,
        o: ObjectId,
        key: PropertyKey,
        value: JsValue,
        receiver: &JsValue,
        own_desc: Option<Property>,
    ) -> JsResult<bool> {
        let own_desc = match own_desc {
            Some(d) => d,
            None => match self.get_prototype_of(o)? {
                Some(parent) => return self.internal_set(parent, key, value, receiver),
                None => Property::data(JsValue::Undefined, true, true, true),
            },
        };
        match own_desc.value {
            PropertyValue::Data { writable, .. } => {
                if !writable {
                    return Ok(false);
                }
                let JsValue::Object(receiver_obj) = receiver else {
                    return Ok(false);
                };
                let receiver_obj = *receiver_obj;
                match self.get_own_property(receiver_obj, &key)? {
                    Some(existing) => {
                        if existing.is_accessor() || existing.writable() == Some(false) {
                            return Ok(false);
                        }
                        self.define_own_property(receiver_obj, key, PropertyDescriptor::value_only(value))
                    }
                    None => self.create_data_property(receiver_obj, key, value),
                }
            }
            PropertyValue::Accessor { set, .. } => {
                if set.is_undefined() {
                    return Ok(false);
                }
                self.call(&set, receiver, &[value])?;
                Ok(true)
            }
        }
    }

    // §10.1.10.1 OrdinaryDelete(O, P)
    pub(crate) fn ordinary_delete(&mut self, o: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        let Some(desc) = self.get_own_property(o, key)? else {
            return Ok(true);
        };
        if desc.configurable {
            self.heap.object_mut(o)?.properties.remove(key);
            return Ok(true);
        }
        Ok(false)
    }

    // ---- Operations on objects (§7.3) ----

    // §7.3.2 Get(O, P)
    pub fn get(&mut self, o: ObjectId, key: &PropertyKey) -> JsResult<JsValue> {
        self.internal_get(o, key, &JsValue::Object(o))
    }

    // §7.3.3 GetV(V, P)
    pub fn get_v(&mut self, value: &JsValue, key: &PropertyKey) -> JsResult<JsValue> {
        let o = self.to_object(value)?;
        self.internal_get(o, key, value)
    }

    // §7.3.4 Set(O, P, V, Throw)
    pub fn set(&mut self, o: ObjectId, key: PropertyKey, value: JsValue, throw: bool) -> JsResult<()> {
        let display = if throw { Some(key.clone()) } else { None };
        let ok = self.internal_set(o, key, value, &JsValue::Object(o))?;
        if !ok && let Some(key) = display {
            return Err(self.type_error(format!("Cannot assign to read only property '{key}' of object")));
        }
        Ok(())
    }

    // §7.3.5 CreateDataProperty(O, P, V)
    pub fn create_data_property(&mut self, o: ObjectId, key: PropertyKey, value: JsValue) -> JsResult<bool> {
        self.define_own_property(o, key, PropertyDescriptor::data_default(value))
    }

    // §7.3.7 CreateDataPropertyOrThrow(O, P, V)
    pub fn create_data_property_or_throw(&mut self, o: ObjectId, key: PropertyKey, value: JsValue) -> JsResult<()> {
        let display = key.clone();
        if !self.create_data_property(o, key, value)? {
            return Err(self.type_error(format!("Cannot define property '{display}'")));
        }
        Ok(())
    }

    // §7.3.6 CreateMethodProperty, used for built-in and class methods
    pub(crate) fn create_method_property(&mut self, o: ObjectId, key: PropertyKey, value: JsValue) -> JsResult<()> {
        self.define_own_property(o, key, PropertyDescriptor::data(value, true, false, true))?;
        Ok(())
    }

    // §7.3.8 CreateNonEnumerableDataPropertyOrThrow(O, P, V)
    pub(crate) fn create_non_enumerable_data_property_or_throw(
        &mut self,
        o: ObjectId,
        key: PropertyKey,
        value: JsValue,
    ) -> JsResult<()> {
        self.define_property_or_throw(o, key, PropertyDescriptor::data(value, true, false, true))
    }

    // §7.3.9 DefinePropertyOrThrow(O, P, desc)
    pub fn define_property_or_throw(&mut self, o: ObjectId, key: PropertyKey, desc: PropertyDescriptor) -> JsResult<()> {
        let display = key.clone();
        if !self.define_own_property(o, key, desc)? {
            return Err(self.type_error(format!("Cannot redefine property: {display}")));
        }
        Ok(())
    }

    // §7.3.10 DeletePropertyOrThrow(O, P)
    pub fn delete_property_or_throw(&mut self, o: ObjectId, key: &PropertyKey) -> JsResult<()> {
        if !self.delete(o, key)? {
            return Err(self.type_error(format!("Cannot delete property '{key}'")));
        }
        Ok(())
    }

    // §7.3.11 GetMethod(V, P)
    pub fn get_method(&mut self, value: &JsValue, key: &PropertyKey) -> JsResult<Option<JsValue>> {
        let func = self.get_v(value, key)?;
        if func.is_nullish() {
            return Ok(None);
        }
        if !self.is_callable(&func)? {
            return Err(self.type_error(format!("{key} is not a function")));
        }
        Ok(Some(func))
    }

    // §7.3.12 HasProperty is the [[HasProperty]] dispatch above.

    // §7.3.13 HasOwnProperty(O, P)
    pub fn has_own_property(&mut self, o: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        Ok(self.get_own_property(o, key)?.is_some())
    }

    // §7.3.20 Invoke(V, P, argumentsList)
    pub fn invoke(&mut self, value: &JsValue, key: &PropertyKey, args: &[JsValue]) -> JsResult<JsValue> {
        let func = self.get_v(value, key)?;
        self.call(&func, value, args)
    }

    // §7.3.16 SetIntegrityLevel(O, level)
    pub(crate) fn set_integrity_level(&mut self, o: ObjectId, level: IntegrityLevel) -> JsResult<bool> {
        if !self.prevent_extensions(o)? {
            return Ok(false);
        }
        let keys = self.own_property_keys(o)?;
        match level {
            IntegrityLevel::Sealed => {
                for key in keys {
                    let desc = PropertyDescriptor {
                        configurable: Some(false),
                        ..Default::default()
                    };
                    self.define_property_or_throw(o, key, desc)?;
                }
            }
            IntegrityLevel::Frozen => {
                for key in keys {
                    if let Some(current) = self.get_own_property(o, &key)? {
                        let desc = if current.is_accessor() {
                            PropertyDescriptor {
                                configurable: Some(false),
                                ..Default::default()
                            }
                        } else {
                            PropertyDescriptor {
                                configurable: Some(false),
                                writable: Some(false),
                                ..Default::default()
                            }
                        };
                        self.define_property_or_throw(o, key, desc)?;
                    }
                }
            }
        }
        Ok(true)
    }

    // §7.3.17 TestIntegrityLevel(O, level)
    pub(crate) fn test_integrity_level(&mut self, o: ObjectId, level: IntegrityLevel) -> JsResult<bool> {
        if self.is_extensible(o)? {
            return Ok(false);
        }
        for key in self.own_property_keys(o)? {
            if let Some(current) = self.get_own_property(o, &key)? {
                if current.configurable {
                    return Ok(false);
                }
                if level == IntegrityLevel::Frozen && current.writable() == Some(true) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    // §7.3.18 LengthOfArrayLike(obj)
    pub(crate) fn length_of_array_like(&mut self, o: ObjectId) -> JsResult<u64> {
        let len = self.get(o, &"length".into())?;
        self.to_length(&len)
    }

    // §7.3.19 CreateListFromArrayLike(obj)
    pub(crate) fn create_list_from_array_like(&mut self, value: &JsValue) -> JsResult<Vec<JsValue>> {
        let JsValue::Object(o) = value else {
            return Err(self.type_error("CreateListFromArrayLike called on non-object"));
        };
        let o = *o;
        let len = self.length_of_array_like(o)?;
        let mut list = Vec::with_capacity(len.min(1 << 16) as usize);
        for i in 0..len {
            let key = self.index_key(i);
            list.push(self.get(o, &key)?);
        }
        Ok(list)
    }

    /// Property key for an integer index, which may exceed the array range.
    pub(crate) fn index_key(&self, index: u64) -> PropertyKey {
        PropertyKey::String(JsString::from_str(&index.to_string()))
    }

    // §7.3.23 EnumerableOwnProperties(O, kind)
    pub(crate) fn enumerable_own_properties(&mut self, o: ObjectId, kind: EnumerableKind) -> JsResult<Vec<JsValue>> {
        let mut out = Vec::new();
        for key in self.own_property_keys(o)? {
            let PropertyKey::String(ref name) = key else {
                continue;
            };
            let Some(desc) = self.get_own_property(o, &key)? else {
                continue;
            };
            if !desc.enumerable {
                continue;
            }
            match kind {
                EnumerableKind::Key => out.push(JsValue::String(name.clone())),
                EnumerableKind::Value => out.push(self.get(o, &key)?),
                EnumerableKind::KeyValue => {
                    let value = self.get(o, &key)?;
                    let entry = self.create_array_from_list(vec![JsValue::String(name.clone()), value])?;
                    out.push(JsValue::Object(entry));
                }
            }
        }
        Ok(out)
    }

    // §7.3.25 CopyDataProperties(target, source, excludedItems)
    pub(crate) fn copy_data_properties(
        &mut self,
        target: ObjectId,
        source: &JsValue,
        excluded: &[PropertyKey],
    ) -> JsResult<()> {
        if source.is_nullish() {
            return Ok(());
        }
        let from = self.to_object(source)?;
        for key in self.own_property_keys(from)? {
            if excluded.contains(&key) {
                continue;
            }
            if let Some(desc) = self.get_own_property(from, &key)?
                && desc.enumerable
            {
                let value = self.get(from, &key)?;
                self.create_data_property_or_throw(target, key, value)?;
            }
        }
        Ok(())
    }

    // §7.2.2 IsArray(argument)
    pub fn is_array(&mut self, value: &JsValue) -> JsResult<bool> {
        let JsValue::Object(o) = value else {
            return Ok(false);
        };
        let data = self.heap.object(*o)?;
        match &data.kind {
            ObjectKind::Array => Ok(true),
            ObjectKind::Proxy(p) => match p.target {
                Some(target) => self.is_array(&JsValue::Object(target)),
                None => Err(self.type_error("Cannot perform 'IsArray' on a proxy that has been revoked")),
            },
            _ => Ok(false),
        }
    }

    // §7.3.24 GetFunctionRealm(obj)
    pub(crate) fn get_function_realm(&mut self, o: ObjectId) -> JsResult<RealmId> {
        let data = self.heap.object(o)?;
        match &data.kind {
            ObjectKind::Function(f) => Ok(f.realm),
            ObjectKind::Builtin(b) => Ok(b.realm),
            ObjectKind::BoundFunction(b) => {
                let target = b.target;
                self.get_function_realm(target)
            }
            ObjectKind::Proxy(p) => match p.target {
                Some(target) => self.get_function_realm(target),
                None => Err(self.type_error("Cannot get the realm of a revoked proxy")),
            },
            _ => Ok(self.current_realm_id()),
        }
    }

    // ---- Private elements (§7.3.26 - §7.3.32) ----

    // §7.3.27 PrivateElementFind(O, P)
    pub(crate) fn private_element_find(&self, o: ObjectId, name: &PrivateName) -> EngineResult<Option<PrivateElement>> {
        Ok(self
            .heap
            .object(o)?
            .private_elements
            .iter()
            .find(|e| &e.key == name)
            .cloned())
    }

    // §7.3.28 PrivateFieldAdd(O, P, value)
    pub(crate) fn private_field_add(&mut self, o: ObjectId, name: PrivateName, value: JsValue) -> JsResult<()> {
        if self.private_element_find(o, &name)?.is_some() {
            return Err(self.type_error(format!(
                "Cannot initialize {} twice on the same object",
                name.description
            )));
        }
        self.heap.object_mut(o)?.private_elements.push(PrivateElement {
            key: name,
            kind: PrivateElementKind::Field(value),
        });
        Ok(())
    }

    // §7.3.29 PrivateMethodOrAccessorAdd(O, method)
    pub(crate) fn private_method_or_accessor_add(&mut self, o: ObjectId, method: PrivateElement) -> JsResult<()> {
        if self.private_element_find(o, &method.key)?.is_some() {
            return Err(self.type_error(format!(
                "Cannot initialize private methods of class {} twice on the same object",
                method.key.description
            )));
        }
        self.heap.object_mut(o)?.private_elements.push(method);
        Ok(())
    }

    // §7.3.31 PrivateGet(O, P)
    pub(crate) fn private_get(&mut self, o: ObjectId, name: &PrivateName) -> JsResult<JsValue> {
        let Some(entry) = self.private_element_find(o, name)? else {
            return Err(self.type_error(format!(
                "Cannot read private member {} from an object whose class did not declare it",
                name.description
            )));
        };
        match entry.kind {
            PrivateElementKind::Field(v) | PrivateElementKind::Method(v) => Ok(v),
            PrivateElementKind::Accessor { get, .. } => {
                if get.is_undefined() {
                    return Err(self.type_error(format!("'{}' was defined without a getter", name.description)));
                }
                self.call(&get, &JsValue::Object(o), &[])
            }
        }
    }

    // §7.3.32 PrivateSet(O, P, value)
    pub(crate) fn private_set(&mut self, o: ObjectId, name: &PrivateName, value: JsValue) -> JsResult<()> {
        let Some(entry) = self.private_element_find(o, name)? else {
            return Err(self.type_error(format!(
                "Cannot write private member {} to an object whose class did not declare it",
                name.description
            )));
        };
        match entry.kind {
            PrivateElementKind::Field(_) => {
                let data = self.heap.object_mut(o)?;
                if let Some(e) = data.private_elements.iter_mut().find(|e| &e.key == name) {
                    e.kind = PrivateElementKind::Field(value);
                }
                Ok(())
            }
            PrivateElementKind::Method(_) => {
                Err(self.type_error(format!("Private method {} is not writable", name.description)))
            }
            PrivateElementKind::Accessor { set, .. } => {
                if set.is_undefined() {
                    return Err(self.type_error(format!("'{}' was defined without a setter", name.description)));
                }
                self.call(&set, &JsValue::Object(o), &[value])?;
                Ok(())
            }
        }
    }

    /// Builtin tag used by `Object.prototype.toString`.
    pub(crate) fn builtin_tag(&mut self, o: ObjectId) -> JsResult<&'static str> {
        if self.is_array(&JsValue::Object(o))? {
            return Ok("Array");
        }
        let tag = match &self.heap.object(o)?.kind {
            ObjectKind::Arguments(_) => "Arguments",
            ObjectKind::Error => "Error",
            ObjectKind::Boolean(_) => "Boolean",
            ObjectKind::Number(_) => "Number",
            ObjectKind::String(_) => "String",
            _ => "",
        };
        if !tag.is_empty() {
            return Ok(tag);
        }
        if self.is_callable(&JsValue::Object(o))? {
            return Ok("Function");
        }
        Ok("Object")
    }
}
