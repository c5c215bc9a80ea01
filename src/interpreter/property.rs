use super::*;
use std::fmt;

/// A property key: a string or a symbol (§6.1.7).
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(JsString),
    Symbol(JsSymbol),
}

impl PropertyKey {
    pub fn from_index(index: u32) -> Self {
        PropertyKey::String(JsString::from_str(&index.to_string()))
    }

    pub fn as_array_index(&self) -> Option<u32> {
        match self {
            PropertyKey::String(s) => s.as_array_index(),
            PropertyKey::Symbol(_) => None,
        }
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, PropertyKey::Symbol(_))
    }

    pub fn as_string(&self) -> Option<&JsString> {
        match self {
            PropertyKey::String(s) => Some(s),
            PropertyKey::Symbol(_) => None,
        }
    }

    pub fn to_value(&self) -> JsValue {
        match self {
            PropertyKey::String(s) => JsValue::String(s.clone()),
            PropertyKey::Symbol(s) => JsValue::Symbol(s.clone()),
        }
    }

    pub fn is_string(&self, s: &str) -> bool {
        matches!(self, PropertyKey::String(k) if k == s)
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::String(JsString::from_str(s))
    }
}

impl From<JsString> for PropertyKey {
    fn from(s: JsString) -> Self {
        PropertyKey::String(s)
    }
}

impl From<JsSymbol> for PropertyKey {
    fn from(s: JsSymbol) -> Self {
        PropertyKey::Symbol(s)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{s}"),
            PropertyKey::Symbol(s) => write!(f, "{}", s.descriptive_string()),
        }
    }
}

impl fmt::Debug for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{s:?}"),
            PropertyKey::Symbol(s) => write!(f, "{}", s.descriptive_string()),
        }
    }
}

/// A stored own property. Always complete.
#[derive(Clone, Debug)]
pub struct Property {
    pub value: PropertyValue,
    pub enumerable: bool,
    pub configurable: bool,
}

#[derive(Clone, Debug)]
pub enum PropertyValue {
    Data { value: JsValue, writable: bool },
    /// `get` and `set` are `undefined` or callable objects.
    Accessor { get: JsValue, set: JsValue },
}

impl Property {
    pub fn data(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            value: PropertyValue::Data { value, writable },
            enumerable,
            configurable,
        }
    }

    pub fn accessor(get: JsValue, set: JsValue, enumerable: bool, configurable: bool) -> Self {
        Self {
            value: PropertyValue::Accessor { get, set },
            enumerable,
            configurable,
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self.value, PropertyValue::Data { .. })
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self.value, PropertyValue::Accessor { .. })
    }

    pub fn data_value(&self) -> Option<&JsValue> {
        match &self.value {
            PropertyValue::Data { value, .. } => Some(value),
            PropertyValue::Accessor { .. } => None,
        }
    }

    pub fn writable(&self) -> Option<bool> {
        match &self.value {
            PropertyValue::Data { writable, .. } => Some(*writable),
            PropertyValue::Accessor { .. } => None,
        }
    }
}

/// A possibly partial descriptor as passed to [[DefineOwnProperty]] (§6.2.6).
#[derive(Clone, Debug, Default)]
pub struct PropertyDescriptor {
    pub value: Option<JsValue>,
    pub writable: Option<bool>,
    pub get: Option<JsValue>,
    pub set: Option<JsValue>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    pub fn data(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            value: Some(value),
            writable: Some(writable),
            enumerable: Some(enumerable),
            configurable: Some(configurable),
            ..Default::default()
        }
    }

    pub fn accessor(get: JsValue, set: JsValue, enumerable: bool, configurable: bool) -> Self {
        Self {
            get: Some(get),
            set: Some(set),
            enumerable: Some(enumerable),
            configurable: Some(configurable),
            ..Default::default()
        }
    }

    /// `{ value, writable: true, enumerable: true, configurable: true }`
    pub fn data_default(value: JsValue) -> Self {
        Self::data(value, true, true, true)
    }

    pub fn value_only(value: JsValue) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }

    // §6.2.6.1 IsAccessorDescriptor
    pub fn is_accessor_descriptor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    // §6.2.6.2 IsDataDescriptor
    pub fn is_data_descriptor(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    // §6.2.6.3 IsGenericDescriptor
    pub fn is_generic_descriptor(&self) -> bool {
        !self.is_accessor_descriptor() && !self.is_data_descriptor()
    }

    pub fn is_empty(&self) -> bool {
        self.is_generic_descriptor() && self.enumerable.is_none() && self.configurable.is_none()
    }

    // §6.2.6.6 CompletePropertyDescriptor, producing the stored form
    pub fn complete(&self) -> Property {
        let enumerable = self.enumerable.unwrap_or(false);
        let configurable = self.configurable.unwrap_or(false);
        if self.is_accessor_descriptor() {
            Property::accessor(
                self.get.clone().unwrap_or(JsValue::Undefined),
                self.set.clone().unwrap_or(JsValue::Undefined),
                enumerable,
                configurable,
            )
        } else {
            Property::data(
                self.value.clone().unwrap_or(JsValue::Undefined),
                self.writable.unwrap_or(false),
                enumerable,
                configurable,
            )
        }
    }
}

impl From<&Property> for PropertyDescriptor {
    fn from(p: &Property) -> Self {
        match &p.value {
            PropertyValue::Data { value, writable } => {
                PropertyDescriptor::data(value.clone(), *writable, p.enumerable, p.configurable)
            }
            PropertyValue::Accessor { get, set } => {
                PropertyDescriptor::accessor(get.clone(), set.clone(), p.enumerable, p.configurable)
            }
        }
    }
}

struct Entry {
    seq: u64,
    property: Property,
}

/// Own properties of an object, remembering insertion order.
#[derive(Default)]
pub(crate) struct PropertyMap {
    map: FxHashMap<PropertyKey, Entry>,
    next_seq: u64,
}

impl PropertyMap {
    pub(crate) fn get(&self, key: &PropertyKey) -> Option<&Property> {
        self.map.get(key).map(|e| &e.property)
    }

    pub(crate) fn get_mut(&mut self, key: &PropertyKey) -> Option<&mut Property> {
        self.map.get_mut(key).map(|e| &mut e.property)
    }

    pub(crate) fn contains(&self, key: &PropertyKey) -> bool {
        self.map.contains_key(key)
    }

    /// Inserts or replaces; a replaced property keeps its original position.
    pub(crate) fn insert(&mut self, key: PropertyKey, property: Property) {
        if let Some(entry) = self.map.get_mut(&key) {
            entry.property = property;
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.map.insert(key, Entry { seq, property });
    }

    pub(crate) fn remove(&mut self, key: &PropertyKey) -> Option<Property> {
        self.map.remove(key).map(|e| e.property)
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &Property> {
        self.map.values().map(|e| &e.property)
    }

    /// Array indices ascending, then other strings in insertion order, then
    /// symbols in insertion order (§10.1.11.1).
    pub(crate) fn ordered_keys(&self) -> Vec<PropertyKey> {
        let mut indices: Vec<(u32, &PropertyKey)> = Vec::new();
        let mut strings: Vec<(u64, &PropertyKey)> = Vec::new();
        let mut symbols: Vec<(u64, &PropertyKey)> = Vec::new();
        for (key, entry) in &self.map {
            match key {
                PropertyKey::String(s) => match s.as_array_index() {
                    Some(i) => indices.push((i, key)),
                    None => strings.push((entry.seq, key)),
                },
                PropertyKey::Symbol(_) => symbols.push((entry.seq, key)),
            }
        }
        indices.sort_unstable_by_key(|(i, _)| *i);
        strings.sort_unstable_by_key(|(s, _)| *s);
        symbols.sort_unstable_by_key(|(s, _)| *s);
        indices
            .into_iter()
            .map(|(_, k)| k.clone())
            .chain(strings.into_iter().map(|(_, k)| k.clone()))
            .chain(symbols.into_iter().map(|(_, k)| k.clone()))
            .collect()
    }

    /// Array-index keys at or above `from`, in descending order.
    pub(crate) fn indices_from(&self, from: u32) -> Vec<u32> {
        let mut out: Vec<u32> = self
            .map
            .keys()
            .filter_map(PropertyKey::as_array_index)
            .filter(|&i| i >= from)
            .collect();
        out.sort_unstable_by(|a, b| b.cmp(a));
        out
    }
}

// §10.1.6.3 ValidateAndApplyPropertyDescriptor(O, P, extensible, Desc, current)
//
// `target` is `None` when only validating (O is undefined).
pub(crate) fn validate_and_apply_property_descriptor(
    target: Option<(&mut PropertyMap, PropertyKey)>,
    extensible: bool,
    desc: &PropertyDescriptor,
    current: Option<&Property>,
) -> bool {
    let Some(current) = current else {
        if !extensible {
            return false;
        }
        if let Some((map, key)) = target {
            map.insert(key, desc.complete());
        }
        return true;
    };

    if desc.is_empty() {
        return true;
    }

    if !current.configurable {
        if desc.configurable == Some(true) {
            return false;
        }
        if let Some(e) = desc.enumerable
            && e != current.enumerable
        {
            return false;
        }
        if !desc.is_generic_descriptor() && desc.is_accessor_descriptor() != current.is_accessor() {
            return false;
        }
        match &current.value {
            PropertyValue::Accessor { get, set } => {
                if let Some(g) = &desc.get
                    && !same_value(g, get)
                {
                    return false;
                }
                if let Some(s) = &desc.set
                    && !same_value(s, set)
                {
                    return false;
                }
            }
            PropertyValue::Data { value, writable } => {
                if !*writable {
                    if desc.writable == Some(true) {
                        return false;
                    }
                    if let Some(v) = &desc.value
                        && !same_value(v, value)
                    {
                        return false;
                    }
                }
            }
        }
    }

    if let Some((map, key)) = target {
        let enumerable = desc.enumerable.unwrap_or(current.enumerable);
        let configurable = desc.configurable.unwrap_or(current.configurable);
        let updated = match &current.value {
            PropertyValue::Data { .. } if desc.is_accessor_descriptor() => Property::accessor(
                desc.get.clone().unwrap_or(JsValue::Undefined),
                desc.set.clone().unwrap_or(JsValue::Undefined),
                enumerable,
                configurable,
            ),
            PropertyValue::Accessor { .. } if desc.is_data_descriptor() => Property::data(
                desc.value.clone().unwrap_or(JsValue::Undefined),
                desc.writable.unwrap_or(false),
                enumerable,
                configurable,
            ),
            PropertyValue::Data { value, writable } => Property::data(
                desc.value.clone().unwrap_or_else(|| value.clone()),
                desc.writable.unwrap_or(*writable),
                enumerable,
                configurable,
            ),
            PropertyValue::Accessor { get, set } => Property::accessor(
                desc.get.clone().unwrap_or_else(|| get.clone()),
                desc.set.clone().unwrap_or_else(|| set.clone()),
                enumerable,
                configurable,
            ),
        };
        map.insert(key, updated);
    }
    true
}

// §10.1.6.2 IsCompatiblePropertyDescriptor(Extensible, Desc, Current)
pub(crate) fn is_compatible_property_descriptor(
    extensible: bool,
    desc: &PropertyDescriptor,
    current: Option<&Property>,
) -> bool {
    validate_and_apply_property_descriptor(None, extensible, desc, current)
}

impl Interpreter {
    // §6.2.6.4 FromPropertyDescriptor
    pub(crate) fn from_property_descriptor(&mut self, desc: Option<&PropertyDescriptor>) -> JsResult<JsValue> {
        let Some(desc) = desc else {
            return Ok(JsValue::Undefined);
        };
        let proto = self.intrinsic(Intrinsic::ObjectPrototype)?;
        let obj = self.ordinary_object_create(Some(proto));
        let fields = [
            ("value", desc.value.clone()),
            ("writable", desc.writable.map(JsValue::Boolean)),
            ("get", desc.get.clone()),
            ("set", desc.set.clone()),
            ("enumerable", desc.enumerable.map(JsValue::Boolean)),
            ("configurable", desc.configurable.map(JsValue::Boolean)),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                self.create_data_property_or_throw(obj, name.into(), value)?;
            }
        }
        Ok(JsValue::Object(obj))
    }

    // §6.2.6.5 ToPropertyDescriptor
    pub(crate) fn to_property_descriptor(&mut self, value: &JsValue) -> JsResult<PropertyDescriptor> {
        let JsValue::Object(obj) = value else {
            return Err(self.type_error("Property description must be an object"));
        };
        let obj = *obj;
        let mut desc = PropertyDescriptor::default();
        if self.has_property(obj, &"enumerable".into())? {
            let v = self.get(obj, &"enumerable".into())?;
            desc.enumerable = Some(to_boolean(&v));
        }
        if self.has_property(obj, &"configurable".into())? {
            let v = self.get(obj, &"configurable".into())?;
            desc.configurable = Some(to_boolean(&v));
        }
        if self.has_property(obj, &"value".into())? {
            desc.value = Some(self.get(obj, &"value".into())?);
        }
        if self.has_property(obj, &"writable".into())? {
            let v = self.get(obj, &"writable".into())?;
            desc.writable = Some(to_boolean(&v));
        }
        if self.has_property(obj, &"get".into())? {
            let getter = self.get(obj, &"get".into())?;
            if !self.is_callable(&getter)? && !getter.is_undefined() {
                return Err(self.type_error("Getter must be a function"));
            }
            desc.get = Some(getter);
        }
        if self.has_property(obj, &"set".into())? {
            let setter = self.get(obj, &"set".into())?;
            if !self.is_callable(&setter)? && !setter.is_undefined() {
                return Err(self.type_error("Setter must be a function"));
            }
            desc.set = Some(setter);
        }
        if desc.is_accessor_descriptor() && desc.is_data_descriptor() {
            return Err(self.type_error(
                "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute",
            ));
        }
        Ok(desc)
    }
}
