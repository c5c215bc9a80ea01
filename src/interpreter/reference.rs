use super::*;

#[derive(Clone, Debug)]
pub(crate) enum ReferenceBase {
    Unresolvable,
    Environment(EnvId),
    Value(JsValue),
}

#[derive(Clone, Debug)]
pub(crate) enum ReferenceName {
    Key(PropertyKey),
    Private(PrivateName),
}

/// A Reference Record (§6.2.5): the result of evaluating an identifier or a
/// member expression, consumed right away by GetValue or PutValue.
#[derive(Clone, Debug)]
pub(crate) struct Reference {
    pub(crate) base: ReferenceBase,
    pub(crate) name: ReferenceName,
    pub(crate) strict: bool,
    /// Set for `super.x` references.
    pub(crate) this_value: Option<JsValue>,
}

impl Reference {
    pub(crate) fn binding(env: EnvId, name: &str, strict: bool) -> Self {
        Self {
            base: ReferenceBase::Environment(env),
            name: ReferenceName::Key(name.into()),
            strict,
            this_value: None,
        }
    }

    pub(crate) fn unresolvable(name: &str, strict: bool) -> Self {
        Self {
            base: ReferenceBase::Unresolvable,
            name: ReferenceName::Key(name.into()),
            strict,
            this_value: None,
        }
    }

    pub(crate) fn property(base: JsValue, key: PropertyKey, strict: bool) -> Self {
        Self {
            base: ReferenceBase::Value(base),
            name: ReferenceName::Key(key),
            strict,
            this_value: None,
        }
    }

    pub(crate) fn private(base: JsValue, name: PrivateName) -> Self {
        Self {
            base: ReferenceBase::Value(base),
            name: ReferenceName::Private(name),
            strict: true,
            this_value: None,
        }
    }

    // §6.2.5.1 IsPropertyReference(V)
    pub(crate) fn is_property_reference(&self) -> bool {
        matches!(self.base, ReferenceBase::Value(_))
    }

    // §6.2.5.2 IsUnresolvableReference(V)
    pub(crate) fn is_unresolvable(&self) -> bool {
        matches!(self.base, ReferenceBase::Unresolvable)
    }

    // §6.2.5.3 IsSuperReference(V)
    pub(crate) fn is_super_reference(&self) -> bool {
        self.this_value.is_some()
    }

    // §6.2.5.4 IsPrivateReference(V)
    pub(crate) fn is_private_reference(&self) -> bool {
        matches!(self.name, ReferenceName::Private(_))
    }

    // §6.2.5.7 GetThisValue(V)
    pub(crate) fn this_value(&self) -> JsValue {
        match (&self.this_value, &self.base) {
            (Some(this), _) => this.clone(),
            (None, ReferenceBase::Value(base)) => base.clone(),
            _ => JsValue::Undefined,
        }
    }

    /// The name as a binding identifier, for environment references.
    pub(crate) fn binding_name(&self) -> EngineResult<String> {
        match &self.name {
            ReferenceName::Key(PropertyKey::String(s)) => Ok(s.to_rust_string()),
            _ => Err(EngineError::Internal("environment reference with a non-string name")),
        }
    }

    pub(crate) fn display_name(&self) -> String {
        match &self.name {
            ReferenceName::Key(key) => key.to_string(),
            ReferenceName::Private(name) => name.description.to_rust_string(),
        }
    }
}

impl Interpreter {
    // §6.2.5.5 GetValue(V)
    pub(crate) fn get_value(&mut self, reference: &Reference) -> JsResult<JsValue> {
        match &reference.base {
            ReferenceBase::Unresolvable => {
                Err(self.reference_error(format!("{} is not defined", reference.display_name())))
            }
            ReferenceBase::Value(base) => match &reference.name {
                ReferenceName::Private(name) => {
                    let object = self.to_object(base)?;
                    self.private_get(object, name)
                }
                ReferenceName::Key(key) => {
                    if let JsValue::String(s) = base
                        && let Some(v) = string_primitive_property(s, key)
                    {
                        return Ok(v);
                    }
                    let object = self.to_object(base)?;
                    let this = reference.this_value();
                    self.internal_get(object, key, &this)
                }
            },
            ReferenceBase::Environment(env) => {
                let name = reference.binding_name()?;
                self.env_get_binding_value(*env, &name, reference.strict)
            }
        }
    }

    // §6.2.5.6 PutValue(V, W)
    pub(crate) fn put_value(&mut self, reference: &Reference, value: JsValue) -> JsResult<()> {
        match &reference.base {
            ReferenceBase::Unresolvable => {
                if reference.strict {
                    return Err(self.reference_error(format!("{} is not defined", reference.display_name())));
                }
                let ReferenceName::Key(key) = &reference.name else {
                    return Err(EngineError::Internal("unresolvable private reference").into());
                };
                let global = self.global_object();
                self.set(global, key.clone(), value, false)
            }
            ReferenceBase::Value(base) => {
                let object = self.to_object(base)?;
                match &reference.name {
                    ReferenceName::Private(name) => self.private_set(object, name, value),
                    ReferenceName::Key(key) => {
                        let this = reference.this_value();
                        let succeeded = self.internal_set(object, key.clone(), value, &this)?;
                        if !succeeded && reference.strict {
                            return Err(self.type_error(format!(
                                "Cannot assign to read only property '{key}' of {}",
                                self.describe_base(base)
                            )));
                        }
                        Ok(())
                    }
                }
            }
            ReferenceBase::Environment(env) => {
                let name = reference.binding_name()?;
                self.env_set_mutable_binding(*env, &name, value, reference.strict)
            }
        }
    }

    // §6.2.5.8 InitializeReferencedBinding(V, W)
    pub(crate) fn initialize_referenced_binding(&mut self, reference: &Reference, value: JsValue) -> JsResult<()> {
        let ReferenceBase::Environment(env) = reference.base else {
            return Err(EngineError::Internal("initializing a non-binding reference").into());
        };
        let name = reference.binding_name()?;
        self.env_initialize_binding(env, &name, value)
    }

    fn describe_base(&self, base: &JsValue) -> String {
        match base {
            JsValue::Object(_) => "object".to_string(),
            other => format!("{}", other),
        }
    }
}

/// `length` and index reads on string primitives, which never reach
/// user-visible code.
fn string_primitive_property(s: &JsString, key: &PropertyKey) -> Option<JsValue> {
    if key.is_string("length") {
        return Some(JsValue::Number(s.len() as f64));
    }
    let index = key.as_array_index()? as usize;
    s.code_unit_at(index)
        .map(|unit| JsValue::String(JsString::from_code_units(vec![unit])))
}
