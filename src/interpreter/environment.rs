use super::*;

/// A name binding in a declarative record. `value: None` marks a binding
/// that exists but has not been initialized yet (the temporal dead zone).
#[derive(Clone, Debug)]
pub(crate) struct Binding {
    pub(crate) mutable: bool,
    pub(crate) deletable: bool,
    pub(crate) strict: bool,
    pub(crate) value: Option<JsValue>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct DeclarativeRecord {
    pub(crate) bindings: FxHashMap<String, Binding>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ThisBindingStatus {
    Lexical,
    Initialized,
    Uninitialized,
}

#[derive(Clone, Debug)]
pub(crate) enum EnvKind {
    Declarative(DeclarativeRecord),
    Function {
        record: DeclarativeRecord,
        this_value: JsValue,
        this_status: ThisBindingStatus,
        function_object: ObjectId,
        new_target: JsValue,
    },
    Object {
        binding_object: ObjectId,
        is_with: bool,
    },
    Global {
        global_object: ObjectId,
        global_this: ObjectId,
        declarative: DeclarativeRecord,
        var_names: FxHashSet<String>,
    },
}

/// An environment record (§9.1) and its link to the enclosing record.
#[derive(Clone, Debug)]
pub(crate) struct EnvRecord {
    pub(crate) outer: Option<EnvId>,
    pub(crate) kind: EnvKind,
}

impl EnvRecord {
    fn declarative(&self) -> Option<&DeclarativeRecord> {
        match &self.kind {
            EnvKind::Declarative(record) | EnvKind::Function { record, .. } => Some(record),
            EnvKind::Global { declarative, .. } => Some(declarative),
            EnvKind::Object { .. } => None,
        }
    }

    fn declarative_mut(&mut self) -> Option<&mut DeclarativeRecord> {
        match &mut self.kind {
            EnvKind::Declarative(record) | EnvKind::Function { record, .. } => Some(record),
            EnvKind::Global { declarative, .. } => Some(declarative),
            EnvKind::Object { .. } => None,
        }
    }
}

impl Trace for DeclarativeRecord {
    fn trace(&self, tracer: &mut Tracer) {
        for binding in self.bindings.values() {
            if let Some(v) = &binding.value {
                tracer.value(v);
            }
        }
    }
}

impl Trace for EnvRecord {
    fn trace(&self, tracer: &mut Tracer) {
        if let Some(outer) = self.outer {
            tracer.env(outer);
        }
        match &self.kind {
            EnvKind::Declarative(record) => record.trace(tracer),
            EnvKind::Function {
                record,
                this_value,
                function_object,
                new_target,
                ..
            } => {
                record.trace(tracer);
                tracer.value(this_value);
                tracer.object(*function_object);
                tracer.value(new_target);
            }
            EnvKind::Object { binding_object, .. } => tracer.object(*binding_object),
            EnvKind::Global {
                global_object,
                global_this,
                declarative,
                ..
            } => {
                tracer.object(*global_object);
                tracer.object(*global_this);
                declarative.trace(tracer);
            }
        }
    }
}

/// Where in a record a name resolves, computed before any script-visible
/// step runs.
enum Slot {
    Declarative,
    Object(ObjectId, bool),
}

impl Interpreter {
    // §9.1.2.2 NewDeclarativeEnvironment(E)
    pub(crate) fn new_declarative_environment(&mut self, outer: Option<EnvId>) -> EnvId {
        self.heap.alloc_env(EnvRecord {
            outer,
            kind: EnvKind::Declarative(DeclarativeRecord::default()),
        })
    }

    // §9.1.2.3 NewObjectEnvironment(O, W, E)
    pub(crate) fn new_object_environment(&mut self, object: ObjectId, is_with: bool, outer: Option<EnvId>) -> EnvId {
        self.heap.alloc_env(EnvRecord {
            outer,
            kind: EnvKind::Object {
                binding_object: object,
                is_with,
            },
        })
    }

    // §9.1.2.4 NewFunctionEnvironment(F, newTarget)
    pub(crate) fn new_function_environment(&mut self, f: ObjectId, new_target: JsValue) -> EngineResult<EnvId> {
        let ObjectKind::Function(data) = &self.heap.object(f)?.kind else {
            return Err(EngineError::Internal("function environment for non-function"));
        };
        let this_status = if data.this_mode == ThisMode::Lexical {
            ThisBindingStatus::Lexical
        } else {
            ThisBindingStatus::Uninitialized
        };
        let outer = data.environment;
        Ok(self.heap.alloc_env(EnvRecord {
            outer: Some(outer),
            kind: EnvKind::Function {
                record: DeclarativeRecord::default(),
                this_value: JsValue::Undefined,
                this_status,
                function_object: f,
                new_target,
            },
        }))
    }

    // §9.1.2.5 NewGlobalEnvironment(G, thisValue)
    pub(crate) fn new_global_environment(&mut self, global: ObjectId, this_value: ObjectId) -> EnvId {
        self.heap.alloc_env(EnvRecord {
            outer: None,
            kind: EnvKind::Global {
                global_object: global,
                global_this: this_value,
                declarative: DeclarativeRecord::default(),
                var_names: FxHashSet::default(),
            },
        })
    }

    pub(crate) fn env_outer(&self, env: EnvId) -> EngineResult<Option<EnvId>> {
        Ok(self.heap.env(env)?.outer)
    }

    fn declarative_has(&self, env: EnvId, name: &str) -> EngineResult<bool> {
        Ok(self
            .heap
            .env(env)?
            .declarative()
            .is_some_and(|r| r.bindings.contains_key(name)))
    }

    /// Decides whether `name` lives in the declarative part of `env` or in
    /// its binding object.
    fn slot_for(&self, env: EnvId, name: &str) -> EngineResult<Slot> {
        let record = self.heap.env(env)?;
        Ok(match &record.kind {
            EnvKind::Declarative(_) | EnvKind::Function { .. } => Slot::Declarative,
            EnvKind::Object {
                binding_object,
                is_with,
            } => Slot::Object(*binding_object, *is_with),
            EnvKind::Global {
                declarative,
                global_object,
                ..
            } => {
                if declarative.bindings.contains_key(name) {
                    Slot::Declarative
                } else {
                    Slot::Object(*global_object, false)
                }
            }
        })
    }

    // §9.1.1.1.1 / §9.1.1.2.1 / §9.1.1.4.1 HasBinding(N)
    pub(crate) fn env_has_binding(&mut self, env: EnvId, name: &str) -> JsResult<bool> {
        match self.slot_for(env, name)? {
            Slot::Declarative => Ok(self.declarative_has(env, name)?),
            Slot::Object(object, is_with) => {
                let key = PropertyKey::from(name);
                if !self.has_property(object, &key)? {
                    return Ok(false);
                }
                if !is_with {
                    return Ok(true);
                }
                let unscopables_key = PropertyKey::Symbol(self.well_known_symbol(WellKnownSymbol::Unscopables));
                let unscopables = self.get(object, &unscopables_key)?;
                if let JsValue::Object(u) = unscopables {
                    let blocked = self.get(u, &key)?;
                    if to_boolean(&blocked) {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    // CreateMutableBinding(N, D)
    pub(crate) fn env_create_mutable_binding(&mut self, env: EnvId, name: &str, deletable: bool) -> JsResult<()> {
        if let EnvKind::Object { binding_object, .. } = self.heap.env(env)?.kind {
            let desc = PropertyDescriptor::data(JsValue::Undefined, true, true, deletable);
            return self.define_property_or_throw(binding_object, name.into(), desc);
        }
        if matches!(self.heap.env(env)?.kind, EnvKind::Global { .. }) && self.declarative_has(env, name)? {
            return Err(self.type_error(format!("Identifier '{name}' has already been declared")));
        }
        let binding = Binding {
            mutable: true,
            deletable,
            strict: false,
            value: None,
        };
        Ok(self.declarative_insert(env, name, binding)?)
    }

    // CreateImmutableBinding(N, S)
    pub(crate) fn env_create_immutable_binding(&mut self, env: EnvId, name: &str, strict: bool) -> JsResult<()> {
        if matches!(self.heap.env(env)?.kind, EnvKind::Global { .. }) && self.declarative_has(env, name)? {
            return Err(self.type_error(format!("Identifier '{name}' has already been declared")));
        }
        let binding = Binding {
            mutable: false,
            deletable: false,
            strict,
            value: None,
        };
        Ok(self.declarative_insert(env, name, binding)?)
    }

    /// Creates an uninitialized binding in a freshly made declarative
    /// environment, where neither redeclaration nor object delegation can
    /// occur.
    pub(crate) fn declare_uninitialized(&mut self, env: EnvId, name: &str, mutable: bool) -> EngineResult<()> {
        self.declarative_insert(
            env,
            name,
            Binding {
                mutable,
                deletable: false,
                strict: !mutable,
                value: None,
            },
        )
    }

    fn declarative_insert(&mut self, env: EnvId, name: &str, binding: Binding) -> EngineResult<()> {
        let record = self
            .heap
            .env_mut(env)?
            .declarative_mut()
            .ok_or(EngineError::Internal("declarative binding in object record"))?;
        if record.bindings.contains_key(name) {
            return Err(EngineError::Internal("duplicate binding"));
        }
        record.bindings.insert(name.to_string(), binding);
        Ok(())
    }

    // InitializeBinding(N, V)
    pub(crate) fn env_initialize_binding(&mut self, env: EnvId, name: &str, value: JsValue) -> JsResult<()> {
        match self.slot_for(env, name)? {
            Slot::Declarative => {
                let binding = self
                    .heap
                    .env_mut(env)?
                    .declarative_mut()
                    .and_then(|r| r.bindings.get_mut(name))
                    .ok_or(EngineError::Internal("initializing a missing binding"))?;
                binding.value = Some(value);
                Ok(())
            }
            Slot::Object(..) => self.env_set_mutable_binding(env, name, value, false),
        }
    }

    // SetMutableBinding(N, V, S)
    pub(crate) fn env_set_mutable_binding(&mut self, env: EnvId, name: &str, value: JsValue, strict: bool) -> JsResult<()> {
        match self.slot_for(env, name)? {
            Slot::Declarative => {
                let existing = self
                    .heap
                    .env(env)?
                    .declarative()
                    .and_then(|r| r.bindings.get(name))
                    .cloned();
                let Some(binding) = existing else {
                    // §9.1.1.1.5 step 1
                    if strict {
                        return Err(self.reference_error(format!("{name} is not defined")));
                    }
                    self.env_create_mutable_binding(env, name, true)?;
                    return self.env_initialize_binding(env, name, value);
                };
                let strict = strict || binding.strict;
                if binding.value.is_none() {
                    return Err(self.reference_error(format!("Cannot access '{name}' before initialization")));
                }
                if binding.mutable {
                    if let Some(b) = self
                        .heap
                        .env_mut(env)?
                        .declarative_mut()
                        .and_then(|r| r.bindings.get_mut(name))
                    {
                        b.value = Some(value);
                    }
                    Ok(())
                } else if strict {
                    Err(self.type_error("Assignment to constant variable."))
                } else {
                    Ok(())
                }
            }
            Slot::Object(object, _) => {
                let key = PropertyKey::from(name);
                let still_exists = self.has_property(object, &key)?;
                if !still_exists && strict {
                    return Err(self.reference_error(format!("{name} is not defined")));
                }
                self.set(object, key, value, strict)
            }
        }
    }

    // GetBindingValue(N, S)
    pub(crate) fn env_get_binding_value(&mut self, env: EnvId, name: &str, strict: bool) -> JsResult<JsValue> {
        match self.slot_for(env, name)? {
            Slot::Declarative => {
                let value = self
                    .heap
                    .env(env)?
                    .declarative()
                    .and_then(|r| r.bindings.get(name))
                    .map(|b| b.value.clone());
                match value {
                    Some(Some(v)) => Ok(v),
                    Some(None) => Err(self.reference_error(format!("Cannot access '{name}' before initialization"))),
                    None => Err(EngineError::Internal("reading a missing binding").into()),
                }
            }
            Slot::Object(object, _) => {
                let key = PropertyKey::from(name);
                if !self.has_property(object, &key)? {
                    if strict {
                        return Err(self.reference_error(format!("{name} is not defined")));
                    }
                    return Ok(JsValue::Undefined);
                }
                self.get(object, &key)
            }
        }
    }

    // DeleteBinding(N)
    pub(crate) fn env_delete_binding(&mut self, env: EnvId, name: &str) -> JsResult<bool> {
        match self.slot_for(env, name)? {
            Slot::Declarative => {
                let record = self
                    .heap
                    .env_mut(env)?
                    .declarative_mut()
                    .ok_or(EngineError::Internal("declarative binding in object record"))?;
                match record.bindings.get(name) {
                    Some(b) if !b.deletable => Ok(false),
                    _ => {
                        record.bindings.remove(name);
                        Ok(true)
                    }
                }
            }
            Slot::Object(object, _) => {
                let key = PropertyKey::from(name);
                let is_global = matches!(self.heap.env(env)?.kind, EnvKind::Global { .. });
                if is_global && !self.has_own_property(object, &key)? {
                    return Ok(true);
                }
                let status = self.delete(object, &key)?;
                if status
                    && is_global
                    && let EnvKind::Global { var_names, .. } = &mut self.heap.env_mut(env)?.kind
                {
                    var_names.remove(name);
                }
                Ok(status)
            }
        }
    }

    // HasThisBinding()
    pub(crate) fn env_has_this_binding(&self, env: EnvId) -> EngineResult<bool> {
        Ok(match &self.heap.env(env)?.kind {
            EnvKind::Function { this_status, .. } => *this_status != ThisBindingStatus::Lexical,
            EnvKind::Global { .. } => true,
            EnvKind::Declarative(_) | EnvKind::Object { .. } => false,
        })
    }

    // §9.1.1.3.3 HasSuperBinding()
    pub(crate) fn env_has_super_binding(&self, env: EnvId) -> EngineResult<bool> {
        let EnvKind::Function {
            this_status,
            function_object,
            ..
        } = &self.heap.env(env)?.kind
        else {
            return Ok(false);
        };
        if *this_status == ThisBindingStatus::Lexical {
            return Ok(false);
        }
        Ok(match &self.heap.object(*function_object)?.kind {
            ObjectKind::Function(f) => f.home_object.is_some(),
            _ => false,
        })
    }

    // WithBaseObject()
    pub(crate) fn env_with_base_object(&self, env: EnvId) -> EngineResult<Option<ObjectId>> {
        Ok(match &self.heap.env(env)?.kind {
            EnvKind::Object {
                binding_object,
                is_with: true,
            } => Some(*binding_object),
            _ => None,
        })
    }

    // §9.1.1.3.1 BindThisValue(V)
    pub(crate) fn env_bind_this_value(&mut self, env: EnvId, value: JsValue) -> JsResult<()> {
        let status = match &self.heap.env(env)?.kind {
            EnvKind::Function { this_status, .. } => *this_status,
            _ => return Err(EngineError::Internal("binding this in a non-function environment").into()),
        };
        match status {
            ThisBindingStatus::Lexical => Err(EngineError::Internal("binding this in an arrow environment").into()),
            ThisBindingStatus::Initialized => Err(self.reference_error("Super constructor may only be called once")),
            ThisBindingStatus::Uninitialized => {
                if let EnvKind::Function {
                    this_value,
                    this_status,
                    ..
                } = &mut self.heap.env_mut(env)?.kind
                {
                    *this_value = value;
                    *this_status = ThisBindingStatus::Initialized;
                }
                Ok(())
            }
        }
    }

    // GetThisBinding()
    pub(crate) fn env_get_this_binding(&mut self, env: EnvId) -> JsResult<JsValue> {
        let (status, value) = match &self.heap.env(env)?.kind {
            EnvKind::Function {
                this_status,
                this_value,
                ..
            } => (*this_status, this_value.clone()),
            EnvKind::Global { global_this, .. } => return Ok(JsValue::Object(*global_this)),
            _ => return Err(EngineError::Internal("environment has no this binding").into()),
        };
        match status {
            ThisBindingStatus::Initialized => Ok(value),
            ThisBindingStatus::Uninitialized => Err(self.reference_error(
                "Must call super constructor in derived class before accessing 'this' or returning from derived constructor",
            )),
            ThisBindingStatus::Lexical => Err(EngineError::Internal("arrow environment has no this").into()),
        }
    }

    // §9.1.1.3.5 GetSuperBase()
    pub(crate) fn env_get_super_base(&mut self, env: EnvId) -> JsResult<JsValue> {
        let EnvKind::Function { function_object, .. } = &self.heap.env(env)?.kind else {
            return Err(EngineError::Internal("super outside a method").into());
        };
        let home = match &self.heap.object(*function_object)?.kind {
            ObjectKind::Function(f) => f.home_object,
            _ => None,
        };
        let Some(home) = home else {
            return Ok(JsValue::Undefined);
        };
        Ok(self.get_prototype_of(home)?.into())
    }

    pub(crate) fn env_function_object(&self, env: EnvId) -> EngineResult<Option<ObjectId>> {
        Ok(match &self.heap.env(env)?.kind {
            EnvKind::Function { function_object, .. } => Some(*function_object),
            _ => None,
        })
    }

    pub(crate) fn env_new_target(&self, env: EnvId) -> EngineResult<JsValue> {
        Ok(match &self.heap.env(env)?.kind {
            EnvKind::Function { new_target, .. } => new_target.clone(),
            _ => JsValue::Undefined,
        })
    }

    // ---- Global environment records (§9.1.1.4) ----

    fn global_parts(&self, env: EnvId) -> EngineResult<ObjectId> {
        match &self.heap.env(env)?.kind {
            EnvKind::Global { global_object, .. } => Ok(*global_object),
            _ => Err(EngineError::Internal("expected a global environment")),
        }
    }

    // §9.1.1.4.12 HasVarDeclaration(N)
    pub(crate) fn global_has_var_declaration(&self, env: EnvId, name: &str) -> EngineResult<bool> {
        Ok(match &self.heap.env(env)?.kind {
            EnvKind::Global { var_names, .. } => var_names.contains(name),
            _ => false,
        })
    }

    // §9.1.1.4.13 HasLexicalDeclaration(N)
    pub(crate) fn global_has_lexical_declaration(&self, env: EnvId, name: &str) -> EngineResult<bool> {
        self.declarative_has(env, name)
    }

    // §9.1.1.4.14 HasRestrictedGlobalProperty(N)
    pub(crate) fn global_has_restricted_property(&mut self, env: EnvId, name: &str) -> JsResult<bool> {
        let global = self.global_parts(env)?;
        Ok(match self.get_own_property(global, &name.into())? {
            None => false,
            Some(p) => !p.configurable,
        })
    }

    // §9.1.1.4.15 CanDeclareGlobalVar(N)
    pub(crate) fn global_can_declare_var(&mut self, env: EnvId, name: &str) -> JsResult<bool> {
        let global = self.global_parts(env)?;
        if self.has_own_property(global, &name.into())? {
            return Ok(true);
        }
        self.is_extensible(global)
    }

    // §9.1.1.4.16 CanDeclareGlobalFunction(N)
    pub(crate) fn global_can_declare_function(&mut self, env: EnvId, name: &str) -> JsResult<bool> {
        let global = self.global_parts(env)?;
        match self.get_own_property(global, &name.into())? {
            None => self.is_extensible(global),
            Some(p) if p.configurable => Ok(true),
            Some(p) => Ok(p.is_data() && p.writable() == Some(true) && p.enumerable),
        }
    }

    // §9.1.1.4.17 CreateGlobalVarBinding(N, D)
    pub(crate) fn global_create_var_binding(&mut self, env: EnvId, name: &str, deletable: bool) -> JsResult<()> {
        let global = self.global_parts(env)?;
        let has_property = self.has_own_property(global, &name.into())?;
        let extensible = self.is_extensible(global)?;
        if !has_property && extensible {
            let desc = PropertyDescriptor::data(JsValue::Undefined, true, true, deletable);
            self.define_property_or_throw(global, name.into(), desc)?;
        }
        self.add_var_name(env, name)
    }

    // §9.1.1.4.18 CreateGlobalFunctionBinding(N, V, D)
    pub(crate) fn global_create_function_binding(
        &mut self,
        env: EnvId,
        name: &str,
        value: JsValue,
        deletable: bool,
    ) -> JsResult<()> {
        let global = self.global_parts(env)?;
        let key = PropertyKey::from(name);
        let desc = match self.get_own_property(global, &key)? {
            None => PropertyDescriptor::data(value.clone(), true, true, deletable),
            Some(p) if p.configurable => PropertyDescriptor::data(value.clone(), true, true, deletable),
            Some(_) => PropertyDescriptor::value_only(value.clone()),
        };
        self.define_property_or_throw(global, key.clone(), desc)?;
        self.set(global, key, value, false)?;
        self.add_var_name(env, name)
    }

    fn add_var_name(&mut self, env: EnvId, name: &str) -> JsResult<()> {
        if let EnvKind::Global { var_names, .. } = &mut self.heap.env_mut(env)?.kind {
            var_names.insert(name.to_string());
        }
        Ok(())
    }

    // ---- Resolution (§9.1.2.1, §9.4.2 - §9.4.5) ----

    // §9.1.2.1 GetIdentifierReference(env, name, strict)
    pub(crate) fn get_identifier_reference(&mut self, env: Option<EnvId>, name: &str, strict: bool) -> JsResult<Reference> {
        let mut current = env;
        while let Some(e) = current {
            if self.env_has_binding(e, name)? {
                return Ok(Reference::binding(e, name, strict));
            }
            current = self.env_outer(e)?;
        }
        Ok(Reference::unresolvable(name, strict))
    }

    // §9.4.2 ResolveBinding(name [, env])
    pub(crate) fn resolve_binding(&mut self, name: &str, env: Option<EnvId>) -> JsResult<Reference> {
        let env = match env {
            Some(e) => e,
            None => self.lexical_env()?,
        };
        let strict = self.is_strict();
        self.get_identifier_reference(Some(env), name, strict)
    }

    // §9.4.3 GetThisEnvironment()
    pub(crate) fn get_this_environment(&self) -> EngineResult<EnvId> {
        let mut env = self.lexical_env()?;
        loop {
            if self.env_has_this_binding(env)? {
                return Ok(env);
            }
            env = self
                .env_outer(env)?
                .ok_or(EngineError::Internal("environment chain without a this binding"))?;
        }
    }

    // §9.4.4 ResolveThisBinding()
    pub(crate) fn resolve_this_binding(&mut self) -> JsResult<JsValue> {
        let env = self.get_this_environment()?;
        self.env_get_this_binding(env)
    }

    // §9.4.5 GetNewTarget()
    pub(crate) fn get_new_target(&self) -> EngineResult<JsValue> {
        let env = self.get_this_environment()?;
        self.env_new_target(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script_env(interp: &mut Interpreter) -> EnvId {
        let global_env = interp.global_env().unwrap();
        interp.new_declarative_environment(Some(global_env))
    }

    #[test]
    fn uninitialized_binding_is_in_tdz() {
        let mut interp = Interpreter::new().unwrap();
        let env = script_env(&mut interp);
        interp.env_create_mutable_binding(env, "x", false).unwrap();
        assert!(interp.env_has_binding(env, "x").unwrap());
        let err = interp.env_get_binding_value(env, "x", true).unwrap_err();
        assert!(err.thrown().is_some());
        interp.env_initialize_binding(env, "x", JsValue::Number(1.0)).unwrap();
        assert_eq!(interp.env_get_binding_value(env, "x", true).unwrap().as_number(), Some(1.0));
    }

    #[test]
    fn immutable_binding_assignment() {
        let mut interp = Interpreter::new().unwrap();
        let env = script_env(&mut interp);
        interp.env_create_immutable_binding(env, "c", true).unwrap();
        interp.env_initialize_binding(env, "c", JsValue::Number(1.0)).unwrap();
        assert!(interp.env_set_mutable_binding(env, "c", JsValue::Number(2.0), false).is_err());

        interp.env_create_immutable_binding(env, "s", false).unwrap();
        interp.env_initialize_binding(env, "s", JsValue::Number(1.0)).unwrap();
        interp.env_set_mutable_binding(env, "s", JsValue::Number(2.0), false).unwrap();
        assert_eq!(interp.env_get_binding_value(env, "s", false).unwrap().as_number(), Some(1.0));
    }

    #[test]
    fn loop_and_catch_scopes_declare_uninitialized_bindings() {
        let mut interp = Interpreter::new().unwrap();
        let env = script_env(&mut interp);
        interp.declare_uninitialized(env, "i", true).unwrap();
        interp.declare_uninitialized(env, "k", false).unwrap();
        assert!(interp.env_get_binding_value(env, "i", true).unwrap_err().thrown().is_some());
        interp.env_initialize_binding(env, "i", JsValue::Number(0.0)).unwrap();
        interp.env_initialize_binding(env, "k", JsValue::Number(1.0)).unwrap();
        interp.env_set_mutable_binding(env, "i", JsValue::Number(5.0), true).unwrap();
        assert_eq!(interp.env_get_binding_value(env, "i", true).unwrap().as_number(), Some(5.0));
        assert!(interp.env_set_mutable_binding(env, "k", JsValue::Number(2.0), false).is_err());
        assert!(matches!(
            interp.declare_uninitialized(env, "i", true),
            Err(EngineError::Internal(_))
        ));
    }

    #[test]
    fn identifier_resolution_walks_outward() {
        let mut interp = Interpreter::new().unwrap();
        let outer = script_env(&mut interp);
        interp.env_create_mutable_binding(outer, "a", false).unwrap();
        interp.env_initialize_binding(outer, "a", JsValue::Boolean(true)).unwrap();
        let inner = interp.new_declarative_environment(Some(outer));
        let r = interp.get_identifier_reference(Some(inner), "a", true).unwrap();
        assert!(matches!(r.base, ReferenceBase::Environment(e) if e == outer));
        let missing = interp.get_identifier_reference(Some(inner), "nope", true).unwrap();
        assert!(missing.is_unresolvable());
    }

    #[test]
    fn global_var_bindings_live_on_the_global_object() {
        let mut interp = Interpreter::new().unwrap();
        let env = interp.global_env().unwrap();
        assert!(interp.global_can_declare_var(env, "v").unwrap());
        interp.global_create_var_binding(env, "v", false).unwrap();
        assert!(interp.global_has_var_declaration(env, "v").unwrap());
        let global = interp.global_object();
        let prop = interp.get_own_property(global, &"v".into()).unwrap().unwrap();
        assert!(!prop.configurable);
        assert!(interp.global_has_restricted_property(env, "v").unwrap());
        assert!(!interp.global_has_restricted_property(env, "w").unwrap());
    }

    #[test]
    fn global_lexical_bindings_shadow_object_record() {
        let mut interp = Interpreter::new().unwrap();
        let env = interp.global_env().unwrap();
        interp.env_create_mutable_binding(env, "l", false).unwrap();
        assert!(interp.global_has_lexical_declaration(env, "l").unwrap());
        assert!(interp.env_create_mutable_binding(env, "l", false).is_err());
        let global = interp.global_object();
        assert!(!interp.has_own_property(global, &"l".into()).unwrap());
    }

    #[test]
    fn with_environment_honors_unscopables() {
        let mut interp = Interpreter::new().unwrap();
        let object = interp.new_plain_object().unwrap();
        interp
            .create_data_property_or_throw(object, "hidden".into(), JsValue::Number(1.0))
            .unwrap();
        interp
            .create_data_property_or_throw(object, "shown".into(), JsValue::Number(2.0))
            .unwrap();
        let unscopables = interp.new_plain_object().unwrap();
        interp
            .create_data_property_or_throw(unscopables, "hidden".into(), JsValue::Boolean(true))
            .unwrap();
        let key = PropertyKey::Symbol(interp.well_known_symbol(WellKnownSymbol::Unscopables));
        interp
            .create_data_property_or_throw(object, key, JsValue::Object(unscopables))
            .unwrap();
        let env = interp.new_object_environment(object, true, None);
        assert!(!interp.env_has_binding(env, "hidden").unwrap());
        assert!(interp.env_has_binding(env, "shown").unwrap());
        assert_eq!(interp.env_with_base_object(env).unwrap(), Some(object));
    }
}
