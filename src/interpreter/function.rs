use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ThisMode {
    Lexical,
    Strict,
    Global,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ConstructorKind {
    Base,
    Derived,
}

/// Name of a class element: a property key or a private name.
#[derive(Clone, Debug)]
pub(crate) enum FieldName {
    Key(PropertyKey),
    Private(PrivateName),
}

impl FieldName {
    pub(crate) fn function_name(&self) -> PropertyKey {
        match self {
            FieldName::Key(key) => key.clone(),
            FieldName::Private(name) => PropertyKey::String(name.description.clone()),
        }
    }
}

// §6.2.10 ClassFieldDefinition Records
#[derive(Clone, Debug)]
pub(crate) struct ClassFieldDefinition {
    pub(crate) name: FieldName,
    pub(crate) initializer: Option<ObjectId>,
}

/// Internal slots of an ECMAScript function object (§10.2, Table 30).
pub(crate) struct FunctionData {
    pub(crate) node: Rc<FunctionNode>,
    pub(crate) environment: EnvId,
    pub(crate) private_environment: Option<Rc<PrivateEnvironment>>,
    pub(crate) this_mode: ThisMode,
    pub(crate) strict: bool,
    pub(crate) home_object: Option<ObjectId>,
    pub(crate) constructor_kind: ConstructorKind,
    pub(crate) is_class_constructor: bool,
    pub(crate) is_constructor: bool,
    /// A class constructor synthesized because the class has none.
    pub(crate) default_constructor: bool,
    pub(crate) fields: Vec<ClassFieldDefinition>,
    pub(crate) private_methods: Vec<PrivateElement>,
    /// For field initializers: the name anonymous functions in the
    /// initializer take.
    pub(crate) class_field_name: Option<PropertyKey>,
    pub(crate) realm: RealmId,
}

impl Trace for FunctionData {
    fn trace(&self, tracer: &mut Tracer) {
        tracer.env(self.environment);
        if let Some(home) = self.home_object {
            tracer.object(home);
        }
        for field in &self.fields {
            if let Some(init) = field.initializer {
                tracer.object(init);
            }
        }
        for method in &self.private_methods {
            method.trace(tracer);
        }
    }
}

/// Arguments of a native function invocation.
pub struct NativeCall<'a> {
    pub callee: ObjectId,
    pub this: &'a JsValue,
    pub args: &'a [JsValue],
    /// `Some` when invoked through [[Construct]].
    pub new_target: Option<ObjectId>,
}

impl NativeCall<'_> {
    pub fn arg(&self, index: usize) -> JsValue {
        self.args.get(index).cloned().unwrap_or(JsValue::Undefined)
    }
}

/// Behaviour of a built-in function object.
pub type NativeFn = fn(&mut Interpreter, &NativeCall<'_>) -> JsResult<JsValue>;

// §10.3 Built-in Function Objects
pub(crate) struct BuiltinData {
    pub(crate) behavior: NativeFn,
    /// Captured values for closures such as revocation functions.
    pub(crate) slots: Vec<JsValue>,
    pub(crate) realm: RealmId,
    pub(crate) is_constructor: bool,
    pub(crate) initial_name: Option<JsString>,
}

// §10.4.1 Bound Function Exotic Objects
pub(crate) struct BoundFunctionData {
    pub(crate) target: ObjectId,
    pub(crate) bound_this: JsValue,
    pub(crate) bound_args: Vec<JsValue>,
    pub(crate) is_constructor: bool,
}

impl Trace for BoundFunctionData {
    fn trace(&self, tracer: &mut Tracer) {
        tracer.object(self.target);
        tracer.value(&self.bound_this);
        tracer.values(&self.bound_args);
    }
}

impl Interpreter {
    pub(crate) fn function_data(&self, f: ObjectId) -> EngineResult<&FunctionData> {
        match &self.heap.object(f)?.kind {
            ObjectKind::Function(data) => Ok(data),
            _ => Err(EngineError::Internal("expected an ECMAScript function object")),
        }
    }

    pub(crate) fn function_data_mut(&mut self, f: ObjectId) -> EngineResult<&mut FunctionData> {
        match &mut self.heap.object_mut(f)?.kind {
            ObjectKind::Function(data) => Ok(data),
            _ => Err(EngineError::Internal("expected an ECMAScript function object")),
        }
    }

    // ---- Creation (§10.2.3 - §10.2.10) ----

    // §10.2.3 OrdinaryFunctionCreate(functionPrototype, sourceText, ParameterList, Body, thisMode, env, privateEnv)
    pub(crate) fn ordinary_function_create(
        &mut self,
        proto: ObjectId,
        node: Rc<FunctionNode>,
        env: EnvId,
        private_env: Option<Rc<PrivateEnvironment>>,
        outer_strict: bool,
    ) -> JsResult<ObjectId> {
        let strict = outer_strict
            || matches!(
                node.kind,
                FunctionKind::ClassConstructor | FunctionKind::DerivedConstructor | FunctionKind::ClassInitializer
            )
            || has_use_strict_directive(node.body_statements());
        let this_mode = if node.is_arrow() {
            ThisMode::Lexical
        } else if strict {
            ThisMode::Strict
        } else {
            ThisMode::Global
        };
        let length = expected_argument_count(&node.params);
        let data = FunctionData {
            constructor_kind: if node.kind == FunctionKind::DerivedConstructor {
                ConstructorKind::Derived
            } else {
                ConstructorKind::Base
            },
            is_class_constructor: matches!(node.kind, FunctionKind::ClassConstructor | FunctionKind::DerivedConstructor),
            node,
            environment: env,
            private_environment: private_env,
            this_mode,
            strict,
            home_object: None,
            is_constructor: false,
            default_constructor: false,
            fields: Vec::new(),
            private_methods: Vec::new(),
            class_field_name: None,
            realm: self.current_realm_id(),
        };
        let f = self.object_with_kind(Some(proto), ObjectKind::Function(Box::new(data)));
        self.set_function_length(f, length as f64)?;
        Ok(f)
    }

    // §10.2.5 MakeConstructor(F [, writablePrototype [, prototype]])
    pub(crate) fn make_constructor(
        &mut self,
        f: ObjectId,
        writable_prototype: bool,
        prototype: Option<ObjectId>,
    ) -> JsResult<()> {
        if let ObjectKind::Function(data) = &mut self.heap.object_mut(f)?.kind {
            data.is_constructor = true;
        }
        let prototype = match prototype {
            Some(p) => p,
            None => {
                let p = self.new_plain_object()?;
                let desc = PropertyDescriptor::data(JsValue::Object(f), writable_prototype, false, true);
                self.define_property_or_throw(p, "constructor".into(), desc)?;
                p
            }
        };
        let desc = PropertyDescriptor::data(JsValue::Object(prototype), writable_prototype, false, false);
        self.define_property_or_throw(f, "prototype".into(), desc)
    }

    // §10.2.7 MakeMethod(F, homeObject)
    pub(crate) fn make_method(&mut self, f: ObjectId, home: ObjectId) -> EngineResult<()> {
        self.function_data_mut(f)?.home_object = Some(home);
        Ok(())
    }

    // §10.2.9 SetFunctionName(F, name [, prefix])
    pub(crate) fn set_function_name(&mut self, f: ObjectId, name: &PropertyKey, prefix: Option<&str>) -> JsResult<()> {
        let base = match name {
            PropertyKey::Symbol(sym) => match sym.description() {
                Some(desc) => JsString::from_str(&format!("[{desc}]")),
                None => JsString::empty(),
            },
            PropertyKey::String(s) => s.clone(),
        };
        let full = match prefix {
            Some(p) => JsString::from_str(p).concat(&JsString::from_str(" ")).concat(&base),
            None => base,
        };
        if let ObjectKind::Builtin(b) = &mut self.heap.object_mut(f)?.kind {
            b.initial_name = Some(full.clone());
        }
        let desc = PropertyDescriptor::data(JsValue::String(full), false, false, true);
        self.define_property_or_throw(f, "name".into(), desc)
    }

    // §10.2.10 SetFunctionLength(F, length)
    pub(crate) fn set_function_length(&mut self, f: ObjectId, length: f64) -> JsResult<()> {
        let desc = PropertyDescriptor::data(JsValue::Number(length), false, false, true);
        self.define_property_or_throw(f, "length".into(), desc)
    }

    /// Function objects for hoisted declarations: InstantiateOrdinaryFunctionObject
    /// (§15.2.4) and InstantiateGeneratorFunctionObject (§15.5.3).
    pub(crate) fn instantiate_function_object(
        &mut self,
        node: &Rc<FunctionNode>,
        env: EnvId,
        private_env: Option<Rc<PrivateEnvironment>>,
    ) -> JsResult<ObjectId> {
        let name = node.name.clone().unwrap_or_else(|| "default".to_string());
        let f = self.create_function_object(node, env, private_env)?;
        self.set_function_name(f, &PropertyKey::from(name.as_str()), None)?;
        self.finish_function_object(f, node)?;
        Ok(f)
    }

    fn create_function_object(
        &mut self,
        node: &Rc<FunctionNode>,
        env: EnvId,
        private_env: Option<Rc<PrivateEnvironment>>,
    ) -> JsResult<ObjectId> {
        let proto = if node.is_generator {
            self.intrinsic(Intrinsic::GeneratorFunctionPrototype)?
        } else {
            self.intrinsic(Intrinsic::FunctionPrototype)?
        };
        let strict = self.is_strict();
        self.ordinary_function_create(proto, node.clone(), env, private_env, strict)
    }

    /// Adds the `prototype` property generators and plain functions carry.
    fn finish_function_object(&mut self, f: ObjectId, node: &FunctionNode) -> JsResult<()> {
        if node.is_generator {
            let proto = self.intrinsic(Intrinsic::GeneratorPrototype)?;
            let prototype = self.ordinary_object_create(Some(proto));
            let desc = PropertyDescriptor::data(JsValue::Object(prototype), true, false, false);
            self.define_property_or_throw(f, "prototype".into(), desc)?;
        } else if node.kind == FunctionKind::Normal {
            self.make_constructor(f, true, None)?;
        }
        Ok(())
    }

    /// Function and generator expressions (§15.2.5, §15.5.4) and arrow
    /// functions (§15.3.4). `name` is the name supplied by NamedEvaluation.
    pub(crate) fn instantiate_function_expression(
        &mut self,
        node: &Rc<FunctionNode>,
        name: Option<&PropertyKey>,
    ) -> JsResult<ObjectId> {
        let env = self.lexical_env()?;
        let private_env = self.private_env()?;
        if !node.is_arrow()
            && let Some(own_name) = node.name.as_deref()
            && !own_name.is_empty()
        {
            let func_env = self.new_declarative_environment(Some(env));
            self.env_create_immutable_binding(func_env, own_name, false)?;
            let closure = self.create_function_object(node, func_env, private_env)?;
            self.set_function_name(closure, &PropertyKey::from(own_name), None)?;
            self.finish_function_object(closure, node)?;
            self.env_initialize_binding(func_env, own_name, JsValue::Object(closure))?;
            return Ok(closure);
        }
        let closure = self.create_function_object(node, env, private_env)?;
        let name = name.cloned().unwrap_or_else(|| PropertyKey::String(JsString::empty()));
        self.set_function_name(closure, &name, None)?;
        self.finish_function_object(closure, node)?;
        Ok(closure)
    }

    // §10.3.4 CreateBuiltinFunction(behaviour, length, name, additionalInternalSlotsList, realm, prototype, prefix)
    pub fn create_builtin_function(
        &mut self,
        behavior: NativeFn,
        length: u32,
        name: impl Into<PropertyKey>,
        realm: Option<RealmId>,
        prototype: Option<ObjectId>,
    ) -> JsResult<ObjectId> {
        let realm = realm.unwrap_or_else(|| self.current_realm_id());
        let prototype = match prototype {
            Some(p) => p,
            None => self.realm_intrinsic(realm, Intrinsic::FunctionPrototype)?,
        };
        let f = self.object_with_kind(
            Some(prototype),
            ObjectKind::Builtin(Box::new(BuiltinData {
                behavior,
                slots: Vec::new(),
                realm,
                is_constructor: false,
                initial_name: None,
            })),
        );
        self.set_function_length(f, length as f64)?;
        self.set_function_name(f, &name.into(), None)?;
        Ok(f)
    }

    /// A built-in function whose behaviour reads captured `slots`.
    pub(crate) fn create_builtin_closure(
        &mut self,
        behavior: NativeFn,
        length: u32,
        name: &str,
        slots: Vec<JsValue>,
    ) -> JsResult<ObjectId> {
        let f = self.create_builtin_function(behavior, length, name, None, None)?;
        if let ObjectKind::Builtin(b) = &mut self.heap.object_mut(f)?.kind {
            b.slots = slots;
        }
        Ok(f)
    }

    /// A built-in constructor linked to `prototype` both ways.
    pub(crate) fn create_builtin_constructor(
        &mut self,
        behavior: NativeFn,
        length: u32,
        name: &str,
        prototype: ObjectId,
        function_proto: Option<ObjectId>,
    ) -> JsResult<ObjectId> {
        let f = self.create_builtin_function(behavior, length, name, None, function_proto)?;
        if let ObjectKind::Builtin(b) = &mut self.heap.object_mut(f)?.kind {
            b.is_constructor = true;
        }
        self.define_property_or_throw(
            f,
            "prototype".into(),
            PropertyDescriptor::data(JsValue::Object(prototype), false, false, false),
        )?;
        self.define_property_or_throw(
            prototype,
            "constructor".into(),
            PropertyDescriptor::data(JsValue::Object(f), true, false, true),
        )?;
        Ok(f)
    }

    pub(crate) fn builtin_slot(&self, f: ObjectId, index: usize) -> EngineResult<JsValue> {
        match &self.heap.object(f)?.kind {
            ObjectKind::Builtin(b) => Ok(b.slots.get(index).cloned().unwrap_or(JsValue::Undefined)),
            _ => Err(EngineError::Internal("slot read on a non-builtin")),
        }
    }

    pub(crate) fn set_builtin_slot(&mut self, f: ObjectId, index: usize, value: JsValue) -> EngineResult<()> {
        if let ObjectKind::Builtin(b) = &mut self.heap.object_mut(f)?.kind
            && let Some(slot) = b.slots.get_mut(index)
        {
            *slot = value;
        }
        Ok(())
    }

    // §10.4.1.3 BoundFunctionCreate(targetFunction, boundThis, boundArgs)
    pub(crate) fn bound_function_create(
        &mut self,
        target: ObjectId,
        bound_this: JsValue,
        bound_args: Vec<JsValue>,
    ) -> JsResult<ObjectId> {
        let proto = self.get_prototype_of(target)?;
        let is_constructor = self.is_constructor(&JsValue::Object(target))?;
        Ok(self.object_with_kind(
            proto,
            ObjectKind::BoundFunction(Box::new(BoundFunctionData {
                target,
                bound_this,
                bound_args,
                is_constructor,
            })),
        ))
    }

    // ---- [[Call]] and [[Construct]] ----

    // §7.3.14 Call(F, V [, argumentsList])
    pub fn call(&mut self, f: &JsValue, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        let JsValue::Object(fo) = f else {
            return Err(self.type_error(format!("{f} is not a function")));
        };
        let fo = *fo;
        enum Target {
            Ecma,
            Builtin(NativeFn, RealmId),
            Bound(ObjectId, JsValue, Vec<JsValue>),
            Proxy,
            None,
        }
        let target = match &self.heap.object(fo)?.kind {
            ObjectKind::Function(_) => Target::Ecma,
            ObjectKind::Builtin(b) => Target::Builtin(b.behavior, b.realm),
            ObjectKind::BoundFunction(b) => Target::Bound(b.target, b.bound_this.clone(), b.bound_args.clone()),
            ObjectKind::Proxy(p) if p.callable => Target::Proxy,
            _ => Target::None,
        };
        tracing::trace!(depth = self.context_stack.len(), "call");
        match target {
            Target::Ecma => self.call_ecmascript_function(fo, this, args),
            Target::Builtin(behavior, realm) => self.call_builtin(fo, behavior, realm, this, args, None),
            Target::Bound(target, bound_this, mut bound_args) => {
                bound_args.extend_from_slice(args);
                self.call(&JsValue::Object(target), &bound_this, &bound_args)
            }
            Target::Proxy => self.proxy_call(fo, this, args),
            Target::None => Err(self.type_error("object is not a function")),
        }
    }

    // §7.3.15 Construct(F [, argumentsList [, newTarget]])
    pub fn construct(&mut self, f: ObjectId, args: &[JsValue], new_target: Option<ObjectId>) -> JsResult<ObjectId> {
        let new_target = new_target.unwrap_or(f);
        enum Target {
            Ecma,
            Builtin(NativeFn, RealmId),
            Bound(ObjectId, Vec<JsValue>),
            Proxy,
            None,
        }
        let target = match &self.heap.object(f)?.kind {
            ObjectKind::Function(data) if data.is_constructor => Target::Ecma,
            ObjectKind::Builtin(b) if b.is_constructor => Target::Builtin(b.behavior, b.realm),
            ObjectKind::BoundFunction(b) if b.is_constructor => Target::Bound(b.target, b.bound_args.clone()),
            ObjectKind::Proxy(p) if p.constructor => Target::Proxy,
            _ => Target::None,
        };
        tracing::trace!(depth = self.context_stack.len(), "construct");
        match target {
            Target::Ecma => self.construct_ecmascript_function(f, args, new_target),
            Target::Builtin(behavior, realm) => {
                let result = self.call_builtin(f, behavior, realm, &JsValue::Undefined, args, Some(new_target))?;
                match result {
                    JsValue::Object(o) => Ok(o),
                    _ => Err(EngineError::Internal("built-in constructor returned a primitive").into()),
                }
            }
            // §10.4.1.2 [[Construct]] of bound functions
            Target::Bound(target, mut bound_args) => {
                bound_args.extend_from_slice(args);
                let new_target = if new_target == f { target } else { new_target };
                self.construct(target, &bound_args, Some(new_target))
            }
            Target::Proxy => self.proxy_construct(f, args, new_target),
            Target::None => Err(self.type_error("object is not a constructor")),
        }
    }

    // §10.3.1 [[Call]] / §10.3.2 [[Construct]] of built-in function objects
    fn call_builtin(
        &mut self,
        f: ObjectId,
        behavior: NativeFn,
        realm: RealmId,
        this: &JsValue,
        args: &[JsValue],
        new_target: Option<ObjectId>,
    ) -> JsResult<JsValue> {
        let env = match self.context_stack.last() {
            Some(ctx) => ctx.lexical_env,
            None => self.realm(realm)?.global_env,
        };
        self.push_context(ExecutionContext {
            realm,
            function: Some(f),
            lexical_env: env,
            variable_env: env,
            private_env: None,
            strict: true,
            generator: None,
        })?;
        let call = NativeCall {
            callee: f,
            this,
            args,
            new_target,
        };
        let result = behavior(self, &call);
        self.pop_context()?;
        result
    }

    // §10.2.1 [[Call]](thisArgument, argumentsList)
    fn call_ecmascript_function(&mut self, f: ObjectId, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        if self.function_data(f)?.is_class_constructor {
            let name = match self.get_own_property(f, &"name".into())? {
                Some(p) => p.data_value().map(|v| format!("{v}")).unwrap_or_default(),
                None => String::new(),
            };
            return Err(self.type_error(format!("Class constructor {name} cannot be invoked without 'new'")));
        }
        self.prepare_for_ordinary_call(f, JsValue::Undefined)?;
        let result = self.ordinary_call_bind_this(f, this.clone());
        let completion = match result {
            Ok(()) => self.ordinary_call_evaluate_body(f, args),
            Err(JsError::Throw(v)) => Ok(Completion::Throw(v)),
            Err(JsError::Engine(e)) => Err(e),
        };
        self.pop_context()?;
        match completion? {
            Completion::Return(v) => Ok(v),
            Completion::Throw(v) => Err(JsError::Throw(v)),
            _ => Ok(JsValue::Undefined),
        }
    }

    // §10.2.2 [[Construct]](argumentsList, newTarget)
    fn construct_ecmascript_function(&mut self, f: ObjectId, args: &[JsValue], new_target: ObjectId) -> JsResult<ObjectId> {
        let data = self.function_data(f)?;
        let kind = data.constructor_kind;
        let default_constructor = data.default_constructor;

        if default_constructor && kind == ConstructorKind::Derived {
            return self.default_derived_construct(f, args, new_target);
        }

        let this_argument = if kind == ConstructorKind::Base {
            Some(self.ordinary_create_from_constructor(new_target, Intrinsic::ObjectPrototype, ObjectKind::Ordinary)?)
        } else {
            None
        };

        self.prepare_for_ordinary_call(f, JsValue::Object(new_target))?;
        let constructor_env = self.lexical_env()?;
        let completion = match self.construct_body(f, args, this_argument) {
            Ok(c) => c,
            Err(JsError::Throw(v)) => Completion::Throw(v),
            Err(JsError::Engine(e)) => {
                self.pop_context()?;
                return Err(e.into());
            }
        };
        self.pop_context()?;

        match completion {
            Completion::Throw(v) => return Err(JsError::Throw(v)),
            Completion::Return(JsValue::Object(o)) => return Ok(o),
            Completion::Return(v) => {
                if let Some(this) = this_argument {
                    return Ok(this);
                }
                if !v.is_undefined() {
                    return Err(self.type_error("Derived constructors may only return object or undefined"));
                }
            }
            _ => {
                if let Some(this) = this_argument {
                    return Ok(this);
                }
            }
        }
        match self.env_get_this_binding(constructor_env)? {
            JsValue::Object(o) => Ok(o),
            _ => Err(EngineError::Internal("constructor this binding is not an object").into()),
        }
    }

    fn construct_body(&mut self, f: ObjectId, args: &[JsValue], this_argument: Option<ObjectId>) -> JsResult<Completion> {
        if let Some(this) = this_argument {
            self.ordinary_call_bind_this(f, JsValue::Object(this))?;
            self.initialize_instance_elements(this, f)?;
        }
        Ok(self.ordinary_call_evaluate_body(f, args)?)
    }

    /// The behaviour of `constructor(...args) { super(...args); }` without
    /// observable iteration of `args` (§15.7.14 step 14.a).
    fn default_derived_construct(&mut self, f: ObjectId, args: &[JsValue], new_target: ObjectId) -> JsResult<ObjectId> {
        let parent = self.get_prototype_of(f)?;
        let parent = match parent {
            Some(p) if self.is_constructor(&JsValue::Object(p))? => p,
            _ => return Err(self.type_error("Super constructor is not a constructor")),
        };
        let result = self.construct(parent, args, Some(new_target))?;
        self.initialize_instance_elements(result, f)?;
        Ok(result)
    }

    // §10.2.1.1 PrepareForOrdinaryCall(F, newTarget)
    fn prepare_for_ordinary_call(&mut self, f: ObjectId, new_target: JsValue) -> JsResult<()> {
        let local_env = self.new_function_environment(f, new_target)?;
        let data = self.function_data(f)?;
        let ctx = ExecutionContext {
            realm: data.realm,
            function: Some(f),
            lexical_env: local_env,
            variable_env: local_env,
            private_env: data.private_environment.clone(),
            strict: data.strict,
            generator: None,
        };
        self.push_context(ctx)?;
        Ok(())
    }

    // §10.2.1.2 OrdinaryCallBindThis(F, calleeContext, thisArgument)
    fn ordinary_call_bind_this(&mut self, f: ObjectId, this_argument: JsValue) -> JsResult<()> {
        let data = self.function_data(f)?;
        let this_mode = data.this_mode;
        let realm = data.realm;
        if this_mode == ThisMode::Lexical {
            return Ok(());
        }
        let this_value = if this_mode == ThisMode::Strict {
            this_argument
        } else if this_argument.is_nullish() {
            let global_env = self.realm(realm)?.global_env;
            self.env_get_this_binding(global_env)?
        } else {
            JsValue::Object(self.to_object(&this_argument)?)
        };
        let local_env = self.lexical_env()?;
        self.env_bind_this_value(local_env, this_value)
    }

    // §10.2.1.4 OrdinaryCallEvaluateBody(F, argumentsList)
    pub(crate) fn ordinary_call_evaluate_body(&mut self, f: ObjectId, args: &[JsValue]) -> EngineResult<Completion> {
        let node = self.function_data(f)?.node.clone();
        js_try!(self.function_declaration_instantiation(f, args));
        if node.is_generator {
            // §15.5.2 EvaluateGeneratorBody
            let generator = js_try!(self.ordinary_create_from_constructor(
                f,
                Intrinsic::GeneratorPrototype,
                ObjectKind::Generator(Box::new(GeneratorData::new()))
            ));
            js_try!(self.generator_start(generator, &node));
            return Ok(Completion::Return(JsValue::Object(generator)));
        }
        match &node.body {
            FunctionBody::Expression(expr) => {
                let value = if node.kind == FunctionKind::ClassInitializer
                    && expr.is_anonymous_function_definition()
                    && let Some(name) = self.function_data(f)?.class_field_name.clone()
                {
                    js_try!(self.named_evaluation(expr, &name))
                } else {
                    js_try!(self.eval_expression(expr))
                };
                Ok(Completion::Return(value))
            }
            FunctionBody::Block(stmts) => {
                let completion = self.exec_statements(stmts)?;
                Ok(match completion {
                    Completion::Return(v) => Completion::Return(v),
                    Completion::Throw(v) => Completion::Throw(v),
                    _ => Completion::Return(JsValue::Undefined),
                })
            }
        }
    }

    // §10.2.11 FunctionDeclarationInstantiation(func, argumentsList)
    pub(crate) fn function_declaration_instantiation(&mut self, f: ObjectId, args: &[JsValue]) -> JsResult<()> {
        let data = self.function_data(f)?;
        let node = data.node.clone();
        let strict = data.strict;
        let this_mode = data.this_mode;
        let private_env = data.private_environment.clone();

        let formals = &node.params;
        let mut parameter_names = Vec::new();
        for p in formals {
            bound_names(p, &mut parameter_names);
        }
        let has_duplicates = has_duplicates(&parameter_names);
        let simple_parameter_list = is_simple_parameter_list(formals);
        let has_parameter_expressions = contains_expression(formals);

        let body = node.body_statements();
        let var_names = var_declared_names(body);
        let var_declarations = var_scoped_declarations(body);
        let lexical_names = lexically_declared_names(body, true);

        let mut function_names: Vec<String> = Vec::new();
        let mut functions_to_initialize: Vec<Rc<FunctionNode>> = Vec::new();
        for d in var_declarations.iter().rev() {
            if let VarScopedDeclaration::Function(func) = d {
                let name = func.name.clone().unwrap_or_default();
                if !function_names.contains(&name) {
                    function_names.insert(0, name);
                    functions_to_initialize.insert(0, (*func).clone());
                }
            }
        }

        let arguments_object_needed = if this_mode == ThisMode::Lexical
            || parameter_names.iter().any(|n| n == "arguments")
        {
            false
        } else {
            has_parameter_expressions
                || !(function_names.iter().any(|n| n == "arguments") || lexical_names.iter().any(|n| n == "arguments"))
        };

        let env = if strict || !has_parameter_expressions {
            self.lexical_env()?
        } else {
            let callee_env = self.lexical_env()?;
            let env = self.new_declarative_environment(Some(callee_env));
            self.set_lexical_env(env)?;
            env
        };

        for name in &parameter_names {
            if !self.env_has_binding(env, name)? {
                self.env_create_mutable_binding(env, name, false)?;
                if has_duplicates {
                    self.env_initialize_binding(env, name, JsValue::Undefined)?;
                }
            }
        }

        let mut parameter_bindings = parameter_names.clone();
        if arguments_object_needed {
            let ao = if strict || !simple_parameter_list {
                self.create_unmapped_arguments_object(args)?
            } else {
                self.create_mapped_arguments_object(f, &parameter_names, args, env)?
            };
            if strict {
                self.env_create_immutable_binding(env, "arguments", false)?;
            } else {
                self.env_create_mutable_binding(env, "arguments", false)?;
            }
            self.env_initialize_binding(env, "arguments", JsValue::Object(ao))?;
            parameter_bindings.push("arguments".to_string());
        }

        let binding_env = if has_duplicates { None } else { Some(env) };
        self.bind_parameters(formals, args, binding_env)?;

        let var_env = if !has_parameter_expressions {
            let mut instantiated = parameter_bindings.clone();
            for name in &var_names {
                if !instantiated.contains(name) {
                    instantiated.push(name.clone());
                    self.env_create_mutable_binding(env, name, false)?;
                    self.env_initialize_binding(env, name, JsValue::Undefined)?;
                }
            }
            env
        } else {
            let var_env = self.new_declarative_environment(Some(env));
            self.running_context_mut()?.variable_env = var_env;
            let mut instantiated: Vec<String> = Vec::new();
            for name in &var_names {
                if instantiated.contains(name) {
                    continue;
                }
                instantiated.push(name.clone());
                self.env_create_mutable_binding(var_env, name, false)?;
                let initial = if !parameter_bindings.contains(name) || function_names.contains(name) {
                    JsValue::Undefined
                } else {
                    self.env_get_binding_value(env, name, false)?
                };
                self.env_initialize_binding(var_env, name, initial)?;
            }
            var_env
        };

        let lex_env = if !strict {
            self.new_declarative_environment(Some(var_env))
        } else {
            var_env
        };
        self.set_lexical_env(lex_env)?;

        for decl in lexically_scoped_declarations(body, true) {
            let is_const = decl.is_constant();
            for name in decl.bound_names() {
                if is_const {
                    self.env_create_immutable_binding(lex_env, &name, true)?;
                } else {
                    self.env_create_mutable_binding(lex_env, &name, false)?;
                }
            }
        }

        for func in &functions_to_initialize {
            let name = func.name.clone().unwrap_or_default();
            let fo = self.instantiate_function_object(func, lex_env, private_env.clone())?;
            self.env_set_mutable_binding(var_env, &name, JsValue::Object(fo), false)?;
        }
        Ok(())
    }

    /// Parameter binding from the argument list, equivalent to
    /// IteratorBindingInitialization over CreateListIteratorRecord(argumentsList).
    fn bind_parameters(&mut self, formals: &[Pattern], args: &[JsValue], env: Option<EnvId>) -> JsResult<()> {
        for (i, param) in formals.iter().enumerate() {
            match param {
                Pattern::Rest(target) => {
                    let rest = args.get(i..).map(<[JsValue]>::to_vec).unwrap_or_default();
                    let array = self.create_array_from_list(rest)?;
                    self.binding_initialization(target, JsValue::Object(array), env)?;
                }
                Pattern::Assign(target, default) => {
                    let mut value = args.get(i).cloned().unwrap_or(JsValue::Undefined);
                    if value.is_undefined() {
                        value = match target.as_ref() {
                            Pattern::Identifier(name) if default.is_anonymous_function_definition() => {
                                self.named_evaluation(default, &PropertyKey::from(name.as_str()))?
                            }
                            _ => self.eval_expression(default)?,
                        };
                    }
                    self.binding_initialization(target, value, env)?;
                }
                other => {
                    let value = args.get(i).cloned().unwrap_or(JsValue::Undefined);
                    self.binding_initialization(other, value, env)?;
                }
            }
        }
        Ok(())
    }
}

fn has_duplicates(names: &[String]) -> bool {
    let mut seen = FxHashSet::default();
    names.iter().any(|n| !seen.insert(n.as_str()))
}

// §15.1.5 ExpectedArgumentCount
fn expected_argument_count(params: &[Pattern]) -> usize {
    params
        .iter()
        .take_while(|p| !matches!(p, Pattern::Rest(_) | Pattern::Assign(..)))
        .count()
}
