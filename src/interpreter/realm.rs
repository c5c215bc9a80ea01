use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RealmId(pub(crate) usize);

/// The element types of the typed array constructors (§23.2, Table 71).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypedArrayKind {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
    BigInt64,
    BigUint64,
}

impl TypedArrayKind {
    pub const ALL: [TypedArrayKind; 11] = [
        TypedArrayKind::Int8,
        TypedArrayKind::Uint8,
        TypedArrayKind::Uint8Clamped,
        TypedArrayKind::Int16,
        TypedArrayKind::Uint16,
        TypedArrayKind::Int32,
        TypedArrayKind::Uint32,
        TypedArrayKind::Float32,
        TypedArrayKind::Float64,
        TypedArrayKind::BigInt64,
        TypedArrayKind::BigUint64,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TypedArrayKind::Int8 => "Int8Array",
            TypedArrayKind::Uint8 => "Uint8Array",
            TypedArrayKind::Uint8Clamped => "Uint8ClampedArray",
            TypedArrayKind::Int16 => "Int16Array",
            TypedArrayKind::Uint16 => "Uint16Array",
            TypedArrayKind::Int32 => "Int32Array",
            TypedArrayKind::Uint32 => "Uint32Array",
            TypedArrayKind::Float32 => "Float32Array",
            TypedArrayKind::Float64 => "Float64Array",
            TypedArrayKind::BigInt64 => "BigInt64Array",
            TypedArrayKind::BigUint64 => "BigUint64Array",
        }
    }

    pub fn element_size(self) -> usize {
        match self {
            TypedArrayKind::Int8 | TypedArrayKind::Uint8 | TypedArrayKind::Uint8Clamped => 1,
            TypedArrayKind::Int16 | TypedArrayKind::Uint16 => 2,
            TypedArrayKind::Int32 | TypedArrayKind::Uint32 | TypedArrayKind::Float32 => 4,
            TypedArrayKind::Float64 | TypedArrayKind::BigInt64 | TypedArrayKind::BigUint64 => 8,
        }
    }

    pub fn is_bigint(self) -> bool {
        matches!(self, TypedArrayKind::BigInt64 | TypedArrayKind::BigUint64)
    }
}

/// Keys of a realm's intrinsic table (§6.1.7.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    Object,
    ObjectPrototype,
    Function,
    FunctionPrototype,
    Array,
    ArrayPrototype,
    ArrayPrototypeValues,
    ArrayIteratorPrototype,
    StringIteratorPrototype,
    IteratorPrototype,
    ForInIteratorPrototype,
    GeneratorFunction,
    /// %GeneratorFunction.prototype%
    GeneratorFunctionPrototype,
    /// %GeneratorFunction.prototype.prototype%
    GeneratorPrototype,
    ThrowTypeError,
    NativeError(ErrorKind),
    NativeErrorPrototype(ErrorKind),
    Boolean,
    BooleanPrototype,
    Number,
    NumberPrototype,
    String,
    StringPrototype,
    Symbol,
    SymbolPrototype,
    BigInt,
    BigIntPrototype,
    Proxy,
    Reflect,
    ArrayBuffer,
    ArrayBufferPrototype,
    TypedArray,
    TypedArrayPrototype,
    TypedArrayConstructor(TypedArrayKind),
    TypedArrayConstructorPrototype(TypedArrayKind),
}

// §9.3 Realms
pub(crate) struct Realm {
    pub(crate) id: RealmId,
    pub(crate) intrinsics: FxHashMap<Intrinsic, ObjectId>,
    pub(crate) global_object: ObjectId,
    pub(crate) global_env: EnvId,
}

impl Trace for Realm {
    fn trace(&self, tracer: &mut Tracer) {
        for id in self.intrinsics.values() {
            tracer.object(*id);
        }
        tracer.object(self.global_object);
        tracer.env(self.global_env);
    }
}

impl Interpreter {
    // §9.3.1 InitializeHostDefinedRealm, folded together with CreateRealm,
    // CreateIntrinsics, SetRealmGlobalObject and SetDefaultGlobalBindings.
    pub fn create_realm(&mut self) -> EngineResult<RealmId> {
        let id = RealmId(self.realms.len());

        let mut object_proto = ObjectData::new(None, ObjectKind::Ordinary);
        object_proto.immutable_prototype = true;
        let object_proto = self.alloc_object(object_proto);
        let function_proto = self.alloc_object(ObjectData::new(
            Some(object_proto),
            ObjectKind::Builtin(Box::new(BuiltinData {
                behavior: builtins::function_prototype_call,
                slots: Vec::new(),
                realm: id,
                is_constructor: false,
                initial_name: Some(JsString::empty()),
            })),
        ));

        let global_object = self.ordinary_object_create(Some(object_proto));
        let global_env = self.new_global_environment(global_object, global_object);

        let mut intrinsics = FxHashMap::default();
        intrinsics.insert(Intrinsic::ObjectPrototype, object_proto);
        intrinsics.insert(Intrinsic::FunctionPrototype, function_proto);
        self.realms.push(Realm {
            id,
            intrinsics,
            global_object,
            global_env,
        });

        // Builtins are created with the new realm as their [[Realm]], so it
        // must be the current realm while they are wired up.
        let ctx = ExecutionContext {
            realm: id,
            function: None,
            lexical_env: global_env,
            variable_env: global_env,
            private_env: None,
            strict: false,
            generator: None,
        };
        self.push_context(ctx)?;
        let result = builtins::initialize_realm(self, id);
        self.pop_context()?;
        match result {
            Ok(()) => {}
            Err(JsError::Engine(e)) => return Err(e),
            Err(JsError::Throw(_)) => return Err(EngineError::Internal("exception during realm setup")),
        }
        tracing::debug!(realm = id.0, intrinsics = self.realms[id.0].intrinsics.len(), "realm created");
        Ok(id)
    }

    pub(crate) fn set_intrinsic(&mut self, realm: RealmId, which: Intrinsic, object: ObjectId) -> EngineResult<()> {
        self.realms
            .get_mut(realm.0)
            .ok_or(EngineError::Internal("unknown realm"))?
            .intrinsics
            .insert(which, object);
        Ok(())
    }

    pub fn realm_global_object(&self, realm: RealmId) -> EngineResult<ObjectId> {
        Ok(self.realm(realm)?.global_object)
    }

    pub(crate) fn global_env(&self) -> EngineResult<EnvId> {
        Ok(self.current_realm()?.global_env)
    }
}
