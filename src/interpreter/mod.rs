use crate::ast::*;
use crate::types::{JsBigInt, JsString, JsSymbol, JsValue, WellKnownSymbol, bigint_ops, number_ops};
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;

mod error;
pub use error::*;
pub(crate) use error::js_try;

mod types;
pub use types::*;

mod gc;
pub use gc::{GcStats, ObjectId};
pub(crate) use gc::*;

mod property;
pub use property::{Property, PropertyDescriptor, PropertyKey, PropertyValue};
pub(crate) use property::*;

mod object;
pub use object::PrivateName;
pub(crate) use object::*;

mod conversions;
pub(crate) use conversions::*;

mod environment;
pub(crate) use environment::*;

mod context;
pub(crate) use context::*;

mod realm;
pub use realm::{Intrinsic, RealmId, TypedArrayKind};
pub(crate) use realm::*;

mod reference;
pub(crate) use reference::*;

mod function;
pub use function::{NativeCall, NativeFn};
pub(crate) use function::*;

mod declarations;
pub(crate) use declarations::*;

mod array;
mod arguments;
pub(crate) use arguments::*;
mod string_object;
mod typed_array;
pub(crate) use typed_array::*;
mod proxy;
pub(crate) use proxy::*;

mod eval;
mod exec;
pub(crate) use exec::throw_completion;
mod pattern;
pub(crate) use pattern::*;
mod class;
pub(crate) use class::*;
mod iterator;
pub(crate) use iterator::*;

mod generator_analysis;
mod generator_transform;
pub(crate) use generator_transform::GeneratorProgram;
mod generator;
pub(crate) use generator::*;

mod builtins;

/// Tunables for an [`Interpreter`].
#[derive(Clone, Debug)]
pub struct EngineOptions {
    /// Execution contexts allowed on the stack before evaluation aborts
    /// with [`EngineError::StackOverflow`].
    pub max_call_depth: usize,
    /// Heap allocations between two automatic collections.
    pub gc_threshold: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_call_depth: 400,
            gc_threshold: 4096,
        }
    }
}

type TemplateKey = (RealmId, *const TemplateLiteral);

/// An ECMAScript agent: heap, realms and the execution context stack.
pub struct Interpreter {
    pub(crate) heap: Heap,
    pub(crate) realms: Vec<Realm>,
    default_realm: RealmId,
    pub(crate) context_stack: Vec<ExecutionContext>,
    pub(crate) options: EngineOptions,
    pub(crate) host_roots: Vec<JsValue>,
    /// Per-realm [[TemplateMap]]. The `Rc` keeps the site's node alive so
    /// its address cannot be reused while the entry exists.
    pub(crate) template_cache: FxHashMap<TemplateKey, (Rc<TemplateLiteral>, ObjectId)>,
    pub(crate) generator_programs: FxHashMap<*const FunctionNode, (Rc<FunctionNode>, Rc<GeneratorProgram>)>,
    symbol_registry: FxHashMap<JsString, JsSymbol>,
    well_known: Vec<JsSymbol>,
    next_symbol_id: u64,
    next_private_id: u64,
}

impl Interpreter {
    pub fn new() -> EngineResult<Self> {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> EngineResult<Self> {
        let well_known = WellKnownSymbol::ALL
            .iter()
            .enumerate()
            .map(|(i, w)| {
                JsSymbol::new(i as u64, Some(JsString::from_str(&format!("Symbol.{}", w.name()))))
            })
            .collect();
        let mut interp = Self {
            heap: Heap::new(),
            realms: Vec::new(),
            default_realm: RealmId(0),
            context_stack: Vec::new(),
            options,
            host_roots: Vec::new(),
            template_cache: FxHashMap::default(),
            generator_programs: FxHashMap::default(),
            symbol_registry: FxHashMap::default(),
            well_known,
            next_symbol_id: WellKnownSymbol::ALL.len() as u64,
            next_private_id: 0,
        };
        interp.default_realm = interp.create_realm()?;
        Ok(interp)
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// The realm of the running execution context, or the default realm
    /// when no script code is executing.
    pub fn current_realm_id(&self) -> RealmId {
        self.context_stack.last().map_or(self.default_realm, |ctx| ctx.realm)
    }

    pub fn default_realm(&self) -> RealmId {
        self.default_realm
    }

    pub(crate) fn realm(&self, id: RealmId) -> EngineResult<&Realm> {
        self.realms.get(id.0).ok_or(EngineError::Internal("unknown realm"))
    }

    pub(crate) fn current_realm(&self) -> EngineResult<&Realm> {
        self.realm(self.current_realm_id())
    }

    /// `realm.[[Intrinsics]].[[%name%]]` of the current realm.
    pub fn intrinsic(&self, which: Intrinsic) -> EngineResult<ObjectId> {
        self.realm_intrinsic(self.current_realm_id(), which)
    }

    pub fn realm_intrinsic(&self, realm: RealmId, which: Intrinsic) -> EngineResult<ObjectId> {
        self.realm(realm)?
            .intrinsics
            .get(&which)
            .copied()
            .ok_or(EngineError::Internal("intrinsic not initialized"))
    }

    /// The global object of the current realm.
    pub fn global_object(&self) -> ObjectId {
        match self.current_realm() {
            Ok(realm) => realm.global_object,
            Err(_) => self.realms[0].global_object,
        }
    }

    pub fn well_known_symbol(&self, which: WellKnownSymbol) -> JsSymbol {
        self.well_known[which as usize].clone()
    }

    pub fn new_symbol(&mut self, description: Option<JsString>) -> JsSymbol {
        let id = self.next_symbol_id;
        self.next_symbol_id += 1;
        JsSymbol::new(id, description)
    }

    /// `Symbol.for(key)`: the registry lookup shared by all realms.
    pub(crate) fn registered_symbol(&mut self, key: JsString) -> JsSymbol {
        if let Some(sym) = self.symbol_registry.get(&key) {
            return sym.clone();
        }
        let sym = self.new_symbol(Some(key.clone()));
        self.symbol_registry.insert(key, sym.clone());
        sym
    }

    /// `Symbol.keyFor(sym)`
    pub(crate) fn registered_symbol_key(&self, sym: &JsSymbol) -> Option<JsString> {
        self.symbol_registry
            .iter()
            .find(|(_, s)| *s == sym)
            .map(|(k, _)| k.clone())
    }

    pub(crate) fn next_private_id(&mut self) -> u64 {
        self.next_private_id += 1;
        self.next_private_id
    }

    /// Evaluates a script in the current realm and returns its raw completion.
    ///
    /// A `Throw` completion is an uncaught exception; `Err` is a fatal engine
    /// error that aborted evaluation.
    pub fn evaluate_script(&mut self, script: &Script) -> EngineResult<Completion> {
        let realm = self.current_realm_id();
        self.evaluate_script_in(realm, script)
    }

    pub fn evaluate_script_in(&mut self, realm: RealmId, script: &Script) -> EngineResult<Completion> {
        let span = tracing::debug_span!("script", realm = realm.0, statements = script.body.len());
        let _enter = span.enter();
        let completion = self.script_evaluation(realm, script);
        if let Err(e) = &completion {
            tracing::warn!(error = %e, "script evaluation aborted");
        }
        self.maybe_gc();
        completion
    }

    /// Evaluates a script and returns its completion value.
    pub fn run(&mut self, script: &Script) -> Result<JsValue, ScriptError> {
        match self.evaluate_script(script)? {
            Completion::Throw(value) => {
                let message = self.describe_thrown(&value);
                Err(ScriptError::Uncaught { value, message })
            }
            completion => Ok(completion.value().cloned().unwrap_or(JsValue::Undefined)),
        }
    }

    /// Host rendering of a thrown value, without running script code for
    /// ordinary Error objects.
    pub fn describe_thrown(&mut self, value: &JsValue) -> String {
        if let JsValue::Object(o) = value
            && let Ok(data) = self.heap.object(*o)
            && matches!(data.kind, ObjectKind::Error)
        {
            let name = self.get_error_field(*o, "name").unwrap_or_else(|| "Error".to_string());
            let message = self.get_error_field(*o, "message").unwrap_or_default();
            return if message.is_empty() { name } else { format!("{name}: {message}") };
        }
        match self.to_string(value) {
            Ok(s) => s.to_rust_string(),
            Err(_) => format!("{value}"),
        }
    }

    fn get_error_field(&mut self, o: ObjectId, field: &str) -> Option<String> {
        match self.get(o, &field.into()) {
            Ok(JsValue::String(s)) => Some(s.to_rust_string()),
            _ => None,
        }
    }

    /// Calls a function value from the host, outside any script.
    pub fn call_function(&mut self, f: &JsValue, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        self.call(f, this, args)
    }

    /// Reads a property of the current realm's global object.
    pub fn get_global(&mut self, name: &str) -> JsResult<JsValue> {
        let global = self.global_object();
        self.get(global, &name.into())
    }
}
