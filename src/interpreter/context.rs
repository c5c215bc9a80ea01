use super::*;

/// An execution context (§9.4).
///
/// Labels are not stored here: statement evaluation threads the current
/// label set through its calls instead.
#[derive(Clone, Debug)]
pub(crate) struct ExecutionContext {
    pub(crate) realm: RealmId,
    /// The function object whose code is running, `None` for script code.
    pub(crate) function: Option<ObjectId>,
    pub(crate) lexical_env: EnvId,
    pub(crate) variable_env: EnvId,
    pub(crate) private_env: Option<Rc<PrivateEnvironment>>,
    pub(crate) strict: bool,
    /// The generator object this context evaluates, if any.
    pub(crate) generator: Option<ObjectId>,
}

impl Trace for ExecutionContext {
    fn trace(&self, tracer: &mut Tracer) {
        if let Some(f) = self.function {
            tracer.object(f);
        }
        if let Some(g) = self.generator {
            tracer.object(g);
        }
        tracer.env(self.lexical_env);
        tracer.env(self.variable_env);
    }
}

// §9.2 PrivateEnvironment Records
#[derive(Debug)]
pub(crate) struct PrivateEnvironment {
    pub(crate) outer: Option<Rc<PrivateEnvironment>>,
    pub(crate) names: Vec<PrivateName>,
}

impl PrivateEnvironment {
    // §9.2.1.2 ResolvePrivateIdentifier(privEnv, identifier)
    pub(crate) fn resolve(&self, identifier: &str) -> Option<PrivateName> {
        let wanted = format!("#{identifier}");
        if let Some(name) = self.names.iter().find(|n| n.description == *wanted.as_str()) {
            return Some(name.clone());
        }
        self.outer.as_ref().and_then(|outer| outer.resolve(identifier))
    }
}

impl Interpreter {
    pub(crate) fn running_context(&self) -> EngineResult<&ExecutionContext> {
        self.context_stack
            .last()
            .ok_or(EngineError::Internal("no running execution context"))
    }

    pub(crate) fn running_context_mut(&mut self) -> EngineResult<&mut ExecutionContext> {
        self.context_stack
            .last_mut()
            .ok_or(EngineError::Internal("no running execution context"))
    }

    pub(crate) fn push_context(&mut self, ctx: ExecutionContext) -> EngineResult<()> {
        if self.context_stack.len() >= self.options.max_call_depth {
            return Err(EngineError::StackOverflow);
        }
        self.context_stack.push(ctx);
        Ok(())
    }

    pub(crate) fn pop_context(&mut self) -> EngineResult<ExecutionContext> {
        self.context_stack
            .pop()
            .ok_or(EngineError::Internal("execution context stack underflow"))
    }

    pub(crate) fn lexical_env(&self) -> EngineResult<EnvId> {
        Ok(self.running_context()?.lexical_env)
    }

    pub(crate) fn set_lexical_env(&mut self, env: EnvId) -> EngineResult<()> {
        self.running_context_mut()?.lexical_env = env;
        Ok(())
    }

    pub(crate) fn variable_env(&self) -> EngineResult<EnvId> {
        Ok(self.running_context()?.variable_env)
    }

    pub(crate) fn private_env(&self) -> EngineResult<Option<Rc<PrivateEnvironment>>> {
        Ok(self.running_context()?.private_env.clone())
    }

    pub(crate) fn set_private_env(&mut self, env: Option<Rc<PrivateEnvironment>>) -> EngineResult<()> {
        self.running_context_mut()?.private_env = env;
        Ok(())
    }

    /// Whether the running code is strict mode code.
    pub(crate) fn is_strict(&self) -> bool {
        self.context_stack.last().is_some_and(|ctx| ctx.strict)
    }

    // §9.4.1 GetActiveScriptOrModule has no counterpart; this is the
    // active function object of the running context.
    pub(crate) fn active_function(&self) -> Option<ObjectId> {
        self.context_stack.last().and_then(|ctx| ctx.function)
    }

    // §6.2.12 private names are created fresh per class evaluation
    pub(crate) fn new_private_name(&mut self, description: &str) -> PrivateName {
        PrivateName {
            id: self.next_private_id(),
            description: JsString::from_str(&format!("#{description}")),
        }
    }

    // §9.2.1.1 NewPrivateEnvironment(outerPrivEnv)
    pub(crate) fn new_private_environment(
        &self,
        outer: Option<Rc<PrivateEnvironment>>,
        names: Vec<PrivateName>,
    ) -> Rc<PrivateEnvironment> {
        Rc::new(PrivateEnvironment { outer, names })
    }
}
