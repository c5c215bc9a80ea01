use super::*;

/// The source of values for a `for-in` or `for-of` loop.
enum LoopIteration {
    Enumerate(ObjectId),
    Iterate(IteratorRecord),
}

/// Turns an abrupt `JsResult` into the equivalent completion.
pub(crate) fn throw_completion(err: JsError) -> EngineResult<Completion> {
    match err {
        JsError::Throw(v) => Ok(Completion::Throw(v)),
        JsError::Engine(e) => Err(e),
    }
}

// §14.7.1.2 LoopContinues(completion, labelSet)
fn loop_continues(completion: &Completion, labels: &[String]) -> bool {
    match completion {
        Completion::Normal(_) => true,
        Completion::Continue(None, _) => true,
        Completion::Continue(Some(label), _) => labels.contains(label),
        _ => false,
    }
}

impl Interpreter {
    // §16.1.6 ScriptEvaluation(scriptRecord)
    pub(crate) fn script_evaluation(&mut self, realm: RealmId, script: &Script) -> EngineResult<Completion> {
        let global_env = self.realm(realm)?.global_env;
        let strict = script.strict || has_use_strict_directive(&script.body);
        let depth = self.context_stack.len();
        self.push_context(ExecutionContext {
            realm,
            function: None,
            lexical_env: global_env,
            variable_env: global_env,
            private_env: None,
            strict,
            generator: None,
        })?;
        let result = match self.global_declaration_instantiation(&script.body, global_env) {
            Ok(()) => self.exec_statements(&script.body),
            Err(e) => throw_completion(e),
        };
        // An engine error can leave callee contexts behind.
        self.context_stack.truncate(depth);
        Ok(match result? {
            Completion::Normal(None) => Completion::normal(JsValue::Undefined),
            other => other,
        })
    }

    // §16.1.7 GlobalDeclarationInstantiation(script, env)
    fn global_declaration_instantiation(&mut self, body: &[Statement], env: EnvId) -> JsResult<()> {
        let lex_names = lexically_declared_names(body, true);
        let var_names = var_declared_names(body);
        for name in &lex_names {
            if self.global_has_var_declaration(env, name)? || self.global_has_lexical_declaration(env, name)? {
                return Err(self.syntax_error(format!("Identifier '{name}' has already been declared")));
            }
            if self.global_has_restricted_property(env, name)? {
                return Err(self.syntax_error(format!("Cannot redeclare restricted global '{name}'")));
            }
        }
        for name in &var_names {
            if self.global_has_lexical_declaration(env, name)? {
                return Err(self.syntax_error(format!("Identifier '{name}' has already been declared")));
            }
        }

        let var_declarations = var_scoped_declarations(body);
        let mut functions_to_initialize: Vec<Rc<FunctionNode>> = Vec::new();
        let mut declared_function_names: Vec<String> = Vec::new();
        for d in var_declarations.iter().rev() {
            if let VarScopedDeclaration::Function(f) = d {
                let name = f.name.clone().unwrap_or_default();
                if declared_function_names.contains(&name) {
                    continue;
                }
                if !self.global_can_declare_function(env, &name)? {
                    return Err(self.type_error(format!("Cannot declare global function '{name}'")));
                }
                declared_function_names.push(name);
                functions_to_initialize.insert(0, (*f).clone());
            }
        }

        let mut declared_var_names: Vec<String> = Vec::new();
        for d in &var_declarations {
            if let VarScopedDeclaration::Variable(pattern) = d {
                let mut names = Vec::new();
                bound_names(pattern, &mut names);
                for name in names {
                    if declared_function_names.contains(&name) {
                        continue;
                    }
                    if !self.global_can_declare_var(env, &name)? {
                        return Err(self.type_error(format!("Cannot declare global variable '{name}'")));
                    }
                    if !declared_var_names.contains(&name) {
                        declared_var_names.push(name);
                    }
                }
            }
        }

        for decl in lexically_scoped_declarations(body, true) {
            let is_const = decl.is_constant();
            for name in decl.bound_names() {
                if is_const {
                    self.env_create_immutable_binding(env, &name, true)?;
                } else {
                    self.env_create_mutable_binding(env, &name, false)?;
                }
            }
        }

        for f in &functions_to_initialize {
            let name = f.name.clone().unwrap_or_default();
            let fo = self.instantiate_function_object(f, env, None)?;
            self.global_create_function_binding(env, &name, JsValue::Object(fo), false)?;
        }
        for name in &declared_var_names {
            self.global_create_var_binding(env, name, false)?;
        }
        Ok(())
    }

    // §14.2.3 BlockDeclarationInstantiation(code, env)
    pub(crate) fn block_declaration_instantiation(&mut self, decls: &[LexicalDeclaration<'_>], env: EnvId) -> JsResult<()> {
        let private_env = self.private_env()?;
        for decl in decls {
            let is_const = decl.is_constant();
            for name in decl.bound_names() {
                if is_const {
                    self.env_create_immutable_binding(env, &name, true)?;
                } else {
                    self.env_create_mutable_binding(env, &name, false)?;
                }
            }
            if let LexicalDeclaration::Function(f) = decl {
                let name = f.name.clone().unwrap_or_default();
                let fo = self.instantiate_function_object(f, env, private_env.clone())?;
                self.env_initialize_binding(env, &name, JsValue::Object(fo))?;
            }
        }
        Ok(())
    }

    // §14.2.2 Evaluation of StatementList
    pub(crate) fn exec_statements(&mut self, stmts: &[Statement]) -> EngineResult<Completion> {
        let mut last: Option<JsValue> = None;
        for stmt in stmts {
            match self.exec_statement(stmt, &[])? {
                Completion::Normal(value) => {
                    if value.is_some() {
                        last = value;
                    }
                }
                abrupt => return Ok(abrupt.update_empty(last)),
            }
        }
        Ok(Completion::Normal(last))
    }

    /// Evaluates one statement. `labels` is the current label set, non-empty
    /// only directly under labelled statements.
    pub(crate) fn exec_statement(&mut self, stmt: &Statement, labels: &[String]) -> EngineResult<Completion> {
        stacker::maybe_grow(Self::STACK_RED_ZONE, Self::STACK_GROW_SIZE, || {
            self.exec_statement_impl(stmt, labels)
        })
    }

    fn exec_statement_impl(&mut self, stmt: &Statement, labels: &[String]) -> EngineResult<Completion> {
        match stmt {
            Statement::Empty | Statement::Debugger => Ok(Completion::empty()),
            Statement::Expression(expr) => Ok(Completion::normal(js_try!(self.eval_expression(expr)))),
            Statement::Block(stmts) => self.exec_block(stmts),
            Statement::Variable(decl) => self.exec_variable_declaration(decl),
            Statement::If(s) => {
                let test = js_try!(self.eval_expression(&s.test));
                let completion = if to_boolean(&test) {
                    self.exec_statement(&s.consequent, &[])?
                } else if let Some(alt) = &s.alternate {
                    self.exec_statement(alt, &[])?
                } else {
                    Completion::empty()
                };
                Ok(completion.update_empty(Some(JsValue::Undefined)))
            }
            Statement::While(_)
            | Statement::DoWhile(_)
            | Statement::For(_)
            | Statement::ForIn(_)
            | Statement::ForOf(_)
            | Statement::Switch(_) => {
                // §14.1.1 LabelledEvaluation of BreakableStatement
                let completion = self.exec_breakable(stmt, labels)?;
                Ok(match completion {
                    Completion::Break(None, value) => Completion::Normal(Some(value.unwrap_or(JsValue::Undefined))),
                    other => other,
                })
            }
            Statement::Labeled(label, body) => {
                let mut label_set = labels.to_vec();
                label_set.push(label.clone());
                let completion = match body.as_ref() {
                    Statement::FunctionDeclaration(_) => Completion::empty(),
                    inner => self.exec_statement(inner, &label_set)?,
                };
                Ok(match completion {
                    Completion::Break(Some(target), value) if target == *label => Completion::Normal(value),
                    other => other,
                })
            }
            Statement::Return(expr) => {
                let value = match expr {
                    Some(e) => js_try!(self.eval_expression(e)),
                    None => JsValue::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Statement::Throw(expr) => {
                let value = js_try!(self.eval_expression(expr));
                Ok(Completion::Throw(value))
            }
            Statement::Break(label) => Ok(Completion::Break(label.clone(), None)),
            Statement::Continue(label) => Ok(Completion::Continue(label.clone(), None)),
            Statement::Try(s) => self.exec_try(s),
            Statement::With(object, body) => self.exec_with(object, body),
            Statement::FunctionDeclaration(_) => Ok(Completion::empty()),
            Statement::ClassDeclaration(class) => {
                // §15.7.15 BindingClassDeclarationEvaluation
                let name = class.name.clone().unwrap_or_else(|| "default".into());
                let value = js_try!(self.class_definition_evaluation(class, Some(&name), &PropertyKey::from(name.as_str())));
                let env = self.lexical_env()?;
                js_try!(self.env_initialize_binding(env, &name, JsValue::Object(value)));
                Ok(Completion::empty())
            }
        }
    }

    fn exec_breakable(&mut self, stmt: &Statement, labels: &[String]) -> EngineResult<Completion> {
        match stmt {
            Statement::While(s) => self.exec_while(s, labels),
            Statement::DoWhile(s) => self.exec_do_while(s, labels),
            Statement::For(s) => self.exec_for(s, labels),
            Statement::ForIn(s) => self.exec_for_in(s, labels),
            Statement::ForOf(s) => self.exec_for_of(s, labels),
            Statement::Switch(s) => self.exec_switch(s),
            _ => Err(EngineError::Internal("not a breakable statement")),
        }
    }

    // §14.2.2 Evaluation of Block
    pub(crate) fn exec_block(&mut self, stmts: &[Statement]) -> EngineResult<Completion> {
        let decls = lexically_scoped_declarations(stmts, false);
        if decls.is_empty() {
            return self.exec_statements(stmts);
        }
        let old_env = self.lexical_env()?;
        let block_env = self.new_declarative_environment(Some(old_env));
        js_try!(self.block_declaration_instantiation(&decls, block_env));
        self.set_lexical_env(block_env)?;
        let completion = self.exec_statements(stmts);
        self.set_lexical_env(old_env)?;
        completion
    }

    // §14.3.1.2 / §14.3.2.1 Evaluation of LexicalDeclaration and VariableStatement
    fn exec_variable_declaration(&mut self, decl: &VariableDeclaration) -> EngineResult<Completion> {
        for d in &decl.declarations {
            js_try!(self.declarator_evaluation(decl.kind, d));
        }
        Ok(Completion::empty())
    }

    fn declarator_evaluation(&mut self, kind: VarKind, d: &VariableDeclarator) -> JsResult<()> {
        match (&d.pattern, &d.init) {
            (Pattern::Identifier(name), init) => {
                let lhs = self.resolve_binding(name, None)?;
                let value = match init {
                    Some(expr) if expr.is_anonymous_function_definition() => {
                        self.named_evaluation(expr, &PropertyKey::from(name.as_str()))?
                    }
                    Some(expr) => self.eval_expression(expr)?,
                    // `var x;` leaves the binding alone.
                    None if kind == VarKind::Var => return Ok(()),
                    None => JsValue::Undefined,
                };
                if kind == VarKind::Var {
                    self.put_value(&lhs, value)
                } else {
                    self.initialize_referenced_binding(&lhs, value)
                }
            }
            (pattern, init) => {
                let value = match init {
                    Some(expr) => self.eval_expression(expr)?,
                    None => JsValue::Undefined,
                };
                let env = if kind == VarKind::Var { None } else { Some(self.lexical_env()?) };
                self.binding_initialization(pattern, value, env)
            }
        }
    }

    // ---- Iteration statements (§14.7) ----

    // §14.7.3.2 WhileLoopEvaluation
    fn exec_while(&mut self, s: &WhileStatement, labels: &[String]) -> EngineResult<Completion> {
        let mut v = JsValue::Undefined;
        loop {
            let test = js_try!(self.eval_expression(&s.test));
            if !to_boolean(&test) {
                return Ok(Completion::normal(v));
            }
            let result = self.exec_statement(&s.body, &[])?;
            if !loop_continues(&result, labels) {
                return Ok(result.update_empty(Some(v)));
            }
            if let Some(value) = result.value() {
                v = value.clone();
            }
        }
    }

    // §14.7.2.2 DoWhileLoopEvaluation
    fn exec_do_while(&mut self, s: &DoWhileStatement, labels: &[String]) -> EngineResult<Completion> {
        let mut v = JsValue::Undefined;
        loop {
            let result = self.exec_statement(&s.body, &[])?;
            if !loop_continues(&result, labels) {
                return Ok(result.update_empty(Some(v)));
            }
            if let Some(value) = result.value() {
                v = value.clone();
            }
            let test = js_try!(self.eval_expression(&s.test));
            if !to_boolean(&test) {
                return Ok(Completion::normal(v));
            }
        }
    }

    // §14.7.4.2 ForLoopEvaluation
    fn exec_for(&mut self, s: &ForStatement, labels: &[String]) -> EngineResult<Completion> {
        match &s.init {
            Some(ForInit::Variable(decl)) if decl.kind != VarKind::Var => {
                let old_env = self.lexical_env()?;
                let loop_env = self.new_declarative_environment(Some(old_env));
                let is_const = decl.kind == VarKind::Const;
                let mut bound = Vec::new();
                for d in &decl.declarations {
                    bound_names(&d.pattern, &mut bound);
                }
                for name in &bound {
                    self.declare_uninitialized(loop_env, name, !is_const)?;
                }
                self.set_lexical_env(loop_env)?;
                let init = self.exec_variable_declaration(decl)?;
                if init.is_abrupt() {
                    self.set_lexical_env(old_env)?;
                    return Ok(init);
                }
                let per_iteration = if is_const { Vec::new() } else { bound };
                let result = self.for_body_evaluation(s, &per_iteration, labels);
                self.set_lexical_env(old_env)?;
                result
            }
            Some(ForInit::Variable(decl)) => {
                let init = self.exec_variable_declaration(decl)?;
                if init.is_abrupt() {
                    return Ok(init);
                }
                self.for_body_evaluation(s, &[], labels)
            }
            Some(ForInit::Expression(expr)) => {
                js_try!(self.eval_expression(expr));
                self.for_body_evaluation(s, &[], labels)
            }
            None => self.for_body_evaluation(s, &[], labels),
        }
    }

    // §14.7.4.3 ForBodyEvaluation(test, increment, stmt, perIterationBindings, labelSet)
    fn for_body_evaluation(&mut self, s: &ForStatement, per_iteration: &[String], labels: &[String]) -> EngineResult<Completion> {
        let mut v = JsValue::Undefined;
        js_try!(self.create_per_iteration_environment(per_iteration));
        loop {
            if let Some(test) = &s.test {
                let test = js_try!(self.eval_expression(test));
                if !to_boolean(&test) {
                    return Ok(Completion::normal(v));
                }
            }
            let result = self.exec_statement(&s.body, &[])?;
            if !loop_continues(&result, labels) {
                return Ok(result.update_empty(Some(v)));
            }
            if let Some(value) = result.value() {
                v = value.clone();
            }
            js_try!(self.create_per_iteration_environment(per_iteration));
            if let Some(update) = &s.update {
                js_try!(self.eval_expression(update));
            }
        }
    }

    // §14.7.4.4 CreatePerIterationEnvironment(perIterationBindings)
    pub(crate) fn create_per_iteration_environment(&mut self, bindings: &[String]) -> JsResult<()> {
        if bindings.is_empty() {
            return Ok(());
        }
        let last = self.lexical_env()?;
        let outer = self.env_outer(last)?;
        let this_iteration = self.new_declarative_environment(outer);
        for name in bindings {
            self.env_create_mutable_binding(this_iteration, name, false)?;
            let value = self.env_get_binding_value(last, name, true)?;
            self.env_initialize_binding(this_iteration, name, value)?;
        }
        self.set_lexical_env(this_iteration)?;
        Ok(())
    }

    fn exec_for_in(&mut self, s: &ForInStatement, labels: &[String]) -> EngineResult<Completion> {
        let value = match self.for_in_of_head(&s.left, &s.right)? {
            Ok(v) => v,
            Err(c) => return Ok(c),
        };
        // §14.7.5.6 step 6: nullish objects skip the loop
        if value.is_nullish() {
            return Ok(Completion::Break(None, None));
        }
        let object = js_try!(self.to_object(&value));
        let iterator = js_try!(self.create_for_in_iterator(object));
        self.for_in_of_body(&s.left, &s.body, LoopIteration::Enumerate(iterator), labels)
    }

    fn exec_for_of(&mut self, s: &ForOfStatement, labels: &[String]) -> EngineResult<Completion> {
        let value = match self.for_in_of_head(&s.left, &s.right)? {
            Ok(v) => v,
            Err(c) => return Ok(c),
        };
        let record = js_try!(self.get_iterator(&value));
        self.for_in_of_body(&s.left, &s.body, LoopIteration::Iterate(record), labels)
    }

    // §14.7.5.6 ForIn/OfHeadEvaluation(uninitializedBoundNames, expr, iterationKind)
    fn for_in_of_head(&mut self, left: &ForInOfLeft, right: &Expression) -> EngineResult<Result<JsValue, Completion>> {
        let old_env = self.lexical_env()?;
        let mut names = Vec::new();
        if let ForInOfLeft::Variable(kind, pattern) = left
            && *kind != VarKind::Var
        {
            bound_names(pattern, &mut names);
        }
        if !names.is_empty() {
            let tdz = self.new_declarative_environment(Some(old_env));
            for name in &names {
                self.declare_uninitialized(tdz, name, true)?;
            }
            self.set_lexical_env(tdz)?;
        }
        let value = self.eval_expression(right);
        self.set_lexical_env(old_env)?;
        match value {
            Ok(v) => Ok(Ok(v)),
            Err(e) => Ok(Err(throw_completion(e)?)),
        }
    }

    // §14.7.5.7 ForIn/OfBodyEvaluation(lhs, stmt, iteratorRecord, iterationKind, lhsKind, labelSet)
    fn for_in_of_body(
        &mut self,
        left: &ForInOfLeft,
        body: &Statement,
        mut iteration: LoopIteration,
        labels: &[String],
    ) -> EngineResult<Completion> {
        let old_env = self.lexical_env()?;
        let mut v = JsValue::Undefined;
        loop {
            let next = match &mut iteration {
                LoopIteration::Enumerate(it) => self.for_in_iterator_next(*it),
                LoopIteration::Iterate(record) => self.iterator_step_value(record),
            };
            let Some(next_value) = js_try!(next) else {
                return Ok(Completion::normal(v));
            };

            if let Err(e) = self.for_in_of_bind(left, next_value, old_env) {
                self.set_lexical_env(old_env)?;
                let status = throw_completion(e)?;
                return match &iteration {
                    LoopIteration::Enumerate(_) => Ok(status),
                    LoopIteration::Iterate(record) => self.iterator_close(record, status),
                };
            }

            let result = self.exec_statement(body, &[])?;
            self.set_lexical_env(old_env)?;
            if !loop_continues(&result, labels) {
                let status = result.update_empty(Some(v));
                return match &iteration {
                    LoopIteration::Enumerate(_) => Ok(status),
                    LoopIteration::Iterate(record) => self.iterator_close(record, status),
                };
            }
            if let Some(value) = result.value() {
                v = value.clone();
            }
        }
    }

    pub(crate) fn for_in_of_bind(&mut self, left: &ForInOfLeft, value: JsValue, old_env: EnvId) -> JsResult<()> {
        match left {
            ForInOfLeft::Variable(VarKind::Var, Pattern::Identifier(name)) => {
                let lhs = self.resolve_binding(name, None)?;
                self.put_value(&lhs, value)
            }
            ForInOfLeft::Variable(VarKind::Var, pattern) => self.binding_initialization(pattern, value, None),
            ForInOfLeft::Variable(kind, pattern) => {
                // §14.7.5.4 ForDeclarationBindingInstantiation
                let iteration_env = self.new_declarative_environment(Some(old_env));
                let mut names = Vec::new();
                bound_names(pattern, &mut names);
                for name in &names {
                    if *kind == VarKind::Const {
                        self.env_create_immutable_binding(iteration_env, name, true)?;
                    } else {
                        self.env_create_mutable_binding(iteration_env, name, false)?;
                    }
                }
                self.set_lexical_env(iteration_env)?;
                self.binding_initialization(pattern, value, Some(iteration_env))
            }
            ForInOfLeft::Pattern(Pattern::Identifier(name)) => {
                let lhs = self.resolve_binding(name, None)?;
                self.put_value(&lhs, value)
            }
            ForInOfLeft::Pattern(Pattern::MemberExpression(expr)) => {
                let lhs = self.eval_reference(expr)?;
                self.put_value(&lhs, value)
            }
            ForInOfLeft::Pattern(pattern) => self.destructuring_assignment(pattern, value),
        }
    }

    // ---- Other statements ----

    // §14.12.4 Evaluation of SwitchStatement
    fn exec_switch(&mut self, s: &SwitchStatement) -> EngineResult<Completion> {
        let switch_value = js_try!(self.eval_expression(&s.discriminant));
        let old_env = self.lexical_env()?;
        let decls = case_block_declarations(&s.cases);
        let scoped = !decls.is_empty();
        if scoped {
            let block_env = self.new_declarative_environment(Some(old_env));
            js_try!(self.block_declaration_instantiation(&decls, block_env));
            self.set_lexical_env(block_env)?;
        }
        let result = self.case_block_evaluation(&s.cases, &switch_value);
        if scoped {
            self.set_lexical_env(old_env)?;
        }
        result
    }

    // §14.12.2 CaseBlockEvaluation
    fn case_block_evaluation(&mut self, cases: &[SwitchCase], switch_value: &JsValue) -> EngineResult<Completion> {
        let mut start = None;
        for (i, case) in cases.iter().enumerate() {
            let Some(test) = &case.test else {
                continue;
            };
            let value = js_try!(self.eval_expression(test));
            if is_strictly_equal(switch_value, &value) {
                start = Some(i);
                break;
            }
        }
        let start = match start.or_else(|| cases.iter().position(|c| c.test.is_none())) {
            Some(i) => i,
            None => return Ok(Completion::normal(JsValue::Undefined)),
        };
        let mut v = JsValue::Undefined;
        for case in &cases[start..] {
            let result = self.exec_statements(&case.consequent)?;
            if let Some(value) = result.value() {
                v = value.clone();
            }
            if result.is_abrupt() {
                return Ok(result.update_empty(Some(v)));
            }
        }
        Ok(Completion::normal(v))
    }

    // §14.15.3 Evaluation of TryStatement
    fn exec_try(&mut self, s: &TryStatement) -> EngineResult<Completion> {
        let block = self.exec_block(&s.block)?;
        let after_catch = match (&s.handler, block) {
            (Some(handler), Completion::Throw(thrown)) => self.catch_clause_evaluation(handler, thrown)?,
            (_, other) => other,
        };
        let result = match &s.finalizer {
            Some(finalizer) => {
                let f = self.exec_block(finalizer)?;
                if f.is_normal() { after_catch } else { f }
            }
            None => after_catch,
        };
        Ok(result.update_empty(Some(JsValue::Undefined)))
    }

    // §14.15.2 CatchClauseEvaluation
    fn catch_clause_evaluation(&mut self, handler: &CatchClause, thrown: JsValue) -> EngineResult<Completion> {
        let Some(param) = &handler.param else {
            return self.exec_block(&handler.body);
        };
        let old_env = self.lexical_env()?;
        let catch_env = self.new_declarative_environment(Some(old_env));
        let mut names = Vec::new();
        bound_names(param, &mut names);
        for name in &names {
            self.declare_uninitialized(catch_env, name, true)?;
        }
        self.set_lexical_env(catch_env)?;
        if let Err(e) = self.binding_initialization(param, thrown, Some(catch_env)) {
            self.set_lexical_env(old_env)?;
            return throw_completion(e);
        }
        let result = self.exec_block(&handler.body);
        self.set_lexical_env(old_env)?;
        result
    }

    // §14.11.2 Evaluation of WithStatement
    fn exec_with(&mut self, object: &Expression, body: &Statement) -> EngineResult<Completion> {
        let value = js_try!(self.eval_expression(object));
        let obj = js_try!(self.to_object(&value));
        let old_env = self.lexical_env()?;
        let new_env = self.new_object_environment(obj, true, Some(old_env));
        self.set_lexical_env(new_env)?;
        let result = self.exec_statement(body, &[]);
        self.set_lexical_env(old_env)?;
        Ok(result?.update_empty(Some(JsValue::Undefined)))
    }
}
