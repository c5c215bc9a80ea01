//! Binding initialization and destructuring assignment (§8.6.2, §13.15.5).
//!
//! Both walk the same pattern shapes; they differ only in how a leaf
//! target receives its value.

use super::*;

#[derive(Clone, Copy)]
enum BindMode {
    /// BindingInitialization. `None` assigns through ResolveBinding, as
    /// `var` declarations and sloppy duplicate parameters do.
    Initialize(Option<EnvId>),
    /// DestructuringAssignmentEvaluation.
    Assign,
}

/// A leaf target, resolved before its value is fetched.
enum Leaf {
    Binding(EnvId, String),
    Reference(Reference),
}

fn is_leaf(pattern: &Pattern) -> bool {
    matches!(pattern, Pattern::Identifier(_) | Pattern::MemberExpression(_))
}

impl Interpreter {
    // §8.6.2 BindingInitialization
    pub(crate) fn binding_initialization(&mut self, pattern: &Pattern, value: JsValue, env: Option<EnvId>) -> JsResult<()> {
        self.bind_pattern(pattern, value, BindMode::Initialize(env))
    }

    // §13.15.5.2 DestructuringAssignmentEvaluation
    pub(crate) fn destructuring_assignment(&mut self, pattern: &Pattern, value: JsValue) -> JsResult<()> {
        self.bind_pattern(pattern, value, BindMode::Assign)
    }

    fn bind_pattern(&mut self, pattern: &Pattern, value: JsValue, mode: BindMode) -> JsResult<()> {
        match pattern {
            Pattern::Identifier(_) | Pattern::MemberExpression(_) => {
                let leaf = self.leaf_target(pattern, mode)?;
                self.store_leaf(leaf, value)
            }
            Pattern::Object(props) => {
                if value.is_nullish() {
                    return Err(self.type_error(format!("Cannot destructure '{value}' as it is {value}.")));
                }
                self.bind_object_pattern(props, &value, mode)
            }
            Pattern::Array(elements) => {
                let mut record = self.get_iterator(&value)?;
                let result = self.bind_array_pattern(elements, &mut record, mode);
                if record.done {
                    return result;
                }
                self.iterator_close_result(&record, result)
            }
            Pattern::Assign(..) => self.bind_element(pattern, mode, &mut |_| Ok(value.clone())),
            Pattern::Rest(_) => Err(EngineError::Internal("rest pattern outside a list").into()),
        }
    }

    fn leaf_target(&mut self, pattern: &Pattern, mode: BindMode) -> JsResult<Leaf> {
        match (pattern, mode) {
            (Pattern::Identifier(name), BindMode::Initialize(Some(env))) => Ok(Leaf::Binding(env, name.clone())),
            (Pattern::Identifier(name), _) => Ok(Leaf::Reference(self.resolve_binding(name, None)?)),
            (Pattern::MemberExpression(expr), BindMode::Assign) => Ok(Leaf::Reference(self.eval_reference(expr)?)),
            _ => Err(EngineError::Internal("member target in a binding pattern").into()),
        }
    }

    fn store_leaf(&mut self, leaf: Leaf, value: JsValue) -> JsResult<()> {
        match leaf {
            Leaf::Binding(env, name) => self.env_initialize_binding(env, &name, value),
            Leaf::Reference(reference) => self.put_value(&reference, value),
        }
    }

    /// One element of an array or object pattern, with its optional
    /// initializer. Leaf targets are evaluated before `fetch` runs.
    fn bind_element(
        &mut self,
        element: &Pattern,
        mode: BindMode,
        fetch: &mut dyn FnMut(&mut Self) -> JsResult<JsValue>,
    ) -> JsResult<()> {
        let (target, default) = match element {
            Pattern::Assign(target, default) => (target.as_ref(), Some(default.as_ref())),
            other => (other, None),
        };
        let leaf = if is_leaf(target) { Some(self.leaf_target(target, mode)?) } else { None };
        let mut value = fetch(self)?;
        if let Some(default) = default
            && value.is_undefined()
        {
            value = match target {
                Pattern::Identifier(name) if default.is_anonymous_function_definition() => {
                    self.named_evaluation(default, &PropertyKey::from(name.as_str()))?
                }
                _ => self.eval_expression(default)?,
            };
        }
        match leaf {
            Some(leaf) => self.store_leaf(leaf, value),
            None => self.bind_pattern(target, value, mode),
        }
    }

    // §8.6.3 IteratorBindingInitialization / §13.15.5.5 IteratorDestructuringAssignmentEvaluation
    fn bind_array_pattern(
        &mut self,
        elements: &[Option<ArrayPatternElement>],
        record: &mut IteratorRecord,
        mode: BindMode,
    ) -> JsResult<()> {
        for element in elements {
            match element {
                None => {
                    if !record.done {
                        self.iterator_step_value(record)?;
                    }
                }
                Some(ArrayPatternElement::Pattern(p)) => {
                    self.bind_element(p, mode, &mut |this| {
                        if record.done {
                            return Ok(JsValue::Undefined);
                        }
                        Ok(this.iterator_step_value(record)?.unwrap_or(JsValue::Undefined))
                    })?;
                }
                Some(ArrayPatternElement::Rest(p)) => {
                    let leaf = if is_leaf(p) { Some(self.leaf_target(p, mode)?) } else { None };
                    let mut values = Vec::new();
                    while !record.done {
                        if let Some(value) = self.iterator_step_value(record)? {
                            values.push(value);
                        }
                    }
                    let array = JsValue::Object(self.create_array_from_list(values)?);
                    match leaf {
                        Some(leaf) => self.store_leaf(leaf, array)?,
                        None => self.bind_pattern(p, array, mode)?,
                    }
                }
            }
        }
        Ok(())
    }

    // §14.3.3.1 PropertyBindingInitialization / §13.15.5.3 PropertyDestructuringAssignmentEvaluation
    fn bind_object_pattern(&mut self, props: &[ObjectPatternProperty], value: &JsValue, mode: BindMode) -> JsResult<()> {
        let mut excluded: Vec<PropertyKey> = Vec::new();
        for prop in props {
            match prop {
                ObjectPatternProperty::Shorthand(name) => {
                    let key = PropertyKey::from(name.as_str());
                    let target = Pattern::Identifier(name.clone());
                    self.bind_element(&target, mode, &mut |this| this.get_v(value, &key))?;
                    excluded.push(key);
                }
                ObjectPatternProperty::KeyValue(name, target) => {
                    let key = self.eval_property_key(name)?;
                    self.bind_element(target, mode, &mut |this| this.get_v(value, &key))?;
                    excluded.push(key);
                }
                // §14.3.3.2 RestBindingInitialization
                ObjectPatternProperty::Rest(target) => {
                    let leaf = if is_leaf(target) { Some(self.leaf_target(target, mode)?) } else { None };
                    let rest = self.new_plain_object()?;
                    self.copy_data_properties(rest, value, &excluded)?;
                    match leaf {
                        Some(leaf) => self.store_leaf(leaf, JsValue::Object(rest))?,
                        None => self.bind_pattern(target, JsValue::Object(rest), mode)?,
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;

    fn run(body: Vec<Statement>) -> JsValue {
        let mut interp = Interpreter::new().unwrap();
        interp.run(&script(body)).unwrap()
    }

    #[test]
    fn array_pattern_with_defaults_holes_and_rest() {
        // let [a, , b = 10, ...r] = [1, 2, undefined, 4, 5]; a + b + r.length
        let v = run(vec![
            decl(
                VarKind::Let,
                array_pat(vec![
                    Some(pat("a")),
                    None,
                    Some(pat_default(pat("b"), num(10.0))),
                    Some(rest(pat("r"))),
                ]),
                Some(array(vec![num(1.0), num(2.0), undefined(), num(4.0), num(5.0)])),
            ),
            expr_stmt(binary(
                BinaryOp::Add,
                binary(BinaryOp::Add, ident("a"), ident("b")),
                member(ident("r"), "length"),
            )),
        ]);
        assert_eq!(v.as_number(), Some(13.0));
    }

    #[test]
    fn object_rest_excludes_named_keys() {
        // const { x, ...others } = { x: 1, y: 2, z: 3 }; Object.keys(others).length * 10 + x
        let v = run(vec![
            decl(
                VarKind::Const,
                object_pat(vec![("x", pat("x")), ("", rest(pat("others")))]),
                Some(object(vec![prop("x", num(1.0)), prop("y", num(2.0)), prop("z", num(3.0))])),
            ),
            expr_stmt(binary(
                BinaryOp::Add,
                binary(
                    BinaryOp::Mul,
                    member(call(member(ident("Object"), "keys"), vec![ident("others")]), "length"),
                    num(10.0),
                ),
                ident("x"),
            )),
        ]);
        assert_eq!(v.as_number(), Some(21.0));
    }

    #[test]
    fn destructuring_null_throws_type_error() {
        let mut interp = Interpreter::new().unwrap();
        let s = script(vec![decl(VarKind::Let, object_pat(vec![("a", pat("a"))]), Some(null()))]);
        let err = interp.run(&s).unwrap_err();
        assert!(err.to_string().contains("TypeError"));
    }

    #[test]
    fn assignment_pattern_targets_members() {
        // var o = {}; [o.a, o.b] = [1, 2]; o.a + o.b
        let v = run(vec![
            var("o", object(vec![])),
            expr_stmt(assign_pattern(
                array_pat(vec![
                    Some(target(member(ident("o"), "a"))),
                    Some(target(member(ident("o"), "b"))),
                ]),
                array(vec![num(1.0), num(2.0)]),
            )),
            expr_stmt(binary(BinaryOp::Add, member(ident("o"), "a"), member(ident("o"), "b"))),
        ]);
        assert_eq!(v.as_number(), Some(3.0));
    }

    #[test]
    fn defaults_name_anonymous_functions() {
        let v = run(vec![
            decl(VarKind::Let, array_pat(vec![Some(pat_default(pat("f"), arrow(&[], num(0.0))))]), Some(array(vec![]))),
            expr_stmt(member(ident("f"), "name")),
        ]);
        assert_eq!(v.as_string().map(|s| s.to_rust_string()), Some("f".into()));
    }

    #[test]
    fn array_pattern_closes_unfinished_iterators() {
        // var closed = false;
        // var it = { [Symbol.iterator]() { return this }, next() { return { value: 1, done: false } },
        //            return() { closed = true; return {} } };
        // var [a] = it; closed
        let iterable = object(vec![
            PropertyDefinition::Method(
                PropertyName::Computed(Box::new(member(ident("Symbol"), "iterator"))),
                Rc::new(FunctionNode {
                    name: None,
                    params: vec![],
                    body: FunctionBody::Block(vec![ret(this())]),
                    kind: FunctionKind::Method,
                    is_generator: false,
                    source_text: None,
                }),
                MethodKind::Method,
            ),
            method_prop("next", &[], vec![ret(object(vec![prop("value", num(1.0)), prop("done", boolean(false))]))]),
            method_prop("return", &[], vec![expr_stmt(assign(ident("closed"), boolean(true))), ret(object(vec![]))]),
        ]);
        let v = run(vec![
            var("closed", boolean(false)),
            var("it", iterable),
            decl(VarKind::Var, array_pat(vec![Some(pat("a"))]), Some(ident("it"))),
            expr_stmt(ident("closed")),
        ]);
        assert_eq!(v.as_boolean(), Some(true));
    }
}
