//! Expression evaluation (§13).

use super::*;
use num_bigint::BigInt;

/// A link of an optional chain that did not short-circuit.
enum ChainPart {
    Ref(Reference),
    Value(JsValue),
}

impl Interpreter {
    pub(crate) const STACK_RED_ZONE: usize = 64 * 1024;
    pub(crate) const STACK_GROW_SIZE: usize = 2 * 1024 * 1024;

    /// Evaluates `expr`, first growing the native stack onto the heap when
    /// less than [`Self::STACK_RED_ZONE`] remains.
    pub(crate) fn eval_expression(&mut self, expr: &Expression) -> JsResult<JsValue> {
        stacker::maybe_grow(Self::STACK_RED_ZONE, Self::STACK_GROW_SIZE, || self.eval_expression_impl(expr))
    }

    fn eval_expression_impl(&mut self, expr: &Expression) -> JsResult<JsValue> {
        match expr {
            Expression::Literal(lit) => self.eval_literal(lit),
            Expression::Identifier(_) | Expression::Member(..) | Expression::SuperMember(_) => {
                let reference = self.eval_reference(expr)?;
                self.get_value(&reference)
            }
            Expression::This => self.resolve_this_binding(),
            Expression::Array(elements) => self.eval_array_literal(elements),
            Expression::Object(props) => self.eval_object_literal(props),
            Expression::Function(node) | Expression::ArrowFunction(node) => {
                Ok(JsValue::Object(self.instantiate_function_expression(node, None)?))
            }
            Expression::Class(class) => {
                let binding = class.name.as_deref().filter(|n| !n.is_empty());
                let name = PropertyKey::from(binding.unwrap_or(""));
                Ok(JsValue::Object(self.class_definition_evaluation(class, binding, &name)?))
            }
            Expression::Unary(op, operand) => self.eval_unary(*op, operand),
            Expression::Binary(op, left, right) => {
                let lval = self.eval_expression(left)?;
                let rval = self.eval_expression(right)?;
                self.apply_binary_operator(*op, &lval, &rval)
            }
            Expression::Logical(op, left, right) => {
                let lval = self.eval_expression(left)?;
                let short_circuits = match op {
                    LogicalOp::And => !to_boolean(&lval),
                    LogicalOp::Or => to_boolean(&lval),
                    LogicalOp::NullishCoalescing => !lval.is_nullish(),
                };
                if short_circuits { Ok(lval) } else { self.eval_expression(right) }
            }
            Expression::Update(op, prefix, operand) => self.eval_update(*op, *prefix, operand),
            Expression::Assign(op, target, value) => self.eval_assignment(*op, target, value),
            Expression::Conditional(test, consequent, alternate) => {
                let test = self.eval_expression(test)?;
                if to_boolean(&test) {
                    self.eval_expression(consequent)
                } else {
                    self.eval_expression(alternate)
                }
            }
            Expression::Call(callee, args) => {
                let (func, this) = self.eval_callee(callee)?;
                let args = self.argument_list_evaluation(args)?;
                self.call_callee(&func, &this, &args, callee)
            }
            Expression::New(callee, args) => self.eval_new(callee, args),
            Expression::SuperCall(args) => self.eval_super_call(args),
            Expression::OptionalChain(chain) => match self.eval_chain(chain)? {
                None => Ok(JsValue::Undefined),
                Some(ChainPart::Ref(reference)) => self.get_value(&reference),
                Some(ChainPart::Value(value)) => Ok(value),
            },
            Expression::OptionalMember(..) | Expression::OptionalCall(..) => {
                Err(EngineError::Internal("optional chain link outside of a chain").into())
            }
            Expression::Spread(_) => Err(EngineError::Internal("spread element outside of a list").into()),
            // Generator bodies are lowered before they run, so a yield that
            // reaches the tree walker sits somewhere the lowering cannot see.
            Expression::Yield(..) => Err(EngineError::Unsupported("yield outside a lowered generator body").into()),
            Expression::Template(template) => self.eval_template(template),
            Expression::TaggedTemplate(tag, template) => self.eval_tagged_template(tag, template),
            Expression::Typeof(operand) => self.eval_typeof(operand),
            Expression::Void(operand) => {
                self.eval_expression(operand)?;
                Ok(JsValue::Undefined)
            }
            Expression::Delete(operand) => self.eval_delete(operand),
            Expression::Sequence(exprs) => {
                let mut value = JsValue::Undefined;
                for e in exprs {
                    value = self.eval_expression(e)?;
                }
                Ok(value)
            }
            Expression::NewTarget => Ok(self.get_new_target()?),
            Expression::PrivateIn(name, object) => {
                let value = self.eval_expression(object)?;
                let JsValue::Object(o) = value else {
                    return Err(self.type_error(format!("Cannot use 'in' operator to search for '#{name}' in {value}")));
                };
                let private_name = self.resolve_private_identifier(name)?;
                Ok(JsValue::Boolean(self.private_element_find(o, &private_name)?.is_some()))
            }
        }
    }

    /// Evaluates an expression that denotes a Reference: identifiers and
    /// property accesses.
    pub(crate) fn eval_reference(&mut self, expr: &Expression) -> JsResult<Reference> {
        match expr {
            Expression::Identifier(name) => self.resolve_binding(name, None),
            Expression::Member(object, property) => {
                let base = self.eval_expression(object)?;
                self.member_reference(base, property)
            }
            Expression::SuperMember(property) => self.super_reference(property),
            _ => Err(EngineError::Internal("expression is not a reference").into()),
        }
    }

    // §8.4.5 NamedEvaluation
    pub(crate) fn named_evaluation(&mut self, expr: &Expression, name: &PropertyKey) -> JsResult<JsValue> {
        match expr {
            Expression::Function(node) | Expression::ArrowFunction(node) => {
                Ok(JsValue::Object(self.instantiate_function_expression(node, Some(name))?))
            }
            Expression::Class(class) if class.name.as_ref().is_none_or(|n| n.is_empty()) => {
                Ok(JsValue::Object(self.class_definition_evaluation(class, None, name)?))
            }
            other => self.eval_expression(other),
        }
    }

    fn eval_literal(&mut self, lit: &Literal) -> JsResult<JsValue> {
        Ok(match lit {
            Literal::Null => JsValue::Null,
            Literal::Boolean(b) => JsValue::Boolean(*b),
            Literal::Number(n) => JsValue::Number(*n),
            Literal::String(s) => JsValue::String(JsString::from_str(s)),
            Literal::BigInt(digits) => match parse_bigint_literal(digits) {
                Some(value) => JsValue::BigInt(JsBigInt::new(value)),
                None => return Err(EngineError::Internal("malformed BigInt literal").into()),
            },
        })
    }

    // ---- Property access (§13.3.2 - §13.3.7) ----

    // §13.3.3 EvaluatePropertyAccessWithExpressionKey / IdentifierKey
    fn member_reference(&mut self, base: JsValue, property: &MemberProperty) -> JsResult<Reference> {
        let strict = self.is_strict();
        match property {
            MemberProperty::Dot(name) => Ok(Reference::property(base, name.as_str().into(), strict)),
            MemberProperty::Computed(key) => {
                let key = self.eval_expression(key)?;
                if base.is_nullish() {
                    return Err(self.type_error(format!(
                        "Cannot read properties of {base} (reading '{}')",
                        self.describe_key_value(&key)
                    )));
                }
                let key = self.to_property_key(&key)?;
                Ok(Reference::property(base, key, strict))
            }
            // §13.3.9 MakePrivateReference(baseValue, privateIdentifier)
            MemberProperty::Private(name) => {
                let private_name = self.resolve_private_identifier(name)?;
                Ok(Reference::private(base, private_name))
            }
        }
    }

    fn describe_key_value(&self, key: &JsValue) -> String {
        match key {
            JsValue::Symbol(s) => s.descriptive_string(),
            JsValue::Object(_) => "[object]".to_string(),
            other => other.to_string(),
        }
    }

    // §13.3.7 super.x and super[x], through MakeSuperPropertyReference
    fn super_reference(&mut self, property: &MemberProperty) -> JsResult<Reference> {
        let env = self.get_this_environment()?;
        let actual_this = self.env_get_this_binding(env)?;
        let key = match property {
            MemberProperty::Dot(name) => PropertyKey::from(name.as_str()),
            MemberProperty::Computed(expr) => {
                let value = self.eval_expression(expr)?;
                self.to_property_key(&value)?
            }
            MemberProperty::Private(_) => return Err(EngineError::Internal("private name on super").into()),
        };
        let base = self.env_get_super_base(env)?;
        Ok(Reference {
            base: ReferenceBase::Value(base),
            name: ReferenceName::Key(key),
            strict: true,
            this_value: Some(actual_this),
        })
    }

    // §9.2.1.2 ResolvePrivateIdentifier against the running context
    pub(crate) fn resolve_private_identifier(&self, name: &str) -> EngineResult<PrivateName> {
        self.private_env()?
            .and_then(|env| env.resolve(name))
            .ok_or(EngineError::Internal("unresolved private name"))
    }

    // ---- Calls (§13.3.6) ----

    /// Function value and `this` for a call expression's callee.
    fn eval_callee(&mut self, callee: &Expression) -> JsResult<(JsValue, JsValue)> {
        match callee {
            Expression::Identifier(_) | Expression::Member(..) | Expression::SuperMember(_) => {
                let reference = self.eval_reference(callee)?;
                let func = self.get_value(&reference)?;
                let this = self.reference_this_for_call(&reference)?;
                Ok((func, this))
            }
            other => Ok((self.eval_expression(other)?, JsValue::Undefined)),
        }
    }

    // §13.3.6.2 EvaluateCall, steps 1-2
    fn reference_this_for_call(&self, reference: &Reference) -> EngineResult<JsValue> {
        Ok(match &reference.base {
            ReferenceBase::Value(_) => reference.this_value(),
            ReferenceBase::Environment(env) => match self.env_with_base_object(*env)? {
                Some(object) => JsValue::Object(object),
                None => JsValue::Undefined,
            },
            ReferenceBase::Unresolvable => JsValue::Undefined,
        })
    }

    fn call_callee(&mut self, func: &JsValue, this: &JsValue, args: &[JsValue], callee: &Expression) -> JsResult<JsValue> {
        if !self.is_callable(func)? {
            return Err(self.type_error(format!("{} is not a function", describe_callee(callee))));
        }
        self.call(func, this, args)
    }

    // §13.3.8.1 ArgumentListEvaluation
    pub(crate) fn argument_list_evaluation(&mut self, args: &[Expression]) -> JsResult<Vec<JsValue>> {
        let mut list = Vec::with_capacity(args.len());
        for arg in args {
            if let Expression::Spread(inner) = arg {
                let spread = self.eval_expression(inner)?;
                let mut record = self.get_iterator(&spread)?;
                while let Some(value) = self.iterator_step_value(&mut record)? {
                    list.push(value);
                }
            } else {
                list.push(self.eval_expression(arg)?);
            }
        }
        Ok(list)
    }

    // §13.3.5.1.1 EvaluateNew(constructExpr, arguments)
    fn eval_new(&mut self, callee: &Expression, args: &[Expression]) -> JsResult<JsValue> {
        let constructor = self.eval_expression(callee)?;
        let args = self.argument_list_evaluation(args)?;
        match &constructor {
            JsValue::Object(c) if self.is_constructor(&constructor)? => Ok(JsValue::Object(self.construct(*c, &args, None)?)),
            _ => Err(self.type_error(format!("{} is not a constructor", describe_callee(callee)))),
        }
    }

    // §13.3.7.1 SuperCall : super Arguments
    fn eval_super_call(&mut self, args: &[Expression]) -> JsResult<JsValue> {
        let new_target = self.get_new_target()?;
        let this_env = self.get_this_environment()?;
        let active = self
            .env_function_object(this_env)?
            .ok_or(EngineError::Internal("super call outside a function"))?;
        let func = self.get_prototype_of(active)?;
        let args = self.argument_list_evaluation(args)?;
        let func = match func {
            Some(f) if self.is_constructor(&JsValue::Object(f))? => f,
            _ => return Err(self.type_error("Super constructor is not a constructor")),
        };
        let JsValue::Object(new_target) = new_target else {
            return Err(EngineError::Internal("super call without new.target").into());
        };
        let result = self.construct(func, &args, Some(new_target))?;
        self.env_bind_this_value(this_env, JsValue::Object(result))?;
        self.initialize_instance_elements(result, active)?;
        Ok(JsValue::Object(result))
    }

    // ---- Optional chains (§13.3.9) ----

    /// `None` once a `?.` link meets a nullish base.
    fn eval_chain(&mut self, expr: &Expression) -> JsResult<Option<ChainPart>> {
        match expr {
            Expression::OptionalMember(object, property) | Expression::Member(object, property) => {
                let Some(base) = self.eval_chain_value(object)? else {
                    return Ok(None);
                };
                if matches!(expr, Expression::OptionalMember(..)) && base.is_nullish() {
                    return Ok(None);
                }
                Ok(Some(ChainPart::Ref(self.member_reference(base, property)?)))
            }
            Expression::OptionalCall(callee, args) | Expression::Call(callee, args) => {
                let Some((func, this)) = self.eval_chain_callee(callee)? else {
                    return Ok(None);
                };
                if matches!(expr, Expression::OptionalCall(..)) && func.is_nullish() {
                    return Ok(None);
                }
                let args = self.argument_list_evaluation(args)?;
                Ok(Some(ChainPart::Value(self.call_callee(&func, &this, &args, callee)?)))
            }
            Expression::Identifier(_) | Expression::SuperMember(_) => Ok(Some(ChainPart::Ref(self.eval_reference(expr)?))),
            other => Ok(Some(ChainPart::Value(self.eval_expression(other)?))),
        }
    }

    fn eval_chain_value(&mut self, expr: &Expression) -> JsResult<Option<JsValue>> {
        Ok(match self.eval_chain(expr)? {
            None => None,
            Some(ChainPart::Ref(reference)) => Some(self.get_value(&reference)?),
            Some(ChainPart::Value(value)) => Some(value),
        })
    }

    fn eval_chain_callee(&mut self, expr: &Expression) -> JsResult<Option<(JsValue, JsValue)>> {
        Ok(match self.eval_chain(expr)? {
            None => None,
            Some(ChainPart::Ref(reference)) => {
                let func = self.get_value(&reference)?;
                Some((func, self.reference_this_for_call(&reference)?))
            }
            Some(ChainPart::Value(value)) => Some((value, JsValue::Undefined)),
        })
    }

    // ---- Literals (§13.2) ----

    // §13.2.4.1 ArrayAccumulation
    fn eval_array_literal(&mut self, elements: &[Option<Expression>]) -> JsResult<JsValue> {
        let array = self.array_create(0, None)?;
        let mut next_index: u64 = 0;
        for element in elements {
            match element {
                None => next_index += 1,
                Some(Expression::Spread(inner)) => {
                    let spread = self.eval_expression(inner)?;
                    let mut record = self.get_iterator(&spread)?;
                    while let Some(value) = self.iterator_step_value(&mut record)? {
                        let key = self.index_key(next_index);
                        self.create_data_property_or_throw(array, key, value)?;
                        next_index += 1;
                    }
                }
                Some(expr) => {
                    let value = self.eval_expression(expr)?;
                    let key = self.index_key(next_index);
                    self.create_data_property_or_throw(array, key, value)?;
                    next_index += 1;
                }
            }
        }
        if matches!(elements.last(), Some(None)) {
            self.set(array, "length".into(), JsValue::Number(next_index as f64), true)?;
        }
        Ok(JsValue::Object(array))
    }

    // §13.2.5.4 Object initializer evaluation
    fn eval_object_literal(&mut self, props: &[PropertyDefinition]) -> JsResult<JsValue> {
        let object = self.new_plain_object()?;
        for prop in props {
            match prop {
                PropertyDefinition::KeyValue(PropertyName::Identifier(name) | PropertyName::String(name), value)
                    if name == "__proto__" =>
                {
                    match self.eval_expression(value)? {
                        JsValue::Object(proto) => {
                            self.set_prototype_of(object, Some(proto))?;
                        }
                        JsValue::Null => {
                            self.set_prototype_of(object, None)?;
                        }
                        _ => {}
                    }
                }
                PropertyDefinition::KeyValue(name, value) => {
                    let key = self.eval_property_key(name)?;
                    let value = if value.is_anonymous_function_definition() {
                        self.named_evaluation(value, &key)?
                    } else {
                        self.eval_expression(value)?
                    };
                    self.create_data_property_or_throw(object, key, value)?;
                }
                PropertyDefinition::Shorthand(name) => {
                    let reference = self.resolve_binding(name, None)?;
                    let value = self.get_value(&reference)?;
                    self.create_data_property_or_throw(object, name.as_str().into(), value)?;
                }
                PropertyDefinition::Method(name, node, kind) => {
                    self.method_definition_evaluation(object, name, node, *kind, true)?;
                }
                PropertyDefinition::Spread(expr) => {
                    let source = self.eval_expression(expr)?;
                    self.copy_data_properties(object, &source, &[])?;
                }
            }
        }
        Ok(JsValue::Object(object))
    }

    // §13.2.5.5 Evaluation of PropertyName outside class bodies
    pub(crate) fn eval_property_key(&mut self, name: &PropertyName) -> JsResult<PropertyKey> {
        Ok(match name {
            PropertyName::Identifier(s) | PropertyName::String(s) => PropertyKey::from(s.as_str()),
            PropertyName::Number(n) => PropertyKey::from(number_ops::to_string(*n).as_str()),
            PropertyName::Computed(expr) => {
                let value = self.eval_expression(expr)?;
                self.to_property_key(&value)?
            }
            PropertyName::Private(_) => return Err(EngineError::Internal("private name in object literal").into()),
        })
    }

    // §13.2.8.6 Evaluation of template literals
    fn eval_template(&mut self, template: &TemplateLiteral) -> JsResult<JsValue> {
        let mut units: Vec<u16> = Vec::new();
        for (i, quasi) in template.quasis.iter().enumerate() {
            let Some(cooked) = quasi else {
                return Err(EngineError::Internal("invalid escape in untagged template").into());
            };
            units.extend(cooked.encode_utf16());
            if let Some(expr) = template.expressions.get(i) {
                let value = self.eval_expression(expr)?;
                let s = self.to_string(&value)?;
                units.extend_from_slice(s.as_code_units());
            }
        }
        Ok(JsValue::String(JsString::from_code_units(units)))
    }

    fn eval_tagged_template(&mut self, tag: &Expression, template: &Rc<TemplateLiteral>) -> JsResult<JsValue> {
        let (func, this) = self.eval_callee(tag)?;
        let site = self.get_template_object(template)?;
        let mut args = vec![JsValue::Object(site)];
        for expr in &template.expressions {
            args.push(self.eval_expression(expr)?);
        }
        self.call_callee(&func, &this, &args, tag)
    }

    // §13.2.8.4 GetTemplateObject(templateLiteral)
    fn get_template_object(&mut self, template: &Rc<TemplateLiteral>) -> JsResult<ObjectId> {
        let key = (self.current_realm_id(), Rc::as_ptr(template));
        if let Some((_, site)) = self.template_cache.get(&key) {
            return Ok(*site);
        }
        let count = template.raw_quasis.len() as u64;
        let site = self.array_create(count, None)?;
        let raw = self.array_create(count, None)?;
        for (i, (cooked, raw_str)) in template.quasis.iter().zip(&template.raw_quasis).enumerate() {
            let cooked_value = match cooked {
                Some(s) => JsValue::String(JsString::from_str(s)),
                None => JsValue::Undefined,
            };
            let index = self.index_key(i as u64);
            self.define_property_or_throw(site, index.clone(), PropertyDescriptor::data(cooked_value, false, true, false))?;
            let raw_value = JsValue::String(JsString::from_str(raw_str));
            self.define_property_or_throw(raw, index, PropertyDescriptor::data(raw_value, false, true, false))?;
        }
        self.set_integrity_level(raw, IntegrityLevel::Frozen)?;
        let raw_desc = PropertyDescriptor::data(JsValue::Object(raw), false, false, false);
        self.define_property_or_throw(site, "raw".into(), raw_desc)?;
        self.set_integrity_level(site, IntegrityLevel::Frozen)?;
        self.template_cache.insert(key, (template.clone(), site));
        Ok(site)
    }

    // ---- Unary operators (§13.5) ----

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expression) -> JsResult<JsValue> {
        let value = self.eval_expression(operand)?;
        Ok(match op {
            UnaryOp::Not => JsValue::Boolean(!to_boolean(&value)),
            UnaryOp::Plus => JsValue::Number(self.to_number(&value)?),
            UnaryOp::Minus => match self.to_numeric(&value)? {
                Numeric::Number(n) => JsValue::Number(number_ops::unary_minus(n)),
                Numeric::BigInt(b) => JsValue::BigInt(JsBigInt::new(bigint_ops::unary_minus(&b))),
            },
            UnaryOp::BitNot => match self.to_numeric(&value)? {
                Numeric::Number(n) => JsValue::Number(number_ops::bitwise_not(n)),
                Numeric::BigInt(b) => JsValue::BigInt(JsBigInt::new(bigint_ops::bitwise_not(&b))),
            },
        })
    }

    // §13.5.3 typeof
    fn eval_typeof(&mut self, operand: &Expression) -> JsResult<JsValue> {
        let value = if let Expression::Identifier(_) = operand {
            let reference = self.eval_reference(operand)?;
            if reference.is_unresolvable() {
                return Ok(JsValue::String(JsString::from_str("undefined")));
            }
            self.get_value(&reference)?
        } else {
            self.eval_expression(operand)?
        };
        Ok(JsValue::String(JsString::from_str(self.typeof_value(&value)?)))
    }

    // §13.5.1.2 delete UnaryExpression
    fn eval_delete(&mut self, operand: &Expression) -> JsResult<JsValue> {
        let reference = match operand {
            Expression::Identifier(_) | Expression::Member(..) | Expression::SuperMember(_) => {
                self.eval_reference(operand)?
            }
            Expression::OptionalChain(chain) => match self.eval_chain(chain)? {
                Some(ChainPart::Ref(reference)) => reference,
                _ => return Ok(JsValue::Boolean(true)),
            },
            other => {
                self.eval_expression(other)?;
                return Ok(JsValue::Boolean(true));
            }
        };
        match &reference.base {
            ReferenceBase::Unresolvable => Ok(JsValue::Boolean(true)),
            ReferenceBase::Value(base) => {
                if reference.is_super_reference() {
                    return Err(self.reference_error("Unsupported reference to 'super'"));
                }
                let ReferenceName::Key(key) = &reference.name else {
                    return Err(EngineError::Internal("delete of a private reference").into());
                };
                let object = self.to_object(base)?;
                let deleted = self.delete(object, key)?;
                if !deleted && reference.strict {
                    return Err(self.type_error(format!("Cannot delete property '{key}' of {base}")));
                }
                Ok(JsValue::Boolean(deleted))
            }
            ReferenceBase::Environment(env) => {
                let name = reference.binding_name()?;
                Ok(JsValue::Boolean(self.env_delete_binding(*env, &name)?))
            }
        }
    }

    // ---- Update expressions (§13.4) ----

    fn eval_update(&mut self, op: UpdateOp, prefix: bool, operand: &Expression) -> JsResult<JsValue> {
        let reference = self.eval_reference(operand)?;
        let old = self.get_value(&reference)?;
        let (old, new) = match self.to_numeric(&old)? {
            Numeric::Number(n) => {
                let new = match op {
                    UpdateOp::Increment => number_ops::add(n, 1.0),
                    UpdateOp::Decrement => number_ops::subtract(n, 1.0),
                };
                (JsValue::Number(n), JsValue::Number(new))
            }
            Numeric::BigInt(b) => {
                let one = BigInt::from(1);
                let new = match op {
                    UpdateOp::Increment => bigint_ops::add(&b, &one),
                    UpdateOp::Decrement => bigint_ops::subtract(&b, &one),
                };
                (JsValue::BigInt(JsBigInt::new(b)), JsValue::BigInt(JsBigInt::new(new)))
            }
        };
        self.put_value(&reference, new.clone())?;
        Ok(if prefix { new } else { old })
    }

    // ---- Assignment (§13.15) ----

    fn eval_assignment(&mut self, op: AssignOp, target: &Pattern, value: &Expression) -> JsResult<JsValue> {
        if op == AssignOp::Assign {
            return match target {
                Pattern::Identifier(name) => {
                    let reference = self.resolve_binding(name, None)?;
                    let rval = if value.is_anonymous_function_definition() {
                        self.named_evaluation(value, &PropertyKey::from(name.as_str()))?
                    } else {
                        self.eval_expression(value)?
                    };
                    self.put_value(&reference, rval.clone())?;
                    Ok(rval)
                }
                Pattern::MemberExpression(expr) => {
                    let reference = self.eval_reference(expr)?;
                    let rval = self.eval_expression(value)?;
                    self.put_value(&reference, rval.clone())?;
                    Ok(rval)
                }
                pattern => {
                    let rval = self.eval_expression(value)?;
                    self.destructuring_assignment(pattern, rval.clone())?;
                    Ok(rval)
                }
            };
        }

        let reference = match target {
            Pattern::Identifier(name) => self.resolve_binding(name, None)?,
            Pattern::MemberExpression(expr) => self.eval_reference(expr)?,
            _ => return Err(EngineError::Internal("compound assignment to a pattern").into()),
        };
        let lval = self.get_value(&reference)?;

        if let Some(logical) = op.logical_op() {
            let short_circuits = match logical {
                LogicalOp::And => !to_boolean(&lval),
                LogicalOp::Or => to_boolean(&lval),
                LogicalOp::NullishCoalescing => !lval.is_nullish(),
            };
            if short_circuits {
                return Ok(lval);
            }
            let rval = match target {
                Pattern::Identifier(name) if value.is_anonymous_function_definition() => {
                    self.named_evaluation(value, &PropertyKey::from(name.as_str()))?
                }
                _ => self.eval_expression(value)?,
            };
            self.put_value(&reference, rval.clone())?;
            return Ok(rval);
        }

        let binary = op
            .binary_op()
            .ok_or(EngineError::Internal("assignment operator without a binary operator"))?;
        let rval = self.eval_expression(value)?;
        let result = self.apply_string_or_numeric_binary_operator(binary, &lval, &rval)?;
        self.put_value(&reference, result.clone())?;
        Ok(result)
    }

    // ---- Binary operators (§13.6 - §13.12) ----

    pub(crate) fn apply_binary_operator(&mut self, op: BinaryOp, lval: &JsValue, rval: &JsValue) -> JsResult<JsValue> {
        let result = match op {
            BinaryOp::Eq => self.is_loosely_equal(lval, rval)?,
            BinaryOp::NotEq => !self.is_loosely_equal(lval, rval)?,
            BinaryOp::StrictEq => is_strictly_equal(lval, rval),
            BinaryOp::StrictNotEq => !is_strictly_equal(lval, rval),
            BinaryOp::Lt => self.is_less_than(lval, rval, true)? == Some(true),
            BinaryOp::Gt => self.is_less_than(rval, lval, false)? == Some(true),
            BinaryOp::LtEq => self.is_less_than(rval, lval, false)? == Some(false),
            BinaryOp::GtEq => self.is_less_than(lval, rval, true)? == Some(false),
            BinaryOp::Instanceof => self.instanceof_operator(lval, rval)?,
            BinaryOp::In => {
                let JsValue::Object(o) = rval else {
                    return Err(self.type_error(format!(
                        "Cannot use 'in' operator to search for '{}' in {rval}",
                        self.describe_key_value(lval)
                    )));
                };
                let key = self.to_property_key(lval)?;
                self.has_property(*o, &key)?
            }
            _ => return self.apply_string_or_numeric_binary_operator(op, lval, rval),
        };
        Ok(JsValue::Boolean(result))
    }

    // §13.15.3 ApplyStringOrNumericBinaryOperator(lval, opText, rval)
    pub(crate) fn apply_string_or_numeric_binary_operator(
        &mut self,
        op: BinaryOp,
        lval: &JsValue,
        rval: &JsValue,
    ) -> JsResult<JsValue> {
        let (lval, rval) = if op == BinaryOp::Add {
            let lprim = self.to_primitive(lval, PreferredType::Default)?;
            let rprim = self.to_primitive(rval, PreferredType::Default)?;
            if lprim.is_string() || rprim.is_string() {
                let lstr = self.to_string(&lprim)?;
                let rstr = self.to_string(&rprim)?;
                return Ok(JsValue::String(lstr.concat(&rstr)));
            }
            (lprim, rprim)
        } else {
            (lval.clone(), rval.clone())
        };
        let lnum = self.to_numeric(&lval)?;
        let rnum = self.to_numeric(&rval)?;
        match (lnum, rnum) {
            (Numeric::Number(x), Numeric::Number(y)) => Ok(JsValue::Number(apply_number_operator(op, x, y)?)),
            (Numeric::BigInt(x), Numeric::BigInt(y)) => match apply_bigint_operator(op, &x, &y)? {
                Ok(result) => Ok(JsValue::BigInt(JsBigInt::new(result))),
                Err(message) if op == BinaryOp::URShift => Err(self.type_error(message)),
                Err(message) => Err(self.range_error(message)),
            },
            _ => Err(self.type_error("Cannot mix BigInt and other types, use explicit conversions")),
        }
    }
}

fn apply_number_operator(op: BinaryOp, x: f64, y: f64) -> EngineResult<f64> {
    Ok(match op {
        BinaryOp::Add => number_ops::add(x, y),
        BinaryOp::Sub => number_ops::subtract(x, y),
        BinaryOp::Mul => number_ops::multiply(x, y),
        BinaryOp::Div => number_ops::divide(x, y),
        BinaryOp::Mod => number_ops::remainder(x, y),
        BinaryOp::Exp => number_ops::exponentiate(x, y),
        BinaryOp::LShift => number_ops::left_shift(x, y),
        BinaryOp::RShift => number_ops::signed_right_shift(x, y),
        BinaryOp::URShift => number_ops::unsigned_right_shift(x, y),
        BinaryOp::BitAnd => number_ops::bitwise_and(x, y),
        BinaryOp::BitOr => number_ops::bitwise_or(x, y),
        BinaryOp::BitXor => number_ops::bitwise_xor(x, y),
        _ => return Err(EngineError::Internal("not a numeric operator")),
    })
}

/// The inner `Err` carries the message of a RangeError (or, for `>>>`, a
/// TypeError) the caller raises.
fn apply_bigint_operator(op: BinaryOp, x: &BigInt, y: &BigInt) -> EngineResult<Result<BigInt, &'static str>> {
    Ok(match op {
        BinaryOp::Add => Ok(bigint_ops::add(x, y)),
        BinaryOp::Sub => Ok(bigint_ops::subtract(x, y)),
        BinaryOp::Mul => Ok(bigint_ops::multiply(x, y)),
        BinaryOp::Div => bigint_ops::divide(x, y),
        BinaryOp::Mod => bigint_ops::remainder(x, y),
        BinaryOp::Exp => bigint_ops::exponentiate(x, y),
        BinaryOp::LShift => bigint_ops::left_shift(x, y),
        BinaryOp::RShift => bigint_ops::signed_right_shift(x, y),
        BinaryOp::URShift => bigint_ops::unsigned_right_shift(x, y),
        BinaryOp::BitAnd => Ok(bigint_ops::bitwise_and(x, y)),
        BinaryOp::BitOr => Ok(bigint_ops::bitwise_or(x, y)),
        BinaryOp::BitXor => Ok(bigint_ops::bitwise_xor(x, y)),
        _ => return Err(EngineError::Internal("not a numeric operator")),
    })
}

/// Source-like rendering of a callee for "is not a function" messages.
fn describe_callee(expr: &Expression) -> String {
    match expr {
        Expression::Identifier(name) => name.clone(),
        Expression::This => "this".to_string(),
        Expression::Member(object, MemberProperty::Dot(name)) => format!("{}.{name}", describe_callee(object)),
        Expression::Member(object, MemberProperty::Private(name)) => format!("{}.#{name}", describe_callee(object)),
        Expression::Member(object, MemberProperty::Computed(_)) => format!("{}[...]", describe_callee(object)),
        Expression::SuperMember(MemberProperty::Dot(name)) => format!("super.{name}"),
        Expression::OptionalChain(inner) => describe_callee(inner),
        Expression::OptionalMember(object, MemberProperty::Dot(name)) => format!("{}?.{name}", describe_callee(object)),
        Expression::Call(callee, _) | Expression::OptionalCall(callee, _) => format!("{}(...)", describe_callee(callee)),
        Expression::Literal(Literal::String(s)) => format!("\"{s}\""),
        Expression::Literal(Literal::Number(n)) => number_ops::to_string(*n),
        _ => "expression".to_string(),
    }
}
