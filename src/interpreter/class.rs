//! Class definitions, method definitions and instance field initialization
//! (§15.4, §15.7).

use super::*;

/// A static element, run against the constructor once the class is defined.
enum StaticElement {
    Field(ClassFieldDefinition),
    Block(ObjectId),
}

enum ElementRecord {
    Private(PrivateElement),
    Field(ClassFieldDefinition),
    Block(ObjectId),
    None,
}

/// Adds `element` to `container`, pairing a getter with an earlier setter of
/// the same private name and vice versa.
fn push_private(container: &mut Vec<PrivateElement>, element: PrivateElement) {
    if let Some(existing) = container.iter_mut().find(|e| e.key == element.key)
        && let (
            PrivateElementKind::Accessor { get, set },
            PrivateElementKind::Accessor {
                get: new_get,
                set: new_set,
            },
        ) = (&mut existing.kind, element.kind.clone())
    {
        if !new_get.is_undefined() {
            *get = new_get;
        }
        if !new_set.is_undefined() {
            *set = new_set;
        }
        return;
    }
    container.push(element);
}

fn private_bound_identifiers(class: &ClassNode) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for element in &class.body {
        let key = match element {
            ClassElement::Method(m) => &m.key,
            ClassElement::Field(f) => &f.key,
            ClassElement::Constructor(_) | ClassElement::StaticBlock(_) => continue,
        };
        if let PropertyName::Private(name) = key
            && !names.contains(&name.as_str())
        {
            names.push(name);
        }
    }
    names
}

fn initializer_node(body: FunctionBody) -> Rc<FunctionNode> {
    Rc::new(FunctionNode {
        name: None,
        params: Vec::new(),
        body,
        kind: FunctionKind::ClassInitializer,
        is_generator: false,
        source_text: None,
    })
}

impl Interpreter {
    // §15.7.14 ClassDefinitionEvaluation(classBinding, className)
    pub(crate) fn class_definition_evaluation(
        &mut self,
        class: &Rc<ClassNode>,
        binding: Option<&str>,
        name: &PropertyKey,
    ) -> JsResult<ObjectId> {
        let env = self.lexical_env()?;
        let outer_private = self.private_env()?;
        // All parts of a class are strict mode code.
        let was_strict = self.running_context()?.strict;
        self.running_context_mut()?.strict = true;
        let result = self.evaluate_class(class, binding, name, env, outer_private.clone());
        self.set_lexical_env(env)?;
        self.set_private_env(outer_private)?;
        self.running_context_mut()?.strict = was_strict;
        result
    }

    fn evaluate_class(
        &mut self,
        class: &Rc<ClassNode>,
        binding: Option<&str>,
        name: &PropertyKey,
        env: EnvId,
        outer_private: Option<Rc<PrivateEnvironment>>,
    ) -> JsResult<ObjectId> {
        let class_env = self.new_declarative_environment(Some(env));
        if let Some(binding) = binding {
            self.env_create_immutable_binding(class_env, binding, true)?;
        }
        let names = private_bound_identifiers(class)
            .into_iter()
            .map(|n| self.new_private_name(n))
            .collect();
        let class_private = self.new_private_environment(outer_private, names);

        let (proto_parent, constructor_parent) = match &class.super_class {
            None => (
                Some(self.intrinsic(Intrinsic::ObjectPrototype)?),
                self.intrinsic(Intrinsic::FunctionPrototype)?,
            ),
            Some(heritage) => {
                self.set_lexical_env(class_env)?;
                let superclass = self.eval_expression(heritage)?;
                self.set_lexical_env(env)?;
                match superclass {
                    JsValue::Null => (None, self.intrinsic(Intrinsic::FunctionPrototype)?),
                    JsValue::Object(sc) if self.is_constructor(&JsValue::Object(sc))? => {
                        let proto_parent = match self.get(sc, &"prototype".into())? {
                            JsValue::Object(p) => Some(p),
                            JsValue::Null => None,
                            other => {
                                return Err(self.type_error(format!(
                                    "Class extends value does not have valid prototype property {other}"
                                )));
                            }
                        };
                        (proto_parent, sc)
                    }
                    other => {
                        return Err(self.type_error(format!("Class extends value {other} is not a constructor or null")));
                    }
                }
            }
        };
        let proto = self.ordinary_object_create(proto_parent);

        self.set_lexical_env(class_env)?;
        self.set_private_env(Some(class_private.clone()))?;

        let derived = class.super_class.is_some();
        let constructor_node = class
            .body
            .iter()
            .find_map(|e| match e {
                ClassElement::Constructor(node) => Some(node.clone()),
                _ => None,
            });
        let is_default = constructor_node.is_none();
        let constructor_node = constructor_node.unwrap_or_else(|| {
            Rc::new(FunctionNode {
                name: None,
                params: Vec::new(),
                body: FunctionBody::Block(Vec::new()),
                kind: if derived {
                    FunctionKind::DerivedConstructor
                } else {
                    FunctionKind::ClassConstructor
                },
                is_generator: false,
                source_text: class.source_text.clone(),
            })
        });
        let f = self.ordinary_function_create(
            constructor_parent,
            constructor_node,
            class_env,
            Some(class_private.clone()),
            true,
        )?;
        self.make_method(f, proto)?;
        self.function_data_mut(f)?.default_constructor = is_default;
        self.set_function_name(f, name, None)?;
        self.make_constructor(f, false, Some(proto))?;
        self.create_method_property(proto, "constructor".into(), JsValue::Object(f))?;

        let mut instance_private_methods: Vec<PrivateElement> = Vec::new();
        let mut static_private_methods: Vec<PrivateElement> = Vec::new();
        let mut instance_fields: Vec<ClassFieldDefinition> = Vec::new();
        let mut static_elements: Vec<StaticElement> = Vec::new();

        for element in &class.body {
            let is_static = match element {
                ClassElement::Constructor(_) => continue,
                ClassElement::Method(m) => m.is_static,
                ClassElement::Field(field) => field.is_static,
                ClassElement::StaticBlock(_) => true,
            };
            let home = if is_static { f } else { proto };
            match self.class_element_evaluation(element, home)? {
                ElementRecord::Private(pe) if is_static => push_private(&mut static_private_methods, pe),
                ElementRecord::Private(pe) => push_private(&mut instance_private_methods, pe),
                ElementRecord::Field(field) if is_static => static_elements.push(StaticElement::Field(field)),
                ElementRecord::Field(field) => instance_fields.push(field),
                ElementRecord::Block(body) => static_elements.push(StaticElement::Block(body)),
                ElementRecord::None => {}
            }
        }

        self.set_lexical_env(env)?;
        if let Some(binding) = binding {
            self.env_initialize_binding(class_env, binding, JsValue::Object(f))?;
        }
        {
            let data = self.function_data_mut(f)?;
            data.private_methods = instance_private_methods;
            data.fields = instance_fields;
        }
        for method in static_private_methods {
            self.private_method_or_accessor_add(f, method)?;
        }
        for element in static_elements {
            match element {
                StaticElement::Field(field) => self.define_field(f, &field)?,
                StaticElement::Block(body) => {
                    self.call(&JsValue::Object(body), &JsValue::Object(f), &[])?;
                }
            }
        }
        tracing::trace!(class = %name, "class defined");
        Ok(f)
    }

    // §15.7.11 ClassElementEvaluation
    fn class_element_evaluation(&mut self, element: &ClassElement, home: ObjectId) -> JsResult<ElementRecord> {
        match element {
            ClassElement::Method(m) => Ok(match self.method_definition_evaluation(home, &m.key, &m.value, m.kind, false)? {
                Some(pe) => ElementRecord::Private(pe),
                None => ElementRecord::None,
            }),
            // §15.7.10 ClassFieldDefinitionEvaluation
            ClassElement::Field(field) => {
                let name = self.class_element_name(&field.key)?;
                let initializer = match &field.value {
                    Some(value) => {
                        let node = initializer_node(FunctionBody::Expression(Box::new(value.clone())));
                        let init = self.define_initializer(node, home)?;
                        self.function_data_mut(init)?.class_field_name = Some(name.function_name());
                        Some(init)
                    }
                    None => None,
                };
                Ok(ElementRecord::Field(ClassFieldDefinition { name, initializer }))
            }
            // §15.7.12 ClassStaticBlockDefinitionEvaluation
            ClassElement::StaticBlock(body) => {
                let node = initializer_node(FunctionBody::Block(body.clone()));
                Ok(ElementRecord::Block(self.define_initializer(node, home)?))
            }
            ClassElement::Constructor(_) => Ok(ElementRecord::None),
        }
    }

    fn define_initializer(&mut self, node: Rc<FunctionNode>, home: ObjectId) -> JsResult<ObjectId> {
        let env = self.lexical_env()?;
        let private_env = self.private_env()?;
        let proto = self.intrinsic(Intrinsic::FunctionPrototype)?;
        let f = self.ordinary_function_create(proto, node, env, private_env, true)?;
        self.make_method(f, home)?;
        Ok(f)
    }

    // §15.7.3 ClassElementName evaluation
    fn class_element_name(&mut self, key: &PropertyName) -> JsResult<FieldName> {
        match key {
            PropertyName::Private(name) => Ok(FieldName::Private(self.resolve_private_identifier(name)?)),
            other => Ok(FieldName::Key(self.eval_property_key(other)?)),
        }
    }

    // §15.4.4 MethodDefinitionEvaluation(object, enumerable)
    pub(crate) fn method_definition_evaluation(
        &mut self,
        object: ObjectId,
        key: &PropertyName,
        node: &Rc<FunctionNode>,
        kind: MethodKind,
        enumerable: bool,
    ) -> JsResult<Option<PrivateElement>> {
        let name = self.class_element_name(key)?;
        let env = self.lexical_env()?;
        let private_env = self.private_env()?;
        let strict = self.is_strict();
        // §15.4.2 DefineMethod
        let proto = if node.is_generator {
            self.intrinsic(Intrinsic::GeneratorFunctionPrototype)?
        } else {
            self.intrinsic(Intrinsic::FunctionPrototype)?
        };
        let closure = self.ordinary_function_create(proto, node.clone(), env, private_env, strict)?;
        self.make_method(closure, object)?;
        let prefix = match kind {
            MethodKind::Method => None,
            MethodKind::Get => Some("get"),
            MethodKind::Set => Some("set"),
        };
        self.set_function_name(closure, &name.function_name(), prefix)?;
        if node.is_generator {
            let generator_proto = self.intrinsic(Intrinsic::GeneratorPrototype)?;
            let prototype = self.ordinary_object_create(Some(generator_proto));
            let desc = PropertyDescriptor::data(JsValue::Object(prototype), true, false, false);
            self.define_property_or_throw(closure, "prototype".into(), desc)?;
        }
        let value = JsValue::Object(closure);
        match name {
            FieldName::Private(key) => {
                let kind = match kind {
                    MethodKind::Method => PrivateElementKind::Method(value),
                    MethodKind::Get => PrivateElementKind::Accessor {
                        get: value,
                        set: JsValue::Undefined,
                    },
                    MethodKind::Set => PrivateElementKind::Accessor {
                        get: JsValue::Undefined,
                        set: value,
                    },
                };
                Ok(Some(PrivateElement { key, kind }))
            }
            FieldName::Key(key) => {
                let desc = match kind {
                    MethodKind::Method => PropertyDescriptor::data(value, true, enumerable, true),
                    MethodKind::Get => PropertyDescriptor {
                        get: Some(value),
                        enumerable: Some(enumerable),
                        configurable: Some(true),
                        ..Default::default()
                    },
                    MethodKind::Set => PropertyDescriptor {
                        set: Some(value),
                        enumerable: Some(enumerable),
                        configurable: Some(true),
                        ..Default::default()
                    },
                };
                self.define_property_or_throw(object, key, desc)?;
                Ok(None)
            }
        }
    }

    // §7.3.34 InitializeInstanceElements(O, constructor)
    pub(crate) fn initialize_instance_elements(&mut self, o: ObjectId, constructor: ObjectId) -> JsResult<()> {
        let (methods, fields) = match &self.heap.object(constructor)?.kind {
            ObjectKind::Function(data) => (data.private_methods.clone(), data.fields.clone()),
            _ => return Ok(()),
        };
        for method in methods {
            self.private_method_or_accessor_add(o, method)?;
        }
        for field in &fields {
            self.define_field(o, field)?;
        }
        Ok(())
    }

    // §7.3.33 DefineField(receiver, fieldRecord)
    fn define_field(&mut self, receiver: ObjectId, field: &ClassFieldDefinition) -> JsResult<()> {
        let value = match field.initializer {
            Some(init) => self.call(&JsValue::Object(init), &JsValue::Object(receiver), &[])?,
            None => JsValue::Undefined,
        };
        match &field.name {
            FieldName::Private(name) => self.private_field_add(receiver, name.clone(), value),
            FieldName::Key(key) => self.create_data_property_or_throw(receiver, key.clone(), value),
        }
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

    fn run_err(body: Vec<Statement>) -> String {
        let mut interp = Interpreter::new().unwrap();
        interp.run(&script(body)).unwrap_err().to_string()
    }

    #[test]
    fn methods_live_on_the_prototype_and_are_not_enumerable() {
        // class C { m() { return 7 } } var c = new C(); c.m() + Object.keys(C.prototype).length
        let v = run(vec![
            class_decl("C", None, vec![class_method("m", &[], vec![ret(num(7.0))])]),
            var("c", new(ident("C"), vec![])),
            expr_stmt(binary(
                BinaryOp::Add,
                method_call(ident("c"), "m", vec![]),
                member(call(member(ident("Object"), "keys"), vec![member(ident("C"), "prototype")]), "length"),
            )),
        ]);
        assert_eq!(v.as_number(), Some(7.0));
    }

    #[test]
    fn fields_initialize_in_order_with_this() {
        // class C { a = 1; b = this.a + 1 } new C().b
        let v = run(vec![
            class_decl(
                "C",
                None,
                vec![
                    field("a", Some(num(1.0))),
                    field("b", Some(binary(BinaryOp::Add, member(this(), "a"), num(1.0)))),
                ],
            ),
            expr_stmt(member(new(ident("C"), vec![]), "b")),
        ]);
        assert_eq!(v.as_number(), Some(2.0));
    }

    #[test]
    fn private_fields_and_methods() {
        // class C { #x = 3; #double() { return this.#x * 2 } get() { return this.#double() } }
        let v = run(vec![
            class_decl(
                "C",
                None,
                vec![
                    field("#x", Some(num(3.0))),
                    class_method(
                        "#double",
                        &[],
                        vec![ret(binary(BinaryOp::Mul, private_member(this(), "x"), num(2.0)))],
                    ),
                    class_method("get", &[], vec![ret(call(private_member(this(), "double"), vec![]))]),
                ],
            ),
            expr_stmt(method_call(new(ident("C"), vec![]), "get", vec![])),
        ]);
        assert_eq!(v.as_number(), Some(6.0));
    }

    #[test]
    fn private_accessor_pairs_share_one_name() {
        // class C { #v = 1; get #p() { return this.#v } set #p(x) { this.#v = x }
        //           bump() { this.#p = this.#p + 1; return this.#p } }
        let v = run(vec![
            class_decl(
                "C",
                None,
                vec![
                    field("#v", Some(num(1.0))),
                    class_getter("#p", vec![ret(private_member(this(), "v"))]),
                    class_setter("#p", "x", vec![expr_stmt(assign(private_member(this(), "v"), ident("x")))]),
                    class_method(
                        "bump",
                        &[],
                        vec![
                            expr_stmt(assign(
                                private_member(this(), "p"),
                                binary(BinaryOp::Add, private_member(this(), "p"), num(1.0)),
                            )),
                            ret(private_member(this(), "p")),
                        ],
                    ),
                ],
            ),
            expr_stmt(method_call(new(ident("C"), vec![]), "bump", vec![])),
        ]);
        assert_eq!(v.as_number(), Some(2.0));
    }

    #[test]
    fn brand_checks_with_private_in() {
        // class C { #x; static has(o) { return #x in o } } C.has(new C()) && !C.has({})
        let v = run(vec![
            class_decl(
                "C",
                None,
                vec![
                    field("#x", None),
                    static_method("has", &["o"], vec![ret(private_in("x", ident("o")))]),
                ],
            ),
            expr_stmt(logical(
                LogicalOp::And,
                method_call(ident("C"), "has", vec![new(ident("C"), vec![])]),
                not(method_call(ident("C"), "has", vec![object(vec![])])),
            )),
        ]);
        assert_eq!(v.as_boolean(), Some(true));
    }

    #[test]
    fn static_fields_and_blocks_run_against_the_constructor() {
        // class C { static a = 2; static { C.b = this.a * 5 } } C.b
        let v = run(vec![
            class_decl(
                "C",
                None,
                vec![
                    static_field("a", Some(num(2.0))),
                    static_block(vec![expr_stmt(assign(
                        member(ident("C"), "b"),
                        binary(BinaryOp::Mul, member(this(), "a"), num(5.0)),
                    ))]),
                ],
            ),
            expr_stmt(member(ident("C"), "b")),
        ]);
        assert_eq!(v.as_number(), Some(10.0));
    }

    #[test]
    fn derived_constructor_runs_fields_after_super() {
        // class A { constructor(x) { this.x = x } }
        // class B extends A { y = this.x + 1; constructor() { super(4) } }
        // new B().y
        let v = run(vec![
            class_decl(
                "A",
                None,
                vec![constructor(&["x"], vec![expr_stmt(assign(member(this(), "x"), ident("x")))])],
            ),
            class_decl(
                "B",
                Some(ident("A")),
                vec![
                    field("y", Some(binary(BinaryOp::Add, member(this(), "x"), num(1.0)))),
                    derived_constructor(&[], vec![expr_stmt(super_call(vec![num(4.0)]))]),
                ],
            ),
            expr_stmt(member(new(ident("B"), vec![]), "y")),
        ]);
        assert_eq!(v.as_number(), Some(5.0));
    }

    #[test]
    fn default_derived_constructor_forwards_arguments() {
        // class A { constructor(a, b) { this.s = a + b } } class B extends A {} new B(1, 2).s
        let v = run(vec![
            class_decl(
                "A",
                None,
                vec![constructor(
                    &["a", "b"],
                    vec![expr_stmt(assign(member(this(), "s"), binary(BinaryOp::Add, ident("a"), ident("b"))))],
                )],
            ),
            class_decl("B", Some(ident("A")), vec![]),
            expr_stmt(member(new(ident("B"), vec![num(1.0), num(2.0)]), "s")),
        ]);
        assert_eq!(v.as_number(), Some(3.0));
    }

    #[test]
    fn super_property_access_in_methods() {
        // class A { m() { return 1 } } class B extends A { m() { return super.m() + 1 } } new B().m()
        let v = run(vec![
            class_decl("A", None, vec![class_method("m", &[], vec![ret(num(1.0))])]),
            class_decl(
                "B",
                Some(ident("A")),
                vec![class_method(
                    "m",
                    &[],
                    vec![ret(binary(BinaryOp::Add, call(super_member("m"), vec![]), num(1.0)))],
                )],
            ),
            expr_stmt(method_call(new(ident("B"), vec![]), "m", vec![])),
        ]);
        assert_eq!(v.as_number(), Some(2.0));
    }

    #[test]
    fn calling_a_class_without_new_throws() {
        let err = run_err(vec![class_decl("C", None, vec![]), expr_stmt(call(ident("C"), vec![]))]);
        assert!(err.contains("cannot be invoked without 'new'"), "{err}");
    }

    #[test]
    fn extending_a_non_constructor_throws() {
        let err = run_err(vec![class_decl("C", Some(num(1.0)), vec![])]);
        assert!(err.contains("is not a constructor or null"), "{err}");
    }

    #[test]
    fn extends_null_leaves_the_prototype_chain_empty() {
        // class C extends null {} Object.getPrototypeOf(C.prototype) === null
        let v = run(vec![
            class_decl("C", Some(null()), vec![]),
            expr_stmt(binary(
                BinaryOp::StrictEq,
                call(member(ident("Object"), "getPrototypeOf"), vec![member(ident("C"), "prototype")]),
                null(),
            )),
        ]);
        assert_eq!(v.as_boolean(), Some(true));
    }

    #[test]
    fn class_constructor_prototype_is_read_only() {
        let mut interp = Interpreter::new().unwrap();
        interp.run(&script(vec![class_decl("C", None, vec![])])).unwrap();
        let c = interp.get_global("C");
        // Global lexical bindings are not global object properties.
        assert!(c.unwrap().is_undefined());
        let v = interp
            .run(&script(vec![expr_stmt(call(
                member(ident("Object"), "getOwnPropertyDescriptor"),
                vec![ident("C"), string("prototype")],
            ))]))
            .unwrap();
        let desc = v.as_object().unwrap();
        assert_eq!(interp.get(desc, &"writable".into()).unwrap().as_boolean(), Some(false));
    }

    #[test]
    fn anonymous_class_expressions_take_the_binding_name() {
        let v = run(vec![let_("K", class_expr(None, None, vec![])), expr_stmt(member(ident("K"), "name"))]);
        assert_eq!(v.as_string().map(|s| s.to_rust_string()), Some("K".into()));
    }
}
