//! Constructor helpers for hand-assembling syntax trees.
//!
//! Embedders without a parser, and the test suite, build scripts with these
//! functions instead of spelling out every node:
//!
//! ```
//! use jsrt::builder::*;
//! use jsrt::ast::BinaryOp;
//!
//! let script = script(vec![
//!     let_("x", num(40.0)),
//!     expr_stmt(binary(BinaryOp::Add, ident("x"), num(2.0))),
//! ]);
//! let mut rt = jsrt::Interpreter::new().unwrap();
//! let value = rt.run(&script).unwrap();
//! assert_eq!(value.as_number(), Some(42.0));
//! ```

use crate::ast::*;
use std::rc::Rc;

pub fn script(body: Vec<Statement>) -> Script {
    Script {
        body,
        strict: false,
    }
}

pub fn strict_script(body: Vec<Statement>) -> Script {
    Script { body, strict: true }
}

// Literals and primary expressions

pub fn num(n: f64) -> Expression {
    Expression::Literal(Literal::Number(n))
}

pub fn string(s: &str) -> Expression {
    Expression::Literal(Literal::String(s.to_string()))
}

pub fn boolean(b: bool) -> Expression {
    Expression::Literal(Literal::Boolean(b))
}

pub fn null() -> Expression {
    Expression::Literal(Literal::Null)
}

pub fn bigint(digits: &str) -> Expression {
    Expression::Literal(Literal::BigInt(digits.to_string()))
}

pub fn undefined() -> Expression {
    Expression::Void(Box::new(num(0.0)))
}

pub fn ident(name: &str) -> Expression {
    Expression::Identifier(name.to_string())
}

pub fn this() -> Expression {
    Expression::This
}

pub fn new_target() -> Expression {
    Expression::NewTarget
}

pub fn array(elements: Vec<Expression>) -> Expression {
    Expression::Array(elements.into_iter().map(Some).collect())
}

/// Array literal with holes (`[1, , 3]`).
pub fn sparse_array(elements: Vec<Option<Expression>>) -> Expression {
    Expression::Array(elements)
}

pub fn object(props: Vec<PropertyDefinition>) -> Expression {
    Expression::Object(props)
}

pub fn template(quasis: &[&str], expressions: Vec<Expression>) -> Expression {
    Expression::Template(Rc::new(template_literal(quasis, expressions)))
}

pub fn tagged_template(tag: Expression, quasis: &[&str], expressions: Vec<Expression>) -> Expression {
    Expression::TaggedTemplate(Box::new(tag), Rc::new(template_literal(quasis, expressions)))
}

fn template_literal(quasis: &[&str], expressions: Vec<Expression>) -> TemplateLiteral {
    TemplateLiteral {
        quasis: quasis.iter().map(|q| Some(q.to_string())).collect(),
        raw_quasis: quasis.iter().map(|q| q.to_string()).collect(),
        expressions,
    }
}

// Object literal members

pub fn prop(key: &str, value: Expression) -> PropertyDefinition {
    PropertyDefinition::KeyValue(PropertyName::Identifier(key.to_string()), value)
}

pub fn computed_prop(key: Expression, value: Expression) -> PropertyDefinition {
    PropertyDefinition::KeyValue(PropertyName::Computed(Box::new(key)), value)
}

pub fn shorthand(name: &str) -> PropertyDefinition {
    PropertyDefinition::Shorthand(name.to_string())
}

pub fn spread_prop(value: Expression) -> PropertyDefinition {
    PropertyDefinition::Spread(value)
}

pub fn method_prop(key: &str, params: &[&str], body: Vec<Statement>) -> PropertyDefinition {
    PropertyDefinition::Method(
        PropertyName::Identifier(key.to_string()),
        function_node(FunctionKind::Method, None, params, body),
        MethodKind::Method,
    )
}

pub fn getter_prop(key: &str, body: Vec<Statement>) -> PropertyDefinition {
    PropertyDefinition::Method(
        PropertyName::Identifier(key.to_string()),
        function_node(FunctionKind::Getter, None, &[], body),
        MethodKind::Get,
    )
}

pub fn setter_prop(key: &str, param: &str, body: Vec<Statement>) -> PropertyDefinition {
    PropertyDefinition::Method(
        PropertyName::Identifier(key.to_string()),
        function_node(FunctionKind::Setter, None, &[param], body),
        MethodKind::Set,
    )
}

// Operators

pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Expression {
    Expression::Binary(op, Box::new(left), Box::new(right))
}

pub fn logical(op: LogicalOp, left: Expression, right: Expression) -> Expression {
    Expression::Logical(op, Box::new(left), Box::new(right))
}

pub fn unary(op: UnaryOp, operand: Expression) -> Expression {
    Expression::Unary(op, Box::new(operand))
}

pub fn not(operand: Expression) -> Expression {
    unary(UnaryOp::Not, operand)
}

pub fn typeof_(operand: Expression) -> Expression {
    Expression::Typeof(Box::new(operand))
}

pub fn void(operand: Expression) -> Expression {
    Expression::Void(Box::new(operand))
}

pub fn delete(operand: Expression) -> Expression {
    Expression::Delete(Box::new(operand))
}

pub fn update(op: UpdateOp, prefix: bool, target: Expression) -> Expression {
    Expression::Update(op, prefix, Box::new(target))
}

pub fn cond(test: Expression, consequent: Expression, alternate: Expression) -> Expression {
    Expression::Conditional(Box::new(test), Box::new(consequent), Box::new(alternate))
}

pub fn seq(expressions: Vec<Expression>) -> Expression {
    Expression::Sequence(expressions)
}

pub fn spread(value: Expression) -> Expression {
    Expression::Spread(Box::new(value))
}

/// Converts an identifier or member expression into an assignment target.
pub fn target(expr: Expression) -> Pattern {
    match expr {
        Expression::Identifier(name) => Pattern::Identifier(name),
        other => Pattern::MemberExpression(Box::new(other)),
    }
}

pub fn assign(target_expr: Expression, value: Expression) -> Expression {
    assign_op(AssignOp::Assign, target_expr, value)
}

pub fn assign_op(op: AssignOp, target_expr: Expression, value: Expression) -> Expression {
    Expression::Assign(op, Box::new(target(target_expr)), Box::new(value))
}

/// Destructuring assignment (`[a, b] = value`).
pub fn assign_pattern(pattern: Pattern, value: Expression) -> Expression {
    Expression::Assign(AssignOp::Assign, Box::new(pattern), Box::new(value))
}

// Member access and calls

pub fn member(object: Expression, name: &str) -> Expression {
    Expression::Member(Box::new(object), MemberProperty::Dot(name.to_string()))
}

pub fn index(object: Expression, key: Expression) -> Expression {
    Expression::Member(Box::new(object), MemberProperty::Computed(Box::new(key)))
}

pub fn private_member(object: Expression, name: &str) -> Expression {
    let name = name.strip_prefix('#').unwrap_or(name);
    Expression::Member(Box::new(object), MemberProperty::Private(name.to_string()))
}

pub fn private_in(name: &str, object: Expression) -> Expression {
    let name = name.strip_prefix('#').unwrap_or(name);
    Expression::PrivateIn(name.to_string(), Box::new(object))
}

pub fn super_member(name: &str) -> Expression {
    Expression::SuperMember(MemberProperty::Dot(name.to_string()))
}

pub fn super_call(args: Vec<Expression>) -> Expression {
    Expression::SuperCall(args)
}

pub fn call(callee: Expression, args: Vec<Expression>) -> Expression {
    Expression::Call(Box::new(callee), args)
}

pub fn method_call(object: Expression, name: &str, args: Vec<Expression>) -> Expression {
    call(member(object, name), args)
}

pub fn new(callee: Expression, args: Vec<Expression>) -> Expression {
    Expression::New(Box::new(callee), args)
}

/// `object?.name`
pub fn optional_member(object: Expression, name: &str) -> Expression {
    Expression::OptionalChain(Box::new(Expression::OptionalMember(
        Box::new(object),
        MemberProperty::Dot(name.to_string()),
    )))
}

/// `callee?.(args)`
pub fn optional_call(callee: Expression, args: Vec<Expression>) -> Expression {
    Expression::OptionalChain(Box::new(Expression::OptionalCall(Box::new(callee), args)))
}

pub fn yield_(value: Option<Expression>) -> Expression {
    Expression::Yield(value.map(Box::new), false)
}

pub fn yield_star(iterable: Expression) -> Expression {
    Expression::Yield(Some(Box::new(iterable)), true)
}

// Functions and classes

pub fn params(names: &[&str]) -> Vec<Pattern> {
    names.iter().map(|n| Pattern::Identifier(n.to_string())).collect()
}

pub fn function_node(
    kind: FunctionKind,
    name: Option<&str>,
    param_names: &[&str],
    body: Vec<Statement>,
) -> Rc<FunctionNode> {
    Rc::new(FunctionNode {
        name: name.map(str::to_string),
        params: params(param_names),
        body: FunctionBody::Block(body),
        kind,
        is_generator: false,
        source_text: None,
    })
}

pub fn function_expr(name: Option<&str>, param_names: &[&str], body: Vec<Statement>) -> Expression {
    Expression::Function(function_node(FunctionKind::Normal, name, param_names, body))
}

pub fn function_with_params(name: Option<&str>, params: Vec<Pattern>, body: Vec<Statement>) -> Expression {
    Expression::Function(Rc::new(FunctionNode {
        name: name.map(str::to_string),
        params,
        body: FunctionBody::Block(body),
        kind: FunctionKind::Normal,
        is_generator: false,
        source_text: None,
    }))
}

pub fn generator_expr(name: Option<&str>, param_names: &[&str], body: Vec<Statement>) -> Expression {
    Expression::Function(generator_node(name, param_names, body))
}

fn generator_node(name: Option<&str>, param_names: &[&str], body: Vec<Statement>) -> Rc<FunctionNode> {
    Rc::new(FunctionNode {
        name: name.map(str::to_string),
        params: params(param_names),
        body: FunctionBody::Block(body),
        kind: FunctionKind::Normal,
        is_generator: true,
        source_text: None,
    })
}

pub fn arrow(param_names: &[&str], body: Expression) -> Expression {
    Expression::ArrowFunction(Rc::new(FunctionNode {
        name: None,
        params: params(param_names),
        body: FunctionBody::Expression(Box::new(body)),
        kind: FunctionKind::Arrow,
        is_generator: false,
        source_text: None,
    }))
}

pub fn arrow_block(param_names: &[&str], body: Vec<Statement>) -> Expression {
    Expression::ArrowFunction(function_node(FunctionKind::Arrow, None, param_names, body))
}

pub fn function_decl(name: &str, param_names: &[&str], body: Vec<Statement>) -> Statement {
    Statement::FunctionDeclaration(function_node(FunctionKind::Normal, Some(name), param_names, body))
}

pub fn generator_decl(name: &str, param_names: &[&str], body: Vec<Statement>) -> Statement {
    Statement::FunctionDeclaration(generator_node(Some(name), param_names, body))
}

pub fn class_node(name: Option<&str>, super_class: Option<Expression>, body: Vec<ClassElement>) -> Rc<ClassNode> {
    Rc::new(ClassNode {
        name: name.map(str::to_string),
        super_class: super_class.map(Box::new),
        body,
        source_text: None,
    })
}

pub fn class_decl(name: &str, super_class: Option<Expression>, body: Vec<ClassElement>) -> Statement {
    Statement::ClassDeclaration(class_node(Some(name), super_class, body))
}

pub fn class_expr(name: Option<&str>, super_class: Option<Expression>, body: Vec<ClassElement>) -> Expression {
    Expression::Class(class_node(name, super_class, body))
}

pub fn constructor(param_names: &[&str], body: Vec<Statement>) -> ClassElement {
    ClassElement::Constructor(function_node(FunctionKind::ClassConstructor, None, param_names, body))
}

pub fn derived_constructor(param_names: &[&str], body: Vec<Statement>) -> ClassElement {
    ClassElement::Constructor(function_node(FunctionKind::DerivedConstructor, None, param_names, body))
}

fn class_key(name: &str) -> PropertyName {
    match name.strip_prefix('#') {
        Some(private) => PropertyName::Private(private.to_string()),
        None => PropertyName::Identifier(name.to_string()),
    }
}

/// Class method; a leading `#` makes the name private.
pub fn class_method(name: &str, param_names: &[&str], body: Vec<Statement>) -> ClassElement {
    ClassElement::Method(ClassMethod {
        key: class_key(name),
        kind: MethodKind::Method,
        value: function_node(FunctionKind::Method, None, param_names, body),
        is_static: false,
    })
}

pub fn static_method(name: &str, param_names: &[&str], body: Vec<Statement>) -> ClassElement {
    ClassElement::Method(ClassMethod {
        key: class_key(name),
        kind: MethodKind::Method,
        value: function_node(FunctionKind::Method, None, param_names, body),
        is_static: true,
    })
}

pub fn generator_method(name: &str, param_names: &[&str], body: Vec<Statement>) -> ClassElement {
    let mut node = FunctionNode::clone(&function_node(FunctionKind::Method, None, param_names, body));
    node.is_generator = true;
    ClassElement::Method(ClassMethod {
        key: class_key(name),
        kind: MethodKind::Method,
        value: Rc::new(node),
        is_static: false,
    })
}

pub fn class_getter(name: &str, body: Vec<Statement>) -> ClassElement {
    ClassElement::Method(ClassMethod {
        key: class_key(name),
        kind: MethodKind::Get,
        value: function_node(FunctionKind::Getter, None, &[], body),
        is_static: false,
    })
}

pub fn class_setter(name: &str, param: &str, body: Vec<Statement>) -> ClassElement {
    ClassElement::Method(ClassMethod {
        key: class_key(name),
        kind: MethodKind::Set,
        value: function_node(FunctionKind::Setter, None, &[param], body),
        is_static: false,
    })
}

/// Class field; a leading `#` makes the name private.
pub fn field(name: &str, value: Option<Expression>) -> ClassElement {
    ClassElement::Field(ClassField {
        key: class_key(name),
        value,
        is_static: false,
    })
}

pub fn static_field(name: &str, value: Option<Expression>) -> ClassElement {
    ClassElement::Field(ClassField {
        key: class_key(name),
        value,
        is_static: true,
    })
}

pub fn static_block(body: Vec<Statement>) -> ClassElement {
    ClassElement::StaticBlock(body)
}

// Patterns

pub fn pat(name: &str) -> Pattern {
    Pattern::Identifier(name.to_string())
}

pub fn pat_default(pattern: Pattern, default: Expression) -> Pattern {
    Pattern::Assign(Box::new(pattern), Box::new(default))
}

pub fn rest(pattern: Pattern) -> Pattern {
    Pattern::Rest(Box::new(pattern))
}

pub fn array_pat(elements: Vec<Option<Pattern>>) -> Pattern {
    Pattern::Array(
        elements
            .into_iter()
            .map(|e| {
                e.map(|p| match p {
                    Pattern::Rest(inner) => ArrayPatternElement::Rest(*inner),
                    other => ArrayPatternElement::Pattern(other),
                })
            })
            .collect(),
    )
}

pub fn object_pat(props: Vec<(&str, Pattern)>) -> Pattern {
    Pattern::Object(
        props
            .into_iter()
            .map(|(key, p)| match p {
                Pattern::Rest(inner) => ObjectPatternProperty::Rest(*inner),
                Pattern::Identifier(ref n) if n == key => ObjectPatternProperty::Shorthand(n.clone()),
                other => ObjectPatternProperty::KeyValue(PropertyName::Identifier(key.to_string()), other),
            })
            .collect(),
    )
}

// Statements

pub fn expr_stmt(expr: Expression) -> Statement {
    Statement::Expression(expr)
}

pub fn decl(kind: VarKind, pattern: Pattern, init: Option<Expression>) -> Statement {
    Statement::Variable(VariableDeclaration {
        kind,
        declarations: vec![VariableDeclarator { pattern, init }],
    })
}

pub fn var(name: &str, init: Expression) -> Statement {
    decl(VarKind::Var, pat(name), Some(init))
}

pub fn var_decl(name: &str) -> Statement {
    decl(VarKind::Var, pat(name), None)
}

pub fn let_(name: &str, init: Expression) -> Statement {
    decl(VarKind::Let, pat(name), Some(init))
}

pub fn let_decl(name: &str) -> Statement {
    decl(VarKind::Let, pat(name), None)
}

pub fn const_(name: &str, init: Expression) -> Statement {
    decl(VarKind::Const, pat(name), Some(init))
}

pub fn ret(value: Expression) -> Statement {
    Statement::Return(Some(value))
}

pub fn ret_void() -> Statement {
    Statement::Return(None)
}

pub fn throw(value: Expression) -> Statement {
    Statement::Throw(value)
}

pub fn block(body: Vec<Statement>) -> Statement {
    Statement::Block(body)
}

pub fn if_(test: Expression, consequent: Statement, alternate: Option<Statement>) -> Statement {
    Statement::If(IfStatement {
        test,
        consequent: Box::new(consequent),
        alternate: alternate.map(Box::new),
    })
}

pub fn while_(test: Expression, body: Statement) -> Statement {
    Statement::While(WhileStatement {
        test,
        body: Box::new(body),
    })
}

pub fn do_while(body: Statement, test: Expression) -> Statement {
    Statement::DoWhile(DoWhileStatement {
        test,
        body: Box::new(body),
    })
}

pub fn for_(
    init: Option<Statement>,
    test: Option<Expression>,
    update: Option<Expression>,
    body: Statement,
) -> Statement {
    let init = init.map(|s| match s {
        Statement::Variable(decl) => ForInit::Variable(decl),
        Statement::Expression(e) => ForInit::Expression(e),
        _ => ForInit::Expression(undefined()),
    });
    Statement::For(ForStatement {
        init,
        test,
        update,
        body: Box::new(body),
    })
}

pub fn for_of(kind: VarKind, binding: Pattern, iterable: Expression, body: Statement) -> Statement {
    Statement::ForOf(ForOfStatement {
        left: ForInOfLeft::Variable(kind, binding),
        right: iterable,
        body: Box::new(body),
    })
}

pub fn for_in(kind: VarKind, binding: Pattern, object: Expression, body: Statement) -> Statement {
    Statement::ForIn(ForInStatement {
        left: ForInOfLeft::Variable(kind, binding),
        right: object,
        body: Box::new(body),
    })
}

pub fn break_(label: Option<&str>) -> Statement {
    Statement::Break(label.map(str::to_string))
}

pub fn continue_(label: Option<&str>) -> Statement {
    Statement::Continue(label.map(str::to_string))
}

pub fn labeled(label: &str, body: Statement) -> Statement {
    Statement::Labeled(label.to_string(), Box::new(body))
}

pub fn try_catch(body: Vec<Statement>, param: Option<&str>, handler: Vec<Statement>) -> Statement {
    Statement::Try(TryStatement {
        block: body,
        handler: Some(CatchClause {
            param: param.map(pat),
            body: handler,
        }),
        finalizer: None,
    })
}

pub fn try_finally(body: Vec<Statement>, finalizer: Vec<Statement>) -> Statement {
    Statement::Try(TryStatement {
        block: body,
        handler: None,
        finalizer: Some(finalizer),
    })
}

pub fn try_catch_finally(
    body: Vec<Statement>,
    param: Option<&str>,
    handler: Vec<Statement>,
    finalizer: Vec<Statement>,
) -> Statement {
    Statement::Try(TryStatement {
        block: body,
        handler: Some(CatchClause {
            param: param.map(pat),
            body: handler,
        }),
        finalizer: Some(finalizer),
    })
}

pub fn switch(discriminant: Expression, cases: Vec<SwitchCase>) -> Statement {
    Statement::Switch(SwitchStatement { discriminant, cases })
}

pub fn case(test: Expression, consequent: Vec<Statement>) -> SwitchCase {
    SwitchCase {
        test: Some(test),
        consequent,
    }
}

pub fn default_case(consequent: Vec<Statement>) -> SwitchCase {
    SwitchCase {
        test: None,
        consequent,
    }
}

pub fn with(object: Expression, body: Statement) -> Statement {
    Statement::With(object, Box::new(body))
}

pub fn use_strict() -> Statement {
    expr_stmt(string("use strict"))
}
