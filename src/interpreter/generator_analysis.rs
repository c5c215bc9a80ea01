//! Yield detection over generator bodies.
//!
//! Only code that can actually suspend needs lowering; everything else in a
//! generator body is handed to the ordinary tree walker. The walks stop at
//! nested function boundaries, since a `yield` there belongs to another
//! generator. Class bodies are opaque too: computed keys and heritage are
//! the only places a yield could hide, and those are not lowered.

use crate::ast::*;

pub(crate) fn contains_yield(stmt: &Statement) -> bool {
    match stmt {
        Statement::Empty
        | Statement::Debugger
        | Statement::Break(_)
        | Statement::Continue(_)
        | Statement::FunctionDeclaration(_) => false,
        Statement::ClassDeclaration(_) => false,
        Statement::Expression(e) | Statement::Throw(e) => expr_contains_yield(e),
        Statement::Return(e) => e.as_ref().is_some_and(expr_contains_yield),
        Statement::Block(stmts) => stmts.iter().any(contains_yield),
        Statement::Variable(decl) => declaration_contains_yield(decl),
        Statement::If(s) => {
            expr_contains_yield(&s.test)
                || contains_yield(&s.consequent)
                || s.alternate.as_deref().is_some_and(contains_yield)
        }
        Statement::While(s) => expr_contains_yield(&s.test) || contains_yield(&s.body),
        Statement::DoWhile(s) => expr_contains_yield(&s.test) || contains_yield(&s.body),
        Statement::For(s) => {
            let init = match &s.init {
                Some(ForInit::Variable(decl)) => declaration_contains_yield(decl),
                Some(ForInit::Expression(e)) => expr_contains_yield(e),
                None => false,
            };
            init || s.test.as_ref().is_some_and(expr_contains_yield)
                || s.update.as_ref().is_some_and(expr_contains_yield)
                || contains_yield(&s.body)
        }
        Statement::ForIn(s) => {
            left_contains_yield(&s.left) || expr_contains_yield(&s.right) || contains_yield(&s.body)
        }
        Statement::ForOf(s) => {
            left_contains_yield(&s.left) || expr_contains_yield(&s.right) || contains_yield(&s.body)
        }
        Statement::Try(s) => {
            s.block.iter().any(contains_yield)
                || s.handler.as_ref().is_some_and(|h| {
                    h.param.as_ref().is_some_and(pattern_contains_yield) || h.body.iter().any(contains_yield)
                })
                || s.finalizer.as_ref().is_some_and(|f| f.iter().any(contains_yield))
        }
        Statement::Switch(s) => {
            expr_contains_yield(&s.discriminant)
                || s.cases.iter().any(|c| {
                    c.test.as_ref().is_some_and(expr_contains_yield) || c.consequent.iter().any(contains_yield)
                })
        }
        Statement::Labeled(_, body) => contains_yield(body),
        Statement::With(object, body) => expr_contains_yield(object) || contains_yield(body),
    }
}

fn declaration_contains_yield(decl: &VariableDeclaration) -> bool {
    decl.declarations
        .iter()
        .any(|d| pattern_contains_yield(&d.pattern) || d.init.as_ref().is_some_and(expr_contains_yield))
}

fn left_contains_yield(left: &ForInOfLeft) -> bool {
    match left {
        ForInOfLeft::Variable(_, p) | ForInOfLeft::Pattern(p) => pattern_contains_yield(p),
    }
}

pub(crate) fn pattern_contains_yield(pattern: &Pattern) -> bool {
    match pattern {
        Pattern::Identifier(_) => false,
        Pattern::Array(elements) => elements.iter().flatten().any(|e| match e {
            ArrayPatternElement::Pattern(p) | ArrayPatternElement::Rest(p) => pattern_contains_yield(p),
        }),
        Pattern::Object(props) => props.iter().any(|p| match p {
            ObjectPatternProperty::KeyValue(key, value) => {
                property_name_contains_yield(key) || pattern_contains_yield(value)
            }
            ObjectPatternProperty::Shorthand(_) => false,
            ObjectPatternProperty::Rest(p) => pattern_contains_yield(p),
        }),
        Pattern::Assign(target, default) => pattern_contains_yield(target) || expr_contains_yield(default),
        Pattern::Rest(p) => pattern_contains_yield(p),
        Pattern::MemberExpression(e) => expr_contains_yield(e),
    }
}

fn property_name_contains_yield(name: &PropertyName) -> bool {
    matches!(name, PropertyName::Computed(e) if expr_contains_yield(e))
}

fn member_contains_yield(property: &MemberProperty) -> bool {
    matches!(property, MemberProperty::Computed(e) if expr_contains_yield(e))
}

pub(crate) fn expr_contains_yield(expr: &Expression) -> bool {
    match expr {
        Expression::Yield(..) => true,
        Expression::Literal(_)
        | Expression::Identifier(_)
        | Expression::This
        | Expression::NewTarget
        | Expression::Function(_)
        | Expression::ArrowFunction(_)
        | Expression::Class(_) => false,
        Expression::Array(elements) => elements.iter().flatten().any(expr_contains_yield),
        Expression::Object(props) => props.iter().any(|p| match p {
            PropertyDefinition::KeyValue(key, value) => property_name_contains_yield(key) || expr_contains_yield(value),
            PropertyDefinition::Shorthand(_) => false,
            PropertyDefinition::Method(key, ..) => property_name_contains_yield(key),
            PropertyDefinition::Spread(e) => expr_contains_yield(e),
        }),
        Expression::Unary(_, e)
        | Expression::Update(_, _, e)
        | Expression::Spread(e)
        | Expression::Typeof(e)
        | Expression::Void(e)
        | Expression::Delete(e)
        | Expression::OptionalChain(e)
        | Expression::PrivateIn(_, e) => expr_contains_yield(e),
        Expression::Binary(_, l, r) | Expression::Logical(_, l, r) => expr_contains_yield(l) || expr_contains_yield(r),
        Expression::Assign(_, target, value) => pattern_contains_yield(target) || expr_contains_yield(value),
        Expression::Conditional(t, a, b) => expr_contains_yield(t) || expr_contains_yield(a) || expr_contains_yield(b),
        Expression::Call(callee, args)
        | Expression::New(callee, args)
        | Expression::OptionalCall(callee, args) => expr_contains_yield(callee) || args.iter().any(expr_contains_yield),
        Expression::Member(object, property) | Expression::OptionalMember(object, property) => {
            expr_contains_yield(object) || member_contains_yield(property)
        }
        Expression::SuperMember(property) => member_contains_yield(property),
        Expression::SuperCall(args) => args.iter().any(expr_contains_yield),
        Expression::TaggedTemplate(tag, template) => {
            expr_contains_yield(tag) || template.expressions.iter().any(expr_contains_yield)
        }
        Expression::Template(template) => template.expressions.iter().any(expr_contains_yield),
        Expression::Sequence(exprs) => exprs.iter().any(expr_contains_yield),
    }
}
