//! Static semantics over statement lists (§8.2 Scope Analysis).
//!
//! These walk the tree without evaluating it; declaration instantiation
//! uses them to learn which bindings a scope creates before its code runs.

use super::*;

/// A declaration that creates a `var`-scoped binding.
pub(crate) enum VarScopedDeclaration<'a> {
    Variable(&'a Pattern),
    Function(&'a Rc<FunctionNode>),
}

/// A declaration that creates a lexically scoped binding.
pub(crate) enum LexicalDeclaration<'a> {
    Variable(VarKind, &'a Pattern),
    Class(&'a Rc<ClassNode>),
    Function(&'a Rc<FunctionNode>),
}

impl LexicalDeclaration<'_> {
    // §8.2.3 IsConstantDeclaration
    pub(crate) fn is_constant(&self) -> bool {
        matches!(self, LexicalDeclaration::Variable(VarKind::Const, _))
    }

    pub(crate) fn bound_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        match self {
            LexicalDeclaration::Variable(_, pattern) => bound_names(pattern, &mut out),
            LexicalDeclaration::Class(class) => out.push(class.name.clone().unwrap_or_else(|| "default".into())),
            LexicalDeclaration::Function(f) => out.push(f.name.clone().unwrap_or_else(|| "default".into())),
        }
        out
    }
}

// §8.2.1 BoundNames
pub(crate) fn bound_names(pattern: &Pattern, out: &mut Vec<String>) {
    match pattern {
        Pattern::Identifier(name) => out.push(name.clone()),
        Pattern::Array(elements) => {
            for element in elements.iter().flatten() {
                match element {
                    ArrayPatternElement::Pattern(p) | ArrayPatternElement::Rest(p) => bound_names(p, out),
                }
            }
        }
        Pattern::Object(props) => {
            for prop in props {
                match prop {
                    ObjectPatternProperty::KeyValue(_, p) | ObjectPatternProperty::Rest(p) => bound_names(p, out),
                    ObjectPatternProperty::Shorthand(name) => out.push(name.clone()),
                }
            }
        }
        Pattern::Assign(target, _) | Pattern::Rest(target) => bound_names(target, out),
        Pattern::MemberExpression(_) => {}
    }
}

/// Top-level VarDeclaredNames of a script or function body, deduplicated
/// in source order.
pub(crate) fn var_declared_names(body: &[Statement]) -> Vec<String> {
    let mut names = Vec::new();
    for decl in var_scoped_declarations(body) {
        let before = names.len();
        match decl {
            VarScopedDeclaration::Variable(p) => bound_names(p, &mut names),
            VarScopedDeclaration::Function(f) => names.push(f.name.clone().unwrap_or_default()),
        }
        let mut i = before;
        while i < names.len() {
            if names[..before].contains(&names[i]) || names[before..i].contains(&names[i]) {
                names.remove(i);
            } else {
                i += 1;
            }
        }
    }
    names
}

/// TopLevelVarScopedDeclarations: function declarations directly in the
/// body (or under labels) plus every `var` not nested in another function.
pub(crate) fn var_scoped_declarations(body: &[Statement]) -> Vec<VarScopedDeclaration<'_>> {
    let mut out = Vec::new();
    for stmt in body {
        top_level_var_scoped(stmt, &mut out);
    }
    out
}

fn top_level_var_scoped<'a>(stmt: &'a Statement, out: &mut Vec<VarScopedDeclaration<'a>>) {
    match stmt {
        Statement::FunctionDeclaration(f) => out.push(VarScopedDeclaration::Function(f)),
        Statement::Labeled(_, inner) => top_level_var_scoped(inner, out),
        other => nested_var_scoped(other, out),
    }
}

// §8.2.7 VarScopedDeclarations
fn nested_var_scoped<'a>(stmt: &'a Statement, out: &mut Vec<VarScopedDeclaration<'a>>) {
    match stmt {
        Statement::Variable(decl) if decl.kind == VarKind::Var => {
            for d in &decl.declarations {
                out.push(VarScopedDeclaration::Variable(&d.pattern));
            }
        }
        Statement::Block(stmts) => stmts.iter().for_each(|s| nested_var_scoped(s, out)),
        Statement::If(s) => {
            nested_var_scoped(&s.consequent, out);
            if let Some(alt) = &s.alternate {
                nested_var_scoped(alt, out);
            }
        }
        Statement::While(s) => nested_var_scoped(&s.body, out),
        Statement::DoWhile(s) => nested_var_scoped(&s.body, out),
        Statement::For(s) => {
            if let Some(ForInit::Variable(decl)) = &s.init
                && decl.kind == VarKind::Var
            {
                for d in &decl.declarations {
                    out.push(VarScopedDeclaration::Variable(&d.pattern));
                }
            }
            nested_var_scoped(&s.body, out);
        }
        Statement::ForIn(ForInStatement { left, body, .. }) | Statement::ForOf(ForOfStatement { left, body, .. }) => {
            if let ForInOfLeft::Variable(VarKind::Var, pattern) = left {
                out.push(VarScopedDeclaration::Variable(pattern));
            }
            nested_var_scoped(body, out);
        }
        Statement::Try(s) => {
            s.block.iter().for_each(|st| nested_var_scoped(st, out));
            if let Some(handler) = &s.handler {
                handler.body.iter().for_each(|st| nested_var_scoped(st, out));
            }
            if let Some(finalizer) = &s.finalizer {
                finalizer.iter().for_each(|st| nested_var_scoped(st, out));
            }
        }
        Statement::Switch(s) => {
            for case in &s.cases {
                case.consequent.iter().for_each(|st| nested_var_scoped(st, out));
            }
        }
        Statement::Labeled(_, inner) | Statement::With(_, inner) => nested_var_scoped(inner, out),
        _ => {}
    }
}

/// LexicallyScopedDeclarations of a statement list. At the top level of a
/// script or function body, function declarations are var-scoped instead.
pub(crate) fn lexically_scoped_declarations(body: &[Statement], top_level: bool) -> Vec<LexicalDeclaration<'_>> {
    let mut out = Vec::new();
    for stmt in body {
        lexical_declaration_of(stmt, top_level, &mut out);
    }
    out
}

fn lexical_declaration_of<'a>(stmt: &'a Statement, top_level: bool, out: &mut Vec<LexicalDeclaration<'a>>) {
    match stmt {
        Statement::Variable(decl) if decl.kind != VarKind::Var => {
            for d in &decl.declarations {
                out.push(LexicalDeclaration::Variable(decl.kind, &d.pattern));
            }
        }
        Statement::ClassDeclaration(c) => out.push(LexicalDeclaration::Class(c)),
        Statement::FunctionDeclaration(f) if !top_level => out.push(LexicalDeclaration::Function(f)),
        Statement::Labeled(_, inner) => lexical_declaration_of(inner, top_level, out),
        _ => {}
    }
}

// §8.2.4 LexicallyDeclaredNames
pub(crate) fn lexically_declared_names(body: &[Statement], top_level: bool) -> Vec<String> {
    lexically_scoped_declarations(body, top_level)
        .iter()
        .flat_map(LexicalDeclaration::bound_names)
        .collect()
}

/// The consequents of all clauses of a switch share one block scope.
pub(crate) fn case_block_declarations(cases: &[SwitchCase]) -> Vec<LexicalDeclaration<'_>> {
    let mut out = Vec::new();
    for case in cases {
        for stmt in &case.consequent {
            lexical_declaration_of(stmt, false, &mut out);
        }
    }
    out
}

// §15.1.3 IsSimpleParameterList
pub(crate) fn is_simple_parameter_list(params: &[Pattern]) -> bool {
    params.iter().all(|p| matches!(p, Pattern::Identifier(_)))
}

// §8.5.1 ContainsExpression
pub(crate) fn contains_expression(params: &[Pattern]) -> bool {
    params.iter().any(pattern_contains_expression)
}

fn pattern_contains_expression(pattern: &Pattern) -> bool {
    match pattern {
        Pattern::Identifier(_) | Pattern::MemberExpression(_) => false,
        Pattern::Assign(..) => true,
        Pattern::Rest(inner) => pattern_contains_expression(inner),
        Pattern::Array(elements) => elements.iter().flatten().any(|e| match e {
            ArrayPatternElement::Pattern(p) | ArrayPatternElement::Rest(p) => pattern_contains_expression(p),
        }),
        Pattern::Object(props) => props.iter().any(|p| match p {
            ObjectPatternProperty::KeyValue(PropertyName::Computed(_), _) => true,
            ObjectPatternProperty::KeyValue(_, p) | ObjectPatternProperty::Rest(p) => pattern_contains_expression(p),
            ObjectPatternProperty::Shorthand(_) => false,
        }),
    }
}

/// Whether the directive prologue of `body` contains `"use strict"`.
pub(crate) fn has_use_strict_directive(body: &[Statement]) -> bool {
    for stmt in body {
        match stmt {
            Statement::Expression(Expression::Literal(Literal::String(s))) => {
                if s == "use strict" {
                    return true;
                }
            }
            _ => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;

    #[test]
    fn var_names_cross_blocks_but_not_functions() {
        let body = vec![
            var_decl("a"),
            block(vec![var_decl("b"), let_decl("c")]),
            function_decl("f", &[], vec![var_decl("inner")]),
            if_(num(1.0), var_decl("a"), None),
        ];
        assert_eq!(var_declared_names(&body), vec!["a", "b", "f"]);
        assert_eq!(lexically_declared_names(&body, true), Vec::<String>::new());
    }

    #[test]
    fn block_functions_are_lexical() {
        let body = vec![function_decl("g", &[], vec![]), let_decl("x")];
        let names = lexically_declared_names(&body, false);
        assert_eq!(names, vec!["g", "x"]);
    }

    #[test]
    fn parameter_list_shapes() {
        let simple = vec![pat("a"), pat("b")];
        assert!(is_simple_parameter_list(&simple));
        assert!(!contains_expression(&simple));

        let defaulted = vec![Pattern::Assign(Box::new(pat("a")), Box::new(num(1.0)))];
        assert!(!is_simple_parameter_list(&defaulted));
        assert!(contains_expression(&defaulted));

        let rest = vec![Pattern::Rest(Box::new(pat("r")))];
        assert!(!is_simple_parameter_list(&rest));
        assert!(!contains_expression(&rest));
    }

    #[test]
    fn directive_prologue_stops_at_first_non_string() {
        assert!(has_use_strict_directive(&[expr_stmt(string("use strict"))]));
        assert!(has_use_strict_directive(&[
            expr_stmt(string("other")),
            expr_stmt(string("use strict"))
        ]));
        assert!(!has_use_strict_directive(&[expr_stmt(num(1.0)), expr_stmt(string("use strict"))]));
    }
}
