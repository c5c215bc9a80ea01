//! Lowering of generator bodies into resumable programs.
//!
//! A generator body becomes a flat list of [`Op`]s addressed by index. Only
//! statements that contain a `yield` are taken apart; every other statement
//! is kept whole as [`Op::Exec`] and runs on the tree walker. Inside an
//! expression that yields, operands evaluated before the yield are spilled
//! into temporaries so the remaining expression can be finished once the
//! generator is resumed. Temporaries are bindings named `%tN` in a
//! declarative environment owned by the generator; no identifier can spell
//! that name.
//!
//! Structured control flow (scopes, loops, labels, `try`) is expressed with
//! enter/exit ops that push and pop entries on the generator's block stack.
//! The runtime unwinds that stack for abrupt completions.

use super::generator_analysis::{contains_yield, expr_contains_yield, pattern_contains_yield};
use super::*;

pub(crate) type Temp = usize;

const UNPATCHED: usize = usize::MAX;

pub(crate) fn temp_name(t: Temp) -> String {
    format!("%t{t}")
}

fn temp_ident(t: Temp) -> Expression {
    Expression::Identifier(temp_name(t))
}

/// What an unlabelled `break` or `continue` may target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TargetKind {
    Loop,
    Switch,
    /// A labelled statement other than a loop or switch.
    Label,
}

#[derive(Debug)]
pub(crate) enum Op {
    /// Runs a statement that cannot suspend.
    Exec(Statement),
    /// Evaluates an expression, storing the value in a temporary if given.
    Eval(Expression, Option<Temp>),
    Jump(usize),
    JumpIfFalse(Expression, usize),
    JumpIfTrue(Expression, usize),
    JumpIfNotNullish(Temp, usize),
    /// Jumps when the temporary is strictly equal to the expression's value.
    JumpIfStrictEqual(Temp, Expression, usize),
    /// Suspends with the value; the value sent on resumption lands in `resume`.
    Yield { value: Option<Expression>, resume: Temp },
    /// Delegates to the iterator of `iterable`; its final value lands in `resume`.
    YieldStar { iterable: Expression, resume: Temp },
    /// Opens a block scope holding the lexical declarations of `body`.
    EnterBlock(Vec<Statement>),
    EnterWith(Expression),
    /// Opens the scope of a `for (let ...; ...; ...)` head.
    EnterLoopScope { names: Vec<String>, constant: bool },
    CopyIterationScope(Vec<String>),
    ExitScope,
    EnterTarget {
        labels: Vec<String>,
        kind: TargetKind,
        break_to: usize,
        continue_to: usize,
    },
    ExitTarget,
    EnterTry { catch: Option<usize>, finally: Option<usize> },
    /// Leaves a protected region normally, through its `finally` if any.
    ExitTry { after: usize },
    /// Binds the caught exception at the start of a `catch` clause.
    BindCatch(Option<Pattern>),
    /// Ends a `finally` body by resuming whatever completion entered it.
    EndFinally,
    GetIterator(Expression),
    /// Starts a `for-in` enumeration, jumping to `skip` for null or undefined.
    EnumerateStart { object: Expression, skip: usize },
    /// Advances the innermost loop iterator, jumping to `done` when exhausted.
    IteratorStep { done: usize, value: Temp },
    BindLoopTarget { left: ForInOfLeft, value: Temp },
    /// Drops an exhausted loop iterator.
    PopIterator,
    /// Drops a loop iterator after `break`, calling its `return` method.
    CloseIterator,
}

/// A lowered generator body.
#[derive(Debug)]
pub(crate) struct GeneratorProgram {
    pub(crate) ops: Vec<Op>,
    /// Number of temporaries the program uses.
    pub(crate) temps: usize,
}

pub(crate) fn lower_generator_body(body: &[Statement]) -> EngineResult<GeneratorProgram> {
    let mut lowering = Lowering::default();
    lowering.statements(body)?;
    Ok(GeneratorProgram {
        ops: lowering.ops,
        temps: lowering.temps,
    })
}

fn unsupported<T>(what: &'static str) -> EngineResult<T> {
    Err(EngineError::Unsupported(what))
}

#[derive(Default)]
struct Lowering {
    ops: Vec<Op>,
    temps: usize,
}

impl Lowering {
    fn emit(&mut self, op: Op) -> usize {
        self.ops.push(op);
        self.ops.len() - 1
    }

    fn here(&self) -> usize {
        self.ops.len()
    }

    fn temp(&mut self) -> Temp {
        self.temps += 1;
        self.temps - 1
    }

    /// Points the jump of the op at `at` to `target`.
    fn patch(&mut self, at: usize, target: usize) {
        match &mut self.ops[at] {
            Op::Jump(t)
            | Op::JumpIfFalse(_, t)
            | Op::JumpIfTrue(_, t)
            | Op::JumpIfNotNullish(_, t)
            | Op::JumpIfStrictEqual(_, _, t)
            | Op::ExitTry { after: t }
            | Op::EnumerateStart { skip: t, .. }
            | Op::IteratorStep { done: t, .. } => *t = target,
            _ => {}
        }
    }

    fn patch_target(&mut self, at: usize, break_target: usize, continue_target: usize) {
        if let Op::EnterTarget {
            break_to, continue_to, ..
        } = &mut self.ops[at]
        {
            *break_to = break_target;
            *continue_to = continue_target;
        }
    }

    // ---- Statements ----

    fn statements(&mut self, stmts: &[Statement]) -> EngineResult<()> {
        for stmt in stmts {
            self.statement(stmt, Vec::new())?;
        }
        Ok(())
    }

    fn block(&mut self, stmts: &[Statement]) -> EngineResult<()> {
        let scoped = !lexically_scoped_declarations(stmts, false).is_empty();
        if scoped {
            self.emit(Op::EnterBlock(stmts.to_vec()));
        }
        self.statements(stmts)?;
        if scoped {
            self.emit(Op::ExitScope);
        }
        Ok(())
    }

    fn statement(&mut self, stmt: &Statement, labels: Vec<String>) -> EngineResult<()> {
        if !contains_yield(stmt) {
            let stmt = labels
                .into_iter()
                .rev()
                .fold(stmt.clone(), |body, label| Statement::Labeled(label, Box::new(body)));
            self.emit(Op::Exec(stmt));
            return Ok(());
        }
        match stmt {
            Statement::Expression(e) => {
                let e = self.expression(e)?;
                self.emit(Op::Eval(e, None));
            }
            Statement::Variable(decl) => {
                for d in &decl.declarations {
                    if pattern_contains_yield(&d.pattern) {
                        return unsupported("yield inside a binding pattern");
                    }
                    let init = d.init.as_ref().map(|e| self.expression(e)).transpose()?;
                    self.emit(Op::Exec(Statement::Variable(VariableDeclaration {
                        kind: decl.kind,
                        declarations: vec![VariableDeclarator {
                            pattern: d.pattern.clone(),
                            init,
                        }],
                    })));
                }
            }
            Statement::Return(e) => {
                let e = e.as_ref().map(|e| self.expression(e)).transpose()?;
                self.emit(Op::Exec(Statement::Return(e)));
            }
            Statement::Throw(e) => {
                let e = self.expression(e)?;
                self.emit(Op::Exec(Statement::Throw(e)));
            }
            Statement::Block(stmts) => self.block(stmts)?,
            Statement::If(s) => {
                let test = self.expression(&s.test)?;
                let skip = self.emit(Op::JumpIfFalse(test, UNPATCHED));
                self.statement(&s.consequent, Vec::new())?;
                match &s.alternate {
                    Some(alternate) => {
                        let end = self.emit(Op::Jump(UNPATCHED));
                        self.patch(skip, self.here());
                        self.statement(alternate, Vec::new())?;
                        self.patch(end, self.here());
                    }
                    None => self.patch(skip, self.here()),
                }
            }
            Statement::While(s) => {
                let target = self.enter_target(labels, TargetKind::Loop);
                let top = self.here();
                let test = self.expression(&s.test)?;
                let exit = self.emit(Op::JumpIfFalse(test, UNPATCHED));
                self.statement(&s.body, Vec::new())?;
                self.emit(Op::Jump(top));
                self.patch(exit, self.here());
                self.emit(Op::ExitTarget);
                self.patch_target(target, self.here(), top);
            }
            Statement::DoWhile(s) => {
                let target = self.enter_target(labels, TargetKind::Loop);
                let top = self.here();
                self.statement(&s.body, Vec::new())?;
                let next = self.here();
                let test = self.expression(&s.test)?;
                self.emit(Op::JumpIfTrue(test, top));
                self.emit(Op::ExitTarget);
                self.patch_target(target, self.here(), next);
            }
            Statement::For(s) => self.for_statement(s, labels)?,
            Statement::ForIn(s) => {
                if left_has_yield(&s.left) {
                    return unsupported("yield inside a for-in binding");
                }
                let object = self.expression(&s.right)?;
                let start = self.emit(Op::EnumerateStart {
                    object,
                    skip: UNPATCHED,
                });
                self.iteration(&s.left, &s.body, labels)?;
                self.patch(start, self.here());
            }
            Statement::ForOf(s) => {
                if left_has_yield(&s.left) {
                    return unsupported("yield inside a for-of binding");
                }
                let iterable = self.expression(&s.right)?;
                self.emit(Op::GetIterator(iterable));
                self.iteration(&s.left, &s.body, labels)?;
            }
            Statement::Switch(s) => self.switch_statement(s, labels)?,
            Statement::Labeled(label, body) => {
                let mut labels = labels;
                labels.push(label.clone());
                match body.as_ref() {
                    Statement::While(_)
                    | Statement::DoWhile(_)
                    | Statement::For(_)
                    | Statement::ForIn(_)
                    | Statement::ForOf(_)
                    | Statement::Switch(_)
                    | Statement::Labeled(..) => self.statement(body, labels)?,
                    other => {
                        let target = self.enter_target(labels, TargetKind::Label);
                        self.statement(other, Vec::new())?;
                        self.emit(Op::ExitTarget);
                        self.patch_target(target, self.here(), UNPATCHED);
                    }
                }
            }
            Statement::Try(s) => self.try_statement(s)?,
            Statement::With(object, body) => {
                let object = self.expression(object)?;
                self.emit(Op::EnterWith(object));
                self.statement(body, Vec::new())?;
                self.emit(Op::ExitScope);
            }
            Statement::Empty
            | Statement::Debugger
            | Statement::Break(_)
            | Statement::Continue(_)
            | Statement::FunctionDeclaration(_)
            | Statement::ClassDeclaration(_) => {
                return Err(EngineError::Internal("statement without a yield reached lowering"));
            }
        }
        Ok(())
    }

    fn enter_target(&mut self, labels: Vec<String>, kind: TargetKind) -> usize {
        self.emit(Op::EnterTarget {
            labels,
            kind,
            break_to: UNPATCHED,
            continue_to: UNPATCHED,
        })
    }

    fn for_statement(&mut self, s: &ForStatement, labels: Vec<String>) -> EngineResult<()> {
        let mut per_iteration = Vec::new();
        let mut scoped = false;
        match &s.init {
            Some(ForInit::Variable(decl)) => {
                if decl.kind != VarKind::Var {
                    let mut names = Vec::new();
                    for d in &decl.declarations {
                        bound_names(&d.pattern, &mut names);
                    }
                    let constant = decl.kind == VarKind::Const;
                    if !constant {
                        per_iteration = names.clone();
                    }
                    self.emit(Op::EnterLoopScope { names, constant });
                    scoped = true;
                }
                self.statement(&Statement::Variable(decl.clone()), Vec::new())?;
            }
            Some(ForInit::Expression(e)) => {
                let e = self.expression(e)?;
                self.emit(Op::Eval(e, None));
            }
            None => {}
        }
        if !per_iteration.is_empty() {
            self.emit(Op::CopyIterationScope(per_iteration.clone()));
        }
        let target = self.enter_target(labels, TargetKind::Loop);
        let top = self.here();
        let exit = match &s.test {
            Some(test) => {
                let test = self.expression(test)?;
                Some(self.emit(Op::JumpIfFalse(test, UNPATCHED)))
            }
            None => None,
        };
        self.statement(&s.body, Vec::new())?;
        let next = self.here();
        if !per_iteration.is_empty() {
            self.emit(Op::CopyIterationScope(per_iteration));
        }
        if let Some(update) = &s.update {
            let update = self.expression(update)?;
            self.emit(Op::Eval(update, None));
        }
        self.emit(Op::Jump(top));
        if let Some(exit) = exit {
            self.patch(exit, self.here());
        }
        self.emit(Op::ExitTarget);
        self.patch_target(target, self.here(), next);
        if scoped {
            self.emit(Op::ExitScope);
        }
        Ok(())
    }

    /// The loop shared by `for-in` and `for-of`, once the iterator is on the
    /// block stack.
    fn iteration(&mut self, left: &ForInOfLeft, body: &Statement, labels: Vec<String>) -> EngineResult<()> {
        let target = self.enter_target(labels, TargetKind::Loop);
        let top = self.here();
        let value = self.temp();
        let step = self.emit(Op::IteratorStep {
            done: UNPATCHED,
            value,
        });
        self.emit(Op::BindLoopTarget {
            left: left.clone(),
            value,
        });
        self.statement(body, Vec::new())?;
        if matches!(left, ForInOfLeft::Variable(kind, _) if *kind != VarKind::Var) {
            self.emit(Op::ExitScope);
        }
        self.emit(Op::Jump(top));
        self.patch(step, self.here());
        self.emit(Op::ExitTarget);
        self.emit(Op::PopIterator);
        let end = self.emit(Op::Jump(UNPATCHED));
        let close = self.emit(Op::CloseIterator);
        self.patch(end, self.here());
        self.patch_target(target, close, top);
        Ok(())
    }

    fn switch_statement(&mut self, s: &SwitchStatement, labels: Vec<String>) -> EngineResult<()> {
        let discriminant = self.expression(&s.discriminant)?;
        let d = self.temp();
        self.emit(Op::Eval(discriminant, Some(d)));
        let scoped = !case_block_declarations(&s.cases).is_empty();
        if scoped {
            let body = s.cases.iter().flat_map(|c| c.consequent.iter().cloned()).collect();
            self.emit(Op::EnterBlock(body));
        }
        let target = self.enter_target(labels, TargetKind::Switch);
        let mut case_jumps = Vec::new();
        for (i, case) in s.cases.iter().enumerate() {
            if let Some(test) = &case.test {
                let test = self.expression(test)?;
                case_jumps.push((i, self.emit(Op::JumpIfStrictEqual(d, test, UNPATCHED))));
            }
        }
        let fallback = self.emit(Op::Jump(UNPATCHED));
        let mut starts = Vec::with_capacity(s.cases.len());
        for case in &s.cases {
            starts.push(self.here());
            self.statements(&case.consequent)?;
        }
        let exit = self.emit(Op::ExitTarget);
        for (i, jump) in case_jumps {
            self.patch(jump, starts[i]);
        }
        let default = s.cases.iter().position(|c| c.test.is_none());
        self.patch(fallback, default.map_or(exit, |i| starts[i]));
        self.patch_target(target, self.here(), UNPATCHED);
        if scoped {
            self.emit(Op::ExitScope);
        }
        Ok(())
    }

    fn try_statement(&mut self, s: &TryStatement) -> EngineResult<()> {
        let enter = self.emit(Op::EnterTry {
            catch: None,
            finally: None,
        });
        self.block(&s.block)?;
        let mut exits = vec![self.emit(Op::ExitTry { after: UNPATCHED })];
        let catch = match &s.handler {
            Some(handler) => {
                let start = self.here();
                if handler.param.as_ref().is_some_and(pattern_contains_yield) {
                    return unsupported("yield inside a catch parameter");
                }
                self.emit(Op::BindCatch(handler.param.clone()));
                self.block(&handler.body)?;
                if handler.param.is_some() {
                    self.emit(Op::ExitScope);
                }
                exits.push(self.emit(Op::ExitTry { after: UNPATCHED }));
                Some(start)
            }
            None => None,
        };
        let finally = match &s.finalizer {
            Some(finalizer) => {
                let start = self.here();
                self.block(finalizer)?;
                self.emit(Op::EndFinally);
                Some(start)
            }
            None => None,
        };
        let after = self.here();
        for exit in exits {
            self.patch(exit, after);
        }
        if let Op::EnterTry {
            catch: c,
            finally: f,
        } = &mut self.ops[enter]
        {
            *c = catch;
            *f = finally;
        }
        Ok(())
    }

    // ---- Expressions ----

    /// Emits the ops for the suspending parts of `expr` and returns an
    /// equivalent expression that no longer yields.
    fn expression(&mut self, expr: &Expression) -> EngineResult<Expression> {
        if !expr_contains_yield(expr) {
            return Ok(expr.clone());
        }
        Ok(match expr {
            Expression::Yield(argument, false) => {
                let value = argument.as_deref().map(|e| self.expression(e)).transpose()?;
                let resume = self.temp();
                self.emit(Op::Yield { value, resume });
                temp_ident(resume)
            }
            Expression::Yield(argument, true) => {
                let iterable = match argument.as_deref() {
                    Some(e) => self.expression(e)?,
                    None => Expression::Identifier("undefined".into()),
                };
                let resume = self.temp();
                self.emit(Op::YieldStar { iterable, resume });
                temp_ident(resume)
            }
            Expression::Binary(op, left, right) => {
                let mut parts = self.operands(&[left.as_ref(), right.as_ref()])?.into_iter();
                let (Some(left), Some(right)) = (parts.next(), parts.next()) else {
                    return Err(EngineError::Internal("operand count"));
                };
                Expression::Binary(*op, Box::new(left), Box::new(right))
            }
            Expression::Logical(op, left, right) if expr_contains_yield(right) => {
                let result = self.temp();
                let left = self.expression(left)?;
                self.emit(Op::Eval(left, Some(result)));
                let skip = match op {
                    LogicalOp::And => self.emit(Op::JumpIfFalse(temp_ident(result), UNPATCHED)),
                    LogicalOp::Or => self.emit(Op::JumpIfTrue(temp_ident(result), UNPATCHED)),
                    LogicalOp::NullishCoalescing => self.emit(Op::JumpIfNotNullish(result, UNPATCHED)),
                };
                let right = self.expression(right)?;
                self.emit(Op::Eval(right, Some(result)));
                self.patch(skip, self.here());
                temp_ident(result)
            }
            Expression::Logical(op, left, right) => {
                Expression::Logical(*op, Box::new(self.expression(left)?), right.clone())
            }
            Expression::Conditional(test, consequent, alternate)
                if expr_contains_yield(consequent) || expr_contains_yield(alternate) =>
            {
                let result = self.temp();
                let test = self.expression(test)?;
                let skip = self.emit(Op::JumpIfFalse(test, UNPATCHED));
                let consequent = self.expression(consequent)?;
                self.emit(Op::Eval(consequent, Some(result)));
                let end = self.emit(Op::Jump(UNPATCHED));
                self.patch(skip, self.here());
                let alternate = self.expression(alternate)?;
                self.emit(Op::Eval(alternate, Some(result)));
                self.patch(end, self.here());
                temp_ident(result)
            }
            Expression::Conditional(test, consequent, alternate) => Expression::Conditional(
                Box::new(self.expression(test)?),
                consequent.clone(),
                alternate.clone(),
            ),
            Expression::Unary(op, e) => Expression::Unary(*op, Box::new(self.expression(e)?)),
            Expression::Typeof(e) => Expression::Typeof(Box::new(self.expression(e)?)),
            Expression::Void(e) => Expression::Void(Box::new(self.expression(e)?)),
            Expression::Spread(e) => Expression::Spread(Box::new(self.expression(e)?)),
            Expression::PrivateIn(name, e) => Expression::PrivateIn(name.clone(), Box::new(self.expression(e)?)),
            Expression::Delete(e) => Expression::Delete(Box::new(self.reference(e)?)),
            Expression::Update(op, prefix, e) => Expression::Update(*op, *prefix, Box::new(self.reference(e)?)),
            Expression::Member(..) => self.reference(expr)?,
            Expression::SuperMember(MemberProperty::Computed(key)) => {
                Expression::SuperMember(MemberProperty::Computed(Box::new(self.expression(key)?)))
            }
            Expression::Call(callee, args) => self.call(callee, args)?,
            Expression::New(callee, args) => {
                let mut all: Vec<&Expression> = vec![callee.as_ref()];
                all.extend(args.iter());
                let mut parts = self.operands(&all)?;
                let callee = parts.remove(0);
                Expression::New(Box::new(callee), parts)
            }
            Expression::SuperCall(args) => {
                let args: Vec<&Expression> = args.iter().collect();
                Expression::SuperCall(self.operands(&args)?)
            }
            Expression::Array(elements) => {
                let present: Vec<&Expression> = elements.iter().flatten().collect();
                let mut lowered = self.operands(&present)?.into_iter();
                Expression::Array(
                    elements
                        .iter()
                        .map(|e| e.as_ref().and_then(|_| lowered.next()))
                        .collect(),
                )
            }
            Expression::Object(props) => self.object_literal(props)?,
            Expression::Assign(op, target, value) => self.assignment(*op, target, value)?,
            Expression::Sequence(exprs) => {
                let Some((last, init)) = exprs.split_last() else {
                    return Err(EngineError::Internal("empty sequence"));
                };
                for e in init {
                    let e = self.expression(e)?;
                    self.emit(Op::Eval(e, None));
                }
                self.expression(last)?
            }
            Expression::Template(template) => {
                let exprs: Vec<&Expression> = template.expressions.iter().collect();
                Expression::Template(Rc::new(TemplateLiteral {
                    quasis: template.quasis.clone(),
                    raw_quasis: template.raw_quasis.clone(),
                    expressions: self.operands(&exprs)?,
                }))
            }
            Expression::OptionalChain(_) | Expression::OptionalMember(..) | Expression::OptionalCall(..) => {
                return unsupported("yield inside an optional chain");
            }
            Expression::TaggedTemplate(..) => return unsupported("yield inside a tagged template"),
            _ => return unsupported("yield in this expression position"),
        })
    }

    /// Lowers operands that evaluate left to right. Every operand before the
    /// last yielding one is spilled so it keeps its place in evaluation order.
    fn operands(&mut self, exprs: &[&Expression]) -> EngineResult<Vec<Expression>> {
        let last = exprs.iter().rposition(|e| expr_contains_yield(e));
        let mut out = Vec::with_capacity(exprs.len());
        for (i, e) in exprs.iter().enumerate() {
            out.push(match last {
                Some(l) if i < l => self.spill(e)?,
                Some(l) if i == l => self.expression(e)?,
                _ => (*e).clone(),
            });
        }
        Ok(out)
    }

    /// Evaluates `expr` now, returning a temporary that holds its value.
    fn spill(&mut self, expr: &Expression) -> EngineResult<Expression> {
        match expr {
            Expression::Literal(_) | Expression::This => Ok(expr.clone()),
            Expression::Spread(inner) => Ok(Expression::Spread(Box::new(self.spill(inner)?))),
            _ => {
                let value = self.expression(expr)?;
                let t = self.temp();
                self.emit(Op::Eval(value, Some(t)));
                Ok(temp_ident(t))
            }
        }
    }

    /// Lowers a reference expression, keeping it a reference: the base
    /// and key are spilled but the member access itself is not.
    fn reference(&mut self, expr: &Expression) -> EngineResult<Expression> {
        match expr {
            Expression::Member(object, MemberProperty::Computed(key)) => {
                let mut parts = self.operands(&[object.as_ref(), key.as_ref()])?.into_iter();
                let (Some(object), Some(key)) = (parts.next(), parts.next()) else {
                    return Err(EngineError::Internal("operand count"));
                };
                Ok(Expression::Member(Box::new(object), MemberProperty::Computed(Box::new(key))))
            }
            Expression::Member(object, property) => {
                Ok(Expression::Member(Box::new(self.expression(object)?), property.clone()))
            }
            other => self.expression(other),
        }
    }

    fn call(&mut self, callee: &Expression, args: &[Expression]) -> EngineResult<Expression> {
        let mut all: Vec<&Expression> = Vec::new();
        let callee_parts = match callee {
            // The callee stays a reference so the call keeps its `this`.
            Expression::Member(object, MemberProperty::Computed(key)) => {
                all.push(object);
                all.push(key);
                2
            }
            Expression::Member(object, _) => {
                all.push(object);
                1
            }
            Expression::SuperMember(MemberProperty::Computed(key)) => {
                all.push(key);
                1
            }
            Expression::Identifier(_) | Expression::SuperMember(_) => 0,
            other => {
                all.push(other);
                1
            }
        };
        all.extend(args.iter());
        let mut parts = self.operands(&all)?;
        let args = parts.split_off(callee_parts);
        let mut parts = parts.into_iter();
        let callee = match callee {
            Expression::Member(_, MemberProperty::Computed(_)) => match (parts.next(), parts.next()) {
                (Some(object), Some(key)) => {
                    Expression::Member(Box::new(object), MemberProperty::Computed(Box::new(key)))
                }
                _ => return Err(EngineError::Internal("operand count")),
            },
            Expression::Member(_, property) => match parts.next() {
                Some(object) => Expression::Member(Box::new(object), property.clone()),
                None => return Err(EngineError::Internal("operand count")),
            },
            Expression::SuperMember(MemberProperty::Computed(_)) => match parts.next() {
                Some(key) => Expression::SuperMember(MemberProperty::Computed(Box::new(key))),
                None => return Err(EngineError::Internal("operand count")),
            },
            Expression::Identifier(_) | Expression::SuperMember(_) => callee.clone(),
            _ => parts.next().ok_or(EngineError::Internal("operand count"))?,
        };
        Ok(Expression::Call(Box::new(callee), args))
    }

    fn object_literal(&mut self, props: &[PropertyDefinition]) -> EngineResult<Expression> {
        let mut flat: Vec<&Expression> = Vec::new();
        for prop in props {
            match prop {
                PropertyDefinition::KeyValue(key, value) => {
                    if let PropertyName::Computed(k) = key {
                        flat.push(k);
                    }
                    flat.push(value);
                }
                PropertyDefinition::Method(PropertyName::Computed(k), ..) => flat.push(k),
                PropertyDefinition::Spread(e) => flat.push(e),
                PropertyDefinition::Method(..) | PropertyDefinition::Shorthand(_) => {}
            }
        }
        let mut lowered = self.operands(&flat)?.into_iter();
        let mut next = || lowered.next().ok_or(EngineError::Internal("operand count"));
        let mut out = Vec::with_capacity(props.len());
        for prop in props {
            out.push(match prop {
                PropertyDefinition::KeyValue(key, _) => {
                    let key = match key {
                        PropertyName::Computed(_) => PropertyName::Computed(Box::new(next()?)),
                        other => other.clone(),
                    };
                    PropertyDefinition::KeyValue(key, next()?)
                }
                PropertyDefinition::Method(PropertyName::Computed(_), f, kind) => {
                    PropertyDefinition::Method(PropertyName::Computed(Box::new(next()?)), f.clone(), *kind)
                }
                PropertyDefinition::Spread(_) => PropertyDefinition::Spread(next()?),
                other => other.clone(),
            });
        }
        Ok(Expression::Object(out))
    }

    fn assignment(&mut self, op: AssignOp, target: &Pattern, value: &Expression) -> EngineResult<Expression> {
        let target_expr = match target {
            Pattern::Identifier(name) => Expression::Identifier(name.clone()),
            Pattern::MemberExpression(member) => self.spill_reference(member)?,
            pattern => {
                if pattern_contains_yield(pattern) {
                    return unsupported("yield inside a destructuring target");
                }
                let value = self.expression(value)?;
                return Ok(Expression::Assign(op, Box::new(pattern.clone()), Box::new(value)));
            }
        };
        let lhs = match &target_expr {
            Expression::Identifier(name) => Pattern::Identifier(name.clone()),
            member => Pattern::MemberExpression(Box::new(member.clone())),
        };
        if let Some(logical) = op.logical_op() {
            let assign = Expression::Assign(AssignOp::Assign, Box::new(lhs), Box::new(value.clone()));
            return self.expression(&Expression::Logical(logical, Box::new(target_expr), Box::new(assign)));
        }
        let value = match op.binary_op() {
            Some(binary) => {
                let current = self.spill(&target_expr)?;
                let value = self.expression(value)?;
                Expression::Binary(binary, Box::new(current), Box::new(value))
            }
            None => self.expression(value)?,
        };
        Ok(Expression::Assign(AssignOp::Assign, Box::new(lhs), Box::new(value)))
    }

    /// Spills the base and key of an assignment target, which are
    /// evaluated before the assigned value.
    fn spill_reference(&mut self, member: &Expression) -> EngineResult<Expression> {
        match member {
            Expression::Member(object, MemberProperty::Computed(key)) => {
                let object = self.spill(object)?;
                let key = self.spill(key)?;
                Ok(Expression::Member(Box::new(object), MemberProperty::Computed(Box::new(key))))
            }
            Expression::Member(object, property) => {
                Ok(Expression::Member(Box::new(self.spill(object)?), property.clone()))
            }
            _ => unsupported("assignment target"),
        }
    }
}

fn left_has_yield(left: &ForInOfLeft) -> bool {
    match left {
        ForInOfLeft::Variable(_, p) | ForInOfLeft::Pattern(p) => pattern_contains_yield(p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;

    #[test]
    fn statements_without_yield_stay_whole() {
        let program = lower_generator_body(&[
            var("x", num(1.0)),
            while_(boolean(true), expr_stmt(ident("x"))),
        ])
        .unwrap();
        assert_eq!(program.ops.len(), 2);
        assert!(program.ops.iter().all(|op| matches!(op, Op::Exec(_))));
        assert_eq!(program.temps, 0);
    }

    #[test]
    fn operands_before_a_yield_are_spilled() {
        // f(a(), yield 1)
        let program =
            lower_generator_body(&[expr_stmt(call(ident("f"), vec![call(ident("a"), vec![]), yield_(Some(num(1.0)))]))])
                .unwrap();
        assert!(matches!(program.ops[0], Op::Eval(Expression::Call(..), Some(0))));
        assert!(matches!(program.ops[1], Op::Yield { resume: 1, .. }));
        match &program.ops[2] {
            Op::Eval(Expression::Call(callee, args), None) => {
                assert!(matches!(callee.as_ref(), Expression::Identifier(n) if n == "f"));
                assert!(matches!(&args[0], Expression::Identifier(n) if n == "%t0"));
                assert!(matches!(&args[1], Expression::Identifier(n) if n == "%t1"));
            }
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn loops_with_yields_get_break_targets() {
        let program = lower_generator_body(&[while_(
            ident("go"),
            block(vec![expr_stmt(yield_(None)), if_(ident("stop"), break_(None), None)]),
        )])
        .unwrap();
        let Op::EnterTarget {
            kind,
            break_to,
            continue_to,
            ..
        } = &program.ops[0]
        else {
            panic!("expected a loop target");
        };
        assert_eq!(*kind, TargetKind::Loop);
        assert_eq!(*continue_to, 1);
        assert_eq!(*break_to, program.ops.len());
        assert!(matches!(program.ops[program.ops.len() - 1], Op::ExitTarget));
    }

    #[test]
    fn try_records_its_handlers() {
        let program = lower_generator_body(&[try_catch_finally(
            vec![expr_stmt(yield_(None))],
            Some("e"),
            vec![expr_stmt(ident("e"))],
            vec![expr_stmt(yield_(None))],
        )])
        .unwrap();
        let Op::EnterTry {
            catch: Some(catch),
            finally: Some(finally),
        } = program.ops[0]
        else {
            panic!("expected handlers");
        };
        assert!(matches!(program.ops[catch], Op::BindCatch(Some(_))));
        assert!(matches!(program.ops[program.ops.len() - 1], Op::EndFinally));
        assert!(finally > catch);
    }

    #[test]
    fn yield_in_destructuring_defaults_is_unsupported() {
        let err = lower_generator_body(&[decl(
            VarKind::Let,
            array_pat(vec![Some(pat_default(pat("a"), yield_(None)))]),
            Some(ident("xs")),
        )])
        .unwrap_err();
        assert!(matches!(err, EngineError::Unsupported(_)));
    }
}
