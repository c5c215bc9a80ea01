//! Generator objects (§27.5) and the resumable execution of their bodies.
//!
//! A generator keeps its suspended execution context together with a frame
//! over the lowered [`GeneratorProgram`]: the index of the next op, the
//! block stack built by enter/exit ops, and the iterator of an active
//! `yield*`. Resuming pushes the saved context back on the context stack
//! and steps the program until it yields or finishes.

use super::generator_transform::{Op, TargetKind, Temp, lower_generator_body, temp_name};
use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum GeneratorState {
    SuspendedStart,
    SuspendedYield,
    Executing,
    Completed,
}

/// How a suspended generator is resumed: `next`, `return` or `throw`.
#[derive(Clone, Debug)]
pub(crate) enum Resumption {
    Next(JsValue),
    Return(JsValue),
    Throw(JsValue),
}

#[derive(Clone, Debug)]
enum Abrupt {
    Throw(JsValue),
    Return(JsValue),
    Break(Option<String>),
    Continue(Option<String>),
}

enum Block {
    /// Restores this lexical environment when popped.
    Scope(EnvId),
    Target {
        labels: Vec<String>,
        kind: TargetKind,
        break_to: usize,
        continue_to: usize,
    },
    Try {
        catch: Option<usize>,
        finally: Option<usize>,
        env: EnvId,
    },
    /// A running `finally` body and the completion that entered it.
    Finally(Option<Abrupt>),
    Iterator(IteratorRecord),
    Enumerate(ObjectId),
}

/// Where a generator stopped.
enum Step {
    Yield(JsValue),
    /// A `yield*` passing on the inner iterator's result object as is.
    Delegated(ObjectId),
    Return(JsValue),
    Throw(JsValue),
}

enum Flow {
    Next,
    Jump(usize),
    Suspend(Step),
    Abrupt(Abrupt),
}

enum Unwound {
    Resume(usize),
    Done(Step),
}

struct Frame {
    program: Rc<GeneratorProgram>,
    pc: usize,
    blocks: Vec<Block>,
    registers: EnvId,
    exception: Option<JsValue>,
    delegate: Option<IteratorRecord>,
}

// §27.5.2 Generator instance slots
pub(crate) struct GeneratorData {
    pub(crate) state: GeneratorState,
    context: Option<ExecutionContext>,
    frame: Option<Frame>,
}

impl GeneratorData {
    pub(crate) fn new() -> Self {
        Self {
            state: GeneratorState::SuspendedStart,
            context: None,
            frame: None,
        }
    }
}

fn trace_abrupt(abrupt: &Abrupt, tracer: &mut Tracer) {
    if let Abrupt::Throw(v) | Abrupt::Return(v) = abrupt {
        tracer.value(v);
    }
}

fn trace_record(record: &IteratorRecord, tracer: &mut Tracer) {
    tracer.object(record.iterator);
    tracer.value(&record.next_method);
}

impl Trace for GeneratorData {
    fn trace(&self, tracer: &mut Tracer) {
        if let Some(context) = &self.context {
            context.trace(tracer);
        }
        let Some(frame) = &self.frame else {
            return;
        };
        tracer.env(frame.registers);
        if let Some(v) = &frame.exception {
            tracer.value(v);
        }
        if let Some(record) = &frame.delegate {
            trace_record(record, tracer);
        }
        for block in &frame.blocks {
            match block {
                Block::Scope(env) | Block::Try { env, .. } => tracer.env(*env),
                Block::Finally(Some(abrupt)) => trace_abrupt(abrupt, tracer),
                Block::Iterator(record) => trace_record(record, tracer),
                Block::Enumerate(it) => tracer.object(*it),
                Block::Target { .. } | Block::Finally(None) => {}
            }
        }
    }
}

fn completion_of(abrupt: &Abrupt) -> Completion {
    match abrupt {
        Abrupt::Throw(v) => Completion::Throw(v.clone()),
        Abrupt::Return(v) => Completion::Return(v.clone()),
        Abrupt::Break(label) => Completion::Break(label.clone(), None),
        Abrupt::Continue(label) => Completion::Continue(label.clone(), None),
    }
}

impl Interpreter {
    fn generator_program(&mut self, node: &Rc<FunctionNode>) -> EngineResult<Rc<GeneratorProgram>> {
        let key = Rc::as_ptr(node);
        if let Some((_, program)) = self.generator_programs.get(&key) {
            return Ok(program.clone());
        }
        let program = Rc::new(lower_generator_body(node.body_statements())?);
        tracing::trace!(ops = program.ops.len(), temps = program.temps, "lowered generator body");
        self.generator_programs.insert(key, (node.clone(), program.clone()));
        Ok(program)
    }

    fn generator_data_mut(&mut self, g: ObjectId) -> EngineResult<&mut GeneratorData> {
        match &mut self.heap.object_mut(g)?.kind {
            ObjectKind::Generator(data) => Ok(data),
            _ => Err(EngineError::Internal("expected a generator object")),
        }
    }

    // §27.5.3.1 GeneratorStart(generator, generatorBody)
    pub(crate) fn generator_start(&mut self, generator: ObjectId, node: &Rc<FunctionNode>) -> JsResult<()> {
        let program = self.generator_program(node)?;
        let registers = self.new_declarative_environment(Some(self.lexical_env()?));
        for t in 0..program.temps {
            let name = temp_name(t);
            self.env_create_mutable_binding(registers, &name, false)?;
            self.env_initialize_binding(registers, &name, JsValue::Undefined)?;
        }
        let mut context = self.running_context()?.clone();
        context.lexical_env = registers;
        context.generator = Some(generator);
        let data = self.generator_data_mut(generator)?;
        data.state = GeneratorState::SuspendedStart;
        data.context = Some(context);
        data.frame = Some(Frame {
            program,
            pc: 0,
            blocks: Vec::new(),
            registers,
            exception: None,
            delegate: None,
        });
        Ok(())
    }

    // §27.5.3.2 GeneratorValidate(generator, generatorBrand)
    fn generator_validate(&mut self, generator: &JsValue, method: &str) -> JsResult<(ObjectId, GeneratorState)> {
        let found = match generator {
            JsValue::Object(g) => match &self.heap.object(*g)?.kind {
                ObjectKind::Generator(data) => Some((*g, data.state)),
                _ => None,
            },
            _ => None,
        };
        match found {
            Some((_, GeneratorState::Executing)) => Err(self.type_error("Generator is already running")),
            Some(found) => Ok(found),
            None => Err(self.type_error(format!("{method} method called on incompatible receiver {generator}"))),
        }
    }

    /// GeneratorResume and GeneratorResumeAbrupt (§27.5.3.3, §27.5.3.4).
    pub(crate) fn generator_resume(
        &mut self,
        generator: &JsValue,
        resumption: Resumption,
        method: &str,
    ) -> JsResult<JsValue> {
        let (g, state) = self.generator_validate(generator, method)?;
        let state = match (state, &resumption) {
            (GeneratorState::SuspendedStart, Resumption::Return(_) | Resumption::Throw(_)) => {
                self.complete_generator(g)?;
                GeneratorState::Completed
            }
            (state, _) => state,
        };
        if state == GeneratorState::Completed {
            return match resumption {
                Resumption::Next(_) => self.create_iter_result_object(JsValue::Undefined, true),
                Resumption::Return(v) => self.create_iter_result_object(v, true),
                Resumption::Throw(e) => Err(JsError::Throw(e)),
            };
        }

        let data = self.generator_data_mut(g)?;
        data.state = GeneratorState::Executing;
        let (Some(context), Some(mut frame)) = (data.context.take(), data.frame.take()) else {
            return Err(EngineError::Internal("suspended generator without a context").into());
        };
        if let Err(e) = self.push_context(context) {
            self.complete_generator(g)?;
            return Err(e.into());
        }
        tracing::trace!(pc = frame.pc, started = state != GeneratorState::SuspendedStart, "resuming generator");
        let step = self.run_generator(&mut frame, state == GeneratorState::SuspendedYield, resumption);
        let context = self.pop_context()?;
        let step = match step {
            Ok(step) => step,
            Err(e) => {
                self.complete_generator(g)?;
                return Err(e.into());
            }
        };
        match step {
            Step::Yield(value) => {
                self.suspend_generator(g, context, frame)?;
                self.create_iter_result_object(value, false)
            }
            Step::Delegated(result) => {
                self.suspend_generator(g, context, frame)?;
                Ok(JsValue::Object(result))
            }
            Step::Return(value) => {
                self.complete_generator(g)?;
                self.create_iter_result_object(value, true)
            }
            Step::Throw(value) => {
                self.complete_generator(g)?;
                Err(JsError::Throw(value))
            }
        }
    }

    fn suspend_generator(&mut self, g: ObjectId, context: ExecutionContext, frame: Frame) -> EngineResult<()> {
        let data = self.generator_data_mut(g)?;
        data.state = GeneratorState::SuspendedYield;
        data.context = Some(context);
        data.frame = Some(frame);
        Ok(())
    }

    fn complete_generator(&mut self, g: ObjectId) -> EngineResult<()> {
        let data = self.generator_data_mut(g)?;
        data.state = GeneratorState::Completed;
        data.context = None;
        data.frame = None;
        Ok(())
    }

    fn run_generator(&mut self, frame: &mut Frame, started: bool, resumption: Resumption) -> EngineResult<Step> {
        let program = frame.program.clone();
        let mut pending = if started {
            Some(match program.ops.get(frame.pc) {
                Some(Op::Yield { resume, .. }) => match resumption {
                    Resumption::Next(v) => match self.set_temp(frame, *resume, v) {
                        Ok(()) => Flow::Next,
                        Err(e) => thrown_flow(e)?,
                    },
                    Resumption::Return(v) => Flow::Abrupt(Abrupt::Return(v)),
                    Resumption::Throw(e) => Flow::Abrupt(Abrupt::Throw(e)),
                },
                Some(Op::YieldStar { resume, .. }) => {
                    flow_result(self.delegate_step(frame, resumption, *resume))?
                }
                _ => return Err(EngineError::Internal("generator suspended away from a yield")),
            })
        } else {
            None
        };
        loop {
            let flow = match pending.take() {
                Some(flow) => flow,
                None => match program.ops.get(frame.pc) {
                    Some(op) => flow_result(self.generator_op(frame, op))?,
                    None => return Ok(Step::Return(JsValue::Undefined)),
                },
            };
            match flow {
                Flow::Next => frame.pc += 1,
                Flow::Jump(target) => frame.pc = target,
                Flow::Suspend(step) => return Ok(step),
                Flow::Abrupt(abrupt) => match self.unwind(frame, abrupt)? {
                    Unwound::Resume(pc) => frame.pc = pc,
                    Unwound::Done(step) => return Ok(step),
                },
            }
        }
    }

    fn set_temp(&mut self, frame: &Frame, t: Temp, value: JsValue) -> JsResult<()> {
        self.env_set_mutable_binding(frame.registers, &temp_name(t), value, true)
    }

    fn get_temp(&mut self, frame: &Frame, t: Temp) -> JsResult<JsValue> {
        self.env_get_binding_value(frame.registers, &temp_name(t), true)
    }

    fn push_scope(&mut self, frame: &mut Frame, env: EnvId) -> EngineResult<()> {
        frame.blocks.push(Block::Scope(self.lexical_env()?));
        self.set_lexical_env(env)
    }

    fn generator_op(&mut self, frame: &mut Frame, op: &Op) -> JsResult<Flow> {
        Ok(match op {
            Op::Exec(stmt) => match self.exec_statement(stmt, &[])? {
                Completion::Normal(_) => Flow::Next,
                Completion::Return(v) => Flow::Abrupt(Abrupt::Return(v)),
                Completion::Throw(v) => Flow::Abrupt(Abrupt::Throw(v)),
                Completion::Break(label, _) => Flow::Abrupt(Abrupt::Break(label)),
                Completion::Continue(label, _) => Flow::Abrupt(Abrupt::Continue(label)),
            },
            Op::Eval(expr, dest) => {
                let value = self.eval_expression(expr)?;
                if let Some(t) = dest {
                    self.set_temp(frame, *t, value)?;
                }
                Flow::Next
            }
            Op::Jump(target) => Flow::Jump(*target),
            Op::JumpIfFalse(test, target) => {
                let value = self.eval_expression(test)?;
                if to_boolean(&value) { Flow::Next } else { Flow::Jump(*target) }
            }
            Op::JumpIfTrue(test, target) => {
                let value = self.eval_expression(test)?;
                if to_boolean(&value) { Flow::Jump(*target) } else { Flow::Next }
            }
            Op::JumpIfNotNullish(t, target) => {
                if self.get_temp(frame, *t)?.is_nullish() { Flow::Next } else { Flow::Jump(*target) }
            }
            Op::JumpIfStrictEqual(t, expr, target) => {
                let left = self.get_temp(frame, *t)?;
                let right = self.eval_expression(expr)?;
                if is_strictly_equal(&left, &right) { Flow::Jump(*target) } else { Flow::Next }
            }
            // §27.5.3.7 Yield(value)
            Op::Yield { value, .. } => {
                let value = match value {
                    Some(e) => self.eval_expression(e)?,
                    None => JsValue::Undefined,
                };
                Flow::Suspend(Step::Yield(value))
            }
            Op::YieldStar { iterable, resume } => {
                let value = self.eval_expression(iterable)?;
                frame.delegate = Some(self.get_iterator(&value)?);
                self.delegate_step(frame, Resumption::Next(JsValue::Undefined), *resume)?
            }
            Op::EnterBlock(stmts) => {
                let env = self.new_declarative_environment(Some(self.lexical_env()?));
                let decls = lexically_scoped_declarations(stmts, false);
                self.block_declaration_instantiation(&decls, env)?;
                self.push_scope(frame, env)?;
                Flow::Next
            }
            Op::EnterWith(object) => {
                let value = self.eval_expression(object)?;
                let object = self.to_object(&value)?;
                let env = self.new_object_environment(object, true, Some(self.lexical_env()?));
                self.push_scope(frame, env)?;
                Flow::Next
            }
            Op::EnterLoopScope { names, constant } => {
                let env = self.new_declarative_environment(Some(self.lexical_env()?));
                for name in names {
                    if *constant {
                        self.env_create_immutable_binding(env, name, true)?;
                    } else {
                        self.env_create_mutable_binding(env, name, false)?;
                    }
                }
                self.push_scope(frame, env)?;
                Flow::Next
            }
            Op::CopyIterationScope(names) => {
                self.create_per_iteration_environment(names)?;
                Flow::Next
            }
            Op::ExitScope => match frame.blocks.pop() {
                Some(Block::Scope(env)) => {
                    self.set_lexical_env(env)?;
                    Flow::Next
                }
                _ => return Err(EngineError::Internal("scope exit without a scope").into()),
            },
            Op::EnterTarget {
                labels,
                kind,
                break_to,
                continue_to,
            } => {
                frame.blocks.push(Block::Target {
                    labels: labels.clone(),
                    kind: *kind,
                    break_to: *break_to,
                    continue_to: *continue_to,
                });
                Flow::Next
            }
            Op::ExitTarget => match frame.blocks.pop() {
                Some(Block::Target { .. }) => Flow::Next,
                _ => return Err(EngineError::Internal("target exit without a target").into()),
            },
            Op::EnterTry { catch, finally } => {
                frame.blocks.push(Block::Try {
                    catch: *catch,
                    finally: *finally,
                    env: self.lexical_env()?,
                });
                Flow::Next
            }
            Op::ExitTry { after } => match frame.blocks.pop() {
                Some(Block::Try { finally: Some(f), .. }) => {
                    frame.blocks.push(Block::Finally(None));
                    Flow::Jump(f)
                }
                Some(Block::Try { finally: None, .. }) => Flow::Jump(*after),
                _ => return Err(EngineError::Internal("try exit without a try").into()),
            },
            // §14.15.2 CatchClauseEvaluation
            Op::BindCatch(param) => {
                let thrown = frame.exception.take().unwrap_or(JsValue::Undefined);
                if let Some(param) = param {
                    let env = self.new_declarative_environment(Some(self.lexical_env()?));
                    let mut names = Vec::new();
                    bound_names(param, &mut names);
                    for name in &names {
                        self.env_create_mutable_binding(env, name, false)?;
                    }
                    self.push_scope(frame, env)?;
                    self.binding_initialization(param, thrown, Some(env))?;
                }
                Flow::Next
            }
            Op::EndFinally => match frame.blocks.pop() {
                Some(Block::Finally(None)) => Flow::Next,
                Some(Block::Finally(Some(abrupt))) => Flow::Abrupt(abrupt),
                _ => return Err(EngineError::Internal("finally exit without a finally").into()),
            },
            Op::GetIterator(iterable) => {
                let value = self.eval_expression(iterable)?;
                let record = self.get_iterator(&value)?;
                frame.blocks.push(Block::Iterator(record));
                Flow::Next
            }
            Op::EnumerateStart { object, skip } => {
                let value = self.eval_expression(object)?;
                if value.is_nullish() {
                    return Ok(Flow::Jump(*skip));
                }
                let object = self.to_object(&value)?;
                let iterator = self.create_for_in_iterator(object)?;
                frame.blocks.push(Block::Enumerate(iterator));
                Flow::Next
            }
            Op::IteratorStep { done, value } => {
                let index = frame
                    .blocks
                    .iter()
                    .rposition(|b| matches!(b, Block::Iterator(_) | Block::Enumerate(_)))
                    .ok_or(EngineError::Internal("loop step without an iterator"))?;
                let next = match &mut frame.blocks[index] {
                    Block::Iterator(record) => self.iterator_step_value(record)?,
                    Block::Enumerate(it) => {
                        let it = *it;
                        self.for_in_iterator_next(it)?
                    }
                    _ => None,
                };
                match next {
                    Some(v) => {
                        self.set_temp(frame, *value, v)?;
                        Flow::Next
                    }
                    None => Flow::Jump(*done),
                }
            }
            Op::BindLoopTarget { left, value } => {
                let v = self.get_temp(frame, *value)?;
                let old_env = self.lexical_env()?;
                if matches!(left, ForInOfLeft::Variable(kind, _) if *kind != VarKind::Var) {
                    frame.blocks.push(Block::Scope(old_env));
                }
                self.for_in_of_bind(left, v, old_env)?;
                Flow::Next
            }
            Op::PopIterator => match frame.blocks.pop() {
                Some(Block::Iterator(_) | Block::Enumerate(_)) => Flow::Next,
                _ => return Err(EngineError::Internal("iterator pop without an iterator").into()),
            },
            Op::CloseIterator => match frame.blocks.pop() {
                Some(Block::Iterator(record)) => match self.iterator_close(&record, Completion::empty())? {
                    Completion::Throw(v) => Flow::Abrupt(Abrupt::Throw(v)),
                    _ => Flow::Next,
                },
                Some(Block::Enumerate(_)) => Flow::Next,
                _ => return Err(EngineError::Internal("iterator close without an iterator").into()),
            },
        })
    }

    /// One round of `yield*` (§15.5.5): forwards the resumption to the inner
    /// iterator and either suspends with its result or finishes delegation.
    fn delegate_step(&mut self, frame: &mut Frame, received: Resumption, resume: Temp) -> JsResult<Flow> {
        let record = frame
            .delegate
            .take()
            .ok_or(EngineError::Internal("yield* without an inner iterator"))?;
        let iterator = JsValue::Object(record.iterator);
        let returning = matches!(received, Resumption::Return(_));
        let inner = match received {
            Resumption::Next(v) => self.call(&record.next_method, &iterator, &[v])?,
            Resumption::Throw(e) => match self.get_method(&iterator, &"throw".into())? {
                Some(method) => self.call(&method, &iterator, &[e])?,
                None => {
                    if let Completion::Throw(v) = self.iterator_close(&record, Completion::empty())? {
                        return Err(JsError::Throw(v));
                    }
                    return Err(self.type_error("The iterator does not provide a 'throw' method"));
                }
            },
            Resumption::Return(v) => match self.get_method(&iterator, &"return".into())? {
                Some(method) => self.call(&method, &iterator, &[v])?,
                None => return Ok(Flow::Abrupt(Abrupt::Return(v))),
            },
        };
        let JsValue::Object(result) = inner else {
            return Err(self.type_error(format!("Iterator result {inner} is not an object")));
        };
        if self.iterator_complete(result)? {
            let value = self.iterator_value(result)?;
            if returning {
                return Ok(Flow::Abrupt(Abrupt::Return(value)));
            }
            self.set_temp(frame, resume, value)?;
            return Ok(Flow::Next);
        }
        frame.delegate = Some(record);
        Ok(Flow::Suspend(Step::Delegated(result)))
    }

    /// Pops blocks until one handles the abrupt completion.
    fn unwind(&mut self, frame: &mut Frame, mut abrupt: Abrupt) -> EngineResult<Unwound> {
        while let Some(block) = frame.blocks.pop() {
            match block {
                Block::Scope(env) => self.set_lexical_env(env)?,
                Block::Target {
                    labels,
                    kind,
                    break_to,
                    continue_to,
                } => {
                    let matched = match &abrupt {
                        Abrupt::Break(None) => kind != TargetKind::Label,
                        Abrupt::Break(Some(label)) => labels.contains(label),
                        Abrupt::Continue(None) => kind == TargetKind::Loop,
                        Abrupt::Continue(Some(label)) => kind == TargetKind::Loop && labels.contains(label),
                        Abrupt::Throw(_) | Abrupt::Return(_) => false,
                    };
                    if matched {
                        if let Abrupt::Continue(_) = abrupt {
                            frame.blocks.push(Block::Target {
                                labels,
                                kind,
                                break_to,
                                continue_to,
                            });
                            return Ok(Unwound::Resume(continue_to));
                        }
                        return Ok(Unwound::Resume(break_to));
                    }
                }
                Block::Try { catch, finally, env } => {
                    self.set_lexical_env(env)?;
                    if let (Abrupt::Throw(thrown), Some(catch)) = (&abrupt, catch) {
                        frame.exception = Some(thrown.clone());
                        frame.blocks.push(Block::Try {
                            catch: None,
                            finally,
                            env,
                        });
                        return Ok(Unwound::Resume(catch));
                    }
                    if let Some(finally) = finally {
                        frame.blocks.push(Block::Finally(Some(abrupt)));
                        return Ok(Unwound::Resume(finally));
                    }
                }
                // An abrupt exit from a finally body replaces its pending completion.
                Block::Finally(_) => {}
                Block::Iterator(record) => {
                    if !record.done
                        && let Completion::Throw(v) = self.iterator_close(&record, completion_of(&abrupt))?
                    {
                        abrupt = Abrupt::Throw(v);
                    }
                }
                Block::Enumerate(_) => {}
            }
        }
        match abrupt {
            Abrupt::Throw(v) => Ok(Unwound::Done(Step::Throw(v))),
            Abrupt::Return(v) => Ok(Unwound::Done(Step::Return(v))),
            Abrupt::Break(_) | Abrupt::Continue(_) => Err(EngineError::Internal("break or continue without a target")),
        }
    }
}

fn thrown_flow(e: JsError) -> EngineResult<Flow> {
    match e {
        JsError::Throw(v) => Ok(Flow::Abrupt(Abrupt::Throw(v))),
        JsError::Engine(e) => Err(e),
    }
}

fn flow_result(result: JsResult<Flow>) -> EngineResult<Flow> {
    result.or_else(thrown_flow)
}
