//! The iterator protocol (§7.4) and the engine's own iterator objects.

use super::*;

// §7.4.1 Iterator Records
#[derive(Clone, Debug)]
pub(crate) struct IteratorRecord {
    pub(crate) iterator: ObjectId,
    pub(crate) next_method: JsValue,
    pub(crate) done: bool,
}

/// Slots of %ArrayIteratorPrototype% instances (§23.1.5). `object` is
/// cleared once the iterator is exhausted.
pub(crate) struct ArrayIteratorData {
    pub(crate) object: Option<ObjectId>,
    pub(crate) next_index: u64,
    pub(crate) kind: EnumerableKind,
}

// §22.1.5 String Iterator Objects
pub(crate) struct StringIteratorData {
    pub(crate) string: Option<JsString>,
    pub(crate) position: usize,
}

// §14.7.5.10 For-In Iterator Objects
pub(crate) struct ForInIteratorData {
    pub(crate) object: Option<ObjectId>,
    pub(crate) object_was_visited: bool,
    pub(crate) visited_keys: FxHashSet<PropertyKey>,
    pub(crate) remaining_keys: Vec<PropertyKey>,
}

impl Trace for ForInIteratorData {
    fn trace(&self, tracer: &mut Tracer) {
        if let Some(o) = self.object {
            tracer.object(o);
        }
    }
}

impl Interpreter {
    // §7.4.3 GetIterator(obj, sync)
    pub(crate) fn get_iterator(&mut self, value: &JsValue) -> JsResult<IteratorRecord> {
        let key = PropertyKey::from(self.well_known_symbol(WellKnownSymbol::Iterator));
        let Some(method) = self.get_method(value, &key)? else {
            return Err(self.type_error(format!("{} is not iterable", describe_iterable(value))));
        };
        self.get_iterator_from_method(value, &method)
    }

    // §7.4.2 GetIteratorFromMethod(obj, method)
    pub(crate) fn get_iterator_from_method(&mut self, value: &JsValue, method: &JsValue) -> JsResult<IteratorRecord> {
        let iterator = self.call(method, value, &[])?;
        let JsValue::Object(iterator) = iterator else {
            return Err(self.type_error("Result of the Symbol.iterator method is not an object"));
        };
        let next_method = self.get(iterator, &"next".into())?;
        Ok(IteratorRecord {
            iterator,
            next_method,
            done: false,
        })
    }

    // §7.4.4 IteratorNext(iteratorRecord [, value])
    pub(crate) fn iterator_next(&mut self, record: &IteratorRecord, value: Option<JsValue>) -> JsResult<ObjectId> {
        let args: Vec<JsValue> = value.into_iter().collect();
        let result = self.call(&record.next_method, &JsValue::Object(record.iterator), &args)?;
        match result {
            JsValue::Object(o) => Ok(o),
            other => Err(self.type_error(format!("Iterator result {other} is not an object"))),
        }
    }

    // §7.4.5 IteratorComplete(iterResult)
    pub(crate) fn iterator_complete(&mut self, result: ObjectId) -> JsResult<bool> {
        let done = self.get(result, &"done".into())?;
        Ok(to_boolean(&done))
    }

    // §7.4.6 IteratorValue(iterResult)
    pub(crate) fn iterator_value(&mut self, result: ObjectId) -> JsResult<JsValue> {
        self.get(result, &"value".into())
    }

    // §7.4.7 IteratorStep(iteratorRecord)
    //
    // Any abrupt completion marks the record done, so callers never close
    // an iterator whose own protocol threw.
    pub(crate) fn iterator_step(&mut self, record: &mut IteratorRecord) -> JsResult<Option<ObjectId>> {
        let result = match self.iterator_next(record, None) {
            Ok(r) => r,
            Err(e) => {
                record.done = true;
                return Err(e);
            }
        };
        match self.iterator_complete(result) {
            Ok(true) => {
                record.done = true;
                Ok(None)
            }
            Ok(false) => Ok(Some(result)),
            Err(e) => {
                record.done = true;
                Err(e)
            }
        }
    }

    // §7.4.8 IteratorStepValue(iteratorRecord)
    pub(crate) fn iterator_step_value(&mut self, record: &mut IteratorRecord) -> JsResult<Option<JsValue>> {
        let Some(result) = self.iterator_step(record)? else {
            return Ok(None);
        };
        match self.iterator_value(result) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                record.done = true;
                Err(e)
            }
        }
    }

    // §7.4.9 IteratorClose(iteratorRecord, completion)
    pub(crate) fn iterator_close(&mut self, record: &IteratorRecord, completion: Completion) -> EngineResult<Completion> {
        let iterator = JsValue::Object(record.iterator);
        let inner = match self.get_method(&iterator, &"return".into()) {
            Ok(None) => return Ok(completion),
            Ok(Some(method)) => self.call(&method, &iterator, &[]),
            Err(e) => Err(e),
        };
        if let Completion::Throw(_) = completion {
            if let Err(JsError::Engine(e)) = inner {
                return Err(e);
            }
            return Ok(completion);
        }
        match inner {
            Ok(JsValue::Object(_)) => Ok(completion),
            Ok(_) => throw_completion(self.type_error("Iterator result is not an object")),
            Err(e) => throw_completion(e),
        }
    }

    /// IteratorClose for operations that report abrupt completions as `Err`.
    pub(crate) fn iterator_close_result<T>(&mut self, record: &IteratorRecord, result: JsResult<T>) -> JsResult<T> {
        let completion = match &result {
            Ok(_) => Completion::empty(),
            Err(JsError::Throw(v)) => Completion::Throw(v.clone()),
            Err(JsError::Engine(_)) => return result,
        };
        match self.iterator_close(record, completion)? {
            Completion::Throw(v) => Err(JsError::Throw(v)),
            _ => result,
        }
    }

    // §7.4.13 IteratorToList(iteratorRecord), composed with GetIterator
    pub(crate) fn iterate_to_list(&mut self, value: &JsValue) -> JsResult<Vec<JsValue>> {
        let mut record = self.get_iterator(value)?;
        let mut values = Vec::new();
        while let Some(v) = self.iterator_step_value(&mut record)? {
            values.push(v);
        }
        Ok(values)
    }

    // §7.4.14 CreateIterResultObject(value, done)
    pub(crate) fn create_iter_result_object(&mut self, value: JsValue, done: bool) -> JsResult<JsValue> {
        let result = self.new_plain_object()?;
        self.create_data_property_or_throw(result, "value".into(), value)?;
        self.create_data_property_or_throw(result, "done".into(), JsValue::Boolean(done))?;
        Ok(JsValue::Object(result))
    }

    // §23.1.5.1 CreateArrayIterator(array, kind)
    pub(crate) fn create_array_iterator(&mut self, object: ObjectId, kind: EnumerableKind) -> JsResult<ObjectId> {
        let proto = self.intrinsic(Intrinsic::ArrayIteratorPrototype)?;
        Ok(self.object_with_kind(
            Some(proto),
            ObjectKind::ArrayIterator(ArrayIteratorData {
                object: Some(object),
                next_index: 0,
                kind,
            }),
        ))
    }

    // §22.1.5.1 CreateStringIterator(string)
    pub(crate) fn create_string_iterator(&mut self, string: JsString) -> JsResult<ObjectId> {
        let proto = self.intrinsic(Intrinsic::StringIteratorPrototype)?;
        Ok(self.object_with_kind(
            Some(proto),
            ObjectKind::StringIterator(StringIteratorData {
                string: Some(string),
                position: 0,
            }),
        ))
    }

    // §14.7.5.10.1 CreateForInIterator(object)
    pub(crate) fn create_for_in_iterator(&mut self, object: ObjectId) -> JsResult<ObjectId> {
        let proto = self.intrinsic(Intrinsic::ForInIteratorPrototype)?;
        Ok(self.object_with_kind(
            Some(proto),
            ObjectKind::ForInIterator(ForInIteratorData {
                object: Some(object),
                object_was_visited: false,
                visited_keys: FxHashSet::default(),
                remaining_keys: Vec::new(),
            }),
        ))
    }

    fn for_in_data(&mut self, it: ObjectId) -> EngineResult<&mut ForInIteratorData> {
        match &mut self.heap.object_mut(it)?.kind {
            ObjectKind::ForInIterator(data) => Ok(data),
            _ => Err(EngineError::Internal("expected a for-in iterator")),
        }
    }

    // §14.7.5.10.2.1 %ForInIteratorPrototype%.next()
    //
    // Keys added during enumeration are not visited; deleted keys that
    // have not been reached yet are skipped.
    pub(crate) fn for_in_iterator_next(&mut self, it: ObjectId) -> JsResult<Option<JsValue>> {
        loop {
            let Some(object) = self.for_in_data(it)?.object else {
                return Ok(None);
            };
            if !self.for_in_data(it)?.object_was_visited {
                let keys: Vec<PropertyKey> = self
                    .own_property_keys(object)?
                    .into_iter()
                    .filter(|k| !k.is_symbol())
                    .rev()
                    .collect();
                let data = self.for_in_data(it)?;
                data.remaining_keys = keys;
                data.object_was_visited = true;
            }
            while let Some(key) = self.for_in_data(it)?.remaining_keys.pop() {
                if self.for_in_data(it)?.visited_keys.contains(&key) {
                    continue;
                }
                let Some(desc) = self.get_own_property(object, &key)? else {
                    continue;
                };
                self.for_in_data(it)?.visited_keys.insert(key.clone());
                if desc.enumerable {
                    return Ok(Some(key.to_value()));
                }
            }
            let next = self.get_prototype_of(object)?;
            let data = self.for_in_data(it)?;
            data.object = next;
            data.object_was_visited = false;
        }
    }
}

fn describe_iterable(value: &JsValue) -> String {
    match value {
        JsValue::Object(_) => "object".to_string(),
        JsValue::String(s) => format!("\"{s}\""),
        other => other.to_string(),
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
    fn for_in_walks_prototype_chain_without_shadowed_duplicates() {
        // var p = { a: 1, shared: 2 }; var o = Object.create(p); o.shared = 3; o.b = 4;
        // var s = ""; for (var k in o) s += k; s
        let v = run(vec![
            var("p", object(vec![prop("a", num(1.0)), prop("shared", num(2.0))])),
            var("o", call(member(ident("Object"), "create"), vec![ident("p")])),
            expr_stmt(assign(member(ident("o"), "shared"), num(3.0))),
            expr_stmt(assign(member(ident("o"), "b"), num(4.0))),
            var("s", string("")),
            for_in(
                VarKind::Var,
                pat("k"),
                ident("o"),
                expr_stmt(assign_op(AssignOp::AddAssign, ident("s"), ident("k"))),
            ),
            expr_stmt(ident("s")),
        ]);
        assert_eq!(v.as_string().map(|s| s.to_rust_string()), Some("sharedba".into()));
    }

    #[test]
    fn for_in_skips_keys_deleted_during_enumeration() {
        // var o = { a: 1, b: 2, c: 3 }; var s = ""; for (var k in o) { delete o.b; s += k } s
        let v = run(vec![
            var("o", object(vec![prop("a", num(1.0)), prop("b", num(2.0)), prop("c", num(3.0))])),
            var("s", string("")),
            for_in(
                VarKind::Var,
                pat("k"),
                ident("o"),
                block(vec![
                    expr_stmt(delete(member(ident("o"), "b"))),
                    expr_stmt(assign_op(AssignOp::AddAssign, ident("s"), ident("k"))),
                ]),
            ),
            expr_stmt(ident("s")),
        ]);
        assert_eq!(v.as_string().map(|s| s.to_rust_string()), Some("ac".into()));
    }

    #[test]
    fn non_iterable_values_throw_type_error() {
        let mut interp = Interpreter::new().unwrap();
        let err = interp
            .run(&script(vec![for_of(VarKind::Let, pat("x"), num(1.0), block(vec![]))]))
            .unwrap_err();
        assert!(err.to_string().contains("is not iterable"));
    }

    #[test]
    fn for_of_break_closes_the_iterator() {
        let v = run(vec![
            var("log", array(vec![])),
            function_decl(
                "gen",
                &[],
                vec![ret(object(vec![
                    method_prop("next", &[], vec![ret(object(vec![prop("value", num(1.0)), prop("done", boolean(false))]))]),
                    method_prop("return", &[], vec![
                        expr_stmt(method_call(ident("log"), "push", vec![string("closed")])),
                        ret(object(vec![])),
                    ]),
                ]))],
            ),
            var(
                "iterable",
                object(vec![PropertyDefinition::KeyValue(
                    PropertyName::Computed(Box::new(member(ident("Symbol"), "iterator"))),
                    ident("gen"),
                )]),
            ),
            for_of(VarKind::Const, pat("x"), ident("iterable"), block(vec![break_(None)])),
            expr_stmt(member(ident("log"), "length")),
        ]);
        assert_eq!(v.as_number(), Some(1.0));
    }
}
