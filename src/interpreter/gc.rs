use super::*;

/// Handle to an object in the interpreter heap.
///
/// Handles are `Copy` and compare by slot and generation; a handle whose
/// slot has been swept and reused no longer resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

/// Handle to an environment record in the interpreter heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EnvId {
    index: u32,
    generation: u32,
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    live: usize,
}

impl<T> Arena<T> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    fn alloc(&mut self, value: T) -> (u32, u32) {
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            (index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            (index, 0)
        }
    }

    fn get(&self, index: u32, generation: u32) -> Option<&T> {
        let slot = self.slots.get(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_ref()
    }

    fn get_mut(&mut self, index: u32, generation: u32) -> Option<&mut T> {
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_mut()
    }

    fn free(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        if slot.value.take().is_some() {
            slot.generation = slot.generation.wrapping_add(1);
            self.free_list.push(index);
            self.live -= 1;
        }
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn is_occupied(&self, index: usize) -> bool {
        self.slots[index].value.is_some()
    }
}

pub(crate) struct Heap {
    objects: Arena<ObjectData>,
    environments: Arena<EnvRecord>,
    pub(crate) allocations_since_gc: usize,
}

impl Heap {
    pub(crate) fn new() -> Self {
        Self {
            objects: Arena::new(),
            environments: Arena::new(),
            allocations_since_gc: 0,
        }
    }

    pub(crate) fn alloc_object(&mut self, data: ObjectData) -> ObjectId {
        self.allocations_since_gc += 1;
        let (index, generation) = self.objects.alloc(data);
        ObjectId { index, generation }
    }

    pub(crate) fn alloc_env(&mut self, record: EnvRecord) -> EnvId {
        self.allocations_since_gc += 1;
        let (index, generation) = self.environments.alloc(record);
        EnvId { index, generation }
    }

    pub(crate) fn object(&self, id: ObjectId) -> EngineResult<&ObjectData> {
        self.objects
            .get(id.index, id.generation)
            .ok_or(EngineError::InvalidHandle)
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> EngineResult<&mut ObjectData> {
        self.objects
            .get_mut(id.index, id.generation)
            .ok_or(EngineError::InvalidHandle)
    }

    pub(crate) fn env(&self, id: EnvId) -> EngineResult<&EnvRecord> {
        self.environments
            .get(id.index, id.generation)
            .ok_or(EngineError::InvalidHandle)
    }

    pub(crate) fn env_mut(&mut self, id: EnvId) -> EngineResult<&mut EnvRecord> {
        self.environments
            .get_mut(id.index, id.generation)
            .ok_or(EngineError::InvalidHandle)
    }

    pub(crate) fn is_live(&self, id: ObjectId) -> bool {
        self.objects.get(id.index, id.generation).is_some()
    }

    pub(crate) fn live_objects(&self) -> usize {
        self.objects.live
    }

    pub(crate) fn live_environments(&self) -> usize {
        self.environments.live
    }
}

/// Mark-phase worklist. Heap data reports its outgoing handles here.
pub(crate) struct Tracer {
    objects: Vec<ObjectId>,
    environments: Vec<EnvId>,
}

impl Tracer {
    pub(crate) fn object(&mut self, id: ObjectId) {
        self.objects.push(id);
    }

    pub(crate) fn env(&mut self, id: EnvId) {
        self.environments.push(id);
    }

    pub(crate) fn value(&mut self, value: &JsValue) {
        if let JsValue::Object(id) = value {
            self.objects.push(*id);
        }
    }

    pub(crate) fn values<'a>(&mut self, values: impl IntoIterator<Item = &'a JsValue>) {
        for v in values {
            self.value(v);
        }
    }
}

pub(crate) trait Trace {
    fn trace(&self, tracer: &mut Tracer);
}

/// Counts reported by a collection cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GcStats {
    pub objects_freed: usize,
    pub environments_freed: usize,
    pub live_objects: usize,
    pub live_environments: usize,
}

impl Interpreter {
    /// Collects if enough allocations happened since the last cycle. Only
    /// called at safe points, when no script code is on the context stack.
    pub(crate) fn maybe_gc(&mut self) {
        if self.context_stack.is_empty() && self.heap.allocations_since_gc >= self.options.gc_threshold {
            self.collect_garbage();
        }
    }

    /// Runs a full mark and sweep cycle.
    ///
    /// Roots are the realms (global object, global environment and
    /// intrinsics), the execution context stack, values pinned with
    /// [`Interpreter::add_root`] and the template object cache. Everything
    /// else reachable is traced through object and environment data,
    /// including suspended generator contexts and native-function slots.
    pub fn collect_garbage(&mut self) -> GcStats {
        self.heap.allocations_since_gc = 0;
        let mut tracer = Tracer {
            objects: Vec::new(),
            environments: Vec::new(),
        };

        for realm in &self.realms {
            realm.trace(&mut tracer);
        }
        for ctx in &self.context_stack {
            ctx.trace(&mut tracer);
        }
        tracer.values(&self.host_roots);
        for (_, template) in self.template_cache.values() {
            tracer.object(*template);
        }

        let mut object_marks = vec![false; self.heap.objects.len()];
        let mut env_marks = vec![false; self.heap.environments.len()];
        loop {
            if let Some(id) = tracer.objects.pop() {
                let idx = id.index as usize;
                if idx >= object_marks.len() || object_marks[idx] {
                    continue;
                }
                if let Some(data) = self.heap.objects.get(id.index, id.generation) {
                    object_marks[idx] = true;
                    data.trace(&mut tracer);
                }
                continue;
            }
            if let Some(id) = tracer.environments.pop() {
                let idx = id.index as usize;
                if idx >= env_marks.len() || env_marks[idx] {
                    continue;
                }
                if let Some(record) = self.heap.environments.get(id.index, id.generation) {
                    env_marks[idx] = true;
                    record.trace(&mut tracer);
                }
                continue;
            }
            break;
        }

        let mut stats = GcStats::default();
        for (idx, marked) in object_marks.iter().enumerate() {
            if !marked && self.heap.objects.is_occupied(idx) {
                self.heap.objects.free(idx as u32);
                stats.objects_freed += 1;
            }
        }
        for (idx, marked) in env_marks.iter().enumerate() {
            if !marked && self.heap.environments.is_occupied(idx) {
                self.heap.environments.free(idx as u32);
                stats.environments_freed += 1;
            }
        }
        stats.live_objects = self.heap.live_objects();
        stats.live_environments = self.heap.live_environments();
        tracing::debug!(
            objects_freed = stats.objects_freed,
            environments_freed = stats.environments_freed,
            live_objects = stats.live_objects,
            "garbage collection finished"
        );
        stats
    }

    /// Keeps `value` alive across collections until [`Interpreter::remove_root`].
    pub fn add_root(&mut self, value: JsValue) {
        self.host_roots.push(value);
    }

    pub fn remove_root(&mut self, value: &JsValue) {
        if let Some(pos) = self
            .host_roots
            .iter()
            .position(|v| matches!((v, value), (JsValue::Object(a), JsValue::Object(b)) if a == b))
        {
            self.host_roots.swap_remove(pos);
        }
    }

    pub fn is_live(&self, id: ObjectId) -> bool {
        self.heap.is_live(id)
    }
}
