// Tracing garbage collector: three tracked sets, hold counts, and a
// pluggable trigger strategy. Only the collector ever destroys objects,
// instances, or types.

use crate::heap::{Arena, InsRef, ObjRef, TypeRef};
use crate::instance::Instance;
use crate::object::Object;
use crate::types::Type;
use std::collections::HashMap;

/// Trigger strategy. The collector reports every track/untrack so the
/// strategy can maintain its counters; `wants_cycle` is consulted on ping.
pub trait GcStrategy {
    fn acknowledge_track_object(&mut self);
    fn acknowledge_track_instance(&mut self, bytes: usize);
    fn acknowledge_track_type(&mut self);
    fn acknowledge_untrack_object(&mut self);
    fn acknowledge_untrack_instance(&mut self, bytes: usize);
    fn acknowledge_untrack_type(&mut self);
    fn acknowledge_ping(&mut self);
    fn acknowledge_end_of_cycle(&mut self);
    fn wants_cycle(&self) -> bool;
}

const NUM_TRACKED_INIT: i64 = 10_000;
const NUM_TRACKED_MULT: i64 = 6;
const SIZEOF_TRACKED_INIT: i64 = 80_000;
const SIZEOF_TRACKED_MULT: i64 = 6;
const MIN_CYCLE_SIZE: i64 = 80_000;
const OPS_MOD: i64 = 100_000;

/// Default strategy: a cycle runs when the tracked population or tracked
/// byte size outgrew the post-sweep baseline by the configured factor, or
/// every `OPS_MOD` operations as a backstop.
pub struct DefaultStrategy {
    num_tracked: i64,
    prev_num_tracked: i64,
    sizeof_tracked: i64,
    prev_sizeof_tracked: i64,
    ops_cnt: i64,
}

impl Default for DefaultStrategy {
    fn default() -> Self {
        Self {
            num_tracked: 0,
            prev_num_tracked: NUM_TRACKED_INIT,
            sizeof_tracked: 0,
            prev_sizeof_tracked: SIZEOF_TRACKED_INIT,
            ops_cnt: 0,
        }
    }
}

impl DefaultStrategy {
    fn bump_ops(&mut self) {
        self.ops_cnt = (self.ops_cnt + 1) % OPS_MOD;
    }
}

impl GcStrategy for DefaultStrategy {
    fn acknowledge_track_object(&mut self) {
        self.num_tracked += 1;
        self.sizeof_tracked += std::mem::size_of::<Object>() as i64;
        self.bump_ops();
    }

    fn acknowledge_track_instance(&mut self, bytes: usize) {
        self.num_tracked += 1;
        self.sizeof_tracked += bytes as i64;
        self.bump_ops();
    }

    fn acknowledge_track_type(&mut self) {
        self.num_tracked += 1;
        self.sizeof_tracked += std::mem::size_of::<Type>() as i64;
        self.bump_ops();
    }

    fn acknowledge_untrack_object(&mut self) {
        self.num_tracked -= 1;
        self.sizeof_tracked -= std::mem::size_of::<Object>() as i64;
        self.bump_ops();
    }

    fn acknowledge_untrack_instance(&mut self, bytes: usize) {
        self.num_tracked -= 1;
        self.sizeof_tracked -= bytes as i64;
        self.bump_ops();
    }

    fn acknowledge_untrack_type(&mut self) {
        self.num_tracked -= 1;
        self.sizeof_tracked -= std::mem::size_of::<Type>() as i64;
        self.bump_ops();
    }

    fn acknowledge_ping(&mut self) {
        self.bump_ops();
    }

    fn acknowledge_end_of_cycle(&mut self) {
        self.prev_num_tracked = self.num_tracked;
        self.prev_sizeof_tracked = self.sizeof_tracked;
    }

    fn wants_cycle(&self) -> bool {
        self.prev_num_tracked < self.num_tracked / NUM_TRACKED_MULT
            || (self.prev_sizeof_tracked < self.sizeof_tracked / SIZEOF_TRACKED_MULT
                && self.sizeof_tracked >= MIN_CYCLE_SIZE)
            || self.ops_cnt == 0
    }
}

/// Strategy that asks for a cycle on every ping. Test-oriented.
pub struct AlwaysStrategy;

impl GcStrategy for AlwaysStrategy {
    fn acknowledge_track_object(&mut self) {}
    fn acknowledge_track_instance(&mut self, _bytes: usize) {}
    fn acknowledge_track_type(&mut self) {}
    fn acknowledge_untrack_object(&mut self) {}
    fn acknowledge_untrack_instance(&mut self, _bytes: usize) {}
    fn acknowledge_untrack_type(&mut self) {}
    fn acknowledge_ping(&mut self) {}
    fn acknowledge_end_of_cycle(&mut self) {}
    fn wants_cycle(&self) -> bool {
        true
    }
}

enum Work {
    Obj(ObjRef),
    Ins(InsRef),
    Type(TypeRef),
}

pub struct Gc {
    pub(crate) objects: Arena<Object>,
    pub(crate) instances: Arena<Instance>,
    pub(crate) types: Arena<Type>,
    held: HashMap<ObjRef, u64>,
    /// Current mark-phase bit. Entities whose mark equals this were visited
    /// in the cycle in progress (or the last one, before the flip).
    pub(crate) mark: bool,
    enabled: bool,
    strategy: Box<dyn GcStrategy>,

    next_object_id: u64,
    next_instance_id: u64,
    next_type_id: u64,
}

impl Gc {
    pub fn new(strategy: Box<dyn GcStrategy>) -> Self {
        Self {
            objects: Arena::default(),
            instances: Arena::default(),
            types: Arena::default(),
            held: HashMap::new(),
            mark: true,
            enabled: true,
            strategy,
            next_object_id: 0,
            next_instance_id: 0,
            next_type_id: 0,
        }
    }

    // ==================== tracking ====================

    pub fn track_object(&mut self, mut object: Object) -> ObjRef {
        self.next_object_id += 1;
        object.id = self.next_object_id;
        object.gc_mark = !self.mark;
        let (idx, gen) = self.objects.insert(object);
        self.strategy.acknowledge_track_object();
        ObjRef { idx, gen }
    }

    pub fn track_instance(&mut self, mut instance: Instance) -> InsRef {
        self.next_instance_id += 1;
        instance.id = self.next_instance_id;
        instance.gc_mark = !self.mark;
        let bytes = instance.byte_size;
        let (idx, gen) = self.instances.insert(instance);
        self.strategy.acknowledge_track_instance(bytes);
        InsRef { idx, gen }
    }

    pub fn track_type(&mut self, mut ty: Type) -> TypeRef {
        self.next_type_id += 1;
        if ty.id == 0 {
            ty.id = self.next_type_id;
        }
        ty.gc_mark = !self.mark;
        let (idx, gen) = self.types.insert(ty);
        self.strategy.acknowledge_track_type();
        TypeRef { idx, gen }
    }

    pub fn next_type_id(&self) -> u64 {
        self.next_type_id + 1
    }

    // ==================== accessors ====================

    pub fn object(&self, r: ObjRef) -> Option<&Object> {
        self.objects.get(r.idx, r.gen)
    }

    pub fn object_mut(&mut self, r: ObjRef) -> Option<&mut Object> {
        self.objects.get_mut(r.idx, r.gen)
    }

    pub fn instance(&self, r: InsRef) -> Option<&Instance> {
        self.instances.get(r.idx, r.gen)
    }

    pub fn instance_mut(&mut self, r: InsRef) -> Option<&mut Instance> {
        self.instances.get_mut(r.idx, r.gen)
    }

    pub fn type_of(&self, r: TypeRef) -> Option<&Type> {
        self.types.get(r.idx, r.gen)
    }

    pub fn type_mut(&mut self, r: TypeRef) -> Option<&mut Type> {
        self.types.get_mut(r.idx, r.gen)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn is_live(&self, r: ObjRef) -> bool {
        self.object(r).is_some()
    }

    // ==================== holds ====================

    /// Makes `object` a root until released. Hold counts nest.
    pub fn hold(&mut self, object: ObjRef) {
        *self.held.entry(object).or_insert(0) += 1;
    }

    pub fn release(&mut self, object: ObjRef) {
        if let Some(count) = self.held.get_mut(&object) {
            *count -= 1;
            if *count == 0 {
                self.held.remove(&object);
            }
        }
    }

    pub fn hold_count(&self, object: ObjRef) -> u64 {
        self.held.get(&object).copied().unwrap_or(0)
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    // ==================== cycle ====================

    /// Ping: lets the strategy decide whether to run a cycle now.
    /// Roots beyond the held set must be supplied by the caller.
    pub fn ping(&mut self, obj_roots: &[ObjRef], type_roots: &[TypeRef]) {
        if !self.enabled {
            return;
        }
        self.strategy.acknowledge_ping();
        if self.strategy.wants_cycle() {
            self.run_cycle(obj_roots, type_roots);
        }
    }

    /// Full mark-and-sweep cycle. `obj_roots` and `type_roots` are the
    /// caller-visible roots (scopes, globals, literal cache, singletons,
    /// builtin types); held objects are added internally.
    pub fn run_cycle(&mut self, obj_roots: &[ObjRef], type_roots: &[TypeRef]) {
        let mark = self.mark;

        let mut work: Vec<Work> = Vec::with_capacity(obj_roots.len() + type_roots.len());
        work.extend(obj_roots.iter().map(|&r| Work::Obj(r)));
        work.extend(type_roots.iter().map(|&r| Work::Type(r)));
        work.extend(self.held.keys().map(|&r| Work::Obj(r)));

        let mut reachable: Vec<ObjRef> = Vec::new();
        while let Some(item) = work.pop() {
            match item {
                Work::Obj(r) => {
                    let Some(obj) = self.objects.get_mut(r.idx, r.gen) else {
                        continue;
                    };
                    if obj.gc_mark == mark {
                        continue;
                    }
                    obj.gc_mark = mark;
                    if let Some(ins) = obj.instance {
                        work.push(Work::Ins(ins));
                    }
                    work.push(Work::Type(obj.type_ref));
                }
                Work::Ins(r) => {
                    let Some(ins) = self.instances.get_mut(r.idx, r.gen) else {
                        continue;
                    };
                    if ins.gc_mark == mark {
                        continue;
                    }
                    ins.gc_mark = mark;
                    reachable.clear();
                    ins.data.reachable(&mut reachable);
                    work.extend(reachable.iter().map(|&o| Work::Obj(o)));
                }
                Work::Type(r) => {
                    let Some(ty) = self.types.get_mut(r.idx, r.gen) else {
                        continue;
                    };
                    if ty.gc_mark == mark {
                        continue;
                    }
                    ty.gc_mark = mark;
                    work.extend(ty.methods.values().map(|&o| Work::Obj(o)));
                }
            }
        }

        // sweep
        let mut swept = 0usize;
        for (idx, gen) in self.objects.refs() {
            let dead = self
                .objects
                .get(idx, gen)
                .map(|o| o.gc_mark != mark)
                .unwrap_or(false);
            if dead {
                self.objects.remove(idx, gen);
                self.strategy.acknowledge_untrack_object();
                swept += 1;
            }
        }
        for (idx, gen) in self.instances.refs() {
            let dead_bytes = self.instances.get(idx, gen).and_then(|i| {
                if i.gc_mark != mark {
                    Some(i.byte_size)
                } else {
                    None
                }
            });
            if let Some(bytes) = dead_bytes {
                self.instances.remove(idx, gen);
                self.strategy.acknowledge_untrack_instance(bytes);
                swept += 1;
            }
        }
        for (idx, gen) in self.types.refs() {
            let dead = self
                .types
                .get(idx, gen)
                .map(|t| t.gc_mark != mark)
                .unwrap_or(false);
            if dead {
                self.types.remove(idx, gen);
                self.strategy.acknowledge_untrack_type();
                swept += 1;
            }
        }

        self.mark = !self.mark;
        self.strategy.acknowledge_end_of_cycle();
        log::debug!(
            "gc cycle: swept {}, live {} objects / {} instances / {} types",
            swept,
            self.objects.len(),
            self.instances.len(),
            self.types.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::InstanceData;
    use crate::types::TypeKind;

    fn instance_of(data: InstanceData) -> Instance {
        Instance {
            id: 0,
            gc_mark: false,
            byte_size: data.byte_size(),
            data,
        }
    }

    fn object_over(ins: InsRef, ty: TypeRef) -> Object {
        Object {
            id: 0,
            is_instance: true,
            instance: Some(ins),
            type_ref: ty,
            gc_mark: false,
            can_modify: true,
            single_use: false,
        }
    }

    #[test]
    fn test_cycle_reclaims_unreachable_keeps_rooted() {
        let mut gc = Gc::new(Box::new(AlwaysStrategy));
        let ty = gc.track_type(Type::new(TypeKind::Integer, 0, false));

        let dead_ins = gc.track_instance(instance_of(InstanceData::Integer(1)));
        let dead = gc.track_object(object_over(dead_ins, ty));
        let live_ins = gc.track_instance(instance_of(InstanceData::Integer(2)));
        let live = gc.track_object(object_over(live_ins, ty));

        gc.run_cycle(&[live], &[ty]);

        assert!(gc.object(dead).is_none());
        assert!(gc.instance(dead_ins).is_none());
        assert!(gc.object(live).is_some());
        assert!(gc.instance(live_ins).is_some());
        assert!(gc.type_of(ty).is_some());
    }

    #[test]
    fn test_held_objects_survive_without_roots() {
        let mut gc = Gc::new(Box::new(AlwaysStrategy));
        let ty = gc.track_type(Type::new(TypeKind::Integer, 0, false));
        let ins = gc.track_instance(instance_of(InstanceData::Integer(3)));
        let obj = gc.track_object(object_over(ins, ty));

        gc.hold(obj);
        gc.run_cycle(&[], &[ty]);
        assert!(gc.object(obj).is_some());

        gc.release(obj);
        gc.run_cycle(&[], &[ty]);
        assert!(gc.object(obj).is_none());
    }

    #[test]
    fn test_aggregates_keep_their_elements() {
        let mut gc = Gc::new(Box::new(AlwaysStrategy));
        let int_ty = gc.track_type(Type::new(TypeKind::Integer, 0, false));
        let arr_ty = gc.track_type(Type::new(TypeKind::Array, 0, false));

        let elem_ins = gc.track_instance(instance_of(InstanceData::Integer(5)));
        let elem = gc.track_object(object_over(elem_ins, int_ty));
        let arr_ins = gc.track_instance(instance_of(InstanceData::Array(vec![elem])));
        let arr = gc.track_object(object_over(arr_ins, arr_ty));

        gc.run_cycle(&[arr], &[int_ty, arr_ty]);

        assert!(gc.object(elem).is_some(), "array elements are reachable");
        assert!(gc.object(arr).is_some());
    }

    #[test]
    fn test_default_strategy_triggers_on_growth() {
        let mut s = DefaultStrategy::default();
        s.acknowledge_ping();
        assert!(!s.wants_cycle());

        for _ in 0..70_000 {
            s.acknowledge_track_instance(16);
        }
        assert!(s.wants_cycle());

        s.acknowledge_end_of_cycle();
        assert!(!s.wants_cycle());
    }
}

