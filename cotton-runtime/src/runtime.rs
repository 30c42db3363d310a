// The runtime orchestrator: owns the GC, the name table, the scope chain,
// globals, the literal cache, and the protected singletons; resolves
// operators and methods; carries the execution-flag word and the
// error-context stack.

use crate::error::{ErrorKind, RuntimeError};
use crate::gc::{DefaultStrategy, Gc, GcStrategy};
use crate::heap::{ObjRef, TypeRef};
use crate::instance::{FunctionSource, Instance, InstanceData, NativeFn};
use crate::object::Object;
use crate::scope::ScopeStack;
use crate::types::{MagicMethods, Type, TypeKind};
use crate::{builtin, flags};
use cotton_ast::{NameId, NameTable, OpId, Span};
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Which object `make` should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    InstanceObject,
    TypeObject,
}

/// One entry of the error-context stack. `area` covers the construct being
/// evaluated; `sub_areas` pin its operands (for a call, `sub_areas[0]` is
/// the callee and `sub_areas[i]` the ith argument).
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub area: Span,
    pub sub_areas: Vec<Span>,
}

/// The eight builtin type handles, in creation order; their ids are fixed.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinTypes {
    pub function: TypeRef,
    pub nothing: TypeRef,
    pub boolean: TypeRef,
    pub integer: TypeRef,
    pub real: TypeRef,
    pub character: TypeRef,
    pub string: TypeRef,
    pub array: TypeRef,
}

pub struct Runtime {
    pub gc: Gc,
    pub names: NameTable,
    pub scopes: ScopeStack,
    pub magic: MagicMethods,
    pub builtin_types: BuiltinTypes,

    globals: HashMap<NameId, ObjRef>,
    type_objects: HashMap<TypeRef, ObjRef>,
    readonly_literals: HashMap<NameId, ObjRef>,

    protected_nothing: ObjRef,
    protected_true: ObjRef,
    protected_false: ObjRef,

    contexts: Vec<ErrorContext>,
    exec_flags: u8,

    /// Where the print family writes; swappable so tests can capture output.
    pub out: Box<dyn Write>,
    /// Where the read family reads from.
    pub input: Box<dyn BufRead>,
    /// Source file currently executing; module and library resolution is
    /// relative to its directory.
    pub source_path: Option<PathBuf>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_strategy(Box::new(DefaultStrategy::default()))
    }

    pub fn with_strategy(strategy: Box<dyn GcStrategy>) -> Self {
        let mut names = NameTable::new();
        let magic = MagicMethods::intern(&mut names);
        let mut gc = Gc::new(strategy);

        // The canonical types are created first so they get the fixed ids.
        let builtin_types = BuiltinTypes {
            function: gc.track_type(builtin::function::make_type()),
            nothing: gc.track_type(builtin::nothing::make_type()),
            boolean: gc.track_type(builtin::boolean::make_type()),
            integer: gc.track_type(builtin::integer::make_type()),
            real: gc.track_type(builtin::real::make_type()),
            character: gc.track_type(builtin::character::make_type()),
            string: gc.track_type(builtin::string::make_type()),
            array: gc.track_type(builtin::array::make_type()),
        };

        let protected_nothing =
            raw_instance_object(&mut gc, builtin_types.nothing, InstanceData::Nothing);
        let protected_true =
            raw_instance_object(&mut gc, builtin_types.boolean, InstanceData::Boolean(true));
        let protected_false =
            raw_instance_object(&mut gc, builtin_types.boolean, InstanceData::Boolean(false));
        for obj in [protected_nothing, protected_true, protected_false] {
            if let Some(o) = gc.object_mut(obj) {
                o.can_modify = false;
            }
            gc.hold(obj);
        }

        let mut rt = Self {
            gc,
            names,
            scopes: ScopeStack::new(),
            magic,
            builtin_types,
            globals: HashMap::new(),
            type_objects: HashMap::new(),
            readonly_literals: HashMap::new(),
            protected_nothing,
            protected_true,
            protected_false,
            contexts: vec![ErrorContext::default()],
            exec_flags: flags::NONE,
            out: Box::new(std::io::stdout()),
            input: Box::new(std::io::BufReader::new(std::io::stdin())),
            source_path: None,
        };

        rt.bind_type_object("Function", rt.builtin_types.function);
        rt.bind_type_object("Nothing", rt.builtin_types.nothing);
        rt.bind_type_object("Boolean", rt.builtin_types.boolean);
        rt.bind_type_object("Integer", rt.builtin_types.integer);
        rt.bind_type_object("Real", rt.builtin_types.real);
        rt.bind_type_object("Character", rt.builtin_types.character);
        rt.bind_type_object("String", rt.builtin_types.string);
        rt.bind_type_object("Array", rt.builtin_types.array);

        builtin::install_methods(&mut rt);
        builtin::functions::install(&mut rt);
        rt
    }

    fn bind_type_object(&mut self, name: &str, ty: TypeRef) {
        let obj = self.alloc_type_object(ty);
        if let Some(o) = self.gc.object_mut(obj) {
            o.can_modify = false;
        }
        let id = self.names.intern(name);
        self.scopes.add_variable(id, obj);
        self.register_type_object(ty, obj);
    }

    // ==================== accessors ====================

    pub fn get_object(&self, r: ObjRef) -> Result<&Object, RuntimeError> {
        self.gc
            .object(r)
            .ok_or_else(|| self.error_here(ErrorKind::InvalidObject, "Not a valid object"))
    }

    pub fn get_object_mut(&mut self, r: ObjRef) -> Result<&mut Object, RuntimeError> {
        let err = self.error_here(ErrorKind::InvalidObject, "Not a valid object");
        self.gc.object_mut(r).ok_or(err)
    }

    pub fn get_type(&self, r: TypeRef) -> Result<&Type, RuntimeError> {
        self.gc
            .type_of(r)
            .ok_or_else(|| self.error_here(ErrorKind::InvalidObject, "Not a valid type"))
    }

    /// Instance payload of an instance object.
    pub fn data(&self, obj: ObjRef) -> Result<&InstanceData, RuntimeError> {
        let o = self.get_object(obj)?;
        let ins = o.instance.ok_or_else(|| {
            self.error_here(
                ErrorKind::TypeMismatch,
                format!("{} must be an instance object", self.describe(obj)),
            )
        })?;
        self.gc
            .instance(ins)
            .map(|i| &i.data)
            .ok_or_else(|| self.error_here(ErrorKind::InvalidObject, "Not a valid object"))
    }

    pub fn data_mut(&mut self, obj: ObjRef) -> Result<&mut InstanceData, RuntimeError> {
        let o = self.get_object(obj)?;
        let ins = o.instance.ok_or_else(|| {
            self.error_here(
                ErrorKind::TypeMismatch,
                format!("{} must be an instance object", self.describe(obj)),
            )
        })?;
        let err = self.error_here(ErrorKind::InvalidObject, "Not a valid object");
        self.gc.instance_mut(ins).map(|i| &mut i.data).ok_or(err)
    }

    pub fn bool_value(&self, obj: ObjRef) -> Result<bool, RuntimeError> {
        match self.data(obj)? {
            InstanceData::Boolean(v) => Ok(*v),
            _ => Err(self.type_error(obj, self.builtin_types.boolean)),
        }
    }

    pub fn int_value(&self, obj: ObjRef) -> Result<i64, RuntimeError> {
        match self.data(obj)? {
            InstanceData::Integer(v) => Ok(*v),
            _ => Err(self.type_error(obj, self.builtin_types.integer)),
        }
    }

    pub fn real_value(&self, obj: ObjRef) -> Result<f64, RuntimeError> {
        match self.data(obj)? {
            InstanceData::Real(v) => Ok(*v),
            _ => Err(self.type_error(obj, self.builtin_types.real)),
        }
    }

    pub fn char_value(&self, obj: ObjRef) -> Result<char, RuntimeError> {
        match self.data(obj)? {
            InstanceData::Character(v) => Ok(*v),
            _ => Err(self.type_error(obj, self.builtin_types.character)),
        }
    }

    pub fn string_value(&self, obj: ObjRef) -> Result<&str, RuntimeError> {
        match self.data(obj)? {
            InstanceData::String(v) => Ok(v.as_str()),
            _ => Err(self.type_error(obj, self.builtin_types.string)),
        }
    }

    fn type_error(&self, obj: ObjRef, expected: TypeRef) -> RuntimeError {
        self.error_here(
            ErrorKind::TypeMismatch,
            format!(
                "{} is not of type {}",
                self.describe(obj),
                self.type_name(expected)
            ),
        )
    }

    // ==================== allocation ====================

    pub fn alloc_instance(&mut self, ty: TypeRef, data: InstanceData) -> ObjRef {
        raw_instance_object(&mut self.gc, ty, data)
    }

    pub fn alloc_type_object(&mut self, ty: TypeRef) -> ObjRef {
        self.gc.track_object(Object {
            id: 0,
            is_instance: false,
            instance: None,
            type_ref: ty,
            gc_mark: false,
            can_modify: true,
            single_use: false,
        })
    }

    /// Creates a new object of `ty`. Instance objects go through the type's
    /// `create` slot; the result is marked single-use.
    pub fn make(&mut self, ty: TypeRef, kind: ObjectKind) -> Result<ObjRef, RuntimeError> {
        if self.gc.type_of(ty).is_none() {
            return Err(self.error_here(
                ErrorKind::ObjectCreationError,
                "Failed to make an object of an invalid type",
            ));
        }
        let obj = match kind {
            ObjectKind::InstanceObject => {
                let create = self.get_type(ty)?.create.ok_or_else(|| {
                    self.error_here(
                        ErrorKind::ObjectCreationError,
                        format!("Failed to make an object of type {}", self.type_name(ty)),
                    )
                })?;
                create(self, ty)?
            }
            ObjectKind::TypeObject => self.alloc_type_object(ty),
        };
        self.spread_single_use(obj);
        Ok(obj)
    }

    /// Wraps a native function into a function instance object.
    pub fn native_function(&mut self, f: NativeFn) -> ObjRef {
        self.alloc_instance(
            self.builtin_types.function,
            InstanceData::Function(FunctionSource::Native(f)),
        )
    }

    pub fn new_nothing(&mut self) -> ObjRef {
        let obj = self.alloc_instance(self.builtin_types.nothing, InstanceData::Nothing);
        self.spread_single_use(obj);
        obj
    }

    pub fn new_boolean(&mut self, v: bool) -> ObjRef {
        let obj = self.alloc_instance(self.builtin_types.boolean, InstanceData::Boolean(v));
        self.spread_single_use(obj);
        obj
    }

    pub fn new_integer(&mut self, v: i64) -> ObjRef {
        let obj = self.alloc_instance(self.builtin_types.integer, InstanceData::Integer(v));
        self.spread_single_use(obj);
        obj
    }

    pub fn new_real(&mut self, v: f64) -> ObjRef {
        let obj = self.alloc_instance(self.builtin_types.real, InstanceData::Real(v));
        self.spread_single_use(obj);
        obj
    }

    pub fn new_character(&mut self, v: char) -> ObjRef {
        let obj = self.alloc_instance(self.builtin_types.character, InstanceData::Character(v));
        self.spread_single_use(obj);
        obj
    }

    pub fn new_string(&mut self, v: String) -> ObjRef {
        let obj = self.alloc_instance(self.builtin_types.string, InstanceData::String(v));
        self.spread_single_use(obj);
        obj
    }

    pub fn new_array(&mut self, items: Vec<ObjRef>) -> ObjRef {
        let obj = self.alloc_instance(self.builtin_types.array, InstanceData::Array(items));
        self.spread_single_use(obj);
        obj
    }

    /// Installs a method on a type's method table.
    pub fn add_method(&mut self, ty: TypeRef, id: NameId, method: ObjRef) {
        if let Some(t) = self.gc.type_mut(ty) {
            t.add_method(id, method);
        }
    }

    /// Whether an instance object has a record field named `id`.
    pub fn has_field(&self, obj: ObjRef, id: NameId) -> bool {
        matches!(self.data(obj), Ok(InstanceData::Record(rec)) if rec.fields.contains_key(&id))
    }

    // ==================== copy & assignment ====================

    /// Copy per the type's copy slot. Single-use objects are handed back
    /// unchanged; the elision is observable and intended.
    pub fn copy(&mut self, obj: ObjRef) -> Result<ObjRef, RuntimeError> {
        let o = self.get_object(obj)?;
        if o.single_use {
            return Ok(obj);
        }
        if !o.is_instance {
            // type objects copy as fresh handles to the same type
            let ty = o.type_ref;
            return Ok(self.alloc_type_object(ty));
        }
        let ty = o.type_ref;
        let copy_fn = self.get_type(ty)?.copy.ok_or_else(|| {
            self.error_here(
                ErrorKind::InternalError,
                format!("{} cannot be copied", self.describe(obj)),
            )
        })?;
        let res = copy_fn(self, obj)?;
        self.spread_single_use(res);
        Ok(res)
    }

    /// Copy through the type's copy slot unconditionally, without the
    /// single-use elision. Operator adapters use this to snapshot values.
    pub fn force_copy(&mut self, obj: ObjRef) -> Result<ObjRef, RuntimeError> {
        let o = self.get_object(obj)?;
        if !o.is_instance {
            let ty = o.type_ref;
            return Ok(self.alloc_type_object(ty));
        }
        let ty = o.type_ref;
        let copy_fn = self.get_type(ty)?.copy.ok_or_else(|| {
            self.error_here(
                ErrorKind::InternalError,
                format!("{} cannot be copied", self.describe(obj)),
            )
        })?;
        copy_fn(self, obj)
    }

    /// Rebinds `target` in place to the same instance as `source` (no copy).
    pub fn assign_to(&mut self, target: ObjRef, source: ObjRef) -> Result<(), RuntimeError> {
        self.check_modifiable(target)?;
        let src = self.get_object(source)?.clone();
        let dst = self.get_object_mut(target)?;
        dst.is_instance = src.is_instance;
        dst.instance = src.instance;
        dst.type_ref = src.type_ref;
        dst.single_use = src.single_use;
        self.spread_multi_use(target);
        Ok(())
    }

    /// Rebinds `target` in place to a copy of `source`.
    pub fn assign_to_copy_of(&mut self, target: ObjRef, source: ObjRef) -> Result<(), RuntimeError> {
        self.check_modifiable(target)?;
        let copied = self.copy(source)?;
        self.assign_to(target, copied)
    }

    fn check_modifiable(&self, target: ObjRef) -> Result<(), RuntimeError> {
        if !self.get_object(target)?.can_modify {
            return Err(self.error_here(
                ErrorKind::AssignmentToImmutable,
                format!("Cannot assign to {}", self.describe(target)),
            ));
        }
        Ok(())
    }

    /// Marks `obj` freshly produced. The mark stays on the object itself;
    /// elements of aggregates keep their own history.
    pub fn spread_single_use(&mut self, obj: ObjRef) {
        if let Some(o) = self.gc.object_mut(obj) {
            o.single_use = true;
        }
    }

    /// Clears the freshly-produced mark, one level into aggregates too;
    /// called when `obj` gets bound to a name.
    pub fn spread_multi_use(&mut self, obj: ObjRef) {
        let Some(o) = self.gc.object_mut(obj) else { return };
        o.single_use = false;
        let Some(ins) = o.instance else { return };
        let mut inner = Vec::new();
        if let Some(i) = self.gc.instance(ins) {
            i.data.reachable(&mut inner);
        }
        for r in inner {
            if let Some(io) = self.gc.object_mut(r) {
                io.single_use = false;
            }
        }
    }

    // ==================== operator & method dispatch ====================

    pub fn run_unary(
        &mut self,
        op: OpId,
        obj: ObjRef,
        matters: bool,
    ) -> Result<ObjRef, RuntimeError> {
        let ty = self.get_object(obj)?.type_ref;
        if let Some(f) = self.get_type(ty)?.unary_slot(op) {
            return f(self, obj, matters);
        }
        if let Some(method) = self.magic_method(ty, op)? {
            return self.run_nary(OpId::Call, method, &[obj], matters);
        }
        Err(self.unsupported_operator(obj, op))
    }

    pub fn run_binary(
        &mut self,
        op: OpId,
        obj: ObjRef,
        arg: ObjRef,
        matters: bool,
    ) -> Result<ObjRef, RuntimeError> {
        self.get_object(arg)?;
        let ty = self.get_object(obj)?.type_ref;
        if let Some(f) = self.get_type(ty)?.binary_slot(op) {
            return f(self, obj, arg, matters);
        }
        if let Some(method) = self.magic_method(ty, op)? {
            return self.run_nary(OpId::Call, method, &[obj, arg], matters);
        }
        Err(self.unsupported_operator(obj, op))
    }

    pub fn run_nary(
        &mut self,
        op: OpId,
        obj: ObjRef,
        args: &[ObjRef],
        matters: bool,
    ) -> Result<ObjRef, RuntimeError> {
        let ty = self.get_object(obj)?.type_ref;
        if let Some(f) = self.get_type(ty)?.nary_slot(op) {
            return f(self, obj, args, matters);
        }
        if let Some(method) = self.magic_method(ty, op)? {
            let mut full = Vec::with_capacity(args.len() + 1);
            full.push(obj);
            full.extend_from_slice(args);
            return self.run_nary(OpId::Call, method, &full, matters);
        }
        Err(self.unsupported_operator(obj, op))
    }

    /// The method a vtable-less operator falls back to, if defined.
    fn magic_method(&self, ty: TypeRef, op: OpId) -> Result<Option<ObjRef>, RuntimeError> {
        let Some(mid) = self.magic.for_op(op) else {
            return Ok(None);
        };
        Ok(self.get_type(ty)?.get_method(mid))
    }

    fn unsupported_operator(&self, obj: ObjRef, op: OpId) -> RuntimeError {
        self.error_here(
            ErrorKind::OperatorNotSupported,
            format!(
                "{} doesn't support operator '{}'",
                self.describe(obj),
                op.symbol()
            ),
        )
    }

    /// Runs the method `id` on `obj`. `args` must already include the
    /// receiver in first position.
    pub fn run_method(
        &mut self,
        id: NameId,
        obj: ObjRef,
        args: &[ObjRef],
        matters: bool,
    ) -> Result<ObjRef, RuntimeError> {
        let ty = self.get_object(obj)?.type_ref;
        let method = self.get_type(ty)?.get_method(id).ok_or_else(|| {
            self.error_here(
                ErrorKind::MethodNotFound,
                format!(
                    "{} doesn't have method '{}'",
                    self.describe(obj),
                    self.names.resolve(id)
                ),
            )
        })?;
        self.run_nary(OpId::Call, method, args, matters)
    }

    // ==================== globals & registries ====================

    pub fn check_global(&self, id: NameId) -> bool {
        self.globals.contains_key(&id)
    }

    pub fn get_global(&self, id: NameId) -> Result<ObjRef, RuntimeError> {
        self.globals.get(&id).copied().ok_or_else(|| {
            self.error_here(
                ErrorKind::NameNotFound,
                format!("Global not found: {}", self.names.resolve(id)),
            )
        })
    }

    pub fn set_global(&mut self, id: NameId, obj: ObjRef) {
        self.globals.insert(id, obj);
    }

    pub fn remove_global(&mut self, id: NameId) {
        self.globals.remove(&id);
    }

    pub fn register_type_object(&mut self, ty: TypeRef, obj: ObjRef) {
        self.type_objects.insert(ty, obj);
    }

    /// The registered type object for `ty`, or the protected Nothing.
    pub fn type_object(&self, ty: TypeRef) -> ObjRef {
        self.type_objects
            .get(&ty)
            .copied()
            .unwrap_or(self.protected_nothing)
    }

    pub fn cached_literal(&self, id: NameId) -> Option<ObjRef> {
        self.readonly_literals.get(&id).copied()
    }

    /// Caches a literal object: protected from assignment, held for the
    /// interpreter's lifetime, and left single-use so copies of it elide.
    /// The elision is what makes `is(nothing, nothing)` hold.
    pub fn cache_literal(&mut self, id: NameId, obj: ObjRef) {
        self.gc.hold(obj);
        if let Some(o) = self.gc.object_mut(obj) {
            o.can_modify = false;
            o.single_use = true;
        }
        self.readonly_literals.insert(id, obj);
    }

    // ==================== protected singletons ====================

    pub fn protected_nothing(&self) -> ObjRef {
        self.protected_nothing
    }

    pub fn protected_boolean(&self, val: bool) -> ObjRef {
        if val {
            self.protected_true
        } else {
            self.protected_false
        }
    }

    // ==================== scope plumbing ====================

    /// Binds `id` in the current frame; the bound object stops being
    /// single-use.
    pub fn add_variable(&mut self, id: NameId, obj: ObjRef) {
        self.spread_multi_use(obj);
        self.scopes.add_variable(id, obj);
    }

    pub fn lookup_variable(&self, id: NameId) -> Result<ObjRef, RuntimeError> {
        self.scopes.get(id).ok_or_else(|| {
            let name = self.names.resolve(id).to_string();
            let visible = self.scopes.visible_names();
            let candidates: Vec<&str> = visible
                .iter()
                .filter_map(|n| self.names.lookup(*n))
                .collect();
            let mut message = format!("Failed to find variable {}", name);
            if let Some(hint) =
                cotton_diagnostics::suggest_similar(&name, candidates.into_iter())
            {
                message.push_str(&format!(" (did you mean '{}'?)", hint));
            }
            self.error_here(ErrorKind::NameNotFound, message)
        })
    }

    // ==================== error contexts ====================

    pub fn push_context(&mut self) {
        self.contexts.push(ErrorContext::default());
    }

    pub fn pop_context(&mut self) {
        if self.contexts.len() > 1 {
            self.contexts.pop();
        }
    }

    pub fn context_mut(&mut self) -> &mut ErrorContext {
        self.contexts.last_mut().expect("context stack never empty")
    }

    pub fn context_area(&self) -> Span {
        self.contexts.last().map(|c| c.area).unwrap_or_default()
    }

    pub fn sub_area(&self, i: usize) -> Span {
        self.contexts
            .last()
            .and_then(|c| c.sub_areas.get(i).copied())
            .unwrap_or_else(|| self.context_area())
    }

    /// Builds an error, snapshotting the "Error occurred here" trace from
    /// the context stack (oldest first, duplicates and the failing span
    /// itself elided).
    pub fn error(&self, kind: ErrorKind, message: impl Into<String>, span: Span) -> RuntimeError {
        let mut trace = Vec::new();
        let mut prev = Span::default();
        for ctx in &self.contexts {
            if ctx.area.is_empty() {
                continue;
            }
            if ctx.area == prev || ctx.area == span {
                continue;
            }
            trace.push(ctx.area);
            prev = ctx.area;
        }
        RuntimeError {
            kind,
            message: message.into(),
            span,
            trace,
        }
    }

    pub fn error_here(&self, kind: ErrorKind, message: impl Into<String>) -> RuntimeError {
        self.error(kind, message, self.context_area())
    }

    /// Resets evaluation state after a fatal error unwound to the harness:
    /// all frames but the global one are released, the context stack is
    /// emptied, and the flag word cleared.
    pub fn reset_after_error(&mut self) {
        self.scopes.reset();
        self.contexts.truncate(1);
        if let Some(ctx) = self.contexts.last_mut() {
            ctx.area = Span::default();
            ctx.sub_areas.clear();
        }
        self.exec_flags = flags::NONE;
    }

    // ==================== execution flags ====================

    pub fn clear_exec_flags(&mut self) {
        self.exec_flags = flags::NONE;
    }

    pub fn set_exec_continue(&mut self) {
        self.exec_flags = flags::CONTINUE;
    }

    pub fn set_exec_break(&mut self) {
        self.exec_flags = flags::BREAK;
    }

    pub fn set_exec_return(&mut self) {
        self.exec_flags = flags::RETURN;
    }

    pub fn set_exec_direct_pass(&mut self) {
        self.exec_flags = flags::DIRECT_PASS;
    }

    pub fn is_exec_none(&self) -> bool {
        self.exec_flags == flags::NONE
    }

    pub fn is_exec_continue(&self) -> bool {
        self.exec_flags & flags::CONTINUE != 0
    }

    pub fn is_exec_break(&self) -> bool {
        self.exec_flags & flags::BREAK != 0
    }

    pub fn is_exec_return(&self) -> bool {
        self.exec_flags & flags::RETURN != 0
    }

    pub fn is_exec_direct_pass(&self) -> bool {
        self.exec_flags & flags::DIRECT_PASS != 0
    }

    // ==================== garbage collection ====================

    fn gc_roots(&self) -> (Vec<ObjRef>, Vec<TypeRef>) {
        let mut objs = vec![
            self.protected_nothing,
            self.protected_true,
            self.protected_false,
        ];
        for frame in self.scopes.frames() {
            objs.extend(frame.variables.values().copied());
            objs.extend(frame.arguments.iter().copied());
        }
        objs.extend(self.globals.values().copied());
        objs.extend(self.readonly_literals.values().copied());
        objs.extend(self.type_objects.values().copied());

        let types = vec![
            self.builtin_types.function,
            self.builtin_types.nothing,
            self.builtin_types.boolean,
            self.builtin_types.integer,
            self.builtin_types.real,
            self.builtin_types.character,
            self.builtin_types.string,
            self.builtin_types.array,
        ];
        (objs, types)
    }

    /// Lets the GC strategy decide whether to collect now. Called at every
    /// statement boundary.
    pub fn gc_ping(&mut self) {
        let (objs, types) = self.gc_roots();
        self.gc.ping(&objs, &types);
    }

    /// Forces a full mark-sweep cycle.
    pub fn gc_collect(&mut self) {
        let (objs, types) = self.gc_roots();
        self.gc.run_cycle(&objs, &types);
    }

    // ==================== predicates & verification ====================

    pub fn is_instance_object(&self, obj: ObjRef, ty: Option<TypeRef>) -> bool {
        match self.gc.object(obj) {
            Some(o) => o.instance.is_some() && ty.map_or(true, |t| o.type_ref == t),
            None => false,
        }
    }

    pub fn is_type_object(&self, obj: ObjRef, ty: Option<TypeRef>) -> bool {
        match self.gc.object(obj) {
            Some(o) => o.instance.is_none() && ty.map_or(true, |t| o.type_ref == t),
            None => false,
        }
    }

    pub fn is_of_type(&self, obj: ObjRef, ty: TypeRef) -> bool {
        self.gc.object(obj).map_or(false, |o| o.type_ref == ty)
    }

    pub fn verify_instance(&self, obj: ObjRef, ty: Option<TypeRef>) -> Result<(), RuntimeError> {
        if !self.is_instance_object(obj, ty) {
            return Err(match ty {
                Some(t) => self.error_here(
                    ErrorKind::TypeMismatch,
                    format!(
                        "{} is not an instance object of type {}",
                        self.describe(obj),
                        self.type_name(t)
                    ),
                ),
                None => self.error_here(
                    ErrorKind::TypeMismatch,
                    format!("{} is not an instance object", self.describe(obj)),
                ),
            });
        }
        Ok(())
    }

    pub fn verify_type_object(&self, obj: ObjRef, ty: Option<TypeRef>) -> Result<(), RuntimeError> {
        if !self.is_type_object(obj, ty) {
            return Err(self.error_here(
                ErrorKind::TypeMismatch,
                format!("{} is not a type object", self.describe(obj)),
            ));
        }
        Ok(())
    }

    pub fn verify_exact_args(&self, args: &[ObjRef], amount: usize) -> Result<(), RuntimeError> {
        if args.len() != amount {
            return Err(self.error_here(
                ErrorKind::ArityMismatch,
                format!("Expected exactly {} arguments, got {}", amount, args.len()),
            ));
        }
        Ok(())
    }

    pub fn verify_min_args(&self, args: &[ObjRef], amount: usize) -> Result<(), RuntimeError> {
        if args.len() < amount {
            return Err(self.error_here(
                ErrorKind::ArityMismatch,
                format!("Expected at least {} arguments, got {}", amount, args.len()),
            ));
        }
        Ok(())
    }

    /// Method variant: the receiver in first position is not counted.
    pub fn verify_exact_method_args(
        &self,
        args: &[ObjRef],
        amount: usize,
    ) -> Result<(), RuntimeError> {
        if args.len() != amount + 1 {
            return Err(self.error_here(
                ErrorKind::ArityMismatch,
                format!(
                    "Expected exactly {} arguments, got {}",
                    amount,
                    args.len().saturating_sub(1)
                ),
            ));
        }
        Ok(())
    }

    pub fn verify_has_method(&self, obj: ObjRef, id: NameId) -> Result<(), RuntimeError> {
        let ty = self.get_object(obj)?.type_ref;
        if !self.get_type(ty)?.has_method(id) {
            return Err(self.error_here(
                ErrorKind::MethodNotFound,
                format!(
                    "{} doesn't have method '{}'",
                    self.describe(obj),
                    self.names.resolve(id)
                ),
            ));
        }
        Ok(())
    }

    // ==================== input ====================

    fn read_byte(&mut self) -> Option<u8> {
        let buf = self.input.fill_buf().ok()?;
        if buf.is_empty() {
            return None;
        }
        let b = buf[0];
        self.input.consume(1);
        Some(b)
    }

    fn peek_byte(&mut self) -> Option<u8> {
        let buf = self.input.fill_buf().ok()?;
        buf.first().copied()
    }

    /// Next whitespace-delimited token from the input sink.
    pub fn read_token(&mut self) -> Result<String, RuntimeError> {
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_whitespace() {
                self.input.consume(1);
            } else {
                break;
            }
        }
        let mut bytes = Vec::new();
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_whitespace() {
                break;
            }
            bytes.push(b);
            self.input.consume(1);
        }
        if bytes.is_empty() {
            return Err(self.error_here(ErrorKind::DomainError, "Unexpected end of input"));
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Next non-whitespace character from the input sink.
    pub fn read_char(&mut self) -> Result<char, RuntimeError> {
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_whitespace() {
                self.input.consume(1);
            } else {
                break;
            }
        }
        match self.read_byte() {
            Some(b) => Ok(b as char),
            None => Err(self.error_here(ErrorKind::DomainError, "Unexpected end of input")),
        }
    }

    /// Rest of the current input line, without the newline.
    pub fn read_line(&mut self) -> Result<String, RuntimeError> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(_) => {
                while line.ends_with('\n') || line.ends_with('\r') {
                    line.pop();
                }
                Ok(line)
            }
            Err(e) => Err(self.error_here(ErrorKind::DomainError, format!("Read failed: {}", e))),
        }
    }

    // ==================== representation ====================

    /// Printable name of a type.
    pub fn type_name(&self, ty: TypeRef) -> String {
        match self.gc.type_of(ty) {
            Some(t) => match t.kind {
                TypeKind::Function => "Function".to_string(),
                TypeKind::Nothing => "Nothing".to_string(),
                TypeKind::Boolean => "Boolean".to_string(),
                TypeKind::Integer => "Integer".to_string(),
                TypeKind::Real => "Real".to_string(),
                TypeKind::Character => "Character".to_string(),
                TypeKind::String => "String".to_string(),
                TypeKind::Array => "Array".to_string(),
                TypeKind::Record => t
                    .name_id
                    .map(|id| self.names.resolve(id).to_string())
                    .unwrap_or_else(|| "Record".to_string()),
            },
            None => "?INVALID_TYPE?".to_string(),
        }
    }

    /// Short human-readable description of an object, for error messages.
    pub fn describe(&self, obj: ObjRef) -> String {
        let Some(o) = self.gc.object(obj) else {
            return "an invalid object".to_string();
        };
        if o.instance.is_none() {
            return self.type_name(o.type_ref);
        }
        let Some(ins) = o.instance.and_then(|r| self.gc.instance(r)) else {
            return "an invalid object".to_string();
        };
        match &ins.data {
            InstanceData::Nothing => "Nothing".to_string(),
            InstanceData::Boolean(v) => format!("Boolean(value = {})", v),
            InstanceData::Integer(v) => format!("Integer(value = {})", v),
            InstanceData::Real(v) => format!("Real(value = {})", v),
            InstanceData::Character(v) => format!("Character(value = '{}')", v),
            InstanceData::String(v) => format!("String(value = \"{}\")", v),
            InstanceData::Array(items) => format!("Array(of {} elements)", items.len()),
            InstanceData::Function(_) => "Function".to_string(),
            InstanceData::Record(rec) => self.names.resolve(rec.type_name).to_string(),
        }
    }

    /// User-facing string conversion: strings pass through, everything else
    /// goes through its `__string__` method.
    pub fn stringify(&mut self, obj: ObjRef) -> Result<String, RuntimeError> {
        if let Ok(InstanceData::String(s)) = self.data(obj) {
            return Ok(s.clone());
        }
        self.verify_has_method(obj, self.magic.mm_string)?;
        let res = self.run_method(self.magic.mm_string, obj, &[obj], true)?;
        Ok(self.string_value(res)?.to_string())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// Allocates an instance plus its wrapping object directly on the GC; used
/// during construction before the `Runtime` value exists.
fn raw_instance_object(gc: &mut Gc, ty: TypeRef, data: InstanceData) -> ObjRef {
    let byte_size = data.byte_size();
    let ins = gc.track_instance(Instance {
        id: 0,
        gc_mark: false,
        byte_size,
        data,
    });
    gc.track_object(Object {
        id: 0,
        is_instance: true,
        instance: Some(ins),
        type_ref: ty,
        gc_mark: false,
        can_modify: true,
        single_use: false,
    })
}
