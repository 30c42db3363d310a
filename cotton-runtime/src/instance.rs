use crate::error::RuntimeError;
use crate::heap::ObjRef;
use crate::runtime::Runtime;
use cotton_ast::{FuncDef, NameId};
use std::collections::HashMap;
use std::rc::Rc;

/// Signature of a native function or method. `args` includes the receiver
/// for methods; `matters` mirrors the evaluator's result-matters flag.
pub type NativeFn = fn(&mut Runtime, &[ObjRef], bool) -> Result<ObjRef, RuntimeError>;

/// What a function instance executes when called.
#[derive(Clone)]
pub enum FunctionSource {
    Native(NativeFn),
    User(Rc<FuncDef>),
}

impl std::fmt::Debug for FunctionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionSource::Native(_) => write!(f, "Native"),
            FunctionSource::User(def) => write!(f, "User({:?})", def.name),
        }
    }
}

/// Record payload: the defining type's name and the live field map.
#[derive(Debug, Clone)]
pub struct RecordData {
    pub type_name: NameId,
    pub fields: HashMap<NameId, ObjRef>,
}

/// Variant data of an instance object. Closed under the builtins plus the
/// open `Record` variant for user-defined types.
#[derive(Debug, Clone)]
pub enum InstanceData {
    Nothing,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Character(char),
    String(String),
    Array(Vec<ObjRef>),
    Function(FunctionSource),
    Record(RecordData),
}

/// A tracked instance: variant payload plus the collector's bookkeeping.
#[derive(Debug)]
pub struct Instance {
    pub id: u64,
    pub gc_mark: bool,
    /// Approximate heap footprint, fed to the GC trigger strategy.
    pub byte_size: usize,
    pub data: InstanceData,
}

impl InstanceData {
    /// Approximate size in bytes of the payload, for the GC strategy's
    /// tracked-size counter.
    pub fn byte_size(&self) -> usize {
        let base = std::mem::size_of::<Instance>();
        base + match self {
            InstanceData::String(s) => s.capacity(),
            InstanceData::Array(items) => items.capacity() * std::mem::size_of::<ObjRef>(),
            InstanceData::Record(rec) => {
                rec.fields.len() * (std::mem::size_of::<NameId>() + std::mem::size_of::<ObjRef>())
            }
            _ => 0,
        }
    }

    /// Objects directly reachable from this payload, for the mark phase.
    pub fn reachable(&self, out: &mut Vec<ObjRef>) {
        match self {
            InstanceData::Array(items) => out.extend_from_slice(items),
            InstanceData::Record(rec) => out.extend(rec.fields.values().copied()),
            _ => {}
        }
    }
}
