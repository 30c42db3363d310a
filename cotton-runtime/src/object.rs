use crate::heap::{InsRef, TypeRef};

/// A Cotton object: the universal value. An object either holds an instance
/// (instance object) or stands for its type itself (type object, the value
/// bound to names like `Integer`).
#[derive(Debug, Clone)]
pub struct Object {
    /// Diagnostic id, monotonic across the runtime's lifetime.
    pub id: u64,

    /// `true` for instance objects, `false` for type objects.
    pub is_instance: bool,

    /// Present iff `is_instance`.
    pub instance: Option<InsRef>,

    /// Always present; identifies the object's type.
    pub type_ref: TypeRef,

    /// Reachability mark; equality with the collector's current mark means
    /// "visited this cycle".
    pub gc_mark: bool,

    /// When `false`, assignment to this object fails. Protects the literal
    /// cache, the singletons, and the builtin type bindings.
    pub can_modify: bool,

    /// Set on freshly produced objects that have not been bound to a name
    /// yet; lets `copy` hand the object back unchanged.
    pub single_use: bool,
}
