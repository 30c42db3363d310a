// Record: the open variant for user-defined types. Records are reference
// types: copying wraps the same instance in a fresh object. Operators are
// not installed here at all; they resolve through the magic-method
// fallback, which is what makes user operator overloading work.

use crate::error::{ErrorKind, RuntimeError};
use crate::heap::{ObjRef, TypeRef};
use crate::instance::{InstanceData, RecordData};
use crate::object::Object;
use crate::runtime::{ObjectKind, Runtime};
use std::collections::HashMap;

pub fn record_create(rt: &mut Runtime, ty: TypeRef) -> Result<ObjRef, RuntimeError> {
    let t = rt.get_type(ty)?;
    let name_id = t.name_id.ok_or_else(|| {
        rt.error_here(ErrorKind::InternalError, "Record type without a name")
    })?;
    let field_names = t.instance_fields.clone();

    let mut fields = HashMap::with_capacity(field_names.len());
    for f in field_names {
        let nothing = rt.make(rt.builtin_types.nothing, ObjectKind::InstanceObject)?;
        fields.insert(f, nothing);
    }
    Ok(rt.alloc_instance(
        ty,
        InstanceData::Record(RecordData {
            type_name: name_id,
            fields,
        }),
    ))
}

pub fn record_copy(rt: &mut Runtime, obj: ObjRef) -> Result<ObjRef, RuntimeError> {
    let o = rt.get_object(obj)?;
    let ty = o.type_ref;
    let Some(ins) = o.instance else {
        return Ok(rt.alloc_type_object(ty));
    };
    Ok(rt.gc.track_object(Object {
        id: 0,
        is_instance: true,
        instance: Some(ins),
        type_ref: ty,
        gc_mark: false,
        can_modify: true,
        single_use: false,
    }))
}
