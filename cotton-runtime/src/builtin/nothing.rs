use crate::error::RuntimeError;
use crate::heap::{ObjRef, TypeRef};
use crate::instance::{InstanceData, NativeFn};
use crate::runtime::Runtime;
use crate::types::{Type, TypeKind};

pub fn make_type() -> Type {
    let mut t = Type::new(TypeKind::Nothing, 0, false);
    t.create = Some(create);
    t.copy = Some(copy);
    t.eq_op = Some(eq);
    t.neq_op = Some(neq);
    t
}

fn create(rt: &mut Runtime, ty: TypeRef) -> Result<ObjRef, RuntimeError> {
    Ok(rt.alloc_instance(ty, InstanceData::Nothing))
}

fn copy(rt: &mut Runtime, obj: ObjRef) -> Result<ObjRef, RuntimeError> {
    rt.verify_instance(obj, Some(rt.builtin_types.nothing))?;
    Ok(rt.alloc_instance(rt.builtin_types.nothing, InstanceData::Nothing))
}

/// Any Nothing equals any other Nothing.
fn eq(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_instance(obj, Some(rt.builtin_types.nothing))?;
    let same = rt.is_instance_object(arg, Some(rt.builtin_types.nothing));
    Ok(rt.protected_boolean(same))
}

fn neq(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let res = eq(rt, obj, arg, matters)?;
    let v = rt.bool_value(res)?;
    Ok(rt.protected_boolean(!v))
}

// ==================== methods ====================

fn mm_bool(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    Ok(rt.protected_boolean(false))
}

fn mm_string(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_string("nothing".to_string()))
}

fn mm_repr(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_string("Nothing".to_string()))
}

pub fn install_methods(rt: &mut Runtime) {
    let ty = rt.builtin_types.nothing;
    let methods: [(cotton_ast::NameId, NativeFn); 3] = [
        (rt.magic.mm_bool, mm_bool),
        (rt.magic.mm_string, mm_string),
        (rt.magic.mm_repr, mm_repr),
    ];
    for (id, f) in methods {
        let method = rt.native_function(f);
        rt.add_method(ty, id, method);
    }
}
