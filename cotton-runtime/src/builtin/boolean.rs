use crate::error::RuntimeError;
use crate::heap::{ObjRef, TypeRef};
use crate::instance::{InstanceData, NativeFn};
use crate::runtime::Runtime;
use crate::types::{Type, TypeKind};

use super::verify_arg_instance;

pub fn make_type() -> Type {
    let mut t = Type::new(TypeKind::Boolean, 0, false);
    t.create = Some(create);
    t.copy = Some(copy);

    t.not_op = Some(not);
    t.eq_op = Some(eq);
    t.neq_op = Some(neq);
    t.and_op = Some(and);
    t.or_op = Some(or);
    t
}

fn create(rt: &mut Runtime, ty: TypeRef) -> Result<ObjRef, RuntimeError> {
    Ok(rt.alloc_instance(ty, InstanceData::Boolean(false)))
}

fn copy(rt: &mut Runtime, obj: ObjRef) -> Result<ObjRef, RuntimeError> {
    let v = rt.bool_value(obj)?;
    Ok(rt.alloc_instance(rt.builtin_types.boolean, InstanceData::Boolean(v)))
}

fn not(rt: &mut Runtime, obj: ObjRef, _matters: bool) -> Result<ObjRef, RuntimeError> {
    let v = rt.bool_value(obj)?;
    Ok(rt.protected_boolean(!v))
}

fn eq(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, _matters: bool) -> Result<ObjRef, RuntimeError> {
    let a = rt.bool_value(obj)?;
    if !rt.is_instance_object(arg, Some(rt.builtin_types.boolean)) {
        return Ok(rt.protected_boolean(false));
    }
    let b = rt.bool_value(arg)?;
    Ok(rt.protected_boolean(a == b))
}

fn neq(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let res = eq(rt, obj, arg, matters)?;
    let v = rt.bool_value(res)?;
    Ok(rt.protected_boolean(!v))
}

/// No short-circuit: both operands were already evaluated by the walker.
fn and(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, _matters: bool) -> Result<ObjRef, RuntimeError> {
    verify_arg_instance(rt, arg, rt.builtin_types.boolean, 1)?;
    let a = rt.bool_value(obj)?;
    let b = rt.bool_value(arg)?;
    Ok(rt.protected_boolean(a && b))
}

fn or(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, _matters: bool) -> Result<ObjRef, RuntimeError> {
    verify_arg_instance(rt, arg, rt.builtin_types.boolean, 1)?;
    let a = rt.bool_value(obj)?;
    let b = rt.bool_value(arg)?;
    Ok(rt.protected_boolean(a || b))
}

// ==================== methods ====================

fn mm_bool(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.bool_value(args[0])?;
    Ok(rt.protected_boolean(v))
}

fn mm_int(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.bool_value(args[0])?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(v as i64))
}

fn mm_string(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.bool_value(args[0])?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_string(if v { "true" } else { "false" }.to_string()))
}

fn mm_repr(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let repr = rt.describe(args[0]);
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_string(repr))
}

pub fn install_methods(rt: &mut Runtime) {
    let ty = rt.builtin_types.boolean;
    let methods: [(cotton_ast::NameId, NativeFn); 4] = [
        (rt.magic.mm_bool, mm_bool),
        (rt.magic.mm_int, mm_int),
        (rt.magic.mm_string, mm_string),
        (rt.magic.mm_repr, mm_repr),
    ];
    for (id, f) in methods {
        let method = rt.native_function(f);
        rt.add_method(ty, id, method);
    }
}
