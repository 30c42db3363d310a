use crate::error::{ErrorKind, RuntimeError};
use crate::heap::{ObjRef, TypeRef};
use crate::instance::{InstanceData, NativeFn};
use crate::runtime::Runtime;
use crate::types::{Type, TypeKind};

use super::verify_arg_instance;

pub fn make_type() -> Type {
    let mut t = Type::new(TypeKind::String, 0, false);
    t.create = Some(create);
    t.copy = Some(copy);

    t.add_op = Some(add);
    t.lt_op = Some(lt);
    t.leq_op = Some(leq);
    t.gt_op = Some(gt);
    t.geq_op = Some(geq);
    t.eq_op = Some(eq);
    t.neq_op = Some(neq);
    t.index_op = Some(index);
    t
}

fn create(rt: &mut Runtime, ty: TypeRef) -> Result<ObjRef, RuntimeError> {
    Ok(rt.alloc_instance(ty, InstanceData::String(String::new())))
}

fn copy(rt: &mut Runtime, obj: ObjRef) -> Result<ObjRef, RuntimeError> {
    let v = rt.string_value(obj)?.to_string();
    Ok(rt.alloc_instance(rt.builtin_types.string, InstanceData::String(v)))
}

fn binary_operands(
    rt: &mut Runtime,
    obj: ObjRef,
    arg: ObjRef,
) -> Result<(String, String), RuntimeError> {
    verify_arg_instance(rt, arg, rt.builtin_types.string, 1)?;
    Ok((
        rt.string_value(obj)?.to_string(),
        rt.string_value(arg)?.to_string(),
    ))
}

fn add(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_string(a + &b))
}

fn lt(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, _matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    Ok(rt.protected_boolean(a < b))
}

fn leq(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, _matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    Ok(rt.protected_boolean(a <= b))
}

fn gt(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, _matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    Ok(rt.protected_boolean(a > b))
}

fn geq(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, _matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    Ok(rt.protected_boolean(a >= b))
}

fn eq(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, _matters: bool) -> Result<ObjRef, RuntimeError> {
    let a = rt.string_value(obj)?.to_string();
    if !rt.is_instance_object(arg, Some(rt.builtin_types.string)) {
        return Ok(rt.protected_boolean(false));
    }
    let b = rt.string_value(arg)?;
    Ok(rt.protected_boolean(a == b))
}

fn neq(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let res = eq(rt, obj, arg, matters)?;
    let v = rt.bool_value(res)?;
    Ok(rt.protected_boolean(!v))
}

/// Indexing yields a fresh Character; strings are not mutable through it.
fn index(rt: &mut Runtime, obj: ObjRef, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_min_args(args, 1)?;
    verify_arg_instance(rt, args[0], rt.builtin_types.integer, 1)?;
    let i = rt.int_value(args[0])?;
    let s = rt.string_value(obj)?;
    let c = usize::try_from(i).ok().and_then(|i| s.chars().nth(i));
    let Some(c) = c else {
        return Err(rt.error_here(
            ErrorKind::OutOfBounds,
            format!("Index {} is out of string bounds", i),
        ));
    };
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_character(c))
}

// ==================== methods ====================

fn mm_bool(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let empty = rt.string_value(args[0])?.is_empty();
    Ok(rt.protected_boolean(!empty))
}

fn mm_string(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.string_value(args[0])?.to_string();
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_string(v))
}

fn mm_repr(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.string_value(args[0])?.to_string();
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_string(format!("\"{}\"", v)))
}

fn mm_read(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let token = rt.read_token()?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_string(token))
}

/// `s.size()`
fn m_size(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let n = rt.string_value(args[0])?.chars().count() as i64;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(n))
}

/// `s.set(index, char)` writes in place.
fn m_set(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 2)?;
    verify_arg_instance(rt, args[1], rt.builtin_types.integer, 1)?;
    verify_arg_instance(rt, args[2], rt.builtin_types.character, 2)?;
    let i = rt.int_value(args[1])?;
    let c = rt.char_value(args[2])?;

    let s = rt.string_value(args[0])?;
    let idx = usize::try_from(i).ok().filter(|&i| i < s.chars().count());
    let Some(idx) = idx else {
        return Err(rt.error_here(
            ErrorKind::OutOfBounds,
            format!("Index {} is out of string bounds", i),
        ));
    };
    let updated: String = s
        .chars()
        .enumerate()
        .map(|(k, old)| if k == idx { c } else { old })
        .collect();
    if let InstanceData::String(slot) = rt.data_mut(args[0])? {
        *slot = updated;
    }
    Ok(rt.protected_nothing())
}

pub fn install_methods(rt: &mut Runtime) {
    let ty = rt.builtin_types.string;
    let size_id = rt.names.intern("size");
    let set_id = rt.names.intern("set");
    let methods: [(cotton_ast::NameId, NativeFn); 6] = [
        (rt.magic.mm_bool, mm_bool),
        (rt.magic.mm_string, mm_string),
        (rt.magic.mm_repr, mm_repr),
        (rt.magic.mm_read, mm_read),
        (size_id, m_size),
        (set_id, m_set),
    ];
    for (id, f) in methods {
        let method = rt.native_function(f);
        rt.add_method(ty, id, method);
    }
}
