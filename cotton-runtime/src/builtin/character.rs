use crate::error::{ErrorKind, RuntimeError};
use crate::heap::{ObjRef, TypeRef};
use crate::instance::{InstanceData, NativeFn};
use crate::runtime::Runtime;
use crate::types::{Type, TypeKind};

use super::verify_arg_instance;

pub fn make_type() -> Type {
    let mut t = Type::new(TypeKind::Character, 0, false);
    t.create = Some(create);
    t.copy = Some(copy);

    t.postinc_op = Some(postinc);
    t.postdec_op = Some(postdec);
    t.preinc_op = Some(preinc);
    t.predec_op = Some(predec);

    t.add_op = Some(add);
    t.sub_op = Some(sub);
    t.lt_op = Some(lt);
    t.leq_op = Some(leq);
    t.gt_op = Some(gt);
    t.geq_op = Some(geq);
    t.eq_op = Some(eq);
    t.neq_op = Some(neq);
    t
}

fn create(rt: &mut Runtime, ty: TypeRef) -> Result<ObjRef, RuntimeError> {
    Ok(rt.alloc_instance(ty, InstanceData::Character('\0')))
}

fn copy(rt: &mut Runtime, obj: ObjRef) -> Result<ObjRef, RuntimeError> {
    let v = rt.char_value(obj)?;
    Ok(rt.alloc_instance(rt.builtin_types.character, InstanceData::Character(v)))
}

fn shifted(rt: &Runtime, c: char, delta: i64) -> Result<char, RuntimeError> {
    let code = c as i64 + delta;
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| {
            rt.error_here(
                ErrorKind::DomainError,
                format!("{} is not a valid character code", code),
            )
        })
}

fn store_char(rt: &mut Runtime, obj: ObjRef, v: char) -> Result<(), RuntimeError> {
    if let InstanceData::Character(slot) = rt.data_mut(obj)? {
        *slot = v;
    }
    Ok(())
}

fn postinc(rt: &mut Runtime, obj: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let v = rt.char_value(obj)?;
    let next = shifted(rt, v, 1)?;
    let res = if matters {
        rt.force_copy(obj)?
    } else {
        rt.protected_nothing()
    };
    store_char(rt, obj, next)?;
    Ok(res)
}

fn postdec(rt: &mut Runtime, obj: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let v = rt.char_value(obj)?;
    let next = shifted(rt, v, -1)?;
    let res = if matters {
        rt.force_copy(obj)?
    } else {
        rt.protected_nothing()
    };
    store_char(rt, obj, next)?;
    Ok(res)
}

fn preinc(rt: &mut Runtime, obj: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let v = rt.char_value(obj)?;
    let next = shifted(rt, v, 1)?;
    store_char(rt, obj, next)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    rt.force_copy(obj)
}

fn predec(rt: &mut Runtime, obj: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let v = rt.char_value(obj)?;
    let next = shifted(rt, v, -1)?;
    store_char(rt, obj, next)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    rt.force_copy(obj)
}

/// `char + int` shifts the code point.
fn add(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    verify_arg_instance(rt, arg, rt.builtin_types.integer, 1)?;
    let c = rt.char_value(obj)?;
    let delta = rt.int_value(arg)?;
    let res = shifted(rt, c, delta)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_character(res))
}

fn sub(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    verify_arg_instance(rt, arg, rt.builtin_types.integer, 1)?;
    let c = rt.char_value(obj)?;
    let delta = rt.int_value(arg)?;
    let res = shifted(rt, c, -delta)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_character(res))
}

fn binary_operands(rt: &mut Runtime, obj: ObjRef, arg: ObjRef) -> Result<(char, char), RuntimeError> {
    verify_arg_instance(rt, arg, rt.builtin_types.character, 1)?;
    Ok((rt.char_value(obj)?, rt.char_value(arg)?))
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
    let a = rt.char_value(obj)?;
    if !rt.is_instance_object(arg, Some(rt.builtin_types.character)) {
        return Ok(rt.protected_boolean(false));
    }
    let b = rt.char_value(arg)?;
    Ok(rt.protected_boolean(a == b))
}

fn neq(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let res = eq(rt, obj, arg, matters)?;
    let v = rt.bool_value(res)?;
    Ok(rt.protected_boolean(!v))
}

// ==================== methods ====================

fn mm_bool(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.char_value(args[0])?;
    Ok(rt.protected_boolean(v != '\0'))
}

fn mm_char(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.char_value(args[0])?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_character(v))
}

fn mm_int(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.char_value(args[0])?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(v as i64))
}

fn mm_string(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.char_value(args[0])?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_string(v.to_string()))
}

fn mm_repr(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let repr = rt.describe(args[0]);
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_string(repr))
}

fn mm_read(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let c = rt.read_char()?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_character(c))
}

pub fn install_methods(rt: &mut Runtime) {
    let ty = rt.builtin_types.character;
    let methods: [(cotton_ast::NameId, NativeFn); 6] = [
        (rt.magic.mm_bool, mm_bool),
        (rt.magic.mm_char, mm_char),
        (rt.magic.mm_int, mm_int),
        (rt.magic.mm_string, mm_string),
        (rt.magic.mm_repr, mm_repr),
        (rt.magic.mm_read, mm_read),
    ];
    for (id, f) in methods {
        let method = rt.native_function(f);
        rt.add_method(ty, id, method);
    }
}
