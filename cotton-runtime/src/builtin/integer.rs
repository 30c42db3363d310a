// Integer: the full arithmetic/bitwise/comparison operator set plus the
// conversion methods.

use crate::error::{ErrorKind, RuntimeError};
use crate::heap::{ObjRef, TypeRef};
use crate::instance::{InstanceData, NativeFn};
use crate::runtime::Runtime;
use crate::types::{Type, TypeKind};

use super::verify_arg_instance;

pub fn make_type() -> Type {
    let mut t = Type::new(TypeKind::Integer, 0, false);
    t.create = Some(create);
    t.copy = Some(copy);

    t.postinc_op = Some(postinc);
    t.postdec_op = Some(postdec);
    t.preinc_op = Some(preinc);
    t.predec_op = Some(predec);
    t.positive_op = Some(positive);
    t.negative_op = Some(negative);
    t.inverse_op = Some(inverse);

    t.mult_op = Some(mult);
    t.div_op = Some(div);
    t.rem_op = Some(rem);
    t.rshift_op = Some(rshift);
    t.lshift_op = Some(lshift);
    t.add_op = Some(add);
    t.sub_op = Some(sub);
    t.lt_op = Some(lt);
    t.leq_op = Some(leq);
    t.gt_op = Some(gt);
    t.geq_op = Some(geq);
    t.eq_op = Some(eq);
    t.neq_op = Some(neq);
    t.bitand_op = Some(bitand);
    t.bitxor_op = Some(bitxor);
    t.bitor_op = Some(bitor);
    t
}

fn create(rt: &mut Runtime, ty: TypeRef) -> Result<ObjRef, RuntimeError> {
    Ok(rt.alloc_instance(ty, InstanceData::Integer(0)))
}

fn copy(rt: &mut Runtime, obj: ObjRef) -> Result<ObjRef, RuntimeError> {
    let v = rt.int_value(obj)?;
    Ok(rt.alloc_instance(rt.builtin_types.integer, InstanceData::Integer(v)))
}

fn int_mut(rt: &mut Runtime, obj: ObjRef) -> Result<&mut i64, RuntimeError> {
    rt.int_value(obj)?;
    match rt.data_mut(obj)? {
        InstanceData::Integer(v) => Ok(v),
        _ => Err(RuntimeError {
            kind: ErrorKind::InternalError,
            message: "Integer payload vanished".to_string(),
            span: Default::default(),
            trace: Vec::new(),
        }),
    }
}

// ==================== unary ====================

fn postinc(rt: &mut Runtime, obj: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    if !matters {
        *int_mut(rt, obj)? += 1;
        return Ok(rt.protected_nothing());
    }
    let res = rt.force_copy(obj)?;
    *int_mut(rt, obj)? += 1;
    Ok(res)
}

fn postdec(rt: &mut Runtime, obj: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    if !matters {
        *int_mut(rt, obj)? -= 1;
        return Ok(rt.protected_nothing());
    }
    let res = rt.force_copy(obj)?;
    *int_mut(rt, obj)? -= 1;
    Ok(res)
}

fn preinc(rt: &mut Runtime, obj: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    *int_mut(rt, obj)? += 1;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    rt.force_copy(obj)
}

fn predec(rt: &mut Runtime, obj: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    *int_mut(rt, obj)? -= 1;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    rt.force_copy(obj)
}

fn positive(rt: &mut Runtime, obj: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let _ = rt.int_value(obj)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    rt.force_copy(obj)
}

fn negative(rt: &mut Runtime, obj: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let v = rt.int_value(obj)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(v.wrapping_neg()))
}

fn inverse(rt: &mut Runtime, obj: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let v = rt.int_value(obj)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(!v))
}

// ==================== binary ====================

fn binary_operands(rt: &mut Runtime, obj: ObjRef, arg: ObjRef) -> Result<(i64, i64), RuntimeError> {
    verify_arg_instance(rt, arg, rt.builtin_types.integer, 1)?;
    Ok((rt.int_value(obj)?, rt.int_value(arg)?))
}

fn mult(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(a.wrapping_mul(b)))
}

fn div(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    if b == 0 {
        return Err(rt.error(ErrorKind::DivisionByZero, "Division by zero", rt.sub_area(1)));
    }
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(a.wrapping_div(b)))
}

fn rem(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    if b == 0 {
        return Err(rt.error(ErrorKind::DivisionByZero, "Division by zero", rt.sub_area(1)));
    }
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(a.wrapping_rem(b)))
}

fn rshift(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(a.wrapping_shr(b as u32)))
}

fn lshift(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(a.wrapping_shl(b as u32)))
}

fn add(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(a.wrapping_add(b)))
}

fn sub(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(a.wrapping_sub(b)))
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
    let a = rt.int_value(obj)?;
    if !rt.is_instance_object(arg, Some(rt.builtin_types.integer)) {
        return Ok(rt.protected_boolean(false));
    }
    let b = rt.int_value(arg)?;
    Ok(rt.protected_boolean(a == b))
}

fn neq(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let res = eq(rt, obj, arg, matters)?;
    let v = rt.bool_value(res)?;
    Ok(rt.protected_boolean(!v))
}

fn bitand(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(a & b))
}

fn bitxor(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(a ^ b))
}

fn bitor(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(a | b))
}

// ==================== methods ====================

fn mm_bool(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.int_value(args[0])?;
    Ok(rt.protected_boolean(v != 0))
}

fn mm_char(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.int_value(args[0])?;
    let c = u32::try_from(v)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| {
            rt.error_here(
                ErrorKind::DomainError,
                format!("{} is not a valid character code", v),
            )
        })?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_character(c))
}

fn mm_int(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.int_value(args[0])?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(v))
}

fn mm_real(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.int_value(args[0])?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_real(v as f64))
}

fn mm_string(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.int_value(args[0])?;
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

/// `__read__` runs on the type object and produces a freshly read value.
fn mm_read(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let token = rt.read_token()?;
    let v: i64 = token.parse().map_err(|_| {
        rt.error_here(
            ErrorKind::DomainError,
            format!("'{}' is not a valid Integer", token),
        )
    })?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(v))
}

pub fn install_methods(rt: &mut Runtime) {
    let ty = rt.builtin_types.integer;
    let methods: [(cotton_ast::NameId, NativeFn); 7] = [
        (rt.magic.mm_bool, mm_bool),
        (rt.magic.mm_char, mm_char),
        (rt.magic.mm_int, mm_int),
        (rt.magic.mm_real, mm_real),
        (rt.magic.mm_string, mm_string),
        (rt.magic.mm_repr, mm_repr),
        (rt.magic.mm_read, mm_read),
    ];
    for (id, f) in methods {
        let method = rt.native_function(f);
        rt.add_method(ty, id, method);
    }
}
