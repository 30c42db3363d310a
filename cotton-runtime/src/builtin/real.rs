// Real: IEEE doubles. Division follows IEEE semantics (no zero check).

use crate::error::{ErrorKind, RuntimeError};
use crate::heap::{ObjRef, TypeRef};
use crate::instance::{InstanceData, NativeFn};
use crate::runtime::Runtime;
use crate::types::{Type, TypeKind};

use super::verify_arg_instance;

pub fn make_type() -> Type {
    let mut t = Type::new(TypeKind::Real, 0, false);
    t.create = Some(create);
    t.copy = Some(copy);

    t.positive_op = Some(positive);
    t.negative_op = Some(negative);

    t.mult_op = Some(mult);
    t.div_op = Some(div);
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
    Ok(rt.alloc_instance(ty, InstanceData::Real(0.0)))
}

fn copy(rt: &mut Runtime, obj: ObjRef) -> Result<ObjRef, RuntimeError> {
    let v = rt.real_value(obj)?;
    Ok(rt.alloc_instance(rt.builtin_types.real, InstanceData::Real(v)))
}

fn binary_operands(rt: &mut Runtime, obj: ObjRef, arg: ObjRef) -> Result<(f64, f64), RuntimeError> {
    verify_arg_instance(rt, arg, rt.builtin_types.real, 1)?;
    Ok((rt.real_value(obj)?, rt.real_value(arg)?))
}

fn positive(rt: &mut Runtime, obj: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let _ = rt.real_value(obj)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    rt.force_copy(obj)
}

fn negative(rt: &mut Runtime, obj: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let v = rt.real_value(obj)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_real(-v))
}

fn mult(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_real(a * b))
}

fn div(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_real(a / b))
}

fn add(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_real(a + b))
}

fn sub(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let (a, b) = binary_operands(rt, obj, arg)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_real(a - b))
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
    let a = rt.real_value(obj)?;
    if !rt.is_instance_object(arg, Some(rt.builtin_types.real)) {
        return Ok(rt.protected_boolean(false));
    }
    let b = rt.real_value(arg)?;
    Ok(rt.protected_boolean(a == b))
}

fn neq(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let res = eq(rt, obj, arg, matters)?;
    let v = rt.bool_value(res)?;
    Ok(rt.protected_boolean(!v))
}

// ==================== methods ====================

fn format_real(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

fn mm_bool(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.real_value(args[0])?;
    Ok(rt.protected_boolean(v != 0.0))
}

fn mm_int(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.real_value(args[0])?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(v as i64))
}

fn mm_real(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.real_value(args[0])?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_real(v))
}

fn mm_string(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let v = rt.real_value(args[0])?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_string(format_real(v)))
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
    let token = rt.read_token()?;
    let v: f64 = token.parse().map_err(|_| {
        rt.error_here(
            ErrorKind::DomainError,
            format!("'{}' is not a valid Real", token),
        )
    })?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_real(v))
}

pub fn install_methods(rt: &mut Runtime) {
    let ty = rt.builtin_types.real;
    let methods: [(cotton_ast::NameId, NativeFn); 6] = [
        (rt.magic.mm_bool, mm_bool),
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
