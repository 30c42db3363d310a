// Array: a reference-flavored aggregate. Copying clones the outer element
// list only; indexing hands out the inner object itself, so writes through
// an index are visible to every alias.

use crate::error::{ErrorKind, RuntimeError};
use crate::heap::{ObjRef, TypeRef};
use crate::instance::{InstanceData, NativeFn};
use crate::runtime::Runtime;
use crate::types::{Type, TypeKind};

use super::verify_arg_instance;

pub fn make_type() -> Type {
    let mut t = Type::new(TypeKind::Array, 0, false);
    t.create = Some(create);
    t.copy = Some(copy);

    t.add_op = Some(add);
    t.eq_op = Some(eq);
    t.neq_op = Some(neq);
    t.call_op = Some(construct);
    t.index_op = Some(index);
    t
}

fn create(rt: &mut Runtime, ty: TypeRef) -> Result<ObjRef, RuntimeError> {
    Ok(rt.alloc_instance(ty, InstanceData::Array(Vec::new())))
}

fn copy(rt: &mut Runtime, obj: ObjRef) -> Result<ObjRef, RuntimeError> {
    let items = array_items(rt, obj)?;
    Ok(rt.alloc_instance(rt.builtin_types.array, InstanceData::Array(items)))
}

fn array_items(rt: &Runtime, obj: ObjRef) -> Result<Vec<ObjRef>, RuntimeError> {
    match rt.data(obj)? {
        InstanceData::Array(items) => Ok(items.clone()),
        _ => Err(rt.error_here(
            ErrorKind::TypeMismatch,
            format!("{} is not an Array", rt.describe(obj)),
        )),
    }
}

/// An element slot must stay assignable: protected values (the literal
/// cache, the singletons) are snapshotted instead of stored directly.
fn writable_element(rt: &mut Runtime, obj: ObjRef) -> Result<ObjRef, RuntimeError> {
    if rt.get_object(obj)?.can_modify {
        Ok(obj)
    } else {
        rt.force_copy(obj)
    }
}

/// Calling the Array type object constructs an array from the arguments;
/// `[a, b, c]` literals desugar to exactly this.
fn construct(rt: &mut Runtime, obj: ObjRef, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    if !rt.is_type_object(obj, Some(rt.builtin_types.array)) {
        return Err(rt.error_here(
            ErrorKind::OperatorNotSupported,
            format!("{} doesn't support operator '()'", rt.describe(obj)),
        ));
    }
    let mut items = Vec::with_capacity(args.len());
    for arg in args {
        items.push(writable_element(rt, *arg)?);
    }
    Ok(rt.new_array(items))
}

fn index(rt: &mut Runtime, obj: ObjRef, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_min_args(args, 1)?;
    verify_arg_instance(rt, args[0], rt.builtin_types.integer, 1)?;
    let i = rt.int_value(args[0])?;
    let items = array_items(rt, obj)?;
    usize::try_from(i)
        .ok()
        .and_then(|i| items.get(i).copied())
        .ok_or_else(|| {
            rt.error_here(
                ErrorKind::OutOfBounds,
                format!("Index {} is out of array bounds", i),
            )
        })
}

/// Concatenation; elements stay shared with both operands.
fn add(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    verify_arg_instance(rt, arg, rt.builtin_types.array, 1)?;
    let mut items = array_items(rt, obj)?;
    items.extend(array_items(rt, arg)?);
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_array(items))
}

/// Shallow equality: same length and identical element objects.
fn eq(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, _matters: bool) -> Result<ObjRef, RuntimeError> {
    let a = array_items(rt, obj)?;
    if !rt.is_instance_object(arg, Some(rt.builtin_types.array)) {
        return Ok(rt.protected_boolean(false));
    }
    let b = array_items(rt, arg)?;
    let same = a.len() == b.len()
        && a.iter().zip(b.iter()).all(|(x, y)| {
            let xo = rt.gc.object(*x);
            let yo = rt.gc.object(*y);
            match (xo, yo) {
                (Some(x), Some(y)) => x.instance == y.instance && x.type_ref == y.type_ref,
                _ => false,
            }
        });
    Ok(rt.protected_boolean(same))
}

fn neq(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, matters: bool) -> Result<ObjRef, RuntimeError> {
    let res = eq(rt, obj, arg, matters)?;
    let v = rt.bool_value(res)?;
    Ok(rt.protected_boolean(!v))
}

// ==================== methods ====================

fn mm_string(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let items = array_items(rt, args[0])?;
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        parts.push(rt.stringify(item)?);
    }
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_string(format!("[{}]", parts.join(", "))))
}

fn mm_repr(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    mm_string(rt, args, matters)
}

fn m_size(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let n = array_items(rt, args[0])?.len() as i64;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(n))
}

/// `a.append(x)` — x was already copied by the argument convention.
fn m_append(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 1)?;
    let value = writable_element(rt, args[1])?;
    rt.spread_multi_use(value);
    if let InstanceData::Array(items) = rt.data_mut(args[0])? {
        items.push(value);
    }
    Ok(args[0])
}

fn m_pop(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    let popped = match rt.data_mut(args[0])? {
        InstanceData::Array(items) => items.pop(),
        _ => None,
    };
    let Some(popped) = popped else {
        return Err(rt.error_here(ErrorKind::OutOfBounds, "Cannot pop from an empty array"));
    };
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(popped)
}

fn m_clear(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    if let InstanceData::Array(items) = rt.data_mut(args[0])? {
        items.clear();
    }
    Ok(args[0])
}

pub fn install_methods(rt: &mut Runtime) {
    let ty = rt.builtin_types.array;
    let size_id = rt.names.intern("size");
    let append_id = rt.names.intern("append");
    let pop_id = rt.names.intern("pop");
    let clear_id = rt.names.intern("clear");
    let methods: [(cotton_ast::NameId, NativeFn); 6] = [
        (rt.magic.mm_string, mm_string),
        (rt.magic.mm_repr, mm_repr),
        (size_id, m_size),
        (append_id, m_append),
        (pop_id, m_pop),
        (clear_id, m_clear),
    ];
    for (id, f) in methods {
        let method = rt.native_function(f);
        rt.add_method(ty, id, method);
    }
}
