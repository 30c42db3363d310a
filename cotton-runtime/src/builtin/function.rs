// Function: callable values. Native and user-defined functions share one
// dispatch path; the user path implements the call protocol (fresh sealed
// frame, positional binding, stored argument list).

use crate::error::{ErrorKind, RuntimeError};
use crate::heap::{ObjRef, TypeRef};
use crate::instance::{FunctionSource, InstanceData, NativeFn};
use crate::runtime::Runtime;
use crate::types::{Type, TypeKind};

pub fn make_type() -> Type {
    let mut t = Type::new(TypeKind::Function, 0, false);
    t.create = Some(create);
    t.copy = Some(copy);
    t.call_op = Some(call);
    t.eq_op = Some(eq);
    t.neq_op = Some(neq);
    t
}

fn uninitialized(rt: &mut Runtime, _args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    Err(rt.error_here(
        ErrorKind::InvalidObject,
        "Failed to execute an empty function",
    ))
}

fn create(rt: &mut Runtime, ty: TypeRef) -> Result<ObjRef, RuntimeError> {
    Ok(rt.alloc_instance(ty, InstanceData::Function(FunctionSource::Native(uninitialized))))
}

/// Functions copy by sharing their descriptor.
fn copy(rt: &mut Runtime, obj: ObjRef) -> Result<ObjRef, RuntimeError> {
    let source = function_source(rt, obj)?;
    Ok(rt.alloc_instance(rt.builtin_types.function, InstanceData::Function(source)))
}

fn function_source(rt: &Runtime, obj: ObjRef) -> Result<FunctionSource, RuntimeError> {
    match rt.data(obj)? {
        InstanceData::Function(source) => Ok(source.clone()),
        _ => Err(rt.error_here(
            ErrorKind::TypeMismatch,
            format!("{} is not a Function", rt.describe(obj)),
        )),
    }
}

/// The call protocol.
fn call(rt: &mut Runtime, obj: ObjRef, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_instance(obj, Some(rt.builtin_types.function))?;
    match function_source(rt, obj)? {
        FunctionSource::Native(f) => f(rt, args, matters),
        FunctionSource::User(def) => {
            rt.scopes.push_call(args.to_vec());
            for (param, arg) in def.params.iter().zip(args.iter()) {
                rt.add_variable(param.id, *arg);
            }
            rt.clear_exec_flags();
            let res = rt.execute_stmt(&def.body, matters);
            rt.scopes.pop();
            res
        }
    }
}

/// Functions compare by descriptor identity.
fn eq(rt: &mut Runtime, obj: ObjRef, arg: ObjRef, _matters: bool) -> Result<ObjRef, RuntimeError> {
    let same = match (rt.gc.object(obj), rt.gc.object(arg)) {
        (Some(a), Some(b)) => a.instance == b.instance && a.type_ref == b.type_ref,
        _ => false,
    };
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
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_string("function".to_string()))
}

fn mm_repr(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_method_args(args, 0)?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_string("Function".to_string()))
}

pub fn install_methods(rt: &mut Runtime) {
    let ty = rt.builtin_types.function;
    let methods: [(cotton_ast::NameId, NativeFn); 2] = [
        (rt.magic.mm_string, mm_string),
        (rt.magic.mm_repr, mm_repr),
    ];
    for (id, f) in methods {
        let method = rt.native_function(f);
        rt.add_method(ty, id, method);
    }
}
