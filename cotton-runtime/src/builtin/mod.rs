// The builtin type kernel: the canonical types' operator adapters and
// magic methods, plus the global function catalogue.

use crate::error::{ErrorKind, RuntimeError};
use crate::heap::{ObjRef, TypeRef};
use crate::runtime::Runtime;

pub mod array;
pub mod boolean;
pub mod character;
pub mod function;
pub mod functions;
pub mod integer;
pub mod nothing;
pub mod real;
pub mod record;
pub mod string;

/// Installs the magic methods on every builtin type. Called once at
/// runtime construction, after the types exist and are bound.
pub fn install_methods(rt: &mut Runtime) {
    boolean::install_methods(rt);
    character::install_methods(rt);
    function::install_methods(rt);
    integer::install_methods(rt);
    real::install_methods(rt);
    nothing::install_methods(rt);
    string::install_methods(rt);
    array::install_methods(rt);
}

/// Operand check for binary adapters; blames the operand's sub-area.
pub(crate) fn verify_arg_instance(
    rt: &Runtime,
    arg: ObjRef,
    ty: TypeRef,
    idx: usize,
) -> Result<(), RuntimeError> {
    if !rt.is_instance_object(arg, Some(ty)) {
        return Err(rt.error(
            ErrorKind::TypeMismatch,
            format!(
                "{} is not an instance of type {}",
                rt.describe(arg),
                rt.type_name(ty)
            ),
            rt.sub_area(idx),
        ));
    }
    Ok(())
}
