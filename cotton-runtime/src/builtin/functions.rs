// The global function catalogue, installed on the global frame at runtime
// construction. Argument contexts: sub_area(0) is the callee, sub_area(i+1)
// the ith argument.

use crate::error::{ErrorKind, RuntimeError};
use crate::heap::{ObjRef, TypeRef};
use crate::instance::NativeFn;
use crate::runtime::{ObjectKind, Runtime};
use cotton_parser::Parser;
use std::io::Write;
use std::path::PathBuf;

/// Argument check blaming the argument's own span.
fn verify_arg(
    rt: &Runtime,
    args: &[ObjRef],
    i: usize,
    ty: TypeRef,
) -> Result<(), RuntimeError> {
    if !rt.is_instance_object(args[i], Some(ty)) {
        return Err(rt.error(
            ErrorKind::TypeMismatch,
            format!(
                "{} is not an instance of type {}",
                rt.describe(args[i]),
                rt.type_name(ty)
            ),
            rt.sub_area(i + 1),
        ));
    }
    Ok(())
}

// ==================== construction & conversion ====================

// make(T, ...) - creates an instance of T, invoking __make__ if defined
fn cf_make(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_min_args(args, 1)?;
    rt.verify_type_object(args[0], None)?;
    let ty = rt.get_object(args[0])?.type_ref;
    let res = rt.make(ty, ObjectKind::InstanceObject)?;
    if rt.get_type(ty)?.has_method(rt.magic.mm_make) {
        let mut make_args = Vec::with_capacity(args.len());
        make_args.push(res);
        make_args.extend_from_slice(&args[1..]);
        rt.run_method(rt.magic.mm_make, res, &make_args, false)?;
    }
    Ok(res)
}

// copy(obj) - returns a copy of obj
fn cf_copy(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 1)?;
    rt.copy(args[0])
}

fn conversion(
    rt: &mut Runtime,
    args: &[ObjRef],
    method: cotton_ast::NameId,
    matters: bool,
) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 1)?;
    rt.verify_has_method(args[0], method)?;
    rt.run_method(method, args[0], &[args[0]], matters)
}

fn cf_bool(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    let method = rt.magic.mm_bool;
    conversion(rt, args, method, matters)
}

fn cf_char(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    let method = rt.magic.mm_char;
    conversion(rt, args, method, matters)
}

fn cf_int(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    let method = rt.magic.mm_int;
    conversion(rt, args, method, matters)
}

fn cf_real(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    let method = rt.magic.mm_real;
    conversion(rt, args, method, matters)
}

fn cf_string(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    let method = rt.magic.mm_string;
    conversion(rt, args, method, matters)
}

fn cf_repr(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    let method = rt.magic.mm_repr;
    conversion(rt, args, method, matters)
}

// ==================== output ====================

// printraw(...) - prints arguments without separators
fn cf_printraw(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    for arg in args {
        let text = rt.stringify(*arg)?;
        let _ = write!(rt.out, "{}", text);
    }
    Ok(rt.protected_nothing())
}

// print(...) - prints arguments separated by spaces
fn cf_print(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            let _ = write!(rt.out, " ");
        }
        let text = rt.stringify(*arg)?;
        let _ = write!(rt.out, "{}", text);
    }
    Ok(rt.protected_nothing())
}

// println(...) - like print, with a trailing newline
fn cf_println(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    cf_print(rt, args, matters)?;
    let _ = writeln!(rt.out);
    let _ = rt.out.flush();
    Ok(rt.protected_nothing())
}

// printf(fmt, ...) - positional holes @{N}, literal '@' written as '@@'
fn cf_printf(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_min_args(args, 1)?;
    verify_arg(rt, args, 0, rt.builtin_types.string)?;
    let fmt = rt.string_value(args[0])?.to_string();

    let mut out = String::new();
    let mut chars = fmt.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '@' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('@') => {
                chars.next();
                out.push('@');
            }
            Some('{') => {
                chars.next();
                let mut pos: usize = 0;
                let mut closed = false;
                for d in chars.by_ref() {
                    if d == '}' {
                        closed = true;
                        break;
                    }
                    let digit = d.to_digit(10).ok_or_else(|| {
                        rt.error_here(
                            ErrorKind::DomainError,
                            "Invalid format string: expected a valid @{..} construct",
                        )
                    })?;
                    pos = pos * 10 + digit as usize;
                }
                if !closed {
                    return Err(rt.error_here(
                        ErrorKind::DomainError,
                        "Invalid format string: expected a valid @{..} construct",
                    ));
                }
                let arg = args.get(pos + 1).copied().ok_or_else(|| {
                    rt.error_here(
                        ErrorKind::DomainError,
                        "Invalid format string: not enough arguments",
                    )
                })?;
                out.push_str(&rt.stringify(arg)?);
            }
            _ => out.push('@'),
        }
    }
    let _ = write!(rt.out, "{}", out);
    Ok(rt.protected_nothing())
}

// ==================== input ====================

// readraw() - reads a single character, whitespace included
fn cf_readraw(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 0)?;
    let c = rt.read_char()?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_character(c))
}

// read(T) - reads a value of the given type via its __read__ method
fn cf_read(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 1)?;
    rt.verify_type_object(args[0], None)?;
    rt.verify_has_method(args[0], rt.magic.mm_read)?;
    rt.run_method(rt.magic.mm_read, args[0], &[args[0]], matters)
}

// readln() - reads an entire line
fn cf_readln(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 0)?;
    let line = rt.read_line()?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_string(line))
}

// ==================== process & failure ====================

// exit(code)
fn cf_exit(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 1)?;
    verify_arg(rt, args, 0, rt.builtin_types.integer)?;
    let code = rt.int_value(args[0])?;
    let _ = rt.out.flush();
    std::process::exit(code as i32);
}

// error(msg) - signals a user error
fn cf_error(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 1)?;
    verify_arg(rt, args, 0, rt.builtin_types.string)?;
    let message = rt.string_value(args[0])?.to_string();
    Err(rt.error_here(ErrorKind::UserError, message))
}

// assert(cond[, msg])
fn cf_assert(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_min_args(args, 1)?;
    verify_arg(rt, args, 0, rt.builtin_types.boolean)?;
    let ok = rt.bool_value(args[0])?;
    if !ok {
        let mut message = "Assertion error".to_string();
        if args.len() > 1 {
            verify_arg(rt, args, 1, rt.builtin_types.string)?;
            message.push_str(": ");
            message.push_str(rt.string_value(args[1])?);
        }
        return Err(rt.error_here(ErrorKind::UserError, message));
    }
    Ok(rt.protected_nothing())
}

// ==================== arguments of the current call ====================

fn call_frame_arguments(rt: &Runtime) -> Vec<ObjRef> {
    match rt.scopes.nearest_call_frame() {
        Some(idx) => rt.scopes.frame(idx).arguments.clone(),
        None => Vec::new(),
    }
}

// argc() - number of arguments passed to the current function
fn cf_argc(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 0)?;
    let n = call_frame_arguments(rt).len() as i64;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_integer(n))
}

// argv() - array of the arguments passed to the current function
fn cf_argv(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 0)?;
    let items = call_frame_arguments(rt);
    if !matters {
        return Ok(rt.protected_nothing());
    }
    Ok(rt.new_array(items))
}

// argg(i) - the ith argument of the current function, or nothing
fn cf_argg(rt: &mut Runtime, args: &[ObjRef], matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 1)?;
    verify_arg(rt, args, 0, rt.builtin_types.integer)?;
    let i = rt.int_value(args[0])?;
    if !matters {
        return Ok(rt.protected_nothing());
    }
    let items = call_frame_arguments(rt);
    let found = usize::try_from(i).ok().and_then(|i| items.get(i).copied());
    Ok(found.unwrap_or_else(|| rt.protected_nothing()))
}

// ==================== identity & reflection ====================

// is(a, b) - identity: same instance and same type
fn cf_is(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 2)?;
    let a = rt.get_object(args[0])?;
    let same = {
        let b = rt.get_object(args[1])?;
        a.instance == b.instance && a.type_ref == b.type_ref
    };
    Ok(rt.protected_boolean(same))
}

// typeof(obj) - the type object of obj's type
fn cf_typeof(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 1)?;
    let ty = rt.get_object(args[0])?.type_ref;
    let registered = rt.type_object(ty);
    if registered != rt.protected_nothing() {
        return Ok(registered);
    }
    rt.make(ty, ObjectKind::TypeObject)
}

// isinsobj(obj[, T])
fn cf_isinsobj(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_min_args(args, 1)?;
    let ty = if args.len() > 1 {
        rt.verify_type_object(args[1], None)?;
        Some(rt.get_object(args[1])?.type_ref)
    } else {
        None
    };
    Ok(rt.protected_boolean(rt.is_instance_object(args[0], ty)))
}

// istypeobj(obj[, T])
fn cf_istypeobj(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_min_args(args, 1)?;
    let ty = if args.len() > 1 {
        rt.verify_type_object(args[1], None)?;
        Some(rt.get_object(args[1])?.type_ref)
    } else {
        None
    };
    Ok(rt.protected_boolean(rt.is_type_object(args[0], ty)))
}

// hasfield(obj, name)
fn cf_hasfield(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 2)?;
    rt.verify_instance(args[0], None)?;
    verify_arg(rt, args, 1, rt.builtin_types.string)?;
    let name = rt.string_value(args[1])?.to_string();
    let id = rt.names.intern(&name);
    Ok(rt.protected_boolean(rt.has_field(args[0], id)))
}

// hasmethod(obj, name)
fn cf_hasmethod(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 2)?;
    verify_arg(rt, args, 1, rt.builtin_types.string)?;
    let name = rt.string_value(args[1])?.to_string();
    let id = rt.names.intern(&name);
    let ty = rt.get_object(args[0])?.type_ref;
    let has = rt.get_type(ty)?.has_method(id);
    Ok(rt.protected_boolean(has))
}

// ==================== scope & globals ====================

// isinscope(name)
fn cf_isinscope(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 1)?;
    verify_arg(rt, args, 0, rt.builtin_types.string)?;
    let name = rt.string_value(args[0])?.to_string();
    let id = rt.names.intern(&name);
    Ok(rt.protected_boolean(rt.scopes.query(id)))
}

// hide(name) - removes the first variable lookup would find
fn cf_hide(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 1)?;
    verify_arg(rt, args, 0, rt.builtin_types.string)?;
    let name = rt.string_value(args[0])?.to_string();
    let id = rt.names.intern(&name);
    match rt.scopes.frame_of(id) {
        Some(idx) => {
            rt.scopes.frame_mut(idx).variables.remove(&id);
            Ok(rt.protected_boolean(true))
        }
        None => Ok(rt.protected_boolean(false)),
    }
}

// unlockscope() - lets the current function's frame see its caller
fn cf_unlockscope(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 0)?;
    if let Some(idx) = rt.scopes.nearest_call_frame() {
        rt.scopes.frame_mut(idx).can_access_prev = true;
    }
    Ok(rt.protected_nothing())
}

// lockscope() - seals the current function's frame again
fn cf_lockscope(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 0)?;
    if let Some(idx) = rt.scopes.nearest_call_frame() {
        rt.scopes.frame_mut(idx).can_access_prev = false;
    }
    Ok(rt.protected_nothing())
}

fn cf_checkglobal(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 1)?;
    verify_arg(rt, args, 0, rt.builtin_types.string)?;
    let name = rt.string_value(args[0])?.to_string();
    let id = rt.names.intern(&name);
    Ok(rt.protected_boolean(rt.check_global(id)))
}

fn cf_getglobal(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 1)?;
    verify_arg(rt, args, 0, rt.builtin_types.string)?;
    let name = rt.string_value(args[0])?.to_string();
    let id = rt.names.intern(&name);
    rt.get_global(id)
}

fn cf_setglobal(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 2)?;
    verify_arg(rt, args, 0, rt.builtin_types.string)?;
    let name = rt.string_value(args[0])?.to_string();
    let id = rt.names.intern(&name);
    rt.spread_multi_use(args[1]);
    rt.set_global(id, args[1]);
    Ok(args[1])
}

fn cf_removeglobal(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 1)?;
    verify_arg(rt, args, 0, rt.builtin_types.string)?;
    let name = rt.string_value(args[0])?.to_string();
    let id = rt.names.intern(&name);
    rt.remove_global(id);
    Ok(rt.protected_nothing())
}

// swap(a, b) - exchanges the payloads of two objects
fn cf_swap(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 2)?;
    let a = rt.get_object(args[0])?.clone();
    let b = rt.get_object(args[1])?.clone();
    {
        let first = rt.get_object_mut(args[0])?;
        first.is_instance = b.is_instance;
        first.instance = b.instance;
        first.type_ref = b.type_ref;
    }
    {
        let second = rt.get_object_mut(args[1])?;
        second.is_instance = a.is_instance;
        second.instance = a.instance;
        second.type_ref = a.type_ref;
    }
    Ok(rt.protected_nothing())
}

// ==================== numerics ====================

fn cf_abs(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 1)?;
    if rt.is_instance_object(args[0], Some(rt.builtin_types.integer)) {
        let v = rt.int_value(args[0])?;
        return Ok(rt.new_integer(v.wrapping_abs()));
    }
    if rt.is_instance_object(args[0], Some(rt.builtin_types.real)) {
        let v = rt.real_value(args[0])?;
        return Ok(rt.new_real(v.abs()));
    }
    Err(rt.error(
        ErrorKind::TypeMismatch,
        "Expected either an integer or a real value",
        rt.sub_area(1),
    ))
}

fn numeric_pair(rt: &Runtime, args: &[ObjRef]) -> Option<bool> {
    let ints = rt.is_instance_object(args[0], Some(rt.builtin_types.integer))
        && rt.is_instance_object(args[1], Some(rt.builtin_types.integer));
    let reals = rt.is_instance_object(args[0], Some(rt.builtin_types.real))
        && rt.is_instance_object(args[1], Some(rt.builtin_types.real));
    if ints {
        Some(true)
    } else if reals {
        Some(false)
    } else {
        None
    }
}

fn cf_max(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 2)?;
    match numeric_pair(rt, args) {
        Some(true) => {
            let v = rt.int_value(args[0])?.max(rt.int_value(args[1])?);
            Ok(rt.new_integer(v))
        }
        Some(false) => {
            let v = rt.real_value(args[0])?.max(rt.real_value(args[1])?);
            Ok(rt.new_real(v))
        }
        None => Err(rt.error_here(
            ErrorKind::TypeMismatch,
            "Expected either two integer or two real values",
        )),
    }
}

fn cf_min(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 2)?;
    match numeric_pair(rt, args) {
        Some(true) => {
            let v = rt.int_value(args[0])?.min(rt.int_value(args[1])?);
            Ok(rt.new_integer(v))
        }
        Some(false) => {
            let v = rt.real_value(args[0])?.min(rt.real_value(args[1])?);
            Ok(rt.new_real(v))
        }
        None => Err(rt.error_here(
            ErrorKind::TypeMismatch,
            "Expected either two integer or two real values",
        )),
    }
}

// ==================== modules & shared libraries ====================

/// Resolves `rel` against the directory of the currently executing source
/// file, then against `env_var`.
fn resolve_path(rt: &Runtime, rel: &str, env_var: &str) -> Result<PathBuf, RuntimeError> {
    let mut path = PathBuf::from(rel);
    if !path.is_absolute() {
        if let Some(dir) = rt.source_path.as_ref().and_then(|p| p.parent()) {
            let candidate = dir.join(&path);
            if candidate.is_file() {
                path = candidate;
            }
        }
        if !path.is_file() {
            if let Ok(base) = std::env::var(env_var) {
                let candidate = PathBuf::from(base).join(&path);
                if candidate.is_file() {
                    path = candidate;
                }
            }
        }
    }
    path.canonicalize().map_err(|_| {
        rt.error_here(
            ErrorKind::ImportError,
            format!("The path '{}' is either invalid or non existent", rel),
        )
    })
}

// load(name) - executes `name.ctn` once and memoizes its result
fn cf_load(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 1)?;
    verify_arg(rt, args, 0, rt.builtin_types.string)?;
    let rel = format!("{}.ctn", rt.string_value(args[0])?);
    let path = resolve_path(rt, &rel, "COTTON_MODULES_PATH")?;

    let key = rt.names.intern(&format!("load: {}", path.display()));
    if rt.check_global(key) {
        return rt.get_global(key);
    }

    let source = std::fs::read_to_string(&path).map_err(|e| {
        rt.error_here(
            ErrorKind::ImportError,
            format!("Failed to read module '{}': {}", path.display(), e),
        )
    })?;
    let program = Parser::new(&source, &mut rt.names)
        .and_then(|mut p| p.parse_program())
        .map_err(|e| {
            rt.error_here(
                ErrorKind::ImportError,
                format!("Failed to parse module '{}': {}", path.display(), e),
            )
        })?;

    log::debug!("loading module {}", path.display());
    let nothing = rt.protected_nothing();
    rt.set_global(key, nothing);

    let saved_path = rt.source_path.replace(path);
    rt.scopes.push(false);
    let res = rt.run_statements(&program, true);
    rt.scopes.pop();
    rt.source_path = saved_path;

    let res = res?;
    rt.spread_multi_use(res);
    rt.set_global(key, res);
    Ok(res)
}

// sharedlibrary(path) - loads a dynamic library and runs its entry point
fn cf_sharedlibrary(rt: &mut Runtime, args: &[ObjRef], _matters: bool) -> Result<ObjRef, RuntimeError> {
    rt.verify_exact_args(args, 1)?;
    verify_arg(rt, args, 0, rt.builtin_types.string)?;
    let rel = rt.string_value(args[0])?.to_string();
    let path = resolve_path(rt, &rel, "COTTON_LIBRARY_PATH")?;

    let key = rt.names.intern(&format!("shared_library: {}", path.display()));
    if rt.check_global(key) {
        return rt.get_global(key);
    }
    let nothing = rt.protected_nothing();
    rt.set_global(key, nothing);

    log::debug!("loading shared library {}", path.display());
    let lib = unsafe { libloading::Library::new(&path) }.map_err(|e| {
        rt.error_here(
            ErrorKind::ImportError,
            format!("Failed to load library '{}': {}", path.display(), e),
        )
    })?;
    let res = unsafe {
        let entry: libloading::Symbol<crate::LibraryLoadPoint> =
            lib.get(b"cotton_library_load").map_err(|e| {
                rt.error_here(
                    ErrorKind::ImportError,
                    format!("Library '{}' has no load point: {}", path.display(), e),
                )
            })?;
        entry(rt)
    };
    // the library stays mapped for the process lifetime
    std::mem::forget(lib);

    rt.get_object(res)?;
    rt.spread_multi_use(res);
    rt.set_global(key, res);
    Ok(res)
}

// ==================== installation ====================

pub fn install(rt: &mut Runtime) {
    let catalogue: &[(&str, NativeFn)] = &[
        ("make", cf_make),
        ("copy", cf_copy),
        ("bool", cf_bool),
        ("char", cf_char),
        ("int", cf_int),
        ("real", cf_real),
        ("string", cf_string),
        ("repr", cf_repr),
        ("printraw", cf_printraw),
        ("print", cf_print),
        ("printf", cf_printf),
        ("println", cf_println),
        ("readraw", cf_readraw),
        ("read", cf_read),
        ("readln", cf_readln),
        ("exit", cf_exit),
        ("error", cf_error),
        ("assert", cf_assert),
        ("argc", cf_argc),
        ("argv", cf_argv),
        ("argg", cf_argg),
        ("is", cf_is),
        ("typeof", cf_typeof),
        ("isinsobj", cf_isinsobj),
        ("istypeobj", cf_istypeobj),
        ("hasfield", cf_hasfield),
        ("hasmethod", cf_hasmethod),
        ("isinscope", cf_isinscope),
        ("hide", cf_hide),
        ("unlockscope", cf_unlockscope),
        ("lockscope", cf_lockscope),
        ("checkglobal", cf_checkglobal),
        ("getglobal", cf_getglobal),
        ("setglobal", cf_setglobal),
        ("removeglobal", cf_removeglobal),
        ("swap", cf_swap),
        ("abs", cf_abs),
        ("min", cf_min),
        ("max", cf_max),
        ("load", cf_load),
        ("sharedlibrary", cf_sharedlibrary),
    ];

    for (name, f) in catalogue {
        let func = rt.native_function(*f);
        let id = rt.names.intern(name);
        rt.scopes.add_variable(id, func);
    }
}
