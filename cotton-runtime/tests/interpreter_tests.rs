// End-to-end interpreter tests: real source through lexer + parser +
// evaluator, with output captured through the runtime's sink.

use cotton_parser::Parser;
use cotton_runtime::{AlwaysStrategy, ErrorKind, Runtime, RuntimeError};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn run_in(rt: &mut Runtime, source: &str) -> Result<String, RuntimeError> {
    let buf = SharedBuf::default();
    rt.out = Box::new(buf.clone());
    let program = {
        let mut parser = Parser::new(source, &mut rt.names).expect("lexing failed");
        parser.parse_program().expect("parsing failed")
    };
    rt.run_program(&program, false)?;
    let bytes = buf.0.borrow().clone();
    Ok(String::from_utf8(bytes).expect("output is valid utf-8"))
}

fn run(source: &str) -> String {
    let mut rt = Runtime::new();
    run_in(&mut rt, source).expect("program failed")
}

fn run_err(source: &str) -> RuntimeError {
    let mut rt = Runtime::new();
    run_in(&mut rt, source).expect_err("program should have failed")
}

// ==================== end-to-end scenarios ====================

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(run("println(1 + 2 * 3);"), "7\n");
}

#[test]
fn test_for_loop_accumulation() {
    let out = run("x = 0; for i = 1; i <= 5; i = i + 1; x = x + i; println(x);");
    assert_eq!(out, "15\n");
}

#[test]
fn test_recursive_fibonacci() {
    let out = run(
        "f = function(n) { if n < 2 return n; return f(n-1) + f(n-2); }; println(f(10));",
    );
    assert_eq!(out, "55\n");
}

#[test]
fn test_record_type_with_method() {
    let out = run(
        "type Pt { x; y; method sum(self) { return self.x + self.y; } }; \
         p = make(Pt); p.x = 3; p.y = 4; println(p.sum());",
    );
    assert_eq!(out, "7\n");
}

#[test]
fn test_array_inner_storage_is_shared() {
    let out = run("a = [1,2,3]; b = a; b[0] = 99; println(a[0]);");
    assert_eq!(out, "99\n");
}

#[test]
fn test_direct_pass_assignment_writes_through() {
    let out = run("a = 1; b = @a; b = 42; println(a);");
    assert_eq!(out, "42\n");
}

// ==================== object model & collector ====================

#[test]
fn test_literal_caching() {
    // two evaluations of the same literal token are reference-equal
    assert_eq!(run("println(is(5, 5));"), "true\n");

    let mut rt = Runtime::new();
    run_in(&mut rt, "x = 7;").expect("program failed");
    let id = rt.names.intern("7");
    let lit = rt.cached_literal(id).expect("literal must be cached");
    assert!(!rt.get_object(lit).unwrap().can_modify);
}

#[test]
fn test_singleton_identity() {
    let out = run(
        "println(is(nothing, nothing)); println(is(true, true)); \
         println(is(false, false)); println(is(true, false));",
    );
    assert_eq!(out, "true\ntrue\ntrue\nfalse\n");
}

#[test]
fn test_copy_semantics() {
    let mut rt = Runtime::new();

    // freshly produced objects are single-use: identity may be preserved
    let fresh = rt.new_integer(42);
    let elided = rt.copy(fresh).unwrap();
    assert_eq!(elided, fresh);

    // a bound object is multi-use: copies have distinct identity
    let id = rt.names.intern("x");
    rt.add_variable(id, fresh);
    let copied = rt.copy(fresh).unwrap();
    assert_ne!(copied, fresh);
    assert_eq!(rt.int_value(copied).unwrap(), 42);
    assert_ne!(
        rt.get_object(copied).unwrap().instance,
        rt.get_object(fresh).unwrap().instance
    );
}

#[test]
fn test_gc_reachability() {
    let mut rt = Runtime::new();

    let id = rt.names.intern("keep");
    let obj = rt.new_integer(10);
    rt.add_variable(id, obj);
    rt.gc_collect();
    assert!(rt.gc.is_live(obj));

    rt.scopes.remove_variable(id);
    rt.gc_collect();
    assert!(!rt.gc.is_live(obj));
}

#[test]
fn test_gc_hold_release() {
    let mut rt = Runtime::new();

    let obj = rt.new_integer(11);
    rt.gc.hold(obj);
    rt.gc_collect();
    rt.gc_collect();
    assert!(rt.gc.is_live(obj));

    rt.gc.release(obj);
    rt.gc_collect();
    assert!(!rt.gc.is_live(obj));
}

#[test]
fn test_gc_nested_holds() {
    let mut rt = Runtime::new();

    let obj = rt.new_integer(12);
    rt.gc.hold(obj);
    rt.gc.hold(obj);
    rt.gc.release(obj);
    rt.gc_collect();
    assert!(rt.gc.is_live(obj), "one hold must still protect the object");

    rt.gc.release(obj);
    rt.gc_collect();
    assert!(!rt.gc.is_live(obj));
}

#[test]
fn test_scope_lookup_and_unlockscope() {
    // inside a function, the caller's locals are invisible until
    // unlockscope(); the global frame stays reachable throughout
    let out = run(
        "g = 1; \
         probe = function() { \
             before = isinscope(\"caller_local\"); \
             unlockscope(); \
             after = isinscope(\"caller_local\"); \
             println(before, after, g); \
         }; \
         entry = function() { caller_local = 7; probe(); }; \
         entry();",
    );
    assert_eq!(out, "false true 1\n");
}

#[test]
fn test_field_wins_over_method() {
    let out = run(
        "type T { f; method f(self) { return 1; } }; \
         t = make(T); \
         t.f = function() { return 2; }; \
         println(t.f());",
    );
    assert_eq!(out, "2\n");
}

#[test]
fn test_plain_assignment_does_not_alias() {
    let out = run("x = 1; y = x; y = 7; println(x);");
    assert_eq!(out, "1\n");
}

#[test]
fn test_operator_overload_via_magic_method() {
    let out = run(
        "type Vec2 { x; y; \
             method __add__(a, b) { \
                 r = make(Vec2); r.x = a.x + b.x; r.y = a.y + b.y; return r; \
             } \
         }; \
         v = make(Vec2); v.x = 1; v.y = 2; \
         w = make(Vec2); w.x = 10; w.y = 20; \
         u = v + w; \
         println(u.x, u.y);",
    );
    assert_eq!(out, "11 22\n");
}

// ==================== language behavior ====================

#[test]
fn test_while_with_break_and_continue() {
    let out = run(
        "i = 0; total = 0; \
         while true { \
             i = i + 1; \
             if i > 10 break; \
             if i % 2 == 0 continue; \
             total = total + i; \
         } \
         println(total);",
    );
    // 1 + 3 + 5 + 7 + 9
    assert_eq!(out, "25\n");
}

#[test]
fn test_compound_assignments() {
    let out = run("x = 10; x += 5; x -= 3; x *= 4; x /= 2; x %= 7; println(x);");
    // ((10+5-3)*4/2)%7 = 24%7 = 3
    assert_eq!(out, "3\n");
}

#[test]
fn test_comma_yields_leftmost() {
    assert_eq!(run("x = (1, 2, 3); println(x);"), "1\n");
}

#[test]
fn test_string_concat_and_compare() {
    let out = run(
        "s = \"foo\" + \"bar\"; println(s); println(s == \"foobar\"); println(\"a\" < \"b\");",
    );
    assert_eq!(out, "foobar\ntrue\ntrue\n");
}

#[test]
fn test_string_index_and_size() {
    let out = run("s = \"cotton\"; println(s[0]); println(s.size());");
    assert_eq!(out, "c\n6\n");
}

#[test]
fn test_array_methods() {
    let out = run(
        "a = [1, 2]; a.append(3); println(a.size()); println(a); \
         p = a.pop(); println(p); println(a.size());",
    );
    assert_eq!(out, "3\n[1, 2, 3]\n3\n2\n");
}

#[test]
fn test_loop_locals_die_with_the_iteration() {
    let out = run(
        "for i = 0; i < 3; i = i + 1; { probe = 1; } \
         println(isinscope(\"probe\"));",
    );
    assert_eq!(out, "false\n");
}

#[test]
fn test_typeof_and_predicates() {
    let out = run(
        "println(is(typeof(1), Integer)); \
         println(isinsobj(1)); println(istypeobj(Integer)); println(isinsobj(Integer));",
    );
    assert_eq!(out, "true\ntrue\ntrue\nfalse\n");
}

#[test]
fn test_conversions() {
    let out = run("println(int(3.9)); println(real(2)); println(string(17) + \"!\");");
    assert_eq!(out, "3\n2.0\n17!\n");
}

#[test]
fn test_printf_positional_holes() {
    let out = run("printf(\"@{0} + @{0} = @{1}@@\", 2, 4);");
    assert_eq!(out, "2 + 2 = 4@");
}

#[test]
fn test_argc_argv() {
    let out = run(
        "report = function() { println(argc()); println(argv()); }; report(1, 2, 3);",
    );
    assert_eq!(out, "3\n[1, 2, 3]\n");
}

#[test]
fn test_hide_removes_first_found() {
    // the parameter binding goes away, the global shows through
    let out = run(
        "x = 1; \
         f = function(x) { println(hide(\"x\")); println(x); }; \
         f(5);",
    );
    assert_eq!(out, "true\n1\n");
}

#[test]
fn test_hide_on_unknown_name() {
    assert_eq!(run("println(hide(\"no_such_name\"));"), "false\n");
}

#[test]
fn test_unscoped_block_binds_in_enclosing_frame() {
    let out = run("unscoped { probe = 5; } println(probe);");
    assert_eq!(out, "5\n");
}

#[test]
fn test_scoped_block_locals_vanish() {
    let out = run("{ probe = 5; } println(isinscope(\"probe\"));");
    assert_eq!(out, "false\n");
}

#[test]
fn test_make_invokes_magic_make() {
    let out = run(
        "type Pt { x; y; method __make__(self, a, b) { self.x = a; self.y = b; } }; \
         p = make(Pt, 3, 9); println(p.x, p.y);",
    );
    assert_eq!(out, "3 9\n");
}

#[test]
fn test_records_are_reference_types() {
    let out = run(
        "type Box { v; }; \
         b = make(Box); b.v = 1; \
         c = b; c.v = 2; \
         println(b.v);",
    );
    assert_eq!(out, "2\n");
}

#[test]
fn test_swap_by_reference() {
    let out = run("a = 1; b = \"two\"; swap(@a, @b); println(a); println(b);");
    assert_eq!(out, "two\n1\n");
}

#[test]
fn test_globals_roundtrip() {
    let out = run(
        "setglobal(\"answer\", 42); \
         println(checkglobal(\"answer\")); println(getglobal(\"answer\")); \
         removeglobal(\"answer\"); println(checkglobal(\"answer\"));",
    );
    assert_eq!(out, "true\n42\nfalse\n");
}

#[test]
fn test_gc_stress_does_not_reclaim_live_objects() {
    // a cycle on every statement boundary must not break evaluation
    let mut rt = Runtime::with_strategy(Box::new(AlwaysStrategy));
    let out = run_in(
        &mut rt,
        "f = function(n) { if n < 2 return n; return f(n-1) + f(n-2); }; \
         a = [1, 2, 3]; \
         type Pt { x; y; method sum(self) { return self.x + self.y; } }; \
         p = make(Pt); p.x = f(10); p.y = a[2]; \
         println(p.sum());",
    )
    .expect("program failed");
    assert_eq!(out, "58\n");
}

// ==================== errors ====================

#[test]
fn test_division_by_zero() {
    let err = run_err("x = 1 / 0;");
    assert_eq!(err.kind, ErrorKind::DivisionByZero);
}

#[test]
fn test_unresolved_name() {
    let err = run_err("println(missing_name);");
    assert_eq!(err.kind, ErrorKind::NameNotFound);
}

#[test]
fn test_name_suggestion() {
    let err = run_err("countter = 1; println(counter);");
    assert_eq!(err.kind, ErrorKind::NameNotFound);
    assert!(err.message.contains("countter"), "message: {}", err.message);
}

#[test]
fn test_operator_not_supported() {
    let err = run_err("x = nothing + 1;");
    assert_eq!(err.kind, ErrorKind::OperatorNotSupported);
}

#[test]
fn test_assignment_to_immutable() {
    let err = run_err("5 = 3;");
    assert_eq!(err.kind, ErrorKind::AssignmentToImmutable);
}

#[test]
fn test_index_out_of_bounds() {
    let err = run_err("a = [1]; x = a[5];");
    assert_eq!(err.kind, ErrorKind::OutOfBounds);
}

#[test]
fn test_user_error() {
    let err = run_err("error(\"boom\");");
    assert_eq!(err.kind, ErrorKind::UserError);
    assert_eq!(err.message, "boom");
}

#[test]
fn test_assert_failure_and_success() {
    assert_eq!(run("assert(true); println(\"ok\");"), "ok\n");
    let err = run_err("assert(false, \"broken invariant\");");
    assert_eq!(err.kind, ErrorKind::UserError);
    assert!(err.message.contains("broken invariant"));
}

#[test]
fn test_error_carries_span_and_trace() {
    let source = "f = function() { return 1 / 0; }; f();";
    let err = run_err(source);
    assert_eq!(err.kind, ErrorKind::DivisionByZero);
    assert!(err.span.end > err.span.start);
    assert_eq!(&source[err.span.start..err.span.end], "0");
}

#[test]
fn test_runtime_is_usable_after_an_error() {
    let mut rt = Runtime::new();
    run_in(&mut rt, "x = 1 / 0;").expect_err("must fail");
    let out = run_in(&mut rt, "println(2 + 2);").expect("recovery failed");
    assert_eq!(out, "4\n");
}
