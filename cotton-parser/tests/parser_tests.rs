use cotton_ast::*;
use cotton_parser::Parser;

fn parse(source: &str) -> Program {
    let mut names = NameTable::new();
    let mut parser = Parser::new(source, &mut names).expect("lexing failed");
    parser.parse_program().expect("parsing failed")
}

fn parse_with_names(source: &str) -> (Program, NameTable) {
    let mut names = NameTable::new();
    let program = {
        let mut parser = Parser::new(source, &mut names).expect("lexing failed");
        parser.parse_program().expect("parsing failed")
    };
    (program, names)
}

fn first_expr(program: &Program) -> &Expr {
    match &program.statements[0].kind {
        StmtKind::Expr { expr } => expr,
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_operator_precedence() {
    // 1 + 2 * 3 must parse as 1 + (2 * 3)
    let program = parse("1 + 2 * 3;");
    let expr = first_expr(&program);
    let ExprKind::Operator(add) = &expr.kind else {
        panic!("expected operator");
    };
    assert_eq!(add.id, OpId::Plus);
    let ExprKind::Operator(mult) = &add.second.as_ref().unwrap().kind else {
        panic!("expected nested operator");
    };
    assert_eq!(mult.id, OpId::Mult);
}

#[test]
fn test_assignment_is_right_associative() {
    let program = parse("a = b = 1;");
    let expr = first_expr(&program);
    let ExprKind::Operator(outer) = &expr.kind else {
        panic!("expected operator");
    };
    assert_eq!(outer.id, OpId::Assign);
    assert!(outer.first.as_identifier().is_some());
    let ExprKind::Operator(inner) = &outer.second.as_ref().unwrap().kind else {
        panic!("expected nested assignment");
    };
    assert_eq!(inner.id, OpId::Assign);
}

#[test]
fn test_call_with_comma_chain_arguments() {
    let program = parse("f(1, 2, 3);");
    let expr = first_expr(&program);
    let ExprKind::Operator(call) = &expr.kind else {
        panic!("expected operator");
    };
    assert_eq!(call.id, OpId::Call);
    assert!(call.first.as_identifier().is_some());

    // arguments stay a right-leaning comma chain
    let ExprKind::Operator(comma) = &call.second.as_ref().unwrap().kind else {
        panic!("expected comma chain");
    };
    assert_eq!(comma.id, OpId::Comma);
}

#[test]
fn test_empty_call() {
    let program = parse("f();");
    let expr = first_expr(&program);
    let ExprKind::Operator(call) = &expr.kind else {
        panic!("expected operator");
    };
    assert_eq!(call.id, OpId::Call);
    assert!(call.second.is_none());
}

#[test]
fn test_dot_call_shape() {
    // p.sum() parses as CALL(DOT(p, sum))
    let program = parse("p.sum();");
    let expr = first_expr(&program);
    let ExprKind::Operator(call) = &expr.kind else {
        panic!("expected operator");
    };
    assert_eq!(call.id, OpId::Call);
    let dot = call.first.as_dot().expect("expected dotted callee");
    assert_eq!(dot.id, OpId::Dot);
}

#[test]
fn test_array_literal_desugars_to_array_call() {
    let (program, mut names) = parse_with_names("[1, 2];");
    let expr = first_expr(&program);
    let ExprKind::Operator(call) = &expr.kind else {
        panic!("expected operator");
    };
    assert_eq!(call.id, OpId::Call);
    let array_id = names.intern("Array");
    assert_eq!(call.first.as_identifier(), Some(array_id));
}

#[test]
fn test_for_with_all_clauses() {
    let program = parse("for i = 0; i < 3; i = i + 1; { x = i; }");
    let StmtKind::For { init, cond, step, body } = &program.statements[0].kind else {
        panic!("expected for statement");
    };
    assert!(init.is_some());
    assert!(cond.is_some());
    assert!(step.is_some());
    assert!(matches!(body.kind, StmtKind::Block { .. }));
}

#[test]
fn test_for_with_empty_clauses() {
    let program = parse("for ;;; { break; }");
    let StmtKind::For { init, cond, step, .. } = &program.statements[0].kind else {
        panic!("expected for statement");
    };
    assert!(init.is_none());
    assert!(cond.is_none());
    assert!(step.is_none());
}

#[test]
fn test_if_else_chain() {
    let program = parse("if a b = 1; else if c b = 2; else b = 3;");
    let StmtKind::If { else_body, .. } = &program.statements[0].kind else {
        panic!("expected if statement");
    };
    let inner = else_body.as_ref().expect("expected else branch");
    assert!(matches!(inner.kind, StmtKind::If { .. }));
}

#[test]
fn test_unscoped_block() {
    let program = parse("unscoped { x = 1; }");
    let StmtKind::Block { unscoped, list } = &program.statements[0].kind else {
        panic!("expected block");
    };
    assert!(*unscoped);
    assert_eq!(list.len(), 1);
}

#[test]
fn test_function_definition() {
    let program = parse("f = function(a, b) { return a + b; };");
    let expr = first_expr(&program);
    let ExprKind::Operator(assign) = &expr.kind else {
        panic!("expected assignment");
    };
    let ExprKind::FuncDef(def) = &assign.second.as_ref().unwrap().kind else {
        panic!("expected function definition");
    };
    assert!(def.name.is_none());
    assert_eq!(def.params.len(), 2);
}

#[test]
fn test_named_function_definition() {
    let program = parse("function fib(n) return n;");
    let expr = first_expr(&program);
    let ExprKind::FuncDef(def) = &expr.kind else {
        panic!("expected function definition");
    };
    assert!(def.name.is_some());
    assert_eq!(def.params.len(), 1);
}

#[test]
fn test_type_definition() {
    let program = parse("type Pt { x; y; method sum(self) { return self.x + self.y; } };");
    let expr = first_expr(&program);
    let ExprKind::TypeDef(def) = &expr.kind else {
        panic!("expected type definition");
    };
    assert_eq!(def.fields.len(), 2);
    assert_eq!(def.methods.len(), 1);
    assert!(def.methods[0].name.is_some());
}

#[test]
fn test_at_operator_is_prefix() {
    let program = parse("b = @a;");
    let expr = first_expr(&program);
    let ExprKind::Operator(assign) = &expr.kind else {
        panic!("expected assignment");
    };
    let ExprKind::Operator(at) = &assign.second.as_ref().unwrap().kind else {
        panic!("expected @ operator");
    };
    assert_eq!(at.id, OpId::At);
    assert!(at.second.is_none());
}

#[test]
fn test_index_operator() {
    let program = parse("a[0] = 99;");
    let expr = first_expr(&program);
    let ExprKind::Operator(assign) = &expr.kind else {
        panic!("expected assignment");
    };
    let ExprKind::Operator(index) = &assign.first.kind else {
        panic!("expected index on the left");
    };
    assert_eq!(index.id, OpId::Index);
}

#[test]
fn test_postfix_binds_tighter_than_prefix() {
    let program = parse("-a++;");
    let expr = first_expr(&program);
    let ExprKind::Operator(neg) = &expr.kind else {
        panic!("expected operator");
    };
    assert_eq!(neg.id, OpId::Negative);
    let ExprKind::Operator(inc) = &neg.first.kind else {
        panic!("expected postfix inside");
    };
    assert_eq!(inc.id, OpId::PostInc);
}

#[test]
fn test_missing_semicolon_is_an_error() {
    let mut names = NameTable::new();
    let mut parser = Parser::new("x = 1", &mut names).expect("lexing failed");
    assert!(parser.parse_program().is_err());
}

#[test]
fn test_unclosed_block_is_an_error() {
    let mut names = NameTable::new();
    let mut parser = Parser::new("{ x = 1;", &mut names).expect("lexing failed");
    assert!(parser.parse_program().is_err());
}

#[test]
fn test_spans_cover_expressions() {
    let source = "x = 1 + 2;";
    let program = parse(source);
    let expr = first_expr(&program);
    assert_eq!(&source[expr.span.start..expr.span.end], "x = 1 + 2");
}
