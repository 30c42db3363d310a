// The tree-walking evaluator. Every `exec_*` installs an error context for
// its node, dispatches, and leaves the execution-flag word describing how
// the node completed (normal, continue, break, return, direct-pass).

use crate::error::{ErrorKind, RuntimeError};
use crate::heap::ObjRef;
use crate::instance::{FunctionSource, InstanceData};
use crate::runtime::{ObjectKind, Runtime};
use crate::types::{Type, TypeKind};
use cotton_ast::*;
use std::rc::Rc;

impl Runtime {
    /// Executes a whole program in the global frame. On error the scope and
    /// context stacks are unwound back to their resting state.
    pub fn run_program(&mut self, program: &Program, matters: bool) -> Result<ObjRef, RuntimeError> {
        match self.run_statements(program, matters) {
            Ok(v) => Ok(v),
            Err(e) => {
                self.reset_after_error();
                Err(e)
            }
        }
    }

    pub(crate) fn run_statements(
        &mut self,
        program: &Program,
        matters: bool,
    ) -> Result<ObjRef, RuntimeError> {
        let mut res = self.protected_nothing();
        for stmt in &program.statements {
            res = self.execute_stmt(stmt, matters)?;
            if !self.is_exec_none() {
                break;
            }
        }
        self.clear_exec_flags();
        Ok(res)
    }

    // ==================== statements ====================

    pub fn execute_stmt(&mut self, stmt: &Stmt, matters: bool) -> Result<ObjRef, RuntimeError> {
        self.gc_ping();
        match &stmt.kind {
            StmtKind::While { cond, body } => self.exec_while(stmt.span, cond, body, matters),
            StmtKind::For { init, cond, step, body } => {
                self.exec_for(stmt.span, init.as_ref(), cond.as_ref(), step.as_ref(), body, matters)
            }
            StmtKind::If { cond, body, else_body } => {
                self.exec_if(cond, body, else_body.as_deref(), matters)
            }
            StmtKind::Continue => {
                self.set_exec_continue();
                Ok(self.protected_nothing())
            }
            StmtKind::Break => {
                self.set_exec_break();
                Ok(self.protected_nothing())
            }
            StmtKind::Return { value } => self.exec_return(stmt.span, value.as_ref(), matters),
            StmtKind::Block { unscoped, list } => {
                self.exec_block(stmt.span, *unscoped, list, matters)
            }
            StmtKind::Expr { expr } => self.execute_expr(expr, matters),
        }
    }

    fn exec_while(
        &mut self,
        span: Span,
        cond: &Expr,
        body: &Stmt,
        matters: bool,
    ) -> Result<ObjRef, RuntimeError> {
        self.push_context();
        loop {
            self.context_mut().area = span;
            self.scopes.push(true);

            self.context_mut().area = cond.span;
            let c = self.execute_expr(cond, true)?;
            if !self.bool_value(c)? {
                self.scopes.pop();
                break;
            }

            self.context_mut().area = body.span;
            let body_res = self.execute_stmt(body, matters)?;
            self.scopes.pop();
            if self.is_exec_break() {
                break;
            }
            if self.is_exec_return() {
                self.pop_context();
                return Ok(body_res);
            }
            // NONE and CONTINUE both fall through to the next iteration
        }
        self.clear_exec_flags();
        self.pop_context();
        Ok(self.protected_nothing())
    }

    fn exec_for(
        &mut self,
        span: Span,
        init: Option<&Expr>,
        cond: Option<&Expr>,
        step: Option<&Expr>,
        body: &Stmt,
        matters: bool,
    ) -> Result<ObjRef, RuntimeError> {
        // the init clause runs once, in the enclosing frame
        if let Some(init) = init {
            self.execute_expr(init, false)?;
        }
        self.push_context();
        loop {
            self.context_mut().area = span;
            self.scopes.push(true);

            if let Some(cond) = cond {
                self.context_mut().area = cond.span;
                let c = self.execute_expr(cond, true)?;
                if !self.bool_value(c)? {
                    self.scopes.pop();
                    break;
                }
            }

            self.context_mut().area = body.span;
            let body_res = self.execute_stmt(body, matters)?;
            if self.is_exec_break() {
                self.scopes.pop();
                break;
            }
            if self.is_exec_return() {
                self.scopes.pop();
                self.pop_context();
                return Ok(body_res);
            }

            if let Some(step) = step {
                self.context_mut().area = step.span;
                self.execute_expr(step, false)?;
            }
            self.scopes.pop();
        }
        self.clear_exec_flags();
        self.pop_context();
        Ok(self.protected_nothing())
    }

    fn exec_if(
        &mut self,
        cond: &Expr,
        body: &Stmt,
        else_body: Option<&Stmt>,
        matters: bool,
    ) -> Result<ObjRef, RuntimeError> {
        self.push_context();
        self.context_mut().area = cond.span;
        let c = self.execute_expr(cond, true)?;
        let truthy = self.bool_value(c)?;
        self.pop_context();

        if truthy {
            return self.execute_stmt(body, matters);
        }
        if let Some(else_body) = else_body {
            return self.execute_stmt(else_body, matters);
        }
        self.clear_exec_flags();
        Ok(self.protected_nothing())
    }

    fn exec_return(
        &mut self,
        span: Span,
        value: Option<&Expr>,
        matters: bool,
    ) -> Result<ObjRef, RuntimeError> {
        self.push_context();
        self.context_mut().area = span;

        let Some(value) = value else {
            self.set_exec_return();
            self.pop_context();
            return Ok(self.protected_nothing());
        };

        let res = self.execute_expr(value, matters)?;
        if self.is_exec_direct_pass() {
            self.set_exec_return();
            self.pop_context();
            return Ok(res);
        }
        let res = if matters { self.copy(res)? } else { res };
        self.set_exec_return();
        self.pop_context();
        Ok(res)
    }

    fn exec_block(
        &mut self,
        span: Span,
        unscoped: bool,
        list: &[Stmt],
        matters: bool,
    ) -> Result<ObjRef, RuntimeError> {
        self.push_context();
        self.context_mut().area = span;
        if !unscoped {
            self.scopes.push(true);
        }

        let mut res = self.protected_nothing();
        for stmt in list {
            res = match self.execute_stmt(stmt, matters) {
                Ok(v) => v,
                Err(e) => {
                    if !unscoped {
                        self.scopes.pop();
                    }
                    self.pop_context();
                    return Err(e);
                }
            };
            if !self.is_exec_none() {
                if !unscoped {
                    self.scopes.pop();
                }
                self.pop_context();
                return Ok(res);
            }
        }

        if !unscoped {
            self.scopes.pop();
        }
        self.clear_exec_flags();
        self.pop_context();
        Ok(res)
    }

    // ==================== expressions ====================

    pub fn execute_expr(&mut self, expr: &Expr, matters: bool) -> Result<ObjRef, RuntimeError> {
        match &expr.kind {
            ExprKind::FuncDef(def) => self.exec_func_def(def, matters),
            ExprKind::TypeDef(def) => self.exec_type_def(def, matters),
            ExprKind::Operator(op) => self.exec_operator(op, matters),
            ExprKind::Atom(atom) => self.exec_atom(atom, matters),
            ExprKind::Paren(inner) => self.execute_expr(inner, matters),
        }
    }

    fn exec_func_def(&mut self, def: &Rc<FuncDef>, _matters: bool) -> Result<ObjRef, RuntimeError> {
        self.push_context();
        self.context_mut().area = def.span;

        let func = self.alloc_instance(
            self.builtin_types.function,
            InstanceData::Function(FunctionSource::User(def.clone())),
        );
        self.spread_single_use(func);
        if let Some(name) = &def.name {
            self.add_variable(name.id, func);
        }

        self.pop_context();
        self.clear_exec_flags();
        Ok(func)
    }

    fn exec_type_def(&mut self, def: &TypeDef, _matters: bool) -> Result<ObjRef, RuntimeError> {
        self.push_context();
        self.context_mut().area = def.span;

        let mut ty = Type::new(TypeKind::Record, 0, false);
        ty.name_id = Some(def.name.id);
        ty.instance_fields = def.fields.iter().map(|f| f.id).collect();
        ty.create = Some(crate::builtin::record::record_create);
        ty.copy = Some(crate::builtin::record::record_copy);

        for method in &def.methods {
            self.push_context();
            self.context_mut().area = method.span;
            let func = self.alloc_instance(
                self.builtin_types.function,
                InstanceData::Function(FunctionSource::User(method.clone())),
            );
            let name = method
                .name
                .as_ref()
                .ok_or_else(|| self.error_here(ErrorKind::InternalError, "Method without a name"))?;
            ty.add_method(name.id, func);
            self.pop_context();
        }

        let ty_ref = self.gc.track_type(ty);
        let res = self.make(ty_ref, ObjectKind::TypeObject)?;
        self.register_type_object(ty_ref, res);
        self.add_variable(def.name.id, res);

        self.pop_context();
        self.clear_exec_flags();
        Ok(res)
    }

    fn exec_atom(&mut self, atom: &Atom, matters: bool) -> Result<ObjRef, RuntimeError> {
        self.push_context();
        self.context_mut().area = atom.span;

        if !matters && !matches!(atom.kind, AtomKind::Identifier) {
            self.pop_context();
            self.clear_exec_flags();
            return Ok(self.protected_nothing());
        }

        if let Some(cached) = self.cached_literal(atom.id) {
            self.pop_context();
            self.clear_exec_flags();
            return Ok(cached);
        }

        let (ty, data) = match &atom.kind {
            AtomKind::Identifier => {
                let res = self.lookup_variable(atom.id);
                self.pop_context();
                self.clear_exec_flags();
                return res;
            }
            AtomKind::Boolean(v) => (self.builtin_types.boolean, InstanceData::Boolean(*v)),
            AtomKind::Character(v) => (self.builtin_types.character, InstanceData::Character(*v)),
            AtomKind::Integer(v) => (self.builtin_types.integer, InstanceData::Integer(*v)),
            AtomKind::Real(v) => (self.builtin_types.real, InstanceData::Real(*v)),
            AtomKind::String(v) => (self.builtin_types.string, InstanceData::String(v.clone())),
            AtomKind::Nothing => (self.builtin_types.nothing, InstanceData::Nothing),
        };
        let lit = self.alloc_instance(ty, data);
        self.cache_literal(atom.id, lit);

        self.pop_context();
        self.clear_exec_flags();
        Ok(lit)
    }

    fn exec_operator(&mut self, node: &OperatorExpr, matters: bool) -> Result<ObjRef, RuntimeError> {
        self.push_context();
        self.context_mut().area = node.span;
        let res = self.exec_operator_inner(node, matters);
        self.pop_context();
        res
    }

    fn exec_operator_inner(
        &mut self,
        node: &OperatorExpr,
        matters: bool,
    ) -> Result<ObjRef, RuntimeError> {
        match node.id {
            OpId::Comma => self.exec_comma(node, matters),
            OpId::Call | OpId::Index => self.exec_call_index(node, matters),
            OpId::Dot => self.exec_dot(node),
            OpId::At => {
                let res = self.execute_expr(&node.first, true)?;
                self.set_exec_direct_pass();
                Ok(res)
            }
            OpId::Assign => self.exec_assign(node),
            OpId::PlusAssign => self.exec_compound_assign(node, OpId::Plus),
            OpId::MinusAssign => self.exec_compound_assign(node, OpId::Minus),
            OpId::MultAssign => self.exec_compound_assign(node, OpId::Mult),
            OpId::DivAssign => self.exec_compound_assign(node, OpId::Div),
            OpId::RemAssign => self.exec_compound_assign(node, OpId::Rem),
            OpId::PostInc
            | OpId::PostDec
            | OpId::PreInc
            | OpId::PreDec
            | OpId::Positive
            | OpId::Negative
            | OpId::Not
            | OpId::Inverse => {
                let operand = self.execute_expr(&node.first, true)?;
                self.context_mut().sub_areas.push(node.first.span);
                let res = self.run_unary(node.id, operand, matters)?;
                self.clear_exec_flags();
                Ok(res)
            }
            _ => {
                let second = self.expect_second(node)?;
                let lhs = self.execute_expr(&node.first, true)?;
                self.gc.hold(lhs);
                let rhs = self.execute_expr(second, true)?;
                self.context_mut().sub_areas.push(node.first.span);
                self.context_mut().sub_areas.push(second.span);
                let res = self.run_binary(node.id, lhs, rhs, matters);
                self.gc.release(lhs);
                let res = res?;
                self.clear_exec_flags();
                Ok(res)
            }
        }
    }

    fn expect_second<'n>(&self, node: &'n OperatorExpr) -> Result<&'n Expr, RuntimeError> {
        node.second
            .as_ref()
            .ok_or_else(|| self.error_here(ErrorKind::InternalError, "Malformed operator node"))
    }

    /// Leftmost value wins; the tail is evaluated for effect only. The
    /// result is held across the tail so a collection can't reclaim it.
    fn exec_comma(&mut self, node: &OperatorExpr, _matters: bool) -> Result<ObjRef, RuntimeError> {
        let first = self.execute_expr(&node.first, true)?;
        self.gc.hold(first);

        let mut cur = node.second.as_ref();
        while let Some(expr) = cur {
            match &expr.kind {
                ExprKind::Operator(op) if op.id == OpId::Comma => {
                    if let Err(e) = self.execute_expr(&op.first, false) {
                        self.gc.release(first);
                        return Err(e);
                    }
                    cur = op.second.as_ref();
                }
                _ => {
                    if let Err(e) = self.execute_expr(expr, false) {
                        self.gc.release(first);
                        return Err(e);
                    }
                    break;
                }
            }
        }

        self.gc.release(first);
        self.clear_exec_flags();
        Ok(first)
    }

    fn exec_dot(&mut self, node: &OperatorExpr) -> Result<ObjRef, RuntimeError> {
        let second = self.expect_second(node)?;
        let selector = second.as_identifier().ok_or_else(|| {
            self.error(ErrorKind::FieldNotFound, "Selector is illegal", second.span)
        })?;

        let target = self.execute_expr(&node.first, true)?;
        if !self.is_instance_object(target, None) {
            return Err(self.error(
                ErrorKind::TypeMismatch,
                format!("{} must be an instance object", self.describe(target)),
                node.first.span,
            ));
        }

        let res = self.select_member(target, selector, second.span)?;
        self.clear_exec_flags();
        Ok(res)
    }

    /// Field first, then type method.
    fn select_member(
        &self,
        target: ObjRef,
        selector: NameId,
        span: Span,
    ) -> Result<ObjRef, RuntimeError> {
        if let Ok(InstanceData::Record(rec)) = self.data(target) {
            if let Some(&field) = rec.fields.get(&selector) {
                return Ok(field);
            }
        }
        let ty = self.get_object(target)?.type_ref;
        if let Some(method) = self.get_type(ty)?.get_method(selector) {
            return Ok(method);
        }
        Err(self.error(
            ErrorKind::FieldNotFound,
            format!(
                "{} has neither field nor method '{}'",
                self.describe(target),
                self.names.resolve(selector)
            ),
            span,
        ))
    }

    fn exec_assign(&mut self, node: &OperatorExpr) -> Result<ObjRef, RuntimeError> {
        let second = self.expect_second(node)?;

        if let Some(lhs_id) = node.first.as_identifier() {
            // auto-declare the name with Nothing on first assignment
            if !self.scopes.query(lhs_id) {
                let fresh = self.make(self.builtin_types.nothing, ObjectKind::InstanceObject)?;
                self.add_variable(lhs_id, fresh);
            }
            let target = self.lookup_variable(lhs_id)?;
            self.gc.hold(target);
            let rhs = match self.execute_expr(second, true) {
                Ok(v) => v,
                Err(e) => {
                    self.gc.release(target);
                    return Err(e);
                }
            };
            let res = if self.is_exec_direct_pass() {
                // by-reference: the name now means the right-hand object,
                // rebound in the frame the binding lives in
                self.spread_multi_use(rhs);
                match self.scopes.frame_of(lhs_id) {
                    Some(frame) => {
                        self.scopes.frame_mut(frame).variables.insert(lhs_id, rhs);
                    }
                    None => self.scopes.add_variable(lhs_id, rhs),
                }
                Ok(rhs)
            } else {
                self.assign_to_copy_of(target, rhs).map(|_| target)
            };
            self.gc.release(target);
            self.clear_exec_flags();
            return res;
        }

        let target = self.execute_expr(&node.first, true)?;
        self.gc.hold(target);
        let rhs = match self.execute_expr(second, true) {
            Ok(v) => v,
            Err(e) => {
                self.gc.release(target);
                return Err(e);
            }
        };
        let res = if self.is_exec_direct_pass() {
            self.assign_to(target, rhs)
        } else {
            self.assign_to_copy_of(target, rhs)
        };
        self.gc.release(target);
        res?;
        self.clear_exec_flags();
        Ok(target)
    }

    fn exec_compound_assign(
        &mut self,
        node: &OperatorExpr,
        base: OpId,
    ) -> Result<ObjRef, RuntimeError> {
        let second = self.expect_second(node)?;

        // auto-declare like plain assignment so `x += 1` on a fresh name
        // fails on the operator, not on lookup
        if let Some(lhs_id) = node.first.as_identifier() {
            if !self.scopes.query(lhs_id) {
                let fresh = self.make(self.builtin_types.nothing, ObjectKind::InstanceObject)?;
                self.add_variable(lhs_id, fresh);
            }
        }

        let target = self.execute_expr(&node.first, true)?;
        self.gc.hold(target);
        let result = (|| {
            let rhs = self.execute_expr(second, true)?;
            self.context_mut().sub_areas.push(node.first.span);
            self.context_mut().sub_areas.push(second.span);
            let value = self.run_binary(base, target, rhs, true)?;
            self.assign_to_copy_of(target, value)
        })();
        self.gc.release(target);
        result?;
        self.clear_exec_flags();
        Ok(target)
    }

    fn exec_call_index(&mut self, node: &OperatorExpr, matters: bool) -> Result<ObjRef, RuntimeError> {
        // `x.m(args)` — look up a field or a bound method on x and pass x
        // as the first argument
        if node.id == OpId::Call {
            if let Some(dot) = node.first.as_dot() {
                return self.exec_method_call(node, dot, matters);
            }
        }

        let callee = self.execute_expr(&node.first, true)?;
        self.gc.hold(callee);
        let args = match self.eval_arg_list(node.second.as_ref()) {
            Ok(v) => v,
            Err(e) => {
                self.gc.release(callee);
                return Err(e);
            }
        };

        self.push_context();
        self.context_mut().area = node.span;
        self.context_mut().sub_areas.push(node.first.span);
        collect_arg_spans(node.second.as_ref(), &mut self.context_mut().sub_areas);
        let res = self.run_nary(node.id, callee, &args, matters);
        self.pop_context();

        for arg in &args {
            self.gc.release(*arg);
        }
        self.gc.release(callee);
        let res = res?;
        self.clear_exec_flags();
        Ok(res)
    }

    fn exec_method_call(
        &mut self,
        node: &OperatorExpr,
        dot: &OperatorExpr,
        matters: bool,
    ) -> Result<ObjRef, RuntimeError> {
        let selector_expr = self.expect_second(dot)?;
        let selector = selector_expr.as_identifier().ok_or_else(|| {
            self.error(
                ErrorKind::FieldNotFound,
                "Selector is illegal",
                selector_expr.span,
            )
        })?;

        let receiver = self.execute_expr(&dot.first, true)?;
        self.gc.hold(receiver);
        let result = (|| {
            if !self.is_instance_object(receiver, None) {
                return Err(self.error(
                    ErrorKind::TypeMismatch,
                    format!("{} must be an instance object", self.describe(receiver)),
                    dot.first.span,
                ));
            }
            let selected = self.select_member(receiver, selector, selector_expr.span)?;

            let mut args = vec![receiver];
            args.extend(self.eval_arg_list(node.second.as_ref())?);

            self.push_context();
            self.context_mut().area = node.span;
            self.context_mut().sub_areas.push(dot.span);
            collect_arg_spans(node.second.as_ref(), &mut self.context_mut().sub_areas);
            let res = self.run_nary(OpId::Call, selected, &args, matters);
            self.pop_context();

            for arg in &args[1..] {
                self.gc.release(*arg);
            }
            res
        })();
        self.gc.release(receiver);
        let res = result?;
        self.clear_exec_flags();
        Ok(res)
    }

    /// Walks a comma chain evaluating each element as an argument: values
    /// marked direct-pass are forwarded as-is, everything else is copied.
    /// Every produced argument is held; the caller releases after dispatch.
    fn eval_arg_list(&mut self, expr: Option<&Expr>) -> Result<Vec<ObjRef>, RuntimeError> {
        let mut out = Vec::new();
        let mut cur = expr;
        while let Some(e) = cur {
            match &e.kind {
                ExprKind::Operator(op) if op.id == OpId::Comma => {
                    self.eval_one_arg(&op.first, &mut out)?;
                    cur = op.second.as_ref();
                }
                _ => {
                    self.eval_one_arg(e, &mut out)?;
                    break;
                }
            }
        }
        Ok(out)
    }

    fn eval_one_arg(&mut self, element: &Expr, out: &mut Vec<ObjRef>) -> Result<(), RuntimeError> {
        let value = self.execute_expr(element, true)?;
        let passed = if self.is_exec_direct_pass() {
            value
        } else {
            self.push_context();
            self.context_mut().area = element.span;
            let copied = self.copy(value);
            self.pop_context();
            copied?
        };
        self.gc.hold(passed);
        out.push(passed);
        Ok(())
    }
}

fn collect_arg_spans(expr: Option<&Expr>, out: &mut Vec<Span>) {
    let mut cur = expr;
    while let Some(e) = cur {
        match &e.kind {
            ExprKind::Operator(op) if op.id == OpId::Comma => {
                out.push(op.first.span);
                cur = op.second.as_ref();
            }
            _ => {
                out.push(e.span);
                break;
            }
        }
    }
}
