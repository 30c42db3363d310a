use crate::error::RuntimeError;
use crate::heap::{ObjRef, TypeRef};
use crate::runtime::Runtime;
use cotton_ast::{NameId, NameTable, OpId};
use std::collections::HashMap;

pub type UnaryOp = fn(&mut Runtime, ObjRef, bool) -> Result<ObjRef, RuntimeError>;
pub type BinaryOp = fn(&mut Runtime, ObjRef, ObjRef, bool) -> Result<ObjRef, RuntimeError>;
pub type NaryOp = fn(&mut Runtime, ObjRef, &[ObjRef], bool) -> Result<ObjRef, RuntimeError>;
pub type CreateFn = fn(&mut Runtime, TypeRef) -> Result<ObjRef, RuntimeError>;
pub type CopyFn = fn(&mut Runtime, ObjRef) -> Result<ObjRef, RuntimeError>;

/// Which builtin family a type belongs to. User-defined types are `Record`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Function,
    Nothing,
    Boolean,
    Integer,
    Real,
    Character,
    String,
    Array,
    Record,
}

/// The vtable of a type: one optional slot per operator, the constructors,
/// and the method table. Builtin types fill slots with native adapters;
/// record types leave them empty and rely on the magic-method fallback.
pub struct Type {
    pub id: u64,
    pub gc_mark: bool,
    pub kind: TypeKind,
    /// Record type name; `None` for builtins.
    pub name_id: Option<NameId>,
    /// Record instance fields, in declaration order. New instances get each
    /// pre-populated with Nothing.
    pub instance_fields: Vec<NameId>,

    pub postinc_op: Option<UnaryOp>,
    pub postdec_op: Option<UnaryOp>,
    pub preinc_op: Option<UnaryOp>,
    pub predec_op: Option<UnaryOp>,
    pub positive_op: Option<UnaryOp>,
    pub negative_op: Option<UnaryOp>,
    pub not_op: Option<UnaryOp>,
    pub inverse_op: Option<UnaryOp>,

    pub mult_op: Option<BinaryOp>,
    pub div_op: Option<BinaryOp>,
    pub rem_op: Option<BinaryOp>,
    pub rshift_op: Option<BinaryOp>,
    pub lshift_op: Option<BinaryOp>,
    pub add_op: Option<BinaryOp>,
    pub sub_op: Option<BinaryOp>,
    pub lt_op: Option<BinaryOp>,
    pub leq_op: Option<BinaryOp>,
    pub gt_op: Option<BinaryOp>,
    pub geq_op: Option<BinaryOp>,
    pub eq_op: Option<BinaryOp>,
    pub neq_op: Option<BinaryOp>,
    pub bitand_op: Option<BinaryOp>,
    pub bitxor_op: Option<BinaryOp>,
    pub bitor_op: Option<BinaryOp>,
    pub and_op: Option<BinaryOp>,
    pub or_op: Option<BinaryOp>,

    pub call_op: Option<NaryOp>,
    pub index_op: Option<NaryOp>,

    pub create: Option<CreateFn>,
    pub copy: Option<CopyFn>,

    pub methods: HashMap<NameId, ObjRef>,
}

impl Type {
    pub fn new(kind: TypeKind, id: u64, gc_mark: bool) -> Self {
        Self {
            id,
            gc_mark,
            kind,
            name_id: None,
            instance_fields: Vec::new(),
            postinc_op: None,
            postdec_op: None,
            preinc_op: None,
            predec_op: None,
            positive_op: None,
            negative_op: None,
            not_op: None,
            inverse_op: None,
            mult_op: None,
            div_op: None,
            rem_op: None,
            rshift_op: None,
            lshift_op: None,
            add_op: None,
            sub_op: None,
            lt_op: None,
            leq_op: None,
            gt_op: None,
            geq_op: None,
            eq_op: None,
            neq_op: None,
            bitand_op: None,
            bitxor_op: None,
            bitor_op: None,
            and_op: None,
            or_op: None,
            call_op: None,
            index_op: None,
            create: None,
            copy: None,
            methods: HashMap::new(),
        }
    }

    pub fn unary_slot(&self, op: OpId) -> Option<UnaryOp> {
        match op {
            OpId::PostInc => self.postinc_op,
            OpId::PostDec => self.postdec_op,
            OpId::PreInc => self.preinc_op,
            OpId::PreDec => self.predec_op,
            OpId::Positive => self.positive_op,
            OpId::Negative => self.negative_op,
            OpId::Not => self.not_op,
            OpId::Inverse => self.inverse_op,
            _ => None,
        }
    }

    pub fn binary_slot(&self, op: OpId) -> Option<BinaryOp> {
        match op {
            OpId::Mult => self.mult_op,
            OpId::Div => self.div_op,
            OpId::Rem => self.rem_op,
            OpId::RightShift => self.rshift_op,
            OpId::LeftShift => self.lshift_op,
            OpId::Plus => self.add_op,
            OpId::Minus => self.sub_op,
            OpId::Less => self.lt_op,
            OpId::LessEq => self.leq_op,
            OpId::Greater => self.gt_op,
            OpId::GreaterEq => self.geq_op,
            OpId::Eq => self.eq_op,
            OpId::NotEq => self.neq_op,
            OpId::BitAnd => self.bitand_op,
            OpId::BitXor => self.bitxor_op,
            OpId::BitOr => self.bitor_op,
            OpId::And => self.and_op,
            OpId::Or => self.or_op,
            _ => None,
        }
    }

    pub fn nary_slot(&self, op: OpId) -> Option<NaryOp> {
        match op {
            OpId::Call => self.call_op,
            OpId::Index => self.index_op,
            _ => None,
        }
    }

    pub fn add_method(&mut self, id: NameId, method: ObjRef) {
        self.methods.insert(id, method);
    }

    pub fn get_method(&self, id: NameId) -> Option<ObjRef> {
        self.methods.get(&id).copied()
    }

    pub fn has_method(&self, id: NameId) -> bool {
        self.methods.contains_key(&id)
    }
}

/// Pre-interned ids of the conventional double-underscore method names.
/// Operators fall back to these when a vtable slot is absent.
#[derive(Debug, Clone, Copy)]
pub struct MagicMethods {
    pub mm_make: NameId,
    pub mm_copy: NameId,
    pub mm_bool: NameId,
    pub mm_char: NameId,
    pub mm_int: NameId,
    pub mm_real: NameId,
    pub mm_string: NameId,
    pub mm_repr: NameId,
    pub mm_read: NameId,

    pub mm_postinc: NameId,
    pub mm_postdec: NameId,
    pub mm_call: NameId,
    pub mm_index: NameId,
    pub mm_preinc: NameId,
    pub mm_predec: NameId,
    pub mm_positive: NameId,
    pub mm_negative: NameId,
    pub mm_not: NameId,
    pub mm_inverse: NameId,
    pub mm_mult: NameId,
    pub mm_div: NameId,
    pub mm_rem: NameId,
    pub mm_rshift: NameId,
    pub mm_lshift: NameId,
    pub mm_add: NameId,
    pub mm_sub: NameId,
    pub mm_lt: NameId,
    pub mm_leq: NameId,
    pub mm_gt: NameId,
    pub mm_geq: NameId,
    pub mm_eq: NameId,
    pub mm_neq: NameId,
    pub mm_bitand: NameId,
    pub mm_bitxor: NameId,
    pub mm_bitor: NameId,
    pub mm_and: NameId,
    pub mm_or: NameId,
}

impl MagicMethods {
    pub fn intern(names: &mut NameTable) -> Self {
        Self {
            mm_make: names.intern("__make__"),
            mm_copy: names.intern("__copy__"),
            mm_bool: names.intern("__bool__"),
            mm_char: names.intern("__char__"),
            mm_int: names.intern("__int__"),
            mm_real: names.intern("__real__"),
            mm_string: names.intern("__string__"),
            mm_repr: names.intern("__repr__"),
            mm_read: names.intern("__read__"),
            mm_postinc: names.intern("__postinc__"),
            mm_postdec: names.intern("__postdec__"),
            mm_call: names.intern("__call__"),
            mm_index: names.intern("__index__"),
            mm_preinc: names.intern("__preinc__"),
            mm_predec: names.intern("__predec__"),
            mm_positive: names.intern("__positive__"),
            mm_negative: names.intern("__negative__"),
            mm_not: names.intern("__not__"),
            mm_inverse: names.intern("__inverse__"),
            mm_mult: names.intern("__mult__"),
            mm_div: names.intern("__div__"),
            mm_rem: names.intern("__rem__"),
            mm_rshift: names.intern("__rshift__"),
            mm_lshift: names.intern("__lshift__"),
            mm_add: names.intern("__add__"),
            mm_sub: names.intern("__sub__"),
            mm_lt: names.intern("__lt__"),
            mm_leq: names.intern("__leq__"),
            mm_gt: names.intern("__gt__"),
            mm_geq: names.intern("__geq__"),
            mm_eq: names.intern("__eq__"),
            mm_neq: names.intern("__neq__"),
            mm_bitand: names.intern("__bitand__"),
            mm_bitxor: names.intern("__bitxor__"),
            mm_bitor: names.intern("__bitor__"),
            mm_and: names.intern("__and__"),
            mm_or: names.intern("__or__"),
        }
    }

    /// Magic method invoked by `op` when the vtable slot is absent.
    pub fn for_op(&self, op: OpId) -> Option<NameId> {
        Some(match op {
            OpId::PostInc => self.mm_postinc,
            OpId::PostDec => self.mm_postdec,
            OpId::Call => self.mm_call,
            OpId::Index => self.mm_index,
            OpId::PreInc => self.mm_preinc,
            OpId::PreDec => self.mm_predec,
            OpId::Positive => self.mm_positive,
            OpId::Negative => self.mm_negative,
            OpId::Not => self.mm_not,
            OpId::Inverse => self.mm_inverse,
            OpId::Mult => self.mm_mult,
            OpId::Div => self.mm_div,
            OpId::Rem => self.mm_rem,
            OpId::RightShift => self.mm_rshift,
            OpId::LeftShift => self.mm_lshift,
            OpId::Plus => self.mm_add,
            OpId::Minus => self.mm_sub,
            OpId::Less => self.mm_lt,
            OpId::LessEq => self.mm_leq,
            OpId::Greater => self.mm_gt,
            OpId::GreaterEq => self.mm_geq,
            OpId::Eq => self.mm_eq,
            OpId::NotEq => self.mm_neq,
            OpId::BitAnd => self.mm_bitand,
            OpId::BitXor => self.mm_bitxor,
            OpId::BitOr => self.mm_bitor,
            OpId::And => self.mm_and,
            OpId::Or => self.mm_or,
            _ => return None,
        })
    }
}
