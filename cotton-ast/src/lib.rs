use serde::{Deserialize, Serialize};
use std::rc::Rc;

pub mod names;
pub use names::{NameId, NameTable};

/// Byte range into the source buffer. Both ends are byte offsets; `end` is
/// exclusive. Spans survive into the runtime as the error-context anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn join(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(r: std::ops::Range<usize>) -> Self {
        Span { start: r.start, end: r.end }
    }
}

/// Identifier atom with its interned name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub id: NameId,
    pub span: Span,
}

/// Root of a parsed program: a plain statement list executed in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// Statement node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    /// `for init; cond; step; body` — every clause is optional.
    For {
        init: Option<Expr>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    If {
        cond: Expr,
        body: Box<Stmt>,
        else_body: Option<Box<Stmt>>,
    },
    Continue,
    Break,
    Return {
        value: Option<Expr>,
    },
    /// `{ ... }`, or `unscoped { ... }` which executes without pushing a frame.
    Block {
        unscoped: bool,
        list: Vec<Stmt>,
    },
    Expr {
        expr: Expr,
    },
}

/// Expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    FuncDef(Rc<FuncDef>),
    TypeDef(TypeDef),
    Operator(Box<OperatorExpr>),
    Atom(Atom),
    Paren(Box<Expr>),
}

/// Function definition: `function [name](params) body`.
/// Shared behind `Rc` because function instance objects keep the body alive
/// for as long as the function value itself is reachable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDef {
    pub name: Option<Ident>,
    pub params: Vec<Ident>,
    pub body: Rc<Stmt>,
    pub span: Span,
}

/// Record type definition: `type Name { field; ...; method m(self) body ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: Ident,
    pub fields: Vec<Ident>,
    pub methods: Vec<Rc<FuncDef>>,
    pub span: Span,
}

/// Operator application. `second` is absent for unary operators; for CALL and
/// INDEX it holds the argument list as a right-leaning comma chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorExpr {
    pub id: OpId,
    pub first: Expr,
    pub second: Option<Expr>,
    pub span: Span,
}

/// Leaf expression. `id` is the interned raw token text, which the runtime's
/// readonly-literal cache is keyed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub kind: AtomKind,
    pub id: NameId,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AtomKind {
    Boolean(bool),
    Character(char),
    Integer(i64),
    Real(f64),
    String(String),
    Identifier,
    Nothing,
}

/// The operator set of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpId {
    // postfix
    PostInc,
    PostDec,
    // nary
    Call,
    Index,
    // prefix
    PreInc,
    PreDec,
    Positive,
    Negative,
    Not,
    Inverse,
    At,
    // binary
    Dot,
    Mult,
    Div,
    Rem,
    RightShift,
    LeftShift,
    Plus,
    Minus,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Eq,
    NotEq,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
    Assign,
    PlusAssign,
    MinusAssign,
    MultAssign,
    DivAssign,
    RemAssign,
    Comma,
}

impl OpId {
    /// Printable operator spelling for error messages.
    pub fn symbol(&self) -> &'static str {
        match self {
            OpId::PostInc | OpId::PreInc => "++",
            OpId::PostDec | OpId::PreDec => "--",
            OpId::Call => "()",
            OpId::Index => "[]",
            OpId::Positive | OpId::Plus => "+",
            OpId::Negative | OpId::Minus => "-",
            OpId::Not => "!",
            OpId::Inverse => "~",
            OpId::At => "@",
            OpId::Dot => ".",
            OpId::Mult => "*",
            OpId::Div => "/",
            OpId::Rem => "%",
            OpId::RightShift => ">>",
            OpId::LeftShift => "<<",
            OpId::Less => "<",
            OpId::LessEq => "<=",
            OpId::Greater => ">",
            OpId::GreaterEq => ">=",
            OpId::Eq => "==",
            OpId::NotEq => "!=",
            OpId::BitAnd => "&",
            OpId::BitXor => "^",
            OpId::BitOr => "|",
            OpId::And => "and",
            OpId::Or => "or",
            OpId::Assign => "=",
            OpId::PlusAssign => "+=",
            OpId::MinusAssign => "-=",
            OpId::MultAssign => "*=",
            OpId::DivAssign => "/=",
            OpId::RemAssign => "%=",
            OpId::Comma => ",",
        }
    }
}

impl Expr {
    /// The identifier id if this expression is a bare identifier atom.
    pub fn as_identifier(&self) -> Option<NameId> {
        match &self.kind {
            ExprKind::Atom(Atom { kind: AtomKind::Identifier, id, .. }) => Some(*id),
            _ => None,
        }
    }

    /// Peels parentheses and returns the dot operator if this is `a.b`.
    pub fn as_dot(&self) -> Option<&OperatorExpr> {
        match &self.kind {
            ExprKind::Operator(op) if op.id == OpId::Dot => Some(op),
            ExprKind::Paren(inner) => inner.as_dot(),
            _ => None,
        }
    }
}
