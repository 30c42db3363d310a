use cotton_ast::Span;

/// Abstract error kinds of the runtime (the user-facing message carries the
/// detail; the kind is stable for tests and tooling).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidObject,
    TypeMismatch,
    OperatorNotSupported,
    MethodNotFound,
    FieldNotFound,
    NameNotFound,
    ArityMismatch,
    AssignmentToImmutable,
    OutOfBounds,
    DivisionByZero,
    DomainError,
    ImportError,
    ObjectCreationError,
    UserError,
    InternalError,
}

/// A fatal evaluation error. There is no user-level catch: construction
/// snapshots the error-context stack into `trace`, and the error unwinds to
/// the outermost harness through `?`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    /// Primary source span of the failure.
    pub span: Span,
    /// "Error occurred here" spans, oldest context first.
    pub trace: Vec<Span>,
}
