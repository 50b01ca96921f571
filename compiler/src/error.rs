use ercs_parser::{ParseError, Span};
use thiserror::Error;

/// Name resolution failures.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("[{span}] undeclared identifier `{name}`")]
    UndeclaredIdentifier { name: String, span: Span },
    #[error("[{span}] `{name}` is already declared in this scope")]
    RedeclaredIdentifier { name: String, span: Span },
    #[error("[{span}] function `{name}` is already defined")]
    RedeclaredFunction { name: String, span: Span },
    #[error("[{span}] call to undeclared function `{name}`")]
    UndeclaredFunction { name: String, span: Span },
    #[error("[{span}] cannot assign to `{name}`: it belongs to an enclosing function")]
    CapturedAssignment { name: String, span: Span },
    #[error("[{span}] index {index} out of bounds for `{name}` (length {len})")]
    IndexOutOfBounds {
        name: String,
        index: String,
        len: usize,
        span: Span,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("[{span}] `{function}` takes {expected} argument(s), got {got}")]
pub struct ArityError {
    pub function: String,
    pub expected: usize,
    pub got: usize,
    pub span: Span,
}

/// Constructs that would need input-dependent control flow, or that exceed
/// the configured unrolling limits.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum UnsupportedFeatureError {
    #[error("[{span}] array index must be a compile-time constant")]
    DynamicIndex { span: Span },
    #[error("[{span}] branch condition must be a compile-time constant")]
    NonStaticBranch { span: Span },
    #[error("[{span}] loop condition must be a compile-time constant")]
    NonStaticLoopBound { span: Span },
    #[error("[{span}] loop exceeds {limit} iterations")]
    UnrollLimitExceeded { limit: usize, span: Span },
    #[error("[{span}] call to `{function}` exceeds call depth {limit}")]
    RecursionLimitExceeded {
        function: String,
        limit: usize,
        span: Span,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GateLoweringError {
    #[error("unknown wire `{name}`")]
    UnknownWireReference { name: String },
    #[error("wire `{name}` is assigned twice")]
    DuplicateWireAssignment { name: String },
    #[error("[{span}] unsupported form: {what}")]
    UnsupportedForm { what: String, span: Span },
    #[error("[{span}] division by constant zero")]
    ConstantDivisionByZero { span: Span },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error(transparent)]
    Arity(#[from] ArityError),
    #[error(transparent)]
    Unsupported(#[from] UnsupportedFeatureError),
    #[error(transparent)]
    Lowering(#[from] GateLoweringError),
}

impl CompileError {
    /// Source line the error points at, when known.
    pub fn line(&self) -> Option<usize> {
        let span = match self {
            CompileError::Parse(e) => return Some(e.line()),
            CompileError::Scope(e) => match e {
                ScopeError::UndeclaredIdentifier { span, .. }
                | ScopeError::RedeclaredIdentifier { span, .. }
                | ScopeError::RedeclaredFunction { span, .. }
                | ScopeError::UndeclaredFunction { span, .. }
                | ScopeError::CapturedAssignment { span, .. }
                | ScopeError::IndexOutOfBounds { span, .. } => span,
            },
            CompileError::Arity(e) => &e.span,
            CompileError::Unsupported(e) => match e {
                UnsupportedFeatureError::DynamicIndex { span }
                | UnsupportedFeatureError::NonStaticBranch { span }
                | UnsupportedFeatureError::NonStaticLoopBound { span }
                | UnsupportedFeatureError::UnrollLimitExceeded { span, .. }
                | UnsupportedFeatureError::RecursionLimitExceeded { span, .. } => span,
            },
            CompileError::Lowering(e) => match e {
                GateLoweringError::UnsupportedForm { span, .. }
                | GateLoweringError::ConstantDivisionByZero { span } => span,
                _ => return None,
            },
        };
        Some(span.line)
    }
}
