use crate::types::JsValue;

/// Fatal engine failures. Unlike thrown values these cannot be caught by
/// script code; they abort the evaluation that raised them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// A heap handle was used after its slot was freed or reused.
    #[error("invalid handle")]
    InvalidHandle,

    /// An internal invariant did not hold. Always an engine or tree bug.
    #[error("internal error: {0}")]
    Internal(&'static str),

    /// The call depth exceeded `EngineOptions::max_call_depth`.
    #[error("execution terminated: stack overflow")]
    StackOverflow,

    /// The tree uses a construct this engine does not evaluate.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Abrupt outcome of an abstract operation: either a catchable throw
/// completion or a fatal engine error.
#[derive(Debug, Clone)]
pub enum JsError {
    Throw(JsValue),
    Engine(EngineError),
}

pub type JsResult<T> = Result<T, JsError>;

impl From<EngineError> for JsError {
    fn from(e: EngineError) -> Self {
        JsError::Engine(e)
    }
}

impl JsError {
    pub fn thrown(&self) -> Option<&JsValue> {
        match self {
            JsError::Throw(v) => Some(v),
            JsError::Engine(_) => None,
        }
    }
}

/// Outcome of [`Interpreter::run`](super::Interpreter::run) when a script does
/// not complete normally.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScriptError {
    #[error("uncaught exception: {message}")]
    Uncaught { value: JsValue, message: String },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ScriptError {
    pub fn thrown(&self) -> Option<&JsValue> {
        match self {
            ScriptError::Uncaught { value, .. } => Some(value),
            ScriptError::Engine(_) => None,
        }
    }
}

/// The native error constructors (§20.5.5).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Error,
    EvalError,
    RangeError,
    ReferenceError,
    SyntaxError,
    TypeError,
    URIError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Error,
        ErrorKind::EvalError,
        ErrorKind::RangeError,
        ErrorKind::ReferenceError,
        ErrorKind::SyntaxError,
        ErrorKind::TypeError,
        ErrorKind::URIError,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::EvalError => "EvalError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::URIError => "URIError",
        }
    }
}

/// Unwraps a `JsResult` inside a statement evaluator, turning a thrown value
/// into a throw completion and propagating engine errors.
macro_rules! js_try {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err($crate::interpreter::JsError::Throw(v)) => {
                return Ok($crate::interpreter::Completion::Throw(v));
            }
            Err($crate::interpreter::JsError::Engine(e)) => return Err(e),
        }
    };
}

pub(crate) use js_try;
