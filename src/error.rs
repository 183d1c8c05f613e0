//! Error taxonomy for the marshalling layer
//!
//! Every variant is a local, synchronous signal returned to whichever side
//! (caller or native function) broke the contract. A pending script
//! exception is not an error here: it is reported as
//! [`CallOutcome::Exception`](crate::call::CallOutcome).

use thiserror::Error;

/// Errors raised while building a frame, accessing it, or finishing a call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    #[error("type mismatch for argument {index}: declared {declared}, requested {requested}")]
    TypeMismatch {
        index: usize,
        declared: String,
        requested: String,
    },

    #[error("argument index {index} out of range (argument count {count})")]
    InvalidArgumentIndex { index: usize, count: usize },

    #[error("expected {expected} arguments, got {got}")]
    ArgumentCountMismatch { expected: usize, got: usize },

    #[error("return type mismatch: declared {declared}, attempted {attempted}")]
    ReturnTypeMismatch { declared: String, attempted: String },

    #[error("function '{function}' is not registered as a method")]
    NotAMethod { function: String },

    #[error("method '{function}' called without an object pointer")]
    MissingObject { function: String },

    #[error("free function '{function}' called with an object pointer")]
    UnexpectedObject { function: String },

    #[error("null address passed for {position}")]
    NullAddress { position: String },

    #[error("type '{type_name}' has no valid layout for size {size} and alignment {align}")]
    InvalidLayout {
        type_name: String,
        size: usize,
        align: usize,
    },

    #[error("type '{type_name}' lacks the {behaviour} behaviour")]
    MissingBehaviour {
        type_name: String,
        behaviour: &'static str,
    },

    #[error("handle argument {index} was already claimed")]
    HandleAlreadyClaimed { index: usize },

    #[error("'{function}' returned without constructing its return value")]
    ReturnNotConstructed { function: String },

    #[error("exception already set for this call: {existing}")]
    ExceptionAlreadySet { existing: String },

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{0}' is already registered")]
    DuplicateFunction(String),
}

/// Errors loading marshalling configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}
