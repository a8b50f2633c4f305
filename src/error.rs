//! Error kinds raised by `decode`/`encode`.
//!
//! The error table is small and closed, and nothing here needs
//! cross-violation precedence, so each kind is its own enum variant with
//! its own context fields rather than a string code.

use std::fmt;

use thiserror::Error;

/// An error from a `decode` or `encode` call.
#[derive(Debug, Error)]
pub enum QsError {
    /// `decode`'s input was not a string, a map, or a sequence of pairs.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An option's `charset` was neither UTF-8 nor Latin-1.
    #[error("invalid charset: {0}")]
    InvalidCharset(String),

    /// `parameter_limit` was not a positive integer.
    #[error("parameter_limit must be > 0, got {0}")]
    InvalidParameterLimit(i64),

    /// A kind-aware key decoder returned something other than a string or
    /// null, or a `*_dot_in_keys` option was set without its paired
    /// `allow_dots` option.
    #[error("key decoder invariant violated: {0}")]
    KeyDecoderInvariant(String),

    /// `throw_on_limit_exceeded` and more than `parameter_limit` pairs were
    /// present in the input.
    #[error("parameter limit {limit} exceeded")]
    ParameterLimitExceeded { limit: usize },

    /// `throw_on_limit_exceeded` and a list grew past `list_limit`.
    #[error("list limit {limit} exceeded (had {actual})")]
    ListLimitExceeded { limit: i64, actual: usize },

    /// `strict_depth` and a key had bracket groups left over after `depth`
    /// groups were consumed.
    #[error("depth {depth} exceeded, remainder {remainder:?}")]
    DepthExceeded { depth: usize, remainder: String },

    /// A container already on the active encoding path was re-entered.
    #[error("cyclic value detected at path {path}")]
    CyclicValue { path: String },

    /// A user-supplied decoder, encoder, filter, or date serializer failed.
    #[error("callback failed: {0}")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl QsError {
    pub fn callback(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        QsError::Callback(Box::new(err))
    }

    pub fn callback_msg(msg: impl fmt::Display) -> Self {
        QsError::Callback(Box::new(CallbackMessage(msg.to_string())))
    }
}

#[derive(Debug)]
struct CallbackMessage(String);

impl fmt::Display for CallbackMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CallbackMessage {}
