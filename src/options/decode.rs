use std::fmt;

use crate::error::QsError;
use crate::options::{Charset, Delimiter, Duplicates};
use crate::value::Value;

/// Which half of a pair a kind-aware decoder is being asked to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeKind {
    Key,
    Value,
}

/// A kind-aware scalar decoder. For `DecodeKind::Key` the returned `Value`
/// must be `Value::Str` or `Value::Null`; callers that violate this get
/// `QsError::KeyDecoderInvariant` back from `decode()`.
pub type Decoder = dyn Fn(&str, Charset, DecodeKind) -> Result<Value, QsError>;

/// Options controlling `decode()`.
pub struct DecodeOptions {
    pub allow_dots: bool,
    pub decode_dot_in_keys: bool,
    pub allow_empty_lists: bool,
    pub allow_sparse_lists: bool,
    pub list_limit: i64,
    pub charset: Charset,
    pub charset_sentinel: bool,
    pub comma: bool,
    pub delimiter: Delimiter,
    pub depth: usize,
    pub parameter_limit: i64,
    pub duplicates: Duplicates,
    pub ignore_query_prefix: bool,
    pub interpret_numeric_entities: bool,
    pub parse_lists: bool,
    pub strict_depth: bool,
    pub strict_null_handling: bool,
    pub throw_on_limit_exceeded: bool,
    pub decoder: Option<Box<Decoder>>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            allow_dots: false,
            decode_dot_in_keys: false,
            allow_empty_lists: false,
            allow_sparse_lists: false,
            list_limit: 20,
            charset: Charset::Utf8,
            charset_sentinel: false,
            comma: false,
            delimiter: Delimiter::default(),
            depth: 5,
            parameter_limit: 1000,
            duplicates: Duplicates::Combine,
            ignore_query_prefix: false,
            interpret_numeric_entities: false,
            parse_lists: true,
            strict_depth: false,
            strict_null_handling: false,
            throw_on_limit_exceeded: false,
            decoder: None,
        }
    }
}

impl fmt::Debug for DecodeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeOptions")
            .field("allow_dots", &self.allow_dots)
            .field("decode_dot_in_keys", &self.decode_dot_in_keys)
            .field("allow_empty_lists", &self.allow_empty_lists)
            .field("allow_sparse_lists", &self.allow_sparse_lists)
            .field("list_limit", &self.list_limit)
            .field("charset", &self.charset)
            .field("charset_sentinel", &self.charset_sentinel)
            .field("comma", &self.comma)
            .field("delimiter", &self.delimiter)
            .field("depth", &self.depth)
            .field("parameter_limit", &self.parameter_limit)
            .field("duplicates", &self.duplicates)
            .field("ignore_query_prefix", &self.ignore_query_prefix)
            .field("interpret_numeric_entities", &self.interpret_numeric_entities)
            .field("parse_lists", &self.parse_lists)
            .field("strict_depth", &self.strict_depth)
            .field("strict_null_handling", &self.strict_null_handling)
            .field("throw_on_limit_exceeded", &self.throw_on_limit_exceeded)
            .field("decoder", &self.decoder.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl DecodeOptions {
    // `allow_dots` is implied true when `decode_dot_in_keys` is set.
    pub(crate) fn effective_allow_dots(&self) -> bool {
        self.allow_dots || self.decode_dot_in_keys
    }

    pub fn with_allow_dots(mut self, v: bool) -> Self {
        self.allow_dots = v;
        self
    }

    pub fn with_decode_dot_in_keys(mut self, v: bool) -> Self {
        self.decode_dot_in_keys = v;
        self
    }

    pub fn with_allow_empty_lists(mut self, v: bool) -> Self {
        self.allow_empty_lists = v;
        self
    }

    pub fn with_allow_sparse_lists(mut self, v: bool) -> Self {
        self.allow_sparse_lists = v;
        self
    }

    pub fn with_list_limit(mut self, v: i64) -> Self {
        self.list_limit = v;
        self
    }

    pub fn with_charset(mut self, v: Charset) -> Self {
        self.charset = v;
        self
    }

    pub fn with_charset_sentinel(mut self, v: bool) -> Self {
        self.charset_sentinel = v;
        self
    }

    pub fn with_comma(mut self, v: bool) -> Self {
        self.comma = v;
        self
    }

    pub fn with_delimiter(mut self, v: impl Into<Delimiter>) -> Self {
        self.delimiter = v.into();
        self
    }

    pub fn with_depth(mut self, v: usize) -> Self {
        self.depth = v;
        self
    }

    pub fn with_parameter_limit(mut self, v: i64) -> Self {
        self.parameter_limit = v;
        self
    }

    pub fn with_duplicates(mut self, v: Duplicates) -> Self {
        self.duplicates = v;
        self
    }

    pub fn with_ignore_query_prefix(mut self, v: bool) -> Self {
        self.ignore_query_prefix = v;
        self
    }

    pub fn with_interpret_numeric_entities(mut self, v: bool) -> Self {
        self.interpret_numeric_entities = v;
        self
    }

    pub fn with_parse_lists(mut self, v: bool) -> Self {
        self.parse_lists = v;
        self
    }

    pub fn with_strict_depth(mut self, v: bool) -> Self {
        self.strict_depth = v;
        self
    }

    pub fn with_strict_null_handling(mut self, v: bool) -> Self {
        self.strict_null_handling = v;
        self
    }

    pub fn with_throw_on_limit_exceeded(mut self, v: bool) -> Self {
        self.throw_on_limit_exceeded = v;
        self
    }

    pub fn with_decoder(mut self, f: impl Fn(&str, Charset, DecodeKind) -> Result<Value, QsError> + 'static) -> Self {
        self.decoder = Some(Box::new(f));
        self
    }

    /// Runs once at the top of `decode()`, rather than at option
    /// construction, since `Result`-returning constructors aren't idiomatic.
    pub(crate) fn validate(&self) -> Result<(), QsError> {
        if self.parameter_limit <= 0 {
            return Err(QsError::InvalidParameterLimit(self.parameter_limit));
        }
        Ok(())
    }
}
