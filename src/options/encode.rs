use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::QsError;
use crate::options::{Charset, Delimiter, Format};
use crate::value::Value;

/// List-encoding dialects (the legacy `indices: bool` flag maps onto
/// `Indices`/`Repeat`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFormat {
    #[default]
    Indices,
    Brackets,
    Repeat,
    Comma,
}

/// Serializes a `Value::Date` (milliseconds since the Unix epoch, UTC) to
/// the string written into the query. Default mirrors `Date#toISOString`.
pub trait DateSerializer {
    fn serialize(&self, millis: i64) -> Result<String, QsError>;
}

struct Rfc3339DateSerializer;

impl DateSerializer for Rfc3339DateSerializer {
    fn serialize(&self, millis: i64) -> Result<String, QsError> {
        let dt = DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| QsError::callback_msg(format!("out-of-range date {millis}")))?;
        Ok(dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
    }
}

/// A scalar encoder, given the raw value, the target charset and the
/// containing format dialect.
pub type Encoder = dyn Fn(&Value, Charset, Format) -> Result<String, QsError>;

/// A key/value filter. Returning `Value::Undefined` drops the entry.
pub type Filter = dyn Fn(&str, &Value) -> Value;

/// Orders a map's entries before traversal.
pub type Sorter = dyn Fn(&str, &str) -> std::cmp::Ordering;

/// Options controlling `encode()`.
pub struct EncodeOptions {
    pub add_query_prefix: bool,
    pub allow_dots: bool,
    pub allow_empty_lists: bool,
    pub charset: Charset,
    pub charset_sentinel: bool,
    pub delimiter: Delimiter,
    pub encode: bool,
    pub encode_dot_in_keys: bool,
    pub encode_values_only: bool,
    pub filter: Option<EncodeFilter>,
    pub format: Format,
    pub list_format: ListFormat,
    pub skip_nulls: bool,
    pub strict_null_handling: bool,
    pub comma_round_trip: Option<bool>,
    pub comma_compact_nulls: bool,
    pub sort: Option<Box<Sorter>>,
    pub encoder: Option<Box<Encoder>>,
    pub date_serializer: Box<dyn DateSerializer>,
}

/// `filter` is either an explicit key allow-list or a per-entry callback.
pub enum EncodeFilter {
    Keys(Vec<String>),
    Func(Box<Filter>),
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            add_query_prefix: false,
            allow_dots: false,
            allow_empty_lists: false,
            charset: Charset::Utf8,
            charset_sentinel: false,
            delimiter: Delimiter::default(),
            encode: true,
            encode_dot_in_keys: false,
            encode_values_only: false,
            filter: None,
            format: Format::Rfc3986,
            list_format: ListFormat::Indices,
            skip_nulls: false,
            strict_null_handling: false,
            comma_round_trip: None,
            comma_compact_nulls: false,
            sort: None,
            encoder: None,
            date_serializer: Box::new(Rfc3339DateSerializer),
        }
    }
}

impl fmt::Debug for EncodeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodeOptions")
            .field("add_query_prefix", &self.add_query_prefix)
            .field("allow_dots", &self.allow_dots)
            .field("allow_empty_lists", &self.allow_empty_lists)
            .field("charset", &self.charset)
            .field("charset_sentinel", &self.charset_sentinel)
            .field("delimiter", &self.delimiter)
            .field("encode", &self.encode)
            .field("encode_dot_in_keys", &self.encode_dot_in_keys)
            .field("encode_values_only", &self.encode_values_only)
            .field("filter", &self.filter.as_ref().map(|_| "<filter>"))
            .field("format", &self.format)
            .field("list_format", &self.list_format)
            .field("skip_nulls", &self.skip_nulls)
            .field("strict_null_handling", &self.strict_null_handling)
            .field("comma_round_trip", &self.comma_round_trip)
            .field("comma_compact_nulls", &self.comma_compact_nulls)
            .field("sort", &self.sort.as_ref().map(|_| "<fn>"))
            .field("encoder", &self.encoder.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl EncodeOptions {
    /// Whether trailing `[]` are round-tripped for single-element comma
    /// lists. Defaults to `true` when `list_format` is `Comma` and the
    /// caller hasn't pinned it explicitly.
    pub(crate) fn effective_comma_round_trip(&self) -> bool {
        self.comma_round_trip
            .unwrap_or(self.list_format == ListFormat::Comma)
    }

    // `allow_dots` is implied true when `encode_dot_in_keys` is set.
    pub(crate) fn effective_allow_dots(&self) -> bool {
        self.allow_dots || self.encode_dot_in_keys
    }

    pub fn with_add_query_prefix(mut self, v: bool) -> Self {
        self.add_query_prefix = v;
        self
    }

    pub fn with_allow_dots(mut self, v: bool) -> Self {
        self.allow_dots = v;
        self
    }

    pub fn with_allow_empty_lists(mut self, v: bool) -> Self {
        self.allow_empty_lists = v;
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

    pub fn with_delimiter(mut self, v: impl Into<Delimiter>) -> Self {
        self.delimiter = v.into();
        self
    }

    pub fn with_encode(mut self, v: bool) -> Self {
        self.encode = v;
        self
    }

    pub fn with_encode_dot_in_keys(mut self, v: bool) -> Self {
        self.encode_dot_in_keys = v;
        self
    }

    pub fn with_encode_values_only(mut self, v: bool) -> Self {
        self.encode_values_only = v;
        self
    }

    pub fn with_filter_keys(mut self, keys: Vec<String>) -> Self {
        self.filter = Some(EncodeFilter::Keys(keys));
        self
    }

    pub fn with_filter_fn(mut self, f: impl Fn(&str, &Value) -> Value + 'static) -> Self {
        self.filter = Some(EncodeFilter::Func(Box::new(f)));
        self
    }

    pub fn with_format(mut self, v: Format) -> Self {
        self.format = v;
        self
    }

    pub fn with_list_format(mut self, v: ListFormat) -> Self {
        self.list_format = v;
        self
    }

    pub fn with_skip_nulls(mut self, v: bool) -> Self {
        self.skip_nulls = v;
        self
    }

    pub fn with_strict_null_handling(mut self, v: bool) -> Self {
        self.strict_null_handling = v;
        self
    }

    pub fn with_comma_round_trip(mut self, v: bool) -> Self {
        self.comma_round_trip = Some(v);
        self
    }

    pub fn with_comma_compact_nulls(mut self, v: bool) -> Self {
        self.comma_compact_nulls = v;
        self
    }

    pub fn with_sort(mut self, f: impl Fn(&str, &str) -> std::cmp::Ordering + 'static) -> Self {
        self.sort = Some(Box::new(f));
        self
    }

    pub fn with_encoder(mut self, f: impl Fn(&Value, Charset, Format) -> Result<String, QsError> + 'static) -> Self {
        self.encoder = Some(Box::new(f));
        self
    }

    pub fn with_date_serializer(mut self, s: impl DateSerializer + 'static) -> Self {
        self.date_serializer = Box::new(s);
        self
    }

    /// Validates options once, up front, rather than scattering checks
    /// through traversal.
    pub(crate) fn validate(&self) -> Result<(), QsError> {
        Ok(())
    }
}
