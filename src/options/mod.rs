//! Option records that parametrize every phase of decode/encode.
//!
//! Plain fields, a `Default` impl matching the documented defaults, and
//! fluent `with_*` setters that consume and return `Self` so call sites
//! read as `DecodeOptions::default().with_depth(10)`.

mod decode;
mod delimiter;
mod encode;

pub use decode::{DecodeKind, DecodeOptions, Decoder};
pub use delimiter::Delimiter;
pub use encode::{DateSerializer, EncodeFilter, EncodeOptions, Encoder, Filter, ListFormat, Sorter};

use crate::error::QsError;

/// `charset` must resolve to one of these two. Any other value fails
/// option validation with `QsError::InvalidCharset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Utf8,
    Latin1,
}

impl Charset {
    pub fn parse(name: &str) -> Result<Self, QsError> {
        match name {
            "utf-8" | "utf8" | "UTF-8" | "65001" => Ok(Charset::Utf8),
            "iso-8859-1" | "latin1" | "ISO-8859-1" | "28591" => Ok(Charset::Latin1),
            other => Err(QsError::InvalidCharset(other.to_string())),
        }
    }
}

/// Resolution policy for a key that appears more than once in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Duplicates {
    #[default]
    Combine,
    First,
    Last,
}

/// The RFC space-encoding dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Rfc3986,
    Rfc1738,
}
