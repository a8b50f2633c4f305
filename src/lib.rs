//! # qs — a `qs.js`-compatible query-string codec
//!
//! A bidirectional codec between URL-encoded query strings and a
//! dynamically-shaped value tree: nested maps, sequences, and scalars,
//! built from bracket/dot key notation the way the JavaScript `qs`
//! library parses and serializes it.
//!
//! ```
//! use qs::{decode, encode, DecodeOptions, EncodeOptions, Input};
//!
//! let value = decode(Input::from("a[b][]=1&a[b][]=2"), &DecodeOptions::default()).unwrap();
//! let wire = encode(&value, &EncodeOptions::default()).unwrap();
//! assert_eq!(wire, "a%5Bb%5D%5B0%5D=1&a%5Bb%5D%5B1%5D=2");
//! ```

pub mod codec;
pub mod decode;
pub mod encode;
pub mod error;
pub mod options;
pub mod value;

pub use decode::Input;
pub use error::QsError;
pub use options::{
    Charset, DateSerializer, DecodeKind, DecodeOptions, Decoder, Delimiter, Duplicates, EncodeFilter,
    EncodeOptions, Encoder, Filter, Format, ListFormat, Sorter,
};
pub use value::{Entries, MapData, SeqData, Value};

/// Decodes a query string, a pre-split sequence of key/value pairs, or an
/// already-shaped map, into a `Value` tree.
pub fn decode(input: Input<'_>, opts: &DecodeOptions) -> Result<Value, QsError> {
    decode::decode(input, opts)
}

/// Encodes a `Value` tree into a query string.
pub fn encode(data: &Value, opts: &EncodeOptions) -> Result<String, QsError> {
    encode::encode(data, opts)
}
