//! A small polymorphic splitter capability with string and regex variants.

use regex::Regex;

/// Splits a query string into raw pairs. Either a literal separator or a
/// compiled regex, mirroring the two shapes `qs` accepts for `delimiter`.
#[derive(Debug, Clone)]
pub enum Delimiter {
    Plain(String),
    Regex(Regex),
}

impl Delimiter {
    /// Splits `input` into pair fragments, in order.
    pub fn split<'a>(&self, input: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Plain(sep) if sep.is_empty() => vec![input],
            Delimiter::Plain(sep) => input.split(sep.as_str()).collect(),
            Delimiter::Regex(re) => re.split(input).collect(),
        }
    }

    /// The literal separator to join fragments with when encoding. A regex
    /// delimiter has no single canonical join string, so encoding falls
    /// back to `&`, the wire format's conventional separator.
    pub fn join_str(&self) -> &str {
        match self {
            Delimiter::Plain(sep) => sep.as_str(),
            Delimiter::Regex(_) => "&",
        }
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter::Plain("&".to_string())
    }
}

impl From<&str> for Delimiter {
    fn from(s: &str) -> Self {
        Delimiter::Plain(s.to_string())
    }
}

impl From<String> for Delimiter {
    fn from(s: String) -> Self {
        Delimiter::Plain(s)
    }
}

impl From<Regex> for Delimiter {
    fn from(re: Regex) -> Self {
        Delimiter::Regex(re)
    }
}

impl PartialEq for Delimiter {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Delimiter::Plain(a), Delimiter::Plain(b)) => a == b,
            (Delimiter::Regex(a), Delimiter::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}
