//! Unit tests for the public API surface: option validation, builder
//! defaults, and the smaller decode/encode behaviors that the conformance
//! suite doesn't already pin down.

use qs::{
    decode, encode, Charset, DecodeOptions, Delimiter, Entries, EncodeOptions, Input, ListFormat, QsError, Value,
};

fn s(text: &str) -> Value {
    Value::str(text)
}

fn map(pairs: Vec<(&str, Value)>) -> Value {
    let mut entries = Entries::new();
    for (k, v) in pairs {
        entries.insert(k.to_string(), v);
    }
    Value::map_from(entries)
}

// ── option validation ────────────────────────────────────────

#[test]
fn zero_parameter_limit_is_rejected() {
    let opts = DecodeOptions::default().with_parameter_limit(0);
    let err = decode(Input::from("a=1"), &opts).unwrap_err();
    assert!(matches!(err, QsError::InvalidParameterLimit(0)));
}

#[test]
fn encode_dot_in_keys_without_allow_dots_implies_dot_notation() {
    let opts = EncodeOptions::default().with_encode_dot_in_keys(true);
    let inner = map(vec![("b.c", s("d"))]);
    let got = encode(&map(vec![("a", inner)]), &opts).unwrap();
    assert_eq!(got, "a.b%252Ec=d");
}

#[test]
fn charset_parse_accepts_known_aliases() {
    assert_eq!(Charset::parse("utf-8").unwrap(), Charset::Utf8);
    assert_eq!(Charset::parse("iso-8859-1").unwrap(), Charset::Latin1);
    assert!(Charset::parse("shift-jis").is_err());
}

// ── empty and trivial input ──────────────────────────────────

#[test]
fn empty_query_string_decodes_to_an_empty_map() {
    let got = decode(Input::from(""), &DecodeOptions::default()).unwrap();
    assert_eq!(got, Value::map());
}

#[test]
fn empty_map_encodes_to_an_empty_string() {
    let got = encode(&Value::map(), &EncodeOptions::default()).unwrap();
    assert_eq!(got, "");
}

// ── parameter limit enforcement ──────────────────────────────

#[test]
fn parameter_limit_truncates_silently_by_default() {
    let opts = DecodeOptions::default().with_parameter_limit(1);
    let got = decode(Input::from("a=1&b=2"), &opts).unwrap();
    assert_eq!(got, map(vec![("a", s("1"))]));
}

#[test]
fn parameter_limit_raises_when_throw_on_limit_exceeded() {
    let opts = DecodeOptions::default().with_parameter_limit(1).with_throw_on_limit_exceeded(true);
    let err = decode(Input::from("a=1&b=2"), &opts).unwrap_err();
    assert!(matches!(err, QsError::ParameterLimitExceeded { limit: 1 }));
}

// ── custom delimiter ──────────────────────────────────────────

#[test]
fn custom_string_delimiter_splits_pairs() {
    let opts = DecodeOptions::default().with_delimiter(Delimiter::from(";"));
    let got = decode(Input::from("a=1;b=2"), &opts).unwrap();
    assert_eq!(got, map(vec![("a", s("1")), ("b", s("2"))]));
}

// ── strict null handling round trip ──────────────────────────

#[test]
fn strict_null_handling_round_trips_a_bare_key() {
    let decode_opts = DecodeOptions::default().with_strict_null_handling(true);
    let got = decode(Input::from("a&b="), &decode_opts).unwrap();
    assert_eq!(got, map(vec![("a", Value::Null), ("b", s(""))]));

    let encode_opts = EncodeOptions::default().with_strict_null_handling(true);
    let wire = encode(&got, &encode_opts).unwrap();
    assert_eq!(wire, "a&b=");
}

// ── list format dialects ──────────────────────────────────────

#[test]
fn brackets_list_format_omits_the_index() {
    let opts = EncodeOptions::default().with_list_format(ListFormat::Brackets);
    let got = encode(&map(vec![("a", Value::seq_from(vec![s("x"), s("y")]))]), &opts).unwrap();
    assert_eq!(got, "a%5B%5D=x&a%5B%5D=y");
}

#[test]
fn repeat_list_format_repeats_the_bare_key() {
    let opts = EncodeOptions::default().with_list_format(ListFormat::Repeat);
    let got = encode(&map(vec![("a", Value::seq_from(vec![s("x"), s("y")]))]), &opts).unwrap();
    assert_eq!(got, "a=x&a=y");
}

// ── add_query_prefix / charset_sentinel ──────────────────────

#[test]
fn add_query_prefix_prepends_a_question_mark() {
    let opts = EncodeOptions::default().with_add_query_prefix(true);
    let got = encode(&map(vec![("a", s("b"))]), &opts).unwrap();
    assert_eq!(got, "?a=b");
}

#[test]
fn charset_sentinel_is_prepended_for_utf8() {
    let opts = EncodeOptions::default().with_charset_sentinel(true);
    let got = encode(&map(vec![("a", s("b"))]), &opts).unwrap();
    assert_eq!(got, "utf8=%E2%9C%93&a=b");
}

// ── filter ─────────────────────────────────────────────────────

#[test]
fn key_filter_restricts_and_orders_top_level_keys() {
    let opts = EncodeOptions::default().with_filter_keys(vec!["b".to_string(), "a".to_string()]);
    let got = encode(&map(vec![("a", s("1")), ("b", s("2")), ("c", s("3"))]), &opts).unwrap();
    assert_eq!(got, "b=2&a=1");
}

#[test]
fn function_filter_can_drop_a_value() {
    let opts = EncodeOptions::default().with_filter_fn(|key, value| {
        if key == "a" {
            Value::Undefined
        } else {
            value.clone()
        }
    });
    let got = encode(&map(vec![("a", s("1")), ("b", s("2"))]), &opts).unwrap();
    assert_eq!(got, "b=2");
}

// ── map input ────────────────────────────────────────────────────

#[test]
fn map_input_re_splits_bracket_keys_but_leaves_values_untouched() {
    let mut entries = Entries::new();
    entries.insert("a[b]".to_string(), s("c"));
    let got = decode(Input::from(&entries), &DecodeOptions::default()).unwrap();
    assert_eq!(got, map(vec![("a", map(vec![("b", s("c"))]))]));
}

#[test]
fn map_input_honors_parameter_limit() {
    let mut entries = Entries::new();
    entries.insert("a".to_string(), s("1"));
    entries.insert("b".to_string(), s("2"));
    let opts = DecodeOptions::default().with_parameter_limit(1);
    let got = decode(Input::from(&entries), &opts).unwrap();
    assert_eq!(got, map(vec![("a", s("1"))]));
}

// ── custom encoder ──────────────────────────────────────────────

#[test]
fn custom_encoder_runs_on_keys_as_well_as_values() {
    let opts = EncodeOptions::default().with_encoder(|value, _charset, _format| {
        Ok(match value {
            Value::Str(s) => s.to_uppercase(),
            other => other.to_string(),
        })
    });
    let got = encode(&map(vec![("a", s("b"))]), &opts).unwrap();
    assert_eq!(got, "A=B");
}

#[test]
fn custom_encoder_is_skipped_for_keys_under_encode_values_only() {
    let opts = EncodeOptions::default()
        .with_encode_values_only(true)
        .with_encoder(|value, _charset, _format| {
            Ok(match value {
                Value::Str(s) => s.to_uppercase(),
                other => other.to_string(),
            })
        });
    let got = encode(&map(vec![("a", s("b"))]), &opts).unwrap();
    assert_eq!(got, "a=B");
}
