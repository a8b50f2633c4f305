//! Conformance tests against the concrete decode/encode scenarios that
//! pin down the wire format's ambiguity-resolution rules.

use qs::{
    decode, encode, Charset, DecodeOptions, Duplicates, Entries, EncodeOptions, Input, ListFormat, MapData,
    QsError, Value,
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

fn seq(items: Vec<Value>) -> Value {
    Value::seq_from(items)
}

/// Wraps `leaf` in one single-key map per path segment, outermost first.
fn nest(path: &[&str], leaf: Value) -> Value {
    let mut v = leaf;
    for key in path.iter().rev() {
        v = map(vec![(key, v)]);
    }
    v
}

// ── Scenario 1 ───────────────────────────────────────────────

#[test]
fn nested_brackets_build_nested_maps() {
    let got = decode(Input::from("foo[bar][baz]=qux"), &DecodeOptions::default()).unwrap();
    let want = nest(&["foo", "bar", "baz"], s("qux"));
    assert_eq!(got, want);
}

// ── Scenario 2 ───────────────────────────────────────────────

#[test]
fn depth_overflow_keeps_remainder_as_one_literal_key() {
    let got = decode(Input::from("a[b][c][d][e][f][g][h][i]=j"), &DecodeOptions::default()).unwrap();
    let want = nest(&["a", "b", "c", "d", "e", "f", "[g][h][i]"], s("j"));
    assert_eq!(got, want);
}

#[test]
fn strict_depth_raises_depth_exceeded() {
    let opts = DecodeOptions::default().with_strict_depth(true);
    let err = decode(Input::from("a[b][c][d][e][f][g]=j"), &opts).unwrap_err();
    assert!(matches!(err, QsError::DepthExceeded { depth: 5, .. }));
}

// ── Scenario 3 ───────────────────────────────────────────────

#[test]
fn sparse_indices_within_list_limit_merge_into_a_dense_list() {
    let got = decode(Input::from("a[1]=b&a[15]=c"), &DecodeOptions::default()).unwrap();
    let want = map(vec![("a", seq(vec![s("b"), s("c")]))]);
    assert_eq!(got, want);
}

#[test]
fn index_past_list_limit_promotes_to_an_overflow_map() {
    let got = decode(Input::from("a[100]=b"), &DecodeOptions::default()).unwrap();
    let want = map(vec![("a", map(vec![("100", s("b"))]))]);
    assert_eq!(got, want);
}

// ── Scenario 4 ───────────────────────────────────────────────

#[test]
fn charset_sentinel_reselects_latin1_mid_decode() {
    let opts = DecodeOptions::default().with_charset(Charset::Utf8).with_charset_sentinel(true);
    let got = decode(Input::from("utf8=%26%2310003%3B&a=%F8"), &opts).unwrap();
    let want = map(vec![("a", s("\u{f8}"))]);
    assert_eq!(got, want);
}

// ── Scenario 5 ───────────────────────────────────────────────

#[test]
fn duplicate_keys_combine_by_default() {
    let got = decode(Input::from("foo=bar&foo=baz"), &DecodeOptions::default()).unwrap();
    let want = map(vec![("foo", seq(vec![s("bar"), s("baz")]))]);
    assert_eq!(got, want);
}

#[test]
fn duplicate_keys_first_keeps_the_first_occurrence() {
    let opts = DecodeOptions::default().with_duplicates(Duplicates::First);
    let got = decode(Input::from("foo=bar&foo=baz"), &opts).unwrap();
    assert_eq!(got, map(vec![("foo", s("bar"))]));
}

#[test]
fn duplicate_keys_last_keeps_the_last_occurrence() {
    let opts = DecodeOptions::default().with_duplicates(Duplicates::Last);
    let got = decode(Input::from("foo=bar&foo=baz"), &opts).unwrap();
    assert_eq!(got, map(vec![("foo", s("baz"))]));
}

// ── Scenario 6 ───────────────────────────────────────────────

#[test]
fn comma_list_format_joins_multi_element_lists_without_round_trip_brackets() {
    let opts = EncodeOptions::default().with_list_format(ListFormat::Comma).with_encode(false);
    let got = encode(&map(vec![("a", seq(vec![s("b"), s("c")]))]), &opts).unwrap();
    assert_eq!(got, "a=b,c");
}

#[test]
fn comma_round_trip_wraps_a_single_element_list_in_brackets() {
    let opts = EncodeOptions::default()
        .with_list_format(ListFormat::Comma)
        .with_comma_round_trip(true)
        .with_encode(false);
    let got = encode(&map(vec![("a", seq(vec![s("b")]))]), &opts).unwrap();
    assert_eq!(got, "a[]=b");
}

// ── Scenario 7 ───────────────────────────────────────────────

#[test]
fn allow_dots_renders_nested_maps_with_a_literal_dot() {
    let opts = EncodeOptions::default().with_allow_dots(true).with_encode(false);
    let got = encode(&map(vec![("a", map(vec![("b", s("c"))]))]), &opts).unwrap();
    assert_eq!(got, "a.b=c");
}

#[test]
fn encode_dot_in_keys_double_encodes_a_literal_dot_in_a_key_name() {
    let opts = EncodeOptions::default().with_allow_dots(true).with_encode_dot_in_keys(true);
    let got = encode(
        &map(vec![("name.obj", map(vec![("first", s("John")), ("last", s("Doe"))]))]),
        &opts,
    )
    .unwrap();
    assert_eq!(got, "name%252Eobj.first=John&name%252Eobj.last=Doe");
}

// ── Scenario 8 ───────────────────────────────────────────────

#[test]
fn self_referential_map_raises_cyclic_value() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let map_rc = Rc::new(RefCell::new(MapData::from_entries(Entries::new())));
    map_rc.borrow_mut().entries.insert("self".to_string(), Value::Map(Rc::clone(&map_rc)));
    let value = Value::Map(map_rc);

    let err = encode(&value, &EncodeOptions::default()).unwrap_err();
    assert!(matches!(err, QsError::CyclicValue { .. }));
}

// ── Scenario 9 ───────────────────────────────────────────────

#[test]
fn empty_key_and_forced_and_positional_lists_merge_together() {
    let got = decode(Input::from("=&a[]=b&a[1]=c"), &DecodeOptions::default()).unwrap();
    let want = map(vec![("", s("")), ("a", seq(vec![s("b"), s("c")]))]);
    assert_eq!(got, want);
}
