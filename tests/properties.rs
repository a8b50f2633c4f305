//! Property-based tests for the universal invariants the wire format must
//! hold regardless of which concrete input triggers them.

use std::collections::HashSet;

use proptest::prelude::*;

use qs::{decode, encode, Charset, DecodeOptions, Entries, EncodeOptions, Input, Value};

fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,8}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.-]{0,12}"
}

proptest! {
    // ── Round-trip ────────────────────────────────────────────
    #[test]
    fn round_trip_scalar_string_maps(
        pairs in prop::collection::hash_map(key_strategy(), value_strategy(), 0..6)
    ) {
        let mut entries = Entries::new();
        for (k, v) in &pairs {
            entries.insert(k.clone(), Value::Str(v.clone()));
        }
        let original = Value::map_from(entries);

        let wire = encode(&original, &EncodeOptions::default()).unwrap();
        let decoded = decode(Input::from(wire.as_str()), &DecodeOptions::default()).unwrap();
        prop_assert_eq!(decoded, original);
    }

    // ── Order preservation ────────────────────────────────────
    #[test]
    fn decode_preserves_first_occurrence_key_order(
        keys in prop::collection::vec(key_strategy(), 1..6)
    ) {
        let mut seen = HashSet::new();
        let mut ordered_unique = Vec::new();
        for k in &keys {
            if seen.insert(k.clone()) {
                ordered_unique.push(k.clone());
            }
        }

        let query: String = ordered_unique
            .iter()
            .enumerate()
            .map(|(i, k)| format!("{k}={i}"))
            .collect::<Vec<_>>()
            .join("&");

        let decoded = decode(Input::from(query.as_str()), &DecodeOptions::default()).unwrap();
        match decoded {
            Value::Map(m) => {
                let got_order: Vec<String> = m.borrow().entries.keys().cloned().collect();
                prop_assert_eq!(got_order, ordered_unique);
            }
            other => prop_assert!(false, "expected a map, got {other:?}"),
        }
    }

    // ── Merge commutativity of disjoint keys ──────────────────
    #[test]
    fn disjoint_top_level_keys_merge_regardless_of_arrival_order(
        a_key in key_strategy(), a_val in value_strategy(),
        b_key in key_strategy(), b_val in value_strategy(),
    ) {
        prop_assume!(a_key != b_key);
        let forward = format!("{a_key}={a_val}&{b_key}={b_val}");
        let reverse = format!("{b_key}={b_val}&{a_key}={a_val}");

        let got_forward = decode(Input::from(forward.as_str()), &DecodeOptions::default()).unwrap();
        let got_reverse = decode(Input::from(reverse.as_str()), &DecodeOptions::default()).unwrap();
        prop_assert_eq!(got_forward, got_reverse);
    }

    // ── Limit guards ───────────────────────────────────────────
    #[test]
    fn parameter_limit_bounds_output_size_when_not_throwing(
        pairs in prop::collection::vec((key_strategy(), value_strategy()), 0..10),
        limit in 1i64..8,
    ) {
        let query: String = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let opts = DecodeOptions::default().with_parameter_limit(limit);
        let decoded = decode(Input::from(query.as_str()), &opts).unwrap();
        if let Value::Map(m) = decoded {
            prop_assert!(m.borrow().entries.len() as i64 <= limit);
        }
    }

    // ── Cycle safety / never panics ────────────────────────────
    #[test]
    fn decode_never_panics_on_arbitrary_input(s in ".{0,64}") {
        let _ = decode(Input::from(s.as_str()), &DecodeOptions::default());
    }

    // ── Charset fidelity ───────────────────────────────────────
    #[test]
    fn latin1_round_trips_code_points_up_to_0xff(code in 0u32..256) {
        let ch = char::from_u32(code).unwrap();
        let mut entries = Entries::new();
        entries.insert("a".to_string(), Value::Str(ch.to_string()));
        let original = Value::map_from(entries);

        let encode_opts = EncodeOptions::default().with_charset(Charset::Latin1);
        let wire = encode(&original, &encode_opts).unwrap();

        let decode_opts = DecodeOptions::default().with_charset(Charset::Latin1);
        let decoded = decode(Input::from(wire.as_str()), &decode_opts).unwrap();
        prop_assert_eq!(decoded, original);
    }
}
