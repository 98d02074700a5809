//! Property-based tests for the serialization laws: round-trip fidelity,
//! embedding safety, and classification stability across generated
//! graphs. Sharing and cycle preservation are covered with constructed
//! graphs in the scenario suites; the generator here produces trees.

use num_bigint::BigInt;
use proptest::prelude::*;
use revalue::{parse, stringify, uneval, Value, ValueMap};

fn leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        Just(Value::Undefined),
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        (-1.0e12..1.0e12_f64).prop_map(Value::from),
        Just(Value::from(f64::NAN)),
        Just(Value::from(f64::INFINITY)),
        Just(Value::from(f64::NEG_INFINITY)),
        Just(Value::from(-0.0)),
        ".*".prop_map(Value::from),
        any::<i64>().prop_map(|i| Value::BigInt(BigInt::from(i))),
        (0i64..4_000_000_000_000i64).prop_map(|ms| Value::date_ms(ms).unwrap()),
        (".*", "[gimsuy]{0,3}").prop_map(|(source, flags)| Value::regex(source, flags)),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    leaf_strategy().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::array),
            prop::collection::vec((".*", inner.clone()), 0..6).prop_map(|entries| {
                let mut map = ValueMap::new();
                for (key, value) in entries {
                    map.insert(key, value);
                }
                Value::object(map)
            }),
            prop::collection::vec((inner.clone(), inner.clone()), 0..4).prop_map(Value::map),
            prop::collection::vec(inner, 0..4).prop_map(Value::set),
        ]
    })
}

proptest! {
    #[test]
    fn data_mode_round_trips(value in value_strategy()) {
        let text = stringify(&value).unwrap();
        let back = parse(&text).unwrap();
        prop_assert_eq!(back, value);
    }

    #[test]
    fn data_mode_output_is_script_safe(value in value_strategy()) {
        let text = stringify(&value).unwrap();
        let line_separator = '\u{2028}';
        let paragraph_separator = '\u{2029}';
        prop_assert!(!text.contains("</script"));
        prop_assert!(!text.contains("<!--"));
        prop_assert!(!text.contains(line_separator));
        prop_assert!(!text.contains(paragraph_separator));
    }

    #[test]
    fn data_mode_output_is_legal_json(value in value_strategy()) {
        let text = stringify(&value).unwrap();
        prop_assert!(serde_json::from_str::<serde_json::Value>(&text).is_ok());
    }

    #[test]
    fn code_mode_output_is_script_safe(value in value_strategy()) {
        let code = uneval(&value).unwrap();
        let line_separator = '\u{2028}';
        let paragraph_separator = '\u{2029}';
        prop_assert!(!code.contains("</script"));
        prop_assert!(!code.contains("<!--"));
        prop_assert!(!code.contains(line_separator));
        prop_assert!(!code.contains(paragraph_separator));
    }

    #[test]
    fn serialization_does_not_disturb_the_graph(value in value_strategy()) {
        let before = stringify(&value).unwrap();
        let _ = uneval(&value).unwrap();
        let after = stringify(&value).unwrap();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn classification_is_preserved_at_the_root(value in value_strategy()) {
        let back = parse(&stringify(&value).unwrap()).unwrap();
        prop_assert_eq!(back.kind(), value.kind());
    }

    #[test]
    fn stringify_is_deterministic(value in value_strategy()) {
        prop_assert_eq!(stringify(&value).unwrap(), stringify(&value).unwrap());
    }
}
