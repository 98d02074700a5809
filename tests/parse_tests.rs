//! Revival: graph reconstruction, hole fidelity, custom revivers, and
//! malformed-input rejection.

use revalue::{parse, parse_with, stringify, unflatten, value, Error, Revivers, Value};

#[test]
fn revives_the_simple_object() {
    let back = parse(r#"[{"message":1},"hello"]"#).unwrap();
    assert_eq!(back, value!({"message": "hello"}));
}

#[test]
fn revived_cycles_are_real_cycles() {
    let back = parse(r#"[{"message":1,"self":0},"hello"]"#).unwrap();
    let entries = back.as_object().unwrap();
    assert!(entries.get("self").unwrap().same_node(&back));
}

#[test]
fn revived_sharing_is_real_sharing() {
    let back = parse(r#"[{"a":1,"b":1},{"n":2},1]"#).unwrap();
    let entries = back.as_object().unwrap();
    assert!(entries.get("a").unwrap().same_node(entries.get("b").unwrap()));
}

#[test]
fn self_referential_array() {
    let back = parse("[[0,0]]").unwrap();
    let items = back.as_array().unwrap();
    assert!(items[0].same_node(&back));
    assert!(items[1].same_node(&back));
}

#[test]
fn map_with_itself_as_key() {
    let back = parse(r#"[["Map",0,1],1]"#).unwrap();
    let entries = back.as_map().unwrap();
    assert!(entries[0].0.same_node(&back));
    assert_eq!(entries[0].1, Value::from(1));
}

#[test]
fn holes_are_distinct_from_undefined() {
    let back = parse("[[-1,-2,1],5]").unwrap();
    let items = back.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert!(items[0].is_hole());
    assert!(items[1].is_undefined());
    assert_eq!(items[2], Value::from(5));
}

#[test]
fn sparse_round_trip_preserves_length_and_holes() {
    let original = value!(["a", hole, hole, "b"]);
    let back = parse(&stringify(&original).unwrap()).unwrap();
    let items = back.as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert!(items[1].is_hole());
    assert!(items[2].is_hole());
    assert_eq!(back, original);
}

#[test]
fn tagged_rows_revive() {
    let date = parse(r#"[["Date","2001-09-09T01:46:40.000Z"]]"#).unwrap();
    assert_eq!(date.as_date().unwrap().timestamp_millis(), 1_000_000_000_000);

    let regex = parse(r#"[["RegExp","ab+c","gi"]]"#).unwrap();
    let regex = regex.as_regex().unwrap().clone();
    assert_eq!((regex.source.as_str(), regex.flags.as_str()), ("ab+c", "gi"));

    let big = parse(r#"[["BigInt","-9007199254740993"]]"#).unwrap();
    assert_eq!(big.as_bigint().unwrap().to_string(), "-9007199254740993");
}

#[test]
fn bare_primitive_roots_are_accepted() {
    assert_eq!(parse("\"hi\"").unwrap(), Value::from("hi"));
    assert_eq!(parse("true").unwrap(), Value::from(true));
    assert_eq!(parse("null").unwrap(), Value::Null);
    assert!(parse("-5").unwrap().as_f64().unwrap().is_nan());
}

#[test]
fn custom_types_need_a_reviver() {
    let err = parse(r#"[["Vector",1],[2,3],30,40]"#).unwrap_err();
    assert!(matches!(err, Error::UnknownType { ref tag } if tag == "Vector"));
}

#[test]
fn custom_types_revive_through_their_reviver() {
    struct Vector {
        x: f64,
        y: f64,
    }
    impl Vector {
        fn magnitude(&self) -> f64 {
            (self.x * self.x + self.y * self.y).sqrt()
        }
    }
    let revivers = Revivers::new().with("Vector", |payload: Value| {
        let items = payload
            .as_array()
            .ok_or_else(|| Error::invalid_input("Vector payload must be an array"))?;
        let x = items[0]
            .as_f64()
            .ok_or_else(|| Error::invalid_input("Vector x must be a number"))?;
        let y = items[1]
            .as_f64()
            .ok_or_else(|| Error::invalid_input("Vector y must be a number"))?;
        Ok(Value::opaque(Vector { x, y }))
    });
    let back = parse_with(r#"[["Vector",1],[2,3],30,40]"#, &revivers).unwrap();
    assert_eq!(back.as_opaque::<Vector>().unwrap().magnitude(), 50.0);
}

#[test]
fn reviver_errors_propagate() {
    let revivers =
        Revivers::new().with("Broken", |_| Err(Error::invalid_input("reviver refused")));
    let err = parse_with(r#"[["Broken",1],0]"#, &revivers).unwrap_err();
    assert!(err.to_string().contains("reviver refused"));
}

#[test]
fn malformed_json_is_invalid_input() {
    assert!(matches!(parse("[{"), Err(Error::InvalidInput { .. })));
}

#[test]
fn malformed_tables_are_invalid_input() {
    for text in [
        "[]",                      // no slots
        "{}",                      // wrong top level
        "0",                       // bare index
        "-9",                      // unknown sentinel
        "[[\"Date\",5]]",          // wrong payload type
        "[[\"Date\",\"yesterday\"]]", // unparseable instant
        "[[\"BigInt\",\"12x\"]]",  // bad digits
        "[[\"Map\",1]]",           // dangling key index
        "[[\"Vector\",1,2]]",      // custom tag with wrong arity
        "[[1.5]]",                 // fractional referrer
        "[[9]]",                   // out of range
        "[{\"k\":-1}]",            // hole outside an array
    ] {
        let result = parse(text);
        assert!(
            matches!(result, Err(Error::InvalidInput { .. })),
            "expected InvalidInput for {text}: {result:?}"
        );
    }
}

#[test]
fn unflatten_reads_embedded_tables() {
    let document: serde_json::Value = serde_json::from_str(
        r#"{"id":7,"state":[{"items":1},[2,2],{"label":3},"shared"]}"#,
    )
    .unwrap();
    let state = unflatten(&document["state"]).unwrap();
    let entries = state.as_object().unwrap();
    let items = entries.get("items").unwrap().as_array().unwrap();
    assert!(items[0].same_node(&items[1]));
    assert_eq!(
        items[0].as_object().unwrap().get("label").unwrap(),
        &Value::from("shared")
    );
}

#[test]
fn round_trip_preserves_kind_everywhere() {
    let original = value!({
        "array": [1, 2],
        "nested": {"set?": "no, object"},
        "text": "plain"
    });
    let back = parse(&stringify(&original).unwrap()).unwrap();
    assert_eq!(back, original);
    // insertion order survives
    let entries = back.as_object().unwrap();
    let keys: Vec<&str> = entries.keys().collect();
    assert_eq!(keys, vec!["array", "nested", "text"]);
}
