//! Code-mode emission: inline literal forms, hoisted cyclic/shared
//! forms, constructor forms, replacers, and embedding safety.

use num_bigint::BigInt;
use revalue::{uneval, uneval_with, value, Value, ValueMap};

#[test]
fn inline_literal_forms() {
    assert_eq!(uneval(&value!({})).unwrap(), "{}");
    assert_eq!(uneval(&value!({"a": 1})).unwrap(), "{a:1}");
    assert_eq!(uneval(&value!([])).unwrap(), "[]");
    assert_eq!(uneval(&value!([1, "two", true])).unwrap(), r#"[1,"two",true]"#);
    assert_eq!(
        uneval(&value!({"nested": {"deep": [null]}})).unwrap(),
        "{nested:{deep:[null]}}"
    );
}

#[test]
fn primitive_forms() {
    assert_eq!(uneval(&Value::Undefined).unwrap(), "void 0");
    assert_eq!(uneval(&Value::from(f64::NAN)).unwrap(), "NaN");
    assert_eq!(uneval(&Value::from(f64::INFINITY)).unwrap(), "Infinity");
    assert_eq!(uneval(&Value::from(f64::NEG_INFINITY)).unwrap(), "-Infinity");
    assert_eq!(uneval(&Value::from(-0.0)).unwrap(), "-0");
    assert_eq!(uneval(&Value::from("hi")).unwrap(), "\"hi\"");
    assert_eq!(
        uneval(&Value::BigInt("9007199254740993".parse::<BigInt>().unwrap())).unwrap(),
        "9007199254740993n"
    );
}

#[test]
fn constructor_forms() {
    assert_eq!(
        uneval(&Value::date_ms(1_000_000_000_000).unwrap()).unwrap(),
        "new Date(1000000000000)"
    );
    assert_eq!(
        uneval(&Value::regex("ab+c", "gi")).unwrap(),
        r#"new RegExp("ab+c","gi")"#
    );
    assert_eq!(
        uneval(&Value::regex("ab+c", "")).unwrap(),
        r#"new RegExp("ab+c")"#
    );
    assert_eq!(
        uneval(&Value::map(vec![(Value::from("k"), Value::from("v"))])).unwrap(),
        r#"new Map([["k","v"]])"#
    );
    assert_eq!(uneval(&Value::map(vec![])).unwrap(), "new Map");
    assert_eq!(
        uneval(&Value::set(vec![Value::from(1), Value::from(2)])).unwrap(),
        "new Set([1,2])"
    );
    assert_eq!(uneval(&Value::set(vec![])).unwrap(), "new Set");
}

#[test]
fn key_quoting() {
    assert_eq!(
        uneval(&value!({"weird key": 1})).unwrap(),
        r#"{"weird key":1}"#
    );
    assert_eq!(uneval(&value!({"class": 1})).unwrap(), r#"{"class":1}"#);
    assert_eq!(uneval(&value!({"$ok_1": 1})).unwrap(), "{$ok_1:1}");
}

#[test]
fn cyclic_object_hoists() {
    let obj = Value::object(ValueMap::new());
    obj.insert_entry("message", Value::from("hello"));
    obj.insert_entry("self", obj.clone());
    assert_eq!(
        uneval(&obj).unwrap(),
        r#"(function(a){a.message="hello";a.self=a;return a}({}))"#
    );
}

#[test]
fn shared_node_hoists_once() {
    let shared = Value::array(vec![Value::from(1)]);
    let root = Value::object(ValueMap::new());
    root.insert_entry("x", shared.clone());
    root.insert_entry("y", shared);
    assert_eq!(
        uneval(&root).unwrap(),
        "(function(a){a[0]=1;return {x:a,y:a}}(Array(1)))"
    );
}

#[test]
fn sparse_arrays_hoist_with_indexed_assignments() {
    assert_eq!(
        uneval(&value!([1, hole, 3])).unwrap(),
        "(function(a){a[0]=1;a[2]=3;return a}(Array(3)))"
    );
}

#[test]
fn cyclic_collections_hoist_as_shells() {
    let set = Value::set(vec![]);
    if let Value::Set(members) = &set {
        members.borrow_mut().push(set.clone());
    }
    assert_eq!(
        uneval(&set).unwrap(),
        "(function(a){a.add(a);return a}(new Set))"
    );

    let map = Value::map(vec![]);
    if let Value::Map(pairs) = &map {
        pairs.borrow_mut().push((Value::from("me"), map.clone()));
    }
    assert_eq!(
        uneval(&map).unwrap(),
        r#"(function(a){a.set("me",a);return a}(new Map))"#
    );
}

#[test]
fn two_hoisted_nodes_get_distinct_names() {
    let left = Value::array(vec![Value::from(1)]);
    let right = Value::array(vec![Value::from(2)]);
    let root = Value::array(vec![left.clone(), left, right.clone(), right]);
    assert_eq!(
        uneval(&root).unwrap(),
        "(function(a,b){a[0]=1;b[0]=2;return [a,a,b,b]}(Array(1),Array(1)))"
    );
}

#[test]
fn replacer_claims_opaque_values() {
    struct Vector {
        x: f64,
        y: f64,
    }
    let graph = value!({"velocity": (Value::opaque(Vector { x: 3.0, y: 4.0 }))});
    let code = uneval_with(&graph, &|value, _devalue| {
        Ok(value
            .as_opaque::<Vector>()
            .map(|vec| format!("new Vector({},{})", vec.x, vec.y)))
    })
    .unwrap();
    assert_eq!(code, "{velocity:new Vector(3,4)}");
}

#[test]
fn replacer_devaluer_serializes_nested_payloads() {
    struct Wrapper(Value);
    let graph = Value::opaque(Wrapper(value!([1, "two"])));
    let code = uneval_with(&graph, &|value, devalue| {
        match value.as_opaque::<Wrapper>() {
            Some(wrapper) => Ok(Some(format!("wrap({})", devalue(&wrapper.0)?))),
            None => Ok(None),
        }
    })
    .unwrap();
    assert_eq!(code, r#"wrap([1,"two"])"#);
}

#[test]
fn unclaimed_opaque_fails_with_path() {
    struct Widget;
    let graph = value!({"panel": [(Value::opaque(Widget))]});
    let err = uneval(&graph).unwrap_err();
    assert_eq!(err.path(), Some(".panel[0]"));
}

#[test]
fn output_is_script_safe() {
    let hostile = value!({
        "attack": "</script><script>alert(1)</script>",
        "separators": "a\u{2028}b\u{2029}c"
    });
    let code = uneval(&hostile).unwrap();
    assert!(!code.contains("</script"));
    assert!(!code.contains("<!--"));
    assert!(!code.contains('\u{2028}'));
    assert!(!code.contains('\u{2029}'));
}

#[test]
fn regex_source_cannot_break_out() {
    let code = uneval(&Value::regex("</script>", "g")).unwrap();
    assert!(!code.contains("</script"));
}
