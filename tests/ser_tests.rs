#![cfg(feature = "serde")]

use na_cbor::{MAX_NESTING, Object, QueryBuilder, Reader, read};

fn json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap()
}

// ==================== Objects ====================

#[test]
fn test_object_to_json() {
    let object = Object::Dictionary(vec![
        ("name".into(), "cbor".into()),
        ("n".into(), Object::Integer(-3)),
        ("ok".into(), true.into()),
        ("none".into(), Object::Null),
        ("list".into(), Object::Sequence(vec![1i64.into(), 1.5f64.into()])),
    ]);
    assert_eq!(
        json(&object),
        r#"{"name":"cbor","n":-3,"ok":true,"none":null,"list":[1,1.5]}"#
    );
}

#[test]
fn test_tagged_object_serializes_content() {
    let object = Object::Tagged(100, Box::new(Object::Text("x".into())));
    assert_eq!(json(&object), r#""x""#);
    assert_eq!(json(&Object::Bytes(vec![1, 2])), "[1,2]");
    assert_eq!(json(&Object::Undefined), "null");
}

// ==================== Lazy Values ====================

#[test]
fn test_value_to_json_matches_object() {
    let object = Object::Dictionary(vec![
        ("a".into(), Object::Sequence(vec![1i64.into(), (-1i64).into()])),
        ("b".into(), Object::Dictionary(vec![("c".into(), Object::Null)])),
        ("d".into(), Object::Float(0.25)),
    ]);
    for data in [object.write_to_vec(), object.write_indefinite_to_vec()] {
        let value = Reader::new(&data).value_at(0).unwrap();
        assert_eq!(json(&value), json(&object));
    }
}

#[test]
fn test_big_integer_value_serializes_as_number() {
    // 2(h'010000000000000000') = 2^64
    let data = vec![0xC2u8, 0x49, 0x01, 0, 0, 0, 0, 0, 0, 0, 0];
    let value = Reader::new(&data).value_at(0).unwrap();
    assert_eq!(json(&value), "18446744073709551616");
}

#[test]
fn test_malformed_value_fails_to_serialize() {
    let data = vec![0x82u8, 0x01];
    let value = Reader::new(&data).value_at(0).unwrap();
    assert!(serde_json::to_string(&value).is_err());
}

#[test]
fn test_nesting_limit_applies_to_serialization() {
    let mut data = vec![0x81u8; MAX_NESTING];
    data.push(0x01);
    let value = Reader::new(&data).value_at(0).unwrap();
    let expected = format!("{}1{}", "[".repeat(MAX_NESTING), "]".repeat(MAX_NESTING));
    assert_eq!(json(&value), expected);

    let mut data = vec![0x81u8; MAX_NESTING + 1];
    data.push(0x01);
    let value = Reader::new(&data).value_at(0).unwrap();
    let error = serde_json::to_string(&value).unwrap_err();
    assert!(error.to_string().contains("nesting deeper than"));
}

// ==================== Selections ====================

#[test]
fn test_selection_to_json() {
    // {"a": 1}
    let data = vec![0xA1u8, 0x61, b'a', 0x01];
    let query = QueryBuilder::new()
        .as_dictionary(|d| {
            d.entry("x", |p| p.dictionary("a"))
                .entry("y", |p| p.dictionary("b"))
        })
        .build();
    let lazy = read(&data, &query).unwrap();
    assert_eq!(json(&lazy), r#"{"x":1,"y":null}"#);

    let missing = read(&data, &QueryBuilder::new().dictionary("b").build()).unwrap();
    assert_eq!(json(&missing), "null");
}
