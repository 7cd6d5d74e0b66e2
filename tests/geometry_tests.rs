use na_cbor::{ChunkedSource, Error, Object, ValueType, geometry};

// ==================== Item Size ====================

#[test]
fn test_scalar_sizes_follow_selector() {
    assert_eq!(geometry::item_size(&[0x17u8][..], 0).unwrap(), 1);
    assert_eq!(geometry::item_size(&[0x18u8, 0x18][..], 0).unwrap(), 2);
    assert_eq!(geometry::item_size(&[0x19u8, 0x01, 0x00][..], 0).unwrap(), 3);
    assert_eq!(
        geometry::item_size(&[0x1Au8, 0x00, 0x01, 0x00, 0x00][..], 0).unwrap(),
        5
    );
    assert_eq!(
        geometry::item_size(&[0x1Bu8, 0, 0, 0, 1, 0, 0, 0, 0][..], 0).unwrap(),
        9
    );
}

#[test]
fn test_string_size_includes_payload() {
    let data = vec![0x63u8, b'a', b'b', b'c'];
    assert_eq!(geometry::item_size(&data, 0).unwrap(), 4);
}

#[test]
fn test_nested_definite_container_size() {
    // [1, [2, 3], "a"]
    let data = vec![0x83u8, 0x01, 0x82, 0x02, 0x03, 0x61, b'a'];
    assert_eq!(geometry::item_size(&data, 0).unwrap(), 7);
    assert_eq!(geometry::item_size(&data, 2).unwrap(), 3);
    assert_eq!(geometry::skip(&data, 1).unwrap(), 2);
}

#[test]
fn test_indefinite_sequence_size_includes_terminator() {
    // [_ 1, [2, 3]]
    let data = vec![0x9Fu8, 0x01, 0x82, 0x02, 0x03, 0xFF];
    assert_eq!(geometry::item_size(&data, 0).unwrap(), 6);
    assert_eq!(geometry::element_count(&data, 0).unwrap(), 2);
}

#[test]
fn test_indefinite_dictionary_counts_pairs() {
    // {_ "a": 1, "b": 2}
    let data = vec![0xBFu8, 0x61, b'a', 0x01, 0x61, b'b', 0x02, 0xFF];
    assert_eq!(geometry::item_size(&data, 0).unwrap(), 8);
    assert_eq!(geometry::element_count(&data, 0).unwrap(), 2);
}

#[test]
fn test_terminator_inside_payload_is_not_a_break() {
    // [_ h'FF']
    let data = vec![0x9Fu8, 0x41, 0xFF, 0xFF];
    assert_eq!(geometry::item_size(&data, 0).unwrap(), 4);
    assert_eq!(geometry::element_count(&data, 0).unwrap(), 1);
}

#[test]
fn test_indefinite_text_chunks() {
    // (_ "ab", "c")
    let data = vec![0x7Fu8, 0x62, b'a', b'b', 0x61, b'c', 0xFF];
    assert_eq!(geometry::item_size(&data, 0).unwrap(), 7);
}

#[test]
fn test_tag_size_includes_content() {
    // 1(1363896240)
    let data = vec![0xC1u8, 0x1A, 0x51, 0x4B, 0x67, 0xB0];
    assert_eq!(geometry::item_size(&data, 0).unwrap(), 6);
}

#[test]
fn test_definite_dictionary_counts() {
    let data = vec![0xA2u8, 0x01, 0x02, 0x03, 0x04];
    assert_eq!(geometry::item_size(&data, 0).unwrap(), 5);
    assert_eq!(geometry::element_count(&data, 0).unwrap(), 2);
}

#[test]
fn test_size_matches_written_span() {
    let object = Object::Sequence(vec![
        Object::Integer(1_000_000),
        Object::Text("hello".into()),
        Object::Dictionary(vec![(Object::Text("k".into()), Object::Bytes(vec![1, 2, 3]))]),
        Object::Float(1.5),
        Object::Integer(-300),
    ]);
    let data = object.write_to_vec();
    assert_eq!(geometry::item_size(&data, 0).unwrap(), data.len());

    let indefinite = object.write_indefinite_to_vec();
    assert_eq!(geometry::item_size(&indefinite, 0).unwrap(), indefinite.len());
}

#[test]
fn test_geometry_over_chunked_source() {
    let data = vec![0x83u8, 0x01, 0x82, 0x02, 0x03, 0x61, b'a'];
    let chunked = ChunkedSource::new(&data, 2);
    assert_eq!(geometry::item_size(&chunked, 0).unwrap(), 7);
    assert_eq!(geometry::element_count(&chunked, 0).unwrap(), 3);
}

// ==================== Malformed Input ====================

#[test]
fn test_reserved_selector() {
    let data = vec![0x1Cu8];
    assert_eq!(
        geometry::item_size(&data, 0),
        Err(Error::InvalidSelector {
            offset: 0,
            selector: 28
        })
    );
}

#[test]
fn test_indefinite_selector_on_integer() {
    let data = vec![0x1Fu8];
    assert_eq!(
        geometry::item_size(&data, 0),
        Err(Error::InvalidSelector {
            offset: 0,
            selector: 31
        })
    );
}

#[test]
fn test_truncated_argument() {
    let data = vec![0x19u8, 0x01];
    assert_eq!(
        geometry::item_size(&data, 0),
        Err(Error::EndOfFile { offset: 1 })
    );
}

#[test]
fn test_truncated_string_payload() {
    let data = vec![0x63u8, b'a'];
    assert_eq!(
        geometry::item_size(&data, 0),
        Err(Error::EndOfFile { offset: 0 })
    );
}

#[test]
fn test_truncated_container() {
    let data = vec![0x83u8, 0x01];
    assert_eq!(
        geometry::item_size(&data, 0),
        Err(Error::EndOfFile { offset: 2 })
    );
}

#[test]
fn test_missing_terminator() {
    let data = vec![0x9Fu8, 0x01, 0x02];
    assert_eq!(
        geometry::item_size(&data, 0),
        Err(Error::EndOfFile { offset: 3 })
    );
}

#[test]
fn test_break_where_item_expected() {
    let data = vec![0xFFu8];
    assert_eq!(
        geometry::item_size(&data, 0),
        Err(Error::UnexpectedBreak { offset: 0 })
    );
}

#[test]
fn test_chunk_of_wrong_type() {
    // (_ h'61')
    let data = vec![0x7Fu8, 0x41, b'a', 0xFF];
    assert_eq!(
        geometry::item_size(&data, 0),
        Err(Error::InvalidChunk {
            offset: 1,
            expected: ValueType::Text,
            actual: ValueType::Bytes,
        })
    );
}

#[cfg(target_pointer_width = "64")]
#[test]
fn test_length_overflow_is_an_error() {
    let data = vec![0x5Bu8, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
    assert_eq!(
        geometry::item_size(&data, 0),
        Err(Error::SizeOverflow { offset: 0 })
    );
}

#[test]
fn test_element_count_of_scalar() {
    let data = vec![0x01u8];
    assert_eq!(
        geometry::element_count(&data, 0),
        Err(Error::TypeMismatch {
            offset: 0,
            expected: ValueType::Sequence,
            actual: ValueType::Unsigned,
        })
    );
}

#[test]
fn test_element_count_of_odd_indefinite_dictionary() {
    let data = vec![0xBFu8, 0x01, 0xFF];
    assert_eq!(
        geometry::element_count(&data, 0),
        Err(Error::UnexpectedBreak { offset: 2 })
    );
}
