use na_cbor::{
    Error, MajorType, Object, Reader, SemanticType, StandardTags, TagRegistry, TagResolver, Value,
    ValueType,
};

fn semantic(data: &[u8]) -> SemanticType {
    Reader::new(&data).value_at(0).unwrap().semantic_type()
}

// ==================== Standard Tags ====================

#[test]
fn test_untagged_items() {
    assert_eq!(semantic(&[0x01]), SemanticType::Untagged);
    assert_eq!(semantic(&[0x80]), SemanticType::Untagged);
}

#[test]
fn test_standard_classification() {
    // 0("2013")
    assert_eq!(semantic(&[0xC0, 0x64, b'2', b'0', b'1', b'3']), SemanticType::DateTime);
    // 1(1363896240)
    assert_eq!(semantic(&[0xC1, 0x1A, 0x51, 0x4B, 0x67, 0xB0]), SemanticType::DateTime);
    // 1(1.5)
    assert_eq!(semantic(&[0xC1, 0xF9, 0x3E, 0x00]), SemanticType::DateTime);
    // 2(h'01')
    assert_eq!(semantic(&[0xC2, 0x41, 0x01]), SemanticType::BigInteger);
    // 3(h'01')
    assert_eq!(semantic(&[0xC3, 0x41, 0x01]), SemanticType::BigInteger);
    // 4([-2, 27315])
    assert_eq!(
        semantic(&[0xC4, 0x82, 0x21, 0x19, 0x6A, 0xB3]),
        SemanticType::Fraction
    );
    // 24(h'01')
    assert_eq!(semantic(&[0xD8, 0x18, 0x41, 0x01]), SemanticType::EncodedItem);
    // 32("a")
    assert_eq!(semantic(&[0xD8, 0x20, 0x61, b'a']), SemanticType::Uri);
}

#[test]
fn test_known_tag_with_wrong_content_is_unknown() {
    // 0(1)
    assert_eq!(semantic(&[0xC0, 0x01]), SemanticType::Unknown);
    // 2("a")
    assert_eq!(semantic(&[0xC2, 0x61, b'a']), SemanticType::Unknown);
    // 32(h'01')
    assert_eq!(semantic(&[0xD8, 0x20, 0x41, 0x01]), SemanticType::Unknown);
}

#[test]
fn test_semantic_type_checks() {
    let data = vec![0xD8u8, 0x20, 0x61, b'a'];
    let value = Reader::new(&data).value_at(0).unwrap();
    assert_eq!(value.value_type(), ValueType::Semantic(SemanticType::Uri));
    assert!(ValueType::Tagged.accepts(&value));
    assert!(ValueType::Any.accepts(&value));
    assert!(!ValueType::Semantic(SemanticType::DateTime).accepts(&value));
    assert!(!ValueType::Text.accepts(&value));
}

#[test]
fn test_big_integer_accepted_as_integer() {
    let data = vec![0xC2u8, 0x41, 0x01];
    let value = Reader::new(&data).value_at(0).unwrap();
    assert!(ValueType::Integer.accepts(&value));
    assert_eq!(value.as_i64().unwrap(), 1);
}

#[test]
fn test_content_header() {
    let data = vec![0xD8u8, 0x20, 0x61, b'a'];
    let reader = Reader::new(&data);
    let content = reader.content_header(0).unwrap();
    assert_eq!(content.major, MajorType::Text);
    assert_eq!(
        reader.content_header(2),
        Err(Error::TypeMismatch {
            offset: 2,
            expected: ValueType::Tagged,
            actual: ValueType::Text,
        })
    );
}

// ==================== Registries ====================

#[test]
fn test_empty_registry_resolves_nothing() {
    let tags = TagRegistry::empty();
    assert!(tags.is_empty());
    let data = vec![0xC2u8, 0x41, 0x07];
    let value = Reader::with_tags(&data, &tags).value_at(0).unwrap();
    assert_eq!(value.semantic_type(), SemanticType::Unknown);
    assert_eq!(
        value.as_i128(),
        Err(Error::TypeMismatch {
            offset: 0,
            expected: ValueType::Integer,
            actual: ValueType::Tagged,
        })
    );
    assert_eq!(
        value.materialize().unwrap(),
        Object::Tagged(2, Box::new(Object::Bytes(vec![0x07])))
    );
}

#[test]
fn test_standard_registry_decodes_big_integers() {
    let data = vec![0xC3u8, 0x41, 0x07];
    let value = Reader::new(&data).value_at(0).unwrap();
    assert_eq!(value.materialize().unwrap(), Object::Integer(-8));
    assert_eq!(TagRegistry::standard().len(), 1);
}

/// Maps tag 1 to a URI and decodes it as upper-case text.
#[derive(Debug)]
struct ShoutingUri;

impl TagResolver for ShoutingUri {
    fn resolve(&self, _reader: &Reader<'_>, _offset: usize, tag: u64) -> Option<SemanticType> {
        (tag == 1).then_some(SemanticType::Uri)
    }

    fn decode(&self, value: &Value<'_>) -> na_cbor::Result<Option<Object>> {
        if value.tag()? != 1 {
            return Ok(None);
        }
        let content = value.tagged()?.materialize()?;
        Ok(content
            .as_str()
            .map(|text| Object::Text(text.to_uppercase())))
    }
}

#[test]
fn test_custom_resolver_takes_precedence() {
    let tags = TagRegistry::empty()
        .with_resolver(ShoutingUri)
        .with_resolver(StandardTags);
    assert_eq!(tags.len(), 2);

    // 1("a"), 2(h'01')
    let data = vec![0xC1u8, 0x61, b'a', 0xC2, 0x41, 0x01];
    let reader = Reader::with_tags(&data, &tags);
    let first = reader.value_at(0).unwrap();
    assert_eq!(first.semantic_type(), SemanticType::Uri);
    assert_eq!(first.materialize().unwrap(), Object::Text("A".into()));

    let second = reader.value_at(3).unwrap();
    assert_eq!(second.semantic_type(), SemanticType::BigInteger);
    assert_eq!(second.materialize().unwrap(), Object::Integer(1));
}

#[test]
fn test_later_resolver_is_fallback() {
    let tags = TagRegistry::standard().with_resolver(ShoutingUri);
    // 1(1): the standard resolver claims it first
    let data = vec![0xC1u8, 0x01];
    let value = Reader::with_tags(&data, &tags).value_at(0).unwrap();
    assert_eq!(value.semantic_type(), SemanticType::DateTime);
}

#[test]
fn test_semantic_display() {
    assert_eq!(SemanticType::BigInteger.to_string(), "big integer");
    assert_eq!(
        ValueType::Semantic(SemanticType::EncodedItem).to_string(),
        "encoded item tag"
    );
}
