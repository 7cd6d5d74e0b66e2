//! Property-based tests for geometry, views and queries.

use na_cbor::{Object, QueryBuilder, Reader, geometry, query::OptimizerStrategy, read};
use proptest::prelude::*;

fn scalar() -> impl Strategy<Value = Object> {
    prop_oneof![
        Just(Object::Null),
        Just(Object::Undefined),
        any::<bool>().prop_map(Object::Bool),
        any::<i64>().prop_map(|n| Object::Integer(n as i128)),
        any::<i128>().prop_map(Object::Integer),
        (-1.0e6f64..1.0e6).prop_map(Object::Float),
        prop::collection::vec(any::<u8>(), 0..40).prop_map(Object::Bytes),
        "[a-z]{0,30}".prop_map(Object::Text),
        (32u8..=255).prop_map(Object::Simple),
    ]
}

fn object() -> impl Strategy<Value = Object> {
    scalar().prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Object::Sequence),
            prop::collection::vec(("[a-d]{1,2}".prop_map(Object::Text), inner.clone()), 0..6)
                .prop_map(Object::Dictionary),
            (100u64..1000, inner).prop_map(|(tag, content)| Object::Tagged(tag, Box::new(content))),
        ]
    })
}

fn sequence_of_objects() -> impl Strategy<Value = Vec<Object>> {
    prop::collection::vec(object(), 0..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The size of the top-level item is the length of its encoding.
    #[test]
    fn prop_item_size_is_encoded_length(item in object()) {
        let data = item.write_to_vec();
        prop_assert_eq!(geometry::item_size(&data, 0).unwrap(), data.len());
        let indefinite = item.write_indefinite_to_vec();
        prop_assert_eq!(geometry::item_size(&indefinite, 0).unwrap(), indefinite.len());
    }

    /// Definite and indefinite encodings decode to the same object.
    #[test]
    fn prop_materialize_ignores_length_form(item in object()) {
        let data = item.write_to_vec();
        let indefinite = item.write_indefinite_to_vec();
        let definite = Reader::new(&data).value_at(0).unwrap().materialize().unwrap();
        prop_assert_eq!(&definite, &item);
        let other = Reader::new(&indefinite).value_at(0).unwrap().materialize().unwrap();
        prop_assert_eq!(&other, &item);
    }

    /// Indexed access agrees with walking the elements one by one.
    #[test]
    fn prop_index_matches_traversal(items in sequence_of_objects()) {
        let data = Object::Sequence(items.clone()).write_to_vec();
        let reader = Reader::new(&data);
        let list = reader.sequence_at(0).unwrap();
        prop_assert_eq!(list.len(), items.len());

        let mut position = reader.value_at(0).unwrap().header().unwrap().size;
        for (i, item) in items.iter().enumerate() {
            prop_assert_eq!(list.offset_of(i).unwrap(), position);
            prop_assert_eq!(&list.get(i).unwrap().materialize().unwrap(), item);
            position = geometry::skip(&data, position).unwrap();
        }
        prop_assert_eq!(position, data.len());
    }

    /// Skipping and indexing select the same element.
    #[test]
    fn prop_sequence_skip_matches_index(items in sequence_of_objects(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!items.is_empty());
        let index = pick.index(items.len());
        for data in [
            Object::Sequence(items.clone()).write_to_vec(),
            Object::Sequence(items.clone()).write_indefinite_to_vec(),
        ] {
            let skip = QueryBuilder::new().sequence(index).build();
            let plain = QueryBuilder::new().sequence(index).build_with(&OptimizerStrategy::none());
            let a = read(&data, &skip).unwrap().to_object().unwrap();
            let b = read(&data, &plain).unwrap().to_object().unwrap();
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(&a, &items[index]);
        }
    }

    /// Key lookups find the first entry with that key, or nothing.
    #[test]
    fn prop_key_lookup_finds_first(
        entries in prop::collection::vec(("[a-d]{1,2}", object()), 0..8),
        key in "[a-d]{1,2}",
    ) {
        let dict = Object::Dictionary(
            entries.iter().map(|(k, v)| (Object::Text(k.clone()), v.clone())).collect(),
        );
        let expected = entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone());
        for data in [dict.write_to_vec(), dict.write_indefinite_to_vec()] {
            let scan = QueryBuilder::new().dictionary(key.as_str()).build();
            let lookup = QueryBuilder::new()
                .dictionary(key.as_str())
                .build_with(&OptimizerStrategy::none());
            for query in [&scan, &lookup] {
                let found = read(&data, query).unwrap();
                match &expected {
                    Some(value) => {
                        prop_assert_eq!(&found.to_object().unwrap(), value);
                    }
                    None => {
                        prop_assert!(found.is_absent());
                    }
                }
            }
            let view = Reader::new(&data).dictionary_at(0).unwrap();
            let direct = view.get(key.as_str()).unwrap().map(|v| v.materialize().unwrap());
            prop_assert_eq!(&direct, &expected);
        }
    }
}
