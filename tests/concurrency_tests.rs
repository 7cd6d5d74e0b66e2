use std::{sync::Arc, thread};

use na_cbor::{Object, Query, QueryBuilder, Reader, TagRegistry, read, read_all};

fn record(id: i64, score: i64) -> Vec<u8> {
    Object::Dictionary(vec![
        ("id".into(), id.into()),
        ("scores".into(), Object::Sequence(vec![score.into(), (score * 2).into()])),
    ])
    .write_to_vec()
}

#[test]
fn test_query_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Query>();
    assert_send_sync::<Reader<'static>>();
    assert_send_sync::<TagRegistry>();
}

#[test]
fn test_one_query_many_threads() {
    let query = QueryBuilder::new().dictionary("scores").sequence(1).build();
    let documents: Vec<Vec<u8>> = (0..8).map(|i| record(i, i * 10)).collect();

    let results: Vec<u64> = thread::scope(|scope| {
        let handles: Vec<_> = documents
            .iter()
            .map(|data| {
                let query = &query;
                scope.spawn(move || {
                    let mut last = 0;
                    for _ in 0..100 {
                        last = read(data, query)
                            .unwrap()
                            .as_value()
                            .unwrap()
                            .as_u64()
                            .unwrap();
                    }
                    last
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results, (0..8).map(|i| i * 20).collect::<Vec<u64>>());
}

#[test]
fn test_one_source_many_queries() {
    let data = Arc::new(record(7, 5));
    let queries = [
        QueryBuilder::new().dictionary("id").build(),
        QueryBuilder::new().dictionary("scores").sequence(0).build(),
        QueryBuilder::new().dictionary("scores").sequence(1).build(),
    ];

    thread::scope(|scope| {
        for (query, expected) in queries.iter().zip([7u64, 5, 10]) {
            let data = Arc::clone(&data);
            scope.spawn(move || {
                for _ in 0..100 {
                    let found = read(&data, query).unwrap();
                    assert_eq!(found.as_value().unwrap().as_u64().unwrap(), expected);
                }
            });
        }
    });
}

#[test]
fn test_enumerating_query_in_parallel() {
    let object = Object::Sequence((0..200).map(Object::Integer).collect());
    let data = object.write_to_vec();
    let query = QueryBuilder::new()
        .sequence_match(|v| v.as_u64().is_ok_and(|n| n % 3 == 0))
        .build();

    let counts: Vec<usize> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| read_all(&data, &query).unwrap().len()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(counts, [67, 67, 67, 67]);
}

#[test]
fn test_values_cross_threads() {
    let data = record(1, 2);
    let reader = Reader::new(&data);
    let scores = reader.dictionary_at(0).unwrap().get("scores").unwrap().unwrap();
    let total = thread::scope(|scope| {
        scope
            .spawn(move || {
                scores
                    .sequence()
                    .unwrap()
                    .iter()
                    .map(|v| v.unwrap().as_u64().unwrap())
                    .sum::<u64>()
            })
            .join()
            .unwrap()
    });
    assert_eq!(total, 6);
}
