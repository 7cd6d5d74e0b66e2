use bytes::Bytes;
use honggfuzz::fuzz;
use na_cbor::{
    ByteSource, ChunkedSource, QueryBuilder, Reader, geometry, query::OptimizerStrategy, read_all,
};

fn walk(reader: Reader<'_>) {
    for value in reader.stream().take(64) {
        let Ok(value) = value else {
            break;
        };
        if let Ok(object) = value.materialize() {
            let encoded = object.write_to_vec();
            assert_eq!(geometry::item_size(&encoded, 0), Ok(encoded.len()));
        }
        let _ = value.raw_bytes();
        if let Ok(list) = value.sequence() {
            for item in list.iter().take(16) {
                let _ = item.and_then(|v| v.as_i128());
            }
        }
        if let Ok(dict) = value.dictionary() {
            let _ = dict.get("a");
            let _ = dict.get(0u64);
        }
    }
}

fn query<S: ByteSource>(source: &S) {
    let builders = [
        QueryBuilder::new().multi_stream().sequence_match(|_| true),
        QueryBuilder::new().dictionary("a").sequence(1),
        QueryBuilder::new().sequence(0).as_dictionary(|d| {
            d.entry("x", |p| p.dictionary(1u64))
                .entry("y", |p| p.sequence_match(|v| v.as_text().is_ok()))
        }),
    ];
    for builder in builders {
        let _ = read_all(source, &builder.build());
    }
    let plain = QueryBuilder::new()
        .dictionary("a")
        .sequence(1)
        .build_with(&OptimizerStrategy::none());
    let _ = read_all(source, &plain);
}

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            walk(Reader::new(&data));
            query(&data);

            let chunked = ChunkedSource::new(data, 3);
            walk(Reader::new(&chunked));
            query(&chunked);

            let shared = Bytes::copy_from_slice(data);
            query(&shared);
        });
    }
}
