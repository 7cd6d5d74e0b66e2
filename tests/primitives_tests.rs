use std::borrow::Cow;

use na_cbor::{
    ByteSource, ChunkedSource, Error,
    source::{
        read_bytes, read_f32, read_f64, read_u8, read_u16, read_u32, read_u64, write_f32,
        write_f64, write_u8, write_u16, write_u32, write_u64,
    },
};

#[test]
fn test_read_big_endian_integers() {
    let data = vec![0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09];
    assert_eq!(read_u8(&data, 0).unwrap(), 0x01);
    assert_eq!(read_u16(&data, 1).unwrap(), 0x0203);
    assert_eq!(read_u32(&data, 1).unwrap(), 0x0203_0405);
    assert_eq!(read_u64(&data, 1).unwrap(), 0x0203_0405_0607_0809);
}

#[test]
fn test_read_past_end() {
    let data = vec![0x01u8, 0x02, 0x03];
    assert_eq!(read_u8(&data, 3), Err(Error::EndOfFile { offset: 3 }));
    assert_eq!(read_u16(&data, 2), Err(Error::EndOfFile { offset: 2 }));
    assert_eq!(read_u32(&data, 0), Err(Error::EndOfFile { offset: 0 }));
    assert_eq!(read_u64(&data, 0), Err(Error::EndOfFile { offset: 0 }));
}

#[test]
fn test_write_then_read_at_offset() {
    let mut buf = vec![0u8; 32];
    write_u8(&mut buf, 0, 0xAB).unwrap();
    write_u16(&mut buf, 1, 0xBEEF).unwrap();
    write_u32(&mut buf, 3, 0xDEAD_BEEF).unwrap();
    write_u64(&mut buf, 7, 0x0102_0304_0506_0708).unwrap();
    write_f32(&mut buf, 15, 1.5).unwrap();
    write_f64(&mut buf, 19, -2.25).unwrap();

    assert_eq!(&buf[1..3], &[0xBE, 0xEF]);
    assert_eq!(read_u8(&buf, 0).unwrap(), 0xAB);
    assert_eq!(read_u16(&buf, 1).unwrap(), 0xBEEF);
    assert_eq!(read_u32(&buf, 3).unwrap(), 0xDEAD_BEEF);
    assert_eq!(read_u64(&buf, 7).unwrap(), 0x0102_0304_0506_0708);
    assert_eq!(read_f32(&buf, 15).unwrap(), 1.5);
    assert_eq!(read_f64(&buf, 19).unwrap(), -2.25);
}

#[test]
fn test_write_past_end() {
    let mut buf = vec![0u8; 4];
    assert_eq!(
        write_u32(&mut buf, 1, 1),
        Err(Error::EndOfFile { offset: 1 })
    );
    assert_eq!(
        write_u64(&mut buf, usize::MAX, 1),
        Err(Error::EndOfFile { offset: usize::MAX })
    );
    assert_eq!(buf, [0, 0, 0, 0]);
}

#[test]
fn test_read_bytes_borrows_contiguous_sources() {
    let data = vec![0x10u8, 0x20, 0x30, 0x40];
    match read_bytes(&data, 1, 2).unwrap() {
        Cow::Borrowed(bytes) => assert_eq!(bytes, &[0x20, 0x30]),
        Cow::Owned(_) => panic!("expected a borrowed slice"),
    }
    assert_eq!(
        read_bytes(&data, 3, 2),
        Err(Error::EndOfFile { offset: 3 })
    );
}

#[test]
fn test_read_bytes_copies_across_chunks() {
    let data: Vec<u8> = (0..10).collect();
    let chunked = ChunkedSource::new(&data, 4);
    assert_eq!(chunked.chunk_count(), 3);
    assert_eq!(chunked.chunk_size(), 4);

    let bytes = read_bytes(&chunked, 2, 5).unwrap();
    assert!(matches!(bytes, Cow::Owned(_)));
    assert_eq!(&*bytes, &[2, 3, 4, 5, 6]);

    let inside = read_bytes(&chunked, 4, 3).unwrap();
    assert!(matches!(inside, Cow::Borrowed(_)));
    assert_eq!(&*inside, &[4, 5, 6]);
}

#[test]
fn test_chunked_reads_span_chunks() {
    let data: Vec<u8> = (0..10).collect();
    let chunked = ChunkedSource::new(&data, 3);
    assert_eq!(chunked.len(), 10);
    assert_eq!(read_u32(&chunked, 2).unwrap(), 0x0203_0405);
    assert_eq!(chunked.read_one(9).unwrap(), 9);
    assert_eq!(chunked.read_one(10), Err(Error::EndOfFile { offset: 10 }));
    assert!(chunked.is_valid_offset(9));
    assert!(!chunked.is_valid_offset(10));
}

#[test]
fn test_short_read_reports_copied_count() {
    let data = vec![1u8, 2, 3];
    let mut dst = [0u8; 5];
    assert_eq!(data.read(&mut dst, 1), 2);
    assert_eq!(&dst[..2], &[2, 3]);
    assert_eq!(data.read(&mut dst, 7), 0);
}

#[test]
#[should_panic(expected = "chunk size must be non-zero")]
fn test_zero_chunk_size_panics() {
    let _ = ChunkedSource::new(&[1, 2, 3], 0);
}
