use std::fmt;

use crate::{
    ByteSource, Dictionary, Error, Header, MajorType, Result, SemanticType, Sequence, TagRegistry,
    Value, ValueType, cold_path, geometry,
};

/// A byte source paired with the tag resolvers used to interpret it.
///
/// `Reader` is a pair of shared references and is freely copied; every
/// [`Value`] carries one so it can re-read its payload on demand.
///
/// # Example
///
/// ```
/// use na_cbor::Reader;
///
/// // [1, "a"]
/// let data = vec![0x82, 0x01, 0x61, b'a'];
/// let reader = Reader::new(&data);
/// let list = reader.sequence_at(0).unwrap();
/// assert_eq!(list.len(), 2);
/// assert_eq!(list.get(1).unwrap().as_text().unwrap(), "a");
/// ```
#[derive(Clone, Copy)]
pub struct Reader<'s> {
    source: &'s dyn ByteSource,
    tags: &'s TagRegistry,
}

impl<'s> Reader<'s> {
    /// Reads `source` with the standard tag resolvers.
    #[inline]
    pub fn new<S: ByteSource>(source: &'s S) -> Self {
        Self {
            source,
            tags: TagRegistry::standard_ref(),
        }
    }

    /// Reads `source` with a caller-provided resolver registry.
    #[inline]
    pub fn with_tags<S: ByteSource>(source: &'s S, tags: &'s TagRegistry) -> Self {
        Self { source, tags }
    }

    #[inline]
    pub fn source(&self) -> &'s dyn ByteSource {
        self.source
    }

    #[inline]
    pub fn tags(&self) -> &'s TagRegistry {
        self.tags
    }

    /// Returns the value at `offset`, or `None` if `offset` lies past the end
    /// of the source.
    pub fn read_value(&self, offset: usize) -> Result<Option<Value<'s>>> {
        if !self.source.is_valid_offset(offset) {
            return Ok(None);
        }
        self.value_at(offset).map(Some)
    }

    /// Returns the value at `offset`, failing if there is none.
    #[inline]
    pub fn value_at(&self, offset: usize) -> Result<Value<'s>> {
        let header = Header::read(self.source, offset)?;
        Ok(Value::from_header(*self, offset, &header))
    }

    /// Builds a sequence view of the item at `offset`.
    #[inline]
    pub fn sequence_at(&self, offset: usize) -> Result<Sequence<'s>> {
        Sequence::build(*self, offset)
    }

    /// Builds a dictionary view of the item at `offset`.
    #[inline]
    pub fn dictionary_at(&self, offset: usize) -> Result<Dictionary<'s>> {
        Dictionary::build(*self, offset)
    }

    #[inline]
    pub fn item_size(&self, offset: usize) -> Result<usize> {
        geometry::item_size(self.source, offset)
    }

    /// Offset of the `index`-th top-level item of the stream.
    pub fn stream_offset(&self, index: usize) -> Result<usize> {
        let mut position = 0;
        for skipped in 0..index {
            if !self.source.is_valid_offset(position) {
                cold_path();
                return Err(Error::IndexOutOfRange {
                    offset: position,
                    index,
                    len: skipped,
                });
            }
            position = geometry::skip(self.source, position)?;
        }
        if !self.source.is_valid_offset(position) {
            cold_path();
            return Err(Error::IndexOutOfRange {
                offset: position,
                index,
                len: index,
            });
        }
        Ok(position)
    }

    /// Iterates over the top-level items of the stream.
    #[inline]
    pub fn stream(&self) -> Stream<'s> {
        Stream {
            reader: *self,
            position: 0,
            failed: false,
        }
    }

    /// Reads the header of the content wrapped by the tag item at `offset`.
    pub fn content_header(&self, offset: usize) -> Result<Header> {
        let header = Header::read(self.source, offset)?;
        if header.major != MajorType::Tag {
            cold_path();
            return Err(Error::TypeMismatch {
                offset,
                expected: ValueType::Tagged,
                actual: ValueType::of_major(header.major),
            });
        }
        Header::read(self.source, offset + header.size)
    }

    #[inline]
    pub(crate) fn semantic(&self, offset: usize, header: &Header) -> SemanticType {
        if header.major == MajorType::Tag {
            self.tags.resolve(self, offset, header.argument)
        } else {
            SemanticType::Untagged
        }
    }
}

impl fmt::Debug for Reader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("len", &self.source.len())
            .field("tags", &self.tags.len())
            .finish()
    }
}

/// Iterator over the top-level items of a source, created by [`Reader::stream`].
///
/// Iteration stops after the first error.
#[derive(Clone, Debug)]
pub struct Stream<'s> {
    reader: Reader<'s>,
    position: usize,
    failed: bool,
}

impl<'s> Iterator for Stream<'s> {
    type Item = Result<Value<'s>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.reader.source.is_valid_offset(self.position) {
            return None;
        }
        let result = self.reader.value_at(self.position).and_then(|value| {
            self.position = geometry::skip(self.reader.source, self.position)?;
            Ok(value)
        });
        self.failed = result.is_err();
        Some(result)
    }
}
