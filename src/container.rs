//! Lazy sequence and dictionary views.
//!
//! Building a view scans the container once and records the start offset of
//! every child. After that, positional access costs one index lookup plus
//! one header read. Children are never decoded until asked for.

use std::{fmt, iter::FusedIterator};

use crate::{
    Cursor, Error, Header, Key, MajorType, Reader, Result, Value, ValueType, cold_path, geometry,
    header::BREAK,
    util::advance,
};

/// Walks the children of the container at `offset` in encoded order and
/// returns how many there are.
///
/// `visit` receives each child's start offset once that child has been
/// measured. For dictionaries children alternate key, value. Every caller
/// sees the same errors for the same malformed container, whatever it keeps.
pub(crate) fn walk_children(
    reader: &Reader<'_>,
    offset: usize,
    header: &Header,
    mut visit: impl FnMut(usize) -> Result<()>,
) -> Result<usize> {
    let source = reader.source();
    let mut position = advance(offset, header.size, offset)?;

    if header.is_indefinite() {
        let mut walked = 0usize;
        while source.read_one(position)? != BREAK {
            let next = geometry::skip(source, position)?;
            visit(position)?;
            position = next;
            walked += 1;
        }
        if header.major == MajorType::Dictionary && walked % 2 != 0 {
            cold_path();
            return Err(Error::UnexpectedBreak { offset: position });
        }
        return Ok(walked);
    }

    let mut items = header.length(offset)?;
    if header.major == MajorType::Dictionary {
        items = items
            .checked_mul(2)
            .ok_or(Error::SizeOverflow { offset })?;
    }
    // every child takes at least one byte
    if items > source.len().saturating_sub(position) {
        cold_path();
        return Err(Error::EndOfFile { offset: position });
    }
    for _ in 0..items {
        let next = geometry::skip(source, position)?;
        visit(position)?;
        position = next;
    }
    Ok(items)
}

/// Records child offsets of the container at `offset`.
///
/// For dictionaries the index is flat: key, value, key, value, ...
fn build_index(reader: &Reader<'_>, offset: usize, header: &Header) -> Result<Vec<usize>> {
    let mut index = Vec::new();
    walk_children(reader, offset, header, |child| {
        index.push(child);
        Ok(())
    })?;
    tracing::trace!(offset, children = index.len(), "built container index");
    Ok(index)
}

pub(crate) fn container_header(
    reader: &Reader<'_>,
    offset: usize,
    major: MajorType,
    expected: ValueType,
) -> Result<Header> {
    let header = Header::read(reader.source(), offset)?;
    if header.major != major {
        cold_path();
        return Err(Error::TypeMismatch {
            offset,
            expected,
            actual: reader.value_at(offset)?.value_type(),
        });
    }
    Ok(header)
}

/// A lazy view over an encoded sequence.
#[derive(Clone)]
pub struct Sequence<'s> {
    reader: Reader<'s>,
    offset: usize,
    index: Box<[usize]>,
}

impl<'s> Sequence<'s> {
    pub(crate) fn build(reader: Reader<'s>, offset: usize) -> Result<Self> {
        let header = container_header(&reader, offset, MajorType::Sequence, ValueType::Sequence)?;
        Ok(Self {
            reader,
            offset,
            index: build_index(&reader, offset, &header)?.into_boxed_slice(),
        })
    }

    /// Offset of the sequence's own header.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Start offsets of every element, in order.
    #[inline]
    pub fn offsets(&self) -> &[usize] {
        &self.index
    }

    /// Start offset of element `index`.
    #[inline]
    pub fn offset_of(&self, index: usize) -> Result<usize> {
        match self.index.get(index) {
            Some(offset) => Ok(*offset),
            None => {
                cold_path();
                Err(Error::IndexOutOfRange {
                    offset: self.offset,
                    index,
                    len: self.index.len(),
                })
            }
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Result<Value<'s>> {
        self.reader.value_at(self.offset_of(index)?)
    }

    #[inline]
    pub fn iter(&self) -> SequenceIter<'_, 's> {
        SequenceIter {
            reader: self.reader,
            offsets: self.index.iter(),
        }
    }

    /// Position of the first element satisfying `predicate`.
    pub fn position(&self, predicate: impl Fn(&Value<'s>) -> bool) -> Result<Option<usize>> {
        let Some(first) = self.index.first() else {
            return Ok(None);
        };
        let mut cursor = Cursor::new(self.reader.value_at(*first)?);
        for (position, offset) in self.index.iter().enumerate() {
            if predicate(cursor.relocate(*offset)?) {
                return Ok(Some(position));
            }
        }
        Ok(None)
    }

    /// The first element satisfying `predicate`.
    pub fn find(&self, predicate: impl Fn(&Value<'s>) -> bool) -> Result<Option<Value<'s>>> {
        match self.position(predicate)? {
            Some(position) => self.get(position).map(Some),
            None => Ok(None),
        }
    }

    pub fn contains(&self, predicate: impl Fn(&Value<'s>) -> bool) -> Result<bool> {
        Ok(self.position(predicate)?.is_some())
    }
}

impl fmt::Debug for Sequence<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("offset", &self.offset)
            .field("index", &self.index)
            .finish()
    }
}

impl<'a, 's> IntoIterator for &'a Sequence<'s> {
    type Item = Result<Value<'s>>;
    type IntoIter = SequenceIter<'a, 's>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Clone)]
pub struct SequenceIter<'a, 's> {
    reader: Reader<'s>,
    offsets: std::slice::Iter<'a, usize>,
}

impl<'s> Iterator for SequenceIter<'_, 's> {
    type Item = Result<Value<'s>>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offsets.next()?;
        Some(self.reader.value_at(*offset))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.offsets.size_hint()
    }
}

impl ExactSizeIterator for SequenceIter<'_, '_> {}

impl FusedIterator for SequenceIter<'_, '_> {}

/// A lazy view over an encoded dictionary.
///
/// Entries keep their encoded order. Lookups scan keys front to back and
/// stop at the first match, so duplicate keys resolve to the first entry.
#[derive(Clone)]
pub struct Dictionary<'s> {
    reader: Reader<'s>,
    offset: usize,
    index: Box<[usize]>,
}

impl<'s> Dictionary<'s> {
    pub(crate) fn build(reader: Reader<'s>, offset: usize) -> Result<Self> {
        let header =
            container_header(&reader, offset, MajorType::Dictionary, ValueType::Dictionary)?;
        Ok(Self {
            reader,
            offset,
            index: build_index(&reader, offset, &header)?.into_boxed_slice(),
        })
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of key/value pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len() / 2
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn pair(&self, index: usize) -> Result<(usize, usize)> {
        let pair = index
            .checked_mul(2)
            .and_then(|start| self.index.get(start..start.checked_add(2)?));
        match pair {
            Some(&[key, value]) => Ok((key, value)),
            _ => {
                cold_path();
                Err(Error::IndexOutOfRange {
                    offset: self.offset,
                    index,
                    len: self.len(),
                })
            }
        }
    }

    #[inline]
    pub fn key(&self, index: usize) -> Result<Value<'s>> {
        self.reader.value_at(self.pair(index)?.0)
    }

    #[inline]
    pub fn value(&self, index: usize) -> Result<Value<'s>> {
        self.reader.value_at(self.pair(index)?.1)
    }

    pub fn entry(&self, index: usize) -> Result<(Value<'s>, Value<'s>)> {
        let (key, value) = self.pair(index)?;
        Ok((self.reader.value_at(key)?, self.reader.value_at(value)?))
    }

    /// Index of the first entry whose key satisfies `predicate`.
    pub fn position_key(&self, predicate: impl Fn(&Value<'s>) -> bool) -> Result<Option<usize>> {
        let Some(first) = self.index.first() else {
            return Ok(None);
        };
        let mut cursor = Cursor::new(self.reader.value_at(*first)?);
        for (position, offset) in self.index.iter().step_by(2).enumerate() {
            if predicate(cursor.relocate(*offset)?) {
                return Ok(Some(position));
            }
        }
        Ok(None)
    }

    /// The value paired with the first key satisfying `predicate`.
    pub fn find_key(&self, predicate: impl Fn(&Value<'s>) -> bool) -> Result<Option<Value<'s>>> {
        match self.position_key(predicate)? {
            Some(position) => self.value(position).map(Some),
            None => Ok(None),
        }
    }

    /// Looks a value up by key.
    ///
    /// ```
    /// use na_cbor::Reader;
    ///
    /// // {"a": 1, 2: "b"}
    /// let data = vec![0xA2, 0x61, b'a', 0x01, 0x02, 0x61, b'b'];
    /// let dict = Reader::new(&data).dictionary_at(0).unwrap();
    /// assert_eq!(dict.get("a").unwrap().unwrap().as_u64().unwrap(), 1);
    /// assert_eq!(dict.get(2u64).unwrap().unwrap().as_text().unwrap(), "b");
    /// assert!(dict.get("z").unwrap().is_none());
    /// ```
    pub fn get(&self, key: impl Key) -> Result<Option<Value<'s>>> {
        let Some(first) = self.index.first() else {
            return Ok(None);
        };
        let mut cursor = Cursor::new(self.reader.value_at(*first)?);
        for (position, offset) in self.index.iter().step_by(2).enumerate() {
            if key.matches(cursor.relocate(*offset)?)? {
                return self.value(position).map(Some);
            }
        }
        Ok(None)
    }

    pub fn contains_key(&self, key: impl Key) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    #[inline]
    pub fn iter(&self) -> DictionaryIter<'_, 's> {
        DictionaryIter {
            reader: self.reader,
            offsets: self.index.chunks_exact(2),
        }
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = Result<Value<'s>>> + '_ {
        self.index
            .iter()
            .step_by(2)
            .map(|offset| self.reader.value_at(*offset))
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = Result<Value<'s>>> + '_ {
        self.index
            .iter()
            .skip(1)
            .step_by(2)
            .map(|offset| self.reader.value_at(*offset))
    }
}

impl fmt::Debug for Dictionary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dictionary")
            .field("offset", &self.offset)
            .field("index", &self.index)
            .finish()
    }
}

impl<'a, 's> IntoIterator for &'a Dictionary<'s> {
    type Item = Result<(Value<'s>, Value<'s>)>;
    type IntoIter = DictionaryIter<'a, 's>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Clone)]
pub struct DictionaryIter<'a, 's> {
    reader: Reader<'s>,
    offsets: std::slice::ChunksExact<'a, usize>,
}

impl<'s> Iterator for DictionaryIter<'_, 's> {
    type Item = Result<(Value<'s>, Value<'s>)>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let pair = self.offsets.next()?;
        Some(
            self.reader
                .value_at(pair[0])
                .and_then(|key| Ok((key, self.reader.value_at(pair[1])?))),
        )
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.offsets.size_hint()
    }
}

impl ExactSizeIterator for DictionaryIter<'_, '_> {}

impl FusedIterator for DictionaryIter<'_, '_> {}
