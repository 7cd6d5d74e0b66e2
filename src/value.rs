use std::{borrow::Cow, fmt};

use crate::{
    Dictionary, Error, Header, MajorType, Object, Reader, Result, SemanticType, Sequence,
    ValueType, cold_path, geometry,
    header::{self, BREAK, INDEFINITE},
    source::read_bytes,
    util::advance,
};

/// Deepest nesting of containers and tags that [`Value::materialize`] and
/// serialization descend into. The top-level item is at depth zero.
pub const MAX_NESTING: usize = 128;

/// A lazy handle to one encoded item.
///
/// A `Value` records where an item lives and what kind it is; every
/// accessor re-reads the byte source, so holding a `Value` never copies its
/// payload. Values are `Copy` and stay valid for as long as the source they
/// were read from.
///
/// # Example
///
/// ```
/// use na_cbor::{MajorType, Reader};
///
/// // -5 encoded with a one-byte header
/// let data = vec![0x24];
/// let value = Reader::new(&data).value_at(0).unwrap();
/// assert_eq!(value.major_type(), MajorType::Negative);
/// assert_eq!(value.as_i64().unwrap(), -5);
/// ```
#[derive(Clone, Copy)]
pub struct Value<'s> {
    reader: Reader<'s>,
    offset: usize,
    major: MajorType,
    selector: u8,
    semantic: SemanticType,
}

impl<'s> Value<'s> {
    #[inline]
    pub(crate) fn from_header(reader: Reader<'s>, offset: usize, header: &Header) -> Self {
        Self {
            reader,
            offset,
            major: header.major,
            selector: header.selector,
            semantic: reader.semantic(offset, header),
        }
    }

    #[inline]
    pub fn reader(&self) -> Reader<'s> {
        self.reader
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn major_type(&self) -> MajorType {
        self.major
    }

    #[inline]
    pub fn semantic_type(&self) -> SemanticType {
        self.semantic
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        ValueType::of(self)
    }

    #[inline]
    pub(crate) fn selector(&self) -> u8 {
        self.selector
    }

    #[inline]
    pub fn is_indefinite(&self) -> bool {
        self.selector == INDEFINITE && self.major.allows_indefinite()
    }

    /// Re-reads this item's header.
    #[inline]
    pub fn header(&self) -> Result<Header> {
        Header::read(self.reader.source(), self.offset)
    }

    /// Encoded size of the item, children included.
    #[inline]
    pub fn size(&self) -> Result<usize> {
        geometry::item_size(self.reader.source(), self.offset)
    }

    /// The exact encoded bytes of this item.
    pub fn raw_bytes(&self) -> Result<Cow<'s, [u8]>> {
        read_bytes(self.reader.source(), self.offset, self.size()?)
    }

    #[cold]
    fn mismatch(&self, expected: ValueType) -> Error {
        Error::TypeMismatch {
            offset: self.offset,
            expected,
            actual: self.value_type(),
        }
    }

    #[inline]
    fn expect(&self, major: MajorType, expected: ValueType) -> Result<Header> {
        if self.major != major {
            cold_path();
            return Err(self.mismatch(expected));
        }
        self.header()
    }

    pub fn as_u64(&self) -> Result<u64> {
        Ok(self.expect(MajorType::Unsigned, ValueType::Unsigned)?.argument)
    }

    /// Reads an integer as `i64`.
    pub fn as_i64(&self) -> Result<i64> {
        i64::try_from(self.as_i128()?).map_err(|_| {
            cold_path();
            Error::IntegerOverflow {
                offset: self.offset,
            }
        })
    }

    /// Reads an unsigned, negative or big integer as `i128`.
    ///
    /// Negative integers are stored as `-1 - n`; big integers (tags 2 and 3)
    /// must fit in `i128`.
    pub fn as_i128(&self) -> Result<i128> {
        match self.major {
            MajorType::Unsigned => Ok(self.header()?.argument as i128),
            MajorType::Negative => Ok(-1 - self.header()?.argument as i128),
            MajorType::Tag if self.semantic == SemanticType::BigInteger => {
                let negative = self.tag()? == 3;
                let magnitude = self.tagged()?.as_bytes()?;
                let digits = match magnitude.iter().position(|byte| *byte != 0) {
                    Some(first) => &magnitude[first..],
                    None => &magnitude[..0],
                };
                if digits.len() > 16 {
                    cold_path();
                    return Err(Error::IntegerOverflow {
                        offset: self.offset,
                    });
                }
                let m = digits
                    .iter()
                    .fold(0u128, |acc, byte| (acc << 8) | *byte as u128);
                let m = i128::try_from(m).map_err(|_| Error::IntegerOverflow {
                    offset: self.offset,
                })?;
                Ok(if negative { -1 - m } else { m })
            }
            _ => {
                cold_path();
                Err(self.mismatch(ValueType::Integer))
            }
        }
    }

    /// Reads a half, single or double precision float as `f64`.
    pub fn as_f64(&self) -> Result<f64> {
        let header = self.expect(MajorType::Simple, ValueType::Float)?;
        match header.selector {
            header::FLOAT_HALF => Ok(half_to_f64(header.argument as u16)),
            header::FLOAT_SINGLE => Ok(f32::from_bits(header.argument as u32) as f64),
            header::FLOAT_DOUBLE => Ok(f64::from_bits(header.argument)),
            _ => {
                cold_path();
                Err(self.mismatch(ValueType::Float))
            }
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match (self.major, self.selector) {
            (MajorType::Simple, header::SIMPLE_FALSE) => Ok(false),
            (MajorType::Simple, header::SIMPLE_TRUE) => Ok(true),
            _ => {
                cold_path();
                Err(self.mismatch(ValueType::Bool))
            }
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.major == MajorType::Simple && self.selector == header::SIMPLE_NULL
    }

    #[inline]
    pub fn is_undefined(&self) -> bool {
        self.major == MajorType::Simple && self.selector == header::SIMPLE_UNDEFINED
    }

    /// Reads a simple value number (including false/true/null/undefined).
    pub fn as_simple(&self) -> Result<u8> {
        let header = self.expect(MajorType::Simple, ValueType::Simple)?;
        match header.selector {
            0..=23 => Ok(header.selector),
            header::SIMPLE_EXTENDED => Ok(header.argument as u8),
            _ => {
                cold_path();
                Err(self.mismatch(ValueType::Simple))
            }
        }
    }

    /// The payload of a byte string. Indefinite strings are concatenated
    /// chunk by chunk.
    pub fn as_bytes(&self) -> Result<Cow<'s, [u8]>> {
        let header = self.expect(MajorType::Bytes, ValueType::Bytes)?;
        self.string_payload(&header)
    }

    /// The payload of a text string. Indefinite strings are concatenated
    /// chunk by chunk.
    pub fn as_text(&self) -> Result<Cow<'s, str>> {
        let header = self.expect(MajorType::Text, ValueType::Text)?;
        match self.string_payload(&header)? {
            Cow::Borrowed(bytes) => std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|_| Error::InvalidUtf8 {
                    offset: self.offset,
                }),
            Cow::Owned(bytes) => String::from_utf8(bytes)
                .map(Cow::Owned)
                .map_err(|_| Error::InvalidUtf8 {
                    offset: self.offset,
                }),
        }
    }

    /// Text payload without UTF-8 validation.
    #[inline]
    pub(crate) fn text_bytes(&self) -> Result<Cow<'s, [u8]>> {
        let header = self.expect(MajorType::Text, ValueType::Text)?;
        self.string_payload(&header)
    }

    fn string_payload(&self, header: &Header) -> Result<Cow<'s, [u8]>> {
        let source = self.reader.source();
        if !header.is_indefinite() {
            let (start, len) = geometry::string_span(source, self.offset, header)?;
            return read_bytes(source, start, len);
        }

        let mut payload = Vec::new();
        let mut position = advance(self.offset, header.size, self.offset)?;
        while source.read_one(position)? != BREAK {
            let chunk = Header::read(source, position)?;
            if chunk.major != self.major || chunk.is_indefinite() {
                cold_path();
                return Err(Error::InvalidChunk {
                    offset: position,
                    expected: ValueType::of_major(self.major),
                    actual: ValueType::of_major(chunk.major),
                });
            }
            let (start, len) = geometry::string_span(source, position, &chunk)?;
            payload.extend_from_slice(&read_bytes(source, start, len)?);
            position = start + len;
        }
        Ok(Cow::Owned(payload))
    }

    /// The tag number of a tagged item.
    pub fn tag(&self) -> Result<u64> {
        Ok(self.expect(MajorType::Tag, ValueType::Tagged)?.argument)
    }

    /// The item wrapped by a tag.
    pub fn tagged(&self) -> Result<Value<'s>> {
        let header = self.expect(MajorType::Tag, ValueType::Tagged)?;
        self.reader.value_at(self.offset + header.size)
    }

    /// Builds a sequence view of this item.
    #[inline]
    pub fn sequence(&self) -> Result<Sequence<'s>> {
        if self.major != MajorType::Sequence {
            cold_path();
            return Err(self.mismatch(ValueType::Sequence));
        }
        Sequence::build(self.reader, self.offset)
    }

    /// Builds a dictionary view of this item.
    #[inline]
    pub fn dictionary(&self) -> Result<Dictionary<'s>> {
        if self.major != MajorType::Dictionary {
            cold_path();
            return Err(self.mismatch(ValueType::Dictionary));
        }
        Dictionary::build(self.reader, self.offset)
    }

    /// Element count of a container without building a view.
    #[inline]
    pub fn element_count(&self) -> Result<usize> {
        geometry::element_count(self.reader.source(), self.offset)
    }

    /// Decodes this item and everything below it into an owned [`Object`].
    ///
    /// Tagged items are offered to the reader's resolvers first; tags no
    /// resolver decodes become [`Object::Tagged`]. Items nested deeper than
    /// [`MAX_NESTING`] levels fail with [`Error::DepthLimit`].
    pub fn materialize(&self) -> Result<Object> {
        self.materialize_at(0)
    }

    fn materialize_at(&self, depth: usize) -> Result<Object> {
        if depth > MAX_NESTING {
            cold_path();
            return Err(Error::DepthLimit {
                offset: self.offset,
            });
        }
        Ok(match self.major {
            MajorType::Unsigned | MajorType::Negative => Object::Integer(self.as_i128()?),
            MajorType::Bytes => Object::Bytes(self.as_bytes()?.into_owned()),
            MajorType::Text => Object::Text(self.as_text()?.into_owned()),
            MajorType::Sequence => Object::Sequence(
                self.sequence()?
                    .iter()
                    .map(|item| item?.materialize_at(depth + 1))
                    .collect::<Result<_>>()?,
            ),
            MajorType::Dictionary => Object::Dictionary(
                self.dictionary()?
                    .iter()
                    .map(|entry| {
                        let (key, value) = entry?;
                        Ok((key.materialize_at(depth + 1)?, value.materialize_at(depth + 1)?))
                    })
                    .collect::<Result<_>>()?,
            ),
            MajorType::Tag => match self.reader.tags().decode(self)? {
                Some(object) => object,
                None => Object::Tagged(
                    self.tag()?,
                    Box::new(self.tagged()?.materialize_at(depth + 1)?),
                ),
            },
            MajorType::Simple => match self.selector {
                header::SIMPLE_FALSE => Object::Bool(false),
                header::SIMPLE_TRUE => Object::Bool(true),
                header::SIMPLE_NULL => Object::Null,
                header::SIMPLE_UNDEFINED => Object::Undefined,
                header::FLOAT_HALF | header::FLOAT_SINGLE | header::FLOAT_DOUBLE => {
                    Object::Float(self.as_f64()?)
                }
                _ => Object::Simple(self.as_simple()?),
            },
        })
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("offset", &self.offset)
            .field("major", &self.major)
            .field("semantic", &self.semantic)
            .finish()
    }
}

/// A value handle that is moved in place from item to item.
///
/// Predicate scans rebind one `Cursor` to each candidate instead of
/// producing a fresh handle per element. Hand out copies of
/// [`value`](Cursor::value), never the cursor itself.
pub struct Cursor<'s> {
    value: Value<'s>,
}

impl<'s> Cursor<'s> {
    #[inline]
    pub fn new(value: Value<'s>) -> Self {
        Self { value }
    }

    /// Rebinds the cursor to the item at `offset`.
    #[inline]
    pub fn relocate(&mut self, offset: usize) -> Result<&Value<'s>> {
        let reader = self.value.reader;
        let header = Header::read(reader.source(), offset)?;
        self.value.offset = offset;
        self.value.major = header.major;
        self.value.selector = header.selector;
        self.value.semantic = reader.semantic(offset, &header);
        Ok(&self.value)
    }

    #[inline]
    pub fn value(&self) -> &Value<'s> {
        &self.value
    }
}

/// Widens an IEEE-754 half precision value.
pub(crate) fn half_to_f64(bits: u16) -> f64 {
    let exponent = (bits >> 10) & 0x1F;
    let mantissa = (bits & 0x3FF) as f64;
    let magnitude = match exponent {
        0 => mantissa * 2f64.powi(-24),
        31 if mantissa == 0.0 => f64::INFINITY,
        31 => f64::NAN,
        e => (mantissa + 1024.0) * 2f64.powi(e as i32 - 25),
    };
    if bits & 0x8000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}
