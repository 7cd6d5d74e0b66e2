use zerocopy::byteorder::{BigEndian, F32, F64};

use crate::{
    MajorType,
    header::{
        BREAK, FLOAT_DOUBLE, FLOAT_SINGLE, SIMPLE_FALSE, SIMPLE_NULL, SIMPLE_TRUE,
        SIMPLE_UNDEFINED, write_header, write_indefinite,
    },
};

/// A fully decoded item, independent of any byte source.
///
/// Dictionaries keep their entries in encoded order, duplicates included.
#[derive(Clone, Debug, PartialEq)]
pub enum Object {
    Null,
    Undefined,
    Bool(bool),
    Integer(i128),
    Float(f64),
    Bytes(Vec<u8>),
    Text(String),
    Sequence(Vec<Object>),
    Dictionary(Vec<(Object, Object)>),
    Tagged(u64, Box<Object>),
    Simple(u8),
}

impl Object {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    #[inline]
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Object::Integer(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Object::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Object::Text(text) => Some(text),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Object::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    #[inline]
    pub fn as_sequence(&self) -> Option<&[Object]> {
        match self {
            Object::Sequence(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    pub fn as_dictionary(&self) -> Option<&[(Object, Object)]> {
        match self {
            Object::Dictionary(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up a text key in a dictionary object.
    pub fn get(&self, key: &str) -> Option<&Object> {
        self.as_dictionary()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Encodes this object.
    ///
    /// The output uses definite lengths and shortest headers. Integers beyond
    /// the 64-bit magnitude range are written as big-integer tags 2/3 and
    /// floats as single precision when that is lossless.
    pub fn write_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write(&mut buf);
        buf
    }

    pub fn write(&self, dst: &mut Vec<u8>) {
        match self {
            Object::Null => dst.push(simple_byte(SIMPLE_NULL)),
            Object::Undefined => dst.push(simple_byte(SIMPLE_UNDEFINED)),
            Object::Bool(false) => dst.push(simple_byte(SIMPLE_FALSE)),
            Object::Bool(true) => dst.push(simple_byte(SIMPLE_TRUE)),
            Object::Integer(n) => write_integer(dst, *n),
            Object::Float(f) => write_float(dst, *f),
            Object::Bytes(bytes) => {
                write_header(dst, MajorType::Bytes, bytes.len() as u64);
                dst.extend_from_slice(bytes);
            }
            Object::Text(text) => {
                write_header(dst, MajorType::Text, text.len() as u64);
                dst.extend_from_slice(text.as_bytes());
            }
            Object::Sequence(items) => {
                write_header(dst, MajorType::Sequence, items.len() as u64);
                for item in items {
                    item.write(dst);
                }
            }
            Object::Dictionary(entries) => {
                write_header(dst, MajorType::Dictionary, entries.len() as u64);
                for (key, value) in entries {
                    key.write(dst);
                    value.write(dst);
                }
            }
            Object::Tagged(tag, content) => {
                write_header(dst, MajorType::Tag, *tag);
                content.write(dst);
            }
            Object::Simple(value) => write_header(dst, MajorType::Simple, *value as u64),
        }
    }

    /// Encodes this object with indefinite lengths for every string and
    /// container. Strings are emitted as a single chunk.
    pub fn write_indefinite_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_indefinite(&mut buf);
        buf
    }

    fn write_indefinite(&self, dst: &mut Vec<u8>) {
        match self {
            Object::Bytes(_) | Object::Text(_) => {
                let major = if matches!(self, Object::Bytes(_)) {
                    MajorType::Bytes
                } else {
                    MajorType::Text
                };
                write_indefinite(dst, major);
                self.write(dst);
                dst.push(BREAK);
            }
            Object::Sequence(items) => {
                write_indefinite(dst, MajorType::Sequence);
                for item in items {
                    item.write_indefinite(dst);
                }
                dst.push(BREAK);
            }
            Object::Dictionary(entries) => {
                write_indefinite(dst, MajorType::Dictionary);
                for (key, value) in entries {
                    key.write_indefinite(dst);
                    value.write_indefinite(dst);
                }
                dst.push(BREAK);
            }
            Object::Tagged(tag, content) => {
                write_header(dst, MajorType::Tag, *tag);
                content.write_indefinite(dst);
            }
            _ => self.write(dst),
        }
    }
}

#[inline]
fn simple_byte(code: u8) -> u8 {
    ((MajorType::Simple as u8) << 5) | code
}

fn write_integer(dst: &mut Vec<u8>, n: i128) {
    if let Ok(value) = u64::try_from(n) {
        write_header(dst, MajorType::Unsigned, value);
    } else if let Ok(value) = u64::try_from(-1 - n) {
        write_header(dst, MajorType::Negative, value);
    } else {
        let (tag, magnitude) = if n < 0 {
            (3, (-1 - n) as u128)
        } else {
            (2, n as u128)
        };
        let bytes = magnitude.to_be_bytes();
        let first = bytes.iter().position(|byte| *byte != 0).unwrap_or(bytes.len());
        write_header(dst, MajorType::Tag, tag);
        write_header(dst, MajorType::Bytes, (bytes.len() - first) as u64);
        dst.extend_from_slice(&bytes[first..]);
    }
}

fn write_float(dst: &mut Vec<u8>, f: f64) {
    let narrow = f as f32;
    if narrow as f64 == f || f.is_nan() {
        dst.push(simple_byte(FLOAT_SINGLE));
        dst.extend_from_slice(&F32::<BigEndian>::new(narrow).to_bytes());
    } else {
        dst.push(simple_byte(FLOAT_DOUBLE));
        dst.extend_from_slice(&F64::<BigEndian>::new(f).to_bytes());
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::Bool(value)
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Object::Integer(value as i128)
    }
}

impl From<i32> for Object {
    fn from(value: i32) -> Self {
        Object::Integer(value as i128)
    }
}

impl From<u64> for Object {
    fn from(value: u64) -> Self {
        Object::Integer(value as i128)
    }
}

impl From<i128> for Object {
    fn from(value: i128) -> Self {
        Object::Integer(value)
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Object::Float(value)
    }
}

impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Object::Text(value.to_owned())
    }
}

impl From<String> for Object {
    fn from(value: String) -> Self {
        Object::Text(value)
    }
}

impl From<Vec<u8>> for Object {
    fn from(value: Vec<u8>) -> Self {
        Object::Bytes(value)
    }
}

impl From<Vec<Object>> for Object {
    fn from(value: Vec<Object>) -> Self {
        Object::Sequence(value)
    }
}
