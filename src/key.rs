use crate::{MajorType, Object, Result, Value};

mod private {
    pub trait Sealed {}
    impl Sealed for str {}
    impl Sealed for String {}
    impl Sealed for u64 {}
    impl Sealed for i64 {}
    impl Sealed for i32 {}
    impl Sealed for f64 {}
    impl Sealed for super::KeyLiteral {}
    impl<T> Sealed for &T where T: ?Sized + Sealed {}
}

/// Something a dictionary key can be compared against.
///
/// Implemented for strings, integers and floats. Comparison is by decoded
/// value: the integer key `1` matches `0x01` and `0x18 0x01` alike.
pub trait Key: private::Sealed {
    #[doc(hidden)]
    fn matches(&self, candidate: &Value<'_>) -> Result<bool>;

    /// An owned copy of this key, for storing inside a compiled query.
    #[doc(hidden)]
    fn to_literal(&self) -> KeyLiteral;
}

/// An owned dictionary key.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyLiteral {
    Text(String),
    Integer(i128),
    Float(f64),
}

impl KeyLiteral {
    pub fn to_object(&self) -> Object {
        match self {
            KeyLiteral::Text(text) => Object::Text(text.clone()),
            KeyLiteral::Integer(n) => Object::Integer(*n),
            KeyLiteral::Float(f) => Object::Float(*f),
        }
    }
}

#[inline]
fn text_matches(key: &str, candidate: &Value<'_>) -> Result<bool> {
    if candidate.major_type() != MajorType::Text {
        return Ok(false);
    }
    Ok(candidate.text_bytes()?.as_ref() == key.as_bytes())
}

#[inline]
fn integer_matches(key: i128, candidate: &Value<'_>) -> Result<bool> {
    match candidate.major_type() {
        MajorType::Unsigned | MajorType::Negative => Ok(candidate.as_i128()? == key),
        _ => Ok(false),
    }
}

#[inline]
fn float_matches(key: f64, candidate: &Value<'_>) -> Result<bool> {
    if candidate.major_type() != MajorType::Simple {
        return Ok(false);
    }
    match candidate.as_f64() {
        Ok(value) => Ok(value == key),
        Err(_) => Ok(false),
    }
}

impl Key for str {
    #[inline]
    fn matches(&self, candidate: &Value<'_>) -> Result<bool> {
        text_matches(self, candidate)
    }

    fn to_literal(&self) -> KeyLiteral {
        KeyLiteral::Text(self.to_owned())
    }
}

impl Key for String {
    #[inline]
    fn matches(&self, candidate: &Value<'_>) -> Result<bool> {
        text_matches(self, candidate)
    }

    fn to_literal(&self) -> KeyLiteral {
        KeyLiteral::Text(self.clone())
    }
}

impl Key for u64 {
    #[inline]
    fn matches(&self, candidate: &Value<'_>) -> Result<bool> {
        integer_matches(*self as i128, candidate)
    }

    fn to_literal(&self) -> KeyLiteral {
        KeyLiteral::Integer(*self as i128)
    }
}

impl Key for i64 {
    #[inline]
    fn matches(&self, candidate: &Value<'_>) -> Result<bool> {
        integer_matches(*self as i128, candidate)
    }

    fn to_literal(&self) -> KeyLiteral {
        KeyLiteral::Integer(*self as i128)
    }
}

impl Key for i32 {
    #[inline]
    fn matches(&self, candidate: &Value<'_>) -> Result<bool> {
        integer_matches(*self as i128, candidate)
    }

    fn to_literal(&self) -> KeyLiteral {
        KeyLiteral::Integer(*self as i128)
    }
}

impl Key for f64 {
    #[inline]
    fn matches(&self, candidate: &Value<'_>) -> Result<bool> {
        float_matches(*self, candidate)
    }

    fn to_literal(&self) -> KeyLiteral {
        KeyLiteral::Float(*self)
    }
}

impl Key for KeyLiteral {
    fn matches(&self, candidate: &Value<'_>) -> Result<bool> {
        match self {
            KeyLiteral::Text(text) => text_matches(text, candidate),
            KeyLiteral::Integer(n) => integer_matches(*n, candidate),
            KeyLiteral::Float(f) => float_matches(*f, candidate),
        }
    }

    fn to_literal(&self) -> KeyLiteral {
        self.clone()
    }
}

impl<T: ?Sized + Key> Key for &T {
    #[inline]
    fn matches(&self, candidate: &Value<'_>) -> Result<bool> {
        (**self).matches(candidate)
    }

    #[inline]
    fn to_literal(&self) -> KeyLiteral {
        (**self).to_literal()
    }
}
