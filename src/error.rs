//! Error types for navigating and querying encoded items.
//!
//! This module contains the [`Error`] type which represents all possible errors
//! that can occur while measuring, decoding or querying an encoded document.
//!
//! # Example
//!
//! ```
//! use na_cbor::{Error, Reader, Result};
//!
//! fn first_int(data: &Vec<u8>) -> Result<Option<u64>> {
//!     match Reader::new(data).value_at(0) {
//!         Ok(value) => value.as_u64().map(Some),
//!         Err(Error::EndOfFile { .. }) => Ok(None),
//!         Err(e) => Err(e),
//!     }
//! }
//!
//! assert_eq!(first_int(&vec![0x05]).unwrap(), Some(5));
//! assert_eq!(first_int(&vec![]).unwrap(), None);
//! ```

use std::fmt::{self, Display};

use crate::ValueType;

/// Alias for a `Result` with the error type [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// This type represents all possible errors that can occur when reading
/// encoded items or evaluating a query over them.
///
/// Every variant that concerns a specific item carries the byte offset of
/// that item so failures can be located in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A read ran past the end of the byte source.
    EndOfFile { offset: usize },

    /// An explicit stream or sequence index lies beyond the available items.
    IndexOutOfRange {
        offset: usize,
        index: usize,
        len: usize,
    },

    /// A header uses a reserved length selector (28-30), or the indefinite
    /// selector on a major type that has no indefinite form.
    InvalidSelector { offset: usize, selector: u8 },

    /// A length, count or item size does not fit the platform's `usize`.
    SizeOverflow { offset: usize },

    /// A terminator byte was found where an item was required.
    UnexpectedBreak { offset: usize },

    /// A chunk inside an indefinite-length string is not a definite string
    /// of the same major type.
    InvalidChunk {
        offset: usize,
        expected: ValueType,
        actual: ValueType,
    },

    /// The item at `offset` is not of the type the operation requires.
    TypeMismatch {
        offset: usize,
        expected: ValueType,
        actual: ValueType,
    },

    /// A text string payload is not valid UTF-8.
    InvalidUtf8 { offset: usize },

    /// An integer does not fit the requested native type.
    IntegerOverflow { offset: usize },

    /// An item is nested deeper than [`MAX_NESTING`](crate::MAX_NESTING)
    /// levels below the item being decoded.
    DepthLimit { offset: usize },

    /// A projection was assembled inconsistently.
    Projection(&'static str),
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::EndOfFile { offset } => {
                write!(formatter, "unexpected end of input at offset {offset}")
            }
            Error::IndexOutOfRange { offset, index, len } => write!(
                formatter,
                "index {index} out of range for {len} items at offset {offset}"
            ),
            Error::InvalidSelector { offset, selector } => write!(
                formatter,
                "invalid length selector {selector} at offset {offset}"
            ),
            Error::SizeOverflow { offset } => {
                write!(formatter, "item size overflows usize at offset {offset}")
            }
            Error::UnexpectedBreak { offset } => {
                write!(formatter, "unexpected break byte at offset {offset}")
            }
            Error::InvalidChunk {
                offset,
                expected,
                actual,
            } => write!(
                formatter,
                "invalid chunk in indefinite string at offset {offset}: expected {expected}, got {actual}"
            ),
            Error::TypeMismatch {
                offset,
                expected,
                actual,
            } => write!(
                formatter,
                "type mismatch at offset {offset}: expected {expected}, got {actual}"
            ),
            Error::InvalidUtf8 { offset } => {
                write!(formatter, "invalid utf-8 in text string at offset {offset}")
            }
            Error::IntegerOverflow { offset } => {
                write!(formatter, "integer out of range at offset {offset}")
            }
            Error::DepthLimit { offset } => write!(
                formatter,
                "nesting deeper than {} levels at offset {offset}",
                crate::MAX_NESTING
            ),
            Error::Projection(message) => write!(formatter, "projection error: {message}"),
        }
    }
}

impl std::error::Error for Error {}
