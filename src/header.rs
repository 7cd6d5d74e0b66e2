use zerocopy::byteorder::{BigEndian, U16, U32, U64};

use crate::{
    ByteSource, Error, Result, cold_path,
    source::{read_u8, read_u16, read_u32, read_u64},
    util::to_usize,
};

/// The reserved terminator closing an indefinite-length item.
pub const BREAK: u8 = 0xFF;

/// Length selector announcing an indefinite-length item.
pub const INDEFINITE: u8 = 31;

pub const SIMPLE_FALSE: u8 = 20;
pub const SIMPLE_TRUE: u8 = 21;
pub const SIMPLE_NULL: u8 = 22;
pub const SIMPLE_UNDEFINED: u8 = 23;
pub const SIMPLE_EXTENDED: u8 = 24;
pub const FLOAT_HALF: u8 = 25;
pub const FLOAT_SINGLE: u8 = 26;
pub const FLOAT_DOUBLE: u8 = 27;

/// The 3-bit major type stored in the top bits of every header byte.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum MajorType {
    Unsigned = 0,
    Negative = 1,
    Bytes = 2,
    Text = 3,
    Sequence = 4,
    Dictionary = 5,
    Tag = 6,
    Simple = 7,
}

impl MajorType {
    /// Extracts the major type from a header byte.
    #[inline]
    pub const fn from_header_byte(byte: u8) -> Self {
        match byte >> 5 {
            0 => Self::Unsigned,
            1 => Self::Negative,
            2 => Self::Bytes,
            3 => Self::Text,
            4 => Self::Sequence,
            5 => Self::Dictionary,
            6 => Self::Tag,
            _ => Self::Simple,
        }
    }

    /// Returns `true` for byte and text strings.
    pub const fn is_string(self) -> bool {
        matches!(self, Self::Bytes | Self::Text)
    }

    /// Returns `true` for sequences and dictionaries.
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Sequence | Self::Dictionary)
    }

    /// Returns `true` if this major type has an indefinite-length form.
    pub const fn allows_indefinite(self) -> bool {
        self.is_string() || self.is_container()
    }
}

/// Number of header bytes implied by a length selector, or `None` if reserved.
///
/// The indefinite selector occupies a single byte.
#[inline]
pub const fn header_size(selector: u8) -> Option<usize> {
    match selector {
        0..=23 | INDEFINITE => Some(1),
        24 => Some(2),
        25 => Some(3),
        26 => Some(5),
        27 => Some(9),
        _ => None,
    }
}

/// A decoded item header.
///
/// Headers are read on demand and never stored; they are small `Copy` values.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Header {
    pub major: MajorType,
    /// The raw 5-bit length selector.
    pub selector: u8,
    /// Inline or trailing argument: a value, length, count, tag number or
    /// raw float bits. Zero for indefinite items.
    pub argument: u64,
    /// Header length in bytes.
    pub size: usize,
}

impl Header {
    /// Reads the header at `offset`.
    ///
    /// A terminator byte is rejected with [`Error::UnexpectedBreak`]; callers
    /// scanning indefinite containers check for it before calling this.
    pub fn read<S: ByteSource + ?Sized>(source: &S, offset: usize) -> Result<Self> {
        let byte = source.read_one(offset)?;
        if byte == BREAK {
            cold_path();
            return Err(Error::UnexpectedBreak { offset });
        }

        let major = MajorType::from_header_byte(byte);
        let selector = byte & 0x1F;
        let payload = offset + 1;

        let (argument, size) = match selector {
            0..=23 => (selector as u64, 1),
            24 => (read_u8(source, payload)? as u64, 2),
            25 => (read_u16(source, payload)? as u64, 3),
            26 => (read_u32(source, payload)? as u64, 5),
            27 => (read_u64(source, payload)?, 9),
            INDEFINITE if major.allows_indefinite() => (0, 1),
            _ => {
                cold_path();
                return Err(Error::InvalidSelector { offset, selector });
            }
        };

        Ok(Self {
            major,
            selector,
            argument,
            size,
        })
    }

    #[inline]
    pub fn is_indefinite(&self) -> bool {
        self.selector == INDEFINITE
    }

    /// The argument as a length or count, failing if it does not fit `usize`.
    #[inline]
    pub fn length(&self, offset: usize) -> Result<usize> {
        to_usize(self.argument, offset)
    }
}

/// Appends the shortest header encoding `argument` under `major`.
pub fn write_header(dst: &mut Vec<u8>, major: MajorType, argument: u64) {
    let high = (major as u8) << 5;
    if argument < 24 {
        dst.push(high | argument as u8);
    } else if let Ok(value) = u8::try_from(argument) {
        dst.extend_from_slice(&[high | 24, value]);
    } else if let Ok(value) = u16::try_from(argument) {
        dst.push(high | 25);
        dst.extend_from_slice(&U16::<BigEndian>::new(value).to_bytes());
    } else if let Ok(value) = u32::try_from(argument) {
        dst.push(high | 26);
        dst.extend_from_slice(&U32::<BigEndian>::new(value).to_bytes());
    } else {
        dst.push(high | 27);
        dst.extend_from_slice(&U64::<BigEndian>::new(argument).to_bytes());
    }
}

/// Appends an indefinite-length header; the caller closes it with [`BREAK`].
#[inline]
pub fn write_indefinite(dst: &mut Vec<u8>, major: MajorType) {
    debug_assert!(major.allows_indefinite());
    dst.push(((major as u8) << 5) | INDEFINITE);
}
