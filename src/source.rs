//! Addressable byte sources and big-endian fixed-width access.
//!
//! Everything in this crate reads through [`ByteSource`]. The core never
//! mutates a source, so one source can back any number of concurrent
//! evaluations as long as the implementation tolerates concurrent reads.

use std::{borrow::Cow, sync::Arc};

use zerocopy::byteorder::{BigEndian, F32, F64, U16, U32, U64};

use crate::{Error, Result, cold_path};

/// An offset-indexed, read-only byte provider.
///
/// Implementations only need [`len`](ByteSource::len) and
/// [`read`](ByteSource::read). Contiguous sources should also override
/// [`slice`](ByteSource::slice) so payloads can be borrowed instead of copied.
pub trait ByteSource: Send + Sync {
    /// Number of addressable bytes.
    fn len(&self) -> usize;

    /// Copies bytes starting at `offset` into `dst` and returns how many were copied.
    ///
    /// Fewer than `dst.len()` bytes are copied only when the source ends first.
    fn read(&self, dst: &mut [u8], offset: usize) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the single byte at `offset`.
    #[inline]
    fn read_one(&self, offset: usize) -> Result<u8> {
        let mut byte = [0u8];
        if self.read(&mut byte, offset) == 1 {
            Ok(byte[0])
        } else {
            cold_path();
            Err(Error::EndOfFile { offset })
        }
    }

    #[inline]
    fn is_valid_offset(&self, offset: usize) -> bool {
        offset < self.len()
    }

    /// Borrows `len` bytes at `offset` if the source stores them contiguously.
    #[inline]
    fn slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let _ = (offset, len);
        None
    }
}

impl ByteSource for [u8] {
    #[inline]
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    #[inline]
    fn read(&self, dst: &mut [u8], offset: usize) -> usize {
        let Some(available) = self.get(offset..) else {
            return 0;
        };
        let n = dst.len().min(available.len());
        dst[..n].copy_from_slice(&available[..n]);
        n
    }

    #[inline]
    fn read_one(&self, offset: usize) -> Result<u8> {
        match self.get(offset) {
            Some(byte) => Ok(*byte),
            None => {
                cold_path();
                Err(Error::EndOfFile { offset })
            }
        }
    }

    #[inline]
    fn slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.get(offset..offset.checked_add(len)?)
    }
}

impl<const N: usize> ByteSource for [u8; N] {
    #[inline]
    fn len(&self) -> usize {
        N
    }

    #[inline]
    fn read(&self, dst: &mut [u8], offset: usize) -> usize {
        self.as_slice().read(dst, offset)
    }

    #[inline]
    fn read_one(&self, offset: usize) -> Result<u8> {
        self.as_slice().read_one(offset)
    }

    #[inline]
    fn slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.as_slice().slice(offset, len)
    }
}

impl ByteSource for Vec<u8> {
    #[inline]
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    #[inline]
    fn read(&self, dst: &mut [u8], offset: usize) -> usize {
        self.as_slice().read(dst, offset)
    }

    #[inline]
    fn read_one(&self, offset: usize) -> Result<u8> {
        self.as_slice().read_one(offset)
    }

    #[inline]
    fn slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.as_slice().slice(offset, len)
    }
}

macro_rules! forward_source {
    ($($t:ty),*) => {$(
        impl<T: ByteSource + ?Sized> ByteSource for $t {
            #[inline]
            fn len(&self) -> usize {
                (**self).len()
            }

            #[inline]
            fn read(&self, dst: &mut [u8], offset: usize) -> usize {
                (**self).read(dst, offset)
            }

            #[inline]
            fn read_one(&self, offset: usize) -> Result<u8> {
                (**self).read_one(offset)
            }

            #[inline]
            fn is_valid_offset(&self, offset: usize) -> bool {
                (**self).is_valid_offset(offset)
            }

            #[inline]
            fn slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
                (**self).slice(offset, len)
            }
        }
    )*};
}

forward_source!(&T, Box<T>, Arc<T>);

#[cfg(feature = "shared")]
impl ByteSource for bytes::Bytes {
    #[inline]
    fn len(&self) -> usize {
        self.as_ref().len()
    }

    #[inline]
    fn read(&self, dst: &mut [u8], offset: usize) -> usize {
        self.as_ref().read(dst, offset)
    }

    #[inline]
    fn read_one(&self, offset: usize) -> Result<u8> {
        self.as_ref().read_one(offset)
    }

    #[inline]
    fn slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.as_ref().slice(offset, len)
    }
}

/// A byte source split into fixed-size chunks.
///
/// Every chunk except the last holds exactly `chunk_size` bytes. Reads may
/// span chunk boundaries; [`slice`](ByteSource::slice) only succeeds when the
/// requested range lies inside one chunk.
#[derive(Clone, Debug)]
pub struct ChunkedSource {
    chunks: Vec<Box<[u8]>>,
    chunk_size: usize,
    len: usize,
}

impl ChunkedSource {
    /// Splits `data` into chunks of `chunk_size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn new(data: &[u8], chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be non-zero");
        Self {
            chunks: data.chunks(chunk_size).map(Box::from).collect(),
            chunk_size,
            len: data.len(),
        }
    }

    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

impl ByteSource for ChunkedSource {
    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    fn read(&self, dst: &mut [u8], offset: usize) -> usize {
        let mut copied = 0;
        let mut position = offset;
        while copied < dst.len() && position < self.len {
            let chunk = &self.chunks[position / self.chunk_size];
            let start = position % self.chunk_size;
            let n = (dst.len() - copied).min(chunk.len() - start);
            dst[copied..copied + n].copy_from_slice(&chunk[start..start + n]);
            copied += n;
            position += n;
        }
        copied
    }

    #[inline]
    fn read_one(&self, offset: usize) -> Result<u8> {
        match self
            .chunks
            .get(offset / self.chunk_size)
            .and_then(|chunk| chunk.get(offset % self.chunk_size))
        {
            Some(byte) => Ok(*byte),
            None => {
                cold_path();
                Err(Error::EndOfFile { offset })
            }
        }
    }

    fn slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let chunk = self.chunks.get(offset / self.chunk_size)?;
        let start = offset % self.chunk_size;
        chunk.get(start..start.checked_add(len)?)
    }
}

/// Reads exactly `N` bytes at `offset`.
#[inline]
pub fn read_array<const N: usize, S: ByteSource + ?Sized>(
    source: &S,
    offset: usize,
) -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    if source.read(&mut bytes, offset) == N {
        Ok(bytes)
    } else {
        cold_path();
        Err(Error::EndOfFile { offset })
    }
}

/// Reads `len` bytes at `offset`, borrowing when the source allows it.
pub fn read_bytes<'s, S: ByteSource + ?Sized>(
    source: &'s S,
    offset: usize,
    len: usize,
) -> Result<Cow<'s, [u8]>> {
    if let Some(bytes) = source.slice(offset, len) {
        return Ok(Cow::Borrowed(bytes));
    }
    if offset.checked_add(len).is_none_or(|end| end > source.len()) {
        cold_path();
        return Err(Error::EndOfFile { offset });
    }
    let mut bytes = vec![0u8; len];
    if source.read(&mut bytes, offset) != len {
        cold_path();
        return Err(Error::EndOfFile { offset });
    }
    Ok(Cow::Owned(bytes))
}

#[inline]
pub fn read_u8<S: ByteSource + ?Sized>(source: &S, offset: usize) -> Result<u8> {
    source.read_one(offset)
}

#[inline]
pub fn read_u16<S: ByteSource + ?Sized>(source: &S, offset: usize) -> Result<u16> {
    Ok(U16::<BigEndian>::from_bytes(read_array(source, offset)?).get())
}

#[inline]
pub fn read_u32<S: ByteSource + ?Sized>(source: &S, offset: usize) -> Result<u32> {
    Ok(U32::<BigEndian>::from_bytes(read_array(source, offset)?).get())
}

#[inline]
pub fn read_u64<S: ByteSource + ?Sized>(source: &S, offset: usize) -> Result<u64> {
    Ok(U64::<BigEndian>::from_bytes(read_array(source, offset)?).get())
}

#[inline]
pub fn read_f32<S: ByteSource + ?Sized>(source: &S, offset: usize) -> Result<f32> {
    Ok(F32::<BigEndian>::from_bytes(read_array(source, offset)?).get())
}

#[inline]
pub fn read_f64<S: ByteSource + ?Sized>(source: &S, offset: usize) -> Result<f64> {
    Ok(F64::<BigEndian>::from_bytes(read_array(source, offset)?).get())
}

#[inline]
fn write_array<const N: usize>(dst: &mut [u8], offset: usize, bytes: [u8; N]) -> Result<()> {
    match offset
        .checked_add(N)
        .and_then(|end| dst.get_mut(offset..end))
    {
        Some(target) => {
            target.copy_from_slice(&bytes);
            Ok(())
        }
        None => {
            cold_path();
            Err(Error::EndOfFile { offset })
        }
    }
}

#[inline]
pub fn write_u8(dst: &mut [u8], offset: usize, value: u8) -> Result<()> {
    write_array(dst, offset, [value])
}

#[inline]
pub fn write_u16(dst: &mut [u8], offset: usize, value: u16) -> Result<()> {
    write_array(dst, offset, U16::<BigEndian>::new(value).to_bytes())
}

#[inline]
pub fn write_u32(dst: &mut [u8], offset: usize, value: u32) -> Result<()> {
    write_array(dst, offset, U32::<BigEndian>::new(value).to_bytes())
}

#[inline]
pub fn write_u64(dst: &mut [u8], offset: usize, value: u64) -> Result<()> {
    write_array(dst, offset, U64::<BigEndian>::new(value).to_bytes())
}

#[inline]
pub fn write_f32(dst: &mut [u8], offset: usize, value: f32) -> Result<()> {
    write_array(dst, offset, F32::<BigEndian>::new(value).to_bytes())
}

#[inline]
pub fn write_f64(dst: &mut [u8], offset: usize, value: f64) -> Result<()> {
    write_array(dst, offset, F64::<BigEndian>::new(value).to_bytes())
}
