use crate::{Error, Result};

#[inline(always)]
#[cold]
pub(crate) fn cold_path() {}

/// Converts an encoded length or count to `usize`, failing instead of truncating.
#[inline]
pub(crate) fn to_usize(value: u64, offset: usize) -> Result<usize> {
    match usize::try_from(value) {
        Ok(value) => Ok(value),
        Err(_) => {
            cold_path();
            Err(Error::SizeOverflow { offset })
        }
    }
}

#[inline]
pub(crate) fn advance(position: usize, by: usize, offset: usize) -> Result<usize> {
    match position.checked_add(by) {
        Some(position) => Ok(position),
        None => {
            cold_path();
            Err(Error::SizeOverflow { offset })
        }
    }
}
