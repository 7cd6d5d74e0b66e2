//! Item geometry: sizes and element counts computed straight from the bytes.
//!
//! Nothing here decodes a value. Sizes of nested containers are found by
//! walking headers with an explicit work stack, so arbitrarily deep input
//! cannot exhaust the call stack.

use crate::{
    ByteSource, Error, Header, MajorType, Result, ValueType, cold_path,
    header::BREAK,
    util::{advance, to_usize},
};

/// Total encoded size in bytes of the item at `offset`, including every
/// nested child and, for indefinite items, the closing terminator.
pub fn item_size<S: ByteSource + ?Sized>(source: &S, offset: usize) -> Result<usize> {
    Ok(skip(source, offset)? - offset)
}

/// Offset of the first byte after the item at `offset`.
pub fn skip<S: ByteSource + ?Sized>(source: &S, offset: usize) -> Result<usize> {
    // Work remaining for each open container
    enum Pending {
        // Definite container with this many items left
        Items(usize),
        // Indefinite container, closed by a break byte
        Indefinite,
        // Indefinite string, chunks must share this major type
        Chunks(MajorType),
    }

    let mut stack: Vec<Pending> = Vec::new();
    let mut position = offset;

    loop {
        match stack.last() {
            Some(Pending::Chunks(major)) => {
                let major = *major;
                if source.read_one(position)? == BREAK {
                    position = advance(position, 1, offset)?;
                    stack.pop();
                } else {
                    let chunk = Header::read(source, position)?;
                    if chunk.major != major || chunk.is_indefinite() {
                        cold_path();
                        return Err(Error::InvalidChunk {
                            offset: position,
                            expected: ValueType::of_major(major),
                            actual: ValueType::of_major(chunk.major),
                        });
                    }
                    let len = chunk.length(position)?;
                    let start = position;
                    position = advance(advance(position, chunk.size, offset)?, len, offset)?;
                    if position > source.len() {
                        cold_path();
                        return Err(Error::EndOfFile { offset: start });
                    }
                    continue;
                }
            }
            Some(Pending::Indefinite) if source.read_one(position)? == BREAK => {
                position = advance(position, 1, offset)?;
                stack.pop();
            }
            _ => {
                let header = Header::read(source, position)?;
                let start = position;
                position = advance(position, header.size, offset)?;

                let opened = match header.major {
                    MajorType::Bytes | MajorType::Text if header.is_indefinite() => {
                        Some(Pending::Chunks(header.major))
                    }
                    MajorType::Bytes | MajorType::Text => {
                        position = advance(position, header.length(start)?, offset)?;
                        if position > source.len() {
                            cold_path();
                            return Err(Error::EndOfFile { offset: start });
                        }
                        None
                    }
                    MajorType::Sequence | MajorType::Dictionary if header.is_indefinite() => {
                        Some(Pending::Indefinite)
                    }
                    MajorType::Sequence | MajorType::Dictionary => {
                        let mut items = header.length(start)?;
                        if header.major == MajorType::Dictionary {
                            items = items
                                .checked_mul(2)
                                .ok_or(Error::SizeOverflow { offset: start })?;
                        }
                        (items > 0).then_some(Pending::Items(items))
                    }
                    MajorType::Tag => Some(Pending::Items(1)),
                    MajorType::Unsigned | MajorType::Negative | MajorType::Simple => None,
                };

                if let Some(pending) = opened {
                    stack.push(pending);
                    continue;
                }
            }
        }

        // An item just completed; account for it in its parent.
        loop {
            match stack.last_mut() {
                None => return Ok(position),
                Some(Pending::Items(left)) => {
                    *left -= 1;
                    if *left == 0 {
                        stack.pop();
                    } else {
                        break;
                    }
                }
                Some(Pending::Indefinite) | Some(Pending::Chunks(_)) => break,
            }
        }
    }
}

/// Number of elements in the container at `offset`: items for a sequence,
/// key/value pairs for a dictionary.
///
/// Definite containers answer from the header; indefinite ones are scanned
/// up to their terminator.
pub fn element_count<S: ByteSource + ?Sized>(source: &S, offset: usize) -> Result<usize> {
    let header = Header::read(source, offset)?;
    if !header.major.is_container() {
        cold_path();
        return Err(Error::TypeMismatch {
            offset,
            expected: ValueType::Sequence,
            actual: ValueType::of_major(header.major),
        });
    }

    if !header.is_indefinite() {
        return to_usize(header.argument, offset);
    }

    let mut position = advance(offset, header.size, offset)?;
    let mut count = 0usize;
    while source.read_one(position)? != BREAK {
        position = skip(source, position)?;
        count += 1;
    }

    if header.major == MajorType::Dictionary {
        if count % 2 != 0 {
            cold_path();
            return Err(Error::UnexpectedBreak { offset: position });
        }
        count /= 2;
    }
    Ok(count)
}

/// Payload span of the definite string at `offset` as `(start, len)`.
pub(crate) fn string_span<S: ByteSource + ?Sized>(
    source: &S,
    offset: usize,
    header: &Header,
) -> Result<(usize, usize)> {
    let start = advance(offset, header.size, offset)?;
    let len = header.length(offset)?;
    if start.checked_add(len).is_none_or(|end| end > source.len()) {
        cold_path();
        return Err(Error::EndOfFile { offset: start });
    }
    Ok((start, len))
}
