use std::{fmt, sync::Arc};

use crate::{
    ByteSource, Cursor, Error, Key, KeyLiteral, MajorType, Object, Result, Value, ValueType,
    cold_path,
    container::{container_header, walk_children},
    geometry,
    header::BREAK,
    util::advance,
};

use super::engine::{Context, Enumeration, VisitResult};

/// A predicate over candidate items.
pub type Predicate = Arc<dyn Fn(&Value<'_>) -> bool + Send + Sync>;

/// One unit of query behavior.
///
/// Stages are plain data. Anything that changes while a query runs (the
/// cursor, enumeration positions, open projections) lives in the per-run
/// context, so one stage can be applied by many runs at once.
#[derive(Clone)]
pub enum Stage {
    /// Select the top-level item with this index.
    Stream(usize),
    /// Enumerate every top-level item.
    AnyStream,
    /// Select a sequence element through a container index.
    SequenceIndex(usize),
    /// Select a sequence element by skipping its predecessors.
    SequenceSkip(usize),
    /// Enumerate every sequence element the predicate accepts.
    SequenceMatch(Predicate),
    /// Select a dictionary value through a container index.
    DictionaryKey(KeyLiteral),
    /// Select a dictionary value by scanning pairs in place.
    DictionaryScan(KeyLiteral),
    /// Select the value of the first key the predicate accepts.
    DictionaryMatch(Predicate),
    /// Assert the type of the current item. Optional assertions turn a
    /// mismatch into a miss instead of an error.
    TypeMatch { expected: ValueType, optional: bool },
    BeginSequence,
    BeginDictionary,
    /// Start a projected dictionary entry.
    Entry(Object),
    /// Start a projected sequence element.
    Element,
    EndSequence,
    EndDictionary,
    /// Hand the current item to the projection or the consumer.
    Consume,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Stream(_) => "stream",
            Stage::AnyStream => "any_stream",
            Stage::SequenceIndex(_) => "sequence_index",
            Stage::SequenceSkip(_) => "sequence_skip",
            Stage::SequenceMatch(_) => "sequence_match",
            Stage::DictionaryKey(_) => "dictionary_key",
            Stage::DictionaryScan(_) => "dictionary_scan",
            Stage::DictionaryMatch(_) => "dictionary_match",
            Stage::TypeMatch { optional: false, .. } => "require_type",
            Stage::TypeMatch { optional: true, .. } => "null_or_type",
            Stage::BeginSequence => "begin_sequence",
            Stage::BeginDictionary => "begin_dictionary",
            Stage::Entry(_) => "entry",
            Stage::Element => "element",
            Stage::EndSequence => "end_sequence",
            Stage::EndDictionary => "end_dictionary",
            Stage::Consume => "consume",
        }
    }

    /// Selects a top-level item rather than navigating inside one.
    #[inline]
    pub fn is_stream_selector(&self) -> bool {
        matches!(self, Stage::Stream(_) | Stage::AnyStream)
    }

    /// Produces more than one candidate by returning [`VisitResult::Loop`].
    #[inline]
    pub fn is_enumerator(&self) -> bool {
        matches!(self, Stage::AnyStream | Stage::SequenceMatch(_))
    }

    /// Terminates a branch by delivering a result.
    #[inline]
    pub fn is_consume_marker(&self) -> bool {
        matches!(
            self,
            Stage::Consume | Stage::EndSequence | Stage::EndDictionary
        )
    }

    #[inline]
    pub fn is_projection_begin(&self) -> bool {
        matches!(self, Stage::BeginSequence | Stage::BeginDictionary)
    }

    /// The container type this stage fails on when it is missing.
    pub fn asserted_container(&self) -> Option<ValueType> {
        match self {
            Stage::SequenceIndex(_) | Stage::SequenceSkip(_) | Stage::SequenceMatch(_) => {
                Some(ValueType::Sequence)
            }
            Stage::DictionaryKey(_) | Stage::DictionaryScan(_) | Stage::DictionaryMatch(_) => {
                Some(ValueType::Dictionary)
            }
            _ => None,
        }
    }

    pub(crate) fn apply(&self, ctx: &mut Context<'_, '_>) -> Result<VisitResult> {
        match self {
            Stage::Stream(index) => {
                ctx.cursor = ctx.reader.stream_offset(*index)?;
                Ok(VisitResult::Continue)
            }
            Stage::AnyStream => any_stream(ctx),
            Stage::SequenceIndex(index) => {
                ctx.cursor = ctx.reader.sequence_at(ctx.cursor)?.offset_of(*index)?;
                Ok(VisitResult::Continue)
            }
            Stage::SequenceSkip(index) => {
                ctx.cursor = skip_to_element(ctx, *index)?;
                Ok(VisitResult::Continue)
            }
            Stage::SequenceMatch(predicate) => sequence_match(ctx, predicate),
            Stage::DictionaryKey(key) => {
                let dictionary = ctx.reader.dictionary_at(ctx.cursor)?;
                select(ctx, dictionary.get(key)?)
            }
            Stage::DictionaryScan(key) => dictionary_scan(ctx, key),
            Stage::DictionaryMatch(predicate) => {
                let dictionary = ctx.reader.dictionary_at(ctx.cursor)?;
                select(ctx, dictionary.find_key(|key| predicate(key))?)
            }
            Stage::TypeMatch { expected, optional } => {
                let value = ctx.reader.value_at(ctx.cursor)?;
                if expected.accepts(&value) {
                    Ok(VisitResult::Continue)
                } else if *optional {
                    Ok(VisitResult::Break)
                } else {
                    cold_path();
                    Err(Error::TypeMismatch {
                        offset: ctx.cursor,
                        expected: *expected,
                        actual: value.value_type(),
                    })
                }
            }
            Stage::BeginSequence => {
                ctx.projection.begin_sequence(&mut ctx.stack);
                Ok(VisitResult::Continue)
            }
            Stage::BeginDictionary => {
                ctx.projection.begin_dictionary(&mut ctx.stack);
                Ok(VisitResult::Continue)
            }
            Stage::Entry(key) => {
                ctx.projection.put_key(&mut ctx.stack, key.clone())?;
                Ok(VisitResult::Continue)
            }
            Stage::Element => {
                ctx.projection.put_element(&mut ctx.stack)?;
                Ok(VisitResult::Continue)
            }
            Stage::EndSequence => {
                let selection = ctx.projection.end_sequence(&mut ctx.stack)?;
                ctx.emit(selection)
            }
            Stage::EndDictionary => {
                let selection = ctx.projection.end_dictionary(&mut ctx.stack)?;
                ctx.emit(selection)
            }
            Stage::Consume => {
                let value = ctx.reader.value_at(ctx.cursor)?;
                let selection = ctx.projection.finalize(value)?;
                ctx.emit(selection)
            }
        }
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Stream(index) | Stage::SequenceIndex(index) | Stage::SequenceSkip(index) => {
                write!(f, "{}({index})", self.name())
            }
            Stage::DictionaryKey(key) | Stage::DictionaryScan(key) => {
                write!(f, "{}({key:?})", self.name())
            }
            Stage::SequenceMatch(_) | Stage::DictionaryMatch(_) => {
                write!(f, "{}(<predicate>)", self.name())
            }
            Stage::TypeMatch { expected, .. } => write!(f, "{}({expected})", self.name()),
            Stage::Entry(key) => write!(f, "entry({key:?})"),
            _ => f.write_str(self.name()),
        }
    }
}

#[inline]
fn select(ctx: &mut Context<'_, '_>, found: Option<Value<'_>>) -> Result<VisitResult> {
    match found {
        Some(value) => {
            ctx.cursor = value.offset();
            Ok(VisitResult::Continue)
        }
        None => Ok(VisitResult::Break),
    }
}

/// Returns `true` once a container walk has consumed every child.
#[inline]
fn exhausted(source: &dyn ByteSource, position: usize, remaining: Option<usize>) -> Result<bool> {
    Ok(match remaining {
        Some(remaining) => remaining == 0,
        None => source.read_one(position)? == BREAK,
    })
}

fn any_stream(ctx: &mut Context<'_, '_>) -> Result<VisitResult> {
    let source = ctx.reader.source();
    let position = match *ctx.enumeration() {
        Enumeration::Stream { next } => next,
        _ => 0,
    };
    if !source.is_valid_offset(position) {
        return Ok(VisitResult::Break);
    }
    let next = geometry::skip(source, position)?;
    *ctx.enumeration() = Enumeration::Stream { next };
    ctx.cursor = position;
    Ok(VisitResult::Loop)
}

/// Finds element `index` without building a container index. The whole
/// sequence is still measured, so malformed siblings fail the same way an
/// index lookup does.
fn skip_to_element(ctx: &Context<'_, '_>, index: usize) -> Result<usize> {
    let offset = ctx.cursor;
    let header = container_header(&ctx.reader, offset, MajorType::Sequence, ValueType::Sequence)?;
    let mut target = None;
    let mut walked = 0usize;
    let len = walk_children(&ctx.reader, offset, &header, |child| {
        if walked == index {
            target = Some(child);
        }
        walked += 1;
        Ok(())
    })?;
    match target {
        Some(position) => Ok(position),
        None => {
            cold_path();
            Err(Error::IndexOutOfRange { offset, index, len })
        }
    }
}

fn sequence_match(ctx: &mut Context<'_, '_>, predicate: &Predicate) -> Result<VisitResult> {
    let reader = ctx.reader;
    let source = reader.source();
    let (mut next, mut remaining) = match *ctx.enumeration() {
        Enumeration::Elements { next, remaining } => (next, remaining),
        _ => {
            let offset = ctx.cursor;
            let header = container_header(&reader, offset, MajorType::Sequence, ValueType::Sequence)?;
            let remaining = if header.is_indefinite() {
                None
            } else {
                Some(header.length(offset)?)
            };
            (advance(offset, header.size, offset)?, remaining)
        }
    };

    if exhausted(source, next, remaining)? {
        return Ok(VisitResult::Break);
    }
    let mut scratch = Cursor::new(reader.value_at(next)?);
    loop {
        let candidate = next;
        let matched = predicate(scratch.relocate(candidate)?);
        next = geometry::skip(source, candidate)?;
        remaining = remaining.map(|n| n - 1);
        if matched {
            *ctx.enumeration() = Enumeration::Elements { next, remaining };
            ctx.cursor = candidate;
            return Ok(VisitResult::Loop);
        }
        if exhausted(source, next, remaining)? {
            return Ok(VisitResult::Break);
        }
    }
}

/// Looks `key` up by walking the pairs in place. Like [`skip_to_element`]
/// it measures every pair, so it reports what an index lookup would.
fn dictionary_scan(ctx: &mut Context<'_, '_>, key: &KeyLiteral) -> Result<VisitResult> {
    let offset = ctx.cursor;
    let reader = ctx.reader;
    let header = container_header(&reader, offset, MajorType::Dictionary, ValueType::Dictionary)?;
    let mut scratch: Option<Cursor<'_>> = None;
    let mut key_matched = false;
    let mut found = None;
    let mut walked = 0usize;
    walk_children(&reader, offset, &header, |child| {
        let is_key = walked % 2 == 0;
        walked += 1;
        if found.is_some() {
            return Ok(());
        }
        if !is_key {
            if key_matched {
                found = Some(child);
            }
            return Ok(());
        }
        let cursor = match scratch.take() {
            Some(mut cursor) => {
                cursor.relocate(child)?;
                cursor
            }
            None => Cursor::new(reader.value_at(child)?),
        };
        key_matched = key.matches(cursor.value())?;
        scratch = Some(cursor);
        Ok(())
    })?;
    match found {
        Some(value) => {
            ctx.cursor = value;
            Ok(VisitResult::Continue)
        }
        None => Ok(VisitResult::Break),
    }
}
