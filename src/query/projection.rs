//! How matched items are shaped into results.
//!
//! A [`Projection`] is consulted only by projection marker stages and by the
//! terminal consume stage. Swapping it changes what results look like, never
//! which items a query visits.

use std::fmt;

use crate::{Error, Object, Result, Value, cold_path};

/// One result handed to a query consumer.
#[derive(Clone, Debug)]
pub enum Selection<'s> {
    /// Nothing matched.
    Absent,
    /// A lazy, stream-bound item.
    Value(Value<'s>),
    /// A fully decoded item.
    Object(Object),
    /// A lazily projected sequence.
    Sequence(Vec<Selection<'s>>),
    /// A lazily projected dictionary.
    Dictionary(Vec<(Object, Selection<'s>)>),
}

impl<'s> Selection<'s> {
    #[inline]
    pub fn is_absent(&self) -> bool {
        matches!(self, Selection::Absent)
    }

    #[inline]
    pub fn as_value(&self) -> Option<Value<'s>> {
        match self {
            Selection::Value(value) => Some(*value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Selection::Object(object) => Some(object),
            _ => None,
        }
    }

    #[inline]
    pub fn as_sequence(&self) -> Option<&[Selection<'s>]> {
        match self {
            Selection::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Looks up a text key in a lazily projected dictionary.
    pub fn get(&self, key: &str) -> Option<&Selection<'s>> {
        match self {
            Selection::Dictionary(entries) => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Decodes this selection into an owned object; absent becomes null.
    pub fn to_object(&self) -> Result<Object> {
        match self {
            Selection::Absent => Ok(Object::Null),
            Selection::Value(value) => value.materialize(),
            Selection::Object(object) => Ok(object.clone()),
            Selection::Sequence(items) => Ok(Object::Sequence(
                items.iter().map(Selection::to_object).collect::<Result<_>>()?,
            )),
            Selection::Dictionary(entries) => Ok(Object::Dictionary(
                entries
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), value.to_object()?)))
                    .collect::<Result<_>>()?,
            )),
        }
    }

    fn into_object(self) -> Result<Object> {
        match self {
            Selection::Object(object) => Ok(object),
            other => other.to_object(),
        }
    }
}

/// An open projection level.
#[derive(Debug)]
pub enum Frame<'s> {
    Sequence(Vec<Selection<'s>>),
    Dictionary(Vec<(Object, Selection<'s>)>),
}

#[derive(Debug)]
struct Slot {
    key: Option<Object>,
    filled: bool,
}

/// The per-run stack of open projection levels.
#[derive(Debug, Default)]
pub struct ProjectionStack<'s> {
    frames: Vec<(Frame<'s>, Option<Slot>)>,
}

impl<'s> ProjectionStack<'s> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn push(&mut self, frame: Frame<'s>) {
        self.frames.push((frame, None));
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Frame<'s>> {
        self.frames.pop().map(|(frame, _)| frame)
    }

    /// Returns `true` if the innermost level has a slot nothing filled yet.
    pub fn slot_pending(&self) -> bool {
        matches!(self.frames.last(), Some((_, Some(slot))) if !slot.filled)
    }

    /// Opens a slot on the innermost level; dictionary slots carry their key.
    pub fn open_slot(&mut self, key: Option<Object>) -> Result<()> {
        match self.frames.last_mut() {
            Some((_, slot)) => {
                *slot = Some(Slot { key, filled: false });
                Ok(())
            }
            None => {
                cold_path();
                Err(Error::Projection("slot opened outside a projection"))
            }
        }
    }

    /// Stores `value` in the innermost level.
    ///
    /// A sequence slot accepts any number of values; a dictionary slot
    /// accepts exactly one.
    pub fn fill(&mut self, value: Selection<'s>) -> Result<()> {
        match self.frames.last_mut() {
            Some((Frame::Sequence(items), slot)) => {
                items.push(value);
                if let Some(slot) = slot {
                    slot.filled = true;
                }
                Ok(())
            }
            Some((Frame::Dictionary(entries), Some(slot))) if !slot.filled => {
                let key = slot.key.clone().unwrap_or(Object::Null);
                entries.push((key, value));
                slot.filled = true;
                Ok(())
            }
            Some((Frame::Dictionary(_), Some(_))) => {
                cold_path();
                Err(Error::Projection(
                    "dictionary entry matched more than one value",
                ))
            }
            Some((Frame::Dictionary(_), None)) => {
                cold_path();
                Err(Error::Projection("dictionary value without a key"))
            }
            None => {
                cold_path();
                Err(Error::Projection("value stored outside a projection"))
            }
        }
    }
}

/// Strategy deciding the shape of projected results.
///
/// Implementors supply the four conversions; the frame bookkeeping is
/// provided and rarely needs overriding.
pub trait Projection: Send + Sync + fmt::Debug {
    /// Turns a matched item into a result element.
    fn finalize<'s>(&self, value: Value<'s>) -> Result<Selection<'s>>;

    /// The element recorded for a slot nothing matched.
    fn null<'s>(&self) -> Selection<'s>;

    fn assemble_sequence<'s>(&self, items: Vec<Selection<'s>>) -> Result<Selection<'s>>;

    fn assemble_dictionary<'s>(
        &self,
        entries: Vec<(Object, Selection<'s>)>,
    ) -> Result<Selection<'s>>;

    fn begin_sequence<'s>(&self, stack: &mut ProjectionStack<'s>) {
        stack.push(Frame::Sequence(Vec::new()));
    }

    fn begin_dictionary<'s>(&self, stack: &mut ProjectionStack<'s>) {
        stack.push(Frame::Dictionary(Vec::new()));
    }

    /// Starts the next dictionary entry.
    fn put_key<'s>(&self, stack: &mut ProjectionStack<'s>, key: Object) -> Result<()> {
        if stack.slot_pending() {
            self.put_null(stack)?;
        }
        stack.open_slot(Some(key))
    }

    /// Starts the next sequence element.
    fn put_element<'s>(&self, stack: &mut ProjectionStack<'s>) -> Result<()> {
        if stack.slot_pending() {
            self.put_null(stack)?;
        }
        stack.open_slot(None)
    }

    fn put_value<'s>(&self, stack: &mut ProjectionStack<'s>, value: Selection<'s>) -> Result<()> {
        stack.fill(value)
    }

    fn put_null<'s>(&self, stack: &mut ProjectionStack<'s>) -> Result<()> {
        stack.fill(self.null())
    }

    fn end_sequence<'s>(&self, stack: &mut ProjectionStack<'s>) -> Result<Selection<'s>> {
        if stack.slot_pending() {
            self.put_null(stack)?;
        }
        match stack.pop() {
            Some(Frame::Sequence(items)) => self.assemble_sequence(items),
            _ => {
                cold_path();
                Err(Error::Projection("unbalanced sequence projection"))
            }
        }
    }

    fn end_dictionary<'s>(&self, stack: &mut ProjectionStack<'s>) -> Result<Selection<'s>> {
        if stack.slot_pending() {
            self.put_null(stack)?;
        }
        match stack.pop() {
            Some(Frame::Dictionary(entries)) => self.assemble_dictionary(entries),
            _ => {
                cold_path();
                Err(Error::Projection("unbalanced dictionary projection"))
            }
        }
    }
}

/// Results stay bound to the byte source: matched items are handed out as
/// [`Selection::Value`] and nothing is decoded eagerly. Unmatched slots are
/// [`Selection::Absent`].
#[derive(Clone, Copy, Debug, Default)]
pub struct LazyProjection;

impl Projection for LazyProjection {
    #[inline]
    fn finalize<'s>(&self, value: Value<'s>) -> Result<Selection<'s>> {
        Ok(Selection::Value(value))
    }

    #[inline]
    fn null<'s>(&self) -> Selection<'s> {
        Selection::Absent
    }

    fn assemble_sequence<'s>(&self, items: Vec<Selection<'s>>) -> Result<Selection<'s>> {
        Ok(Selection::Sequence(items))
    }

    fn assemble_dictionary<'s>(
        &self,
        entries: Vec<(Object, Selection<'s>)>,
    ) -> Result<Selection<'s>> {
        Ok(Selection::Dictionary(entries))
    }
}

/// Results are decoded into owned [`Object`] graphs as they are produced.
/// Unmatched slots are [`Object::Null`].
#[derive(Clone, Copy, Debug, Default)]
pub struct MaterializedProjection;

impl Projection for MaterializedProjection {
    fn finalize<'s>(&self, value: Value<'s>) -> Result<Selection<'s>> {
        Ok(Selection::Object(value.materialize()?))
    }

    #[inline]
    fn null<'s>(&self) -> Selection<'s> {
        Selection::Object(Object::Null)
    }

    fn assemble_sequence<'s>(&self, items: Vec<Selection<'s>>) -> Result<Selection<'s>> {
        Ok(Selection::Object(Object::Sequence(
            items
                .into_iter()
                .map(Selection::into_object)
                .collect::<Result<_>>()?,
        )))
    }

    fn assemble_dictionary<'s>(
        &self,
        entries: Vec<(Object, Selection<'s>)>,
    ) -> Result<Selection<'s>> {
        Ok(Selection::Object(Object::Dictionary(
            entries
                .into_iter()
                .map(|(key, value)| Ok((key, value.into_object()?)))
                .collect::<Result<_>>()?,
        )))
    }
}
