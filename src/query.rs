//! Declarative queries over encoded streams.
//!
//! A [`QueryBuilder`] describes a path from a top-level item down to the
//! wanted values. [`build`](QueryBuilder::build) compiles it into an
//! immutable tree of [`Stage`]s that can be evaluated any number of times,
//! against any number of streams, from any number of threads. Each run gets
//! its own cursor and projection stack; nothing in a [`Query`] changes while
//! it runs.
//!
//! ```
//! use na_cbor::{QueryBuilder, read_all};
//!
//! // [1, 2, 3, 4]
//! let data = vec![0x84, 0x01, 0x02, 0x03, 0x04];
//! let even = QueryBuilder::new()
//!     .sequence_match(|v| v.as_u64().is_ok_and(|n| n % 2 == 0))
//!     .build();
//! let found: Vec<u64> = read_all(&data, &even)
//!     .unwrap()
//!     .iter()
//!     .map(|s| s.as_value().unwrap().as_u64().unwrap())
//!     .collect();
//! assert_eq!(found, [2, 4]);
//! ```

use std::{borrow::Cow, fmt, sync::Arc};

use crate::{ByteSource, Error, Reader, Result, cold_path};

mod builder;
mod engine;
mod node;
mod optimizer;
mod projection;
mod stage;

pub use builder::{DictionaryProjection, QueryBuilder, SequenceProjection};
pub use engine::VisitResult;
pub use node::{Node, Siblings};
pub use optimizer::{ElideTypeCheck, Optimizer, OptimizerStrategy, ScanDictionaryKey, SkipSequenceIndex};
pub use projection::{
    Frame, LazyProjection, MaterializedProjection, Projection, ProjectionStack, Selection,
};
pub use stage::{Predicate, Stage};

/// A compiled, immutable query.
#[derive(Clone)]
pub struct Query {
    root: Arc<Node>,
    projection: Arc<dyn Projection>,
}

impl Query {
    pub(crate) fn new(root: Arc<Node>, projection: Arc<dyn Projection>) -> Self {
        Self { root, projection }
    }

    #[inline]
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// The compiled tree.
    #[inline]
    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    #[inline]
    pub fn projection(&self) -> &dyn Projection {
        &*self.projection
    }

    /// The same tree, shaping results with `projection`.
    pub fn with_projection(&self, projection: impl Projection + 'static) -> Self {
        Self {
            root: Arc::clone(&self.root),
            projection: Arc::new(projection),
        }
    }

    /// The first result, or [`Selection::Absent`] if nothing matched.
    pub fn read<'s>(&self, reader: Reader<'s>) -> Result<Selection<'s>> {
        let mut first = Selection::Absent;
        self.read_with(reader, |selection| {
            first = selection;
            false
        })?;
        Ok(first)
    }

    /// Hands results to `consumer` until it returns `false` or the query is
    /// exhausted. Returns the number of results delivered.
    pub fn read_with<'s>(
        &self,
        reader: Reader<'s>,
        mut consumer: impl FnMut(Selection<'s>) -> bool,
    ) -> Result<usize> {
        engine::evaluate(&self.root, &*self.projection, reader, &mut consumer)
    }

    /// Every result, in order.
    pub fn read_all<'s>(&self, reader: Reader<'s>) -> Result<Vec<Selection<'s>>> {
        let mut all = Vec::new();
        self.read_with(reader, |selection| {
            all.push(selection);
            true
        })?;
        Ok(all)
    }

    /// The exact encoded bytes of the first match, or `None` if nothing
    /// matched.
    ///
    /// Projections are not applied; a query that reshapes its result cannot
    /// be extracted.
    pub fn extract<'s>(&self, reader: Reader<'s>) -> Result<Option<Cow<'s, [u8]>>> {
        let mut first = Selection::Absent;
        engine::evaluate(&self.root, &LazyProjection, reader, &mut |selection: Selection<'s>| {
            first = selection;
            false
        })?;
        match first {
            Selection::Absent => Ok(None),
            Selection::Value(value) => value.raw_bytes().map(Some),
            _ => {
                cold_path();
                Err(Error::Projection("projected results have no encoded bytes"))
            }
        }
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("stages", &self.root.stages())
            .field("projection", &self.projection)
            .finish()
    }
}

/// Evaluates `query` against `source` and returns the first result.
#[inline]
pub fn read<'s, S: ByteSource>(source: &'s S, query: &Query) -> Result<Selection<'s>> {
    query.read(Reader::new(source))
}

#[inline]
pub fn read_with<'s, S: ByteSource>(
    source: &'s S,
    query: &Query,
    consumer: impl FnMut(Selection<'s>) -> bool,
) -> Result<usize> {
    query.read_with(Reader::new(source), consumer)
}

#[inline]
pub fn read_all<'s, S: ByteSource>(source: &'s S, query: &Query) -> Result<Vec<Selection<'s>>> {
    query.read_all(Reader::new(source))
}

#[inline]
pub fn extract<'s, S: ByteSource>(source: &'s S, query: &Query) -> Result<Option<Cow<'s, [u8]>>> {
    query.extract(Reader::new(source))
}
