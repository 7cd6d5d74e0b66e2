//! Evaluation of compiled query trees.
//!
//! Every stage returns a [`VisitResult`] and the engine turns those signals
//! into a walk over the binary tree: `left` holds a node's children and
//! `right` its next sibling. Sibling chains are walked iteratively, so only
//! the nesting depth of a query uses the call stack.

use tracing::{debug, trace};

use crate::{Reader, Result};

use super::{
    Stage,
    node::Node,
    projection::{Projection, ProjectionStack, Selection},
};

/// Control signal returned by every stage.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VisitResult {
    /// Visit the children with the current cursor, then the siblings.
    Continue,
    /// Nothing here: skip the children, still visit the siblings.
    Break,
    /// Stop the whole run.
    Exit,
    /// Visit the children with the current cursor, then apply this stage
    /// again for its next candidate.
    Loop,
}

/// Where an enumerating stage resumes on its next application.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Enumeration {
    Fresh,
    Stream {
        next: usize,
    },
    Elements {
        next: usize,
        remaining: Option<usize>,
    },
}

/// Mutable state of one query run.
pub(crate) struct Context<'s, 'c> {
    pub(crate) reader: Reader<'s>,
    pub(crate) cursor: usize,
    pub(crate) stack: ProjectionStack<'s>,
    pub(crate) projection: &'c dyn Projection,
    enumerations: Vec<Enumeration>,
    consumer: &'c mut dyn FnMut(Selection<'s>) -> bool,
    delivered: usize,
}

impl<'s, 'c> Context<'s, 'c> {
    fn new(
        reader: Reader<'s>,
        projection: &'c dyn Projection,
        consumer: &'c mut dyn FnMut(Selection<'s>) -> bool,
    ) -> Self {
        Self {
            reader,
            cursor: 0,
            stack: ProjectionStack::default(),
            projection,
            enumerations: Vec::new(),
            consumer,
            delivered: 0,
        }
    }

    /// The resume point of the innermost enumerating stage.
    pub(crate) fn enumeration(&mut self) -> &mut Enumeration {
        if self.enumerations.is_empty() {
            self.enumerations.push(Enumeration::Fresh);
        }
        let innermost = self.enumerations.len() - 1;
        &mut self.enumerations[innermost]
    }

    /// Routes a finished selection into the open projection, or to the
    /// consumer when no projection is open.
    pub(crate) fn emit(&mut self, selection: Selection<'s>) -> Result<VisitResult> {
        if !self.stack.is_empty() {
            self.projection.put_value(&mut self.stack, selection)?;
            return Ok(VisitResult::Continue);
        }
        self.delivered += 1;
        if (self.consumer)(selection) {
            Ok(VisitResult::Continue)
        } else {
            Ok(VisitResult::Exit)
        }
    }
}

/// Runs `root` against `reader`, handing results to `consumer` until it
/// returns `false`. Returns the number of results delivered.
pub(crate) fn evaluate<'s>(
    root: &Node,
    projection: &dyn Projection,
    reader: Reader<'s>,
    consumer: &mut dyn FnMut(Selection<'s>) -> bool,
) -> Result<usize> {
    debug!(
        source_len = reader.source().len(),
        projection = ?projection,
        "evaluating query"
    );
    let mut ctx = Context::new(reader, projection, consumer);
    let outcome = visit(Node::nil_ref(), root, &mut ctx)?;
    debug!(delivered = ctx.delivered, exited = outcome == VisitResult::Exit, "query finished");
    Ok(ctx.delivered)
}

/// Visits `node` and its sibling chain. Returns `Exit` if the run was
/// stopped, `Continue` otherwise.
fn visit(previous: &Node, node: &Node, ctx: &mut Context<'_, '_>) -> Result<VisitResult> {
    let mut previous = previous;
    let mut current = node;
    while let Node::Stage { stage, left, right } = current {
        let origin = ctx.cursor;
        let enumerates = stage.is_enumerator();
        if enumerates {
            ctx.enumerations.push(Enumeration::Fresh);
        }

        let outcome = run(previous, current, stage, left, origin, ctx);

        if enumerates {
            ctx.enumerations.pop();
        }
        ctx.cursor = origin;
        if outcome? == VisitResult::Exit {
            return Ok(VisitResult::Exit);
        }
        previous = current;
        current = right.as_ref();
    }
    Ok(VisitResult::Continue)
}

/// Applies one stage until it stops producing candidates.
fn run(
    previous: &Node,
    current: &Node,
    stage: &Stage,
    left: &Node,
    origin: usize,
    ctx: &mut Context<'_, '_>,
) -> Result<VisitResult> {
    loop {
        let result = stage.apply(ctx)?;
        trace!(
            stage = stage.name(),
            previous = previous.name(),
            cursor = ctx.cursor,
            ?result,
            "visit"
        );
        match result {
            VisitResult::Continue => return visit(current, left, ctx),
            VisitResult::Break | VisitResult::Exit => return Ok(result),
            VisitResult::Loop => {
                if visit(current, left, ctx)? == VisitResult::Exit {
                    return Ok(VisitResult::Exit);
                }
                ctx.cursor = origin;
            }
        }
    }
}
