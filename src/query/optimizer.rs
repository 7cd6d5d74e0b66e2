//! Rewrites of compiled query trees.
//!
//! An [`OptimizerStrategy`] runs one pre-order pass over the tree. At each
//! node its optimizers are tried in order and the first one that matches
//! rewrites the node; the result is not offered to the list again, but its
//! children are. Rewrites must not change which results a query delivers or
//! their order.

use std::{fmt, sync::Arc};

use tracing::debug;

use super::{Node, Stage};
use crate::ValueType;

/// One tree rewrite.
///
/// `rewrite` receives a node for which `matches` returned `true` and returns
/// its replacement, including the replacement's `right` sibling chain.
/// Optimizers hold no per-run state: a tree is optimized once and evaluated
/// many times.
pub trait Optimizer: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn matches(&self, node: &Node) -> bool;

    fn rewrite(&self, node: &Node) -> Arc<Node>;
}

/// An ordered list of optimizers.
#[derive(Clone, Debug)]
pub struct OptimizerStrategy {
    optimizers: Vec<Arc<dyn Optimizer>>,
}

impl Default for OptimizerStrategy {
    fn default() -> Self {
        Self::standard()
    }
}

impl OptimizerStrategy {
    /// Leaves trees exactly as compiled.
    pub fn none() -> Self {
        Self {
            optimizers: Vec::new(),
        }
    }

    pub fn standard() -> Self {
        Self::none()
            .with(ElideTypeCheck)
            .with(SkipSequenceIndex)
            .with(ScanDictionaryKey)
    }

    /// Appends `optimizer` after the ones already registered.
    pub fn with(mut self, optimizer: impl Optimizer + 'static) -> Self {
        self.optimizers.push(Arc::new(optimizer));
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.optimizers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.optimizers.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.optimizers.iter().map(|optimizer| optimizer.name())
    }

    pub fn optimize(&self, root: &Arc<Node>) -> Arc<Node> {
        if self.optimizers.is_empty() {
            return Arc::clone(root);
        }
        self.optimize_chain(root)
    }

    fn optimize_chain(&self, head: &Arc<Node>) -> Arc<Node> {
        let mut chain = Vec::new();
        let mut current = Arc::clone(head);
        while !current.is_nil() {
            let rewritten = self.rewrite_node(&current);
            current = Arc::clone(rewritten.right());
            chain.push(rewritten);
        }

        let mut right = Node::nil();
        for node in chain.into_iter().rev() {
            if let Node::Stage { stage, left, .. } = &*node {
                right = Node::new(stage.clone(), self.optimize_chain(left), right);
            }
        }
        right
    }

    fn rewrite_node(&self, node: &Arc<Node>) -> Arc<Node> {
        for optimizer in &self.optimizers {
            if optimizer.matches(node) {
                debug!(
                    optimizer = optimizer.name(),
                    stage = node.name(),
                    "rewrote query node"
                );
                return optimizer.rewrite(node);
            }
        }
        Arc::clone(node)
    }
}

/// Replaces index lookups with a walk over the preceding elements, so no
/// container index is built.
#[derive(Clone, Copy, Debug, Default)]
pub struct SkipSequenceIndex;

impl Optimizer for SkipSequenceIndex {
    fn name(&self) -> &'static str {
        "skip_sequence_index"
    }

    fn matches(&self, node: &Node) -> bool {
        matches!(node.stage(), Some(Stage::SequenceIndex(_)))
    }

    fn rewrite(&self, node: &Node) -> Arc<Node> {
        match node.stage() {
            Some(Stage::SequenceIndex(index)) => Node::new(
                Stage::SequenceSkip(*index),
                Arc::clone(node.left()),
                Arc::clone(node.right()),
            ),
            _ => Node::new_from(node),
        }
    }
}

/// Replaces literal key lookups with an in-place scan over the pairs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScanDictionaryKey;

impl Optimizer for ScanDictionaryKey {
    fn name(&self) -> &'static str {
        "scan_dictionary_key"
    }

    fn matches(&self, node: &Node) -> bool {
        matches!(node.stage(), Some(Stage::DictionaryKey(_)))
    }

    fn rewrite(&self, node: &Node) -> Arc<Node> {
        match node.stage() {
            Some(Stage::DictionaryKey(key)) => Node::new(
                Stage::DictionaryScan(key.clone()),
                Arc::clone(node.left()),
                Arc::clone(node.right()),
            ),
            _ => Node::new_from(node),
        }
    }
}

/// Drops a required container type check whose only child navigates into
/// that same container type, since the child fails identically.
#[derive(Clone, Copy, Debug, Default)]
pub struct ElideTypeCheck;

impl ElideTypeCheck {
    fn checked(node: &Node) -> Option<ValueType> {
        match node.stage() {
            Some(Stage::TypeMatch {
                expected: expected @ (ValueType::Sequence | ValueType::Dictionary),
                optional: false,
            }) => Some(*expected),
            _ => None,
        }
    }
}

impl Optimizer for ElideTypeCheck {
    fn name(&self) -> &'static str {
        "elide_type_check"
    }

    fn matches(&self, node: &Node) -> bool {
        let Some(expected) = Self::checked(node) else {
            return false;
        };
        let child = node.left();
        child.right().is_nil()
            && child
                .stage()
                .and_then(Stage::asserted_container)
                .is_some_and(|asserted| asserted == expected)
    }

    fn rewrite(&self, node: &Node) -> Arc<Node> {
        let child = node.left();
        match child.stage() {
            Some(stage) => Node::new(
                stage.clone(),
                Arc::clone(child.left()),
                Arc::clone(node.right()),
            ),
            None => Node::new_from(node),
        }
    }
}
