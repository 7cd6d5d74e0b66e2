use std::{mem, sync::Arc};

use tracing::debug;

use crate::{Key, Object, Value, ValueType};

use super::{
    Node, OptimizerStrategy, Query, Stage,
    projection::{LazyProjection, MaterializedProjection, Projection},
};

struct BuildNode {
    stage: Option<Stage>,
    children: Vec<usize>,
}

/// Assembles a [`Query`] one stage at a time.
///
/// Each navigation call appends a stage below the previous one, so a chain
/// reads as a path from the top-level item down to the wanted value.
///
/// ```
/// use na_cbor::{QueryBuilder, read};
///
/// // {"a": [10, 20]}
/// let data = vec![0xA1, 0x61, b'a', 0x82, 0x0A, 0x14];
/// let query = QueryBuilder::new().dictionary("a").sequence(1).build();
/// let found = read(&data, &query).unwrap();
/// assert_eq!(found.as_value().unwrap().as_u64().unwrap(), 20);
/// ```
pub struct QueryBuilder {
    nodes: Vec<BuildNode>,
    cursor: usize,
    projection: Arc<dyn Projection>,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self {
            nodes: vec![BuildNode {
                stage: None,
                children: Vec::new(),
            }],
            cursor: 0,
            projection: Arc::new(LazyProjection),
        }
    }

    fn push(&mut self, parent: usize, stage: Stage) -> usize {
        let id = self.nodes.len();
        self.nodes.push(BuildNode {
            stage: Some(stage),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    fn then(mut self, stage: Stage) -> Self {
        self.cursor = self.push(self.cursor, stage);
        self
    }

    /// Selects the top-level item at `index`.
    pub fn stream(self, index: usize) -> Self {
        self.then(Stage::Stream(index))
    }

    /// Selects every top-level item in turn.
    pub fn multi_stream(self) -> Self {
        self.then(Stage::AnyStream)
    }

    /// Selects the sequence element at `index`.
    pub fn sequence(self, index: usize) -> Self {
        self.then(Stage::SequenceIndex(index))
    }

    /// Selects every sequence element `predicate` accepts, in order.
    pub fn sequence_match(
        self,
        predicate: impl Fn(&Value<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.then(Stage::SequenceMatch(Arc::new(predicate)))
    }

    /// Selects the value stored under `key`. A missing key is a miss, not an
    /// error.
    pub fn dictionary(self, key: impl Key) -> Self {
        self.then(Stage::DictionaryKey(key.to_literal()))
    }

    /// Selects the value of the first key `predicate` accepts.
    pub fn dictionary_match(
        self,
        predicate: impl Fn(&Value<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.then(Stage::DictionaryMatch(Arc::new(predicate)))
    }

    /// Fails the query unless the current item has type `expected`.
    pub fn require_type(self, expected: ValueType) -> Self {
        self.then(Stage::TypeMatch {
            expected,
            optional: false,
        })
    }

    /// Like [`require_type`](Self::require_type), but a mismatch yields an
    /// absent result instead of an error.
    pub fn null_or_type(self, expected: ValueType) -> Self {
        self.then(Stage::TypeMatch {
            expected,
            optional: true,
        })
    }

    /// Reshapes the current item into a sequence with one element per
    /// [`element`](SequenceProjection::element) path.
    pub fn as_sequence(mut self, f: impl FnOnce(SequenceProjection) -> SequenceProjection) -> Self {
        let parent = self.cursor;
        let begin = self.push(parent, Stage::BeginSequence);
        for path in f(SequenceProjection::default()).elements {
            let element = self.push(begin, Stage::Element);
            self.graft(element, path);
        }
        self.cursor = self.push(parent, Stage::EndSequence);
        self
    }

    /// Reshapes the current item into a dictionary with one entry per
    /// [`entry`](DictionaryProjection::entry) path.
    pub fn as_dictionary(
        mut self,
        f: impl FnOnce(DictionaryProjection) -> DictionaryProjection,
    ) -> Self {
        let parent = self.cursor;
        let begin = self.push(parent, Stage::BeginDictionary);
        for (key, path) in f(DictionaryProjection::default()).entries {
            let entry = self.push(begin, Stage::Entry(key));
            self.graft(entry, path);
        }
        self.cursor = self.push(parent, Stage::EndDictionary);
        self
    }

    /// Decodes results into owned [`Object`]s.
    pub fn materialized(self) -> Self {
        self.projection(MaterializedProjection)
    }

    pub fn projection(mut self, projection: impl Projection + 'static) -> Self {
        self.projection = Arc::new(projection);
        self
    }

    /// Compiles the query and applies the standard optimizers.
    pub fn build(self) -> Query {
        self.build_with(&OptimizerStrategy::standard())
    }

    pub fn build_with(mut self, optimizers: &OptimizerStrategy) -> Query {
        self.default_stream();
        self.terminate(0);
        self.collapse(0);
        let root = self.compile(&self.nodes[0].children);
        debug!(stages = root.stage_count(), "compiled query");
        let root = optimizers.optimize(&root);
        Query::new(root, self.projection)
    }

    /// Moves the stages of `path` below `parent`.
    fn graft(&mut self, parent: usize, path: QueryBuilder) {
        let base = self.nodes.len();
        let remap = move |id: usize| if id == 0 { parent } else { base + id - 1 };
        let mut nodes = path.nodes.into_iter();
        let root = nodes.next();
        for node in nodes {
            self.nodes.push(BuildNode {
                stage: node.stage,
                children: node.children.into_iter().map(remap).collect(),
            });
        }
        if let Some(root) = root {
            self.nodes[parent]
                .children
                .extend(root.children.into_iter().map(remap));
        }
    }

    /// Makes sure evaluation starts by selecting a top-level item.
    fn default_stream(&mut self) {
        let selected = self.nodes[0]
            .children
            .first()
            .and_then(|child| self.nodes[*child].stage.as_ref())
            .is_some_and(Stage::is_stream_selector);
        if selected {
            return;
        }
        let children = mem::take(&mut self.nodes[0].children);
        let id = self.nodes.len();
        self.nodes.push(BuildNode {
            stage: Some(Stage::Stream(0)),
            children,
        });
        self.nodes[0].children.push(id);
        debug!("no stream selected, defaulting to stream 0");
    }

    /// Gives every open branch a terminal consume stage.
    fn terminate(&mut self, id: usize) {
        if self.nodes[id].children.is_empty() {
            let open = self.nodes[id]
                .stage
                .as_ref()
                .is_some_and(|stage| !stage.is_consume_marker() && !stage.is_projection_begin());
            if open {
                self.push(id, Stage::Consume);
            }
            return;
        }
        for position in 0..self.nodes[id].children.len() {
            let child = self.nodes[id].children[position];
            self.terminate(child);
        }
    }

    /// Lifts stages chained after a consume marker up to its parent.
    fn collapse(&mut self, id: usize) {
        let children = mem::take(&mut self.nodes[id].children);
        let mut flattened = Vec::with_capacity(children.len());
        for child in children {
            self.collapse(child);
            flattened.push(child);
            let marker = self.nodes[child]
                .stage
                .as_ref()
                .is_some_and(Stage::is_consume_marker);
            if marker && !self.nodes[child].children.is_empty() {
                debug!(node = child, "collapsing stages after consume marker");
                flattened.append(&mut self.nodes[child].children);
            }
        }
        self.nodes[id].children = flattened;
    }

    fn compile(&self, children: &[usize]) -> Arc<Node> {
        let mut right = Node::nil();
        for child in children.iter().rev() {
            let node = &self.nodes[*child];
            let left = self.compile(&node.children);
            if let Some(stage) = &node.stage {
                right = Node::new(stage.clone(), left, right);
            }
        }
        right
    }
}

/// Element paths of an [`as_sequence`](QueryBuilder::as_sequence) projection.
#[derive(Default)]
pub struct SequenceProjection {
    elements: Vec<QueryBuilder>,
}

impl SequenceProjection {
    /// Adds an element, navigated to from the projected item by `path`.
    ///
    /// Every match of the path is appended; a path without matches adds one
    /// null element.
    pub fn element(mut self, path: impl FnOnce(QueryBuilder) -> QueryBuilder) -> Self {
        self.elements.push(path(QueryBuilder::new()));
        self
    }
}

/// Entry paths of an [`as_dictionary`](QueryBuilder::as_dictionary) projection.
#[derive(Default)]
pub struct DictionaryProjection {
    entries: Vec<(Object, QueryBuilder)>,
}

impl DictionaryProjection {
    /// Adds an entry under `key`, navigated to from the projected item by
    /// `path`. An entry whose path matches nothing is null.
    pub fn entry(
        mut self,
        key: impl Into<Object>,
        path: impl FnOnce(QueryBuilder) -> QueryBuilder,
    ) -> Self {
        self.entries.push((key.into(), path(QueryBuilder::new())));
        self
    }
}
