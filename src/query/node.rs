use std::sync::{Arc, LazyLock};

use super::Stage;

static NIL: LazyLock<Arc<Node>> = LazyLock::new(|| Arc::new(Node::Nil));

/// A node of a compiled query.
///
/// `left` is the first child and `right` the next sibling. Missing links
/// point at the shared [`Nil`](Node::Nil) node, which is inert: visiting it
/// does nothing and continues.
#[derive(Debug)]
pub enum Node {
    Nil,
    Stage {
        stage: Stage,
        left: Arc<Node>,
        right: Arc<Node>,
    },
}

impl Node {
    /// The shared empty node.
    #[inline]
    pub fn nil() -> Arc<Node> {
        Arc::clone(&NIL)
    }

    #[inline]
    pub(crate) fn nil_ref() -> &'static Node {
        &**NIL
    }

    #[inline]
    pub fn new(stage: Stage, left: Arc<Node>, right: Arc<Node>) -> Arc<Node> {
        Arc::new(Node::Stage { stage, left, right })
    }

    /// A new node with the same stage and links as `node`.
    pub fn new_from(node: &Node) -> Arc<Node> {
        match node {
            Node::Nil => Node::nil(),
            Node::Stage { stage, left, right } => {
                Node::new(stage.clone(), Arc::clone(left), Arc::clone(right))
            }
        }
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Node::Nil)
    }

    #[inline]
    pub fn stage(&self) -> Option<&Stage> {
        match self {
            Node::Nil => None,
            Node::Stage { stage, .. } => Some(stage),
        }
    }

    #[inline]
    pub fn left(&self) -> &Arc<Node> {
        match self {
            Node::Nil => &*NIL,
            Node::Stage { left, .. } => left,
        }
    }

    #[inline]
    pub fn right(&self) -> &Arc<Node> {
        match self {
            Node::Nil => &*NIL,
            Node::Stage { right, .. } => right,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Node::Nil => "nil",
            Node::Stage { stage, .. } => stage.name(),
        }
    }

    /// Number of stage nodes reachable from this node, siblings included.
    pub fn stage_count(&self) -> usize {
        let mut count = 0;
        let mut current = self;
        while let Node::Stage { left, right, .. } = current {
            count += 1 + left.stage_count();
            current = right.as_ref();
        }
        count
    }

    /// Iterates over this node and its right siblings.
    pub fn siblings(&self) -> Siblings<'_> {
        Siblings { current: self }
    }

    /// Stages reachable from this node in evaluation order.
    pub fn stages(&self) -> Vec<&Stage> {
        let mut stages = Vec::new();
        collect(self, &mut stages);
        stages
    }
}

fn collect<'a>(node: &'a Node, stages: &mut Vec<&'a Stage>) {
    for sibling in node.siblings() {
        if let Node::Stage { stage, left, .. } = sibling {
            stages.push(stage);
            collect(left, stages);
        }
    }
}

pub struct Siblings<'a> {
    current: &'a Node,
}

impl<'a> Iterator for Siblings<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.current;
        match node {
            Node::Nil => None,
            Node::Stage { right, .. } => {
                self.current = right.as_ref();
                Some(node)
            }
        }
    }
}
