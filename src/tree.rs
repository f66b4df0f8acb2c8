use std::ffi::OsStr;
use std::ops::Index;
use std::path::{Path, PathBuf};

use crate::node::Metadata;

/// Index of a node within its [`Tree`].
///
/// Ids are only meaningful for the tree that issued them. A child holds its
/// parent as an id rather than a reference, so the tree stays singly owned
/// while still being navigable in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One materialized filesystem entry.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) name: std::ffi::OsString,
    pub(crate) metadata: Metadata,
    pub(crate) link_target: Option<PathBuf>,
    pub(crate) depth: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    /// The entry's base name (the full starting path for the root).
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    /// The entry's `lstat` snapshot.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Where a symlink points, `None` for everything else.
    pub fn link_target(&self) -> Option<&Path> {
        self.link_target.as_deref()
    }

    /// Distance from the root; the root is 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The enclosing directory's id, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child ids in the order the directory stream yielded them.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A fully materialized directory tree, as returned by
/// [`walk_tree`](crate::walk_tree).
///
/// Nodes live in an arena in pre-order discovery order; the root is always
/// the first node. The caller gets random access to the whole subtree and
/// releases everything at once by dropping the tree.
#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a node, wiring it into its parent's child list.
    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = node.parent;
        self.nodes.push(node);
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    /// The root node's id.
    ///
    /// A tree returned by a successful walk is never empty; the root is the
    /// one entry whose failure would have failed the walk instead.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Look up a node.
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no nodes. Only true for a `Tree` that never
    /// came out of a walk.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes with their ids, in pre-order discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Reconstruct a node's path by walking its parent chain.
    pub fn path(&self, id: NodeId) -> PathBuf {
        let mut names = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = &self.nodes[current.0];
            names.push(node.name.as_os_str());
            cursor = node.parent;
        }
        let mut path = PathBuf::new();
        for part in names.iter().rev() {
            path.push(part);
        }
        path
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        self.get(id)
    }
}
