//! Hierarchical content tree.
//!
//! Nodes live in an arena owned by [`ContentTree`] and are addressed by
//! [`NodeId`]. Two lookups of the same URL always yield the same id, which is
//! what template bindings compare on.

use std::{
    collections::BTreeMap,
    fmt,
    ops::Index,
};

use crate::error::TreeError;

/// Name given to the root branch when none is supplied.
pub const ROOT_NAME: &str = "root";

/// Handle to a node inside a [`ContentTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-node metadata.
///
/// Metadata belongs to a single node. Nothing is inherited implicitly; use
/// [`ContentTree::find_metadata`] to walk up the ancestors explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    templates: BTreeMap<String, String>,
    values: BTreeMap<String, String>,
}

impl Metadata {
    /// Template sources by role (`preview`, `detail`, ...).
    #[must_use]
    pub fn templates(&self) -> &BTreeMap<String, String> {
        &self.templates
    }

    /// Template source for a role.
    #[must_use]
    pub fn template(&self, role: &str) -> Option<&str> {
        self.templates.get(role).map(String::as_str)
    }

    /// Set the template source for a role.
    pub fn set_template(&mut self, role: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(role.into(), source.into());
    }

    /// Get a plain metadata value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Insert a plain metadata value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

/// Leaf or branch payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Scalar text.
    Leaf(String),
    /// Children in insertion order.
    Branch(Vec<NodeId>),
}

/// A single node of the content tree.
#[derive(Debug, Clone)]
pub struct ContentNode {
    name: String,
    parent: Option<NodeId>,
    kind: NodeKind,
    metadata: Metadata,
}

impl ContentNode {
    /// Name of the node, unique among its siblings.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent node, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// Scalar value of a leaf.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Leaf(value) => Some(value),
            NodeKind::Branch(_) => None,
        }
    }

    /// Children of a branch; empty for a leaf.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Leaf(_) => &[],
            NodeKind::Branch(children) => children,
        }
    }
}

/// Representative value of a child, as exposed to render contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildValue<'a> {
    /// A leaf contributes its scalar text.
    Text(&'a str),
    /// A branch contributes itself.
    Branch(NodeId),
}

/// Ordered, named, recursively nested content.
#[derive(Debug, Clone)]
pub struct ContentTree {
    nodes: Vec<ContentNode>,
}

impl Default for ContentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentTree {
    /// Create a tree holding only an empty root branch.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root_name(ROOT_NAME)
    }

    /// Create a tree whose root branch has the given name.
    #[must_use]
    pub fn with_root_name(name: impl Into<String>) -> Self {
        Self {
            nodes: vec![ContentNode {
                name: name.into(),
                parent: None,
                kind: NodeKind::Branch(Vec::new()),
                metadata: Metadata::default(),
            }],
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&ContentNode> {
        self.nodes.get(id.0)
    }

    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        &self[id].name
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self[id].parent
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self[id].children()
    }

    /// Find a direct child by name.
    #[must_use]
    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].name == name)
    }

    /// Append an empty branch under `parent`.
    pub fn add_branch(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.add(parent, name.into(), NodeKind::Branch(Vec::new()))
    }

    /// Append a leaf under `parent`.
    pub fn add_leaf(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.add(parent, name.into(), NodeKind::Leaf(value.into()))
    }

    /// Whether `name` can name a child: non-empty, no `/`, and not a path
    /// component like `.` or `..`.
    #[must_use]
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty() && !name.contains('/') && name != "." && name != ".."
    }

    fn add(&mut self, parent: NodeId, name: String, kind: NodeKind) -> Result<NodeId, TreeError> {
        if !Self::is_valid_name(&name) {
            return Err(TreeError::InvalidName(name));
        }
        if self[parent].is_leaf() {
            return Err(TreeError::NotABranch {
                parent: self.url(parent),
                name,
            });
        }
        if self.child(parent, &name).is_some() {
            return Err(TreeError::DuplicateChild {
                parent: self.url(parent),
                name,
            });
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(ContentNode {
            name,
            parent: Some(parent),
            kind,
            metadata: Metadata::default(),
        });
        if let NodeKind::Branch(children) = &mut self.nodes[parent.0].kind {
            children.push(id);
        }
        Ok(id)
    }

    #[must_use]
    pub fn metadata(&self, id: NodeId) -> &Metadata {
        &self[id].metadata
    }

    pub fn metadata_mut(&mut self, id: NodeId) -> &mut Metadata {
        &mut self.nodes[id.0].metadata
    }

    /// Walk up from `id` to the nearest node carrying the metadata `key`.
    #[must_use]
    pub fn find_metadata(&self, id: NodeId, key: &str) -> Option<&str> {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(value) = self.metadata(node).get(key) {
                return Some(value);
            }
            current = self.parent(node);
        }
        None
    }

    /// Resolve a slash separated path starting at the root.
    ///
    /// Leading, trailing and repeated slashes are ignored, so `/a/b`, `a/b`
    /// and `/a/b/` all address the same node.
    pub fn get_by_url(&self, url: &str) -> Result<NodeId, TreeError> {
        let mut current = self.root();
        for segment in url.split('/').filter(|s| !s.is_empty()) {
            current = self
                .child(current, segment)
                .ok_or_else(|| TreeError::not_found(url))?;
        }
        Ok(current)
    }

    /// Absolute URL of a node; the root is `/`.
    #[must_use]
    pub fn url(&self, id: NodeId) -> String {
        let mut names: Vec<&str> = self
            .ancestors(id)
            .into_iter()
            .rev()
            .skip(1) // root
            .map(|a| self.name(a))
            .collect();
        if self.parent(id).is_some() {
            names.push(self.name(id));
        }
        format!("/{}", names.join("/"))
    }

    /// Ancestors of a node, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut ancestors = vec![];
        let mut parent = self.parent(id);
        while let Some(p) = parent {
            ancestors.push(p);
            parent = self.parent(p);
        }
        ancestors
    }

    /// Children of `id` paired with their representative values, in order.
    #[must_use]
    pub fn children_as_mapping(&self, id: NodeId) -> Vec<(&str, ChildValue<'_>)> {
        self.children(id)
            .iter()
            .map(|&child| {
                let node = &self[child];
                let value = match &node.kind {
                    NodeKind::Leaf(text) => ChildValue::Text(text),
                    NodeKind::Branch(_) => ChildValue::Branch(child),
                };
                (node.name.as_str(), value)
            })
            .collect()
    }

    /// Pre-order traversal in child order, starting at the root.
    #[must_use]
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            tree: self,
            stack: vec![self.root()],
        }
    }
}

impl Index<NodeId> for ContentTree {
    type Output = ContentNode;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

/// Iterator returned by [`ContentTree::depth_first`].
pub struct DepthFirst<'t> {
    tree: &'t ContentTree,
    stack: Vec<NodeId>,
}

impl Iterator for DepthFirst<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

impl fmt::Display for ContentTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in self.depth_first() {
            let depth = self.ancestors(id).len();
            let node = &self[id];
            write!(f, "{}{}", "  ".repeat(depth), node.name)?;
            if let Some(value) = node.value() {
                let first_line = value.lines().next().unwrap_or("");
                write!(f, ": {first_line:?}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
