//! Content nodes exposed to templates.
//!
//! A branch behaves like a sequence of its children that also supports
//! attribute access by child name (`page.title`), so both
//! `{% for item in current_page %}` and `{{ current_page.title }}` work. A
//! leaf renders as its text. A branch renders through its `preview`
//! template when it has one.
//!
//! Display cannot carry an engine error, so a failing preview writes nothing
//! and is recorded on the [`RenderScope`]. [`RenderScope::checked`] turns the
//! recorded failure into the error of the surrounding render.

use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use minijinja::{
    Environment, Value,
    value::{Enumerator, Object, ObjectRepr},
};
use oak_core::{ChildValue, ContentTree, NodeId, NodeKind};
use tracing::warn;

use crate::template::{Result, TemplateError};

/// Variables handed to the template engine for one render.
pub type RenderContext = BTreeMap<String, Value>;

/// Template role used when a branch is printed directly.
pub const PREVIEW_ROLE: &str = "preview";

/// A content tree together with the environment its previews render in.
#[derive(Debug, Clone)]
pub struct RenderScope {
    tree: Arc<ContentTree>,
    env: Arc<Environment<'static>>,
    preview_failure: Arc<Mutex<Option<(String, minijinja::Error)>>>,
}

impl RenderScope {
    #[must_use]
    pub fn new(tree: Arc<ContentTree>, env: Arc<Environment<'static>>) -> Self {
        Self {
            tree,
            env,
            preview_failure: Arc::default(),
        }
    }

    /// Run one render, failing with the first preview error it recorded.
    pub fn checked<F>(&self, render: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        self.take_preview_failure();
        let rendered = render();
        match self.take_preview_failure() {
            Some((node, source)) => Err(TemplateError::Preview { node, source }),
            None => rendered,
        }
    }

    fn take_preview_failure(&self) -> Option<(String, minijinja::Error)> {
        self.preview_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn record_preview_failure(&self, node: String, error: minijinja::Error) {
        let mut slot = self
            .preview_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some((node, error));
        }
    }

    #[must_use]
    pub fn tree(&self) -> &ContentTree {
        &self.tree
    }

    #[must_use]
    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }

    /// The node itself as a template value.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Value {
        Value::from_object(NodeObject {
            scope: self.clone(),
            id,
        })
    }

    /// Representative value of a node: a leaf's text, or the branch itself.
    #[must_use]
    pub fn value_of(&self, id: NodeId) -> Value {
        match self.tree[id].kind() {
            NodeKind::Leaf(text) => Value::from(text.as_str()),
            NodeKind::Branch(_) => self.node(id),
        }
    }

    /// Children of `id` by name.
    #[must_use]
    pub fn children_context(&self, id: NodeId) -> RenderContext {
        self.tree
            .children_as_mapping(id)
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    ChildValue::Text(text) => Value::from(text),
                    ChildValue::Branch(child) => self.node(child),
                };
                (name.to_string(), value)
            })
            .collect()
    }

    /// Full context for rendering a template bound to `id`.
    ///
    /// Holds the node's children by name, `current_page`, `site_root`, and an
    /// upper-cased alias for every direct child of the root, inserted in that
    /// order so later entries win on name clashes.
    #[must_use]
    pub fn context(&self, id: NodeId) -> RenderContext {
        let mut context = self.children_context(id);
        context.insert("current_page".to_string(), self.node(id));

        let root = self.tree.root();
        context.insert("site_root".to_string(), self.node(root));
        for &child in self.tree.children(root) {
            context.insert(self.tree.name(child).to_uppercase(), self.value_of(child));
        }
        context
    }
}

/// Template value backed by a content node.
#[derive(Debug)]
pub struct NodeObject {
    scope: RenderScope,
    id: NodeId,
}

impl NodeObject {
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Child by exact name, falling back to a case-insensitive match so
    /// `META.TITLE` finds `meta/title`.
    fn lookup(&self, name: &str) -> Option<NodeId> {
        let tree = self.scope.tree();
        tree.child(self.id, name).or_else(|| {
            tree.children(self.id)
                .iter()
                .copied()
                .find(|&c| tree.name(c).eq_ignore_ascii_case(name))
        })
    }

    fn render_branch(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.scope.tree();
        if let Some(preview) = tree.metadata(self.id).template(PREVIEW_ROLE) {
            return match self
                .scope
                .environment()
                .render_str(preview, self.scope.children_context(self.id))
            {
                Ok(rendered) => f.write_str(&rendered),
                Err(err) => {
                    let node = tree.url(self.id);
                    warn!(node = %node, error = %err, "preview failed to render");
                    self.scope.record_preview_failure(node, err);
                    Ok(())
                }
            };
        }

        f.write_str("{")?;
        for (i, &child) in tree.children(self.id).iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", tree.name(child), self.scope.value_of(child))?;
        }
        f.write_str("}")
    }
}

impl Object for NodeObject {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        if self.scope.tree()[self.id].is_leaf() {
            ObjectRepr::Plain
        } else {
            ObjectRepr::Seq
        }
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let tree = self.scope.tree();
        if let Some(name) = key.as_str() {
            return match name {
                "_name" => Some(Value::from(tree.name(self.id))),
                "_url" => Some(Value::from(tree.url(self.id))),
                "_parent" => tree.parent(self.id).map(|p| self.scope.node(p)),
                _ => self.lookup(name).map(|c| self.scope.value_of(c)),
            };
        }
        let index = key.as_usize()?;
        tree.children(self.id)
            .get(index)
            .map(|&c| self.scope.value_of(c))
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        match self.scope.tree()[self.id].kind() {
            NodeKind::Leaf(_) => Enumerator::NonEnumerable,
            NodeKind::Branch(children) => Enumerator::Seq(children.len()),
        }
    }

    fn is_true(self: &Arc<Self>) -> bool {
        match self.scope.tree()[self.id].kind() {
            NodeKind::Leaf(text) => !text.is_empty(),
            NodeKind::Branch(children) => !children.is_empty(),
        }
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        Self: Sized + 'static,
    {
        match self.scope.tree()[self.id].kind() {
            NodeKind::Leaf(text) => f.write_str(text),
            NodeKind::Branch(_) => self.render_branch(f),
        }
    }
}
