//! YAML documents mapped onto content tree nodes.
//!
//! Mappings become branches with their keys in document order, sequences
//! become branches whose children are named by the primary key field (or by
//! position), and scalars become leaves. The reserved `_templates` key fills
//! the node's template metadata instead of producing a child, and keys of the
//! form `_meta_<name>` are stored as plain metadata.

use std::path::Path;

use oak_core::{ContentTree, NodeId};
use serde_yaml::{Mapping, Value};
use tracing::trace;

use crate::{ParserError, Result};

/// Reserved key holding template sources by role.
pub const TEMPLATES_KEY: &str = "_templates";

/// Prefix of keys stored as metadata rather than children.
pub const META_PREFIX: &str = "_meta_";

/// Grafts parsed YAML values onto a [`ContentTree`].
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    primary_key: String,
}

impl DocumentBuilder {
    /// Create a builder naming sequence items by `primary_key`.
    #[must_use]
    pub fn new(primary_key: impl Into<String>) -> Self {
        Self {
            primary_key: primary_key.into(),
        }
    }

    /// Parse YAML text.
    pub fn parse(&self, source: &str, path: &Path) -> Result<Value> {
        serde_yaml::from_str(source).map_err(|source| ParserError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build a whole tree from a single document; the document's top level
    /// becomes the root.
    pub fn tree_from_str(&self, root_name: &str, source: &str, path: &Path) -> Result<ContentTree> {
        let value = self.parse(source, path)?;
        let mut tree = ContentTree::with_root_name(root_name);
        let root = tree.root();
        self.merge(&mut tree, root, &value, path)?;
        Ok(tree)
    }

    /// Add the entries of a mapping document to an existing branch.
    ///
    /// An empty document is accepted and adds nothing.
    pub fn merge(&self, tree: &mut ContentTree, node: NodeId, value: &Value, path: &Path) -> Result<()> {
        match value {
            Value::Null => Ok(()),
            Value::Mapping(mapping) => self.fill_mapping(tree, node, mapping, path),
            Value::Tagged(tagged) => self.merge(tree, node, &tagged.value, path),
            _ => Err(ParserError::invalid(
                path,
                "container document must be a mapping",
            )),
        }
    }

    /// Insert `value` as a new child `name` of `parent`.
    pub fn graft(
        &self,
        tree: &mut ContentTree,
        parent: NodeId,
        name: &str,
        value: &Value,
        path: &Path,
    ) -> Result<NodeId> {
        let tree_err = |source| ParserError::Tree {
            path: path.to_path_buf(),
            source,
        };

        match value {
            Value::Mapping(mapping) => {
                let id = tree.add_branch(parent, name).map_err(tree_err)?;
                self.fill_mapping(tree, id, mapping, path)?;
                Ok(id)
            }
            Value::Sequence(items) => {
                let id = tree.add_branch(parent, name).map_err(tree_err)?;
                for (index, item) in items.iter().enumerate() {
                    let item_name = self.item_name(item, index);
                    self.graft(tree, id, &item_name, item, path)?;
                }
                Ok(id)
            }
            Value::Tagged(tagged) => self.graft(tree, parent, name, &tagged.value, path),
            scalar => {
                let text = scalar_text(scalar).unwrap_or_default();
                tree.add_leaf(parent, name, text).map_err(tree_err)
            }
        }
    }

    fn fill_mapping(
        &self,
        tree: &mut ContentTree,
        node: NodeId,
        mapping: &Mapping,
        path: &Path,
    ) -> Result<()> {
        for (key, value) in mapping {
            let key = scalar_text(key)
                .ok_or_else(|| ParserError::invalid(path, "mapping keys must be scalars"))?;

            if key == TEMPLATES_KEY {
                self.set_templates(tree, node, value, path)?;
            } else if let Some(meta) = key.strip_prefix(META_PREFIX) {
                let text = scalar_text(value).ok_or_else(|| {
                    ParserError::invalid(path, format!("metadata {key:?} must be a scalar"))
                })?;
                tree.metadata_mut(node).insert(meta, text);
            } else {
                self.graft(tree, node, &key, value, path)?;
            }
        }
        Ok(())
    }

    fn set_templates(&self, tree: &mut ContentTree, node: NodeId, value: &Value, path: &Path) -> Result<()> {
        let Value::Mapping(roles) = value else {
            return Err(ParserError::invalid(
                path,
                format!("{TEMPLATES_KEY} must map roles to template sources"),
            ));
        };
        for (role, source) in roles {
            let (Some(role), Some(source)) = (scalar_text(role), scalar_text(source)) else {
                return Err(ParserError::invalid(
                    path,
                    format!("{TEMPLATES_KEY} entries must be scalars"),
                ));
            };
            trace!(node = %tree.url(node), role, "template metadata");
            tree.metadata_mut(node).set_template(role, source);
        }
        Ok(())
    }

    /// Name of a sequence item: its primary key field when present, else its index.
    fn item_name(&self, item: &Value, index: usize) -> String {
        item.get(self.primary_key.as_str())
            .and_then(scalar_text)
            .filter(|name| ContentTree::is_valid_name(name))
            .unwrap_or_else(|| index.to_string())
    }
}

/// Text of a scalar value; `None` for collections.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}
