//! Template to content binding.
//!
//! Every template is bound to one or more content nodes by its path:
//!
//! 1. A template whose file stem or parent directory is `_children` is bound
//!    once per child of the node at the wildcard position, and the child's
//!    name replaces the token in the output path. A nested token left in the
//!    substituted path is expanded again, one level per recursion.
//! 2. Otherwise `dir/stem` is looked up (`folder1/document.html` binds to
//!    `/folder1/document`),
//! 3. then `dir` alone,
//! 4. then the root.
//!
//! Resolution never fails: content sparser than the template set falls back
//! to an enclosing node.

use oak_core::{ContentTree, NodeId};
use tracing::{debug, warn};

/// Path token expanding to one binding per child.
pub const WILDCARD: &str = "_children";

/// An output path paired with the node its template renders against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Output path, always starting with `/`.
    pub path: String,
    pub node: NodeId,
}

impl Binding {
    /// Directory and file name of the output path.
    #[must_use]
    pub fn split(&self) -> (&str, &str) {
        split_path(&self.path)
    }
}

/// Bind a template name to content nodes.
///
/// `template` may be given with or without a leading `/`. Multi-bindings
/// follow the tree's child order.
#[must_use]
pub fn resolve(tree: &ContentTree, template: &str) -> Vec<Binding> {
    let name = if template.starts_with('/') {
        template.to_string()
    } else {
        format!("/{template}")
    };

    if is_wildcard(&name)
        && let Some(bindings) = expand(tree, &name, 0)
    {
        debug!(template = %name, bindings = bindings.len(), "wildcard template");
        return bindings;
    }

    let node = bind_single(tree, &name);
    vec![Binding { path: name, node }]
}

/// Whether the file stem or the immediate parent directory is the wildcard.
fn is_wildcard(name: &str) -> bool {
    let (dir, file) = split_path(name);
    let parent = dir.rsplit('/').next().unwrap_or_default();
    file_stem(file) == WILDCARD || parent == WILDCARD
}

/// Expand the first wildcard at or after byte offset `from`.
///
/// Returns `None` when no wildcard remains, which ends the recursion. Each
/// level starts its search after the substituted child name, so the depth is
/// bounded by the number of tokens in the name.
fn expand(tree: &ContentTree, name: &str, from: usize) -> Option<Vec<Binding>> {
    let at = find_wildcard(name, from)?;
    let prefix = &name[..at];
    let suffix = &name[at + WILDCARD.len()..];

    let parent = match tree.get_by_url(prefix) {
        Ok(parent) => parent,
        Err(err) => {
            warn!(template = %name, %err, "wildcard prefix has no content, nothing to render");
            return Some(Vec::new());
        }
    };

    let mut bindings = Vec::new();
    for &child in tree.children(parent) {
        let child_name = tree.name(child);
        let path = format!("{prefix}{child_name}{suffix}");
        match expand(tree, &path, prefix.len() + child_name.len()) {
            Some(nested) => bindings.extend(nested),
            None => {
                debug!(path = %path, node = %tree.url(child), "bound");
                bindings.push(Binding { path, node: child });
            }
        }
    }
    Some(bindings)
}

/// Byte offset of the first segment at or after `from` that is the wildcard,
/// or is a file name whose stem is the wildcard.
fn find_wildcard(name: &str, from: usize) -> Option<usize> {
    let mut start = 0;
    for segment in name.split('/') {
        if start >= from && (segment == WILDCARD || file_stem(segment) == WILDCARD) {
            return Some(start);
        }
        start += segment.len() + 1;
    }
    None
}

fn bind_single(tree: &ContentTree, name: &str) -> NodeId {
    let (dir, file) = split_path(name);
    let exact = format!("{}/{}", dir.trim_end_matches('/'), file_stem(file));

    if let Ok(node) = tree.get_by_url(&exact) {
        debug!(template = %name, node = %exact, "bound to matching node");
        return node;
    }
    if let Ok(node) = tree.get_by_url(dir) {
        debug!(template = %name, node = %dir, "bound to directory node");
        return node;
    }
    warn!(template = %name, "no content matches template, binding to root");
    tree.root()
}

/// Split `/a/b/c.html` into `("/a/b", "c.html")`; the root directory is `/`.
pub(crate) fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("/", path),
    }
}

/// File name without its last extension; dot files keep their name.
fn file_stem(file: &str) -> &str {
    match file.rfind('.') {
        Some(i) if i > 0 => &file[..i],
        _ => file,
    }
}
