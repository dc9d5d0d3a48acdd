//! Content collection from disk.
//!
//! Walks the content directory and builds the tree: every directory is a
//! branch, its `index.yaml` contributes the branch's own entries, and every
//! other YAML file becomes a child named after its file stem.

use std::{
    fs,
    path::{Path, PathBuf},
};

use oak_core::{ContentTree, NodeId};
use tracing::{debug, info};

use crate::{DocumentBuilder, ParserError, Result};

/// Stem of the container document of a directory.
pub const INDEX_STEM: &str = "index";

/// Loads a directory of YAML documents into a [`ContentTree`].
#[derive(Debug, Clone)]
pub struct ContentLoader {
    documents: DocumentBuilder,
}

impl ContentLoader {
    /// Create a loader naming sequence items by `primary_key`.
    #[must_use]
    pub fn new(primary_key: impl Into<String>) -> Self {
        Self {
            documents: DocumentBuilder::new(primary_key),
        }
    }

    /// Load all content below `dir`.
    ///
    /// A missing directory yields a tree with an empty root.
    pub fn load(&self, dir: &Path) -> Result<ContentTree> {
        info!(dir = %dir.display(), "loading content");

        let mut tree = ContentTree::new();
        if dir.is_dir() {
            let root = tree.root();
            self.load_dir(&mut tree, root, dir)?;
        } else {
            debug!(dir = %dir.display(), "content directory does not exist");
        }

        info!(nodes = tree.node_count(), "content loaded");
        Ok(tree)
    }

    fn load_dir(&self, tree: &mut ContentTree, node: NodeId, dir: &Path) -> Result<()> {
        let entries = sorted_entries(dir)?;

        // the container document goes first so its keys precede files and folders
        let mut indexes = entries
            .iter()
            .filter(|path| path.is_file() && is_yaml(path) && file_stem(path) == Some(INDEX_STEM));
        let index = indexes.next();
        if indexes.next().is_some() {
            return Err(ParserError::invalid(dir, "multiple container documents"));
        }
        if let Some(index) = index {
            debug!(path = %index.display(), "container document");
            let value = self.documents.parse(&read(index)?, index)?;
            self.documents.merge(tree, node, &value, index)?;
        }

        for path in &entries {
            let Some(stem) = file_stem(path) else {
                continue;
            };

            if path.is_dir() {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| ParserError::invalid(path, "non UTF-8 directory name"))?;
                let child = tree
                    .add_branch(node, name)
                    .map_err(|source| ParserError::Tree {
                        path: path.clone(),
                        source,
                    })?;
                self.load_dir(tree, child, path)?;
            } else if path.is_file() && is_yaml(path) && stem != INDEX_STEM {
                debug!(path = %path.display(), "document");
                let value = self.documents.parse(&read(path)?, path)?;
                self.documents.graft(tree, node, stem, &value, path)?;
            }
        }

        Ok(())
    }
}

/// Directory entries sorted by file name, hidden entries skipped.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let io_err = |source| ParserError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('.'))
        {
            continue;
        }
        entries.push(path);
    }
    entries.sort();
    Ok(entries)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ParserError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

fn file_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn sample_site() -> TempDir {
        let dir = TempDir::new().unwrap();
        let doc = "title: Test document\ncontent: Test data\n";
        write(dir.path(), "index.yaml", "meta:\n  title: My site\n");
        write(dir.path(), "document.yaml", doc);
        write(dir.path(), "folder1/document.yaml", doc);
        write(dir.path(), "folder2/document.yml", doc);
        write(dir.path(), "folder2/notes.txt", "ignored");
        write(dir.path(), ".hidden.yaml", "secret: yes");
        dir
    }

    #[test]
    fn test_load_directory_tree() {
        let dir = sample_site();
        let tree = ContentLoader::new("id").load(dir.path()).unwrap();

        let names: Vec<_> = tree
            .children(tree.root())
            .iter()
            .map(|&c| tree.name(c))
            .collect();
        assert_eq!(names, ["meta", "document", "folder1", "folder2"]);

        let title = tree.get_by_url("/folder2/document/title").unwrap();
        assert_eq!(tree[title].value(), Some("Test document"));
        assert!(tree.get_by_url("/folder2/notes").is_err());
    }

    #[test]
    fn test_nested_index_document() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "blog/index.yaml", "title: Blog\n");
        write(dir.path(), "blog/post.yaml", "title: Post\n");

        let tree = ContentLoader::new("id").load(dir.path()).unwrap();
        let blog = tree.get_by_url("/blog").unwrap();
        let names: Vec<_> = tree.children(blog).iter().map(|&c| tree.name(c)).collect();
        assert_eq!(names, ["title", "post"]);
    }

    #[test]
    fn test_name_collision_is_an_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.yaml", "document: inline\n");
        write(dir.path(), "document.yaml", "title: file\n");

        let result = ContentLoader::new("id").load(dir.path());
        assert!(matches!(result, Err(ParserError::Tree { .. })));
    }

    #[test]
    fn test_two_container_documents_are_an_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "blog/index.yaml", "title: Blog\n");
        write(dir.path(), "blog/index.yml", "subtitle: Posts\n");

        match ContentLoader::new("id").load(dir.path()) {
            Err(ParserError::InvalidDocument { path, message }) => {
                assert_eq!(path, dir.path().join("blog"));
                assert_eq!(message, "multiple container documents");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_directory_gives_empty_root() {
        let dir = TempDir::new().unwrap();
        let tree = ContentLoader::new("id")
            .load(&dir.path().join("missing"))
            .unwrap();
        assert_eq!(tree.node_count(), 1);
    }
}
