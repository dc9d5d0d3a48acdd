//! Rendering pipeline.
//!
//! Turns every template of a [`TemplateSet`] into output artifacts by binding
//! it to content nodes and rendering it once per binding.

use std::{
    borrow::Cow,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use oak_core::{ContentTree, Encoding, NodeId};
use regex::RegexSet;
use tracing::{debug, info};

use crate::{
    node::{RenderContext, RenderScope},
    resolver::resolve,
    template::{Result, TemplateSet},
};

/// A rendered file waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    /// File name, extension included.
    pub file_name: String,
    /// Directory relative to the output root, `/` separated, empty for the root.
    pub directory: String,
    pub content: String,
    pub encoding: Encoding,
}

impl OutputArtifact {
    /// Path relative to the output root.
    ///
    /// `None` when any part of it is not a plain name (`..`, a root or a
    /// prefix), since such a path would leave the output root.
    #[must_use]
    pub fn relative_path(&self) -> Option<PathBuf> {
        let mut path = PathBuf::new();
        path.extend(self.directory.split('/').filter(|s| !s.is_empty()));
        path.push(&self.file_name);
        path.components()
            .all(|c| matches!(c, Component::Normal(_)))
            .then_some(path)
    }

    /// Path below `output_root`, `None` if it would escape it.
    #[must_use]
    pub fn target(&self, output_root: &Path) -> Option<PathBuf> {
        self.relative_path().map(|path| output_root.join(path))
    }

    /// Content in the declared encoding, or the first character it cannot hold.
    pub fn encoded(&self) -> std::result::Result<Cow<'_, [u8]>, char> {
        self.encoding.encode(&self.content)
    }
}

/// Template name patterns left out of a run.
///
/// Each pattern is a regular expression anchored at the start of the template
/// name, the name being taken without a leading `/`.
#[derive(Debug, Clone)]
pub struct Excludes {
    set: RegexSet,
}

impl Excludes {
    pub fn new<I, S>(patterns: I) -> std::result::Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let anchored = patterns
            .into_iter()
            .map(|p| format!("^(?:{})", p.as_ref()));
        Ok(Self {
            set: RegexSet::new(anchored)?,
        })
    }

    #[must_use]
    pub fn is_excluded(&self, template: &str) -> bool {
        self.set.is_match(template.trim_start_matches('/'))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

impl Default for Excludes {
    fn default() -> Self {
        Self {
            set: RegexSet::empty(),
        }
    }
}

/// What happened to one template during [`Renderer::render_all_with`].
#[derive(Debug, Clone, Copy)]
pub enum TemplateOutcome<'a> {
    Skipped,
    Rendered(&'a [OutputArtifact]),
}

/// Renders templates against a content tree.
#[derive(Debug, Clone)]
pub struct Renderer {
    templates: TemplateSet,
    scope: RenderScope,
    encoding: Encoding,
}

impl Renderer {
    #[must_use]
    pub fn new(templates: TemplateSet, tree: ContentTree) -> Self {
        let scope = RenderScope::new(Arc::new(tree), Arc::clone(templates.environment()));
        Self {
            templates,
            scope,
            encoding: Encoding::default(),
        }
    }

    /// Encoding stamped on produced artifacts.
    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    #[must_use]
    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    #[must_use]
    pub fn scope(&self) -> &RenderScope {
        &self.scope
    }

    #[must_use]
    pub fn tree(&self) -> &ContentTree {
        self.scope.tree()
    }

    /// Render context for a template bound to `node`.
    #[must_use]
    pub fn context(&self, node: NodeId) -> RenderContext {
        self.scope.context(node)
    }

    /// Render one template once per binding, in binding order.
    pub fn render_template(&self, name: &str) -> Result<Vec<OutputArtifact>> {
        let bindings = resolve(self.tree(), name);
        let mut artifacts = Vec::with_capacity(bindings.len());

        for binding in bindings {
            let (directory, file_name) = binding.split();
            let content = self
                .scope
                .checked(|| self.templates.render(name, self.context(binding.node)))?;
            debug!(template = name, path = %binding.path, bytes = content.len(), "rendered");
            artifacts.push(OutputArtifact {
                file_name: file_name.to_string(),
                directory: directory.trim_start_matches('/').to_string(),
                content,
                encoding: self.encoding,
            });
        }

        Ok(artifacts)
    }

    /// Render every template not excluded, in enumeration order.
    pub fn render_all(&self, excludes: &Excludes) -> Result<Vec<OutputArtifact>> {
        self.render_all_with(excludes, |_, _| {})
    }

    /// Like [`render_all`](Self::render_all), reporting each template as it
    /// is handled. The first failure aborts the run.
    pub fn render_all_with<F>(&self, excludes: &Excludes, mut observe: F) -> Result<Vec<OutputArtifact>>
    where
        F: FnMut(&str, TemplateOutcome<'_>),
    {
        let mut artifacts = Vec::new();
        let mut skipped = 0;

        for name in self.templates.names() {
            if excludes.is_excluded(name) {
                debug!(template = %name, "excluded");
                skipped += 1;
                observe(name, TemplateOutcome::Skipped);
                continue;
            }

            let rendered = self.render_template(name)?;
            observe(name, TemplateOutcome::Rendered(&rendered));
            artifacts.extend(rendered);
        }

        info!(
            templates = self.templates.names().len() - skipped,
            skipped,
            artifacts = artifacts.len(),
            "rendering complete"
        );
        Ok(artifacts)
    }
}
