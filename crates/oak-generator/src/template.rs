//! Template loading on top of MiniJinja.
//!
//! A template's logical name is its path below the template directory with
//! `/` separators and the extension kept, e.g. `about/index.html`. All
//! templates share one environment so `{% include %}` and `{% extends %}`
//! work between them.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::filters::register_filters;

/// Template errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template not found.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Syntax, filter or render error raised by the engine.
    #[error("template error: {0}")]
    Engine(#[from] minijinja::Error),

    /// A branch printed through its `preview` template failed to render.
    #[error("preview of {node} failed: {source}")]
    Preview {
        node: String,
        #[source]
        source: minijinja::Error,
    },

    /// IO error while reading template files.
    #[error("IO error in {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory walk error.
    #[error("cannot list templates: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Every template known to a site, in enumeration order.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    env: Arc<Environment<'static>>,
    names: Vec<String>,
}

impl TemplateSet {
    /// Load every file below `dir`.
    ///
    /// Files are enumerated in file name order, depth first; hidden files and
    /// directories are skipped. A missing directory gives an empty set.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        info!(dir = %dir.display(), "loading templates");

        let mut pairs = Vec::new();
        if dir.is_dir() {
            let walker = WalkDir::new(dir)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
            for entry in walker {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                let name = logical_name(dir, path);
                let source = fs::read_to_string(path).map_err(|source| TemplateError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                pairs.push((name, source));
            }
        }

        Self::from_pairs(pairs)
    }

    /// Build a set from `(name, source)` pairs, keeping their order.
    pub fn from_pairs<N, S>(pairs: impl IntoIterator<Item = (N, S)>) -> Result<Self>
    where
        N: Into<String>,
        S: Into<String>,
    {
        let mut env = new_environment();
        let mut names = Vec::new();
        for (name, source) in pairs {
            let name = name.into();
            debug!(template = %name, "compiling template");
            env.add_template_owned(name.clone(), source.into())?;
            names.push(name);
        }

        info!(count = names.len(), "templates loaded");
        Ok(Self {
            env: Arc::new(env),
            names,
        })
    }

    /// Template names in enumeration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// The shared environment, filters registered.
    #[must_use]
    pub fn environment(&self) -> &Arc<Environment<'static>> {
        &self.env
    }

    /// Render a named template.
    pub fn render<C: Serialize>(&self, name: &str, context: C) -> Result<String> {
        if !self.contains(name) {
            return Err(TemplateError::NotFound(name.to_string()));
        }
        let template = self.env.get_template(name)?;
        Ok(template.render(context)?)
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            env: Arc::new(new_environment()),
            names: Vec::new(),
        }
    }
}

/// Environment with filters registered and autoescaping off; output is
/// written exactly as the templates produce it.
fn new_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::None);
    register_filters(&mut env);
    env
}

fn logical_name(dir: &Path, path: &Path) -> String {
    path.strip_prefix(dir)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
