//! Build orchestration.
//!
//! Loads content and templates from a site root, renders every template and
//! writes the artifacts below the output directory.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use oak_core::{ContentTree, CoreError, Encoding, SiteConfig};
use oak_parser::{ContentLoader, ParserError};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    render::{Excludes, OutputArtifact, Renderer, TemplateOutcome},
    template::{TemplateError, TemplateSet},
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error.
    #[error("IO error in {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template loading or rendering error.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Content loading error.
    #[error(transparent)]
    Parser(#[from] ParserError),

    /// Invalid exclude pattern.
    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Rendered text not representable in the output encoding.
    #[error("{path}: {character:?} cannot be encoded as {encoding}")]
    Encoding {
        path: PathBuf,
        encoding: Encoding,
        character: char,
    },

    /// Output path leaving the output directory, e.g. through a `..` segment.
    #[error("{directory}/{file_name} is outside the output directory")]
    OutsideOutput {
        directory: String,
        file_name: String,
    },

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] CoreError),
}

impl BuildError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Templates rendered.
    pub templates: usize,

    /// Files written.
    pub artifacts: usize,

    /// Templates left out by exclude patterns.
    pub skipped: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// A site on disk: content, templates and output below one root.
#[derive(Debug, Clone)]
pub struct Site {
    config: SiteConfig,
    root: PathBuf,
}

impl Site {
    /// Create a site; relative paths in `config` are taken from `root`.
    #[must_use]
    pub fn new(config: SiteConfig, root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            root: root.into(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn content_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.content)
    }

    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.output)
    }

    #[must_use]
    pub fn template_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.templates)
    }

    pub fn load_tree(&self) -> Result<ContentTree> {
        let loader = ContentLoader::new(&self.config.render.primary_key);
        let tree = loader.load(&self.content_dir())?;
        debug!("content tree:\n{tree}");
        Ok(tree)
    }

    pub fn load_templates(&self) -> Result<TemplateSet> {
        Ok(TemplateSet::from_dir(&self.template_dir())?)
    }

    pub fn excludes(&self) -> Result<Excludes> {
        Ok(Excludes::new(&self.config.render.exclude)?)
    }

    /// Load content and templates into a renderer.
    pub fn renderer(&self) -> Result<Renderer> {
        self.config.validate()?;
        let renderer = Renderer::new(self.load_templates()?, self.load_tree()?)
            .with_encoding(self.config.render.encoding);
        Ok(renderer)
    }

    /// Render every template without writing anything.
    pub fn render_all(&self) -> Result<Vec<OutputArtifact>> {
        let excludes = self.excludes()?;
        Ok(self.renderer()?.render_all(&excludes)?)
    }

    /// Render every template and write the results.
    pub fn generate(&self) -> Result<BuildStats> {
        self.generate_with_progress(|_, _| {})
    }

    /// Like [`generate`](Self::generate), reporting each template as it is
    /// rendered or skipped.
    pub fn generate_with_progress<F>(&self, mut observe: F) -> Result<BuildStats>
    where
        F: FnMut(&str, TemplateOutcome<'_>),
    {
        let start = Instant::now();
        let mut stats = BuildStats::default();

        info!(
            content = %self.content_dir().display(),
            templates = %self.template_dir().display(),
            output = %self.output_dir().display(),
            "starting build"
        );

        let excludes = self.excludes()?;
        let renderer = self.renderer()?;
        let artifacts = renderer.render_all_with(&excludes, |name, outcome| {
            match outcome {
                TemplateOutcome::Skipped => stats.skipped += 1,
                TemplateOutcome::Rendered(_) => stats.templates += 1,
            }
            observe(name, outcome);
        })?;

        let output_dir = self.output_dir();
        for artifact in &artifacts {
            persist(&output_dir, artifact)?;
            stats.artifacts += 1;
        }

        stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            templates = stats.templates,
            artifacts = stats.artifacts,
            skipped = stats.skipped,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Remove the output directory and recreate it empty.
    pub fn clean(&self) -> Result<()> {
        let dir = self.output_dir();
        if dir.exists() {
            debug!(dir = %dir.display(), "cleaning output directory");
            fs::remove_dir_all(&dir).map_err(BuildError::io(&dir))?;
        }
        fs::create_dir_all(&dir).map_err(BuildError::io(&dir))?;
        Ok(())
    }
}

/// Write one artifact below `output_dir`, creating directories as needed and
/// replacing any existing file.
pub fn persist(output_dir: &Path, artifact: &OutputArtifact) -> Result<PathBuf> {
    let path = artifact
        .target(output_dir)
        .ok_or_else(|| BuildError::OutsideOutput {
            directory: artifact.directory.clone(),
            file_name: artifact.file_name.clone(),
        })?;
    let bytes = artifact.encoded().map_err(|character| BuildError::Encoding {
        path: path.clone(),
        encoding: artifact.encoding,
        character,
    })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(BuildError::io(parent))?;
    }
    fs::write(&path, &bytes).map_err(BuildError::io(&path))?;

    debug!(path = %path.display(), bytes = bytes.len(), "wrote artifact");
    Ok(path)
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
        write(dir.path(), "content/index.yaml", "meta:\n  title: Oak\n");
        write(dir.path(), "content/posts/hello.yaml", "title: Hello\n");
        write(dir.path(), "content/posts/bye.yaml", "title: Bye\n");
        write(dir.path(), "templates/index.html", "{{ META.TITLE }}");
        write(dir.path(), "templates/posts/_children.html", "{{ title }}");
        dir
    }

    #[test]
    fn test_generate() {
        let dir = sample_site();
        let site = Site::new(SiteConfig::default(), dir.path());

        let stats = site.generate().unwrap();
        assert_eq!(stats.templates, 2);
        assert_eq!(stats.artifacts, 3);
        assert_eq!(stats.skipped, 0);

        let out = site.output_dir();
        assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), "Oak");
        assert_eq!(fs::read_to_string(out.join("posts/bye.html")).unwrap(), "Bye");
        assert_eq!(fs::read_to_string(out.join("posts/hello.html")).unwrap(), "Hello");
    }

    #[test]
    fn test_generate_overwrites() {
        let dir = sample_site();
        write(dir.path(), "output/index.html", "stale");
        let site = Site::new(SiteConfig::default(), dir.path());
        site.generate().unwrap();
        assert_eq!(
            fs::read_to_string(site.output_dir().join("index.html")).unwrap(),
            "Oak"
        );
    }

    #[test]
    fn test_excluded_templates_are_counted() {
        let dir = sample_site();
        let mut config = SiteConfig::default();
        config.render.exclude = vec!["posts/".to_string()];
        let site = Site::new(config, dir.path());

        let mut seen = Vec::new();
        let stats = site
            .generate_with_progress(|name, _| seen.push(name.to_string()))
            .unwrap();
        assert_eq!(stats.templates, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(seen, ["index.html", "posts/_children.html"]);
        assert!(!site.output_dir().join("posts").exists());
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let dir = sample_site();
        let mut config = SiteConfig::default();
        config.render.exclude = vec!["[".to_string()];
        let site = Site::new(config, dir.path());
        assert!(matches!(site.generate(), Err(BuildError::Pattern(_))));
    }

    #[test]
    fn test_render_all_writes_nothing() {
        let dir = sample_site();
        let site = Site::new(SiteConfig::default(), dir.path());
        let artifacts = site.render_all().unwrap();
        assert_eq!(artifacts.len(), 3);
        assert!(!site.output_dir().exists());
    }

    #[test]
    fn test_clean() {
        let dir = sample_site();
        let site = Site::new(SiteConfig::default(), dir.path());
        site.generate().unwrap();

        site.clean().unwrap();
        let out = site.output_dir();
        assert!(out.is_dir());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_clean_creates_missing_output() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(SiteConfig::default(), dir.path());
        site.clean().unwrap();
        assert!(site.output_dir().is_dir());
    }

    #[test]
    fn test_latin1_output() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "templates/page.txt", "Küche");
        let mut config = SiteConfig::default();
        config.render.encoding = Encoding::Latin1;
        let site = Site::new(config, dir.path());

        site.generate().unwrap();
        let bytes = fs::read(site.output_dir().join("page.txt")).unwrap();
        assert_eq!(bytes, b"K\xfcche");
    }

    #[test]
    fn test_unencodable_output() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "templates/page.txt", "5 €");
        let mut config = SiteConfig::default();
        config.render.encoding = Encoding::Latin1;
        let site = Site::new(config, dir.path());

        match site.generate() {
            Err(BuildError::Encoding { character, .. }) => assert_eq!(character, '€'),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_persist_refuses_paths_outside_output() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("output");
        let artifact = OutputArtifact {
            file_name: "index.html".to_string(),
            directory: "..".to_string(),
            content: "escaped".to_string(),
            encoding: Encoding::Utf8,
        };

        assert!(matches!(
            persist(&output, &artifact),
            Err(BuildError::OutsideOutput { .. })
        ));
        assert!(!dir.path().join("index.html").exists());
    }

    #[test]
    fn test_dot_dot_content_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "content/index.yaml", "\"..\":\n  title: escaped\n");
        write(dir.path(), "templates/_children/index.html", "{{ title }}");
        let site = Site::new(SiteConfig::default(), dir.path());

        assert!(matches!(site.generate(), Err(BuildError::Parser(_))));
        assert!(!dir.path().join("index.html").exists());
    }

    #[test]
    fn test_build_stats_default() {
        let stats = BuildStats::default();
        assert_eq!(stats.templates, 0);
        assert_eq!(stats.duration_ms, 0);
    }
}
