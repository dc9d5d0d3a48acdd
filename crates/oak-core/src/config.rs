//! Site configuration management.

use std::{
    borrow::Cow,
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Configuration file expected in the site root.
pub const CONFIG_FILE: &str = "oak.toml";

/// Main configuration structure for Oak.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Rendering settings.
    #[serde(default)]
    pub render: RenderConfig,
}

/// Directory layout, relative to the site root unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Content documents.
    #[serde(default = "default_content_dir")]
    pub content: PathBuf,

    /// Generated files.
    #[serde(default = "default_output_dir")]
    pub output: PathBuf,

    /// Template files.
    #[serde(default = "default_template_dir")]
    pub templates: PathBuf,
}

/// Rendering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Regular expressions; templates whose name matches any of them are skipped.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Field naming the items of a YAML sequence.
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    /// Encoding of written files.
    #[serde(default)]
    pub encoding: Encoding,
}

/// Text encoding used when persisting rendered output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8", alias = "UTF-8")]
    Utf8,
    #[serde(
        rename = "latin-1",
        alias = "latin1",
        alias = "iso-8859-1",
        alias = "ISO-8859-1"
    )]
    Latin1,
}

impl Encoding {
    /// Canonical label of the encoding.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin-1",
        }
    }

    /// Encode text, returning the first character that cannot be represented
    /// on failure.
    pub fn encode(self, text: &str) -> std::result::Result<Cow<'_, [u8]>, char> {
        match self {
            Self::Utf8 => Ok(Cow::Borrowed(text.as_bytes())),
            Self::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).map_err(|_| c))
                .collect::<std::result::Result<Vec<u8>, char>>()
                .map(Cow::Owned),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_primary_key() -> String {
    "id".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: default_content_dir(),
            output: default_output_dir(),
            templates: default_template_dir(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            primary_key: default_primary_key(),
            encoding: Encoding::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: SiteConfig = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration using the config crate, overlaid with `OAK__*`
    /// environment variables (e.g. `OAK__RENDER__PRIMARY_KEY`).
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("OAK").separator("__"))
            .build()?;

        let config: SiteConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("paths.content", &self.paths.content),
            ("paths.output", &self.paths.output),
            ("paths.templates", &self.paths.templates),
        ] {
            if value.as_os_str().is_empty() {
                return Err(CoreError::config(format!("{field} cannot be empty")));
            }
        }

        if self.render.primary_key.is_empty() {
            return Err(CoreError::config("render.primary_key cannot be empty"));
        }

        if self.paths.output == self.paths.content || self.paths.output == self.paths.templates {
            tracing::warn!(
                output = %self.paths.output.display(),
                "paths.output overlaps an input directory and will be wiped by clean"
            );
        }

        Ok(())
    }
}
