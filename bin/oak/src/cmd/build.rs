//! Build command - renders every template and writes the site

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr, bail};
use oak_core::{SiteConfig, config::CONFIG_FILE};
use oak_generator::{Site, TemplateOutcome};

/// Command line overrides applied on top of the site configuration.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub config: Option<PathBuf>,
    pub content: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub templates: Option<PathBuf>,
    pub exclude: Vec<String>,
    pub primary_key: Option<String>,
    pub clean: bool,
    pub dry_run: bool,
}

impl BuildOptions {
    /// Load the configuration for `root` and apply the overrides.
    ///
    /// Exclude patterns given on the command line are added to the configured
    /// ones.
    pub fn resolve_config(&self, root: &Path) -> Result<SiteConfig> {
        let path = match &self.config {
            Some(path) if !path.exists() => bail!("configuration file not found: {}", path.display()),
            Some(path) => path.clone(),
            None => root.join(CONFIG_FILE),
        };
        let mut config = SiteConfig::load_with_env(&path)
            .wrap_err_with(|| format!("failed to load configuration from {}", path.display()))?;

        if let Some(content) = &self.content {
            config.paths.content.clone_from(content);
        }
        if let Some(output) = &self.output {
            config.paths.output.clone_from(output);
        }
        if let Some(templates) = &self.templates {
            config.paths.templates.clone_from(templates);
        }
        if let Some(key) = &self.primary_key {
            config.render.primary_key.clone_from(key);
        }
        config.render.exclude.extend(self.exclude.iter().cloned());

        config.validate().wrap_err("invalid configuration")?;
        Ok(config)
    }
}

/// Run the build command.
pub fn run(root: &Path, options: &BuildOptions) -> Result<()> {
    tracing::info!(root = %root.display(), ?options, "Starting build");

    let config = options.resolve_config(root)?;
    tracing::debug!(?config, "Loaded configuration");
    let site = Site::new(config, root);

    if options.dry_run {
        let artifacts = site.render_all().wrap_err("Rendering failed")?;
        let output_dir = site.output_dir();
        for artifact in &artifacts {
            let Some(path) = artifact.target(&output_dir) else {
                bail!(
                    "{}/{} is outside the output directory",
                    artifact.directory,
                    artifact.file_name
                );
            };
            println!("  {}", path.display());
        }
        println!();
        println!("  {} files would be written", artifacts.len());
        return Ok(());
    }

    if options.clean {
        site.clean().wrap_err("Failed to clean output directory")?;
        println!("  Cleaned {}", site.output_dir().display());
    }

    let stats = site
        .generate_with_progress(|name, outcome| match outcome {
            TemplateOutcome::Skipped => println!("  - {name} (excluded)"),
            TemplateOutcome::Rendered(artifacts) => {
                println!("  ✓ {name} ({} files)", artifacts.len());
            }
        })
        .wrap_err("Build failed")?;

    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Templates: {}", stats.templates);
    println!("  Skipped:   {}", stats.skipped);
    println!("  Files:     {}", stats.artifacts);
    println!();
    println!("  Duration:  {}ms", stats.duration_ms);
    println!("  Output:    {}", site.output_dir().display());
    println!();

    tracing::info!(?stats, "Build completed successfully");

    Ok(())
}
