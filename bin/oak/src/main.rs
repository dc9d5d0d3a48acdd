//! Oak CLI
//!
//! Renders a tree of YAML content through a directory of Jinja templates.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use oak::cmd::build::{self, BuildOptions};

/// Command-line interface for Oak.
#[derive(Parser)]
#[command(
    name = "oak",
    version,
    about = "A static site generator mapping YAML content onto templates"
)]
struct Cli {
    /// Site root; relative paths are taken from here
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Path to configuration file [default: <ROOT>/oak.toml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Content directory
    #[arg(short, long)]
    content: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Template directory
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Skip templates whose name matches this regular expression (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Field naming the items of YAML lists
    #[arg(short = 'k', long)]
    primary_key: Option<String>,

    /// Empty the output directory before generating
    #[arg(long)]
    clean: bool,

    /// List the files that would be written without writing them
    #[arg(long, conflicts_with = "clean")]
    dry_run: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn build_options(self) -> (PathBuf, BuildOptions) {
        let options = BuildOptions {
            config: self.config,
            content: self.content,
            output: self.output,
            templates: self.templates,
            exclude: self.exclude,
            primary_key: self.primary_key,
            clean: self.clean,
            dry_run: self.dry_run,
        };
        (self.root, options)
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    oak::init_tracing(cli.verbose);

    let (root, options) = cli.build_options();
    build::run(&root, &options)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["oak"]);
        assert_eq!(cli.root, PathBuf::from("."));
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
        assert!(cli.exclude.is_empty());
        assert!(!cli.clean);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_directories() {
        let args = [
            "oak", "site", "-c", "data", "-o", "public", "-t", "layouts",
        ];
        let (root, options) = Cli::parse_from(args).build_options();
        assert_eq!(root, PathBuf::from("site"));
        assert_eq!(options.content, Some(PathBuf::from("data")));
        assert_eq!(options.output, Some(PathBuf::from("public")));
        assert_eq!(options.templates, Some(PathBuf::from("layouts")));
    }

    #[test]
    fn test_cli_repeated_excludes() {
        let args = ["oak", "-x", "folder2/.*", "--exclude", "^_"];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.exclude, ["folder2/.*", "^_"]);
    }

    #[test]
    fn test_cli_primary_key_and_flags() {
        let args = ["oak", "-k", "slug", "--clean", "-vv"];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.primary_key.as_deref(), Some("slug"));
        assert!(cli.clean);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_dry_run_conflicts_with_clean() {
        let result = Cli::try_parse_from(["oak", "--clean", "--dry-run"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_custom_config_path() {
        let cli = Cli::parse_from(["oak", "--config", "site.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("site.toml")));
    }
}
