//! Oak CLI Library
//!
//! Functionality behind the `oak` binary, exposed as a library so it can be
//! driven from tests and other tools.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use oak::cmd::build::{self, BuildOptions};
//!
//! build::run(Path::new("."), &BuildOptions::default()).unwrap();
//! ```

pub mod cmd;

use tracing::Level;
use tracing_subscriber::EnvFilter;

// Re-export core types for convenience
pub use oak_core::{ContentTree, SiteConfig};
pub use oak_generator::{BuildStats, Site};

/// Environment variable holding a log filter, e.g. `oak_generator=trace`.
/// When set it replaces the level picked by `-v`.
pub const LOG_ENV: &str = "OAK_LOG";

/// Log level for a `-v` count: warnings by default, one step per flag.
#[must_use]
pub fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber. Logs go to stderr so stdout keeps only the
/// build report; module targets are shown from `-vvv` on.
pub fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::default().add_directive(log_level(verbose).into()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 2)
        .init();
}
