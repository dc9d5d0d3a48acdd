//! Oak Generator Library
//!
//! Static site generation engine for Oak: binds templates to content nodes,
//! renders them and writes the results.
//!
//! # Modules
//!
//! - [`template`] - template loading on top of MiniJinja
//! - [`filters`] - formatting filters registered with every environment
//! - [`node`] - content nodes as template values, render contexts
//! - [`resolver`] - template name to content node bindings
//! - [`render`] - rendering pipeline producing output artifacts
//! - [`page`] - single node rendering through node metadata templates
//! - [`build`] - build orchestration

pub mod build;
pub mod filters;
pub mod node;
pub mod page;
pub mod render;
pub mod resolver;
pub mod template;

pub use build::{BuildError, BuildStats, Site};
pub use filters::register_filters;
pub use node::{NodeObject, RenderContext, RenderScope};
pub use page::{MetaPage, render_detail, render_preview};
pub use render::{Excludes, OutputArtifact, Renderer, TemplateOutcome};
pub use resolver::{Binding, WILDCARD, resolve};
pub use template::{TemplateError, TemplateSet};
