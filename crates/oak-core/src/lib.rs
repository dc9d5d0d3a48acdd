//! Oak Core Library
//!
//! Content tree, configuration, and error handling for the Oak static site generator.

pub mod config;
pub mod error;
pub mod tree;

pub use config::{Encoding, SiteConfig};
pub use error::{CoreError, Result, TreeError};
pub use tree::{ChildValue, ContentNode, ContentTree, Metadata, NodeId, NodeKind};
