//! Fetch-and-package pipeline for versioned source trees.
//!
//! Drives external VCS and archiving tools (`git`, `svn`, `wget`, `zip`) to
//! materialize a remote source tree, compress it into a zip archive, and
//! publish the archive as a downloadable catalog asset, optionally tagging
//! the owning products with the detected version:
//! - **Process running**: [`exec::CommandRunner`] with piped secret stdin
//! - **Tool checks**: [`tools`] collect-all availability probing
//! - **Fetchers**: [`fetch`] Git / Subversion / recursive-HTTP variants
//! - **Packaging & publishing**: [`package`], [`publish`], [`tag`]
//! - **Driver**: [`pipeline::BundlePipeline`]

pub mod catalog;
pub mod config;
pub mod exec;
pub mod fetch;
pub mod package;
pub mod pipeline;
pub mod publish;
pub mod tag;
pub mod tools;
pub mod workspace;

// Re-export common types for convenience
pub use catalog::*;
pub use config::*;
pub use exec::*;
pub use pipeline::*;
pub use workspace::*;
