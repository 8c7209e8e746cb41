//! Merges markdown documentation from several repositories into one site.
//!
//! Documents are parsed into lines of entities, rewritten by an ordered list
//! of passes and written back; lines no pass touched keep their exact text.

pub mod database;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod io;
pub mod links;
pub mod model;
pub mod parsing;
pub mod passes;
pub mod repository;

#[cfg(test)]
pub mod tests;

pub use database::{DocumentationDatabase, DocumentationItem, ItemKind};
pub use diagnostics::{Diagnostics, Severity, WarningLevel};
pub use document::{Document, MetadataNode, MetadataTree};
pub use error::EngineError;
pub use io::materialize::{DocumentOrigins, RepositorySource, materialize_repository};
pub use links::{LinkRecord, LinkReport};
pub use passes::{DocumentPass, FrontMatter, default_passes, run_passes};
pub use repository::{GlobalParams, IgnorePatterns, RemoteDescriptor, RepositoryIndex, RepositoryParams};
