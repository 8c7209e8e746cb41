use std::path::PathBuf;

use crate::io::IoError;

/// Fatal failures of the merge pipeline.
///
/// Malformed markdown and unresolved links are not errors; they are reported
/// through [`crate::Diagnostics`] and processing continues.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Unknown repository identifier '{0}'")]
    UnknownRepository(String),
    #[error("Documentation item '{0}' already exists")]
    DuplicateItem(String),
    #[error("Repository '{repo_id}' has no '{home_file}' home file")]
    MissingHomeFile { repo_id: String, home_file: String },
    #[error("Directory {dir} contains both '{home_file}' and '{target_home_file}'")]
    ConflictingHomeFiles {
        dir: PathBuf,
        home_file: String,
        target_home_file: String,
    },
    #[error("Repository '{repo_id}' has no checkout at {path}")]
    MissingCheckout { repo_id: String, path: PathBuf },
    #[error("Repository index lists '{0}' but it was not loaded")]
    InconsistentIndex(String),
    #[error("Invalid ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("Failed to render front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
    #[error("{0} warning(s) reported while warnings are treated as errors")]
    TooManyWarnings(usize),
}
