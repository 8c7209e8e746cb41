//! Per-repository file listings and effective parameters.

pub mod paths;

use std::collections::BTreeSet;
use std::path::Path;

use relative_path::RelativePath;

use crate::error::EngineError;
use crate::io::scan_tree;

/// Ignore list applied to file and directory names.
///
/// Entries are glob patterns matched against a single name, so both exact
/// names (`_Sidebar.md`) and suffix patterns (`*.sh`) work.
#[derive(Debug, Clone, Default)]
pub struct IgnorePatterns {
    patterns: Vec<glob::Pattern>,
}

impl IgnorePatterns {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, EngineError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p.as_ref()).map_err(|source| EngineError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }
}

/// Where a repository is published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDescriptor {
    /// Repository URL without `.git` or a trailing slash.
    pub base_url: String,
    pub branch: Option<String>,
    pub tag: Option<String>,
}

impl RemoteDescriptor {
    pub const DEFAULT_BRANCH: &'static str = "develop";

    pub fn new(remote: &str, branch: Option<String>, tag: Option<String>) -> Self {
        let trimmed = remote.trim_end_matches('/');
        let base_url = trimmed.strip_suffix(".git").unwrap_or(trimmed).to_string();
        Self {
            base_url,
            branch,
            tag,
        }
    }

    /// Tag if set, otherwise the branch.
    pub fn reference(&self) -> &str {
        self.tag
            .as_deref()
            .or(self.branch.as_deref())
            .unwrap_or(Self::DEFAULT_BRANCH)
    }

    /// Prefix of full links to files of this repository.
    pub fn cross_reference_base(&self) -> String {
        format!("{}/blob/{}", self.base_url, self.reference())
    }

    /// Prefix of full links to directories of this repository.
    pub fn tree_base(&self) -> String {
        format!("{}/tree/{}", self.base_url, self.reference())
    }

    /// Prefix of source-browser links.
    pub fn sources_base(&self) -> String {
        self.cross_reference_base()
    }
}

/// Effective parameters of one repository.
#[derive(Debug, Clone)]
pub struct RepositoryParams {
    pub docs_folder: String,
    pub home_file: String,
    pub auxiliary_documents: Vec<String>,
    pub ignored: IgnorePatterns,
    pub single_document_file: Option<String>,
    pub private_product_website: Option<String>,
}

impl Default for RepositoryParams {
    fn default() -> Self {
        Self {
            docs_folder: "docs".to_string(),
            home_file: "Home.md".to_string(),
            auxiliary_documents: Vec::new(),
            ignored: IgnorePatterns::default(),
            single_document_file: None,
            private_product_website: None,
        }
    }
}

/// Parameters shared by every repository.
#[derive(Debug, Clone)]
pub struct GlobalParams {
    pub target_home_file: String,
    pub markdown_extensions: Vec<String>,
    pub image_extensions: Vec<String>,
    pub release_identifier: Option<String>,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            target_home_file: "index.md".to_string(),
            markdown_extensions: vec!["md".to_string()],
            image_extensions: ["png", "jpg", "jpeg", "gif", "svg"]
                .map(String::from)
                .to_vec(),
            release_identifier: None,
        }
    }
}

impl GlobalParams {
    pub fn is_markdown(&self, path: &str) -> bool {
        paths::extension(path)
            .is_some_and(|ext| self.markdown_extensions.iter().any(|m| m.eq_ignore_ascii_case(ext)))
    }

    pub fn is_image(&self, path: &str) -> bool {
        paths::extension(path)
            .is_some_and(|ext| self.image_extensions.iter().any(|m| m.eq_ignore_ascii_case(ext)))
    }

    /// `path` without a markdown extension.
    pub fn strip_markdown_extension<'a>(&self, path: &'a str) -> &'a str {
        if self.is_markdown(path) {
            path.rsplit_once('.').map_or(path, |(stem, _)| stem)
        } else {
            path
        }
    }
}

/// Files of one repository inside the merged site.
///
/// Paths are site paths and start with the repository identifier, e.g.
/// `mobile-sdk/guide/setup.md`.
#[derive(Debug, Clone)]
pub struct RepositoryIndex {
    pub repo_id: String,
    pub remote: RemoteDescriptor,
    pub params: RepositoryParams,
    target_home_file: String,
    files: BTreeSet<String>,
    dirs: BTreeSet<String>,
}

impl RepositoryIndex {
    pub fn new(
        repo_id: &str,
        remote: RemoteDescriptor,
        params: RepositoryParams,
        global: &GlobalParams,
    ) -> Self {
        Self {
            repo_id: repo_id.to_string(),
            remote,
            params,
            target_home_file: global.target_home_file.clone(),
            files: BTreeSet::new(),
            dirs: BTreeSet::new(),
        }
    }

    /// Lists `<site_root>/<repo_id>` recursively, skipping ignored names.
    pub fn scan(&mut self, site_root: &Path) -> Result<(), EngineError> {
        let root = site_root.join(&self.repo_id);
        let ignored = &self.params.ignored;
        let entries = scan_tree(&root, &|name: &str| ignored.matches(name))?;
        for entry in entries {
            let path = format!("{}/{}", self.repo_id, entry.path);
            if entry.is_dir {
                self.dirs.insert(path);
            } else {
                self.files.insert(path);
            }
        }
        log::debug!(
            "indexed repository '{}': {} files, {} directories",
            self.repo_id,
            self.files.len(),
            self.dirs.len()
        );
        Ok(())
    }

    pub fn insert_file(&mut self, path: &RelativePath) {
        self.files.insert(self.site_path(path.as_str()));
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    pub fn dirs(&self) -> impl Iterator<Item = &str> {
        self.dirs.iter().map(String::as_str)
    }

    /// Site path of the repository home page.
    pub fn home_path(&self) -> String {
        format!("{}/{}", self.repo_id, self.target_home_file)
    }

    pub fn target_home_file(&self) -> &str {
        &self.target_home_file
    }

    pub fn is_single_document(&self) -> bool {
        self.params.single_document_file.is_some()
    }

    pub fn is_auxiliary(&self, file_name: &str) -> bool {
        self.params.auxiliary_documents.iter().any(|a| a == file_name)
    }

    /// Normalized site path, prefixing the repository identifier if missing.
    pub fn site_path(&self, path: &str) -> String {
        let normalized = paths::normalize(path);
        let prefix = format!("{}/", self.repo_id);
        if normalized.as_str() == self.repo_id || normalized.as_str().starts_with(&prefix) {
            normalized.into_string()
        } else {
            format!("{prefix}{normalized}")
        }
    }

    /// True if `path` names a file or directory of this repository. The
    /// repository identifier prefix is optional.
    pub fn contains_local_file(&self, path: &str) -> bool {
        let path = self.site_path(path);
        self.files.contains(&path) || self.dirs.contains(&path)
    }

    pub fn is_directory(&self, path: &str) -> bool {
        self.dirs.contains(&self.site_path(path)) || self.site_path(path) == self.repo_id
    }

    /// Upstream URL of the file at `local_path`.
    ///
    /// A path naming the site-wide home file maps back to the repository's
    /// own home file name.
    pub fn original_source_url(&self, local_path: &RelativePath) -> String {
        let base = self.remote.sources_base();
        if let Some(single) = &self.params.single_document_file {
            return format!("{base}/{single}");
        }

        let site_path = self.site_path(local_path.as_str());
        let prefix = format!("{}/", self.repo_id);
        let within = site_path.strip_prefix(&prefix).unwrap_or(&site_path);
        let within = if paths::file_name(within) == self.target_home_file {
            paths::with_file_name(within, &self.params.home_file)
        } else {
            within.to_string()
        };

        let docs_folder = self.params.docs_folder.trim_matches('/');
        if docs_folder.is_empty() || docs_folder == "." {
            format!("{base}/{within}")
        } else {
            format!("{base}/{docs_folder}/{within}")
        }
    }
}
