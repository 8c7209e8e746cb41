use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    Read {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    Parse {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration:\n  {}", .0.join("\n  "))]
    Invalid(Vec<String>),

    #[error("Unknown repository identifier '{0}'")]
    UnknownRepository(String),
}

/// Site-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_home_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown_extensions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_extensions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_identifier: Option<String>,
}

/// Repository parameters. Unset values fall back to the next level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored_files: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auxiliary_documents: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_document_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_product_website: Option<String>,
}

/// Where a repository comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySection {
    pub remote: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Checkout directory name below `repos_dir`; defaults to the identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Local directory used instead of a checkout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_files: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repos_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub global: GlobalSection,
    #[serde(default)]
    pub parameters: ParameterSection,
    #[serde(default)]
    pub repositories: BTreeMap<String, RepositorySection>,
    #[serde(default)]
    pub repository_parameters: BTreeMap<String, ParameterSection>,
}

/// Global settings with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalParameters {
    pub target_home_file: String,
    pub markdown_extensions: Vec<String>,
    pub image_extensions: Vec<String>,
    pub release_identifier: Option<String>,
}

/// Parameters of one repository after the override chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveParameters {
    pub docs_folder: String,
    pub home_file: String,
    pub ignored_files: Vec<String>,
    pub auxiliary_documents: Vec<String>,
    pub single_document_file: Option<String>,
    pub private_product_website: Option<String>,
}

impl Config {
    pub const DEFAULT_DOCS_FOLDER: &'static str = "docs";
    pub const DEFAULT_HOME_FILE: &'static str = "Home.md";
    pub const DEFAULT_TARGET_HOME_FILE: &'static str = "index.md";
    pub const DEFAULT_REPOS_DIR: &'static str = "repos";
    pub const DEFAULT_OUTPUT_DIR: &'static str = "site";

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            config_path: config_path.to_path_buf(),
            source,
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            config_path: config_path.to_path_buf(),
            source,
        })?;

        let base = config_path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(base);
        config.validate()?;
        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/docmerge");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Checks the loaded values. Every problem found is listed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut issues = Vec::new();
        if self.repositories.is_empty() {
            issues.push("no repositories configured".to_string());
        }
        for (repo_id, repo) in &self.repositories {
            if repo.remote.trim().is_empty() {
                issues.push(format!("repository '{repo_id}' has an empty remote"));
            }
            for (name, value) in [("branch", &repo.branch), ("tag", &repo.tag), ("path", &repo.path)] {
                if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                    issues.push(format!("repository '{repo_id}' has an empty {name}"));
                }
            }
        }
        Self::validate_parameters("parameters", &self.parameters, &mut issues);
        for (repo_id, params) in &self.repository_parameters {
            if !self.repositories.contains_key(repo_id) {
                issues.push(format!("parameters given for unknown repository '{repo_id}'"));
            }
            Self::validate_parameters(&format!("repository_parameters.{repo_id}"), params, &mut issues);
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(issues))
        }
    }

    fn validate_parameters(section: &str, params: &ParameterSection, issues: &mut Vec<String>) {
        for (name, value) in [("docs_folder", &params.docs_folder), ("home_file", &params.home_file)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                issues.push(format!("[{section}] {name} must not be empty"));
            }
        }
        for pattern in params.ignored_files.iter().flatten() {
            if let Err(e) = glob::Pattern::new(pattern) {
                issues.push(format!("[{section}] invalid ignore pattern '{pattern}': {e}"));
            }
        }
    }

    pub fn global_parameters(&self) -> GlobalParameters {
        let global = &self.global;
        GlobalParameters {
            target_home_file: global
                .target_home_file
                .clone()
                .unwrap_or_else(|| Self::DEFAULT_TARGET_HOME_FILE.to_string()),
            markdown_extensions: global
                .markdown_extensions
                .clone()
                .unwrap_or_else(|| vec!["md".to_string()]),
            image_extensions: global.image_extensions.clone().unwrap_or_else(|| {
                ["png", "jpg", "jpeg", "gif", "svg"].map(String::from).to_vec()
            }),
            release_identifier: global.release_identifier.clone(),
        }
    }

    /// Effective parameters of `repo_id`: repository override, then the
    /// global `[parameters]` table, then built-in defaults.
    ///
    /// `ignored_files` is the exception: the repository's patterns are added
    /// to the global ones.
    pub fn parameters(&self, repo_id: &str) -> Result<EffectiveParameters, ConfigError> {
        if !self.repositories.contains_key(repo_id) {
            return Err(ConfigError::UnknownRepository(repo_id.to_string()));
        }
        let own = self.repository_parameters.get(repo_id);
        let global = &self.parameters;
        let pick = |field: fn(&ParameterSection) -> &Option<String>| {
            own.and_then(|p| field(p).clone()).or_else(|| field(global).clone())
        };
        let pick_list = |field: fn(&ParameterSection) -> &Option<Vec<String>>| {
            own.and_then(|p| field(p).clone())
                .or_else(|| field(global).clone())
                .unwrap_or_default()
        };

        let mut ignored_files = global.ignored_files.clone().unwrap_or_default();
        for pattern in own.and_then(|p| p.ignored_files.as_ref()).into_iter().flatten() {
            if !ignored_files.contains(pattern) {
                ignored_files.push(pattern.clone());
            }
        }

        Ok(EffectiveParameters {
            docs_folder: pick(|p| &p.docs_folder)
                .unwrap_or_else(|| Self::DEFAULT_DOCS_FOLDER.to_string()),
            home_file: pick(|p| &p.home_file).unwrap_or_else(|| Self::DEFAULT_HOME_FILE.to_string()),
            ignored_files,
            auxiliary_documents: pick_list(|p| &p.auxiliary_documents),
            single_document_file: pick(|p| &p.single_document_file),
            private_product_website: pick(|p| &p.private_product_website),
        })
    }

    /// Directory holding the files of `repo_id`.
    pub fn checkout_dir(&self, repo_id: &str) -> Result<PathBuf, ConfigError> {
        let repo = self
            .repositories
            .get(repo_id)
            .ok_or_else(|| ConfigError::UnknownRepository(repo_id.to_string()))?;
        if let Some(local) = &repo.local_files {
            return Ok(local.clone());
        }
        let repos_dir = self
            .repos_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_REPOS_DIR));
        Ok(repos_dir.join(repo.path.as_deref().unwrap_or(repo_id)))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_OUTPUT_DIR))
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &Path| {
            let expanded = Self::expand_path(path).unwrap_or_else(|| path.to_path_buf());
            if expanded.is_relative() {
                base.join(expanded)
            } else {
                expanded
            }
        };
        self.repos_dir = self.repos_dir.as_deref().map(resolve);
        self.output_dir = self.output_dir.as_deref().map(resolve);
        for repo in self.repositories.values_mut() {
            repo.local_files = repo.local_files.as_deref().map(resolve);
        }
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
