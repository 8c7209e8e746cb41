//! Copies each repository's documentation into the merged site tree.
//!
//! Every directory's home file is renamed to the site-wide home file name.
//! The original name and modification time of every copied file are kept in
//! [`DocumentOrigins`] so later stages can report and link to the upstream
//! file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use relative_path::{RelativePath, RelativePathBuf};

use super::{IoError, modified_time, scan_tree};
use crate::diagnostics::Diagnostics;
use crate::error::EngineError;
use crate::repository::{GlobalParams, RepositoryParams};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub original_path: RelativePathBuf,
    pub modified: Option<SystemTime>,
}

/// Maps site paths to where the file came from.
#[derive(Debug, Clone, Default)]
pub struct DocumentOrigins {
    entries: BTreeMap<String, Origin>,
}

impl DocumentOrigins {
    pub fn register(&mut self, site_path: &str, original_path: &str, modified: Option<SystemTime>) {
        self.entries.insert(
            site_path.to_string(),
            Origin {
                original_path: RelativePathBuf::from(original_path.to_string()),
                modified,
            },
        );
    }

    /// Moves the record of `from` to `to`, keeping its original path.
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(origin) = self.entries.remove(from) {
            self.entries.insert(to.to_string(), origin);
        }
    }

    pub fn get(&self, site_path: &str) -> Option<&Origin> {
        self.entries.get(site_path)
    }

    pub fn original_path(&self, site_path: &str) -> Option<&RelativePath> {
        self.get(site_path).map(|o| o.original_path.as_relative_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A checked-out repository to copy into the site.
pub struct RepositorySource<'a> {
    pub repo_id: &'a str,
    pub checkout: &'a Path,
    pub params: &'a RepositoryParams,
}

/// Copies one repository into `<site_root>/<repo_id>`, replacing any
/// previous copy.
pub fn materialize_repository(
    source: &RepositorySource<'_>,
    site_root: &Path,
    global: &GlobalParams,
    origins: &mut DocumentOrigins,
    diag: &Diagnostics,
) -> Result<(), EngineError> {
    let repo_id = source.repo_id;
    if !source.checkout.is_dir() {
        return Err(EngineError::MissingCheckout {
            repo_id: repo_id.to_string(),
            path: source.checkout.to_path_buf(),
        });
    }
    let dest = site_root.join(repo_id);
    if dest.exists() {
        fs::remove_dir_all(&dest).map_err(IoError::at(&dest))?;
    }
    fs::create_dir_all(&dest).map_err(IoError::at(&dest))?;

    if let Some(single) = &source.params.single_document_file {
        let from = source.checkout.join(single);
        let to = dest.join(&global.target_home_file);
        fs::copy(&from, &to).map_err(IoError::at(&from))?;
        origins.register(
            &format!("{repo_id}/{}", global.target_home_file),
            &format!("{repo_id}/{single}"),
            modified_time(&from),
        );
        log::info!("copied single document {} of '{repo_id}'", from.display());
        return Ok(());
    }

    let docs = source.checkout.join(&source.params.docs_folder);
    let ignored = &source.params.ignored;
    let entries = scan_tree(&docs, &|name: &str| ignored.matches(name))?;

    let mut copied = 0;
    for entry in &entries {
        let from = entry.path.to_path(&docs);
        let to = entry.path.to_path(&dest);
        let site_path = format!("{repo_id}/{}", entry.path);
        if entry.path.as_str().contains(['(', ')']) {
            diag.warn(format_args!(
                "{site_path}: file name contains parentheses and will break markdown links"
            ));
        }
        if entry.is_dir {
            fs::create_dir_all(&to).map_err(IoError::at(&to))?;
        } else {
            fs::copy(&from, &to).map_err(IoError::at(&from))?;
            origins.register(&site_path, &site_path, modified_time(&from));
            copied += 1;
        }
    }
    log::info!("copied {copied} files of '{repo_id}'");

    let mut dirs: Vec<&RelativePath> = vec![RelativePath::new("")];
    dirs.extend(entries.iter().filter(|e| e.is_dir).map(|e| e.path.as_relative_path()));
    for dir in dirs {
        patch_home_file(repo_id, &dest, dir, source.params, global, origins)?;
    }
    Ok(())
}

fn patch_home_file(
    repo_id: &str,
    dest: &Path,
    dir: &RelativePath,
    params: &RepositoryParams,
    global: &GlobalParams,
    origins: &mut DocumentOrigins,
) -> Result<(), EngineError> {
    let home = dir.join(&params.home_file);
    let target = dir.join(&global.target_home_file);
    let has_home = home.to_path(dest).is_file();
    let has_target = target.to_path(dest).is_file();
    let is_root = dir.as_str().is_empty();

    if params.home_file == global.target_home_file {
        if is_root && !has_home {
            return Err(EngineError::MissingHomeFile {
                repo_id: repo_id.to_string(),
                home_file: params.home_file.clone(),
            });
        }
        return Ok(());
    }

    match (has_home, has_target) {
        (true, true) => Err(EngineError::ConflictingHomeFiles {
            dir: dir.to_path(dest),
            home_file: params.home_file.clone(),
            target_home_file: global.target_home_file.clone(),
        }),
        (true, false) => {
            let from = home.to_path(dest);
            fs::rename(&from, target.to_path(dest)).map_err(IoError::at(&from))?;
            origins.rename(&format!("{repo_id}/{home}"), &format!("{repo_id}/{target}"));
            log::debug!("renamed {repo_id}/{home} to {repo_id}/{target}");
            Ok(())
        }
        (false, _) if is_root => Err(EngineError::MissingHomeFile {
            repo_id: repo_id.to_string(),
            home_file: params.home_file.clone(),
        }),
        (false, _) => Ok(()),
    }
}
