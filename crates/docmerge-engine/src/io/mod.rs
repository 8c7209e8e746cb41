pub mod materialize;

use relative_path::{RelativePath, RelativePathBuf};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid directory: {0}")]
    InvalidDirectory(PathBuf),
}

impl IoError {
    pub(crate) fn at(path: &Path) -> impl FnOnce(std::io::Error) -> IoError + '_ {
        move |source| IoError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One entry found by [`scan_tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    /// Path relative to the scanned root.
    pub path: RelativePathBuf,
    pub is_dir: bool,
}

/// Read a file below `root`
pub fn read_file(relative_path: &RelativePath, root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::at(&absolute_path))
}

/// Write a file below `root`, replacing it atomically.
///
/// The content goes to a sibling temporary file first and is renamed over
/// the target, so a failed write never leaves a truncated document.
pub fn write_file(relative_path: &RelativePath, root: &Path, content: &str) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(root);

    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::at(parent))?;
    }

    let mut temp_name = absolute_path.as_os_str().to_owned();
    temp_name.push(".docmerge-tmp");
    let temp_path = PathBuf::from(temp_name);
    fs::write(&temp_path, content).map_err(IoError::at(&temp_path))?;
    fs::rename(&temp_path, &absolute_path).map_err(IoError::at(&absolute_path))
}

/// Modification time of a file, if the platform reports one.
pub fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Recursively lists `root`, sorted by path.
///
/// Entries for which `skip` returns true are left out; skipped directories
/// are not descended into.
pub fn scan_tree(root: &Path, skip: &dyn Fn(&str) -> bool) -> Result<Vec<ScanEntry>, IoError> {
    if !root.is_dir() {
        return Err(IoError::InvalidDirectory(root.to_path_buf()));
    }

    let mut entries = Vec::new();
    scan_directory_recursive(root, RelativePath::new(""), skip, &mut entries)?;
    entries.sort_by(|a, b| a.path.as_str().cmp(b.path.as_str()));
    Ok(entries)
}

fn scan_directory_recursive(
    dir: &Path,
    relative: &RelativePath,
    skip: &dyn Fn(&str) -> bool,
    entries: &mut Vec<ScanEntry>,
) -> Result<(), IoError> {
    let read_dir = fs::read_dir(dir).map_err(IoError::at(dir))?;

    for entry in read_dir {
        let entry = entry.map_err(IoError::at(dir))?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if skip(&name) {
            continue;
        }

        let child = relative.join(&name);
        if path.is_dir() {
            entries.push(ScanEntry {
                path: child.clone(),
                is_dir: true,
            });
            scan_directory_recursive(&path, &child, skip, entries)?;
        } else {
            entries.push(ScanEntry {
                path: child,
                is_dir: false,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_file, create_test_site};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scan_lists_files_and_directories() {
        // Given a repository folder with a nested directory
        let site = create_test_site();
        create_test_file(&site, "repo/index.md", "# Home");
        create_test_file(&site, "repo/guide/setup.md", "# Setup");
        create_test_file(&site, "repo/guide/img.png", "png");

        // When scanning it
        let entries = scan_tree(&site.path().join("repo"), &|_| false).unwrap();
        let listed: Vec<(&str, bool)> = entries
            .iter()
            .map(|e| (e.path.as_str(), e.is_dir))
            .collect();

        // Then files and directories are listed in path order
        assert_eq!(
            listed,
            vec![
                ("guide", true),
                ("guide/img.png", false),
                ("guide/setup.md", false),
                ("index.md", false),
            ]
        );
    }

    #[test]
    fn test_scan_skips_entries_and_their_children() {
        // Given a hidden directory and a script next to a page
        let site = create_test_site();
        create_test_file(&site, "repo/index.md", "# Home");
        create_test_file(&site, "repo/.git/config", "x");
        create_test_file(&site, "repo/build.sh", "x");

        // When scanning with a filter for both
        let entries = scan_tree(&site.path().join("repo"), &|name: &str| {
            name.starts_with('.') || name.ends_with(".sh")
        })
        .unwrap();

        // Then only the page is left
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path.as_str(), "index.md");
    }

    #[test]
    fn test_scan_rejects_missing_directory() {
        let result = scan_tree(Path::new("/this/path/does/not/exist"), &|_| false);
        assert!(matches!(result, Err(IoError::InvalidDirectory(_))));
    }

    #[test]
    fn test_read_file_success() {
        let site = create_test_site();
        create_test_file(&site, "repo/a.md", "# A\n\nText");

        let content = read_file(RelativePath::new("repo/a.md"), site.path()).unwrap();
        assert_eq!(content, "# A\n\nText");
    }

    #[test]
    fn test_read_file_not_found() {
        let site = create_test_site();
        let result = read_file(RelativePath::new("missing.md"), site.path());
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_write_file_creates_parents_and_replaces_content() {
        let site = create_test_site();
        let path = RelativePath::new("repo/nested/new.md");

        write_file(path, site.path(), "first").unwrap();
        write_file(path, site.path(), "second").unwrap();

        assert_eq!(read_file(path, site.path()).unwrap(), "second");
        let leftovers = scan_tree(site.path(), &|_| false)
            .unwrap()
            .into_iter()
            .filter(|e| e.path.as_str().ends_with(".docmerge-tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_modified_time_is_reported_for_files() {
        let site = create_test_site();
        let file = create_test_file(&site, "a.md", "x");
        assert!(modified_time(&file).is_some());
        assert!(modified_time(&site.path().join("missing")).is_none());
    }
}
