//! Path arithmetic on `/`-separated site paths.

use relative_path::{RelativePath, RelativePathBuf};

/// Resolves `.` and `..` segments. Leading `..` segments that climb above
/// the root are kept.
pub fn normalize(path: &str) -> RelativePathBuf {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match out.last() {
                Some(&last) if last != ".." => {
                    out.pop();
                }
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    RelativePathBuf::from(out.join("/"))
}

/// Directory containing `path`, empty for top-level paths.
pub fn parent_dir(path: &RelativePath) -> RelativePathBuf {
    path.parent()
        .map(RelativePath::to_relative_path_buf)
        .unwrap_or_else(RelativePathBuf::new)
}

fn segments(path: &RelativePath) -> Vec<&str> {
    path.as_str().split('/').filter(|s| !s.is_empty()).collect()
}

/// Shortest relative link from the document at `from` to `to`.
///
/// The directories shared by both paths are elided and one `..` is emitted
/// for every remaining directory of `from`.
pub fn relative_path(from: &RelativePath, to: &RelativePath) -> String {
    let mut from_dir = segments(from);
    from_dir.pop();
    let to_parts = segments(to);

    let limit = from_dir.len().min(to_parts.len().saturating_sub(1));
    let common = from_dir
        .iter()
        .zip(&to_parts)
        .take(limit)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts = vec![".."; from_dir.len() - common];
    parts.extend_from_slice(&to_parts[common..]);
    parts.join("/")
}

/// Splits `link` at its last `#`.
pub fn split_anchor(link: &str) -> (&str, Option<&str>) {
    match link.rsplit_once('#') {
        Some((path, anchor)) => (path, Some(anchor)),
        None => (link, None),
    }
}

pub fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Replaces the last segment of `path` with `name`.
pub fn with_file_name(path: &str, name: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{name}"),
        None => name.to_string(),
    }
}
