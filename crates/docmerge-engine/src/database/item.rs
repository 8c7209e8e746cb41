use relative_path::{RelativePath, RelativePathBuf};

use crate::document::Document;

#[derive(Debug, Clone)]
pub enum ItemKind {
    Markdown(Box<Document>),
    File,
    Dir,
}

/// A file or directory of the merged site.
#[derive(Debug, Clone)]
pub struct DocumentationItem {
    pub repo_id: String,
    pub local_path: RelativePathBuf,
    /// Number of resolved links pointing here.
    pub reference_count: u32,
    pub kind: ItemKind,
}

impl DocumentationItem {
    pub fn markdown(document: Document) -> Self {
        Self {
            repo_id: document.repo_id().to_string(),
            local_path: document.local_path().to_relative_path_buf(),
            reference_count: 0,
            kind: ItemKind::Markdown(Box::new(document)),
        }
    }

    pub fn file(repo_id: &str, local_path: &RelativePath) -> Self {
        Self {
            repo_id: repo_id.to_string(),
            local_path: local_path.to_relative_path_buf(),
            reference_count: 0,
            kind: ItemKind::File,
        }
    }

    /// Directories count as referenced from the start.
    pub fn dir(repo_id: &str, local_path: &RelativePath) -> Self {
        Self {
            repo_id: repo_id.to_string(),
            local_path: local_path.to_relative_path_buf(),
            reference_count: 1,
            kind: ItemKind::Dir,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, ItemKind::Dir)
    }

    pub fn document(&self) -> Option<&Document> {
        match &self.kind {
            ItemKind::Markdown(doc) => Some(doc.as_ref()),
            _ => None,
        }
    }

    pub fn document_mut(&mut self) -> Option<&mut Document> {
        match &mut self.kind {
            ItemKind::Markdown(doc) => Some(doc.as_mut()),
            _ => None,
        }
    }
}
