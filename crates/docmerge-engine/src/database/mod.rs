//! All documentation items of the merged site, keyed by site path.

pub mod item;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use relative_path::RelativePath;

use crate::diagnostics::Diagnostics;
use crate::document::Document;
use crate::error::EngineError;
use crate::io::materialize::DocumentOrigins;
use crate::io::{modified_time, read_file, write_file};
use crate::links::LinkReport;
use crate::repository::{GlobalParams, RepositoryIndex};

pub use item::{DocumentationItem, ItemKind};

#[derive(Debug)]
pub struct DocumentationDatabase {
    root: PathBuf,
    global: GlobalParams,
    repositories: BTreeMap<String, RepositoryIndex>,
    items: BTreeMap<String, DocumentationItem>,
    link_report: LinkReport,
}

impl DocumentationDatabase {
    /// Empty database over the site at `root`.
    pub fn new(root: &Path, global: GlobalParams) -> Self {
        Self {
            root: root.to_path_buf(),
            global,
            repositories: BTreeMap::new(),
            items: BTreeMap::new(),
            link_report: LinkReport::default(),
        }
    }

    /// Indexes every repository below `root` and parses its markdown files.
    pub fn load(
        root: &Path,
        global: GlobalParams,
        repositories: Vec<RepositoryIndex>,
        origins: &DocumentOrigins,
        diag: &Diagnostics,
    ) -> Result<Self, EngineError> {
        let mut db = Self::new(root, global);
        for mut repo in repositories {
            repo.scan(root)?;
            db.load_repository(&repo, origins, diag)?;
            db.repositories.insert(repo.repo_id.clone(), repo);
        }
        log::info!(
            "loaded {} items from {} repositories",
            db.items.len(),
            db.repositories.len()
        );
        Ok(db)
    }

    fn load_repository(
        &mut self,
        repo: &RepositoryIndex,
        origins: &DocumentOrigins,
        diag: &Diagnostics,
    ) -> Result<(), EngineError> {
        for dir in repo.dirs() {
            self.insert(DocumentationItem::dir(&repo.repo_id, RelativePath::new(dir)))?;
        }
        for path in repo.files() {
            let local_path = RelativePath::new(path);
            let mut item = if self.global.is_markdown(path) {
                let text = read_file(local_path, &self.root)?;
                let mut document = Document::parse(&repo.repo_id, local_path, &text, diag);
                match origins.get(path) {
                    Some(origin) => {
                        document.set_original_path(&origin.original_path);
                        document.set_last_modified(origin.modified);
                    }
                    None => {
                        document.set_last_modified(modified_time(&local_path.to_path(&self.root)));
                    }
                }
                DocumentationItem::markdown(document)
            } else {
                DocumentationItem::file(&repo.repo_id, local_path)
            };
            if repo.is_auxiliary(local_path.file_name().unwrap_or_default()) {
                item.reference_count += 1;
            }
            self.insert(item)?;
        }
        Ok(())
    }

    fn insert(&mut self, item: DocumentationItem) -> Result<(), EngineError> {
        let key = item.local_path.to_string();
        if self.items.contains_key(&key) {
            return Err(EngineError::DuplicateItem(key));
        }
        self.items.insert(key, item);
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn global(&self) -> &GlobalParams {
        &self.global
    }

    pub fn repository(&self, repo_id: &str) -> Result<&RepositoryIndex, EngineError> {
        self.repositories
            .get(repo_id)
            .ok_or_else(|| EngineError::UnknownRepository(repo_id.to_string()))
    }

    pub fn repositories(&self) -> impl Iterator<Item = &RepositoryIndex> {
        self.repositories.values()
    }

    /// Repository published at `url`, ignoring a trailing slash.
    pub fn repository_by_url(&self, url: &str) -> Option<&RepositoryIndex> {
        let url = url.trim_end_matches('/');
        self.repositories
            .values()
            .find(|r| r.remote.base_url == url)
    }

    pub fn item(&self, path: &str) -> Option<&DocumentationItem> {
        self.items.get(path)
    }

    pub fn item_mut(&mut self, path: &str) -> Option<&mut DocumentationItem> {
        self.items.get_mut(path)
    }

    pub fn items(&self) -> impl Iterator<Item = &DocumentationItem> {
        self.items.values()
    }

    pub fn document(&self, path: &str) -> Option<&Document> {
        self.items.get(path).and_then(DocumentationItem::document)
    }

    pub fn document_mut(&mut self, path: &str) -> Option<&mut Document> {
        self.items.get_mut(path).and_then(DocumentationItem::document_mut)
    }

    /// Site paths of all markdown documents, sorted.
    pub fn document_paths(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|(_, item)| item.document().is_some())
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Adds an item created during the run and lists it in its repository.
    pub fn add_item(&mut self, item: DocumentationItem) -> Result<(), EngineError> {
        let repo = self
            .repositories
            .get_mut(&item.repo_id)
            .ok_or_else(|| EngineError::UnknownRepository(item.repo_id.clone()))?;
        let path = item.local_path.clone();
        if self.items.contains_key(path.as_str()) {
            return Err(EngineError::DuplicateItem(path.into_string()));
        }
        repo.insert_file(&path);
        self.insert(item)
    }

    /// Counts a resolved link to `path`. Returns false if no such item exists.
    pub fn add_reference(&mut self, path: &str) -> bool {
        match self.items.get_mut(path) {
            Some(item) => {
                item.reference_count += 1;
                true
            }
            None => false,
        }
    }

    /// Items no resolved link points to, sorted by path.
    pub fn unreferenced_items(&self) -> Vec<&DocumentationItem> {
        self.items
            .values()
            .filter(|item| item.reference_count == 0)
            .collect()
    }

    pub fn link_report(&self) -> &LinkReport {
        &self.link_report
    }

    pub fn link_report_mut(&mut self) -> &mut LinkReport {
        &mut self.link_report
    }

    /// Writes every modified document back to the site. Returns how many
    /// files were written.
    pub fn save_all(&mut self) -> Result<usize, EngineError> {
        let mut written = 0;
        for item in self.items.values_mut() {
            let DocumentationItem {
                local_path, kind, ..
            } = item;
            let ItemKind::Markdown(document) = kind else {
                continue;
            };
            if !document.is_modified() {
                continue;
            }
            document.flush();
            write_file(local_path, &self.root, &document.to_markdown())?;
            document.mark_saved();
            written += 1;
        }
        log::info!("saved {written} modified documents");
        Ok(written)
    }
}
