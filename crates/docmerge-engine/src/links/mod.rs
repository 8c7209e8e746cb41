//! Link validation and rewriting.
//!
//! Every link is classified by its syntax, in this order:
//!
//! 1. a URI (`https://…`, `mailto:…`) is external, unless it points into a
//!    configured repository, in which case it becomes a relative link into
//!    the merged site;
//! 2. `#anchor` refers to a heading of the same document;
//! 3. `../…` may leave the documentation folder and is then rewritten to the
//!    upstream source browser;
//! 4. anything else is a link within the same repository.
//!
//! Resolution runs in two steps: [`LinkResolver::plan`] reads the database
//! and collects rewrites, [`resolve_document_links`] applies them.

pub mod report;

use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;
use relative_path::RelativePath;

use crate::database::DocumentationDatabase;
use crate::diagnostics::Diagnostics;
use crate::document::Document;
use crate::error::EngineError;
use crate::model::{EntityId, Payload};
use crate::repository::RepositoryIndex;
use crate::repository::paths::{
    file_name, normalize, parent_dir, relative_path, split_anchor, with_file_name,
};

pub use report::{LinkRecord, LinkReport};

/// Anchor that keeps a full URL to the document's own repository.
pub const KEEP_LINK_MARKER: &str = "docmerge-keep-link";

static URI_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    External,
    DocumentAnchor,
    Source,
    Local,
}

pub fn classify(path: &str) -> LinkKind {
    if path.starts_with("http://") || path.starts_with("https://") || URI_SCHEME.is_match(path) {
        LinkKind::External
    } else if path.starts_with('#') {
        LinkKind::DocumentAnchor
    } else if path.starts_with("../") {
        LinkKind::Source
    } else {
        LinkKind::Local
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkUpdate {
    pub line: usize,
    pub entity: EntityId,
    pub path: String,
}

/// Changes collected for one document.
#[derive(Debug, Clone, Default)]
pub struct LinkPlan {
    pub updates: Vec<LinkUpdate>,
    /// Site paths of every item a resolved link points to.
    pub references: Vec<String>,
    pub report: LinkReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnchorCheck {
    Unique,
    Ambiguous,
    Unknown,
}

pub struct LinkResolver<'a> {
    db: &'a DocumentationDatabase,
    diag: &'a Diagnostics,
    document: &'a Document,
    repo: &'a RepositoryIndex,
}

impl<'a> LinkResolver<'a> {
    pub fn new(
        db: &'a DocumentationDatabase,
        path: &str,
        diag: &'a Diagnostics,
    ) -> Result<Self, EngineError> {
        let document = db
            .document(path)
            .ok_or_else(|| EngineError::InconsistentIndex(path.to_string()))?;
        let repo = db.repository(document.repo_id())?;
        Ok(Self {
            db,
            diag,
            document,
            repo,
        })
    }

    pub fn plan(&self) -> Result<LinkPlan, EngineError> {
        let mut plan = LinkPlan::default();
        for (line, entity) in self.document.links() {
            let Some(link) = entity.link_path() else {
                continue;
            };
            if link.is_empty() {
                continue;
            }
            let resolved = match classify(link) {
                LinkKind::External => self.resolve_external(link, line, &mut plan)?,
                LinkKind::DocumentAnchor => {
                    if let Some(anchor) = link.strip_prefix('#').filter(|a| !a.is_empty()) {
                        self.check_anchor(self.document, anchor, link, line, &mut plan);
                    }
                    None
                }
                LinkKind::Source | LinkKind::Local => self.resolve_relative(link, line, &mut plan)?,
            };
            if let Some(path) = resolved
                && path != link
            {
                plan.updates.push(LinkUpdate {
                    line,
                    entity: entity.id,
                    path,
                });
            }
        }
        Ok(plan)
    }

    fn warn(&self, line: usize, link: &str, message: impl Display) {
        self.document
            .warn(self.diag, Some(line), format_args!("link '{link}' {message}"));
    }

    fn record(&self, line: usize, link: &str) -> LinkRecord {
        LinkRecord {
            document: self.document.local_path().to_string(),
            line: line + 1,
            link: link.to_string(),
        }
    }

    fn check_anchor(
        &self,
        target: &Document,
        anchor: &str,
        link: &str,
        line: usize,
        plan: &mut LinkPlan,
    ) -> AnchorCheck {
        match target.contains_anchor(anchor) {
            Some(1) => AnchorCheck::Unique,
            Some(count) => {
                self.warn(line, link, format_args!("matches {count} headings"));
                plan.report.ambiguous.push(self.record(line, link));
                AnchorCheck::Ambiguous
            }
            None => {
                self.warn(line, link, "points to an unknown heading");
                AnchorCheck::Unknown
            }
        }
    }

    /// Repository whose published URL prefixes `url`, and the path after the
    /// prefix. The path is `None` for a link to the repository itself.
    fn match_repository<'u>(&self, url: &'u str) -> Option<(&'a RepositoryIndex, Option<&'u str>)> {
        let trimmed = url.trim_end_matches('/');
        for repo in self.db.repositories() {
            if trimmed == repo.remote.base_url {
                return Some((repo, None));
            }
            for base in [repo.remote.cross_reference_base(), repo.remote.tree_base()] {
                if let Some(rest) = url.strip_prefix(base.as_str())
                    && let Some(rest) = rest.strip_prefix('/')
                {
                    return Some((repo, Some(rest)));
                }
            }
        }
        None
    }

    fn resolve_external(
        &self,
        link: &str,
        line: usize,
        plan: &mut LinkPlan,
    ) -> Result<Option<String>, EngineError> {
        let (url, anchor) = split_anchor(link);
        let Some((target_repo, within)) = self.match_repository(url) else {
            plan.report.external.push(self.record(line, link));
            return Ok(None);
        };

        if target_repo.repo_id == self.repo.repo_id {
            if within.is_none() && anchor == Some(KEEP_LINK_MARKER) {
                return Ok(Some(target_repo.remote.base_url.clone()));
            }
            self.warn(
                line,
                link,
                format_args!(
                    "uses a full URL to its own repository; use a relative link or the '#{KEEP_LINK_MARKER}' anchor"
                ),
            );
            return Ok(None);
        }

        let params = &target_repo.params;
        let docs_folder = params.docs_folder.trim_matches('/');
        let path = match within.map(|p| p.trim_end_matches('/')) {
            None | Some("") => "",
            Some(p) if params.single_document_file.as_deref() == Some(p) => "",
            Some(p) if p == docs_folder => "",
            Some(p) if docs_folder.is_empty() || docs_folder == "." => p,
            Some(p) => match p
                .strip_prefix(docs_folder)
                .and_then(|rest| rest.strip_prefix('/'))
            {
                Some(rest) => rest,
                None => {
                    // outside the documentation folder, e.g. source code
                    plan.report.external.push(self.record(line, link));
                    return Ok(None);
                }
            },
        };
        let target = format!("{}/{path}", target_repo.repo_id);
        self.link_into(target_repo, &target, anchor, link, line, plan)
    }

    fn resolve_relative(
        &self,
        link: &str,
        line: usize,
        plan: &mut LinkPlan,
    ) -> Result<Option<String>, EngineError> {
        let (file, anchor) = split_anchor(link);
        let joined = match file.strip_prefix('/') {
            Some(rooted) => format!("{}/{rooted}", self.repo.repo_id),
            None => format!("{}/{file}", parent_dir(self.document.local_path())),
        };
        let target = normalize(&joined);
        let inside = target.as_str() == self.repo.repo_id
            || target.as_str().starts_with(&format!("{}/", self.repo.repo_id));
        if inside {
            self.link_into(self.repo, target.as_str(), anchor, link, line, plan)
        } else {
            Ok(self.source_link(file, anchor, link, line))
        }
    }

    /// Rewrites a link leaving the documentation folder to the upstream
    /// source browser.
    fn source_link(&self, file: &str, anchor: Option<&str>, link: &str, line: usize) -> Option<String> {
        let repo = self.repo;
        let site_dir = parent_dir(self.document.local_path());
        let within_docs = site_dir
            .as_str()
            .strip_prefix(repo.repo_id.as_str())
            .unwrap_or_default()
            .trim_start_matches('/');
        let checkout_dir = match &repo.params.single_document_file {
            Some(single) => parent_dir(RelativePath::new(single)).into_string(),
            None => format!("{}/{within_docs}", repo.params.docs_folder),
        };

        let resolved = normalize(&format!("{checkout_dir}/{file}"));
        if resolved.as_str().starts_with("..") {
            self.warn(line, link, "points outside of the repository");
            return None;
        }
        let anchor = anchor.map(|a| format!("#{a}")).unwrap_or_default();
        if resolved.as_str().is_empty() {
            return Some(format!("{}{anchor}", repo.remote.tree_base()));
        }
        Some(format!("{}/{resolved}{anchor}", repo.remote.sources_base()))
    }

    /// Resolves `target`, a site path inside `repo`, to a link relative to
    /// the current document.
    fn link_into(
        &self,
        repo: &RepositoryIndex,
        target: &str,
        anchor: Option<&str>,
        link: &str,
        line: usize,
        plan: &mut LinkPlan,
    ) -> Result<Option<String>, EngineError> {
        let mut target = repo.site_path(target);
        if repo.is_directory(&target) {
            target = format!("{target}/{}", repo.target_home_file());
        } else if file_name(&target) == repo.params.home_file {
            target = with_file_name(&target, repo.target_home_file());
        }
        if !repo.contains_local_file(&target) {
            self.warn(line, link, format_args!("points to a missing file '{target}'"));
            return Ok(None);
        }
        let item = self
            .db
            .item(&target)
            .ok_or_else(|| EngineError::InconsistentIndex(target.clone()))?;

        let suffix = match (anchor.filter(|a| !a.is_empty()), item.document()) {
            (None, _) => String::new(),
            (Some(_), None) => {
                self.warn(line, link, "has an anchor but does not point to a markdown document; the anchor is dropped");
                String::new()
            }
            (Some(anchor), Some(document)) => match self.check_anchor(document, anchor, link, line, plan) {
                AnchorCheck::Ambiguous => String::new(),
                AnchorCheck::Unique | AnchorCheck::Unknown => format!("#{anchor}"),
            },
        };

        plan.references.push(target.clone());
        let stripped = self.db.global().strip_markdown_extension(&target);
        let relative = relative_path(self.document.local_path(), RelativePath::new(stripped));
        Ok(Some(format!("{relative}{suffix}")))
    }
}

/// Resolves every link of the document at `path`, rewrites those that
/// changed and counts references. Returns the number of rewritten links.
pub fn resolve_document_links(
    db: &mut DocumentationDatabase,
    path: &str,
    diag: &Diagnostics,
) -> Result<usize, EngineError> {
    let LinkPlan {
        updates,
        references,
        report,
    } = LinkResolver::new(db, path, diag)?.plan()?;

    for target in &references {
        if !db.add_reference(target) {
            return Err(EngineError::InconsistentIndex(target.clone()));
        }
    }
    db.link_report_mut().merge(report);

    let document = db
        .document_mut(path)
        .ok_or_else(|| EngineError::InconsistentIndex(path.to_string()))?;
    let mut rewritten = 0;
    for LinkUpdate { line, entity, path } in updates {
        let changed = document.modify_entity(line, entity, move |payload| {
            if let Payload::Link { path: old, .. } = payload {
                *old = path;
            }
        });
        if changed {
            rewritten += 1;
        }
    }
    document.flush();
    Ok(rewritten)
}
