//! Page titles become front matter for the site generator.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::{DocumentPass, document_mut};
use crate::database::DocumentationDatabase;
use crate::diagnostics::Diagnostics;
use crate::document::Document;
use crate::error::EngineError;
use crate::repository::{GlobalParams, RepositoryIndex};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Front matter written at the top of every regular page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontMatter {
    pub layout: String,
    pub title: String,
    pub timestamp: i64,
    pub repo_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_document: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar_position: Option<String>,
}

impl FrontMatter {
    pub const DELIMITER: &'static str = "---";
    pub const DEFAULT_LAYOUT: &'static str = "page";

    /// Attributes known before the document is touched.
    pub fn for_page(
        title: &str,
        timestamp: i64,
        document: &Document,
        repo: &RepositoryIndex,
        global: &GlobalParams,
    ) -> Self {
        let remote = &repo.remote;
        let mut front = Self {
            layout: Self::DEFAULT_LAYOUT.to_string(),
            title: title.to_string(),
            timestamp,
            repo_identifier: repo.repo_id.clone(),
            release_identifier: global.release_identifier.clone(),
            ..Self::default()
        };
        if let Some(tag) = &remote.tag {
            front.tag = Some(tag.clone());
            front.version = Some(tag.clone());
        } else if let Some(branch) = &remote.branch {
            front.branch = Some(branch.clone());
            front.version = Some(branch.clone());
        }
        if repo.is_single_document() {
            front.single_document = Some(true);
        }
        match &repo.params.private_product_website {
            Some(url) => front.product_url = Some(url.clone()),
            None => {
                front.source = Some(repo.original_source_url(document.original_path()));
                front.source_repo = Some(remote.base_url.clone());
            }
        }
        front
    }

    /// Reads `TEMPLATE`, `AUTHOR` and `SIDEBAR` metadata.
    pub fn apply_metadata(&mut self, document: &Document, diag: &Diagnostics) {
        let metadata = document.metadata();
        if let Some(template) = metadata.first_by_name(Titles::TEMPLATE) {
            match template.parameter(0) {
                Some(layout) => self.layout = layout.to_string(),
                None => document.warn(
                    diag,
                    document.line_index(template.begin_line),
                    "TEMPLATE marker has no template name",
                ),
            }
        }
        if let Some(author) = metadata.first_by_name(Titles::AUTHOR)
            && let [name, date] = author.parameters.as_slice()
        {
            self.author = Some(name.clone());
            self.published = Some(date.clone());
        }
        if let Some(sidebar) = metadata.first_by_name(Titles::SIDEBAR) {
            self.sidebar = sidebar.parameter(0).map(str::to_string);
            if sidebar.parameters.len() == 2 {
                self.sidebar_position = sidebar.parameter(1).map(str::to_string);
            }
        }
    }

    /// The block as markdown lines, delimiters included.
    pub fn to_lines(&self) -> Result<Vec<String>, EngineError> {
        let yaml = serde_yaml::to_string(self)?;
        let mut lines = vec![Self::DELIMITER.to_string()];
        lines.extend(yaml.lines().map(str::to_string));
        lines.push(Self::DELIMITER.to_string());
        Ok(lines)
    }
}

/// Replaces the page title heading, and anything above it, with front matter.
pub struct Titles;

impl Titles {
    pub const TEMPLATE: &'static str = "TEMPLATE";
    pub const AUTHOR: &'static str = "AUTHOR";
    pub const SIDEBAR: &'static str = "SIDEBAR";
}

impl DocumentPass for Titles {
    fn name(&self) -> &'static str {
        "rewrite-titles"
    }

    fn apply(
        &mut self,
        db: &mut DocumentationDatabase,
        path: &str,
        diag: &Diagnostics,
    ) -> Result<bool, EngineError> {
        let document = db
            .document(path)
            .ok_or_else(|| EngineError::InconsistentIndex(path.to_string()))?;
        let repo = db.repository(document.repo_id())?;
        if repo.is_auxiliary(document.file_name()) {
            return Ok(true);
        }

        let Some((title_line, level, title)) = document
            .headings()
            .find_map(|(line, e)| e.heading().map(|(level, title)| (line, level, title)))
        else {
            document.warn(diag, None, "document has no title heading");
            return Ok(true);
        };
        if level != 1 {
            document.warn(
                diag,
                Some(title_line),
                "first heading should be a level-1 heading like '# Page title'",
            );
        }
        if title_line > 0 {
            document.warn(diag, Some(title_line), "page title is not on the first line");
        }

        let timestamp = match document.last_modified() {
            Some(time) => unix_seconds(time),
            None => {
                document.warn(
                    diag,
                    None,
                    "missing time of last modification; using midnight instead",
                );
                let now = unix_seconds(SystemTime::now());
                now - now.rem_euclid(SECONDS_PER_DAY)
            }
        };
        let mut front = FrontMatter::for_page(title, timestamp, document, repo, db.global());

        let document = document_mut(db, path)?;
        document.remove_lines(0, title_line + 1, diag);
        front.apply_metadata(document, diag);
        document.insert_lines(0, &front.to_lines()?, diag);
        Ok(true)
    }
}

fn unix_seconds(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::diagnostics::WarningLevel;
    use crate::io::materialize::DocumentOrigins;
    use crate::repository::{RemoteDescriptor, RepositoryParams};
    use crate::tests::{create_test_file, create_test_site};
    use pretty_assertions::assert_eq;

    const MODIFIED: u64 = 1_700_000_000;

    fn create_test_database(
        params: RepositoryParams,
        tag: Option<&str>,
        page: &str,
    ) -> (TempDir, DocumentationDatabase) {
        let site = create_test_site();
        create_test_file(&site, "sdk/index.md", "# Sdk\n");
        create_test_file(&site, "sdk/guide/setup.md", page);
        let global = GlobalParams {
            release_identifier: Some("2024.06".to_string()),
            ..GlobalParams::default()
        };
        let remote = RemoteDescriptor::new(
            "https://github.com/org/sdk.git",
            Some("develop".to_string()),
            tag.map(str::to_string),
        );
        let repo = RepositoryIndex::new("sdk", remote, params, &global);
        let diag = Diagnostics::new(WarningLevel::Serious, false);
        let mut db = DocumentationDatabase::load(
            site.path(),
            global,
            vec![repo],
            &DocumentOrigins::default(),
            &diag,
        )
        .unwrap();
        db.document_mut("sdk/guide/setup.md")
            .unwrap()
            .set_last_modified(Some(UNIX_EPOCH + Duration::from_secs(MODIFIED)));
        (site, db)
    }

    fn front_matter(doc: &Document) -> (FrontMatter, String) {
        let text = doc.to_markdown();
        let mut parts = text.splitn(3, "---\n");
        assert_eq!(parts.next(), Some(""));
        let yaml = parts.next().expect("front matter");
        let rest = parts.next().unwrap_or_default().to_string();
        (serde_yaml::from_str(yaml).expect("valid yaml"), rest)
    }

    #[test]
    fn test_title_becomes_front_matter() {
        let (_site, mut db) = create_test_database(
            RepositoryParams::default(),
            None,
            "# Setup\n<!-- AUTHOR jane 2024-01-01 -->\n<!-- SIDEBAR _Sidebar.md sticky -->\nBody",
        );
        let diag = Diagnostics::new(WarningLevel::Serious, false);
        assert!(Titles.apply(&mut db, "sdk/guide/setup.md", &diag).unwrap());

        let doc = db.document("sdk/guide/setup.md").unwrap();
        let (front, rest) = front_matter(doc);
        assert_eq!(
            front,
            FrontMatter {
                layout: "page".to_string(),
                title: "Setup".to_string(),
                timestamp: MODIFIED as i64,
                repo_identifier: "sdk".to_string(),
                branch: Some("develop".to_string()),
                version: Some("develop".to_string()),
                source: Some("https://github.com/org/sdk/blob/develop/docs/guide/setup.md".to_string()),
                source_repo: Some("https://github.com/org/sdk".to_string()),
                release_identifier: Some("2024.06".to_string()),
                author: Some("jane".to_string()),
                published: Some("2024-01-01".to_string()),
                sidebar: Some("_Sidebar.md".to_string()),
                sidebar_position: Some("sticky".to_string()),
                ..FrontMatter::default()
            }
        );
        assert!(rest.ends_with("Body"));
        assert_eq!(diag.warning_count(), 0);
        assert!(doc.is_modified());
    }

    #[test]
    fn test_tag_and_product_url_win() {
        let params = RepositoryParams {
            private_product_website: Some("https://example.com/product".to_string()),
            single_document_file: Some("Readme.md".to_string()),
            ..RepositoryParams::default()
        };
        let (_site, mut db) = create_test_database(params, Some("1.2.0"), "# Sdk\n<!-- TEMPLATE wide -->\ntext");
        let diag = Diagnostics::new(WarningLevel::Serious, false);
        Titles.apply(&mut db, "sdk/guide/setup.md", &diag).unwrap();

        let (front, _) = front_matter(db.document("sdk/guide/setup.md").unwrap());
        assert_eq!(front.layout, "wide");
        assert_eq!(front.tag.as_deref(), Some("1.2.0"));
        assert_eq!(front.branch, None);
        assert_eq!(front.single_document, Some(true));
        assert_eq!(front.product_url.as_deref(), Some("https://example.com/product"));
        assert_eq!(front.source, None);
    }

    #[test]
    fn test_misplaced_title_warns_and_drops_lines_above() {
        let (_site, mut db) = create_test_database(RepositoryParams::default(), None, "intro\n## Setup\ntext");
        let diag = Diagnostics::new(WarningLevel::Serious, false);
        Titles.apply(&mut db, "sdk/guide/setup.md", &diag).unwrap();

        let (front, rest) = front_matter(db.document("sdk/guide/setup.md").unwrap());
        assert_eq!(front.title, "Setup");
        assert_eq!(rest, "text");
        assert_eq!(diag.warning_count(), 2);
    }

    #[test]
    fn test_document_without_heading_is_skipped() {
        let (_site, mut db) = create_test_database(RepositoryParams::default(), None, "just text");
        let diag = Diagnostics::new(WarningLevel::Serious, false);
        assert!(Titles.apply(&mut db, "sdk/guide/setup.md", &diag).unwrap());
        assert_eq!(db.document("sdk/guide/setup.md").unwrap().to_markdown(), "just text");
        assert_eq!(diag.messages(), vec!["sdk/guide/setup.md: document has no title heading".to_string()]);
    }

    #[test]
    fn test_auxiliary_documents_are_untouched() {
        let params = RepositoryParams {
            auxiliary_documents: vec!["setup.md".to_string()],
            ..RepositoryParams::default()
        };
        let (_site, mut db) = create_test_database(params, None, "# Setup");
        let diag = Diagnostics::new(WarningLevel::Serious, false);
        Titles.apply(&mut db, "sdk/guide/setup.md", &diag).unwrap();
        assert_eq!(db.document("sdk/guide/setup.md").unwrap().to_markdown(), "# Setup");
    }

    #[test]
    fn test_midnight_fallback_is_whole_days() {
        let (_site, mut db) = create_test_database(RepositoryParams::default(), None, "# Setup");
        db.document_mut("sdk/guide/setup.md").unwrap().set_last_modified(None);
        let diag = Diagnostics::new(WarningLevel::Serious, false);
        Titles.apply(&mut db, "sdk/guide/setup.md", &diag).unwrap();

        let (front, _) = front_matter(db.document("sdk/guide/setup.md").unwrap());
        assert_eq!(front.timestamp % SECONDS_PER_DAY, 0);
        assert_eq!(diag.warning_count(), 1);
    }
}
