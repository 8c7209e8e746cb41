//! Ordered rewrites applied to every document of the database.
//!
//! Passes run one after another; each one sees the documents as left by the
//! previous passes. The document list is fetched again for every pass.

mod api_docs;
mod code_tabs;
mod database_docs;
mod info_boxes;
mod remove_sections;
mod resolve_links;
mod titles;

use std::fmt::Display;

use crate::database::DocumentationDatabase;
use crate::diagnostics::{Diagnostics, WarningLevel};
use crate::document::{Document, MetadataNode};
use crate::error::EngineError;
use crate::model::{Line, MetadataId};

pub use api_docs::ApiDocs;
pub use code_tabs::CodeTabs;
pub use database_docs::DatabaseDocs;
pub use info_boxes::InfoBoxes;
pub use remove_sections::RemoveSections;
pub use resolve_links::ResolveLinks;
pub use titles::{FrontMatter, Titles};

pub trait DocumentPass {
    fn name(&self) -> &'static str;

    fn set_up(&mut self, _db: &mut DocumentationDatabase) -> Result<(), EngineError> {
        Ok(())
    }

    /// Processes one document. Returns false if part of it could not be
    /// processed; the problem has already been reported.
    fn apply(
        &mut self,
        db: &mut DocumentationDatabase,
        path: &str,
        diag: &Diagnostics,
    ) -> Result<bool, EngineError>;

    fn tear_down(&mut self, _db: &mut DocumentationDatabase) -> Result<bool, EngineError> {
        Ok(true)
    }
}

/// All passes in the order they must run.
pub fn default_passes() -> Vec<Box<dyn DocumentPass>> {
    vec![
        Box::new(RemoveSections),
        Box::new(CodeTabs),
        Box::new(InfoBoxes),
        Box::new(ApiDocs),
        Box::new(DatabaseDocs),
        Box::new(ResolveLinks),
        Box::new(Titles),
    ]
}

/// Runs `passes` over every document. Returns false if any pass failed on
/// any document; processing always continues with the remaining documents.
pub fn run_passes(
    db: &mut DocumentationDatabase,
    passes: &mut [Box<dyn DocumentPass>],
    diag: &Diagnostics,
) -> Result<bool, EngineError> {
    let mut succeeded = true;
    for pass in passes.iter_mut() {
        log::info!("running pass '{}'", pass.name());
        pass.set_up(db)?;
        for path in db.document_paths() {
            if !pass.apply(db, &path, diag)? {
                log::debug!("pass '{}' failed on {path}", pass.name());
                succeeded = false;
            }
        }
        succeeded &= pass.tear_down(db)?;
    }
    Ok(succeeded)
}

pub(crate) fn document_mut<'a>(
    db: &'a mut DocumentationDatabase,
    path: &str,
) -> Result<&'a mut Document, EngineError> {
    db.document_mut(path)
        .ok_or_else(|| EngineError::InconsistentIndex(path.to_string()))
}

/// A multiline metadata block and the lines between its markers.
pub(crate) struct Block<'a> {
    pub document: &'a Document,
    pub node: &'a MetadataNode,
    /// Index of the line with the opening marker.
    pub begin: usize,
    pub content: &'a [Line],
}

impl Block<'_> {
    /// Document line index of `content[offset]`.
    pub fn line_index(&self, offset: usize) -> usize {
        self.begin + 1 + offset
    }

    pub fn warn(&self, diag: &Diagnostics, line: usize, message: impl Display) {
        self.document.warn(diag, Some(line), message);
    }

    /// Warns at the opening marker.
    pub fn warn_at_marker(&self, diag: &Diagnostics, message: impl Display) {
        self.warn(diag, self.begin, message);
    }

    pub fn text(line: &Line) -> String {
        line.render().into_owned()
    }

    /// First heading inside the block: content offset, level and title.
    pub fn first_heading(&self) -> Option<(usize, u8, &str)> {
        self.content.iter().enumerate().find_map(|(offset, line)| {
            line.entities()
                .iter()
                .find_map(|e| e.heading())
                .map(|(level, title)| (offset, level, title))
        })
    }
}

/// A section of generated site template markup.
pub(crate) trait TemplateSection {
    fn begin_tag(&self) -> String;
    fn end_tag(&self) -> &'static str;
}

/// Output lines plus the stack of template sections still open.
pub(crate) struct SectionWriter<S> {
    open: Vec<S>,
    lines: Vec<String>,
}

impl<S: TemplateSection> SectionWriter<S> {
    pub fn new(capacity: usize) -> Self {
        Self {
            open: Vec::new(),
            lines: Vec::with_capacity(capacity),
        }
    }

    pub fn open(&mut self, section: S) {
        self.lines.push(section.begin_tag());
        self.open.push(section);
    }

    pub fn close(&mut self) {
        if let Some(section) = self.open.pop() {
            self.lines.push(section.end_tag().to_string());
        }
    }

    pub fn top(&self) -> Option<&S> {
        self.open.last()
    }

    pub fn push_line(&mut self, line: String) {
        self.lines.push(line);
    }

    /// Closes every open section and returns the lines.
    pub fn finish(mut self) -> Vec<String> {
        while !self.open.is_empty() {
            self.close();
        }
        self.lines
    }
}

/// Replaces every multiline block named `name`, markers included, with the
/// lines `build` returns.
///
/// Blocks are handled one at a time from the top of the document, so a block
/// nested inside a rewritten one is found again in the inserted lines. A block
/// for which `build` returns `None` is left untouched and makes the result
/// false.
pub(crate) fn rewrite_blocks(
    document: &mut Document,
    name: &str,
    diag: &Diagnostics,
    mut build: impl FnMut(&Block<'_>, &Diagnostics) -> Option<Vec<String>>,
) -> bool {
    let mut failed: Vec<MetadataId> = Vec::new();
    loop {
        let doc: &Document = document;
        let Some(node) = doc
            .metadata()
            .by_name_multiline(name, true)
            .find(|n| !failed.contains(&n.id))
        else {
            break;
        };
        let id = node.id;
        let Some(range) = doc.metadata_lines(node) else {
            failed.push(id);
            continue;
        };
        let (begin, end) = (*range.start(), *range.end());
        let block = Block {
            document: doc,
            node,
            begin,
            content: &doc.lines()[begin + 1..end],
        };
        let replacement = build(&block, diag);
        match replacement {
            Some(lines) => {
                // the copied content was already checked when the document was loaded
                let _quiet = diag.with_level(WarningLevel::Off);
                document.replace_lines(begin, end - begin + 1, &lines, diag);
            }
            None => failed.push(id),
        }
    }
    failed.is_empty()
}

#[cfg(test)]
pub(crate) mod test_support {
    use relative_path::RelativePath;

    use super::*;

    pub fn parse(text: &str) -> (Document, Diagnostics) {
        let diag = Diagnostics::new(WarningLevel::Serious, false);
        let doc = Document::parse("repo", RelativePath::new("repo/page.md"), text, &diag);
        (doc, diag)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::parse;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rewrites_nested_blocks_outside_in() {
        let (mut doc, diag) = parse(
            "a\n<!-- begin wrap -->\nb\n<!-- begin wrap -->\nc\n<!-- end -->\n<!-- end -->\nd",
        );
        let ok = rewrite_blocks(&mut doc, "wrap", &diag, |block, _| {
            let mut lines = vec!["[".to_string()];
            lines.extend(block.content.iter().map(Block::text));
            lines.push("]".to_string());
            Some(lines)
        });
        assert!(ok);
        assert_eq!(doc.to_markdown(), "a\n[\nb\n[\nc\n]\n]\nd");
    }

    #[test]
    fn test_failed_blocks_are_left_alone() {
        let text = "<!-- begin wrap -->\nx\n<!-- end -->";
        let (mut doc, diag) = parse(text);
        assert!(!rewrite_blocks(&mut doc, "wrap", &diag, |_, _| None));
        assert_eq!(doc.to_markdown(), text);
        assert!(!doc.is_modified());
    }

    #[test]
    fn test_default_pass_order() {
        let names: Vec<&str> = default_passes().iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec![
                "remove-sections",
                "build-code-tabs",
                "build-info-boxes",
                "build-api-docs",
                "build-database-docs",
                "resolve-links",
                "rewrite-titles",
            ]
        );
    }
}
