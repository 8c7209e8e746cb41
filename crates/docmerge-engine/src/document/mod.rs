//! Markdown document with line-level edit operations.
//!
//! A [`Document`] owns its lines and the entities parsed from them. Inserting
//! lines scans only the new lines, starting from the lexer state of the line
//! before the insertion point; anchors and metadata are rebuilt after every
//! edit.

pub mod anchors;
pub mod metadata;

use std::ops::RangeInclusive;
use std::time::SystemTime;

use relative_path::{RelativePath, RelativePathBuf};

use crate::diagnostics::{Diagnostics, WarningLevel};
use crate::model::{Entity, EntityId, EntityKind, IdGenerator, LexerState, Line, LineId, Payload};
use crate::parsing::{ParseContext, parse_lines};

pub use anchors::{AnchorTable, heading_anchor_slug};
pub use metadata::{MetadataNode, MetadataToken, MetadataTree};

#[derive(Debug, Clone)]
pub struct Document {
    repo_id: String,
    local_path: RelativePathBuf,
    original_path: RelativePathBuf,
    ids: IdGenerator,
    lines: Vec<Line>,
    anchors: AnchorTable,
    metadata: MetadataTree,
    modified: bool,
    last_modified: Option<SystemTime>,
}

impl Document {
    /// Parses `text` as the document at `local_path` of repository `repo_id`.
    pub fn parse(repo_id: &str, local_path: &RelativePath, text: &str, diag: &Diagnostics) -> Self {
        let mut doc = Self {
            repo_id: repo_id.to_string(),
            local_path: local_path.to_relative_path_buf(),
            original_path: local_path.to_relative_path_buf(),
            ids: IdGenerator::new(),
            lines: Vec::new(),
            anchors: AnchorTable::default(),
            metadata: MetadataTree::default(),
            modified: false,
            last_modified: None,
        };

        let text = text.replace("\r\n", "\n");
        doc.lines = text
            .split('\n')
            .map(|line| Line::new(doc.ids.next_id(), line))
            .collect();

        let end = doc.parse_range(0, doc.lines.len(), LexerState::None, diag);
        if end.is_multiline() {
            doc.warn(diag, None, "document ends inside a fenced code block");
        }
        doc.rebuild_derived(diag);
        doc
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    /// Path inside the merged site, starting with the repository identifier.
    pub fn local_path(&self) -> &RelativePath {
        &self.local_path
    }

    /// Path before any rename, used in warnings and source links.
    pub fn original_path(&self) -> &RelativePath {
        &self.original_path
    }

    pub fn set_original_path(&mut self, path: &RelativePath) {
        self.original_path = path.to_relative_path_buf();
    }

    pub fn file_name(&self) -> &str {
        self.local_path.file_name().unwrap_or_default()
    }

    pub fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }

    pub fn set_last_modified(&mut self, time: Option<SystemTime>) {
        self.last_modified = time;
    }

    pub fn is_modified(&self) -> bool {
        self.modified || self.lines.iter().any(Line::is_dirty)
    }

    pub fn mark_saved(&mut self) {
        self.flush();
        self.modified = false;
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Index of the line with identifier `id`.
    pub fn line_index(&self, id: LineId) -> Option<usize> {
        self.lines.iter().position(|l| l.id() == id)
    }

    /// Index of the line holding entity `id`.
    pub fn line_of_entity(&self, id: EntityId) -> Option<usize> {
        self.lines.iter().position(|l| l.contains(id))
    }

    pub fn entities(&self, kind: EntityKind) -> impl Iterator<Item = (usize, &Entity)> {
        self.lines.iter().enumerate().flat_map(move |(index, line)| {
            line.entities()
                .iter()
                .filter(move |e| e.kind() == kind)
                .map(move |e| (index, e))
        })
    }

    pub fn headings(&self) -> impl Iterator<Item = (usize, &Entity)> {
        self.entities(EntityKind::Heading)
    }

    pub fn links(&self) -> impl Iterator<Item = (usize, &Entity)> {
        self.entities(EntityKind::Link)
    }

    pub fn first_heading(&self) -> Option<(usize, &Entity)> {
        self.headings().next()
    }

    pub fn anchors(&self) -> &AnchorTable {
        &self.anchors
    }

    /// Number of headings producing anchor `name`, or `None`.
    pub fn contains_anchor(&self, name: &str) -> Option<usize> {
        self.anchors.count(name)
    }

    pub fn metadata(&self) -> &MetadataTree {
        &self.metadata
    }

    /// Line indices covered by `node`, markers included.
    pub fn metadata_lines(&self, node: &MetadataNode) -> Option<RangeInclusive<usize>> {
        let begin = self.line_index(node.begin_line)?;
        let end = self.line_index(node.end_line)?;
        Some(begin..=end)
    }

    /// Changes an entity payload. The line text catches up on [`Document::flush`].
    pub fn modify_entity(
        &mut self,
        line: usize,
        id: EntityId,
        change: impl FnOnce(&mut Payload),
    ) -> bool {
        let Some(line) = self.lines.get_mut(line) else {
            return false;
        };
        let changed = line.modify(id, change);
        self.modified |= changed;
        changed
    }

    /// Writes pending entity changes into line text.
    pub fn flush(&mut self) {
        let mut headings_changed = false;
        for line in self.lines.iter_mut().filter(|l| l.is_dirty()) {
            headings_changed |= line.entities().iter().any(|e| e.is_dirty() && e.kind() == EntityKind::Heading);
            line.flush();
        }
        if headings_changed {
            self.anchors = Self::anchor_table(&self.lines);
        }
    }

    /// Inserts `texts` as new lines before index `at`.
    ///
    /// Only the new lines are scanned. A lexer state change across the
    /// insertion that involves a fenced code block is reported.
    ///
    /// # Panics
    /// Panics if `at > line_count()`.
    pub fn insert_lines<S: AsRef<str>>(&mut self, at: usize, texts: &[S], diag: &Diagnostics) {
        assert!(at <= self.lines.len(), "insert position {at} out of bounds");
        if texts.is_empty() {
            return;
        }
        let previous = if at == 0 {
            LexerState::None
        } else {
            self.lines[at - 1].state_at_end()
        };

        let new_lines: Vec<Line> = texts
            .iter()
            .map(|text| Line::new(self.ids.next_id(), text.as_ref()))
            .collect();
        let count = new_lines.len();
        self.lines.splice(at..at, new_lines);

        let end = self.parse_range(at, count, previous, diag);
        if end != previous && (end.is_multiline() || previous.is_multiline()) {
            self.warn(
                diag,
                Some(at + count - 1),
                "inserted lines change the fenced code block state of the document",
            );
        }
        self.modified = true;
        self.rebuild_derived(diag);
    }

    /// Removes `count` lines starting at `from` and returns them.
    ///
    /// # Panics
    /// Panics if the range is out of bounds.
    pub fn remove_lines(&mut self, from: usize, count: usize, diag: &Diagnostics) -> Vec<Line> {
        assert!(from + count <= self.lines.len(), "line range {from}+{count} out of bounds");
        if count == 0 {
            return Vec::new();
        }
        let before = self.lines[from].state_at_start();
        let after = match self.lines.get(from + count) {
            Some(next) => next.state_at_start(),
            None => self.lines[from + count - 1].state_at_end(),
        };
        if before != after && (before.is_multiline() || after.is_multiline()) {
            self.warn(
                diag,
                Some(from),
                "removed lines change the fenced code block state of the document",
            );
        }

        let removed = self.lines.drain(from..from + count).collect();
        self.modified = true;
        self.rebuild_derived(diag);
        removed
    }

    /// Replaces `count` lines at `from` with `texts`.
    pub fn replace_lines<S: AsRef<str>>(
        &mut self,
        from: usize,
        count: usize,
        texts: &[S],
        diag: &Diagnostics,
    ) {
        self.remove_lines(from, count, diag);
        self.insert_lines(from, texts, diag);
    }

    /// Rendered text of the lines in `range`.
    pub fn lines_text(&self, range: RangeInclusive<usize>) -> Vec<String> {
        self.lines[range]
            .iter()
            .map(|l| l.render().into_owned())
            .collect()
    }

    pub fn to_markdown(&self) -> String {
        let rendered: Vec<_> = self.lines.iter().map(Line::render).collect();
        rendered.join("\n")
    }

    /// Reports a warning prefixed with the document path and 1-based line.
    pub fn warn(&self, diag: &Diagnostics, line: Option<usize>, message: impl std::fmt::Display) {
        match line {
            Some(index) => diag.warn(format_args!("{}:{}: {}", self.original_path, index + 1, message)),
            None => diag.warn(format_args!("{}: {}", self.original_path, message)),
        }
    }

    fn parse_range(
        &mut self,
        from: usize,
        count: usize,
        initial: LexerState,
        diag: &Diagnostics,
    ) -> LexerState {
        let source = self.original_path.to_string();
        let mut ctx = ParseContext {
            ids: &mut self.ids,
            diag,
            source: &source,
        };
        parse_lines(&mut self.lines[from..from + count], initial, from, &mut ctx)
    }

    fn rebuild_derived(&mut self, diag: &Diagnostics) {
        self.anchors = Self::anchor_table(&self.lines);
        // metadata problems are reported once, when the document is loaded
        let level = if self.modified {
            WarningLevel::Off
        } else {
            diag.level()
        };
        let _level = diag.with_level(level);
        self.metadata = MetadataTree::build(&self.lines, diag, self.original_path.as_str());
    }

    fn anchor_table(lines: &[Line]) -> AnchorTable {
        AnchorTable::from_titles(
            lines
                .iter()
                .flat_map(|l| l.entities())
                .filter_map(|e| e.heading().map(|(_, title)| title)),
        )
    }
}
