use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new("[^a-z0-9]+").expect("valid regex"));

/// Anchor name generated for a heading title.
///
/// Lowercases the title, drops `.` and backticks, turns every other run of
/// characters outside `[a-z0-9]` into a single `-`, and trims dashes from
/// both ends.
pub fn heading_anchor_slug(title: &str) -> String {
    let lowered = title.to_lowercase().replace(['.', '`'], "");
    let dashed = NON_SLUG.replace_all(&lowered, "-");
    dashed.trim_start_matches('-').trim_end_matches('-').to_string()
}

/// Number of headings per anchor name in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorTable {
    counts: BTreeMap<String, usize>,
}

impl AnchorTable {
    pub fn from_titles<'a>(titles: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts = BTreeMap::new();
        for title in titles {
            *counts.entry(heading_anchor_slug(title)).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// How many headings produce `name`, or `None` if none do.
    pub fn count(&self, name: &str) -> Option<usize> {
        self.counts.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }
}
