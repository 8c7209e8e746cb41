//! Tabbed code samples.
//!
//! ````markdown
//! <!-- begin codetabs Swift Kotlin -->
//! ```swift
//! let x = 1
//! ```
//! ```kotlin
//! val x = 1
//! ```
//! <!-- end -->
//! ````
//!
//! Every fenced code block becomes one tab. `<!-- begin tabs -->` blocks
//! instead start a new tab at each `<!-- tab NAME -->` marker and may hold
//! any content.

use std::mem;

use super::{Block, DocumentPass, document_mut, rewrite_blocks};
use crate::database::DocumentationDatabase;
use crate::diagnostics::Diagnostics;
use crate::error::EngineError;

pub struct CodeTabs;

impl CodeTabs {
    pub const CODE_TABS: &'static str = "codetabs";
    pub const TABS: &'static str = "tabs";
    pub const TAB: &'static str = "tab";
}

impl DocumentPass for CodeTabs {
    fn name(&self) -> &'static str {
        "build-code-tabs"
    }

    fn apply(
        &mut self,
        db: &mut DocumentationDatabase,
        path: &str,
        diag: &Diagnostics,
    ) -> Result<bool, EngineError> {
        let document = document_mut(db, path)?;
        let code_tabs = rewrite_blocks(document, Self::CODE_TABS, diag, build_code_tabs);
        let tabs = rewrite_blocks(document, Self::TABS, diag, build_tabs);
        Ok(code_tabs && tabs)
    }
}

fn build_code_tabs(block: &Block<'_>, diag: &Diagnostics) -> Option<Vec<String>> {
    let names = &block.node.parameters;
    if names.is_empty() {
        block.warn_at_marker(
            diag,
            format_args!("'{}' marker has no tab names", block.node.name),
        );
    }

    let mut tabs: Vec<Vec<String>> = Vec::new();
    let mut current = Vec::new();
    let mut in_code = false;
    for line in block.content {
        let code_at_end = line.state_at_end().is_code_block();
        current.push(Block::text(line));
        if in_code != code_at_end {
            if !code_at_end {
                tabs.push(mem::take(&mut current));
            }
            in_code = code_at_end;
        }
    }
    if !current.is_empty() {
        match tabs.last_mut() {
            Some(last) if current.iter().all(|l| l.trim().is_empty()) => last.append(&mut current),
            _ => tabs.push(current),
        }
    }

    Some(assemble(block, diag, names.clone(), tabs))
}

fn build_tabs(block: &Block<'_>, diag: &Diagnostics) -> Option<Vec<String>> {
    let metadata = block.document.metadata();
    let mut names: Vec<String> = Vec::new();
    let mut tabs: Vec<Vec<String>> = Vec::new();
    let mut current = Vec::new();

    for (offset, line) in block.content.iter().enumerate() {
        let marker = line
            .entities()
            .iter()
            .filter_map(|e| metadata.by_comment(e.id))
            .find(|n| n.is_named(CodeTabs::TAB) && !n.is_multiline());
        if let Some(marker) = marker {
            match marker.parameter(0) {
                Some(name) => names.push(name.to_string()),
                None => {
                    block.warn(
                        diag,
                        block.line_index(offset),
                        format_args!("'{}' marker has no tab name; using a placeholder", marker.name),
                    );
                    names.push(format!("Tab_{}", names.len() + 1));
                }
            }
            if !current.is_empty() {
                tabs.push(mem::take(&mut current));
            }
        } else if !names.is_empty() {
            current.push(Block::text(line));
        } else if !line.is_blank() {
            block.warn(
                diag,
                block.line_index(offset),
                format_args!(
                    "content of '{}' before the first '<!-- tab NAME -->' marker is dropped",
                    block.node.name
                ),
            );
        }
    }
    if !current.is_empty() {
        tabs.push(current);
    }

    Some(assemble(block, diag, names, tabs))
}

fn assemble(
    block: &Block<'_>,
    diag: &Diagnostics,
    mut names: Vec<String>,
    tabs: Vec<Vec<String>>,
) -> Vec<String> {
    if tabs.len() > names.len() {
        block.warn_at_marker(
            diag,
            format_args!(
                "'{}' has more tabs than names; using placeholder names",
                block.node.name
            ),
        );
        let missing = names.len() + 1..=tabs.len();
        names.extend(missing.map(|n| format!("Tab_{n}")));
    } else if tabs.len() < names.len() {
        block.warn_at_marker(
            diag,
            format_args!(
                "'{}' has fewer tabs than names; extra names are ignored",
                block.node.name
            ),
        );
    }

    let mut lines = vec!["{% codetabs %}".to_string()];
    for (name, tab) in names.iter().zip(tabs) {
        lines.push(format!("{{% codetab {name} %}}"));
        lines.extend(tab);
        lines.push("{% endcodetab %}".to_string());
    }
    lines.push("{% endcodetabs %}".to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::super::test_support::parse;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_splits_fenced_blocks_into_tabs() {
        let (mut doc, diag) = parse(
            "<!-- begin codetabs Swift Kotlin -->\n```swift\nlet x = 1\n```\n\n```kotlin\nval x = 1\n```\n<!-- end -->",
        );
        assert!(rewrite_blocks(&mut doc, CodeTabs::CODE_TABS, &diag, build_code_tabs));
        insta::assert_snapshot!(doc.to_markdown(), @r"
        {% codetabs %}
        {% codetab Swift %}
        ```swift
        let x = 1
        ```
        {% endcodetab %}
        {% codetab Kotlin %}

        ```kotlin
        val x = 1
        ```
        {% endcodetab %}
        {% endcodetabs %}
        ");
        assert_eq!(diag.warning_count(), 0);
    }

    #[test]
    fn test_missing_names_get_placeholders() {
        let (mut doc, diag) = parse(
            "<!-- begin codetabs Java -->\n```\na\n```\n```\nb\n```\n<!-- end -->",
        );
        rewrite_blocks(&mut doc, CodeTabs::CODE_TABS, &diag, build_code_tabs);
        assert!(doc.to_markdown().contains("{% codetab Tab_2 %}"));
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_surplus_names_are_ignored() {
        let (mut doc, diag) = parse("<!-- begin codetabs A B C -->\n```\na\n```\n<!-- end -->");
        rewrite_blocks(&mut doc, CodeTabs::CODE_TABS, &diag, build_code_tabs);
        let text = doc.to_markdown();
        assert!(text.contains("{% codetab A %}"));
        assert!(!text.contains("{% codetab B %}"));
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_tab_markers_separate_content() {
        let (mut doc, diag) = parse(
            "<!-- begin tabs -->\n<!-- tab iOS -->\nUse CocoaPods.\n<!-- tab -->\nUse Gradle.\n<!-- end -->",
        );
        assert!(rewrite_blocks(&mut doc, CodeTabs::TABS, &diag, build_tabs));
        assert_eq!(
            doc.to_markdown(),
            "{% codetabs %}\n{% codetab iOS %}\nUse CocoaPods.\n{% endcodetab %}\n{% codetab Tab_2 %}\nUse Gradle.\n{% endcodetab %}\n{% endcodetabs %}"
        );
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_content_before_first_tab_is_reported() {
        let (mut doc, diag) = parse("<!-- begin tabs -->\nstray\n<!-- tab A -->\nx\n<!-- end -->");
        rewrite_blocks(&mut doc, CodeTabs::TABS, &diag, build_tabs);
        assert!(!doc.to_markdown().contains("stray"));
        assert_eq!(diag.warning_count(), 1);
        assert!(diag.messages()[0].starts_with("repo/page.md:2:"));
    }
}
