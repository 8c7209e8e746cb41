//! Annotation blocks written as inline HTML comments.
//!
//! ```markdown
//! <!-- begin box warning -->
//! Careful here.
//! <!-- end -->
//! <!-- AUTHOR jane 2024-01-01 -->
//! ```
//!
//! `begin NAME ...` opens a block, `end [NAME]` closes the innermost one and
//! any other comment is a single-line node. Comments starting with `!!` are
//! ordinary comments.

use crate::diagnostics::{Diagnostics, Severity};
use crate::model::{EntityId, Line, LineId, MetadataId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataToken {
    Begin { name: String, parameters: Vec<String> },
    End { name: Option<String> },
    Simple { name: String, parameters: Vec<String> },
    Malformed(&'static str),
    Ignored,
}

impl MetadataToken {
    pub const BEGIN: &'static str = "begin";
    pub const END: &'static str = "end";
    pub const PLAIN_COMMENT: &'static str = "!!";

    pub fn parse(content: &str) -> Self {
        let mut tokens = content.split_whitespace().map(str::to_string);
        let Some(first) = tokens.next() else {
            return MetadataToken::Ignored;
        };
        if first == Self::PLAIN_COMMENT {
            return MetadataToken::Ignored;
        }
        if first.eq_ignore_ascii_case(Self::END) {
            return MetadataToken::End {
                name: tokens.next(),
            };
        }
        if first.eq_ignore_ascii_case(Self::BEGIN) {
            return match tokens.next() {
                Some(name) => MetadataToken::Begin {
                    name,
                    parameters: tokens.collect(),
                },
                None => MetadataToken::Malformed("'begin' marker without a block name"),
            };
        }
        MetadataToken::Simple {
            name: first,
            parameters: tokens.collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataNode {
    pub id: MetadataId,
    pub parent: Option<MetadataId>,
    pub name: String,
    pub name_lowercase: String,
    pub parameters: Vec<String>,
    pub begin_line: LineId,
    pub end_line: LineId,
    pub begin_comment: EntityId,
    pub end_comment: EntityId,
}

impl MetadataNode {
    fn new(
        line: LineId,
        comment: EntityId,
        parent: Option<MetadataId>,
        name: String,
        parameters: Vec<String>,
    ) -> Self {
        Self {
            id: MetadataId { line, comment },
            parent,
            name_lowercase: name.to_lowercase(),
            name,
            parameters,
            begin_line: line,
            end_line: line,
            begin_comment: comment,
            end_comment: comment,
        }
    }

    pub fn is_multiline(&self) -> bool {
        self.begin_line != self.end_line
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name_lowercase == name.to_lowercase()
    }

    pub fn parameter(&self, index: usize) -> Option<&str> {
        self.parameters.get(index).map(String::as_str)
    }
}

/// Metadata nodes of one document, in document order.
#[derive(Debug, Clone, Default)]
pub struct MetadataTree {
    nodes: Vec<MetadataNode>,
}

struct OpenBlock {
    node: usize,
    line_number: usize,
}

impl MetadataTree {
    /// Rebuilds the tree from every inline comment in `lines`.
    pub fn build(lines: &[Line], diag: &Diagnostics, source: &str) -> Self {
        let warn = |line_number: usize, message: String| {
            diag.parser_warning(
                Severity::Serious,
                format_args!("{source}:{line_number}: {message}"),
            );
        };

        let mut nodes: Vec<MetadataNode> = Vec::new();
        let mut stack: Vec<OpenBlock> = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            let line_number = index + 1;
            for entity in line.entities() {
                let Some(content) = entity.comment() else {
                    continue;
                };
                let parent = stack.last().map(|open| nodes[open.node].id);
                match MetadataToken::parse(content) {
                    MetadataToken::Begin { name, parameters } => {
                        nodes.push(MetadataNode::new(line.id(), entity.id, parent, name, parameters));
                        stack.push(OpenBlock {
                            node: nodes.len() - 1,
                            line_number,
                        });
                    }
                    MetadataToken::Simple { name, parameters } => {
                        nodes.push(MetadataNode::new(line.id(), entity.id, parent, name, parameters));
                    }
                    MetadataToken::End { name } => {
                        let Some(open) = stack.last() else {
                            warn(line_number, "'end' marker without an open block".into());
                            continue;
                        };
                        let node = &mut nodes[open.node];
                        if let Some(name) = &name
                            && !node.is_named(name)
                        {
                            warn(
                                line_number,
                                format!("'end {name}' does not match open block '{}'", node.name),
                            );
                            continue;
                        }
                        node.end_line = line.id();
                        node.end_comment = entity.id;
                        if !node.is_multiline() {
                            warn(
                                line_number,
                                format!("block '{}' begins and ends on the same line", node.name),
                            );
                        }
                        stack.pop();
                    }
                    MetadataToken::Malformed(message) => warn(line_number, message.into()),
                    MetadataToken::Ignored => {}
                }
            }
        }

        for open in stack {
            warn(
                open.line_number,
                format!("block '{}' is never closed", nodes[open.node].name),
            );
        }

        Self { nodes }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetadataNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: MetadataId) -> Option<&MetadataNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// All nodes named `name`, case-insensitively.
    pub fn by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MetadataNode> + 'a {
        self.nodes.iter().filter(move |n| n.is_named(name))
    }

    pub fn by_name_multiline<'a>(
        &'a self,
        name: &'a str,
        multiline: bool,
    ) -> impl Iterator<Item = &'a MetadataNode> + 'a {
        self.by_name(name).filter(move |n| n.is_multiline() == multiline)
    }

    pub fn first_by_name(&self, name: &str) -> Option<&MetadataNode> {
        self.nodes.iter().find(|n| n.is_named(name))
    }

    pub fn children(&self, parent: MetadataId) -> impl Iterator<Item = &MetadataNode> {
        self.nodes.iter().filter(move |n| n.parent == Some(parent))
    }

    pub fn parent_of(&self, node: &MetadataNode) -> Option<&MetadataNode> {
        node.parent.and_then(|id| self.get(id))
    }

    /// Node whose opening comment is entity `comment`.
    pub fn by_comment(&self, comment: EntityId) -> Option<&MetadataNode> {
        self.nodes.iter().find(|n| n.begin_comment == comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::WarningLevel;
    use crate::model::IdGenerator;
    use crate::parsing::{ParseContext, parse_lines};
    use crate::model::LexerState;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn build(text: &str) -> (Vec<Line>, MetadataTree, Diagnostics) {
        let diag = Diagnostics::new(WarningLevel::Serious, false);
        let mut ids = IdGenerator::new();
        let mut lines: Vec<Line> = text.split('\n').map(|t| Line::new(ids.next_id(), t)).collect();
        let mut ctx = ParseContext {
            ids: &mut ids,
            diag: &diag,
            source: "doc.md",
        };
        parse_lines(&mut lines, LexerState::None, 0, &mut ctx);
        let tree = MetadataTree::build(&lines, &diag, "doc.md");
        (lines, tree, diag)
    }

    #[rstest]
    #[case("begin box info", MetadataToken::Begin { name: "box".into(), parameters: vec!["info".into()] })]
    #[case("BEGIN api GET /x", MetadataToken::Begin { name: "api".into(), parameters: vec!["GET".into(), "/x".into()] })]
    #[case("end", MetadataToken::End { name: None })]
    #[case("end  box", MetadataToken::End { name: Some("box".into()) })]
    #[case("AUTHOR jane 2024-01-01", MetadataToken::Simple { name: "AUTHOR".into(), parameters: vec!["jane".into(), "2024-01-01".into()] })]
    #[case("!! just a note", MetadataToken::Ignored)]
    #[case("begin", MetadataToken::Malformed("'begin' marker without a block name"))]
    fn test_tokenizes(#[case] content: &str, #[case] expected: MetadataToken) {
        assert_eq!(MetadataToken::parse(content), expected);
    }

    #[test]
    fn test_builds_nested_blocks() {
        let (lines, tree, diag) = build(
            "<!-- begin tabs -->\n<!-- tab Swift -->\ncode\n<!-- begin box info -->\nx\n<!-- end box -->\n<!-- end -->",
        );
        assert_eq!(diag.warning_count(), 0);
        assert_eq!(tree.len(), 3);

        let tabs = tree.first_by_name("TABS").unwrap();
        assert!(tabs.is_multiline());
        assert_eq!(tabs.begin_line, lines[0].id());
        assert_eq!(tabs.end_line, lines[6].id());
        assert_eq!(tabs.parent, None);

        let children: Vec<&str> = tree.children(tabs.id).map(|n| n.name.as_str()).collect();
        assert_eq!(children, vec!["tab", "box"]);

        let tab = tree.first_by_name("tab").unwrap();
        assert!(!tab.is_multiline());
        assert_eq!(tab.parameter(0), Some("Swift"));
        assert_eq!(tree.parent_of(tab).map(|p| p.name.as_str()), Some("tabs"));
    }

    #[test]
    fn test_filters_by_multiline_flag() {
        let (_, tree, _) = build("<!-- begin box -->\n<!-- end -->\n<!-- box -->");
        assert_eq!(tree.by_name_multiline("box", true).count(), 1);
        assert_eq!(tree.by_name_multiline("box", false).count(), 1);
        assert_eq!(tree.by_name("box").count(), 2);
    }

    #[test]
    fn test_unmatched_end_leaves_stack_untouched() {
        let (_, tree, diag) = build("<!-- begin remove -->\nx\n<!-- end box -->\n<!-- end remove -->");
        assert_eq!(diag.warning_count(), 1);
        assert!(tree.first_by_name("remove").unwrap().is_multiline());
    }

    #[test]
    fn test_end_without_begin_warns() {
        let (_, tree, diag) = build("text\n<!-- end -->");
        assert!(tree.is_empty());
        assert_eq!(diag.warning_count(), 1);
        assert!(diag.messages()[0].starts_with("doc.md:2:"));
    }

    #[test]
    fn test_unclosed_block_warns_at_its_begin_line() {
        let (_, tree, diag) = build("\n<!-- begin remove -->\nx");
        let node = tree.first_by_name("remove").unwrap();
        assert!(!node.is_multiline());
        assert_eq!(diag.messages(), vec!["doc.md:2: block 'remove' is never closed".to_string()]);
    }

    #[test]
    fn test_begin_and_end_on_one_line_warns() {
        let (_, tree, diag) = build("<!-- begin box --> hi <!-- end -->");
        assert_eq!(tree.len(), 1);
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_ids_combine_line_and_comment() {
        let (lines, tree, _) = build("x <!-- SIDEBAR _Sidebar.md sticky -->");
        let node = tree.first_by_name("sidebar").unwrap();
        let comment = &lines[0].entities()[0];
        assert_eq!(node.id, MetadataId { line: lines[0].id(), comment: comment.id });
        assert_eq!(tree.by_comment(comment.id), Some(node));
        assert_eq!(tree.get(node.id), Some(node));
    }
}
