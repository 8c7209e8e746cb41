use crate::diagnostics::{Diagnostics, Severity};
use crate::model::{Entity, FenceKind, IdGenerator, LexerState, Line, Payload};

use super::cursor::Cursor;
use super::kinds::{Checkbox, CodeSpan, Comment, Escape, HeadingSyntax, LinkSyntax};

/// Shared state for one parser invocation.
pub struct ParseContext<'a> {
    pub ids: &'a mut IdGenerator,
    pub diag: &'a Diagnostics,
    /// Path shown in warnings.
    pub source: &'a str,
}

impl ParseContext<'_> {
    fn warn(&self, line_number: usize, severity: Severity, message: &str) {
        self.diag
            .parser_warning(severity, format_args!("{}:{}: {}", self.source, line_number, message));
    }
}

/// Parses a run of lines starting in `initial` state and returns the state
/// after the last line.
///
/// `first_line` is the zero-based index of `lines[0]` in its document and is
/// only used for warnings. Each line's previous entities are discarded.
pub fn parse_lines(
    lines: &mut [Line],
    initial: LexerState,
    first_line: usize,
    ctx: &mut ParseContext<'_>,
) -> LexerState {
    let mut state = initial;
    for (offset, line) in lines.iter_mut().enumerate() {
        line.reset();
        line.state_at_start = state;
        let (entities, end) = scan_line(line.text(), state, first_line + offset + 1, ctx);
        for entity in entities {
            line.add(entity);
        }
        line.state_at_end = end;
        state = end;
    }
    state
}

fn scan_line(
    text: &str,
    mut state: LexerState,
    line_number: usize,
    ctx: &mut ParseContext<'_>,
) -> (Vec<Entity>, LexerState) {
    let mut cur = Cursor::new(text);
    let mut out = Vec::new();

    while !cur.eof() {
        state = match state {
            LexerState::None => step_plain(&mut cur, &mut out, line_number, ctx),
            LexerState::InlineCode => {
                if cur.bump() == Some(CodeSpan::TICK) {
                    LexerState::None
                } else {
                    LexerState::InlineCode
                }
            }
            LexerState::FencedCodeBlock(kind) => {
                if cur.starts_with(kind.fence().as_bytes()) {
                    cur.bump_n(kind.fence().len());
                    LexerState::None
                } else {
                    cur.bump();
                    state
                }
            }
        };
    }

    if state == LexerState::InlineCode {
        ctx.warn(line_number, Severity::Minor, "inline code is not closed on this line");
        state = LexerState::None;
    }
    (out, state)
}

/// Advances past one token in plain text and returns the resulting state.
fn step_plain(
    cur: &mut Cursor<'_>,
    out: &mut Vec<Entity>,
    line_number: usize,
    ctx: &mut ParseContext<'_>,
) -> LexerState {
    match cur.peek() {
        Some(Escape::CHAR) => {
            cur.bump();
            match cur.peek() {
                Some(c) if Escape::ESCAPABLE.contains(&c) => {
                    cur.bump();
                }
                // trailing backslash is a hard line break
                None => {}
                Some(_) => ctx.warn(line_number, Severity::Serious, "invalid escape sequence"),
            }
        }
        Some(CodeSpan::TICK) | Some(b'~') => {
            if let Some(kind) = FenceKind::detect(cur.rest_bytes()) {
                cur.bump_n(kind.fence().len());
                return LexerState::FencedCodeBlock(kind);
            }
            if cur.bump() == Some(CodeSpan::TICK) {
                return LexerState::InlineCode;
            }
        }
        Some(LinkSyntax::OPEN) | Some(b'!') => {
            if let Some(marker) = Checkbox::MARKERS.iter().find(|m| cur.starts_with(m)) {
                cur.bump_n(marker.len());
            } else if let Some(entity) = try_parse_link(cur, line_number, ctx) {
                out.push(entity);
            } else {
                cur.bump();
            }
        }
        Some(HeadingSyntax::MARKER) => {
            if let Some(entity) = try_parse_heading(cur, line_number, ctx) {
                out.push(entity);
            }
        }
        Some(b'<') => {
            if let Some(entity) = try_parse_comment(cur, line_number, ctx) {
                out.push(entity);
            }
        }
        _ => {
            cur.bump();
        }
    }
    LexerState::None
}

/// Matches `[title](path)` or `![title](path)`.
///
/// On failure the cursor is restored so the caller can step over the
/// opening byte and keep scanning.
fn try_parse_link(
    cur: &mut Cursor<'_>,
    line_number: usize,
    ctx: &mut ParseContext<'_>,
) -> Option<Entity> {
    let is_image = cur.starts_with(LinkSyntax::IMAGE_OPEN);
    if !is_image && cur.peek() != Some(LinkSyntax::OPEN) {
        return None;
    }

    let saved = cur.clone();
    let start = cur.pos();
    cur.bump_n(if is_image { 2 } else { 1 });
    let title_start = cur.pos();

    while let Some(b) = cur.peek() {
        let escaped = cur.peek_at(1).is_some_and(|next| Escape::ESCAPABLE.contains(&next));
        if b == Escape::CHAR && escaped {
            cur.bump_n(2);
            continue;
        }
        if b == LinkSyntax::CLOSE {
            break;
        }
        cur.bump();
    }
    if cur.peek() != Some(LinkSyntax::CLOSE) {
        ctx.warn(line_number, Severity::Serious, "link has an empty title");
        *cur = saved;
        return None;
    }
    let title_end = cur.pos();
    cur.bump(); // ]

    if cur.peek() != Some(LinkSyntax::PATH_OPEN) {
        ctx.warn(
            line_number,
            Severity::Minor,
            "text in brackets is not followed by a link path",
        );
        *cur = saved;
        return None;
    }
    cur.bump(); // (
    let path_start = cur.pos();
    let Some(path_end) = cur.find(LinkSyntax::PATH_CLOSE) else {
        ctx.warn(line_number, Severity::Serious, "link path is not closed");
        *cur = saved;
        return None;
    };

    let title = cur.slice(title_start, title_end).trim().to_string();
    let path = cur.slice(path_start, path_end).to_string();
    if title.is_empty() {
        ctx.warn(line_number, Severity::Serious, "link has an empty title");
        *cur = saved;
        return None;
    }
    if path.is_empty() {
        ctx.warn(line_number, Severity::Serious, "link has an empty path");
        *cur = saved;
        return None;
    }

    cur.bump_n(path_end + 1 - cur.pos());
    Some(Entity::new(
        ctx.ids.next_id(),
        start..cur.pos(),
        Payload::Link {
            title,
            path,
            is_image,
        },
    ))
}

/// Matches an ATX heading. A heading consumes the rest of the line.
fn try_parse_heading(
    cur: &mut Cursor<'_>,
    line_number: usize,
    ctx: &mut ParseContext<'_>,
) -> Option<Entity> {
    let start = cur.pos();
    if !cur.consumed().trim().is_empty() {
        ctx.warn(line_number, Severity::Minor, "unescaped '#' in text");
        cur.bump();
        return None;
    }
    if start > 0 {
        ctx.warn(
            line_number,
            Severity::Serious,
            "heading does not start at the beginning of the line",
        );
    }

    let mut level = 0;
    while level < HeadingSyntax::MAX_LEVEL && cur.peek() == Some(HeadingSyntax::MARKER) {
        cur.bump();
        level += 1;
    }
    let title_start = cur.pos();
    cur.finish();
    let title = cur.slice(title_start, cur.pos()).trim().to_string();

    Some(Entity::new(
        ctx.ids.next_id(),
        0..cur.pos(),
        Payload::Heading { level, title },
    ))
}

/// Matches `<!-- content -->` closed on the same line.
fn try_parse_comment(
    cur: &mut Cursor<'_>,
    line_number: usize,
    ctx: &mut ParseContext<'_>,
) -> Option<Entity> {
    if !cur.starts_with(Comment::OPEN.as_bytes()) {
        cur.bump();
        return None;
    }
    let start = cur.pos();
    cur.bump_n(Comment::OPEN.len());
    let inner_start = cur.pos();
    let Some(close) = cur.find(Comment::CLOSE) else {
        ctx.warn(
            line_number,
            Severity::Minor,
            "comment is not closed on the same line",
        );
        return None;
    };

    let content = cur.slice(inner_start, close).trim().to_string();
    cur.bump_n(close + Comment::CLOSE.len() - cur.pos());
    if content.is_empty() {
        ctx.warn(line_number, Severity::Minor, "empty comment");
        return None;
    }
    Some(Entity::new(
        ctx.ids.next_id(),
        start..cur.pos(),
        Payload::InlineComment { content },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::WarningLevel;
    use crate::model::EntityKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(text: &[&str], level: WarningLevel) -> (Vec<Line>, LexerState, Diagnostics) {
        let diag = Diagnostics::new(level, false);
        let mut ids = IdGenerator::new();
        let mut lines: Vec<Line> = text
            .iter()
            .map(|t| Line::new(ids.next_id(), *t))
            .collect();
        let end = {
            let mut ctx = ParseContext {
                ids: &mut ids,
                diag: &diag,
                source: "test.md",
            };
            parse_lines(&mut lines, LexerState::None, 0, &mut ctx)
        };
        (lines, end, diag)
    }

    fn payloads(line: &Line) -> Vec<Payload> {
        line.entities().iter().map(|e| e.payload.clone()).collect()
    }

    fn link(title: &str, path: &str) -> Payload {
        Payload::Link {
            title: title.into(),
            path: path.into(),
            is_image: false,
        }
    }

    #[rstest]
    #[case("# Title", 1, "Title")]
    #[case("### Title With . Dots`", 3, "Title With . Dots`")]
    #[case("##   Padded   ", 2, "Padded")]
    #[case("######## Deep", 6, "## Deep")]
    fn test_parses_headings(#[case] input: &str, #[case] level: u8, #[case] title: &str) {
        let (lines, _, _) = parse(&[input], WarningLevel::All);
        assert_eq!(
            payloads(&lines[0]),
            vec![Payload::Heading {
                level,
                title: title.into()
            }]
        );
        assert_eq!(lines[0].entities()[0].range, 0..input.len());
    }

    #[test]
    fn test_heading_ignores_rest_of_line() {
        let (lines, _, _) = parse(&["## See [a](a.md) <!-- x -->"], WarningLevel::All);
        assert_eq!(lines[0].entities().len(), 1);
        assert_eq!(lines[0].entities()[0].kind(), EntityKind::Heading);
    }

    #[test]
    fn test_indented_heading_is_accepted_with_warning() {
        let (lines, _, diag) = parse(&["  ## Indented"], WarningLevel::Serious);
        assert_eq!(lines[0].entities()[0].heading(), Some((2, "Indented")));
        assert_eq!(diag.warning_count(), 1);
        assert!(diag.messages()[0].starts_with("test.md:1:"));
    }

    #[test]
    fn test_hash_after_text_is_not_a_heading() {
        let (lines, _, diag) = parse(&["C# is a language"], WarningLevel::All);
        assert!(lines[0].entities().is_empty());
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_parses_links_and_images() {
        let (lines, _, _) = parse(
            &["See [the guide](guide.md#setup) and ![Logo](img/logo.png)."],
            WarningLevel::All,
        );
        assert_eq!(
            payloads(&lines[0]),
            vec![
                link("the guide", "guide.md#setup"),
                Payload::Link {
                    title: "Logo".into(),
                    path: "img/logo.png".into(),
                    is_image: true
                }
            ]
        );
        let text = lines[0].text();
        let ranges: Vec<&str> = lines[0]
            .entities()
            .iter()
            .map(|e| &text[e.range.clone()])
            .collect();
        assert_eq!(ranges, vec!["[the guide](guide.md#setup)", "![Logo](img/logo.png)"]);
    }

    #[test]
    fn test_escaped_bracket_stays_in_title() {
        let (lines, _, _) = parse(&[r"[a \] b](x.md)"], WarningLevel::All);
        assert_eq!(payloads(&lines[0]), vec![link(r"a \] b", "x.md")]);
    }

    #[rstest]
    #[case("[](x.md)", 1)]
    #[case("[title]()", 1)]
    #[case("[unclosed title", 1)]
    #[case("[title](unclosed", 1)]
    fn test_empty_link_parts_are_rejected(#[case] input: &str, #[case] warnings: usize) {
        let (lines, _, diag) = parse(&[input], WarningLevel::Serious);
        assert!(lines[0].entities().is_empty());
        assert_eq!(diag.warning_count(), warnings);
    }

    #[test]
    fn test_unclosed_title_reports_empty_title() {
        // Given a bracket that is never closed on its line
        let (lines, _, diag) = parse(&["see [the guide"], WarningLevel::Serious);

        // Then no link is produced and the empty title is reported
        assert!(lines[0].entities().is_empty());
        assert_eq!(diag.messages(), vec!["test.md:1: link has an empty title"]);
    }

    #[test]
    fn test_blank_link_path_is_kept_verbatim() {
        // Given a link whose path is only whitespace
        let (lines, _, diag) = parse(&["[title]( )"], WarningLevel::All);

        // Then the link is accepted with the untrimmed path
        assert_eq!(payloads(&lines[0]), vec![link("title", " ")]);
        assert_eq!(lines[0].entities()[0].range, 0..10);
        assert_eq!(diag.warning_count(), 0);
    }

    #[test]
    fn test_scanning_continues_after_failed_link() {
        let (lines, _, _) = parse(&["[not a link] then [real](r.md)"], WarningLevel::All);
        assert_eq!(payloads(&lines[0]), vec![link("real", "r.md")]);
    }

    #[test]
    fn test_checkboxes_are_skipped() {
        let (lines, _, diag) = parse(&["- [ ] todo", "- [x] [done](d.md)"], WarningLevel::All);
        assert!(lines[0].entities().is_empty());
        assert_eq!(payloads(&lines[1]), vec![link("done", "d.md")]);
        assert_eq!(diag.warning_count(), 0);
    }

    #[test]
    fn test_parses_inline_comments() {
        let (lines, _, _) = parse(
            &["<!-- begin box info --> text <!-- end -->", "<!---->", "<!-- open"],
            WarningLevel::Off,
        );
        assert_eq!(
            payloads(&lines[0]),
            vec![
                Payload::InlineComment {
                    content: "begin box info".into()
                },
                Payload::InlineComment {
                    content: "end".into()
                }
            ]
        );
        assert!(lines[1].entities().is_empty());
        assert!(lines[2].entities().is_empty());
    }

    #[test]
    fn test_inline_code_hides_constructs() {
        let (lines, end, _) = parse(&["`[a](a.md)` and [b](b.md)"], WarningLevel::All);
        assert_eq!(payloads(&lines[0]), vec![link("b", "b.md")]);
        assert_eq!(end, LexerState::None);
    }

    #[test]
    fn test_unterminated_inline_code_ends_with_line() {
        let (lines, end, diag) = parse(&["`open", "[a](a.md)"], WarningLevel::All);
        assert_eq!(lines[0].state_at_end(), LexerState::None);
        assert_eq!(payloads(&lines[1]), vec![link("a", "a.md")]);
        assert_eq!(end, LexerState::None);
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_fenced_block_spans_lines() {
        let (lines, end, _) = parse(
            &["```rust", "# not a heading", "~~~", "```", "# Heading"],
            WarningLevel::All,
        );
        let fenced = LexerState::FencedCodeBlock(FenceKind::Backticks);
        assert_eq!(lines[0].state_at_end(), fenced);
        assert!(lines[1].entities().is_empty());
        assert_eq!(lines[2].state_at_end(), fenced);
        assert_eq!(lines[3].state_at_start(), fenced);
        assert_eq!(lines[3].state_at_end(), LexerState::None);
        assert_eq!(lines[4].entities().len(), 1);
        assert_eq!(end, LexerState::None);
    }

    #[test]
    fn test_tilde_fence_closes_only_on_tildes() {
        let (_, end, _) = parse(&["~~~", "```"], WarningLevel::All);
        assert_eq!(end, LexerState::FencedCodeBlock(FenceKind::Tildes));
    }

    #[rstest]
    #[case(r"\* not a list", 0)]
    #[case(r"trailing \", 0)]
    #[case(r"C:\Users", 1)]
    fn test_escapes(#[case] input: &str, #[case] warnings: usize) {
        let (_, _, diag) = parse(&[input], WarningLevel::Serious);
        assert_eq!(diag.warning_count(), warnings);
    }

    #[test]
    fn test_escaped_hash_is_not_a_heading() {
        let (lines, _, _) = parse(&[r"\# literal"], WarningLevel::All);
        assert!(lines[0].entities().is_empty());
    }

    #[test]
    fn test_multibyte_text_is_handled() {
        let (lines, _, _) = parse(&["Zürich → [Straße](straße.md)"], WarningLevel::All);
        let entity = &lines[0].entities()[0];
        assert_eq!(&lines[0].text()[entity.range.clone()], "[Straße](straße.md)");
    }
}
