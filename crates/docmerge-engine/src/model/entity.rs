use std::ops::Range;

use super::ids::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Heading,
    Link,
    InlineComment,
}

/// Parsed content of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Heading {
        level: u8,
        title: String,
    },
    Link {
        title: String,
        path: String,
        is_image: bool,
    },
    InlineComment {
        content: String,
    },
}

impl Payload {
    pub fn kind(&self) -> EntityKind {
        match self {
            Payload::Heading { .. } => EntityKind::Heading,
            Payload::Link { .. } => EntityKind::Link,
            Payload::InlineComment { .. } => EntityKind::InlineComment,
        }
    }

    /// Markdown source for this payload.
    pub fn to_markdown(&self) -> String {
        match self {
            Payload::Heading { level, title } => {
                format!("{} {}", "#".repeat(usize::from(*level)), title)
            }
            Payload::Link {
                title,
                path,
                is_image,
            } => {
                let bang = if *is_image { "!" } else { "" };
                format!("{bang}[{title}]({path})")
            }
            Payload::InlineComment { content } => format!("<!-- {content} -->"),
        }
    }
}

/// A parsed construct anchored to a byte range of its owning line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: EntityId,
    pub range: Range<usize>,
    pub payload: Payload,
    dirty: bool,
}

impl Entity {
    pub fn new(id: EntityId, range: Range<usize>, payload: Payload) -> Self {
        Self {
            id,
            range,
            payload,
            dirty: false,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.payload.kind()
    }

    /// True when the payload changed since the owning line was last rebuilt.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        self.range.start < range.end && range.start < self.range.end
    }

    /// Applies `change` to the payload. Returns true if the payload changed.
    pub fn modify(&mut self, change: impl FnOnce(&mut Payload)) -> bool {
        let before = self.payload.clone();
        change(&mut self.payload);
        let changed = before != self.payload;
        self.dirty |= changed;
        changed
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn to_markdown(&self) -> String {
        self.payload.to_markdown()
    }

    pub fn heading(&self) -> Option<(u8, &str)> {
        match &self.payload {
            Payload::Heading { level, title } => Some((*level, title.as_str())),
            _ => None,
        }
    }

    pub fn link_path(&self) -> Option<&str> {
        match &self.payload {
            Payload::Link { path, .. } => Some(path.as_str()),
            _ => None,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match &self.payload {
            Payload::InlineComment { content } => Some(content.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Payload::Heading { level: 2, title: "Setup".into() }, "## Setup")]
    #[case(Payload::Link { title: "Docs".into(), path: "a.md".into(), is_image: false }, "[Docs](a.md)")]
    #[case(Payload::Link { title: "Logo".into(), path: "logo.png".into(), is_image: true }, "![Logo](logo.png)")]
    #[case(Payload::InlineComment { content: "begin box info".into() }, "<!-- begin box info -->")]
    fn test_renders_markdown(#[case] payload: Payload, #[case] expected: &str) {
        assert_eq!(payload.to_markdown(), expected);
    }

    #[test]
    fn test_modify_marks_dirty_only_on_change() {
        let mut entity = Entity::new(
            1,
            0..12,
            Payload::Link {
                title: "Docs".into(),
                path: "a.md".into(),
                is_image: false,
            },
        );

        assert!(!entity.modify(|_| {}));
        assert!(!entity.is_dirty());

        assert!(entity.modify(|p| {
            if let Payload::Link { path, .. } = p {
                *path = "a".into();
            }
        }));
        assert!(entity.is_dirty());
        assert_eq!(entity.link_path(), Some("a"));
    }

    #[rstest]
    #[case(0..3, true)]
    #[case(3..5, true)]
    #[case(5..9, false)]
    #[case(0..2, false)]
    fn test_detects_overlap(#[case] range: Range<usize>, #[case] expected: bool) {
        let entity = Entity::new(
            1,
            2..5,
            Payload::InlineComment {
                content: "x".into(),
            },
        );
        assert_eq!(entity.overlaps(&range), expected);
    }
}
