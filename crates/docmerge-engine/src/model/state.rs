/// Fence delimiter of a fenced code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FenceKind {
    Backticks,
    Tildes,
}

impl FenceKind {
    pub const BACKTICKS: &'static str = "```";
    pub const TILDES: &'static str = "~~~";

    pub fn fence(self) -> &'static str {
        match self {
            FenceKind::Backticks => Self::BACKTICKS,
            FenceKind::Tildes => Self::TILDES,
        }
    }

    /// Detects a fence at the start of `remainder`.
    pub fn detect(remainder: &[u8]) -> Option<FenceKind> {
        if remainder.starts_with(Self::BACKTICKS.as_bytes()) {
            Some(FenceKind::Backticks)
        } else if remainder.starts_with(Self::TILDES.as_bytes()) {
            Some(FenceKind::Tildes)
        } else {
            None
        }
    }
}

/// Lexical mode of the scanner, carried from one line to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LexerState {
    #[default]
    None,
    InlineCode,
    FencedCodeBlock(FenceKind),
}

impl LexerState {
    /// True for states that legitimately span a line boundary.
    pub fn is_multiline(self) -> bool {
        matches!(self, LexerState::FencedCodeBlock(_))
    }

    pub fn is_code_block(self) -> bool {
        self.is_multiline()
    }
}
