//! Delimiters of the constructs recognized by the line scanner.

pub struct Escape;

impl Escape {
    pub const CHAR: u8 = b'\\';
    /// Punctuation that may follow a backslash.
    pub const ESCAPABLE: &'static [u8] = b"\\`*_{}[]()#+-.!";
}

pub struct CodeSpan;

impl CodeSpan {
    pub const TICK: u8 = b'`';
}

pub struct Checkbox;

impl Checkbox {
    pub const MARKERS: [&'static [u8]; 3] = [b"[ ]", b"[x]", b"[X]"];
}

pub struct LinkSyntax;

impl LinkSyntax {
    pub const OPEN: u8 = b'[';
    pub const IMAGE_OPEN: &'static [u8] = b"![";
    pub const CLOSE: u8 = b']';
    pub const PATH_OPEN: u8 = b'(';
    pub const PATH_CLOSE: &'static str = ")";
}

pub struct HeadingSyntax;

impl HeadingSyntax {
    pub const MARKER: u8 = b'#';
    pub const MAX_LEVEL: u8 = 6;
}

pub struct Comment;

impl Comment {
    pub const OPEN: &'static str = "<!--";
    pub const CLOSE: &'static str = "-->";
}
