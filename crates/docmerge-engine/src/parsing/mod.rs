//! Incremental line scanner.
//!
//! The scanner only knows the constructs the rewrite passes care about:
//! headings, links and images, inline HTML comments, fenced code blocks and
//! inline code spans. It runs over any slice of lines given the lexer state
//! in effect before the first one, so edits only re-scan the lines they add.

pub mod cursor;
pub mod kinds;
pub mod scanner;

pub use scanner::{ParseContext, parse_lines};
