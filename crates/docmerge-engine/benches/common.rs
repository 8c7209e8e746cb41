// Shared by several bench targets; each one only uses part of it.
#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let base = "# Title\n\n## Section\n\nParagraph with a [link](guide/setup.md#install) and `code`.\n\n<!-- begin box info -->\nCareful.\n<!-- end -->\n\n```rust\nfn example() {\n    println!(\"Hello\");\n}\n```\n\n![Logo](images/logo.png)\n\n";
    base.repeat(size)
}
