use super::{Block, DocumentPass, document_mut, rewrite_blocks};
use crate::database::DocumentationDatabase;
use crate::diagnostics::Diagnostics;
use crate::error::EngineError;

/// Turns `<!-- begin box STYLE -->` blocks into `{% box STYLE %}` tags.
pub struct InfoBoxes;

impl InfoBoxes {
    pub const BLOCK: &'static str = "box";
    pub const STYLES: [&'static str; 3] = ["info", "warning", "success"];
}

impl DocumentPass for InfoBoxes {
    fn name(&self) -> &'static str {
        "build-info-boxes"
    }

    fn apply(
        &mut self,
        db: &mut DocumentationDatabase,
        path: &str,
        diag: &Diagnostics,
    ) -> Result<bool, EngineError> {
        let document = document_mut(db, path)?;
        Ok(rewrite_blocks(document, Self::BLOCK, diag, build_box))
    }
}

fn build_box(block: &Block<'_>, diag: &Diagnostics) -> Option<Vec<String>> {
    let Some(style) = block.node.parameter(0) else {
        block.warn_at_marker(
            diag,
            format_args!("'{}' marker has no style", block.node.name),
        );
        return None;
    };
    if !InfoBoxes::STYLES.iter().any(|s| *s == style) {
        block.warn_at_marker(
            diag,
            format_args!(
                "'{}' marker has unknown style '{style}'; use one of {}",
                block.node.name,
                InfoBoxes::STYLES.join(", ")
            ),
        );
    }

    let mut lines = Vec::with_capacity(block.content.len() + 2);
    lines.push(format!("{{% box {style} %}}"));
    lines.extend(block.content.iter().map(Block::text));
    lines.push("{% endbox %}".to_string());
    Some(lines)
}
