use super::{DocumentPass, document_mut, rewrite_blocks};
use crate::database::DocumentationDatabase;
use crate::diagnostics::Diagnostics;
use crate::error::EngineError;

/// Deletes `<!-- begin remove -->` blocks together with their markers.
pub struct RemoveSections;

impl RemoveSections {
    pub const BLOCK: &'static str = "remove";
}

impl DocumentPass for RemoveSections {
    fn name(&self) -> &'static str {
        "remove-sections"
    }

    fn apply(
        &mut self,
        db: &mut DocumentationDatabase,
        path: &str,
        diag: &Diagnostics,
    ) -> Result<bool, EngineError> {
        let document = document_mut(db, path)?;
        rewrite_blocks(document, Self::BLOCK, diag, |_, _| Some(Vec::new()));
        Ok(true)
    }
}
