use super::DocumentPass;
use crate::database::DocumentationDatabase;
use crate::diagnostics::Diagnostics;
use crate::error::EngineError;
use crate::links::{LinkReport, resolve_document_links};

/// Rewrites every link to its published form and counts references.
pub struct ResolveLinks;

impl DocumentPass for ResolveLinks {
    fn name(&self) -> &'static str {
        "resolve-links"
    }

    fn set_up(&mut self, db: &mut DocumentationDatabase) -> Result<(), EngineError> {
        *db.link_report_mut() = LinkReport::default();
        Ok(())
    }

    fn apply(
        &mut self,
        db: &mut DocumentationDatabase,
        path: &str,
        diag: &Diagnostics,
    ) -> Result<bool, EngineError> {
        let updated = resolve_document_links(db, path, diag)?;
        log::debug!("{path}: {updated} links updated");
        Ok(true)
    }
}
