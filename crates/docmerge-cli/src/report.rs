//! Post-run reports printed on request.

use docmerge_engine::{DocumentationDatabase, LinkReport};
use std::io::{self, Write};

use crate::Grouping;

pub fn write_link_report(out: &mut impl Write, report: &LinkReport, grouping: Grouping) -> io::Result<()> {
    writeln!(out, "External links:")?;
    match grouping {
        Grouping::Document => {
            for (document, records) in report.external_by_document() {
                writeln!(out, "  {document}")?;
                for record in records {
                    writeln!(out, "    {}: {}", record.line, record.link)?;
                }
            }
        }
        Grouping::Repository => {
            for (repo_id, links) in report.external_by_repository() {
                writeln!(out, "  {repo_id}")?;
                for link in links {
                    writeln!(out, "    {link}")?;
                }
            }
        }
    }

    if !report.ambiguous.is_empty() {
        writeln!(out, "Ambiguous anchors:")?;
        for record in &report.ambiguous {
            writeln!(out, "  {}:{}: {}", record.document, record.line, record.link)?;
        }
    }
    Ok(())
}

/// Documents and files no resolved link points to.
pub fn write_unused(out: &mut impl Write, db: &DocumentationDatabase) -> io::Result<()> {
    let unused: Vec<_> = db
        .unreferenced_items()
        .into_iter()
        .filter(|item| !item.is_dir())
        .collect();
    if unused.is_empty() {
        return writeln!(out, "No unused documents.");
    }
    writeln!(out, "Unused documents:")?;
    for item in unused {
        writeln!(out, "  {}", item.local_path)?;
    }
    Ok(())
}
