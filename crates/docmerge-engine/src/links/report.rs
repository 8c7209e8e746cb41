use std::collections::BTreeMap;

/// A link found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// Site path of the document.
    pub document: String,
    /// 1-based line number.
    pub line: usize,
    pub link: String,
}

/// Links worth a second look after the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    pub external: Vec<LinkRecord>,
    pub ambiguous: Vec<LinkRecord>,
}

impl LinkReport {
    pub fn merge(&mut self, other: LinkReport) {
        self.external.extend(other.external);
        self.ambiguous.extend(other.ambiguous);
    }

    /// External links grouped by the document containing them.
    pub fn external_by_document(&self) -> BTreeMap<&str, Vec<&LinkRecord>> {
        let mut grouped: BTreeMap<&str, Vec<&LinkRecord>> = BTreeMap::new();
        for record in &self.external {
            grouped.entry(record.document.as_str()).or_default().push(record);
        }
        grouped
    }

    /// Distinct external links grouped by repository identifier.
    pub fn external_by_repository(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for record in &self.external {
            let repo = record.document.split('/').next().unwrap_or_default();
            let links = grouped.entry(repo).or_default();
            if !links.contains(&record.link.as_str()) {
                links.push(&record.link);
            }
        }
        for links in grouped.values_mut() {
            links.sort_unstable();
        }
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(document: &str, link: &str) -> LinkRecord {
        LinkRecord {
            document: document.into(),
            line: 1,
            link: link.into(),
        }
    }

    #[test]
    fn test_groups_external_links() {
        let report = LinkReport {
            external: vec![
                record("a/index.md", "https://z.example"),
                record("a/guide.md", "https://y.example"),
                record("a/index.md", "https://y.example"),
                record("b/index.md", "https://x.example"),
            ],
            ambiguous: vec![],
        };

        let by_doc = report.external_by_document();
        assert_eq!(by_doc["a/index.md"].len(), 2);
        assert_eq!(by_doc.keys().copied().collect::<Vec<_>>(), vec!["a/guide.md", "a/index.md", "b/index.md"]);

        let by_repo = report.external_by_repository();
        assert_eq!(by_repo["a"], vec!["https://y.example", "https://z.example"]);
        assert_eq!(by_repo["b"], vec!["https://x.example"]);
    }
}
