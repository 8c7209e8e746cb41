//! Database object documentation.
//!
//! ```markdown
//! <!-- begin database table es_operation_template -->
//! ### Operation Templates
//! Stores operation definitions.
//! #### Columns
//! ...
//! #### Schema
//! ...
//! <!-- end -->
//! ```

use super::{Block, DocumentPass, SectionWriter, TemplateSection, document_mut, rewrite_blocks};
use crate::database::DocumentationDatabase;
use crate::diagnostics::Diagnostics;
use crate::error::EngineError;

pub struct DatabaseDocs;

impl DatabaseDocs {
    pub const BLOCK: &'static str = "database";
}

impl DocumentPass for DatabaseDocs {
    fn name(&self) -> &'static str {
        "build-database-docs"
    }

    fn apply(
        &mut self,
        db: &mut DocumentationDatabase,
        path: &str,
        diag: &Diagnostics,
    ) -> Result<bool, EngineError> {
        let document = document_mut(db, path)?;
        Ok(rewrite_blocks(document, Self::BLOCK, diag, build_database))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DatabaseSection {
    Object {
        kind: String,
        name: String,
        title: String,
    },
    Description,
    Definition,
    DefinitionTab(String),
}

impl TemplateSection for DatabaseSection {
    fn begin_tag(&self) -> String {
        match self {
            DatabaseSection::Object { kind, name, title } => {
                format!("{{% database {kind} {name} \"{title}\" %}}")
            }
            DatabaseSection::Description => "{% databasedescription %}".to_string(),
            DatabaseSection::Definition => "{% databasetabs %}".to_string(),
            DatabaseSection::DefinitionTab(title) => format!("{{% databasetab {title} %}}"),
        }
    }

    fn end_tag(&self) -> &'static str {
        match self {
            DatabaseSection::Object { .. } => "{% enddatabase %}",
            DatabaseSection::Description => "{% enddatabasedescription %}",
            DatabaseSection::Definition => "{% enddatabasetabs %}",
            DatabaseSection::DefinitionTab(_) => "{% enddatabasetab %}",
        }
    }
}

fn build_database(block: &Block<'_>, diag: &Diagnostics) -> Option<Vec<String>> {
    let node = block.node;
    let (Some(kind), Some(name)) = (node.parameter(0), node.parameter(1)) else {
        block.warn_at_marker(
            diag,
            format_args!("'{}' marker needs an object type and a name", node.name),
        );
        return None;
    };
    let Some((title_offset, _, title)) = block.first_heading().filter(|(_, level, _)| *level == 3)
    else {
        block.warn_at_marker(
            diag,
            format_args!("'{}' block must start with a level-3 heading naming the object", node.name),
        );
        return None;
    };

    let mut out = SectionWriter::new(block.content.len() + 10);
    out.open(DatabaseSection::Object {
        kind: kind.to_string(),
        name: name.to_string(),
        title: title.to_string(),
    });

    let mut description_lines = 0;
    let mut has_definition = false;

    for (offset, line) in block.content.iter().enumerate() {
        let Some((level, heading)) = line.entities().iter().find_map(|e| e.heading()) else {
            if out.top() == Some(&DatabaseSection::Description) && !line.is_blank() {
                description_lines += 1;
            }
            out.push_line(Block::text(line));
            continue;
        };

        if offset == title_offset {
            out.push_line(Block::text(line));
            out.open(DatabaseSection::Description);
            continue;
        }

        let at = block.line_index(offset);
        if matches!(
            out.top(),
            Some(DatabaseSection::Description | DatabaseSection::DefinitionTab(_))
        ) {
            out.close();
        }
        if !matches!(
            out.top(),
            Some(DatabaseSection::Object { .. } | DatabaseSection::Definition)
        ) {
            block.warn(diag, at, "definition heading is not allowed here");
            return None;
        }
        if level != 4 {
            block.warn(diag, at, "definition heading should be a level-4 heading");
        }
        if !has_definition {
            out.open(DatabaseSection::Definition);
            has_definition = true;
        }
        out.open(DatabaseSection::DefinitionTab(heading.to_string()));
    }

    if !has_definition {
        block.warn_at_marker(
            diag,
            "database block has no definition; add one or more '#### TAB' headings",
        );
        return None;
    }
    if description_lines == 0 {
        block.warn_at_marker(diag, "database block has no description");
    }
    Some(out.finish())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::parse;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builds_database_tags() {
        let (mut doc, diag) = parse(
            "<!-- begin database table es_operation_template -->
### Operation Templates

Stores operation definitions.

#### Columns
| Name | Type |
|---|---|
| `id` | `bigint` |
#### Schema
```sql
create table es_operation_template (id bigint);
```
<!-- end -->",
        );
        assert!(rewrite_blocks(&mut doc, DatabaseDocs::BLOCK, &diag, build_database));
        insta::assert_snapshot!(doc.to_markdown(), @r#"
        {% database table es_operation_template "Operation Templates" %}
        ### Operation Templates
        {% databasedescription %}

        Stores operation definitions.

        {% enddatabasedescription %}
        {% databasetabs %}
        {% databasetab Columns %}
        | Name | Type |
        |---|---|
        | `id` | `bigint` |
        {% enddatabasetab %}
        {% databasetab Schema %}
        ```sql
        create table es_operation_template (id bigint);
        ```
        {% enddatabasetab %}
        {% enddatabasetabs %}
        {% enddatabase %}
        "#);
        assert_eq!(diag.warning_count(), 0);
    }

    #[test]
    fn test_block_without_definition_fails() {
        let text = "<!-- begin database table t -->\n### T\nabout\n<!-- end -->";
        let (mut doc, diag) = parse(text);
        assert!(!rewrite_blocks(&mut doc, DatabaseDocs::BLOCK, &diag, build_database));
        assert_eq!(doc.to_markdown(), text);
        assert!(diag.messages()[0].contains("no definition"));
    }

    #[test]
    fn test_missing_name_fails() {
        let (mut doc, diag) = parse("<!-- begin database table -->\n### T\n#### DDL\n<!-- end -->");
        assert!(!rewrite_blocks(&mut doc, DatabaseDocs::BLOCK, &diag, build_database));
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_wrong_definition_level_only_warns() {
        let (mut doc, diag) = parse("<!-- begin database view v -->\n### V\nabout\n## DDL\nx\n<!-- end -->");
        assert!(rewrite_blocks(&mut doc, DatabaseDocs::BLOCK, &diag, build_database));
        assert!(doc.to_markdown().contains("{% databasetab DDL %}"));
        assert_eq!(
            diag.messages(),
            vec!["repo/page.md:4: definition heading should be a level-4 heading".to_string()]
        );
    }
}
