//! REST endpoint documentation.
//!
//! ```markdown
//! <!-- begin api POST /note/edit -->
//! ### Edit note
//! Edit an existing note.
//! #### Request
//! ...
//! #### Response 200
//! ...
//! <!-- end -->
//! ```
//!
//! The level-3 heading is the endpoint title. Text up to the first level-4
//! heading is the description, `#### Request` starts the request and every
//! `#### Response CODE` adds a response tab.

use super::{Block, DocumentPass, SectionWriter, TemplateSection, document_mut, rewrite_blocks};
use crate::database::DocumentationDatabase;
use crate::diagnostics::Diagnostics;
use crate::error::EngineError;

pub struct ApiDocs;

impl ApiDocs {
    pub const BLOCK: &'static str = "api";
}

impl DocumentPass for ApiDocs {
    fn name(&self) -> &'static str {
        "build-api-docs"
    }

    fn apply(
        &mut self,
        db: &mut DocumentationDatabase,
        path: &str,
        diag: &Diagnostics,
    ) -> Result<bool, EngineError> {
        let document = document_mut(db, path)?;
        Ok(rewrite_blocks(document, Self::BLOCK, diag, build_api))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ApiSection {
    Api {
        method: String,
        uri: String,
        title: String,
    },
    Description,
    Request,
    Response,
    ResponseTab(String),
}

impl TemplateSection for ApiSection {
    fn begin_tag(&self) -> String {
        match self {
            ApiSection::Api { method, uri, title } => format!("{{% api {method} {uri} \"{title}\" %}}"),
            ApiSection::Description => "{% apidescription %}".to_string(),
            ApiSection::Request => "{% apirequest %}".to_string(),
            ApiSection::Response => "{% apiresponse %}".to_string(),
            ApiSection::ResponseTab(code) => format!("{{% apiresponsetab {code} %}}"),
        }
    }

    fn end_tag(&self) -> &'static str {
        match self {
            ApiSection::Api { .. } => "{% endapi %}",
            ApiSection::Description => "{% endapidescription %}",
            ApiSection::Request => "{% endapirequest %}",
            ApiSection::Response => "{% endapiresponse %}",
            ApiSection::ResponseTab(_) => "{% endapiresponsetab %}",
        }
    }
}

fn build_api(block: &Block<'_>, diag: &Diagnostics) -> Option<Vec<String>> {
    let node = block.node;
    let (Some(method), Some(uri)) = (node.parameter(0), node.parameter(1)) else {
        block.warn_at_marker(
            diag,
            format_args!("'{}' marker needs an HTTP method and a URI", node.name),
        );
        return None;
    };
    let Some((title_offset, _, title)) = block.first_heading().filter(|(_, level, _)| *level == 3)
    else {
        block.warn_at_marker(
            diag,
            format_args!("'{}' block must start with a level-3 heading naming the endpoint", node.name),
        );
        return None;
    };

    let mut out = SectionWriter::new(block.content.len() + 10);
    out.open(ApiSection::Api {
        method: method.to_uppercase(),
        uri: uri.to_string(),
        title: title.to_string(),
    });

    let mut description_lines = 0;
    let mut has_request = false;
    let mut has_response = false;

    for (offset, line) in block.content.iter().enumerate() {
        let at = block.line_index(offset);
        let Some((level, heading)) = line.entities().iter().find_map(|e| e.heading()) else {
            if out.top() == Some(&ApiSection::Description) && !line.is_blank() {
                description_lines += 1;
            }
            out.push_line(Block::text(line));
            continue;
        };

        if offset == title_offset {
            out.push_line(Block::text(line));
            out.open(ApiSection::Description);
            continue;
        }

        let lowered = heading.to_lowercase();
        if lowered == "request" {
            if out.top() == Some(&ApiSection::Description) {
                out.close();
            }
            if !matches!(out.top(), Some(ApiSection::Api { .. })) {
                block.warn(diag, at, "request heading is not allowed here");
                return None;
            }
            if has_request {
                block.warn(diag, at, "only one request heading is allowed");
                return None;
            }
            if level != 4 {
                block.warn(diag, at, "request heading should be a level-4 heading");
            }
            has_request = true;
            out.open(ApiSection::Request);
        } else if lowered.starts_with("response") {
            if matches!(
                out.top(),
                Some(ApiSection::Description | ApiSection::Request | ApiSection::ResponseTab(_))
            ) {
                out.close();
            }
            if !matches!(out.top(), Some(ApiSection::Api { .. } | ApiSection::Response)) {
                block.warn(diag, at, "response heading is not allowed here");
                return None;
            }
            if level != 4 {
                block.warn(diag, at, "response heading should be a level-4 heading");
            }
            let Some(code) = heading.split_whitespace().nth(1) else {
                block.warn(diag, at, "response heading needs a status code");
                return None;
            };
            if !has_response {
                out.open(ApiSection::Response);
                has_response = true;
            }
            out.open(ApiSection::ResponseTab(code.to_string()));
        } else {
            if level <= 3 {
                block.warn(diag, at, "unrecognized heading in API block");
            }
            out.push_line(Block::text(line));
        }
    }

    if !has_response {
        block.warn_at_marker(
            diag,
            "API block has no response; declare one with a '#### Response CODE' heading",
        );
        return None;
    }
    if description_lines == 0 {
        block.warn_at_marker(diag, "API block has no description");
    }
    Some(out.finish())
}
