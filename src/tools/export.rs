//! Bibliography export tools: Libris search results rendered as RIS,
//! BibTeX or plain records.

use serde_json::{json, Value as JsonValue};

use crate::config::Endpoint;
use crate::convert::{get_bounded_u64, get_choice, get_string_arg, Args};
use crate::error::{McpError, Result};
use crate::record::Fields;
use crate::render::{EntryKind, ExportFormat, Render};
use crate::schema;
use crate::tools::libris::{xsearch_request, xsearch_template};
use crate::tools::{Binding, Call, ToolDef};

const MAX_RECORD_IDS: usize = 20;

/// Get all export tool bindings.
pub fn bindings() -> Vec<Binding> {
    vec![
        Binding::fetch(
            ToolDef::new(
                "export_author_bibliography",
                "Export an author's works from Libris as a bibliography (RIS for Zotero \
                 and EndNote, BibTeX for LaTeX, or JSON records).",
                schema!(object {
                    required: { "author_name": string = "Author, e.g. 'Lindgren, Astrid'" },
                    optional: {
                        "format": string = "ris, bibtex or json (default ris)",
                        "max_results": integer = "Max records, 1-200 (default 50)"
                    }
                }),
            ),
            author_bibliography,
        ),
        Binding::fetch(
            ToolDef::new(
                "export_subject_bibliography",
                "Export a reading list on a subject from Libris as RIS, BibTeX or JSON.",
                schema!(object {
                    required: { "subject": string = "Subject heading" },
                    optional: {
                        "format": string = "ris, bibtex or json (default ris)",
                        "max_results": integer = "Max records, 1-200 (default 50)"
                    }
                }),
            ),
            subject_bibliography,
        ),
        Binding::fetch(
            ToolDef::new(
                "export_search_results",
                "Export up to 100 hits of any Libris search as RIS, BibTeX or JSON.",
                schema!(object {
                    required: { "query": string = "Search terms" },
                    optional: { "format": string = "ris, bibtex or json (default ris)" }
                }),
            ),
            search_results,
        ),
        Binding::fetch(
            ToolDef::new(
                "export_publication_list",
                "Export specific Libris records, given as a comma-separated list of up to \
                 20 IDs.",
                schema!(object {
                    required: { "record_ids": string = "e.g. '12345, 67890'" },
                    optional: { "format": string = "ris, bibtex or json (default ris)" }
                }),
            ),
            publication_list,
        ),
        Binding::local(
            ToolDef::new(
                "export_formats_info",
                "The bibliography formats the export tools produce, with file extension, \
                 typical use and the tools that offer each.",
                schema!(object {}),
            ),
            formats_info,
        ),
    ]
}

const BIBLIOGRAPHY_TOOLS: &[&str] = &[
    "export_author_bibliography",
    "export_subject_bibliography",
    "export_search_results",
    "export_publication_list",
];

/// Format name, file extension and typical consumers.
const FORMATS: &[(&str, &str, &str)] = &[
    ("ris", ".ris", "Reference managers: Zotero, EndNote, Mendeley"),
    ("bibtex", ".bib", "LaTeX documents"),
    ("json", ".json", "Programmatic processing with full record fields"),
];

fn formats_info(_args: &Args) -> Result<Fields> {
    let formats: Vec<JsonValue> = FORMATS
        .iter()
        .map(|(name, extension, use_case)| {
            let mut tools: Vec<&str> = BIBLIOGRAPHY_TOOLS.to_vec();
            if *name != "json" {
                tools.push("swepub_export");
            }
            json!({
                "format": name,
                "extension": extension,
                "use": use_case,
                "tools": tools,
            })
        })
        .collect();
    let mut fields = Fields::new();
    fields.insert("formats".into(), JsonValue::Array(formats));
    Ok(fields)
}

fn export_call(args: &Args, query: &str, n: u64) -> Result<Call> {
    let format = get_choice(args, "format", "ris", &["ris", "bibtex", "json"])?;
    Ok(Call::new(
        xsearch_request(Endpoint::LibrisXsearch, query, None, n, None),
        xsearch_template(),
    )
    .then(Render::Export(ExportFormat::from_arg(&format), EntryKind::Book)))
}

fn max_results(args: &Args) -> Result<u64> {
    get_bounded_u64(args, "max_results", 50, 1, 200)
}

fn author_bibliography(args: &Args) -> Result<Call> {
    let author = get_string_arg(args, "author_name")?;
    export_call(args, &format!("författare:{}", author), max_results(args)?)
}

fn subject_bibliography(args: &Args) -> Result<Call> {
    let subject = get_string_arg(args, "subject")?;
    export_call(args, &format!("ämne:{}", subject), max_results(args)?)
}

fn search_results(args: &Args) -> Result<Call> {
    let query = get_string_arg(args, "query")?;
    export_call(args, &query, 100)
}

/// Split a comma-separated ID list. Blank entries are dropped and only the
/// first [`MAX_RECORD_IDS`] are kept.
fn record_ids(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .take(MAX_RECORD_IDS)
        .collect()
}

fn publication_list(args: &Args) -> Result<Call> {
    let raw = get_string_arg(args, "record_ids")?;
    let ids = record_ids(&raw);
    if ids.is_empty() {
        return Err(McpError::invalid_arg("record_ids", "no record IDs given"));
    }
    let query = ids
        .iter()
        .map(|id| format!("id:{}", id))
        .collect::<Vec<_>>()
        .join(" OR ");
    export_call(args, &query, ids.len() as u64)
}
