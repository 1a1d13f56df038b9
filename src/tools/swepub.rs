//! Swepub tools: Swedish research publications, searched through Xsearch
//! with `database=swepub`.

use crate::client::{RequestDescriptor, ACCEPT_JSON_LD};
use crate::config::Endpoint;
use crate::convert::{get_bounded_u64, get_choice, get_optional_string, get_string_arg, Args};
use crate::error::{McpError, Result};
use crate::normalize::{FieldSpec, Template};
use crate::render::{EntryKind, ExportFormat, Render};
use crate::schema;
use crate::tools::libris::{record_path, xsearch_request, xsearch_template, MAIN};
use crate::tools::{Binding, Call, ToolDef};

pub(crate) const DATABASE: &str = "swepub";

/// Get all Swepub tool bindings.
pub fn bindings() -> Vec<Binding> {
    vec![
        Binding::fetch(
            ToolDef::new(
                "swepub_search",
                "Search Swedish research publications (theses, articles, reports) from \
                 Swedish universities in Swepub.",
                schema!(object {
                    required: { "query": string = "Search terms" },
                    optional: {
                        "limit": integer = "Max results, 1-200 (default 10)",
                        "offset": integer = "Zero-based start position (default 0)"
                    }
                }),
            ),
            search,
        ),
        Binding::fetch(
            ToolDef::new(
                "swepub_search_author",
                "Publications by one researcher, by name or (more precisely) by ORCID.",
                schema!(object {
                    optional: {
                        "author_name": string = "Researcher, e.g. 'Johansson, Anna'",
                        "orcid": string = "ORCID iD, e.g. '0000-0002-1825-0097'",
                        "limit": integer = "Max results, 1-200 (default 20)"
                    }
                }),
            ),
            search_author,
        ),
        Binding::fetch(
            ToolDef::new(
                "swepub_search_affiliation",
                "Publications from one university or research institute.",
                schema!(object {
                    required: { "organization": string = "e.g. 'Uppsala universitet', 'KTH'" },
                    optional: { "limit": integer = "Max results, 1-200 (default 20)" }
                }),
            ),
            search_affiliation,
        ),
        Binding::fetch(
            ToolDef::new(
                "swepub_search_subject",
                "Publications within a research subject, by Swedish standard \
                 classification code (e.g. '101' for mathematics) or subject text.",
                schema!(object {
                    required: { "subject_code": string = "Classification code or subject" },
                    optional: { "limit": integer = "Max results, 1-200 (default 20)" }
                }),
            ),
            search_subject,
        ),
        Binding::fetch(
            ToolDef::new(
                "swepub_get_publication",
                "Full details of one publication: title, contributors, abstract and \
                 identifiers such as DOI, ISBN and ISSN.",
                schema!(object {
                    required: { "publication_id": string = "Publication ID or URL" }
                }),
            ),
            get_publication,
        ),
        Binding::fetch(
            ToolDef::new(
                "swepub_export",
                "Export up to 50 Swepub hits as RIS (Zotero, EndNote) or BibTeX (LaTeX).",
                schema!(object {
                    required: { "query": string = "Search terms" },
                    optional: { "format": string = "ris or bibtex (default ris)" }
                }),
            ),
            export,
        ),
    ]
}

pub(crate) fn swepub_call(query: &str, n: u64, start: Option<u64>) -> Call {
    Call::new(
        xsearch_request(Endpoint::Swepub, query, Some(DATABASE), n, start),
        xsearch_template(),
    )
}

fn search(args: &Args) -> Result<Call> {
    let query = get_string_arg(args, "query")?;
    let n = get_bounded_u64(args, "limit", 10, 1, 200)?;
    let offset = get_bounded_u64(args, "offset", 0, 0, u64::MAX)?;
    Ok(swepub_call(&query, n, Some(offset)))
}

fn search_author(args: &Args) -> Result<Call> {
    let query = match (
        get_optional_string(args, "orcid")?,
        get_optional_string(args, "author_name")?,
    ) {
        (Some(orcid), _) => format!("orcid:{}", orcid),
        (None, Some(name)) => format!("författare:{}", name),
        (None, None) => return Err(McpError::MissingArg("author_name".to_string())),
    };
    let n = get_bounded_u64(args, "limit", 20, 1, 200)?;
    Ok(swepub_call(&query, n, None))
}

fn search_affiliation(args: &Args) -> Result<Call> {
    let organization = get_string_arg(args, "organization")?;
    let n = get_bounded_u64(args, "limit", 20, 1, 200)?;
    Ok(swepub_call(&format!("organisation:{}", organization), n, None))
}

fn search_subject(args: &Args) -> Result<Call> {
    let subject = get_string_arg(args, "subject_code")?;
    let n = get_bounded_u64(args, "limit", 20, 1, 200)?;
    Ok(swepub_call(&format!("ämne:{}", subject), n, None))
}

fn get_publication(args: &Args) -> Result<Call> {
    let path = record_path("publication_id", &get_string_arg(args, "publication_id")?)?;
    let at = |p: &str| format!("{}.{}", MAIN, p);
    Ok(Call::new(
        RequestDescriptor::get(Endpoint::LibrisXl)
            .path(path)
            .accept(ACCEPT_JSON_LD),
        Template::json(vec![
            FieldSpec::scalar("id", &at("@id")),
            FieldSpec::scalar("title", &at("hasTitle.mainTitle")),
            FieldSpec::scalar("subtitle", &at("hasTitle.subtitle")),
            FieldSpec::list("contributors", &at("contribution.agent.name")),
            FieldSpec::scalar("year", &at("publication.year")),
            FieldSpec::list("abstract", &at("summary.label")),
            FieldSpec::list("keywords", &at("subject.prefLabel")),
            FieldSpec::group(
                "identifiers",
                &at("identifiedBy"),
                vec![
                    FieldSpec::scalar("type", "@type"),
                    FieldSpec::scalar("value", "value"),
                ],
            ),
        ]),
    ))
}

fn export(args: &Args) -> Result<Call> {
    let query = get_string_arg(args, "query")?;
    let format = get_choice(args, "format", "ris", &["ris", "bibtex"])?;
    Ok(swepub_call(&query, 50, None).then(Render::Export(
        ExportFormat::from_arg(&format),
        EntryKind::Article,
    )))
}
