//! Libris tools.
//!
//! Two upstream APIs live here:
//!
//! - Xsearch (`/xsearch`), a flat JSON search API. Its query language takes
//!   field prefixes such as `författare:`, `titel:`, `ämne:` and `isbn:`.
//! - Libris XL, the linked-data catalogue. Records are JSON-LD documents
//!   whose bibliographic content sits under `mainEntity` (or inside
//!   `@graph`), and `/find` offers search over any property path.

use url::Url;

use crate::client::{RequestDescriptor, ACCEPT_JSON_LD};
use crate::config::Endpoint;
use crate::convert::{get_bounded_u64, get_choice, get_flag, get_string_arg, Args};
use crate::error::{McpError, Result};
use crate::normalize::{FieldSpec, Template};
use crate::render::Render;
use crate::schema;
use crate::tools::{Binding, Call, ToolDef};

/// Prefix that reaches the described entity of an XL record, whichever
/// way the document is framed. A framed `@graph` lists the record first and
/// the entity (`#it`) second; a graph with a single node is used as is.
pub(crate) const MAIN: &str = "?mainEntity.?@graph.?1";

/// Get all Libris tool bindings.
pub fn bindings() -> Vec<Binding> {
    vec![
        // ── Xsearch ──────────────────────────────────────────────────────
        Binding::fetch(
            ToolDef::new(
                "libris_search",
                "Free-text search in Libris, the Swedish union catalogue (books, journals, \
                 maps, music, films). Supports field prefixes such as 'författare:', \
                 'titel:', 'ämne:' and 'isbn:'. Returns the total hit count and one record \
                 per hit with title, creator, date, publisher, type, identifier and ISBN.",
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
                "libris_search_author",
                "Find works by an author in Libris. Names are best given as \
                 'Surname, Given name'.",
                schema!(object {
                    required: { "author_name": string = "Author, e.g. 'Lindgren, Astrid'" },
                    optional: { "limit": integer = "Max results, 1-200 (default 10)" }
                }),
            ),
            search_author,
        ),
        Binding::fetch(
            ToolDef::new(
                "libris_search_title",
                "Find works by title in Libris. Set exact_match to search for the exact \
                 phrase.",
                schema!(object {
                    required: { "title": string = "Title or part of a title" },
                    optional: {
                        "exact_match": boolean = "Match the exact phrase (default false)",
                        "limit": integer = "Max results, 1-200 (default 10)"
                    }
                }),
            ),
            search_title,
        ),
        Binding::fetch(
            ToolDef::new(
                "libris_search_subject",
                "Find works about a subject in Libris, using Swedish subject headings \
                 (e.g. 'Historia', 'Barnlitteratur').",
                schema!(object {
                    required: { "subject": string = "Subject heading" },
                    optional: { "limit": integer = "Max results, 1-200 (default 10)" }
                }),
            ),
            search_subject,
        ),
        Binding::fetch(
            ToolDef::new(
                "libris_search_isbn",
                "Look up a book by ISBN-10 or ISBN-13. Hyphens and spaces are ignored.",
                schema!(object {
                    required: { "isbn": string = "ISBN, e.g. '978-91-29-65794-8'" }
                }),
            ),
            search_isbn,
        ),
        // ── Libris XL ────────────────────────────────────────────────────
        Binding::fetch(
            ToolDef::new(
                "libris_get_record",
                "Fetch one Libris XL record by ID ('bib/12345', '12345' or a full \
                 libris.kb.se URL). Returns title, contributors, publication and \
                 identifiers; set include_raw for the full JSON-LD document.",
                schema!(object {
                    required: { "record_id": string = "Libris record ID" },
                    optional: { "include_raw": boolean = "Attach the JSON-LD body" }
                }),
            ),
            get_record,
        ),
        Binding::fetch(
            ToolDef::new(
                "libris_find",
                "Advanced Libris XL search with boolean operators (AND, OR, NOT), \
                 parentheses, field:value terms and ranges, e.g. \
                 'author:Strindberg AND year:[1890 TO 1900]'.",
                schema!(object {
                    required: { "query": string = "XL query" },
                    optional: {
                        "limit": integer = "Max results, 1-200 (default 10)",
                        "offset": integer = "Zero-based start position (default 0)"
                    }
                }),
            ),
            find,
        ),
        Binding::fetch(
            ToolDef::new(
                "libris_get_holdings",
                "List the libraries holding copies of a Libris record.",
                schema!(object {
                    required: { "record_id": string = "Libris record ID" }
                }),
            ),
            get_holdings,
        ),
        Binding::fetch(
            ToolDef::new(
                "libris_get_work",
                "List every edition, translation and format (instances) of a Libris work.",
                schema!(object {
                    required: { "work_id": string = "Work ID, e.g. 'fnl123456'" }
                }),
            ),
            get_work,
        ),
        Binding::fetch(
            ToolDef::new(
                "libris_autocomplete",
                "Suggest names, titles or subject terms starting with a prefix. Use it to \
                 find the spelling Libris uses before searching.",
                schema!(object {
                    required: { "prefix": string = "Start of the term, e.g. 'strin'" },
                    optional: {
                        "entity_type": string = "Person, Work, Subject or Organization (default Person)",
                        "limit": integer = "Max suggestions, 1-50 (default 10)"
                    }
                }),
            ),
            autocomplete,
        ),
        Binding::fetch(
            ToolDef::new(
                "libris_related",
                "Subjects and authors linked from a Libris record, as starting points for \
                 finding related literature. relation_type 'series' returns the series \
                 the record belongs to instead.",
                schema!(object {
                    required: { "record_id": string = "Libris record ID" },
                    optional: {
                        "relation_type": string = "all, subject, author or series (default all)"
                    }
                }),
            ),
            related,
        ),
    ]
}

// ── Shared builders ──────────────────────────────────────────────────────

/// Xsearch request with the JSON output switches set.
pub(crate) fn xsearch_request(
    endpoint: Endpoint,
    query: &str,
    database: Option<&str>,
    n: u64,
    start: Option<u64>,
) -> RequestDescriptor {
    RequestDescriptor::get(endpoint)
        .param("query", query)
        .param_opt("database", database)
        .param("n", n)
        .param_opt("start", start)
        .param("format", "json")
        .param("format_extended", "true")
}

/// Template for an Xsearch result page.
pub(crate) fn xsearch_template() -> Template {
    Template::json(vec![
        FieldSpec::number("total", "xsearch.records").required(),
        FieldSpec::number("from", "xsearch.from"),
        FieldSpec::number("to", "xsearch.to"),
        FieldSpec::group(
            "records",
            "xsearch.list",
            vec![
                FieldSpec::scalar("title", "title"),
                FieldSpec::scalar("creator", "creator"),
                FieldSpec::scalar("date", "date"),
                FieldSpec::scalar("publisher", "publisher"),
                FieldSpec::scalar("type", "type"),
                FieldSpec::scalar("language", "language"),
                FieldSpec::scalar("identifier", "identifier"),
                FieldSpec::list("isbn", "isbn"),
            ],
        ),
    ])
}

pub(crate) fn xsearch_call(query: &str, n: u64, start: Option<u64>) -> Call {
    Call::new(
        xsearch_request(Endpoint::LibrisXsearch, query, None, n, start),
        xsearch_template(),
    )
}

fn limit(args: &Args) -> Result<u64> {
    get_bounded_u64(args, "limit", 10, 1, 200)
}

/// Path of an XL record below the base URL. Accepts bare IDs, paths and
/// absolute URLs.
pub(crate) fn record_path(name: &str, id: &str) -> Result<String> {
    let path = if id.starts_with("http://") || id.starts_with("https://") {
        Url::parse(id)
            .map_err(|e| McpError::invalid_arg(name, e.to_string()))?
            .path()
            .to_string()
    } else if id.starts_with('/') {
        id.to_string()
    } else {
        format!("/{}", id)
    };
    if path.trim_matches('/').is_empty() || path.contains("..") || path.contains('?') {
        return Err(McpError::invalid_arg(name, "not a record identifier"));
    }
    Ok(path)
}

/// Template for a single XL document.
pub(crate) fn xl_record_template() -> Template {
    let at = |path: &str| format!("{}.{}", MAIN, path);
    Template::json(vec![
        FieldSpec::scalar("id", &at("@id")),
        FieldSpec::scalar("type", &at("@type")),
        FieldSpec::scalar("title", &at("hasTitle.mainTitle")),
        FieldSpec::scalar("subtitle", &at("hasTitle.subtitle")),
        FieldSpec::scalar("responsibility", &at("responsibilityStatement")),
        FieldSpec::group(
            "contributors",
            &at("contribution"),
            vec![
                FieldSpec::scalar("name", "agent.name"),
                FieldSpec::scalar("family_name", "agent.familyName"),
                FieldSpec::scalar("given_name", "agent.givenName"),
                FieldSpec::scalar("id", "agent.@id"),
                FieldSpec::list("roles", "role.@id"),
            ],
        ),
        FieldSpec::scalar("year", &at("publication.year")),
        FieldSpec::scalar("place", &at("publication.place.label")),
        FieldSpec::scalar("publisher", &at("publication.agent.label")),
        FieldSpec::list("summary", &at("summary.label")),
        FieldSpec::group(
            "identifiers",
            &at("identifiedBy"),
            vec![
                FieldSpec::scalar("type", "@type"),
                FieldSpec::scalar("value", "value"),
            ],
        ),
        FieldSpec::list("subjects", &at("subject")),
    ])
}

fn find_request(query_param: &str, value: &str, limit: u64) -> RequestDescriptor {
    RequestDescriptor::get(Endpoint::LibrisXl)
        .path("find")
        .param(query_param, value)
        .param("_limit", limit)
        .accept(ACCEPT_JSON_LD)
}

fn instance_list_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::scalar("id", "@id"),
        FieldSpec::scalar("type", "@type"),
        FieldSpec::scalar("title", "hasTitle.mainTitle"),
        FieldSpec::scalar("year", "publication.year"),
    ]
}

// ── Xsearch handlers ─────────────────────────────────────────────────────

fn search(args: &Args) -> Result<Call> {
    let query = get_string_arg(args, "query")?;
    let n = limit(args)?;
    let offset = get_bounded_u64(args, "offset", 0, 0, u64::MAX)?;
    Ok(xsearch_call(&query, n, Some(offset)))
}

fn search_author(args: &Args) -> Result<Call> {
    let author = get_string_arg(args, "author_name")?;
    Ok(xsearch_call(&format!("författare:{}", author), limit(args)?, None))
}

fn search_title(args: &Args) -> Result<Call> {
    let title = get_string_arg(args, "title")?;
    let query = if get_flag(args, "exact_match")? {
        format!("titel:\"{}\"", title)
    } else {
        format!("titel:{}", title)
    };
    Ok(xsearch_call(&query, limit(args)?, None))
}

fn search_subject(args: &Args) -> Result<Call> {
    let subject = get_string_arg(args, "subject")?;
    Ok(xsearch_call(&format!("ämne:{}", subject), limit(args)?, None))
}

fn search_isbn(args: &Args) -> Result<Call> {
    let isbn: String = get_string_arg(args, "isbn")?
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect();
    let valid = matches!(isbn.len(), 10 | 13)
        && isbn
            .chars()
            .enumerate()
            .all(|(i, c)| c.is_ascii_digit() || (i == 9 && isbn.len() == 10 && matches!(c, 'X' | 'x')));
    if !valid {
        return Err(McpError::invalid_arg("isbn", "expected 10 or 13 digits"));
    }
    Ok(xsearch_call(&format!("isbn:{}", isbn), 1, None))
}

// ── XL handlers ──────────────────────────────────────────────────────────

fn get_record(args: &Args) -> Result<Call> {
    let path = record_path("record_id", &get_string_arg(args, "record_id")?)?;
    let call = Call::new(
        RequestDescriptor::get(Endpoint::LibrisXl)
            .path(path)
            .accept(ACCEPT_JSON_LD),
        xl_record_template(),
    );
    Ok(if get_flag(args, "include_raw")? {
        call.then(Render::Raw)
    } else {
        call
    })
}

fn find(args: &Args) -> Result<Call> {
    let query = get_string_arg(args, "query")?;
    let offset = get_bounded_u64(args, "offset", 0, 0, u64::MAX)?;
    let request = find_request("q", &query, limit(args)?).param("_offset", offset);
    Ok(Call::new(
        request,
        Template::json(vec![
            FieldSpec::number("total", "totalItems"),
            FieldSpec::group("records", "items", instance_list_fields()),
        ]),
    ))
}

fn get_holdings(args: &Args) -> Result<Call> {
    let id = get_string_arg(args, "record_id")?;
    let target = format!("https://libris.kb.se{}", record_path("record_id", &id)?);
    Ok(Call::new(
        find_request("itemOf.@id", &target, 50),
        Template::json(vec![
            FieldSpec::number("total", "totalItems"),
            FieldSpec::group(
                "holdings",
                "items",
                vec![
                    FieldSpec::scalar("library", "heldBy.name"),
                    FieldSpec::scalar("sigel", "heldBy.sigel"),
                    FieldSpec::scalar("library_id", "heldBy.@id"),
                ],
            ),
        ]),
    ))
}

fn get_work(args: &Args) -> Result<Call> {
    let id = get_string_arg(args, "work_id")?;
    let target = format!("https://libris.kb.se{}", record_path("work_id", &id)?);
    Ok(Call::new(
        find_request("instanceOf.@id", &target, 50),
        Template::json(vec![
            FieldSpec::number("total", "totalItems"),
            FieldSpec::group("editions", "items", instance_list_fields()),
        ]),
    ))
}

fn autocomplete(args: &Args) -> Result<Call> {
    let prefix = get_string_arg(args, "prefix")?;
    let entity_type = get_choice(
        args,
        "entity_type",
        "Person",
        &["Person", "Work", "Subject", "Organization"],
    )?;
    let limit = get_bounded_u64(args, "limit", 10, 1, 50)?;
    let request = RequestDescriptor::get(Endpoint::IdKb)
        .path("find")
        .param("q", format!("{}*", prefix.trim_end_matches('*')))
        .param("@type", entity_type)
        .param("_limit", limit)
        .accept(ACCEPT_JSON_LD);
    Ok(Call::new(
        request,
        Template::json(vec![
            FieldSpec::number("total", "totalItems"),
            FieldSpec::group(
                "suggestions",
                "items",
                vec![
                    FieldSpec::scalar("label", "prefLabel"),
                    FieldSpec::scalar("name", "name"),
                    FieldSpec::scalar("id", "@id"),
                    FieldSpec::scalar("type", "@type"),
                ],
            ),
        ]),
    ))
}

fn related(args: &Args) -> Result<Call> {
    let path = record_path("record_id", &get_string_arg(args, "record_id")?)?;
    let relation = get_choice(
        args,
        "relation_type",
        "all",
        &["all", "subject", "author", "series"],
    )?;

    let mut fields = vec![FieldSpec::scalar("id", &format!("{}.@id", MAIN))];
    if relation == "series" {
        fields.push(FieldSpec::group(
            "series",
            &format!("{}.seriesMembership", MAIN),
            vec![
                FieldSpec::scalar("statement", "seriesStatement"),
                FieldSpec::scalar("numbering", "seriesEnumeration"),
                FieldSpec::scalar("id", "inSeries.instanceOf.@id"),
            ],
        ));
    }
    if relation == "all" || relation == "subject" {
        fields.push(FieldSpec::group(
            "subjects",
            &format!("{}.subject", MAIN),
            vec![
                FieldSpec::scalar("id", "@id"),
                FieldSpec::scalar("label", "prefLabel"),
            ],
        ));
    }
    if relation == "all" || relation == "author" {
        fields.push(FieldSpec::group(
            "authors",
            &format!("{}.contribution.agent", MAIN),
            vec![
                FieldSpec::scalar("id", "@id"),
                FieldSpec::scalar("name", "name"),
            ],
        ));
    }

    Ok(Call::new(
        RequestDescriptor::get(Endpoint::LibrisXl)
            .path(path)
            .accept(ACCEPT_JSON_LD),
        Template::json(fields),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Method;
    use crate::normalize::normalize;
    use serde_json::{json, Value as JsonValue};

    fn args(value: JsonValue) -> Args {
        value.as_object().cloned().unwrap()
    }

    fn params(call: &Call) -> Vec<(&str, &str)> {
        call.request
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    #[test]
    fn search_sends_xsearch_params_in_order() {
        let call = search(&args(json!({"query": "Astrid Lindgren", "limit": 5, "offset": 20}))).unwrap();
        assert_eq!(call.request.endpoint, Endpoint::LibrisXsearch);
        assert_eq!(call.request.method, Method::Get);
        assert_eq!(
            params(&call),
            vec![
                ("query", "Astrid Lindgren"),
                ("n", "5"),
                ("start", "20"),
                ("format", "json"),
                ("format_extended", "true"),
            ]
        );
    }

    #[test]
    fn search_rejects_out_of_range_limit() {
        assert!(search(&args(json!({"query": "x", "limit": 0}))).is_err());
        assert!(search(&args(json!({"query": "x", "limit": 201}))).is_err());
        assert!(search(&args(json!({"limit": 10}))).is_err());
    }

    #[test]
    fn prefixed_searches() {
        let call = search_author(&args(json!({"author_name": "Lindgren, Astrid"}))).unwrap();
        assert_eq!(call.request.param_value("query"), Some("författare:Lindgren, Astrid"));
        assert_eq!(call.request.param_value("start"), None);

        let call = search_title(&args(json!({"title": "Röda rummet", "exact_match": true}))).unwrap();
        assert_eq!(call.request.param_value("query"), Some("titel:\"Röda rummet\""));

        let call = search_title(&args(json!({"title": "Röda rummet"}))).unwrap();
        assert_eq!(call.request.param_value("query"), Some("titel:Röda rummet"));

        let call = search_subject(&args(json!({"subject": "Historia", "limit": 3}))).unwrap();
        assert_eq!(call.request.param_value("query"), Some("ämne:Historia"));
        assert_eq!(call.request.param_value("n"), Some("3"));
    }

    #[test]
    fn isbn_is_cleaned_and_checked() {
        let call = search_isbn(&args(json!({"isbn": "978-91-29-65794 8"}))).unwrap();
        assert_eq!(call.request.param_value("query"), Some("isbn:9789129657948"));
        assert_eq!(call.request.param_value("n"), Some("1"));

        assert!(search_isbn(&args(json!({"isbn": "91-29-62140-X"}))).is_ok());
        assert!(search_isbn(&args(json!({"isbn": "12345"}))).is_err());
        assert!(search_isbn(&args(json!({"isbn": "97891296579AB"}))).is_err());
    }

    #[test]
    fn record_paths() {
        assert_eq!(record_path("id", "bib/12345").unwrap(), "/bib/12345");
        assert_eq!(record_path("id", "/bib/12345").unwrap(), "/bib/12345");
        assert_eq!(record_path("id", "https://libris.kb.se/fnl123#it").unwrap(), "/fnl123");
        assert!(record_path("id", "../etc").is_err());
        assert!(record_path("id", "https://libris.kb.se/").is_err());
    }

    #[test]
    fn holdings_and_work_use_find() {
        let call = get_holdings(&args(json!({"record_id": "bib/1"}))).unwrap();
        assert_eq!(call.request.path, "find");
        assert_eq!(
            params(&call),
            vec![("itemOf.@id", "https://libris.kb.se/bib/1"), ("_limit", "50")]
        );

        let call = get_work(&args(json!({"work_id": "fnl123456"}))).unwrap();
        assert_eq!(call.request.param_value("instanceOf.@id"), Some("https://libris.kb.se/fnl123456"));
        assert_eq!(call.request.accept, ACCEPT_JSON_LD);
        assert!(matches!(
            get_work(&args(json!({"record_id": "fnl123456"}))),
            Err(McpError::MissingArg(name)) if name == "work_id"
        ));
    }

    #[test]
    fn autocomplete_targets_id_kb() {
        let call = autocomplete(&args(json!({"prefix": "strin"}))).unwrap();
        assert_eq!(call.request.endpoint, Endpoint::IdKb);
        assert_eq!(
            params(&call),
            vec![("q", "strin*"), ("@type", "Person"), ("_limit", "10")]
        );
        assert!(autocomplete(&args(json!({"prefix": "x", "entity_type": "Planet"}))).is_err());
        assert!(autocomplete(&args(json!({"query": "strin"}))).is_err());
    }

    #[test]
    fn related_fields_follow_relation_type() {
        let call = related(&args(json!({"record_id": "bib/1", "relation_type": "subject"}))).unwrap();
        let names: Vec<&str> = call.template.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "subjects"]);

        let call = related(&args(json!({"record_id": "bib/1"}))).unwrap();
        let names: Vec<&str> = call.template.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "subjects", "authors"]);

        assert!(related(&args(json!({"record_id": "bib/1", "relation_type": "editor"}))).is_err());
    }

    #[test]
    fn related_series_reads_memberships_only() {
        let call = related(&args(json!({"record_id": "bib/1", "relation_type": "series"}))).unwrap();
        let body = json!({
            "mainEntity": {
                "@id": "https://libris.kb.se/abc#it",
                "subject": [{"@id": "https://id.kb.se/term/sao/Romaner", "prefLabel": "Romaner"}],
                "contribution": [{"agent": {"@id": "https://libris.kb.se/p1", "name": "Strindberg"}}],
                "seriesMembership": [{
                    "seriesStatement": "Svenska klassiker",
                    "seriesEnumeration": "12",
                    "inSeries": {"instanceOf": {"@id": "https://libris.kb.se/series1#it"}}
                }]
            }
        });
        let fields = normalize(&body.to_string(), "", &call.template).unwrap();
        assert_eq!(fields["id"], json!("https://libris.kb.se/abc#it"));
        assert_eq!(
            fields["series"],
            json!([{
                "statement": "Svenska klassiker",
                "numbering": "12",
                "id": "https://libris.kb.se/series1#it"
            }])
        );
        assert!(fields.get("subjects").is_none());
        assert!(fields.get("authors").is_none());
    }

    #[test]
    fn xl_template_reads_embedded_and_graph_documents() {
        let embedded = json!({
            "@id": "https://libris.kb.se/abc",
            "mainEntity": {
                "@id": "https://libris.kb.se/abc#it",
                "@type": "Instance",
                "hasTitle": [{"@type": "Title", "mainTitle": "Hemsöborna"}],
                "contribution": [{
                    "agent": {"@id": "https://libris.kb.se/p1", "name": "Strindberg, August"},
                    "role": [{"@id": "https://id.kb.se/relator/author"}]
                }],
                "publication": [{"year": "1887", "place": {"label": "Stockholm"}}],
                "identifiedBy": [{"@type": "ISBN", "value": "9100000000"}]
            }
        });
        let fields = normalize(&embedded.to_string(), "application/ld+json", &xl_record_template()).unwrap();
        assert_eq!(fields["title"], json!("Hemsöborna"));
        assert_eq!(fields["id"], json!("https://libris.kb.se/abc#it"));
        assert_eq!(fields["year"], json!("1887"));
        assert_eq!(fields["place"], json!("Stockholm"));
        assert_eq!(fields["contributors"][0]["roles"], json!(["https://id.kb.se/relator/author"]));
        assert_eq!(fields["identifiers"], json!([{"type": "ISBN", "value": "9100000000"}]));

        let graph = json!({
            "@graph": [
                {"@id": "https://libris.kb.se/abc", "@type": "Record"},
                {"@id": "https://libris.kb.se/abc#it", "hasTitle": {"mainTitle": "Inferno"}}
            ]
        });
        let fields = normalize(&graph.to_string(), "", &xl_record_template()).unwrap();
        assert_eq!(fields["title"], json!("Inferno"));
        assert_eq!(fields["id"], json!("https://libris.kb.se/abc#it"));
        assert!(fields.get("type").is_none());
    }

    #[test]
    fn xsearch_template_extracts_records() {
        let body = json!({
            "xsearch": {
                "from": 1, "to": 1, "records": 7432,
                "list": [{
                    "identifier": "http://libris.kb.se/bib/8207372",
                    "title": "Pippi Långstrump",
                    "creator": "Lindgren, Astrid",
                    "type": "book",
                    "publisher": "Rabén & Sjögren",
                    "date": "1945",
                    "isbn": "9129621405"
                }]
            }
        });
        let fields = normalize(&body.to_string(), "application/json", &xsearch_template()).unwrap();
        assert_eq!(fields["total"], json!(7432));
        assert_eq!(fields["records"][0]["isbn"], json!(["9129621405"]));
        assert_eq!(fields["records"][0]["creator"], json!("Lindgren, Astrid"));
    }
}
