//! SPARQL tools against the Libris linked-data endpoint.

use serde_json::{json, Value as JsonValue};

use crate::client::{RequestDescriptor, ACCEPT_JSON_LD, ACCEPT_SPARQL_JSON};
use crate::config::Endpoint;
use crate::convert::{get_choice, get_string_arg, Args};
use crate::error::{McpError, Result};
use crate::normalize::{FieldSpec, Template};
use crate::record::Fields;
use crate::render::Render;
use crate::schema;
use crate::tools::{Binding, Call, ToolDef};

/// Ready-made queries: (category, name, query).
const TEMPLATES: &[(&str, &str, &str)] = &[
    (
        "books",
        "Books per year",
        "SELECT ?year (COUNT(?book) AS ?count)
WHERE {
  ?book a <http://purl.org/ontology/bibo/Book> ;
        <http://purl.org/dc/terms/date> ?year .
}
GROUP BY ?year
ORDER BY ?year
LIMIT 100",
    ),
    (
        "authors",
        "Most prolific authors",
        "SELECT ?author (COUNT(?work) AS ?count)
WHERE {
  ?work <http://purl.org/dc/terms/creator> ?author .
}
GROUP BY ?author
ORDER BY DESC(?count)
LIMIT 50",
    ),
    (
        "subjects",
        "Most used subject headings",
        "SELECT ?subject (COUNT(?work) AS ?count)
WHERE {
  ?work <http://purl.org/dc/terms/subject> ?subject .
}
GROUP BY ?subject
ORDER BY DESC(?count)
LIMIT 50",
    ),
    (
        "statistics",
        "Resources per type",
        "SELECT ?type (COUNT(?s) AS ?count)
WHERE {
  ?s a ?type .
}
GROUP BY ?type
ORDER BY DESC(?count)
LIMIT 20",
    ),
];

/// Get all SPARQL tool bindings.
pub fn bindings() -> Vec<Binding> {
    vec![
        Binding::fetch(
            ToolDef::new(
                "sparql_query",
                "Run a SPARQL SELECT (or ASK) query against Libris linked data. Returns the \
                 variable names and one row per solution mapping each bound variable to \
                 its value. See sparql_templates for starting points.",
                schema!(object {
                    required: { "query": string = "SPARQL query" }
                }),
            ),
            query,
        ),
        Binding::fetch(
            ToolDef::new(
                "sparql_describe",
                "Describe a resource with SPARQL DESCRIBE: every triple about the URI, as \
                 a JSON-LD document.",
                schema!(object {
                    required: { "resource_uri": string = "e.g. 'https://libris.kb.se/bib/12345'" }
                }),
            ),
            describe,
        ),
        Binding::fetch(
            ToolDef::new(
                "sparql_count",
                "Count the solutions of a SPARQL graph pattern without fetching them, e.g. \
                 '?s a <http://purl.org/ontology/bibo/Book>'.",
                schema!(object {
                    required: { "query": string = "Graph pattern, the body of the WHERE clause" }
                }),
            ),
            count,
        ),
        Binding::local(
            ToolDef::new(
                "sparql_templates",
                "Ready-made SPARQL queries for common analyses (books, authors, subjects, \
                 statistics).",
                schema!(object {
                    optional: {
                        "category": string = "all, books, authors, subjects or statistics (default all)"
                    }
                }),
            ),
            templates,
        ),
    ]
}

/// Form-encoded POST carrying `query`.
pub(crate) fn query_request(endpoint: Endpoint, path: &str, query: &str) -> RequestDescriptor {
    RequestDescriptor::post(endpoint)
        .path(path)
        .param("query", query)
        .accept(ACCEPT_SPARQL_JSON)
}

/// Template for `application/sparql-results+json`; pair with
/// [`Render::SparqlRows`].
pub(crate) fn results_template() -> Template {
    Template::json(vec![
        FieldSpec::list("variables", "head.vars"),
        FieldSpec::count("row_count", "results.bindings"),
        FieldSpec::raw("rows", "results.bindings"),
        FieldSpec::scalar("boolean", "boolean"),
    ])
}

/// Escape text for use inside a double-quoted SPARQL literal.
pub(crate) fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

fn query(args: &Args) -> Result<Call> {
    let query = get_string_arg(args, "query")?;
    Ok(Call::new(query_request(Endpoint::LibrisSparql, "", &query), results_template()).then(Render::SparqlRows))
}

fn describe(args: &Args) -> Result<Call> {
    let uri = get_string_arg(args, "resource_uri")?;
    let absolute = uri.starts_with("http://") || uri.starts_with("https://");
    if !absolute || uri.contains(|c: char| c == '<' || c == '>' || c == '"' || c.is_whitespace()) {
        return Err(McpError::invalid_arg("resource_uri", "expected an absolute http(s) URI"));
    }
    let request = query_request(Endpoint::LibrisSparql, "", &format!("DESCRIBE <{}>", uri)).accept(ACCEPT_JSON_LD);
    Ok(Call::new(
        request,
        Template::json(vec![
            FieldSpec::count("node_count", "?@graph"),
            FieldSpec::raw("document", ""),
        ]),
    ))
}

fn count(args: &Args) -> Result<Call> {
    let pattern = get_string_arg(args, "query")?;
    let query = format!("SELECT (COUNT(*) AS ?count) WHERE {{\n  {}\n}}", pattern);
    Ok(Call::new(
        query_request(Endpoint::LibrisSparql, "", &query),
        Template::json(vec![FieldSpec::number("count", "results.bindings.0.count.value").required()]),
    ))
}

fn templates(args: &Args) -> Result<Fields> {
    let mut allowed = vec!["all"];
    allowed.extend(TEMPLATES.iter().map(|(category, _, _)| *category));
    let category = get_choice(args, "category", "all", &allowed)?;

    let list: Vec<JsonValue> = TEMPLATES
        .iter()
        .filter(|(c, _, _)| category == "all" || category == *c)
        .map(|(c, name, query)| json!({"category": c, "name": name, "query": query}))
        .collect();

    let mut fields = Fields::new();
    fields.insert("templates".to_string(), JsonValue::Array(list));
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Method;
    use crate::normalize::normalize;
    use crate::record::ResultRecord;

    fn args(value: JsonValue) -> Args {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn query_is_posted_as_form_field() {
        let call = query(&args(json!({"query": "SELECT * WHERE { ?s ?p ?o } LIMIT 1"}))).unwrap();
        assert_eq!(call.request.method, Method::Post);
        assert_eq!(call.request.endpoint, Endpoint::LibrisSparql);
        assert_eq!(call.request.accept, ACCEPT_SPARQL_JSON);
        assert_eq!(call.request.param_value("query"), Some("SELECT * WHERE { ?s ?p ?o } LIMIT 1"));
    }

    #[test]
    fn describe_wraps_uri() {
        let call = describe(&args(json!({"resource_uri": "https://libris.kb.se/bib/1"}))).unwrap();
        assert_eq!(call.request.param_value("query"), Some("DESCRIBE <https://libris.kb.se/bib/1>"));
        assert_eq!(call.request.accept, ACCEPT_JSON_LD);
        assert!(describe(&args(json!({"resource_uri": "bib/1"}))).is_err());
        assert!(describe(&args(json!({"resource_uri": "https://x/> . ?s ?p ?o"}))).is_err());
    }

    #[test]
    fn count_builds_select_and_reads_number() {
        let call = count(&args(json!({"query": "?s a <http://purl.org/ontology/bibo/Book>"}))).unwrap();
        assert_eq!(
            call.request.param_value("query"),
            Some("SELECT (COUNT(*) AS ?count) WHERE {\n  ?s a <http://purl.org/ontology/bibo/Book>\n}")
        );

        let body = json!({
            "head": {"vars": ["count"]},
            "results": {"bindings": [{"count": {"type": "literal", "value": "1234567"}}]}
        });
        let fields = normalize(&body.to_string(), "application/sparql-results+json", &call.template).unwrap();
        assert_eq!(fields["count"], json!(1234567));

        let empty = json!({"head": {"vars": ["count"]}, "results": {"bindings": []}});
        assert!(normalize(&empty.to_string(), "", &call.template).is_err());
    }

    #[test]
    fn results_become_rows() {
        let body = json!({
            "head": {"vars": ["year", "count"]},
            "results": {"bindings": [
                {"year": {"type": "literal", "value": "1945"}, "count": {"type": "literal", "value": "10"}},
                {"year": {"type": "literal", "value": "1946"}}
            ]}
        })
        .to_string();
        let call = query(&args(json!({"query": "SELECT ..."}))).unwrap();
        let mut record = ResultRecord::ok(normalize(&body, "", &call.template).unwrap());
        for step in &call.render {
            step.apply(&mut record, &body);
        }
        assert_eq!(record.fields["variables"], json!(["year", "count"]));
        assert_eq!(record.fields["row_count"], json!(2));
        assert_eq!(
            record.fields["rows"],
            json!([{"year": "1945", "count": "10"}, {"year": "1946"}])
        );
    }

    #[test]
    fn templates_filter_by_category() {
        let fields = templates(&Args::new()).unwrap();
        assert_eq!(fields["templates"].as_array().unwrap().len(), 4);

        let fields = templates(&args(json!({"category": "authors"}))).unwrap();
        let list = fields["templates"].as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert!(list[0]["query"].as_str().unwrap().contains("dc/terms/creator"));

        assert!(templates(&args(json!({"category": "films"}))).is_err());
    }

    #[test]
    fn literals_are_escaped() {
        assert_eq!(escape_literal(r#"say "hi" \ bye"#), r#"say \"hi\" \\ bye"#);
    }
}
