//! data.kb.se tools: the library's digitized collections, with IIIF
//! manifests and a SPARQL endpoint.

use crate::client::{RequestDescriptor, ACCEPT_JSON_LD};
use crate::config::Endpoint;
use crate::convert::{get_choice, get_optional_string, get_string_arg, Args};
use crate::error::{McpError, Result};
use crate::normalize::{FieldSpec, Template};
use crate::render::Render;
use crate::schema;
use crate::tools::sparql::{escape_literal, query_request, results_template};
use crate::tools::{Binding, Call, ToolDef};

/// Get all data.kb.se tool bindings.
pub fn bindings() -> Vec<Binding> {
    vec![
        Binding::fetch(
            ToolDef::new(
                "kb_data_list_collections",
                "List digitized collections on data.kb.se, or the contents of one \
                 collection path such as 'smdb' (audio and video) or 'dark' (web archive).",
                schema!(object {
                    optional: { "path": string = "Collection path (default: top level)" }
                }),
            ),
            list_collections,
        ),
        Binding::fetch(
            ToolDef::new(
                "kb_data_get_item",
                "Fetch one digitized object from data.kb.se with its metadata and links to \
                 the digitized content.",
                schema!(object {
                    required: { "item_id": string = "Object ID" }
                }),
            ),
            get_item,
        ),
        Binding::fetch(
            ToolDef::new(
                "kb_data_get_manifest",
                "Fetch the IIIF manifest of a digitized object, for use in IIIF viewers. \
                 Returns label, canvas count and each canvas with its size.",
                schema!(object {
                    required: { "item_id": string = "Object ID" }
                }),
            ),
            get_manifest,
        ),
        Binding::fetch(
            ToolDef::new(
                "kb_data_get_metadata",
                "Fetch the metadata of a digitized object as JSON-LD, RDF/XML or Turtle. \
                 RDF/XML and Turtle are returned as the raw body.",
                schema!(object {
                    required: { "item_id": string = "Object ID" },
                    optional: { "format": string = "jsonld, rdf or turtle (default jsonld)" }
                }),
            ),
            get_metadata,
        ),
        Binding::fetch(
            ToolDef::new(
                "kb_data_search",
                "Search titles of digitized material (books, newspapers, maps, images) on \
                 data.kb.se, optionally within one collection.",
                schema!(object {
                    required: { "query": string = "Word or phrase in the title" },
                    optional: { "collection": string = "Collection, e.g. 'smdb' or 'dark'" }
                }),
            ),
            search,
        ),
    ]
}

fn item_path(args: &Args) -> Result<String> {
    let id = get_string_arg(args, "item_id")?;
    let id = id.trim_matches('/');
    if id.is_empty() || id.contains("..") || id.contains('?') {
        return Err(McpError::invalid_arg("item_id", "not an object identifier"));
    }
    Ok(id.to_string())
}

fn node_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::scalar("id", "@id"),
        FieldSpec::scalar("type", "@type"),
        FieldSpec::scalar("label", "rdfs:label"),
    ]
}

fn list_collections(args: &Args) -> Result<Call> {
    let path = get_optional_string(args, "path")?.unwrap_or_default();
    if path.contains("..") || path.contains('?') {
        return Err(McpError::invalid_arg("path", "not a collection path"));
    }
    Ok(Call::new(
        RequestDescriptor::get(Endpoint::KbData)
            .path(path)
            .accept(ACCEPT_JSON_LD),
        Template::json(vec![
            FieldSpec::group("items", "?@graph", node_fields()),
            FieldSpec::count("count", "?@graph"),
        ]),
    ))
}

fn get_item(args: &Args) -> Result<Call> {
    let mut fields = node_fields();
    fields.push(FieldSpec::raw("document", ""));
    Ok(Call::new(
        RequestDescriptor::get(Endpoint::KbData)
            .path(item_path(args)?)
            .accept(ACCEPT_JSON_LD),
        Template::json(fields),
    ))
}

fn get_manifest(args: &Args) -> Result<Call> {
    Ok(Call::new(
        RequestDescriptor::get(Endpoint::KbData)
            .path(format!("{}/manifest", item_path(args)?))
            .accept(ACCEPT_JSON_LD),
        Template::json(vec![
            FieldSpec::scalar("id", "@id"),
            FieldSpec::scalar("type", "@type"),
            FieldSpec::scalar("label", "label"),
            FieldSpec::count("canvas_count", "sequences.0.canvases"),
            FieldSpec::group(
                "canvases",
                "sequences.0.canvases",
                vec![
                    FieldSpec::scalar("id", "@id"),
                    FieldSpec::scalar("label", "label"),
                    FieldSpec::number("width", "width"),
                    FieldSpec::number("height", "height"),
                ],
            ),
        ]),
    ))
}

fn get_metadata(args: &Args) -> Result<Call> {
    let path = item_path(args)?;
    let format = get_choice(args, "format", "jsonld", &["jsonld", "rdf", "turtle"])?;
    let request = RequestDescriptor::get(Endpoint::KbData).path(path);
    Ok(match format.as_str() {
        "rdf" => Call::new(request.accept("application/rdf+xml"), Template::xml(Vec::new())).then(Render::Raw),
        "turtle" => Call::new(request.accept("text/turtle"), Template::text()).then(Render::Raw),
        _ => Call::new(
            request.accept(ACCEPT_JSON_LD),
            Template::json(vec![FieldSpec::raw("document", "")]),
        ),
    })
}

fn search(args: &Args) -> Result<Call> {
    let query = get_string_arg(args, "query")?;
    let collection = get_optional_string(args, "collection")?;

    let scope = match &collection {
        Some(c) => format!(
            "\n  FILTER(STRSTARTS(STR(?item), \"https://data.kb.se/{}\"))",
            escape_literal(c.trim_matches('/'))
        ),
        None => String::new(),
    };
    let sparql = format!(
        "PREFIX dcterms: <http://purl.org/dc/terms/>
SELECT ?item ?title ?description WHERE {{
  ?item dcterms:title ?title .
  OPTIONAL {{ ?item dcterms:description ?description }}
  FILTER(CONTAINS(LCASE(?title), LCASE(\"{}\"))){}
}} LIMIT 20",
        escape_literal(&query),
        scope
    );
    Ok(Call::new(query_request(Endpoint::KbData, "sparql", &sparql), results_template()).then(Render::SparqlRows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Method, ACCEPT_SPARQL_JSON};
    use crate::normalize::{normalize, BodyFormat};
    use serde_json::{json, Value as JsonValue};

    fn args(value: JsonValue) -> Args {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn collection_paths() {
        let call = list_collections(&Args::new()).unwrap();
        assert_eq!(call.request.path, "");
        assert!(call.request.params.is_empty());

        let call = list_collections(&args(json!({"path": "smdb"}))).unwrap();
        assert_eq!(call.request.path, "smdb");
        assert!(list_collections(&args(json!({"path": "../x"}))).is_err());
    }

    #[test]
    fn collections_read_graph_or_single_node() {
        let call = list_collections(&Args::new()).unwrap();
        let graph = json!({"@graph": [
            {"@id": "https://data.kb.se/smdb", "@type": "Collection", "rdfs:label": "SMDB"},
            {"@id": "https://data.kb.se/dark", "rdfs:label": "Webbarkiv"}
        ]});
        let fields = normalize(&graph.to_string(), "", &call.template).unwrap();
        assert_eq!(fields["count"], json!(2));
        assert_eq!(fields["items"][1], json!({"id": "https://data.kb.se/dark", "label": "Webbarkiv"}));

        let single = json!({"@id": "https://data.kb.se/", "rdfs:label": "KB data"});
        let fields = normalize(&single.to_string(), "", &call.template).unwrap();
        assert_eq!(fields["count"], json!(1));
        assert_eq!(fields["items"][0]["label"], json!("KB data"));
    }

    #[test]
    fn manifest_path_and_canvases() {
        let call = get_manifest(&args(json!({"item_id": "/abc123/"}))).unwrap();
        assert_eq!(call.request.path, "abc123/manifest");

        let body = json!({
            "@id": "https://data.kb.se/abc123/manifest",
            "@type": "sc:Manifest",
            "label": "Dagens Nyheter 1920-01-01",
            "sequences": [{"canvases": [
                {"@id": "c1", "label": "1", "width": 2000, "height": 3000},
                {"@id": "c2", "label": "2"}
            ]}]
        });
        let fields = normalize(&body.to_string(), "", &call.template).unwrap();
        assert_eq!(fields["canvas_count"], json!(2));
        assert_eq!(fields["canvases"][0]["width"], json!(2000));
    }

    #[test]
    fn metadata_format_picks_accept_and_template() {
        let call = get_metadata(&args(json!({"item_id": "x", "format": "turtle"}))).unwrap();
        assert_eq!(call.request.accept, "text/turtle");
        assert_eq!(call.template.format, BodyFormat::Text);
        assert_eq!(call.render, vec![Render::Raw]);

        let call = get_metadata(&args(json!({"item_id": "x", "format": "rdf"}))).unwrap();
        assert_eq!(call.request.accept, "application/rdf+xml");

        let call = get_metadata(&args(json!({"item_id": "x"}))).unwrap();
        assert_eq!(call.request.accept, ACCEPT_JSON_LD);
        assert!(call.render.is_empty());

        assert!(get_metadata(&args(json!({"item_id": "x", "format": "pdf"}))).is_err());
    }

    #[test]
    fn search_posts_title_filter() {
        let call = search(&args(json!({"query": "Röda \"rummet\"", "collection": "smdb"}))).unwrap();
        assert_eq!(call.request.method, Method::Post);
        assert_eq!(call.request.path, "sparql");
        assert_eq!(call.request.accept, ACCEPT_SPARQL_JSON);
        let sparql = call.request.param_value("query").unwrap();
        assert!(sparql.contains(r#"LCASE("Röda \"rummet\"")"#));
        assert!(sparql.contains(r#"STRSTARTS(STR(?item), "https://data.kb.se/smdb")"#));
        assert!(sparql.ends_with("LIMIT 20"));
    }
}
