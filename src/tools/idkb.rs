//! id.kb.se tools: authorities, subject headings and controlled vocabularies.

use crate::client::{RequestDescriptor, ACCEPT_JSON_LD};
use crate::config::Endpoint;
use crate::convert::{get_bounded_u64, get_flag, get_optional_string, get_string_arg, Args};
use crate::error::{McpError, Result};
use crate::normalize::{FieldSpec, Template};
use crate::render::Render;
use crate::schema;
use crate::tools::{Binding, Call, ToolDef};

/// Get all id.kb.se tool bindings.
pub fn bindings() -> Vec<Binding> {
    vec![
        Binding::fetch(
            ToolDef::new(
                "idkb_get_entity",
                "Fetch an entity or concept from id.kb.se by path, e.g. 'vocab/Person' or \
                 'term/sao/Politik'. Set include_raw for the full JSON-LD document.",
                schema!(object {
                    required: { "entity_path": string = "Path below https://id.kb.se/" },
                    optional: { "include_raw": boolean = "Attach the JSON-LD body" }
                }),
            ),
            get_entity,
        ),
        Binding::fetch(
            ToolDef::new(
                "idkb_search",
                "Search authorities, subject headings and concepts in id.kb.se.",
                schema!(object {
                    required: { "query": string = "Search terms" },
                    optional: {
                        "entity_type": string = "Person, Organization, Subject, Work, ...",
                        "limit": integer = "Max results, 1-200 (default 20)"
                    }
                }),
            ),
            search,
        ),
        Binding::fetch(
            ToolDef::new(
                "idkb_get_vocab_term",
                "Look up one term in a controlled vocabulary with its alternative labels \
                 and broader, narrower and related terms.",
                schema!(object {
                    required: {
                        "vocab": string = "Vocabulary, e.g. 'sao' (subject headings), 'saogf' (genre/form)",
                        "term": string = "Term, e.g. 'Historia'"
                    }
                }),
            ),
            get_vocab_term,
        ),
        Binding::fetch(
            ToolDef::new(
                "idkb_list_vocab",
                "List the terms of a controlled vocabulary such as 'sao', 'saogf' or 'barn'.",
                schema!(object {
                    required: { "vocab": string = "Vocabulary code" },
                    optional: { "limit": integer = "Max terms, 1-500 (default 50)" }
                }),
            ),
            list_vocab,
        ),
    ]
}

fn segment(name: &str, value: &str) -> Result<()> {
    if value.contains('/') || value.contains('?') || value == ".." {
        return Err(McpError::invalid_arg(name, "must be a single path segment"));
    }
    Ok(())
}

fn concept_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::scalar("id", "@id"),
        FieldSpec::scalar("type", "@type"),
        FieldSpec::scalar("label", "prefLabel"),
        FieldSpec::scalar("name", "name"),
        FieldSpec::scalar("code", "code"),
    ]
}

fn get_entity(args: &Args) -> Result<Call> {
    let path = get_string_arg(args, "entity_path")?;
    let path = path.trim_start_matches('/');
    if path.contains("..") || path.contains('?') {
        return Err(McpError::invalid_arg("entity_path", "not an entity path"));
    }
    let call = Call::new(
        RequestDescriptor::get(Endpoint::IdKb)
            .path(path)
            .accept(ACCEPT_JSON_LD),
        Template::json(vec![FieldSpec::group("entities", "?@graph", concept_fields())]),
    );
    Ok(if get_flag(args, "include_raw")? {
        call.then(Render::Raw)
    } else {
        call
    })
}

fn search(args: &Args) -> Result<Call> {
    let query = get_string_arg(args, "query")?;
    let limit = get_bounded_u64(args, "limit", 20, 1, 200)?;
    let request = RequestDescriptor::get(Endpoint::IdKb)
        .path("find")
        .param("q", query)
        .param("_limit", limit)
        .param_opt("@type", get_optional_string(args, "entity_type")?)
        .accept(ACCEPT_JSON_LD);
    Ok(Call::new(
        request,
        Template::json(vec![
            FieldSpec::number("total", "totalItems"),
            FieldSpec::group("items", "items", concept_fields()),
        ]),
    ))
}

fn get_vocab_term(args: &Args) -> Result<Call> {
    let vocab = get_string_arg(args, "vocab")?;
    let term = get_string_arg(args, "term")?;
    segment("vocab", &vocab)?;
    segment("term", &term)?;
    Ok(Call::new(
        RequestDescriptor::get(Endpoint::IdKb)
            .path(format!("term/{}/{}", vocab, term))
            .accept(ACCEPT_JSON_LD),
        Template::json(vec![FieldSpec::group(
            "terms",
            "?@graph",
            vec![
                FieldSpec::scalar("id", "@id"),
                FieldSpec::scalar("type", "@type"),
                FieldSpec::scalar("label", "prefLabel"),
                FieldSpec::list("alt_labels", "altLabel"),
                FieldSpec::list("broader", "broader"),
                FieldSpec::list("narrower", "narrower"),
                FieldSpec::list("related", "related"),
                FieldSpec::scalar("scope_note", "scopeNote"),
            ],
        )]),
    ))
}

fn list_vocab(args: &Args) -> Result<Call> {
    let vocab = get_string_arg(args, "vocab")?;
    segment("vocab", &vocab)?;
    let limit = get_bounded_u64(args, "limit", 50, 1, 500)?;
    let request = RequestDescriptor::get(Endpoint::IdKb)
        .path("find")
        .param("inScheme.@id", format!("https://id.kb.se/term/{}", vocab))
        .param("_limit", limit)
        .accept(ACCEPT_JSON_LD);
    Ok(Call::new(
        request,
        Template::json(vec![
            FieldSpec::number("total", "totalItems"),
            FieldSpec::group(
                "terms",
                "items",
                vec![
                    FieldSpec::scalar("id", "@id"),
                    FieldSpec::scalar("label", "prefLabel"),
                ],
            ),
        ]),
    ))
}
