//! Tools that consult several KB sources in one call.
//!
//! Every source is a leg of its own. Its result record is nested under the
//! leg name, so a source that is down shows up as that leg's
//! `upstream-error` while the others still answer.

use crate::client::{RequestDescriptor, ACCEPT_JSON_LD, ACCEPT_XML};
use crate::config::Endpoint;
use crate::convert::{get_bounded_u64, get_choice, get_flag_or, get_string_arg, Args};
use crate::error::{McpError, Result};
use crate::normalize::{FieldSpec, Template};
use crate::record::Fields;
use crate::render::Render;
use crate::schema;
use crate::tools::{ksamsok, libris, swepub, Binding, Call, Legs, ToolDef};

/// Related works fetched per relation, before the seed work is dropped.
const RELATED_FETCHED: u64 = 10;
const RELATED_SHOWN: usize = 5;

/// Get all multi-source tool bindings.
pub fn bindings() -> Vec<Binding> {
    vec![
        Binding::fan(
            ToolDef::new(
                "combined_search",
                "Search Libris (books and media), K-samsök (cultural heritage) and Swepub \
                 (research) with one query for a quick overview. Each source reports its \
                 own total and top hits.",
                schema!(object {
                    required: { "query": string = "Search terms" },
                    optional: {
                        "include_libris": boolean = "Search Libris (default true)",
                        "include_ksamsok": boolean = "Search K-samsök (default true)",
                        "include_swepub": boolean = "Search Swepub (default true)",
                        "limit_per_source": integer = "Hits per source, 1-20 (default 5)"
                    }
                }),
            ),
            combined_search,
        ),
        Binding::fan(
            ToolDef::new(
                "quick_stats",
                "Live record counts from Libris, K-samsök, Swepub and id.kb.se. A source \
                 that does not answer is reported as an upstream error.",
                schema!(object {}),
            ),
            quick_stats,
        ),
        Binding::follow(
            ToolDef::new(
                "find_related_works",
                "Find works related to a title in Libris: other works on its first subject, \
                 other works by its author, or both.",
                schema!(object {
                    required: { "title": string = "Title of the work" },
                    optional: {
                        "relation_type": string = "subject, author or both (default subject)"
                    }
                }),
            ),
            find_work,
            related_works,
        ),
    ]
}

fn combined_search(args: &Args) -> Result<Legs> {
    let query = get_string_arg(args, "query")?;
    let n = get_bounded_u64(args, "limit_per_source", 5, 1, 20)?;

    let mut legs = Vec::new();
    if get_flag_or(args, "include_libris", true)? {
        legs.push(("libris", libris::xsearch_call(&query, n, None)));
    }
    if get_flag_or(args, "include_ksamsok", true)? {
        legs.push(("ksamsok", ksamsok::search_call(&format!("text={}", query), n, 1)));
    }
    if get_flag_or(args, "include_swepub", true)? {
        legs.push(("swepub", swepub::swepub_call(&query, n, None)));
    }
    if legs.is_empty() {
        return Err(McpError::invalid_arg(
            "include_libris",
            "enable at least one of include_libris, include_ksamsok or include_swepub",
        ));
    }
    Ok(legs)
}

fn quick_stats(_args: &Args) -> Result<Legs> {
    let xsearch_total =
        || Template::json(vec![FieldSpec::number("total", "xsearch.records").required()]);
    Ok(vec![
        (
            "libris",
            Call::new(
                libris::xsearch_request(Endpoint::LibrisXsearch, "*", None, 1, None),
                xsearch_total(),
            ),
        ),
        (
            "ksamsok",
            Call::new(
                RequestDescriptor::get(Endpoint::Ksamsok)
                    .param("method", "search")
                    .param("query", "*")
                    .param("hitsPerPage", 1)
                    .accept(ACCEPT_XML),
                Template::xml(vec![FieldSpec::number("total", "totalHits").required()]),
            ),
        ),
        (
            "swepub",
            Call::new(
                libris::xsearch_request(Endpoint::Swepub, "*", Some(swepub::DATABASE), 1, None),
                xsearch_total(),
            ),
        ),
        (
            "idkb",
            Call::new(
                RequestDescriptor::get(Endpoint::IdKb)
                    .path("find")
                    .param("q", "*")
                    .param("_limit", 1)
                    .accept(ACCEPT_JSON_LD),
                Template::json(vec![FieldSpec::number("total", "totalItems").required()]),
            ),
        ),
    ])
}

fn relation(args: &Args) -> Result<String> {
    get_choice(args, "relation_type", "subject", &["subject", "author", "both"])
}

fn find_work(args: &Args) -> Result<Call> {
    let title = get_string_arg(args, "title")?;
    relation(args)?;
    let request = libris::xsearch_request(
        Endpoint::LibrisXsearch,
        &format!("titel:{}", title),
        None,
        1,
        None,
    );
    Ok(Call::new(
        request,
        Template::json(vec![
            FieldSpec::number("total", "xsearch.records").required(),
            FieldSpec::scalar("title", "xsearch.list.0.title"),
            FieldSpec::scalar("creator", "xsearch.list.0.creator"),
            FieldSpec::scalar("subject", "xsearch.list.0.subject"),
        ]),
    ))
}

/// Searches seeded by the work found by [`find_work`]. No work, no legs.
fn related_works(args: &Args, work: &Fields) -> Result<Legs> {
    let relation = relation(args)?;
    let text = |key: &str| work.get(key).and_then(|v| v.as_str());
    let Some(title) = text("title") else {
        return Ok(Vec::new());
    };

    let mut legs = Vec::new();
    if relation != "author" {
        if let Some(subject) = text("subject") {
            legs.push(("same_subject", related_call(&format!("ämne:{}", subject), title)));
        }
    }
    if relation != "subject" {
        if let Some(creator) = text("creator") {
            legs.push(("same_author", related_call(&format!("författare:{}", creator), title)));
        }
    }
    Ok(legs)
}

fn related_call(query: &str, seed_title: &str) -> Call {
    libris::xsearch_call(query, RELATED_FETCHED, None)
        .then(Render::Exclude {
            field: "records",
            key: "title",
            value: seed_title.to_string(),
        })
        .then(Render::Truncate {
            field: "records",
            max: RELATED_SHOWN,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use serde_json::{json, Value as JsonValue};

    fn args(value: JsonValue) -> Args {
        value.as_object().cloned().unwrap()
    }

    fn names(legs: &Legs) -> Vec<&'static str> {
        legs.iter().map(|(name, _)| *name).collect()
    }

    #[test]
    fn combined_search_legs_follow_flags() {
        let legs = combined_search(&args(json!({"query": "runsten"}))).unwrap();
        assert_eq!(names(&legs), vec!["libris", "ksamsok", "swepub"]);
        assert_eq!(legs[0].1.request.param_value("n"), Some("5"));
        assert_eq!(legs[1].1.request.param_value("query"), Some("text=runsten"));
        assert_eq!(legs[1].1.request.param_value("hitsPerPage"), Some("5"));
        assert_eq!(legs[2].1.request.param_value("database"), Some("swepub"));

        let legs = combined_search(&args(json!({
            "query": "runsten",
            "include_libris": false,
            "include_swepub": false,
            "limit_per_source": 20
        })))
        .unwrap();
        assert_eq!(names(&legs), vec!["ksamsok"]);
        assert_eq!(legs[0].1.request.param_value("hitsPerPage"), Some("20"));
    }

    #[test]
    fn combined_search_needs_a_source() {
        let none = json!({
            "query": "x",
            "include_libris": false,
            "include_ksamsok": false,
            "include_swepub": false
        });
        assert!(matches!(
            combined_search(&args(none)),
            Err(McpError::InvalidArg { .. })
        ));
        assert!(combined_search(&args(json!({"query": "x", "limit_per_source": 21}))).is_err());
    }

    #[test]
    fn quick_stats_asks_each_source_for_one_hit() {
        let legs = quick_stats(&Args::new()).unwrap();
        assert_eq!(names(&legs), vec!["libris", "ksamsok", "swepub", "idkb"]);
        assert_eq!(legs[0].1.request.param_value("n"), Some("1"));
        assert_eq!(legs[1].1.request.endpoint, Endpoint::Ksamsok);
        assert_eq!(legs[3].1.request.path, "find");
        assert_eq!(legs[3].1.request.param_value("_limit"), Some("1"));

        let body = r#"<result><totalHits>10234567</totalHits></result>"#;
        let fields = normalize(body, "", &legs[1].1.template).unwrap();
        assert_eq!(fields["total"], json!(10234567));
    }

    #[test]
    fn seed_reads_first_hit() {
        let call = find_work(&args(json!({"title": "Röda rummet"}))).unwrap();
        assert_eq!(call.request.param_value("query"), Some("titel:Röda rummet"));
        assert_eq!(call.request.param_value("n"), Some("1"));
        assert!(find_work(&args(json!({"title": "x", "relation_type": "series"}))).is_err());

        let body = json!({"xsearch": {"records": 3, "list": [{
            "title": "Röda rummet",
            "creator": "Strindberg, August",
            "subject": ["Stockholm", "Satir"]
        }]}});
        let fields = normalize(&body.to_string(), "", &call.template).unwrap();
        assert_eq!(fields["subject"], json!("Stockholm"));
        assert_eq!(fields["creator"], json!("Strindberg, August"));
    }

    #[test]
    fn related_legs_follow_relation_type() {
        let work = args(json!({
            "total": 3,
            "title": "Röda rummet",
            "creator": "Strindberg, August",
            "subject": "Stockholm"
        }));

        let legs = related_works(&Args::new(), &work).unwrap();
        assert_eq!(names(&legs), vec!["same_subject"]);
        assert_eq!(legs[0].1.request.param_value("query"), Some("ämne:Stockholm"));
        assert_eq!(legs[0].1.request.param_value("n"), Some("10"));
        assert_eq!(
            legs[0].1.render,
            vec![
                Render::Exclude { field: "records", key: "title", value: "Röda rummet".into() },
                Render::Truncate { field: "records", max: 5 },
            ]
        );

        let legs = related_works(&args(json!({"relation_type": "both"})), &work).unwrap();
        assert_eq!(names(&legs), vec!["same_subject", "same_author"]);
        assert_eq!(
            legs[1].1.request.param_value("query"),
            Some("författare:Strindberg, August")
        );

        let nothing = args(json!({"total": 0}));
        assert!(related_works(&Args::new(), &nothing).unwrap().is_empty());
    }
}
