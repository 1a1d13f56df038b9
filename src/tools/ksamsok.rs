//! K-samsök tools (Swedish Open Cultural Heritage).
//!
//! K-samsök aggregates objects from museums, archives and heritage agencies.
//! Every call is a GET with a `method` parameter; answers are XML with RDF
//! records inside.

use serde_json::{json, Value as JsonValue};

use crate::client::{RequestDescriptor, ACCEPT_XML};
use crate::config::Endpoint;
use crate::convert::{
    get_bounded_u64, get_flag, get_i64_arg, get_optional_string, get_string_arg, Args,
};
use crate::error::{McpError, Result};
use crate::normalize::{FieldSpec, Template};
use crate::record::Fields;
use crate::render::Render;
use crate::schema;
use crate::tools::{Binding, Call, ToolDef};

const URI_BASE: &str = "http://kulturarvsdata.se/";

const TOP_TERMS: usize = 30;

/// Named periods of Swedish history: key, display name, first and last year.
const PERIODS: &[(&str, &str, i64, i64)] = &[
    ("vikingatid", "Vikingatiden", 800, 1100),
    ("medeltid", "Medeltiden", 1100, 1520),
    ("vasatid", "Vasatiden", 1520, 1611),
    ("stormaktstid", "Stormaktstiden", 1611, 1721),
    ("frihetstid", "Frihetstiden", 1721, 1772),
    ("gustaviansk", "Gustavianska tiden", 1772, 1809),
    ("1800-tal", "1800-talet", 1800, 1899),
    ("1900-tal", "1900-talet", 1900, 1999),
];

/// Short name and `countyName` value of every county.
const COUNTIES: &[(&str, &str)] = &[
    ("Blekinge", "Blekinge län"),
    ("Dalarna", "Dalarnas län"),
    ("Gotland", "Gotlands län"),
    ("Gävleborg", "Gävleborgs län"),
    ("Halland", "Hallands län"),
    ("Jämtland", "Jämtlands län"),
    ("Jönköping", "Jönköpings län"),
    ("Kalmar", "Kalmar län"),
    ("Kronoberg", "Kronobergs län"),
    ("Norrbotten", "Norrbottens län"),
    ("Skåne", "Skåne län"),
    ("Stockholm", "Stockholms län"),
    ("Södermanland", "Södermanlands län"),
    ("Uppsala", "Uppsala län"),
    ("Värmland", "Värmlands län"),
    ("Västerbotten", "Västerbottens län"),
    ("Västernorrland", "Västernorrlands län"),
    ("Västmanland", "Västmanlands län"),
    ("Västra Götaland", "Västra Götalands län"),
    ("Örebro", "Örebro län"),
    ("Östergötland", "Östergötlands län"),
];

/// Get all K-samsök tool bindings.
pub fn bindings() -> Vec<Binding> {
    vec![
        // ── Search ───────────────────────────────────────────────────────
        Binding::fetch(
            ToolDef::new(
                "ksamsok_search",
                "Search Swedish cultural heritage objects in K-samsök (83 institutions, 10M+ \
                 objects) with CQL, e.g. 'text=runsten' or 'itemType=Photograph'.",
                schema!(object {
                    required: { "query": string = "CQL query" },
                    optional: {
                        "limit": integer = "Hits per page, 1-500 (default 10)",
                        "start_record": integer = "1-based start record (default 1)"
                    }
                }),
            ),
            search,
        ),
        Binding::fetch(
            ToolDef::new(
                "ksamsok_search_location",
                "Find heritage objects in a county, municipality or parish, optionally \
                 restricted to one object type. At least one filter is required.",
                schema!(object {
                    optional: {
                        "county": string = "County, e.g. 'Uppsala län'",
                        "municipality": string = "Municipality, e.g. 'Uppsala'",
                        "parish": string = "Parish",
                        "item_type": string = "Object type, e.g. 'Building'",
                        "limit": integer = "Hits per page, 1-500 (default 20)"
                    }
                }),
            ),
            search_location,
        ),
        Binding::fetch(
            ToolDef::new(
                "ksamsok_search_type",
                "Find heritage objects of one type (Photograph, Painting, Building, \
                 Runestone, Coin, Map, ...), optionally only those with an image or \
                 coordinates.",
                schema!(object {
                    required: { "item_type": string = "Object type" },
                    optional: {
                        "has_image": boolean = "Require a thumbnail",
                        "has_coordinates": boolean = "Require geodata",
                        "limit": integer = "Hits per page, 1-500 (default 20)"
                    }
                }),
            ),
            search_type,
        ),
        Binding::fetch(
            ToolDef::new(
                "historical_periods_search",
                "Find heritage objects from a named period of Swedish history. Each period \
                 maps to fixed years (vikingatid 800-1100, medeltid 1100-1520, vasatid \
                 1520-1611, stormaktstid 1611-1721, frihetstid 1721-1772, gustaviansk \
                 1772-1809, 1800-tal, 1900-tal).",
                schema!(object {
                    required: { "period": string = "Period name, e.g. 'vikingatid'" },
                    optional: {
                        "item_type": string = "Object type",
                        "limit": integer = "Hits per page, 1-100 (default 20)"
                    }
                }),
            ),
            historical_periods,
        ),
        Binding::local(
            ToolDef::new(
                "swedish_counties_info",
                "The 21 Swedish counties with the exact countyName values K-samsök uses, \
                 ready for ksamsok_search_location or a CQL query.",
                schema!(object {}),
            ),
            counties,
        ),
        Binding::fetch(
            ToolDef::new(
                "ksamsok_search_time",
                "Find heritage objects dated within a period of years.",
                schema!(object {
                    required: {
                        "from_year": integer = "First year, e.g. 1700",
                        "to_year": integer = "Last year, e.g. 1800"
                    },
                    optional: {
                        "item_type": string = "Object type",
                        "limit": integer = "Hits per page, 1-500 (default 20)"
                    }
                }),
            ),
            search_time,
        ),
        // ── Objects ──────────────────────────────────────────────────────
        Binding::fetch(
            ToolDef::new(
                "ksamsok_get_object",
                "Fetch one heritage object by URI ('raa/fmi/10028500550001' or a full \
                 kulturarvsdata.se URL): label, description, type, dating, place, links \
                 and thumbnail.",
                schema!(object {
                    required: { "uri": string = "Object URI" }
                }),
            ),
            get_object,
        ),
        Binding::fetch(
            ToolDef::new(
                "ksamsok_get_relations",
                "List relations of a heritage object to other objects, people, places and \
                 events.",
                schema!(object {
                    required: { "uri": string = "Object URI" },
                    optional: {
                        "relation_type": string = "'all' or a relation such as 'sameAs', 'isPartOf' (default all)"
                    }
                }),
            ),
            get_relations,
        ),
        Binding::fetch(
            ToolDef::new(
                "ksamsok_statistics",
                "Object counts per value of an index (serviceOrganization, itemType, \
                 countyName, ...), largest first. Shows the 30 largest values; \
                 term_count gives the number of distinct values.",
                schema!(object {
                    required: { "index": string = "Index name" },
                    optional: { "query": string = "Restrict to a CQL query ('*' for everything)" }
                }),
            ),
            statistics,
        ),
    ]
}

fn record_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::scalar("label", "itemLabel"),
        FieldSpec::scalar("description", "itemDescription"),
        FieldSpec::scalar("type", "itemType"),
        FieldSpec::scalar("url", "url"),
        FieldSpec::scalar("thumbnail", "thumbnail"),
        FieldSpec::scalar("service", "serviceName"),
        FieldSpec::scalar("time_label", "timeLabel"),
        FieldSpec::scalar("place_label", "placeLabel"),
        FieldSpec::scalar("uri", "Entity/@about"),
    ]
}

fn search_template() -> Template {
    Template::xml(vec![
        FieldSpec::number("total", "totalHits").required(),
        FieldSpec::group("records", "record", record_fields()),
    ])
}

pub(crate) fn search_call(query: &str, hits: u64, start: u64) -> Call {
    let request = RequestDescriptor::get(Endpoint::Ksamsok)
        .param("method", "search")
        .param("query", query)
        .param("hitsPerPage", hits)
        .param("startRecord", start)
        .accept(ACCEPT_XML);
    Call::new(request, search_template())
}

fn object_uri(uri: &str) -> String {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        uri.to_string()
    } else {
        format!("{}{}", URI_BASE, uri.trim_start_matches('/'))
    }
}

/// Double quotes would end a quoted CQL term early.
fn cql_quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', ""))
}

fn search(args: &Args) -> Result<Call> {
    let query = get_string_arg(args, "query")?;
    let hits = get_bounded_u64(args, "limit", 10, 1, 500)?;
    let start = get_bounded_u64(args, "start_record", 1, 1, u64::MAX)?;
    Ok(search_call(&query, hits, start))
}

fn search_location(args: &Args) -> Result<Call> {
    let mut parts = Vec::new();
    if let Some(county) = get_optional_string(args, "county")? {
        parts.push(format!("countyName={}", cql_quoted(&county)));
    }
    if let Some(municipality) = get_optional_string(args, "municipality")? {
        parts.push(format!("municipalityName={}", cql_quoted(&municipality)));
    }
    if let Some(parish) = get_optional_string(args, "parish")? {
        parts.push(format!("parishName={}", cql_quoted(&parish)));
    }
    if let Some(item_type) = get_optional_string(args, "item_type")? {
        parts.push(format!("itemType={}", item_type));
    }
    if parts.is_empty() {
        return Err(McpError::invalid_arg(
            "county",
            "give at least one of county, municipality, parish or item_type",
        ));
    }
    let hits = get_bounded_u64(args, "limit", 20, 1, 500)?;
    Ok(search_call(&parts.join(" AND "), hits, 1))
}

fn search_type(args: &Args) -> Result<Call> {
    let mut query = format!("itemType={}", get_string_arg(args, "item_type")?);
    if get_flag(args, "has_image")? {
        query.push_str(" AND thumbnailExists=true");
    }
    if get_flag(args, "has_coordinates")? {
        query.push_str(" AND geoDataExists=true");
    }
    let hits = get_bounded_u64(args, "limit", 20, 1, 500)?;
    Ok(search_call(&query, hits, 1))
}

fn search_time(args: &Args) -> Result<Call> {
    let from = get_i64_arg(args, "from_year")?;
    let to = get_i64_arg(args, "to_year")?;
    if from > to {
        return Err(McpError::invalid_arg("from_year", "must not be after to_year"));
    }
    let mut query = format!("fromTime>={} AND toTime<={}", from, to);
    if let Some(item_type) = get_optional_string(args, "item_type")? {
        query.push_str(&format!(" AND itemType={}", item_type));
    }
    let hits = get_bounded_u64(args, "limit", 20, 1, 500)?;
    Ok(search_call(&query, hits, 1))
}

fn historical_periods(args: &Args) -> Result<Call> {
    let period = get_string_arg(args, "period")?.to_lowercase();
    let Some(&(key, name, from, to)) = PERIODS.iter().find(|(key, ..)| *key == period) else {
        let known: Vec<&str> = PERIODS.iter().map(|(key, ..)| *key).collect();
        return Err(McpError::invalid_arg(
            "period",
            format!("must be one of: {}", known.join(", ")),
        ));
    };
    let mut query = format!("fromTime>={} AND toTime<={}", from, to);
    if let Some(item_type) = get_optional_string(args, "item_type")? {
        query.push_str(&format!(" AND itemType={}", item_type));
    }
    let hits = get_bounded_u64(args, "limit", 20, 1, 100)?;
    Ok(search_call(&query, hits, 1).then(Render::Set {
        field: "period",
        value: json!({"key": key, "name": name, "from_year": from, "to_year": to}),
    }))
}

fn counties(_args: &Args) -> Result<Fields> {
    let rows: Vec<JsonValue> = COUNTIES
        .iter()
        .map(|(short, county)| {
            json!({
                "name": short,
                "county_name": county,
                "query": format!("countyName={}", cql_quoted(county)),
            })
        })
        .collect();
    let mut fields = Fields::new();
    fields.insert("count".into(), JsonValue::from(rows.len()));
    fields.insert("counties".into(), JsonValue::Array(rows));
    Ok(fields)
}

fn get_object(args: &Args) -> Result<Call> {
    let uri = object_uri(&get_string_arg(args, "uri")?);
    let request = RequestDescriptor::get(Endpoint::Ksamsok)
        .param("method", "getObject")
        .param("objectId", &uri)
        .accept(ACCEPT_XML);

    let mut fields = record_fields();
    if let Some(about) = fields.iter_mut().find(|f| f.name == "uri") {
        about.required = true;
    }
    Ok(Call::new(request, Template::xml(fields)))
}

fn get_relations(args: &Args) -> Result<Call> {
    let uri = object_uri(&get_string_arg(args, "uri")?);
    let relation = get_optional_string(args, "relation_type")?.unwrap_or_else(|| "all".into());
    let request = RequestDescriptor::get(Endpoint::Ksamsok)
        .param("method", "getRelations")
        .param("objectId", &uri)
        .param("maxDepth", 1)
        .accept(ACCEPT_XML);

    let call = Call::new(
        request,
        Template::xml(vec![
            FieldSpec::group(
                "relations",
                "relation",
                vec![
                    FieldSpec::scalar("type", "@type"),
                    FieldSpec::scalar("target", "@target"),
                    FieldSpec::scalar("source", "@source"),
                    FieldSpec::scalar("uri", ""),
                ],
            ),
            FieldSpec::count("count", "relation"),
        ]),
    );
    Ok(if relation == "all" {
        call
    } else {
        call.then(Render::Retain {
            field: "relations",
            key: "type",
            value: relation,
        })
    })
}

fn statistics(args: &Args) -> Result<Call> {
    let index = get_string_arg(args, "index")?;
    if !index.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(McpError::invalid_arg("index", "expected an index name such as 'itemType'"));
    }
    let query = get_optional_string(args, "query")?.unwrap_or_default();
    let query = if query == "*" { String::new() } else { query };

    let request = RequestDescriptor::get(Endpoint::Ksamsok)
        .param("method", "statistic")
        .param("index", index)
        .param("query", query)
        .accept(ACCEPT_XML);
    Ok(Call::new(
        request,
        Template::xml(vec![
            FieldSpec::group(
                "terms",
                "term",
                vec![
                    FieldSpec::scalar("value", "@value"),
                    FieldSpec::number("count", "@count"),
                ],
            ),
            FieldSpec::count("term_count", "term"),
        ]),
    )
    .then(Render::SortDesc {
        field: "terms",
        key: "count",
    })
    .then(Render::Truncate {
        field: "terms",
        max: TOP_TERMS,
    }))
}
