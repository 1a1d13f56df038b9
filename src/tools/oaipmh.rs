//! Libris OAI-PMH harvesting tools.

use crate::client::{RequestDescriptor, ACCEPT_XML};
use crate::config::Endpoint;
use crate::convert::{get_bounded_u64, get_optional_date, get_optional_string, get_string_arg, Args};
use crate::error::{McpError, Result};
use crate::normalize::{FieldSpec, Template};
use crate::render::Render;
use crate::schema;
use crate::tools::{Binding, Call, ToolDef};

/// Get all OAI-PMH tool bindings.
pub fn bindings() -> Vec<Binding> {
    vec![
        Binding::fetch(
            ToolDef::new(
                "oaipmh_list_records",
                "Harvest record headers from Libris over OAI-PMH for bulk export. Returns \
                 identifiers and datestamps plus a resumption token for the next page \
                 (see oaipmh_resume).",
                schema!(object {
                    optional: {
                        "set_spec": string = "Set, e.g. 'bib', 'auth', 'hold' (default all)",
                        "metadata_prefix": string = "oai_dc, marcxml or mods (default oai_dc)",
                        "from_date": string = "From date, YYYY-MM-DD",
                        "until_date": string = "Until date, YYYY-MM-DD",
                        "limit": integer = "Records shown, 1-100 (default 10)"
                    }
                }),
            ),
            list_records,
        ),
        Binding::fetch(
            ToolDef::new(
                "oaipmh_get_record",
                "Fetch one record over OAI-PMH. The full XML is returned as the raw body.",
                schema!(object {
                    required: { "identifier": string = "OAI identifier, e.g. 'https://libris.kb.se/bib/12345'" },
                    optional: { "metadata_prefix": string = "oai_dc or marcxml (default oai_dc)" }
                }),
            ),
            get_record,
        ),
        Binding::fetch(
            ToolDef::new(
                "oaipmh_list_sets",
                "List the OAI-PMH sets (collections) that can be harvested separately.",
                schema!(object {}),
            ),
            list_sets,
        ),
        Binding::fetch(
            ToolDef::new(
                "oaipmh_list_formats",
                "List the metadata formats the OAI-PMH endpoint can export.",
                schema!(object {}),
            ),
            list_formats,
        ),
        Binding::fetch(
            ToolDef::new(
                "oaipmh_resume",
                "Fetch the next page of an OAI-PMH harvest using a resumption token from an \
                 earlier response.",
                schema!(object {
                    required: { "resumption_token": string = "Token from the previous page" }
                }),
            ),
            resume,
        ),
    ]
}

fn request(verb: &str) -> RequestDescriptor {
    RequestDescriptor::get(Endpoint::LibrisOaiPmh)
        .param("verb", verb)
        .accept(ACCEPT_XML)
}

fn error_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::scalar("error", "error"),
        FieldSpec::scalar("error_code", "error/@code"),
    ]
}

fn records_template() -> Template {
    let mut fields = vec![
        // marcxml and mods payloads nest their own `record` elements; only
        // OAI records carry a header.
        FieldSpec::group(
            "records",
            "record/header",
            vec![
                FieldSpec::scalar("identifier", "identifier"),
                FieldSpec::scalar("datestamp", "datestamp"),
                FieldSpec::list("sets", "setSpec"),
                FieldSpec::scalar("status", "@status"),
            ],
        ),
        FieldSpec::count("count", "record/header"),
        FieldSpec::scalar("resumption_token", "resumptionToken"),
        FieldSpec::number("total_size", "resumptionToken/@completeListSize"),
        FieldSpec::number("cursor", "resumptionToken/@cursor"),
    ];
    fields.extend(error_fields());
    Template::xml(fields)
}

fn prefix(args: &Args) -> Result<String> {
    let prefix = get_optional_string(args, "metadata_prefix")?.unwrap_or_else(|| "oai_dc".into());
    if prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(prefix)
    } else {
        Err(McpError::invalid_arg("metadata_prefix", "expected a format name such as 'oai_dc'"))
    }
}

fn list_records(args: &Args) -> Result<Call> {
    let metadata_prefix = prefix(args)?;
    let from = get_optional_date(args, "from_date")?;
    let until = get_optional_date(args, "until_date")?;
    if let (Some(f), Some(u)) = (&from, &until) {
        if f > u {
            return Err(McpError::invalid_arg("from_date", "must not be after until_date"));
        }
    }
    let limit = get_bounded_u64(args, "limit", 10, 1, 100)?;

    let request = request("ListRecords")
        .param("metadataPrefix", metadata_prefix)
        .param_opt("set", get_optional_string(args, "set_spec")?)
        .param_opt("from", from)
        .param_opt("until", until);
    Ok(Call::new(request, records_template()).then(Render::Truncate {
        field: "records",
        max: limit as usize,
    }))
}

fn get_record(args: &Args) -> Result<Call> {
    let identifier = get_string_arg(args, "identifier")?;
    let request = request("GetRecord")
        .param("identifier", identifier)
        .param("metadataPrefix", prefix(args)?);

    let mut fields = vec![
        FieldSpec::scalar("identifier", "header/identifier"),
        FieldSpec::scalar("datestamp", "header/datestamp"),
    ];
    fields.extend(error_fields());
    Ok(Call::new(request, Template::xml(fields)).then(Render::Raw))
}

fn list_sets(_args: &Args) -> Result<Call> {
    let mut fields = vec![
        FieldSpec::group(
            "sets",
            "set",
            vec![
                FieldSpec::scalar("spec", "setSpec"),
                FieldSpec::scalar("name", "setName"),
            ],
        ),
        FieldSpec::count("count", "set"),
    ];
    fields.extend(error_fields());
    Ok(Call::new(request("ListSets"), Template::xml(fields)))
}

fn list_formats(_args: &Args) -> Result<Call> {
    let mut fields = vec![FieldSpec::group(
        "formats",
        "metadataFormat",
        vec![
            FieldSpec::scalar("prefix", "metadataPrefix"),
            FieldSpec::scalar("schema", "schema"),
            FieldSpec::scalar("namespace", "metadataNamespace"),
        ],
    )];
    fields.extend(error_fields());
    Ok(Call::new(request("ListMetadataFormats"), Template::xml(fields)))
}

fn resume(args: &Args) -> Result<Call> {
    let token = get_string_arg(args, "resumption_token")?;
    Ok(Call::new(
        request("ListRecords").param("resumptionToken", token),
        records_template(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::record::ResultRecord;
    use serde_json::{json, Value as JsonValue};

    const LIST_RECORDS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
  <responseDate>2024-05-01T10:00:00Z</responseDate>
  <request verb="ListRecords" metadataPrefix="oai_dc">https://libris.kb.se/api/oaipmh/</request>
  <ListRecords>
    <record>
      <header>
        <identifier>https://libris.kb.se/bib/1</identifier>
        <datestamp>2024-01-02T03:04:05Z</datestamp>
        <setSpec>bib</setSpec>
      </header>
      <metadata><dc xmlns="http://purl.org/dc/elements/1.1/"><identifier>ignored</identifier></dc></metadata>
    </record>
    <record>
      <header status="deleted">
        <identifier>https://libris.kb.se/bib/2</identifier>
        <datestamp>2024-01-03T00:00:00Z</datestamp>
      </header>
    </record>
    <resumptionToken completeListSize="5000" cursor="0">tok123</resumptionToken>
  </ListRecords>
</OAI-PMH>"#;

    fn args(value: JsonValue) -> Args {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn list_records_params() {
        let call = list_records(&args(json!({
            "set_spec": "bib",
            "from_date": "2024-01-01",
            "until_date": "2024-02-01"
        })))
        .unwrap();
        let params: Vec<(&str, &str)> = call
            .request
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            params,
            vec![
                ("verb", "ListRecords"),
                ("metadataPrefix", "oai_dc"),
                ("set", "bib"),
                ("from", "2024-01-01"),
                ("until", "2024-02-01"),
            ]
        );
    }

    #[test]
    fn list_records_validation() {
        assert!(list_records(&args(json!({"from_date": "01/01/2024"}))).is_err());
        assert!(list_records(&args(json!({"from_date": "2024-02-01", "until_date": "2024-01-01"}))).is_err());
        assert!(list_records(&args(json!({"limit": 101}))).is_err());
        assert!(list_records(&args(json!({"metadata_prefix": "oai dc"}))).is_err());
    }

    #[test]
    fn records_are_read_from_headers_and_truncated() {
        let call = list_records(&args(json!({"limit": 1}))).unwrap();
        let fields = normalize(LIST_RECORDS, "text/xml", &call.template).unwrap();
        assert_eq!(fields["count"], json!(2));
        assert_eq!(fields["resumption_token"], json!("tok123"));
        assert_eq!(fields["total_size"], json!(5000));
        assert_eq!(fields["cursor"], json!(0));
        assert_eq!(fields["records"][1]["status"], json!("deleted"));

        let mut record = ResultRecord::ok(fields);
        for step in &call.render {
            step.apply(&mut record, LIST_RECORDS);
        }
        assert_eq!(
            record.fields["records"],
            json!([{
                "identifier": "https://libris.kb.se/bib/1",
                "datestamp": "2024-01-02T03:04:05Z",
                "sets": ["bib"]
            }])
        );
    }

    #[test]
    fn marcxml_payload_records_are_not_counted() {
        let body = r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
  <ListRecords>
    <record>
      <header><identifier>https://libris.kb.se/bib/1</identifier></header>
      <metadata>
        <marc:record xmlns:marc="http://www.loc.gov/MARC21/slim">
          <marc:leader>00000cam a2200000 a 4500</marc:leader>
          <marc:controlfield tag="001">1</marc:controlfield>
        </marc:record>
      </metadata>
    </record>
    <record>
      <header><identifier>https://libris.kb.se/bib/2</identifier></header>
      <metadata>
        <marc:record xmlns:marc="http://www.loc.gov/MARC21/slim">
          <marc:controlfield tag="001">2</marc:controlfield>
        </marc:record>
      </metadata>
    </record>
  </ListRecords>
</OAI-PMH>"#;
        let call = list_records(&args(json!({"metadata_prefix": "marcxml"}))).unwrap();
        assert_eq!(call.request.param_value("metadataPrefix"), Some("marcxml"));
        let fields = normalize(body, "text/xml", &call.template).unwrap();
        assert_eq!(fields["count"], json!(2));
        assert_eq!(
            fields["records"],
            json!([
                {"identifier": "https://libris.kb.se/bib/1"},
                {"identifier": "https://libris.kb.se/bib/2"}
            ])
        );
    }

    #[test]
    fn protocol_errors_are_fields() {
        let body = r#"<OAI-PMH><error code="badResumptionToken">expired</error></OAI-PMH>"#;
        let call = resume(&args(json!({"resumption_token": "old"}))).unwrap();
        let fields = normalize(body, "text/xml", &call.template).unwrap();
        assert_eq!(fields["error"], json!("expired"));
        assert_eq!(fields["error_code"], json!("badResumptionToken"));
        assert_eq!(fields["count"], json!(0));
    }

    #[test]
    fn get_record_returns_raw_body() {
        let call = get_record(&args(json!({"identifier": "https://libris.kb.se/bib/1"}))).unwrap();
        assert_eq!(call.render, vec![Render::Raw]);
        assert_eq!(call.request.param_value("verb"), Some("GetRecord"));
    }

    #[test]
    fn sets_and_formats() {
        let body = r#"<OAI-PMH><ListSets>
            <set><setSpec>bib</setSpec><setName>Bibliographic</setName></set>
            <set><setSpec>auth</setSpec><setName>Authority</setName></set>
        </ListSets></OAI-PMH>"#;
        let fields = normalize(body, "", &list_sets(&Args::new()).unwrap().template).unwrap();
        assert_eq!(fields["sets"][1], json!({"spec": "auth", "name": "Authority"}));

        let body = r#"<OAI-PMH><ListMetadataFormats><metadataFormat>
            <metadataPrefix>marcxml</metadataPrefix>
            <schema>http://www.loc.gov/standards/marcxml/schema/MARC21slim.xsd</schema>
        </metadataFormat></ListMetadataFormats></OAI-PMH>"#;
        let fields = normalize(body, "", &list_formats(&Args::new()).unwrap().template).unwrap();
        assert_eq!(fields["formats"][0]["prefix"], json!("marcxml"));
    }
}
