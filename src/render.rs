//! Post-processing applied to normalized fields before they are returned.

use serde_json::{Map, Value as JsonValue};

use crate::record::{Fields, ResultRecord};

/// Bibliography output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// RIS tagged format (Zotero, EndNote, Mendeley).
    Ris,
    /// BibTeX entries.
    Bibtex,
    /// Records left as structured fields.
    Json,
}

impl ExportFormat {
    /// Parse a validated format argument. Anything unknown falls back to RIS.
    pub fn from_arg(value: &str) -> Self {
        match value {
            "bibtex" => ExportFormat::Bibtex,
            "json" => ExportFormat::Json,
            _ => ExportFormat::Ris,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Ris => "ris",
            ExportFormat::Bibtex => "bibtex",
            ExportFormat::Json => "json",
        }
    }
}

/// What kind of publication the exported records are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Library catalogue records.
    Book,
    /// Research publications.
    Article,
}

/// One post-processing step.
#[derive(Debug, Clone, PartialEq)]
pub enum Render {
    /// Attach the raw upstream body.
    Raw,
    /// Keep at most `max` entries of a list field.
    Truncate {
        /// List field
        field: &'static str,
        /// Entries kept
        max: usize,
    },
    /// Keep entries of a list field whose `key` equals `value`.
    Retain {
        /// List field
        field: &'static str,
        /// Key compared in each entry
        key: &'static str,
        /// Required value
        value: String,
    },
    /// Drop entries of a list field whose `key` equals `value`.
    Exclude {
        /// List field
        field: &'static str,
        /// Key compared in each entry
        key: &'static str,
        /// Rejected value
        value: String,
    },
    /// Insert a fixed value.
    Set {
        /// Field name
        field: &'static str,
        /// Value stored under `field`
        value: JsonValue,
    },
    /// Sort entries of a list field by a numeric key, largest first.
    SortDesc {
        /// List field
        field: &'static str,
        /// Numeric key in each entry
        key: &'static str,
    },
    /// Reduce SPARQL result bindings in `rows` to variable/value maps.
    SparqlRows,
    /// Turn `records` into a bibliography string under `export`.
    Export(ExportFormat, EntryKind),
}

impl Render {
    /// Apply the step to `record`, which was produced from `body`.
    pub fn apply(&self, record: &mut ResultRecord, body: &str) {
        let fields = &mut record.fields;
        match self {
            Render::Raw => record.raw = Some(body.to_string()),
            Render::Truncate { field, max } => {
                if let Some(JsonValue::Array(items)) = fields.get_mut(*field) {
                    items.truncate(*max);
                }
            }
            Render::Retain { field, key, value } => {
                if let Some(JsonValue::Array(items)) = fields.get_mut(*field) {
                    items.retain(|item| item.get(*key).and_then(|v| v.as_str()) == Some(value.as_str()));
                }
            }
            Render::Exclude { field, key, value } => {
                if let Some(JsonValue::Array(items)) = fields.get_mut(*field) {
                    items.retain(|item| item.get(*key).and_then(|v| v.as_str()) != Some(value.as_str()));
                }
            }
            Render::Set { field, value } => {
                fields.insert(field.to_string(), value.clone());
            }
            Render::SortDesc { field, key } => {
                if let Some(JsonValue::Array(items)) = fields.get_mut(*field) {
                    items.sort_by_key(|item| std::cmp::Reverse(numeric(item.get(*key))));
                }
            }
            Render::SparqlRows => sparql_rows(fields),
            Render::Export(format, kind) => export(fields, *format, *kind),
        }
    }
}

fn numeric(value: Option<&JsonValue>) -> i64 {
    match value {
        Some(JsonValue::Number(n)) => n.as_i64().unwrap_or(0),
        Some(JsonValue::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn sparql_rows(fields: &mut Fields) {
    let Some(JsonValue::Array(bindings)) = fields.get_mut("rows") else {
        return;
    };
    for row in bindings.iter_mut() {
        if let JsonValue::Object(vars) = row {
            let flat: Map<String, JsonValue> = vars
                .iter()
                .filter_map(|(name, binding)| {
                    binding
                        .get("value")
                        .map(|value| (name.clone(), value.clone()))
                })
                .collect();
            *row = JsonValue::Object(flat);
        }
    }
}

fn export(fields: &mut Fields, format: ExportFormat, kind: EntryKind) {
    let records = match fields.get("records") {
        Some(JsonValue::Array(items)) => items.clone(),
        _ => Vec::new(),
    };
    fields.insert("format".to_string(), JsonValue::from(format.as_str()));
    fields.insert("count".to_string(), JsonValue::from(records.len()));

    let text = match format {
        ExportFormat::Json => return,
        ExportFormat::Ris => to_ris(&records, kind),
        ExportFormat::Bibtex => to_bibtex(&records, kind),
    };
    fields.remove("records");
    fields.insert("export".to_string(), JsonValue::String(text));
}

fn text<'a>(record: &'a JsonValue, key: &str) -> Option<&'a str> {
    match record.get(key) {
        Some(JsonValue::String(s)) if !s.trim().is_empty() => Some(s.trim()),
        Some(JsonValue::Array(items)) => items.iter().find_map(|v| v.as_str()),
        _ => None,
    }
}

fn year(record: &JsonValue) -> Option<&str> {
    text(record, "date")
        .map(|d| d.get(..4).unwrap_or(d))
        .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
}

/// Render records as RIS.
pub fn to_ris(records: &[JsonValue], kind: EntryKind) -> String {
    let ty = match kind {
        EntryKind::Book => "BOOK",
        EntryKind::Article => "JOUR",
    };

    let mut out = String::new();
    for record in records {
        out.push_str(&format!("TY  - {}\n", ty));
        if let Some(title) = text(record, "title") {
            out.push_str(&format!("TI  - {}\n", title));
        }
        if let Some(JsonValue::Array(creators)) = record.get("creator") {
            for creator in creators.iter().filter_map(|c| c.as_str()) {
                out.push_str(&format!("AU  - {}\n", creator));
            }
        } else if let Some(creator) = text(record, "creator") {
            out.push_str(&format!("AU  - {}\n", creator));
        }
        if let Some(y) = year(record) {
            out.push_str(&format!("PY  - {}\n", y));
        }
        if let Some(publisher) = text(record, "publisher") {
            out.push_str(&format!("PB  - {}\n", publisher));
        }
        if let Some(isbn) = text(record, "isbn") {
            out.push_str(&format!("SN  - {}\n", isbn));
        }
        if let Some(url) = text(record, "identifier") {
            out.push_str(&format!("UR  - {}\n", url));
        }
        out.push_str("ER  - \n\n");
    }
    out
}

/// Render records as BibTeX.
pub fn to_bibtex(records: &[JsonValue], kind: EntryKind) -> String {
    let entry = match kind {
        EntryKind::Book => "book",
        EntryKind::Article => "article",
    };

    let mut out = String::new();
    for (i, record) in records.iter().enumerate() {
        let author = text(record, "creator");
        let y = year(record).unwrap_or("0000");
        out.push_str(&format!("@{}{{{}{}_{},\n", entry, citation_stem(author), y, i));

        let mut lines = vec![format!("  title = {{{}}}", braces(text(record, "title").unwrap_or("")))];
        if let Some(a) = author {
            lines.push(format!("  author = {{{}}}", braces(a)));
        }
        lines.push(format!("  year = {{{}}}", y));
        if let Some(p) = text(record, "publisher") {
            lines.push(format!("  publisher = {{{}}}", braces(p)));
        }
        if let Some(isbn) = text(record, "isbn") {
            lines.push(format!("  isbn = {{{}}}", isbn));
        }
        if let Some(url) = text(record, "identifier") {
            lines.push(format!("  url = {{{}}}", url));
        }
        out.push_str(&lines.join(",\n"));
        out.push_str("\n}\n\n");
    }
    out
}

/// Lower-cased surname: text before a comma, else the first word.
fn citation_stem(author: Option<&str>) -> String {
    let surname = match author {
        Some(a) if a.contains(',') => a.split(',').next().unwrap_or(a),
        Some(a) => a.split_whitespace().next().unwrap_or(a),
        None => "unknown",
    };
    let stem: String = surname
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    if stem.is_empty() {
        "unknown".to_string()
    } else {
        stem
    }
}

fn braces(value: &str) -> String {
    value.replace(['{', '}'], "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<JsonValue> {
        vec![
            json!({
                "title": "Pippi Långstrump",
                "creator": "Lindgren, Astrid",
                "date": "1945",
                "publisher": "Rabén & Sjögren",
                "isbn": ["9129621405"],
                "identifier": "http://libris.kb.se/bib/8207372"
            }),
            json!({"title": "Okänd bok"}),
        ]
    }

    #[test]
    fn ris_book_entries() {
        let ris = to_ris(&records(), EntryKind::Book);
        let expected = "TY  - BOOK\n\
                        TI  - Pippi Långstrump\n\
                        AU  - Lindgren, Astrid\n\
                        PY  - 1945\n\
                        PB  - Rabén & Sjögren\n\
                        SN  - 9129621405\n\
                        UR  - http://libris.kb.se/bib/8207372\n\
                        ER  - \n\n\
                        TY  - BOOK\n\
                        TI  - Okänd bok\n\
                        ER  - \n\n";
        assert_eq!(ris, expected);
    }

    #[test]
    fn ris_article_type() {
        let ris = to_ris(&[json!({"title": "Paper", "date": "2021-03-01"})], EntryKind::Article);
        assert!(ris.starts_with("TY  - JOUR\n"));
        assert!(ris.contains("PY  - 2021\n"));
    }

    #[test]
    fn bibtex_keys_and_fields() {
        let bib = to_bibtex(&records(), EntryKind::Book);
        assert!(bib.starts_with("@book{lindgren1945_0,\n"));
        assert!(bib.contains("  author = {Lindgren, Astrid},\n"));
        assert!(bib.contains("@book{unknown0000_1,\n"));

        let bib = to_bibtex(&[json!({"creator": "Anna Johansson", "date": "2020"})], EntryKind::Article);
        assert!(bib.starts_with("@article{anna2020_0,"));
    }

    #[test]
    fn export_replaces_records_except_for_json() {
        let mut record = ResultRecord::ok(Fields::new());
        record.fields.insert("records".into(), JsonValue::Array(records()));
        Render::Export(ExportFormat::Ris, EntryKind::Book).apply(&mut record, "");
        assert!(record.fields.get("records").is_none());
        assert_eq!(record.fields["count"], json!(2));
        assert_eq!(record.fields["format"], json!("ris"));
        assert!(record.fields["export"].as_str().unwrap().contains("TI  - Okänd bok"));

        let mut record = ResultRecord::ok(Fields::new());
        record.fields.insert("records".into(), JsonValue::Array(records()));
        Render::Export(ExportFormat::Json, EntryKind::Book).apply(&mut record, "");
        assert_eq!(record.fields["records"].as_array().unwrap().len(), 2);
        assert!(record.fields.get("export").is_none());
    }

    #[test]
    fn export_without_records_is_empty() {
        let mut record = ResultRecord::ok(Fields::new());
        Render::Export(ExportFormat::Bibtex, EntryKind::Book).apply(&mut record, "");
        assert_eq!(record.fields["count"], json!(0));
        assert_eq!(record.fields["export"], json!(""));
    }

    #[test]
    fn sparql_rows_keep_values() {
        let mut record = ResultRecord::ok(Fields::new());
        record.fields.insert(
            "rows".into(),
            json!([
                {"s": {"type": "uri", "value": "https://libris.kb.se/x"}, "n": {"type": "literal", "value": "3"}},
                {"s": {"type": "uri", "value": "https://libris.kb.se/y"}}
            ]),
        );
        Render::SparqlRows.apply(&mut record, "");
        assert_eq!(
            record.fields["rows"],
            json!([{"s": "https://libris.kb.se/x", "n": "3"}, {"s": "https://libris.kb.se/y"}])
        );
    }

    #[test]
    fn list_steps() {
        let mut record = ResultRecord::ok(Fields::new());
        record.fields.insert(
            "terms".into(),
            json!([
                {"value": "a", "count": "2"},
                {"value": "b", "count": 10},
                {"value": "c", "count": "5"}
            ]),
        );
        Render::SortDesc { field: "terms", key: "count" }.apply(&mut record, "");
        Render::Truncate { field: "terms", max: 2 }.apply(&mut record, "");
        assert_eq!(
            record.fields["terms"],
            json!([{"value": "b", "count": 10}, {"value": "c", "count": "5"}])
        );

        Render::Retain { field: "terms", key: "value", value: "c".into() }.apply(&mut record, "");
        assert_eq!(record.fields["terms"], json!([{"value": "c", "count": "5"}]));

        Render::Raw.apply(&mut record, "<xml/>");
        assert_eq!(record.raw.as_deref(), Some("<xml/>"));
    }

    #[test]
    fn exclude_and_set() {
        let mut record = ResultRecord::ok(Fields::new());
        record.fields.insert(
            "records".into(),
            json!([{"title": "Hemsöborna"}, {"title": "Inferno"}, {"creator": "Strindberg"}]),
        );
        Render::Exclude { field: "records", key: "title", value: "Hemsöborna".into() }
            .apply(&mut record, "");
        assert_eq!(
            record.fields["records"],
            json!([{"title": "Inferno"}, {"creator": "Strindberg"}])
        );

        Render::Set { field: "period", value: json!({"from_year": 800}) }.apply(&mut record, "");
        assert_eq!(record.fields["period"]["from_year"], json!(800));
    }
}
