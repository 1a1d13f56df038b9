//! Response normalization.
//!
//! Turns a raw JSON or XML body into a flat [`Fields`] mapping according to a
//! declarative [`Template`].
//!
//! Selector syntax:
//!
//! - JSON: dot-separated keys. A numeric segment indexes an array, `*` fans
//!   out over an array, and a key segment applied to an array is applied to
//!   every element. A `?` prefix (`?mainEntity`, `?1`) descends into the key
//!   or array index when present and stays on the current value otherwise.
//! - XML: `/`-separated element local names, each matched among the
//!   descendants of the previous step (namespaces are ignored). A final
//!   `@name` segment reads an attribute instead of text. An empty path
//!   selects the context element.

use roxmltree::{Document, Node};
use serde_json::Value as JsonValue;

use crate::error::{McpError, Result};
use crate::record::Fields;

/// How the body is expected to be encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    /// JSON or JSON-LD
    Json,
    /// XML
    Xml,
    /// Decide from the content type, then from the first byte.
    Detect,
    /// Opaque text. Nothing is parsed or extracted.
    Text,
}

/// What to produce from the nodes a selector matches.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// First non-null value, as string or number.
    Scalar,
    /// First value that reads as a number.
    Number,
    /// Every value, as a list of strings.
    List,
    /// Number of matches. Never missing.
    Count,
    /// One sub-mapping per match, extracted with nested specs.
    Group(Vec<FieldSpec>),
    /// First match verbatim (JSON value, or XML source fragment).
    Raw,
}

/// One entry of an extraction template.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Output field name.
    pub name: String,
    /// Path into the body.
    pub selector: String,
    /// Absent required fields make the whole response malformed.
    pub required: bool,
    /// Output shape.
    pub shape: Shape,
}

impl FieldSpec {
    fn new(name: &str, selector: &str, shape: Shape) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            required: false,
            shape,
        }
    }

    /// Optional scalar field.
    pub fn scalar(name: &str, selector: &str) -> Self {
        Self::new(name, selector, Shape::Scalar)
    }

    /// Optional numeric field.
    pub fn number(name: &str, selector: &str) -> Self {
        Self::new(name, selector, Shape::Number)
    }

    /// Optional list-of-strings field.
    pub fn list(name: &str, selector: &str) -> Self {
        Self::new(name, selector, Shape::List)
    }

    /// Match count.
    pub fn count(name: &str, selector: &str) -> Self {
        Self::new(name, selector, Shape::Count)
    }

    /// Optional list of sub-records.
    pub fn group(name: &str, selector: &str, fields: Vec<FieldSpec>) -> Self {
        Self::new(name, selector, Shape::Group(fields))
    }

    /// Optional verbatim field.
    pub fn raw(name: &str, selector: &str) -> Self {
        Self::new(name, selector, Shape::Raw)
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Declared body format plus the fields to pull out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Expected encoding.
    pub format: BodyFormat,
    /// Fields to extract, in output order.
    pub fields: Vec<FieldSpec>,
}

impl Template {
    /// JSON template.
    pub fn json(fields: Vec<FieldSpec>) -> Self {
        Self {
            format: BodyFormat::Json,
            fields,
        }
    }

    /// XML template.
    pub fn xml(fields: Vec<FieldSpec>) -> Self {
        Self {
            format: BodyFormat::Xml,
            fields,
        }
    }

    /// Template whose format is decided per response.
    pub fn detect(fields: Vec<FieldSpec>) -> Self {
        Self {
            format: BodyFormat::Detect,
            fields,
        }
    }

    /// Template for bodies that are passed through unparsed.
    pub fn text() -> Self {
        Self {
            format: BodyFormat::Text,
            fields: Vec::new(),
        }
    }

    /// Scalar, optional fields from `(name, selector)` pairs.
    pub fn from_pairs(format: BodyFormat, pairs: &[(&str, &str)]) -> Self {
        Self {
            format,
            fields: pairs
                .iter()
                .map(|(name, selector)| FieldSpec::scalar(name, selector))
                .collect(),
        }
    }
}

#[derive(Clone, Copy)]
enum Parsed {
    Json,
    Xml,
    Text,
}

/// Extract the fields of `template` from `body`.
///
/// Returns [`McpError::Malformed`] when the body does not parse as the
/// declared format or a required field is absent. A [`BodyFormat::Text`]
/// template yields no fields.
pub fn normalize(body: &str, content_type: &str, template: &Template) -> Result<Fields> {
    match resolve_format(template.format, content_type, body)? {
        Parsed::Text => Ok(Fields::new()),
        Parsed::Json => {
            let root: JsonValue = serde_json::from_str(body)
                .map_err(|e| McpError::Malformed(format!("invalid JSON: {}", e)))?;
            extract_json(&root, &template.fields)
        }
        Parsed::Xml => {
            let doc = Document::parse(body)
                .map_err(|e| McpError::Malformed(format!("invalid XML: {}", e)))?;
            extract_xml(doc.root(), &template.fields)
        }
    }
}

fn resolve_format(declared: BodyFormat, content_type: &str, body: &str) -> Result<Parsed> {
    match declared {
        BodyFormat::Json => return Ok(Parsed::Json),
        BodyFormat::Xml => return Ok(Parsed::Xml),
        BodyFormat::Text => return Ok(Parsed::Text),
        BodyFormat::Detect => {}
    }

    let ct = content_type.to_ascii_lowercase();
    if ct.contains("json") {
        return Ok(Parsed::Json);
    }
    if ct.contains("xml") {
        return Ok(Parsed::Xml);
    }
    match body.trim_start().chars().next() {
        Some('<') => Ok(Parsed::Xml),
        Some('{') | Some('[') => Ok(Parsed::Json),
        _ => Err(McpError::Malformed(format!(
            "cannot determine body format (content type '{}')",
            content_type
        ))),
    }
}

fn store(out: &mut Fields, spec: &FieldSpec, value: Option<JsonValue>) -> Result<()> {
    match value {
        Some(v) => {
            out.insert(spec.name.clone(), v);
            Ok(())
        }
        None if spec.required => Err(McpError::Malformed(format!(
            "required field '{}' not found at '{}'",
            spec.name, spec.selector
        ))),
        None => Ok(()),
    }
}

// ── JSON ─────────────────────────────────────────────────────────────────

fn extract_json(root: &JsonValue, specs: &[FieldSpec]) -> Result<Fields> {
    let mut out = Fields::new();
    for spec in specs {
        let matches = select_json(root, &spec.selector);
        let value = match &spec.shape {
            Shape::Scalar => matches.iter().find_map(|v| json_scalar(v)),
            Shape::Number => matches.iter().find_map(|v| json_number(v)),
            Shape::List => {
                let items: Vec<JsonValue> = matches
                    .iter()
                    .flat_map(|v| flatten(v))
                    .filter_map(json_string)
                    .map(JsonValue::String)
                    .collect();
                (!items.is_empty()).then_some(JsonValue::Array(items))
            }
            Shape::Count => {
                let n: usize = matches.iter().map(|v| flatten(v).len()).sum();
                Some(JsonValue::from(n))
            }
            Shape::Group(sub) => {
                let mut rows = Vec::new();
                for item in matches.iter().flat_map(|v| flatten(v)) {
                    let row = extract_json(item, sub)?;
                    if !row.is_empty() {
                        rows.push(JsonValue::Object(row));
                    }
                }
                (!rows.is_empty()).then_some(JsonValue::Array(rows))
            }
            Shape::Raw => matches.iter().find(|v| !v.is_null()).map(|v| (*v).clone()),
        };
        store(&mut out, spec, value)?;
    }
    Ok(out)
}

fn select_json<'a>(root: &'a JsonValue, selector: &str) -> Vec<&'a JsonValue> {
    let mut current = vec![root];
    for segment in selector.split('.').filter(|s| !s.is_empty()) {
        let mut next = Vec::new();
        for value in current {
            step_json(value, segment, &mut next);
        }
        current = next;
    }
    current
}

fn step_json<'a>(value: &'a JsonValue, segment: &str, out: &mut Vec<&'a JsonValue>) {
    if segment == "*" {
        if let JsonValue::Array(items) = value {
            out.extend(items.iter());
        }
        return;
    }

    if let Some(key) = segment.strip_prefix('?') {
        let inner = match (value, key.parse::<usize>()) {
            (JsonValue::Array(items), Ok(index)) => items.get(index),
            _ => value.get(key),
        };
        match inner {
            Some(inner) if !inner.is_null() => out.push(inner),
            _ => out.push(value),
        }
        return;
    }

    match value {
        JsonValue::Array(items) => {
            if let Ok(index) = segment.parse::<usize>() {
                if let Some(item) = items.get(index) {
                    out.push(item);
                }
            } else {
                for item in items {
                    step_json(item, segment, out);
                }
            }
        }
        JsonValue::Object(map) => {
            if let Some(inner) = map.get(segment) {
                out.push(inner);
            }
        }
        _ => {}
    }
}

fn flatten(value: &JsonValue) -> Vec<&JsonValue> {
    match value {
        JsonValue::Array(items) => items.iter().filter(|v| !v.is_null()).collect(),
        JsonValue::Null => Vec::new(),
        other => vec![other],
    }
}

fn json_scalar(value: &JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(_) | JsonValue::Number(_) => Some(value.clone()),
        JsonValue::Bool(b) => Some(JsonValue::String(b.to_string())),
        JsonValue::Array(items) => items.iter().find_map(json_scalar),
        JsonValue::Object(_) => json_string(value).map(JsonValue::String),
    }
}

fn json_number(value: &JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::Number(_) => Some(value.clone()),
        JsonValue::String(s) => parse_number(s),
        JsonValue::Array(items) => items.iter().find_map(json_number),
        _ => None,
    }
}

fn json_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Array(_) => Some(value.to_string()),
        // Linked-data nodes are best named by their identifier
        JsonValue::Object(map) => match map.get("@id").and_then(|v| v.as_str()) {
            Some(id) => Some(id.to_string()),
            None => Some(value.to_string()),
        },
    }
}

fn parse_number(text: &str) -> Option<JsonValue> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(JsonValue::from(i));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(JsonValue::Number)
}

// ── XML ──────────────────────────────────────────────────────────────────

struct XmlSelector<'s> {
    path: Vec<&'s str>,
    attribute: Option<&'s str>,
}

impl<'s> XmlSelector<'s> {
    fn parse(selector: &'s str) -> Self {
        let mut path: Vec<&str> = selector.split('/').filter(|s| !s.is_empty()).collect();
        let attribute = path.last().copied().and_then(|last| last.strip_prefix('@'));
        if attribute.is_some() {
            path.pop();
        }
        Self { path, attribute }
    }
}

fn extract_xml(context: Node<'_, '_>, specs: &[FieldSpec]) -> Result<Fields> {
    let mut out = Fields::new();
    for spec in specs {
        let selector = XmlSelector::parse(&spec.selector);
        let nodes = select_xml(context, &selector.path);
        let read = |node: &Node<'_, '_>| match selector.attribute {
            Some(attr) => xml_attribute(node, attr),
            None => xml_text(node),
        };

        let value = match &spec.shape {
            Shape::Scalar => nodes.iter().find_map(read).map(JsonValue::String),
            Shape::Number => nodes.iter().filter_map(read).find_map(|s| parse_number(&s)),
            Shape::List => {
                let items: Vec<JsonValue> =
                    nodes.iter().filter_map(read).map(JsonValue::String).collect();
                (!items.is_empty()).then_some(JsonValue::Array(items))
            }
            Shape::Count => Some(JsonValue::from(nodes.len())),
            Shape::Group(sub) => {
                let mut rows = Vec::new();
                for node in &nodes {
                    let row = extract_xml(*node, sub)?;
                    if !row.is_empty() {
                        rows.push(JsonValue::Object(row));
                    }
                }
                (!rows.is_empty()).then_some(JsonValue::Array(rows))
            }
            Shape::Raw => nodes.first().map(|node| match selector.attribute {
                Some(attr) => JsonValue::String(xml_attribute(node, attr).unwrap_or_default()),
                None => {
                    let source = node.document().input_text();
                    JsonValue::String(source[node.range()].to_string())
                }
            }),
        };
        store(&mut out, spec, value)?;
    }
    Ok(out)
}

fn select_xml<'a, 'input>(context: Node<'a, 'input>, path: &[&str]) -> Vec<Node<'a, 'input>> {
    let mut current = vec![context];
    for name in path {
        let mut next: Vec<Node<'a, 'input>> = Vec::new();
        for node in &current {
            for found in node
                .descendants()
                .skip(1)
                .filter(|d| d.is_element() && d.tag_name().name() == *name)
            {
                if !next.iter().any(|n| n.id() == found.id()) {
                    next.push(found);
                }
            }
        }
        current = next;
    }
    current
}

fn xml_text(node: &Node<'_, '_>) -> Option<String> {
    let text: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn xml_attribute(node: &Node<'_, '_>, name: &str) -> Option<String> {
    node.attributes()
        .find(|a| a.name() == name)
        .map(|a| a.value().to_string())
}
