//! Tool registry and dispatch.
//!
//! Every tool is a [`Binding`]: its MCP definition paired with a handler.
//! Network handlers validate arguments and return a [`Call`] (request,
//! extraction template, post-processing) which the registry executes through
//! the [`ApiClient`]. Local handlers compute their fields without I/O.
//!
//! Tools that consult several sources return [`Legs`]: named calls whose
//! records are nested under their names. A leg that fails is reported in its
//! own record and does not fail the others.
//!
//! The registry is the error boundary: whatever happens inside a call, the
//! caller gets a [`ResultRecord`].

pub mod combined;
pub mod export;
pub mod idkb;
pub mod kb_data;
pub mod ksamsok;
pub mod libris;
pub mod oaipmh;
pub mod sparql;
pub mod swepub;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::client::{ApiClient, RequestDescriptor};
use crate::convert::Args;
use crate::error::{McpError, Result};
use crate::normalize::{normalize, Template};
use crate::record::{Fields, ResultRecord};
use crate::render::Render;

/// A tool definition for the MCP tools/list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool name (e.g., "libris_search")
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonValue,
}

impl ToolDef {
    /// Create a new tool definition.
    pub fn new(name: &str, description: &str, input_schema: JsonValue) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// One upstream call, ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Outbound request.
    pub request: RequestDescriptor,
    /// How to read the response body.
    pub template: Template,
    /// Steps applied to the normalized record, in order.
    pub render: Vec<Render>,
}

impl Call {
    /// A call with no post-processing.
    pub fn new(request: RequestDescriptor, template: Template) -> Self {
        Self {
            request,
            template,
            render: Vec::new(),
        }
    }

    /// Append a post-processing step.
    pub fn then(mut self, step: Render) -> Self {
        self.render.push(step);
        self
    }
}

/// Named calls of a multi-source tool, executed in order.
pub type Legs = Vec<(&'static str, Call)>;

/// How a tool produces its result.
#[derive(Debug, Clone, Copy)]
pub enum Handler {
    /// Validate arguments and describe one upstream call.
    Fetch(fn(&Args) -> Result<Call>),
    /// Validate arguments and describe independent calls.
    Fan(fn(&Args) -> Result<Legs>),
    /// One call whose fields decide the calls that follow it.
    Follow(fn(&Args) -> Result<Call>, fn(&Args, &Fields) -> Result<Legs>),
    /// Compute fields locally.
    Local(fn(&Args) -> Result<Fields>),
}

/// One row of the tool table.
#[derive(Debug, Clone)]
pub struct Binding {
    /// MCP definition.
    pub def: ToolDef,
    /// Handler invoked by `tools/call`.
    pub handler: Handler,
}

impl Binding {
    /// Bind a network tool.
    pub fn fetch(def: ToolDef, build: fn(&Args) -> Result<Call>) -> Self {
        Self {
            def,
            handler: Handler::Fetch(build),
        }
    }

    /// Bind a tool that queries several sources independently.
    pub fn fan(def: ToolDef, plan: fn(&Args) -> Result<Legs>) -> Self {
        Self {
            def,
            handler: Handler::Fan(plan),
        }
    }

    /// Bind a tool whose first call seeds the ones after it.
    pub fn follow(
        def: ToolDef,
        seed: fn(&Args) -> Result<Call>,
        next: fn(&Args, &Fields) -> Result<Legs>,
    ) -> Self {
        Self {
            def,
            handler: Handler::Follow(seed, next),
        }
    }

    /// Bind a local tool.
    pub fn local(def: ToolDef, run: fn(&Args) -> Result<Fields>) -> Self {
        Self {
            def,
            handler: Handler::Local(run),
        }
    }
}

/// Registry of available MCP tools.
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
    handlers: HashMap<String, Handler>,
}

impl ToolRegistry {
    /// Create the registry with every KB tool.
    pub fn new() -> Self {
        let mut bindings = Vec::new();
        bindings.extend(libris::bindings());
        bindings.extend(ksamsok::bindings());
        bindings.extend(oaipmh::bindings());
        bindings.extend(kb_data::bindings());
        bindings.extend(swepub::bindings());
        bindings.extend(idkb::bindings());
        bindings.extend(sparql::bindings());
        bindings.extend(export::bindings());
        bindings.extend(combined::bindings());
        let registry = Self::from_bindings(bindings);
        info!(tools = registry.tools.len(), "tool registry ready");
        registry
    }

    /// Create a registry from an explicit table. Later duplicates replace
    /// earlier ones.
    pub fn from_bindings(bindings: Vec<Binding>) -> Self {
        let mut tools: Vec<ToolDef> = Vec::with_capacity(bindings.len());
        let mut handlers = HashMap::with_capacity(bindings.len());
        for Binding { def, handler } in bindings {
            if handlers.insert(def.name.clone(), handler).is_some() {
                tools.retain(|t| t.name != def.name);
            }
            tools.push(def);
        }
        Self { tools, handlers }
    }

    /// Get all tool definitions.
    pub fn tools(&self) -> &[ToolDef] {
        &self.tools
    }

    /// Whether `name` is a registered tool.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Call a tool. Never fails: errors are folded into the record.
    pub async fn call(&self, client: &ApiClient, name: &str, args: &Args) -> ResultRecord {
        match self.execute(client, name, args).await {
            Ok(record) => record,
            Err(err) => {
                let record = ResultRecord::from(err);
                debug!(
                    tool = name,
                    status = record.status.as_str(),
                    error = record.error.as_deref().unwrap_or_default(),
                    "tool call failed"
                );
                record
            }
        }
    }

    async fn execute(&self, client: &ApiClient, name: &str, args: &Args) -> Result<ResultRecord> {
        let handler = *self
            .handlers
            .get(name)
            .ok_or_else(|| McpError::UnknownTool(name.to_string()))?;

        match handler {
            Handler::Local(run) => Ok(ResultRecord::ok(run(args)?)),
            Handler::Fetch(build) => run_call(client, &build(args)?).await,
            Handler::Fan(plan) => {
                let legs = plan(args)?;
                let fields = run_legs(client, name, legs, Fields::new()).await?;
                Ok(ResultRecord::ok(fields))
            }
            Handler::Follow(seed, next) => {
                let first = run_call(client, &seed(args)?).await?;
                let legs = next(args, &first.fields)?;
                let fields = run_legs(client, name, legs, first.fields).await?;
                Ok(ResultRecord::ok(fields))
            }
        }
    }
}

async fn run_call(client: &ApiClient, call: &Call) -> Result<ResultRecord> {
    let response = client.send(&call.request).await?;
    let fields = normalize(&response.body, &response.content_type, &call.template)?;
    let mut record = ResultRecord::ok(fields);
    for step in &call.render {
        step.apply(&mut record, &response.body);
    }
    Ok(record)
}

/// Run each leg and nest its record under the leg name.
async fn run_legs(client: &ApiClient, tool: &str, legs: Legs, mut fields: Fields) -> Result<Fields> {
    for (leg, call) in legs {
        let record = match run_call(client, &call).await {
            Ok(record) => record,
            Err(err) => {
                warn!(tool, leg, error = %err, "source failed");
                ResultRecord::from(err)
            }
        };
        fields.insert(leg.to_string(), serde_json::to_value(record)?);
    }
    Ok(fields)
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper macro for creating JSON Schema for tool input parameters.
///
/// Each property is `"name": type`, optionally followed by `= "description"`.
#[macro_export]
macro_rules! schema {
    // Object with required and optional properties
    (object {
        required: { $($req_name:literal : $req_type:tt $(= $req_desc:literal)?),* $(,)? },
        optional: { $($opt_name:literal : $opt_type:tt $(= $opt_desc:literal)?),* $(,)? }
    }) => {{
        let mut required: Vec<&str> = Vec::new();
        $(required.push($req_name);)*

        let mut props = serde_json::Map::new();
        $(props.insert($req_name.to_string(), schema!(@prop $req_type $(, $req_desc)?));)*
        $(props.insert($opt_name.to_string(), schema!(@prop $opt_type $(, $opt_desc)?));)*

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": required
        })
    }};

    // Object with only required properties
    (object {
        required: { $($req_name:literal : $req_type:tt $(= $req_desc:literal)?),* $(,)? }
    }) => {
        schema!(object { required: { $($req_name : $req_type $(= $req_desc)?),* }, optional: {} })
    };

    // Object with only optional properties
    (object {
        optional: { $($opt_name:literal : $opt_type:tt $(= $opt_desc:literal)?),* $(,)? }
    }) => {
        schema!(object { required: {}, optional: { $($opt_name : $opt_type $(= $opt_desc)?),* } })
    };

    // Empty object (no parameters)
    (object {}) => {
        schema!(object { required: {}, optional: {} })
    };

    (@prop $t:tt) => { schema!(@type $t) };
    (@prop $t:tt, $desc:literal) => {{
        let mut prop = schema!(@type $t);
        prop["description"] = serde_json::json!($desc);
        prop
    }};

    // Type mappings
    (@type string) => { serde_json::json!({"type": "string"}) };
    (@type integer) => { serde_json::json!({"type": "integer"}) };
    (@type boolean) => { serde_json::json!({"type": "boolean"}) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::record::RecordStatus;
    use serde_json::json;
    use std::collections::HashSet;
    use std::time::Duration;

    fn offline_client() -> ApiClient {
        let mut config = ClientConfig::with_base_url("http://127.0.0.1:1").unwrap();
        config.timeout = Duration::from_millis(500);
        config.connect_timeout = Duration::from_millis(200);
        ApiClient::new(config).unwrap()
    }

    #[test]
    fn registry_has_every_tool_once() {
        let registry = ToolRegistry::new();
        let names: HashSet<&str> = registry.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(registry.tools().len(), 52);
        assert_eq!(names.len(), 52);
        for name in [
            "libris_search",
            "ksamsok_search",
            "oaipmh_list_records",
            "kb_data_get_item",
            "swepub_export",
            "idkb_list_vocab",
            "sparql_templates",
            "export_publication_list",
            "export_formats_info",
            "historical_periods_search",
            "swedish_counties_info",
            "combined_search",
            "quick_stats",
            "find_related_works",
        ] {
            assert!(registry.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn schemas_are_objects_with_declared_required_props() {
        for tool in ToolRegistry::new().tools() {
            let schema = &tool.input_schema;
            assert_eq!(schema["type"], "object", "{}", tool.name);
            let props = schema["properties"].as_object().unwrap();
            for req in schema["required"].as_array().unwrap() {
                assert!(props.contains_key(req.as_str().unwrap()), "{}", tool.name);
            }
            assert!(!tool.description.is_empty());
        }
    }

    #[test]
    fn schema_macro_attaches_descriptions() {
        let schema = schema!(object {
            required: { "query": string = "Search terms" },
            optional: { "limit": integer }
        });
        assert_eq!(schema["properties"]["query"]["description"], "Search terms");
        assert_eq!(schema["properties"]["limit"], json!({"type": "integer"}));
        assert_eq!(schema["required"], json!(["query"]));
        assert_eq!(schema!(object {})["required"], json!([]));
    }

    #[test]
    fn tool_def_serializes_input_schema_key() {
        let def = ToolDef::new("t", "d", schema!(object {}));
        let json = serde_json::to_value(&def).unwrap();
        assert!(json.get("inputSchema").is_some());
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_arguments_without_network() {
        let registry = ToolRegistry::new();
        let record = registry.call(&offline_client(), "libris_teleport", &Args::new()).await;
        assert_eq!(record.status, RecordStatus::InvalidArguments);
        assert!(record.fields.is_empty());
        assert!(record.error.unwrap().contains("libris_teleport"));
    }

    #[tokio::test]
    async fn bad_arguments_fail_before_the_request() {
        let registry = ToolRegistry::new();
        let args = json!({"query": "Strindberg", "limit": 5000}).as_object().cloned().unwrap();
        let record = registry.call(&offline_client(), "libris_search", &args).await;
        assert_eq!(record.status, RecordStatus::InvalidArguments);
    }

    #[tokio::test]
    async fn unreachable_upstream_is_upstream_error() {
        let registry = ToolRegistry::new();
        let args = json!({"query": "Strindberg"}).as_object().cloned().unwrap();
        let record = registry.call(&offline_client(), "libris_search", &args).await;
        assert_eq!(record.status, RecordStatus::UpstreamError);
        assert!(record.raw.is_none());
        assert!(record.fields.is_empty());
    }

    #[tokio::test]
    async fn local_tools_need_no_network() {
        let registry = ToolRegistry::new();
        let args = json!({"category": "books"}).as_object().cloned().unwrap();
        let record = registry.call(&offline_client(), "sparql_templates", &args).await;
        assert!(record.is_ok());
        assert_eq!(record.fields["templates"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_legs_are_nested_records() {
        let registry = ToolRegistry::new();
        let record = registry.call(&offline_client(), "quick_stats", &Args::new()).await;
        assert!(record.is_ok());
        for leg in ["libris", "ksamsok", "swepub", "idkb"] {
            assert_eq!(record.fields[leg]["status"], "upstream-error", "{}", leg);
            assert_eq!(record.fields[leg]["fields"], json!({}));
        }
    }

    #[tokio::test]
    async fn follow_stops_when_the_seed_fails() {
        let registry = ToolRegistry::new();
        let args = json!({"title": "Röda rummet"}).as_object().cloned().unwrap();
        let record = registry.call(&offline_client(), "find_related_works", &args).await;
        assert_eq!(record.status, RecordStatus::UpstreamError);
        assert!(record.fields.is_empty());
    }

    #[test]
    fn later_bindings_replace_earlier_ones() {
        fn empty(_: &Args) -> Result<Fields> {
            Ok(Fields::new())
        }
        let registry = ToolRegistry::from_bindings(vec![
            Binding::local(ToolDef::new("a", "first", schema!(object {})), empty),
            Binding::local(ToolDef::new("a", "second", schema!(object {})), empty),
        ]);
        assert_eq!(registry.tools().len(), 1);
        assert_eq!(registry.tools()[0].description, "second");
    }
}
