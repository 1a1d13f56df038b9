//! Outbound HTTP client.
//!
//! One [`RequestDescriptor`] in, one [`RawResponse`] out. There is no retry,
//! backoff, or caching layer: a failed call is reported once as
//! [`McpError::Upstream`] and the caller decides what to do with it.

use reqwest::header;
use tracing::{debug, warn};
use url::Url;

use crate::config::{ClientConfig, Endpoint, Endpoints};
use crate::error::{McpError, Result};

/// Accept header for plain JSON APIs.
pub const ACCEPT_JSON: &str = "application/json";
/// Accept header for JSON-LD resources (Libris XL, id.kb.se, data.kb.se).
pub const ACCEPT_JSON_LD: &str = "application/ld+json";
/// Accept header for XML APIs (K-samsök, OAI-PMH).
pub const ACCEPT_XML: &str = "application/xml";
/// Accept header for SPARQL SELECT results.
pub const ACCEPT_SPARQL_JSON: &str = "application/sparql-results+json";

/// HTTP method of an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Parameters travel in the query string.
    Get,
    /// Parameters travel as an urlencoded form body.
    Post,
}

/// Everything needed to issue one upstream call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// Which service to call.
    pub endpoint: Endpoint,
    /// Path appended to the endpoint's base URL; empty for the base itself.
    pub path: String,
    /// Parameters, in the order they will be sent.
    pub params: Vec<(String, String)>,
    /// GET or POST.
    pub method: Method,
    /// Value of the Accept header.
    pub accept: &'static str,
}

impl RequestDescriptor {
    /// A GET against `endpoint` with no path and no parameters.
    pub fn get(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            path: String::new(),
            params: Vec::new(),
            method: Method::Get,
            accept: ACCEPT_JSON,
        }
    }

    /// A POST against `endpoint` with no path and no parameters.
    pub fn post(endpoint: Endpoint) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(endpoint)
        }
    }

    /// Set the path below the base URL.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Append one parameter.
    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    /// Append one parameter if `value` is present.
    pub fn param_opt(self, name: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.param(name, v),
            None => self,
        }
    }

    /// Set the Accept header.
    pub fn accept(mut self, accept: &'static str) -> Self {
        self.accept = accept;
        self
    }

    /// Look up a parameter value by name.
    pub fn param_value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Final URL of the request. GET parameters are encoded into the query
    /// string; POST parameters are not.
    pub fn url(&self, endpoints: &Endpoints) -> Result<Url> {
        let base = endpoints.base_url(self.endpoint)?;
        let mut url = join_path(&base, &self.path)?;
        if self.method == Method::Get && !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(self.params.iter());
        }
        Ok(url)
    }
}

fn join_path(base: &Url, path: &str) -> Result<Url> {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return Ok(base.clone());
    }
    let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), path);
    Ok(Url::parse(&joined)?)
}

/// Response from an upstream service.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Body decoded as text.
    pub body: String,
    /// Content-Type header, empty when absent.
    pub content_type: String,
}

/// Thin wrapper over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Build a client from `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| McpError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    /// Active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Issue the request once.
    ///
    /// Network failures, timeouts and non-2xx statuses all come back as
    /// [`McpError::Upstream`]; the body of a failed response is discarded.
    pub async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse> {
        let url = request.url(&self.config.endpoints)?;
        debug!(
            endpoint = request.endpoint.name(),
            method = ?request.method,
            url = %url,
            "upstream request"
        );

        let builder = match request.method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url).form(&request.params),
        };

        let response = builder
            .header(header::ACCEPT, request.accept)
            .send()
            .await
            .map_err(|e| {
                warn!(endpoint = request.endpoint.name(), error = %e, "upstream call failed");
                McpError::from(e)
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !status.is_success() {
            warn!(
                endpoint = request.endpoint.name(),
                status = status.as_u16(),
                "upstream returned error status"
            );
            return Err(McpError::Upstream {
                status: Some(status.as_u16()),
                message: status_message(status.as_u16()),
            });
        }

        let body = response.text().await?;
        Ok(RawResponse {
            status_code: status.as_u16(),
            body,
            content_type,
        })
    }
}

/// Caller-facing description of an upstream HTTP status.
fn status_message(status: u16) -> String {
    let text = match status {
        400 => "invalid parameters, check the query",
        401 => "authentication required",
        403 => "access denied",
        404 => "resource not found, check the identifier",
        429 => "too many requests, try again shortly",
        500 => "upstream server error",
        502 => "bad gateway, upstream temporarily unavailable",
        503 => "service temporarily unavailable",
        504 => "upstream gateway timeout, try a simpler query",
        _ => return format!("HTTP {}", status),
    };
    format!("HTTP {}: {}", status, text)
}
