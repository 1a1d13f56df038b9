//! Client configuration and the fixed upstream endpoint table.

use std::time::Duration;

use url::Url;

use crate::error::Result;

/// Default User-Agent sent to every upstream service.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "kb-mcp/",
    env!("CARGO_PKG_VERSION"),
    " (Model Context Protocol; Swedish National Library APIs)"
);

/// One of the upstream services this server fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Libris Xsearch (JSON search API)
    LibrisXsearch,
    /// Libris XL REST (JSON-LD records and `/find`)
    LibrisXl,
    /// Libris OAI-PMH
    LibrisOaiPmh,
    /// Libris SPARQL endpoint
    LibrisSparql,
    /// K-samsök (Swedish Open Cultural Heritage)
    Ksamsok,
    /// data.kb.se digitized collections
    KbData,
    /// Swepub research publications (served through Xsearch)
    Swepub,
    /// id.kb.se vocabularies and authorities
    IdKb,
}

impl Endpoint {
    /// Every endpoint, in table order.
    pub const ALL: [Endpoint; 8] = [
        Endpoint::LibrisXsearch,
        Endpoint::LibrisXl,
        Endpoint::LibrisOaiPmh,
        Endpoint::LibrisSparql,
        Endpoint::Ksamsok,
        Endpoint::KbData,
        Endpoint::Swepub,
        Endpoint::IdKb,
    ];

    /// Public base URL of the service.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Endpoint::LibrisXsearch => "https://libris.kb.se/xsearch",
            Endpoint::LibrisXl => "https://libris.kb.se",
            Endpoint::LibrisOaiPmh => "https://libris.kb.se/api/oaipmh/",
            Endpoint::LibrisSparql => "https://libris.kb.se/api/sparql/",
            Endpoint::Ksamsok => "https://kulturarvsdata.se/ksamsok/api",
            Endpoint::KbData => "https://data.kb.se",
            Endpoint::Swepub => "https://libris.kb.se/xsearch",
            Endpoint::IdKb => "https://id.kb.se",
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::LibrisXsearch => "libris_xsearch",
            Endpoint::LibrisXl => "libris_xl",
            Endpoint::LibrisOaiPmh => "libris_oaipmh",
            Endpoint::LibrisSparql => "libris_sparql",
            Endpoint::Ksamsok => "ksamsok",
            Endpoint::KbData => "kb_data",
            Endpoint::Swepub => "swepub",
            Endpoint::IdKb => "idkb",
        }
    }
}

/// Base URL overrides for each [`Endpoint`].
#[derive(Debug, Clone, Default)]
pub struct Endpoints {
    urls: Vec<(Endpoint, Url)>,
}

impl Endpoints {
    /// Override the base URL of one endpoint.
    pub fn set(&mut self, endpoint: Endpoint, base_url: &str) -> Result<()> {
        let url = Url::parse(base_url)?;
        match self.urls.iter_mut().find(|(e, _)| *e == endpoint) {
            Some(slot) => slot.1 = url,
            None => self.urls.push((endpoint, url)),
        }
        Ok(())
    }

    /// Point every endpoint at the same base URL. Used against mock servers.
    pub fn all_at(base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url)?;
        Ok(Self {
            urls: Endpoint::ALL.iter().map(|e| (*e, url.clone())).collect(),
        })
    }

    /// Base URL of `endpoint`, falling back to the public default.
    pub fn base_url(&self, endpoint: Endpoint) -> Result<Url> {
        match self.urls.iter().find(|(e, _)| *e == endpoint) {
            Some((_, url)) => Ok(url.clone()),
            None => Ok(Url::parse(endpoint.default_base_url())?),
        }
    }
}

/// Configuration for [`crate::ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Total request timeout.
    pub timeout: Duration,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
    /// Upstream base URLs.
    pub endpoints: Endpoints,
}

impl ClientConfig {
    /// Configuration with every endpoint redirected to `base_url`.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            endpoints: Endpoints::all_at(base_url)?,
            ..Self::default()
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            endpoints: Endpoints::default(),
        }
    }
}
