//! kb-mcp binary: serves the KB tools over stdio.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kb_mcp::{ApiClient, ClientConfig, Endpoint, McpServer, Result, ToolRegistry};

/// MCP server for the Swedish National Library's open data APIs.
#[derive(Parser, Debug)]
#[command(name = "kb-mcp", version, about)]
struct Cli {
    /// Total HTTP request timeout, in seconds.
    #[arg(long, env = "KB_HTTP_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// HTTP connect timeout, in seconds.
    #[arg(long, env = "KB_CONNECT_TIMEOUT", default_value_t = 10)]
    connect_timeout: u64,

    /// User-Agent sent upstream.
    #[arg(long, env = "KB_USER_AGENT")]
    user_agent: Option<String>,

    /// Log filter, e.g. "info" or "kb_mcp=debug". Logs go to stderr.
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    /// Libris Xsearch base URL.
    #[arg(long, env = "KB_LIBRIS_XSEARCH_URL")]
    libris_xsearch_url: Option<String>,

    /// Libris XL base URL.
    #[arg(long, env = "KB_LIBRIS_XL_URL")]
    libris_xl_url: Option<String>,

    /// Libris OAI-PMH base URL.
    #[arg(long, env = "KB_OAIPMH_URL")]
    oaipmh_url: Option<String>,

    /// Libris SPARQL base URL.
    #[arg(long, env = "KB_SPARQL_URL")]
    sparql_url: Option<String>,

    /// K-samsök base URL.
    #[arg(long, env = "KB_KSAMSOK_URL")]
    ksamsok_url: Option<String>,

    /// data.kb.se base URL.
    #[arg(long, env = "KB_DATA_URL")]
    kb_data_url: Option<String>,

    /// Swepub base URL.
    #[arg(long, env = "KB_SWEPUB_URL")]
    swepub_url: Option<String>,

    /// id.kb.se base URL.
    #[arg(long, env = "KB_IDKB_URL")]
    idkb_url: Option<String>,
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig {
            timeout: Duration::from_secs(self.timeout),
            connect_timeout: Duration::from_secs(self.connect_timeout),
            ..ClientConfig::default()
        };
        if let Some(ua) = &self.user_agent {
            config.user_agent = ua.clone();
        }

        let overrides = [
            (Endpoint::LibrisXsearch, &self.libris_xsearch_url),
            (Endpoint::LibrisXl, &self.libris_xl_url),
            (Endpoint::LibrisOaiPmh, &self.oaipmh_url),
            (Endpoint::LibrisSparql, &self.sparql_url),
            (Endpoint::Ksamsok, &self.ksamsok_url),
            (Endpoint::KbData, &self.kb_data_url),
            (Endpoint::Swepub, &self.swepub_url),
            (Endpoint::IdKb, &self.idkb_url),
        ];
        for (endpoint, url) in overrides {
            if let Some(url) = url {
                config.endpoints.set(endpoint, url)?;
                info!(endpoint = endpoint.name(), url = %url, "base URL override");
            }
        }
        Ok(config)
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = ApiClient::new(cli.client_config()?)?;
    let server = McpServer::new(ToolRegistry::new(), client);
    server.run().await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries JSON-RPC only
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "kb-mcp starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal");
            ExitCode::FAILURE
        }
    }
}
