//! Scopus Author Retrieval client.
//!
//! Coauthor enrichment resolves bare Scopus author ids into an indexed name
//! and the author's current affiliations. One request per id, no retries:
//! a 404 means the id does not resolve, any other failure aborts the run.

mod parser;

use academiccv_shared::{AuthorLookup, AuthorProfile, CvError, Result, ScopusConfig};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};
use url::Url;

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("academiccv/", env!("CARGO_PKG_VERSION"));

/// Header carrying the Elsevier API key.
const API_KEY_HEADER: &str = "X-ELS-APIKey";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Connection settings for [`ScopusClient`].
#[derive(Debug, Clone)]
pub struct ScopusOptions {
    /// API origin, e.g. `https://api.elsevier.com`.
    pub base_url: String,
    /// Elsevier API key.
    pub api_key: String,
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
}

impl ScopusOptions {
    /// Build options from the `[scopus]` config section and a resolved key.
    pub fn from_config(config: &ScopusConfig, api_key: String) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout_secs: config.timeout_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for `GET /content/author/author_id/{id}`.
pub struct ScopusClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl ScopusClient {
    /// Create a client with the given options.
    pub fn new(opts: &ScopusOptions) -> Result<Self> {
        let base_url = Url::parse(&opts.base_url).map_err(|e| {
            CvError::config(format!("invalid scopus base_url '{}': {e}", opts.base_url))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| CvError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_key: opts.api_key.clone(),
        })
    }

    /// Retrieve one author's profile.
    ///
    /// Ids that are not purely alphanumeric never reach the API and come
    /// back unresolved, as does a 404.
    #[instrument(skip(self))]
    pub async fn retrieve_author(&self, author_id: &str) -> Result<AuthorProfile> {
        if author_id.is_empty() || !author_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            warn!(author_id, "skipping malformed author id");
            return Ok(AuthorProfile::default());
        }

        let url = format!(
            "{}/content/author/author_id/{author_id}",
            self.base_url.as_str().trim_end_matches('/')
        );
        debug!(%url, "retrieving author");

        let response = self
            .client
            .get(&url)
            .query(&[("view", "ENHANCED")])
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| CvError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(author_id, "author id not found");
            return Ok(AuthorProfile::default());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(CvError::Network(format!("{url}: HTTP {status}: {snippet}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CvError::Network(format!("{url}: failed to read body: {e}")))?;

        parser::parse_author_response(&body)
    }
}

impl AuthorLookup for ScopusClient {
    async fn lookup(&self, author_id: &str) -> Result<AuthorProfile> {
        self.retrieve_author(author_id).await
    }
}
