use std::time::Duration;

use axum::body::Bytes;
use reqwest::{redirect, Client, Url};
use tracing::{error, info, warn};

use crate::error::{ProxyError, INVALID_URL_MESSAGE, MISSING_URL_MESSAGE};

pub const USER_AGENT: &str = "RssProxy/1.0 (Feed Proxy)";
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_REDIRECTS: usize = 5;

/// Fetches a single feed on behalf of a browser client.
///
/// Every call is one outbound GET; nothing is cached or retried.
pub struct FeedProxy {
    client: Client,
}

impl FeedProxy {
    pub fn new() -> reqwest::Result<Self> {
        Self::with_limits(FETCH_TIMEOUT, MAX_REDIRECTS)
    }

    pub fn with_limits(timeout: Duration, max_redirects: usize) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::limited(max_redirects))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    pub async fn fetch_feed(&self, source_url: Option<&str>) -> Result<Bytes, ProxyError> {
        let url = validate_source_url(source_url)?;
        info!("Proxying feed request: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let status_text = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_str().to_string());
            warn!("Upstream {} answered {}", url, status);
            return Err(ProxyError::Upstream {
                status,
                status_text,
            });
        }

        response.bytes().await.map_err(|e| classify(&url, e))
    }
}

/// Checks the `url` parameter. Any scheme the URL parser accepts gets
/// through; non-HTTP schemes only fail once the fetch is attempted.
pub fn validate_source_url(source_url: Option<&str>) -> Result<Url, ProxyError> {
    let trimmed = source_url.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(ProxyError::BadRequest(MISSING_URL_MESSAGE));
    }

    Url::parse(trimmed).map_err(|_| ProxyError::BadRequest(INVALID_URL_MESSAGE))
}

fn classify(url: &Url, err: reqwest::Error) -> ProxyError {
    if err.is_timeout()
        || err.is_connect()
        || err.is_redirect()
        || err.is_request()
        || err.is_body()
        || err.is_decode()
    {
        warn!("Feed {} unreachable: {}", url, err);
        ProxyError::Unreachable(err)
    } else {
        error!("Failed to fetch feed {}: {}", url, err);
        ProxyError::Internal(err)
    }
}
