use std::fmt;
use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde_json::Value;
use thiserror::Error;

pub const COINGECKO_ADDRESS: &str = "https://api.coingecko.com/api/v3/";

/// Longest slice of an upstream error body echoed back to the client
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("invalid target URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request to upstream failed")]
    Request(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("upstream response is not valid JSON")]
    InvalidJson(#[source] serde_json::Error),
}

/// Where a request is proxied to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A route relative to the CoinGecko API base, e.g. `simple/price`
    CoinGecko(String),
    /// A full http(s) URL
    Any(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::CoinGecko(route) => write!(f, "coingecko:{route}"),
            Target::Any(url) => write!(f, "{url}"),
        }
    }
}

/// Restores `scheme://` when an intermediary collapsed `//` in the request path
fn repair_scheme(raw: &str) -> String {
    for scheme in ["https:/", "http:/"] {
        if let Some(rest) = raw.strip_prefix(scheme) {
            if !rest.starts_with('/') {
                return format!("{scheme}/{rest}");
            }
        }
    }
    raw.to_owned()
}

fn parse_http_url(raw: &str) -> Result<Url, UpstreamError> {
    let invalid = |reason: String| UpstreamError::InvalidUrl {
        url: raw.to_owned(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

/// HTTP client for upstream JSON APIs
#[derive(Debug, Clone)]
pub struct Upstream {
    client: reqwest::Client,
    coingecko: Url,
}

impl Upstream {
    pub fn new(coingecko_url: &str, timeout: Duration) -> Result<Upstream, UpstreamError> {
        let mut coingecko = parse_http_url(coingecko_url)?;
        if !coingecko.path().ends_with('/') {
            let path = format!("{}/", coingecko.path());
            coingecko.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Upstream { client, coingecko })
    }

    pub fn resolve(&self, target: &Target) -> Result<Url, UpstreamError> {
        match target {
            Target::CoinGecko(route) => self.coingecko_url(route),
            Target::Any(url) => parse_http_url(&repair_scheme(url)),
        }
    }

    /// Appends `route` segment by segment below the base path, so a route
    /// can never climb out of it
    fn coingecko_url(&self, route: &str) -> Result<Url, UpstreamError> {
        let invalid = |reason: &str| UpstreamError::InvalidUrl {
            url: route.to_owned(),
            reason: reason.to_owned(),
        };
        let (path, query) = match route.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (route, None),
        };
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.iter().any(|s| is_dot_segment(s)) {
            return Err(invalid("dot segments are not allowed in a route"));
        }

        let mut url = self.coingecko.clone();
        url.path_segments_mut()
            .map_err(|()| invalid("base address cannot hold a path"))?
            .pop_if_empty()
            .extend(segments);
        url.set_query(query);
        Ok(url)
    }

    /// GETs `target` with `params` appended to its query and decodes the body
    pub async fn fetch_json(
        &self,
        target: &Target,
        params: &[(String, String)],
    ) -> Result<Value, UpstreamError> {
        let url = self.resolve(target)?;
        log::info!("GET {url} ({} forwarded params)", params.len());

        let response = self.client.get(url).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("upstream {target} returned {status}");
            return Err(UpstreamError::Status {
                status,
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(UpstreamError::InvalidJson)
    }
}

/// `.` or `..`, also in the percent-encoded spellings URL parsers honour
fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().replace("%2e", ".").as_str(),
        "." | ".."
    )
}
