//! One-shot page fetcher with safe logging.
//!
//! - A single GET per URL with a fixed user agent and a bounded timeout
//! - Redirects followed by default (reqwest's policy, 10 hops), or not at all
//! - Non-2xx bodies are still returned unless `fail_on_status` is set
//! - No retries: a failed fetch is reported once and left to the caller
//! - Optional *raw* request/response logging via `TAGSIFT_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), tagsift_http::HttpError> {
//! use tagsift_http::{FetchOpts, Fetcher, HttpFetcher};
//!
//! let fetcher = HttpFetcher::new(FetchOpts::default())?;
//! let url = url::Url::parse("https://example.com/").unwrap();
//! let page = fetcher.fetch(&url).await?;
//! println!("{} bytes, status {}", page.body.len(), page.status);
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (trace), non-success statuses and
//! failures, plus raw lines (target `http.raw`) when `TAGSIFT_HTTP_RAW=1`.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client, redirect};
use std::env;
use std::error::Error as _;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub use reqwest::StatusCode;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "CyberResearchBot/1.0 (Academic project)";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "TAGSIFT_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)
const SNIPPET_MAX: usize = 500;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Render a best-effort curl command for repro/debug.
fn make_curl(url: &Url, opts: &FetchOpts) -> String {
    let mut parts = vec!["curl".to_string()];
    if opts.follow_redirects {
        parts.push("-L".into());
    }
    parts.push(format!("--max-time {}", opts.timeout.as_secs_f64()));
    parts.push(format!("-A '{}'", opts.user_agent.replace('\'', r"'\''")));
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let mut val = v.to_str().unwrap_or("").to_string();
            if matches!(
                key.to_ascii_lowercase().as_str(),
                "authorization" | "proxy-authorization" | "cookie" | "set-cookie"
            ) {
                val = "<redacted>".into();
            }
            (key, val)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("client build failed: {0}")]
    Build(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned {status} for {url}: {body_snippet}")]
    Status {
        status: StatusCode,
        url: String,
        body_snippet: String,
    },
}

impl HttpError {
    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Network(error_chain(&err))
        }
    }
}

/// Join an error and its sources, since reqwest keeps the useful part
/// (DNS, TLS, connection refused) in the source chain.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

// ==============================
// Options & results
// ==============================

/// Knobs for the single GET a fetch performs.
///
/// ```
/// use tagsift_http::FetchOpts;
/// use std::time::Duration;
///
/// let opts = FetchOpts {
///     timeout: Duration::from_secs(3),
///     fail_on_status: true,
///     ..Default::default()
/// };
/// assert!(opts.follow_redirects);
/// assert_eq!(opts.timeout.as_secs(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct FetchOpts {
    /// Whole-request timeout (connect, redirects and body).
    pub timeout: Duration,
    pub user_agent: String,
    pub follow_redirects: bool,
    /// Treat non-2xx responses as [`HttpError::Status`].
    pub fail_on_status: bool,
}

impl Default for FetchOpts {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            follow_redirects: true,
            fail_on_status: false,
        }
    }
}

/// A fully buffered response.
#[derive(Clone, Debug)]
pub struct Fetched {
    /// URL of the last hop, after any redirects.
    pub url: Url,
    pub status: StatusCode,
    pub body: Bytes,
}

/// Fetch a URL into memory. Implemented by [`HttpFetcher`]; tests swap in
/// stubs.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Fetched, HttpError>;
}

// ==============================
// Client
// ==============================

#[derive(Clone, Debug)]
pub struct HttpFetcher {
    inner: Client,
    opts: FetchOpts,
}

impl HttpFetcher {
    /// Build a fetcher with the given options.
    ///
    /// ```no_run
    /// use tagsift_http::{FetchOpts, HttpError, HttpFetcher};
    ///
    /// let fetcher = HttpFetcher::new(FetchOpts::default())?;
    /// assert!(fetcher.opts().follow_redirects);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(opts: FetchOpts) -> Result<Self, HttpError> {
        let policy = if opts.follow_redirects {
            redirect::Policy::default()
        } else {
            redirect::Policy::none()
        };
        let inner = Client::builder()
            .user_agent(opts.user_agent.as_str())
            .timeout(opts.timeout)
            .connect_timeout(opts.timeout.min(Duration::from_secs(5)))
            .redirect(policy)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self { inner, opts })
    }

    pub fn opts(&self) -> &FetchOpts {
        &self.opts
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Fetched, HttpError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(HttpError::Url(format!(
                "unsupported scheme `{}` in {url}",
                url.scheme()
            )));
        }

        // Lightweight request id without extra deps
        let req_id = format!(
            "r{:x}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );

        tracing::debug!(
            req_id=%req_id,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            timeout_ms=self.opts.timeout.as_millis() as u64,
            follow_redirects=self.opts.follow_redirects,
            "http.request.start"
        );

        if raw_enabled() {
            let curl = make_curl(url, &self.opts);
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        // ----- Send -----
        let t0 = std::time::Instant::now();
        let resp = self.inner.get(url.clone()).send().await.map_err(|err| {
            let err = HttpError::from_reqwest(err, self.opts.timeout);
            tracing::warn!(req_id=%req_id, error=%err, "http.network_error.send");
            err
        })?;

        let status = resp.status();
        let final_url = resp.url().clone();
        let headers = resp.headers().clone();

        let body = resp.bytes().await.map_err(|err| {
            let err = HttpError::from_reqwest(err, self.opts.timeout);
            tracing::warn!(req_id=%req_id, error=%err, "http.network_error.body");
            err
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let content_type = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=body.len(),
            final_url=%final_url,
            redirected=(final_url != *url),
            content_type=%content_type,
            "http.response.headers"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&headers);
            let truncated = body.len() > RAW_MAX_BODY;
            let text = String::from_utf8_lossy(&body[..body.len().min(RAW_MAX_BODY)]);
            tracing::info!(
                target:"http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?hdrs,
                body=%text,
                truncated
            );
        }

        let snippet = snip_body(&body);
        tracing::trace!(
            req_id=%req_id,
            body_snippet=%snippet,
            "http.response.body_snippet"
        );

        if !status.is_success() {
            tracing::warn!(
                req_id=%req_id,
                %status,
                url=%final_url,
                fail_on_status=self.opts.fail_on_status,
                "http.response.non_success"
            );
            if self.opts.fail_on_status {
                return Err(HttpError::Status {
                    status,
                    url: final_url.to_string(),
                    body_snippet: snippet,
                });
            }
        }

        Ok(Fetched {
            url: final_url,
            status,
            body,
        })
    }
}

// ==============================
// Helpers
// ==============================

fn snip_body(body: &[u8]) -> String {
    let end = body.len().min(SNIPPET_MAX);
    let mut snip = String::from_utf8_lossy(&body[..end]).into_owned();
    if body.len() > SNIPPET_MAX {
        snip.push_str("...");
    }
    snip
}
