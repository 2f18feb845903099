use std::io::Write;
use std::pin::pin;

use bytes::Bytes;
use futures::StreamExt;
use tagsift_common::{Result, TagsiftError};
use tagsift_config::ScrapeConfig;
use tagsift_http::Fetcher;
use tagsift_scan::{Halt, ScanSummary, TagSet, TextSink, scan_into};
use url::Url;

pub const SUCCESS_LINE: &str = "✓ Request successful";

/// What happened to one URL.
#[derive(Debug)]
pub struct PageReport {
    pub url: Url,
    pub outcome: Result<ScanSummary>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub pages: Vec<PageReport>,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.pages.iter().filter(|p| p.outcome.is_err()).count()
    }

    /// URLs whose fetch failed, in configured order.
    pub fn failed_urls(&self) -> impl Iterator<Item = &Url> {
        self.pages
            .iter()
            .filter(|p| p.outcome.is_err())
            .map(|p| &p.url)
    }
}

/// Fetch every configured URL and stream extracted elements to `out`.
///
/// Fetches run concurrently up to `cfg.concurrency`, but each page is
/// written whole and in configured order. A failed fetch is logged and
/// skipped; only output errors abort the run.
pub async fn run<F, W>(cfg: &ScrapeConfig, fetcher: &F, out: W) -> Result<RunReport>
where
    F: Fetcher + ?Sized,
    W: Write,
{
    let targets = TagSet::new(&cfg.tags);
    let mut sink = TextSink::new(out);
    let mut report = RunReport::default();

    let mut fetches = pin!(
        futures::stream::iter(cfg.urls.iter().cloned())
            .map(|url| async move {
                let result = fetcher.fetch(&url).await;
                (url, result)
            })
            .buffered(cfg.concurrency.max(1))
    );

    while let Some((url, result)) = fetches.next().await {
        let outcome = match result {
            Ok(page) => {
                tracing::info!(
                    url=%url,
                    final_url=%page.url,
                    status=%page.status,
                    body_len=page.body.len(),
                    "fetch.ok"
                );
                Ok(emit_page(&url, page.body, &targets, &mut sink)?)
            }
            Err(err) => {
                tracing::error!(url=%url, error=%err, "fetch.failed");
                Err(TagsiftError::Fetch {
                    url: url.to_string(),
                    reason: err.to_string(),
                })
            }
        };
        report.pages.push(PageReport { url, outcome });
    }

    Ok(report)
}

/// Scan one fetched body. The body is dropped once the scan finishes.
fn emit_page<W: Write>(
    url: &Url,
    body: Bytes,
    targets: &TagSet,
    sink: &mut TextSink<W>,
) -> Result<ScanSummary> {
    writeln!(sink.get_mut(), "{SUCCESS_LINE}")?;
    let summary = scan_into(&body, targets, sink)?;

    if let Some(Halt::UnterminatedOpenTag { offset }) = summary.halted {
        tracing::warn!(
            url=%url,
            offset,
            emitted=summary.emitted,
            "scan stopped early at an unterminated tag"
        );
    }
    tracing::info!(
        url=%url,
        emitted=summary.emitted,
        unclosed=summary.unclosed,
        "scan.done"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;
    use tagsift_http::{FetchOpts, Fetched, HttpError, HttpFetcher, StatusCode};
    use tagsift_scan::sink::BANNER;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Serves canned bodies; URLs it does not know fail like a dead host.
    #[derive(Default)]
    struct StubFetcher {
        pages: HashMap<String, (&'static str, Duration)>,
    }

    impl StubFetcher {
        fn page(mut self, url: &str, body: &'static str, delay_ms: u64) -> Self {
            self.pages
                .insert(url.to_string(), (body, Duration::from_millis(delay_ms)));
            self
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, url: &Url) -> std::result::Result<Fetched, HttpError> {
            match self.pages.get(url.as_str()) {
                Some(&(body, delay)) => {
                    tokio::time::sleep(delay).await;
                    Ok(Fetched {
                        url: url.clone(),
                        status: StatusCode::OK,
                        body: Bytes::from_static(body.as_bytes()),
                    })
                }
                None => Err(HttpError::Network("connection refused".into())),
            }
        }
    }

    fn config_for(urls: &[&str]) -> ScrapeConfig {
        ScrapeConfig {
            urls: urls.iter().map(|u| Url::parse(u).unwrap()).collect(),
            ..ScrapeConfig::default()
        }
    }

    #[tokio::test]
    async fn prints_banner_and_elements_for_one_page() {
        let fetcher = StubFetcher::default().page(
            "https://example.com/",
            "<html><h1>Title</h1><p>Body <b>bold</b> text</p></html>",
            0,
        );
        let cfg = config_for(&["https://example.com/"]);
        let mut out = Vec::new();

        let report = run(&cfg, &fetcher, &mut out).await.unwrap();

        assert_eq!(report.failures(), 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!(
                "{SUCCESS_LINE}\n{BANNER}<h1>Title</h1>\n\n<p>Body <b>bold</b> text</p>\n\n"
            )
        );
    }

    #[tokio::test]
    async fn failed_fetch_writes_nothing_and_is_reported() {
        let fetcher = StubFetcher::default().page("https://ok.example/", "<p>fine</p>", 0);
        let cfg = config_for(&["https://down.example/", "https://ok.example/"]);
        let mut out = Vec::new();

        let report = run(&cfg, &fetcher, &mut out).await.unwrap();

        assert_eq!(report.failures(), 1);
        let failed: Vec<_> = report.failed_urls().map(Url::as_str).collect();
        assert_eq!(failed, vec!["https://down.example/"]);
        assert!(matches!(
            report.pages[0].outcome,
            Err(TagsiftError::Fetch { .. })
        ));
        let summary = report.pages[1].outcome.as_ref().unwrap();
        assert_eq!(summary.emitted, 1);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(SUCCESS_LINE).count(), 1);
        assert!(text.ends_with("<p>fine</p>\n\n"));
    }

    #[tokio::test]
    async fn output_follows_url_order_not_completion_order() {
        let fetcher = StubFetcher::default()
            .page("https://slow.example/", "<h1>first</h1>", 80)
            .page("https://fast.example/", "<h1>second</h1>", 0);
        let cfg = config_for(&["https://slow.example/", "https://fast.example/"]);
        let mut out = Vec::new();

        run(&cfg, &fetcher, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        let first = text.find("<h1>first</h1>").unwrap();
        let second = text.find("<h1>second</h1>").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn halted_scan_still_counts_as_success() {
        let fetcher =
            StubFetcher::default().page("https://example.com/", "<p>a</p><p class=\"x", 0);
        let cfg = config_for(&["https://example.com/"]);
        let mut out = Vec::new();

        let report = run(&cfg, &fetcher, &mut out).await.unwrap();
        assert_eq!(report.failures(), 0);
        let summary = report.pages[0].outcome.as_ref().unwrap();
        assert!(summary.halted.is_some());
        assert_eq!(summary.emitted, 1);
    }

    #[tokio::test]
    async fn error_pages_are_scanned_best_effort() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<h2>Not Found</h2>"))
            .mount(&server)
            .await;

        let url = format!("{}/missing", server.uri());
        let cfg = config_for(&[url.as_str()]);
        let fetcher = HttpFetcher::new(FetchOpts::default()).unwrap();
        let mut out = Vec::new();

        let report = run(&cfg, &fetcher, &mut out).await.unwrap();
        assert_eq!(report.failures(), 0);
        assert!(
            String::from_utf8(out)
                .unwrap()
                .ends_with("<h2>Not Found</h2>\n\n")
        );
    }

    #[tokio::test]
    async fn error_pages_fail_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<h2>Not Found</h2>"))
            .mount(&server)
            .await;

        let url = format!("{}/missing", server.uri());
        let cfg = config_for(&[url.as_str()]);
        let fetcher = HttpFetcher::new(FetchOpts {
            fail_on_status: true,
            ..Default::default()
        })
        .unwrap();
        let mut out = Vec::new();

        let report = run(&cfg, &fetcher, &mut out).await.unwrap();
        assert_eq!(report.failures(), 1);
        assert!(out.is_empty());
    }
}
