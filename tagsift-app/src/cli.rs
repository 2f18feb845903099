use std::path::PathBuf;

use clap::Parser;
use tagsift_common::TagsiftError;
use tagsift_common::observability::LogFormat;
use tagsift_config::{LogFormatSetting, ScrapeConfig};
use url::Url;

/// Fetch web pages and print their headings and paragraphs in document order.
#[derive(Debug, Parser)]
#[command(name = "tagsift", version)]
pub struct Cli {
    /// Pages to fetch. Replaces the configured URL list when given.
    pub urls: Vec<Url>,

    /// Config file (YAML, TOML or JSON). Defaults to ./tagsift.yaml if present.
    #[arg(short, long, env = "TAGSIFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Comma-separated tag names to extract, e.g. `h1,h2,p`.
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    /// Request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[arg(long)]
    pub user_agent: Option<String>,

    #[arg(long)]
    pub no_follow_redirects: bool,

    /// Treat non-2xx responses as failures instead of scanning their bodies.
    #[arg(long)]
    pub fail_on_http_status: bool,

    /// Maximum fetches in flight.
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Also write logs to a daily file in this directory.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    /// Layer command-line flags over a loaded config and re-validate.
    pub fn apply(&self, mut cfg: ScrapeConfig) -> tagsift_common::Result<ScrapeConfig> {
        if !self.urls.is_empty() {
            cfg.urls = self.urls.clone();
        }
        if let Some(tags) = &self.tags {
            cfg.tags = tags.clone();
        }
        if let Some(secs) = self.timeout {
            cfg.timeout_secs = secs;
        }
        if let Some(ua) = &self.user_agent {
            cfg.user_agent = ua.clone();
        }
        if self.no_follow_redirects {
            cfg.follow_redirects = false;
        }
        if self.fail_on_http_status {
            cfg.fail_on_http_status = true;
        }
        if let Some(n) = self.concurrency {
            cfg.concurrency = n;
        }
        if let Some(format) = self.log_format {
            cfg.log.format = match format {
                LogFormat::Text => LogFormatSetting::Text,
                LogFormat::Json => LogFormatSetting::Json,
            };
        }
        if let Some(dir) = &self.log_dir {
            cfg.log.dir = Some(dir.clone());
            cfg.log.file = true;
        }
        cfg.validate()
            .map_err(|e| TagsiftError::Config(e.to_string()))?;
        Ok(cfg)
    }
}
