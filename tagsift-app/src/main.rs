use std::io::BufWriter;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use tagsift_common::TagsiftError;
use tagsift_common::observability::{LogConfig, LogFormat, init_logging};
use tagsift_config::{LogFormatSetting, ScrapeConfig, ScrapeConfigLoader};
use tagsift_http::{FetchOpts, HttpFetcher};

mod cli;
mod pipeline;

const DEFAULT_CONFIG_FILE: &str = "tagsift.yaml";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 1) Load config: defaults < file < env < flags
    let loader = match &cli.config {
        Some(path) => ScrapeConfigLoader::new().with_file(path),
        None => ScrapeConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let cfg: ScrapeConfig = loader
        .load()
        .map_err(|e| TagsiftError::Config(e.to_string()))
        .and_then(|cfg| cli.apply(cfg))?;

    // 2) Diagnostics go to stderr; stdout carries extracted content only
    init_logging(LogConfig {
        log_dir: cfg.log.dir.clone(),
        emit_file: cfg.log.file,
        format: match cfg.log.format {
            LogFormatSetting::Text => LogFormat::Text,
            LogFormatSetting::Json => LogFormat::Json,
        },
        ..LogConfig::default()
    })?;

    tracing::debug!(
        urls = cfg.urls.len(),
        tags = ?cfg.tags,
        timeout_secs = cfg.timeout_secs,
        follow_redirects = cfg.follow_redirects,
        "tagsift.start"
    );

    let fetcher = HttpFetcher::new(FetchOpts {
        timeout: cfg.timeout(),
        user_agent: cfg.user_agent.clone(),
        follow_redirects: cfg.follow_redirects,
        fail_on_status: cfg.fail_on_http_status,
    })?;

    let out = BufWriter::new(std::io::stdout());
    let report = pipeline::run(&cfg, &fetcher, out).await?;

    let failures = report.failures();
    if failures > 0 {
        let failed: Vec<&str> = report.failed_urls().map(|u| u.as_str()).collect();
        tracing::error!(
            failures,
            total = report.pages.len(),
            failed = ?failed,
            "some pages could not be fetched"
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
