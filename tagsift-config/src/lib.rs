//! Loader for scrape configuration with file + environment overlays.
//!
//! Precedence, lowest to highest: built-in defaults, config files and inline
//! YAML (in the order added), then `TAGSIFT__*` environment variables. String
//! values may reference `${VAR}`, expanded after merging. Command-line flags
//! are applied on top by the binary.
//!
//! ```yaml
//! urls: ["https://en.wikipedia.org/wiki/Computer"]
//! tags: [h1, h2, h3, p]
//! timeout_secs: 10
//! user_agent: "CyberResearchBot/1.0 (Academic project)"
//! follow_redirects: true
//! fail_on_http_status: false
//! concurrency: 4
//! log:
//!   format: text
//!   file: false
//! ```
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub use config::ConfigError;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "TAGSIFT";

pub const DEFAULT_URL: &str = "https://en.wikipedia.org/wiki/Computer";
pub const DEFAULT_TAGS: [&str; 4] = ["h1", "h2", "h3", "p"];
pub const DEFAULT_USER_AGENT: &str = "CyberResearchBot/1.0 (Academic project)";

/// Everything one run of the fetch → scan pipeline needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default = "default_urls")]
    pub urls: Vec<Url>,
    /// Tag names to extract, matched case-insensitively.
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
    /// Treat non-2xx responses as fetch failures instead of scanning them.
    #[serde(default)]
    pub fail_on_http_status: bool,
    /// How many fetches may be in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default)]
    pub format: LogFormatSetting,
    /// Also write a daily rolling log file.
    #[serde(default)]
    pub file: bool,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    #[default]
    Text,
    Json,
}

fn default_urls() -> Vec<Url> {
    Url::parse(DEFAULT_URL).into_iter().collect()
}
fn default_tags() -> Vec<String> {
    DEFAULT_TAGS.iter().map(|t| t.to_string()).collect()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}
fn default_true() -> bool {
    true
}
fn default_concurrency() -> usize {
    4
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            urls: default_urls(),
            tags: default_tags(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            follow_redirects: true,
            fail_on_http_status: false,
            concurrency: default_concurrency(),
            log: LogSettings::default(),
        }
    }
}

impl ScrapeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject configurations the pipeline cannot run with.
    ///
    /// ```
    /// use tagsift_config::ScrapeConfig;
    ///
    /// let mut cfg = ScrapeConfig::default();
    /// assert!(cfg.validate().is_ok());
    /// cfg.tags = vec!["h1".into(), "</p>".into()];
    /// assert!(cfg.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.urls.is_empty() {
            return Err(ConfigError::Message("at least one URL is required".into()));
        }
        if let Some(bad) = self
            .urls
            .iter()
            .find(|u| !matches!(u.scheme(), "http" | "https"))
        {
            return Err(ConfigError::Message(format!(
                "unsupported URL scheme in {bad}"
            )));
        }
        if self.tags.iter().all(|t| t.trim().is_empty()) {
            return Err(ConfigError::Message(
                "at least one tag name is required".into(),
            ));
        }
        if let Some(bad) = self.tags.iter().find(|t| {
            t.trim()
                .bytes()
                .any(|b| b.is_ascii_whitespace() || matches!(b, b'<' | b'>' | b'/'))
        }) {
            return Err(ConfigError::Message(format!("invalid tag name: {bad:?}")));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Message("timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (files + env overrides).
pub struct ScrapeConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    use_env: bool,
}

impl Default for ScrapeConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrapeConfigLoader {
    /// Start from defaults; `TAGSIFT__` env overrides are applied at load.
    ///
    /// ```
    /// use tagsift_config::ScrapeConfigLoader;
    ///
    /// let cfg = ScrapeConfigLoader::new()
    ///     .with_yaml_str("tags: [h1]\ntimeout_secs: 3")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(cfg.tags, vec!["h1"]);
    /// assert_eq!(cfg.timeout_secs, 3);
    /// assert!(cfg.follow_redirects);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            use_env: true,
        }
    }

    /// Skip `TAGSIFT__` environment overrides.
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may not exist.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use tagsift_config::{LogFormatSetting, ScrapeConfigLoader};
    ///
    /// let cfg = ScrapeConfigLoader::new()
    ///     .without_env()
    ///     .with_yaml_str(
    ///         r#"
    /// urls:
    ///   - "https://example.com/a"
    ///   - "https://example.com/b"
    /// log:
    ///   format: json
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.urls.len(), 2);
    /// assert_eq!(cfg.log.format, LogFormatSetting::Json);
    /// assert_eq!(cfg.tags, vec!["h1", "h2", "h3", "p"]);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// `${VAR}` placeholders are expanded before the typed structs are built,
    /// and the result is validated.
    ///
    /// ```
    /// use tagsift_config::ScrapeConfigLoader;
    ///
    /// unsafe { std::env::set_var("SCRAPE_HOST", "example.org"); }
    ///
    /// let cfg = ScrapeConfigLoader::new()
    ///     .without_env()
    ///     .with_yaml_str(r#"urls: ["https://${SCRAPE_HOST}/start"]"#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(cfg.urls[0].as_str(), "https://example.org/start");
    ///
    /// unsafe { std::env::remove_var("SCRAPE_HOST"); }
    /// ```
    pub fn load(self) -> Result<ScrapeConfig, ConfigError> {
        let mut builder = self.builder;
        if self.use_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("urls")
                    .with_list_parse_key("tags"),
            );
        }
        let cfg = builder.build()?;

        // Convert to serde_json::Value first
        let mut v: Value = cfg.try_deserialize()?;
        // Recursively expand environment variables
        expand_env_in_value(&mut v);

        let typed: ScrapeConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;

        Ok(typed)
    }
}
