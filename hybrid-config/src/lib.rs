//! Loader for hybrid-search configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: built-in defaults, config files (in the order
//! they were attached), inline YAML, then `HYBRID__`-prefixed environment
//! variables (`HYBRID__GOOGLE__NUM=5` sets `google.num`). String values may
//! reference other variables as `${VAR}`; expansion runs after merging and
//! is applied recursively up to a fixed depth.
//!
//! ```yaml
//! search:
//!   sources: [google, grok_web, grok_x]
//!   timeout_secs: 60
//! google:
//!   api_key: "${SERPER_API_KEY}"
//!   num: 10
//! grok:
//!   api_key: "${XAI_API_KEY}"
//!   model: grok-4-1-fast-reasoning
//! logging:
//!   format: text
//!   filter: info
//! ```
use config::{Config, ConfigError, Environment, File, FileFormat};
use hybrid_common::observability::{LogConfig, LogFormat};
use hybrid_common::{GoogleOptions, GrokOptions, SearchOptions, SourceName};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod credentials;

pub use credentials::{
    ConfigCredentials, CredentialProvider, EnvCredentials, LayeredCredentials, StaticCredentials,
    SERPER_API_KEY, XAI_API_KEY,
};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "HYBRID";
const APP_DIR: &str = "hybrid-search";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    pub search: SearchSettings,
    pub google: GoogleSettings,
    pub grok: GrokSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Sources queried by `search` when none are given on the command line.
    pub sources: Vec<SourceName>,
    /// Shared deadline for one fan-out, in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            sources: SourceName::DEFAULT_SET.to_vec(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    pub endpoint: String,
    pub num: u32,
    pub gl: String,
    pub hl: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        let opts = GoogleOptions::default();
        Self {
            endpoint: "https://google.serper.dev".into(),
            num: opts.num,
            gl: opts.gl,
            hl: opts.hl,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrokSettings {
    pub endpoint: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for GrokSettings {
    fn default() -> Self {
        let opts = GrokOptions::default();
        Self {
            endpoint: "https://api.x.ai/v1/".into(),
            model: opts.model,
            temperature: opts.temperature,
            language: opts.language,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub filter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Write to a daily rolling file.
    pub file: bool,
    /// Mirror events to stderr.
    pub stderr: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "info".into(),
            dir: None,
            file: true,
            stderr: false,
        }
    }
}

impl HybridConfig {
    /// Per-backend options handed to every adapter for one request.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            google: GoogleOptions {
                num: self.google.num,
                gl: self.google.gl.clone(),
                hl: self.google.hl.clone(),
            },
            grok: GrokOptions {
                model: self.grok.model.clone(),
                temperature: self.grok.temperature,
                language: self.grok.language.clone(),
            },
        }
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.search.timeout_secs)
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            log_dir: self.logging.dir.clone(),
            to_file: self.logging.file,
            emit_stderr: self.logging.stderr,
            format: self.logging.format,
            default_filter: self.logging.filter.clone(),
            ..LogConfig::default()
        }
    }

    /// Keys written in the config file, usable as a fallback behind the
    /// process environment.
    pub fn credentials(&self) -> ConfigCredentials {
        ConfigCredentials::new(self.google.api_key.clone(), self.grok.api_key.clone())
    }

    /// YAML dump of the effective configuration with secrets masked.
    pub fn to_redacted_yaml(&self) -> Result<String, ConfigError> {
        let mut copy = self.clone();
        for key in [&mut copy.google.api_key, &mut copy.grok.api_key] {
            if key.is_some() {
                *key = Some("<redacted>".into());
            }
        }
        serde_yaml::to_string(&copy).map_err(|e| ConfigError::Message(e.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.search.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "search.timeout_secs must be greater than zero".into(),
            ));
        }
        if !(1..=100).contains(&self.google.num) {
            return Err(ConfigError::Message(format!(
                "google.num must be between 1 and 100, got {}",
                self.google.num
            )));
        }
        if let Some(t) = self.grok.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::Message(format!(
                    "grok.temperature must be within 0.0..=2.0, got {t}"
                )));
            }
        }
        Ok(())
    }
}

/// `$XDG_CONFIG_HOME/hybrid-search/config.yaml` (or the platform equivalent).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.yaml"))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => break,
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

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct HybridConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_overrides: bool,
}

impl Default for HybridConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl HybridConfigLoader {
    /// Start from defaults; `HYBRID__` environment overrides are applied last.
    ///
    /// ```
    /// use hybrid_config::HybridConfigLoader;
    ///
    /// let cfg = HybridConfigLoader::new()
    ///     .without_env()
    ///     .with_yaml_str("search:\n  timeout_secs: 15\n")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(cfg.search.timeout_secs, 15);
    /// assert_eq!(cfg.google.num, 10);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env_overrides: true,
        }
    }

    /// Skip the `HYBRID__` environment overlay.
    pub fn without_env(mut self) -> Self {
        self.env_overrides = false;
        self
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`with_file`](Self::with_file), but a missing file is not an error.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into [`HybridConfig`].
    ///
    /// ```
    /// use hybrid_config::HybridConfigLoader;
    ///
    /// unsafe { std::env::set_var("DOC_SERPER_KEY", "from-env"); }
    ///
    /// let cfg = HybridConfigLoader::new()
    ///     .without_env()
    ///     .with_yaml_str("google:\n  api_key: \"${DOC_SERPER_KEY}\"\n")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(cfg.google.api_key.as_deref(), Some("from-env"));
    ///
    /// unsafe { std::env::remove_var("DOC_SERPER_KEY"); }
    /// ```
    pub fn load(self) -> Result<HybridConfig, ConfigError> {
        let mut builder = self.builder;
        if self.env_overrides {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }
        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: HybridConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;

        tracing::debug!(
            sources = ?typed.search.sources,
            timeout_secs = typed.search.timeout_secs,
            google_endpoint = %typed.google.endpoint,
            grok_endpoint = %typed.grok.endpoint,
            grok_model = %typed.grok.model,
            "config.loaded"
        );
        Ok(typed)
    }
}
