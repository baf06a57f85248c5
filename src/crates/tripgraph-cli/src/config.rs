//! Layered configuration for the `tripgraph` binary
//!
//! Sources, later ones overriding earlier ones key by key:
//!
//! 1. Built-in defaults
//! 2. User file `~/.tripgraph/config.toml`
//! 3. Project file `./.tripgraph/config.toml`
//! 4. An explicit `--config <path>`
//! 5. Environment: the API key variable named by `llm.api_key_env`
//!    (`OPENAI_API_KEY` by default), `TRIPGRAPH_MODEL`, `TRIPGRAPH_BASE_URL`
//!
//! ```toml
//! [llm]
//! model = "gpt-4o-mini"
//! timeout_secs = 30
//!
//! [runtime]
//! turn_deadline_secs = 90
//! persist_mode = "end_of_turn"
//!
//! [logging]
//! level = "debug"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::debug;
use tripgraph_core::{ExecutionConfig, PersistMode, DEFAULT_MAX_STEPS};
use tripgraph_llm::config::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use tripgraph_llm::RemoteLlmConfig;

const CONFIG_DIR: &str = ".tripgraph";
const CONFIG_FILE: &str = "config.toml";

pub const MODEL_ENV: &str = "TRIPGRAPH_MODEL";
pub const BASE_URL_ENV: &str = "TRIPGRAPH_BASE_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("No API key: set {0} or pass --offline")]
    MissingApiKey(String),

    #[error("Invalid log level: {0}")]
    InvalidLevel(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Complete CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripgraphConfig {
    pub llm: LlmSettings,
    pub runtime: RuntimeSettings,
    pub logging: LoggingSettings,
}

/// Chat-model provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// OpenAI-compatible API root
    pub base_url: String,
    pub model: String,
    /// Key given inline; `${VAR}` is expanded from the environment
    pub api_key: Option<String>,
    /// Environment variable holding the key when none is given inline
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Retries of rate-limited or timed-out calls
    pub max_retries: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

/// Executor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Deadline for a whole turn; 0 disables it
    pub turn_deadline_secs: u64,
    pub max_steps: usize,
    pub persist_mode: PersistMode,
    /// Directory of per-thread state files; defaults to `~/.tripgraph/threads`
    pub state_dir: Option<PathBuf>,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            turn_deadline_secs: 120,
            max_steps: DEFAULT_MAX_STEPS,
            persist_mode: PersistMode::EveryStep,
            state_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// "trace", "debug", "info", "warn" or "error"
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl TripgraphConfig {
    /// Executor settings derived from `[runtime]`
    pub fn execution_config(&self) -> ExecutionConfig {
        let config = ExecutionConfig::default()
            .with_persist_mode(self.runtime.persist_mode)
            .with_max_steps(self.runtime.max_steps);
        match self.runtime.turn_deadline_secs {
            0 => config,
            secs => config.with_deadline(Duration::from_secs(secs)),
        }
    }

    /// Provider settings derived from `[llm]`
    pub fn remote_llm_config(&self) -> Result<RemoteLlmConfig> {
        let api_key = self
            .llm
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty() && !k.starts_with("${"))
            .ok_or_else(|| ConfigError::MissingApiKey(self.llm.api_key_env.clone()))?;

        Ok(
            RemoteLlmConfig::new(api_key, &self.llm.base_url, &self.llm.model)
                .with_timeout(Duration::from_secs(self.llm.timeout_secs))
                .with_max_retries(self.llm.max_retries),
        )
    }

    /// Where thread state files live
    pub fn state_dir(&self) -> PathBuf {
        self.runtime.state_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(CONFIG_DIR)
                .join("threads")
        })
    }

    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging
            .level
            .parse()
            .map_err(|_| ConfigError::InvalidLevel(self.logging.level.clone()))
    }

    /// Apply environment overrides, reading variables through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = self.llm.api_key.take() {
            self.llm.api_key = Some(expand_env_var(&key, &lookup));
        }
        if self.llm.api_key.is_none() {
            self.llm.api_key = non_empty(&self.llm.api_key_env);
        }
        if let Some(model) = non_empty(MODEL_ENV) {
            self.llm.model = model;
        }
        if let Some(base_url) = non_empty(BASE_URL_ENV) {
            self.llm.base_url = base_url;
        }
    }
}

/// Expand a whole-value `${VAR}` reference; anything else is returned as is
fn expand_env_var<F>(value: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .and_then(lookup)
        .unwrap_or_else(|| value.to_string())
}

/// Overlay `top` onto `base`, recursing into tables
fn merge_toml(base: &mut toml::Value, top: toml::Value) {
    match (base, top) {
        (toml::Value::Table(base), toml::Value::Table(top)) => {
            for (key, value) in top {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, top) => *base = top,
    }
}

/// Finds and layers the configuration files
pub struct ConfigLoader {
    user_path: Option<PathBuf>,
    project_path: PathBuf,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            user_path: dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE)),
            project_path: PathBuf::from(CONFIG_DIR).join(CONFIG_FILE),
        }
    }

    /// Loader reading the given user and project files instead
    pub fn with_paths(user_path: Option<PathBuf>, project_path: PathBuf) -> Self {
        Self {
            user_path,
            project_path,
        }
    }

    /// Layer defaults, the user and project files, and `explicit`
    ///
    /// Missing user or project files are skipped; a missing explicit file
    /// is an error. Environment overrides are not applied here.
    pub async fn load(&self, explicit: Option<&Path>) -> Result<TripgraphConfig> {
        let mut merged = toml::Value::Table(toml::map::Map::new());

        let optional = self.user_path.iter().chain(std::iter::once(&self.project_path));
        for path in optional {
            match Self::read(path).await {
                Ok(layer) => {
                    debug!(path = %path.display(), "Loaded config layer");
                    merge_toml(&mut merged, layer);
                }
                Err(ConfigError::Read { source, .. })
                    if source.kind() == std::io::ErrorKind::NotFound =>
                {
                    debug!(path = %path.display(), "Config layer not present");
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(path) = explicit {
            merge_toml(&mut merged, Self::read(path).await?);
        }

        merged.try_into().map_err(|source| ConfigError::Parse {
            path: explicit.map(Path::to_path_buf).unwrap_or_default(),
            source,
        })
    }

    async fn read(path: &Path) -> Result<toml::Value> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
