//! Solver configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main solver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote platform endpoints and credentials
    pub platform: PlatformConfig,

    /// Local workspace layout and the submission tool
    pub workspace: WorkspaceConfig,

    /// Attempt loop bounds
    pub solve: SolveConfig,

    /// Delivery channel selection and tuning
    pub delivery: DeliveryConfig,

    /// Remote grading monitor tuning
    pub monitor: MonitorConfig,

    /// Persisted browser-session settings
    pub session: SessionConfig,

    /// Log level when not overridden on the command line
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.platform.token_env).is_err() {
            return Err(eyre::eyre!(
                "API token not found. Set the {} environment variable or pass --token.",
                self.platform.token_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .exsolver.yml
        let local_config = PathBuf::from(".exsolver.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/exsolver/exsolver.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("exsolver").join("exsolver.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Remote platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Website base URL (rendered pages, login, editor)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// JSON API base URL
    #[serde(rename = "api-base-url")]
    pub api_base_url: String,

    /// Environment variable containing the API token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// HTTP request timeout in milliseconds
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: "https://exercism.org".to_string(),
            api_base_url: "https://exercism.org/api/v2".to_string(),
            token_env: "EXERCISM_TOKEN".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

/// Local workspace configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Root directory that exercise directories are materialized under
    pub root: PathBuf,

    /// Submission tool binary name or path
    #[serde(rename = "cli-bin")]
    pub cli_bin: String,

    /// Timeout for one tool invocation in milliseconds
    #[serde(rename = "tool-timeout-ms")]
    pub tool_timeout_ms: u64,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        let root = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("exercism-workspace");

        Self {
            root,
            cli_bin: "exercism".to_string(),
            tool_timeout_ms: 60_000,
        }
    }
}

/// Attempt loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveConfig {
    /// Maximum generate/verify attempts per exercise
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Retries for workspace acquisition when rate limited
    #[serde(rename = "acquisition-retries")]
    pub acquisition_retries: u32,

    /// Backoff between acquisition retries in milliseconds
    #[serde(rename = "acquisition-backoff-ms")]
    pub acquisition_backoff_ms: u64,

    /// Mandatory delay between exercises in batch mode, milliseconds
    #[serde(rename = "batch-delay-ms")]
    pub batch_delay_ms: u64,

    /// Verification harness timeout in milliseconds
    #[serde(rename = "harness-timeout-ms")]
    pub harness_timeout_ms: u64,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            acquisition_retries: 3,
            acquisition_backoff_ms: 5_000,
            batch_delay_ms: 2_000,
            harness_timeout_ms: 120_000,
        }
    }
}

/// Delivery channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Channel to deliver through: "direct" or "interactive"
    pub channel: String,

    /// Fallback backoff when a rate-limit response names no wait, milliseconds
    #[serde(rename = "rate-limit-backoff-ms")]
    pub rate_limit_backoff_ms: u64,

    /// Grace period for a human to complete login, milliseconds
    #[serde(rename = "auth-grace-ms")]
    pub auth_grace_ms: u64,

    /// Interval between remote editor test-result polls, milliseconds
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,

    /// Maximum remote editor test-result polls per run
    #[serde(rename = "max-polls")]
    pub max_polls: u32,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            channel: "direct".to_string(),
            rate_limit_backoff_ms: 30_000,
            auth_grace_ms: 60_000,
            poll_interval_ms: 2_000,
            max_polls: 15,
        }
    }
}

/// Remote grading monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Maximum status polls before giving up
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay before each poll in milliseconds
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            retry_delay_ms: 3_000,
        }
    }
}

/// Persisted session configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session file path; defaults to the user config directory
    pub path: Option<PathBuf>,
}
