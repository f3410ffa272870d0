/*!
 * Configuration support for the plan navigator
 *
 * Runtime options for parsing and orchestration. Configuration is an
 * immutable value passed explicitly into constructors; there is no global
 * mutable state.
 */

use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Runtime configuration for parsing and analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigatorConfig {
    /// Per-source extraction time limit in seconds
    #[serde(default = "default_parse_timeout_secs")]
    pub parse_timeout_secs: u64,

    /// Number of threads for parallel batch parsing (None = use all available)
    #[serde(default)]
    pub parallel_threads: Option<usize>,

    /// Whether to show a progress bar during batch parsing
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,

    /// Whether directory sources are expanded to their supported files
    #[serde(default = "default_follow_directories")]
    pub follow_directories: bool,

    /// Maximum byte size for a text-bearing source; larger files are
    /// reported as malformed rather than read
    #[serde(default = "default_max_text_bytes")]
    pub max_text_bytes: u64,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            parse_timeout_secs: default_parse_timeout_secs(),
            parallel_threads: None,
            show_progress: default_show_progress(),
            follow_directories: default_follow_directories(),
            max_text_bytes: default_max_text_bytes(),
        }
    }
}

// Default value functions for serde
fn default_parse_timeout_secs() -> u64 {
    10
}

fn default_show_progress() -> bool {
    true
}

fn default_follow_directories() -> bool {
    true
}

fn default_max_text_bytes() -> u64 {
    8 * 1024 * 1024
}

impl NavigatorConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// The per-source extraction timeout as a Duration
    pub fn parse_timeout(&self) -> Duration {
        Duration::from_secs(self.parse_timeout_secs)
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - `PLANNAV_PARSE_TIMEOUT_SECS`: seconds per source
    /// - `PLANNAV_PARALLEL_THREADS`: number or "auto"
    /// - `PLANNAV_PROGRESS`: "true" or "false"
    /// - `PLANNAV_FOLLOW_DIRECTORIES`: "true" or "false"
    /// - `PLANNAV_MAX_TEXT_BYTES`: number in bytes
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("PLANNAV_PARSE_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.parse_timeout_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("PLANNAV_PARALLEL_THREADS") {
            config.parallel_threads = match val.to_lowercase().as_str() {
                "auto" | "0" => None,
                num => num.parse().ok(),
            };
        }

        if let Ok(val) = std::env::var("PLANNAV_PROGRESS") {
            config.show_progress = val.to_lowercase() == "true";
        }

        if let Ok(val) = std::env::var("PLANNAV_FOLLOW_DIRECTORIES") {
            config.follow_directories = val.to_lowercase() == "true";
        }

        if let Ok(val) = std::env::var("PLANNAV_MAX_TEXT_BYTES") {
            if let Ok(bytes) = val.parse() {
                config.max_text_bytes = bytes;
            }
        }

        config
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| crate::PlanNavError::Configuration {
                message: format!("could not parse config file: {}", e),
                suggestion: Some("check that the file is valid TOML".to_string()),
            })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::PlanNavError::Configuration {
                message: format!("could not serialize config: {}", e),
                suggestion: None,
            })?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/plannav/config.toml` on Unix-like systems
    /// or `%APPDATA%\plannav\config.toml` on Windows
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "plannav")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from the default location, environment, or defaults
    ///
    /// Priority order:
    /// 1. Default config file (if exists)
    /// 2. Environment variables
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Some(config_path) = Self::default_config_path() {
            if config_path.exists() {
                if let Ok(config) = Self::from_file(&config_path) {
                    return config;
                }
            }
        }

        Self::from_env()
    }
}

/// Builder for customizing configuration
pub struct ConfigBuilder {
    config: NavigatorConfig,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Start building a new configuration
    pub fn new() -> Self {
        Self {
            config: NavigatorConfig::default(),
        }
    }

    /// Set the per-source extraction timeout in seconds
    pub fn parse_timeout_secs(mut self, secs: u64) -> Self {
        self.config.parse_timeout_secs = secs;
        self
    }

    /// Set number of parallel threads
    pub fn parallel_threads(mut self, threads: Option<usize>) -> Self {
        self.config.parallel_threads = threads;
        self
    }

    /// Set progress bar enabled
    pub fn show_progress(mut self, show: bool) -> Self {
        self.config.show_progress = show;
        self
    }

    /// Set whether directory sources are expanded
    pub fn follow_directories(mut self, follow: bool) -> Self {
        self.config.follow_directories = follow;
        self
    }

    /// Set the maximum text-bearing source size in bytes
    pub fn max_text_bytes(mut self, bytes: u64) -> Self {
        self.config.max_text_bytes = bytes;
        self
    }

    /// Build the configuration
    pub fn build(self) -> NavigatorConfig {
        self.config
    }
}
