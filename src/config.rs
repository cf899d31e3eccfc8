//! Configuration system
//!
//! Provides centralized configuration management with:
//! - Config file loading (optional)
//! - Environment variable overrides
//! - Runtime defaults
//! - Validation

use crate::display::DEFAULT_LIMIT;
use crate::filter::{FilterCriteria, MatchMode};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const MIN_BUFFER_KB: usize = 1;
const MAX_BUFFER_KB: usize = 4096;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Report configuration
    pub report: ReportConfig,

    /// Default filter rules
    pub filter: FilterConfig,

    /// Streaming parser configuration
    pub parser: ParserConfig,

    /// Paths configuration
    pub paths: PathsConfig,

    /// File the configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub limit: usize,
    pub json: bool,
    pub json_pretty: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub exclude: Vec<String>,
    pub extensions: Vec<String>,
    pub match_mode: MatchMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub buffer_size_kb: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub log_directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "WARN".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            json: false,
            json_pretty: true,
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { buffer_size_kb: 64 }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_directory: PathBuf::from("logs"),
        }
    }
}

impl ParserConfig {
    pub fn buffer_size_bytes(&self) -> usize {
        self.buffer_size_kb * 1024
    }
}

impl FilterConfig {
    /// Build criteria from the configured rules and the given date bounds.
    pub fn criteria(
        &self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> FilterCriteria {
        FilterCriteria::new(&self.exclude, &self.extensions, start_date, end_date)
            .with_match_mode(self.match_mode)
    }
}

impl Config {
    /// Candidate config files, in lookup order
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("svn-churn.toml"),
            PathBuf::from(".svn-churn.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("svn-churn").join("config.toml"));
        }
        paths
    }

    /// Load configuration from an explicit file or the default locations,
    /// then apply environment overrides and validate
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_from_default_paths()?,
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn load_from_default_paths() -> Result<Self> {
        for path in Self::default_paths() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }
        Ok(Config::default())
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.source = Some(path.to_path_buf());

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Logging overrides
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        // Report overrides
        if let Ok(val) = env::var("SVN_CHURN_LIMIT") {
            self.report.limit = val.parse().context("Invalid SVN_CHURN_LIMIT")?;
        }

        // Filter overrides
        if let Ok(val) = env::var("SVN_CHURN_MATCH_MODE") {
            self.filter.match_mode = val.parse().context("Invalid SVN_CHURN_MATCH_MODE")?;
        }

        // Parser overrides
        if let Ok(val) = env::var("SVN_CHURN_BUFFER_SIZE_KB") {
            self.parser.buffer_size_kb = val
                .parse()
                .context("Invalid SVN_CHURN_BUFFER_SIZE_KB")?;
        }

        // Path overrides
        if let Ok(val) = env::var("SVN_CHURN_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(MIN_BUFFER_KB..=MAX_BUFFER_KB).contains(&self.parser.buffer_size_kb) {
            return Err(anyhow::anyhow!(
                "Buffer size must be between {}KB and {}KB, got {}KB",
                MIN_BUFFER_KB,
                MAX_BUFFER_KB,
                self.parser.buffer_size_kb
            ));
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            other => return Err(anyhow::anyhow!("Unknown log format '{}'", other)),
        }

        match self.logging.output.as_str() {
            "console" => {}
            "file" | "both" => {
                if !self.paths.log_directory.exists() {
                    fs::create_dir_all(&self.paths.log_directory)
                        .context("Failed to create log directory")?;
                }
            }
            other => return Err(anyhow::anyhow!("Unknown log output '{}'", other)),
        }

        Ok(())
    }

    /// Save current configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }
}
