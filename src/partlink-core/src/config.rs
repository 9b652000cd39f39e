use crate::paths::AppDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub digikey: DigikeyApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            host: HostConfig::default(),
            digikey: DigikeyApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Where the host application is reachable, used to build OAuth redirect targets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostConfig {
    #[serde(default = "default_site_domain")]
    pub site_domain: String,
    #[serde(default = "default_plugin_base_path")]
    pub plugin_base_path: String,
    #[serde(default = "default_settings_path")]
    pub settings_path: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            site_domain: default_site_domain(),
            plugin_base_path: default_plugin_base_path(),
            settings_path: default_settings_path(),
        }
    }
}

impl HostConfig {
    /// Joins the site domain with a plugin-relative path, normalising slashes.
    pub fn plugin_url(&self, relative: &str) -> String {
        format!(
            "{}/{}/{}",
            self.site_domain.trim_end_matches('/'),
            self.plugin_base_path.trim_matches('/'),
            relative.trim_start_matches('/')
        )
    }

    pub fn settings_url(&self) -> String {
        format!(
            "{}/{}",
            self.site_domain.trim_end_matches('/'),
            self.settings_path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DigikeyApiConfig {
    #[serde(default)]
    pub sandbox: bool,
    #[serde(default)]
    pub auth_base_url: Option<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
    #[serde(default = "default_stdout_enabled")]
    pub stdout: bool,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_log_files: default_max_log_files(),
            stdout: default_stdout_enabled(),
            file_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config validation failed: {0}")]
    Validation(ValidationError),
    #[error("failed to prepare configuration directories: {0}")]
    Directories(#[from] crate::paths::DirsError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported config_version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("host.site_domain must be an absolute http(s) URL, got {0:?}")]
    SiteDomain(String),
}

impl Config {
    pub fn load_or_default(dirs: &AppDirs) -> Result<Self, ConfigError> {
        dirs.ensure_exists()?;
        let path = Self::config_path(dirs);
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config.validate().map_err(ConfigError::Validation)?;
        Ok(config)
    }

    pub fn config_path(dirs: &AppDirs) -> PathBuf {
        dirs.config_dir().join("config.toml")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.config_version != CURRENT_CONFIG_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.config_version,
                expected: CURRENT_CONFIG_VERSION,
            });
        }
        let domain = &self.host.site_domain;
        if !(domain.starts_with("http://") || domain.starts_with("https://")) {
            return Err(ValidationError::SiteDomain(domain.clone()));
        }
        Ok(())
    }
}

fn default_config_version() -> u32 {
    CURRENT_CONFIG_VERSION
}

fn default_site_domain() -> String {
    "http://localhost:8000".into()
}

fn default_plugin_base_path() -> String {
    "plugin/digikey".into()
}

fn default_settings_path() -> String {
    "settings/plugin/digikey/".into()
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_max_log_files() -> usize {
    7
}

fn default_stdout_enabled() -> bool {
    true
}
