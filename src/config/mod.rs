//! File and environment configuration.
//!
//! Every section has defaults, so an empty JSON object (or no file at all) is
//! a valid configuration. Environment overrides are applied after the file.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::launcher::LauncherConfig;
use crate::logging::LogLevel;
use crate::prompts::ProviderAssignment;

pub const CONFIG_ENV: &str = "ALMA_CONFIG";
pub const LOG_ENV: &str = "ALMA_LOG";
pub const PYTHON_ENV: &str = "ALMA_PYTHON";

/// Lowest port an app may be launched on.
const MIN_UNPRIVILEGED_PORT: u16 = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AlmaConfig {
    pub runtime: RuntimeSection,
    pub logging: LoggingSection,
    pub launcher: LauncherConfig,
    pub prompts: ProviderAssignment,
    pub socket: SocketSection,
    /// Fixed seed for positions, jokes and ports. Entropy when unset.
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeSection {
    pub tick_interval_ms: u64,
    /// Zero disables periodic metric snapshots.
    pub metrics_interval_ms: u64,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            tick_interval_ms: 200,
            metrics_interval_ms: 5000,
        }
    }
}

impl RuntimeSection {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// JSON-lines log file. Logging is off when unset.
    pub path: Option<PathBuf>,
    pub level: LogLevel,
    pub max_bytes: u64,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            path: None,
            level: LogLevel::Info,
            max_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SocketSection {
    pub listen_addr: SocketAddr,
    /// Stop accepting after this many sessions. Unlimited when unset.
    pub max_sessions: Option<usize>,
}

impl Default for SocketSection {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 7878)),
            max_sessions: None,
        }
    }
}

impl AlmaConfig {
    pub fn from_json_str(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: AlmaConfig =
            serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw, path)
    }

    /// Load `path`, else the file named by `ALMA_CONFIG`, else defaults; then
    /// apply `ALMA_LOG` and `ALMA_PYTHON`.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(
            std::env::var(LOG_ENV).ok().as_deref(),
            std::env::var(PYTHON_ENV).ok().as_deref(),
        )?;
        Ok(config)
    }

    /// Apply the environment-style overrides. `log` is a level name or a
    /// log file path.
    pub fn apply_overrides(
        &mut self,
        log: Option<&str>,
        python: Option<&str>,
    ) -> Result<(), ConfigError> {
        if let Some(log) = log.map(str::trim).filter(|v| !v.is_empty()) {
            match log.parse::<LogLevel>() {
                Ok(level) => self.logging.level = level,
                Err(_) => self.logging.path = Some(PathBuf::from(log)),
            }
        }
        if let Some(python) = python.map(str::trim).filter(|v| !v.is_empty()) {
            self.launcher.interpreter = python.to_string();
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let launcher = &self.launcher;
        if launcher.port_min > launcher.port_max {
            return Err(ConfigError::Invalid(format!(
                "launcher port range {}..={} is inverted",
                launcher.port_min, launcher.port_max
            )));
        }
        if launcher.port_min < MIN_UNPRIVILEGED_PORT {
            return Err(ConfigError::Invalid(format!(
                "launcher ports must be >= {MIN_UNPRIVILEGED_PORT}, got {}",
                launcher.port_min
            )));
        }
        if launcher.interpreter.trim().is_empty() {
            return Err(ConfigError::Invalid("launcher interpreter is empty".into()));
        }
        if let ProviderAssignment::Random { pool } = &self.prompts {
            if pool.is_empty() {
                return Err(ConfigError::Invalid(
                    "random provider assignment needs a non-empty pool".into(),
                ));
            }
        }
        if self.runtime.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick interval must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ProviderLabel;
    use std::io::Write;

    #[test]
    fn empty_object_yields_defaults() {
        let config = AlmaConfig::from_json_str("{}", Path::new("inline")).unwrap();
        assert_eq!(config.runtime.tick_interval(), Duration::from_millis(200));
        assert_eq!(config.launcher.port_range(), 8502..=9000);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.prompts, ProviderAssignment::default());
        assert!(config.rng_seed.is_none());
    }

    #[test]
    fn loads_sections_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "logging": {{ "level": "debug" }},
                "launcher": {{ "interpreter": "python3.12", "port_min": 9100, "port_max": 9200, "open_browser": false }},
                "prompts": {{ "mode": "fixed", "provider": "gemini" }},
                "rng_seed": 7
            }}"#
        )
        .unwrap();

        let config = AlmaConfig::load(file.path()).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.launcher.interpreter, "python3.12");
        assert_eq!(config.launcher.port_range(), 9100..=9200);
        assert!(!config.launcher.open_browser);
        assert_eq!(
            config.prompts,
            ProviderAssignment::Fixed {
                provider: ProviderLabel::Gemini
            }
        );
        assert_eq!(config.rng_seed, Some(7));
    }

    #[test]
    fn rejects_inverted_and_privileged_ranges() {
        let inverted = r#"{ "launcher": { "port_min": 9000, "port_max": 8000 } }"#;
        assert!(matches!(
            AlmaConfig::from_json_str(inverted, Path::new("inline")),
            Err(ConfigError::Invalid(_))
        ));

        let privileged = r#"{ "launcher": { "port_min": 80, "port_max": 8000 } }"#;
        assert!(AlmaConfig::from_json_str(privileged, Path::new("inline")).is_err());
    }

    #[test]
    fn rejects_empty_random_pool() {
        let raw = r#"{ "prompts": { "mode": "random", "pool": [] } }"#;
        assert!(AlmaConfig::from_json_str(raw, Path::new("inline")).is_err());
    }

    #[test]
    fn overrides_take_level_or_path() {
        let mut config = AlmaConfig::default();
        config.apply_overrides(Some("warn"), Some("/usr/bin/python3")).unwrap();
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.launcher.interpreter, "/usr/bin/python3");

        config.apply_overrides(Some("/tmp/alma.log"), None).unwrap();
        assert_eq!(config.logging.path, Some(PathBuf::from("/tmp/alma.log")));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AlmaConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
