//! pushmon config parser.
//!
//! A [`Config`] is an immutable snapshot of the config file. The daemon
//! loads one at startup and a fresh one on every reload; snapshots are
//! never mutated after they have been validated.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Locations searched, in order, when no explicit config path is given.
pub const CONFIG_LOCATIONS: &[&str] = &["/etc/pushmon/config.toml", "config/config.toml"];

/// Default shared HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where the running daemon records its process id.
    pub pid_file: PathBuf,
    /// Timeout applied to every push request, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Wait for the old generation to finish before spawning the new one.
    #[serde(default)]
    pub drain_on_reload: bool,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log file appended to alongside stdout. `None` logs to stdout only.
    pub file: Option<PathBuf>,
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: default_level(),
        }
    }
}

/// One configured push check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSpec {
    pub name: String,
    pub url: String,
    /// Tick period in seconds.
    pub interval: u64,
    /// Attempts per cycle. Zero means no request is ever sent.
    #[serde(default)]
    pub retries: u32,
    /// Shell expression gating each cycle. Empty means always run.
    #[serde(default)]
    pub command: String,
}

impl CheckSpec {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load config from `explicit` if given, otherwise from the first
    /// readable entry of [`CONFIG_LOCATIONS`].
    pub fn discover(explicit: Option<&Path>) -> ConfigResult<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let candidates: Vec<PathBuf> =
                    CONFIG_LOCATIONS.iter().map(PathBuf::from).collect();
                Self::from_candidates(&candidates)
            }
        }
    }

    /// Load config from the first candidate that can be read.
    ///
    /// Parse and validation errors in a readable candidate are returned
    /// immediately; later candidates are not consulted.
    pub fn from_candidates(candidates: &[PathBuf]) -> ConfigResult<Self> {
        for path in candidates {
            if let Ok(content) = std::fs::read_to_string(path) {
                return Self::from_content(&content, path);
            }
        }
        Err(ConfigError::NotFound {
            tried: candidates.to_vec(),
        })
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_content(&content, path)
    }

    /// Parse and validate config text that did not come from a file.
    pub fn parse(content: &str) -> ConfigResult<Self> {
        Self::from_content(content, Path::new("<inline>"))
    }

    fn from_content(content: &str, path: &Path) -> ConfigResult<Self> {
        let config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.timeout == 0 {
            return Err(ConfigError::Invalid("timeout must be greater than 0".into()));
        }
        if self.pid_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("pid_file must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for check in &self.checks {
            if check.name.trim().is_empty() {
                return Err(ConfigError::Invalid("check name must not be empty".into()));
            }
            if !seen.insert(check.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate check name: {}",
                    check.name
                )));
            }
            if check.url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "check {}: url must not be empty",
                    check.name
                )));
            }
            if check.interval == 0 {
                return Err(ConfigError::Invalid(format!(
                    "check {}: interval must be greater than 0",
                    check.name
                )));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn check_names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
pid_file = "/tmp/pushmon.pid"
timeout = 5

[logging]
file = "/tmp/pushmon.log"
level = "debug"

[[checks]]
name = "backup"
url = "http://127.0.0.1:9/ping"
interval = 60
retries = 3
command = "test -f /tmp/ok"

[[checks]]
name = "cron"
url = "http://127.0.0.1:9/cron"
interval = 30
"#;

    #[test]
    fn parse_full() {
        let config = Config::parse(FULL).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/pushmon.log")));
        assert_eq!(config.check_names(), vec!["backup", "cron"]);
        assert!(!config.drain_on_reload);

        let backup = &config.checks[0];
        assert_eq!(backup.retries, 3);
        assert_eq!(backup.interval(), Duration::from_secs(60));
        assert_eq!(backup.command, "test -f /tmp/ok");

        let cron = &config.checks[1];
        assert_eq!(cron.retries, 0);
        assert!(cron.command.is_empty());
    }

    #[test]
    fn parse_minimal_uses_defaults() {
        let config = Config::parse(r#"pid_file = "/tmp/p.pid""#).unwrap();
        assert_eq!(config.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.logging, LoggingConfig::default());
        assert!(config.checks.is_empty());
    }

    #[test]
    fn malformed_url_is_accepted_at_load_time() {
        let config = Config::parse(
            r#"
pid_file = "/tmp/p.pid"
[[checks]]
name = "bad"
url = "::not a url::"
interval = 1
retries = 1
"#,
        )
        .unwrap();
        assert_eq!(config.checks[0].url, "::not a url::");
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Config::parse(
            r#"
pid_file = "/tmp/p.pid"
[[checks]]
name = "a"
url = "http://x"
interval = 1
[[checks]]
name = "a"
url = "http://y"
interval = 2
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate check name: a"));
    }

    #[test]
    fn rejects_zero_interval() {
        let err = Config::parse(
            r#"
pid_file = "/tmp/p.pid"
[[checks]]
name = "a"
url = "http://x"
interval = 0
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = Config::parse("pid_file = \"/tmp/p.pid\"\ntimeout = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_missing_pid_file() {
        let err = Config::parse("timeout = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn candidates_first_readable_wins() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let second = dir.path().join("second.toml");
        std::fs::write(&second, FULL).unwrap();

        let config = Config::from_candidates(&[missing, second]).unwrap();
        assert_eq!(config.checks.len(), 2);
    }

    #[test]
    fn candidates_none_readable() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.toml");
        let b = dir.path().join("b.toml");

        let err = Config::from_candidates(&[a.clone(), b.clone()]).unwrap_err();
        match err {
            ConfigError::NotFound { tried } => assert_eq!(tried, vec![a, b]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn explicit_path_missing_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::discover(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
