//! Engine configuration.
//!
//! Built explicitly (or from environment variables) and handed to
//! `ManagerBuilder`; nothing in the engine reads ambient global state.

use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::domain::TempFileError;

/// Upper bound for `retention_minutes`: 1000 years, far inside what
/// `DateTime<Utc>` can represent when added to the current time.
pub const MAX_RETENTION_MINUTES: u64 = 1000 * 366 * 24 * 60;

/// How expired files get reclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReclamationMode {
    /// A deferred `delete(id)` is scheduled at `expires_at` for every file.
    #[serde(alias = "queue")]
    Queued,
    /// An external scheduler (or `SweepLoop`) calls `sweep()` on a cadence.
    #[default]
    #[serde(alias = "cron")]
    Periodic,
    /// Nothing happens automatically.
    Manual,
}

impl FromStr for ReclamationMode {
    type Err = TempFileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queued" | "queue" => Ok(Self::Queued),
            "periodic" | "cron" => Ok(Self::Periodic),
            "manual" => Ok(Self::Manual),
            other => Err(TempFileError::Config(format!(
                "unknown reclamation mode {other:?} (expected queued, periodic or manual)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mode: ReclamationMode,
    /// How long a file lives before it may be reclaimed.
    pub retention_minutes: u64,
    /// Directory holding one sub-directory per file.
    pub root: PathBuf,
    /// Directory names skipped while listing `root`.
    pub ignore: Vec<String>,
    /// Persist the creating principal's id in the manifest.
    pub include_owner: bool,
    /// Cadence used by `SweepLoop` in periodic mode.
    pub sweep_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: ReclamationMode::default(),
            retention_minutes: 60,
            root: PathBuf::from("temp-files"),
            ignore: vec![
                ".".to_string(),
                "..".to_string(),
                ".DS_STORE".to_string(),
                "lost+found".to_string(),
            ],
            include_owner: true,
            sweep_interval_secs: 3600,
        }
    }
}

impl Config {
    /// Parse configuration from `TEMPFILES_*` environment variables.
    ///
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self, TempFileError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TempFileError> {
        let mut config = Self::default();

        if let Some(mode) = lookup("TEMPFILES_MODE") {
            config.mode = mode.parse()?;
        }
        if let Some(minutes) = lookup("TEMPFILES_RETENTION_MINUTES") {
            config.retention_minutes = parse_number("TEMPFILES_RETENTION_MINUTES", &minutes)?;
        }
        if let Some(root) = lookup("TEMPFILES_ROOT") {
            config.root = PathBuf::from(root);
        }
        if let Some(ignore) = lookup("TEMPFILES_IGNORE") {
            config.ignore = ignore
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(flag) = lookup("TEMPFILES_INCLUDE_OWNER") {
            config.include_owner = parse_bool("TEMPFILES_INCLUDE_OWNER", &flag)?;
        }
        if let Some(secs) = lookup("TEMPFILES_SWEEP_INTERVAL_SECS") {
            config.sweep_interval_secs = parse_number("TEMPFILES_SWEEP_INTERVAL_SECS", &secs)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TempFileError> {
        if self.retention_minutes == 0 {
            return Err(TempFileError::Config(
                "retention_minutes must be greater than zero".to_string(),
            ));
        }
        if self.retention_minutes > MAX_RETENTION_MINUTES {
            return Err(TempFileError::Config(format!(
                "retention_minutes must be at most {MAX_RETENTION_MINUTES}, got {}",
                self.retention_minutes
            )));
        }
        if self.root.as_os_str().is_empty() {
            return Err(TempFileError::Config("root must not be empty".to_string()));
        }
        if self.sweep_interval_secs == 0 {
            return Err(TempFileError::Config(
                "sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.retention_minutes as i64)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore.iter().any(|ignored| ignored == name)
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, TempFileError> {
    raw.trim()
        .parse()
        .map_err(|_| TempFileError::Config(format!("{key} must be a positive integer, got {raw:?}")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, TempFileError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(TempFileError::Config(format!("{key} must be a boolean, got {raw:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.mode, ReclamationMode::Periodic);
        assert_eq!(config.retention(), chrono::Duration::minutes(60));
        assert!(config.is_ignored(".DS_STORE"));
        assert!(config.is_ignored("lost+found"));
    }

    #[test]
    fn reads_every_variable() {
        let config = Config::from_lookup(lookup(&[
            ("TEMPFILES_MODE", "queued"),
            ("TEMPFILES_RETENTION_MINUTES", "15"),
            ("TEMPFILES_ROOT", "/var/tmp/uploads"),
            ("TEMPFILES_IGNORE", "lost+found, .snapshot"),
            ("TEMPFILES_INCLUDE_OWNER", "false"),
            ("TEMPFILES_SWEEP_INTERVAL_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.mode, ReclamationMode::Queued);
        assert_eq!(config.retention_minutes, 15);
        assert_eq!(config.root, PathBuf::from("/var/tmp/uploads"));
        assert_eq!(config.ignore, vec!["lost+found".to_string(), ".snapshot".to_string()]);
        assert!(!config.include_owner);
        assert_eq!(config.sweep_interval(), std::time::Duration::from_secs(60));
    }

    #[rstest]
    #[case::queue("queue", ReclamationMode::Queued)]
    #[case::cron("cron", ReclamationMode::Periodic)]
    #[case::manual("MANUAL", ReclamationMode::Manual)]
    fn mode_aliases(#[case] raw: &str, #[case] expected: ReclamationMode) {
        assert_eq!(raw.parse::<ReclamationMode>().unwrap(), expected);
    }

    #[rstest]
    #[case::bad_mode("TEMPFILES_MODE", "hourly")]
    #[case::zero_retention("TEMPFILES_RETENTION_MINUTES", "0")]
    #[case::negative_retention("TEMPFILES_RETENTION_MINUTES", "-5")]
    #[case::bad_bool("TEMPFILES_INCLUDE_OWNER", "maybe")]
    #[case::zero_interval("TEMPFILES_SWEEP_INTERVAL_SECS", "0")]
    #[case::retention_past_calendar("TEMPFILES_RETENTION_MINUTES", "1000000000000")]
    fn invalid_values_are_config_errors(#[case] key: &str, #[case] value: &str) {
        assert!(matches!(
            Config::from_lookup(lookup(&[(key, value)])),
            Err(TempFileError::Config(_))
        ));
    }

    #[test]
    fn retention_cap_is_inclusive() {
        let at_cap = Config {
            retention_minutes: MAX_RETENTION_MINUTES,
            ..Config::default()
        };
        assert!(at_cap.validate().is_ok());

        let past_cap = Config {
            retention_minutes: MAX_RETENTION_MINUTES + 1,
            ..Config::default()
        };
        assert!(matches!(past_cap.validate(), Err(TempFileError::Config(_))));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "mode": "cron", "retention_minutes": 5 }"#).unwrap();
        assert_eq!(config.mode, ReclamationMode::Periodic);
        assert_eq!(config.retention_minutes, 5);
        assert_eq!(config.root, PathBuf::from("temp-files"));
    }
}
