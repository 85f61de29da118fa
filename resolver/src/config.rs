//! Configuration management for the resolver.

use std::env;
use std::path::PathBuf;

/// Resolver configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory holding one subdirectory per record set
    pub data_dir: PathBuf,
    /// Record sets to resolve on this run
    pub record_sets: Vec<String>,
    /// Merge-and-commit attempts before giving up on a record set
    pub max_commit_attempts: u32,
    /// Write `last_merge.json` next to each resolved record set
    pub write_report: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = lookup("TASKMERGE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let record_sets: Vec<String> = lookup("TASKMERGE_RECORD_SETS")
            .ok_or(ConfigError::MissingRecordSets)?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if record_sets.is_empty() {
            return Err(ConfigError::MissingRecordSets);
        }

        let max_commit_attempts = lookup("TASKMERGE_MAX_COMMIT_ATTEMPTS")
            .unwrap_or_else(|| "3".to_string())
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::InvalidMaxCommitAttempts)?;

        let write_report = match lookup("TASKMERGE_WRITE_REPORT") {
            None => true,
            Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidWriteReport(value))?,
        };

        Ok(Self {
            data_dir,
            record_sets,
            max_commit_attempts,
            write_report,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TASKMERGE_RECORD_SETS environment variable is required")]
    MissingRecordSets,

    #[error("Invalid TASKMERGE_MAX_COMMIT_ATTEMPTS value (must be a positive integer)")]
    InvalidMaxCommitAttempts,

    #[error("Invalid TASKMERGE_WRITE_REPORT value: {0}")]
    InvalidWriteReport(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(
        vars: &'a HashMap<&'static str, &'static str>,
    ) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| vars.get(key).map(|v| v.to_string())
    }

    #[test]
    fn defaults() {
        let vars = HashMap::from([("TASKMERGE_RECORD_SETS", "tasks")]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.record_sets, vec!["tasks"]);
        assert_eq!(config.max_commit_attempts, 3);
        assert!(config.write_report);
    }

    #[test]
    fn record_sets_are_trimmed() {
        let vars = HashMap::from([("TASKMERGE_RECORD_SETS", " work, home ,,groceries ")]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.record_sets, vec!["work", "home", "groceries"]);
    }

    #[test]
    fn missing_record_sets() {
        let vars = HashMap::from([("TASKMERGE_RECORD_SETS", " , ")]);
        assert!(matches!(
            Config::from_lookup(lookup(&vars)),
            Err(ConfigError::MissingRecordSets)
        ));

        let empty = HashMap::new();
        assert!(matches!(
            Config::from_lookup(lookup(&empty)),
            Err(ConfigError::MissingRecordSets)
        ));
    }

    #[test]
    fn invalid_attempts() {
        for value in ["0", "-1", "many"] {
            let vars = HashMap::from([
                ("TASKMERGE_RECORD_SETS", "tasks"),
                ("TASKMERGE_MAX_COMMIT_ATTEMPTS", value),
            ]);
            assert!(matches!(
                Config::from_lookup(lookup(&vars)),
                Err(ConfigError::InvalidMaxCommitAttempts)
            ));
        }
    }

    #[test]
    fn overrides() {
        let vars = HashMap::from([
            ("TASKMERGE_DATA_DIR", "/var/lib/taskmerge"),
            ("TASKMERGE_RECORD_SETS", "tasks"),
            ("TASKMERGE_MAX_COMMIT_ATTEMPTS", "5"),
            ("TASKMERGE_WRITE_REPORT", "off"),
        ]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/taskmerge"));
        assert_eq!(config.max_commit_attempts, 5);
        assert!(!config.write_report);
    }

    #[test]
    fn invalid_write_report() {
        let vars = HashMap::from([
            ("TASKMERGE_RECORD_SETS", "tasks"),
            ("TASKMERGE_WRITE_REPORT", "maybe"),
        ]);
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid TASKMERGE_WRITE_REPORT value: maybe");
    }
}
