//! Disk-backed configuration: which profiles exist and when their commands
//! should run. The schedule strings stay opaque here and are only parsed
//! when entries are built for the crontab.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use dirs::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::calendar::{Event, ParseError};
use crate::crontab::Entry;
use crate::shell::{ArgType, Args};

const CONFIG_DIR_NAME: &str = "rsched";
const CONFIG_FILE_NAME: &str = "config.toml";
const CURRENT_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_PROFILE_NAME: &str = "default";
pub const DEFAULT_BINARY: &str = "rsched";

/// Result returned by [`load_config`], capturing the source and any
/// non-fatal issues.
#[derive(Debug, Clone)]
pub struct ConfigLoadResult {
    pub config: FileConfig,
    pub warnings: Vec<String>,
    pub source: ConfigSource,
    /// Path the configuration was read from (or would be written to when no
    /// file exists yet).
    pub path: PathBuf,
}

/// Indicates where the configuration was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// No persisted configuration was found; defaults were synthesized.
    Default,
    /// Configuration was read from `config.toml`.
    File,
}

/// Errors that can occur while reading or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    Missing(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    Ser(#[from] toml::ser::Error),
}

/// Disk-backed configuration schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "FileConfig::schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub global: GlobalSettings,
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            global: GlobalSettings::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl FileConfig {
    const fn schema_version() -> u32 {
        CURRENT_SCHEMA_VERSION
    }

    /// Names of profiles that have at least one scheduled command, in
    /// configuration order.
    pub fn scheduled_profile_names(&self) -> Vec<String> {
        self.profiles
            .iter()
            .filter(|(_, profile)| {
                profile.values().any(|job| !job.schedule.is_empty())
            })
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Settings shared across all profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Executable written into generated cron lines.
    #[serde(default = "GlobalSettings::default_binary")]
    pub binary: String,
    /// When set, schedules are reconciled against this file instead of the
    /// user crontab.
    #[serde(default)]
    pub crontab_file: Option<String>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            binary: Self::default_binary(),
            crontab_file: None,
        }
    }
}

impl GlobalSettings {
    fn default_binary() -> String {
        DEFAULT_BINARY.to_string()
    }
}

/// A profile maps command names to their scheduling details.
pub type ProfileConfig = BTreeMap<String, JobSpec>;

/// Scheduling details for one command of a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Schedule expressions (see [`Event::parse`]); one cron line each.
    #[serde(default)]
    pub schedule: Vec<String>,
    /// Log file passed to the scheduled invocation.
    #[serde(default)]
    pub log: Option<String>,
}

/// Platform configuration directory for this tool.
pub fn config_directory() -> PathBuf {
    config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default configuration file path.
pub fn config_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Load the configuration.
///
/// An explicit path is tilde-expanded and must exist; without one the
/// default location is tried and a missing file falls back to defaults.
pub fn load_config(explicit_path: Option<&str>) -> Result<ConfigLoadResult, ConfigError> {
    let (path, explicit) = match explicit_path {
        Some(raw) => (PathBuf::from(shellexpand::tilde(raw).into_owned()), true),
        None => (config_path(), false),
    };

    if !path.exists() {
        if explicit {
            return Err(ConfigError::Missing(path));
        }
        debug!(path = %path.display(), "no configuration file, using defaults");
        return Ok(ConfigLoadResult {
            config: FileConfig::default(),
            warnings: Vec::new(),
            source: ConfigSource::Default,
            path,
        });
    }

    let raw = fs::read_to_string(&path)?;
    let config: FileConfig = toml::from_str(&raw)?;

    let mut warnings = Vec::new();
    if config.schema_version > CURRENT_SCHEMA_VERSION {
        warnings.push(format!(
            "configuration schema version {} is newer than supported version {}",
            config.schema_version, CURRENT_SCHEMA_VERSION
        ));
    }

    Ok(ConfigLoadResult {
        config,
        warnings,
        source: ConfigSource::File,
        path,
    })
}

/// Persist the configuration to `path`, creating parent directories.
pub fn save_config(config: &FileConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let rendered = toml::to_string_pretty(config)?;
    fs::write(path, rendered)?;
    Ok(())
}

/// Errors raised while turning configuration into crontab entries.
#[derive(Debug, Error)]
pub enum ScheduleBuildError {
    #[error("profile not found: {0}")]
    UnknownProfile(String),
    #[error("invalid schedule {expression:?} for '{profile}.{command}': {source}")]
    InvalidSchedule {
        profile: String,
        command: String,
        expression: String,
        source: ParseError,
    },
}

/// Build the ordered crontab entries for the selected profiles.
///
/// Profiles render in selection order, commands in configuration order, and
/// each schedule expression becomes its own entry. The generated command
/// line re-invokes `binary` with the config path and profile so the cron
/// daemon runs the exact job the entry describes.
pub fn entries_for_profiles(
    config: &FileConfig,
    config_path: &Path,
    selection: &[String],
) -> Result<Vec<Entry>, ScheduleBuildError> {
    let config_file = config_path.to_string_lossy();
    let mut entries = Vec::new();
    for profile_name in selection {
        let profile = config
            .profiles
            .get(profile_name)
            .ok_or_else(|| ScheduleBuildError::UnknownProfile(profile_name.clone()))?;
        for (command_name, job) in profile {
            let command_line = command_line(
                &config.global.binary,
                &config_file,
                profile_name,
                command_name,
                job.log.as_deref(),
            );
            for expression in &job.schedule {
                let event = Event::parse(expression).map_err(|source| {
                    ScheduleBuildError::InvalidSchedule {
                        profile: profile_name.clone(),
                        command: command_name.clone(),
                        expression: expression.clone(),
                        source,
                    }
                })?;
                entries.push(Entry::new(
                    event,
                    config_file.as_ref(),
                    profile_name.as_str(),
                    command_name.as_str(),
                    command_line.clone(),
                ));
            }
        }
    }
    Ok(entries)
}

fn command_line(
    binary: &str,
    config_file: &str,
    profile_name: &str,
    command_name: &str,
    log: Option<&str>,
) -> String {
    let mut args = Args::new();
    args.add_flag("config", config_file, ArgType::Escape);
    args.add_flag("name", profile_name, ArgType::Escape);
    if let Some(log_file) = log {
        args.add_flag("log", log_file, ArgType::Escape);
    }
    args.add_arg(command_name, ArgType::Escape);

    let mut line = String::from(binary);
    for part in args.get_all() {
        line.push(' ');
        line.push_str(&part);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> FileConfig {
        toml::from_str(
            r#"
            schema_version = 1

            [global]
            binary = "/usr/local/bin/rsched"

            [profiles.home.backup]
            schedule = ["daily"]
            log = "backup-home.log"

            [profiles.home.check]
            schedule = ["*:15"]

            [profiles.spare.backup]
            schedule = []
            "#,
        )
        .expect("sample config parses")
    }

    #[test]
    fn defaults_when_fields_are_missing() {
        let config: FileConfig = toml::from_str("").expect("empty config parses");
        assert_eq!(config.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(config.global.binary, DEFAULT_BINARY);
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn scheduled_profiles_skip_empty_schedules() {
        let config = sample_config();
        assert_eq!(config.scheduled_profile_names(), vec!["home".to_string()]);
    }

    #[test]
    fn entries_follow_configuration_order() {
        let config = sample_config();
        let entries = entries_for_profiles(
            &config,
            Path::new("/etc/rsched/config.toml"),
            &["home".to_string()],
        )
        .expect("entries build");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].command_name(), "backup");
        assert_eq!(
            entries[0].command(),
            "/usr/local/bin/rsched --config /etc/rsched/config.toml --log backup-home.log --name home backup"
        );
        assert_eq!(entries[1].command_name(), "check");
        assert_eq!(
            entries[1].command(),
            "/usr/local/bin/rsched --config /etc/rsched/config.toml --name home check"
        );
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let config = sample_config();
        let err = entries_for_profiles(
            &config,
            Path::new("config.toml"),
            &["nope".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleBuildError::UnknownProfile(name) if name == "nope"));
    }

    #[test]
    fn invalid_schedule_names_the_job() {
        let mut config = sample_config();
        config
            .profiles
            .get_mut("home")
            .and_then(|profile| profile.get_mut("backup"))
            .expect("job exists")
            .schedule = vec!["not a schedule".to_string()];
        let err = entries_for_profiles(
            &config,
            Path::new("config.toml"),
            &["home".to_string()],
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("home.backup"), "unexpected error: {message}");
    }
}
