//! Core library crate for the rsched crontab scheduler.
//!
//! Everything here is pure text transformation: the calendar event model,
//! the crontab managed-section merge, configuration and command-line
//! assembly. Reading and writing the actual crontab lives in the CLI crate.

pub mod calendar;
pub mod config;
pub mod crontab;
pub mod logging;
pub mod shell;

pub use calendar::{CalendarValue, Event, OutOfRangeError, ParseError};
pub use config::{
    ConfigError, ConfigLoadResult, ConfigSource, DEFAULT_PROFILE_NAME, FileConfig, GlobalSettings,
    JobSpec, ProfileConfig, ScheduleBuildError, config_directory, config_path,
    entries_for_profiles, load_config, save_config,
};
pub use crontab::{
    Crontab, CrontabError, END_MARKER, Entry, START_MARKER, cleanup_crontab, delete_line,
    extract_own_section,
};
pub use logging::{LoggingDestination, LoggingError, init_logging};
pub use shell::{ArgType, Args};
