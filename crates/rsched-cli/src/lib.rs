//! Command-line surface of the rsched binary: argument parsing and the
//! crontab read/write plumbing around `rsched-core`.

pub mod cli_args;
pub mod system;
