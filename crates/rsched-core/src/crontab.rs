//! Rendering and reconciliation of schedule entries against a user crontab.
//!
//! The tool owns exactly one marker-delimited section of the crontab; every
//! update replaces that section wholesale and leaves the rest of the file
//! byte-for-byte untouched. Reading and writing the crontab itself is the
//! caller's job, this module only transforms text.

use std::io::{self, Write};

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::calendar::Event;

/// First line of the managed section. The exact text is a contract between
/// installs: changing it would make an existing section undetectable and
/// duplicate it on the next update.
pub const START_MARKER: &str = "# BEGIN rsched schedules - DO NOT EDIT THIS SECTION\n";

/// Last line of the managed section. Same stability contract as
/// [`START_MARKER`].
pub const END_MARKER: &str = "# END rsched schedules\n";

#[derive(Debug, Error)]
pub enum CrontabError {
    #[error("cannot write crontab: {0}")]
    Io(#[from] io::Error),
    #[error("invalid schedule line pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// One schedule bound to the command line it should run.
///
/// The identity triple (`config_file`, `profile_name`, `command_name`) is
/// only used to recognise a previously installed line in [`delete_line`]; it
/// is never used to build new lines and does not have to match `command`.
#[derive(Debug, Clone)]
pub struct Entry {
    event: Event,
    config_file: String,
    profile_name: String,
    command_name: String,
    command: String,
}

impl Entry {
    pub fn new(
        event: Event,
        config_file: impl Into<String>,
        profile_name: impl Into<String>,
        command_name: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Entry {
            event,
            config_file: config_file.into(),
            profile_name: profile_name.into(),
            command_name: command_name.into(),
            command: command.into(),
        }
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Writes the standard five-field cron line: year and second have no cron
    /// counterpart and are dropped; the command follows a single tab.
    fn write_line(&self, writer: &mut impl Write) -> io::Result<()> {
        writeln!(
            writer,
            "{} {} {} {} {}\t{}",
            self.event.minute,
            self.event.hour,
            self.event.day,
            self.event.month,
            self.event.week_day,
            self.command
        )
    }

    fn identity(&self) -> (&str, &str, &str) {
        (&self.config_file, &self.profile_name, &self.command_name)
    }
}

/// An ordered collection of entries; insertion order is rendering order.
#[derive(Debug, Clone, Default)]
pub struct Crontab {
    entries: Vec<Entry>,
}

impl Crontab {
    pub fn new(entries: Vec<Entry>) -> Self {
        Crontab { entries }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render all entries as cron lines. An empty crontab writes nothing at
    /// all, not even a newline.
    pub fn generate(&self, writer: &mut impl Write) -> Result<(), CrontabError> {
        for entry in &self.entries {
            entry.write_line(writer)?;
        }
        Ok(())
    }

    /// Merge the entries into `existing` crontab text and write the full
    /// replacement.
    ///
    /// The existing text is cleaned of vendor banner lines, then the managed
    /// section is located and replaced in place; when no section exists yet a
    /// fresh one is appended after a single separating newline. Everything
    /// outside the markers is preserved byte-for-byte.
    ///
    /// With `preserve_order` the entries render in insertion order; otherwise
    /// they are reordered by their identity triple first. The merge itself
    /// does not depend on entry order.
    pub fn update(
        &self,
        existing: &str,
        preserve_order: bool,
        writer: &mut impl Write,
    ) -> Result<(), CrontabError> {
        let cleaned = cleanup_crontab(existing);
        let (before, _, after, found) = extract_own_section(&cleaned);
        debug!(found, entries = self.entries.len(), "updating crontab section");

        let mut body = Vec::new();
        let mut ordered: Vec<&Entry> = self.entries.iter().collect();
        if !preserve_order {
            ordered.sort_by(|a, b| a.identity().cmp(&b.identity()));
        }
        for entry in ordered {
            entry.write_line(&mut body)?;
        }

        writer.write_all(before.as_bytes())?;
        if !found {
            writer.write_all(b"\n")?;
        }
        writer.write_all(START_MARKER.as_bytes())?;
        writer.write_all(&body)?;
        writer.write_all(END_MARKER.as_bytes())?;
        if found {
            writer.write_all(after.as_bytes())?;
        }
        Ok(())
    }
}

/// Strip the banner lines the `crontab` installer prepends ("DO NOT EDIT
/// THIS FILE", "installed on <timestamp>", "Cron version"). The user's own
/// comments and entries are kept untouched, newline placement included.
pub fn cleanup_crontab(crontab: &str) -> String {
    let banners = [
        Regex::new(r"^# DO NOT EDIT THIS FILE\b").unwrap(),
        Regex::new(r"^# \(.+ installed on .+\)").unwrap(),
        Regex::new(r"^# \(Cron version\b.+\)").unwrap(),
    ];
    let mut output = String::with_capacity(crontab.len());
    for line in crontab.split_inclusive('\n') {
        if banners.iter().any(|pattern| pattern.is_match(line)) {
            debug!(line = line.trim_end(), "dropping vendor banner line");
            continue;
        }
        output.push_str(line);
    }
    output
}

/// Locate the managed section in `crontab`.
///
/// Returns `(before, middle, after, found)` with the marker lines excluded
/// from all three parts. A start marker without a matching end marker after
/// it counts as not found: the whole input comes back as `before` and the
/// stray marker line stays where it was.
pub fn extract_own_section(crontab: &str) -> (&str, &str, &str, bool) {
    let Some(start) = crontab.find(START_MARKER) else {
        return (crontab, "", "", false);
    };
    let middle_start = start + START_MARKER.len();
    let Some(end) = crontab[middle_start..].find(END_MARKER) else {
        return (crontab, "", "", false);
    };
    let middle_end = middle_start + end;
    (
        &crontab[..start],
        &crontab[middle_start..middle_end],
        &crontab[middle_end + END_MARKER.len()..],
        true,
    )
}

/// Remove the first active line that invokes the entry's profile and command
/// (`--config <file> ... --name <profile> ... <command>`). Commented-out
/// lines never match. Used to retract standalone lines installed outside the
/// managed section by previous versions.
///
/// Returns the modified text and whether a line was removed. The only error
/// is an identity triple that does not form a valid matching pattern.
pub fn delete_line(source: &str, entry: &Entry) -> Result<(String, bool), CrontabError> {
    let pattern = Regex::new(&format!(
        r"(?m)^[^#\r\n][^\r\n]*--config {}[^\r\n]*--name {}[^\r\n]*{}[^\r\n]*(\n|$)",
        entry.config_file, entry.profile_name, entry.command_name
    ))?;
    match pattern.find(source) {
        Some(found) => {
            debug!(
                profile = %entry.profile_name,
                command = %entry.command_name,
                "removing standalone crontab line"
            );
            let mut output = String::with_capacity(source.len());
            output.push_str(&source[..found.start()]);
            output.push_str(&source[found.end()..]);
            Ok((output, true))
        }
        None => Ok((source.to_string(), false)),
    }
}
