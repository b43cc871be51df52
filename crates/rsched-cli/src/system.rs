//! The only code that touches the system: reading and writing the crontab,
//! either through the `crontab` binary or a plain file.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{Context, bail};
use tracing::debug;

/// Where the reconciled crontab text is read from and written back to.
#[derive(Debug, Clone)]
pub enum CrontabTarget {
    /// The current user's crontab, via `crontab -l` / `crontab -`.
    User,
    /// A crontab file managed directly (cron spools, tests, containers).
    File(PathBuf),
}

pub fn read_crontab(target: &CrontabTarget) -> anyhow::Result<String> {
    match target {
        CrontabTarget::File(path) => {
            if !path.exists() {
                debug!(path = %path.display(), "crontab file does not exist yet");
                return Ok(String::new());
            }
            fs::read_to_string(path)
                .with_context(|| format!("cannot read crontab file {}", path.display()))
        }
        CrontabTarget::User => {
            let output = Command::new("crontab")
                .arg("-l")
                .output()
                .context("cannot run the crontab command")?;
            if output.status.success() {
                return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            // crontab -l fails when the user has no crontab yet
            if stderr.to_lowercase().contains("no crontab") {
                debug!("user has no crontab yet");
                return Ok(String::new());
            }
            bail!("crontab -l failed: {}", stderr.trim());
        }
    }
}

pub fn write_crontab(target: &CrontabTarget, contents: &str) -> anyhow::Result<()> {
    match target {
        CrontabTarget::File(path) => fs::write(path, contents)
            .with_context(|| format!("cannot write crontab file {}", path.display())),
        CrontabTarget::User => {
            let mut child = Command::new("crontab")
                .arg("-")
                .stdin(Stdio::piped())
                .spawn()
                .context("cannot run the crontab command")?;
            child
                .stdin
                .take()
                .context("cannot open stdin of the crontab command")?
                .write_all(contents.as_bytes())
                .context("cannot send the new crontab")?;
            let status = child.wait().context("cannot wait for the crontab command")?;
            if !status.success() {
                bail!("crontab refused the new content ({status})");
            }
            Ok(())
        }
    }
}
