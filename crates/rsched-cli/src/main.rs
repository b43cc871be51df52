use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rsched_cli::cli_args::{Cli, Command, GlobalArgs};
use rsched_cli::system::{CrontabTarget, read_crontab, write_crontab};
use rsched_core::{
    Crontab, DEFAULT_PROFILE_NAME, FileConfig, LoggingDestination, delete_line,
    entries_for_profiles, extract_own_section, init_logging, load_config,
};
use tracing::{info, warn};

fn main() {
    let cli = Cli::parse();
    if let Err(err) = init_logging(LoggingDestination::FileAndStderr) {
        eprintln!("Warning: logging unavailable: {err}");
    }
    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let loaded = load_config(cli.global.config.as_deref())?;
    for warning in &loaded.warnings {
        warn!("{warning}");
    }

    let selection = if cli.global.all {
        loaded.config.scheduled_profile_names()
    } else {
        vec![
            cli.global
                .name
                .clone()
                .unwrap_or_else(|| DEFAULT_PROFILE_NAME.to_string()),
        ]
    };
    let target = crontab_target(&cli.global, &loaded.config);

    match cli.command {
        Command::Schedule => schedule(&loaded.config, &loaded.path, &selection, &target, &cli.global),
        Command::Unschedule => {
            unschedule(&loaded.config, &loaded.path, &selection, &target, &cli.global)
        }
        Command::Status => status(&loaded.config, &loaded.path, &selection, &target),
    }
}

fn crontab_target(global: &GlobalArgs, config: &FileConfig) -> CrontabTarget {
    global
        .file
        .clone()
        .or_else(|| config.global.crontab_file.clone())
        .map(|path| CrontabTarget::File(PathBuf::from(path)))
        .unwrap_or(CrontabTarget::User)
}

fn schedule(
    config: &FileConfig,
    config_path: &std::path::Path,
    selection: &[String],
    target: &CrontabTarget,
    global: &GlobalArgs,
) -> anyhow::Result<()> {
    let entries = entries_for_profiles(config, config_path, selection)?;
    if entries.is_empty() {
        warn!(profiles = ?selection, "no schedules declared, installing an empty section");
    }
    let crontab = Crontab::new(entries);

    let existing = read_crontab(target)?;
    let mut buffer = Vec::new();
    crontab
        .update(&existing, true, &mut buffer)
        .context("cannot merge the crontab")?;
    let merged = String::from_utf8(buffer).context("merged crontab is not valid UTF-8")?;

    deliver(target, &merged, global)?;
    info!(
        profiles = ?selection,
        entries = crontab.entries().len(),
        "schedules installed"
    );
    Ok(())
}

fn unschedule(
    config: &FileConfig,
    config_path: &std::path::Path,
    selection: &[String],
    target: &CrontabTarget,
    global: &GlobalArgs,
) -> anyhow::Result<()> {
    let removed = entries_for_profiles(config, config_path, selection)?;
    let remaining: Vec<String> = config
        .scheduled_profile_names()
        .into_iter()
        .filter(|name| !selection.contains(name))
        .collect();
    let kept = entries_for_profiles(config, config_path, &remaining)?;

    let existing = read_crontab(target)?;
    let mut buffer = Vec::new();
    Crontab::new(kept)
        .update(&existing, true, &mut buffer)
        .context("cannot merge the crontab")?;
    let mut merged = String::from_utf8(buffer).context("merged crontab is not valid UTF-8")?;

    // retract standalone lines written by installs that predate the managed section
    for entry in &removed {
        let (next, found) = delete_line(&merged, entry)
            .with_context(|| format!("cannot match the line for '{}'", entry.command_name()))?;
        if found {
            info!(
                profile = entry.profile_name(),
                command = entry.command_name(),
                "removed legacy standalone line"
            );
        }
        merged = next;
    }

    deliver(target, &merged, global)?;
    info!(profiles = ?selection, "schedules removed");
    Ok(())
}

fn status(
    config: &FileConfig,
    config_path: &std::path::Path,
    selection: &[String],
    target: &CrontabTarget,
) -> anyhow::Result<()> {
    let entries = entries_for_profiles(config, config_path, selection)?;
    let crontab = Crontab::new(entries);

    let mut buffer = Vec::new();
    crontab
        .generate(&mut buffer)
        .context("cannot render the cron lines")?;
    let rendered = String::from_utf8(buffer).context("rendered crontab is not valid UTF-8")?;

    if rendered.is_empty() {
        println!("No schedules declared for {}.", selection.join(", "));
    } else {
        print!("{rendered}");
    }

    let existing = read_crontab(target)?;
    let (_, _, _, found) = extract_own_section(&existing);
    println!(
        "Managed section: {}",
        if found { "installed" } else { "not installed" }
    );
    Ok(())
}

fn deliver(target: &CrontabTarget, contents: &str, global: &GlobalArgs) -> anyhow::Result<()> {
    if global.dry_run {
        print!("{contents}");
        return Ok(());
    }
    write_crontab(target, contents)
}
