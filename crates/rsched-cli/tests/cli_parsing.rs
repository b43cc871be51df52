use clap::Parser;
use rsched_cli::cli_args::{Cli, Command};

#[test]
fn schedule_with_profile_and_dry_run() {
    let cli = Cli::try_parse_from(["rsched", "schedule", "--name", "home", "--dry-run"])
        .expect("arguments parse");
    assert!(matches!(cli.command, Command::Schedule));
    assert_eq!(cli.global.name.as_deref(), Some("home"));
    assert!(cli.global.dry_run);
    assert!(!cli.global.all);
    assert!(cli.global.config.is_none());
}

#[test]
fn global_flags_accepted_before_the_subcommand() {
    let cli = Cli::try_parse_from([
        "rsched",
        "--config",
        "/etc/rsched/config.toml",
        "--file",
        "/etc/cron.d/rsched",
        "unschedule",
    ])
    .expect("arguments parse");
    assert!(matches!(cli.command, Command::Unschedule));
    assert_eq!(cli.global.config.as_deref(), Some("/etc/rsched/config.toml"));
    assert_eq!(cli.global.file.as_deref(), Some("/etc/cron.d/rsched"));
}

#[test]
fn all_conflicts_with_a_profile_name() {
    let result = Cli::try_parse_from(["rsched", "status", "--all", "--name", "home"]);
    assert!(result.is_err());
}

#[test]
fn a_subcommand_is_required() {
    let result = Cli::try_parse_from(["rsched"]);
    assert!(result.is_err());
}

#[test]
fn unknown_subcommands_are_rejected() {
    let result = Cli::try_parse_from(["rsched", "reschedule"]);
    assert!(result.is_err());
}
