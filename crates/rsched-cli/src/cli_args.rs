use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

/// Top-level CLI entrypoint.
#[derive(Parser, Debug, Clone)]
#[command(name = "rsched", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Args, Default)]
pub struct GlobalArgs {
    /// Configuration file path.
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    /// Profile to operate on.
    #[arg(short, long, global = true, value_name = "PROFILE")]
    pub name: Option<String>,

    /// Operate on every profile that declares a schedule.
    #[arg(long, global = true, action = ArgAction::SetTrue, conflicts_with = "name")]
    pub all: bool,

    /// Reconcile against this crontab file instead of the user crontab.
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub file: Option<String>,

    /// Print the resulting crontab to stdout instead of installing it.
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub dry_run: bool,
}

/// Supported subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Install the selected profiles' schedules into the crontab.
    Schedule,
    /// Remove the selected profiles' schedules from the crontab.
    Unschedule,
    /// Show the generated cron lines and whether they are installed.
    Status,
}
