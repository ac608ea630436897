//! CLI definitions and entry point.

use crate::model::StateType;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// One-way incremental sync of Linear issues into Jira
#[derive(Parser, Debug)]
#[command(name = "ljsync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the sync state file (default: ~/.linear-jira-sync)
    #[arg(long, global = true, env = "LINEARSYNC_STORAGE_LOCATION")]
    pub state_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync Linear issues into Jira
    Sync(SyncArgs),

    /// Show the local sync state
    Status,

    /// Delete the local sync state (a backup is kept)
    Reset(ResetArgs),

    /// Check the Linear and Jira credentials
    TestConnection,

    /// List the issue types of the configured Jira project
    ListIssueTypes,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Only issues of this Linear team (key)
    #[arg(short = 't', long)]
    pub team: Option<String>,

    /// Only issues whose workflow state has this type
    #[arg(short = 's', long, value_enum)]
    pub state: Option<StateType>,

    /// Sync a single issue by identifier (e.g. ENG-123)
    #[arg(short = 'i', long = "issue", conflicts_with_all = ["team", "state", "updated_after", "force_full_sync"])]
    pub issue: Option<String>,

    /// Only issues updated at or after this time (RFC3339, YYYY-MM-DD, or -7d)
    #[arg(short = 'u', long)]
    pub updated_after: Option<String>,

    /// Ignore the stored watermark and fetch every issue
    #[arg(short = 'f', long)]
    pub force_full_sync: bool,

    /// Report what would change without writing to Jira or the state file
    #[arg(short = 'd', long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Default)]
pub struct ResetArgs {
    /// Actually delete the state file
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: ShellType,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    #[value(alias = "pwsh")]
    /// `PowerShell`
    PowerShell,
    Elvish,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_flags() {
        let cli = Cli::try_parse_from([
            "ljsync", "-v", "sync", "-t", "ENG", "-s", "started", "-u", "2024-06-01", "-d",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 1);
        let Commands::Sync(args) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(args.team.as_deref(), Some("ENG"));
        assert_eq!(args.state, Some(StateType::Started));
        assert_eq!(args.updated_after.as_deref(), Some("2024-06-01"));
        assert!(args.dry_run);
        assert!(!args.force_full_sync);
    }

    #[test]
    fn test_single_issue_conflicts_with_batch_filters() {
        assert!(Cli::try_parse_from(["ljsync", "sync", "-i", "ENG-1", "-t", "ENG"]).is_err());
        assert!(Cli::try_parse_from(["ljsync", "sync", "-i", "ENG-1", "-d"]).is_ok());
    }

    #[test]
    fn test_unknown_state_type_rejected() {
        assert!(Cli::try_parse_from(["ljsync", "sync", "-s", "unknown"]).is_err());
        assert!(Cli::try_parse_from(["ljsync", "sync", "-s", "canceled"]).is_ok());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["ljsync", "-q", "-v", "status"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ljsync", "status", "--json", "--state-dir", "/tmp/x"])
            .expect("parse");
        assert!(cli.json);
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/x")));
    }
}
