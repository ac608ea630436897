use clap::Parser;
use linear_jira_sync::cli::commands;
use linear_jira_sync::cli::{Cli, Commands};
use linear_jira_sync::config;
use linear_jira_sync::logging::init_logging;
use linear_jira_sync::{StructuredError, SyncError};
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let overrides = build_cli_overrides(&cli);

    let result = match &cli.command {
        Commands::Sync(args) => commands::sync::execute(args, cli.json, cli.quiet, &overrides),
        Commands::Status => commands::status::execute(cli.json, &overrides).map(|()| true),
        Commands::Reset(args) => commands::reset::execute(args, cli.json, &overrides).map(|()| true),
        Commands::TestConnection => commands::test_connection::execute(cli.json, &overrides),
        Commands::ListIssueTypes => {
            commands::list_issue_types::execute(cli.json, &overrides).map(|()| true)
        }
        Commands::Completions(args) => commands::completions::execute(args).map(|()| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => handle_error(&e, cli.json),
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &SyncError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}

fn build_cli_overrides(cli: &Cli) -> config::CliOverrides {
    config::CliOverrides {
        state_dir: cli.state_dir.clone(),
        dry_run: None,
    }
}
