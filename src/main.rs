use clap::Parser;
use jira_offline::cli::commands::{self, Workspace};
use jira_offline::cli::{Cli, Commands, OutputFormat};
use jira_offline::config::{self, CliOverrides};
use jira_offline::logging::init_logging;
use jira_offline::model::ProjectRegistry;
use jira_offline::store::Store;
use jira_offline::{JiraError, StructuredError};
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let overrides = build_cli_overrides(&cli);

    let json = cli.json;
    let result =
        commands::open_workspace(&overrides).and_then(|mut ws| run(&mut ws, cli.command, json));

    if let Err(e) = result {
        handle_error(&e, json, &overrides);
    }
}

fn run(ws: &mut Workspace, command: Commands, json: bool) -> jira_offline::Result<()> {
    match command {
        Commands::Ls(args) => commands::ls::execute(ws, &args, OutputFormat::from_json_flag(json)),
        Commands::Show { key } => commands::show::execute(ws, &key, json),
        Commands::New(args) => commands::new::execute(ws, args, json),
        Commands::Edit(args) => commands::edit::execute(ws, args, json),
        Commands::Stats { command, project } => {
            commands::stats::execute(ws, command, project.as_deref(), json)
        }
        Commands::Lint(args) => commands::lint::execute(ws, &args, json),
        Commands::Projects => commands::projects::execute(ws, json),
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &JiraError, json_mode: bool, overrides: &CliOverrides) -> ! {
    let structured = match err {
        JiraError::IssueNotFound { key } => {
            StructuredError::issue_not_found(key, &known_keys(overrides))
        }
        _ => StructuredError::from_error(err),
    };
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

/// Keys in the cache, for "did you mean" hints; empty when it cannot load.
fn known_keys(overrides: &CliOverrides) -> Vec<String> {
    let Ok(config) = config::load_config(overrides) else {
        return Vec::new();
    };
    let projects = ProjectRegistry::load(&config.projects_path).unwrap_or_default();
    Store::open(&config, &projects)
        .map(|store| store.keys().map(str::to_string).collect())
        .unwrap_or_default()
}

fn build_cli_overrides(cli: &Cli) -> CliOverrides {
    CliOverrides {
        config: cli.config.clone(),
        data_dir: cli.data_dir.clone(),
        cache: cli.cache.clone(),
        timezone: cli.timezone.clone(),
    }
}
