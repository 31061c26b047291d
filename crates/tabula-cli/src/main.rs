//! Tabula CLI - localization and content pipeline for game workbooks.

mod cli;
mod commands;
mod logging;

use std::path::Path;

use clap::Parser;
use cli::{Cli, Commands};
use tabula::{TabulaConfig, Workspace};
use tracing::debug;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = open_workspace(&cli.workspace, cli.config.as_deref()).and_then(|workspace| {
        match cli.command {
            Commands::ValidateSchedule { dry_run, json } => {
                commands::validate::schedule(&workspace, dry_run, json)
            }
            Commands::ValidateJson { sheet, json } => {
                commands::validate::json_columns(&workspace, &sheet, json)
            }
            Commands::Translate { sheet, dry_run } => {
                commands::generate::translate(&workspace, sheet.as_deref(), dry_run)
            }
            Commands::ExportJson { dir } => commands::localization::export(&workspace, dir),
            Commands::ImportJson { dir, dry_run } => {
                commands::localization::import(&workspace, dir, dry_run)
            }
            Commands::GenerateScript { dry_run } => {
                commands::script::generate(&workspace, dry_run, cli.verbose)
            }
            Commands::TransferScript { dry_run } => commands::script::transfer(&workspace, dry_run),
            Commands::GenerateStory { full, dry_run } => {
                commands::generate::story(&workspace, full, dry_run)
            }
            Commands::Push { sheet, env, yes } => commands::sync::push(&workspace, &sheet, env, yes),
            Commands::Pull {
                sheet,
                env,
                exact,
                yes,
            } => commands::sync::pull(&workspace, &sheet, env, exact, yes),
            Commands::SyncAll { env, yes } => commands::sync::sync_all(&workspace, env, yes),
            Commands::CheckConnection { env } => commands::sync::check_connection(&workspace, env),
            Commands::Config => commands::config::run(&workspace),
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn open_workspace(
    root: &Path,
    config: Option<&Path>,
) -> Result<Workspace, Box<dyn std::error::Error>> {
    let workspace = match config {
        Some(path) => {
            if !path.is_file() {
                return Err(format!("Config file not found: {}", path.display()).into());
            }
            Workspace::with_config(root, TabulaConfig::load(path)?)
        }
        None => Workspace::open(root)?,
    };
    debug!(root = %root.display(), master = %workspace.config().workbooks.master, "workspace opened");
    Ok(workspace)
}
