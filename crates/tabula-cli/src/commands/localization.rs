//! Localization commands - JSON export and import.

use std::path::PathBuf;

use colored::Colorize;
use tabula::Workspace;

pub fn export(workspace: &Workspace, dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let files = workspace.export_json(dir.as_deref())?;

    if files.is_empty() {
        println!("{}", "No language columns found.".yellow());
        return Ok(());
    }

    for file in &files {
        println!(
            "{} {:8} {} keys  {}",
            "Wrote".green().bold(),
            file.language.white(),
            file.keys,
            file.path.display().to_string().dimmed()
        );
    }
    println!();
    println!("Exported {} languages", files.len().to_string().white().bold());
    Ok(())
}

pub fn import(
    workspace: &Workspace,
    dir: Option<PathBuf>,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary = workspace.import_json(dir.as_deref(), dry_run)?;
    let verb = if dry_run { "Would merge" } else { "Merged" };

    println!(
        "{} {} languages, {} keys ({} new)",
        verb.cyan().bold(),
        summary.languages.len().to_string().white().bold(),
        summary.keys,
        summary.added_keys.to_string().green()
    );
    if !summary.added_languages.is_empty() {
        println!("New language columns: {}", summary.added_languages.join(", ").green());
    }
    Ok(())
}
