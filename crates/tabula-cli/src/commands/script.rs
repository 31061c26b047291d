//! Script commands - writer sheet to engine script and back.

use colored::Colorize;
use tabula::Workspace;

pub fn generate(
    workspace: &Workspace,
    dry_run: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = workspace.generate_script(dry_run)?;
    let verb = if dry_run { "Projected" } else { "Wrote" };

    println!(
        "{} {} rows across {} scenes",
        verb.cyan().bold(),
        report.rows.to_string().white().bold(),
        report.scenes.len()
    );
    if verbose {
        for scene in &report.scenes {
            println!("  {}", scene);
        }
    }
    println!("storyScripts now holds {} rows", report.total_rows);
    println!(
        "Text keys: {} new, {} updated",
        report.text_keys.inserted.to_string().green(),
        report.text_keys.updated.to_string().yellow()
    );

    if dry_run {
        println!();
        println!("{}", "Dry run - nothing written.".dimmed());
    }
    Ok(())
}

pub fn transfer(workspace: &Workspace, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let rows = workspace.transfer_script(dry_run)?;
    let verb = if dry_run { "Built" } else { "Transferred" };

    println!(
        "{} {} writer rows to GENERATOR",
        verb.cyan().bold(),
        rows.to_string().white().bold()
    );
    Ok(())
}
