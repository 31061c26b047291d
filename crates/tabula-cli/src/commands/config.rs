//! Config command - print the effective configuration.

use colored::Colorize;
use tabula::Workspace;

pub fn run(workspace: &Workspace) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "{} {}",
        "# Workspace".cyan().bold(),
        workspace.root().display().to_string().white()
    );
    print!("{}", workspace.config().to_toml()?);
    Ok(())
}
