//! Sync commands - push and pull master sheets against the admin service.

use std::io::{self, BufRead, Write};

use colored::Colorize;
use tabula::remote::error_report;
use tabula::{Environment, TabulaError, Workspace};

pub fn push(
    workspace: &Workspace,
    sheet: &str,
    env: Environment,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = workspace.sheet_mapping()?.target(sheet).table_name;
    if env.is_production()
        && !yes
        && !confirm(&format!(
            "Push '{}' to PRODUCTION table '{}'? This modifies live data.",
            sheet, table
        ))?
    {
        println!("{}", "Production push cancelled.".yellow());
        return Ok(());
    }

    let api_key = env.api_key()?;
    let client = workspace.sync_client(env)?;

    match workspace.push_sheet(&client, &api_key, sheet) {
        Ok(outcome) => {
            let result = &outcome.result;
            if !result.success {
                let message = result.error.as_deref().unwrap_or("Unknown error");
                return Err(format!("Failed to sync: {}", message).into());
            }

            if result.has_warnings() {
                println!(
                    "{} {} -> {} [{}]",
                    "Synced with warnings".yellow().bold(),
                    sheet.white(),
                    outcome.table,
                    env
                );
                for line in result.report_lines() {
                    println!("  {}", line);
                }
            } else {
                println!(
                    "{} {} -> {} [{}]",
                    "Synced".green().bold(),
                    sheet.white(),
                    outcome.table,
                    env
                );
                println!("  {}", result.summary_line());
            }
            Ok(())
        }
        Err(e) => failure(env, sheet, &table, e),
    }
}

pub fn pull(
    workspace: &Workspace,
    sheet: &str,
    env: Environment,
    exact: Option<bool>,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = workspace.sheet_mapping()?.target(sheet);
    let effective = target.pull_exact_or(exact).unwrap_or(false);
    if env.is_production()
        && !yes
        && !confirm(&format!(
            "Pull '{}' from PRODUCTION table '{}' (exact: {})? Sheet data rows may be overwritten.",
            sheet, target.table_name, effective
        ))?
    {
        println!("{}", "Production pull cancelled.".yellow());
        return Ok(());
    }

    let api_key = env.api_key()?;
    let client = workspace.sync_client(env)?;

    match workspace.pull_sheet(&client, &api_key, sheet, exact) {
        Ok(outcome) => {
            if !outcome.result.success {
                let message = outcome.result.error.as_deref().unwrap_or("Unknown error");
                return Err(format!("Failed to pull: {}", message).into());
            }
            println!(
                "{} {} <- {} [{}]",
                "Pulled".green().bold(),
                sheet.white(),
                outcome.table,
                env
            );
            println!("  {}", outcome.result.summary_line());
            Ok(())
        }
        Err(e) => failure(env, sheet, &target.table_name, e),
    }
}

pub fn sync_all(workspace: &Workspace, env: Environment, yes: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !yes {
        let prompt = if env.is_production() {
            "Sync ALL sheets to PRODUCTION? This modifies live data for multiple tables.".to_string()
        } else {
            format!("Sync ALL sheets to {}?", env)
        };
        if !confirm(&prompt)? {
            println!("{}", "Sync cancelled.".yellow());
            return Ok(());
        }
    }

    let api_key = env.api_key()?;
    let client = workspace.sync_client(env)?;
    let results = workspace.sync_all(&client, &api_key)?;

    let failed: Vec<_> = results.iter().filter(|r| r.result.is_err()).collect();
    let succeeded = results.len() - failed.len();

    for sync in &results {
        match &sync.result {
            Ok(result) => println!(
                "  {} {:24} -> {:24} {}",
                "ok".green(),
                sync.sheet,
                sync.table,
                result.summary_line().dimmed()
            ),
            Err(message) => println!(
                "  {} {:24} -> {:24} {}",
                "FAIL".red().bold(),
                sync.sheet,
                sync.table,
                message
            ),
        }
    }
    println!();
    println!(
        "[{}] Synced {} sheets successfully, {} failed",
        env,
        succeeded.to_string().green().bold(),
        failed.len().to_string().red()
    );

    if !failed.is_empty() {
        return Err(format!("{} sheets failed to sync", failed.len()).into());
    }
    Ok(())
}

pub fn check_connection(workspace: &Workspace, env: Environment) -> Result<(), Box<dyn std::error::Error>> {
    let client = workspace.sync_client(env)?;
    let status = workspace.check_connection(&client)?;

    if status.reachable {
        println!(
            "{} {} (HTTP {})",
            "Connection successful:".green().bold(),
            status.url,
            status.status
        );
        Ok(())
    } else {
        Err(format!("{} server {} responded with status {}", env, status.url, status.status).into())
    }
}

fn failure(
    env: Environment,
    sheet: &str,
    table: &str,
    error: TabulaError,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("{} [{}] {} -> {}", "Sync failed".red().bold(), env, sheet, table);
    for line in error_report(&error) {
        eprintln!("  {}", line);
    }
    Err(error.into())
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} {} [y/N] ", "!".yellow().bold(), prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
