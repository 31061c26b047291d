//! Generation commands - translation and story jobs.

use colored::Colorize;
use tabula::remote::{GenerationEndpoint, GenerationRequest};
use tabula::Workspace;

pub fn translate(
    workspace: &Workspace,
    sheet: Option<&str>,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = workspace.translation_request(sheet)?;
    send(workspace, GenerationEndpoint::BatchTranslate, &request, dry_run)
}

pub fn story(workspace: &Workspace, full: bool, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (endpoint, request) = if full {
        (GenerationEndpoint::FullStoryGenerate, workspace.full_story_request()?)
    } else {
        (GenerationEndpoint::StoryGenerate, workspace.story_request()?)
    };
    send(workspace, endpoint, &request, dry_run)
}

fn send(
    workspace: &Workspace,
    endpoint: GenerationEndpoint,
    request: &GenerationRequest,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if dry_run {
        println!("{}", serde_json::to_string_pretty(request)?);
        eprintln!(
            "{} {} rows for {} (not sent)",
            "Dry run:".yellow().bold(),
            request.row_count(),
            endpoint.path()
        );
        return Ok(());
    }

    let client = workspace.generation_client()?;
    let status = workspace.submit(&client, endpoint, request)?;

    println!(
        "{} {} rows to {} (HTTP {})",
        "Submitted".green().bold(),
        request.row_count().to_string().white().bold(),
        endpoint.path(),
        status
    );
    println!("Results will be written to {}", request.sheet_name.white());
    Ok(())
}
