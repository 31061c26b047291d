//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tabula::Environment;

/// Tabula: localization and content pipeline for game workbooks
#[derive(Parser)]
#[command(name = "tabula")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace directory holding the workbooks and tabula.toml
    #[arg(short, long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Config file (default: <workspace>/tabula.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the character schedule and write the results sheet
    ValidateSchedule {
        /// Report findings without writing the results sheet
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that every json-typed column of a master sheet holds valid JSON
    ValidateJson {
        /// Sheet in the master workbook
        #[arg(value_name = "SHEET")]
        sheet: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send rows marked #translate to the translation backend
    Translate {
        /// Localization sheet (default from config)
        #[arg(long)]
        sheet: Option<String>,

        /// Print the request instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Export the localization sheet to one JSON file per language
    ExportJson {
        /// Output directory (default from config)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Merge per-language JSON files into the localization sheet
    ImportJson {
        /// Input directory (default from config)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Project the GENERATOR sheet into storyScripts and register text keys
    GenerateScript {
        /// Build and merge without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Turn generated scripts back into GENERATOR writer rows
    TransferScript {
        /// Build rows without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Send scenes flagged isGenerate to the story generation backend
    GenerateStory {
        /// Generate whole scenes from script_info instead of per-line dialogue
        #[arg(long)]
        full: bool,

        /// Print the request instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Push a master sheet to the admin database
    Push {
        /// Sheet in the master workbook
        #[arg(value_name = "SHEET")]
        sheet: String,

        /// Target environment (prod, dev)
        #[arg(short, long)]
        env: Environment,

        /// Skip the production confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Ask the admin service to write its table back into a master sheet
    Pull {
        /// Sheet in the master workbook
        #[arg(value_name = "SHEET")]
        sheet: String,

        /// Target environment (prod, dev)
        #[arg(short, long)]
        env: Environment,

        /// Exact pull (overrides the mapping's pullExact)
        #[arg(long)]
        exact: Option<bool>,

        /// Skip the production confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Push every master sheet except # sheets and the mapping sheet
    SyncAll {
        /// Target environment (prod, dev)
        #[arg(short, long)]
        env: Environment,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Check that the admin server is reachable
    CheckConnection {
        /// Target environment (prod, dev)
        #[arg(short, long)]
        env: Environment,
    },

    /// Print the effective configuration
    Config,
}
