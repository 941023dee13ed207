//! Chrometrace Studio CLI
//!
//! Imports Chrome Trace Event Format recordings and writes per-thread
//! call-stack profiles suitable for flame-graph-style rendering.

use anyhow::Result;
use chrometrace_studio::commands::{execute_import, validate_args, ImportArgs};
use chrometrace_studio::output::{read_profile_group, SCHEMA_VERSION};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

/// Chrometrace Studio - call-stack profiles from Chrome traces
#[derive(Parser, Debug)]
#[command(name = "chrometrace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a trace file and write the reconstructed profiles
    Import {
        /// Path to the trace JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the profile group document
        #[arg(short, long, default_value = "profile.json")]
        output: PathBuf,

        /// Print a per-profile text summary to stdout
        #[arg(long)]
        summary: bool,

        /// Number of frames to show per profile in the summary
        #[arg(long, default_value = "10")]
        top_frames: usize,
    },

    /// Validate a previously written profile group document
    Validate {
        /// Path to profile group JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Import {
            input,
            output,
            summary,
            top_frames,
        } => {
            let args = ImportArgs {
                input,
                output,
                print_summary: summary,
                top_frames,
            };

            validate_args(&args)?;
            execute_import(args)?;
        }

        Commands::Validate { file } => {
            validate_document_file(file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Validate a profile group JSON file
///
/// **Private** - internal command implementation
fn validate_document_file(file_path: PathBuf) -> Result<()> {
    println!("Validating profile group: {}", file_path.display());

    let document = read_profile_group(&file_path)?;

    println!("✓ Valid profile group JSON");
    println!("  Version: {}", document.version);
    println!("  Name: {}", document.name);
    println!("  Profiles: {}", document.profiles.len());
    for profile in &document.profiles {
        println!(
            "    {} - {} nodes, total weight {}",
            profile.name,
            profile.nodes.len(),
            profile.total_weight
        );
    }

    Ok(())
}

/// Display version information
///
/// **Private** - internal command implementation
fn display_version() {
    println!("Chrometrace Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Profile Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Imports Chrome Trace Event Format recordings into call-stack profiles.");
}
