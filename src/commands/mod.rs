//! CLI command implementations.
//!
//! Commands orchestrate the library components to perform user tasks.
//! The import command:
//! 1. Reads and parses the trace file
//! 2. Runs the importer
//! 3. Writes the profile group document
//! 4. Optionally prints a per-profile summary

use crate::importer::import_chrome_trace;
use crate::output::{document_for_group, write_profile_group};
use crate::profile::{Profile, ProfileGroup};
use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the import command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ImportArgs {
    /// Path to the trace JSON file
    pub input: PathBuf,

    /// Output path for the profile group document
    pub output: PathBuf,

    /// Print a text summary to stdout
    pub print_summary: bool,

    /// Number of frames to show per profile in the summary
    pub top_frames: usize,
}

impl Default for ImportArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("trace.json"),
            output: PathBuf::from("profile.json"),
            print_summary: false,
            top_frames: 10,
        }
    }
}

/// Validate import arguments before doing any work
///
/// **Public** - called from main.rs before execute_import
pub fn validate_args(args: &ImportArgs) -> Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }
    if args.top_frames == 0 {
        anyhow::bail!("--top-frames must be at least 1");
    }
    Ok(())
}

/// Execute the import command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * File read or JSON parse failures
/// * Any `ImportError` from the importer
/// * File write errors
pub fn execute_import(args: ImportArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Importing trace: {}", args.input.display());

    // Step 1: Read and parse the trace file
    info!("Step 1/3: Reading trace file...");
    let contents = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let trace: serde_json::Value =
        serde_json::from_str(&contents).context("Trace file is not valid JSON")?;

    debug!("Trace file is {} bytes", contents.len());

    // Step 2: Run the importer
    info!("Step 2/3: Reconstructing call stacks...");
    let group = import_chrome_trace(&trace).context("Failed to import trace")?;

    info!(
        "Imported {} profiles from {}",
        group.profiles.len(),
        args.input.display()
    );

    // Step 3: Write the document
    info!("Step 3/3: Writing profile group...");
    let document = document_for_group(&group);
    write_profile_group(&document, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if args.print_summary {
        print_summary(&group, args.top_frames);
    }

    info!("Import completed in {:.2?}", start_time.elapsed());

    Ok(())
}

/// Print a per-profile table of the heaviest frames
///
/// **Private** - summary reporting for the import command
fn print_summary(group: &ProfileGroup, top_frames: usize) {
    for profile in &group.profiles {
        println!();
        println!("{} - total weight {}", profile.name, profile.total_weight);

        for (name, self_weight) in heaviest_frames(profile, top_frames) {
            let percentage = if profile.total_weight > 0.0 {
                (self_weight / profile.total_weight) * 100.0
            } else {
                0.0
            };
            println!("  {:>10.1} ({:>5.1}%)  {}", self_weight, percentage, name);
        }
    }
}

/// Frames ranked by accumulated self weight, heaviest first
///
/// **Private** - internal aggregation for print_summary
fn heaviest_frames(profile: &Profile, top_frames: usize) -> Vec<(String, f64)> {
    let mut by_frame: HashMap<&str, f64> = HashMap::new();
    for node in &profile.nodes {
        *by_frame.entry(node.frame.name.as_str()).or_insert(0.0) += node.self_weight;
    }

    let mut ranked: Vec<(String, f64)> = by_frame
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(top_frames);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::StackProfileBuilder;
    use crate::profile::{Frame, FrameKey};
    use serde_json::Map;
    use std::rc::Rc;

    fn frame(label: &str) -> Rc<Frame> {
        let mut args = Map::new();
        args.insert("name".to_string(), serde_json::Value::from(label));
        Rc::new(Frame {
            key: FrameKey::of_args(&args),
            name: label.to_string(),
        })
    }

    #[test]
    fn test_heaviest_frames_ranked_by_self_weight() {
        let hot = frame("hot");
        let cold = frame("cold");
        let mut builder = StackProfileBuilder::new("test");
        builder.enter_frame(&hot, 0.0);
        builder.leave_frame(&hot, 9.0);
        builder.enter_frame(&cold, 9.0);
        builder.leave_frame(&cold, 10.0);
        let profile = builder.build();

        let ranked = heaviest_frames(&profile, 10);

        assert_eq!(ranked[0], ("hot".to_string(), 9.0));
        assert_eq!(ranked[1], ("cold".to_string(), 1.0));
    }

    #[test]
    fn test_heaviest_frames_truncates() {
        let mut builder = StackProfileBuilder::new("test");
        for (i, label) in ["a", "b", "c"].iter().enumerate() {
            let f = frame(label);
            builder.enter_frame(&f, i as f64);
            builder.leave_frame(&f, i as f64 + 1.0);
        }
        let profile = builder.build();

        assert_eq!(heaviest_frames(&profile, 2).len(), 2);
    }

    #[test]
    fn test_validate_args_rejects_missing_input() {
        let args = ImportArgs {
            input: PathBuf::from("/definitely/not/here.json"),
            ..ImportArgs::default()
        };
        assert!(validate_args(&args).is_err());
    }
}
