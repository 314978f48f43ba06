//! Build command implementation
//!
//! Loads a skeleton, runs the full rig pipeline inside an undo chunk, and
//! reports what was built.

use anyhow::{Context, Result};
use colored::Colorize;
use rigforge_compiler::{build_rig, RigError, RigReport};
use rigforge_spec::RigforgeError;
use serde_json::json;
use std::fs;
use std::process::ExitCode;
use std::time::Instant;

use crate::input::{load_catalog, load_config, load_skeleton_def};
use crate::session::EditorSession;

/// Arguments of `rigforge build`.
#[derive(Debug, Clone, Default)]
pub struct BuildArgs<'a> {
    /// Preset name or skeleton JSON path.
    pub skeleton: &'a str,
    /// Joint to rig from; defaults to the skeleton root.
    pub root: Option<&'a str>,
    pub schema: Option<&'a str>,
    pub config: Option<&'a str>,
    /// Where to write the rigged scene as JSON.
    pub output: Option<&'a str>,
    pub json: bool,
}

/// Run the build command
///
/// # Returns
/// Exit code: 0 if the rig was built, 1 if a stage failed
pub fn run(args: &BuildArgs<'_>) -> Result<ExitCode> {
    let start = Instant::now();
    let (def, source) = load_skeleton_def(args.skeleton)?;
    let catalog = load_catalog(args.schema)?;
    let config = load_config(args.config)?;

    if !args.json {
        println!("{} {}", "Building:".cyan().bold(), source);
    }

    let mut session = EditorSession::new();
    let skeleton_root = session
        .load(&def)
        .with_context(|| format!("Failed to load skeleton: {}", source))?;
    let root = session.select(args.root, skeleton_root)?;

    let result = session.undo_chunk("auto_rig_lite", |scene| {
        build_rig(scene, &catalog, &config, root)
    });

    let report = match result {
        Ok(report) => report,
        Err(e) if args.json => {
            print_json_failure(&e)?;
            return Ok(ExitCode::from(1));
        }
        Err(e) => {
            eprintln!("{} [{}] {}", "FAILED".red().bold(), e.code(), e);
            println!("{}", "Scene restored to its state before the build.".dimmed());
            return Ok(ExitCode::from(1));
        }
    };

    if let Some(path) = args.output {
        let scene_json = session.scene().to_json().context("Failed to serialize scene")?;
        fs::write(path, scene_json).with_context(|| format!("Failed to write scene: {}", path))?;
    }

    if args.json {
        print_json_success(&report, args.output)?;
    } else {
        print_human(&report, args.output, start.elapsed().as_millis());
    }
    Ok(ExitCode::SUCCESS)
}

fn print_human(report: &RigReport, output: Option<&str>, elapsed_ms: u128) {
    println!();
    println!("{}", report);
    println!();
    if let Some(path) = output {
        println!("{} {}", "Scene:".dimmed(), path);
    }
    println!(
        "{} {} stages in {}ms",
        "SUCCESS".green().bold(),
        report.stages.len(),
        elapsed_ms
    );
}

fn print_json_success(report: &RigReport, output: Option<&str>) -> Result<()> {
    let value = json!({
        "success": true,
        "report": report,
        "output": output,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_json_failure(error: &RigError) -> Result<()> {
    let stage = match error {
        RigError::StageFailed { stage, .. } => Some(stage.as_str()),
        _ => None,
    };
    let value = json!({
        "success": false,
        "error": {
            "code": error.code(),
            "category": error.category(),
            "stage": stage,
            "message": error.root_cause().to_string(),
        },
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
