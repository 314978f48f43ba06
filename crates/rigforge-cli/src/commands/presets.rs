//! Presets command implementation

use anyhow::Result;
use colored::Colorize;
use rigforge_spec::SkeletonPreset;
use serde_json::json;
use std::process::ExitCode;

/// Run the presets command
pub fn run(json: bool) -> Result<ExitCode> {
    if json {
        let presets: Vec<_> = SkeletonPreset::ALL
            .iter()
            .map(|p| json!({ "name": p.as_str(), "joints": p.build().joints.len() }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&presets)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "Skeleton presets:".bold());
    for preset in SkeletonPreset::ALL {
        println!(
            "  {:<16} {}",
            preset.as_str().green(),
            format!("{} joints", preset.build().joints.len()).dimmed()
        );
    }
    Ok(ExitCode::SUCCESS)
}
