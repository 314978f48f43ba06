//! Schema command implementation
//!
//! Prints the schema catalog a build would consume.

use anyhow::Result;
use colored::Colorize;
use rigforge_spec::{Category, SchemaCatalog};
use std::process::ExitCode;

use crate::input::load_catalog;

/// Run the schema command
pub fn run(schema: Option<&str>, json: bool) -> Result<ExitCode> {
    let catalog = load_catalog(schema)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
    } else {
        print!("{}", render(&catalog));
    }
    Ok(ExitCode::SUCCESS)
}

fn render(catalog: &SchemaCatalog) -> String {
    let mut out = String::new();
    let mut current: Option<Category> = None;
    for chain in catalog.chains() {
        if current != Some(chain.category) {
            out.push_str(&format!("{}\n", chain.category.as_str().bold()));
            current = Some(chain.category);
        }
        out.push_str(&format!(
            "  {:<20} {}\n",
            chain.label(),
            chain.joints.join(" -> ").dimmed()
        ));
    }
    out
}
