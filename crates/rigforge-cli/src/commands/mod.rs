//! CLI command implementations

pub mod build;
pub mod presets;
pub mod schema;
