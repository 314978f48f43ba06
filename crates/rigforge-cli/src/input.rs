//! Loading skeletons, schema catalogs, and build configuration.

use anyhow::{Context, Result};
use rigforge_spec::{RigConfig, SchemaCatalog, SkeletonDef, SkeletonPreset};
use std::fs;
use std::path::Path;

/// Where a skeleton came from.
#[derive(Debug, Clone, PartialEq)]
pub enum SkeletonSource {
    Preset(SkeletonPreset),
    File(String),
}

impl std::fmt::Display for SkeletonSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkeletonSource::Preset(p) => write!(f, "preset {}", p.as_str()),
            SkeletonSource::File(path) => write!(f, "{}", path),
        }
    }
}

/// Loads a skeleton from a preset name or a JSON file path.
///
/// Preset names win over files of the same name.
pub fn load_skeleton_def(arg: &str) -> Result<(SkeletonDef, SkeletonSource)> {
    if let Some(preset) = SkeletonPreset::from_name(arg) {
        return Ok((preset.build(), SkeletonSource::Preset(preset)));
    }

    let path = Path::new(arg);
    let text = fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read skeleton file: {} (not a preset either; see `rigforge presets`)",
            arg
        )
    })?;
    let def = SkeletonDef::from_json(&text)
        .with_context(|| format!("Failed to parse skeleton file: {}", arg))?;
    Ok((def, SkeletonSource::File(arg.to_string())))
}

/// Loads a schema catalog file, or the mannequin catalog when none is given.
pub fn load_catalog(path: Option<&str>) -> Result<SchemaCatalog> {
    let catalog = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read schema file: {}", path))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse schema file: {}", path))?
        }
        None => SchemaCatalog::mannequin(),
    };
    catalog.validate().context("Invalid schema catalog")?;
    Ok(catalog)
}

/// Loads a build configuration file, or the defaults when none is given.
pub fn load_config(path: Option<&str>) -> Result<RigConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            RigConfig::from_json(&text).with_context(|| format!("Failed to parse config file: {}", path))
        }
        None => Ok(RigConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_json(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_preset_by_name() {
        let (def, source) = load_skeleton_def("mannequin_lite").unwrap();
        assert_eq!(def.joints.len(), 18);
        assert_eq!(source, SkeletonSource::Preset(SkeletonPreset::MannequinLite));
    }

    #[test]
    fn test_skeleton_file() {
        let file = temp_json(r#"{ "joints": [ { "name": "root" } ] }"#);
        let path = file.path().to_str().unwrap();
        let (def, source) = load_skeleton_def(path).unwrap();
        assert_eq!(def.root().unwrap().name, "root");
        assert_eq!(source, SkeletonSource::File(path.to_string()));
    }

    #[test]
    fn test_missing_skeleton_mentions_presets() {
        let err = load_skeleton_def("/nonexistent/skeleton.json").unwrap_err();
        assert!(format!("{:#}", err).contains("rigforge presets"));
    }

    #[test]
    fn test_config_sections_default() {
        let file = temp_json(r#"{ "blend": { "weight_scale": 0.2 } }"#);
        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.blend.weight_scale, 0.2);
        assert_eq!(config.twist, RigConfig::default().twist);
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        let file = temp_json(r#"{ "blend": { "scale": 0.2 } }"#);
        assert!(load_config(file.path().to_str()).is_err());
    }

    #[test]
    fn test_invalid_catalog_rejected() {
        let file = temp_json(r#"{ "arm": { "left": { "arm": [] } } }"#);
        let err = load_catalog(file.path().to_str()).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid schema catalog"));
    }
}
