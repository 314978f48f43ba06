//! Error types for the rig compiler.

use rigforge_scene::SceneError;
use rigforge_spec::{RigforgeError, SchemaError};
use thiserror::Error;

use crate::registry::Namespace;
use crate::stage::Stage;

/// Result type for rig compiler operations.
pub type RigResult<T> = Result<T, RigError>;

/// Errors raised while compiling a rig.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RigError {
    /// A semantic name or chain the current stage needs is missing from the skeleton.
    #[error("Joint '{name}' required by {context} was not found")]
    SchemaLookup { name: String, context: String },

    /// A registry key was written twice within one build.
    #[error("Registry key '{key}' already exists in {namespace}")]
    DuplicateRegistryKey { namespace: Namespace, key: String },

    /// A registry key a later stage depends on was never written.
    #[error("Registry key '{key}' not found in {namespace}")]
    UnknownRegistryKey { namespace: Namespace, key: String },

    /// A deepest-first structural pass visited a shallower node before a deeper one.
    #[error("Structural pass '{pass}' visited depth {depth} after depth {previous}")]
    StructuralOrdering {
        pass: &'static str,
        depth: usize,
        previous: usize,
    },

    /// The schema catalog cannot be consumed.
    #[error("Invalid schema: {0}")]
    InvalidSchema(#[from] SchemaError),

    /// The scene graph service rejected an operation.
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// A pipeline stage failed; earlier stages remain applied.
    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<RigError>,
    },
}

impl RigError {
    /// Creates a schema lookup error.
    pub fn schema_lookup(name: impl Into<String>, context: impl Into<String>) -> Self {
        Self::SchemaLookup {
            name: name.into(),
            context: context.into(),
        }
    }

    /// Wraps this error with the stage it occurred in.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            RigError::StageFailed { .. } => self,
            other => RigError::StageFailed {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, unwrapping stage context.
    pub fn root_cause(&self) -> &RigError {
        match self {
            RigError::StageFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl RigforgeError for RigError {
    fn code(&self) -> &'static str {
        match self {
            RigError::SchemaLookup { .. } => "RIG_001",
            RigError::DuplicateRegistryKey { .. } => "RIG_002",
            RigError::UnknownRegistryKey { .. } => "RIG_003",
            RigError::StructuralOrdering { .. } => "RIG_004",
            RigError::InvalidSchema(e) => e.code(),
            RigError::Scene(e) => e.code(),
            RigError::StageFailed { source, .. } => source.code(),
        }
    }

    fn category(&self) -> &'static str {
        match self {
            RigError::InvalidSchema(e) => e.category(),
            RigError::Scene(e) => e.category(),
            RigError::StageFailed { source, .. } => source.category(),
            _ => "rig",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Variant;

    #[test]
    fn test_stage_wrapping() {
        let err = RigError::schema_lookup("calf_l", "variant 'fk'").in_stage(Stage::Variants);
        assert_eq!(
            err.to_string(),
            "Stage 'compile_skeleton_variants' failed: Joint 'calf_l' required by variant 'fk' was not found"
        );
        assert_eq!(err.code(), "RIG_001");
        assert!(matches!(err.root_cause(), RigError::SchemaLookup { .. }));

        // Already-wrapped errors keep their original stage.
        let twice = err.clone().in_stage(Stage::HandRig);
        assert_eq!(twice, err);
    }

    #[test]
    fn test_wrapped_codes() {
        let err = RigError::from(SceneError::NoDrivers { name: "pc".into() });
        assert_eq!(err.code(), "SCENE_011");
        assert_eq!(err.category(), "scene");

        let err = RigError::DuplicateRegistryKey {
            namespace: Namespace::Joints(Variant::Fk),
            key: "hand_l".into(),
        };
        assert_eq!(err.to_string(), "Registry key 'hand_l' already exists in joints:fk");
    }
}
