//! Error reporting shared by every rigforge crate.

use crate::schema::SchemaError;
use crate::skeleton::SkeletonError;

/// Trait implemented by every rigforge error type.
///
/// Gives the CLI and tests a uniform way to get a stable code and a category
/// regardless of which crate raised the error.
pub trait RigforgeError: std::error::Error {
    /// Stable error code such as "SCHEMA_002" or "RIG_004".
    fn code(&self) -> &'static str;

    /// Human-readable message. Defaults to the `Display` output.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Category used to group related errors ("schema", "scene", "rig").
    fn category(&self) -> &'static str;
}

impl RigforgeError for SchemaError {
    fn code(&self) -> &'static str {
        match self {
            SchemaError::EmptyChainName => "SCHEMA_001",
            SchemaError::EmptyChain { .. } => "SCHEMA_002",
            SchemaError::EmptyJointName { .. } => "SCHEMA_003",
            SchemaError::DuplicateInChain { .. } => "SCHEMA_004",
            SchemaError::OverlappingChains { .. } => "SCHEMA_005",
            SchemaError::InvalidTwistChain { .. } => "SCHEMA_006",
        }
    }

    fn category(&self) -> &'static str {
        "schema"
    }
}

impl RigforgeError for SkeletonError {
    fn code(&self) -> &'static str {
        match self {
            SkeletonError::Empty => "SKEL_001",
            SkeletonError::EmptyJointName => "SKEL_002",
            SkeletonError::DuplicateJoint { .. } => "SKEL_003",
            SkeletonError::UnknownParent { .. } => "SKEL_004",
            SkeletonError::NoRoot => "SKEL_005",
            SkeletonError::MultipleRoots { .. } => "SKEL_006",
            SkeletonError::Cycle { .. } => "SKEL_007",
        }
    }

    fn category(&self) -> &'static str {
        "skeleton"
    }
}
