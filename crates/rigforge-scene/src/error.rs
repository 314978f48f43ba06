//! Error types for scene graph operations.

use rigforge_spec::{RigforgeError, SkeletonError};
use thiserror::Error;

use crate::node::NodeId;

/// Result type for scene graph operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Errors raised by a scene graph service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    /// Node handle does not refer to a live node.
    #[error("Unknown node {node}")]
    UnknownNode { node: NodeId },

    /// Attribute or channel does not exist on the node.
    #[error("Node '{node}' has no attribute '{attr}'")]
    UnknownAttribute { node: String, attr: String },

    /// Attribute was added twice.
    #[error("Node '{node}' already has an attribute named '{attr}'")]
    DuplicateAttribute { node: String, attr: String },

    /// Attempted to write or connect into a locked attribute.
    #[error("Attribute '{node}.{attr}' is locked")]
    LockedAttribute { node: String, attr: String },

    /// Attempted a direct write into an attribute that has an incoming connection.
    #[error("Attribute '{node}.{attr}' is driven by a connection")]
    ConnectedAttribute { node: String, attr: String },

    /// Attempted a direct write into a computed output.
    #[error("Attribute '{node}.{attr}' is a computed output")]
    ReadOnlyAttribute { node: String, attr: String },

    /// Re-parenting would make a node its own ancestor.
    #[error("Cannot parent '{node}' under '{parent}': would create a cycle")]
    InvalidParent { node: String, parent: String },

    /// Operation requires a different node kind.
    #[error("Node '{node}' is not a {expected}")]
    WrongKind { node: String, expected: &'static str },

    /// The dataflow graph feeds back into itself.
    #[error("Evaluation cycle through '{node}.{attr}'")]
    EvaluationCycle { node: String, attr: String },

    /// Curve has too few points for its degree.
    #[error("Curve '{name}' needs more than {degree} points for degree {degree}, got {points}")]
    InvalidCurve {
        name: String,
        degree: u8,
        points: usize,
    },

    /// Constraint created without drivers.
    #[error("Constraint '{name}' needs at least one driver")]
    NoDrivers { name: String },

    /// IK start joint is not an ancestor of the end joint.
    #[error("IK start '{start}' is not an ancestor of end '{end}'")]
    InvalidIkChain { start: String, end: String },

    /// Spline IK requested without a curve.
    #[error("Spline IK handle '{name}' requires a curve")]
    MissingSplineCurve { name: String },

    /// Skeleton definition failed validation while loading.
    #[error("Invalid skeleton: {0}")]
    Skeleton(#[from] SkeletonError),
}

impl RigforgeError for SceneError {
    fn code(&self) -> &'static str {
        match self {
            SceneError::UnknownNode { .. } => "SCENE_001",
            SceneError::UnknownAttribute { .. } => "SCENE_002",
            SceneError::DuplicateAttribute { .. } => "SCENE_003",
            SceneError::LockedAttribute { .. } => "SCENE_004",
            SceneError::ConnectedAttribute { .. } => "SCENE_005",
            SceneError::ReadOnlyAttribute { .. } => "SCENE_006",
            SceneError::InvalidParent { .. } => "SCENE_007",
            SceneError::WrongKind { .. } => "SCENE_008",
            SceneError::EvaluationCycle { .. } => "SCENE_009",
            SceneError::InvalidCurve { .. } => "SCENE_010",
            SceneError::NoDrivers { .. } => "SCENE_011",
            SceneError::InvalidIkChain { .. } => "SCENE_012",
            SceneError::MissingSplineCurve { .. } => "SCENE_013",
            SceneError::Skeleton(_) => "SCENE_014",
        }
    }

    fn category(&self) -> &'static str {
        "scene"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SceneError::LockedAttribute {
            node: "upperarm_l_ikfk".into(),
            attr: "translateX".into(),
        };
        assert_eq!(err.to_string(), "Attribute 'upperarm_l_ikfk.translateX' is locked");
        assert_eq!(err.code(), "SCENE_004");

        let err = SceneError::InvalidCurve {
            name: "spine_curve".into(),
            degree: 4,
            points: 3,
        };
        assert!(err.to_string().contains("got 3"));
    }
}
