//! rigforge Scene Graph
//!
//! The boundary between the rig compiler and the host scene. The compiler only
//! ever talks to [`SceneGraph`]; [`Scene`] is an in-memory arena that
//! implements it and evaluates the dataflow graph the compiler synthesizes.
//!
//! - Nodes are addressed by stable [`NodeId`] handles.
//! - Channels and authored attributes are addressed by [`Plug`]s.
//! - Values are pulled on demand through connections, utility nodes, and
//!   weighted constraints.
//!
//! # Example
//!
//! ```
//! use rigforge_scene::{load_skeleton, Channel, Scene, SceneGraph};
//! use rigforge_spec::SkeletonPreset;
//!
//! let mut scene = Scene::new();
//! let root = load_skeleton(&mut scene, &SkeletonPreset::MannequinLite.build()).unwrap();
//! let spine = scene.find_child(Some(root), "spine_01").unwrap();
//! assert_eq!(scene.channel_value(spine, Channel::TranslateY).unwrap(), 100.0);
//! ```

pub mod error;
pub mod eval;
pub mod graph;
pub mod node;
pub mod scene;
pub mod skeleton;

pub use error::{SceneError, SceneResult};
pub use eval::{weight_attr, CONSTRAINT_OUTPUTS};
pub use graph::SceneGraph;
pub use node::{
    AttrKind, AttributeSpec, Channel, CurveRole, CurveShape, IkHandleSpec, IkSolver, KindFilter,
    NodeId, NodeKind, Plug, SceneNode, Trs, UtilityKind, HANDLE_ROLL, HANDLE_TWIST,
};
pub use node::{multiply_input, reverse_input, sum_input, sum_weight, utility_output, SUM_OUTPUT};
pub use scene::{Scene, SceneDocument};
pub use skeleton::load_skeleton;

pub use glam;
