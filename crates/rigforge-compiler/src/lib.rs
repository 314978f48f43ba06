//! rigforge Rig Graph Compiler
//!
//! Turns a joint skeleton plus a [`SchemaCatalog`](rigforge_spec::SchemaCatalog)
//! into an animation rig inside any [`SceneGraph`](rigforge_scene::SceneGraph):
//!
//! - [`variant`]: deform, FK, and IK skeleton variants
//! - [`controls`] and [`shapes`]: proxy controls per role
//! - [`freeze`]: rest-pose freeze into offset matrices
//! - [`blend`]: IK/FK blend networks and visibility wiring
//! - [`drivers`] and [`spline`]: FK drivers, limb IK handles, spline spine
//! - [`distribution`] and [`hand`]: twist and finger networks
//! - [`pipeline`]: the fixed-order build and its [`RigReport`]
//!
//! Stages share a [`RigContext`] holding the build's [`Registry`].
//!
//! # Example
//!
//! ```
//! use rigforge_compiler::{build_rig, Variant};
//! use rigforge_scene::{load_skeleton, Scene};
//! use rigforge_spec::{RigConfig, SchemaCatalog, SkeletonPreset};
//!
//! let mut scene = Scene::new();
//! let root = load_skeleton(&mut scene, &SkeletonPreset::MannequinLite.build()).unwrap();
//! let report = build_rig(&mut scene, &SchemaCatalog::mannequin(), &RigConfig::default(), root)
//!     .unwrap();
//! assert_eq!(report.variants[&Variant::Fk], 17);
//! ```

pub mod blend;
pub mod context;
pub mod controls;
pub mod distribution;
pub mod drivers;
pub mod error;
pub mod freeze;
pub mod hand;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod shapes;
pub mod spline;
pub mod stage;
pub mod variant;

pub use blend::{blend_pair, wire_blend_networks, BlendPair};
pub use context::{joint_map, RigContext};
pub use controls::{build_fk_controls, build_ik_controls, build_switch_controls};
pub use distribution::{wire_finger_curl, wire_finger_spread, wire_twist_distribution, TwistNetwork};
pub use drivers::{wire_fk_joint_drivers, wire_ik_joint_drivers};
pub use error::{RigError, RigResult};
pub use freeze::freeze_to_offset;
pub use hand::{build_hand_rig, HandRig};
pub use pipeline::{
    auto_rig_lite, build_controls, build_rig, wire_distribution_networks, wire_joint_drivers,
};
pub use registry::{ControlCategory, Namespace, Registry, Variant};
pub use report::RigReport;
pub use shapes::{ControlRole, SizeTier};
pub use spline::{build_spline_spine, SplineSpine, SPLINE_GROUP};
pub use stage::Stage;
pub use variant::{compile_skeleton_variants, compile_variant, register_deform_skeleton};
