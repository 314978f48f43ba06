//! rigforge Declarative Inputs
//!
//! This crate holds everything the rig compiler reads but never mutates:
//!
//! - [`schema`]: the Schema Catalog, named joint chains grouped by body
//!   category and side
//! - [`skeleton`]: serde skeleton definitions and the built-in presets
//! - [`config`]: tunable build parameters (blend scale, twist fractions,
//!   finger curl rates, spline sign conventions, control offsets)
//! - [`naming`]: sides, group names, and attribute names shared by every stage
//! - [`error`]: the [`RigforgeError`] trait every rigforge error implements
//!
//! # Example
//!
//! ```
//! use rigforge_spec::schema::{Category, SchemaCatalog};
//! use rigforge_spec::skeleton::SkeletonPreset;
//!
//! let catalog = SchemaCatalog::mannequin();
//! catalog.validate().unwrap();
//! catalog
//!     .validate_disjoint(&[Category::Spine, Category::Arm, Category::Leg])
//!     .unwrap();
//!
//! let skeleton = SkeletonPreset::MannequinLite.build();
//! skeleton.validate().unwrap();
//! assert_eq!(skeleton.root().map(|j| j.name.as_str()), Some("root"));
//! ```

pub mod config;
pub mod error;
pub mod naming;
pub mod schema;
pub mod skeleton;

pub use config::{
    Axis, BlendConfig, ControlConfig, FingerConfig, RigConfig, SplineConfig, TwistConfig,
};
pub use error::RigforgeError;
pub use naming::Side;
pub use schema::{Category, ChainRef, SchemaCatalog, SchemaError, TwistTriple};
pub use skeleton::{JointDef, SkeletonDef, SkeletonError, SkeletonPreset};
