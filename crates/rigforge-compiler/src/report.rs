//! Summary of a rig build.

use std::collections::BTreeMap;
use std::fmt;

use rigforge_scene::{KindFilter, SceneGraph};
use serde::Serialize;

use crate::context::RigContext;
use crate::registry::{ControlCategory, Variant};
use crate::stage::Stage;

const VARIANTS: [Variant; 3] = [Variant::Deform, Variant::Fk, Variant::Ik];

const CATEGORIES: [ControlCategory; 5] = [
    ControlCategory::Main,
    ControlCategory::Fk,
    ControlCategory::Ik,
    ControlCategory::Switch,
    ControlCategory::Hand,
];

/// What a build produced.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RigReport {
    /// Stages that completed, in order.
    pub stages: Vec<Stage>,
    /// Registered joints per variant.
    pub variants: BTreeMap<Variant, usize>,
    /// Registered controls per category.
    pub controls: BTreeMap<ControlCategory, usize>,
    pub utility_nodes: usize,
    pub constraints: usize,
    pub ik_handles: usize,
    pub skin_bindings: usize,
    /// Optional items that were not built, with reasons.
    pub skipped: Vec<String>,
}

impl RigReport {
    /// Snapshots the registry and scene of a context.
    pub fn collect<S: SceneGraph + ?Sized>(cx: &RigContext<'_, S>, stages: Vec<Stage>) -> Self {
        Self {
            stages,
            variants: VARIANTS
                .into_iter()
                .map(|v| (v, cx.registry.joint_count(v)))
                .collect(),
            controls: CATEGORIES
                .into_iter()
                .map(|c| (c, cx.registry.control_count(c)))
                .collect(),
            utility_nodes: cx.scene.count(KindFilter::Utility),
            constraints: cx.scene.count(KindFilter::Constraint),
            ik_handles: cx.scene.count(KindFilter::IkHandle),
            skin_bindings: cx.scene.count(KindFilter::SkinBinding),
            skipped: cx.skipped().to_vec(),
        }
    }

    /// Total registered controls.
    pub fn control_total(&self) -> usize {
        self.controls.values().sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RigReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Variants:")?;
        for (variant, count) in &self.variants {
            writeln!(f, "  {:<8} {} joints", variant, count)?;
        }
        writeln!(f, "Controls: {}", self.control_total())?;
        for (category, count) in &self.controls {
            writeln!(f, "  {:<8} {}", category, count)?;
        }
        writeln!(f, "Utility nodes: {}", self.utility_nodes)?;
        writeln!(f, "Constraints:   {}", self.constraints)?;
        writeln!(f, "IK handles:    {}", self.ik_handles)?;
        write!(f, "Skin bindings: {}", self.skin_bindings)?;
        if !self.skipped.is_empty() {
            writeln!(f)?;
            write!(f, "Skipped: {}", self.skipped.len())?;
            for item in &self.skipped {
                write!(f, "\n  {}", item)?;
            }
        }
        Ok(())
    }
}
