//! Pipeline stages, in build order.

use std::fmt;

use serde::Serialize;

/// One user-invocable stage of a rig build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    RegisterDeform,
    FkControls,
    IkControls,
    SwitchControls,
    Variants,
    BlendNetworks,
    FkDrivers,
    IkDrivers,
    TwistDistribution,
    HandRig,
}

impl Stage {
    /// Every stage in the order `auto_rig_lite` runs them.
    pub const ALL: [Stage; 10] = [
        Stage::RegisterDeform,
        Stage::FkControls,
        Stage::IkControls,
        Stage::SwitchControls,
        Stage::Variants,
        Stage::BlendNetworks,
        Stage::FkDrivers,
        Stage::IkDrivers,
        Stage::TwistDistribution,
        Stage::HandRig,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::RegisterDeform => "register_deform_skeleton",
            Stage::FkControls => "build_fk_controls",
            Stage::IkControls => "build_ik_controls",
            Stage::SwitchControls => "build_switch_controls",
            Stage::Variants => "compile_skeleton_variants",
            Stage::BlendNetworks => "wire_blend_networks",
            Stage::FkDrivers => "wire_fk_joint_drivers",
            Stage::IkDrivers => "wire_ik_joint_drivers",
            Stage::TwistDistribution => "wire_twist_distribution",
            Stage::HandRig => "build_hand_rig",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
