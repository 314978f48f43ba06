//! Naming conventions shared by every build stage.

use serde::{Deserialize, Serialize};

/// Top-level container for everything a build creates.
pub const RIG_ROOT: &str = "RIG_ROOT";
/// Container for skeleton variants, under [`RIG_ROOT`].
pub const SKELETON_GROUP: &str = "skeleton";
/// Container for control systems, under [`RIG_ROOT`].
pub const CONTROLS_GROUP: &str = "controls";
/// Container for the registered deform skeleton, under [`SKELETON_GROUP`].
pub const DEFORM_GROUP: &str = "deform_joints";

pub const MAIN_SYSTEM: &str = "MainSystem";
pub const FK_SYSTEM: &str = "FKSystem";
pub const IK_SYSTEM: &str = "IKSystem";
pub const SWITCH_SYSTEM: &str = "FKIKSystem";
pub const HAND_SYSTEM: &str = "HandSystem";

/// Registry key of the main root control.
pub const MAIN_CONTROL: &str = "root";

pub const BLEND_ATTR: &str = "IKFKBlend";
pub const AUTO_VIS_ATTR: &str = "AutoVis";
pub const FK_VIS_ATTR: &str = "FKVis";
pub const IK_VIS_ATTR: &str = "IKVis";
pub const FOLLOW_ATTR: &str = "Follow";
pub const LOCK_ATTR: &str = "Lock";
pub const SPREAD_ATTR: &str = "Spread";

/// Finger chain whose first joint is a metacarpal.
pub const THUMB_CHAIN: &str = "thumb";

/// Body side a chain belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
    Center,
}

impl Side {
    /// Returns the suffix used in joint and chain names.
    pub fn suffix(&self) -> &'static str {
        match self {
            Side::Left => "_l",
            Side::Right => "_r",
            Side::Center => "",
        }
    }

    /// Returns +1 for left, -1 for right, 0 for center.
    pub fn sign(&self) -> f64 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
            Side::Center => 0.0,
        }
    }

    /// Infers the side from a semantic name suffix.
    pub fn of(name: &str) -> Side {
        if name.ends_with("_l") {
            Side::Left
        } else if name.ends_with("_r") {
            Side::Right
        } else {
            Side::Center
        }
    }
}

/// Joins a semantic name and a decoration with an underscore (`hand_l` + `ik` -> `hand_l_ik`).
pub fn decorated(name: &str, decoration: &str) -> String {
    format!("{}_{}", name, decoration)
}

/// Name of the per-finger curl attribute on a hand control (`index` -> `indexCurl`).
pub fn curl_attr(finger: &str) -> String {
    format!("{}Curl", finger)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_from_name() {
        assert_eq!(Side::of("hand_l"), Side::Left);
        assert_eq!(Side::of("thigh_r"), Side::Right);
        assert_eq!(Side::of("spine_01"), Side::Center);
    }

    #[test]
    fn test_side_serde() {
        assert_eq!(serde_json::to_string(&Side::Left).unwrap(), "\"left\"");
        let parsed: Side = serde_json::from_str("\"center\"").unwrap();
        assert_eq!(parsed, Side::Center);
    }

    #[test]
    fn test_decorated_names() {
        assert_eq!(decorated("upperarm_l", "ikfk"), "upperarm_l_ikfk");
        assert_eq!(curl_attr("pinky"), "pinkyCurl");
    }
}
