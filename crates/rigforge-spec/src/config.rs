//! Build configuration.
//!
//! Every value here is an artistic tunable rather than a derived quantity:
//! sign conventions, weight fractions, and offsets that a rigger may want to
//! change per character without touching the compiler.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A local transform axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Component index (X = 0, Y = 1, Z = 2).
    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Upper-case letter used in channel names (`rotate` + `X`).
    pub fn letter(&self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

/// Complete configuration for one rig build.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RigConfig {
    pub blend: BlendConfig,
    pub twist: TwistConfig,
    pub fingers: FingerConfig,
    pub spline: SplineConfig,
    pub controls: ControlConfig,
}

impl RigConfig {
    /// Parses a configuration from JSON. Missing sections take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// IK/FK blend switch parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BlendConfig {
    /// Upper bound of the user-facing blend attribute (lower bound is 0).
    pub attr_max: f64,
    /// Factor converting the attribute into a normalized weight.
    pub weight_scale: f64,
    /// Leave the IK control of a segment's topmost joint unbound from the blend.
    pub suppress_top_ik_visibility: bool,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            attr_max: 10.0,
            weight_scale: 0.1,
            suppress_top_ik_visibility: true,
        }
    }
}

/// Twist distribution parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TwistConfig {
    /// Axis the driver's rotation delta is read from and written to.
    pub axis: Axis,
    /// Fractions of the driver delta applied to the first and second twist joint.
    pub fractions: [f64; 2],
}

impl Default for TwistConfig {
    fn default() -> Self {
        Self {
            axis: Axis::X,
            fractions: [1.0 / 3.0, 2.0 / 3.0],
        }
    }
}

/// Finger curl and spread parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FingerConfig {
    pub curl_axis: Axis,
    /// Degrees of rotation per unit of the `Curl` attribute.
    pub curl_degrees_per_unit: f64,
    pub curl_min: f64,
    pub curl_max: f64,
    /// Skip the thumb's first joint when fanning out curl.
    pub exclude_thumb_metacarpal: bool,
    pub spread_axis: Axis,
    pub spread_min: f64,
    pub spread_max: f64,
    /// Degrees per unit of `Spread`, keyed by finger chain name. Missing or
    /// zero entries get no spread network.
    pub spread_degrees_per_unit: BTreeMap<String, f64>,
}

impl Default for FingerConfig {
    fn default() -> Self {
        Self {
            curl_axis: Axis::Z,
            curl_degrees_per_unit: 9.0,
            curl_min: -2.0,
            curl_max: 10.0,
            exclude_thumb_metacarpal: true,
            spread_axis: Axis::Y,
            spread_min: -5.0,
            spread_max: 10.0,
            spread_degrees_per_unit: [("index", -2.0), ("ring", 1.5), ("pinky", 3.0)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

/// Spline spine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SplineConfig {
    /// Requested curve degree, clamped to `points - 1` for short spines.
    pub curve_degree: u8,
    pub twist_axis: Axis,
    /// Multiplier applied to the first control's twist-axis rotation to get roll.
    pub roll_sign: f64,
    /// Signed weights of the first, middle, and last control in the twist sum.
    pub twist_weights: [f64; 3],
}

impl Default for SplineConfig {
    fn default() -> Self {
        Self {
            curve_degree: 4,
            twist_axis: Axis::X,
            roll_sign: -1.0,
            twist_weights: [-1.0, 1.0, 1.0],
        }
    }
}

/// Placement offsets for controls that do not sit on their joint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ControlConfig {
    /// Distance of pole controls from their joint along Z (legs forward, arms back).
    pub pole_offset: f64,
    /// Distance of switch controls from their joint along X, signed by side.
    pub switch_offset: f64,
    /// Height of hand controls above the hand joint.
    pub hand_offset: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            pole_offset: 40.0,
            switch_offset: 10.0,
            hand_offset: 8.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = RigConfig::default();
        assert_eq!(config.blend.attr_max, 10.0);
        assert_eq!(config.blend.weight_scale, 0.1);
        assert!(config.blend.suppress_top_ik_visibility);
        assert_eq!(config.twist.axis, Axis::X);
        assert_eq!(config.spline.curve_degree, 4);
        assert_eq!(config.fingers.spread_degrees_per_unit.get("middle"), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = RigConfig::from_json(r#"{ "spline": { "roll_sign": 1.0 } }"#).unwrap();
        assert_eq!(config.spline.roll_sign, 1.0);
        assert_eq!(config.spline.twist_weights, [-1.0, 1.0, 1.0]);
        assert_eq!(config.blend, BlendConfig::default());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(RigConfig::from_json(r#"{ "blend": { "scale": 2.0 } }"#).is_err());
        assert!(RigConfig::from_json(r#"{ "extra": {} }"#).is_err());
    }

    #[test]
    fn test_axis_naming() {
        assert_eq!(Axis::Y.letter(), "Y");
        assert_eq!(Axis::Z.index(), 2);
        assert_eq!(serde_json::to_string(&Axis::X).unwrap(), "\"x\"");
    }
}
