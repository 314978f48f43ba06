//! Control roles, size tiers, and their curve shapes.

use std::f64::consts::PI;

use rigforge_scene::CurveShape;
use rigforge_spec::Axis;
use serde::{Deserialize, Serialize};

/// Size tier of a control. Named tiers resolve to a fixed radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeTier {
    Large,
    Medium,
    Small,
    Radius(f64),
}

impl SizeTier {
    pub fn radius(&self) -> f64 {
        match self {
            SizeTier::Large => 18.0,
            SizeTier::Medium => 10.0,
            SizeTier::Small => 4.0,
            SizeTier::Radius(r) => *r,
        }
    }
}

/// What a control is for. Decides its shape and display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlRole {
    /// Main root ring.
    Main,
    /// FK ring.
    Fk,
    /// IK end box.
    IkEnd,
    /// Flattened IK box for spine drivers.
    IkSpine,
    /// Pole vector cross.
    Pole,
    /// IK/FK switch octagon.
    Switch,
    /// Finger control half ring.
    Hand,
}

impl ControlRole {
    /// Display color index.
    pub fn color(&self) -> u8 {
        match self {
            ControlRole::Main => 17,
            ControlRole::Fk => 18,
            ControlRole::IkEnd | ControlRole::IkSpine | ControlRole::Pole => 13,
            ControlRole::Switch => 6,
            ControlRole::Hand => 14,
        }
    }

    /// Scene name of the control for `joint`.
    ///
    /// FK and IK controls carry a `_ctrl` tail so they never share a name
    /// with the `{joint}_fk` and `{joint}_ik` variant joints.
    pub fn control_name(&self, joint: &str) -> String {
        match self {
            ControlRole::Main => format!("{}_ctrl", joint),
            ControlRole::Fk => format!("{}_fk_ctrl", joint),
            ControlRole::IkEnd | ControlRole::IkSpine => format!("{}_ik_ctrl", joint),
            ControlRole::Pole => format!("{}_pole", joint),
            ControlRole::Switch => format!("{}_ikfk", joint),
            ControlRole::Hand => format!("{}_fingers", joint),
        }
    }

    pub fn shape(&self, tier: SizeTier) -> CurveShape {
        let r = tier.radius();
        match self {
            ControlRole::Main => ring(r, Axis::Z),
            ControlRole::Fk => ring(r, Axis::X),
            ControlRole::IkEnd => cuboid([r * 0.5; 3]),
            ControlRole::IkSpine => cuboid([r * 0.5, r * 0.15, r * 0.5]),
            ControlRole::Pole => cross(r * 0.5),
            ControlRole::Switch => octagon(r * 0.5),
            ControlRole::Hand => half_ring(r),
        }
    }
}

fn point_on_circle(radius: f64, normal: Axis, angle: f64) -> [f64; 3] {
    let (s, c) = angle.sin_cos();
    match normal {
        Axis::X => [0.0, c * radius, s * radius],
        Axis::Y => [c * radius, 0.0, s * radius],
        Axis::Z => [c * radius, s * radius, 0.0],
    }
}

/// Closed cubic circle with eight control points.
pub fn ring(radius: f64, normal: Axis) -> CurveShape {
    let points = (0..8)
        .map(|i| point_on_circle(radius, normal, i as f64 * PI / 4.0))
        .collect();
    CurveShape {
        points,
        degree: 3,
        closed: true,
    }
}

/// Open semicircle in the XZ plane, opening toward -Z.
pub fn half_ring(radius: f64) -> CurveShape {
    let points = (0..=8)
        .map(|i| point_on_circle(radius, Axis::Y, i as f64 * PI / 8.0))
        .collect();
    CurveShape::open(points, 1)
}

/// Wire box traced as one linear curve.
pub fn cuboid(half: [f64; 3]) -> CurveShape {
    let [x, y, z] = half;
    let corners = [
        [-x, -y, -z],
        [x, -y, -z],
        [x, -y, z],
        [-x, -y, z],
        [-x, -y, -z],
        [-x, y, -z],
        [x, y, -z],
        [x, y, z],
        [-x, y, z],
        [-x, y, -z],
        [x, y, -z],
        [x, -y, -z],
        [x, -y, z],
        [x, y, z],
        [-x, y, z],
        [-x, -y, z],
    ];
    CurveShape::open(corners.to_vec(), 1)
}

/// Three-axis cross through the origin.
pub fn cross(h: f64) -> CurveShape {
    CurveShape::open(
        vec![
            [-h, 0.0, 0.0],
            [h, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            [0.0, -h, 0.0],
            [0.0, h, 0.0],
            [0.0, 0.0, 0.0],
            [0.0, 0.0, -h],
            [0.0, 0.0, h],
        ],
        1,
    )
}

/// Flat octagon in the XY plane.
pub fn octagon(radius: f64) -> CurveShape {
    let points = (0..8)
        .map(|i| point_on_circle(radius, Axis::Z, PI / 8.0 + i as f64 * PI / 4.0))
        .collect();
    CurveShape::closed(points)
}
