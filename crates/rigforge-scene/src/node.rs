//! Node, channel, and attribute types.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use glam::{DMat4, DQuat, DVec3, EulerRot};
use rigforge_spec::Axis;
use serde::{Deserialize, Serialize};

/// Stable handle to a node in a scene.
///
/// Handles survive renames and re-parenting, so no traversal order is needed to
/// keep them valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Arena slot of this handle.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Node kinds
// =============================================================================

/// Numeric utility node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityKind {
    /// `outputN = input1N * input2N` for N in X, Y, Z.
    Multiply,
    /// `outputN = 1 - inputN` for N in X, Y, Z.
    Reverse,
    /// `output = sum(input{i} * weight{i})`.
    WeightedSum { inputs: usize },
}

impl UtilityKind {
    /// Input attributes created with the node, with their initial values.
    pub fn inputs(&self) -> Vec<(String, f64)> {
        match self {
            UtilityKind::Multiply => ["X", "Y", "Z"]
                .iter()
                .flat_map(|a| [(format!("input1{}", a), 0.0), (format!("input2{}", a), 1.0)])
                .collect(),
            UtilityKind::Reverse => ["X", "Y", "Z"]
                .iter()
                .map(|a| (format!("input{}", a), 0.0))
                .collect(),
            UtilityKind::WeightedSum { inputs } => (0..*inputs)
                .flat_map(|i| [(sum_input(i), 0.0), (sum_weight(i), 1.0)])
                .collect(),
        }
    }

    /// Returns true if `attr` is a computed output of this kind.
    pub fn is_output(&self, attr: &str) -> bool {
        match self {
            UtilityKind::Multiply | UtilityKind::Reverse => {
                matches!(attr, "outputX" | "outputY" | "outputZ")
            }
            UtilityKind::WeightedSum { .. } => attr == SUM_OUTPUT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UtilityKind::Multiply => "multiply",
            UtilityKind::Reverse => "reverse",
            UtilityKind::WeightedSum { .. } => "weighted_sum",
        }
    }
}

/// Input attribute name of a multiply node on an axis (`input1X`).
pub fn multiply_input(slot: u8, axis: Axis) -> String {
    format!("input{}{}", slot, axis.letter())
}

/// Output attribute name of a multiply or reverse node on an axis (`outputX`).
pub fn utility_output(axis: Axis) -> String {
    format!("output{}", axis.letter())
}

/// Input attribute name of a reverse node on an axis (`inputX`).
pub fn reverse_input(axis: Axis) -> String {
    format!("input{}", axis.letter())
}

/// Output attribute of a weighted-sum node.
pub const SUM_OUTPUT: &str = "output";

/// Value input `i` of a weighted-sum node (`input0`).
pub fn sum_input(index: usize) -> String {
    format!("input{}", index)
}

/// Weight input `i` of a weighted-sum node (`weight0`).
pub fn sum_weight(index: usize) -> String {
    format!("weight{}", index)
}

/// Roll attribute of an IK handle.
pub const HANDLE_ROLL: &str = "roll";
/// Twist attribute of an IK handle.
pub const HANDLE_TWIST: &str = "twist";

/// IK solver used by a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IkSolver {
    RotatePlane,
    Spline,
}

/// Control points and degree of a curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveShape {
    pub points: Vec<[f64; 3]>,
    pub degree: u8,
    pub closed: bool,
}

impl CurveShape {
    /// An open curve.
    pub fn open(points: Vec<[f64; 3]>, degree: u8) -> Self {
        Self {
            points,
            degree,
            closed: false,
        }
    }

    /// A closed linear polyline.
    pub fn closed(points: Vec<[f64; 3]>) -> Self {
        Self {
            points,
            degree: 1,
            closed: true,
        }
    }
}

/// What a curve node is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveRole {
    /// Animator-facing control proxy.
    Control,
    /// Geometry consumed by another node (spline IK path).
    Path,
}

/// Everything needed to create an IK handle.
#[derive(Debug, Clone, PartialEq)]
pub struct IkHandleSpec {
    pub solver: IkSolver,
    pub start: NodeId,
    pub end: NodeId,
    pub curve: Option<NodeId>,
    pub pole: Option<NodeId>,
}

/// The kind of a scene node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Group,
    Joint,
    Control { shape: CurveShape },
    Curve { shape: CurveShape },
    Utility { utility: UtilityKind },
    /// Weighted parent constraint. Weight attributes are `w0..w{n-1}`.
    Constraint { drivers: Vec<NodeId>, driven: NodeId },
    IkHandle {
        solver: IkSolver,
        start: NodeId,
        end: NodeId,
        curve: Option<NodeId>,
        pole: Option<NodeId>,
    },
    SkinBinding { joints: Vec<NodeId>, target: NodeId },
}

impl NodeKind {
    /// Returns true for kinds that live in the transform hierarchy and carry channels.
    pub fn is_dag(&self) -> bool {
        matches!(
            self,
            NodeKind::Group
                | NodeKind::Joint
                | NodeKind::Control { .. }
                | NodeKind::Curve { .. }
                | NodeKind::IkHandle { .. }
        )
    }

    pub fn matches(&self, filter: KindFilter) -> bool {
        match filter {
            KindFilter::Any => true,
            KindFilter::Dag => self.is_dag(),
            KindFilter::Joint => matches!(self, NodeKind::Joint),
            KindFilter::Control => matches!(self, NodeKind::Control { .. }),
            KindFilter::Utility => matches!(self, NodeKind::Utility { .. }),
            KindFilter::Constraint => matches!(self, NodeKind::Constraint { .. }),
            KindFilter::IkHandle => matches!(self, NodeKind::IkHandle { .. }),
            KindFilter::SkinBinding => matches!(self, NodeKind::SkinBinding { .. }),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Joint => "joint",
            NodeKind::Control { .. } => "control",
            NodeKind::Curve { .. } => "curve",
            NodeKind::Utility { .. } => "utility",
            NodeKind::Constraint { .. } => "constraint",
            NodeKind::IkHandle { .. } => "ik_handle",
            NodeKind::SkinBinding { .. } => "skin_binding",
        }
    }
}

/// Node type filter for descendant listings and counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    Any,
    Dag,
    Joint,
    Control,
    Utility,
    Constraint,
    IkHandle,
    SkinBinding,
}

// =============================================================================
// Channels and plugs
// =============================================================================

/// A built-in transform channel of a DAG node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    TranslateX,
    TranslateY,
    TranslateZ,
    RotateX,
    RotateY,
    RotateZ,
    ScaleX,
    ScaleY,
    ScaleZ,
    Visibility,
}

impl Channel {
    pub const TRANSLATE: [Channel; 3] = [Channel::TranslateX, Channel::TranslateY, Channel::TranslateZ];
    pub const ROTATE: [Channel; 3] = [Channel::RotateX, Channel::RotateY, Channel::RotateZ];
    pub const SCALE: [Channel; 3] = [Channel::ScaleX, Channel::ScaleY, Channel::ScaleZ];
    pub const ALL: [Channel; 10] = [
        Channel::TranslateX,
        Channel::TranslateY,
        Channel::TranslateZ,
        Channel::RotateX,
        Channel::RotateY,
        Channel::RotateZ,
        Channel::ScaleX,
        Channel::ScaleY,
        Channel::ScaleZ,
        Channel::Visibility,
    ];

    pub fn translate(axis: Axis) -> Channel {
        Self::TRANSLATE[axis.index()]
    }

    pub fn rotate(axis: Axis) -> Channel {
        Self::ROTATE[axis.index()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::TranslateX => "translateX",
            Channel::TranslateY => "translateY",
            Channel::TranslateZ => "translateZ",
            Channel::RotateX => "rotateX",
            Channel::RotateY => "rotateY",
            Channel::RotateZ => "rotateZ",
            Channel::ScaleX => "scaleX",
            Channel::ScaleY => "scaleY",
            Channel::ScaleZ => "scaleZ",
            Channel::Visibility => "visibility",
        }
    }

    pub fn from_name(name: &str) -> Option<Channel> {
        Self::ALL.iter().copied().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An attribute of a specific node, used as a connection endpoint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Plug {
    pub node: NodeId,
    pub attr: String,
}

impl Plug {
    pub fn new(node: NodeId, attr: impl Into<String>) -> Self {
        Self {
            node,
            attr: attr.into(),
        }
    }

    pub fn channel(node: NodeId, channel: Channel) -> Self {
        Self::new(node, channel.as_str())
    }

    /// The built-in channel this plug names, if any.
    pub fn as_channel(&self) -> Option<Channel> {
        Channel::from_name(&self.attr)
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// Value type of an authored attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrKind {
    Double,
    Bool,
}

/// Declaration of an authored attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    pub kind: AttrKind,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub default: f64,
    pub keyable: bool,
}

impl AttributeSpec {
    /// A keyable bounded double.
    pub fn double(name: impl Into<String>, min: f64, max: f64, default: f64) -> Self {
        Self {
            name: name.into(),
            kind: AttrKind::Double,
            min: Some(min),
            max: Some(max),
            default,
            keyable: true,
        }
    }

    /// An unbounded double.
    pub fn scalar(name: impl Into<String>, default: f64) -> Self {
        Self {
            name: name.into(),
            kind: AttrKind::Double,
            min: None,
            max: None,
            default,
            keyable: false,
        }
    }

    /// A keyable boolean toggle.
    pub fn boolean(name: impl Into<String>, default: bool) -> Self {
        Self {
            name: name.into(),
            kind: AttrKind::Bool,
            min: None,
            max: None,
            default: if default { 1.0 } else { 0.0 },
            keyable: true,
        }
    }

    /// Coerces a value into this attribute's domain.
    pub fn coerce(&self, value: f64) -> f64 {
        match self.kind {
            AttrKind::Bool => {
                if value != 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            AttrKind::Double => {
                let v = self.min.map_or(value, |min| value.max(min));
                self.max.map_or(v, |max| v.min(max))
            }
        }
    }
}

/// An authored attribute and its stored value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    #[serde(flatten)]
    pub spec: AttributeSpec,
    pub value: f64,
}

// =============================================================================
// Transforms
// =============================================================================

/// Local translate (units), rotate (XYZ Euler degrees), and scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trs {
    pub translate: [f64; 3],
    pub rotate: [f64; 3],
    pub scale: [f64; 3],
}

impl Default for Trs {
    fn default() -> Self {
        Self {
            translate: [0.0; 3],
            rotate: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl Trs {
    pub fn from_translation(translate: [f64; 3]) -> Self {
        Self {
            translate,
            ..Self::default()
        }
    }

    pub fn get(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::TranslateX => Some(self.translate[0]),
            Channel::TranslateY => Some(self.translate[1]),
            Channel::TranslateZ => Some(self.translate[2]),
            Channel::RotateX => Some(self.rotate[0]),
            Channel::RotateY => Some(self.rotate[1]),
            Channel::RotateZ => Some(self.rotate[2]),
            Channel::ScaleX => Some(self.scale[0]),
            Channel::ScaleY => Some(self.scale[1]),
            Channel::ScaleZ => Some(self.scale[2]),
            Channel::Visibility => None,
        }
    }

    /// Writes a channel. Returns false for `Visibility`, which is not part of a TRS.
    pub fn set(&mut self, channel: Channel, value: f64) -> bool {
        let slot = match channel {
            Channel::TranslateX => &mut self.translate[0],
            Channel::TranslateY => &mut self.translate[1],
            Channel::TranslateZ => &mut self.translate[2],
            Channel::RotateX => &mut self.rotate[0],
            Channel::RotateY => &mut self.rotate[1],
            Channel::RotateZ => &mut self.rotate[2],
            Channel::ScaleX => &mut self.scale[0],
            Channel::ScaleY => &mut self.scale[1],
            Channel::ScaleZ => &mut self.scale[2],
            Channel::Visibility => return false,
        };
        *slot = value;
        true
    }

    pub fn to_matrix(&self) -> DMat4 {
        let [rx, ry, rz] = self.rotate;
        let rotation = DQuat::from_euler(
            EulerRot::XYZ,
            rx.to_radians(),
            ry.to_radians(),
            rz.to_radians(),
        );
        DMat4::from_scale_rotation_translation(
            DVec3::from(self.scale),
            rotation,
            DVec3::from(self.translate),
        )
    }

    pub fn from_matrix(matrix: &DMat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        let (rx, ry, rz) = rotation.to_euler(EulerRot::XYZ);
        Self {
            translate: translation.to_array(),
            rotate: [rx.to_degrees(), ry.to_degrees(), rz.to_degrees()],
            scale: scale.to_array(),
        }
    }
}

/// Returns true if two matrices agree component-wise within `epsilon`.
pub fn matrices_close(a: &DMat4, b: &DMat4, epsilon: f64) -> bool {
    a.abs_diff_eq(*b, epsilon)
}

// =============================================================================
// Scene node
// =============================================================================

/// One node of a [`Scene`](crate::Scene).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneNode {
    pub name: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    pub trs: Trs,
    /// Frozen rest pose, column-major.
    pub offset: [f64; 16],
    pub visibility: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u8>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Attribute>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub locked: BTreeSet<String>,
}

impl SceneNode {
    pub(crate) fn new(name: &str, kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            parent,
            children: Vec::new(),
            trs: Trs::default(),
            offset: DMat4::IDENTITY.to_cols_array(),
            visibility: 1.0,
            color: None,
            attributes: BTreeMap::new(),
            locked: BTreeSet::new(),
        }
    }

    pub fn offset_matrix(&self) -> DMat4 {
        DMat4::from_cols_array(&self.offset)
    }
}
