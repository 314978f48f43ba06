//! Skeleton definitions and presets.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

/// A joint in a skeleton definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JointDef {
    /// Semantic joint name (unique within the skeleton).
    pub name: String,
    /// Parent joint name; exactly one joint has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Translation relative to the parent joint.
    #[serde(default)]
    pub translate: [f64; 3],
    /// Euler rotation (degrees, XYZ) relative to the parent joint.
    #[serde(default)]
    pub rotate: [f64; 3],
}

impl JointDef {
    /// Creates a joint with a translation and no rotation.
    pub fn new(name: impl Into<String>, parent: Option<&str>, translate: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(str::to_string),
            translate,
            rotate: [0.0; 3],
        }
    }

    /// Sets the rest rotation.
    pub fn with_rotate(mut self, rotate: [f64; 3]) -> Self {
        self.rotate = rotate;
        self
    }
}

/// A rooted joint tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkeletonDef {
    pub joints: Vec<JointDef>,
}

impl SkeletonDef {
    /// Creates an empty skeleton.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a joint.
    pub fn joint(mut self, joint: JointDef) -> Self {
        self.joints.push(joint);
        self
    }

    /// Parses a skeleton from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns the first parentless joint.
    pub fn root(&self) -> Option<&JointDef> {
        self.joints.iter().find(|j| j.parent.is_none())
    }

    /// Looks up a joint by name.
    pub fn get(&self, name: &str) -> Option<&JointDef> {
        self.joints.iter().find(|j| j.name == name)
    }

    /// Returns true if the skeleton defines `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Validates the tree structure.
    pub fn validate(&self) -> Result<(), SkeletonError> {
        self.topological_order().map(|_| ())
    }

    /// Returns the joints ordered so every parent precedes its children.
    ///
    /// Siblings keep their definition order.
    pub fn topological_order(&self) -> Result<Vec<&JointDef>, SkeletonError> {
        if self.joints.is_empty() {
            return Err(SkeletonError::Empty);
        }

        let mut names = BTreeSet::new();
        for joint in &self.joints {
            if joint.name.is_empty() {
                return Err(SkeletonError::EmptyJointName);
            }
            if !names.insert(joint.name.as_str()) {
                return Err(SkeletonError::DuplicateJoint {
                    name: joint.name.clone(),
                });
            }
        }

        let mut root = None;
        let mut children: BTreeMap<&str, Vec<&JointDef>> = BTreeMap::new();
        for joint in &self.joints {
            match &joint.parent {
                None => {
                    if let Some(first) = root.replace(joint) {
                        return Err(SkeletonError::MultipleRoots {
                            first: first.name.clone(),
                            second: joint.name.clone(),
                        });
                    }
                }
                Some(parent) => {
                    if !names.contains(parent.as_str()) {
                        return Err(SkeletonError::UnknownParent {
                            joint: joint.name.clone(),
                            parent: parent.clone(),
                        });
                    }
                    children.entry(parent.as_str()).or_default().push(joint);
                }
            }
        }
        let root = root.ok_or(SkeletonError::NoRoot)?;

        let mut order = Vec::with_capacity(self.joints.len());
        let mut queue = VecDeque::from([root]);
        while let Some(joint) = queue.pop_front() {
            order.push(joint);
            if let Some(kids) = children.get(joint.name.as_str()) {
                queue.extend(kids.iter().copied());
            }
        }

        if order.len() != self.joints.len() {
            let reached: BTreeSet<&str> = order.iter().map(|j| j.name.as_str()).collect();
            let stranded = self
                .joints
                .iter()
                .find(|j| !reached.contains(j.name.as_str()))
                .map(|j| j.name.clone())
                .unwrap_or_default();
            return Err(SkeletonError::Cycle { joint: stranded });
        }

        Ok(order)
    }
}

/// Errors for skeleton definition validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkeletonError {
    #[error("Skeleton has no joints")]
    Empty,
    #[error("Joint name cannot be empty")]
    EmptyJointName,
    #[error("Duplicate joint name: {name}")]
    DuplicateJoint { name: String },
    #[error("Joint '{joint}' references unknown parent '{parent}'")]
    UnknownParent { joint: String, parent: String },
    #[error("Skeleton has no root joint")]
    NoRoot,
    #[error("Skeleton has more than one root joint ('{first}' and '{second}')")]
    MultipleRoots { first: String, second: String },
    #[error("Joint '{joint}' is not reachable from the root (parent cycle)")]
    Cycle { joint: String },
}

// =============================================================================
// Presets
// =============================================================================

/// Built-in skeletons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkeletonPreset {
    /// Root, five spine joints, arms, and legs (18 joints).
    MannequinLite,
    /// The lite skeleton plus three-joint fingers and forearm/calf twist bones (56 joints).
    MannequinFull,
}

impl SkeletonPreset {
    /// Every preset, in declaration order.
    pub const ALL: [SkeletonPreset; 2] = [SkeletonPreset::MannequinLite, SkeletonPreset::MannequinFull];

    /// Returns the preset identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            SkeletonPreset::MannequinLite => "mannequin_lite",
            SkeletonPreset::MannequinFull => "mannequin_full",
        }
    }

    /// Parses a preset identifier.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }

    /// Builds the skeleton definition.
    pub fn build(&self) -> SkeletonDef {
        mannequin(matches!(self, SkeletonPreset::MannequinFull))
    }
}

fn mannequin(full: bool) -> SkeletonDef {
    let mut skel = SkeletonDef::new()
        .joint(JointDef::new("root", None, [0.0, 0.0, 0.0]))
        .joint(JointDef::new("spine_01", Some("root"), [0.0, 100.0, 0.0]));
    for i in 2..=5 {
        let parent = format!("spine_{:02}", i - 1);
        skel = skel.joint(JointDef::new(
            format!("spine_{:02}", i),
            Some(parent.as_str()),
            [0.0, 10.0, 0.0],
        ));
    }

    for (s, x) in [("_l", 1.0), ("_r", -1.0)] {
        let n = |base: &str| format!("{}{}", base, s);

        skel = skel
            .joint(JointDef::new(n("upperarm"), Some("spine_05"), [18.0 * x, 5.0, 0.0]))
            .joint(JointDef::new(n("lowerarm"), Some(n("upperarm").as_str()), [28.0 * x, 0.0, 0.0]))
            .joint(JointDef::new(n("hand"), Some(n("lowerarm").as_str()), [26.0 * x, 0.0, 0.0]))
            .joint(JointDef::new(n("thigh"), Some("root"), [10.0 * x, 95.0, 0.0]))
            .joint(JointDef::new(n("calf"), Some(n("thigh").as_str()), [0.0, -45.0, 0.0]))
            .joint(JointDef::new(n("foot"), Some(n("calf").as_str()), [0.0, -42.0, 0.0]));

        if !full {
            continue;
        }

        skel = skel
            .joint(JointDef::new(n("lowerarm_twist_01"), Some(n("lowerarm").as_str()), [9.0 * x, 0.0, 0.0]))
            .joint(JointDef::new(n("lowerarm_twist_02"), Some(n("lowerarm").as_str()), [18.0 * x, 0.0, 0.0]))
            .joint(JointDef::new(n("calf_twist_01"), Some(n("calf").as_str()), [0.0, -14.0, 0.0]))
            .joint(JointDef::new(n("calf_twist_02"), Some(n("calf").as_str()), [0.0, -28.0, 0.0]));

        let fingers = [
            ("thumb", [3.0, -1.0, 3.0]),
            ("index", [9.0, 0.0, 2.0]),
            ("middle", [9.5, 0.0, 0.5]),
            ("ring", [9.0, 0.0, -1.0]),
            ("pinky", [8.0, 0.0, -2.5]),
        ];
        for (finger, [fx, fy, fz]) in fingers {
            let mut parent = n("hand");
            for i in 1..=3 {
                let name = format!("{}_{:02}{}", finger, i, s);
                let translate = if i == 1 {
                    [fx * x, fy, fz]
                } else {
                    [3.0 * x, 0.0, 0.0]
                };
                skel = skel.joint(JointDef::new(name.clone(), Some(parent.as_str()), translate));
                parent = name;
            }
        }
    }

    skel
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_presets_are_valid() {
        for preset in SkeletonPreset::ALL {
            let skel = preset.build();
            assert!(skel.validate().is_ok(), "{:?}", preset);
        }
        assert_eq!(SkeletonPreset::MannequinLite.build().joints.len(), 18);
        assert_eq!(SkeletonPreset::MannequinFull.build().joints.len(), 56);
    }

    #[test]
    fn test_preset_names() {
        assert_eq!(
            SkeletonPreset::from_name("mannequin_full"),
            Some(SkeletonPreset::MannequinFull)
        );
        assert_eq!(SkeletonPreset::from_name("biped"), None);
        let json = serde_json::to_string(&SkeletonPreset::MannequinLite).unwrap();
        assert_eq!(json, "\"mannequin_lite\"");
    }

    #[test]
    fn test_topological_order_parents_first() {
        let skel = SkeletonDef::new()
            .joint(JointDef::new("b", Some("a"), [1.0, 0.0, 0.0]))
            .joint(JointDef::new("a", None, [0.0; 3]))
            .joint(JointDef::new("c", Some("b"), [1.0, 0.0, 0.0]));

        let order: Vec<&str> = skel
            .topological_order()
            .unwrap()
            .iter()
            .map(|j| j.name.as_str())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(SkeletonDef::new().validate(), Err(SkeletonError::Empty));

        let dup = SkeletonDef::new()
            .joint(JointDef::new("a", None, [0.0; 3]))
            .joint(JointDef::new("a", Some("a"), [0.0; 3]));
        assert_eq!(
            dup.validate(),
            Err(SkeletonError::DuplicateJoint { name: "a".into() })
        );

        let orphan = SkeletonDef::new()
            .joint(JointDef::new("a", None, [0.0; 3]))
            .joint(JointDef::new("b", Some("missing"), [0.0; 3]));
        assert!(matches!(
            orphan.validate(),
            Err(SkeletonError::UnknownParent { .. })
        ));

        let two_roots = SkeletonDef::new()
            .joint(JointDef::new("a", None, [0.0; 3]))
            .joint(JointDef::new("b", None, [0.0; 3]));
        assert!(matches!(
            two_roots.validate(),
            Err(SkeletonError::MultipleRoots { .. })
        ));

        let cycle = SkeletonDef::new()
            .joint(JointDef::new("root", None, [0.0; 3]))
            .joint(JointDef::new("a", Some("b"), [0.0; 3]))
            .joint(JointDef::new("b", Some("a"), [0.0; 3]));
        assert_eq!(
            cycle.validate(),
            Err(SkeletonError::Cycle { joint: "a".into() })
        );
    }

    #[test]
    fn test_skeleton_json() {
        let json = r#"{
            "joints": [
                { "name": "root" },
                { "name": "spine_01", "parent": "root", "translate": [0, 100, 0] }
            ]
        }"#;
        let skel = SkeletonDef::from_json(json).unwrap();
        assert_eq!(skel.root().unwrap().name, "root");
        assert_eq!(skel.get("spine_01").unwrap().translate, [0.0, 100.0, 0.0]);
        assert_eq!(skel.get("spine_01").unwrap().rotate, [0.0; 3]);
    }
}
