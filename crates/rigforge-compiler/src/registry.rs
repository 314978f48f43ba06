//! Registry: the symbol table that links build stages.
//!
//! Joints are keyed by `(variant, semantic name)` and controls by
//! `(category, semantic key)`. Keys are write-once within a build; a second
//! write is a malformed schema and fails immediately.

use std::collections::BTreeMap;
use std::fmt;

use rigforge_scene::NodeId;
use serde::{Deserialize, Serialize};

use crate::error::{RigError, RigResult};

/// A skeleton variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// The original skeleton, kept whole and driven by the blend networks.
    Deform,
    /// Forward-kinematic copy driven by FK controls.
    Fk,
    /// Inverse-kinematic copy driven by IK handles.
    Ik,
}

impl Variant {
    /// Variants compiled from the deform skeleton by duplication and pruning.
    pub const COMPILED: [Variant; 2] = [Variant::Fk, Variant::Ik];

    /// Tag used in node names (`upperarm_l_fk`) and container names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Deform => "deform",
            Variant::Fk => "fk",
            Variant::Ik => "ik",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A control family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlCategory {
    /// The main root control.
    Main,
    Fk,
    /// IK end controls and pole controls.
    Ik,
    /// IK/FK switch controls, keyed by chain root.
    Switch,
    /// Finger controls, keyed by hand joint.
    Hand,
}

impl ControlCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlCategory::Main => "main",
            ControlCategory::Fk => "fk",
            ControlCategory::Ik => "ik",
            ControlCategory::Switch => "ikfk",
            ControlCategory::Hand => "hand",
        }
    }
}

impl fmt::Display for ControlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A registry namespace, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Joints(Variant),
    Controls(ControlCategory),
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Joints(v) => write!(f, "joints:{}", v),
            Namespace::Controls(c) => write!(f, "controls:{}", c),
        }
    }
}

/// Build-scoped symbol table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    joints: BTreeMap<(Variant, String), NodeId>,
    controls: BTreeMap<(ControlCategory, String), NodeId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Joints =====

    pub fn put_joint(&mut self, variant: Variant, name: &str, node: NodeId) -> RigResult<()> {
        let key = (variant, name.to_string());
        if self.joints.contains_key(&key) {
            return Err(RigError::DuplicateRegistryKey {
                namespace: Namespace::Joints(variant),
                key: key.1,
            });
        }
        self.joints.insert(key, node);
        Ok(())
    }

    /// Looks up a joint; absence is an error.
    pub fn joint(&self, variant: Variant, name: &str) -> RigResult<NodeId> {
        self.try_joint(variant, name)
            .ok_or_else(|| RigError::UnknownRegistryKey {
                namespace: Namespace::Joints(variant),
                key: name.to_string(),
            })
    }

    /// Looks up a joint; absence is a skip for the caller.
    pub fn try_joint(&self, variant: Variant, name: &str) -> Option<NodeId> {
        self.joints.get(&(variant, name.to_string())).copied()
    }

    /// Iterates the joints of one variant in name order.
    pub fn joints(&self, variant: Variant) -> impl Iterator<Item = (&str, NodeId)> {
        self.joints
            .iter()
            .filter(move |((v, _), _)| *v == variant)
            .map(|((_, name), node)| (name.as_str(), *node))
    }

    pub fn joint_count(&self, variant: Variant) -> usize {
        self.joints(variant).count()
    }

    // ===== Controls =====

    pub fn put_control(&mut self, category: ControlCategory, key: &str, node: NodeId) -> RigResult<()> {
        let entry = (category, key.to_string());
        if self.controls.contains_key(&entry) {
            return Err(RigError::DuplicateRegistryKey {
                namespace: Namespace::Controls(category),
                key: entry.1,
            });
        }
        self.controls.insert(entry, node);
        Ok(())
    }

    pub fn control(&self, category: ControlCategory, key: &str) -> RigResult<NodeId> {
        self.try_control(category, key)
            .ok_or_else(|| RigError::UnknownRegistryKey {
                namespace: Namespace::Controls(category),
                key: key.to_string(),
            })
    }

    pub fn try_control(&self, category: ControlCategory, key: &str) -> Option<NodeId> {
        self.controls.get(&(category, key.to_string())).copied()
    }

    pub fn controls(&self, category: ControlCategory) -> impl Iterator<Item = (&str, NodeId)> {
        self.controls
            .iter()
            .filter(move |((c, _), _)| *c == category)
            .map(|((_, key), node)| (key.as_str(), *node))
    }

    pub fn control_count(&self, category: ControlCategory) -> usize {
        self.controls(category).count()
    }

    // ===== Lifetime =====

    /// Forgets every control.
    pub fn clear_controls(&mut self) {
        self.controls.clear();
    }

    /// Forgets controls and joints of every variant. Called at the start of a
    /// full build, which recreates all of them.
    pub fn clear(&mut self) {
        self.joints.clear();
        self.controls.clear();
    }
}
