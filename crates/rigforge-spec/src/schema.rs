//! Schema Catalog: named joint chains grouped by body category and side.
//!
//! The catalog is a nested mapping `category -> side -> chain name -> joints`.
//! Joint order inside a chain is root-to-leaf and is load-bearing: the
//! variant compiler prunes by it and the control builder nests by it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::naming::{Side, THUMB_CHAIN};

// =============================================================================
// Categories
// =============================================================================

/// Body category of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Spine segment (one chain, center side).
    Spine,
    /// Arm limbs (upper arm -> lower arm -> hand).
    Arm,
    /// Leg limbs (thigh -> calf -> foot).
    Leg,
    /// Finger chains, driven by hand-control curl attributes.
    Finger,
    /// Twist triples: a driver joint followed by two twist joints.
    Twist,
}

impl Category {
    /// Categories that get FK/IK variants, controls, and a blend switch.
    pub const SWITCHABLE: [Category; 3] = [Category::Spine, Category::Arm, Category::Leg];

    /// Returns the string identifier for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Spine => "spine",
            Category::Arm => "arm",
            Category::Leg => "leg",
            Category::Finger => "finger",
            Category::Twist => "twist",
        }
    }

    /// Returns true for limb categories (arm and leg).
    pub fn is_limb(&self) -> bool {
        matches!(self, Category::Arm | Category::Leg)
    }
}

// =============================================================================
// Chain views
// =============================================================================

/// Borrowed view of one chain in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainRef<'a> {
    pub category: Category,
    pub side: Side,
    pub name: &'a str,
    pub joints: &'a [String],
}

impl<'a> ChainRef<'a> {
    /// Chain name with the side suffix (`arm` on the left -> `arm_l`).
    pub fn label(&self) -> String {
        format!("{}{}", self.name, self.side.suffix())
    }

    /// First (root-most) joint of the chain.
    pub fn root(&self) -> Option<&'a str> {
        self.joints.first().map(String::as_str)
    }

    /// Last (leaf-most) joint of the chain.
    pub fn end(&self) -> Option<&'a str> {
        self.joints.last().map(String::as_str)
    }

    /// Returns true if the chain lists `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.joints.iter().any(|j| j == name)
    }

    /// Returns true for the thumb chain of a hand.
    pub fn is_thumb(&self) -> bool {
        self.category == Category::Finger && self.name == THUMB_CHAIN
    }
}

/// A twist chain split into its driver and the two distributed joints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwistTriple<'a> {
    pub label: &'a str,
    pub side: Side,
    pub driver: &'a str,
    pub first: &'a str,
    pub second: &'a str,
}

// =============================================================================
// Catalog
// =============================================================================

type SideChains = BTreeMap<Side, BTreeMap<String, Vec<String>>>;

/// The immutable catalog of chains a rig build consumes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaCatalog {
    categories: BTreeMap<Category, SideChains>,
}

impl SchemaCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a chain.
    pub fn with_chain<S: Into<String>>(
        mut self,
        category: Category,
        side: Side,
        name: impl Into<String>,
        joints: impl IntoIterator<Item = S>,
    ) -> Self {
        self.categories
            .entry(category)
            .or_default()
            .entry(side)
            .or_default()
            .insert(name.into(), joints.into_iter().map(Into::into).collect());
        self
    }

    /// Iterates every chain, ordered by category, side, then chain name.
    pub fn chains(&self) -> impl Iterator<Item = ChainRef<'_>> {
        self.categories.iter().flat_map(|(category, sides)| {
            sides.iter().flat_map(move |(side, chains)| {
                chains.iter().map(move |(name, joints)| ChainRef {
                    category: *category,
                    side: *side,
                    name: name.as_str(),
                    joints: joints.as_slice(),
                })
            })
        })
    }

    /// Iterates the chains of one category.
    pub fn chains_in(&self, category: Category) -> impl Iterator<Item = ChainRef<'_>> {
        self.chains().filter(move |c| c.category == category)
    }

    /// Iterates the chains of several categories, in the given category order.
    /// The yielded chains borrow only the catalog, not `categories`.
    pub fn chains_in_all<'a>(
        &'a self,
        categories: &[Category],
    ) -> impl Iterator<Item = ChainRef<'a>> + 'a {
        categories
            .to_vec()
            .into_iter()
            .flat_map(move |c| self.chains_in(c))
    }

    /// Looks up a single chain.
    pub fn chain(&self, category: Category, side: Side, name: &str) -> Option<ChainRef<'_>> {
        self.chains_in(category)
            .find(|c| c.side == side && c.name == name)
    }

    /// Union of the joint names of every chain in `categories`.
    pub fn members(&self, categories: &[Category]) -> BTreeSet<&str> {
        self.chains_in_all(categories)
            .flat_map(|c| c.joints.iter().map(String::as_str))
            .collect()
    }

    /// Returns the hand joint for a side: the end of that side's arm chain.
    pub fn hand_joint(&self, side: Side) -> Option<&str> {
        self.chains_in(Category::Arm)
            .find(|c| c.side == side)
            .and_then(|c| c.end())
    }

    /// Splits every twist chain into driver and twist joints.
    pub fn twist_triples(&self) -> Result<Vec<TwistTriple<'_>>, SchemaError> {
        self.chains_in(Category::Twist)
            .map(|c| match c.joints {
                [driver, first, second] => Ok(TwistTriple {
                    label: c.name,
                    side: c.side,
                    driver,
                    first,
                    second,
                }),
                _ => Err(SchemaError::InvalidTwistChain {
                    chain: c.label(),
                    len: c.joints.len(),
                }),
            })
            .collect()
    }

    /// Validates chain shapes (names, emptiness, duplicates within a chain).
    pub fn validate(&self) -> Result<(), SchemaError> {
        for chain in self.chains() {
            if chain.name.is_empty() {
                return Err(SchemaError::EmptyChainName);
            }
            if chain.joints.is_empty() {
                return Err(SchemaError::EmptyChain {
                    chain: chain.label(),
                });
            }
            let mut seen = BTreeSet::new();
            for joint in chain.joints {
                if joint.is_empty() {
                    return Err(SchemaError::EmptyJointName {
                        chain: chain.label(),
                    });
                }
                if !seen.insert(joint.as_str()) {
                    return Err(SchemaError::DuplicateInChain {
                        chain: chain.label(),
                        name: joint.clone(),
                    });
                }
            }
        }
        self.twist_triples().map(|_| ())
    }

    /// Checks that the chains of `categories` are pairwise disjoint.
    ///
    /// Variants rename members to `{name}_{variant}`, which only stays
    /// collision-free when no semantic name belongs to two consumed chains.
    pub fn validate_disjoint(&self, categories: &[Category]) -> Result<(), SchemaError> {
        let mut owner: BTreeMap<&str, String> = BTreeMap::new();
        for chain in self.chains_in_all(categories) {
            for joint in chain.joints {
                if let Some(first) = owner.insert(joint.as_str(), chain.label()) {
                    return Err(SchemaError::OverlappingChains {
                        name: joint.clone(),
                        first,
                        second: chain.label(),
                    });
                }
            }
        }
        Ok(())
    }

    /// The UE5-style mannequin catalog.
    pub fn mannequin() -> Self {
        let mut catalog = Self::new().with_chain(
            Category::Spine,
            Side::Center,
            "spine",
            ["spine_01", "spine_02", "spine_03", "spine_04", "spine_05"],
        );

        for side in [Side::Left, Side::Right] {
            let s = side.suffix();
            let n = |base: &str| format!("{}{}", base, s);

            catalog = catalog
                .with_chain(
                    Category::Arm,
                    side,
                    "arm",
                    [n("upperarm"), n("lowerarm"), n("hand")],
                )
                .with_chain(Category::Leg, side, "leg", [n("thigh"), n("calf"), n("foot")])
                .with_chain(
                    Category::Twist,
                    side,
                    "lowerarm_twist",
                    [n("hand"), n("lowerarm_twist_01"), n("lowerarm_twist_02")],
                )
                .with_chain(
                    Category::Twist,
                    side,
                    "calf_twist",
                    [n("foot"), n("calf_twist_01"), n("calf_twist_02")],
                );

            for finger in ["thumb", "index", "middle", "ring", "pinky"] {
                catalog = catalog.with_chain(
                    Category::Finger,
                    side,
                    finger,
                    (1..=3).map(|i| format!("{}_{:02}{}", finger, i, s)),
                );
            }
        }

        catalog
    }
}

/// Errors for schema catalog validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Chain name cannot be empty")]
    EmptyChainName,
    #[error("Chain '{chain}' has no joints")]
    EmptyChain { chain: String },
    #[error("Chain '{chain}' contains an empty joint name")]
    EmptyJointName { chain: String },
    #[error("Joint '{name}' appears more than once in chain '{chain}'")]
    DuplicateInChain { chain: String, name: String },
    #[error("Joint '{name}' is claimed by both chain '{first}' and chain '{second}'")]
    OverlappingChains {
        name: String,
        first: String,
        second: String,
    },
    #[error("Twist chain '{chain}' must list a driver and two twist joints, found {len} joints")]
    InvalidTwistChain { chain: String, len: usize },
}
