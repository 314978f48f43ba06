//! Build context passed through every stage.

use std::collections::BTreeMap;

use rigforge_scene::{KindFilter, NodeId, SceneGraph};
use rigforge_spec::naming::{CONTROLS_GROUP, RIG_ROOT, SKELETON_GROUP};
use rigforge_spec::{RigConfig, SchemaCatalog};
use tracing::{debug, warn};

use crate::error::RigResult;
use crate::registry::Registry;

/// Everything one rig build reads and writes.
///
/// The registry lives here rather than in a global so its lifetime is exactly
/// one build.
pub struct RigContext<'a, S: SceneGraph + ?Sized> {
    pub scene: &'a mut S,
    pub catalog: &'a SchemaCatalog,
    pub config: &'a RigConfig,
    pub registry: Registry,
    skipped: Vec<String>,
}

impl<'a, S: SceneGraph + ?Sized> RigContext<'a, S> {
    pub fn new(scene: &'a mut S, catalog: &'a SchemaCatalog, config: &'a RigConfig) -> Self {
        Self {
            scene,
            catalog,
            config,
            registry: Registry::new(),
            skipped: Vec::new(),
        }
    }

    /// Records an optional item that was not built.
    pub fn skip(&mut self, item: impl Into<String>, reason: &str) {
        let item = item.into();
        warn!(item = %item, reason, "skipping optional rig item");
        self.skipped.push(format!("{}: {}", item, reason));
    }

    /// Optional items skipped so far, with reasons.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Looks up or creates `RIG_ROOT` and the groups of `path` below it.
    pub fn group_path(&mut self, path: &[&str]) -> RigResult<NodeId> {
        let mut node = self.child_group(None, RIG_ROOT)?;
        for name in path {
            node = self.child_group(Some(node), name)?;
        }
        Ok(node)
    }

    fn child_group(&mut self, parent: Option<NodeId>, name: &str) -> RigResult<NodeId> {
        if let Some(existing) = self.scene.find_child(parent, name) {
            return Ok(existing);
        }
        debug!(group = name, "creating group");
        Ok(self.scene.create_transform(name, parent)?)
    }

    /// `RIG_ROOT|skeleton|{name}`.
    pub fn skeleton_group(&mut self, name: &str) -> RigResult<NodeId> {
        self.group_path(&[SKELETON_GROUP, name])
    }

    /// `RIG_ROOT|controls|{system}`.
    pub fn control_system(&mut self, system: &str) -> RigResult<NodeId> {
        self.group_path(&[CONTROLS_GROUP, system])
    }
}

/// Maps the names of `root` and its joint descendants to their nodes.
///
/// When a name repeats, the shallowest occurrence in pre-order wins.
pub fn joint_map<S: SceneGraph + ?Sized>(
    scene: &S,
    root: NodeId,
) -> RigResult<BTreeMap<String, NodeId>> {
    let mut map = BTreeMap::new();
    let mut all = vec![root];
    all.extend(scene.list_descendants(root, KindFilter::Joint)?);
    for node in all {
        let name = scene.name(node)?.to_string();
        if map.contains_key(&name) {
            warn!(joint = %name, "duplicate joint name under root");
            continue;
        }
        map.insert(name, node);
    }
    Ok(map)
}
