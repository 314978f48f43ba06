//! Instantiates skeleton definitions into a scene.

use std::collections::HashMap;

use rigforge_spec::{SkeletonDef, SkeletonError};

use crate::error::SceneResult;
use crate::graph::SceneGraph;
use crate::node::{Channel, NodeId};

/// Creates one joint per definition entry and returns the root joint.
///
/// Joints are created parents-first; each joint's local translate and rotate
/// channels take the definition's values.
pub fn load_skeleton<S: SceneGraph + ?Sized>(scene: &mut S, def: &SkeletonDef) -> SceneResult<NodeId> {
    let order = def.topological_order()?;
    let mut ids: HashMap<&str, NodeId> = HashMap::with_capacity(order.len());
    let mut root = None;

    for joint in order {
        let parent = joint.parent.as_deref().and_then(|p| ids.get(p).copied());
        let id = scene.create_joint(&joint.name, parent)?;
        for (i, channel) in Channel::TRANSLATE.iter().enumerate() {
            scene.set_channel_value(id, *channel, joint.translate[i])?;
        }
        for (i, channel) in Channel::ROTATE.iter().enumerate() {
            scene.set_channel_value(id, *channel, joint.rotate[i])?;
        }
        if parent.is_none() {
            root = Some(id);
        }
        ids.insert(joint.name.as_str(), id);
    }

    tracing::debug!(joints = ids.len(), "loaded skeleton");
    root.ok_or_else(|| SkeletonError::NoRoot.into())
}
