//! Rest-pose freeze.

use rigforge_scene::glam::DMat4;
use rigforge_scene::{Channel, NodeId, SceneGraph};

use crate::error::RigResult;

/// Local matrices this close to identity are already frozen.
const FREEZE_EPSILON: f64 = 1e-9;

/// Folds a node's current local transform into its offset matrix and resets
/// translate and rotate to zero and scale to one.
///
/// The world transform is unchanged. Afterwards, direct or driven channel
/// values are relative to the frozen rest pose. A node whose channels are
/// already at identity is left untouched, so freezing is idempotent.
pub fn freeze_to_offset<S: SceneGraph + ?Sized>(scene: &mut S, node: NodeId) -> RigResult<()> {
    let local = scene.local_matrix(node)?;
    if local.abs_diff_eq(DMat4::IDENTITY, FREEZE_EPSILON) {
        return Ok(());
    }

    let offset = scene.offset_matrix(node)?;
    scene.set_offset_matrix(node, offset * local)?;
    for channel in Channel::TRANSLATE.into_iter().chain(Channel::ROTATE) {
        scene.set_channel_value(node, channel, 0.0)?;
    }
    for channel in Channel::SCALE {
        scene.set_channel_value(node, channel, 1.0)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigforge_scene::Scene;

    fn posed_joint(scene: &mut Scene) -> NodeId {
        let parent = scene.create_joint("parent", None).unwrap();
        scene.set_channel_value(parent, Channel::TranslateY, 100.0).unwrap();
        let joint = scene.create_joint("joint", Some(parent)).unwrap();
        scene.set_channel_value(joint, Channel::TranslateX, 18.0).unwrap();
        scene.set_channel_value(joint, Channel::RotateZ, -30.0).unwrap();
        joint
    }

    #[test]
    fn test_freeze_preserves_world() {
        let mut scene = Scene::new();
        let joint = posed_joint(&mut scene);
        let before = scene.world_matrix(joint).unwrap();

        freeze_to_offset(&mut scene, joint).unwrap();

        assert!(scene.world_matrix(joint).unwrap().abs_diff_eq(before, 1e-9));
        assert_eq!(scene.channel_value(joint, Channel::TranslateX).unwrap(), 0.0);
        assert_eq!(scene.channel_value(joint, Channel::RotateZ).unwrap(), 0.0);
        assert_eq!(scene.channel_value(joint, Channel::ScaleY).unwrap(), 1.0);
    }

    #[test]
    fn test_freeze_is_idempotent() {
        let mut scene = Scene::new();
        let joint = posed_joint(&mut scene);

        freeze_to_offset(&mut scene, joint).unwrap();
        let once = scene.clone();
        freeze_to_offset(&mut scene, joint).unwrap();
        assert_eq!(scene, once);
    }

    #[test]
    fn test_driven_channels_are_relative_after_freeze() {
        let mut scene = Scene::new();
        let joint = posed_joint(&mut scene);
        freeze_to_offset(&mut scene, joint).unwrap();

        scene.set_channel_value(joint, Channel::TranslateY, 2.0).unwrap();
        let p = scene.query_world_translation(joint).unwrap();
        // Rest is (18, 100); the local Y axis is rotated -30 degrees about Z.
        let angle = (-30.0f64).to_radians();
        assert!((p.x - (18.0 - 2.0 * angle.sin())).abs() < 1e-9);
        assert!((p.y - (100.0 + 2.0 * angle.cos())).abs() < 1e-9);
    }
}
