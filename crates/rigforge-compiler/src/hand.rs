//! Hand rig: one finger control per hand with curl and spread attributes.

use rigforge_scene::{AttributeSpec, Channel, NodeId, Plug, SceneGraph};
use rigforge_spec::naming::{curl_attr, HAND_SYSTEM, SPREAD_ATTR};
use rigforge_spec::{Category, ChainRef, Side};
use tracing::{debug, info};

use crate::context::{joint_map, RigContext};
use crate::controls::{lock_all_channels, place_control};
use crate::distribution::{wire_finger_curl, wire_finger_spread};
use crate::error::RigResult;
use crate::registry::ControlCategory;
use crate::shapes::{ControlRole, SizeTier};

/// Nodes of one side's hand rig.
#[derive(Debug, Clone, PartialEq)]
pub struct HandRig {
    pub group: NodeId,
    pub control: NodeId,
    /// Fingers wired, by chain name.
    pub fingers: Vec<String>,
}

/// Builds the hand rig for both sides.
///
/// Per side: a `{hand}_fingers_grp` group under the hand system, constrained
/// to the hand joint, holding a `{hand}_fingers` control whose `{finger}Curl`
/// and `Spread` attributes drive the finger joints. Existing groups,
/// controls, and multiply nodes are reused.
pub fn build_hand_rig<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    root: NodeId,
) -> RigResult<Vec<HandRig>> {
    let catalog = cx.catalog;
    let joints = joint_map(&*cx.scene, root)?;
    let mut rigs = Vec::new();

    for side in [Side::Left, Side::Right] {
        let Some(hand_name) = catalog.hand_joint(side) else {
            debug!(side = ?side, "no arm chain, no hand rig");
            continue;
        };
        let Some(&hand) = joints.get(hand_name) else {
            cx.skip(ControlRole::Hand.control_name(hand_name), "hand joint not found under root");
            continue;
        };

        let mut fingers: Vec<(ChainRef<'_>, Vec<NodeId>)> = Vec::new();
        for finger in catalog.chains_in(Category::Finger).filter(|c| c.side == side) {
            let resolved: Option<Vec<NodeId>> =
                finger.joints.iter().map(|j| joints.get(j).copied()).collect();
            match resolved {
                Some(nodes) => fingers.push((finger, nodes)),
                None => debug!(finger = %finger.label(), "finger joints missing"),
            }
        }
        if fingers.is_empty() {
            cx.skip(ControlRole::Hand.control_name(hand_name), "no complete finger chains");
            continue;
        }

        let rig = build_side(cx, hand_name, hand, &fingers)?;
        rigs.push(rig);
    }

    info!(hands = rigs.len(), "built hand rig");
    Ok(rigs)
}

fn build_side<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    hand_name: &str,
    hand: NodeId,
    fingers: &[(ChainRef<'_>, Vec<NodeId>)],
) -> RigResult<HandRig> {
    let system = cx.control_system(HAND_SYSTEM)?;
    let group_name = format!("{}_fingers_grp", hand_name);
    let group = match cx.scene.find_child(Some(system), &group_name) {
        Some(existing) => existing,
        None => {
            let group = cx.scene.create_transform(&group_name, Some(system))?;
            cx.scene.match_world_transform(group, hand)?;
            group
        }
    };

    let control_name = ControlRole::Hand.control_name(hand_name);
    let control = match cx.scene.find_child(Some(group), &control_name) {
        Some(existing) => existing,
        None => {
            let control =
                place_control(cx, &control_name, ControlRole::Hand, SizeTier::Medium, group, hand)?;
            for channel in Channel::ROTATE {
                cx.scene.set_channel_value(control, channel, 0.0)?;
            }
            let lift = cx.config.controls.hand_offset;
            let y = cx.scene.channel_value(control, Channel::TranslateY)?;
            cx.scene.set_channel_value(control, Channel::TranslateY, y + lift)?;
            lock_all_channels(&mut *cx.scene, control)?;
            control
        }
    };

    let fc = &cx.config.fingers;
    let mut specs: Vec<AttributeSpec> = fingers
        .iter()
        .map(|(finger, _)| AttributeSpec::double(curl_attr(finger.name), fc.curl_min, fc.curl_max, 0.0))
        .collect();
    specs.push(AttributeSpec::double(SPREAD_ATTR, fc.spread_min, fc.spread_max, 0.0));
    for spec in specs {
        if !cx.scene.has_plug(&Plug::new(control, spec.name.as_str())) {
            cx.scene.add_attribute(control, spec)?;
        }
    }

    match cx.registry.try_control(ControlCategory::Hand, hand_name) {
        Some(existing) if existing == control => {}
        _ => cx.registry.put_control(ControlCategory::Hand, hand_name, control)?,
    }

    if cx
        .scene
        .source(&Plug::channel(group, Channel::TranslateX))
        .is_none()
    {
        cx.scene
            .create_weighted_constraint(&[hand], group, &format!("{}_parentConstraint", group_name))?;
    }

    let mut wired = Vec::with_capacity(fingers.len());
    for (finger, nodes) in fingers {
        wire_finger_curl(cx, finger, nodes, control)?;
        wire_finger_spread(cx, finger, nodes, control)?;
        wired.push(finger.name.to_string());
    }

    Ok(HandRig {
        group,
        control,
        fingers: wired,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigforge_scene::{load_skeleton, KindFilter, Scene};
    use rigforge_spec::{RigConfig, SchemaCatalog, SkeletonPreset};

    fn setup(preset: SkeletonPreset) -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let root = load_skeleton(&mut scene, &preset.build()).unwrap();
        (scene, root)
    }

    #[test]
    fn test_hand_rig_drives_fingers() {
        let (mut scene, root) = setup(SkeletonPreset::MannequinFull);
        let catalog = SchemaCatalog::mannequin();
        let config = RigConfig::default();
        let mut cx = RigContext::new(&mut scene, &catalog, &config);

        let rigs = build_hand_rig(&mut cx, root).unwrap();
        assert_eq!(rigs.len(), 2);
        assert_eq!(rigs[0].fingers.len(), 5);

        let control = cx.registry.control(ControlCategory::Hand, "hand_l").unwrap();
        assert_eq!(cx.scene.name(control).unwrap(), "hand_l_fingers");

        cx.scene.set_value(&Plug::new(control, "middleCurl"), 10.0).unwrap();
        let middle_02 = cx.scene.find_by_name("middle_02_l").unwrap();
        assert_eq!(cx.scene.channel_value(middle_02, Channel::RotateZ).unwrap(), 90.0);

        // Out-of-range values clamp to the attribute domain.
        cx.scene.set_value(&Plug::new(control, "middleCurl"), -7.0).unwrap();
        assert_eq!(cx.scene.channel_value(middle_02, Channel::RotateZ).unwrap(), -18.0);

        cx.scene.set_value(&Plug::new(control, SPREAD_ATTR), 2.0).unwrap();
        let index_01 = cx.scene.find_by_name("index_01_l").unwrap();
        assert_eq!(cx.scene.channel_value(index_01, Channel::RotateY).unwrap(), -4.0);
    }

    #[test]
    fn test_control_placement_and_locks() {
        let (mut scene, root) = setup(SkeletonPreset::MannequinFull);
        let catalog = SchemaCatalog::mannequin();
        let config = RigConfig::default();
        let mut cx = RigContext::new(&mut scene, &catalog, &config);

        let rigs = build_hand_rig(&mut cx, root).unwrap();
        let rig = &rigs[0];
        let hand = cx.scene.find_by_name("hand_l").unwrap();
        let hand_at = cx.scene.query_world_translation(hand).unwrap();
        let control_at = cx.scene.query_world_translation(rig.control).unwrap();
        assert!((control_at.y - hand_at.y - 8.0).abs() < 1e-9);
        assert!((control_at.x - hand_at.x).abs() < 1e-9);

        for channel in Channel::ALL {
            assert!(cx.scene.is_locked(&Plug::channel(rig.control, channel)));
        }

        // The group follows the hand.
        cx.scene.set_channel_value(hand, Channel::TranslateY, 10.0).unwrap();
        let moved = cx.scene.query_world_translation(rig.group).unwrap();
        assert!((moved.y - (hand_at.y + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_rerun_reuses_nodes() {
        let (mut scene, root) = setup(SkeletonPreset::MannequinFull);
        let catalog = SchemaCatalog::mannequin();
        let config = RigConfig::default();
        let mut cx = RigContext::new(&mut scene, &catalog, &config);

        build_hand_rig(&mut cx, root).unwrap();
        let nodes = cx.scene.count(KindFilter::Any);
        build_hand_rig(&mut cx, root).unwrap();
        assert_eq!(cx.scene.count(KindFilter::Any), nodes);
    }

    #[test]
    fn test_skeleton_without_fingers_is_skipped() {
        let (mut scene, root) = setup(SkeletonPreset::MannequinLite);
        let catalog = SchemaCatalog::mannequin();
        let config = RigConfig::default();
        let mut cx = RigContext::new(&mut scene, &catalog, &config);

        let rigs = build_hand_rig(&mut cx, root).unwrap();
        assert!(rigs.is_empty());
        assert_eq!(
            cx.skipped(),
            [
                "hand_l_fingers: no complete finger chains",
                "hand_r_fingers: no complete finger chains",
            ]
        );
    }
}
