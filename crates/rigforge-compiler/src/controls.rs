//! Control Hierarchy Builder.
//!
//! Controls are placed at the world transform of their deform joint inside a
//! per-family system group. FK controls are then shadow-parented so that
//! each one nests under the control of its nearest controlled ancestor joint.

use std::collections::BTreeMap;

use rigforge_scene::{AttributeSpec, Channel, CurveRole, NodeId, SceneGraph};
use rigforge_spec::naming::{
    AUTO_VIS_ATTR, BLEND_ATTR, FK_SYSTEM, FK_VIS_ATTR, FOLLOW_ATTR, IK_SYSTEM, IK_VIS_ATTR,
    LOCK_ATTR, MAIN_CONTROL, MAIN_SYSTEM, SWITCH_SYSTEM,
};
use rigforge_spec::{Category, ChainRef, Side};
use tracing::{debug, info};

use crate::context::{joint_map, RigContext};
use crate::error::RigResult;
use crate::registry::ControlCategory;
use crate::shapes::{ControlRole, SizeTier};
use crate::variant::{sort_deepest_first, DeepestFirst};

/// Radius of the main root ring.
const MAIN_CONTROL_RADIUS: f64 = 34.0;

/// Creates a control for `role`, colors it, and places it at `reference`
/// inside `system`.
pub(crate) fn place_control<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    name: &str,
    role: ControlRole,
    tier: SizeTier,
    system: NodeId,
    reference: NodeId,
) -> RigResult<NodeId> {
    let control = cx
        .scene
        .create_curve_shape(name, role.shape(tier), CurveRole::Control)?;
    cx.scene.set_override_color(control, role.color())?;
    cx.scene.set_parent(control, Some(system))?;
    cx.scene.match_world_transform(control, reference)?;
    debug!(control = name, role = ?role, "placed control");
    Ok(control)
}

/// Zeroes the rotation of a control so it is aligned with its system group.
fn reset_rotation<S: SceneGraph + ?Sized>(scene: &mut S, control: NodeId) -> RigResult<()> {
    for channel in Channel::ROTATE {
        scene.set_channel_value(control, channel, 0.0)?;
    }
    Ok(())
}

/// Adds `delta` to one channel of a control.
fn nudge<S: SceneGraph + ?Sized>(
    scene: &mut S,
    control: NodeId,
    channel: Channel,
    delta: f64,
) -> RigResult<()> {
    let current = scene.channel_value(control, channel)?;
    scene.set_channel_value(control, channel, current + delta)?;
    Ok(())
}

/// Locks every transform, scale, and visibility channel of a control.
pub(crate) fn lock_all_channels<S: SceneGraph + ?Sized>(
    scene: &mut S,
    control: NodeId,
) -> RigResult<()> {
    for channel in Channel::ALL {
        scene.lock_channel(control, channel)?;
    }
    Ok(())
}

fn fk_tier(category: Category) -> SizeTier {
    if category == Category::Spine {
        SizeTier::Large
    } else {
        SizeTier::Medium
    }
}

// =============================================================================
// FK
// =============================================================================

/// Builds the main root control and one FK ring per switchable chain joint,
/// nested to mirror the skeleton.
pub fn build_fk_controls<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    root: NodeId,
) -> RigResult<()> {
    let catalog = cx.catalog;
    let joints = joint_map(&*cx.scene, root)?;

    let main_system = cx.control_system(MAIN_SYSTEM)?;
    let main = place_control(
        cx,
        &ControlRole::Main.control_name(MAIN_CONTROL),
        ControlRole::Main,
        SizeTier::Radius(MAIN_CONTROL_RADIUS),
        main_system,
        root,
    )?;
    cx.registry.put_control(ControlCategory::Main, MAIN_CONTROL, main)?;

    let fk_system = cx.control_system(FK_SYSTEM)?;
    let mut joint_to_control: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    for chain in catalog.chains_in_all(&Category::SWITCHABLE) {
        for name in chain.joints {
            let Some(&joint) = joints.get(name) else {
                cx.skip(ControlRole::Fk.control_name(name), "joint not found under root");
                continue;
            };
            let control = place_control(
                cx,
                &ControlRole::Fk.control_name(name),
                ControlRole::Fk,
                fk_tier(chain.category),
                fk_system,
                joint,
            )?;
            cx.registry.put_control(ControlCategory::Fk, name, control)?;
            joint_to_control.insert(joint, control);
        }
    }

    shadow_parent(cx, &joint_to_control)?;
    info!(controls = joint_to_control.len(), "built FK controls");
    Ok(())
}

/// Re-parents each control under the control of the nearest ancestor joint
/// that has one. Controls without a controlled ancestor stay where they are.
pub(crate) fn shadow_parent<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    joint_to_control: &BTreeMap<NodeId, NodeId>,
) -> RigResult<()> {
    let ordered = sort_deepest_first(&*cx.scene, joint_to_control.keys().copied())?;
    let mut order = DeepestFirst::new("shadow_parent");
    for (joint, depth) in ordered {
        order.visit(depth)?;
        let control = joint_to_control[&joint];
        let mut ancestor = cx.scene.parent(joint)?;
        while let Some(a) = ancestor {
            if let Some(&parent_control) = joint_to_control.get(&a) {
                cx.scene.set_parent(control, Some(parent_control))?;
                break;
            }
            ancestor = cx.scene.parent(a)?;
        }
    }
    Ok(())
}

// =============================================================================
// IK
// =============================================================================

/// Builds IK end boxes and pole crosses for limbs, and the three spine IK
/// boxes used by the spline spine.
pub fn build_ik_controls<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    root: NodeId,
) -> RigResult<()> {
    let catalog = cx.catalog;
    let joints = joint_map(&*cx.scene, root)?;
    let ik_system = cx.control_system(IK_SYSTEM)?;

    for chain in catalog.chains_in_all(&Category::SWITCHABLE) {
        if chain.category.is_limb() {
            build_limb_ik(cx, &chain, &joints, ik_system)?;
        } else {
            for name in spine_driver_joints(&chain) {
                let Some(&joint) = joints.get(name) else {
                    cx.skip(ControlRole::IkSpine.control_name(name), "joint not found under root");
                    continue;
                };
                let control = place_control(
                    cx,
                    &ControlRole::IkSpine.control_name(name),
                    ControlRole::IkSpine,
                    SizeTier::Large,
                    ik_system,
                    joint,
                )?;
                cx.registry.put_control(ControlCategory::Ik, name, control)?;
            }
        }
    }

    info!(controls = cx.registry.control_count(ControlCategory::Ik), "built IK controls");
    Ok(())
}

/// First, middle, and last joint of a spine chain, without repeats.
pub(crate) fn spine_driver_joints<'a>(chain: &ChainRef<'a>) -> Vec<&'a str> {
    let joints = chain.joints;
    let mut picked: Vec<&str> = Vec::with_capacity(3);
    if joints.is_empty() {
        return picked;
    }
    for index in [0, joints.len() / 2, joints.len() - 1] {
        let name = joints[index].as_str();
        if !picked.contains(&name) {
            picked.push(name);
        }
    }
    picked
}

fn build_limb_ik<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    chain: &ChainRef<'_>,
    joints: &BTreeMap<String, NodeId>,
    ik_system: NodeId,
) -> RigResult<()> {
    let Some(end) = chain.end() else {
        return Ok(());
    };
    match joints.get(end) {
        Some(&joint) => {
            let control = place_control(
                cx,
                &ControlRole::IkEnd.control_name(end),
                ControlRole::IkEnd,
                SizeTier::Medium,
                ik_system,
                joint,
            )?;
            cx.registry.put_control(ControlCategory::Ik, end, control)?;
        }
        None => cx.skip(ControlRole::IkEnd.control_name(end), "joint not found under root"),
    }

    if chain.joints.len() < 3 {
        return Ok(());
    }
    let mid = chain.joints[chain.joints.len() / 2].as_str();
    let Some(&joint) = joints.get(mid) else {
        cx.skip(ControlRole::Pole.control_name(mid), "joint not found under root");
        return Ok(());
    };
    let pole = place_control(
        cx,
        &ControlRole::Pole.control_name(mid),
        ControlRole::Pole,
        SizeTier::Medium,
        ik_system,
        joint,
    )?;
    reset_rotation(&mut *cx.scene, pole)?;
    // Knees point forward, elbows back.
    let offset = match chain.category {
        Category::Leg => cx.config.controls.pole_offset,
        _ => -cx.config.controls.pole_offset,
    };
    nudge(&mut *cx.scene, pole, Channel::TranslateZ, offset)?;
    let attr_max = cx.config.blend.attr_max;
    cx.scene
        .add_attribute(pole, AttributeSpec::double(FOLLOW_ATTR, 0.0, attr_max, 0.0))?;
    cx.scene
        .add_attribute(pole, AttributeSpec::double(LOCK_ATTR, 0.0, attr_max, 0.0))?;
    cx.registry.put_control(ControlCategory::Ik, mid, pole)?;
    Ok(())
}

// =============================================================================
// Switches
// =============================================================================

/// Builds one IK/FK switch per switchable chain, keyed by the chain root.
///
/// Switches expose the blend attribute and visibility toggles; every
/// transform channel is locked.
pub fn build_switch_controls<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    root: NodeId,
) -> RigResult<()> {
    let catalog = cx.catalog;
    let joints = joint_map(&*cx.scene, root)?;
    let system = cx.control_system(SWITCH_SYSTEM)?;

    for chain in catalog.chains_in_all(&Category::SWITCHABLE) {
        let Some(chain_root) = chain.root() else {
            continue;
        };
        let name = ControlRole::Switch.control_name(chain_root);
        let Some(&joint) = joints.get(chain_root) else {
            cx.skip(name, "joint not found under root");
            continue;
        };

        let control = place_control(cx, &name, ControlRole::Switch, SizeTier::Small, system, joint)?;
        reset_rotation(&mut *cx.scene, control)?;
        let distance = cx.config.controls.switch_offset;
        match chain.side {
            Side::Center => nudge(&mut *cx.scene, control, Channel::TranslateZ, -distance)?,
            side => nudge(&mut *cx.scene, control, Channel::TranslateX, side.sign() * distance)?,
        }
        lock_all_channels(&mut *cx.scene, control)?;

        let attr_max = cx.config.blend.attr_max;
        cx.scene
            .add_attribute(control, AttributeSpec::double(BLEND_ATTR, 0.0, attr_max, 0.0))?;
        let mut auto_vis = AttributeSpec::boolean(AUTO_VIS_ATTR, true);
        auto_vis.keyable = false;
        cx.scene.add_attribute(control, auto_vis)?;
        cx.scene
            .add_attribute(control, AttributeSpec::boolean(FK_VIS_ATTR, true))?;
        cx.scene
            .add_attribute(control, AttributeSpec::boolean(IK_VIS_ATTR, true))?;

        cx.registry
            .put_control(ControlCategory::Switch, chain_root, control)?;
    }

    info!(
        controls = cx.registry.control_count(ControlCategory::Switch),
        "built switch controls"
    );
    Ok(())
}
