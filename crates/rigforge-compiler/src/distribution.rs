//! Distribution Network Builder.
//!
//! Two families of fan-out networks:
//!
//! - twist: `twist_k.rotate = bind_k + (driver.rotate - driver_bind) * f_k`
//! - finger curl and spread: one multiply node per finger turns a hand
//!   control attribute into degrees for the finger's joints.

use rigforge_scene::{
    multiply_input, sum_input, sum_weight, utility_output, Channel, NodeId, NodeKind, Plug,
    SceneGraph, UtilityKind, SUM_OUTPUT,
};
use rigforge_spec::naming::{curl_attr, SPREAD_ATTR};
use rigforge_spec::{Axis, ChainRef, TwistTriple};
use tracing::{debug, info};

use crate::context::RigContext;
use crate::error::RigResult;
use crate::freeze::freeze_to_offset;
use crate::registry::Variant;

// =============================================================================
// Twist
// =============================================================================

/// Nodes of one twist network.
#[derive(Debug, Clone, PartialEq)]
pub struct TwistNetwork {
    pub delta: NodeId,
    pub targets: [NodeId; 2],
}

/// Wires a twist network for every twist triple whose joints are all present
/// in the deform skeleton.
///
/// Bind rotations are read when this runs, so call it after the blend and
/// joint drivers are in place and with every control at rest.
pub fn wire_twist_distribution<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
) -> RigResult<Vec<TwistNetwork>> {
    let catalog = cx.catalog;
    let mut networks = Vec::new();
    for triple in catalog.twist_triples()? {
        let label = format!("{}{}", triple.label, triple.side.suffix());
        let lookup = |name: &str| cx.registry.try_joint(Variant::Deform, name);
        let found = (lookup(triple.driver), lookup(triple.first), lookup(triple.second));
        match found {
            (Some(driver), Some(first), Some(second)) => {
                networks.push(wire_twist(cx, &label, &triple, driver, [first, second])?);
            }
            _ => cx.skip(format!("{} twist", label), "twist joints not in the skeleton"),
        }
    }
    info!(networks = networks.len(), "wired twist distribution");
    Ok(networks)
}

fn wire_twist<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    label: &str,
    triple: &TwistTriple<'_>,
    driver: NodeId,
    targets: [NodeId; 2],
) -> RigResult<TwistNetwork> {
    let config = &cx.config.twist;
    let channel = Channel::rotate(config.axis);
    let scene = &mut *cx.scene;

    let driver_bind = scene.channel_value(driver, channel)?;
    let binds = [
        scene.channel_value(targets[0], channel)?,
        scene.channel_value(targets[1], channel)?,
    ];

    let delta = scene.create_utility_node(
        UtilityKind::WeightedSum { inputs: 2 },
        &format!("{}_delta_SUM", label),
    )?;
    scene.connect(&Plug::channel(driver, channel), &Plug::new(delta, sum_input(0)))?;
    scene.set_value(&Plug::new(delta, sum_input(1)), driver_bind)?;
    scene.set_value(&Plug::new(delta, sum_weight(1)), -1.0)?;

    let names = [triple.first, triple.second];
    for k in 0..2 {
        let node = scene.create_utility_node(
            UtilityKind::WeightedSum { inputs: 2 },
            &format!("{}_twist_SUM", names[k]),
        )?;
        scene.connect(&Plug::new(delta, SUM_OUTPUT), &Plug::new(node, sum_input(0)))?;
        scene.set_value(&Plug::new(node, sum_weight(0)), config.fractions[k])?;
        scene.set_value(&Plug::new(node, sum_input(1)), binds[k])?;
        scene.connect(&Plug::new(node, SUM_OUTPUT), &Plug::channel(targets[k], channel))?;
    }

    debug!(twist = label, driver_bind, "wired twist network");
    Ok(TwistNetwork { delta, targets })
}

// =============================================================================
// Fingers
// =============================================================================

/// Gets or creates the multiply node between `driver` and `target`. Returns
/// the node and whether it was created.
///
/// A node is reused only when it already drives `target` and is itself fed by
/// `driver`, so another rig's node of the same name is never picked up.
fn multiply_node<S: SceneGraph + ?Sized>(
    scene: &mut S,
    name: &str,
    driver: &Plug,
    target: Option<&Plug>,
) -> RigResult<(NodeId, bool)> {
    let existing = target
        .and_then(|t| scene.source(t))
        .map(|src| src.node)
        .filter(|md| {
            matches!(
                scene.kind(*md),
                Ok(NodeKind::Utility { utility: UtilityKind::Multiply })
            ) && scene.source(&Plug::new(*md, multiply_input(1, Axis::X))).as_ref() == Some(driver)
        });
    if let Some(md) = existing {
        return Ok((md, false));
    }
    Ok((scene.create_utility_node(UtilityKind::Multiply, name)?, true))
}

/// Freezes `joint` unless `channel` is already driven.
fn freeze_undriven<S: SceneGraph + ?Sized>(
    scene: &mut S,
    joint: NodeId,
    channel: Channel,
) -> RigResult<()> {
    if scene.source(&Plug::channel(joint, channel)).is_none() {
        freeze_to_offset(scene, joint)?;
    }
    Ok(())
}

/// Drives every joint of a finger from the hand control's `{finger}Curl`
/// attribute through `{finger}{side}_Curl_MD`.
///
/// The thumb's first joint is left out when configured. A multiply node that
/// already links this control to the finger is reused.
pub fn wire_finger_curl<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    finger: &ChainRef<'_>,
    joints: &[NodeId],
    control: NodeId,
) -> RigResult<NodeId> {
    let config = &cx.config.fingers;
    let scene = &mut *cx.scene;
    let name = format!("{}{}_Curl_MD", finger.name, finger.side.suffix());
    let driver = Plug::new(control, curl_attr(finger.name));
    let skip_first = finger.is_thumb() && config.exclude_thumb_metacarpal;
    let channel = Channel::rotate(config.curl_axis);
    let driven = &joints[usize::from(skip_first).min(joints.len())..];
    let target = driven.first().map(|j| Plug::channel(*j, channel));
    let (md, created) = multiply_node(scene, &name, &driver, target.as_ref())?;

    scene.connect(&driver, &Plug::new(md, multiply_input(1, Axis::X)))?;
    scene.set_value(
        &Plug::new(md, multiply_input(2, Axis::X)),
        config.curl_degrees_per_unit,
    )?;

    for joint in driven {
        freeze_undriven(&mut *scene, *joint, channel)?;
        scene.connect(
            &Plug::new(md, utility_output(Axis::X)),
            &Plug::channel(*joint, channel),
        )?;
    }

    debug!(finger = %finger.label(), created, "wired finger curl");
    Ok(md)
}

/// Drives a finger's first joint from the hand control's `Spread` attribute.
///
/// Thumbs and fingers without a non-zero spread factor get no network.
pub fn wire_finger_spread<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    finger: &ChainRef<'_>,
    joints: &[NodeId],
    control: NodeId,
) -> RigResult<Option<NodeId>> {
    let config = &cx.config.fingers;
    let factor = config
        .spread_degrees_per_unit
        .get(finger.name)
        .copied()
        .unwrap_or_default();
    let Some(&first) = joints.first() else {
        return Ok(None);
    };
    if finger.is_thumb() || factor == 0.0 {
        return Ok(None);
    }

    let scene = &mut *cx.scene;
    let name = format!("{}{}_Spread_MD", finger.name, finger.side.suffix());
    let driver = Plug::new(control, SPREAD_ATTR);
    let channel = Channel::rotate(config.spread_axis);
    let target = Plug::channel(first, channel);
    let (md, _) = multiply_node(scene, &name, &driver, Some(&target))?;
    scene.connect(&driver, &Plug::new(md, multiply_input(1, Axis::X)))?;
    scene.set_value(&Plug::new(md, multiply_input(2, Axis::X)), factor)?;

    freeze_undriven(&mut *scene, first, channel)?;
    scene.connect(
        &Plug::new(md, utility_output(Axis::X)),
        &Plug::channel(first, channel),
    )?;
    Ok(Some(md))
}
