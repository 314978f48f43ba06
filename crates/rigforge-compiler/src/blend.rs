//! Blend Network Synthesizer.
//!
//! One network per switchable chain:
//!
//! ```text
//! switch.IKFKBlend -> MD (x weight_scale) -> w ----> constraint.w0 (FK), FK control visibility
//!                                          \-> REV -> constraint.w1 (IK), IK control visibility
//! ```
//!
//! Each chain joint gets a weighted constraint with drivers `[fk, ik]`
//! driving the deform joint.

use rigforge_scene::{
    multiply_input, reverse_input, utility_output, weight_attr, Channel, NodeId, Plug, SceneGraph,
    UtilityKind,
};
use rigforge_spec::naming::BLEND_ATTR;
use rigforge_spec::{Axis, Category, ChainRef};
use tracing::{debug, info};

use crate::context::RigContext;
use crate::error::RigResult;
use crate::registry::{ControlCategory, Variant};

/// The shared weight pair of one chain.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendPair {
    /// `IKFKBlend * weight_scale`, the FK weight.
    pub weight: Plug,
    /// `1 - weight`, the IK weight.
    pub inverse: Plug,
}

/// Wires a blend network for every switchable chain that has a switch control.
pub fn wire_blend_networks<S: SceneGraph + ?Sized>(cx: &mut RigContext<'_, S>) -> RigResult<()> {
    let catalog = cx.catalog;
    let mut wired = 0;
    for chain in catalog.chains_in_all(&Category::SWITCHABLE) {
        let Some(root) = chain.root() else {
            continue;
        };
        let Some(switch) = cx.registry.try_control(ControlCategory::Switch, root) else {
            cx.skip(format!("{} blend", chain.label()), "no switch control");
            continue;
        };
        let pair = blend_pair(cx, &chain.label(), switch)?;
        wire_chain(cx, &chain, &pair)?;
        wired += 1;
    }
    info!(chains = wired, "wired blend networks");
    Ok(())
}

/// Creates `{label}_IKFKBlend_MD` and `{label}_IKFKBlend_REV` fed by the switch.
pub fn blend_pair<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    label: &str,
    switch: NodeId,
) -> RigResult<BlendPair> {
    let scene = &mut *cx.scene;
    let md = scene.create_utility_node(UtilityKind::Multiply, &format!("{}_IKFKBlend_MD", label))?;
    let rev = scene.create_utility_node(UtilityKind::Reverse, &format!("{}_IKFKBlend_REV", label))?;

    scene.connect(
        &Plug::new(switch, BLEND_ATTR),
        &Plug::new(md, multiply_input(1, Axis::X)),
    )?;
    scene.set_value(
        &Plug::new(md, multiply_input(2, Axis::X)),
        cx.config.blend.weight_scale,
    )?;

    let weight = Plug::new(md, utility_output(Axis::X));
    scene.connect(&weight, &Plug::new(rev, reverse_input(Axis::X)))?;
    let inverse = Plug::new(rev, utility_output(Axis::X));
    Ok(BlendPair { weight, inverse })
}

fn wire_chain<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    chain: &ChainRef<'_>,
    pair: &BlendPair,
) -> RigResult<()> {
    let suppress_top = cx.config.blend.suppress_top_ik_visibility && chain.category.is_limb();

    for (index, name) in chain.joints.iter().enumerate() {
        let fk = cx.registry.joint(Variant::Fk, name)?;
        let ik = cx.registry.joint(Variant::Ik, name)?;
        let deform = cx.registry.joint(Variant::Deform, name)?;

        let constraint = cx.scene.create_weighted_constraint(
            &[fk, ik],
            deform,
            &format!("{}_parentConstraint", name),
        )?;
        cx.scene
            .connect(&pair.weight, &Plug::new(constraint, weight_attr(0)))?;
        cx.scene
            .connect(&pair.inverse, &Plug::new(constraint, weight_attr(1)))?;

        if let Some(control) = cx.registry.try_control(ControlCategory::Fk, name) {
            cx.scene
                .connect(&pair.weight, &Plug::channel(control, Channel::Visibility))?;
        }
        if let Some(control) = cx.registry.try_control(ControlCategory::Ik, name) {
            if index == 0 && suppress_top {
                debug!(joint = %name, "leaving topmost IK control visibility unbound");
            } else {
                cx.scene
                    .connect(&pair.inverse, &Plug::channel(control, Channel::Visibility))?;
            }
        }
    }
    Ok(())
}
