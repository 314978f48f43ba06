//! Joint drivers: FK controls into FK joints, IK handles into IK joints.

use rigforge_scene::{Channel, IkHandleSpec, IkSolver, NodeId, Plug, SceneGraph};
use rigforge_spec::{Category, ChainRef};
use tracing::info;

use crate::context::RigContext;
use crate::error::RigResult;
use crate::freeze::freeze_to_offset;
use crate::registry::{ControlCategory, Variant};
use crate::spline::build_spline_spine;

/// Connects `src`'s translate and rotate channels into `dst`'s.
pub(crate) fn connect_transform<S: SceneGraph + ?Sized>(
    scene: &mut S,
    src: NodeId,
    dst: NodeId,
) -> RigResult<()> {
    for channel in Channel::TRANSLATE.into_iter().chain(Channel::ROTATE) {
        scene.connect(&Plug::channel(src, channel), &Plug::channel(dst, channel))?;
    }
    Ok(())
}

/// Freezes each FK control and FK joint, then drives the joint's translate
/// and rotate from the control.
pub fn wire_fk_joint_drivers<S: SceneGraph + ?Sized>(cx: &mut RigContext<'_, S>) -> RigResult<()> {
    let catalog = cx.catalog;
    let mut driven = 0;
    for chain in catalog.chains_in_all(&Category::SWITCHABLE) {
        for name in chain.joints {
            let Some(control) = cx.registry.try_control(ControlCategory::Fk, name) else {
                cx.skip(format!("{} FK driver", name), "no FK control");
                continue;
            };
            let joint = cx.registry.joint(Variant::Fk, name)?;
            freeze_to_offset(&mut *cx.scene, control)?;
            freeze_to_offset(&mut *cx.scene, joint)?;
            connect_transform(&mut *cx.scene, control, joint)?;
            driven += 1;
        }
    }
    info!(joints = driven, "wired FK joint drivers");
    Ok(())
}

/// Builds a rotate-plane IK handle per limb and the spline spine.
pub fn wire_ik_joint_drivers<S: SceneGraph + ?Sized>(cx: &mut RigContext<'_, S>) -> RigResult<()> {
    let catalog = cx.catalog;
    for category in [Category::Arm, Category::Leg] {
        for chain in catalog.chains_in(category) {
            build_limb_ik_handle(cx, &chain)?;
        }
    }
    for chain in catalog.chains_in(Category::Spine) {
        build_spline_spine(cx, &chain)?;
    }
    Ok(())
}

/// Freezes the chain's IK joints and creates `{end}_IKH` from root to end,
/// with the mid pole control as pole vector, parented under the end control.
fn build_limb_ik_handle<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    chain: &ChainRef<'_>,
) -> RigResult<Option<NodeId>> {
    let (Some(start), Some(end)) = (chain.root(), chain.end()) else {
        return Ok(None);
    };
    if start == end {
        cx.skip(format!("{}_IKH", end), "chain has a single joint");
        return Ok(None);
    }
    let Some(end_control) = cx.registry.try_control(ControlCategory::Ik, end) else {
        cx.skip(format!("{}_IKH", end), "no IK end control");
        return Ok(None);
    };

    let mut joints = Vec::with_capacity(chain.joints.len());
    for name in chain.joints {
        let joint = cx.registry.joint(Variant::Ik, name)?;
        freeze_to_offset(&mut *cx.scene, joint)?;
        joints.push(joint);
    }
    let pole = match chain.joints.len() {
        n if n >= 3 => cx
            .registry
            .try_control(ControlCategory::Ik, &chain.joints[n / 2]),
        _ => None,
    };

    let spec = IkHandleSpec {
        solver: IkSolver::RotatePlane,
        start: joints[0],
        end: joints[joints.len() - 1],
        curve: None,
        pole,
    };
    let handle = cx.scene.create_ik_handle(spec, &format!("{}_IKH", end))?;
    cx.scene.set_parent(handle, Some(end_control))?;
    info!(handle = %format!("{}_IKH", end), "built limb IK handle");
    Ok(Some(handle))
}
