//! Build Pipeline Orchestrator.
//!
//! Stages run strictly in [`Stage::ALL`] order; each reads the registry
//! entries written by the ones before it. A failing stage is reported as
//! [`RigError::StageFailed`] and leaves earlier stages applied; rollback is
//! the host session's job.

use rigforge_scene::{NodeId, SceneGraph};
use rigforge_spec::{RigConfig, SchemaCatalog};
use tracing::{info, info_span};

use crate::blend::wire_blend_networks;
use crate::context::RigContext;
use crate::controls::{build_fk_controls, build_ik_controls, build_switch_controls};
use crate::distribution::wire_twist_distribution;
use crate::drivers::{wire_fk_joint_drivers, wire_ik_joint_drivers};
use crate::error::{RigError, RigResult};
use crate::hand::build_hand_rig;
use crate::report::RigReport;
use crate::stage::Stage;
use crate::variant::{compile_skeleton_variants, register_deform_skeleton};

/// Builds FK, IK, and switch controls.
pub fn build_controls<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    root: NodeId,
) -> RigResult<()> {
    build_fk_controls(cx, root)?;
    build_ik_controls(cx, root)?;
    build_switch_controls(cx, root)
}

/// Wires FK control drivers, limb IK handles, and the spline spine.
pub fn wire_joint_drivers<S: SceneGraph + ?Sized>(cx: &mut RigContext<'_, S>) -> RigResult<()> {
    wire_fk_joint_drivers(cx)?;
    wire_ik_joint_drivers(cx)
}

/// Wires the twist networks. Finger networks hang off the hand controls and
/// are wired by [`build_hand_rig`].
pub fn wire_distribution_networks<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
) -> RigResult<()> {
    wire_twist_distribution(cx).map(|_| ())
}

fn run_stage<'a, S, F>(
    cx: &mut RigContext<'a, S>,
    stage: Stage,
    completed: &mut Vec<Stage>,
    f: F,
) -> RigResult<()>
where
    S: SceneGraph + ?Sized,
    F: FnOnce(&mut RigContext<'a, S>) -> RigResult<()>,
{
    let _span = info_span!("stage", name = stage.as_str()).entered();
    f(cx).map_err(|e| e.in_stage(stage))?;
    completed.push(stage);
    Ok(())
}

/// Runs every stage on the skeleton under `root`.
///
/// Registrations from any earlier build on this context are cleared first:
/// every variant and control is rebuilt, so duplicates are only rejected
/// within one run.
pub fn auto_rig_lite<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    root: NodeId,
) -> RigResult<RigReport> {
    cx.registry.clear();
    let mut done = Vec::with_capacity(Stage::ALL.len());

    run_stage(cx, Stage::RegisterDeform, &mut done, |cx| {
        register_deform_skeleton(cx, root).map(|_| ())
    })?;
    run_stage(cx, Stage::FkControls, &mut done, |cx| build_fk_controls(cx, root))?;
    run_stage(cx, Stage::IkControls, &mut done, |cx| build_ik_controls(cx, root))?;
    run_stage(cx, Stage::SwitchControls, &mut done, |cx| {
        build_switch_controls(cx, root)
    })?;
    run_stage(cx, Stage::Variants, &mut done, |cx| {
        compile_skeleton_variants(cx, root)
    })?;
    run_stage(cx, Stage::BlendNetworks, &mut done, wire_blend_networks)?;
    run_stage(cx, Stage::FkDrivers, &mut done, wire_fk_joint_drivers)?;
    run_stage(cx, Stage::IkDrivers, &mut done, wire_ik_joint_drivers)?;
    run_stage(cx, Stage::TwistDistribution, &mut done, wire_distribution_networks)?;
    run_stage(cx, Stage::HandRig, &mut done, |cx| {
        build_hand_rig(cx, root).map(|_| ())
    })?;

    let report = RigReport::collect(cx, done);
    info!(
        controls = report.control_total(),
        constraints = report.constraints,
        skipped = report.skipped.len(),
        "rig build complete"
    );
    Ok(report)
}

/// Creates a build context and runs [`auto_rig_lite`].
pub fn build_rig<S: SceneGraph + ?Sized>(
    scene: &mut S,
    catalog: &SchemaCatalog,
    config: &RigConfig,
    root: NodeId,
) -> RigResult<RigReport> {
    if !scene.contains(root) {
        return Err(RigError::schema_lookup(format!("{}", root), "the rig build"));
    }
    let mut cx = RigContext::new(scene, catalog, config);
    auto_rig_lite(&mut cx, root)
}
