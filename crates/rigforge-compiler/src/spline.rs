//! Spline Spine Solver.
//!
//! A curve through the IK spine joints drives them through a spline IK
//! handle. Three driver joints, one per spine IK control, are skinned to
//! the curve. The handle's roll follows the first control and its twist is
//! a signed sum over all three.

use rigforge_scene::{
    multiply_input, sum_input, sum_weight, utility_output, Channel, CurveRole, CurveShape,
    IkHandleSpec, IkSolver, NodeId, Plug, SceneGraph, UtilityKind, HANDLE_ROLL, HANDLE_TWIST,
    SUM_OUTPUT,
};
use rigforge_spec::{Axis, ChainRef};
use tracing::{info, info_span};

use crate::context::RigContext;
use crate::controls::spine_driver_joints;
use crate::drivers::connect_transform;
use crate::error::RigResult;
use crate::freeze::freeze_to_offset;
use crate::registry::{ControlCategory, Variant};

/// Skeleton subgroup holding the curve, handle, and driver joints.
pub const SPLINE_GROUP: &str = "spine_spline";

/// Nodes created for one spline spine.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineSpine {
    pub curve: NodeId,
    pub handle: NodeId,
    pub drivers: Vec<NodeId>,
    pub skin: NodeId,
    pub roll: NodeId,
    pub twist: NodeId,
}

/// Builds the spline spine for `chain`. Skipped when the chain is shorter
/// than two joints or a spine IK control is missing.
pub fn build_spline_spine<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    chain: &ChainRef<'_>,
) -> RigResult<Option<SplineSpine>> {
    let _span = info_span!("spline_spine", chain = %chain.label()).entered();
    let label = chain.label();
    if chain.joints.len() < 2 {
        cx.skip(format!("{} spline", label), "spine needs at least two joints");
        return Ok(None);
    }

    let driver_names = spine_driver_joints(chain);
    let mut controls = Vec::with_capacity(driver_names.len());
    for name in &driver_names {
        match cx.registry.try_control(ControlCategory::Ik, name) {
            Some(control) => controls.push(control),
            None => {
                cx.skip(format!("{} spline", label), "missing spine IK control");
                return Ok(None);
            }
        }
    }

    let mut joints = Vec::with_capacity(chain.joints.len());
    let mut points = Vec::with_capacity(chain.joints.len());
    for name in chain.joints {
        let joint = cx.registry.joint(Variant::Ik, name)?;
        freeze_to_offset(&mut *cx.scene, joint)?;
        points.push(cx.scene.query_world_translation(joint)?.to_array());
        joints.push(joint);
    }

    let group = cx.skeleton_group(SPLINE_GROUP)?;
    let config = &cx.config.spline;
    let scene = &mut *cx.scene;

    let degree = config.curve_degree.min((points.len() - 1) as u8).max(1);
    let curve = scene.create_curve_shape(
        &format!("{}_curve", label),
        CurveShape::open(points, degree),
        CurveRole::Path,
    )?;
    scene.set_parent(curve, Some(group))?;

    let spec = IkHandleSpec {
        solver: IkSolver::Spline,
        start: joints[0],
        end: joints[joints.len() - 1],
        curve: Some(curve),
        pole: None,
    };
    let handle = scene.create_ik_handle(spec, &format!("{}_IKH", label))?;
    scene.set_parent(handle, Some(group))?;

    let mut drivers = Vec::with_capacity(driver_names.len());
    for name in &driver_names {
        let source = cx.registry.joint(Variant::Ik, name)?;
        let driver = scene.create_joint(&format!("{}_driver", name), None)?;
        scene.match_world_transform(driver, source)?;
        scene.set_parent(driver, Some(group))?;
        drivers.push(driver);
    }
    let skin = scene.create_skin_binding(&drivers, curve, &format!("{}_curve_skin", label))?;

    for (control, driver) in controls.iter().zip(&drivers) {
        freeze_to_offset(&mut *scene, *control)?;
        freeze_to_offset(&mut *scene, *driver)?;
        connect_transform(&mut *scene, *control, *driver)?;
    }

    let twist_channel = Channel::rotate(config.twist_axis);

    let roll = scene.create_utility_node(UtilityKind::Multiply, &format!("{}_roll_MD", label))?;
    scene.connect(
        &Plug::channel(controls[0], twist_channel),
        &Plug::new(roll, multiply_input(1, Axis::X)),
    )?;
    scene.set_value(&Plug::new(roll, multiply_input(2, Axis::X)), config.roll_sign)?;
    scene.connect(
        &Plug::new(roll, utility_output(Axis::X)),
        &Plug::new(handle, HANDLE_ROLL),
    )?;

    let twist = scene.create_utility_node(
        UtilityKind::WeightedSum {
            inputs: controls.len(),
        },
        &format!("{}_twist_SUM", label),
    )?;
    for (i, control) in controls.iter().enumerate() {
        scene.connect(&Plug::channel(*control, twist_channel), &Plug::new(twist, sum_input(i)))?;
        let weight = config.twist_weights.get(i).copied().unwrap_or(1.0);
        scene.set_value(&Plug::new(twist, sum_weight(i)), weight)?;
    }
    scene.connect(&Plug::new(twist, SUM_OUTPUT), &Plug::new(handle, HANDLE_TWIST))?;

    info!(joints = joints.len(), degree, "built spline spine");
    Ok(Some(SplineSpine {
        curve,
        handle,
        drivers,
        skin,
        roll,
        twist,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigforge_scene::{load_skeleton, NodeKind, Scene};
    use rigforge_spec::{Category, RigConfig, SchemaCatalog, Side, SkeletonPreset};

    use crate::controls::build_ik_controls;
    use crate::variant::{compile_skeleton_variants, register_deform_skeleton};

    fn spine_ready<'a>(
        scene: &'a mut Scene,
        catalog: &'a SchemaCatalog,
        config: &'a RigConfig,
    ) -> RigContext<'a, Scene> {
        let root = load_skeleton(scene, &SkeletonPreset::MannequinLite.build()).unwrap();
        let mut cx = RigContext::new(scene, catalog, config);
        register_deform_skeleton(&mut cx, root).unwrap();
        build_ik_controls(&mut cx, root).unwrap();
        compile_skeleton_variants(&mut cx, root).unwrap();
        cx
    }

    #[test]
    fn test_spline_structure() {
        let mut scene = Scene::new();
        let catalog = SchemaCatalog::mannequin();
        let config = RigConfig::default();
        let mut cx = spine_ready(&mut scene, &catalog, &config);
        let chain = catalog.chain(Category::Spine, Side::Center, "spine").unwrap();

        let spine = build_spline_spine(&mut cx, &chain).unwrap().unwrap();

        match cx.scene.kind(spine.curve).unwrap() {
            NodeKind::Curve { shape } => {
                assert_eq!(shape.degree, 4);
                assert_eq!(shape.points.len(), 5);
                assert!((shape.points[2][1] - 120.0).abs() < 1e-9);
            }
            other => panic!("unexpected kind {:?}", other),
        }
        match cx.scene.kind(spine.skin).unwrap() {
            NodeKind::SkinBinding { joints, target } => {
                assert_eq!(joints, &spine.drivers);
                assert_eq!(*target, spine.curve);
            }
            other => panic!("unexpected kind {:?}", other),
        }
        let names: Vec<_> = spine
            .drivers
            .iter()
            .map(|d| cx.scene.name(*d).unwrap().to_string())
            .collect();
        assert_eq!(names, ["spine_01_driver", "spine_03_driver", "spine_05_driver"]);

        let spine_03 = cx.registry.joint(Variant::Ik, "spine_03").unwrap();
        let at = cx.scene.query_world_translation(spine.drivers[1]).unwrap();
        assert!(at.abs_diff_eq(cx.scene.query_world_translation(spine_03).unwrap(), 1e-9));
    }

    #[test]
    fn test_roll_and_twist() {
        let mut scene = Scene::new();
        let catalog = SchemaCatalog::mannequin();
        let config = RigConfig::default();
        let mut cx = spine_ready(&mut scene, &catalog, &config);
        let chain = catalog.chain(Category::Spine, Side::Center, "spine").unwrap();
        let spine = build_spline_spine(&mut cx, &chain).unwrap().unwrap();

        let first = cx.registry.control(ControlCategory::Ik, "spine_01").unwrap();
        let mid = cx.registry.control(ControlCategory::Ik, "spine_03").unwrap();
        let last = cx.registry.control(ControlCategory::Ik, "spine_05").unwrap();
        cx.scene.set_channel_value(first, Channel::RotateX, 10.0).unwrap();
        cx.scene.set_channel_value(mid, Channel::RotateX, 20.0).unwrap();
        cx.scene.set_channel_value(last, Channel::RotateX, 40.0).unwrap();

        let roll = cx.scene.value(&Plug::new(spine.handle, HANDLE_ROLL)).unwrap();
        let twist = cx.scene.value(&Plug::new(spine.handle, HANDLE_TWIST)).unwrap();
        assert_eq!(roll, -10.0);
        assert_eq!(twist, -10.0 + 20.0 + 40.0);

        // Drivers follow their controls.
        assert_eq!(cx.scene.channel_value(spine.drivers[2], Channel::RotateX).unwrap(), 40.0);
    }

    #[test]
    fn test_signs_are_configurable() {
        let mut scene = Scene::new();
        let catalog = SchemaCatalog::mannequin();
        let mut config = RigConfig::default();
        config.spline.roll_sign = 1.0;
        config.spline.twist_weights = [0.0, 0.5, 1.0];
        let mut cx = spine_ready(&mut scene, &catalog, &config);
        let chain = catalog.chain(Category::Spine, Side::Center, "spine").unwrap();
        let spine = build_spline_spine(&mut cx, &chain).unwrap().unwrap();

        let first = cx.registry.control(ControlCategory::Ik, "spine_01").unwrap();
        let mid = cx.registry.control(ControlCategory::Ik, "spine_03").unwrap();
        cx.scene.set_channel_value(first, Channel::RotateX, 10.0).unwrap();
        cx.scene.set_channel_value(mid, Channel::RotateX, 20.0).unwrap();

        assert_eq!(cx.scene.value(&Plug::new(spine.handle, HANDLE_ROLL)).unwrap(), 10.0);
        assert_eq!(cx.scene.value(&Plug::new(spine.handle, HANDLE_TWIST)).unwrap(), 10.0);
    }

    #[test]
    fn test_short_spine_clamps_degree() {
        let mut scene = Scene::new();
        let catalog = SchemaCatalog::mannequin().with_chain(
            Category::Spine,
            Side::Center,
            "spine",
            ["spine_01", "spine_02", "spine_03"],
        );
        let config = RigConfig::default();
        let mut cx = spine_ready(&mut scene, &catalog, &config);
        let chain = catalog.chain(Category::Spine, Side::Center, "spine").unwrap();

        let spine = build_spline_spine(&mut cx, &chain).unwrap().unwrap();
        match cx.scene.kind(spine.curve).unwrap() {
            NodeKind::Curve { shape } => assert_eq!(shape.degree, 2),
            other => panic!("unexpected kind {:?}", other),
        }
    }
}
