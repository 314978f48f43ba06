//! End-to-end rig builds on the mannequin presets.

use pretty_assertions::assert_eq;

use rigforge_compiler::{
    auto_rig_lite, build_rig, compile_variant, ControlCategory, RigContext, RigError, Stage,
    Variant,
};
use rigforge_scene::{load_skeleton, Channel, KindFilter, NodeId, Plug, Scene, SceneGraph};
use rigforge_spec::naming::BLEND_ATTR;
use rigforge_spec::{Category, RigConfig, SchemaCatalog, SkeletonPreset};

const SWITCH_ROOTS: [&str; 5] = ["spine_01", "thigh_l", "thigh_r", "upperarm_l", "upperarm_r"];

fn node(scene: &Scene, name: &str) -> NodeId {
    scene
        .find_by_name(name)
        .unwrap_or_else(|| panic!("missing node {}", name))
}

fn lite_rig() -> (Scene, NodeId) {
    let mut scene = Scene::new();
    let root = load_skeleton(&mut scene, &SkeletonPreset::MannequinLite.build()).unwrap();
    build_rig(&mut scene, &SchemaCatalog::mannequin(), &RigConfig::default(), root).unwrap();
    (scene, root)
}

#[test]
fn test_lite_variants_and_switches() {
    let mut scene = Scene::new();
    let root = load_skeleton(&mut scene, &SkeletonPreset::MannequinLite.build()).unwrap();
    let catalog = SchemaCatalog::mannequin();
    let config = RigConfig::default();
    let mut cx = RigContext::new(&mut scene, &catalog, &config);

    let report = auto_rig_lite(&mut cx, root).unwrap();

    assert_eq!(report.variants[&Variant::Deform], 18);
    assert_eq!(report.variants[&Variant::Fk], 17);
    assert_eq!(report.variants[&Variant::Ik], 17);

    // FK and IK hold exactly the switchable chain joints; the root stays deform-only.
    let members = catalog.members(&Category::SWITCHABLE);
    for variant in [Variant::Fk, Variant::Ik] {
        let names: Vec<&str> = cx.registry.joints(variant).map(|(n, _)| n).collect();
        assert_eq!(names, members.iter().copied().collect::<Vec<_>>());
        assert!(cx.registry.try_joint(variant, "root").is_none());
    }

    let switches: Vec<&str> = cx
        .registry
        .controls(ControlCategory::Switch)
        .map(|(k, _)| k)
        .collect();
    assert_eq!(switches, SWITCH_ROOTS);

    for key in SWITCH_ROOTS {
        let switch = cx.registry.control(ControlCategory::Switch, key).unwrap();
        let plug = Plug::new(switch, BLEND_ATTR);
        cx.scene.set_value(&plug, 25.0).unwrap();
        assert_eq!(cx.scene.value(&plug).unwrap(), 10.0);
        cx.scene.set_value(&plug, -3.0).unwrap();
        assert_eq!(cx.scene.value(&plug).unwrap(), 0.0);
    }

    // No twist bones or fingers in the lite skeleton.
    assert_eq!(report.skipped.len(), 6, "{:?}", report.skipped);
    assert_eq!(cx.scene.count(KindFilter::IkHandle), 5);
}

#[test]
fn test_blend_selects_driving_variant() {
    let (mut scene, _) = lite_rig();
    let switch = node(&scene, "upperarm_l_ikfk");
    let fk_ctrl = node(&scene, "upperarm_l_fk_ctrl");
    let lower_fk_ctrl = node(&scene, "lowerarm_l_fk_ctrl");
    let ik_joint = node(&scene, "lowerarm_l_ik");
    let fk_joint = node(&scene, "lowerarm_l_fk");
    let deform = node(&scene, "lowerarm_l");

    scene.set_channel_value(ik_joint, Channel::RotateZ, -35.0).unwrap();
    scene.set_channel_value(lower_fk_ctrl, Channel::RotateY, 60.0).unwrap();

    // Blend 0: full IK, FK controls hidden.
    scene.set_value(&Plug::new(switch, BLEND_ATTR), 0.0).unwrap();
    assert_eq!(scene.channel_value(fk_ctrl, Channel::Visibility).unwrap(), 0.0);
    assert_eq!(scene.channel_value(lower_fk_ctrl, Channel::Visibility).unwrap(), 0.0);
    let hand_ik_ctrl = node(&scene, "hand_l_ik_ctrl");
    assert_eq!(scene.channel_value(hand_ik_ctrl, Channel::Visibility).unwrap(), 1.0);
    assert!(scene
        .world_matrix(deform)
        .unwrap()
        .abs_diff_eq(scene.world_matrix(ik_joint).unwrap(), 1e-6));

    // Blend 10: full FK.
    scene.set_value(&Plug::new(switch, BLEND_ATTR), 10.0).unwrap();
    assert_eq!(scene.channel_value(fk_ctrl, Channel::Visibility).unwrap(), 1.0);
    assert_eq!(scene.channel_value(hand_ik_ctrl, Channel::Visibility).unwrap(), 0.0);
    assert!(scene
        .world_matrix(deform)
        .unwrap()
        .abs_diff_eq(scene.world_matrix(fk_joint).unwrap(), 1e-6));

    // The other arm is untouched.
    let other = node(&scene, "upperarm_r_fk_ctrl");
    assert_eq!(scene.channel_value(other, Channel::Visibility).unwrap(), 0.0);
}

#[test]
fn test_half_blend_averages_variants() {
    let (mut scene, _) = lite_rig();
    let switch = node(&scene, "upperarm_l_ikfk");
    let ik_joint = node(&scene, "lowerarm_l_ik");
    let fk_joint = node(&scene, "lowerarm_l_fk");
    let deform = node(&scene, "lowerarm_l");

    // Swing the shoulders apart so the elbows sit in different places.
    scene
        .set_channel_value(node(&scene, "upperarm_l_ik"), Channel::RotateZ, 30.0)
        .unwrap();
    scene
        .set_channel_value(node(&scene, "upperarm_l_fk_ctrl"), Channel::RotateY, 45.0)
        .unwrap();

    scene.set_value(&Plug::new(switch, BLEND_ATTR), 5.0).unwrap();

    let fk_at = scene.query_world_translation(fk_joint).unwrap();
    let ik_at = scene.query_world_translation(ik_joint).unwrap();
    assert!(fk_at.distance(ik_at) > 1.0);
    let midpoint = (fk_at + ik_at) * 0.5;
    assert!(scene
        .query_world_translation(deform)
        .unwrap()
        .abs_diff_eq(midpoint, 1e-6));
}

#[test]
fn test_full_rig_twist_and_fingers() {
    let mut scene = Scene::new();
    let root = load_skeleton(&mut scene, &SkeletonPreset::MannequinFull.build()).unwrap();
    let report =
        build_rig(&mut scene, &SchemaCatalog::mannequin(), &RigConfig::default(), root).unwrap();
    assert!(report.skipped.is_empty(), "{:?}", report.skipped);

    // Switch to IK and twist the IK foot.
    let switch = node(&scene, "thigh_l_ikfk");
    scene.set_value(&Plug::new(switch, BLEND_ATTR), 0.0).unwrap();
    let foot_ik = node(&scene, "foot_l_ik");
    scene.set_channel_value(foot_ik, Channel::RotateX, 45.0).unwrap();

    let foot = node(&scene, "foot_l");
    assert!((scene.channel_value(foot, Channel::RotateX).unwrap() - 45.0).abs() < 1e-6);
    let twist_01 = node(&scene, "calf_twist_01_l");
    let twist_02 = node(&scene, "calf_twist_02_l");
    assert!((scene.channel_value(twist_01, Channel::RotateX).unwrap() - 15.0).abs() < 1e-6);
    assert!((scene.channel_value(twist_02, Channel::RotateX).unwrap() - 30.0).abs() < 1e-6);

    let fingers = node(&scene, "hand_r_fingers");
    scene.set_value(&Plug::new(fingers, "indexCurl"), 5.0).unwrap();
    for i in 1..=3 {
        let joint = node(&scene, &format!("index_{:02}_r", i));
        assert_eq!(scene.channel_value(joint, Channel::RotateZ).unwrap(), 45.0);
    }
    let thumb_01 = node(&scene, "thumb_01_r");
    scene.set_value(&Plug::new(fingers, "thumbCurl"), 5.0).unwrap();
    assert_eq!(scene.channel_value(thumb_01, Channel::RotateZ).unwrap(), 0.0);
}

#[test]
fn test_rebuild_on_same_context_reregisters() {
    let mut scene = Scene::new();
    let root = load_skeleton(&mut scene, &SkeletonPreset::MannequinLite.build()).unwrap();
    let catalog = SchemaCatalog::mannequin();
    let config = RigConfig::default();
    let mut cx = RigContext::new(&mut scene, &catalog, &config);
    auto_rig_lite(&mut cx, root).unwrap();
    let first_fk = cx.registry.joint(Variant::Fk, "hand_l").unwrap();
    let first_switch = cx.registry.control(ControlCategory::Switch, "upperarm_l").unwrap();

    let report = auto_rig_lite(&mut cx, root).unwrap();
    assert_eq!(report.stages.len(), Stage::ALL.len());
    assert_eq!(report.variants[&Variant::Deform], 18);
    assert_eq!(report.variants[&Variant::Fk], 17);
    assert_eq!(report.variants[&Variant::Ik], 17);
    assert_eq!(cx.registry.control_count(ControlCategory::Switch), 5);

    // The variants and controls are new nodes; the deform skeleton is the same.
    assert_ne!(cx.registry.joint(Variant::Fk, "hand_l").unwrap(), first_fk);
    assert_ne!(
        cx.registry.control(ControlCategory::Switch, "upperarm_l").unwrap(),
        first_switch
    );
    assert_eq!(cx.registry.joint(Variant::Deform, "root").unwrap(), root);
}

#[test]
fn test_duplicate_within_one_build_fails_fast() {
    let mut scene = Scene::new();
    let root = load_skeleton(&mut scene, &SkeletonPreset::MannequinLite.build()).unwrap();
    let catalog = SchemaCatalog::mannequin();
    let config = RigConfig::default();
    let mut cx = RigContext::new(&mut scene, &catalog, &config);
    auto_rig_lite(&mut cx, root).unwrap();

    // Outside the orchestrator nothing is cleared.
    let err = compile_variant(&mut cx, root, Variant::Fk, &Category::SWITCHABLE).unwrap_err();
    assert!(matches!(err, RigError::DuplicateRegistryKey { .. }), "{:?}", err);
}

#[test]
fn test_report_serializes() {
    let mut scene = Scene::new();
    let root = load_skeleton(&mut scene, &SkeletonPreset::MannequinLite.build()).unwrap();
    let report =
        build_rig(&mut scene, &SchemaCatalog::mannequin(), &RigConfig::default(), root).unwrap();

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["variants"]["deform"], 18);
    assert_eq!(json["controls"]["switch"], 5);
    assert_eq!(json["stages"].as_array().unwrap().len(), Stage::ALL.len());

    let text = report.to_string();
    assert!(text.contains("Controls:"));
    assert!(text.contains("Skipped: 6"));
}
