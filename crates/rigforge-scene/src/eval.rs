//! Pull-based dataflow evaluation.
//!
//! Values are computed on demand from connections, utility nodes, and
//! constraints. Each [`Evaluator`] memoizes within a single query so shared
//! upstream nodes are computed once.

use std::collections::{HashMap, HashSet};

use glam::{DMat4, DQuat, DVec3, DVec4};

use crate::error::{SceneError, SceneResult};
use crate::node::{sum_input, sum_weight, Channel, NodeId, NodeKind, Plug, Trs, UtilityKind};
use crate::scene::Scene;

/// Weights below this are treated as zero.
const WEIGHT_EPSILON: f64 = 1e-9;

/// Constraint outputs and the driven channel each one feeds.
pub const CONSTRAINT_OUTPUTS: [(&str, Channel); 6] = [
    ("constraintTranslateX", Channel::TranslateX),
    ("constraintTranslateY", Channel::TranslateY),
    ("constraintTranslateZ", Channel::TranslateZ),
    ("constraintRotateX", Channel::RotateX),
    ("constraintRotateY", Channel::RotateY),
    ("constraintRotateZ", Channel::RotateZ),
];

/// Weight attribute of constraint driver `index` (`w0`, `w1`, ...).
pub fn weight_attr(index: usize) -> String {
    format!("w{}", index)
}

pub(crate) fn constraint_output_channel(attr: &str) -> Option<Channel> {
    CONSTRAINT_OUTPUTS
        .iter()
        .find(|(name, _)| *name == attr)
        .map(|(_, channel)| *channel)
}

pub(crate) struct Evaluator<'a> {
    scene: &'a Scene,
    values: HashMap<Plug, f64>,
    worlds: HashMap<NodeId, DMat4>,
    constraints: HashMap<NodeId, Trs>,
    active: HashSet<Plug>,
    active_worlds: HashSet<NodeId>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(scene: &'a Scene) -> Self {
        Self {
            scene,
            values: HashMap::new(),
            worlds: HashMap::new(),
            constraints: HashMap::new(),
            active: HashSet::new(),
            active_worlds: HashSet::new(),
        }
    }

    pub(crate) fn value(&mut self, plug: &Plug) -> SceneResult<f64> {
        if let Some(v) = self.values.get(plug) {
            return Ok(*v);
        }
        if !self.active.insert(plug.clone()) {
            return Err(SceneError::EvaluationCycle {
                node: self.scene.label(plug.node),
                attr: plug.attr.clone(),
            });
        }

        let result = match self.scene.connections.get(plug) {
            Some(src) => {
                let src = src.clone();
                self.value(&src)
            }
            None => self.intrinsic(plug),
        };
        self.active.remove(plug);

        let v = result?;
        self.values.insert(plug.clone(), v);
        Ok(v)
    }

    fn intrinsic(&mut self, plug: &Plug) -> SceneResult<f64> {
        let scene = self.scene;
        let node = scene.node(plug.node)?;
        match &node.kind {
            NodeKind::Utility { utility } if utility.is_output(&plug.attr) => {
                self.utility_output(plug.node, *utility, &plug.attr)
            }
            NodeKind::Constraint { .. } => match constraint_output_channel(&plug.attr) {
                Some(channel) => {
                    let trs = self.constraint_trs(plug.node)?;
                    Ok(trs.get(channel).unwrap_or_default())
                }
                None => scene.stored_value(plug),
            },
            _ => scene.stored_value(plug),
        }
    }

    fn utility_output(&mut self, node: NodeId, kind: UtilityKind, attr: &str) -> SceneResult<f64> {
        let axis = attr.trim_start_matches("output");
        match kind {
            UtilityKind::Multiply => {
                let a = self.value(&Plug::new(node, format!("input1{}", axis)))?;
                let b = self.value(&Plug::new(node, format!("input2{}", axis)))?;
                Ok(a * b)
            }
            UtilityKind::Reverse => {
                let a = self.value(&Plug::new(node, format!("input{}", axis)))?;
                Ok(1.0 - a)
            }
            UtilityKind::WeightedSum { inputs } => {
                let mut sum = 0.0;
                for i in 0..inputs {
                    let input = self.value(&Plug::new(node, sum_input(i)))?;
                    let weight = self.value(&Plug::new(node, sum_weight(i)))?;
                    sum += input * weight;
                }
                Ok(sum)
            }
        }
    }

    /// Weighted average of the drivers' world transforms, expressed in the
    /// driven node's parent space. With no positive weight the driven node
    /// keeps its stored pose.
    fn constraint_trs(&mut self, node: NodeId) -> SceneResult<Trs> {
        if let Some(trs) = self.constraints.get(&node) {
            return Ok(*trs);
        }

        let (drivers, driven) = match &self.scene.node(node)?.kind {
            NodeKind::Constraint { drivers, driven } => (drivers.clone(), *driven),
            _ => {
                return Err(SceneError::WrongKind {
                    node: self.scene.label(node),
                    expected: "constraint",
                })
            }
        };

        let mut total = 0.0;
        let mut translation = DVec3::ZERO;
        let mut rotation = DVec4::ZERO;
        let mut reference: Option<DQuat> = None;

        for (i, driver) in drivers.iter().enumerate() {
            let weight = self.value(&Plug::new(node, weight_attr(i)))?;
            if weight <= WEIGHT_EPSILON {
                continue;
            }
            let (_, q, t) = self.world(*driver)?.to_scale_rotation_translation();
            // Keep every contribution in the same hemisphere as the first.
            let q = match reference {
                Some(r) if r.dot(q) < 0.0 => -q,
                Some(_) => q,
                None => {
                    reference = Some(q);
                    q
                }
            };
            total += weight;
            translation += t * weight;
            rotation += DVec4::from(q) * weight;
        }

        let trs = if total <= WEIGHT_EPSILON {
            self.scene.node(driven)?.trs
        } else {
            let q = DQuat::from_vec4(rotation / total).normalize();
            let target = DMat4::from_rotation_translation(q, translation / total);
            let parent_space = self.parent_space(driven)?;
            let mut trs = Trs::from_matrix(&(parent_space.inverse() * target));
            trs.scale = self.scene.node(driven)?.trs.scale;
            trs
        };

        self.constraints.insert(node, trs);
        Ok(trs)
    }

    /// World matrix of the node's parent times its offset.
    pub(crate) fn parent_space(&mut self, node: NodeId) -> SceneResult<DMat4> {
        let scene = self.scene;
        let n = scene.node(node)?;
        let offset = n.offset_matrix();
        let parent_world = match n.parent {
            Some(p) => self.world(p)?,
            None => DMat4::IDENTITY,
        };
        Ok(parent_world * offset)
    }

    pub(crate) fn local(&mut self, node: NodeId) -> SceneResult<DMat4> {
        if !self.scene.node(node)?.kind.is_dag() {
            return Ok(DMat4::IDENTITY);
        }
        let mut trs = Trs::default();
        for channel in Channel::TRANSLATE
            .iter()
            .chain(Channel::ROTATE.iter())
            .chain(Channel::SCALE.iter())
        {
            let v = self.value(&Plug::channel(node, *channel))?;
            trs.set(*channel, v);
        }
        Ok(trs.to_matrix())
    }

    pub(crate) fn world(&mut self, node: NodeId) -> SceneResult<DMat4> {
        if let Some(m) = self.worlds.get(&node) {
            return Ok(*m);
        }
        if !self.active_worlds.insert(node) {
            return Err(SceneError::EvaluationCycle {
                node: self.scene.label(node),
                attr: "worldMatrix".to_string(),
            });
        }

        let result = self
            .parent_space(node)
            .and_then(|space| self.local(node).map(|local| space * local));
        self.active_worlds.remove(&node);

        let m = result?;
        self.worlds.insert(node, m);
        Ok(m)
    }
}
