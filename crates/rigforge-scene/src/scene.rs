//! In-memory arena scene.

use std::collections::BTreeMap;

use glam::DMat4;
use serde::Serialize;

use crate::error::{SceneError, SceneResult};
use crate::eval::{constraint_output_channel, weight_attr, Evaluator, CONSTRAINT_OUTPUTS};
use crate::graph::SceneGraph;
use crate::node::{
    Attribute, AttributeSpec, Channel, CurveRole, CurveShape, IkHandleSpec, IkSolver, KindFilter,
    NodeId, NodeKind, Plug, SceneNode, Trs, UtilityKind, HANDLE_ROLL, HANDLE_TWIST,
};

/// Scene graph stored as an arena of nodes plus a connection table.
///
/// Removed nodes leave an empty slot so existing handles never alias a newer
/// node. Cloning a scene is a full snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub(crate) nodes: Vec<Option<SceneNode>>,
    /// Destination plug to source plug.
    pub(crate) connections: BTreeMap<Plug, Plug>,
}

/// Serializable view of a scene.
#[derive(Debug, Serialize)]
pub struct SceneDocument<'a> {
    pub nodes: Vec<NodeEntry<'a>>,
    pub connections: Vec<ConnectionEntry>,
}

#[derive(Debug, Serialize)]
pub struct NodeEntry<'a> {
    pub id: NodeId,
    #[serde(flatten)]
    pub node: &'a SceneNode,
}

/// A connection written as `node.attr` strings.
#[derive(Debug, Serialize)]
pub struct ConnectionEntry {
    pub src: String,
    pub dst: String,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrows a live node.
    pub fn node(&self, id: NodeId) -> SceneResult<&SceneNode> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(SceneError::UnknownNode { node: id })
    }

    fn node_mut(&mut self, id: NodeId) -> SceneResult<&mut SceneNode> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(SceneError::UnknownNode { node: id })
    }

    /// Iterates live nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeId(i as u32), n)))
    }

    /// Iterates connections as `(src, dst)`.
    pub fn connections(&self) -> impl Iterator<Item = (&Plug, &Plug)> {
        self.connections.iter().map(|(dst, src)| (src, dst))
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Node name for messages, falling back to the handle.
    pub(crate) fn label(&self, id: NodeId) -> String {
        self.node(id)
            .map(|n| n.name.clone())
            .unwrap_or_else(|_| id.to_string())
    }

    fn plug_label(&self, plug: &Plug) -> String {
        format!("{}.{}", self.label(plug.node), plug.attr)
    }

    pub fn to_document(&self) -> SceneDocument<'_> {
        SceneDocument {
            nodes: self.iter().map(|(id, node)| NodeEntry { id, node }).collect(),
            connections: self
                .connections()
                .map(|(src, dst)| ConnectionEntry {
                    src: self.plug_label(src),
                    dst: self.plug_label(dst),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_document())
    }

    // ===== Internals =====

    fn require_dag(&self, id: NodeId) -> SceneResult<&SceneNode> {
        let node = self.node(id)?;
        if node.kind.is_dag() {
            Ok(node)
        } else {
            Err(SceneError::WrongKind {
                node: node.name.clone(),
                expected: "transform",
            })
        }
    }

    fn insert(&mut self, name: &str, kind: NodeKind, parent: Option<NodeId>) -> SceneResult<NodeId> {
        if let Some(p) = parent {
            self.require_dag(p)?;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(SceneNode::new(name, kind, parent)));
        if let Some(p) = parent {
            self.node_mut(p)?.children.push(id);
        }
        tracing::trace!(node = name, id = %id, "created node");
        Ok(id)
    }

    fn detach(&mut self, id: NodeId) -> SceneResult<()> {
        if let Some(p) = self.node(id)?.parent {
            self.node_mut(p)?.children.retain(|c| *c != id);
        }
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Removes one node and every connection touching it. Children must
    /// already have been moved or removed.
    fn remove(&mut self, id: NodeId) -> SceneResult<()> {
        self.detach(id)?;
        self.connections
            .retain(|dst, src| dst.node != id && src.node != id);
        self.nodes[id.index()] = None;
        Ok(())
    }

    fn is_output(&self, plug: &Plug) -> bool {
        match self.node(plug.node).map(|n| &n.kind) {
            Ok(NodeKind::Utility { utility }) => utility.is_output(&plug.attr),
            Ok(NodeKind::Constraint { .. }) => constraint_output_channel(&plug.attr).is_some(),
            _ => false,
        }
    }

    /// Stored (unevaluated) value of a channel or attribute.
    pub(crate) fn stored_value(&self, plug: &Plug) -> SceneResult<f64> {
        let node = self.node(plug.node)?;
        if node.kind.is_dag() {
            match plug.as_channel() {
                Some(Channel::Visibility) => return Ok(node.visibility),
                Some(channel) => return Ok(node.trs.get(channel).unwrap_or_default()),
                None => {}
            }
        }
        node.attributes
            .get(&plug.attr)
            .map(|a| a.value)
            .ok_or_else(|| SceneError::UnknownAttribute {
                node: node.name.clone(),
                attr: plug.attr.clone(),
            })
    }

    fn unknown_attr(&self, plug: &Plug) -> SceneError {
        SceneError::UnknownAttribute {
            node: self.label(plug.node),
            attr: plug.attr.clone(),
        }
    }

    fn require_plug(&self, plug: &Plug) -> SceneResult<()> {
        self.node(plug.node)?;
        if self.has_plug(plug) {
            Ok(())
        } else {
            Err(self.unknown_attr(plug))
        }
    }

    /// Checks that a destination plug accepts a write or a connection.
    fn require_writable(&self, plug: &Plug) -> SceneResult<()> {
        self.require_plug(plug)?;
        if self.is_output(plug) {
            return Err(SceneError::ReadOnlyAttribute {
                node: self.label(plug.node),
                attr: plug.attr.clone(),
            });
        }
        if self.is_locked(plug) {
            return Err(SceneError::LockedAttribute {
                node: self.label(plug.node),
                attr: plug.attr.clone(),
            });
        }
        Ok(())
    }

    /// Local channels that put `node` at `world` under its current parent and offset.
    fn local_for_world(&self, node: NodeId, world: DMat4) -> SceneResult<Trs> {
        let space = Evaluator::new(self).parent_space(node)?;
        Ok(Trs::from_matrix(&(space.inverse() * world)))
    }

    fn copy_subtree(&mut self, src: NodeId, parent: Option<NodeId>) -> SceneResult<NodeId> {
        let original = self.node(src)?.clone();
        let id = self.insert(&original.name, original.kind.clone(), parent)?;
        {
            let copy = self.node_mut(id)?;
            copy.trs = original.trs;
            copy.offset = original.offset;
            copy.visibility = original.visibility;
            copy.color = original.color;
            copy.attributes = original.attributes.clone();
            copy.locked = original.locked.clone();
        }
        for child in &original.children {
            self.copy_subtree(*child, Some(id))?;
        }
        Ok(id)
    }
}

impl SceneGraph for Scene {
    fn create_transform(&mut self, name: &str, parent: Option<NodeId>) -> SceneResult<NodeId> {
        self.insert(name, NodeKind::Group, parent)
    }

    fn create_joint(&mut self, name: &str, parent: Option<NodeId>) -> SceneResult<NodeId> {
        self.insert(name, NodeKind::Joint, parent)
    }

    fn create_curve_shape(
        &mut self,
        name: &str,
        shape: CurveShape,
        role: CurveRole,
    ) -> SceneResult<NodeId> {
        let required = if shape.closed { 3 } else { shape.degree as usize + 1 };
        if shape.degree == 0 || shape.points.len() < required {
            return Err(SceneError::InvalidCurve {
                name: name.to_string(),
                degree: shape.degree,
                points: shape.points.len(),
            });
        }
        let kind = match role {
            CurveRole::Control => NodeKind::Control { shape },
            CurveRole::Path => NodeKind::Curve { shape },
        };
        self.insert(name, kind, None)
    }

    fn create_utility_node(&mut self, kind: UtilityKind, name: &str) -> SceneResult<NodeId> {
        let id = self.insert(name, NodeKind::Utility { utility: kind }, None)?;
        for (attr, default) in kind.inputs() {
            self.add_attribute(id, AttributeSpec::scalar(attr, default))?;
        }
        Ok(id)
    }

    fn create_weighted_constraint(
        &mut self,
        drivers: &[NodeId],
        driven: NodeId,
        name: &str,
    ) -> SceneResult<NodeId> {
        if drivers.is_empty() {
            return Err(SceneError::NoDrivers {
                name: name.to_string(),
            });
        }
        for driver in drivers {
            self.require_dag(*driver)?;
        }
        self.require_dag(driven)?;
        for (_, channel) in CONSTRAINT_OUTPUTS {
            self.require_writable(&Plug::channel(driven, channel))?;
        }

        let kind = NodeKind::Constraint {
            drivers: drivers.to_vec(),
            driven,
        };
        let id = self.insert(name, kind, None)?;
        for i in 0..drivers.len() {
            self.add_attribute(id, AttributeSpec::scalar(weight_attr(i), 1.0))?;
        }
        for (output, channel) in CONSTRAINT_OUTPUTS {
            self.connect(&Plug::new(id, output), &Plug::channel(driven, channel))?;
        }
        Ok(id)
    }

    fn create_ik_handle(&mut self, spec: IkHandleSpec, name: &str) -> SceneResult<NodeId> {
        for joint in [spec.start, spec.end] {
            if !matches!(self.node(joint)?.kind, NodeKind::Joint) {
                return Err(SceneError::WrongKind {
                    node: self.label(joint),
                    expected: "joint",
                });
            }
        }

        let mut ancestor = self.node(spec.end)?.parent;
        let mut found = false;
        while let Some(a) = ancestor {
            if a == spec.start {
                found = true;
                break;
            }
            ancestor = self.node(a)?.parent;
        }
        if !found {
            return Err(SceneError::InvalidIkChain {
                start: self.label(spec.start),
                end: self.label(spec.end),
            });
        }

        match (spec.solver, spec.curve) {
            (IkSolver::Spline, None) => {
                return Err(SceneError::MissingSplineCurve {
                    name: name.to_string(),
                })
            }
            (_, Some(curve)) if !matches!(self.node(curve)?.kind, NodeKind::Curve { .. }) => {
                return Err(SceneError::WrongKind {
                    node: self.label(curve),
                    expected: "curve",
                })
            }
            _ => {}
        }
        if let Some(pole) = spec.pole {
            self.require_dag(pole)?;
        }

        let end_position = self.query_world_translation(spec.end)?;
        let kind = NodeKind::IkHandle {
            solver: spec.solver,
            start: spec.start,
            end: spec.end,
            curve: spec.curve,
            pole: spec.pole,
        };
        let id = self.insert(name, kind, None)?;
        self.add_attribute(id, AttributeSpec::scalar(HANDLE_ROLL, 0.0))?;
        self.add_attribute(id, AttributeSpec::scalar(HANDLE_TWIST, 0.0))?;
        self.node_mut(id)?.trs = Trs::from_translation(end_position.to_array());
        Ok(id)
    }

    fn create_skin_binding(
        &mut self,
        joints: &[NodeId],
        target: NodeId,
        name: &str,
    ) -> SceneResult<NodeId> {
        for joint in joints {
            if !matches!(self.node(*joint)?.kind, NodeKind::Joint) {
                return Err(SceneError::WrongKind {
                    node: self.label(*joint),
                    expected: "joint",
                });
            }
        }
        if !matches!(self.node(target)?.kind, NodeKind::Curve { .. }) {
            return Err(SceneError::WrongKind {
                node: self.label(target),
                expected: "curve",
            });
        }
        let kind = NodeKind::SkinBinding {
            joints: joints.to_vec(),
            target,
        };
        self.insert(name, kind, None)
    }

    fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_ok()
    }

    fn name(&self, node: NodeId) -> SceneResult<&str> {
        self.node(node).map(|n| n.name.as_str())
    }

    fn kind(&self, node: NodeId) -> SceneResult<&NodeKind> {
        self.node(node).map(|n| &n.kind)
    }

    fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.iter().find(|(_, n)| n.name == name).map(|(id, _)| id)
    }

    fn find_child(&self, parent: Option<NodeId>, name: &str) -> Option<NodeId> {
        match parent {
            Some(p) => self
                .node(p)
                .ok()?
                .children
                .iter()
                .copied()
                .find(|c| self.node(*c).map(|n| n.name == name).unwrap_or(false)),
            None => self
                .iter()
                .find(|(_, n)| n.parent.is_none() && n.kind.is_dag() && n.name == name)
                .map(|(id, _)| id),
        }
    }

    fn parent(&self, node: NodeId) -> SceneResult<Option<NodeId>> {
        self.node(node).map(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> SceneResult<Vec<NodeId>> {
        self.node(node).map(|n| n.children.clone())
    }

    fn list_descendants(&self, node: NodeId, filter: KindFilter) -> SceneResult<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(node)?.children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let n = self.node(id)?;
            if n.kind.matches(filter) {
                out.push(id);
            }
            stack.extend(n.children.iter().rev().copied());
        }
        Ok(out)
    }

    fn count(&self, filter: KindFilter) -> usize {
        self.iter().filter(|(_, n)| n.kind.matches(filter)).count()
    }

    fn rename(&mut self, node: NodeId, name: &str) -> SceneResult<()> {
        self.node_mut(node)?.name = name.to_string();
        Ok(())
    }

    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> SceneResult<()> {
        self.require_dag(node)?;
        if self.node(node)?.parent == parent {
            return Ok(());
        }
        if let Some(p) = parent {
            self.require_dag(p)?;
            let mut current = Some(p);
            while let Some(c) = current {
                if c == node {
                    return Err(SceneError::InvalidParent {
                        node: self.label(node),
                        parent: self.label(p),
                    });
                }
                current = self.node(c)?.parent;
            }
        }

        let world = self.world_matrix(node)?;
        self.detach(node)?;
        self.node_mut(node)?.parent = parent;
        if let Some(p) = parent {
            self.node_mut(p)?.children.push(node);
        }
        let trs = self.local_for_world(node, world)?;
        self.node_mut(node)?.trs = trs;
        Ok(())
    }

    fn prune_node(&mut self, node: NodeId) -> SceneResult<()> {
        let (parent, children) = {
            let n = self.node(node)?;
            (n.parent, n.children.clone())
        };
        for child in children {
            self.set_parent(child, parent)?;
        }
        self.remove(node)
    }

    fn delete_subtree(&mut self, node: NodeId) -> SceneResult<()> {
        let mut doomed = self.list_descendants(node, KindFilter::Any)?;
        doomed.reverse();
        doomed.push(node);
        for id in doomed {
            self.remove(id)?;
        }
        Ok(())
    }

    fn duplicate_subtree(&mut self, node: NodeId) -> SceneResult<NodeId> {
        let world = self.world_matrix(node)?;
        let copy = self.copy_subtree(node, None)?;
        let trs = self.local_for_world(copy, world)?;
        self.node_mut(copy)?.trs = trs;
        Ok(copy)
    }

    fn local_matrix(&self, node: NodeId) -> SceneResult<DMat4> {
        Evaluator::new(self).local(node)
    }

    fn world_matrix(&self, node: NodeId) -> SceneResult<DMat4> {
        Evaluator::new(self).world(node)
    }

    fn offset_matrix(&self, node: NodeId) -> SceneResult<DMat4> {
        self.node(node).map(SceneNode::offset_matrix)
    }

    fn set_offset_matrix(&mut self, node: NodeId, matrix: DMat4) -> SceneResult<()> {
        self.require_dag(node)?;
        self.node_mut(node)?.offset = matrix.to_cols_array();
        Ok(())
    }

    fn match_world_transform(&mut self, node: NodeId, reference: NodeId) -> SceneResult<()> {
        self.require_dag(node)?;
        let world = self.world_matrix(reference)?;
        let trs = self.local_for_world(node, world)?;
        self.node_mut(node)?.trs = trs;
        Ok(())
    }

    fn add_attribute(&mut self, node: NodeId, spec: AttributeSpec) -> SceneResult<()> {
        let n = self.node_mut(node)?;
        let shadows_channel = n.kind.is_dag() && Channel::from_name(&spec.name).is_some();
        if shadows_channel || n.attributes.contains_key(&spec.name) {
            return Err(SceneError::DuplicateAttribute {
                node: n.name.clone(),
                attr: spec.name,
            });
        }
        let value = spec.coerce(spec.default);
        n.attributes
            .insert(spec.name.clone(), Attribute { spec, value });
        Ok(())
    }

    fn has_plug(&self, plug: &Plug) -> bool {
        let Ok(node) = self.node(plug.node) else {
            return false;
        };
        (node.kind.is_dag() && plug.as_channel().is_some())
            || node.attributes.contains_key(&plug.attr)
            || self.is_output(plug)
    }

    fn value(&self, plug: &Plug) -> SceneResult<f64> {
        self.require_plug(plug)?;
        Evaluator::new(self).value(plug)
    }

    fn set_value(&mut self, plug: &Plug, value: f64) -> SceneResult<()> {
        self.require_writable(plug)?;
        if self.connections.contains_key(plug) {
            return Err(SceneError::ConnectedAttribute {
                node: self.label(plug.node),
                attr: plug.attr.clone(),
            });
        }

        let node = self.node_mut(plug.node)?;
        match plug.as_channel() {
            Some(Channel::Visibility) if node.kind.is_dag() => node.visibility = value,
            Some(channel) if node.kind.is_dag() => {
                node.trs.set(channel, value);
            }
            _ => {
                if let Some(attr) = node.attributes.get_mut(&plug.attr) {
                    attr.value = attr.spec.coerce(value);
                }
            }
        }
        Ok(())
    }

    fn lock(&mut self, plug: &Plug) -> SceneResult<()> {
        self.require_plug(plug)?;
        self.node_mut(plug.node)?.locked.insert(plug.attr.clone());
        Ok(())
    }

    fn is_locked(&self, plug: &Plug) -> bool {
        self.node(plug.node)
            .map(|n| n.locked.contains(&plug.attr))
            .unwrap_or(false)
    }

    fn connect(&mut self, src: &Plug, dst: &Plug) -> SceneResult<()> {
        self.require_plug(src)?;
        self.require_writable(dst)?;
        if let Some(old) = self.connections.insert(dst.clone(), src.clone()) {
            tracing::debug!(
                dst = %self.plug_label(dst),
                replaced = %self.plug_label(&old),
                "replaced incoming connection"
            );
        }
        Ok(())
    }

    fn source(&self, dst: &Plug) -> Option<Plug> {
        self.connections.get(dst).cloned()
    }

    fn set_override_color(&mut self, node: NodeId, index: u8) -> SceneResult<()> {
        self.node_mut(node)?.color = Some(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use pretty_assertions::assert_eq;
    use rigforge_spec::RigforgeError;

    const EPS: f64 = 1e-9;

    fn chain(scene: &mut Scene) -> (NodeId, NodeId, NodeId) {
        let a = scene.create_joint("a", None).unwrap();
        let b = scene.create_joint("b", Some(a)).unwrap();
        let c = scene.create_joint("c", Some(b)).unwrap();
        scene.set_channel_value(a, Channel::TranslateY, 10.0).unwrap();
        scene.set_channel_value(b, Channel::TranslateX, 5.0).unwrap();
        scene.set_channel_value(c, Channel::TranslateX, 3.0).unwrap();
        (a, b, c)
    }

    fn close(a: DVec3, b: DVec3) -> bool {
        a.abs_diff_eq(b, 1e-9)
    }

    #[test]
    fn test_world_translation_accumulates() {
        let mut scene = Scene::new();
        let (_, _, c) = chain(&mut scene);
        let p = scene.query_world_translation(c).unwrap();
        assert!(close(p, DVec3::new(8.0, 10.0, 0.0)));
    }

    #[test]
    fn test_prune_reparents_children_in_place() {
        let mut scene = Scene::new();
        let (a, b, c) = chain(&mut scene);
        scene.prune_node(b).unwrap();

        assert!(!scene.contains(b));
        assert_eq!(scene.parent(c).unwrap(), Some(a));
        assert_eq!(scene.children(a).unwrap(), vec![c]);
        let p = scene.query_world_translation(c).unwrap();
        assert!(close(p, DVec3::new(8.0, 10.0, 0.0)));
    }

    #[test]
    fn test_duplicate_subtree_is_disconnected_copy() {
        let mut scene = Scene::new();
        let root = scene.create_transform("grp", None).unwrap();
        let (a, _, _) = chain(&mut scene);
        scene.set_parent(a, Some(root)).unwrap();

        let copy = scene.duplicate_subtree(a).unwrap();
        assert_ne!(copy, a);
        assert_eq!(scene.parent(copy).unwrap(), None);
        assert_eq!(scene.name(copy).unwrap(), "a");

        let names: Vec<_> = scene
            .list_descendants(copy, KindFilter::Joint)
            .unwrap()
            .into_iter()
            .map(|id| scene.name(id).unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["b", "c"]);

        let original = scene.query_world_translation(a).unwrap();
        let copied = scene.query_world_translation(copy).unwrap();
        assert!(close(original, copied));
    }

    #[test]
    fn test_set_parent_rejects_cycle() {
        let mut scene = Scene::new();
        let (a, _, c) = chain(&mut scene);
        let err = scene.set_parent(a, Some(c)).unwrap_err();
        assert!(matches!(err, SceneError::InvalidParent { .. }));
    }

    #[test]
    fn test_delete_subtree_drops_connections() {
        let mut scene = Scene::new();
        let (a, b, c) = chain(&mut scene);
        let other = scene.create_transform("other", None).unwrap();
        scene
            .connect(
                &Plug::channel(c, Channel::RotateX),
                &Plug::channel(other, Channel::RotateX),
            )
            .unwrap();

        scene.delete_subtree(b).unwrap();
        assert!(scene.contains(a));
        assert!(!scene.contains(c));
        assert_eq!(scene.source(&Plug::channel(other, Channel::RotateX)), None);
        assert!(scene.children(a).unwrap().is_empty());
    }

    #[test]
    fn test_utility_network_evaluates() {
        let mut scene = Scene::new();
        let ctrl = scene.create_transform("ctrl", None).unwrap();
        scene
            .add_attribute(ctrl, AttributeSpec::double("IKFKBlend", 0.0, 10.0, 0.0))
            .unwrap();
        let md = scene.create_utility_node(UtilityKind::Multiply, "md").unwrap();
        let rev = scene.create_utility_node(UtilityKind::Reverse, "rev").unwrap();
        scene
            .connect(&Plug::new(ctrl, "IKFKBlend"), &Plug::new(md, "input1X"))
            .unwrap();
        scene.set_value(&Plug::new(md, "input2X"), 0.1).unwrap();
        scene
            .connect(&Plug::new(md, "outputX"), &Plug::new(rev, "inputX"))
            .unwrap();

        scene.set_value(&Plug::new(ctrl, "IKFKBlend"), 10.0).unwrap();
        assert_eq!(scene.value(&Plug::new(md, "outputX")).unwrap(), 1.0);
        assert_eq!(scene.value(&Plug::new(rev, "outputX")).unwrap(), 0.0);

        scene.set_value(&Plug::new(ctrl, "IKFKBlend"), 25.0).unwrap();
        assert_eq!(scene.value(&Plug::new(ctrl, "IKFKBlend")).unwrap(), 10.0);
    }

    #[test]
    fn test_weighted_sum() {
        let mut scene = Scene::new();
        let sum = scene
            .create_utility_node(UtilityKind::WeightedSum { inputs: 3 }, "sum")
            .unwrap();
        for (i, (input, weight)) in [(2.0, -1.0), (3.0, 1.0), (4.0, 1.0)].iter().enumerate() {
            scene.set_value(&Plug::new(sum, format!("input{}", i)), *input).unwrap();
            scene.set_value(&Plug::new(sum, format!("weight{}", i)), *weight).unwrap();
        }
        assert!((scene.value(&Plug::new(sum, "output")).unwrap() - 5.0).abs() < EPS);
    }

    #[test]
    fn test_write_guards() {
        let mut scene = Scene::new();
        let a = scene.create_transform("a", None).unwrap();
        let b = scene.create_transform("b", None).unwrap();
        let md = scene.create_utility_node(UtilityKind::Multiply, "md").unwrap();

        scene.lock_channel(a, Channel::TranslateX).unwrap();
        assert!(matches!(
            scene.set_channel_value(a, Channel::TranslateX, 1.0),
            Err(SceneError::LockedAttribute { .. })
        ));

        scene
            .connect(&Plug::channel(b, Channel::RotateY), &Plug::channel(a, Channel::RotateY))
            .unwrap();
        assert!(matches!(
            scene.set_channel_value(a, Channel::RotateY, 1.0),
            Err(SceneError::ConnectedAttribute { .. })
        ));

        assert!(matches!(
            scene.set_value(&Plug::new(md, "outputX"), 1.0),
            Err(SceneError::ReadOnlyAttribute { .. })
        ));
        assert!(matches!(
            scene.value(&Plug::new(md, "translateX")),
            Err(SceneError::UnknownAttribute { .. })
        ));
        assert!(matches!(
            scene.add_attribute(a, AttributeSpec::scalar("rotateX", 0.0)),
            Err(SceneError::DuplicateAttribute { .. })
        ));
    }

    #[test]
    fn test_evaluation_cycle_detected() {
        let mut scene = Scene::new();
        let a = scene.create_transform("a", None).unwrap();
        let b = scene.create_transform("b", None).unwrap();
        scene
            .connect(&Plug::channel(a, Channel::RotateX), &Plug::channel(b, Channel::RotateX))
            .unwrap();
        scene
            .connect(&Plug::channel(b, Channel::RotateX), &Plug::channel(a, Channel::RotateX))
            .unwrap();
        assert!(matches!(
            scene.channel_value(a, Channel::RotateX),
            Err(SceneError::EvaluationCycle { .. })
        ));
    }

    #[test]
    fn test_constraint_blends_drivers() {
        let mut scene = Scene::new();
        let fk = scene.create_joint("fk", None).unwrap();
        let ik = scene.create_joint("ik", None).unwrap();
        let driven = scene.create_joint("driven", None).unwrap();
        scene.set_channel_value(fk, Channel::TranslateX, 10.0).unwrap();
        scene.set_channel_value(ik, Channel::TranslateX, 20.0).unwrap();
        scene.set_channel_value(ik, Channel::RotateZ, 90.0).unwrap();

        let c = scene
            .create_weighted_constraint(&[fk, ik], driven, "driven_pc")
            .unwrap();
        assert_eq!(
            scene.source(&Plug::channel(driven, Channel::TranslateX)),
            Some(Plug::new(c, "constraintTranslateX"))
        );

        scene.set_value(&Plug::new(c, "w0"), 0.0).unwrap();
        let rz = scene.channel_value(driven, Channel::RotateZ).unwrap();
        assert!((rz - 90.0).abs() < 1e-9);
        assert!((scene.channel_value(driven, Channel::TranslateX).unwrap() - 20.0).abs() < EPS);

        scene.set_value(&Plug::new(c, "w0"), 1.0).unwrap();
        scene.set_value(&Plug::new(c, "w1"), 1.0).unwrap();
        let tx = scene.channel_value(driven, Channel::TranslateX).unwrap();
        assert!((tx - 15.0).abs() < EPS);
        let rz = scene.channel_value(driven, Channel::RotateZ).unwrap();
        assert!((rz - 45.0).abs() < 1e-9);

        scene.set_value(&Plug::new(c, "w1"), 0.0).unwrap();
        scene.set_value(&Plug::new(c, "w0"), 0.0).unwrap();
        assert_eq!(scene.channel_value(driven, Channel::TranslateX).unwrap(), 0.0);
    }

    #[test]
    fn test_constraint_respects_driven_parent_space() {
        let mut scene = Scene::new();
        let target = scene.create_joint("target", None).unwrap();
        scene.set_channel_value(target, Channel::TranslateY, 30.0).unwrap();
        let parent = scene.create_joint("parent", None).unwrap();
        scene.set_channel_value(parent, Channel::TranslateY, 10.0).unwrap();
        let driven = scene.create_joint("driven", Some(parent)).unwrap();

        scene
            .create_weighted_constraint(&[target], driven, "pc")
            .unwrap();
        assert!((scene.channel_value(driven, Channel::TranslateY).unwrap() - 20.0).abs() < EPS);
        let world = scene.query_world_translation(driven).unwrap();
        assert!(close(world, DVec3::new(0.0, 30.0, 0.0)));
    }

    #[test]
    fn test_ik_handle_validation() {
        let mut scene = Scene::new();
        let (a, _, c) = chain(&mut scene);

        let err = scene
            .create_ik_handle(
                IkHandleSpec {
                    solver: IkSolver::RotatePlane,
                    start: c,
                    end: a,
                    curve: None,
                    pole: None,
                },
                "bad",
            )
            .unwrap_err();
        assert!(matches!(err, SceneError::InvalidIkChain { .. }));

        let err = scene
            .create_ik_handle(
                IkHandleSpec {
                    solver: IkSolver::Spline,
                    start: a,
                    end: c,
                    curve: None,
                    pole: None,
                },
                "spline",
            )
            .unwrap_err();
        assert!(matches!(err, SceneError::MissingSplineCurve { .. }));

        let handle = scene
            .create_ik_handle(
                IkHandleSpec {
                    solver: IkSolver::RotatePlane,
                    start: a,
                    end: c,
                    curve: None,
                    pole: None,
                },
                "a_ikh",
            )
            .unwrap();
        let p = scene.query_world_translation(handle).unwrap();
        assert!(close(p, DVec3::new(8.0, 10.0, 0.0)));
        assert!(scene.has_plug(&Plug::new(handle, "roll")));
    }

    #[test]
    fn test_curve_requires_enough_points() {
        let mut scene = Scene::new();
        let err = scene
            .create_curve_shape(
                "c",
                CurveShape::open(vec![[0.0; 3]; 3], 4),
                CurveRole::Path,
            )
            .unwrap_err();
        assert_eq!(err.code(), "SCENE_010");
    }

    #[test]
    fn test_document_serializes() {
        let mut scene = Scene::new();
        let (a, b, _) = chain(&mut scene);
        scene
            .connect(&Plug::channel(a, Channel::RotateX), &Plug::channel(b, Channel::RotateX))
            .unwrap();
        let json = scene.to_json().unwrap();
        assert!(json.contains("\"type\": \"joint\""));
        assert!(json.contains("\"src\": \"a.rotateX\""));
        assert!(json.contains("\"dst\": \"b.rotateX\""));
    }
}
