//! The Scene Graph Service boundary.
//!
//! Everything the rig compiler does to a scene goes through [`SceneGraph`].
//! Hosts with path-based node identifiers can implement it too, which is why
//! callers still perform structural mutations deepest-first.

use glam::{DMat4, DVec3};

use crate::error::SceneResult;
use crate::node::{
    AttributeSpec, Channel, CurveRole, CurveShape, IkHandleSpec, KindFilter, NodeId, NodeKind,
    Plug, UtilityKind,
};

/// Operations a host scene must provide.
pub trait SceneGraph {
    // ===== Creation =====

    /// Creates an empty transform group.
    fn create_transform(&mut self, name: &str, parent: Option<NodeId>) -> SceneResult<NodeId>;

    /// Creates a joint.
    fn create_joint(&mut self, name: &str, parent: Option<NodeId>) -> SceneResult<NodeId>;

    /// Creates a parentless curve, either a control proxy or path geometry.
    fn create_curve_shape(
        &mut self,
        name: &str,
        shape: CurveShape,
        role: CurveRole,
    ) -> SceneResult<NodeId>;

    /// Creates a numeric utility node with its default inputs.
    fn create_utility_node(&mut self, kind: UtilityKind, name: &str) -> SceneResult<NodeId>;

    /// Creates a weighted parent constraint and connects its outputs into the
    /// driven node's translate and rotate channels. Driver `i` is weighted by
    /// the constraint's `w{i}` attribute.
    fn create_weighted_constraint(
        &mut self,
        drivers: &[NodeId],
        driven: NodeId,
        name: &str,
    ) -> SceneResult<NodeId>;

    /// Creates an IK handle placed at the end joint.
    fn create_ik_handle(&mut self, spec: IkHandleSpec, name: &str) -> SceneResult<NodeId>;

    /// Binds joints to a curve.
    fn create_skin_binding(
        &mut self,
        joints: &[NodeId],
        target: NodeId,
        name: &str,
    ) -> SceneResult<NodeId>;

    // ===== Queries =====

    fn contains(&self, node: NodeId) -> bool;

    fn name(&self, node: NodeId) -> SceneResult<&str>;

    fn kind(&self, node: NodeId) -> SceneResult<&NodeKind>;

    /// First live node with this name, in creation order.
    fn find_by_name(&self, name: &str) -> Option<NodeId>;

    /// Child of `parent` (or a root node when `parent` is `None`) with this name.
    fn find_child(&self, parent: Option<NodeId>, name: &str) -> Option<NodeId>;

    fn parent(&self, node: NodeId) -> SceneResult<Option<NodeId>>;

    fn children(&self, node: NodeId) -> SceneResult<Vec<NodeId>>;

    /// Descendants of `node` (excluding itself) in depth-first pre-order.
    fn list_descendants(&self, node: NodeId, filter: KindFilter) -> SceneResult<Vec<NodeId>>;

    /// Number of ancestors above `node`.
    fn depth(&self, node: NodeId) -> SceneResult<usize> {
        let mut depth = 0;
        let mut current = self.parent(node)?;
        while let Some(p) = current {
            depth += 1;
            current = self.parent(p)?;
        }
        Ok(depth)
    }

    /// Number of live nodes matching the filter.
    fn count(&self, filter: KindFilter) -> usize;

    // ===== Structure =====

    fn rename(&mut self, node: NodeId, name: &str) -> SceneResult<()>;

    /// Moves a node under a new parent, preserving its world transform.
    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> SceneResult<()>;

    /// Removes a single node. Its children re-attach to its former parent with
    /// their world transforms preserved, and its connections are dropped.
    fn prune_node(&mut self, node: NodeId) -> SceneResult<()>;

    /// Removes a node and all of its descendants.
    fn delete_subtree(&mut self, node: NodeId) -> SceneResult<()>;

    /// Copies a node and its descendants into a new parentless hierarchy with
    /// the same world transforms. Connections are not copied.
    fn duplicate_subtree(&mut self, node: NodeId) -> SceneResult<NodeId>;

    // ===== Transforms =====

    /// Evaluated local matrix (offset excluded).
    fn local_matrix(&self, node: NodeId) -> SceneResult<DMat4>;

    /// Evaluated world matrix.
    fn world_matrix(&self, node: NodeId) -> SceneResult<DMat4>;

    fn query_world_translation(&self, node: NodeId) -> SceneResult<DVec3> {
        Ok(self.world_matrix(node)?.w_axis.truncate())
    }

    fn offset_matrix(&self, node: NodeId) -> SceneResult<DMat4>;

    fn set_offset_matrix(&mut self, node: NodeId, matrix: DMat4) -> SceneResult<()>;

    /// Sets `node`'s channels so its world transform equals `reference`'s.
    fn match_world_transform(&mut self, node: NodeId, reference: NodeId) -> SceneResult<()>;

    // ===== Attributes and dataflow =====

    fn add_attribute(&mut self, node: NodeId, spec: AttributeSpec) -> SceneResult<()>;

    fn has_plug(&self, plug: &Plug) -> bool;

    /// Evaluated value of a channel, attribute, or computed output.
    fn value(&self, plug: &Plug) -> SceneResult<f64>;

    /// Writes a stored value. Fails on locked, connected, or computed plugs.
    fn set_value(&mut self, plug: &Plug, value: f64) -> SceneResult<()>;

    fn lock(&mut self, plug: &Plug) -> SceneResult<()>;

    fn is_locked(&self, plug: &Plug) -> bool;

    /// Connects `src` into `dst`, replacing any existing incoming connection.
    fn connect(&mut self, src: &Plug, dst: &Plug) -> SceneResult<()>;

    /// The plug driving `dst`, if connected.
    fn source(&self, dst: &Plug) -> Option<Plug>;

    fn set_override_color(&mut self, node: NodeId, index: u8) -> SceneResult<()>;

    // ===== Conveniences =====

    fn channel_value(&self, node: NodeId, channel: Channel) -> SceneResult<f64> {
        self.value(&Plug::channel(node, channel))
    }

    fn set_channel_value(&mut self, node: NodeId, channel: Channel, value: f64) -> SceneResult<()> {
        self.set_value(&Plug::channel(node, channel), value)
    }

    fn lock_channel(&mut self, node: NodeId, channel: Channel) -> SceneResult<()> {
        self.lock(&Plug::channel(node, channel))
    }
}
