//! Skeleton Variant Compiler.
//!
//! A variant is a duplicate of the deform skeleton cut down to the joints of
//! the chains it consumes. For each chain the root is detached into its own
//! group, non-members are pruned, and members are renamed
//! `{name}_{variant}` and registered.
//!
//! All structural passes run deepest-first. With stable node handles this is
//! not needed for correctness here, but hosts with path-based identifiers
//! rely on it, so the order is checked.

use rigforge_scene::{Channel, KindFilter, NodeId, SceneGraph};
use rigforge_spec::naming::DEFORM_GROUP;
use rigforge_spec::{Category, ChainRef};
use tracing::{debug, info, info_span};

use crate::context::{joint_map, RigContext};
use crate::error::{RigError, RigResult};
use crate::registry::Variant;

/// Guards a pass that must visit nodes from the deepest toward the root.
#[derive(Debug)]
pub(crate) struct DeepestFirst {
    pass: &'static str,
    previous: Option<usize>,
}

impl DeepestFirst {
    pub(crate) fn new(pass: &'static str) -> Self {
        Self {
            pass,
            previous: None,
        }
    }

    pub(crate) fn visit(&mut self, depth: usize) -> RigResult<()> {
        if let Some(previous) = self.previous {
            if depth > previous {
                return Err(RigError::StructuralOrdering {
                    pass: self.pass,
                    depth,
                    previous,
                });
            }
        }
        self.previous = Some(depth);
        Ok(())
    }
}

/// Returns `nodes` paired with their depth, deepest first. Ties keep input order.
pub(crate) fn sort_deepest_first<S: SceneGraph + ?Sized>(
    scene: &S,
    nodes: impl IntoIterator<Item = NodeId>,
) -> RigResult<Vec<(NodeId, usize)>> {
    let mut with_depth = nodes
        .into_iter()
        .map(|n| scene.depth(n).map(|d| (n, d)))
        .collect::<Result<Vec<_>, _>>()?;
    with_depth.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(with_depth)
}

/// Moves the source skeleton under `RIG_ROOT|skeleton|deform_joints` and
/// registers every joint of it in the deform variant.
pub fn register_deform_skeleton<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    root: NodeId,
) -> RigResult<NodeId> {
    let group = cx.skeleton_group(DEFORM_GROUP)?;
    cx.scene.set_parent(root, Some(group))?;

    let mut joints = vec![root];
    joints.extend(cx.scene.list_descendants(root, KindFilter::Joint)?);
    for joint in &joints {
        let name = cx.scene.name(*joint)?.to_string();
        cx.registry.put_joint(Variant::Deform, &name, *joint)?;
    }

    info!(joints = joints.len(), "registered deform skeleton");
    Ok(root)
}

/// Compiles the FK and IK variants from the switchable chains.
pub fn compile_skeleton_variants<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    root: NodeId,
) -> RigResult<()> {
    for variant in Variant::COMPILED {
        compile_variant(cx, root, variant, &Category::SWITCHABLE)?;
    }
    Ok(())
}

/// Compiles one variant consuming the chains of `categories`.
pub fn compile_variant<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    source_root: NodeId,
    variant: Variant,
    categories: &[Category],
) -> RigResult<()> {
    let _span = info_span!("compile_variant", variant = %variant).entered();

    let catalog = cx.catalog;
    catalog.validate()?;
    catalog.validate_disjoint(categories)?;
    let chains: Vec<ChainRef<'_>> = catalog.chains_in_all(categories).collect();

    // Fail before touching the scene if any member is missing.
    let source = joint_map(&*cx.scene, source_root)?;
    for chain in &chains {
        for joint in chain.joints {
            if !source.contains_key(joint) {
                return Err(RigError::schema_lookup(
                    joint.as_str(),
                    format!("chain '{}' of variant '{}'", chain.label(), variant),
                ));
            }
        }
    }

    let container = cx.skeleton_group(variant.as_str())?;
    let scratch = cx.scene.duplicate_subtree(source_root)?;
    let copies = joint_map(&*cx.scene, scratch)?;

    // Detach every chain root before pruning anything, deepest first, so a
    // chain nested inside another (arms under the spine) leaves first.
    let mut roots = Vec::with_capacity(chains.len());
    for (i, chain) in chains.iter().enumerate() {
        let name = chain.root().unwrap_or_default();
        let node = copies
            .get(name)
            .copied()
            .ok_or_else(|| RigError::schema_lookup(name, format!("variant '{}'", variant)))?;
        roots.push((i, node));
    }
    let by_depth = sort_deepest_first(&*cx.scene, roots.iter().map(|(_, n)| *n))?;

    let mut order = DeepestFirst::new("detach");
    let mut detached = Vec::with_capacity(chains.len());
    for (node, depth) in by_depth {
        order.visit(depth)?;
        let Some(&(index, _)) = roots.iter().find(|(_, n)| *n == node) else {
            continue;
        };
        let chain = &chains[index];
        let group_name = format!("{}_{}", chain.label(), variant);
        let group = cx.scene.create_transform(&group_name, Some(container))?;
        cx.scene.set_parent(node, Some(group))?;
        detached.push((index, node));
    }

    for (index, node) in detached {
        prune_chain(cx, &chains[index], node, variant)?;
    }

    cx.scene.delete_subtree(scratch)?;
    info!(joints = cx.registry.joint_count(variant), "compiled variant");
    Ok(())
}

/// Prunes a detached chain subtree to its members, then renames and registers them.
fn prune_chain<S: SceneGraph + ?Sized>(
    cx: &mut RigContext<'_, S>,
    chain: &ChainRef<'_>,
    chain_root: NodeId,
    variant: Variant,
) -> RigResult<()> {
    let mut subtree = vec![chain_root];
    subtree.extend(cx.scene.list_descendants(chain_root, KindFilter::Any)?);
    let subtree = sort_deepest_first(&*cx.scene, subtree)?;

    let mut order = DeepestFirst::new("prune");
    let mut members = Vec::with_capacity(chain.joints.len());
    for (node, depth) in subtree {
        order.visit(depth)?;
        let name = cx.scene.name(node)?.to_string();
        if chain.contains(&name) {
            members.push((node, depth, name));
        } else {
            debug!(joint = %name, chain = %chain.label(), "pruning non-member");
            cx.scene.prune_node(node)?;
        }
    }

    for joint in chain.joints {
        if !members.iter().any(|(_, _, name)| name == joint) {
            return Err(RigError::schema_lookup(
                joint.as_str(),
                format!("chain '{}' (not below its root)", chain.label()),
            ));
        }
    }

    let mut order = DeepestFirst::new("rename");
    for (node, depth, name) in &members {
        order.visit(*depth)?;
        cx.scene.rename(*node, &format!("{}_{}", name, variant))?;
        cx.scene.set_channel_value(*node, Channel::Visibility, 0.0)?;
    }
    for (node, _, name) in members {
        cx.registry.put_joint(variant, &name, node)?;
    }
    Ok(())
}
