//! Host editor session.
//!
//! Owns the scene, resolves the selected root joint, and wraps each
//! user-invoked operation in an undo chunk: the scene is snapshotted before
//! the operation and restored if it fails.

use rigforge_scene::{load_skeleton, KindFilter, NodeId, Scene, SceneError, SceneGraph};
use rigforge_spec::SkeletonDef;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised by the session itself, outside the rig compiler.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No root joint could be selected.
    #[error("No root joint selected{}", detail(.0))]
    MissingSelection(Option<String>),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

fn detail(name: &Option<String>) -> String {
    match name {
        Some(name) => format!(": '{}' is not a joint in the scene", name),
        None => String::new(),
    }
}

/// An editor session over one scene.
#[derive(Debug, Default)]
pub struct EditorSession {
    scene: Scene,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Instantiates a skeleton definition into the scene and returns its root.
    pub fn load(&mut self, def: &SkeletonDef) -> Result<NodeId, SessionError> {
        if def.joints.is_empty() {
            return Err(SessionError::MissingSelection(None));
        }
        Ok(load_skeleton(&mut self.scene, def)?)
    }

    /// Resolves the selection: the named joint, or `default` when no name is given.
    pub fn select(&self, name: Option<&str>, default: NodeId) -> Result<NodeId, SessionError> {
        let Some(name) = name else {
            return Ok(default);
        };
        self.scene
            .find_by_name(name)
            .filter(|node| matches!(self.scene.kind(*node), Ok(kind) if kind.matches(KindFilter::Joint)))
            .ok_or_else(|| SessionError::MissingSelection(Some(name.to_string())))
    }

    /// Runs `op` as one undoable operation.
    ///
    /// On error the scene is restored to its state before `op` ran.
    pub fn undo_chunk<T, E>(
        &mut self,
        name: &str,
        op: impl FnOnce(&mut Scene) -> Result<T, E>,
    ) -> Result<T, E> {
        let snapshot = self.scene.clone();
        debug!(chunk = name, nodes = snapshot.len(), "opened undo chunk");
        match op(&mut self.scene) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(chunk = name, "operation failed, restoring scene");
                self.scene = snapshot;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rigforge_spec::SkeletonPreset;

    #[test]
    fn test_undo_chunk_restores_on_failure() {
        let mut session = EditorSession::new();
        let root = session.load(&SkeletonPreset::MannequinLite.build()).unwrap();
        let before = session.scene().clone();

        let result: Result<(), SceneError> = session.undo_chunk("reparent", |scene| {
            scene.create_transform("scratch", None)?;
            let spine = scene.find_child(Some(root), "spine_01").unwrap();
            scene.set_parent(root, Some(spine))
        });

        assert!(result.is_err());
        assert_eq!(session.scene(), &before);
    }

    #[test]
    fn test_undo_chunk_keeps_success() {
        let mut session = EditorSession::new();
        let created = session
            .undo_chunk("group", |scene| scene.create_transform("grp", None))
            .unwrap();
        assert_eq!(session.scene().name(created).unwrap(), "grp");
    }

    #[test]
    fn test_selection() {
        let mut session = EditorSession::new();
        let root = session.load(&SkeletonPreset::MannequinLite.build()).unwrap();

        assert_eq!(session.select(None, root).unwrap(), root);
        let spine = session.select(Some("spine_01"), root).unwrap();
        assert_eq!(session.scene().name(spine).unwrap(), "spine_01");

        let err = session.select(Some("weapon_r"), root).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No root joint selected: 'weapon_r' is not a joint in the scene"
        );
    }

    #[test]
    fn test_empty_skeleton_is_missing_selection() {
        let mut session = EditorSession::new();
        let err = session.load(&SkeletonDef::new()).unwrap_err();
        assert!(matches!(err, SessionError::MissingSelection(None)));
        assert_eq!(err.to_string(), "No root joint selected");
    }
}
