use crate::{
    error::SceneError,
    model::{
        face_selection_with_linked_group_constraints, node_selection_with_linked_group_constraints,
        BrushFaceHandle, FaceSelectionResult, LockState, NodeId, Scene, SelectionResult,
    },
};

use super::visibility::{restore_lock_state, set_lock_state};

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedSelection {
    pub result: SelectionResult,
    /// Feed to [`super::restore_lock_state`] to unlock the other copies again.
    pub previous_lock_states: Vec<(NodeId, LockState)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedFaceSelection {
    pub result: FaceSelectionResult,
    pub previous_lock_states: Vec<(NodeId, LockState)>,
}

/// Replaces the selection with the constrained version of `nodes` and locks
/// the linked copies that must not be edited alongside it.
///
/// Locks taken by an earlier selection stay in place. Use
/// [`reselect_with_linked_group_constraints`] to replace an applied selection.
pub fn select_with_linked_group_constraints(
    scene: &mut Scene,
    nodes: &[NodeId],
) -> Result<AppliedSelection, SceneError> {
    for node in nodes {
        scene.get(*node)?;
    }

    let result = node_selection_with_linked_group_constraints(scene, nodes);
    let previous_lock_states = set_lock_state(scene, &result.groups_to_lock, LockState::Locked)?;

    scene.deselect_all();

    for node in &result.nodes_to_select {
        scene.select(*node)?;
    }

    log::debug!(
        "Selected {} of {} nodes, locked {} linked groups",
        result.nodes_to_select.len(),
        nodes.len(),
        result.groups_to_lock.len()
    );

    Ok(AppliedSelection {
        result,
        previous_lock_states,
    })
}

/// Releases the locks taken by `previous`, then applies a new constrained
/// selection. The returned lock states lead back to the state before
/// `previous` was applied.
pub fn reselect_with_linked_group_constraints(
    scene: &mut Scene,
    previous: &AppliedSelection,
    nodes: &[NodeId],
) -> Result<AppliedSelection, SceneError> {
    for node in nodes {
        scene.get(*node)?;
    }

    restore_lock_state(scene, &previous.previous_lock_states)?;

    select_with_linked_group_constraints(scene, nodes)
}

pub fn select_faces_with_linked_group_constraints(
    scene: &mut Scene,
    faces: &[BrushFaceHandle],
) -> Result<AppliedFaceSelection, SceneError> {
    for face in faces {
        let valid = scene
            .brush(face.node)
            .is_some_and(|brush| face.face_index < brush.face_count());

        if !valid {
            return Err(SceneError::FaceNotFound {
                node: face.node,
                face_index: face.face_index,
            });
        }
    }

    let result = face_selection_with_linked_group_constraints(scene, faces);
    let previous_lock_states = set_lock_state(scene, &result.groups_to_lock, LockState::Locked)?;

    scene.deselect_all();

    for face in &result.faces_to_select {
        scene.select_brush_face(face.node, face.face_index)?;
    }

    Ok(AppliedFaceSelection {
        result,
        previous_lock_states,
    })
}
