use crate::{
    error::SceneError,
    model::{LockState, NodeId, Scene, VisibilityState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityAction {
    Show,
    Hide,
    /// Shows only the nodes that are currently hidden.
    EnsureVisible,
    /// Back to inheriting from the parent.
    Reset,
}

fn check_nodes(scene: &Scene, nodes: &[NodeId]) -> Result<(), SceneError> {
    nodes.iter().try_for_each(|node| scene.get(*node).map(|_| ()))
}

/// Returns the previous state of every node that was touched.
pub fn set_visibility(
    scene: &mut Scene,
    nodes: &[NodeId],
    action: VisibilityAction,
) -> Result<Vec<(NodeId, VisibilityState)>, SceneError> {
    check_nodes(scene, nodes)?;

    let mut res = vec![];

    for node in nodes {
        let state = match action {
            VisibilityAction::Show => VisibilityState::Shown,
            VisibilityAction::Hide => VisibilityState::Hidden,
            VisibilityAction::EnsureVisible if scene.visible(*node) => continue,
            VisibilityAction::EnsureVisible => VisibilityState::Shown,
            VisibilityAction::Reset => VisibilityState::Inherited,
        };

        res.push((*node, scene.set_visibility(*node, state)?));
    }

    res.reverse();

    Ok(res)
}

pub fn restore_visibility(
    scene: &mut Scene,
    previous: &[(NodeId, VisibilityState)],
) -> Result<(), SceneError> {
    let nodes = previous.iter().map(|(node, _)| *node).collect::<Vec<NodeId>>();
    check_nodes(scene, &nodes)?;

    for (node, state) in previous {
        scene.set_visibility(*node, *state)?;
    }

    Ok(())
}

/// Returns the previous state of every node.
pub fn set_lock_state(
    scene: &mut Scene,
    nodes: &[NodeId],
    lock_state: LockState,
) -> Result<Vec<(NodeId, LockState)>, SceneError> {
    check_nodes(scene, nodes)?;

    let mut res = nodes
        .iter()
        .map(|node| Ok((*node, scene.set_lock_state(*node, lock_state)?)))
        .collect::<Result<Vec<(NodeId, LockState)>, SceneError>>()?;

    res.reverse();

    Ok(res)
}

pub fn restore_lock_state(
    scene: &mut Scene,
    previous: &[(NodeId, LockState)],
) -> Result<(), SceneError> {
    let nodes = previous.iter().map(|(node, _)| *node).collect::<Vec<NodeId>>();
    check_nodes(scene, &nodes)?;

    for (node, state) in previous {
        scene.set_lock_state(*node, *state)?;
    }

    Ok(())
}
