use std::collections::{HashMap, HashSet};

use crate::{
    error::{LinkedGroupError, SceneError},
    model::{
        queries::find_containing_linked_groups, update_link_set, NodeId, Scene,
        UpdateLinkedGroupsResult,
    },
    utils::bbox::BBox3,
};

/// Replaces the children of every target group in one step.
///
/// Returns the replaced children, which undo the update when applied in turn.
/// Nothing changes if a target is missing or not a group, if a new child cannot
/// go under its target or if one target lies inside another.
pub fn apply_linked_group_update(
    scene: &mut Scene,
    changes: UpdateLinkedGroupsResult,
) -> Result<UpdateLinkedGroupsResult, SceneError> {
    let mut targets = HashSet::new();

    for (target, children) in &changes {
        if scene.get(*target)?.as_group().is_none() {
            return Err(SceneError::NotAGroup(*target));
        }

        if !targets.insert(*target) {
            return Err(SceneError::OverlappingChanges(*target));
        }

        for child in children {
            scene.check_tree(*target, child)?;
        }
    }

    for (target, _) in &changes {
        if scene.ancestors(*target).any(|ancestor| targets.contains(&ancestor)) {
            return Err(SceneError::OverlappingChanges(*target));
        }
    }

    let mut res = Vec::with_capacity(changes.len());

    for (target, children) in changes {
        res.push((target, scene.replace_children(target, children)?));
    }

    Ok(res)
}

/// Copies the children of `source` over the rest of its link set.
///
/// The scene is left untouched on failure.
pub fn propagate_link_set(
    scene: &mut Scene,
    source: NodeId,
    world_bounds: &BBox3,
) -> Result<UpdateLinkedGroupsResult, LinkedGroupError> {
    let changes = update_link_set(scene, source, world_bounds)?;

    Ok(apply_linked_group_update(scene, changes)?)
}

/// Propagates every linked group containing one of `changed_nodes`.
///
/// Inner groups go first so that copies nested in an outer group are already
/// up to date when the outer group is copied. Fails with
/// [`LinkedGroupError::ConflictingSources`] if two members of one link set
/// contain changes. Returns the propagated groups in the order they were
/// processed. On failure the scene is restored.
pub fn propagate_changes(
    scene: &mut Scene,
    changed_nodes: &[NodeId],
    world_bounds: &BBox3,
) -> Result<Vec<NodeId>, LinkedGroupError> {
    let mut sources = vec![];
    let mut source_by_link_set: HashMap<String, NodeId> = HashMap::new();

    for node in changed_nodes {
        if !scene.contains(*node) {
            return Err(LinkedGroupError::NodeNotFound(*node));
        }

        for group in find_containing_linked_groups(scene, *node) {
            let Some(linked_group_id) = scene
                .group(group)
                .and_then(|group| group.linked_group_id.clone())
            else {
                continue;
            };

            match source_by_link_set.get(&linked_group_id) {
                Some(existing) if *existing == group => (),
                Some(_) => return Err(LinkedGroupError::ConflictingSources(linked_group_id)),
                None => {
                    source_by_link_set.insert(linked_group_id, group);
                    sources.push(group);
                }
            }
        }
    }

    // stable, so equally deep groups keep the order they were found in
    sources.sort_by_key(|group| std::cmp::Reverse(scene.depth(*group)));

    let backup = scene.clone();

    for source in &sources {
        if let Err(err) = propagate_link_set(scene, *source, world_bounds) {
            log::warn!("Restoring scene after failed propagation from {}", source);
            *scene = backup;
            return Err(err);
        }
    }

    Ok(sources)
}
