use std::collections::{HashMap, HashSet};

use super::{
    node::NodeId,
    queries::{find_all_linked_groups, find_containing_linked_groups},
    scene::Scene,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BrushFaceHandle {
    pub node: NodeId,
    pub face_index: usize,
}

impl BrushFaceHandle {
    pub fn new(node: NodeId, face_index: usize) -> Self {
        Self { node, face_index }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionResult {
    pub nodes_to_select: Vec<NodeId>,
    /// In the order the groups were first claimed.
    pub groups_to_lock: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FaceSelectionResult {
    pub faces_to_select: Vec<BrushFaceHandle>,
    pub groups_to_lock: Vec<NodeId>,
}

/// Members of every link set, in the order a depth first scan from the world meets them.
#[derive(Debug, Clone, Default)]
pub struct LinkSetIndex {
    link_sets: Vec<(String, Vec<NodeId>)>,
    lookup: HashMap<String, usize>,
}

impl LinkSetIndex {
    pub fn build(scene: &Scene) -> Self {
        let mut res = Self::default();

        for group in find_all_linked_groups(scene, &[scene.world()]) {
            let Some(linked_group_id) = scene
                .group(group)
                .and_then(|group| group.linked_group_id.clone())
            else {
                continue;
            };

            match res.lookup.get(&linked_group_id) {
                Some(index) => res.link_sets[*index].1.push(group),
                None => {
                    res.lookup
                        .insert(linked_group_id.clone(), res.link_sets.len());
                    res.link_sets.push((linked_group_id, vec![group]));
                }
            }
        }

        res
    }

    pub fn members(&self, linked_group_id: &str) -> &[NodeId] {
        self.lookup
            .get(linked_group_id)
            .map(|index| self.link_sets[*index].1.as_slice())
            .unwrap_or_default()
    }

    pub fn link_sets(&self) -> impl Iterator<Item = (&str, &[NodeId])> {
        self.link_sets
            .iter()
            .map(|(id, members)| (id.as_str(), members.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.link_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.link_sets.is_empty()
    }
}

/// Narrows a selection so that at most one member of every link set is edited.
///
/// Earlier nodes win. Accepting a node claims every linked group around it and
/// marks the other members of their link sets for locking. A later node inside
/// one of those is dropped.
pub fn node_selection_with_linked_group_constraints(
    scene: &Scene,
    nodes: &[NodeId],
) -> SelectionResult {
    let index = LinkSetIndex::build(scene);

    let mut groups_to_lock = vec![];
    let mut locked = HashSet::new();
    let mut kept_unlocked = HashSet::new();
    let mut nodes_to_select = vec![];

    for node in nodes {
        let containing_groups = find_containing_linked_groups(scene, *node);

        if containing_groups.iter().any(|group| locked.contains(group)) {
            log::debug!("Not selecting {}: a linked copy is already selected", node);
            continue;
        }

        for group in &containing_groups {
            if kept_unlocked.contains(group) {
                continue;
            }

            let Some(linked_group_id) = scene
                .group(*group)
                .and_then(|group| group.linked_group_id.as_deref())
            else {
                continue;
            };

            for other in index.members(linked_group_id) {
                if other != group && locked.insert(*other) {
                    groups_to_lock.push(*other);
                }
            }

            kept_unlocked.insert(*group);
        }

        nodes_to_select.push(*node);
    }

    SelectionResult {
        nodes_to_select,
        groups_to_lock,
    }
}

/// Face version of [`node_selection_with_linked_group_constraints`]. A face is
/// kept if its brush is.
pub fn face_selection_with_linked_group_constraints(
    scene: &Scene,
    faces: &[BrushFaceHandle],
) -> FaceSelectionResult {
    let nodes = faces.iter().map(|face| face.node).collect::<Vec<NodeId>>();
    let constrained = node_selection_with_linked_group_constraints(scene, &nodes);

    let nodes_to_select = constrained
        .nodes_to_select
        .iter()
        .copied()
        .collect::<HashSet<NodeId>>();

    FaceSelectionResult {
        faces_to_select: faces
            .iter()
            .copied()
            .filter(|face| nodes_to_select.contains(&face.node))
            .collect(),
        groups_to_lock: constrained.groups_to_lock,
    }
}
