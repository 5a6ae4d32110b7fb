//! Read only helpers over the scene graph.
//!
//! Every function walks the tree from the given nodes on each call. Nothing is cached.

use std::collections::BTreeMap;

use crate::utils::bbox::{BBox3, BBox3Builder};

use super::{
    brush::Brush,
    editor_context::EditorContext,
    node::{Node, NodeId, NodeKind, NodeTree},
    scene::{Scene, Walk},
    selection::BrushFaceHandle,
};

/// The node itself if it is a layer, otherwise the closest layer above it.
pub fn find_containing_layer(scene: &Scene, id: NodeId) -> Option<NodeId> {
    std::iter::once(id)
        .chain(scene.ancestors(id))
        .find(|current| scene.layer(*current).is_some())
}

/// Containing layers without duplicates, default layer first, then by sort index.
pub fn find_containing_layers_user_sorted(scene: &Scene, nodes: &[NodeId]) -> Vec<NodeId> {
    let mut layers = nodes
        .iter()
        .filter_map(|node| find_containing_layer(scene, *node))
        .collect::<Vec<NodeId>>();

    layers.sort_by_key(|layer| {
        let is_default = *layer == scene.default_layer();
        let sort_index = scene.layer(*layer).and_then(|layer| layer.sort_index);

        (!is_default, sort_index, *layer)
    });
    layers.dedup();

    layers
}

/// Closest group above the node. Stops at layers.
pub fn find_containing_group(scene: &Scene, id: NodeId) -> Option<NodeId> {
    for ancestor in scene.ancestors(id) {
        match scene.kind(ancestor)? {
            NodeKind::Group(_) => return Some(ancestor),
            NodeKind::World(_) | NodeKind::Layer(_) => return None,
            NodeKind::Entity(_) | NodeKind::Brush(_) | NodeKind::Patch(_) => (),
        }
    }

    None
}

pub fn find_containing_linked_group(scene: &Scene, id: NodeId) -> Option<NodeId> {
    let mut current = find_containing_group(scene, id);

    while let Some(group) = current {
        if scene.group(group).is_some_and(|group| group.is_linked()) {
            return Some(group);
        }

        current = find_containing_group(scene, group);
    }

    None
}

/// Every linked group above the node, innermost first.
pub fn find_containing_linked_groups(scene: &Scene, id: NodeId) -> Vec<NodeId> {
    std::iter::successors(find_containing_linked_group(scene, id), |group| {
        find_containing_linked_group(scene, *group)
    })
    .collect()
}

pub fn find_outermost_closed_group(scene: &Scene, id: NodeId) -> Option<NodeId> {
    let mut res = None;

    for ancestor in scene.ancestors(id) {
        match scene.kind(ancestor) {
            Some(NodeKind::Group(group)) if group.closed() => res = Some(ancestor),
            Some(NodeKind::Group(_)) | Some(NodeKind::Entity(_)) => (),
            _ => break,
        }
    }

    res
}

/// Groups with the given link id. Does not look inside a matching group.
pub fn find_linked_groups(scene: &Scene, nodes: &[NodeId], linked_group_id: &str) -> Vec<NodeId> {
    let mut res = vec![];

    scene.walk(nodes, |node| match node.kind() {
        NodeKind::World(_) | NodeKind::Layer(_) => Walk::Continue,
        NodeKind::Group(group) => {
            if group.linked_group_id.as_deref() == Some(linked_group_id) {
                res.push(node.id());
                Walk::SkipChildren
            } else {
                Walk::Continue
            }
        }
        NodeKind::Entity(_) | NodeKind::Brush(_) | NodeKind::Patch(_) => Walk::SkipChildren,
    });

    res
}

pub fn find_all_linked_groups(scene: &Scene, nodes: &[NodeId]) -> Vec<NodeId> {
    let mut res = vec![];

    scene.walk(nodes, |node| match node.kind() {
        NodeKind::World(_) | NodeKind::Layer(_) => Walk::Continue,
        NodeKind::Group(group) => {
            if group.is_linked() {
                res.push(node.id());
            }
            Walk::Continue
        }
        NodeKind::Entity(_) | NodeKind::Brush(_) | NodeKind::Patch(_) => Walk::SkipChildren,
    });

    res
}

/// Link ids of the node itself and every group above it, innermost first.
pub fn collect_parent_linked_group_ids(scene: &Scene, id: NodeId) -> Vec<String> {
    std::iter::once(id)
        .chain(scene.ancestors(id))
        .filter_map(|current| scene.group(current))
        .filter_map(|group| group.linked_group_id.clone())
        .collect()
}

fn collect_with_parents(scene: &Scene, id: NodeId, res: &mut Vec<NodeId>) {
    if scene.contains(id) {
        res.push(id);
        res.extend(scene.ancestors(id));
    }
}

/// Every ancestor of the given nodes, sorted and without duplicates.
pub fn collect_parents(scene: &Scene, nodes: &[NodeId]) -> Vec<NodeId> {
    let mut res = vec![];

    for parent in nodes.iter().filter_map(|node| scene.parent(*node)) {
        collect_with_parents(scene, parent, &mut res);
    }

    res.sort();
    res.dedup();
    res
}

/// The parents of a change set and everything above them.
pub fn collect_parents_of_changes(scene: &Scene, changes: &[(NodeId, Vec<NodeTree>)]) -> Vec<NodeId> {
    let mut res = vec![];

    for (parent, _) in changes {
        collect_with_parents(scene, *parent, &mut res);
    }

    res.sort();
    res.dedup();
    res
}

pub fn collect_children_of_changes(changes: &[(NodeId, Vec<NodeTree>)]) -> Vec<&NodeTree> {
    changes
        .iter()
        .flat_map(|(_, children)| children.iter())
        .collect()
}

pub fn collect_children_of_map(map: &BTreeMap<NodeId, Vec<NodeId>>) -> Vec<NodeId> {
    map.values().flatten().copied().collect()
}

/// Groups nodes under their parents. Nodes without a parent are skipped.
pub fn parent_children_map(scene: &Scene, nodes: &[NodeId]) -> BTreeMap<NodeId, Vec<NodeId>> {
    let mut res: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();

    for node in nodes {
        match scene.parent(*node) {
            Some(parent) => res.entry(parent).or_default().push(*node),
            None => log::warn!("Node {} has no parent", node),
        }
    }

    res
}

/// The given nodes and all their descendants, parents first.
pub fn collect_nodes(scene: &Scene, nodes: &[NodeId]) -> Vec<NodeId> {
    collect_nodes_matching(scene, nodes, |_| true)
}

pub fn collect_nodes_matching<P>(scene: &Scene, nodes: &[NodeId], mut predicate: P) -> Vec<NodeId>
where
    P: FnMut(&Node) -> bool,
{
    let mut res = vec![];

    scene.walk(nodes, |node| {
        if predicate(node) {
            res.push(node.id());
        }

        Walk::Continue
    });

    res
}

/// Descendants of the given nodes, the nodes themselves excluded.
pub fn collect_descendants(scene: &Scene, nodes: &[NodeId]) -> Vec<NodeId> {
    nodes
        .iter()
        .flat_map(|node| collect_nodes(scene, scene.children(*node)))
        .collect()
}

// Closed groups and point entities are tested as a whole. A query brush never
// matches itself.
fn collect_matching_nodes<P>(
    scene: &Scene,
    nodes: &[NodeId],
    brushes: &[NodeId],
    predicate: P,
) -> Vec<NodeId>
where
    P: Fn(&Brush, &Scene, NodeId) -> bool,
{
    let query = brushes
        .iter()
        .filter_map(|id| scene.brush(*id))
        .collect::<Vec<&Brush>>();

    let mut res = vec![];
    let mut collect_if_matching = |id: NodeId| {
        if query.iter().any(|brush| predicate(brush, scene, id)) {
            res.push(id);
        }
    };

    scene.walk(nodes, |node| match node.kind() {
        NodeKind::World(_) | NodeKind::Layer(_) => Walk::Continue,
        NodeKind::Group(group) => {
            if group.opened() || scene.has_opened_descendant(node.id()) {
                Walk::Continue
            } else {
                collect_if_matching(node.id());
                Walk::SkipChildren
            }
        }
        NodeKind::Entity(_) => {
            if node.has_children() {
                Walk::Continue
            } else {
                collect_if_matching(node.id());
                Walk::SkipChildren
            }
        }
        NodeKind::Brush(_) => {
            if !brushes.contains(&node.id()) {
                collect_if_matching(node.id());
            }
            Walk::SkipChildren
        }
        NodeKind::Patch(_) => {
            collect_if_matching(node.id());
            Walk::SkipChildren
        }
    });

    res
}

fn brush_intersects_node(brush: &Brush, scene: &Scene, id: NodeId) -> bool {
    match scene.kind(id) {
        Some(NodeKind::Brush(other)) => brush.intersects_brush(other),
        Some(_) => scene
            .logical_bounds(id)
            .is_some_and(|bounds| brush.intersects_bounds(&bounds)),
        None => false,
    }
}

fn brush_contains_node(brush: &Brush, scene: &Scene, id: NodeId) -> bool {
    match scene.kind(id) {
        Some(NodeKind::Brush(other)) => brush.contains_brush(other),
        Some(_) => scene
            .logical_bounds(id)
            .is_some_and(|bounds| brush.contains_bounds(&bounds)),
        None => false,
    }
}

pub fn collect_touching_nodes(scene: &Scene, nodes: &[NodeId], brushes: &[NodeId]) -> Vec<NodeId> {
    collect_matching_nodes(scene, nodes, brushes, brush_intersects_node)
}

pub fn collect_contained_nodes(scene: &Scene, nodes: &[NodeId], brushes: &[NodeId]) -> Vec<NodeId> {
    collect_matching_nodes(scene, nodes, brushes, brush_contains_node)
}

pub fn collect_selected_nodes(scene: &Scene, nodes: &[NodeId]) -> Vec<NodeId> {
    collect_nodes_matching(scene, nodes, |node| match node.kind() {
        NodeKind::World(_) | NodeKind::Layer(_) => false,
        _ => node.selected(),
    })
}

pub fn collect_selectable_nodes(
    scene: &Scene,
    nodes: &[NodeId],
    editor_context: &EditorContext,
) -> Vec<NodeId> {
    let mut res = vec![];

    scene.walk(nodes, |node| {
        let selectable = editor_context.selectable(scene, node.id());

        match node.kind() {
            NodeKind::World(_) | NodeKind::Layer(_) => Walk::Continue,
            // a selectable group is closed, so its children are not
            NodeKind::Group(_) if selectable => {
                res.push(node.id());
                Walk::SkipChildren
            }
            NodeKind::Group(_) => Walk::Continue,
            NodeKind::Entity(_) | NodeKind::Brush(_) | NodeKind::Patch(_) => {
                if selectable {
                    res.push(node.id());
                }
                Walk::Continue
            }
        }
    });

    res
}

fn collect_brush_faces_matching<P>(scene: &Scene, nodes: &[NodeId], mut predicate: P) -> Vec<BrushFaceHandle>
where
    P: FnMut(NodeId, usize, &Brush) -> bool,
{
    let mut res = vec![];

    scene.walk(nodes, |node| {
        if let NodeKind::Brush(brush) = node.kind() {
            for face_index in 0..brush.face_count() {
                if predicate(node.id(), face_index, brush) {
                    res.push(BrushFaceHandle::new(node.id(), face_index));
                }
            }
        }

        Walk::Continue
    });

    res
}

pub fn collect_brush_faces(scene: &Scene, nodes: &[NodeId]) -> Vec<BrushFaceHandle> {
    collect_brush_faces_matching(scene, nodes, |_, _, _| true)
}

pub fn collect_selected_brush_faces(scene: &Scene, nodes: &[NodeId]) -> Vec<BrushFaceHandle> {
    collect_brush_faces_matching(scene, nodes, |_, face_index, brush| {
        brush.face(face_index).is_some_and(|face| face.selected())
    })
}

pub fn collect_selectable_brush_faces(
    scene: &Scene,
    nodes: &[NodeId],
    editor_context: &EditorContext,
) -> Vec<BrushFaceHandle> {
    collect_brush_faces_matching(scene, nodes, |id, face_index, _| {
        editor_context.selectable_face(scene, id, face_index)
    })
}

fn compute_bounds<F>(scene: &Scene, nodes: &[NodeId], default_bounds: BBox3, bounds: F) -> BBox3
where
    F: Fn(NodeId) -> Option<BBox3>,
{
    let mut builder = BBox3Builder::new();

    for node in nodes {
        match scene.kind(*node) {
            None | Some(NodeKind::World(_)) | Some(NodeKind::Layer(_)) => (),
            Some(_) => {
                if let Some(bounds) = bounds(*node) {
                    builder.add(bounds);
                }
            }
        }
    }

    builder.bounds().unwrap_or(default_bounds)
}

/// Merged bounds of the given nodes, not their descendants. Worlds and layers
/// are ignored. `default_bounds` if nothing contributed.
pub fn compute_logical_bounds(scene: &Scene, nodes: &[NodeId], default_bounds: BBox3) -> BBox3 {
    compute_bounds(scene, nodes, default_bounds, |node| {
        scene.logical_bounds(node)
    })
}

pub fn compute_physical_bounds(scene: &Scene, nodes: &[NodeId], default_bounds: BBox3) -> BBox3 {
    compute_bounds(scene, nodes, default_bounds, |node| {
        scene.physical_bounds(node)
    })
}

pub fn filter_brush_nodes(scene: &Scene, nodes: &[NodeId]) -> Vec<NodeId> {
    nodes
        .iter()
        .copied()
        .filter(|node| scene.brush(*node).is_some())
        .collect()
}

pub fn filter_entity_nodes(scene: &Scene, nodes: &[NodeId]) -> Vec<NodeId> {
    nodes
        .iter()
        .copied()
        .filter(|node| scene.entity(*node).is_some())
        .collect()
}

#[cfg(test)]
mod test {
    use glam::{DMat4, DVec3};

    use crate::model::{
        test_utils::{add_linked_copy, cube_brush, point_entity},
        Entity, Group, Layer,
    };

    use super::*;

    // world
    //   default layer
    //     outer (closed)
    //       inner (linked "a")
    //         brush
    //     light
    //   second layer (sort 1)
    //     brush
    struct Fixture {
        scene: Scene,
        outer: NodeId,
        inner: NodeId,
        inner_brush: NodeId,
        light: NodeId,
        second_layer: NodeId,
        second_brush: NodeId,
    }

    fn fixture() -> Fixture {
        let mut scene = Scene::new();
        let layer = scene.default_layer();

        let outer = scene
            .add_node(layer, NodeKind::Group(Group::new("outer")))
            .unwrap();
        let inner = scene
            .add_node(
                outer,
                NodeKind::Group(Group::new("inner").with_linked_group_id("a")),
            )
            .unwrap();
        let inner_brush = scene.add_node(inner, cube_brush(DVec3::ZERO, 8.)).unwrap();
        let light = scene
            .add_node(layer, point_entity("light", DVec3::new(0., 0., 64.)))
            .unwrap();

        let second_layer = scene
            .add_node(
                scene.world(),
                NodeKind::Layer(Layer::new("second").with_sort_index(1)),
            )
            .unwrap();
        let second_brush = scene
            .add_node(second_layer, cube_brush(DVec3::X * 64., 8.))
            .unwrap();

        Fixture {
            scene,
            outer,
            inner,
            inner_brush,
            light,
            second_layer,
            second_brush,
        }
    }

    #[test]
    fn containing_nodes() {
        let f = fixture();
        let scene = &f.scene;

        assert_eq!(find_containing_layer(scene, f.inner_brush), Some(scene.default_layer()));
        assert_eq!(find_containing_layer(scene, f.second_layer), Some(f.second_layer));
        assert_eq!(find_containing_layer(scene, scene.world()), None);

        assert_eq!(find_containing_group(scene, f.inner_brush), Some(f.inner));
        assert_eq!(find_containing_group(scene, f.inner), Some(f.outer));
        assert_eq!(find_containing_group(scene, f.outer), None);

        assert_eq!(find_containing_linked_group(scene, f.inner_brush), Some(f.inner));
        assert_eq!(find_containing_linked_group(scene, f.inner), None);

        assert_eq!(find_outermost_closed_group(scene, f.inner_brush), Some(f.outer));
        assert_eq!(find_outermost_closed_group(scene, f.light), None);
    }

    #[test]
    fn outermost_closed_group_skips_open_groups() {
        let mut f = fixture();
        f.scene.group_mut(f.outer).unwrap().open();

        assert_eq!(find_outermost_closed_group(&f.scene, f.inner_brush), Some(f.inner));
    }

    #[test]
    fn outermost_closed_group_through_brush_entity() {
        let mut scene = Scene::new();
        let layer = scene.default_layer();

        let group = scene
            .add_node(layer, NodeKind::Group(Group::new("door")))
            .unwrap();
        let door = scene
            .add_node(
                group,
                NodeKind::Entity(Entity::from_properties([("classname", "func_door")])),
            )
            .unwrap();
        let brush = scene.add_node(door, cube_brush(DVec3::ZERO, 8.)).unwrap();

        assert_eq!(find_outermost_closed_group(&scene, brush), Some(group));
        assert_eq!(find_outermost_closed_group(&scene, door), Some(group));
    }

    #[test]
    fn layers_user_sorted() {
        let f = fixture();
        let scene = &f.scene;

        assert_eq!(
            find_containing_layers_user_sorted(scene, &[f.second_brush, f.light, f.inner_brush]),
            vec![scene.default_layer(), f.second_layer]
        );
    }

    #[test]
    fn linked_groups() {
        let mut f = fixture();
        let layer = f.scene.default_layer();
        let copy = add_linked_copy(&mut f.scene, layer, "a", DMat4::from_translation(DVec3::Y * 64.));
        let world = f.scene.world();

        assert_eq!(find_linked_groups(&f.scene, &[world], "a"), vec![f.inner, copy]);
        assert_eq!(find_linked_groups(&f.scene, &[world], "b"), vec![]);
        assert_eq!(find_all_linked_groups(&f.scene, &[world]), vec![f.inner, copy]);
        assert_eq!(
            collect_parent_linked_group_ids(&f.scene, f.inner_brush),
            vec!["a".to_string()]
        );
    }

    #[test]
    fn parents_and_descendants() {
        let f = fixture();
        let scene = &f.scene;
        let layer = scene.default_layer();

        let mut expected = vec![scene.world(), layer, f.outer, f.inner];
        expected.sort();

        assert_eq!(collect_parents(scene, &[f.inner_brush, f.light]), expected);
        assert_eq!(collect_descendants(scene, &[f.outer]), vec![f.inner, f.inner_brush]);
        assert_eq!(collect_nodes(scene, &[f.outer]), vec![f.outer, f.inner, f.inner_brush]);

        let map = parent_children_map(scene, &[f.inner_brush, f.light, f.outer]);

        assert_eq!(map.get(&layer), Some(&vec![f.light, f.outer]));
        assert_eq!(collect_children_of_map(&map).len(), 3);
    }

    #[test]
    fn parents_of_changes() {
        let f = fixture();
        let scene = &f.scene;
        let changes = vec![(f.inner, vec![NodeTree::new(cube_brush(DVec3::ZERO, 4.))])];

        let mut expected = vec![scene.world(), scene.default_layer(), f.outer, f.inner];
        expected.sort();

        assert_eq!(collect_parents_of_changes(scene, &changes), expected);
        assert_eq!(collect_children_of_changes(&changes).len(), 1);
    }

    #[test]
    fn touching_and_contained() {
        let mut scene = Scene::new();
        let layer = scene.default_layer();

        let query = scene.add_node(layer, cube_brush(DVec3::ZERO, 32.)).unwrap();
        let inside = scene.add_node(layer, cube_brush(DVec3::ZERO, 8.)).unwrap();
        let touching = scene.add_node(layer, cube_brush(DVec3::X * 40., 8.)).unwrap();
        let far = scene.add_node(layer, cube_brush(DVec3::X * 100., 8.)).unwrap();
        let light = scene.add_node(layer, point_entity("light", DVec3::new(0., 0., 16.))).unwrap();

        let world = scene.world();

        assert_eq!(
            collect_touching_nodes(&scene, &[world], &[query]),
            vec![inside, touching, light]
        );
        assert_eq!(
            collect_contained_nodes(&scene, &[world], &[query]),
            vec![inside, light]
        );
        assert!(!collect_touching_nodes(&scene, &[world], &[query]).contains(&far));
    }

    #[test]
    fn closed_groups_are_tested_as_a_whole() {
        let f = fixture();
        let mut scene = f.scene;
        let layer = scene.default_layer();
        let query = scene.add_node(layer, cube_brush(DVec3::ZERO, 2.)).unwrap();

        let touching = collect_touching_nodes(&scene, &[scene.world()], &[query]);

        assert!(touching.contains(&f.outer));
        assert!(!touching.contains(&f.inner_brush));
    }

    #[test]
    fn selected_and_selectable() {
        let mut f = fixture();
        f.scene.select(f.light).unwrap();
        f.scene.select_brush_face(f.second_brush, 2).unwrap();

        let world = f.scene.world();
        let context = EditorContext::default();

        assert_eq!(collect_selected_nodes(&f.scene, &[world]), vec![f.light]);
        assert_eq!(
            collect_selectable_nodes(&f.scene, &[world], &context),
            vec![f.outer, f.light, f.second_brush]
        );
        assert_eq!(
            collect_selected_brush_faces(&f.scene, &[world]),
            vec![BrushFaceHandle::new(f.second_brush, 2)]
        );
        assert_eq!(collect_brush_faces(&f.scene, &[world]).len(), 12);
        assert_eq!(
            collect_selectable_brush_faces(&f.scene, &[world], &context).len(),
            6
        );
    }

    #[test]
    fn bounds_and_filters() {
        let f = fixture();
        let scene = &f.scene;
        let default_bounds = BBox3::cube(1.);

        assert_eq!(compute_logical_bounds(scene, &[], default_bounds), default_bounds);
        assert_eq!(
            compute_logical_bounds(scene, &[scene.default_layer()], default_bounds),
            default_bounds
        );
        assert_eq!(
            compute_logical_bounds(scene, &[f.inner_brush, f.second_brush], default_bounds),
            BBox3::new(DVec3::splat(-8.), DVec3::new(72., 8., 8.))
        );
        assert_eq!(
            compute_physical_bounds(scene, &[f.outer], default_bounds),
            BBox3::cube(8.)
        );

        let nodes = [f.outer, f.inner_brush, f.light, f.second_brush];

        assert_eq!(filter_brush_nodes(scene, &nodes), vec![f.inner_brush, f.second_brush]);
        assert_eq!(filter_entity_nodes(scene, &nodes), vec![f.light]);
    }
}
