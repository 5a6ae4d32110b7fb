//! Propagation of changes from one member of a link set to the others.

use glam::DMat4;

use crate::{
    error::LinkedGroupError,
    utils::{bbox::BBox3, misc::try_invert},
};

use super::{
    entity::{is_protected_key, Entity},
    group::Group,
    node::{NodeId, NodeKind, NodeTree},
    queries::find_linked_groups,
    scene::Scene,
};

/// For every target group, the children that should replace its current ones.
pub type UpdateLinkedGroupsResult = Vec<(NodeId, Vec<NodeTree>)>;

/// Clones the children of `source` into every target group.
///
/// The clones are moved by `target.transformation * source.transformation⁻¹`.
/// Entity properties protected on either the clone or the matching entity in
/// the target keep the target's value, or stay absent if the target does not
/// have them. Numbered variants of a protected key are protected too.
///
/// Fails if the source transformation cannot be inverted, if any child cannot be
/// transformed or if a transformed child leaves `world_bounds`. The scene is only
/// read. `source` is skipped if it is listed among the targets.
pub fn update_linked_groups(
    scene: &Scene,
    source: NodeId,
    targets: &[NodeId],
    world_bounds: &BBox3,
) -> Result<UpdateLinkedGroupsResult, LinkedGroupError> {
    let source_group = group(scene, source)?;

    let inverse = try_invert(&source_group.transformation)
        .ok_or(LinkedGroupError::NonInvertibleTransformation(source))?;

    let mut res = vec![];

    for target in targets.iter().copied().filter(|target| *target != source) {
        let transformation = group(scene, target)?.transformation * inverse;

        let mut new_children = scene
            .children(source)
            .iter()
            .map(|child| clone_transformed(scene, *child, &transformation, world_bounds))
            .collect::<Result<Vec<NodeTree>, LinkedGroupError>>()
            .inspect_err(|err| log::warn!("Cannot update linked group {}: {}", target, err))?;

        preserve_entity_properties(scene, &mut new_children, scene.children(target));

        log::debug!(
            "Linked group {} gets {} children from {}",
            target,
            new_children.len(),
            source
        );

        res.push((target, new_children));
    }

    Ok(res)
}

/// Updates the rest of the link set of `source`.
pub fn update_link_set(
    scene: &Scene,
    source: NodeId,
    world_bounds: &BBox3,
) -> Result<UpdateLinkedGroupsResult, LinkedGroupError> {
    let linked_group_id = group(scene, source)?
        .linked_group_id
        .as_deref()
        .ok_or(LinkedGroupError::NotLinked(source))?;

    let targets = find_linked_groups(scene, &[scene.world()], linked_group_id);

    update_linked_groups(scene, source, &targets, world_bounds)
}

fn group(scene: &Scene, id: NodeId) -> Result<&Group, LinkedGroupError> {
    scene
        .node(id)
        .ok_or(LinkedGroupError::NodeNotFound(id))?
        .as_group()
        .ok_or(LinkedGroupError::NotAGroup(id))
}

fn clone_transformed(
    scene: &Scene,
    id: NodeId,
    transformation: &DMat4,
    world_bounds: &BBox3,
) -> Result<NodeTree, LinkedGroupError> {
    let res = clone_transformed_recursive(scene, id, transformation)?;

    let inside = res
        .logical_bounds()
        .map_or(true, |bounds| world_bounds.contains(&bounds));

    if !inside {
        return Err(LinkedGroupError::OutOfWorldBounds { node: id });
    }

    Ok(res)
}

fn clone_transformed_recursive(
    scene: &Scene,
    id: NodeId,
    transformation: &DMat4,
) -> Result<NodeTree, LinkedGroupError> {
    let node = scene.get(id)?;

    let kind = node
        .kind()
        .transformed(transformation, node.has_children(), true)
        .map_err(|source| LinkedGroupError::TransformFailed { node: id, source })?;

    let children = node
        .children()
        .iter()
        .map(|child| clone_transformed_recursive(scene, *child, transformation))
        .collect::<Result<Vec<NodeTree>, LinkedGroupError>>()?;

    Ok(NodeTree::with_children(kind, children))
}

// Clones and existing target children correspond by position.
fn preserve_entity_properties(scene: &Scene, cloned: &mut [NodeTree], existing: &[NodeId]) {
    for (clone, existing) in cloned.iter_mut().zip(existing) {
        match (&mut clone.kind, scene.kind(*existing)) {
            (NodeKind::Entity(cloned_entity), Some(NodeKind::Entity(existing_entity))) => {
                preserve_properties(cloned_entity, existing_entity);
            }
            (NodeKind::Group(_), Some(NodeKind::Group(_))) => {
                preserve_entity_properties(scene, &mut clone.children, scene.children(*existing));
            }
            _ => (),
        }
    }
}

fn preserve_properties(cloned: &mut Entity, existing: &Entity) {
    let protected = cloned
        .protected_properties()
        .iter()
        .chain(existing.protected_properties())
        .cloned()
        .collect::<Vec<String>>();

    if !protected.is_empty() {
        let keys = cloned
            .properties()
            .iter()
            .chain(existing.properties())
            .map(|property| property.key.clone())
            .filter(|key| is_protected_key(&protected, key))
            .collect::<Vec<String>>();

        for key in keys {
            match existing.property(&key) {
                Some(value) => cloned.set_property(key.as_str(), value),
                None => {
                    cloned.remove_property(&key);
                }
            }
        }
    }

    cloned.set_protected_properties(existing.protected_properties().to_vec());
}

#[cfg(test)]
mod test {
    use glam::{DMat4, DVec3};

    use crate::{
        error::TransformError,
        model::{
            test_utils::{add_linked_copy, approx_eq, cube_brush, linked_group, scene_with_link_set},
            Entity,
        },
        utils::constants::DEFAULT_WORLD_BOUND,
    };

    use super::*;

    fn world_bounds() -> BBox3 {
        BBox3::cube(DEFAULT_WORLD_BOUND)
    }

    fn light_of(scene: &Scene, group: NodeId) -> NodeId {
        scene.children(group)[1]
    }

    fn entity_of(tree: &NodeTree) -> &Entity {
        match &tree.kind {
            NodeKind::Entity(entity) => entity,
            _ => panic!("not an entity"),
        }
    }

    #[test]
    fn link_set_of_n_gives_n_minus_one() {
        let (scene, groups) =
            scene_with_link_set("a", &[DVec3::ZERO, DVec3::X * 64., DVec3::X * 128., DVec3::Y * 64.]);

        let res = update_linked_groups(&scene, groups[0], &groups, &world_bounds()).unwrap();

        assert_eq!(res.len(), 3);
        assert_eq!(
            res.iter().map(|(target, _)| *target).collect::<Vec<NodeId>>(),
            groups[1..].to_vec()
        );
        assert!(res.iter().all(|(_, children)| children.len() == 2));

        let link_set = update_link_set(&scene, groups[2], &world_bounds()).unwrap();
        assert_eq!(link_set.len(), 3);
    }

    #[test]
    fn changes_follow_target_transformation() {
        let (mut scene, groups) = scene_with_link_set("a", &[DVec3::ZERO, DVec3::X * 64.]);

        // grow the source brush
        let source_brush = scene.children(groups[0])[0];
        scene.swap_kind(source_brush, cube_brush(DVec3::ZERO, 16.)).unwrap();

        let res = update_linked_groups(&scene, groups[0], &[groups[1]], &world_bounds()).unwrap();
        let (target, children) = &res[0];

        assert_eq!(*target, groups[1]);
        assert_eq!(
            children[0].logical_bounds(),
            Some(BBox3::from_center(DVec3::X * 64., DVec3::splat(16.)))
        );
        assert_eq!(entity_of(&children[1]).property("origin"), Some("64 0 0"));
    }

    #[test]
    fn rotated_copy() {
        let mut scene = Scene::new();
        let layer = scene.default_layer();
        let rotation = DMat4::from_translation(DVec3::new(0., 256., 0.))
            * DMat4::from_rotation_z(std::f64::consts::FRAC_PI_2);

        let source = add_linked_copy(&mut scene, layer, "a", DMat4::IDENTITY);
        let target = add_linked_copy(&mut scene, layer, "a", rotation);

        let light = light_of(&scene, source);
        scene
            .entity_mut(light)
            .unwrap()
            .set_property("origin", "32 0 0");

        let res = update_linked_groups(&scene, source, &[target], &world_bounds()).unwrap();

        assert_eq!(
            entity_of(&res[0].1[1]).property("origin"),
            Some("0 288 0")
        );
    }

    #[test]
    fn protected_property_keeps_target_value() {
        let (mut scene, groups) = scene_with_link_set("a", &[DVec3::ZERO, DVec3::X * 64.]);
        let source_light = light_of(&scene, groups[0]);
        let target_light = light_of(&scene, groups[1]);

        {
            let light = scene.entity_mut(source_light).unwrap();
            light.set_property("target", "door_a");
            light.set_property("target2", "door_b");
            light.set_property("light", "300");
        }
        {
            let light = scene.entity_mut(target_light).unwrap();
            light.set_property("target", "door_c");
            light.set_property("target3", "door_d");
            light.protect_property("target");
        }

        let res = update_linked_groups(&scene, groups[0], &[groups[1]], &world_bounds()).unwrap();
        let light = entity_of(&res[0].1[1]);

        assert_eq!(light.property("target"), Some("door_c"));
        // numbered variants follow the base key
        assert_eq!(light.property("target2"), None);
        assert_eq!(light.property("target3"), Some("door_d"));
        assert_eq!(light.property("light"), Some("300"));
        assert_eq!(light.protected_properties(), &["target".to_string()]);
    }

    #[test]
    fn protected_on_source_side() {
        let (mut scene, groups) = scene_with_link_set("a", &[DVec3::ZERO, DVec3::X * 64.]);
        let source_light = light_of(&scene, groups[0]);
        let target_light = light_of(&scene, groups[1]);

        scene
            .entity_mut(source_light)
            .unwrap()
            .protect_property("_color");
        scene
            .entity_mut(source_light)
            .unwrap()
            .set_property("_color", "255 0 0");
        scene
            .entity_mut(target_light)
            .unwrap()
            .set_property("_color", "0 0 255");

        let res = update_linked_groups(&scene, groups[0], &[groups[1]], &world_bounds()).unwrap();
        let light = entity_of(&res[0].1[1]);

        assert_eq!(light.property("_color"), Some("0 0 255"));
        // the clone takes the protection of the entity it replaces
        assert!(light.protected_properties().is_empty());
    }

    #[test]
    fn protection_inside_nested_groups() {
        let mut scene = Scene::new();
        let layer = scene.default_layer();

        let groups = [DMat4::IDENTITY, DMat4::from_translation(DVec3::X * 256.)]
            .into_iter()
            .map(|transformation| {
                let outer = scene.add_node(layer, linked_group("o", transformation)).unwrap();
                let inner = scene
                    .add_node(outer, NodeKind::Group(Group::new("plain").with_transformation(transformation)))
                    .unwrap();
                scene
                    .add_node(
                        inner,
                        NodeKind::Entity(Entity::from_properties([
                            ("classname", "trigger_relay"),
                            ("targetname", "relay"),
                        ])),
                    )
                    .unwrap();
                (outer, inner)
            })
            .collect::<Vec<(NodeId, NodeId)>>();

        let target_relay = scene.children(groups[1].1)[0];
        let relay = scene.entity_mut(target_relay).unwrap();
        relay.set_property("targetname", "relay_copy");
        relay.protect_property("targetname");

        let res = update_linked_groups(&scene, groups[0].0, &[groups[1].0], &world_bounds()).unwrap();
        let cloned_relay = entity_of(&res[0].1[0].children[0]);

        assert_eq!(cloned_relay.property("targetname"), Some("relay_copy"));
    }

    #[test]
    fn non_invertible_source_fails() {
        let (mut scene, groups) = scene_with_link_set("a", &[DVec3::ZERO, DVec3::X * 64.]);
        scene.group_mut(groups[0]).unwrap().transformation =
            DMat4::from_scale(DVec3::new(1., 1., 0.));

        let before = scene.clone_tree(groups[1]);

        assert_eq!(
            update_linked_groups(&scene, groups[0], &groups, &world_bounds()),
            Err(LinkedGroupError::NonInvertibleTransformation(groups[0]))
        );
        assert_eq!(scene.clone_tree(groups[1]), before);
    }

    #[test]
    fn singular_target_fails_on_brush() {
        let (mut scene, groups) = scene_with_link_set("a", &[DVec3::ZERO, DVec3::X * 64.]);
        scene.group_mut(groups[1]).unwrap().transformation =
            DMat4::from_scale(DVec3::new(1., 0., 1.));

        let brush = scene.children(groups[0])[0];

        assert!(matches!(
            update_linked_groups(&scene, groups[0], &groups, &world_bounds()),
            Err(LinkedGroupError::TransformFailed {
                node,
                source: TransformError::Brush(_)
            }) if node == brush
        ));
    }

    #[test]
    fn out_of_world_bounds_fails() {
        let (scene, groups) = scene_with_link_set("a", &[DVec3::ZERO, DVec3::X * 64.]);
        let small_world = BBox3::cube(32.);

        assert!(matches!(
            update_linked_groups(&scene, groups[0], &groups, &small_world),
            Err(LinkedGroupError::OutOfWorldBounds { .. })
        ));
    }

    #[test]
    fn not_a_group() {
        let (scene, groups) = scene_with_link_set("a", &[DVec3::ZERO]);
        let brush = scene.children(groups[0])[0];

        assert_eq!(
            update_linked_groups(&scene, brush, &groups, &world_bounds()),
            Err(LinkedGroupError::NotAGroup(brush))
        );
        assert_eq!(
            update_link_set(&scene, scene.default_layer(), &world_bounds()),
            Err(LinkedGroupError::NotAGroup(scene.default_layer()))
        );
    }

    #[test]
    fn round_trip_is_identity() {
        let (scene, groups) = scene_with_link_set("a", &[DVec3::ZERO]);
        let brush = scene.children(groups[0])[0];
        let transformation = DMat4::from_translation(DVec3::new(10., -20., 30.))
            * DMat4::from_rotation_y(0.7)
            * DMat4::from_scale(DVec3::new(1., 2., 1.));

        let moved = clone_transformed_recursive(&scene, brush, &transformation).unwrap();
        let NodeKind::Brush(moved) = moved.kind else {
            panic!("not a brush");
        };
        let back = moved.transformed(&transformation.inverse(), true).unwrap();
        let original = scene.brush(brush).unwrap();

        for (a, b) in original.faces().iter().zip(back.faces()) {
            for (p, q) in a.points().iter().zip(b.points()) {
                assert!(approx_eq(*p, *q));
            }
            assert!(approx_eq(a.attributes.u_axis, b.attributes.u_axis));
            assert!((a.attributes.u_scale - b.attributes.u_scale).abs() < 0.0001);
        }
    }
}
