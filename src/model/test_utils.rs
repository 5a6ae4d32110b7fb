//! Scene fixtures for tests.

use glam::{DMat4, DVec3};

use crate::utils::{bbox::BBox3, constants::DEFAULT_TEXTURE, misc::format_vec3};

use super::{Brush, Entity, Group, NodeId, NodeKind, Scene};

pub const TOLERANCE: f64 = 0.0001;

pub fn approx_eq(a: DVec3, b: DVec3) -> bool {
    a.distance(b) < TOLERANCE
}

pub fn cube_brush(center: DVec3, half_size: f64) -> NodeKind {
    NodeKind::Brush(
        Brush::cuboid(
            &BBox3::from_center(center, DVec3::splat(half_size)),
            DEFAULT_TEXTURE,
        )
        .unwrap(),
    )
}

pub fn point_entity(classname: &str, origin: DVec3) -> NodeKind {
    NodeKind::Entity(Entity::from_properties([
        ("classname", classname.to_string()),
        ("origin", format_vec3(origin)),
    ]))
}

pub fn linked_group(link_id: &str, transformation: DMat4) -> NodeKind {
    NodeKind::Group(
        Group::new("linked")
            .with_linked_group_id(link_id)
            .with_transformation(transformation),
    )
}

/// Linked group with a cube brush and a light, both placed by `transformation`.
///
/// Children are the brush first, then the light.
pub fn add_linked_copy(
    scene: &mut Scene,
    parent: NodeId,
    link_id: &str,
    transformation: DMat4,
) -> NodeId {
    let group = scene
        .add_node(parent, linked_group(link_id, transformation))
        .unwrap();

    let brush = Brush::cuboid(&BBox3::cube(8.), DEFAULT_TEXTURE)
        .unwrap()
        .transformed(&transformation, true)
        .unwrap();
    scene.add_node(group, NodeKind::Brush(brush)).unwrap();

    let light = Entity::from_properties([("classname", "light"), ("origin", "0 0 0")])
        .transformed(&transformation, true);
    scene.add_node(group, NodeKind::Entity(light)).unwrap();

    group
}

/// Scene with one link set of copies placed at the given offsets in the default layer.
pub fn scene_with_link_set(link_id: &str, offsets: &[DVec3]) -> (Scene, Vec<NodeId>) {
    let mut scene = Scene::new();
    let layer = scene.default_layer();

    let groups = offsets
        .iter()
        .map(|offset| {
            add_linked_copy(
                &mut scene,
                layer,
                link_id,
                DMat4::from_translation(*offset),
            )
        })
        .collect();

    (scene, groups)
}
