//! Conversion between parsed `.map` files and the scene graph.
//!
//! Layers and groups are `func_group` entities tagged with `_tb_type`. Everything
//! else points at its container with `_tb_group` or `_tb_layer`, using the
//! container's `_tb_id`. Objects without either key belong to the default layer.

use std::collections::{HashMap, HashSet};

use glam::DVec3;
use map::{BrushPlane, Map, PatchPoint, Primitive};

use crate::{
    error::{BrushError, ConvertError},
    model::{
        Brush, BrushFace, Entity, FaceAttributes, Group, Layer, LockState, NodeId, NodeKind,
        Patch, Scene, VisibilityState, Walk,
    },
};

use super::{
    constants::{
        CLASSNAME_KEY, DEFAULT_TB_HEADER, GROUP_CLASSNAME, TB_GROUP_KEY, TB_GROUP_TYPE,
        TB_ID_KEY, TB_LAYER_HIDDEN_KEY, TB_LAYER_KEY, TB_LAYER_LOCKED_KEY,
        TB_LAYER_SORT_INDEX_KEY, TB_LAYER_TYPE, TB_LINKED_GROUP_ID_KEY, TB_NAME_KEY,
        TB_PROTECTED_PROPERTIES_KEY, TB_RESERVED_KEYS, TB_TRANSFORMATION_KEY, TB_TYPE_KEY,
    },
    misc::{format_matrix, is_identity, parse_matrix, round_number},
};

enum EntityRole {
    Layer,
    Group,
    Object,
}

fn entity_role(entity: &map::Entity) -> EntityRole {
    if entity.classname() != Some(GROUP_CLASSNAME) {
        return EntityRole::Object;
    }

    match entity.attributes.get(TB_TYPE_KEY) {
        Some(TB_LAYER_TYPE) => EntityRole::Layer,
        Some(TB_GROUP_TYPE) => EntityRole::Group,
        _ => EntityRole::Object,
    }
}

#[derive(Default)]
struct Containers {
    layers: HashMap<String, NodeId>,
    groups: HashMap<String, NodeId>,
}

enum Parent {
    Found(NodeId),
    /// Refers to a group that is not in the scene yet.
    Pending(String),
    Unknown(String),
}

impl Containers {
    fn parent(&self, scene: &Scene, entity: &map::Entity) -> Parent {
        if let Some(group) = entity.attributes.get(TB_GROUP_KEY) {
            return match self.groups.get(group) {
                Some(id) => Parent::Found(*id),
                None => Parent::Pending(group.to_string()),
            };
        }

        if let Some(layer) = entity.attributes.get(TB_LAYER_KEY) {
            return match self.layers.get(layer) {
                Some(id) => Parent::Found(*id),
                None => Parent::Unknown(layer.to_string()),
            };
        }

        Parent::Found(scene.default_layer())
    }

    fn insert_layer(
        &mut self,
        entity_index: usize,
        entity: &map::Entity,
        layer: NodeId,
    ) -> Result<(), ConvertError> {
        insert_unique(&mut self.layers, entity_index, entity, layer)
    }

    fn insert_group(
        &mut self,
        entity_index: usize,
        entity: &map::Entity,
        group: NodeId,
    ) -> Result<(), ConvertError> {
        insert_unique(&mut self.groups, entity_index, entity, group)
    }
}

fn insert_unique(
    containers: &mut HashMap<String, NodeId>,
    entity_index: usize,
    entity: &map::Entity,
    node: NodeId,
) -> Result<(), ConvertError> {
    let Some(id) = entity.attributes.get(TB_ID_KEY) else {
        return Ok(());
    };

    if containers.contains_key(id) {
        return Err(ConvertError::DuplicateId {
            entity: entity_index,
            key: TB_ID_KEY,
            id: id.to_string(),
        });
    }

    containers.insert(id.to_string(), node);

    Ok(())
}

fn parse_value<T: std::str::FromStr>(
    entity_index: usize,
    key: &'static str,
    value: &str,
) -> Result<T, ConvertError> {
    value.parse::<T>().map_err(|_| ConvertError::InvalidValue {
        entity: entity_index,
        key,
        value: value.to_string(),
    })
}

fn persistent_id(entity_index: usize, entity: &map::Entity) -> Result<Option<u64>, ConvertError> {
    entity
        .attributes
        .get(TB_ID_KEY)
        .map(|id| parse_value(entity_index, TB_ID_KEY, id))
        .transpose()
}

/// Builds a scene out of a parsed map.
pub fn scene_from_map(map: &Map) -> Result<Scene, ConvertError> {
    let worldspawn = map.worldspawn().ok_or(ConvertError::MissingWorldspawn)?;

    let mut scene = Scene::with_worldspawn(object_entity(worldspawn));
    let default_layer = scene.default_layer();
    add_primitives(&mut scene, default_layer, 0, worldspawn)?;

    let mut containers = Containers::default();
    let mut groups = vec![];
    let mut objects = vec![];

    for (entity_index, entity) in map.entities.iter().enumerate().skip(1) {
        match entity_role(entity) {
            EntityRole::Layer => {
                let layer = add_layer(&mut scene, entity_index, entity)?;
                containers.insert_layer(entity_index, entity, layer)?;
            }
            EntityRole::Group => groups.push((entity_index, entity)),
            EntityRole::Object => objects.push((entity_index, entity)),
        }
    }

    // groups may come before the group they sit in
    while !groups.is_empty() {
        let mut pending = vec![];
        let count = groups.len();

        for (entity_index, entity) in groups {
            match containers.parent(&scene, entity) {
                Parent::Found(parent) => {
                    let group = add_group(&mut scene, parent, entity_index, entity)?;
                    containers.insert_group(entity_index, entity, group)?;
                }
                Parent::Pending(_) => pending.push((entity_index, entity)),
                Parent::Unknown(parent) => {
                    return Err(ConvertError::UnknownParent {
                        entity: entity_index,
                        parent,
                    })
                }
            }
        }

        if pending.len() == count {
            let (entity_index, entity) = pending[0];

            return Err(ConvertError::UnknownParent {
                entity: entity_index,
                parent: entity
                    .attributes
                    .get(TB_GROUP_KEY)
                    .unwrap_or_default()
                    .to_string(),
            });
        }

        groups = pending;
    }

    for (entity_index, entity) in objects {
        let parent = match containers.parent(&scene, entity) {
            Parent::Found(parent) => parent,
            Parent::Pending(parent) | Parent::Unknown(parent) => {
                return Err(ConvertError::UnknownParent {
                    entity: entity_index,
                    parent,
                })
            }
        };

        let node = scene.add_node(parent, NodeKind::Entity(object_entity(entity)))?;
        add_primitives(&mut scene, node, entity_index, entity)?;
    }

    log::debug!(
        "Converted {} entities into {} nodes",
        map.entities.len(),
        scene.node_count()
    );

    Ok(scene)
}

fn add_layer(
    scene: &mut Scene,
    entity_index: usize,
    entity: &map::Entity,
) -> Result<NodeId, ConvertError> {
    let attributes = &entity.attributes;

    let mut layer = Layer::new(attributes.get(TB_NAME_KEY).unwrap_or_default());
    layer.persistent_id = persistent_id(entity_index, entity)?;
    layer.sort_index = attributes
        .get(TB_LAYER_SORT_INDEX_KEY)
        .map(|index| parse_value(entity_index, TB_LAYER_SORT_INDEX_KEY, index))
        .transpose()?;

    let world = scene.world();
    let id = scene.add_node(world, NodeKind::Layer(layer))?;

    if attributes.get(TB_LAYER_HIDDEN_KEY) == Some("1") {
        scene.set_visibility(id, VisibilityState::Hidden)?;
    }

    if attributes.get(TB_LAYER_LOCKED_KEY) == Some("1") {
        scene.set_lock_state(id, LockState::Locked)?;
    }

    add_primitives(scene, id, entity_index, entity)?;

    Ok(id)
}

fn add_group(
    scene: &mut Scene,
    parent: NodeId,
    entity_index: usize,
    entity: &map::Entity,
) -> Result<NodeId, ConvertError> {
    let attributes = &entity.attributes;

    let mut group = Group::new(attributes.get(TB_NAME_KEY).unwrap_or_default());
    group.persistent_id = persistent_id(entity_index, entity)?;
    group.linked_group_id = attributes.get(TB_LINKED_GROUP_ID_KEY).map(String::from);

    if let Some(transformation) = attributes.get(TB_TRANSFORMATION_KEY) {
        group.transformation =
            parse_matrix(transformation).ok_or_else(|| ConvertError::InvalidValue {
                entity: entity_index,
                key: TB_TRANSFORMATION_KEY,
                value: transformation.to_string(),
            })?;
    }

    let id = scene.add_node(parent, NodeKind::Group(group))?;
    add_primitives(scene, id, entity_index, entity)?;

    Ok(id)
}

fn object_entity(entity: &map::Entity) -> Entity {
    let mut res = Entity::from_properties(
        entity
            .attributes
            .iter()
            .filter(|(key, _)| !TB_RESERVED_KEYS.contains(key)),
    );

    if let Some(protected) = entity.attributes.get(TB_PROTECTED_PROPERTIES_KEY) {
        res.set_protected_properties(
            protected
                .split(';')
                .filter(|key| !key.is_empty())
                .map(String::from)
                .collect(),
        );
    }

    res
}

fn add_primitives(
    scene: &mut Scene,
    parent: NodeId,
    entity_index: usize,
    entity: &map::Entity,
) -> Result<(), ConvertError> {
    for (index, primitive) in entity.primitives.iter().enumerate() {
        let kind = match primitive {
            Primitive::Brush(brush) => NodeKind::Brush(brush_from_map(brush).map_err(|source| {
                ConvertError::Brush {
                    entity: entity_index,
                    brush: index,
                    source,
                }
            })?),
            Primitive::Patch(patch) => NodeKind::Patch(
                Patch::new(
                    patch.texture_name.as_str(),
                    patch.row_count,
                    patch.column_count,
                    patch.points.clone(),
                )
                .map_err(|source| ConvertError::Patch {
                    entity: entity_index,
                    patch: index,
                    source,
                })?,
            ),
        };

        scene.add_node(parent, kind)?;
    }

    Ok(())
}

fn brush_from_map(brush: &map::Brush) -> Result<Brush, BrushError> {
    Brush::from_face_points(brush.planes.iter().map(|plane| {
        (
            [plane.p1, plane.p2, plane.p3],
            FaceAttributes {
                texture_name: plane.texture_name.clone(),
                u_axis: plane.u.truncate(),
                v_axis: plane.v.truncate(),
                u_offset: plane.u.w,
                v_offset: plane.v.w,
                rotation: plane.rotation,
                u_scale: plane.u_scale,
                v_scale: plane.v_scale,
            },
        )
    }))
}

fn round_vec3(value: DVec3) -> DVec3 {
    DVec3::new(
        round_number(value.x),
        round_number(value.y),
        round_number(value.z),
    )
}

fn brush_to_map(brush: &Brush) -> map::Brush {
    map::Brush {
        planes: brush.faces().iter().map(face_to_map).collect(),
    }
}

fn face_to_map(face: &BrushFace) -> BrushPlane {
    let [p1, p2, p3] = (*face.points()).map(round_vec3);
    let attributes = &face.attributes;

    BrushPlane {
        p1,
        p2,
        p3,
        texture_name: attributes.texture_name.clone(),
        u: round_vec3(attributes.u_axis).extend(round_number(attributes.u_offset)),
        v: round_vec3(attributes.v_axis).extend(round_number(attributes.v_offset)),
        rotation: round_number(attributes.rotation),
        u_scale: round_number(attributes.u_scale),
        v_scale: round_number(attributes.v_scale),
    }
}

fn patch_to_map(patch: &Patch) -> map::Patch {
    map::Patch {
        texture_name: patch.texture_name.clone(),
        row_count: patch.row_count(),
        column_count: patch.column_count(),
        points: patch
            .control_points()
            .iter()
            .map(|point| PatchPoint {
                position: round_vec3(point.position),
                uv: point.uv,
            })
            .collect(),
    }
}

fn primitives(scene: &Scene, id: NodeId) -> Vec<Primitive> {
    scene
        .children(id)
        .iter()
        .filter_map(|child| match scene.kind(*child) {
            Some(NodeKind::Brush(brush)) => Some(Primitive::Brush(brush_to_map(brush))),
            Some(NodeKind::Patch(patch)) => Some(Primitive::Patch(patch_to_map(patch))),
            _ => None,
        })
        .collect()
}

struct MapWriter<'a> {
    scene: &'a Scene,
    ids: HashMap<NodeId, u64>,
    entities: Vec<map::Entity>,
}

impl<'a> MapWriter<'a> {
    fn new(scene: &'a Scene) -> Self {
        let mut containers = vec![];

        // the default layer is written as part of worldspawn and needs no id
        scene.walk(&[scene.world()], |node| {
            match node.kind() {
                NodeKind::Layer(_) if node.id() == scene.default_layer() => (),
                NodeKind::Layer(_) | NodeKind::Group(_) => containers.push(node.id()),
                _ => (),
            }

            Walk::Continue
        });

        let existing = |id: &NodeId| match scene.kind(*id) {
            Some(NodeKind::Layer(layer)) => layer.persistent_id,
            Some(NodeKind::Group(group)) => group.persistent_id,
            _ => None,
        };

        let mut next_id = containers.iter().filter_map(existing).max().unwrap_or(0) + 1;
        let mut used = HashSet::new();
        let mut ids = HashMap::new();

        // a repeated id goes to the first container that has it
        for container in containers {
            let id = match existing(&container) {
                Some(id) if used.insert(id) => id,
                _ => {
                    next_id += 1;
                    next_id - 1
                }
            };

            ids.insert(container, id);
        }

        Self {
            scene,
            ids,
            entities: vec![],
        }
    }

    fn parent_attribute(&self, parent: NodeId) -> Option<(&'static str, String)> {
        if parent == self.scene.default_layer() {
            return None;
        }

        let key = match self.scene.kind(parent)? {
            NodeKind::Layer(_) => TB_LAYER_KEY,
            NodeKind::Group(_) => TB_GROUP_KEY,
            _ => return None,
        };

        Some((key, self.ids.get(&parent)?.to_string()))
    }

    fn write_world(&mut self) {
        let scene = self.scene;

        let mut attributes = map::Attributes::new();
        scene
            .worldspawn()
            .into_iter()
            .flat_map(|worldspawn| worldspawn.properties())
            .for_each(|property| attributes.insert(property.key.as_str(), property.value.as_str()));

        self.entities.push(map::Entity {
            attributes,
            primitives: primitives(scene, scene.default_layer()),
        });

        for child in scene.children(scene.default_layer()) {
            self.write_node(*child);
        }

        for layer in scene.children(scene.world()) {
            if *layer != scene.default_layer() {
                self.write_node(*layer);
            }
        }
    }

    fn write_node(&mut self, id: NodeId) {
        let scene = self.scene;

        let Some(node) = scene.node(id) else {
            return;
        };

        let mut attributes = map::Attributes::new();

        match node.kind() {
            NodeKind::Layer(layer) => {
                attributes.insert(CLASSNAME_KEY, GROUP_CLASSNAME);
                attributes.insert(TB_TYPE_KEY, TB_LAYER_TYPE);
                attributes.insert(TB_NAME_KEY, layer.name.as_str());
                self.insert_id(&mut attributes, id);

                if let Some(sort_index) = layer.sort_index {
                    attributes.insert(TB_LAYER_SORT_INDEX_KEY, sort_index.to_string());
                }

                if node.visibility() == VisibilityState::Hidden {
                    attributes.insert(TB_LAYER_HIDDEN_KEY, "1");
                }

                if node.lock_state() == LockState::Locked {
                    attributes.insert(TB_LAYER_LOCKED_KEY, "1");
                }
            }
            NodeKind::Group(group) => {
                attributes.insert(CLASSNAME_KEY, GROUP_CLASSNAME);
                attributes.insert(TB_TYPE_KEY, TB_GROUP_TYPE);
                attributes.insert(TB_NAME_KEY, group.name.as_str());
                self.insert_id(&mut attributes, id);

                if let Some(linked_group_id) = &group.linked_group_id {
                    attributes.insert(TB_LINKED_GROUP_ID_KEY, linked_group_id.as_str());
                }

                if !is_identity(&group.transformation) {
                    attributes.insert(TB_TRANSFORMATION_KEY, format_matrix(&group.transformation));
                }

                self.insert_parent(&mut attributes, node.parent());
            }
            NodeKind::Entity(entity) => {
                entity
                    .properties()
                    .iter()
                    .for_each(|property| attributes.insert(property.key.as_str(), property.value.as_str()));

                if !entity.protected_properties().is_empty() {
                    attributes.insert(
                        TB_PROTECTED_PROPERTIES_KEY,
                        entity.protected_properties().join(";"),
                    );
                }

                self.insert_parent(&mut attributes, node.parent());
            }
            NodeKind::World(_) | NodeKind::Brush(_) | NodeKind::Patch(_) => return,
        }

        self.entities.push(map::Entity {
            attributes,
            primitives: primitives(scene, id),
        });

        if matches!(node.kind(), NodeKind::Entity(_)) {
            return;
        }

        for child in node.children() {
            self.write_node(*child);
        }
    }

    fn insert_id(&self, attributes: &mut map::Attributes, id: NodeId) {
        if let Some(id) = self.ids.get(&id) {
            attributes.insert(TB_ID_KEY, id.to_string());
        }
    }

    fn insert_parent(&self, attributes: &mut map::Attributes, parent: Option<NodeId>) {
        if let Some((key, value)) = parent.and_then(|parent| self.parent_attribute(parent)) {
            attributes.insert(key, value);
        }
    }
}

/// Writes the scene back into map entities.
///
/// Layers and groups without a persistent id get one above the largest existing id.
pub fn scene_to_map(scene: &Scene) -> Map {
    let mut writer = MapWriter::new(scene);
    writer.write_world();

    Map {
        tb_header: DEFAULT_TB_HEADER.iter().map(|s| s.to_string()).collect(),
        entities: writer.entities,
    }
}

#[cfg(test)]
mod test {
    use glam::DMat4;

    use crate::{
        edit::propagate_link_set,
        model::{
            queries::find_linked_groups,
            test_utils::{add_linked_copy, approx_eq, cube_brush, point_entity},
        },
        utils::{bbox::BBox3, constants::DEFAULT_WORLD_BOUND},
    };

    use super::*;

    const MAP: &str = "\
// Game: Half-Life
// Format: Valve
// entity 0
{
\"classname\" \"worldspawn\"
\"wad\" \"halflife.wad\"
// brush 0
{
( -64 -64 -16 ) ( -64 -63 -16 ) ( -64 -64 -15 ) __TB_empty [ 0 -1 0 0 ] [ 0 0 -1 0 ] 0 1 1
( -64 -64 -16 ) ( -64 -64 -15 ) ( -63 -64 -16 ) __TB_empty [ 1 0 0 0 ] [ 0 0 -1 0 ] 0 1 1
( -64 -64 -16 ) ( -63 -64 -16 ) ( -64 -63 -16 ) __TB_empty [ -1 0 0 0 ] [ 0 -1 0 0 ] 0 1 1
( 64 64 16 ) ( 64 65 16 ) ( 65 64 16 ) __TB_empty [ 1 0 0 0 ] [ 0 -1 0 0 ] 0 1 1
( 64 64 16 ) ( 65 64 16 ) ( 64 64 17 ) __TB_empty [ -1 0 0 0 ] [ 0 0 -1 0 ] 0 1 1
( 64 64 16 ) ( 64 64 17 ) ( 64 65 16 ) __TB_empty [ 0 1 0 0 ] [ 0 0 -1 0 ] 0 1 1
}
}
// entity 1
{
\"classname\" \"func_group\"
\"_tb_type\" \"_tb_group\"
\"_tb_name\" \"inner\"
\"_tb_id\" \"3\"
\"_tb_group\" \"2\"
}
// entity 2
{
\"classname\" \"func_group\"
\"_tb_type\" \"_tb_layer\"
\"_tb_name\" \"Lights\"
\"_tb_id\" \"1\"
\"_tb_layer_sort_index\" \"0\"
\"_tb_layer_hidden\" \"1\"
}
// entity 3
{
\"classname\" \"func_group\"
\"_tb_type\" \"_tb_group\"
\"_tb_name\" \"room\"
\"_tb_id\" \"2\"
\"_tb_linked_group_id\" \"{abc}\"
\"_tb_transformation\" \"1 0 0 64 0 1 0 0 0 0 1 0 0 0 0 1\"
\"_tb_layer\" \"1\"
}
// entity 4
{
\"classname\" \"light\"
\"origin\" \"64 0 0\"
\"_tb_protected_properties\" \"light;_color\"
\"_tb_group\" \"3\"
}
// entity 5
{
\"classname\" \"info_player_start\"
\"origin\" \"0 0 32\"
}
";

    #[test]
    fn read_structure() {
        let map = Map::from_text(MAP).unwrap();
        let scene = scene_from_map(&map).unwrap();

        assert_eq!(scene.worldspawn().unwrap().property("wad"), Some("halflife.wad"));
        assert_eq!(scene.children(scene.default_layer()).len(), 2);

        let layers = scene.children(scene.world());
        assert_eq!(layers.len(), 2);

        let layer = layers[1];
        assert_eq!(scene.layer(layer).unwrap().name, "Lights");
        assert_eq!(scene.layer(layer).unwrap().sort_index, Some(0));
        assert!(!scene.visible(layer));

        let room = scene.children(layer)[0];
        let room_group = scene.group(room).unwrap();
        assert_eq!(room_group.name, "room");
        assert_eq!(room_group.linked_group_id.as_deref(), Some("{abc}"));
        assert_eq!(room_group.persistent_id, Some(2));
        assert!(approx_eq(
            room_group.transformation.transform_point3(DVec3::ZERO),
            DVec3::X * 64.
        ));

        let inner = scene.children(room)[0];
        assert_eq!(scene.group(inner).unwrap().name, "inner");

        let light = scene.children(inner)[0];
        let light = scene.entity(light).unwrap();
        assert_eq!(light.classname(), Some("light"));
        assert!(light.is_protected("light"));
        assert!(light.is_protected("_color"));
        assert!(!light.has_property(TB_GROUP_KEY));
        assert!(!light.has_property(TB_PROTECTED_PROPERTIES_KEY));
    }

    #[test]
    fn unknown_parent() {
        let text = "\
{
\"classname\" \"worldspawn\"
}
{
\"classname\" \"light\"
\"_tb_group\" \"7\"
}
";
        let map = Map::from_text(text).unwrap();

        assert!(matches!(
            scene_from_map(&map),
            Err(ConvertError::UnknownParent { entity: 1, .. })
        ));
    }

    #[test]
    fn missing_worldspawn() {
        let text = "\
{
\"classname\" \"light\"
}
";
        let map = Map::from_text(text).unwrap();

        assert!(matches!(
            scene_from_map(&map),
            Err(ConvertError::MissingWorldspawn)
        ));
    }

    #[test]
    fn invalid_transformation() {
        let text = "\
{
\"classname\" \"worldspawn\"
}
{
\"classname\" \"func_group\"
\"_tb_type\" \"_tb_group\"
\"_tb_id\" \"1\"
\"_tb_transformation\" \"1 0 0\"
}
";
        let map = Map::from_text(text).unwrap();

        assert!(matches!(
            scene_from_map(&map),
            Err(ConvertError::InvalidValue {
                entity: 1,
                key: TB_TRANSFORMATION_KEY,
                ..
            })
        ));
    }

    #[test]
    fn write_and_read_back() {
        let mut scene = Scene::new();
        let layer = scene.default_layer();
        scene.add_node(layer, cube_brush(DVec3::ZERO, 16.)).unwrap();
        scene
            .add_node(layer, point_entity("info_player_start", DVec3::Z * 32.))
            .unwrap();

        let first = add_linked_copy(&mut scene, layer, "a", DMat4::IDENTITY);
        add_linked_copy(&mut scene, layer, "a", DMat4::from_translation(DVec3::X * 64.));

        let light = scene.children(first)[1];
        scene.entity_mut(light).unwrap().protect_property("light");

        let map = scene_to_map(&scene);
        let text = map.to_string();

        assert!(text.starts_with("// Game: Generic\n// Format: Valve\n"));
        assert!(text.contains("\"_tb_transformation\" \"1 0 0 64 0 1 0 0 0 0 1 0 0 0 0 1\""));
        assert!(text.contains("\"_tb_protected_properties\" \"light\""));

        let read = scene_from_map(&Map::from_text(&text).unwrap()).unwrap();

        assert_eq!(read.node_count(), scene.node_count());

        let groups = find_linked_groups(&read, &[read.world()], "a");
        assert_eq!(groups.len(), 2);

        let ids = groups
            .iter()
            .map(|group| read.group(*group).unwrap().persistent_id)
            .collect::<Vec<Option<u64>>>();
        assert_eq!(ids, vec![Some(1), Some(2)]);

        let light = read.children(groups[1])[1];
        assert!(approx_eq(
            read.entity(light).unwrap().origin().unwrap(),
            DVec3::X * 64.
        ));

        let brush = read.children(groups[1])[0];
        let bounds = read.logical_bounds(brush).unwrap();
        assert!(approx_eq(bounds.center(), DVec3::X * 64.));
    }

    #[test]
    fn duplicate_group_id() {
        let text = "\
{
\"classname\" \"worldspawn\"
}
{
\"classname\" \"func_group\"
\"_tb_type\" \"_tb_group\"
\"_tb_id\" \"4\"
}
{
\"classname\" \"func_group\"
\"_tb_type\" \"_tb_group\"
\"_tb_id\" \"4\"
}
";
        let map = Map::from_text(text).unwrap();

        assert!(matches!(
            scene_from_map(&map),
            Err(ConvertError::DuplicateId { entity: 2, .. })
        ));
    }

    #[test]
    fn propagated_nested_groups_keep_structure() {
        let mut scene = Scene::new();
        let layer = scene.default_layer();

        let groups = [DVec3::ZERO, DVec3::X * 256.]
            .into_iter()
            .zip([(10, 20), (11, 21)])
            .map(|(offset, (outer_id, inner_id))| {
                let outer = add_linked_copy(
                    &mut scene,
                    layer,
                    "a",
                    DMat4::from_translation(offset),
                );
                scene.group_mut(outer).unwrap().persistent_id = Some(outer_id);

                let mut inner = Group::new("inner");
                inner.persistent_id = Some(inner_id);
                let inner = scene.add_node(outer, NodeKind::Group(inner)).unwrap();
                scene
                    .add_node(inner, point_entity("light", offset + DVec3::Z * 16.))
                    .unwrap();

                outer
            })
            .collect::<Vec<NodeId>>();

        propagate_link_set(&mut scene, groups[0], &BBox3::cube(DEFAULT_WORLD_BOUND)).unwrap();

        let map = scene_to_map(&scene);

        let mut ids = map
            .entities
            .iter()
            .filter_map(|entity| entity.attributes.get(TB_ID_KEY))
            .collect::<Vec<&str>>();
        let count = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), count);

        let read = scene_from_map(&Map::from_text(&map.to_string()).unwrap()).unwrap();
        let groups = find_linked_groups(&read, &[read.world()], "a");
        assert_eq!(groups.len(), 2);

        let offsets = [DVec3::ZERO, DVec3::X * 256.];

        for (group, offset) in groups.iter().zip(offsets) {
            let inner = read
                .children(*group)
                .iter()
                .copied()
                .find(|child| read.group(*child).is_some())
                .unwrap();

            let lights = read.children(inner);
            assert_eq!(lights.len(), 1);
            assert!(approx_eq(
                read.entity(lights[0]).unwrap().origin().unwrap(),
                offset + DVec3::Z * 16.
            ));
        }
    }

    #[test]
    fn layer_state_is_written() {
        let mut scene = Scene::new();
        let world = scene.world();
        let layer = scene
            .add_node(world, NodeKind::Layer(Layer::new("Details").with_sort_index(3)))
            .unwrap();
        scene.set_lock_state(layer, LockState::Locked).unwrap();
        scene.add_node(layer, cube_brush(DVec3::ZERO, 8.)).unwrap();

        let map = scene_to_map(&scene);

        assert_eq!(map.entities.len(), 2);

        let attributes = &map.entities[1].attributes;
        assert_eq!(attributes.get(TB_TYPE_KEY), Some(TB_LAYER_TYPE));
        assert_eq!(attributes.get(TB_LAYER_SORT_INDEX_KEY), Some("3"));
        assert_eq!(attributes.get(TB_LAYER_LOCKED_KEY), Some("1"));
        assert_eq!(attributes.get(TB_LAYER_HIDDEN_KEY), None);
        assert_eq!(map.entities[1].primitives.len(), 1);
    }
}
