use std::fmt;

use glam::DMat4;

use crate::{
    error::TransformError,
    utils::{
        bbox::{BBox3, BBox3Builder},
        constants::POINT_ENTITY_HALF_SIZE,
    },
};

use super::{brush::Brush, entity::Entity, group::Group, layer::Layer, patch::Patch};

/// Handle of a node inside a [`super::Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityState {
    #[default]
    Inherited,
    Hidden,
    Shown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockState {
    #[default]
    Inherited,
    Locked,
    Unlocked,
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Root of the scene. Holds the worldspawn entity.
    World(Entity),
    Layer(Layer),
    Group(Group),
    Entity(Entity),
    Brush(Brush),
    Patch(Patch),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::World(_) => "world",
            NodeKind::Layer(_) => "layer",
            NodeKind::Group(_) => "group",
            NodeKind::Entity(_) => "entity",
            NodeKind::Brush(_) => "brush",
            NodeKind::Patch(_) => "patch",
        }
    }

    pub fn can_add_child(&self, child: &NodeKind) -> bool {
        match self {
            NodeKind::World(_) => matches!(child, NodeKind::Layer(_)),
            NodeKind::Layer(_) | NodeKind::Group(_) => matches!(
                child,
                NodeKind::Group(_) | NodeKind::Entity(_) | NodeKind::Brush(_) | NodeKind::Patch(_)
            ),
            NodeKind::Entity(_) => matches!(child, NodeKind::Brush(_) | NodeKind::Patch(_)),
            NodeKind::Brush(_) | NodeKind::Patch(_) => false,
        }
    }

    pub fn same_variant(&self, other: &NodeKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Returns a transformed copy.
    ///
    /// `has_children` decides whether an entity is a point entity, whose position
    /// lives in its properties, or a brush entity, whose position lives in its brushes.
    pub fn transformed(
        &self,
        transformation: &DMat4,
        has_children: bool,
        texture_lock: bool,
    ) -> Result<NodeKind, TransformError> {
        let res = match self {
            NodeKind::World(entity) => NodeKind::World(entity.clone()),
            NodeKind::Layer(layer) => NodeKind::Layer(layer.clone()),
            NodeKind::Group(group) => NodeKind::Group(group.transformed(transformation)),
            NodeKind::Entity(entity) => {
                NodeKind::Entity(entity.transformed(transformation, !has_children))
            }
            NodeKind::Brush(brush) => {
                NodeKind::Brush(brush.transformed(transformation, texture_lock)?)
            }
            NodeKind::Patch(patch) => NodeKind::Patch(patch.transformed(transformation)?),
        };

        Ok(res)
    }

    /// Bounds of a node given the bounds of its children.
    pub fn logical_bounds(
        &self,
        children_bounds: impl IntoIterator<Item = BBox3>,
    ) -> Option<BBox3> {
        match self {
            NodeKind::Brush(brush) => Some(brush.bounds()),
            NodeKind::Patch(patch) => patch.bounds(),
            NodeKind::Entity(entity) => {
                let mut builder = BBox3Builder::new();
                children_bounds
                    .into_iter()
                    .for_each(|bounds| builder.add(bounds));

                // no brushes means point entity
                Some(builder.bounds().unwrap_or_else(|| {
                    BBox3::from_center(
                        entity.origin().unwrap_or_default(),
                        glam::DVec3::splat(POINT_ENTITY_HALF_SIZE),
                    )
                }))
            }
            NodeKind::World(_) | NodeKind::Layer(_) | NodeKind::Group(_) => {
                let mut builder = BBox3Builder::new();
                children_bounds
                    .into_iter()
                    .for_each(|bounds| builder.add(bounds));
                builder.bounds()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(super) id: NodeId,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
    pub(super) kind: NodeKind,
    pub(super) selected: bool,
    pub(super) visibility: VisibilityState,
    pub(super) lock_state: LockState,
}

impl Node {
    pub(super) fn new(id: NodeId, parent: Option<NodeId>, kind: NodeKind) -> Self {
        Self {
            id,
            parent,
            children: vec![],
            kind,
            selected: false,
            visibility: VisibilityState::default(),
            lock_state: LockState::default(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn visibility(&self) -> VisibilityState {
        self.visibility
    }

    pub fn lock_state(&self) -> LockState {
        self.lock_state
    }

    pub fn as_layer(&self) -> Option<&Layer> {
        match &self.kind {
            NodeKind::Layer(layer) => Some(layer),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match &self.kind {
            NodeKind::Group(group) => Some(group),
            _ => None,
        }
    }

    /// Entity payload of an entity node. The worldspawn is not included.
    pub fn as_entity(&self) -> Option<&Entity> {
        match &self.kind {
            NodeKind::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_brush(&self) -> Option<&Brush> {
        match &self.kind {
            NodeKind::Brush(brush) => Some(brush),
            _ => None,
        }
    }

    pub fn as_patch(&self) -> Option<&Patch> {
        match &self.kind {
            NodeKind::Patch(patch) => Some(patch),
            _ => None,
        }
    }
}

/// A subtree that does not belong to any scene.
///
/// Handed out by propagation and by removing nodes from a scene. Node state
/// other than selection travels with it.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTree {
    pub kind: NodeKind,
    pub visibility: VisibilityState,
    pub lock_state: LockState,
    pub children: Vec<NodeTree>,
}

impl NodeTree {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            visibility: VisibilityState::default(),
            lock_state: LockState::default(),
            children: vec![],
        }
    }

    pub fn with_children(kind: NodeKind, children: Vec<NodeTree>) -> Self {
        Self {
            children,
            ..Self::new(kind)
        }
    }

    pub fn logical_bounds(&self) -> Option<BBox3> {
        self.kind.logical_bounds(
            self.children
                .iter()
                .filter_map(|child| child.logical_bounds()),
        )
    }

    /// Number of nodes in the tree, itself included.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|child| child.node_count())
            .sum::<usize>()
    }

    /// Checks parent and child variants for the whole tree.
    pub fn validate(&self) -> Result<(), (&'static str, &'static str)> {
        for child in &self.children {
            if !self.kind.can_add_child(&child.kind) {
                return Err((self.kind.name(), child.kind.name()));
            }

            child.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn child_rules() {
        let world = NodeKind::World(Entity::default());
        let layer = NodeKind::Layer(Layer::new("a"));
        let group = NodeKind::Group(Group::new("g"));
        let entity = NodeKind::Entity(Entity::default());

        assert!(world.can_add_child(&layer));
        assert!(!world.can_add_child(&group));
        assert!(layer.can_add_child(&group));
        assert!(group.can_add_child(&entity));
        assert!(!entity.can_add_child(&group));
        assert!(!layer.can_add_child(&layer));
    }

    #[test]
    fn invalid_tree() {
        let tree = NodeTree::with_children(
            NodeKind::Entity(Entity::default()),
            vec![NodeTree::new(NodeKind::Group(Group::new("g")))],
        );

        assert_eq!(tree.validate(), Err(("entity", "group")));
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn point_entity_bounds() {
        let entity = Entity::from_properties([("classname", "info_player_start"), ("origin", "32 0 0")]);
        let bounds = NodeKind::Entity(entity).logical_bounds([]).unwrap();

        assert_eq!(bounds.center(), glam::DVec3::new(32., 0., 0.));
        assert_eq!(bounds.size(), glam::DVec3::splat(POINT_ENTITY_HALF_SIZE * 2.));
    }
}
