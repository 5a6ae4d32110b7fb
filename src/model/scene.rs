use std::collections::HashMap;

use crate::{
    error::SceneError,
    utils::{
        bbox::BBox3,
        constants::{CLASSNAME_KEY, DEFAULT_LAYER_NAME, WORLDSPAWN_CLASSNAME},
    },
};

use super::{
    brush::Brush,
    entity::Entity,
    group::Group,
    layer::Layer,
    node::{LockState, Node, NodeId, NodeKind, NodeTree, VisibilityState},
    patch::Patch,
};

/// Tells [`Scene::walk`] whether to descend into the children of the visited node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    SkipChildren,
}

/// Node arena rooted at a world node.
///
/// Nodes own their children through the arena and only know their parent by id.
/// Every change to the hierarchy goes through this type so that parent and child
/// lists cannot disagree.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: HashMap<NodeId, Node>,
    world: NodeId,
    default_layer: NodeId,
    next_id: u32,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::with_worldspawn(Entity::from_properties([(
            CLASSNAME_KEY,
            WORLDSPAWN_CLASSNAME,
        )]))
    }

    /// Empty scene with a world and its default layer.
    pub fn with_worldspawn(worldspawn: Entity) -> Self {
        let mut res = Self {
            nodes: HashMap::new(),
            world: NodeId(0),
            default_layer: NodeId(0),
            next_id: 0,
        };

        res.world = res.allocate(None, NodeKind::World(worldspawn));
        res.default_layer = res.attach(
            res.world,
            NodeKind::Layer(Layer::new(DEFAULT_LAYER_NAME)),
        );

        res
    }

    fn allocate(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        self.nodes.insert(id, Node::new(id, parent, kind));

        id
    }

    // caller checks that `parent` exists and accepts the child
    fn attach(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.allocate(Some(parent), kind);

        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.push(id);
        }

        id
    }

    pub fn world(&self) -> NodeId {
        self.world
    }

    pub fn default_layer(&self) -> NodeId {
        self.default_layer
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|node| node.kind())
    }

    /// Empty if the node does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|node| node.children()).unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent())
    }

    /// From the parent up to the world.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |current| self.parent(*current))
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    pub fn worldspawn(&self) -> Option<&Entity> {
        match self.kind(self.world) {
            Some(NodeKind::World(entity)) => Some(entity),
            _ => None,
        }
    }

    pub fn worldspawn_mut(&mut self) -> Option<&mut Entity> {
        match self.nodes.get_mut(&self.world).map(|node| &mut node.kind) {
            Some(NodeKind::World(entity)) => Some(entity),
            _ => None,
        }
    }

    pub fn layer(&self, id: NodeId) -> Option<&Layer> {
        self.node(id).and_then(|node| node.as_layer())
    }

    pub fn group(&self, id: NodeId) -> Option<&Group> {
        self.node(id).and_then(|node| node.as_group())
    }

    pub fn entity(&self, id: NodeId) -> Option<&Entity> {
        self.node(id).and_then(|node| node.as_entity())
    }

    pub fn brush(&self, id: NodeId) -> Option<&Brush> {
        self.node(id).and_then(|node| node.as_brush())
    }

    pub fn patch(&self, id: NodeId) -> Option<&Patch> {
        self.node(id).and_then(|node| node.as_patch())
    }

    pub fn layer_mut(&mut self, id: NodeId) -> Option<&mut Layer> {
        match self.nodes.get_mut(&id).map(|node| &mut node.kind) {
            Some(NodeKind::Layer(layer)) => Some(layer),
            _ => None,
        }
    }

    pub fn group_mut(&mut self, id: NodeId) -> Option<&mut Group> {
        match self.nodes.get_mut(&id).map(|node| &mut node.kind) {
            Some(NodeKind::Group(group)) => Some(group),
            _ => None,
        }
    }

    pub fn entity_mut(&mut self, id: NodeId) -> Option<&mut Entity> {
        match self.nodes.get_mut(&id).map(|node| &mut node.kind) {
            Some(NodeKind::Entity(entity)) => Some(entity),
            _ => None,
        }
    }

    pub fn brush_mut(&mut self, id: NodeId) -> Option<&mut Brush> {
        match self.nodes.get_mut(&id).map(|node| &mut node.kind) {
            Some(NodeKind::Brush(brush)) => Some(brush),
            _ => None,
        }
    }

    pub fn patch_mut(&mut self, id: NodeId) -> Option<&mut Patch> {
        match self.nodes.get_mut(&id).map(|node| &mut node.kind) {
            Some(NodeKind::Patch(patch)) => Some(patch),
            _ => None,
        }
    }

    fn check_child(&self, parent: NodeId, child: &NodeKind) -> Result<(), SceneError> {
        let parent = self.get(parent)?;

        if !parent.kind().can_add_child(child) {
            return Err(SceneError::InvalidChild {
                parent: parent.kind().name(),
                child: child.name(),
            });
        }

        Ok(())
    }

    /// Checks that `tree` could be inserted under `parent`.
    pub fn check_tree(&self, parent: NodeId, tree: &NodeTree) -> Result<(), SceneError> {
        self.check_child(parent, &tree.kind)?;

        tree.validate()
            .map_err(|(parent, child)| SceneError::InvalidChild { parent, child })
    }

    pub fn add_node(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId, SceneError> {
        self.check_child(parent, &kind)?;

        Ok(self.attach(parent, kind))
    }

    /// Inserts a detached subtree as the last child of `parent`. Nodes get new ids.
    pub fn insert_tree(&mut self, parent: NodeId, tree: NodeTree) -> Result<NodeId, SceneError> {
        self.check_tree(parent, &tree)?;

        Ok(self.insert_tree_unchecked(parent, tree))
    }

    fn insert_tree_unchecked(&mut self, parent: NodeId, tree: NodeTree) -> NodeId {
        let NodeTree {
            kind,
            visibility,
            lock_state,
            children,
        } = tree;

        let id = self.attach(parent, kind);

        if let Some(node) = self.nodes.get_mut(&id) {
            node.visibility = visibility;
            node.lock_state = lock_state;
        }

        for child in children {
            self.insert_tree_unchecked(id, child);
        }

        id
    }

    /// Detaches the node and its descendants from the scene.
    pub fn remove_node(&mut self, id: NodeId) -> Result<NodeTree, SceneError> {
        if id == self.world {
            return Err(SceneError::RemoveWorld);
        }

        if id == self.default_layer {
            return Err(SceneError::RemoveDefaultLayer);
        }

        let parent = self.get(id)?.parent();

        if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            parent.children.retain(|child| *child != id);
        }

        self.take_subtree(id).ok_or(SceneError::NodeNotFound(id))
    }

    fn take_subtree(&mut self, id: NodeId) -> Option<NodeTree> {
        let node = self.nodes.remove(&id)?;

        let children = node
            .children
            .iter()
            .filter_map(|child| self.take_subtree(*child))
            .collect();

        Some(NodeTree {
            kind: node.kind,
            visibility: node.visibility,
            lock_state: node.lock_state,
            children,
        })
    }

    pub fn clone_tree(&self, id: NodeId) -> Option<NodeTree> {
        let node = self.node(id)?;

        Some(NodeTree {
            kind: node.kind.clone(),
            visibility: node.visibility,
            lock_state: node.lock_state,
            children: node
                .children
                .iter()
                .filter_map(|child| self.clone_tree(*child))
                .collect(),
        })
    }

    /// Replaces every child of `parent` and hands back the old ones.
    ///
    /// Nothing changes if any of the new subtrees cannot go under `parent`.
    pub fn replace_children(
        &mut self,
        parent: NodeId,
        children: Vec<NodeTree>,
    ) -> Result<Vec<NodeTree>, SceneError> {
        self.get(parent)?;

        for child in &children {
            self.check_tree(parent, child)?;
        }

        let old_children = std::mem::take(&mut self.get_mut(parent)?.children);

        let res = old_children
            .into_iter()
            .filter_map(|child| self.take_subtree(child))
            .collect();

        for child in children {
            self.insert_tree_unchecked(parent, child);
        }

        Ok(res)
    }

    /// Swaps the payload of a node for one of the same variant and returns the old payload.
    pub fn swap_kind(&mut self, id: NodeId, kind: NodeKind) -> Result<NodeKind, SceneError> {
        let node = self.get_mut(id)?;

        if !node.kind.same_variant(&kind) {
            return Err(SceneError::ContentsMismatch {
                node: id,
                from: node.kind.name(),
                to: kind.name(),
            });
        }

        Ok(std::mem::replace(&mut node.kind, kind))
    }

    /// Resolved through the parent chain. Everything is visible by default.
    pub fn visible(&self, id: NodeId) -> bool {
        for current in std::iter::once(id).chain(self.ancestors(id)) {
            match self.node(current).map(|node| node.visibility) {
                Some(VisibilityState::Hidden) => return false,
                Some(VisibilityState::Shown) => return true,
                _ => (),
            }
        }

        true
    }

    /// Resolved through the parent chain. Nothing is locked by default.
    pub fn locked(&self, id: NodeId) -> bool {
        for current in std::iter::once(id).chain(self.ancestors(id)) {
            match self.node(current).map(|node| node.lock_state) {
                Some(LockState::Locked) => return true,
                Some(LockState::Unlocked) => return false,
                _ => (),
            }
        }

        false
    }

    /// Returns the previous state.
    pub fn set_visibility(
        &mut self,
        id: NodeId,
        visibility: VisibilityState,
    ) -> Result<VisibilityState, SceneError> {
        let node = self.get_mut(id)?;
        Ok(std::mem::replace(&mut node.visibility, visibility))
    }

    /// Returns the previous state.
    pub fn set_lock_state(
        &mut self,
        id: NodeId,
        lock_state: LockState,
    ) -> Result<LockState, SceneError> {
        let node = self.get_mut(id)?;
        Ok(std::mem::replace(&mut node.lock_state, lock_state))
    }

    pub fn selected(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.selected)
    }

    pub fn select(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.get_mut(id)?.selected = true;
        Ok(())
    }

    pub fn deselect(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.get_mut(id)?.selected = false;
        Ok(())
    }

    pub fn select_brush_face(&mut self, id: NodeId, face_index: usize) -> Result<(), SceneError> {
        if !self.contains(id) {
            return Err(SceneError::NodeNotFound(id));
        }

        self.brush_mut(id)
            .and_then(|brush| brush.face_mut(face_index))
            .ok_or(SceneError::FaceNotFound {
                node: id,
                face_index,
            })?
            .select();

        Ok(())
    }

    /// Deselects all nodes and brush faces.
    pub fn deselect_all(&mut self) {
        for node in self.nodes.values_mut() {
            node.selected = false;

            if let NodeKind::Brush(brush) = &mut node.kind {
                (0..brush.face_count()).for_each(|index| {
                    if let Some(face) = brush.face_mut(index) {
                        face.deselect();
                    }
                });
            }
        }
    }

    pub fn has_opened_descendant(&self, id: NodeId) -> bool {
        self.children(id).iter().any(|child| {
            self.group(*child).is_some_and(|group| group.opened())
                || self.has_opened_descendant(*child)
        })
    }

    /// Bounds used for editing. `None` for empty containers.
    pub fn logical_bounds(&self, id: NodeId) -> Option<BBox3> {
        let node = self.node(id)?;

        node.kind().logical_bounds(
            node.children()
                .iter()
                .filter_map(|child| self.logical_bounds(*child)),
        )
    }

    /// Bounds of what is drawn. Point entities have no models here, so this
    /// matches the logical bounds.
    pub fn physical_bounds(&self, id: NodeId) -> Option<BBox3> {
        self.logical_bounds(id)
    }

    /// Depth first, parents before children, in child order.
    pub fn walk<F>(&self, roots: &[NodeId], mut visit: F)
    where
        F: FnMut(&Node) -> Walk,
    {
        for root in roots {
            self.walk_node(*root, &mut visit);
        }
    }

    fn walk_node<F>(&self, id: NodeId, visit: &mut F)
    where
        F: FnMut(&Node) -> Walk,
    {
        let Some(node) = self.node(id) else {
            return;
        };

        if visit(node) == Walk::Continue {
            for child in node.children() {
                self.walk_node(*child, visit);
            }
        }
    }
}
