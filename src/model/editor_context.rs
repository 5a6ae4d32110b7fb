use super::{queries::find_containing_group, NodeId, NodeKind, Scene};

/// View filters plus the rules deciding what can be picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorContext {
    pub show_point_entities: bool,
    pub show_brushes: bool,
    pub show_patches: bool,
}

impl Default for EditorContext {
    fn default() -> Self {
        Self {
            show_point_entities: true,
            show_brushes: true,
            show_patches: true,
        }
    }
}

impl EditorContext {
    pub fn visible(&self, scene: &Scene, id: NodeId) -> bool {
        let Some(node) = scene.node(id) else {
            return false;
        };

        let shown = match node.kind() {
            NodeKind::Entity(_) if !node.has_children() => self.show_point_entities,
            NodeKind::Brush(_) => self.show_brushes,
            NodeKind::Patch(_) => self.show_patches,
            _ => true,
        };

        shown && scene.visible(id)
    }

    pub fn editable(&self, scene: &Scene, id: NodeId) -> bool {
        scene.contains(id) && !scene.locked(id)
    }

    fn in_open_group(&self, scene: &Scene, id: NodeId) -> bool {
        find_containing_group(scene, id)
            .and_then(|group| scene.group(group))
            .map_or(true, |group| group.opened())
    }

    pub fn selectable(&self, scene: &Scene, id: NodeId) -> bool {
        let Some(node) = scene.node(id) else {
            return false;
        };

        match node.kind() {
            NodeKind::World(_) | NodeKind::Layer(_) => false,
            NodeKind::Group(group) => {
                group.closed()
                    && self.visible(scene, id)
                    && self.editable(scene, id)
                    && self.in_open_group(scene, id)
            }
            // brush entities are selected through their brushes
            NodeKind::Entity(_) if node.has_children() => false,
            NodeKind::Entity(_) | NodeKind::Brush(_) | NodeKind::Patch(_) => {
                self.visible(scene, id) && self.editable(scene, id) && self.in_open_group(scene, id)
            }
        }
    }

    pub fn selectable_face(&self, scene: &Scene, id: NodeId, face_index: usize) -> bool {
        scene
            .brush(id)
            .is_some_and(|brush| face_index < brush.face_count())
            && self.visible(scene, id)
            && self.editable(scene, id)
            && self.in_open_group(scene, id)
    }
}
