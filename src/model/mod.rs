//! Scene graph of a map document and the algorithms working on it.

mod brush;
mod editor_context;
mod entity;
mod group;
mod hit_type;
mod layer;
pub mod linked_group;
mod node;
mod patch;
pub mod queries;
mod scene;
pub mod selection;

#[cfg(test)]
pub(crate) mod test_utils;

pub use brush::{Brush, BrushFace, FaceAttributes};
pub use editor_context::EditorContext;
pub use entity::{is_numbered_property, is_protected_key, Entity, EntityProperty};
pub use group::{Group, GroupEditState};
pub use hit_type::{node_hit_type, HitType};
pub use layer::Layer;
pub use linked_group::{update_link_set, update_linked_groups, UpdateLinkedGroupsResult};
pub use node::{LockState, Node, NodeId, NodeKind, NodeTree, VisibilityState};
pub use patch::Patch;
pub use scene::{Scene, Walk};
pub use selection::{
    face_selection_with_linked_group_constraints, node_selection_with_linked_group_constraints,
    BrushFaceHandle, FaceSelectionResult, LinkSetIndex, SelectionResult,
};
