//! Changes to a scene applied as one step.
//!
//! Every edit validates all of its input before touching the scene and hands
//! back what is needed to revert it.

mod linked_groups;
mod node_contents;
mod selection;
mod visibility;

pub use linked_groups::{apply_linked_group_update, propagate_changes, propagate_link_set};
pub use node_contents::swap_node_contents;
pub use selection::{
    reselect_with_linked_group_constraints, select_faces_with_linked_group_constraints,
    select_with_linked_group_constraints, AppliedFaceSelection, AppliedSelection,
};
pub use visibility::{
    restore_lock_state, restore_visibility, set_lock_state, set_visibility, VisibilityAction,
};
