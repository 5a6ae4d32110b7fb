use glam::DMat4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupEditState {
    #[default]
    Closed,
    Open,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    /// Shared by every copy of a linked group.
    pub linked_group_id: Option<String>,
    /// Transformation applied since the group was created. Only the relative
    /// transformation between two members of a link set has a meaning.
    pub transformation: DMat4,
    /// `_tb_id` in map files.
    pub persistent_id: Option<u64>,
    pub edit_state: GroupEditState,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            linked_group_id: None,
            transformation: DMat4::IDENTITY,
            persistent_id: None,
            edit_state: GroupEditState::Closed,
        }
    }

    pub fn with_linked_group_id(mut self, linked_group_id: impl Into<String>) -> Self {
        self.linked_group_id = Some(linked_group_id.into());
        self
    }

    pub fn with_transformation(mut self, transformation: DMat4) -> Self {
        self.transformation = transformation;
        self
    }

    pub fn is_linked(&self) -> bool {
        self.linked_group_id.is_some()
    }

    pub fn opened(&self) -> bool {
        self.edit_state == GroupEditState::Open
    }

    pub fn closed(&self) -> bool {
        self.edit_state == GroupEditState::Closed
    }

    pub fn open(&mut self) {
        self.edit_state = GroupEditState::Open;
    }

    pub fn close(&mut self) {
        self.edit_state = GroupEditState::Closed;
    }

    /// Copies come back closed and without a persistent id.
    pub fn transformed(&self, transformation: &DMat4) -> Self {
        Self {
            transformation: *transformation * self.transformation,
            edit_state: GroupEditState::Closed,
            persistent_id: None,
            ..self.clone()
        }
    }
}
