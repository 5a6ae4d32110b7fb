#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    /// The default layer has none and always sorts first.
    pub sort_index: Option<i32>,
    pub persistent_id: Option<u64>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sort_index: None,
            persistent_id: None,
        }
    }

    pub fn with_sort_index(mut self, sort_index: i32) -> Self {
        self.sort_index = Some(sort_index);
        self
    }
}
