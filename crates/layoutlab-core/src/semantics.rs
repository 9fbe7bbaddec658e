/// High‑level semantic role of a view, similar to ARIA roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Text,
    Heading,
    TextField,
    Image,
    List,
    Grid,
    Tab,
}

/// Shape of a list or grid, independent of how many items are composed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollectionInfo {
    pub rows: usize,
    pub columns: usize,
    pub item_count: usize,
}

/// Semantics attached to a `View`. Hit-testing, focus and tree dumps read
/// these; there is no OS accessibility bridge.
#[derive(Clone, Debug, PartialEq)]
pub struct Semantics {
    pub role: Role,
    pub label: Option<String>,
    pub focused: bool,
    pub enabled: bool,
    pub selected: bool,
    pub collection: Option<CollectionInfo>,
}

impl Semantics {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            label: None,
            focused: false,
            enabled: true,
            selected: false,
            collection: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn collection(mut self, info: CollectionInfo) -> Self {
        self.collection = Some(info);
        self
    }
}
