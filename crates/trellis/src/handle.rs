//! Renderable handles.
//!
//! Handles stand in for the UI-toolkit objects a control produces: a text
//! label and a single-choice select input. The grid that receives a handle
//! owns it; controls keep only weak references and use them to push state
//! updates.
//!
//! A select handle separates *programmatic* selection
//! ([`SelectHandle::set_selected_index`]) from *user* selection
//! ([`SelectHandle::choose`]). Only the latter fires
//! [`activated`](SelectHandle::activated), so a control that mirrors the
//! store onto the handle never feeds its own update back into the store.

use std::sync::Arc;

use trellis_core::{Property, Signal};

/// Class applied to a label whose control is disabled.
pub const DISABLED_TEXT_CLASS: &str = "disabled-text";

/// A text label, optionally describing another handle.
#[derive(Debug)]
pub struct LabelHandle {
    text: Property<String>,
    for_id: String,
    classes: Property<Vec<String>>,
}

impl LabelHandle {
    /// Create a label describing the handle with id `for_id`.
    pub fn new(text: impl Into<String>, for_id: impl Into<String>) -> Self {
        Self {
            text: Property::new(text.into()),
            for_id: for_id.into(),
            classes: Property::new(Vec::new()),
        }
    }

    /// Add a style class at construction.
    pub fn with_class(self, class: impl Into<String>) -> Self {
        self.add_class(class);
        self
    }

    /// The label text.
    pub fn text(&self) -> String {
        self.text.get()
    }

    /// Replace the label text.
    pub fn set_text(&self, text: impl Into<String>) -> bool {
        self.text.set(text.into())
    }

    /// Id of the handle this label describes.
    pub fn for_id(&self) -> &str {
        &self.for_id
    }

    /// Add a style class. Returns `false` if it was already present.
    pub fn add_class(&self, class: impl Into<String>) -> bool {
        let class = class.into();
        if self.has_class(&class) {
            return false;
        }
        let mut classes = self.classes.get();
        classes.push(class);
        self.classes.set(classes)
    }

    /// Remove a style class. Returns `false` if it was not present.
    pub fn remove_class(&self, class: &str) -> bool {
        let mut classes = self.classes.get();
        classes.retain(|c| c != class);
        self.classes.set(classes)
    }

    /// Whether the label carries `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.with(|classes| classes.iter().any(|c| c == class))
    }

    /// All style classes in insertion order.
    pub fn classes(&self) -> Vec<String> {
        self.classes.get()
    }

    /// Whether the label is styled as disabled.
    pub fn is_disabled(&self) -> bool {
        self.has_class(DISABLED_TEXT_CLASS)
    }
}

/// A single-choice select input.
pub struct SelectHandle {
    id: String,
    items: Property<Vec<String>>,
    selected: Property<Option<usize>>,
    disabled: Property<bool>,
    classes: Vec<String>,
    activated: Arc<Signal<usize>>,
}

impl SelectHandle {
    /// Create a select with the given id and item texts, nothing selected.
    pub fn new(id: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            id: id.into(),
            items: Property::new(items),
            selected: Property::new(None),
            disabled: Property::new(false),
            classes: Vec::new(),
            activated: Arc::new(Signal::new()),
        }
    }

    /// Add a style class at construction.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// The accessibility id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Style classes.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Item texts in display order.
    pub fn items(&self) -> Vec<String> {
        self.items.get()
    }

    /// Number of items.
    pub fn item_count(&self) -> usize {
        self.items.with(Vec::len)
    }

    /// Replace all items. The selection is cleared.
    pub fn set_items(&self, items: Vec<String>) {
        self.items.set_silent(items);
        self.selected.set(None);
    }

    /// The selected index, if any.
    pub fn selected_index(&self) -> Option<usize> {
        self.selected.get()
    }

    /// Text of the selected item, if any.
    pub fn selected_text(&self) -> Option<String> {
        let index = self.selected_index()?;
        self.items.with(|items| items.get(index).cloned())
    }

    /// Select an item programmatically. Does not fire `activated`.
    ///
    /// An out-of-range index clears the selection. Returns whether the
    /// selection changed.
    pub fn set_selected_index(&self, index: Option<usize>) -> bool {
        let index = index.filter(|&i| i < self.item_count());
        self.selected.set(index)
    }

    /// Select an item as the user would, firing `activated`.
    ///
    /// Ignored while disabled or when `index` is out of range. Returns
    /// whether the choice was accepted.
    pub fn choose(&self, index: usize) -> bool {
        if self.is_disabled() || index >= self.item_count() {
            return false;
        }
        self.selected.set(Some(index));
        self.activated.emit(index);
        true
    }

    /// Enable or disable user interaction.
    pub fn set_disabled(&self, disabled: bool) -> bool {
        self.disabled.set(disabled)
    }

    /// Whether user interaction is disabled.
    pub fn is_disabled(&self) -> bool {
        self.disabled.get()
    }

    /// Fired with the chosen index when the user picks an item.
    pub fn activated(&self) -> &Arc<Signal<usize>> {
        &self.activated
    }
}

impl std::fmt::Debug for SelectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectHandle")
            .field("id", &self.id)
            .field("items", &self.items.get())
            .field("selected", &self.selected.get())
            .field("disabled", &self.disabled.get())
            .finish()
    }
}

/// A handle handed to a grid cell.
#[derive(Debug, Clone)]
pub enum Handle {
    /// A text label.
    Label(Arc<LabelHandle>),
    /// A select input.
    Select(Arc<SelectHandle>),
}

impl Handle {
    /// The label, if this is one.
    pub fn as_label(&self) -> Option<&Arc<LabelHandle>> {
        match self {
            Self::Label(label) => Some(label),
            Self::Select(_) => None,
        }
    }

    /// The select, if this is one.
    pub fn as_select(&self) -> Option<&Arc<SelectHandle>> {
        match self {
            Self::Select(select) => Some(select),
            Self::Label(_) => None,
        }
    }

    /// Whether both refer to the same UI object.
    pub fn same_as(&self, other: &Handle) -> bool {
        match (self, other) {
            (Self::Label(a), Self::Label(b)) => Arc::ptr_eq(a, b),
            (Self::Select(a), Self::Select(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Arc<LabelHandle>> for Handle {
    fn from(label: Arc<LabelHandle>) -> Self {
        Self::Label(label)
    }
}

impl From<Arc<SelectHandle>> for Handle {
    fn from(select: Arc<SelectHandle>) -> Self {
        Self::Select(select)
    }
}

static_assertions::assert_impl_all!(Handle: Send, Sync);
