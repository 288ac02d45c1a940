//! Prelude module for Trellis.
//!
//! ```ignore
//! use trellis::prelude::*;
//! ```

// ============================================================================
// Store and Signals
// ============================================================================

pub use crate::{
    ConnectionGuard, PropertyDescriptor, PropertySchema, PropertyStore, Signal, StoreEvent,
    TrellisError, ValueFormat,
};

// ============================================================================
// Controls
// ============================================================================

pub use crate::control::{
    BoundControl, ComboboxControl, ControlBinding, ControlContext, ControlGuard,
    OptionControl, OptionControlBase, OptionEntry, PropertyStages, RenderResult, ValueSetter,
};
pub use crate::params::ControlParams;

// ============================================================================
// Grid and Handles
// ============================================================================

pub use crate::grid::{CellOptions, Grid, GridLayout, HorizontalAlign, Spans, VerticalAlign};
pub use crate::handle::{Handle, LabelHandle, SelectHandle};

// ============================================================================
// Collaborators
// ============================================================================

pub use crate::accessibility::{AriaIdAllocator, SequentialIds};
pub use crate::i18n::{Catalog, Identity, Translate};
