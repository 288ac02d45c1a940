//! Trellis - binds option controls to property stores.
//!
//! A control reads its configuration and logical value from a
//! [`PropertyStore`], renders handles into a [`GridLayout`](grid::GridLayout),
//! and keeps the two in step: user choices write the store through a
//! [`ValueSetter`](control::ValueSetter), store changes update the display.
//!
//! This is the umbrella crate; it re-exports `trellis-core`.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use trellis::prelude::*;
//!
//! let params = ControlParams::from_json(
//!     r#"{"name": "colour", "value": "red", "label": "Colour", "options": ["red", "blue"]}"#,
//! )?;
//! let bound = BoundControl::new(ComboboxControl::from_params(params, ControlContext::default())?);
//!
//! let mut grid = Grid::new();
//! bound.render(&mut grid, 0, 0)?;
//!
//! let input = bound.control().lock().input_handle().unwrap();
//! input.choose(1);
//! assert_eq!(bound.control().lock().base().source_value(), json!("blue"));
//! # Ok::<(), trellis::TrellisError>(())
//! ```

pub use trellis_core::*;

pub mod accessibility;
pub mod control;
pub mod grid;
pub mod handle;
pub mod i18n;
pub mod params;
pub mod prelude;
