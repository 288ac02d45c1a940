//! Core systems for Trellis.
//!
//! This crate provides the model side of the Trellis control-binding engine:
//!
//! - **Property Store**: named, schema-checked property values plus the
//!   logical value of one control, with change notification
//! - **Property Schema**: typed descriptors with defaults and validation
//! - **Signal/Slot System**: notification from stores and handles
//! - **Property**: change-tracking value cells used by handles
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use serde_json::json;
//! use trellis_core::{PropertyDescriptor, PropertySchema, PropertyStore, StoreEvent};
//!
//! let schema = PropertySchema::new().with(PropertyDescriptor::option_list("options"))?;
//! let store = PropertyStore::new(schema, "colour");
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let seen_clone = seen.clone();
//! store.changed().connect(move |event| seen_clone.lock().push(event.clone()));
//!
//! store.set("options", json!(["red", "green"]))?;
//! assert_eq!(
//!     seen.lock()[0],
//!     StoreEvent::PropertyChanged { name: "options".into() }
//! );
//! # Ok::<(), trellis_core::TrellisError>(())
//! ```

mod error;
pub mod logging;
pub mod property;
pub mod schema;
pub mod signal;
pub mod store;

pub use error::{Result, TrellisError};
pub use property::Property;
pub use schema::{PropertyDescriptor, PropertyKind, PropertySchema, ValueFormat, Validator};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use store::{PropertyStore, StoreEvent};
