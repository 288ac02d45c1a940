//! Logging facilities for Trellis.
//!
//! Trellis uses the `tracing` crate for instrumentation. Nothing is printed
//! unless the application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("trellis_core::store=trace,trellis::control=debug")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Property store reads, writes and notifications.
    pub const STORE: &str = "trellis_core::store";
    /// Signal emission and connection management.
    pub const SIGNAL: &str = "trellis_core::signal";
    /// Control rendering and change synchronization.
    pub const CONTROL: &str = "trellis::control";
    /// Grid cell placement.
    pub const GRID: &str = "trellis::grid";
}

/// Span names used around the render and sync paths.
pub mod span_names {
    /// A control rendering itself into a grid.
    pub const RENDER: &str = "trellis::render";
    /// A control re-synchronizing its handles with the store.
    pub const SYNC: &str = "trellis::sync";
}
