//! Backend implementations for the render module
//!
//! The trace backend records every device call for inspection; concrete GPU
//! backends plug in behind the same [`crate::render::RenderDevice`] trait.

/// Recording backend used by tests and headless runs
pub mod trace;

pub use trace::{DeviceEvent, TraceDevice};
