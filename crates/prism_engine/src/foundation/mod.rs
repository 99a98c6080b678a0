//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the renderer:
//! - Math types and operations
//! - Geometric primitives for culling
//! - Time management
//! - Logging utilities

pub mod geometry;
pub mod logging;
pub mod math;
pub mod time;
