//! Shared utilities for reqforge.
//!
//! This crate provides common utilities used across the reqforge workspace:
//! - ULID-based identifier generation
//! - Logging setup with tracing
//! - Millisecond timestamp helpers

pub mod id;
pub mod log;
pub mod time;

pub use id::{IdPrefix, Identifier};
pub use time::now_ms;
