//! RepCount Common Utilities
//!
//! Shared infrastructure for all RepCount crates:
//! - Error types and result aliases
//! - Session clock and frame pacing utilities
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
