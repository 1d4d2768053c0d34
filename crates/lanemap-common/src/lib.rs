//! LaneMap common types, errors, and utilities.
//!
//! This crate provides shared definitions used across all LaneMap components.

pub mod config;
pub mod error;
pub mod types;

pub use config::IndexParams;
pub use error::{LaneMapError, Result};
pub use types::{MapKey, MapValue};
