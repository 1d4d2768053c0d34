//! Error types for LaneMap.

use thiserror::Error;

/// Result type alias using LaneMapError.
pub type Result<T> = std::result::Result<T, LaneMapError>;

/// Errors that can occur in LaneMap operations.
///
/// Lookup misses are not errors; they are ordinary `false`/`None` results.
#[derive(Debug, Error)]
pub enum LaneMapError {
    // Value storage errors
    #[error("value buffer allocation failed: {bytes} bytes")]
    ValueBufferAlloc { bytes: usize },

    // B-tree errors
    #[error("tree corrupted: {0}")]
    TreeCorrupted(String),

    // Configuration errors
    #[error("invalid parameter: {name} = {value}")]
    InvalidParameter { name: String, value: String },
}
