//! Tuning-parameter introspection for the LaneMap index.

use crate::error::{LaneMapError, Result};
use crate::types::MapValue;
use serde::{Deserialize, Serialize};

/// Effective tuning parameters of a multimap index.
///
/// Both values are fixed at compile time in the index crate; this struct
/// reports them for diagnostics and configuration snapshots. Changing either
/// one changes performance only, never observable semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexParams {
    /// Maximum number of key records per B-tree node.
    pub fanout: usize,
    /// Cache line size in bytes; value buffers grow in whole lines.
    pub line_size: usize,
}

impl IndexParams {
    /// Checks the documented constraints: `fanout` must be at least 2 and
    /// `line_size` a positive multiple of the value width.
    pub fn validate(&self) -> Result<()> {
        if self.fanout < 2 {
            return Err(LaneMapError::InvalidParameter {
                name: "fanout".to_string(),
                value: self.fanout.to_string(),
            });
        }
        let width = std::mem::size_of::<MapValue>();
        if self.line_size == 0 || self.line_size % width != 0 {
            return Err(LaneMapError::InvalidParameter {
                name: "line_size".to_string(),
                value: self.line_size.to_string(),
            });
        }
        Ok(())
    }

    /// Returns the number of values that fit in one cache line.
    pub fn values_per_line(&self) -> usize {
        self.line_size / std::mem::size_of::<MapValue>()
    }

    /// Returns the maximum number of children per node.
    pub fn max_children(&self) -> usize {
        self.fanout + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_production_params() {
        let params = IndexParams {
            fanout: 500,
            line_size: 64,
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_degenerate_fanout() {
        for fanout in [0, 1] {
            let params = IndexParams {
                fanout,
                line_size: 64,
            };
            let err = params.validate().unwrap_err();
            assert!(matches!(
                err,
                LaneMapError::InvalidParameter { ref name, .. } if name == "fanout"
            ));
        }
    }

    #[test]
    fn test_validate_rejects_bad_line_size() {
        for line_size in [0, 3, 65] {
            let params = IndexParams {
                fanout: 4,
                line_size,
            };
            let err = params.validate().unwrap_err();
            assert!(matches!(
                err,
                LaneMapError::InvalidParameter { ref name, .. } if name == "line_size"
            ));
        }
    }

    #[test]
    fn test_values_per_line() {
        let params = IndexParams {
            fanout: 500,
            line_size: 64,
        };
        // 64-byte lines with 4-byte values
        assert_eq!(params.values_per_line(), 16);
    }

    #[test]
    fn test_max_children() {
        let params = IndexParams {
            fanout: 4,
            line_size: 64,
        };
        assert_eq!(params.max_children(), 5);
    }

    #[test]
    fn test_clone_copy() {
        let p1 = IndexParams {
            fanout: 500,
            line_size: 64,
        };
        let p2 = p1; // Copy
        let p3 = p1.clone(); // Clone
        assert_eq!(p1, p2);
        assert_eq!(p1, p3);
    }

    #[test]
    fn test_serde_roundtrip() {
        let original = IndexParams {
            fanout: 500,
            line_size: 64,
        };
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: IndexParams = serde_json::from_str(&serialized).unwrap();
        assert_eq!(original, deserialized);
    }
}
