//! B-tree tuning constants.

use lanemap_common::types::MapValue;

/// Maximum number of key records per node; maximum children is `FANOUT + 1`.
///
/// High fanout keeps the tree shallow (height stays under 5 up to around a
/// billion keys) and makes the linear intra-node scan the hot loop. Lowering
/// it changes performance only, never semantics.
pub const FANOUT: usize = 500;

/// Cache line size in bytes. Value buffers are allocated in whole lines.
pub const LINE_SIZE: usize = 64;

/// Width of one stored value in bytes.
pub(crate) const VALUE_BYTES: usize = std::mem::size_of::<MapValue>();

/// Number of values that fit in one cache line.
pub(crate) const VALUES_PER_LINE: usize = LINE_SIZE / VALUE_BYTES;

// A fanout below 2 breaks the split discipline; a line must hold whole values.
const _: () = assert!(FANOUT >= 2);
const _: () = assert!(LINE_SIZE > 0 && LINE_SIZE % VALUE_BYTES == 0);
