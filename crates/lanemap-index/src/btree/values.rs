//! Cache-line granular value storage for key records.

use lanemap_common::error::{LaneMapError, Result};
use lanemap_common::types::MapValue;

use super::constants::{LINE_SIZE, VALUES_PER_LINE, VALUE_BYTES};

/// Owning buffer for the values attached to one key.
///
/// Capacity only ever changes in whole cache-line increments, so the
/// allocated byte length stays a multiple of [`LINE_SIZE`] and iteration
/// over a key's values streams through full lines. An empty buffer owns no
/// heap allocation; the first append allocates exactly one line. Growth is
/// linear, one line per refill, trading reallocation count for footprint
/// under the expected pattern of many keys with modest value counts.
#[derive(Debug, Default)]
pub(crate) struct ValueBuf {
    vals: Vec<MapValue>,
}

impl ValueBuf {
    /// Appends a value in insertion order.
    ///
    /// Grows the buffer by one cache line when the remaining headroom is
    /// below one value's width. A failed growth leaves the buffer untouched
    /// and reports [`LaneMapError::ValueBufferAlloc`].
    pub(crate) fn push(&mut self, value: MapValue) -> Result<()> {
        let taken = self.vals.len() * VALUE_BYTES;
        let alloced = self.vals.capacity() * VALUE_BYTES;
        debug_assert_eq!(alloced % LINE_SIZE, 0);
        if alloced - taken < VALUE_BYTES {
            self.vals
                .try_reserve_exact(VALUES_PER_LINE)
                .map_err(|_| LaneMapError::ValueBufferAlloc {
                    bytes: alloced + LINE_SIZE,
                })?;
        }
        self.vals.push(value);
        Ok(())
    }

    /// Number of stored values.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.vals.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.vals.is_empty()
    }

    /// Allocated byte length of the backing buffer.
    #[inline]
    pub(crate) fn allocated_bytes(&self) -> usize {
        self.vals.capacity() * VALUE_BYTES
    }

    /// Linear scan for `value`.
    #[inline]
    pub(crate) fn contains(&self, value: MapValue) -> bool {
        self.vals.iter().any(|&v| v == value)
    }

    /// Stored values in insertion order.
    #[inline]
    pub(crate) fn as_slice(&self) -> &[MapValue] {
        &self.vals
    }
}
