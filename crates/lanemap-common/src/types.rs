//! Key and value types stored by the multimap.

/// Key type. Keys are fixed-width signed integers, unique across the tree.
pub type MapKey = i32;

/// Value type. One key maps to zero or more values, duplicates preserved.
pub type MapValue = i32;
