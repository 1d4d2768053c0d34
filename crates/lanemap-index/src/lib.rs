//! Multimap index engine for LaneMap.
//!
//! This crate provides:
//! - Fixed-capacity B-tree node storage with inline key records
//! - A top-down search/insert engine with proactive splitting
//! - Cache-line granular per-key value buffers
//! - The public [`Multimap`] façade

mod btree;
mod multimap;

pub use btree::constants::{FANOUT, LINE_SIZE};
pub use multimap::Multimap;
