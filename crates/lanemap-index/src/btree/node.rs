//! Fixed-capacity B-tree node storage and the split operation.

use lanemap_common::types::MapKey;

use super::constants::FANOUT;
use super::values::ValueBuf;

/// Per-key payload: the key and its owned value buffer.
#[derive(Debug, Default)]
pub(crate) struct KeyRecord {
    pub(crate) key: MapKey,
    pub(crate) values: ValueBuf,
}

impl KeyRecord {
    fn new(key: MapKey) -> Self {
        Self {
            key,
            values: ValueBuf::default(),
        }
    }
}

/// A B-tree node with inline key records and child slots.
///
/// Only the first `n_keys` records are live, and only the first
/// `n_keys + 1` child slots are meaningful (on non-leaf nodes). Records and
/// children are stored inline rather than behind per-slot allocations so
/// the intra-node key scan stays within adjacent cache lines. A node
/// exclusively owns its records, their value buffers, and its children, so
/// teardown is ordinary recursive drop.
pub(crate) struct Node {
    pub(crate) is_leaf: bool,
    pub(crate) n_keys: usize,
    pub(crate) records: [KeyRecord; FANOUT],
    pub(crate) children: [Option<Box<Node>>; FANOUT + 1],
}

impl Node {
    /// Allocates an empty node. The caller decides leaf-ness.
    pub(crate) fn alloc(is_leaf: bool) -> Box<Node> {
        Box::new(Node {
            is_leaf,
            n_keys: 0,
            records: std::array::from_fn(|_| KeyRecord::default()),
            children: std::array::from_fn(|_| None),
        })
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.n_keys == FANOUT
    }

    /// Returns the first index `i` in `[0, n_keys]` with `i == n_keys` or
    /// `key <= records[i].key`.
    ///
    /// A match at the returned slot means the key lives in this node;
    /// otherwise the query continues into `children[i]`. Linear scan: at
    /// this fanout it is branch-predictable and streams the inline keys,
    /// beating binary search on cache behavior.
    #[inline]
    pub(crate) fn search_slot(&self, key: MapKey) -> usize {
        self.records[..self.n_keys]
            .iter()
            .position(|rec| key <= rec.key)
            .unwrap_or(self.n_keys)
    }

    /// Inserts a fresh, empty record for `key` at `pos`, shifting the live
    /// tail right by one. Proactive splitting guarantees the room.
    pub(crate) fn insert_record(&mut self, pos: usize, key: MapKey) {
        assert!(
            self.n_keys < FANOUT,
            "no room for key record; split discipline violated"
        );
        self.records[pos..=self.n_keys].rotate_right(1);
        self.records[pos] = KeyRecord::new(key);
        self.n_keys += 1;
    }

    /// Splits the full child at `children[pos]`, promoting its middle
    /// record into `self` and hanging the new sibling at
    /// `children[pos + 1]`.
    ///
    /// The caller must not itself be full, and must rescan from `self`
    /// afterwards: the query key may now match the promoted separator or
    /// belong in the new sibling.
    pub(crate) fn split_child(&mut self, pos: usize) {
        assert!(
            self.n_keys < FANOUT,
            "cannot push separator into full node; split discipline violated"
        );

        let (separator, younger) = {
            let elder = self.children[pos]
                .as_deref_mut()
                .expect("split target child missing");
            debug_assert!(elder.is_full());

            let mid = elder.n_keys / 2;
            let mut younger = Node::alloc(elder.is_leaf);
            younger.n_keys = elder.n_keys - mid - 1;

            // Move the elder's upper records (and children, when internal)
            // across; taking them leaves the elder's tail slots empty, so
            // no stale handles survive the split.
            for i in 0..younger.n_keys {
                younger.records[i] = std::mem::take(&mut elder.records[mid + 1 + i]);
            }
            if !elder.is_leaf {
                for i in 0..=younger.n_keys {
                    younger.children[i] = elder.children[mid + 1 + i].take();
                }
            }
            let separator = std::mem::take(&mut elder.records[mid]);
            elder.n_keys = mid;
            (separator, younger)
        };

        // Make room in this node, then wire in the separator and sibling.
        self.records[pos..=self.n_keys].rotate_right(1);
        self.records[pos] = separator;
        self.children[pos + 1..=self.n_keys + 1].rotate_right(1);
        self.children[pos + 1] = Some(younger);
        self.n_keys += 1;
    }
}
