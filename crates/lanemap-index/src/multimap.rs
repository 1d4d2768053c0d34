//! Public multimap façade over the B-tree engine.

use lanemap_common::config::IndexParams;
use lanemap_common::error::{LaneMapError, Result};
use lanemap_common::types::{MapKey, MapValue};

use crate::btree::constants::{FANOUT, LINE_SIZE, VALUE_BYTES};
use crate::btree::node::{KeyRecord, Node};

/// Integer multimap backed by a cache-conscious B-tree.
///
/// Each key maps to an ordered bag of values; duplicate pairs are stored as
/// duplicates. Keys live inline in high-fanout tree nodes and each key's
/// values sit in one contiguous, cache-line sized buffer, so both key
/// lookup and per-key value iteration minimize cache-line misses.
///
/// All operations are synchronous and single-threaded; the container is not
/// internally synchronized.
pub struct Multimap {
    root: Option<Box<Node>>,
}

impl Multimap {
    /// Creates an empty multimap. The root node is allocated lazily on the
    /// first insert.
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Inserts the `(key, value)` pair, creating the key record if absent.
    ///
    /// Duplicate pairs are stored as duplicates. The only fallible step is
    /// growing the key's value buffer; on failure the tree is left in a
    /// consistent state and the pair is not stored.
    pub fn add_value(&mut self, key: MapKey, value: MapValue) -> Result<()> {
        let record = self.find_or_create(key);
        debug_assert_eq!(record.key, key);
        record.values.push(value)
    }

    /// Returns true iff any value has been added for `key`.
    pub fn contains_key(&self, key: MapKey) -> bool {
        self.find(key).is_some_and(|rec| !rec.values.is_empty())
    }

    /// Returns true iff the `(key, value)` pair has been added: key lookup
    /// followed by a linear scan of that key's value buffer.
    pub fn contains_pair(&self, key: MapKey, value: MapValue) -> bool {
        self.find(key).is_some_and(|rec| rec.values.contains(value))
    }

    /// Delivers every stored pair to `visit`, keys ascending and values in
    /// insertion order within a key.
    pub fn traverse<F: FnMut(MapKey, MapValue)>(&self, mut visit: F) {
        if let Some(root) = self.root.as_deref() {
            traverse_node(root, &mut visit);
        }
    }

    /// Releases every node, key record, and value buffer, leaving the
    /// multimap empty and reusable.
    pub fn clear(&mut self) {
        // Dropping the root tears the ownership tree down post-order.
        self.root = None;
    }

    /// Total number of stored pairs, by full walk.
    pub fn len(&self) -> usize {
        let mut pairs = 0;
        self.traverse(|_, _| pairs += 1);
        pairs
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct keys holding at least one value.
    pub fn key_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            let mut keys = node.records[..node.n_keys]
                .iter()
                .filter(|rec| !rec.values.is_empty())
                .count();
            if !node.is_leaf {
                for child in &node.children[..=node.n_keys] {
                    keys += count(child.as_deref().expect("non-leaf child missing"));
                }
            }
            keys
        }
        self.root.as_deref().map_or(0, count)
    }

    /// Tree height: 0 for an empty tree, 1 while the root is the sole leaf.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = self.root.as_deref();
        while let Some(n) = node {
            depth += 1;
            node = if n.is_leaf {
                None
            } else {
                n.children[0].as_deref()
            };
        }
        depth
    }

    /// Effective tuning parameters of this index.
    pub fn params(&self) -> IndexParams {
        IndexParams {
            fanout: FANOUT,
            line_size: LINE_SIZE,
        }
    }

    /// Walks the whole tree verifying structural invariants: the fanout
    /// bound, strictly increasing keys, subtree separation, child arity,
    /// uniform leaf depth, absence of stale slots, and value-buffer sizing.
    ///
    /// Diagnostic aid; the first violation found is reported as
    /// [`LaneMapError::TreeCorrupted`].
    pub fn check_consistency(&self) -> Result<()> {
        let Some(root) = self.root.as_deref() else {
            return Ok(());
        };
        let mut leaf_depth = None;
        check_node(root, None, None, 1, &mut leaf_depth)
    }

    /// Read-only descent to the record holding `key`.
    fn find(&self, key: MapKey) -> Option<&KeyRecord> {
        let mut node = self.root.as_deref()?;
        loop {
            let pos = node.search_slot(key);
            if pos < node.n_keys && node.records[pos].key == key {
                return Some(&node.records[pos]);
            }
            if node.is_leaf {
                return None;
            }
            node = node.children[pos]
                .as_deref()
                .expect("non-leaf child missing");
        }
    }

    /// Descends to the record holding `key`, creating it in a leaf if
    /// absent. Any full node on the path is split before it is entered, so
    /// the leaf insert always has room and a promoted separator always fits
    /// one level up.
    fn find_or_create(&mut self, key: MapKey) -> &mut KeyRecord {
        // First insert allocates the root leaf.
        if self.root.is_none() {
            let mut root = Node::alloc(true);
            root.insert_record(0, key);
            return &mut self.root.insert(root).records[0];
        }

        // A full root is split under a fresh root before the descent; this
        // is the only place tree height increases.
        if matches!(self.root.as_deref(), Some(root) if root.is_full()) {
            let old_root = self.root.take().expect("root checked above");
            let mut new_root = Node::alloc(false);
            new_root.children[0] = Some(old_root);
            new_root.split_child(0);
            self.root = Some(new_root);
        }

        let mut node = self
            .root
            .as_deref_mut()
            .expect("root present on insert path");
        loop {
            let pos = node.search_slot(key);
            if pos < node.n_keys && node.records[pos].key == key {
                return &mut node.records[pos];
            }
            if node.is_leaf {
                node.insert_record(pos, key);
                return &mut node.records[pos];
            }
            if node.children[pos]
                .as_deref()
                .expect("non-leaf child missing")
                .is_full()
            {
                node.split_child(pos);
                // Rescan this node: the key may now match the promoted
                // separator or belong in the new sibling.
                continue;
            }
            node = node.children[pos]
                .as_deref_mut()
                .expect("non-leaf child missing");
        }
    }
}

impl Default for Multimap {
    fn default() -> Self {
        Self::new()
    }
}

/// In-order walk: `children[i]` before `records[i]`, trailing child last.
fn traverse_node<F: FnMut(MapKey, MapValue)>(node: &Node, visit: &mut F) {
    for i in 0..node.n_keys {
        if !node.is_leaf {
            traverse_node(
                node.children[i].as_deref().expect("non-leaf child missing"),
                visit,
            );
        }
        let rec = &node.records[i];
        for &value in rec.values.as_slice() {
            visit(rec.key, value);
        }
    }
    if !node.is_leaf {
        traverse_node(
            node.children[node.n_keys]
                .as_deref()
                .expect("non-leaf child missing"),
            visit,
        );
    }
}

/// Recursive invariant check. `lower` is exclusive, `upper` inclusive,
/// matching the search rule that sends a key equal to a separator into the
/// left subtree.
fn check_node(
    node: &Node,
    lower: Option<MapKey>,
    upper: Option<MapKey>,
    depth: usize,
    leaf_depth: &mut Option<usize>,
) -> Result<()> {
    if node.n_keys == 0 {
        return Err(LaneMapError::TreeCorrupted(
            "node holds no key records".to_string(),
        ));
    }
    if node.n_keys > FANOUT {
        return Err(LaneMapError::TreeCorrupted(format!(
            "node holds {} key records, fanout is {}",
            node.n_keys, FANOUT
        )));
    }

    for i in 0..node.n_keys {
        let rec = &node.records[i];
        if i > 0 && node.records[i - 1].key >= rec.key {
            return Err(LaneMapError::TreeCorrupted(format!(
                "keys not strictly increasing at key {}",
                rec.key
            )));
        }
        if lower.is_some_and(|lo| rec.key <= lo) || upper.is_some_and(|hi| rec.key > hi) {
            return Err(LaneMapError::TreeCorrupted(format!(
                "key {} escapes its subtree bounds",
                rec.key
            )));
        }
        if !rec.values.is_empty() {
            let alloced = rec.values.allocated_bytes();
            if alloced == 0 || alloced % LINE_SIZE != 0 || alloced < rec.values.len() * VALUE_BYTES
            {
                return Err(LaneMapError::TreeCorrupted(format!(
                    "value buffer of key {} violates line sizing: {} bytes for {} values",
                    rec.key,
                    alloced,
                    rec.values.len()
                )));
            }
        }
    }
    if node.records[node.n_keys..]
        .iter()
        .any(|rec| !rec.values.is_empty())
    {
        return Err(LaneMapError::TreeCorrupted(
            "stale value buffer beyond live records".to_string(),
        ));
    }

    if node.is_leaf {
        if node.children.iter().any(Option::is_some) {
            return Err(LaneMapError::TreeCorrupted(
                "leaf node carries child handles".to_string(),
            ));
        }
        match *leaf_depth {
            None => *leaf_depth = Some(depth),
            Some(expected) if expected != depth => {
                return Err(LaneMapError::TreeCorrupted(format!(
                    "leaf at depth {}, expected {}",
                    depth, expected
                )));
            }
            Some(_) => {}
        }
    } else {
        for i in 0..=node.n_keys {
            let child = node.children[i].as_deref().ok_or_else(|| {
                LaneMapError::TreeCorrupted(format!("missing child {} of internal node", i))
            })?;
            let lo = if i == 0 {
                lower
            } else {
                Some(node.records[i - 1].key)
            };
            let hi = if i == node.n_keys {
                upper
            } else {
                Some(node.records[i].key)
            };
            check_node(child, lo, hi, depth + 1, leaf_depth)?;
        }
        if node.children[node.n_keys + 1..].iter().any(Option::is_some) {
            return Err(LaneMapError::TreeCorrupted(
                "stale child handle beyond live arity".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(mm: &Multimap) -> Vec<(MapKey, MapValue)> {
        let mut out = Vec::new();
        mm.traverse(|k, v| out.push((k, v)));
        out
    }

    #[test]
    fn test_empty_multimap() {
        let mm = Multimap::new();
        assert!(!mm.contains_key(7));
        assert!(!mm.contains_pair(7, 0));
        assert!(mm.is_empty());
        assert_eq!(mm.depth(), 0);
        assert_eq!(pairs(&mm), vec![]);
        mm.check_consistency().unwrap();
    }

    #[test]
    fn test_single_pair() {
        let mut mm = Multimap::new();
        mm.add_value(5, 100).unwrap();
        assert!(mm.contains_key(5));
        assert!(mm.contains_pair(5, 100));
        assert!(!mm.contains_pair(5, 101));
        assert!(!mm.contains_key(4));
        assert_eq!(mm.depth(), 1);
        assert_eq!(pairs(&mm), vec![(5, 100)]);
        mm.check_consistency().unwrap();
    }

    #[test]
    fn test_duplicate_pairs_preserved() {
        let mut mm = Multimap::new();
        mm.add_value(5, 1).unwrap();
        mm.add_value(5, 1).unwrap();
        mm.add_value(5, 2).unwrap();
        assert_eq!(pairs(&mm), vec![(5, 1), (5, 1), (5, 2)]);
        assert!(mm.contains_pair(5, 1));
        assert_eq!(mm.len(), 3);
        assert_eq!(mm.key_count(), 1);
    }

    #[test]
    fn test_root_split_structure() {
        // FANOUT keys fill the root leaf; one more forces the first split
        // and the root becomes internal with the middle key promoted.
        let mut mm = Multimap::new();
        for key in 1..=(FANOUT as MapKey + 1) {
            mm.add_value(key, 0).unwrap();
        }

        let mid = FANOUT / 2;
        let root = mm.root.as_deref().unwrap();
        assert!(!root.is_leaf);
        assert_eq!(root.n_keys, 1);
        assert_eq!(root.records[0].key, (mid + 1) as MapKey);
        assert_eq!(root.children[0].as_deref().unwrap().n_keys, mid);
        assert_eq!(root.children[1].as_deref().unwrap().n_keys, FANOUT - mid);

        assert_eq!(mm.depth(), 2);
        assert_eq!(mm.len(), FANOUT + 1);
        mm.check_consistency().unwrap();

        let expected: Vec<_> = (1..=(FANOUT as MapKey + 1)).map(|k| (k, 0)).collect();
        assert_eq!(pairs(&mm), expected);
    }

    #[test]
    fn test_lookup_finds_promoted_separator() {
        let mut mm = Multimap::new();
        for key in 1..=(FANOUT as MapKey + 1) {
            mm.add_value(key, key * 10).unwrap();
        }
        // The separator now lives in the root; both lookup paths must agree.
        let sep = (FANOUT / 2 + 1) as MapKey;
        assert!(mm.contains_pair(sep, sep * 10));
        mm.add_value(sep, -1).unwrap();
        assert!(mm.contains_pair(sep, -1));
        mm.check_consistency().unwrap();
    }

    #[test]
    fn test_descending_insertion_sorted_traversal() {
        let mut mm = Multimap::new();
        for key in (1..=10).rev() {
            mm.add_value(key, key).unwrap();
        }
        let expected: Vec<_> = (1..=10).map(|k| (k, k)).collect();
        assert_eq!(pairs(&mm), expected);
    }

    #[test]
    fn test_clear_leaves_reusable_handle() {
        let mut mm = Multimap::new();
        for key in 0..100 {
            mm.add_value(key, key).unwrap();
        }
        mm.clear();
        assert!(mm.is_empty());
        assert_eq!(mm.depth(), 0);
        mm.clear(); // idempotent
        assert_eq!(pairs(&mm), vec![]);

        mm.add_value(1, 2).unwrap();
        assert!(mm.contains_pair(1, 2));
    }

    #[test]
    fn test_params_report_compiled_constants() {
        let mm = Multimap::new();
        let params = mm.params();
        assert_eq!(params.fanout, FANOUT);
        assert_eq!(params.line_size, LINE_SIZE);
        params.validate().unwrap();
    }

    #[test]
    fn test_check_consistency_flags_unsorted_keys() {
        let mut mm = Multimap::new();
        mm.add_value(1, 0).unwrap();
        mm.add_value(2, 0).unwrap();
        // Corrupt the root directly.
        mm.root.as_deref_mut().unwrap().records[0].key = 9;
        let err = mm.check_consistency().unwrap_err();
        assert!(matches!(err, LaneMapError::TreeCorrupted(_)));
    }
}
