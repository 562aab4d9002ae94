//! The Merkle Search Tree: an ordered map from string key to CID value,
//! realised as a content-addressed multi-layer tree (§3, §4.8).
//!
//! Callers are guaranteed the flat ordered-map semantics (`add`/`get`/
//! `delete`/`list`); the multi-layer node layout existing underneath is
//! purely to produce a stable, content-addressed `pointer` CID for each
//! subtree — it is rebuilt from the flat view on every mutation rather than
//! maintained incrementally, since this crate is purely functional and does
//! not need to match the canonical implementation's exact splice sequence
//! (§9 Open Questions, resolved).

pub mod node;
pub mod util;

use atcore_common::Cid;
use smol_str::SmolStr;

use self::node::{NodeData, NodeEntry};
use crate::error::MstError;

/// Pluggable, synchronous content-addressed block storage for MST nodes.
/// Ordinary `Result`-returning methods, not futures — nothing in this crate
/// requires a runtime (§5).
pub trait NodeStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>, Self::Error>;
    fn put(&mut self, cid: &Cid, data: Vec<u8>) -> Result<(), Self::Error>;
}

/// A Merkle Search Tree node: an ordered, interleaved list of leaves and
/// subtrees, sorted by key.
#[derive(Debug, Clone, Default)]
pub struct Mst {
    entries: Vec<NodeEntry>,
}

impl Mst {
    /// The empty tree.
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Insert or replace `key`'s value (§4.8 `add`).
    pub fn add(&self, key: &str, value: &Cid) -> Result<Self, MstError> {
        util::validate_key(key)?;
        let mut flat = self.flatten();
        match flat.binary_search_by(|(k, _)| k.as_str().cmp(key)) {
            Ok(i) => flat[i].1 = value.clone(),
            Err(i) => flat.insert(i, (key.into(), value.clone())),
        }
        tracing::debug!(key, entries = flat.len(), "mst add");
        Ok(Self::from_flat(flat))
    }

    /// Look up `key`'s value, if present (§4.8 `get`).
    pub fn get(&self, key: &str) -> Option<Cid> {
        let flat = self.flatten();
        flat.binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|i| flat[i].1.clone())
    }

    /// Remove `key`, erroring if it is not present (§4.8 `delete`).
    pub fn delete(&self, key: &str) -> Result<Self, MstError> {
        let mut flat = self.flatten();
        let i = flat
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .map_err(|_| MstError::KeyNotFound { key: key.into() })?;
        flat.remove(i);
        Ok(Self::from_flat(flat))
    }

    /// Emit all entries in ascending key order (§4.8 `list`).
    pub fn list(&self) -> Vec<(SmolStr, Cid)> {
        self.flatten()
    }

    /// True if the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Walk the tree in order, collecting every `(key, value)` pair.
    fn flatten(&self) -> Vec<(SmolStr, Cid)> {
        let mut out = Vec::new();
        Self::flatten_into(&self.entries, &mut out);
        out
    }

    fn flatten_into(entries: &[NodeEntry], out: &mut Vec<(SmolStr, Cid)>) {
        for entry in entries {
            match entry {
                NodeEntry::Tree(subtree) => Self::flatten_into(&subtree.entries, out),
                NodeEntry::Leaf { key, value } => out.push((key.clone(), value.clone())),
            }
        }
    }

    /// Rebuild the multi-layer tree from a sorted, deduplicated flat list.
    /// `key_depth` per §4.8 places each key; entries deeper than the current
    /// layer are grouped into a subtree between the surrounding entries at
    /// this layer.
    fn from_flat(flat: Vec<(SmolStr, Cid)>) -> Self {
        if flat.is_empty() {
            return Self::empty();
        }
        let depths: Vec<usize> = flat
            .iter()
            .map(|(k, _)| util::calculate_key_depth(k))
            .collect();
        let top_layer = *depths.iter().max().unwrap();
        Self::build_layer(&flat, &depths, top_layer)
    }

    fn build_layer(flat: &[(SmolStr, Cid)], depths: &[usize], layer: usize) -> Self {
        let mut entries = Vec::new();
        let mut group_start = 0usize;

        let mut flush_group = |start: usize, end: usize, entries: &mut Vec<NodeEntry>| {
            if start < end {
                let subtree = Self::build_layer(&flat[start..end], &depths[start..end], layer - 1);
                entries.push(NodeEntry::Tree(Box::new(subtree)));
            }
        };

        for i in 0..flat.len() {
            if depths[i] == layer {
                flush_group(group_start, i, &mut entries);
                entries.push(NodeEntry::Leaf {
                    key: flat[i].0.clone(),
                    value: flat[i].1.clone(),
                });
                group_start = i + 1;
            }
        }
        flush_group(group_start, flat.len(), &mut entries);

        Self { entries }
    }

    /// Serialize this node (recursively persisting every subtree first) and
    /// return its content-addressed CID, writing every visited block to
    /// `store`.
    pub fn persist<S: NodeStore>(&self, store: &mut S) -> Result<Cid, MstError> {
        let mut subtree_cids = Vec::new();
        for entry in &self.entries {
            if let NodeEntry::Tree(subtree) = entry {
                subtree_cids.push(subtree.persist(store)?);
            }
        }
        let data = node::to_node_data(&self.entries, &subtree_cids);
        let bytes = serde_ipld_dagcbor::to_vec(&data)
            .map_err(|e| MstError::Serialization(Box::new(e)))?;
        let cid = Cid::from_data(&bytes, "dag-cbor")
            .map_err(|e| MstError::InvalidNode(e.to_string()))?;
        store
            .put(&cid, bytes)
            .map_err(|e| MstError::Store(Box::new(e)))?;
        tracing::trace!(cid = %cid, entries = self.entries.len(), "persisted mst node");
        Ok(cid)
    }

    /// Load a tree rooted at `cid` out of `store`, recursively loading every
    /// subtree it references.
    pub fn load<S: NodeStore>(store: &S, cid: &Cid) -> Result<Self, MstError> {
        tracing::trace!(cid = %cid, "loading mst node");
        let bytes = store
            .get(cid)
            .map_err(|e| MstError::Store(Box::new(e)))?
            .ok_or_else(|| MstError::NotFound(cid.as_str().into()))?;
        let data: NodeData = serde_ipld_dagcbor::from_slice(&bytes)
            .map_err(|e| MstError::Serialization(Box::new(e)))?;
        Self::from_node_data(store, &data)
    }

    fn from_node_data<S: NodeStore>(store: &S, data: &NodeData) -> Result<Self, MstError> {
        let mut entries = Vec::new();
        if let Some(left) = &data.left {
            let left_cid = Cid::parse(left).map_err(|e| MstError::InvalidNode(e.to_string()))?;
            entries.push(NodeEntry::Tree(Box::new(Self::load(store, &left_cid)?)));
        }
        for decoded in node::decode_entries(data)? {
            let value_cid =
                Cid::parse(&decoded.value).map_err(|e| MstError::InvalidNode(e.to_string()))?;
            entries.push(NodeEntry::Leaf {
                key: decoded.key,
                value: value_cid,
            });
            if let Some(tree) = &decoded.tree {
                let tree_cid = Cid::parse(tree).map_err(|e| MstError::InvalidNode(e.to_string()))?;
                entries.push(NodeEntry::Tree(Box::new(Self::load(store, &tree_cid)?)));
            }
        }
        Ok(Self { entries })
    }
}

/// A non-persisting [`NodeStore`] backed by an in-memory map, useful for
/// tests and for computing a root CID without writing blocks anywhere.
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    blocks: std::collections::HashMap<SmolStr, Vec<u8>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&self, cid: &Cid) -> Option<&[u8]> {
        self.blocks.get(cid.as_str()).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl NodeStore for MemoryNodeStore {
    type Error = std::convert::Infallible;

    fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.blocks.get(cid.as_str()).cloned())
    }

    fn put(&mut self, cid: &Cid, data: Vec<u8>) -> Result<(), Self::Error> {
        self.blocks.insert(cid.as_str().into(), data);
        Ok(())
    }
}
