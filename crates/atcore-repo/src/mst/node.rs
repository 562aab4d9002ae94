//! MST node in-memory and wire representations (§4.8).
//!
//! `NodeEntry` is the in-memory flat, interleaved `[Tree?, Leaf, Tree?, Leaf, …]`
//! form MST operations work against. `NodeData`/`TreeEntry` is the
//! prefix-compressed DAG-CBOR wire form a node's bytes are hashed from to
//! obtain its pointer CID.

use atcore_common::Cid;
use smol_str::SmolStr;

use super::Mst;
use crate::error::MstError;

/// One entry in a node's flat, in-memory representation.
#[derive(Debug, Clone)]
pub enum NodeEntry {
    /// A leaf key/value pair.
    Leaf { key: SmolStr, value: Cid },
    /// A subtree one layer below this node.
    Tree(Box<Mst>),
}

/// Wire-format entry: prefix-compressed leaf with an optional following
/// subtree pointer. Field names `k`/`p`/`t`/`v` and explicit-`null` semantics
/// for `t` mirror the corpus's DAG-CBOR node encoding.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TreeEntry {
    #[serde(rename = "k", with = "serde_bytes")]
    pub key_suffix: Vec<u8>,
    #[serde(rename = "p")]
    pub prefix_len: u8,
    #[serde(rename = "t")]
    pub tree: Option<SmolStr>,
    #[serde(rename = "v")]
    pub value: SmolStr,
}

/// Wire-format node: a left-most subtree pointer plus a prefix-compressed
/// entry list, serialized as DAG-CBOR and hashed into this node's CID.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NodeData {
    #[serde(rename = "l")]
    pub left: Option<SmolStr>,
    #[serde(rename = "e")]
    pub entries: Vec<TreeEntry>,
}

/// Convert a flat entry list into the prefix-compressed wire form, given the
/// already-persisted CIDs of any subtrees (in the same order they occur in
/// `entries`).
pub fn to_node_data(entries: &[NodeEntry], subtree_cids: &[Cid]) -> NodeData {
    let mut subtrees = subtree_cids.iter();
    let mut left = None;
    let mut wire_entries: Vec<TreeEntry> = Vec::new();
    let mut prev_key: Option<&str> = None;

    for entry in entries {
        match entry {
            NodeEntry::Tree(_) => {
                let cid = subtrees.next().expect("subtree CID for every Tree entry");
                match wire_entries.last_mut() {
                    // A subtree between the previous leaf and the next one
                    // becomes that leaf's `tree` pointer.
                    Some(last) => last.tree = Some(SmolStr::new(cid.as_str())),
                    // A subtree before any leaf in this node is the `left` pointer.
                    None => left = Some(SmolStr::new(cid.as_str())),
                }
            }
            NodeEntry::Leaf { key, value } => {
                let prefix_len = prev_key.map(|p| super::util::common_prefix_len(p, key)).unwrap_or(0);
                wire_entries.push(TreeEntry {
                    key_suffix: key.as_bytes()[prefix_len..].to_vec(),
                    prefix_len: prefix_len as u8,
                    tree: None,
                    value: SmolStr::new(value.as_str()),
                });
                prev_key = Some(key.as_str());
            }
        }
    }

    NodeData {
        left,
        entries: wire_entries,
    }
}

/// A `TreeEntry` with its full (prefix-decompressed) key.
pub struct DecodedEntry {
    pub key: SmolStr,
    pub value: SmolStr,
    pub tree: Option<SmolStr>,
}

/// Reconstruct full keys from a `NodeData`'s prefix compression.
pub fn decode_entries(node: &NodeData) -> Result<Vec<DecodedEntry>, MstError> {
    let mut out = Vec::with_capacity(node.entries.len());
    let mut prev_key = String::new();
    for (i, entry) in node.entries.iter().enumerate() {
        if entry.prefix_len as usize > prev_key.len() {
            return Err(MstError::InvalidNode(format!(
                "entry {i} prefix_len {} exceeds previous key length {}",
                entry.prefix_len,
                prev_key.len()
            )));
        }
        let mut key = prev_key[..entry.prefix_len as usize].to_string();
        let suffix = std::str::from_utf8(&entry.key_suffix)
            .map_err(|e| MstError::InvalidNode(format!("key suffix is not valid UTF-8: {e}")))?;
        key.push_str(suffix);
        prev_key = key.clone();

        out.push(DecodedEntry {
            key: SmolStr::new(&key),
            value: entry.value.clone(),
            tree: entry.tree.clone(),
        });
    }
    Ok(out)
}
