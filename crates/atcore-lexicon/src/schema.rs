//! The runtime schema vocabulary a [`crate::validate`] call dispatches on (§4.11).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

/// A lexicon schema node. Mirrors the `Lex*` vocabulary's field names
/// (`minLength`, `maxLength`, `required`, `properties`, `items`, …) but is
/// shaped for runtime validation of arbitrary JSON rather than codegen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Schema {
    Null,
    Boolean,
    Integer {
        #[serde(skip_serializing_if = "Option::is_none")]
        minimum: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        maximum: Option<i64>,
        #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
        enum_values: Option<Vec<i64>>,
    },
    String {
        #[serde(skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_graphemes: Option<usize>,
        #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
        enum_values: Option<Vec<SmolStr>>,
    },
    Object {
        #[serde(default)]
        required: Vec<SmolStr>,
        #[serde(default)]
        properties: BTreeMap<SmolStr, Schema>,
    },
    Array {
        items: Box<Schema>,
        #[serde(skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    Unknown,
    Bytes,
    #[serde(rename = "cid-link")]
    CidLink,
    Blob,
    Const {
        value: Value,
    },
}

/// A full lexicon document envelope (§3, §6): `{lexicon, id, defs: {main, …}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconDoc {
    pub lexicon: u32,
    pub id: SmolStr,
    pub defs: BTreeMap<SmolStr, Schema>,
}

impl LexiconDoc {
    /// The top-level schema supplied by `defs.main`.
    pub fn main(&self) -> Option<&Schema> {
        self.defs.get("main")
    }
}
