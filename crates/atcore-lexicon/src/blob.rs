//! Blob references: metadata for binary data stored outside the repo (§2 L2 Records).

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::LazyLock;

use atcore_common::{Cid, CidLink};
use regex::Regex;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::LexiconError;

static MIME_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9!#$&\-^_.+]*/[A-Za-z0-9!#$&\-^_.+*]+$").unwrap());

/// A MIME type string, e.g. `image/png` or the wildcard form `image/*`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MimeType(SmolStr);

impl MimeType {
    pub fn new(mime_type: &str) -> Result<Self, LexiconError> {
        if !MIME_TYPE_RE.is_match(mime_type) {
            return Err(LexiconError::InvalidMimeType(mime_type.into()));
        }
        Ok(Self(mime_type.into()))
    }

    pub fn raw(mime_type: &str) -> Self {
        Self::new(mime_type).expect("invalid MIME type")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MimeType {
    type Err = LexiconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for MimeType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MimeType({})", self.0)
    }
}

impl AsRef<str> for MimeType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for MimeType {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

/// A blob reference: a CID pointer to content stored outside the repo, with
/// MIME type and declared size. Serializes as `{$type: "blob", ref: {$link},
/// mimeType, size}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub r#ref: CidLink,
    pub mime_type: MimeType,
    pub size: usize,
}

impl Blob {
    pub fn new(cid: &Cid, mime_type: MimeType, size: usize) -> Self {
        Self {
            r#ref: CidLink::new(cid),
            mime_type,
            size,
        }
    }

    /// Parse a blob envelope out of an arbitrary JSON value, per the
    /// structural error taxonomy (§7): missing/invalid `$type`, `ref`,
    /// `mimeType`, `size`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, LexiconError> {
        let obj = value.as_object().ok_or(LexiconError::MissingType)?;

        match obj.get("$type") {
            Some(serde_json::Value::String(t)) if t == "blob" => {}
            Some(other) => return Err(LexiconError::InvalidType(other.to_string().into())),
            None => return Err(LexiconError::MissingType),
        }

        let ref_value = obj.get("ref").ok_or(LexiconError::MissingRef)?;
        let link = ref_value
            .get("$link")
            .and_then(|v| v.as_str())
            .ok_or_else(|| LexiconError::InvalidRef(ref_value.to_string().into()))?;
        let cid = Cid::parse(link).map_err(|_| LexiconError::InvalidRef(link.into()))?;
        if cid.codec() != "raw" {
            return Err(LexiconError::InvalidRef(link.into()));
        }

        let mime_type = obj
            .get("mimeType")
            .and_then(|v| v.as_str())
            .ok_or_else(|| LexiconError::InvalidMimeType("".into()))?;
        let mime_type = MimeType::new(mime_type)?;

        let size = obj
            .get("size")
            .ok_or(LexiconError::MissingSize)?
            .as_u64()
            .ok_or(LexiconError::InvalidSize)? as usize;

        Ok(Self {
            r#ref: CidLink::new(&cid),
            mime_type,
            size,
        })
    }

    /// Check the blob's declared size against a caller-supplied limit.
    pub fn validate_size(&self, limit: usize) -> Result<(), LexiconError> {
        if self.size > limit {
            return Err(LexiconError::SizeExceeded { limit });
        }
        Ok(())
    }
}

impl Serialize for Blob {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("$type", "blob")?;
        map.serialize_entry("ref", &self.r#ref)?;
        map.serialize_entry("mimeType", self.mime_type.as_str())?;
        map.serialize_entry("size", &self.size)?;
        map.end()
    }
}
