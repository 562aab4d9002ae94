//! Content identifiers (§3, §4.3).
//!
//! `Cid` is an owned, cheaply-cloned string wrapper — CIDs never cross this
//! crate's public API as raw bytes (§6). Unlike the zero-copy `Cid<'c>` this
//! crate is extracted from, this type always owns its string: CIDs here are
//! either freshly computed (`from_data`) or short parse results, not borrowed
//! from a long-lived input buffer, so the extra lifetime parameter buys
//! nothing and was dropped.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use smol_str::SmolStr;

use crate::error::CidError;
use crate::types::varint;

/// CID version, per §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CidVersion {
    V0,
    V1,
}

const MULTICODEC_DAG_PB: u64 = 0x70;
const MULTICODEC_DAG_CBOR: u64 = 0x71;
const MULTICODEC_RAW: u64 = 0x55;
const MULTICODEC_SHA2_256: u64 = 0x12;

fn multicodec_code(tag: &str) -> Option<u64> {
    match tag {
        "dag-pb" => Some(MULTICODEC_DAG_PB),
        "dag-cbor" => Some(MULTICODEC_DAG_CBOR),
        "raw" => Some(MULTICODEC_RAW),
        _ => None,
    }
}

fn codec_for_multicodec(code: u64) -> Option<&'static str> {
    match code {
        MULTICODEC_DAG_PB => Some("dag-pb"),
        MULTICODEC_DAG_CBOR => Some("dag-cbor"),
        MULTICODEC_RAW => Some("raw"),
        _ => None,
    }
}

/// Decode a CIDv1's actual codec out of its multibase-decoded bytes
/// (`varint(version) || varint(codec) || multihash`), rather than assuming
/// one from the multibase prefix alone.
fn decode_v1_codec(s: &str) -> Result<SmolStr, CidError> {
    let (_, bytes) = multibase::decode(s).map_err(|_| CidError::InvalidFormat(s.into()))?;
    let (version, rest) =
        varint::decode(&bytes).map_err(|_| CidError::InvalidFormat(s.into()))?;
    if version != 1 {
        return Err(CidError::InvalidFormat(s.into()));
    }
    let (codec_code, _) = varint::decode(rest).map_err(|_| CidError::InvalidFormat(s.into()))?;
    codec_for_multicodec(codec_code)
        .map(SmolStr::new)
        .ok_or_else(|| CidError::InvalidCid(s.into()))
}

/// A content identifier, stored in its original string form (§3).
///
/// Equality is by string form, matching the spec's lifecycle note.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Cid {
    s: SmolStr,
    version: CidVersion,
    codec: SmolStr,
    multibase: SmolStr,
}

impl Cid {
    /// Parse a CID string per the dispatch rules in §4.3.
    pub fn parse(s: &str) -> Result<Self, CidError> {
        if s.len() == 46 && s.starts_with("Qm") {
            return Ok(Self {
                s: s.into(),
                version: CidVersion::V0,
                codec: "dag-pb".into(),
                multibase: "base58btc".into(),
            });
        }
        if let Some(tail) = s.strip_prefix('b') {
            if !tail.is_empty() && tail.chars().all(|c| matches!(c, 'a'..='z' | '2'..='7')) {
                return Ok(Self {
                    s: s.into(),
                    version: CidVersion::V1,
                    codec: decode_v1_codec(s)?,
                    multibase: "base32".into(),
                });
            }
        }
        if let Some(tail) = s.strip_prefix('z') {
            if !tail.is_empty()
                && tail
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() && c != '0' && c != 'O' && c != 'I' && c != 'l')
            {
                return Ok(Self {
                    s: s.into(),
                    version: CidVersion::V1,
                    codec: decode_v1_codec(s)?,
                    multibase: "base58btc".into(),
                });
            }
        }
        Err(CidError::InvalidFormat(s.into()))
    }

    /// Compute a CIDv1 over `data` with the given codec tag (`dag-cbor`,
    /// `dag-pb`, or `raw`), base32-encoded with a `b` prefix (§4.3).
    pub fn from_data(data: &[u8], codec: &str) -> Result<Self, CidError> {
        let codec_code =
            multicodec_code(codec).ok_or_else(|| CidError::InvalidCid(codec.into()))?;
        let digest = Sha256::digest(data);

        let mut multihash = Vec::with_capacity(2 + digest.len());
        multihash.extend(varint::encode(MULTICODEC_SHA2_256));
        multihash.extend(varint::encode(digest.len() as u64));
        multihash.extend_from_slice(&digest);

        let mut cid_bytes = Vec::with_capacity(2 + multihash.len());
        cid_bytes.extend(varint::encode(1)); // CID version 1
        cid_bytes.extend(varint::encode(codec_code));
        cid_bytes.extend(multihash);

        let s = multibase::encode(multibase::Base::Base32Lower, &cid_bytes);
        Ok(Self {
            s: s.into(),
            version: CidVersion::V1,
            codec: codec.into(),
            multibase: "base32".into(),
        })
    }

    /// Compute a blob CID: `from_data` with codec `raw` (§4.3).
    pub fn from_blob_data(data: &[u8]) -> Self {
        Self::from_data(data, "raw").expect("raw is always a valid codec")
    }

    pub fn version(&self) -> CidVersion {
        self.version
    }

    pub fn codec(&self) -> &str {
        &self.codec
    }

    pub fn multibase(&self) -> &str {
        &self.multibase
    }

    pub fn as_str(&self) -> &str {
        &self.s
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.s)
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({})", self.s)
    }
}

impl std::str::FromStr for Cid {
    type Err = CidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Cid {
    fn as_ref(&self) -> &str {
        &self.s
    }
}

impl Serialize for Cid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.s)
    }
}

impl<'de> Deserialize<'de> for Cid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// An IPLD `$link` reference: serializes as `{"$link": "<cid>"}` in JSON and
/// as a bare CID string elsewhere, matching the DAG-JSON/DAG-CBOR duality
/// ATProto records use for CID-typed fields.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct CidLink {
    #[serde(rename = "$link")]
    pub link: SmolStr,
}

impl CidLink {
    pub fn new(cid: &Cid) -> Self {
        Self {
            link: cid.as_str().into(),
        }
    }

    pub fn cid(&self) -> Result<Cid, CidError> {
        Cid::parse(&self.link)
    }
}

impl From<&Cid> for CidLink {
    fn from(cid: &Cid) -> Self {
        Self::new(cid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_cidv0() {
        let s = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";
        let cid = Cid::parse(s).unwrap();
        assert_eq!(cid.version(), CidVersion::V0);
        assert_eq!(cid.codec(), "dag-pb");
        assert_eq!(cid.to_string(), s);
    }

    #[test]
    fn round_trips_cidv1_base32() {
        let s = "bafyreie5cvv4h45feadgeuwhbcutmh6t2ceseocckahdoe6uat64zmz454";
        let cid = Cid::parse(s).unwrap();
        assert_eq!(cid.version(), CidVersion::V1);
        assert_eq!(cid.multibase(), "base32");
        assert_eq!(cid.to_string(), s);
    }

    #[test]
    fn round_trips_cidv1_base58btc() {
        let computed = Cid::from_data(b"hello", "dag-cbor").unwrap();
        let (_, raw) = multibase::decode(computed.as_str()).unwrap();
        let base58 = multibase::encode(multibase::Base::Base58Btc, &raw);
        let parsed = Cid::parse(&base58).unwrap();
        assert_eq!(parsed.multibase(), "base58btc");
        assert_eq!(parsed.to_string(), base58);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Cid::parse("not a cid").is_err());
        assert!(Cid::parse("").is_err());
    }

    #[test]
    fn content_addressing_is_deterministic() {
        let a = Cid::from_data(b"some bytes", "dag-cbor").unwrap();
        let b = Cid::from_data(b"some bytes", "dag-cbor").unwrap();
        assert_eq!(a, b);
        let c = Cid::from_data(b"other bytes", "dag-cbor").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn blob_cid_uses_raw_codec() {
        let cid = Cid::from_blob_data(b"blob bytes");
        assert_eq!(cid.codec(), "raw");
    }

    #[test]
    fn parse_recovers_the_actual_codec_not_just_dag_cbor() {
        let raw = Cid::from_data(b"raw block", "raw").unwrap();
        let parsed = Cid::parse(raw.as_str()).unwrap();
        assert_eq!(parsed.codec(), "raw");
        assert_eq!(parsed, raw);

        let dag_pb = Cid::from_data(b"dag-pb block", "dag-pb").unwrap();
        let parsed = Cid::parse(dag_pb.as_str()).unwrap();
        assert_eq!(parsed.codec(), "dag-pb");
        assert_eq!(parsed, dag_pb);
    }

    #[test]
    fn link_round_trips_through_json() {
        let cid = Cid::from_data(b"link test", "dag-cbor").unwrap();
        let link = CidLink::new(&cid);
        let json = serde_json::to_string(&link).unwrap();
        assert!(json.contains("$link"));
        let back: CidLink = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cid().unwrap(), cid);
    }
}
