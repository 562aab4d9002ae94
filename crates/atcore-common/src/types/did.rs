//! DID identifiers (§3, §4.4).
//!
//! Unlike the flat `Did<'d>(CowStr<'d>)` wrapper this is adapted from, ATProto
//! callers need the method, method-specific identifier, fragment, and query
//! broken apart (did:key decoding in particular needs the identifier on its
//! own). This type decomposes eagerly at parse time and caches the
//! normalized string for `Display`/serialization.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::IdentError;
use crate::types::varint;

/// DID method, restricted to the three ATProto recognizes (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DidMethod {
    Plc,
    Web,
    Key,
}

impl DidMethod {
    fn as_str(self) -> &'static str {
        match self {
            DidMethod::Plc => "plc",
            DidMethod::Web => "web",
            DidMethod::Key => "key",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "plc" => Some(Self::Plc),
            "web" => Some(Self::Web),
            "key" => Some(Self::Key),
            _ => None,
        }
    }
}

impl fmt::Display for DidMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `did:...?key=value` query parameter. Bare keys (no `=`) map to `Flag`,
/// matching the "bare keys map to boolean true" rule in §4.4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    String(SmolStr),
    Flag,
}

static METHOD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9]+$").unwrap());
static PLC_IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z2-7]{24}$").unwrap());
static LDH_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$").unwrap());
static IDENTIFIER_CHAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z0-9._:-]|%[0-9A-Fa-f]{2})*$").unwrap());

/// Multicodec code for a P-256 (ES256) compressed public key.
const MULTICODEC_P256: u64 = 0x1200;
/// Multicodec code for a secp256k1 (ES256K) compressed public key.
const MULTICODEC_SECP256K1: u64 = 0xe7;

/// A did:key identifier, decoded into its JOSE algorithm tag and raw
/// compressed public-key bytes (§4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DidKey {
    pub jwt_alg: &'static str,
    pub key_bytes: Vec<u8>,
}

impl DidKey {
    /// Decode a did:key method-specific identifier (without the `did:key:` prefix).
    fn decode(identifier: &str) -> Result<Self, IdentError> {
        let decoded = crate::types::multibase::decode(identifier)
            .map(|(_, bytes)| bytes)
            .map_err(|_| IdentError::InvalidIdentifier(identifier.into()))?;
        let (code, key_bytes) = varint::decode(&decoded)
            .map_err(|_| IdentError::InvalidIdentifier(identifier.into()))?;
        let jwt_alg = match code {
            MULTICODEC_P256 => "ES256",
            MULTICODEC_SECP256K1 => "ES256K",
            _ => return Err(IdentError::InvalidIdentifier(identifier.into())),
        };
        Ok(Self {
            jwt_alg,
            key_bytes: key_bytes.to_vec(),
        })
    }

    /// Format `{jwt_alg, key_bytes}` back into a did:key method-specific
    /// identifier (the inverse of [`DidKey::decode`]).
    pub fn to_identifier(&self) -> Result<SmolStr, IdentError> {
        let code = match self.jwt_alg {
            "ES256" => MULTICODEC_P256,
            "ES256K" => MULTICODEC_SECP256K1,
            other => return Err(IdentError::InvalidIdentifier(other.into())),
        };
        let mut bytes = varint::encode(code);
        bytes.extend_from_slice(&self.key_bytes);
        crate::types::multibase::encode('z', &bytes)
            .map(Into::into)
            .map_err(|_| IdentError::InvalidIdentifier("did:key".into()))
    }
}

/// A parsed, decomposed DID (§3, §4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Did {
    s: SmolStr,
    method: DidMethod,
    identifier: SmolStr,
    fragment: Option<SmolStr>,
    query: Vec<(SmolStr, QueryValue)>,
}

impl Did {
    /// Parse and normalize a DID string per §4.4.
    pub fn parse(s: &str) -> Result<Self, IdentError> {
        let rest = s
            .strip_prefix("did:")
            .ok_or_else(|| IdentError::InvalidDid(s.into()))?;

        let (method_str, after_method) = rest
            .split_once(':')
            .ok_or_else(|| IdentError::InvalidDid(s.into()))?;
        let method_lower: SmolStr = method_str.to_ascii_lowercase().into();
        if !METHOD_RE.is_match(&method_lower) {
            return Err(IdentError::InvalidDid(s.into()));
        }
        let method = DidMethod::parse(&method_lower)
            .ok_or_else(|| IdentError::UnsupportedMethod(method_lower.clone()))?;

        let (before_fragment, fragment) = match after_method.split_once('#') {
            Some((a, b)) => (a, Some(b)),
            None => (after_method, None),
        };
        let (identifier_str, query_str) = match before_fragment.split_once('?') {
            Some((a, b)) => (a, Some(b)),
            None => (before_fragment, None),
        };

        if identifier_str.is_empty() || identifier_str.ends_with(':') {
            return Err(IdentError::InvalidIdentifier(identifier_str.into()));
        }
        if !IDENTIFIER_CHAR_RE.is_match(identifier_str) {
            return Err(IdentError::InvalidIdentifier(identifier_str.into()));
        }

        let identifier = Self::validate_and_normalize(method, identifier_str)?;

        let query = query_str
            .map(parse_query)
            .transpose()?
            .unwrap_or_default();

        let mut normalized = format!("did:{method}:{identifier}");
        if let Some(q) = query_str {
            normalized.push('?');
            normalized.push_str(q);
        }
        if let Some(f) = fragment {
            normalized.push('#');
            normalized.push_str(f);
        }

        Ok(Self {
            s: normalized.into(),
            method,
            identifier,
            fragment: fragment.map(Into::into),
            query,
        })
    }

    /// Parse `s` and return just its normalized string form.
    pub fn normalize(s: &str) -> Result<SmolStr, IdentError> {
        Ok(Self::parse(s)?.s)
    }

    fn validate_and_normalize(
        method: DidMethod,
        identifier: &str,
    ) -> Result<SmolStr, IdentError> {
        match method {
            DidMethod::Plc => {
                let lower = identifier.to_ascii_lowercase();
                if !PLC_IDENTIFIER_RE.is_match(&lower) {
                    return Err(IdentError::InvalidIdentifier(identifier.into()));
                }
                Ok(lower.into())
            }
            DidMethod::Web => {
                let mut segments = identifier.split(':');
                let domain = segments.next().unwrap_or_default();
                if domain.len() > 253 || domain.is_empty() {
                    return Err(IdentError::InvalidIdentifier(identifier.into()));
                }
                for label in domain.split('.') {
                    if !LDH_LABEL_RE.is_match(label) {
                        return Err(IdentError::InvalidIdentifier(identifier.into()));
                    }
                }
                let domain_lower = domain.to_ascii_lowercase();
                let rest: Vec<&str> = segments.collect();
                if rest.is_empty() {
                    Ok(domain_lower.into())
                } else {
                    Ok(format!("{domain_lower}:{}", rest.join(":")).into())
                }
            }
            DidMethod::Key => {
                DidKey::decode(identifier)?;
                Ok(identifier.into())
            }
        }
    }

    pub fn method(&self) -> DidMethod {
        self.method
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn query(&self) -> &[(SmolStr, QueryValue)] {
        &self.query
    }

    pub fn as_str(&self) -> &str {
        &self.s
    }

    /// Decode this DID's did:key identifier, if its method is `key`.
    pub fn as_did_key(&self) -> Result<DidKey, IdentError> {
        if self.method != DidMethod::Key {
            return Err(IdentError::UnsupportedMethod(self.method.to_string().into()));
        }
        DidKey::decode(&self.identifier)
    }
}

fn parse_query(s: &str) -> Result<Vec<(SmolStr, QueryValue)>, IdentError> {
    if s.is_empty() {
        return Ok(Vec::new());
    }
    s.split('&')
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => Ok((k.into(), QueryValue::String(v.into()))),
            None => Ok((pair.into(), QueryValue::Flag)),
        })
        .collect()
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.s)
    }
}

impl std::str::FromStr for Did {
    type Err = IdentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.s
    }
}

impl Serialize for Did {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.s)
    }
}

impl<'de> Deserialize<'de> for Did {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plc_did() {
        let did = Did::parse("did:plc:44ybard66vv44zksje25o7dz").unwrap();
        assert_eq!(did.method(), DidMethod::Plc);
        assert_eq!(did.identifier(), "44ybard66vv44zksje25o7dz");
        assert_eq!(did.as_str(), "did:plc:44ybard66vv44zksje25o7dz");
    }

    #[test]
    fn normalizes_case_per_component() {
        let normalized =
            Did::normalize("DID:WEB:EXAMPLE.COM?VERSION=1#KEY1").unwrap();
        assert_eq!(normalized, "did:web:example.com?VERSION=1#KEY1");
    }

    #[test]
    fn rejects_missing_prefix() {
        assert!(Did::parse("plc:44ybard66vv44zksje25o7dz").is_err());
    }

    #[test]
    fn rejects_unsupported_method() {
        assert!(matches!(
            Did::parse("did:example:123"),
            Err(IdentError::UnsupportedMethod(_))
        ));
    }

    #[test]
    fn rejects_trailing_colon() {
        assert!(Did::parse("did:web:example.com:").is_err());
    }

    #[test]
    fn web_identifier_preserves_path_case() {
        let did = Did::parse("did:web:example.com:Path:To:Resource").unwrap();
        assert_eq!(did.identifier(), "example.com:Path:To:Resource");
    }

    #[test]
    fn query_parses_bare_keys_as_flags() {
        let did = Did::parse("did:web:example.com?a=1&b").unwrap();
        assert_eq!(
            did.query(),
            &[
                ("a".into(), QueryValue::String("1".into())),
                ("b".into(), QueryValue::Flag),
            ]
        );
    }

    #[test]
    fn did_key_round_trips() {
        // multicodec 0x1200 (P-256) varint-encoded as [0x80, 0x24].
        let key = DidKey {
            jwt_alg: "ES256",
            key_bytes: vec![0x02; 33],
        };
        let identifier = key.to_identifier().unwrap();
        let did = Did::parse(&format!("did:key:{identifier}")).unwrap();
        let decoded = did.as_did_key().unwrap();
        assert_eq!(decoded.jwt_alg, "ES256");
        assert_eq!(decoded.key_bytes, key.key_bytes);
    }

    #[test]
    fn did_key_rejects_non_key_method() {
        let did = Did::parse("did:plc:44ybard66vv44zksje25o7dz").unwrap();
        assert!(did.as_did_key().is_err());
    }
}
