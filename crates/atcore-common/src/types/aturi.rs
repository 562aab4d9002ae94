//! AT-URIs (§4.6).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de::Error};
use smol_str::SmolStr;

use crate::error::IdentError;
use crate::types::ident::AtIdentifier;
use crate::types::nsid::Nsid;
use crate::types::recordkey::RecordKey;

const MAX_URI_LEN: usize = 8192;

/// The collection and optional record key following the authority (§4.6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriPath {
    pub collection: Nsid,
    pub rkey: Option<RecordKey>,
}

/// A parsed `at://` URI (§3, §4.6).
#[derive(Clone, PartialEq, Eq)]
pub struct AtUri {
    s: SmolStr,
    authority: AtIdentifier,
    path: Option<UriPath>,
    fragment: Option<SmolStr>,
}

impl AtUri {
    /// Parse an `at://` URI per §4.6's dispatch order: strip scheme, pull off
    /// a trailing `#fragment`, then split the path into authority / collection
    /// / rkey.
    pub fn parse(s: &str) -> Result<Self, IdentError> {
        if s.len() > MAX_URI_LEN {
            return Err(IdentError::UriTooLong {
                max: MAX_URI_LEN,
                actual: s.len(),
            });
        }
        let rest = s
            .strip_prefix("at://")
            .ok_or_else(|| IdentError::InvalidFormat(s.into()))?;

        let (before_fragment, fragment) = match rest.split_once('#') {
            Some((a, b)) => (a, Some(b)),
            None => (rest, None),
        };

        let mut segments = before_fragment.splitn(3, '/');
        let authority_str = segments.next().filter(|s| !s.is_empty());
        let authority = AtIdentifier::parse(
            authority_str.ok_or(IdentError::MissingAuthority)?,
        )?;

        let path = match segments.next() {
            Some(collection_str) if !collection_str.is_empty() => {
                let collection = Nsid::new(collection_str)
                    .map_err(|_| IdentError::InvalidCollection(collection_str.into()))?;
                let rkey = match segments.next() {
                    Some(rkey_str) if !rkey_str.is_empty() => {
                        Some(RecordKey::new(rkey_str)?)
                    }
                    _ => None,
                };
                Some(UriPath { collection, rkey })
            }
            _ => None,
        };

        Ok(Self {
            s: s.into(),
            authority,
            path,
            fragment: fragment.map(Into::into),
        })
    }

    pub fn authority(&self) -> &AtIdentifier {
        &self.authority
    }

    pub fn collection(&self) -> Option<&Nsid> {
        self.path.as_ref().map(|p| &p.collection)
    }

    pub fn rkey(&self) -> Option<&RecordKey> {
        self.path.as_ref().and_then(|p| p.rkey.as_ref())
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn as_str(&self) -> &str {
        &self.s
    }
}

impl fmt::Display for AtUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.s)
    }
}

impl fmt::Debug for AtUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtUri({})", self.s)
    }
}

impl FromStr for AtUri {
    type Err = IdentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for AtUri {
    fn as_ref(&self) -> &str {
        &self.s
    }
}

impl Serialize for AtUri {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.s)
    }
}

impl<'de> Deserialize<'de> for AtUri {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_uri() {
        let uri =
            AtUri::parse("at://did:plc:44ybard66vv44zksje25o7dz/app.bsky.feed.post/3jwdwj2ctlk26")
                .unwrap();
        assert_eq!(
            uri.authority().as_str(),
            "did:plc:44ybard66vv44zksje25o7dz"
        );
        assert_eq!(uri.collection().unwrap().as_str(), "app.bsky.feed.post");
        assert_eq!(uri.rkey().unwrap().as_str(), "3jwdwj2ctlk26");
        assert_eq!(
            uri.as_str(),
            "at://did:plc:44ybard66vv44zksje25o7dz/app.bsky.feed.post/3jwdwj2ctlk26"
        );
    }

    #[test]
    fn parses_authority_only() {
        let uri = AtUri::parse("at://alice.bsky.social").unwrap();
        assert!(uri.collection().is_none());
        assert!(uri.rkey().is_none());
    }

    #[test]
    fn parses_with_fragment() {
        let uri = AtUri::parse("at://alice.bsky.social#/foo").unwrap();
        assert_eq!(uri.fragment().unwrap(), "/foo");
    }

    #[test]
    fn rejects_missing_scheme() {
        assert!(AtUri::parse("did:plc:44ybard66vv44zksje25o7dz").is_err());
    }

    #[test]
    fn rejects_missing_authority() {
        assert!(AtUri::parse("at://").is_err());
    }

    #[test]
    fn rejects_too_long() {
        let long = format!("at://alice.bsky.social/{}", "a".repeat(MAX_URI_LEN));
        assert!(AtUri::parse(&long).is_err());
    }
}
