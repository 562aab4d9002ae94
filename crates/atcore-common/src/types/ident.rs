//! `AtIdentifier`: a DID or a handle, wherever either is accepted (§4.6 authority rule).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::IdentError;
use crate::types::did::Did;
use crate::types::handle::Handle;

/// Either a DID or a handle. AT-URI authorities and several other positions
/// in the protocol accept both forms interchangeably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtIdentifier {
    Did(Did),
    Handle(Handle),
}

impl AtIdentifier {
    /// Parse `s` as a DID if it starts with `did:`, otherwise as a handle.
    pub fn parse(s: &str) -> Result<Self, IdentError> {
        if s.starts_with("did:") {
            Ok(Self::Did(Did::parse(s)?))
        } else {
            Ok(Self::Handle(Handle::new(s)?))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Did(d) => d.as_str(),
            Self::Handle(h) => h.as_str(),
        }
    }

    pub fn as_did(&self) -> Option<&Did> {
        match self {
            Self::Did(d) => Some(d),
            Self::Handle(_) => None,
        }
    }

    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            Self::Did(_) => None,
            Self::Handle(h) => Some(h),
        }
    }
}

impl fmt::Display for AtIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AtIdentifier {
    type Err = IdentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for AtIdentifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AtIdentifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
