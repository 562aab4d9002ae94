//! Namespaced identifiers (§3, §4.5).

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, de::Error};
use smol_str::SmolStr;

use crate::error::IdentError;

// Authority segments (everything before the final `.name`) are lowercase-only
// per §3; only the final `name` segment may contain uppercase letters.
pub static NSID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]([a-z0-9-]{0,61}[a-z0-9])?(\.[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?)+(\.[a-zA-Z][a-zA-Z0-9]{0,62})$").unwrap()
});

/// A namespaced identifier, e.g. `com.example.fooBar` (§3, §4.5).
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Nsid(SmolStr);

impl Nsid {
    pub fn new(nsid: &str) -> Result<Self, IdentError> {
        if nsid.len() > 317 {
            return Err(IdentError::TooLong {
                max: 317,
                actual: nsid.len(),
            });
        }
        if !NSID_REGEX.is_match(nsid) {
            return Err(IdentError::InvalidName(nsid.into()));
        }
        let authority_len = nsid.rfind('.').expect("enforced by regex");
        if authority_len > 253 {
            return Err(IdentError::AuthorityTooLong {
                max: 253,
                actual: authority_len,
            });
        }
        Ok(Self(nsid.into()))
    }

    /// Infallible constructor for strings already known to be valid NSIDs.
    pub fn raw(nsid: &str) -> Self {
        Self::new(nsid).expect("invalid NSID")
    }

    /// Returns the domain authority part (everything before the final `.`).
    pub fn domain_authority(&self) -> &str {
        let split = self.0.rfind('.').expect("enforced by constructor");
        &self.0[..split]
    }

    /// Returns the final segment (the `name`).
    pub fn name(&self) -> &str {
        let split = self.0.rfind('.').expect("enforced by constructor");
        &self.0[split + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Nsid {
    type Err = IdentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for Nsid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(D::Error::custom)
    }
}

impl fmt::Display for Nsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Nsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nsid({})", self.0)
    }
}

impl From<Nsid> for String {
    fn from(value: Nsid) -> Self {
        value.0.to_string()
    }
}

impl From<Nsid> for SmolStr {
    fn from(value: Nsid) -> Self {
        value.0
    }
}

impl AsRef<str> for Nsid {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for Nsid {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}
