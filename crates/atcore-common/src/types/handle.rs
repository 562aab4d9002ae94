//! Handles: domain-shaped human-facing identifiers (§4.6 authority rule).

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, de::Error};
use smol_str::SmolStr;

use crate::error::IdentError;

pub static HANDLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$").unwrap()
});

/// Reserved TLDs a handle's domain may not end in, per the reserved/test
/// namespaces in RFC 2606 and IANA's special-use registry.
const DISALLOWED_TLDS: &[&str] = &[
    ".alt",
    ".arpa",
    ".example",
    ".internal",
    ".invalid",
    ".local",
    ".localhost",
    ".onion",
];

fn ends_with_disallowed_tld(handle: &str) -> bool {
    let lower = handle.to_ascii_lowercase();
    DISALLOWED_TLDS.iter().any(|tld| lower.ends_with(tld))
}

/// An AT Protocol handle (§3, domain-shaped LDH labels).
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Handle(SmolStr);

impl Handle {
    /// Validate a handle, stripping a leading `at://` or `@` if present.
    pub fn new(handle: &str) -> Result<Self, IdentError> {
        let stripped = handle.strip_prefix("at://").unwrap_or(handle);
        let handle = stripped.strip_prefix('@').unwrap_or(stripped);
        if handle.len() > 253 {
            return Err(IdentError::TooLong {
                max: 253,
                actual: handle.len(),
            });
        }
        if !HANDLE_REGEX.is_match(handle) {
            return Err(IdentError::InvalidHandle(handle.into()));
        }
        if ends_with_disallowed_tld(handle) {
            return Err(IdentError::InvalidHandle(handle.into()));
        }
        Ok(Self(handle.into()))
    }

    pub fn raw(handle: &str) -> Self {
        Self::new(handle).expect("invalid handle")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Handle {
    type Err = IdentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for Handle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(D::Error::custom)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

impl From<Handle> for String {
    fn from(value: Handle) -> Self {
        value.0.to_string()
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for Handle {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_handles() {
        assert!(Handle::new("alice.bsky.social").is_ok());
        assert!(Handle::new("example.com").is_ok());
    }

    #[test]
    fn strips_prefixes() {
        assert_eq!(Handle::new("@alice.test").unwrap().as_str(), "alice.test");
        assert_eq!(
            Handle::new("at://alice.test").unwrap().as_str(),
            "alice.test"
        );
    }

    #[test]
    fn rejects_too_long() {
        let long = format!("{}.com", "a".repeat(250));
        assert!(Handle::new(&long).is_err());
    }

    #[test]
    fn rejects_disallowed_tld() {
        assert!(Handle::new("alice.test.local").is_err());
        assert!(Handle::new("alice.test.arpa").is_err());
        assert!(Handle::new("alice.test.invalid").is_err());
    }

    #[test]
    fn rejects_single_label() {
        assert!(Handle::new("alice").is_err());
    }
}
