//! Record keys (§4.6 rkey rule).

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, de::Error};
use smol_str::SmolStr;

use crate::error::IdentError;

pub static RKEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._~:@!$&'()*+,;=%-]{1,512}$").unwrap());

/// The record key segment of an AT-URI path (§4.6).
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct RecordKey(SmolStr);

impl RecordKey {
    pub fn new(rkey: &str) -> Result<Self, IdentError> {
        if rkey == "." || rkey == ".." {
            return Err(IdentError::InvalidRkey(rkey.into()));
        }
        if !RKEY_REGEX.is_match(rkey) {
            return Err(IdentError::InvalidRkey(rkey.into()));
        }
        Ok(Self(rkey.into()))
    }

    pub fn raw(rkey: &str) -> Self {
        Self::new(rkey).expect("invalid record key")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RecordKey {
    type Err = IdentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for RecordKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(D::Error::custom)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordKey({})", self.0)
    }
}

impl From<RecordKey> for String {
    fn from(value: RecordKey) -> Self {
        value.0.to_string()
    }
}

impl AsRef<str> for RecordKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for RecordKey {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_rkeys() {
        assert!(RecordKey::new("3jwdwj2ctlk26").is_ok());
        assert!(RecordKey::new("self").is_ok());
        assert!(RecordKey::new("a.b-c_d:e~f").is_ok());
    }

    #[test]
    fn rejects_dot_and_dotdot() {
        assert!(RecordKey::new(".").is_err());
        assert!(RecordKey::new("..").is_err());
    }

    #[test]
    fn rejects_empty_and_too_long() {
        assert!(RecordKey::new("").is_err());
        assert!(RecordKey::new(&"a".repeat(513)).is_err());
        assert!(RecordKey::new(&"a".repeat(512)).is_ok());
    }

    #[test]
    fn rejects_disallowed_chars() {
        assert!(RecordKey::new("has space").is_err());
        assert!(RecordKey::new("has/slash").is_err());
    }

    #[test]
    fn accepts_full_grammar_character_set() {
        assert!(RecordKey::new("a@b!c$d&e'f(g)h*i+j,k;l=m%n").is_ok());
    }
}
