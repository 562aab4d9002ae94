//! Timestamp identifiers (§4.7): 13-character base32-sortable record revisions.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU16, Ordering};

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, de::Error};
use smol_str::SmolStr;

use crate::error::IdentError;

const ALPHABET: &[u8; 32] = b"234567abcdefghijklmnopqrstuvwxyz";
const FIRST_CHAR_ALPHABET: &[u8; 16] = b"234567abcdefghij";
const TID_LEN: usize = 13;
const CLOCK_ID_BITS: u32 = 10;
const CLOCK_ID_MASK: u64 = (1 << CLOCK_ID_BITS) - 1;

fn char_value(c: u8) -> Option<u64> {
    ALPHABET.iter().position(|&b| b == c).map(|p| p as u64)
}

/// A 13-character timestamp identifier, used as a commit `rev` and record key (§3, §4.7).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tid([u8; TID_LEN]);

impl Tid {
    /// Encode a raw `(timestamp_us, clock_id)` pair per §4.7: `v = (timestamp_us << 10) | clock_id`,
    /// emitted as 13 base32-sortable characters, most-significant 5-bit group first.
    pub fn encode(timestamp_us: u64, clock_id: u16) -> Self {
        let v = (timestamp_us << CLOCK_ID_BITS) | (clock_id as u64 & CLOCK_ID_MASK);
        let mut buf = [0u8; TID_LEN];
        for (i, slot) in buf.iter_mut().enumerate() {
            let shift = (TID_LEN - 1 - i) * 5;
            let group = (v >> shift) & 0b11111;
            *slot = ALPHABET[group as usize];
        }
        Self(buf)
    }

    /// Parse and validate a TID string.
    pub fn parse(s: &str) -> Result<Self, IdentError> {
        let bytes = s.as_bytes();
        if bytes.len() != TID_LEN {
            return Err(IdentError::InvalidTid(s.into()));
        }
        if !FIRST_CHAR_ALPHABET.contains(&bytes[0]) {
            return Err(IdentError::InvalidTid(s.into()));
        }
        let mut buf = [0u8; TID_LEN];
        for (i, &b) in bytes.iter().enumerate() {
            if char_value(b).is_none() {
                return Err(IdentError::InvalidTid(s.into()));
            }
            buf[i] = b;
        }
        Ok(Self(buf))
    }

    /// Generate a TID from the current wall-clock time and a random clock identifier.
    pub fn now() -> Self {
        let timestamp_us = chrono::Utc::now().timestamp_micros().max(0) as u64;
        let clock_id = rand::rng().random::<u16>() & CLOCK_ID_MASK as u16;
        Self::encode(timestamp_us, clock_id)
    }

    fn raw_value(&self) -> u64 {
        let mut v = 0u64;
        for &b in &self.0 {
            v = (v << 5) | char_value(b).expect("validated by constructors");
        }
        v
    }

    /// The microsecond timestamp this TID encodes.
    pub fn timestamp_us(&self) -> u64 {
        self.raw_value() >> CLOCK_ID_BITS
    }

    /// The clock identifier this TID encodes.
    pub fn clock_id(&self) -> u16 {
        (self.raw_value() & CLOCK_ID_MASK) as u16
    }

    /// Byte-wise string comparison (§4.7) — equivalent to `Ord` on `Tid` itself
    /// since both compare the same underlying byte array.
    pub fn compare(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).expect("alphabet is ASCII")
    }
}

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tid({})", self.as_str())
    }
}

impl FromStr for Tid {
    type Err = IdentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Tid {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<Tid> for SmolStr {
    fn from(value: Tid) -> Self {
        SmolStr::from(value.as_str())
    }
}

impl Serialize for Tid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Tid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(D::Error::custom)
    }
}

/// Mints strictly increasing `Tid`s for a single repository writer (§4.7).
///
/// Wraps a clock identifier and bumps the low bits when the wall clock has
/// not advanced since the last call, guaranteeing `next(prev) > prev`.
pub struct Ticker {
    clock_id: AtomicU16,
}

impl Ticker {
    pub fn new() -> Self {
        let clock_id = rand::rng().random::<u16>() & CLOCK_ID_MASK as u16;
        Self {
            clock_id: AtomicU16::new(clock_id),
        }
    }

    /// Issue the next `Tid`, guaranteed strictly greater than `prev` if given.
    pub fn next(&self, prev: Option<Tid>) -> Tid {
        let timestamp_us = chrono::Utc::now().timestamp_micros().max(0) as u64;
        let clock_id = self.clock_id.load(Ordering::Relaxed);
        let candidate = Tid::encode(timestamp_us, clock_id);
        match prev {
            Some(prev) if candidate <= prev => {
                let bumped_clock = (clock_id.wrapping_add(1)) & CLOCK_ID_MASK as u16;
                self.clock_id.store(bumped_clock, Ordering::Relaxed);
                let bumped = Tid::encode(prev.timestamp_us(), bumped_clock);
                if bumped > prev {
                    bumped
                } else {
                    Tid::encode(prev.timestamp_us() + 1, bumped_clock)
                }
            }
            _ => candidate,
        }
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_is_thirteen() {
        assert_eq!(Tid::now().as_str().len(), 13);
    }

    #[test]
    fn round_trips_timestamp() {
        let tid = Tid::encode(1_234_567_890, 42);
        assert_eq!(tid.timestamp_us(), 1_234_567_890);
        assert_eq!(tid.clock_id(), 42);
        let parsed = Tid::parse(tid.as_str()).unwrap();
        assert_eq!(parsed.timestamp_us(), 1_234_567_890);
    }

    #[test]
    fn ordering_matches_timestamp_ordering() {
        let a = Tid::encode(100, 0);
        let b = Tid::encode(200, 0);
        assert_eq!(a.compare(&b), std::cmp::Ordering::Less);
        assert!(a.as_str() < b.as_str());
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Tid::parse("short").is_err());
    }

    #[test]
    fn rejects_bad_first_char() {
        let mut tid = Tid::encode(100, 0).as_str().to_string();
        tid.replace_range(0..1, "z");
        assert!(Tid::parse(&tid).is_err());
    }

    #[test]
    fn ticker_guarantees_strict_increase() {
        let ticker = Ticker::new();
        let first = ticker.next(None);
        let mut prev = first;
        for _ in 0..1000 {
            let next = ticker.next(Some(prev));
            assert!(next > prev);
            prev = next;
        }
    }
}
