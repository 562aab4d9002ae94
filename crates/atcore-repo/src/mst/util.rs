//! Key validation and layer placement for the MST (§4.8).

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::MstError;

const MAX_KEY_LEN: usize = 256;

// MST keys are composite `collection/rkey` strings, unlike the bare
// `RecordKey` grammar used for AT-URI rkeys, so the `/` separator is part of
// the allowed character class here.
static KEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._:~/-]+$").unwrap());

/// Validate an MST key per the corpus's `collection/rkey` composite grammar.
pub fn validate_key(key: &str) -> Result<(), MstError> {
    if key.is_empty() {
        return Err(MstError::EmptyKey);
    }
    if key.len() > MAX_KEY_LEN {
        return Err(MstError::KeyTooLong {
            len: key.len(),
            max: MAX_KEY_LEN,
        });
    }
    if !KEY_RE.is_match(key) {
        return Err(MstError::InvalidKeyChars { key: key.into() });
    }
    Ok(())
}

/// Depth at which `key` is placed: leading zero bits of SHA-256(key), divided
/// by two (~4-way fanout per layer), per §4.8.
pub fn calculate_key_depth(key: &str) -> usize {
    let digest = Sha256::digest(key.as_bytes());
    let mut leading_zero_bits = 0usize;
    for byte in digest.iter() {
        if *byte == 0 {
            leading_zero_bits += 8;
            continue;
        }
        leading_zero_bits += byte.leading_zeros() as usize;
        break;
    }
    leading_zero_bits / 2
}

/// Number of leading bytes `a` and `b` share.
pub fn common_prefix_len(a: &str, b: &str) -> usize {
    a.as_bytes()
        .iter()
        .zip(b.as_bytes())
        .take_while(|(x, y)| x == y)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_composite_keys() {
        assert!(validate_key("app.bsky.feed.post/3jwdwj2ctlk26").is_ok());
    }

    #[test]
    fn rejects_empty_key() {
        assert!(matches!(validate_key(""), Err(MstError::EmptyKey)));
    }

    #[test]
    fn rejects_invalid_chars() {
        assert!(matches!(
            validate_key("app.bsky.feed.post#bad"),
            Err(MstError::InvalidKeyChars { .. })
        ));
    }

    #[test]
    fn rejects_too_long() {
        let key = format!("a/{}", "b".repeat(MAX_KEY_LEN));
        assert!(matches!(
            validate_key(&key),
            Err(MstError::KeyTooLong { .. })
        ));
    }

    #[test]
    fn depth_is_deterministic() {
        let a = calculate_key_depth("app.bsky.feed.post/test");
        let b = calculate_key_depth("app.bsky.feed.post/test");
        assert_eq!(a, b);
    }

    #[test]
    fn common_prefix_len_matches_shared_bytes() {
        assert_eq!(common_prefix_len("abcdef", "abcxyz"), 3);
        assert_eq!(common_prefix_len("abc", "xyz"), 0);
        assert_eq!(common_prefix_len("abc", "abc"), 3);
    }
}
