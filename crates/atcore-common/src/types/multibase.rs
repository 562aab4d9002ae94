//! Multibase prefix routing (§4.2).
//!
//! Thin wrapper over the [`multibase`] crate — the teacher already depends on
//! it for exactly this purpose inside its CID type. This module exposes the
//! spec's named prefix table directly, for callers that need multibase
//! encode/decode independent of CID (e.g. did:key's embedded public key).

use crate::error::MultibaseError;

/// One-character multibase prefixes this library round-trips.
pub const PREFIX_BASE16_LOWER: char = 'f';
pub const PREFIX_BASE16_UPPER: char = 'F';
pub const PREFIX_BASE32_LOWER: char = 'b';
pub const PREFIX_BASE32_UPPER: char = 'B';
pub const PREFIX_BASE58BTC: char = 'z';
pub const PREFIX_BASE64_PAD: char = 'm';
pub const PREFIX_BASE64URL: char = 'u';
pub const PREFIX_BASE64URL_PAD: char = 'U';

fn base_for_prefix(prefix: char) -> Option<multibase::Base> {
    use multibase::Base::*;
    Some(match prefix {
        'f' => Base16Lower,
        'F' => Base16Upper,
        'b' => Base32Lower,
        'B' => Base32Upper,
        'z' => Base58Btc,
        'm' => Base64Pad,
        'u' => Base64Url,
        'U' => Base64UrlPad,
        _ => return None,
    })
}

/// Encode `data` with the given multibase prefix, attaching the prefix
/// character to the front of the returned string.
pub fn encode(prefix: char, data: &[u8]) -> Result<String, MultibaseError> {
    let base = base_for_prefix(prefix).ok_or(MultibaseError::UnknownPrefix(prefix))?;
    Ok(multibase::encode(base, data))
}

/// Decode a multibase string, returning the base it was encoded with and the
/// decoded bytes.
pub fn decode(s: &str) -> Result<(multibase::Base, Vec<u8>), MultibaseError> {
    let mut chars = s.chars();
    let prefix = chars.next().ok_or(MultibaseError::InvalidFormat)?;
    if base_for_prefix(prefix).is_none() {
        return Err(MultibaseError::UnknownPrefix(prefix));
    }
    multibase::decode(s).map_err(|_| MultibaseError::InvalidFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_known_prefix() {
        let data = b"hello atproto";
        for prefix in [
            PREFIX_BASE16_LOWER,
            PREFIX_BASE16_UPPER,
            PREFIX_BASE32_LOWER,
            PREFIX_BASE32_UPPER,
            PREFIX_BASE58BTC,
            PREFIX_BASE64_PAD,
            PREFIX_BASE64URL,
            PREFIX_BASE64URL_PAD,
        ] {
            let encoded = encode(prefix, data).unwrap();
            assert!(encoded.starts_with(prefix));
            let (_, decoded) = decode(&encoded).unwrap();
            assert_eq!(decoded, data);
        }
    }

    #[test]
    fn unknown_prefix_rejected() {
        assert!(matches!(
            decode("?not-a-real-prefix"),
            Err(MultibaseError::UnknownPrefix('?'))
        ));
    }

    #[test]
    fn empty_input_rejected() {
        assert!(matches!(decode(""), Err(MultibaseError::InvalidFormat)));
    }
}
