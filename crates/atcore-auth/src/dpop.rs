//! DPoP (RFC 9449) proof generation and verification (§4.12).

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jose_jwa::{Algorithm, Signing};
use jose_jwk::{Jwk, Key, crypto};
use p256::ecdsa::{SigningKey, VerifyingKey};
use rand::RngCore;
use sha2::{Digest, Sha256};
use smol_str::SmolStr;

use crate::error::DpopError;
use crate::jose::jws::Header;
use crate::jose::jwt::{Claims, PublicClaims, RegisteredClaims};
use crate::jose::signing::{create_signed_jwt, decode_jws};

pub const JWT_HEADER_TYP_DPOP: &str = "dpop+jwt";

/// Tolerance window (both directions) for `iat` freshness checks.
const IAT_TOLERANCE_SECS: i64 = 60;

fn generate_jti() -> SmolStr {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    SmolStr::new(URL_SAFE_NO_PAD.encode(bytes))
}

fn public_jwk(secret: &p256::SecretKey) -> Jwk {
    Jwk {
        key: Key::from(&crypto::Key::from(secret.public_key())),
        prm: Default::default(),
    }
}

/// Issue an ES256 DPoP proof JWT embedding `key`'s public half.
///
/// `nonce` and `access_token` are included as the `nonce`/`ath` claims when
/// present (§4.12).
pub fn generate_proof(
    method: &str,
    url: &str,
    key: &p256::SecretKey,
    nonce: Option<&str>,
    access_token: Option<&str>,
) -> Result<String, DpopError> {
    let mut header = Header::from(Algorithm::Signing(Signing::Es256));
    header.typ = Some(JWT_HEADER_TYP_DPOP.into());
    header.jwk = Some(public_jwk(key));

    let ath = access_token.map(|token| {
        SmolStr::new(URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes())))
    });

    let claims = Claims {
        registered: RegisteredClaims {
            jti: Some(generate_jti()),
            iat: Some(chrono::Utc::now().timestamp()),
            ..Default::default()
        },
        public: PublicClaims {
            htm: Some(method.into()),
            htu: Some(url.into()),
            ath,
            nonce: nonce.map(SmolStr::new),
        },
    };

    let signing_key = SigningKey::from(key.clone());
    tracing::debug!(method, url, "generating dpop proof");
    create_signed_jwt(&signing_key, &header, &claims)
}

/// Verify a DPoP proof JWT against the expected method, URL, and (optional)
/// bound access token (§4.12).
pub fn verify_proof(
    jwt: &str,
    method: &str,
    url: &str,
    access_token: Option<&str>,
) -> Result<(), DpopError> {
    let decoded = decode_jws(jwt)?;
    tracing::debug!(method, url, "verifying dpop proof");

    if decoded.header.typ.as_deref() != Some(JWT_HEADER_TYP_DPOP) {
        return Err(DpopError::WrongTyp);
    }
    let jwk = decoded.header.jwk.as_ref().ok_or(DpopError::MissingJwk)?;
    let verifying_key = verifying_key_from_jwk(jwk)?;
    crate::jose::signing::verify_jws(&decoded, &verifying_key)
        .map_err(|_| DpopError::InvalidSignature)?;

    if decoded.claims.public.htm.as_deref() != Some(method) {
        return Err(DpopError::HtmMismatch);
    }
    if decoded.claims.public.htu.as_deref() != Some(url) {
        return Err(DpopError::HtuMismatch);
    }
    let iat = decoded.claims.registered.iat.ok_or(DpopError::StaleIat)?;
    let now = chrono::Utc::now().timestamp();
    if (now - iat).abs() > IAT_TOLERANCE_SECS {
        return Err(DpopError::StaleIat);
    }
    if decoded
        .claims
        .registered
        .jti
        .as_deref()
        .is_none_or(str::is_empty)
    {
        return Err(DpopError::MissingJti);
    }
    if let Some(token) = access_token {
        let expected = URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()));
        if decoded.claims.public.ath.as_deref() != Some(expected.as_str()) {
            return Err(DpopError::AthMismatch);
        }
    }
    Ok(())
}

fn verifying_key_from_jwk(jwk: &Jwk) -> Result<VerifyingKey, DpopError> {
    match crypto::Key::try_from(&jwk.key).map_err(|_| DpopError::UnsupportedKey)? {
        crypto::Key::P256(crypto::Kind::Public(pk)) => Ok(VerifyingKey::from(&pk)),
        crypto::Key::P256(crypto::Kind::Secret(sk)) => Ok(VerifyingKey::from(&sk.public_key())),
        _ => Err(DpopError::UnsupportedKey),
    }
}

/// RFC 7638 JWK thumbprint over the canonical `{crv, kty, x, y}` member set.
pub fn calculate_jkt(key: &Key) -> Result<String, DpopError> {
    let value = serde_json::to_value(key).map_err(|e| DpopError::Serialization(Box::new(e)))?;
    let obj = value.as_object().ok_or(DpopError::UnsupportedKey)?;
    let member = |name: &str| -> Result<&str, DpopError> {
        obj.get(name)
            .and_then(|v| v.as_str())
            .ok_or(DpopError::UnsupportedKey)
    };
    let canonical = format!(
        r#"{{"crv":"{}","kty":"{}","x":"{}","y":"{}"}}"#,
        member("crv")?,
        member("kty")?,
        member("x")?,
        member("y")?,
    );
    Ok(URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes())))
}

/// The thumbprint of a proof's embedded JWK, without verifying the proof.
pub fn extract_jkt(proof: &str) -> Result<String, DpopError> {
    let decoded = decode_jws(proof)?;
    let jwk = decoded.header.jwk.ok_or(DpopError::MissingJwk)?;
    calculate_jkt(&jwk.key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    fn key() -> p256::SecretKey {
        p256::SecretKey::random(&mut OsRng)
    }

    #[test]
    fn generate_then_verify_round_trips() {
        let key = key();
        let proof = generate_proof("POST", "https://pds.example/xrpc/x", &key, None, None)
            .unwrap();
        verify_proof(&proof, "POST", "https://pds.example/xrpc/x", None).unwrap();
    }

    #[test]
    fn verify_rejects_wrong_method() {
        let key = key();
        let proof = generate_proof("POST", "https://pds.example/xrpc/x", &key, None, None)
            .unwrap();
        assert!(matches!(
            verify_proof(&proof, "GET", "https://pds.example/xrpc/x", None),
            Err(DpopError::HtmMismatch)
        ));
    }

    #[test]
    fn verify_rejects_wrong_url() {
        let key = key();
        let proof = generate_proof("POST", "https://pds.example/xrpc/x", &key, None, None)
            .unwrap();
        assert!(matches!(
            verify_proof(&proof, "POST", "https://pds.example/xrpc/y", None),
            Err(DpopError::HtuMismatch)
        ));
    }

    #[test]
    fn ath_must_match_access_token() {
        let key = key();
        let proof = generate_proof(
            "POST",
            "https://pds.example/xrpc/x",
            &key,
            None,
            Some("token-a"),
        )
        .unwrap();
        assert!(verify_proof(
            &proof,
            "POST",
            "https://pds.example/xrpc/x",
            Some("token-a")
        )
        .is_ok());
        assert!(matches!(
            verify_proof(
                &proof,
                "POST",
                "https://pds.example/xrpc/x",
                Some("token-b")
            ),
            Err(DpopError::AthMismatch)
        ));
    }

    #[test]
    fn nonce_round_trips_through_claims() {
        let key = key();
        let proof = generate_proof(
            "POST",
            "https://pds.example/xrpc/x",
            &key,
            Some("server-nonce"),
            None,
        )
        .unwrap();
        let decoded = decode_jws(&proof).unwrap();
        assert_eq!(decoded.claims.public.nonce.as_deref(), Some("server-nonce"));
    }

    #[test]
    fn jkt_is_deterministic_for_the_same_key() {
        let key = key();
        let jwk = public_jwk(&key);
        assert_eq!(calculate_jkt(&jwk.key).unwrap(), calculate_jkt(&jwk.key).unwrap());
    }

    #[test]
    fn extract_jkt_matches_calculate_jkt() {
        let key = key();
        let jwk = public_jwk(&key);
        let proof = generate_proof("GET", "https://pds.example/", &key, None, None).unwrap();
        assert_eq!(extract_jkt(&proof).unwrap(), calculate_jkt(&jwk.key).unwrap());
    }
}
