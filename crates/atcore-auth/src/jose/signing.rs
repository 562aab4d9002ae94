//! Compact JWS construction and verification, ES256 only (§4.12).

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey, signature::Signer, signature::Verifier};

use super::{Header, jwt::Claims};
use crate::error::DpopError;

/// Build a compact `header.payload.signature` JWS over `claims`.
pub fn create_signed_jwt(
    key: &SigningKey,
    header: &Header,
    claims: &Claims,
) -> Result<String, DpopError> {
    let header_json =
        serde_json::to_vec(header).map_err(|e| DpopError::Serialization(Box::new(e)))?;
    let claims_json =
        serde_json::to_vec(claims).map_err(|e| DpopError::Serialization(Box::new(e)))?;

    let header_b64 = URL_SAFE_NO_PAD.encode(header_json);
    let payload_b64 = URL_SAFE_NO_PAD.encode(claims_json);
    let signing_input = format!("{header_b64}.{payload_b64}");

    let signature: Signature = key.sign(signing_input.as_bytes());
    Ok(format!(
        "{signing_input}.{}",
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    ))
}

/// The three decoded parts of a compact JWS, before signature verification.
pub struct DecodedJws {
    pub header: Header,
    pub claims: Claims,
    pub signing_input: String,
    pub signature: Vec<u8>,
}

/// Split and base64url/JSON-decode a compact JWS without verifying it.
pub fn decode_jws(jwt: &str) -> Result<DecodedJws, DpopError> {
    let mut parts = jwt.split('.');
    let (Some(header_b64), Some(payload_b64), Some(sig_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(DpopError::MalformedProof);
    };

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|_| DpopError::InvalidBase64)?;
    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| DpopError::InvalidBase64)?;
    let signature = URL_SAFE_NO_PAD
        .decode(sig_b64)
        .map_err(|_| DpopError::InvalidBase64)?;

    let header: Header = serde_json::from_slice(&header_bytes)
        .map_err(|e| DpopError::InvalidJson(Box::new(e)))?;
    let claims: Claims = serde_json::from_slice(&payload_bytes)
        .map_err(|e| DpopError::InvalidJson(Box::new(e)))?;

    Ok(DecodedJws {
        header,
        claims,
        signing_input: format!("{header_b64}.{payload_b64}"),
        signature,
    })
}

/// Verify `decoded`'s signature against `key`.
pub fn verify_jws(decoded: &DecodedJws, key: &VerifyingKey) -> Result<(), DpopError> {
    let signature = Signature::from_slice(&decoded.signature)
        .map_err(|_| DpopError::InvalidSignature)?;
    key.verify(decoded.signing_input.as_bytes(), &signature)
        .map_err(|_| DpopError::InvalidSignature)
}
