//! Errors from DPoP proof generation and verification (§4.12).

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DpopError {
    #[error("JWK is not an EC key usable for ES256")]
    #[diagnostic(code(atcore::dpop::unsupported_key))]
    UnsupportedKey,

    #[error("JSON encoding failed")]
    #[diagnostic(code(atcore::dpop::serialization))]
    Serialization(#[source] BoxError),

    #[error("malformed DPoP proof: expected three dot-separated segments")]
    #[diagnostic(code(atcore::dpop::malformed_proof))]
    MalformedProof,

    #[error("DPoP proof segment is not valid base64url")]
    #[diagnostic(code(atcore::dpop::invalid_base64))]
    InvalidBase64,

    #[error("DPoP proof header or claims are not valid JSON")]
    #[diagnostic(code(atcore::dpop::invalid_json))]
    InvalidJson(#[source] BoxError),

    #[error("DPoP proof header `typ` must be `dpop+jwt`")]
    #[diagnostic(code(atcore::dpop::wrong_typ))]
    WrongTyp,

    #[error("DPoP proof header has no embedded JWK")]
    #[diagnostic(code(atcore::dpop::missing_jwk))]
    MissingJwk,

    #[error("DPoP proof signature is invalid")]
    #[diagnostic(code(atcore::dpop::invalid_signature))]
    InvalidSignature,

    #[error("DPoP proof `htm` does not match the request method")]
    #[diagnostic(code(atcore::dpop::htm_mismatch))]
    HtmMismatch,

    #[error("DPoP proof `htu` does not match the request URL")]
    #[diagnostic(code(atcore::dpop::htu_mismatch))]
    HtuMismatch,

    #[error("DPoP proof `iat` is outside the allowed clock-skew window")]
    #[diagnostic(code(atcore::dpop::stale_iat))]
    StaleIat,

    #[error("DPoP proof `jti` is missing or empty")]
    #[diagnostic(code(atcore::dpop::missing_jti))]
    MissingJti,

    #[error("DPoP proof `ath` does not match the access token")]
    #[diagnostic(code(atcore::dpop::ath_mismatch))]
    AthMismatch,
}
