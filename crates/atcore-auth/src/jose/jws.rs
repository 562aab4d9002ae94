//! The JWS protected header this crate signs: ES256 only, with an optional
//! embedded public JWK (used for DPoP's self-contained proofs).

use jose_jwa::Algorithm;
use jose_jwk::Jwk;
use smol_str::SmolStr;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Header {
    pub alg: Algorithm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jku: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwk: Option<Jwk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typ: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cty: Option<SmolStr>,
}

impl From<Algorithm> for Header {
    fn from(alg: Algorithm) -> Self {
        Self {
            alg,
            jku: None,
            jwk: None,
            kid: None,
            typ: None,
            cty: None,
        }
    }
}
