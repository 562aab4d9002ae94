//! Errors from MST, CAR, and commit operations (§7).

use smol_str::SmolStr;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from MST operations (§4.8).
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum MstError {
    #[error("empty key not allowed")]
    #[diagnostic(code(atcore::mst::empty_key))]
    EmptyKey,

    #[error("key too long: {len} bytes (max {max})")]
    #[diagnostic(code(atcore::mst::key_too_long))]
    KeyTooLong { len: usize, max: usize },

    #[error("invalid key characters: {key}")]
    #[diagnostic(code(atcore::mst::invalid_key_chars))]
    InvalidKeyChars { key: SmolStr },

    #[error("key not found: {key}")]
    #[diagnostic(code(atcore::mst::key_not_found))]
    KeyNotFound { key: SmolStr },

    #[error("node structure invalid: {0}")]
    #[diagnostic(code(atcore::mst::invalid_node))]
    InvalidNode(String),

    #[error("block not found for CID: {0}")]
    #[diagnostic(code(atcore::mst::not_found))]
    NotFound(SmolStr),

    #[error("DAG-CBOR encoding failed")]
    #[diagnostic(code(atcore::mst::serialization))]
    Serialization(#[source] BoxError),

    #[error("node store operation failed")]
    #[diagnostic(code(atcore::mst::store))]
    Store(#[source] BoxError),
}

/// Errors from CAR encoding/decoding (§4.9).
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum CarError {
    #[error("insufficient data: expected at least {expected} more bytes, found {actual}")]
    #[diagnostic(code(atcore::car::insufficient_data))]
    InsufficientData { expected: usize, actual: usize },

    #[error("invalid CID in CAR block")]
    #[diagnostic(code(atcore::car::invalid_cid))]
    InvalidCid(#[source] atcore_common::error::CidError),

    #[error("header encoding failed")]
    #[diagnostic(code(atcore::car::header_encoding))]
    HeaderEncoding(#[source] BoxError),

    #[error("no root CID in block list")]
    #[diagnostic(code(atcore::car::no_root))]
    NoRoot,
}

/// Errors from repository commit construction, signing, and verification (§4.10).
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum CommitError {
    #[error("invalid commit version: {0}")]
    #[diagnostic(code(atcore::commit::invalid_version))]
    InvalidVersion(i64),

    #[error("commit `did` field is not a valid DID string")]
    #[diagnostic(code(atcore::commit::invalid_did))]
    InvalidDid,

    #[error("commit `data` field is not a valid CID")]
    #[diagnostic(code(atcore::commit::invalid_data_cid))]
    InvalidDataCid,

    #[error("commit `prev` field is not a valid CID")]
    #[diagnostic(code(atcore::commit::invalid_prev_cid))]
    InvalidPrevCid,

    #[error("commit `rev` field is not a valid TID")]
    #[diagnostic(code(atcore::commit::invalid_rev))]
    InvalidRev,

    #[error("commit has no signature")]
    #[diagnostic(code(atcore::commit::unsigned_commit))]
    UnsignedCommit,

    #[error("unsupported signing-key algorithm: {0}")]
    #[diagnostic(code(atcore::commit::unsupported_key_type))]
    UnsupportedKeyType(String),

    #[error("invalid key format: {0}")]
    #[diagnostic(code(atcore::commit::invalid_key))]
    InvalidKey(String),

    #[error("invalid signature format: {0}")]
    #[diagnostic(code(atcore::commit::invalid_signature_format))]
    InvalidSignature(String),

    #[error("signing failed")]
    #[diagnostic(code(atcore::commit::signing_failed))]
    SigningFailed(#[source] BoxError),

    #[error("signature verification failed")]
    #[diagnostic(code(atcore::commit::verification_failed))]
    VerificationFailed(#[source] Option<BoxError>),

    #[error("DAG-CBOR encoding failed")]
    #[diagnostic(code(atcore::commit::serialization))]
    Serialization(#[source] BoxError),
}
