//! Error types shared across the identifier grammars and CID codec.
//!
//! Each enum is tag-named to match the atom-like error taxonomy: variant
//! names double as the "kind" a caller matches on (`IdentError::InvalidDid`,
//! not a stringly-typed `kind: "invalid_did"` field). `miette::Diagnostic` is
//! derived purely for terminal rendering in this crate's own test output and
//! in downstream CLIs; callers that just want to match on kind can ignore it.

use smol_str::SmolStr;

/// Errors from the varint codec (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum VarintError {
    /// Input ended before a terminating (non-continuation) byte was seen.
    #[error("incomplete varint")]
    #[diagnostic(code(atcore::varint::incomplete))]
    Incomplete,
}

/// Errors from the multibase codec (§4.2).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum MultibaseError {
    /// The leading byte did not match any known multibase prefix.
    #[error("unknown multibase prefix: {0:?}")]
    #[diagnostic(code(atcore::multibase::unknown_prefix))]
    UnknownPrefix(char),
    /// The prefix was recognized but the remainder failed to decode.
    #[error("invalid multibase payload")]
    #[diagnostic(code(atcore::multibase::invalid_format))]
    InvalidFormat,
}

/// Errors from the CID codec (§4.3).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum CidError {
    /// The string did not match any recognized CIDv0/CIDv1 form.
    #[error("invalid CID format: {0}")]
    #[diagnostic(code(atcore::cid::invalid_format))]
    InvalidFormat(SmolStr),
    /// The CID parsed but failed an internal consistency check.
    #[error("invalid CID: {0}")]
    #[diagnostic(code(atcore::cid::invalid_cid))]
    InvalidCid(SmolStr),
}

/// Shared error type for the identifier grammars: DID, NSID, AT-URI, TID,
/// record keys, and handles (§4.4–§4.7, error taxonomy §7).
///
/// One enum rather than one-per-type because the *kinds* of failure are the
/// same shape across every grammar (format errors, length caps, character
/// class violations) even though the grammars themselves differ — matching
/// the source's own observation (§9) that it had two overlapping error
/// namespaces and the spec's resolution to collapse them into atom tags.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum IdentError {
    /// Generic grammar mismatch (used where no more specific variant applies).
    #[error("invalid format: {0}")]
    #[diagnostic(code(atcore::ident::invalid_format))]
    InvalidFormat(SmolStr),

    /// Exceeded a maximum length cap.
    #[error("too long: {actual} bytes (max {max})")]
    #[diagnostic(code(atcore::ident::too_long))]
    TooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length observed.
        actual: usize,
    },

    /// An AT-URI (or similar) was missing its required authority component.
    #[error("missing authority")]
    #[diagnostic(code(atcore::ident::missing_authority))]
    MissingAuthority,

    /// An AT-URI exceeded its maximum total length.
    #[error("URI too long: {actual} bytes (max {max})")]
    #[diagnostic(code(atcore::ident::uri_too_long))]
    UriTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length observed.
        actual: usize,
    },

    /// The string did not begin with `did:` or otherwise failed the DID grammar.
    #[error("invalid DID: {0}")]
    #[diagnostic(code(atcore::ident::invalid_did))]
    InvalidDid(SmolStr),

    /// The DID method was not one of `plc`, `web`, `key`.
    #[error("unsupported DID method: {0}")]
    #[diagnostic(code(atcore::ident::unsupported_method))]
    UnsupportedMethod(SmolStr),

    /// The method-specific identifier failed that method's validation rules.
    #[error("invalid identifier: {0}")]
    #[diagnostic(code(atcore::ident::invalid_identifier))]
    InvalidIdentifier(SmolStr),

    /// Failed handle grammar (domain-shaped LDH labels).
    #[error("invalid handle: {0}")]
    #[diagnostic(code(atcore::ident::invalid_handle))]
    InvalidHandle(SmolStr),

    /// Failed NSID grammar used as an AT-URI collection segment.
    #[error("invalid collection: {0}")]
    #[diagnostic(code(atcore::ident::invalid_collection))]
    InvalidCollection(SmolStr),

    /// Failed record-key character class or length.
    #[error("invalid record key: {0}")]
    #[diagnostic(code(atcore::ident::invalid_rkey))]
    InvalidRkey(SmolStr),

    /// Failed TID grammar (length, alphabet, or first-character restriction).
    #[error("invalid TID: {0}")]
    #[diagnostic(code(atcore::ident::invalid_tid))]
    InvalidTid(SmolStr),

    /// NSID final segment failed its character class.
    #[error("invalid name: {0}")]
    #[diagnostic(code(atcore::ident::invalid_name))]
    InvalidName(SmolStr),

    /// The authority portion exceeded its length cap.
    #[error("authority too long: {actual} (max {max})")]
    #[diagnostic(code(atcore::ident::authority_too_long))]
    AuthorityTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length observed.
        actual: usize,
    },
}

/// Errors from DID document lookups and construction (§4.13).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum DidDocError {
    /// `build_did_web_url` was called on a DID that is not `did:web:...`.
    #[error("not a did:web identifier: {0}")]
    #[diagnostic(code(atcore::did_doc::not_web_did))]
    NotWebDid(SmolStr),
    /// The `did:web` identifier's host or path segments could not be
    /// assembled into a well-formed URL.
    #[error("failed to construct did:web URL: {0}")]
    #[diagnostic(code(atcore::did_doc::invalid_url))]
    InvalidUrl(url::ParseError),
    /// Underlying identifier failed to parse.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Ident(#[from] IdentError),
}
