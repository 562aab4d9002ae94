#![warn(missing_docs)]

//! Core data structures and wire formats underlying the AT Protocol:
//! identifiers and CIDs, the lexicon schema validator, the MST/commit/CAR
//! repository model, and DPoP proof handling — each behind its own crate,
//! re-exported here as a single dependency.

/// Identifier grammars, CID, and DID document types.
pub use atcore_common::*;

#[cfg(feature = "repo")]
/// Merkle Search Tree, commit model, and CAR archive format.
pub mod repo {
    pub use atcore_repo::*;
}

#[cfg(feature = "lexicon")]
/// Runtime lexicon schema validation and the blob reference model.
pub mod lexicon {
    pub use atcore_lexicon::*;
}

#[cfg(feature = "auth")]
/// DPoP proof generation and verification.
pub mod auth {
    pub use atcore_auth::*;
}
