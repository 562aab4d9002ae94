//! Identifier grammars, the CID codec, and the DID document model underlying
//! the AT Protocol: DID (`plc`/`web`/`key`), NSID, AT-URI, TID, record keys,
//! and DID documents, plus the varint and multibase primitives they share.

pub mod error;
pub mod types;

pub use types::{
    AtIdentifier, AtUri, Cid, CidLink, CidVersion, Did, DidDocument, DidDocumentOptions, DidKey,
    DidMethod, Handle, Nsid, QueryValue, RecordKey, Service, Ticker, Tid, UriPath,
    VerificationMethod,
};
