//! Identifier grammars, the CID codec, and the DID document model (§4, §6).

pub mod aturi;
pub mod cid;
pub mod did;
pub mod did_doc;
pub mod handle;
pub mod ident;
pub mod multibase;
pub mod nsid;
pub mod recordkey;
pub mod tid;
pub mod varint;

pub use aturi::{AtUri, UriPath};
pub use cid::{Cid, CidLink, CidVersion};
pub use did::{Did, DidKey, DidMethod, QueryValue};
pub use did_doc::{DidDocument, DidDocumentOptions, Service, VerificationMethod};
pub use handle::Handle;
pub use ident::AtIdentifier;
pub use nsid::Nsid;
pub use recordkey::RecordKey;
pub use tid::{Ticker, Tid};
