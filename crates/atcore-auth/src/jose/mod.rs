//! Minimal JOSE plumbing: just enough JWS/JWT to build and verify DPoP proofs.

pub mod jws;
pub mod jwt;
pub mod signing;

pub use jws::Header;
pub use signing::{create_signed_jwt, decode_jws, verify_jws};
