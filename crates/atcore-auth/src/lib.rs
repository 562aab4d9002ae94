//! DPoP (RFC 9449) proof issuance and verification for AT Protocol OAuth
//! clients and resource servers (§4.12).

pub mod dpop;
pub mod error;
pub mod jose;

pub use dpop::{calculate_jkt, extract_jkt, generate_proof, verify_proof};
pub use error::DpopError;
