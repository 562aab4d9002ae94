//! The Merkle Search Tree, commit model, and CAR archive format that
//! together make up an AT Protocol repository (§4.8–§4.10, §6).

pub mod car;
pub mod commit;
pub mod error;
pub mod mst;

pub use car::{Car, decode as decode_car, encode as encode_car, get_block};
pub use commit::Commit;
pub use error::{CarError, CommitError, MstError};
pub use mst::{MemoryNodeStore, Mst, NodeStore};
