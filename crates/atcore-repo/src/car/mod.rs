//! CAR (Content Addressable aRchive) encoding and decoding (§4.9, §6).
//!
//! This implementation adopts the string-CID-in-block wire form throughout,
//! consistently for both directions; it is not wire-compatible with
//! `iroh-car` or other canonical-CAR libraries that encode raw CID bytes
//! (see DESIGN.md).

pub mod reader;
pub mod writer;

use atcore_common::Cid;

use crate::error::CarError;

pub use reader::{decode, get_block};
pub use writer::encode;

/// The decoded contents of a CAR byte stream: a version, a set of root CIDs,
/// and the blocks in on-disk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Car {
    pub version: u64,
    pub roots: Vec<Cid>,
    pub blocks: Vec<(Cid, Vec<u8>)>,
}

impl Car {
    pub fn new(roots: Vec<Cid>, blocks: Vec<(Cid, Vec<u8>)>) -> Self {
        Self {
            version: 1,
            roots,
            blocks,
        }
    }

    /// The archive's single root CID (§4.9 repositories carry exactly one).
    pub fn root(&self) -> Result<&Cid, CarError> {
        self.roots.first().ok_or(CarError::NoRoot)
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
pub(crate) struct CarHeader {
    pub version: u64,
    pub roots: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_errors_when_empty() {
        let car = Car::new(Vec::new(), Vec::new());
        assert!(matches!(car.root(), Err(CarError::NoRoot)));
    }

    #[test]
    fn root_returns_first() {
        let cid = Cid::from_data(b"root block", "dag-cbor").unwrap();
        let car = Car::new(vec![cid.clone()], vec![(cid.clone(), b"root block".to_vec())]);
        assert_eq!(car.root().unwrap(), &cid);
    }
}
