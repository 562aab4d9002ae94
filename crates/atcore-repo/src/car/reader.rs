//! CAR decoding, the inverse of [`super::writer::encode`] (§4.9).

use atcore_common::Cid;
use atcore_common::types::varint;

use super::{Car, CarHeader};
use crate::error::CarError;

fn take(bytes: &[u8], n: usize) -> Result<(&[u8], &[u8]), CarError> {
    if bytes.len() < n {
        return Err(CarError::InsufficientData {
            expected: n,
            actual: bytes.len(),
        });
    }
    Ok(bytes.split_at(n))
}

fn read_varint_len(bytes: &[u8]) -> Result<(usize, &[u8]), CarError> {
    let (len, rest) = varint::decode(bytes).map_err(|_| CarError::InsufficientData {
        expected: 1,
        actual: bytes.len(),
    })?;
    Ok((len as usize, rest))
}

/// Decode a full CAR byte stream into its header and blocks.
pub fn decode(bytes: &[u8]) -> Result<Car, CarError> {
    let (header_len, rest) = read_varint_len(bytes)?;
    let (header_bytes, mut rest) = take(rest, header_len)?;
    let header: CarHeader = serde_ipld_dagcbor::from_slice(header_bytes)
        .map_err(|e| CarError::HeaderEncoding(Box::new(e)))?;

    let roots = header
        .roots
        .iter()
        .map(|s| Cid::parse(s).map_err(CarError::InvalidCid))
        .collect::<Result<Vec<_>, _>>()?;

    let mut blocks = Vec::new();
    while !rest.is_empty() {
        let (payload_len, after_len) = read_varint_len(rest)?;
        let (payload, after_payload) = take(after_len, payload_len)?;

        let (cid_len, after_cid_len) = read_varint_len(payload)?;
        let (cid_bytes, data) = take(after_cid_len, cid_len)?;
        let cid_str =
            std::str::from_utf8(cid_bytes).map_err(|_| CarError::InvalidCid(
                atcore_common::error::CidError::InvalidFormat("non-UTF-8 CID bytes".into()),
            ))?;
        let cid = Cid::parse(cid_str).map_err(CarError::InvalidCid)?;

        blocks.push((cid, data.to_vec()));
        rest = after_payload;
    }

    tracing::debug!(roots = roots.len(), blocks = blocks.len(), "decoded car");
    Ok(Car {
        version: header.version,
        roots,
        blocks,
    })
}

/// O(n) scan for the block matching `cid` by string form (§4.9).
pub fn get_block<'a>(car: &'a Car, cid: &Cid) -> Option<&'a [u8]> {
    car.blocks
        .iter()
        .find(|(c, _)| c == cid)
        .map(|(_, data)| data.as_slice())
}

#[cfg(test)]
mod tests {
    use super::super::writer::encode;
    use super::*;

    #[test]
    fn round_trips_header_and_blocks() {
        let root = Cid::from_data(b"root-block", "dag-cbor").unwrap();
        let other = Cid::from_data(b"other-block", "raw").unwrap();
        let car = Car::new(
            vec![root.clone()],
            vec![
                (root.clone(), vec![1, 2, 3]),
                (other.clone(), b"hello".to_vec()),
            ],
        );
        let bytes = encode(&car).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.roots, car.roots);
        assert_eq!(decoded.blocks, car.blocks);
    }

    #[test]
    fn get_block_finds_by_cid() {
        let cid = Cid::from_data(b"findme", "dag-cbor").unwrap();
        let car = Car::new(vec![], vec![(cid.clone(), b"data".to_vec())]);
        assert_eq!(get_block(&car, &cid), Some(b"data".as_slice()));
    }

    #[test]
    fn truncated_input_is_insufficient_data() {
        let root = Cid::from_data(b"root", "dag-cbor").unwrap();
        let car = Car::new(vec![root.clone()], vec![(root, vec![1, 2, 3])]);
        let mut bytes = encode(&car).unwrap();
        bytes.truncate(bytes.len() - 2);
        assert!(matches!(decode(&bytes), Err(CarError::InsufficientData { .. })));
    }
}
