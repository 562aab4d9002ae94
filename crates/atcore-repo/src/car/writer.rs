//! CAR encoding: `varint-len(header) || CBOR(header) || block*` (§4.9).

use atcore_common::types::varint;

use super::{Car, CarHeader};
use crate::error::CarError;

/// Encode `car` to its binary CAR representation.
pub fn encode(car: &Car) -> Result<Vec<u8>, CarError> {
    let header = CarHeader {
        version: car.version,
        roots: car.roots.iter().map(|c| c.as_str().to_string()).collect(),
    };
    let header_bytes =
        serde_ipld_dagcbor::to_vec(&header).map_err(|e| CarError::HeaderEncoding(Box::new(e)))?;

    let mut out = Vec::new();
    out.extend(varint::encode(header_bytes.len() as u64));
    out.extend(header_bytes);

    for (cid, data) in &car.blocks {
        let cid_str = cid.as_str().as_bytes();
        let mut payload = Vec::with_capacity(cid_str.len() + data.len() + 5);
        payload.extend(varint::encode(cid_str.len() as u64));
        payload.extend_from_slice(cid_str);
        payload.extend_from_slice(data);

        out.extend(varint::encode(payload.len() as u64));
        out.extend(payload);
    }

    tracing::debug!(blocks = car.blocks.len(), bytes = out.len(), "encoded car");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use atcore_common::Cid;

    #[test]
    fn encodes_header_and_blocks() {
        let root = Cid::from_data(b"root", "dag-cbor").unwrap();
        let car = Car::new(vec![root.clone()], vec![(root, b"payload".to_vec())]);
        let bytes = encode(&car).unwrap();
        assert!(!bytes.is_empty());
    }
}
