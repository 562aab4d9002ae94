//! The repository commit object: a signed pointer to the MST root (§4.10).

use atcore_common::{Cid, Did, Tid};
use smol_str::SmolStr;

use crate::error::CommitError;

const COMMIT_VERSION: i64 = 3;

/// A repository commit. `prev` is always present in the field list (even
/// when `None`) so its serialised bytes are stable for v3 commits.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Commit {
    pub did: SmolStr,
    pub version: i64,
    pub data: SmolStr,
    pub rev: SmolStr,
    pub prev: Option<SmolStr>,
    #[serde(with = "serde_bytes")]
    pub sig: Vec<u8>,
}

/// The sig-less field subset a signer/verifier operates over, serialised in
/// this fixed key order (§4.10).
#[derive(serde::Serialize)]
struct UnsignedFields<'a> {
    did: &'a str,
    version: i64,
    data: &'a str,
    rev: &'a str,
    prev: Option<&'a str>,
}

impl Commit {
    /// Construct a new, unsigned v3 commit with a freshly generated `rev`.
    pub fn create(did: &Did, data: &Cid) -> Self {
        Self {
            did: did.as_str().into(),
            version: COMMIT_VERSION,
            data: data.as_str().into(),
            rev: Tid::now().as_str().into(),
            prev: None,
            sig: Vec::new(),
        }
    }

    /// Construct the next commit after `self`, threading its CID into `prev`.
    pub fn create_next(&self, data: &Cid, prev_cid: &Cid) -> Self {
        Self {
            did: self.did.clone(),
            version: COMMIT_VERSION,
            data: data.as_str().into(),
            rev: Tid::now().as_str().into(),
            prev: Some(prev_cid.as_str().into()),
            sig: Vec::new(),
        }
    }

    /// The stable, sig-less serialisation a signer/verifier operates over:
    /// DAG-CBOR over an ordered map with keys `did, version, data, rev, prev`.
    pub fn unsigned_bytes(&self) -> Result<Vec<u8>, CommitError> {
        let fields = UnsignedFields {
            did: &self.did,
            version: self.version,
            data: &self.data,
            rev: &self.rev,
            prev: self.prev.as_deref(),
        };
        serde_ipld_dagcbor::to_vec(&fields).map_err(|e| CommitError::Serialization(Box::new(e)))
    }

    /// Sign via a caller-supplied closure, storing the result in `sig`.
    /// Per §9's injectable-signing design note, the crypto backend is
    /// pluggable: any unwind or error from the closure is caught and
    /// reported as `signing_failed`.
    pub fn sign<F, E>(mut self, signer: F) -> Result<Self, CommitError>
    where
        F: FnOnce(&[u8]) -> Result<Vec<u8>, E>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let bytes = self.unsigned_bytes()?;
        self.sig = signer(&bytes).map_err(|e| CommitError::SigningFailed(Box::new(e)))?;
        tracing::debug!(did = %self.did, rev = %self.rev, "signed commit");
        Ok(self)
    }

    /// Verify via a caller-supplied closure over `(unsigned_bytes, sig)`.
    /// Returns `UnsignedCommit` if no signature is present.
    pub fn verify<F, E>(&self, verifier: F) -> Result<(), CommitError>
    where
        F: FnOnce(&[u8], &[u8]) -> Result<(), E>,
        E: std::error::Error + Send + Sync + 'static,
    {
        if self.sig.is_empty() {
            return Err(CommitError::UnsignedCommit);
        }
        let bytes = self.unsigned_bytes()?;
        verifier(&bytes, &self.sig).map_err(|e| {
            tracing::warn!(did = %self.did, rev = %self.rev, "commit signature verification failed");
            CommitError::VerificationFailed(Some(Box::new(e)))
        })
    }

    /// Structural validation: `did` begins `did:`, `version = 3`, `data` is a
    /// CID, `rev` is a valid TID, `prev` is nil or a CID (§4.10).
    pub fn validate(&self) -> Result<(), CommitError> {
        if !self.did.starts_with("did:") {
            return Err(CommitError::InvalidDid);
        }
        if self.version != COMMIT_VERSION {
            return Err(CommitError::InvalidVersion(self.version));
        }
        Cid::parse(&self.data).map_err(|_| CommitError::InvalidDataCid)?;
        Tid::parse(&self.rev).map_err(|_| CommitError::InvalidRev)?;
        if let Some(prev) = &self.prev {
            Cid::parse(prev).map_err(|_| CommitError::InvalidPrevCid)?;
        }
        Ok(())
    }

    /// Byte-wise string comparison of two commits' `rev` fields (§4.10).
    pub fn compare_revs(&self, other: &Self) -> std::cmp::Ordering {
        self.rev.cmp(&other.rev)
    }

    /// Serialize the full (possibly signed) commit to DAG-CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>, CommitError> {
        serde_ipld_dagcbor::to_vec(self).map_err(|e| CommitError::Serialization(Box::new(e)))
    }

    /// Deserialize a commit from DAG-CBOR bytes.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, CommitError> {
        serde_ipld_dagcbor::from_slice(bytes).map_err(|e| CommitError::Serialization(Box::new(e)))
    }

    /// This commit's content-addressed CID.
    pub fn to_cid(&self) -> Result<Cid, CommitError> {
        let bytes = self.to_cbor()?;
        Cid::from_data(&bytes, "dag-cbor").map_err(|e| CommitError::Serialization(e.into()))
    }

    pub fn data_cid(&self) -> Result<Cid, CommitError> {
        Cid::parse(&self.data).map_err(|_| CommitError::InvalidDataCid)
    }

    pub fn prev_cid(&self) -> Result<Option<Cid>, CommitError> {
        match &self.prev {
            None => Ok(None),
            Some(p) => Cid::parse(p).map(Some).map_err(|_| CommitError::InvalidPrevCid),
        }
    }
}

/// Ready-made signer/verifier closures for the three curves this workspace's
/// corpus supports, wrapping each key type's own `signature` crate impls
/// (§9: "a `SigningKey`/`VerifyingKey` trait remains the natural way to give
/// callers a ready-made closure for each curve").
pub mod keys {
    use signature::{Signer, Verifier};

    /// Sign with an Ed25519 key, returning a closure usable with [`super::Commit::sign`].
    pub fn ed25519_signer(
        key: &ed25519_dalek::SigningKey,
    ) -> impl FnOnce(&[u8]) -> Result<Vec<u8>, ed25519_dalek::ed25519::Error> + '_ {
        move |bytes| Ok(key.sign(bytes).to_vec())
    }

    /// Verify with an Ed25519 public key.
    pub fn ed25519_verifier(
        key: &ed25519_dalek::VerifyingKey,
    ) -> impl FnOnce(&[u8], &[u8]) -> Result<(), ed25519_dalek::ed25519::Error> + '_ {
        move |bytes, sig| {
            let sig = ed25519_dalek::Signature::from_slice(sig)?;
            key.verify(bytes, &sig)
        }
    }

    /// Sign with a secp256k1 (K-256) key.
    pub fn k256_signer(
        key: &k256::ecdsa::SigningKey,
    ) -> impl FnOnce(&[u8]) -> Result<Vec<u8>, k256::ecdsa::Error> + '_ {
        move |bytes| {
            let sig: k256::ecdsa::Signature = key.try_sign(bytes)?;
            Ok(sig.to_vec())
        }
    }

    /// Verify with a secp256k1 (K-256) public key.
    pub fn k256_verifier(
        key: &k256::ecdsa::VerifyingKey,
    ) -> impl FnOnce(&[u8], &[u8]) -> Result<(), k256::ecdsa::Error> + '_ {
        move |bytes, sig| {
            let sig = k256::ecdsa::Signature::from_slice(sig)?;
            key.verify(bytes, &sig)
        }
    }

    /// Sign with a P-256 key.
    pub fn p256_signer(
        key: &p256::ecdsa::SigningKey,
    ) -> impl FnOnce(&[u8]) -> Result<Vec<u8>, p256::ecdsa::Error> + '_ {
        move |bytes| {
            let sig: p256::ecdsa::Signature = key.try_sign(bytes)?;
            Ok(sig.to_vec())
        }
    }

    /// Verify with a P-256 public key.
    pub fn p256_verifier(
        key: &p256::ecdsa::VerifyingKey,
    ) -> impl FnOnce(&[u8], &[u8]) -> Result<(), p256::ecdsa::Error> + '_ {
        move |bytes, sig| {
            let sig = p256::ecdsa::Signature::from_slice(sig)?;
            key.verify(bytes, &sig)
        }
    }

    /// Build a verifier from a did:key's decoded algorithm tag and raw
    /// compressed public-key bytes (`atcore_common::types::did::DidKey`),
    /// dispatching to the matching curve.
    pub fn verifier_for_jwt_alg(
        jwt_alg: &str,
        key_bytes: &[u8],
    ) -> Result<Box<dyn Fn(&[u8], &[u8]) -> Result<(), super::CommitError>>, super::CommitError>
    {
        match jwt_alg {
            "ES256" => {
                let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(key_bytes)
                    .map_err(|e| super::CommitError::InvalidKey(e.to_string()))?;
                Ok(Box::new(move |bytes: &[u8], sig: &[u8]| {
                    let sig = p256::ecdsa::Signature::from_slice(sig)
                        .map_err(|e| super::CommitError::InvalidSignature(e.to_string()))?;
                    key.verify(bytes, &sig)
                        .map_err(|_| super::CommitError::VerificationFailed(None))
                }))
            }
            "ES256K" => {
                let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(key_bytes)
                    .map_err(|e| super::CommitError::InvalidKey(e.to_string()))?;
                Ok(Box::new(move |bytes: &[u8], sig: &[u8]| {
                    let sig = k256::ecdsa::Signature::from_slice(sig)
                        .map_err(|e| super::CommitError::InvalidSignature(e.to_string()))?;
                    key.verify(bytes, &sig)
                        .map_err(|_| super::CommitError::VerificationFailed(None))
                }))
            }
            other => Err(super::CommitError::UnsupportedKeyType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn did() -> Did {
        Did::parse("did:plc:44ybard66vv44zksje25o7dz").unwrap()
    }

    fn data_cid() -> Cid {
        Cid::from_data(b"mst root", "dag-cbor").unwrap()
    }

    #[test]
    fn create_produces_valid_unsigned_commit() {
        let commit = Commit::create(&did(), &data_cid());
        assert!(commit.validate().is_ok());
        assert_eq!(commit.rev.len(), 13);
        assert!(commit.prev.is_none());
    }

    #[test]
    fn create_next_threads_prev() {
        let first = Commit::create(&did(), &data_cid());
        let first_cid = first.to_cid().unwrap();
        let second = first.create_next(&data_cid(), &first_cid);
        assert_eq!(second.prev_cid().unwrap(), Some(first_cid));
    }

    #[test]
    fn validate_rejects_wrong_version() {
        let mut commit = Commit::create(&did(), &data_cid());
        commit.version = 2;
        assert!(matches!(
            commit.validate(),
            Err(CommitError::InvalidVersion(2))
        ));
    }

    #[test]
    fn validate_rejects_non_tid_rev() {
        let mut commit = Commit::create(&did(), &data_cid());
        commit.rev = "not-a-tid".into();
        assert!(matches!(commit.validate(), Err(CommitError::InvalidRev)));
    }

    #[test]
    fn sign_then_verify_round_trips_with_ed25519() {
        use ed25519_dalek::SigningKey;
        use rand_core::OsRng;
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();

        let commit = Commit::create(&did(), &data_cid())
            .sign(keys::ed25519_signer(&signing_key))
            .unwrap();
        assert!(commit.verify(keys::ed25519_verifier(&verifying_key)).is_ok());
    }

    #[test]
    fn verify_unsigned_commit_fails() {
        let commit = Commit::create(&did(), &data_cid());
        use ed25519_dalek::SigningKey;
        use rand_core::OsRng;
        let verifying_key = SigningKey::generate(&mut OsRng).verifying_key();
        assert!(matches!(
            commit.verify(keys::ed25519_verifier(&verifying_key)),
            Err(CommitError::UnsignedCommit)
        ));
    }

    #[test]
    fn tampered_signature_fails_verification() {
        use ed25519_dalek::SigningKey;
        use rand_core::OsRng;
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();

        let mut commit = Commit::create(&did(), &data_cid())
            .sign(keys::ed25519_signer(&signing_key))
            .unwrap();
        commit.sig[0] ^= 0xff;
        assert!(commit.verify(keys::ed25519_verifier(&verifying_key)).is_err());
    }

    #[test]
    fn verifier_for_jwt_alg_dispatches_p256() {
        use p256::ecdsa::SigningKey;
        use rand_core::OsRng;
        let signing_key = SigningKey::random(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        let key_bytes = verifying_key.to_encoded_point(true).as_bytes().to_vec();

        let commit = Commit::create(&did(), &data_cid())
            .sign(keys::p256_signer(&signing_key))
            .unwrap();
        let verifier = keys::verifier_for_jwt_alg("ES256", &key_bytes).unwrap();
        assert!(commit.verify(verifier).is_ok());
    }

    #[test]
    fn verifier_for_jwt_alg_rejects_unknown_alg() {
        assert!(matches!(
            keys::verifier_for_jwt_alg("EdDSA", &[]),
            Err(CommitError::UnsupportedKeyType(_))
        ));
    }

    #[test]
    fn compare_revs_is_byte_wise() {
        let a = Commit::create(&did(), &data_cid());
        std::thread::sleep(std::time::Duration::from_micros(10));
        let b = Commit::create(&did(), &data_cid());
        assert_eq!(a.compare_revs(&b), std::cmp::Ordering::Less);
    }

    #[test]
    fn cbor_round_trips() {
        let commit = Commit::create(&did(), &data_cid());
        let bytes = commit.to_cbor().unwrap();
        let back = Commit::from_cbor(&bytes).unwrap();
        assert_eq!(commit, back);
    }
}
