//! End-to-end check: build an MST, commit it, archive the result to a CAR,
//! and recover everything on the other side (§8.1).

use atcore_common::{Cid, Did};
use atcore_repo::car::{self, Car};
use atcore_repo::commit::{Commit, keys};
use atcore_repo::mst::{MemoryNodeStore, Mst};

#[test]
fn repo_round_trips_through_a_car_archive() {
    let mut mst = Mst::empty();
    for i in 0..12 {
        let rkey = format!("app.bsky.feed.post/{i:04}");
        let value = Cid::from_data(rkey.as_bytes(), "dag-cbor").unwrap();
        mst = mst.add(&rkey, &value).unwrap();
    }

    let mut store = MemoryNodeStore::new();
    let mst_root = mst.persist(&mut store).unwrap();

    let did = Did::parse("did:plc:44ybard66vv44zksje25o7dz").unwrap();
    use ed25519_dalek::SigningKey;
    use rand_core::OsRng;
    let signing_key = SigningKey::generate(&mut OsRng);
    let verifying_key = signing_key.verifying_key();

    let commit = Commit::create(&did, &mst_root)
        .sign(keys::ed25519_signer(&signing_key))
        .unwrap();
    commit.validate().unwrap();
    commit.verify(keys::ed25519_verifier(&verifying_key)).unwrap();

    let commit_bytes = commit.to_cbor().unwrap();
    let commit_cid = commit.to_cid().unwrap();

    let mut blocks: Vec<(Cid, Vec<u8>)> = vec![(commit_cid.clone(), commit_bytes)];
    for (key, _) in mst.list() {
        let cid = Cid::parse(mst.get(&key).unwrap().as_str()).unwrap();
        if let Some(data) = store.block(&cid) {
            blocks.push((cid, data.to_vec()));
        }
    }
    let archive = Car::new(vec![commit_cid.clone()], blocks);
    let bytes = car::encode(&archive).unwrap();

    let decoded = car::decode(&bytes).unwrap();
    assert_eq!(decoded.roots, vec![commit_cid.clone()]);

    let recovered_commit_bytes = car::get_block(&decoded, &commit_cid).unwrap();
    let recovered_commit = Commit::from_cbor(recovered_commit_bytes).unwrap();
    assert_eq!(recovered_commit, commit);
    recovered_commit
        .verify(keys::ed25519_verifier(&verifying_key))
        .unwrap();
}
