use labchain_core::{hash, hash_concat, verify_proof, Blake3, Hash, MerkleError, MerkleTree, Sha256};

fn leaves(n: usize) -> Vec<Vec<u8>> {
    (0..n).map(|i| vec![b'a' + i as u8; 3]).collect()
}

#[test]
fn test_roundtrip_every_index() {
    for n in 1..=33 {
        let data = leaves(n);
        let tree = MerkleTree::new(&data).unwrap();
        let root = tree.root();

        for i in 0..n {
            let proof = tree.proof(i).unwrap();
            assert!(
                verify_proof::<Blake3>(n, i, &data[i], &proof.siblings, &root).unwrap(),
                "n={n} i={i}"
            );
        }
    }
}

#[test]
fn test_tamper_leaf_byte() {
    for n in 1..=6 {
        let data = leaves(n);
        let tree = MerkleTree::new(&data).unwrap();

        for i in 0..n {
            let proof = tree.proof(i).unwrap();
            for byte in 0..data[i].len() {
                let mut leaf = data[i].clone();
                leaf[byte] ^= 0x01;
                assert!(!verify_proof::<Blake3>(n, i, &leaf, &proof.siblings, &tree.root()).unwrap());
            }
        }
    }
}

#[test]
fn test_tamper_proof_entry() {
    for n in 2..=6 {
        let data = leaves(n);
        let tree = MerkleTree::new(&data).unwrap();

        for i in 0..n {
            let proof = tree.proof(i).unwrap();
            for entry in 0..proof.siblings.len() {
                for byte in 0..32 {
                    let mut siblings = proof.siblings.clone();
                    siblings[entry].0[byte] ^= 0x80;
                    assert!(!verify_proof::<Blake3>(n, i, &data[i], &siblings, &tree.root()).unwrap());
                }
            }
        }
    }
}

#[test]
fn test_tamper_root() {
    for n in 1..=6 {
        let data = leaves(n);
        let tree = MerkleTree::new(&data).unwrap();

        for i in 0..n {
            let proof = tree.proof(i).unwrap();
            for byte in 0..32 {
                let mut root = tree.root();
                root.0[byte] ^= 0x01;
                assert!(!verify_proof::<Blake3>(n, i, &data[i], &proof.siblings, &root).unwrap());
            }
        }
    }
}

#[test]
fn test_three_leaf_root_formula_sha256() {
    let tree = MerkleTree::<Sha256>::with_hasher(&[b"a", b"b", b"c"]).unwrap();

    let h = |data: &[u8]| -> Hash { <Sha256 as labchain_core::HashFunction>::hash(data) };
    let join = |l: Hash, r: Hash| -> Hash { h(&[l.0, r.0].concat()) };
    let expected = join(join(h(b"a"), h(b"b")), join(h(b"c"), h(b"c")));

    assert_eq!(tree.root(), expected);
}

#[test]
fn test_single_leaf_root_is_leaf_digest() {
    let tree = MerkleTree::new(&[b"only"]).unwrap();
    assert_eq!(tree.root(), hash(b"only"));

    let proof = tree.proof(0).unwrap();
    assert!(proof.siblings.is_empty());
    assert!(proof.verify::<Blake3>(b"only", &tree.root()).unwrap());
}

#[test]
fn test_deterministic_root() {
    let data = leaves(11);
    let a = MerkleTree::new(&data).unwrap();
    let b = MerkleTree::new(&data).unwrap();
    assert_eq!(a.root(), b.root());
}

#[test]
fn test_verify_errors() {
    let root = hash_concat(&[b"x"]);
    assert_eq!(
        verify_proof::<Blake3>(4, 4, b"x", &[], &root).unwrap_err(),
        MerkleError::InvalidIndex { index: 4, leaf_count: 4 }
    );
    assert_eq!(
        verify_proof::<Blake3>(4, 0, b"x", &[Hash::ZERO], &root).unwrap_err(),
        MerkleError::MalformedProof { expected: 2, actual: 1 }
    );
}

#[test]
fn test_verify_huge_leaf_count_is_malformed() {
    let root = hash(b"x");
    assert_eq!(
        verify_proof::<Blake3>(usize::MAX, 0, b"x", &[], &root).unwrap_err(),
        MerkleError::MalformedProof {
            expected: usize::BITS as usize,
            actual: 0
        }
    );
}

#[test]
fn test_concurrent_readers() {
    let data = leaves(9);
    let tree = MerkleTree::new(&data).unwrap();

    std::thread::scope(|s| {
        for worker in 0..4 {
            let tree = &tree;
            let data = &data;
            s.spawn(move || {
                for i in (worker..data.len()).step_by(4) {
                    assert!(tree.verify_proof(i, &tree.proof(i).unwrap().siblings).unwrap());
                }
            });
        }
    });
}
