use labchain_core::{Blake3, Block, BlockHeader, Hash, MerkleTree, Sha256};
use labchain_pow::{seal, validate, CancelToken, ParallelMiner, PowConfig, PowError, ProofOfWork};
use std::thread;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn header_for(transactions: &[&[u8]]) -> BlockHeader {
    let tree = MerkleTree::new(transactions).unwrap();
    BlockHeader {
        version: 1,
        prev_hash: Hash([0x11; 32]),
        merkle_root: tree.root(),
        timestamp: 1_650_000_000,
        nonce: 0,
    }
}

#[test]
fn test_mine_difficulty_8() {
    init_tracing();
    let header = header_for(&[b"alice->bob", b"bob->carol", b"carol->dave"]);

    let solution = ProofOfWork::new(&header, 8).unwrap().run(u64::MAX).unwrap();
    assert_eq!(solution.hash.as_bytes()[0], 0x00);
    assert!(solution.hash.leading_zero_bits() >= 8);

    let mut sealed = header.clone();
    sealed.nonce = solution.nonce;
    assert!(validate::<Blake3>(&sealed, 8));
}

#[test]
fn test_timestamp_mutation_invalidates() {
    init_tracing();
    let mut header = header_for(&[b"tx"]);
    seal::<Blake3>(&mut header, &PowConfig::new(16)).unwrap();
    assert!(validate::<Blake3>(&header, 16));

    header.timestamp += 60;
    assert!(!validate::<Blake3>(&header, 16));
}

#[test]
fn test_difficulty_is_bound_into_hash() {
    let mut header = header_for(&[b"tx"]);
    seal::<Blake3>(&mut header, &PowConfig::new(16)).unwrap();

    // The same nonce hashes differently once another difficulty is declared.
    assert_ne!(header.pow_hash::<Blake3>(16), header.pow_hash::<Blake3>(12));
}

#[test]
fn test_nonce_exhausted_is_not_a_false_positive() {
    init_tracing();
    let mut header = header_for(&[b"tx"]);
    let config = PowConfig::new(48).with_max_nonce(64);

    match seal::<Blake3>(&mut header, &config) {
        Err(PowError::NonceExhausted { max_nonce }) => assert_eq!(max_nonce, 64),
        other => panic!("expected NonceExhausted, got {other:?}"),
    }
    assert_eq!(header.nonce, 0);
}

#[test]
fn test_sequential_is_deterministic() {
    let header = header_for(&[b"a", b"b"]);
    let first = ProofOfWork::new(&header, 10).unwrap().run(u64::MAX).unwrap();
    let second = ProofOfWork::new(&header, 10).unwrap().run(u64::MAX).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_parallel_seal_validates() {
    init_tracing();
    let mut header = header_for(&[b"a", b"b", b"c", b"d", b"e"]);
    let config = PowConfig::new(12).with_workers(4);

    let solution = seal::<Sha256>(&mut header, &config).unwrap();
    assert_eq!(header.nonce, solution.nonce);
    assert!(validate::<Sha256>(&header, 12));
}

#[test]
fn test_external_cancellation() {
    init_tracing();
    let header = header_for(&[b"tx"]);
    let miner = ParallelMiner::new(PowConfig::new(256).with_workers(2)).unwrap();
    let cancel = CancelToken::new();

    let result = thread::scope(|s| {
        let canceller = cancel.clone();
        s.spawn(move || {
            thread::sleep(Duration::from_millis(50));
            canceller.cancel();
        });
        miner.mine(&header, &cancel)
    });

    assert!(matches!(result, Err(PowError::Cancelled)));
}

#[test]
fn test_block_pipeline() {
    let transactions = vec![b"tx1".to_vec(), b"tx2".to_vec(), b"tx3".to_vec()];
    let mut block = Block::new(1, Hash::ZERO, transactions.clone(), 1_650_000_000).unwrap();

    seal::<Blake3>(&mut block.header, &PowConfig::new(8)).unwrap();
    assert!(validate::<Blake3>(&block.header, 8));
    assert_eq!(block.hash(8).as_bytes()[0], 0x00);

    // SPV-style check: the proof alone ties a transaction to the sealed header.
    let proof = block.prove_transaction(1).unwrap();
    assert!(proof
        .verify::<Blake3>(&transactions[1], &block.header.merkle_root)
        .unwrap());
}
