use std::sync::atomic::{AtomicUsize, Ordering};

use merkletree::{
    check,
    config::{Config, Mode},
    hasher::{hash2, sha256, Digest, Sha256Hasher},
    verify, CancelToken, MerkleError, MerkleTree, Proof,
};

fn blocks(n: usize) -> Vec<Vec<u8>> {
    (0..n).map(|i| sha256(format!("block-{}", i)).to_vec()).collect()
}

fn h(a: &[u8], b: &[u8]) -> Digest {
    hash2(&Sha256Hasher, a, b).unwrap()
}

fn all_modes() -> [Mode; 3] {
    [Mode::ProofGen, Mode::TreeBuild, Mode::ProofGenAndTreeBuild]
}

fn proof_of(tree: &MerkleTree, index: usize) -> Proof {
    match tree.mode() {
        Mode::TreeBuild => tree.generate_proof(&tree.leaves()[index]).unwrap(),
        _ => tree.proofs()[index].clone(),
    }
}

#[test]
fn test_concrete_four_blocks() {
    let tree = MerkleTree::new(
        Config::with_mode(Mode::ProofGenAndTreeBuild),
        &["a", "b", "c", "d"],
    )
    .unwrap();
    let ab = h(b"a", b"b");
    let cd = h(b"c", b"d");
    assert_eq!(tree.levels()[0].len(), 4);
    assert_eq!(tree.levels()[1], vec![ab.clone(), cd.clone()]);
    assert_eq!(tree.root(), h(&ab, &cd).as_slice());

    let proof = tree.generate_proof("a").unwrap();
    assert_eq!(proof.siblings, vec![b"b".to_vec(), cd.clone()]);
    // "a" and then H(a ++ b) are hashed on the left at both levels
    assert_eq!(proof.path, 0b11);
    assert_eq!(&proof, tree.proof(0).unwrap());

    let proof = tree.generate_proof("d").unwrap();
    assert_eq!(proof.siblings, vec![b"c".to_vec(), ab]);
    assert_eq!(proof.path, 0);
}

#[test]
fn test_round_trip_all_modes() {
    for mode in all_modes() {
        for n in [2, 3, 5, 8, 13, 64, 100] {
            let data = blocks(n);
            let tree = MerkleTree::new(Config::with_mode(mode), &data).unwrap();
            assert_eq!(tree.depth(), (n as f64).log2().ceil() as u32);
            for (i, block) in data.iter().enumerate() {
                let proof = proof_of(&tree, i);
                assert_eq!(proof.depth(), tree.depth() as usize);
                assert!(tree.verify(block, &proof).unwrap(), "mode {} n {} i {}", mode, n, i);
                assert!(verify(block, &proof, tree.root(), &Sha256Hasher).unwrap());
            }
        }
    }
}

#[test]
fn test_roots_agree_across_modes() {
    for n in [2, 3, 7, 9, 33] {
        let data = blocks(n);
        let roots: Vec<Vec<u8>> = all_modes()
            .into_iter()
            .map(|mode| MerkleTree::new(Config::with_mode(mode), &data).unwrap().root().to_vec())
            .collect();
        assert_eq!(roots[0], roots[1]);
        assert_eq!(roots[1], roots[2]);
    }
}

#[test]
fn test_determinism() {
    let data = blocks(77);
    let config = Config {
        mode: Mode::ProofGenAndTreeBuild,
        sort_pairs: true,
        ..Config::default()
    };
    let a = MerkleTree::new(config.clone(), &data).unwrap();
    let b = MerkleTree::new(config, &data).unwrap();
    assert_eq!(a.root(), b.root());
    assert_eq!(a.proofs(), b.proofs());
    assert_eq!(a.levels(), b.levels());
}

#[test]
fn test_streaming_indexed_equivalence() {
    for sort_pairs in [false, true] {
        for n in [2, 3, 4, 6, 11, 31, 32, 257] {
            let data = blocks(n);
            let config = Config {
                mode: Mode::ProofGenAndTreeBuild,
                sort_pairs,
                ..Config::default()
            };
            let tree = MerkleTree::new(config, &data).unwrap();
            for (i, block) in data.iter().enumerate() {
                let indexed = tree.generate_proof(block).unwrap();
                assert_eq!(&indexed, tree.proof(i).unwrap(), "n {} leaf {}", n, i);
            }
            check::check_levels(&tree).unwrap();
            check::check_proofs(&tree).unwrap();
        }
    }
}

#[test]
fn test_parallel_matches_sequential() {
    let _ = env_logger::builder().is_test(true).try_init();
    let data = blocks(1000);
    let sequential = MerkleTree::new(Config::with_mode(Mode::ProofGenAndTreeBuild), &data).unwrap();
    for num_threads in [1, 2, 4, 7] {
        let config = Config {
            mode: Mode::ProofGenAndTreeBuild,
            run_in_parallel: true,
            num_threads,
            ..Config::default()
        };
        let parallel = MerkleTree::new(config, &data).unwrap();
        assert_eq!(parallel.root(), sequential.root());
        assert_eq!(parallel.proofs(), sequential.proofs());
        assert_eq!(parallel.levels(), sequential.levels());
        assert_eq!(
            parallel.leaf_position(&data[999]),
            sequential.leaf_position(&data[999])
        );
    }

    let auto = Config {
        mode: Mode::TreeBuild,
        run_in_parallel: true,
        ..Config::default()
    };
    let tree = MerkleTree::new(auto, &data).unwrap();
    assert_eq!(tree.root(), sequential.root());
    assert_eq!(tree.generate_proof(&data[500]).unwrap(), sequential.proofs()[500]);
}

#[test]
fn test_tamper_sensitivity() {
    for n in [3, 5, 13, 16] {
        tamper_all_proofs(n);
    }
}

fn tamper_all_proofs(n: usize) {
    let data = blocks(n);
    let tree = MerkleTree::new(Config::with_mode(Mode::ProofGenAndTreeBuild), &data).unwrap();
    let root = tree.root().to_vec();
    for (i, block) in data.iter().enumerate() {
        let proof = tree.proof(i).unwrap();
        assert!(verify(block, proof, &root, &Sha256Hasher).unwrap());

        let mut bad_block = block.clone();
        bad_block[i] ^= 0x01;
        assert!(!verify(&bad_block, proof, &root, &Sha256Hasher).unwrap());

        for level in 0..proof.depth() {
            let mut bad_sibling = proof.clone();
            bad_sibling.siblings[level][0] ^= 0x80;
            assert!(!verify(block, &bad_sibling, &root, &Sha256Hasher).unwrap());

            let mut bad_path = proof.clone();
            bad_path.path ^= 1 << level;
            assert!(
                !verify(block, &bad_path, &root, &Sha256Hasher).unwrap(),
                "n {} leaf {} level {}",
                n,
                i,
                level
            );
        }

        let mut bad_root = root.clone();
        bad_root[31] ^= 0xff;
        assert!(!verify(block, proof, &bad_root, &Sha256Hasher).unwrap());
    }
}

#[test]
fn test_odd_leaf_duplication_propagates() {
    let tree = MerkleTree::new(Config::with_mode(Mode::ProofGenAndTreeBuild), &["A", "B", "C"]).unwrap();
    let ab = h(b"A", b"B");
    assert_eq!(tree.levels()[1], vec![ab.clone(), b"C".to_vec()]);
    assert_ne!(tree.levels()[1][1], h(b"C", b"C"));
    assert_eq!(tree.root(), h(&ab, b"C").as_slice());

    let proof = tree.generate_proof("C").unwrap();
    assert_eq!(proof.siblings, vec![b"C".to_vec(), ab]);
    assert!(tree.verify("C", &proof).unwrap());
    assert!(!tree.verify("D", &proof).unwrap());
}

#[test]
fn test_padded_proof_rejected() {
    let data = blocks(4);
    let tree = MerkleTree::new(Config::default(), &data).unwrap();
    let proof = tree.proof(0).unwrap();

    let mut padded = proof.clone();
    padded.siblings.insert(0, data[0].clone());
    padded.path <<= 1;
    assert!(!verify(&data[0], &padded, tree.root(), &Sha256Hasher).unwrap());
    assert!(matches!(
        tree.verify(&data[0], &padded),
        Err(MerkleError::InvalidInput(_))
    ));

    padded.path |= 1;
    assert!(matches!(
        tree.verify(&data[0], &padded),
        Err(MerkleError::InvalidInput(_))
    ));
}

#[test]
fn test_duplicate_leaves_verify() {
    let data = ["a", "a", "b", "c"];
    let tree = MerkleTree::new(Config::with_mode(Mode::ProofGenAndTreeBuild), &data).unwrap();
    assert_eq!(tree.levels()[1][0], b"a".to_vec());
    assert_eq!(tree.leaf_position(b"a"), Some(0));
    for (i, block) in data.iter().enumerate() {
        assert!(tree.verify(block, tree.proof(i).unwrap()).unwrap(), "leaf {}", i);
    }
    assert_eq!(tree.proof(0), tree.proof(1));
    assert_eq!(&tree.generate_proof("a").unwrap(), tree.proof(1).unwrap());
}

#[test]
fn test_random_padding_round_trip() {
    for n in [3, 5, 7, 21] {
        let data = blocks(n);
        let config = Config {
            mode: Mode::ProofGenAndTreeBuild,
            no_duplicates: true,
            ..Config::default()
        };
        let tree = MerkleTree::new(config, &data).unwrap();
        for (i, block) in data.iter().enumerate() {
            assert_eq!(&tree.generate_proof(block).unwrap(), tree.proof(i).unwrap());
            assert!(tree.verify(block, tree.proof(i).unwrap()).unwrap());
        }
        check::check_levels(&tree).unwrap();
    }
}

#[test]
fn test_sorted_pairs_invariance() {
    let x = sha256("x").to_vec();
    let y = sha256("y").to_vec();
    let z = sha256("z").to_vec();
    let config = Config {
        mode: Mode::TreeBuild,
        sort_pairs: true,
        ..Config::default()
    };
    let xy = MerkleTree::new(config.clone(), &[x.clone(), y.clone(), z.clone()]).unwrap();
    let yx = MerkleTree::new(config, &[y.clone(), x.clone(), z.clone()]).unwrap();
    assert_eq!(xy.levels()[1][0], yx.levels()[1][0]);
    assert_eq!(xy.root(), yx.root());

    let unsorted = MerkleTree::new(Config::with_mode(Mode::TreeBuild), &[y, x, z]).unwrap();
    assert_ne!(unsorted.root(), yx.root());
}

#[test]
fn test_sorted_tree_is_order_independent() {
    let mut data = blocks(19);
    let a = MerkleTree::new(Config::sorted(Mode::ProofGenAndTreeBuild), &data).unwrap();
    data.reverse();
    let b = MerkleTree::new(Config::sorted(Mode::ProofGenAndTreeBuild), &data).unwrap();
    assert_eq!(a.root(), b.root());
    assert_eq!(a.leaves(), b.leaves());
    for block in &data {
        let proof = b.generate_proof(block).unwrap();
        assert!(a.verify(block, &proof).unwrap());
    }
}

#[test]
fn test_two_leaf_boundary() {
    for mode in all_modes() {
        let tree = MerkleTree::new(Config::with_mode(mode), &["left", "right"]).unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.root(), h(b"left", b"right").as_slice());
        let proof = proof_of(&tree, 1);
        assert_eq!(proof.siblings, vec![b"left".to_vec()]);
        assert_eq!(proof.path, 0);
    }

    let config = Config {
        sort_pairs: true,
        ..Config::default()
    };
    let tree = MerkleTree::new(config, &["right", "left"]).unwrap();
    assert_eq!(tree.root(), h(b"left", b"right").as_slice());
}

#[test]
fn test_cancel_between_levels() {
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let calls = AtomicUsize::new(0);
    let hasher = move |data: &[u8]| -> anyhow::Result<Digest> {
        calls.fetch_add(1, Ordering::SeqCst);
        trigger.cancel();
        Ok(sha256(data).to_vec())
    };
    let config = Config {
        cancel: cancel.clone(),
        ..Config::with_hasher(hasher)
    };
    let res = MerkleTree::new(config, &blocks(8));
    assert!(matches!(res, Err(MerkleError::Cancelled)));
    assert!(cancel.is_cancelled());
}

#[test]
fn test_cancel_rejects_on_demand_proofs() {
    let config = Config::with_mode(Mode::TreeBuild);
    let cancel = config.cancel.clone();
    let tree = MerkleTree::new(config, &["a", "b", "c"]).unwrap();
    assert!(tree.generate_proof("b").is_ok());
    cancel.cancel();
    assert!(matches!(
        tree.generate_proof("b"),
        Err(MerkleError::Cancelled)
    ));
}

#[test]
fn test_custom_hasher() {
    let xor_fold = |data: &[u8]| -> anyhow::Result<Digest> {
        let mut out = vec![0u8; 4];
        for (i, b) in data.iter().enumerate() {
            out[i % 4] ^= b.rotate_left(i as u32 % 8);
        }
        Ok(out)
    };
    let config = Config {
        mode: Mode::ProofGenAndTreeBuild,
        ..Config::with_hasher(xor_fold)
    };
    let data = blocks(10);
    let tree = MerkleTree::new(config, &data).unwrap();
    assert_eq!(tree.root().len(), 4);
    for (i, block) in data.iter().enumerate() {
        assert!(tree.verify(block, tree.proof(i).unwrap()).unwrap());
        assert!(!verify(block, tree.proof(i).unwrap(), tree.root(), &Sha256Hasher).unwrap());
    }
}

#[test]
fn test_proof_codec_round_trip() {
    let data = blocks(12);
    let tree = MerkleTree::new(Config::default(), &data).unwrap();
    let bz = tree.proof(7).unwrap().to_bytes().unwrap();
    let restored = Proof::from_bytes(&bz).unwrap();
    assert!(tree.verify(&data[7], &restored).unwrap());
}
