//! End-to-end build and resolve behaviour.

use mdag_core::{
    Algorithm, ChunkerConfig, DagBuilder, DagResolver, Directory, ErrorKind, File, FileStore,
    HashFunction, KvStore, MemoryStore, Node, Object, StoreConfig, build, load_path, resolve,
    split,
};
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

const THRESHOLD: usize = 256 * 1024;

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// root/
///   a/
///     b/
///       c      "see"
///   top.txt    "top level"
fn sample_tree() -> Node {
    let b = Directory::with_children("b", [File::new("c", "see").into()]);
    let a = Directory::with_children("a", [b.into()]);
    Directory::with_children("root", [a.into(), File::new("top.txt", "top level").into()]).into()
}

#[test]
fn determinism_fresh_and_populated_store() {
    let store = MemoryStore::new();
    let tree = sample_tree();

    let first = build(&tree, &store, &Algorithm::Blake3).unwrap();
    let count = store.len();
    let second = build(&tree, &store, &Algorithm::Blake3).unwrap();

    assert_eq!(first, second);
    assert_eq!(store.len(), count);

    let other = MemoryStore::new();
    assert_eq!(build(&tree, &other, &Algorithm::Blake3).unwrap(), first);
}

#[test]
fn dedup_identical_file_contents() {
    let store = MemoryStore::new();
    let dir = Directory::with_children(
        "root",
        [
            File::new("one.txt", "identical bytes").into(),
            File::new("two.txt", "identical bytes").into(),
        ],
    );

    let root = build(&dir.into(), &store, &Algorithm::Blake3).unwrap();

    // one blob shared by both entries + the tree
    assert_eq!(store.len(), 2);
    let Object::Tree(links) = Object::decode(&store.get(&root).unwrap()).unwrap() else {
        panic!("expected a tree");
    };
    assert_eq!(links[0].hash(), links[1].hash());
}

#[test]
fn dedup_identical_large_files() {
    let store = MemoryStore::new();
    let data = pattern(THRESHOLD * 2 + 17);
    let dir = Directory::with_children(
        "root",
        [
            File::new("copy1", data.clone()).into(),
            File::new("copy2", data).into(),
        ],
    );

    build(&dir.into(), &store, &Algorithm::Blake3).unwrap();

    // three chunks + one list + the tree
    assert_eq!(store.len(), 5);
}

#[test]
fn second_put_never_changes_stored_bytes() {
    let store = MemoryStore::new();
    let hash = build(&File::new("f", "original").into(), &store, &Algorithm::Blake3).unwrap();
    let before = store.get(&hash).unwrap();

    store.put(&hash, b"something else").unwrap();
    build(&File::new("g", "original").into(), &store, &Algorithm::Blake3).unwrap();

    assert_eq!(store.get(&hash).unwrap(), before);
}

#[test]
fn round_trip_around_threshold() {
    for len in [0, 1, THRESHOLD - 1, THRESHOLD, THRESHOLD + 1, THRESHOLD * 3] {
        let store = MemoryStore::new();
        let data = pattern(len);
        let root = build(&File::new("f", data.clone()).into(), &store, &Algorithm::Blake3).unwrap();

        assert_eq!(resolve(&store, &root, "").unwrap(), data, "length {}", len);

        let object = Object::decode(&store.get(&root).unwrap()).unwrap();
        if len <= THRESHOLD {
            assert!(matches!(object, Object::Blob(_)), "length {}", len);
        } else {
            assert!(matches!(object, Object::List(_)), "length {}", len);
        }
    }
}

#[test]
fn chunk_boundary_example() {
    assert_eq!(
        split(b"ABCDEFGHI", 4).unwrap(),
        vec![&b"ABCD"[..], &b"EFGH"[..], &b"I"[..]]
    );

    let store = MemoryStore::new();
    let root = DagBuilder::new(&store, &Algorithm::Blake3)
        .with_chunker(ChunkerConfig::new(4).unwrap())
        .build(&File::new("f", "ABCDEFGHI").into())
        .unwrap();

    let Object::List(links) = Object::decode(&store.get(&root).unwrap()).unwrap() else {
        panic!("expected a list");
    };
    let sizes: Vec<u64> = links.iter().map(|l| l.size()).collect();
    assert_eq!(sizes, vec![4, 4, 1]);
    assert_eq!(resolve(&store, &root, "").unwrap(), b"ABCDEFGHI");
}

#[test]
fn path_resolution() {
    let store = MemoryStore::new();
    let root = build(&sample_tree(), &store, &Algorithm::Blake3).unwrap();

    assert_eq!(resolve(&store, &root, "a/b/c").unwrap(), b"see");
    assert_eq!(resolve(&store, &root, "/a//b/c/").unwrap(), b"see");
    assert_eq!(resolve(&store, &root, "top.txt").unwrap(), b"top level");

    let err = resolve(&store, &root, "a/x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PathNotFound);

    let err = resolve(&store, &root, "a/b/c/d").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PathNotFound);
}

#[test]
fn missing_root_is_not_found() {
    let store = MemoryStore::new();
    let root = Algorithm::Blake3.digest(b"never stored");
    let err = resolve(&store, &root, "a").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn structural_sharing() {
    let shared = || {
        Directory::with_children(
            "lib",
            [
                File::new("mod.rs", "pub mod x;").into(),
                File::new("x.rs", "fn x() {}").into(),
            ],
        )
    };
    let first = Directory::with_children(
        "first",
        [shared().into(), File::new("README", "first").into()],
    );
    let second = Directory::with_children(
        "second",
        [File::new("other", "second").into(), shared().into()],
    );

    let store = MemoryStore::new();
    let root1 = build(&first.into(), &store, &Algorithm::Blake3).unwrap();
    let root2 = build(&second.into(), &store, &Algorithm::Blake3).unwrap();
    assert_ne!(root1, root2);

    let resolver = DagResolver::new(&store);
    let (lib1, _) = resolver.lookup(&root1, "lib").unwrap();
    let (lib2, _) = resolver.lookup(&root2, "lib").unwrap();
    assert_eq!(lib1, lib2);

    // 2 shared blobs + shared tree, then README + root1, other + root2
    assert_eq!(store.len(), 7);
}

#[test]
fn directory_terminal_is_error() {
    let store = MemoryStore::new();
    let root = build(&sample_tree(), &store, &Algorithm::Blake3).unwrap();

    for path in ["", "/", "a", "a/b", "a/b/"] {
        let err = resolve(&store, &root, path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IsDirectory, "path {:?}", path);
    }
}

#[test]
fn zero_byte_file_and_empty_directory() {
    let store = MemoryStore::new();
    let dir = Directory::with_children(
        "root",
        [
            File::new("empty.txt", "").into(),
            Directory::new("nothing").into(),
            File::new("also_empty", "").into(),
        ],
    );
    let root = build(&dir.into(), &store, &Algorithm::Blake3).unwrap();

    assert_eq!(resolve(&store, &root, "empty.txt").unwrap(), b"");
    assert_eq!(resolve(&store, &root, "also_empty").unwrap(), b"");
    assert_eq!(
        resolve(&store, &root, "nothing").unwrap_err().kind(),
        ErrorKind::IsDirectory
    );

    let (_, object) = DagResolver::new(&store).lookup(&root, "nothing").unwrap();
    assert_eq!(object, Object::Tree(Vec::new()));

    // empty blob (shared) + empty tree + root
    assert_eq!(store.len(), 3);
}

#[test]
fn concurrent_builds_share_one_store() {
    let store = MemoryStore::new();
    let tree = sample_tree();
    let expected = build(&tree, &MemoryStore::new(), &Algorithm::Blake3).unwrap();

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| build(&tree, &store, &Algorithm::Blake3).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });

    assert_eq!(resolve(&store, &expected, "a/b/c").unwrap(), b"see");
}

#[test]
fn file_store_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    fs::create_dir_all(src.join("nested")).unwrap();
    fs::write(src.join("small.txt"), b"small").unwrap();
    fs::write(src.join("nested/big.bin"), pattern(5000)).unwrap();

    let config = StoreConfig::new(Algorithm::Sha256, 1024).unwrap();
    let store = FileStore::init(temp_dir.path().join("store"), config).unwrap();
    let node = load_path(&src).unwrap();
    let root = DagBuilder::new(&store, &config.algorithm)
        .with_chunker(config.chunker)
        .build(&node)
        .unwrap();

    let reopened = FileStore::open(temp_dir.path().join("store")).unwrap();
    let resolver = DagResolver::new(&reopened).verify_with(&Algorithm::Sha256);
    assert_eq!(resolver.resolve(&root, "small.txt").unwrap(), b"small");
    assert_eq!(resolver.resolve(&root, "nested/big.bin").unwrap(), pattern(5000));

    let (_, big) = resolver.lookup(&root, "nested/big.bin").unwrap();
    assert_eq!(big.links().len(), 5);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    /// Any content round-trips for any threshold
    #[test]
    fn prop_round_trip(data in prop::collection::vec(any::<u8>(), 0..2048), threshold in 1usize..300) {
        let store = MemoryStore::new();
        let root = DagBuilder::new(&store, &Algorithm::Blake3)
            .with_chunker(ChunkerConfig::new(threshold)?)
            .build_bytes(&data)?;
        prop_assert_eq!(resolve(&store, &root, "")?, data);
    }

    /// Every stored chunk respects the threshold
    #[test]
    fn prop_chunk_bound(len in 0usize..4096, threshold in 1usize..512) {
        let store = MemoryStore::new();
        DagBuilder::new(&store, &Algorithm::Blake3)
            .with_chunker(ChunkerConfig::new(threshold)?)
            .build_bytes(&pattern(len))?;

        for hash in store.hashes() {
            if let Object::Blob(data) = Object::decode(&store.get(&hash)?)? {
                prop_assert!(data.len() <= threshold);
            }
        }
    }
}
