use daneel_core::Symbol;

use crate::{CacheKey, OpCode, TapeBuilder, TapeCache};

fn sample_tape() -> crate::Tape {
    let mut b = TapeBuilder::new([Symbol::from_raw(3)]);
    let x = b.input_slot(0);
    let out = b.push(OpCode::Sin, x, 0, 0);
    b.finish(vec![out], 1, 1)
}

#[test]
fn store_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TapeCache::open(dir.path()).unwrap();
    let key = CacheKey::new(b"sin(j0)", &[3]);
    let tape = sample_tape();

    assert!(cache.load(key).is_none());
    cache.store(key, &tape).unwrap();
    assert_eq!(cache.load(key), Some(tape));
}

#[test]
fn keys_differ_by_expression_and_symbols() {
    let a = CacheKey::new(b"sin(j0)", &[3]);
    let b = CacheKey::new(b"cos(j0)", &[3]);
    let c = CacheKey::new(b"sin(j0)", &[4]);
    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_eq!(a, CacheKey::new(b"sin(j0)", &[3]));
}

#[test]
fn corrupt_artifact_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TapeCache::open(dir.path()).unwrap();
    let key = CacheKey::new(b"sin(j0)", &[3]);
    cache.store(key, &sample_tape()).unwrap();

    // Flip a payload byte on disk.
    let file = dir.path().join(format!("tape-{key}.bin"));
    let mut bytes = std::fs::read(&file).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    std::fs::write(&file, &bytes).unwrap();

    assert!(cache.load(key).is_none());
    assert!(!file.exists(), "corrupt artifact should be deleted");
}
