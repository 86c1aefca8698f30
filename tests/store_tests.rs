//! Store Tests
//!
//! Tests verify:
//! - Basic set/get/del/exists semantics
//! - Byte-exact round trips (including empty values)
//! - Concurrent readers and writers

use std::sync::Arc;

use emberkv::Store;

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_store_is_empty() {
    let store = Store::new();
    assert_eq!(store.len(), 0);
    assert!(store.is_empty());
    assert_eq!(store.get(b"anything"), None);
}

#[test]
fn test_set_and_get() {
    let store = Store::new();

    store.set(b"key1".to_vec(), b"value1".to_vec());

    assert_eq!(store.get(b"key1"), Some(b"value1".to_vec()));
    assert!(store.exists(b"key1"));
}

#[test]
fn test_get_is_repeatable() {
    let store = Store::new();
    store.set("key", "value");

    for _ in 0..10 {
        assert_eq!(store.get(b"key"), Some(b"value".to_vec()));
    }
}

#[test]
fn test_empty_value_round_trips() {
    let store = Store::new();
    store.set("key", "");

    assert_eq!(store.get(b"key"), Some(Vec::new()));
    assert!(store.exists(b"key"));
}

#[test]
fn test_binary_value_round_trips() {
    let store = Store::new();
    let value: Vec<u8> = (0..=255).collect();

    store.set(b"bin".to_vec(), value.clone());

    assert_eq!(store.get(b"bin"), Some(value));
}

// =============================================================================
// Delete / Exists Tests
// =============================================================================

#[test]
fn test_del_existing_key() {
    let store = Store::new();
    store.set("key", "value");

    assert!(store.del(b"key"));
    assert_eq!(store.get(b"key"), None);
    assert!(!store.exists(b"key"));
}

#[test]
fn test_del_absent_key() {
    let store = Store::new();
    assert!(!store.del(b"nope"));
}

#[test]
fn test_exists_tracks_last_write() {
    let store = Store::new();

    assert!(!store.exists(b"k"));
    store.set("k", "1");
    assert!(store.exists(b"k"));
    store.del(b"k");
    assert!(!store.exists(b"k"));
    store.set("k", "2");
    assert!(store.exists(b"k"));
}

#[test]
fn test_set_after_del() {
    let store = Store::new();

    store.set("key", "value1");
    store.del(b"key");
    store.set("key", "value2");

    assert_eq!(store.get(b"key"), Some(b"value2".to_vec()));
    assert_eq!(store.len(), 1);
}

// =============================================================================
// Concurrent Access Tests
// =============================================================================

#[test]
fn test_concurrent_reads() {
    let store = Arc::new(Store::new());
    store.set("key", "value");

    crossbeam::scope(|s| {
        for _ in 0..8 {
            s.spawn(|_| {
                for _ in 0..1000 {
                    assert_eq!(store.get(b"key"), Some(b"value".to_vec()));
                    assert!(store.exists(b"key"));
                }
            });
        }
    })
    .unwrap();
}

#[test]
fn test_concurrent_writers_lose_no_updates() {
    let store = Store::new();

    crossbeam::scope(|s| {
        for i in 0..8 {
            let store = &store;
            s.spawn(move |_| {
                for j in 0..250 {
                    store.set(format!("key{}_{}", i, j), format!("value{}_{}", i, j));
                }
            });
        }
    })
    .unwrap();

    assert_eq!(store.len(), 8 * 250);
    for i in 0..8 {
        for j in 0..250 {
            let key = format!("key{}_{}", i, j);
            assert_eq!(
                store.get(key.as_bytes()),
                Some(format!("value{}_{}", i, j).into_bytes())
            );
        }
    }
}

#[test]
fn test_readers_never_see_partial_values() {
    const WRITERS: usize = 4;
    const READERS: usize = 4;
    const ROUNDS: usize = 500;

    let store = Store::new();

    // Every value for writer i is a run of one repeated byte, so a torn
    // value would show up as mixed bytes or a wrong length.
    let value_for = |writer: usize, round: usize| vec![b'a' + writer as u8; 64 + round % 64];

    crossbeam::scope(|s| {
        for writer in 0..WRITERS {
            let store = &store;
            s.spawn(move |_| {
                let key = format!("shared{}", writer);
                for round in 0..ROUNDS {
                    store.set(key.clone(), value_for(writer, round));
                    if round % 7 == 0 {
                        store.del(key.as_bytes());
                    }
                }
            });
        }

        for _ in 0..READERS {
            let store = &store;
            s.spawn(move |_| {
                for round in 0..ROUNDS * 2 {
                    let writer = round % WRITERS;
                    let key = format!("shared{}", writer);
                    if let Some(value) = store.get(key.as_bytes()) {
                        assert!((64..128).contains(&value.len()));
                        assert!(value.iter().all(|&b| b == b'a' + writer as u8));
                    }
                }
            });
        }
    })
    .unwrap();
}

#[test]
fn test_shared_through_arc_across_threads() {
    let store = Arc::new(Store::new());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                store.set(format!("k{}", i), "v");
                assert!(store.exists(format!("k{}", i).as_bytes()));
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 4);
}
