//! Store contract tests
//!
//! Every backend must satisfy the same compare-and-swap contract. Each test
//! below is written once against `&dyn Store` and run on both backends:
//!
//! 1. **Reads** - missing keys, version tokens, prefix scans
//! 2. **Checks** - absent/present/stale expectations
//! 3. **Atomicity** - a failed check applies no write
//! 4. **Contention** - concurrent read-modify-write loses no update

use fable_core::{EntityKind, Error, Key, KeyPrefix};
use fable_storage::{CommitOutcome, DocumentStore, KvStore, Store};
use std::sync::{Arc, Barrier};
use std::thread;

// ============================================================================
// Test Helpers
// ============================================================================

fn backends() -> Vec<Arc<dyn Store>> {
    vec![Arc::new(KvStore::new()), Arc::new(DocumentStore::new())]
}

fn user(id: &str) -> Key {
    Key::primary(EntityKind::User, "global", id)
}

fn put(store: &dyn Store, key: &Key, value: &[u8]) {
    let mut txn = store.begin_transaction();
    txn.set(key.clone(), value.to_vec());
    assert!(txn.commit().unwrap().is_committed());
}

// ============================================================================
// SECTION 1: Reads
// ============================================================================

#[test]
fn test_get_missing_is_none() {
    for store in backends() {
        assert!(store.get(&user("nobody")).unwrap().is_none(), "{}", store.name());
    }
}

#[test]
fn test_write_changes_version() {
    for store in backends() {
        let key = user("u1");
        put(store.as_ref(), &key, b"one");
        let first = store.get(&key).unwrap().unwrap();
        put(store.as_ref(), &key, b"two");
        let second = store.get(&key).unwrap().unwrap();

        assert_eq!(second.value, b"two");
        assert_ne!(first.version, second.version, "{}", store.name());
    }
}

#[test]
fn test_scan_prefix_only_returns_matching_index_entries() {
    for store in backends() {
        let mut txn = store.begin_transaction();
        txn.set(Key::index(EntityKind::Character, "by_inventory", "g1:u1", "c1"), vec![1])
            .set(Key::index(EntityKind::Character, "by_inventory", "g1:u1", "c2"), vec![2])
            .set(Key::index(EntityKind::Character, "by_inventory", "g1:u2", "c3"), vec![3])
            .set(Key::primary(EntityKind::Character, "g1", "c1"), vec![1]);
        txn.commit().unwrap();

        let hits = store
            .scan_prefix(&KeyPrefix::index(EntityKind::Character, "by_inventory", "g1:u1"))
            .unwrap();
        let ids: Vec<_> = hits.iter().map(|(k, _)| k.id()).collect();
        assert_eq!(ids, vec!["c1", "c2"], "{}", store.name());
    }
}

// ============================================================================
// SECTION 2: Checks
// ============================================================================

#[test]
fn test_absent_check_fails_once_created() {
    for store in backends() {
        let key = user("u1");
        put(store.as_ref(), &key, b"x");

        let mut txn = store.begin_transaction();
        txn.check(key.clone(), None).set(key.clone(), b"y".to_vec());
        assert_eq!(
            txn.commit().unwrap(),
            CommitOutcome::Conflict { key: key.clone() },
            "{}",
            store.name()
        );
    }
}

#[test]
fn test_stale_token_conflicts() {
    for store in backends() {
        let key = user("u1");
        put(store.as_ref(), &key, b"x");
        let stale = store.get(&key).unwrap().unwrap().version;
        put(store.as_ref(), &key, b"y");

        let mut txn = store.begin_transaction();
        txn.check(key.clone(), Some(stale)).set(key.clone(), b"z".to_vec());
        assert!(!txn.commit().unwrap().is_committed(), "{}", store.name());
        assert_eq!(store.get(&key).unwrap().unwrap().value, b"y");
    }
}

#[test]
fn test_fresh_token_commits() {
    for store in backends() {
        let key = user("u1");
        put(store.as_ref(), &key, b"x");
        let token = store.get(&key).unwrap().unwrap().version;

        let mut txn = store.begin_transaction();
        txn.check(key.clone(), Some(token)).set(key.clone(), b"y".to_vec());
        assert!(txn.commit().unwrap().is_committed(), "{}", store.name());
    }
}

// ============================================================================
// SECTION 3: Atomicity
// ============================================================================

#[test]
fn test_failed_check_applies_no_write() {
    for store in backends() {
        let guarded = user("guarded");
        put(store.as_ref(), &guarded, b"x");
        let other = Key::index(EntityKind::User, "by_name", "n", "guarded");

        let mut txn = store.begin_transaction();
        txn.check(guarded.clone(), None)
            .set(guarded.clone(), b"y".to_vec())
            .set(other.clone(), b"y".to_vec());
        assert!(!txn.commit().unwrap().is_committed());

        assert!(store.get(&other).unwrap().is_none(), "{}", store.name());
        assert_eq!(store.get(&guarded).unwrap().unwrap().value, b"x");
    }
}

#[test]
fn test_delete_removes_key_and_its_scan_entry() {
    for store in backends() {
        let old = Key::index(EntityKind::Character, "by_inventory", "g1:u1", "c1");
        let new = Key::index(EntityKind::Character, "by_inventory", "g1:u2", "c1");
        put(store.as_ref(), &old, b"c1");

        let token = store.get(&old).unwrap().unwrap().version;
        let mut txn = store.begin_transaction();
        txn.check(old.clone(), Some(token))
            .delete(old.clone())
            .set(new.clone(), b"c1".to_vec());
        assert!(txn.commit().unwrap().is_committed(), "{}", store.name());

        assert!(store.get(&old).unwrap().is_none(), "{}", store.name());
        let prefix = KeyPrefix::Index {
            kind: EntityKind::Character,
            index: "by_inventory".into(),
            value: "g1:u1".into(),
        };
        assert!(store.scan_prefix(&prefix).unwrap().is_empty(), "{}", store.name());
        assert_eq!(store.get(&new).unwrap().unwrap().value, b"c1");
    }
}

#[test]
fn test_failed_check_keeps_staged_delete_unapplied() {
    for store in backends() {
        let guarded = user("guarded");
        let doomed = user("doomed");
        put(store.as_ref(), &guarded, b"x");
        put(store.as_ref(), &doomed, b"x");

        let mut txn = store.begin_transaction();
        txn.check(guarded.clone(), None).delete(doomed.clone());
        assert!(!txn.commit().unwrap().is_committed());
        assert!(store.get(&doomed).unwrap().is_some(), "{}", store.name());
    }
}

#[test]
fn test_closed_store_rejects_commit() {
    for store in backends() {
        store.close();
        let mut txn = store.begin_transaction();
        txn.set(user("u1"), vec![]);
        assert!(matches!(txn.commit(), Err(Error::Closed)), "{}", store.name());
    }
}

// ============================================================================
// SECTION 4: Contention
// ============================================================================

/// Each thread increments a shared counter with a check-and-set loop. The
/// final value must equal the number of increments.
#[test]
fn test_concurrent_increments_are_not_lost() {
    const THREADS: usize = 8;
    const PER_THREAD: u64 = 50;

    for store in backends() {
        let key = user("counter");
        put(store.as_ref(), &key, &0u64.to_le_bytes());

        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                let key = key.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let mut conflicts = 0u64;
                    for _ in 0..PER_THREAD {
                        loop {
                            let record = store.get(&key).unwrap().unwrap();
                            let mut buf = [0u8; 8];
                            buf.copy_from_slice(&record.value);
                            let next = u64::from_le_bytes(buf) + 1;

                            let mut txn = store.begin_transaction();
                            txn.check(key.clone(), Some(record.version))
                                .set(key.clone(), next.to_le_bytes().to_vec());
                            if txn.commit().unwrap().is_committed() {
                                break;
                            }
                            conflicts += 1;
                        }
                    }
                    conflicts
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        let record = store.get(&key).unwrap().unwrap();
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&record.value);
        assert_eq!(
            u64::from_le_bytes(buf),
            THREADS as u64 * PER_THREAD,
            "{}",
            store.name()
        );
    }
}

/// Many threads race to create the same record. Exactly one wins.
#[test]
fn test_concurrent_create_has_one_winner() {
    const THREADS: usize = 8;

    for store in backends() {
        let key = user("singleton");
        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                let key = key.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let mut txn = store.begin_transaction();
                    txn.check(key.clone(), None).set(key, vec![i as u8]);
                    txn.commit().unwrap().is_committed()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1, "{}", store.name());
    }
}
