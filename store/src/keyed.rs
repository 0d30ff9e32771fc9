//! Arena of records keyed by identifier, with one lock per record.
//!
//! The outer map lock is only held long enough to find (or create) an entry;
//! work on a record happens under that record's own mutex. Records are never
//! removed, so an `Arc` handed out stays the live record for its key.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Why [`KeyedStore::insert_with`] did not insert.
#[derive(Debug, PartialEq, Eq)]
pub enum InsertError<E> {
    /// A record already exists for the key; the initializer was not run.
    Duplicate,
    /// The initializer refused to build the record.
    Init(E),
}

pub struct KeyedStore<K, V> {
    entries: RwLock<HashMap<K, Arc<Mutex<V>>>>,
}

impl<K, V> KeyedStore<K, V>
where
    K: Hash + Eq + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a record built by `init`, unless the key is already taken.
    ///
    /// The key is checked and the record inserted under the map's write lock,
    /// so two racing inserts for the same key cannot both run `init`. `init`
    /// may perform side effects on other components (reserving slots, for
    /// example); it runs only when the key is free, and nothing is inserted if
    /// it fails.
    pub fn insert_with<E>(
        &self,
        key: K,
        init: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<Mutex<V>>, InsertError<E>> {
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return Err(InsertError::Duplicate);
        }
        let record = Arc::new(Mutex::new(init().map_err(InsertError::Init)?));
        entries.insert(key, Arc::clone(&record));
        Ok(record)
    }

    /// The record for `key`, if any. Lock it to read or mutate.
    pub fn get(&self, key: &K) -> Option<Arc<Mutex<V>>> {
        self.entries.read().get(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Run `f` with exclusive access to the record for `key`.
    pub fn with<R>(&self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        let record = self.get(key)?;
        let mut guard = record.lock();
        Some(f(&mut guard))
    }

    pub fn keys(&self) -> Vec<K> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<K, V> KeyedStore<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// A copy of the record for `key`, taken under its lock.
    pub fn snapshot(&self, key: &K) -> Option<V> {
        self.with(key, |record| record.clone())
    }
}

impl<K, V> Default for KeyedStore<K, V>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn insert_then_read_back() {
        let store: KeyedStore<u32, String> = KeyedStore::new();
        store
            .insert_with(1, || Ok::<_, ()>("one".to_string()))
            .unwrap();
        assert_eq!(store.snapshot(&1).as_deref(), Some("one"));
        assert!(store.contains(&1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn duplicate_key_skips_initializer() {
        let store: KeyedStore<u32, u32> = KeyedStore::new();
        store.insert_with(7, || Ok::<_, ()>(1)).unwrap();
        let mut ran = false;
        let result = store.insert_with(7, || {
            ran = true;
            Ok::<_, ()>(2)
        });
        assert_eq!(result.unwrap_err(), InsertError::Duplicate);
        assert!(!ran, "initializer must not run for a taken key");
        assert_eq!(store.snapshot(&7), Some(1));
    }

    #[test]
    fn failed_initializer_inserts_nothing() {
        let store: KeyedStore<u32, u32> = KeyedStore::new();
        let result = store.insert_with(3, || Err::<u32, _>("nope"));
        assert_eq!(result.unwrap_err(), InsertError::Init("nope"));
        assert!(!store.contains(&3));
    }

    #[test]
    fn with_on_missing_key_is_none() {
        let store: KeyedStore<u32, u32> = KeyedStore::new();
        assert!(store.with(&9, |v| *v += 1).is_none());
    }

    #[test]
    fn same_key_updates_are_serialized() {
        let store: Arc<KeyedStore<u32, u64>> = Arc::new(KeyedStore::new());
        store.insert_with(1, || Ok::<_, ()>(0)).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        store.with(&1, |v| *v += 1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.snapshot(&1), Some(8000));
    }

    #[test]
    fn racing_inserts_run_one_initializer() {
        let store: Arc<KeyedStore<u32, u32>> = Arc::new(KeyedStore::new());
        let inits = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let inits = Arc::clone(&inits);
                thread::spawn(move || {
                    store
                        .insert_with(42, || {
                            inits.fetch_add(1, Ordering::SeqCst);
                            Ok::<_, ()>(i)
                        })
                        .is_ok()
                })
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(inits.load(Ordering::SeqCst), 1);
    }
}
