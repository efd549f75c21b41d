//! Concurrent keyed stores.
//!
//! A `Store` is an insertion-ordered mapping from canonical id to entity,
//! safe under concurrent use: readers may race writers but writers are
//! serialized, and a reader sees either the old or the new value for a
//! key, never a torn one. Insertion order is contractual for the values
//! and packages stores; anything user-visible that iterates the types
//! store sorts by id first.

use std::sync::{Arc, RwLock};

use indexmap::IndexMap;

use crate::entity::Entity;
use crate::package::PackageEntity;

/// Insertion-ordered concurrent mapping from id to `Arc<T>`.
#[derive(Debug)]
pub struct Store<T> {
    inner: RwLock<IndexMap<String, Arc<T>>>,
}

impl<T> Store<T> {
    pub fn new() -> Self {
        Store {
            inner: RwLock::new(IndexMap::new()),
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(id)
    }

    pub fn set(&self, id: impl Into<String>, value: Arc<T>) {
        self.inner
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.into(), value);
    }

    /// Remove an entry. Used only to roll back a partial resolution;
    /// `shift_remove` keeps the insertion order of the survivors intact.
    pub fn delete(&self, id: &str) -> bool {
        self.inner
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .shift_remove(id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate in insertion order; stops early (returning `false`) when
    /// the callback returns `false`.
    pub fn range(&self, mut f: impl FnMut(&str, &Arc<T>) -> bool) -> bool {
        let snapshot: Vec<(String, Arc<T>)> = {
            let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
            guard
                .iter()
                .map(|(k, v)| (k.clone(), Arc::clone(v)))
                .collect()
        };
        for (key, value) in &snapshot {
            if !f(key, value) {
                return false;
            }
        }
        true
    }

    /// All keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    /// All keys sorted lexicographically.
    pub fn keys_sorted(&self) -> Vec<String> {
        let mut keys = self.keys();
        keys.sort();
        keys
    }
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The three catalog stores.
#[derive(Debug, Default)]
pub struct Catalog {
    pub types: Store<Entity>,
    pub values: Store<Entity>,
    pub packages: Store<PackageEntity>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            types: Store::new(),
            values: Store::new(),
            packages: Store::new(),
        }
    }
}
