//! Deduplicating configuration object pool
//!
//! Configuration objects (BWPs, CORESETs, logical-channel lists, ...) are
//! repeated across many UEs of a cell. A [`ConfigObjectPool`] stores each
//! distinct value once and hands out [`ConfigPtr`] handles to it. Handles
//! compare by identity: two handles are equal iff they were issued by the
//! same pool for the same stored object, which makes "did this configuration
//! change?" a constant-time check.
//!
//! Pools are append-only. Nothing is ever removed; a pool lives as long as
//! the cell or UE generation it serves and is dropped wholesale.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

static NEXT_POOL_ID: AtomicU32 = AtomicU32::new(0);

/// Handle to an immutable object stored in a [`ConfigObjectPool`].
///
/// Dereferences to the stored value. Equality and hashing use the
/// (pool, slot) identity, never the value.
pub struct ConfigPtr<T> {
    pool_id: u32,
    index: u32,
    value: Arc<T>,
}

impl<T> ConfigPtr<T> {
    /// Returns the slot of the object inside its pool
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Returns the stored value
    pub fn get(&self) -> &T {
        &self.value
    }
}

impl<T> Clone for ConfigPtr<T> {
    fn clone(&self) -> Self {
        Self {
            pool_id: self.pool_id,
            index: self.index,
            value: Arc::clone(&self.value),
        }
    }
}

impl<T> Deref for ConfigPtr<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> AsRef<T> for ConfigPtr<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

impl<T> PartialEq for ConfigPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.pool_id == other.pool_id && self.index == other.index
    }
}

impl<T> Eq for ConfigPtr<T> {}

impl<T> Hash for ConfigPtr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pool_id.hash(state);
        self.index.hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for ConfigPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigPtr")
            .field("pool", &self.pool_id)
            .field("index", &self.index)
            .field("value", &*self.value)
            .finish()
    }
}

/// Append-only pool of unique configuration objects.
///
/// `create` looks the value up in a hash index and returns the existing
/// handle on a match, so repeated UE configurations do not grow the pool.
pub struct ConfigObjectPool<T> {
    id: u32,
    objects: Vec<ConfigPtr<T>>,
    lookup: HashMap<Arc<T>, u32>,
}

impl<T: Eq + Hash> ConfigObjectPool<T> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            objects: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Returns a handle to a stored object equal to `value`, storing a copy
    /// first if none exists.
    pub fn create(&mut self, value: &T) -> ConfigPtr<T>
    where
        T: Clone,
    {
        if let Some(existing) = self.find(value) {
            return existing;
        }
        self.insert(value.clone())
    }

    /// Same as [`create`](Self::create), taking the value by move.
    pub fn create_owned(&mut self, value: T) -> ConfigPtr<T> {
        if let Some(existing) = self.find(&value) {
            return existing;
        }
        self.insert(value)
    }

    /// Returns the handle of a stored object equal to `value`, if any.
    pub fn find(&self, value: &T) -> Option<ConfigPtr<T>> {
        self.lookup
            .get(value)
            .map(|&index| self.objects[index as usize].clone())
    }

    fn insert(&mut self, value: T) -> ConfigPtr<T> {
        let index = u32::try_from(self.objects.len()).unwrap_or(u32::MAX);
        let value = Arc::new(value);
        let ptr = ConfigPtr {
            pool_id: self.id,
            index,
            value: Arc::clone(&value),
        };
        self.lookup.insert(value, index);
        self.objects.push(ptr.clone());
        ptr
    }

    /// Returns the number of distinct stored objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the pool holds no object
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterates the stored objects in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigPtr<T>> {
        self.objects.iter()
    }
}

impl<T: Eq + Hash> Default for ConfigObjectPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ConfigObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigObjectPool")
            .field("id", &self.id)
            .field("len", &self.objects.len())
            .finish()
    }
}
