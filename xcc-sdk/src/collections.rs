// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Persistent collections stored outside of the root state of a contract.
//!
//! The root state only holds the storage prefix of each collection. Entries live under their own
//! keys, so replacing the root state with a new layout that keeps the same prefixes keeps every
//! entry untouched.

use std::{fmt, marker::PhantomData};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use xcc_base::codec;

use crate::runtime::{ContractRuntime, RuntimeError};

/// A map whose entries are each stored under `prefix ++ bcs(key)`.
#[derive(Serialize, Deserialize)]
pub struct StorageMap<K, V> {
    prefix: Vec<u8>,
    #[serde(skip)]
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> StorageMap<K, V>
where
    K: Serialize,
    V: Serialize + DeserializeOwned,
{
    /// Creates a handle to the map stored under `prefix`.
    pub fn new(prefix: impl Into<Vec<u8>>) -> Self {
        StorageMap {
            prefix: prefix.into(),
            _marker: PhantomData,
        }
    }

    /// Returns the storage prefix of the map.
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    fn entry_key(&self, key: &K) -> Result<Vec<u8>, RuntimeError> {
        let mut entry_key = self.prefix.clone();
        entry_key.extend(codec::to_bcs_bytes(key)?);
        Ok(entry_key)
    }

    /// Reads the value associated with `key`.
    pub fn get(&self, runtime: &ContractRuntime, key: &K) -> Result<Option<V>, RuntimeError> {
        runtime.read(&self.entry_key(key)?)
    }

    /// Associates `value` with `key`.
    pub fn insert(
        &self,
        runtime: &mut ContractRuntime,
        key: &K,
        value: &V,
    ) -> Result<(), RuntimeError> {
        runtime.write(&self.entry_key(key)?, value)
    }

    /// Removes the value associated with `key`.
    pub fn remove(&self, runtime: &mut ContractRuntime, key: &K) -> Result<(), RuntimeError> {
        runtime.remove(&self.entry_key(key)?)
    }
}

impl<K, V> fmt::Debug for StorageMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageMap")
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl<K, V> PartialEq for StorageMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.prefix == other.prefix
    }
}

/// An optional value stored under its own key.
#[derive(Serialize, Deserialize)]
pub struct StorageCell<T> {
    key: Vec<u8>,
    #[serde(skip)]
    _marker: PhantomData<fn() -> T>,
}

impl<T> StorageCell<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a handle to the value stored under `key`.
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        StorageCell {
            key: key.into(),
            _marker: PhantomData,
        }
    }

    /// Returns the storage key of the cell.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Reads the value, if there is one.
    pub fn get(&self, runtime: &ContractRuntime) -> Result<Option<T>, RuntimeError> {
        runtime.read(&self.key)
    }

    /// Stores `value`.
    pub fn set(&self, runtime: &mut ContractRuntime, value: &T) -> Result<(), RuntimeError> {
        runtime.write(&self.key, value)
    }

    /// Removes the value.
    pub fn clear(&self, runtime: &mut ContractRuntime) -> Result<(), RuntimeError> {
        runtime.remove(&self.key)
    }
}

impl<T> fmt::Debug for StorageCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageCell")
            .field("key", &self.key)
            .finish()
    }
}

impl<T> PartialEq for StorageCell<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

#[cfg(test)]
mod tests {
    use xcc_base::{codec, data_types::Amount};

    use super::{StorageCell, StorageMap};
    use crate::{test::MockSystemApi, ContractRuntime};

    #[test]
    fn map_entries_live_under_their_own_keys() {
        let mut api = MockSystemApi::new();
        let mut runtime = ContractRuntime::new(&mut api);
        let map = StorageMap::<String, Amount>::new(b"m".to_vec());

        assert_eq!(map.get(&runtime, &"alice".to_owned()).unwrap(), None);
        map.insert(&mut runtime, &"alice".to_owned(), &Amount::from_units(3))
            .unwrap();

        let same_prefix = StorageMap::<String, Amount>::new(b"m".to_vec());
        let other_prefix = StorageMap::<String, Amount>::new(b"n".to_vec());
        assert_eq!(
            same_prefix.get(&runtime, &"alice".to_owned()).unwrap(),
            Some(Amount::from_units(3))
        );
        assert_eq!(other_prefix.get(&runtime, &"alice".to_owned()).unwrap(), None);

        map.remove(&mut runtime, &"alice".to_owned()).unwrap();
        assert_eq!(map.get(&runtime, &"alice".to_owned()).unwrap(), None);
    }

    #[test]
    fn handles_serialize_as_their_prefix_only() {
        let map = StorageMap::<String, Amount>::new(b"m".to_vec());
        let bytes = codec::to_bcs_bytes(&map).unwrap();
        assert_eq!(bytes, codec::to_bcs_bytes(&b"m".to_vec()).unwrap());
    }

    #[test]
    fn cell_starts_empty() {
        let mut api = MockSystemApi::new();
        let mut runtime = ContractRuntime::new(&mut api);
        let cell = StorageCell::<u64>::new(b"c".to_vec());

        assert_eq!(cell.get(&runtime).unwrap(), None);
        cell.set(&mut runtime, &7).unwrap();
        assert_eq!(cell.get(&runtime).unwrap(), Some(7));
        cell.clear(&mut runtime).unwrap();
        assert_eq!(cell.get(&runtime).unwrap(), None);
    }
}
