// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Persistent hash map backed by a hash array mapped trie.
//!
//! Keys are routed by successive 5-bit slices of their hash; interior nodes
//! store only present children behind a 32-bit bitmap, and keys whose full
//! hashes collide share a chain at the point where the hash runs out of
//! discriminating power. Every mutating operation returns a new map that
//! shares all untouched nodes with its predecessor, so old versions stay
//! observable and cheap to keep.
//!
//! The structure follows the hash trie described in
//! [Ideal Hash Trees](https://infoscience.epfl.ch/record/64398/files/idealhashtrees.pdf).

mod hamt;
mod hash;
mod hash_algorithm;
mod iter;
mod node;

pub use self::hamt::{Hamt, HamtSync};
pub use self::hash::{BytesKey, Hash};
pub use self::hash_algorithm::{Djb2, HashAlgorithm};
pub use self::iter::{Iter, IterKeys, IterValues, MapCursor};

/// Full hash of a key; levels of the trie consume it 5 bits at a time.
pub type HashValue = u32;

/// Bits of the hash consumed per trie level.
const BITS_PER_LEVEL: u32 = 5;

/// A key/value pair plus the key's cached full hash.
#[derive(Debug, Clone)]
pub struct Entry<K, V> {
    key: K,
    value: V,
    hash: HashValue,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, value: V, hash: HashValue) -> Self {
        Entry { key, value, hash }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub(crate) fn hash(&self) -> HashValue {
        self.hash
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for Entry<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}
