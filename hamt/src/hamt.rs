// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::borrow::Borrow;
use std::marker::PhantomData;

use archery::{ArcK, RcK, SharedPointer, SharedPointerKind};
use persistent_list::List;

use crate::iter::{Iter, IterKeys, IterValues, MapCursor};
use crate::node::{Node, Status};
use crate::{Djb2, Entry, Hash, HashAlgorithm};

/// A persistent hash map.
///
/// Mutating operations return a new `Hamt` sharing all untouched nodes with
/// the receiver; operations that change nothing return the receiver itself
/// (observable through [`Hamt::ptr_eq`]):
///
/// ```
/// use persistent_hamt::Hamt;
///
/// let empty: Hamt<String, String> = Hamt::new();
/// let one = empty.insert("key_1".to_string(), "val_1".to_string());
/// let two = one.insert("key_2".to_string(), "val_2".to_string());
/// let pruned = two.remove("key_1");
///
/// assert_eq!(two.get("key_1"), Some(&"val_1".to_string()));
/// assert_eq!(pruned.get("key_1"), None);
/// assert_eq!(two.len(), 2);
/// assert_eq!(pruned.len(), 1);
/// ```
///
/// `H` selects the hash algorithm (DJB2 over the key's bytes by default);
/// key equality is `Eq`, and value equality is consulted only by
/// [`Hamt::insert`] to detect no-op writes.
pub struct Hamt<K, V, P: SharedPointerKind = RcK, H = Djb2> {
    root: Option<SharedPointer<Node<K, V, P>, P>>,
    count: usize,
    hash: PhantomData<H>,
}

/// A `Hamt` whose nodes can be shared between threads.
pub type HamtSync<K, V, H = Djb2> = Hamt<K, V, ArcK, H>;

impl<K, V, P: SharedPointerKind, H> Hamt<K, V, P, H> {
    #[must_use]
    pub fn new() -> Self {
        Hamt {
            root: None,
            count: 0,
            hash: PhantomData,
        }
    }

    /// Number of entries in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// True when both maps share one root (or are both empty). Operations
    /// that change nothing return the receiver, so this is how a caller
    /// detects a no-op without comparing contents.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (None, None) => true,
            (Some(a), Some(b)) => std::ptr::eq(&**a, &**b),
            _ => false,
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V, P> {
        Iter::new(self.root.as_deref(), self.count)
    }

    pub fn keys(&self) -> IterKeys<'_, K, V, P> {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> IterValues<'_, K, V, P> {
        self.iter().map(|(_, value)| value)
    }

    /// A cursor positioned on some entry, or `None` when the map is empty.
    ///
    /// The cursor snapshots the map's entries when it is created, in a
    /// single traversal; it shares the entry cells but no trie nodes, so it
    /// is independent of any map derived later.
    #[must_use]
    pub fn cursor(&self) -> Option<MapCursor<K, V, P>> {
        let root = self.root.as_ref()?;
        let mut entries = List::new();
        root.collect_entries(&mut entries);
        Some(MapCursor::new(entries))
    }

    /// Applies `f` to every entry exactly once, stopping at the first
    /// error. Visit order is unspecified but deterministic for a given map.
    pub fn for_each<F>(&self, mut f: F) -> anyhow::Result<()>
    where
        F: FnMut(&K, &V) -> anyhow::Result<()>,
    {
        match &self.root {
            None => Ok(()),
            Some(root) => root.for_each(&mut f),
        }
    }
}

impl<K, V, P, H> Hamt<K, V, P, H>
where
    K: Eq + Hash,
    P: SharedPointerKind,
    H: HashAlgorithm,
{
    /// Returns a map with `key` bound to `value`.
    ///
    /// Binding a key to the value it already has returns the receiver;
    /// nothing is allocated.
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self
    where
        V: PartialEq,
    {
        let hash = H::hash(&key);
        let entry = SharedPointer::new(Entry::new(key, value, hash));
        let Some(root) = &self.root else {
            return Hamt {
                root: Some(SharedPointer::new(Node::Leaf(entry))),
                count: 1,
                hash: PhantomData,
            };
        };
        let (root, status) = Node::insert(root, 0, entry);
        match status {
            Status::Unchanged => self.clone(),
            Status::Added => Hamt {
                root: Some(root),
                count: self.count + 1,
                hash: PhantomData,
            },
            Status::Updated => Hamt {
                root: Some(root),
                count: self.count,
                hash: PhantomData,
            },
            Status::Removed => unreachable!("insert cannot remove"),
        }
    }

    /// Returns a map without `key`. Removing an absent key returns the
    /// receiver.
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let Some(root) = &self.root else {
            return self.clone();
        };
        let (root, status) = Node::remove(root, 0, H::hash(key), key);
        match status {
            Status::Unchanged => self.clone(),
            Status::Removed => Hamt {
                root,
                count: self.count - 1,
                hash: PhantomData,
            },
            Status::Added | Status::Updated => unreachable!("remove cannot add"),
        }
    }

    /// The value bound to `key`, or `None`.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let root = self.root.as_ref()?;
        root.get(0, H::hash(key), key).map(|entry| entry.value())
    }

    /// The stored key and value for `key`, or `None`.
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let root = self.root.as_ref()?;
        root.get(0, H::hash(key), key)
            .map(|entry| (entry.key(), entry.value()))
    }

    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.get(key).is_some()
    }
}

impl<K, V, P: SharedPointerKind, H> Default for Hamt<K, V, P, H> {
    fn default() -> Self {
        Hamt::new()
    }
}

impl<K, V, P: SharedPointerKind, H> Clone for Hamt<K, V, P, H> {
    fn clone(&self) -> Self {
        Hamt {
            root: self.root.clone(),
            count: self.count,
            hash: PhantomData,
        }
    }
}

impl<K, V, P, H> std::fmt::Debug for Hamt<K, V, P, H>
where
    K: std::fmt::Debug,
    V: std::fmt::Debug,
    P: SharedPointerKind,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, P, H> PartialEq for Hamt<K, V, P, H>
where
    K: Eq + Hash,
    V: PartialEq,
    P: SharedPointerKind,
    H: HashAlgorithm,
{
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K, V, P, H> Eq for Hamt<K, V, P, H>
where
    K: Eq + Hash,
    V: Eq,
    P: SharedPointerKind,
    H: HashAlgorithm,
{
}

impl<'a, K, V, P: SharedPointerKind, H> IntoIterator for &'a Hamt<K, V, P, H> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, P>;

    fn into_iter(self) -> Iter<'a, K, V, P> {
        self.iter()
    }
}

impl<K, V, P, H> FromIterator<(K, V)> for Hamt<K, V, P, H>
where
    K: Eq + Hash,
    V: PartialEq,
    P: SharedPointerKind,
    H: HashAlgorithm,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Hamt::new();
        for (key, value) in iter {
            map = map.insert(key, value);
        }
        map
    }
}
