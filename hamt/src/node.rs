// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::borrow::Borrow;

use archery::{SharedPointer, SharedPointerKind};
use persistent_list::List;

use crate::{Entry, HashValue, BITS_PER_LEVEL};

/// A chain of entries whose keys share one full hash.
pub(crate) type Chain<K, V, P> = List<SharedPointer<Entry<K, V>, P>, P>;

/// Trie node: a single entry, a bitmap-indexed interior node, or a chain of
/// colliding entries. Nodes are never mutated once built; operations copy
/// the nodes on the touched path and share the rest.
#[derive(Debug)]
pub(crate) enum Node<K, V, P: SharedPointerKind> {
    Leaf(SharedPointer<Entry<K, V>, P>),
    Bitmap {
        bitmap: u32,
        /// Dense array with one child per set bit, in bit order.
        children: Vec<SharedPointer<Node<K, V, P>, P>>,
    },
    Collision(Chain<K, V, P>),
}

/// How an operation changed the map, threaded up through the recursion so
/// the wrapper knows whether to adjust the count or reuse the old root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    Unchanged,
    Added,
    Updated,
    Removed,
}

/// The 5-bit slice of `hash` consumed at `level`.
fn mask(hash: HashValue, level: u32) -> u32 {
    // Two hashes that agree on every slice are equal and collide into a
    // chain, so interior nodes never reach past the hash width.
    debug_assert!(BITS_PER_LEVEL * level < HashValue::BITS);
    (hash >> (BITS_PER_LEVEL * level)) & 0x1f
}

/// The bitmap bit owning `hash` at `level`.
fn bitpos(hash: HashValue, level: u32) -> u32 {
    1 << mask(hash, level)
}

/// Dense-array index of `bit`: the number of set bits below it.
fn bit_index(bitmap: u32, bit: u32) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}

impl<K, V, P: SharedPointerKind> Node<K, V, P> {
    pub(crate) fn get<'a, Q>(&'a self, level: u32, hash: HashValue, key: &Q) -> Option<&'a Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        match self {
            Node::Leaf(entry) => (entry.key().borrow() == key).then(|| &**entry),
            Node::Bitmap { bitmap, children } => {
                let bit = bitpos(hash, level);
                if bitmap & bit == 0 {
                    return None;
                }
                children[bit_index(*bitmap, bit)].get(level + 1, hash, key)
            }
            Node::Collision(chain) => chain
                .iter()
                .find(|entry| entry.key().borrow() == key)
                .map(|entry| &**entry),
        }
    }

    /// Inserts or updates `entry`, returning the node standing in for
    /// `this` afterwards. On `Status::Unchanged` the returned pointer *is*
    /// `this`; nothing was allocated on the path.
    pub(crate) fn insert(
        this: &SharedPointer<Self, P>,
        level: u32,
        entry: SharedPointer<Entry<K, V>, P>,
    ) -> (SharedPointer<Self, P>, Status)
    where
        K: Eq,
        V: PartialEq,
    {
        match &**this {
            Node::Leaf(existing) => {
                if existing.hash() != entry.hash() {
                    let node_bit = bitpos(existing.hash(), level);
                    let entry_bit = bitpos(entry.hash(), level);
                    if node_bit != entry_bit {
                        // The hashes part ways right here: a two-child
                        // interior node holds both leaves.
                        let bitmap = node_bit | entry_bit;
                        let new_leaf = SharedPointer::new(Node::Leaf(entry));
                        let children = if bit_index(bitmap, node_bit) == 0 {
                            vec![this.clone(), new_leaf]
                        } else {
                            vec![new_leaf, this.clone()]
                        };
                        (
                            SharedPointer::new(Node::Bitmap { bitmap, children }),
                            Status::Added,
                        )
                    } else {
                        // Shared slice at this level: wrap the existing leaf
                        // in a one-child interior node and insert through it
                        // so the walk descends a level.
                        let parent = SharedPointer::new(Node::Bitmap {
                            bitmap: node_bit,
                            children: vec![this.clone()],
                        });
                        Node::insert(&parent, level, entry)
                    }
                } else if existing.key() == entry.key() {
                    if existing.value() == entry.value() {
                        (this.clone(), Status::Unchanged)
                    } else {
                        (SharedPointer::new(Node::Leaf(entry)), Status::Updated)
                    }
                } else {
                    // Identical full hash, different key: promote to a chain
                    // with the new entry at the head.
                    let chain = List::new().cons(existing.clone()).cons(entry);
                    (SharedPointer::new(Node::Collision(chain)), Status::Added)
                }
            }
            Node::Bitmap { bitmap, children } => {
                let bit = bitpos(entry.hash(), level);
                let idx = bit_index(*bitmap, bit);
                if bitmap & bit != 0 {
                    let (child, status) = Node::insert(&children[idx], level + 1, entry);
                    if status == Status::Unchanged {
                        return (this.clone(), Status::Unchanged);
                    }
                    let mut children = children.clone();
                    children[idx] = child;
                    (
                        SharedPointer::new(Node::Bitmap {
                            bitmap: *bitmap,
                            children,
                        }),
                        status,
                    )
                } else {
                    let mut children = children.clone();
                    children.insert(idx, SharedPointer::new(Node::Leaf(entry)));
                    (
                        SharedPointer::new(Node::Bitmap {
                            bitmap: bitmap | bit,
                            children,
                        }),
                        Status::Added,
                    )
                }
            }
            Node::Collision(chain) => {
                let Some(pos) = chain.iter().position(|e| e.key() == entry.key()) else {
                    return (
                        SharedPointer::new(Node::Collision(chain.cons(entry))),
                        Status::Added,
                    );
                };
                let found = chain.iter().nth(pos).expect("position within the chain");
                if found.value() == entry.value() {
                    (this.clone(), Status::Unchanged)
                } else {
                    let chain = chain_replace(chain, pos, entry);
                    (SharedPointer::new(Node::Collision(chain)), Status::Updated)
                }
            }
        }
    }

    /// Removes `key`, returning the node standing in for `this` afterwards;
    /// `None` propagates the removal of a node that became empty.
    pub(crate) fn remove<Q>(
        this: &SharedPointer<Self, P>,
        level: u32,
        hash: HashValue,
        key: &Q,
    ) -> (Option<SharedPointer<Self, P>>, Status)
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        match &**this {
            Node::Leaf(entry) => {
                if entry.key().borrow() == key {
                    (None, Status::Removed)
                } else {
                    (Some(this.clone()), Status::Unchanged)
                }
            }
            Node::Bitmap { bitmap, children } => {
                let bit = bitpos(hash, level);
                if bitmap & bit == 0 {
                    return (Some(this.clone()), Status::Unchanged);
                }
                let idx = bit_index(*bitmap, bit);
                let (child, status) = Node::remove(&children[idx], level + 1, hash, key);
                if status == Status::Unchanged {
                    return (Some(this.clone()), Status::Unchanged);
                }
                match child {
                    Some(child) => {
                        let mut children = children.clone();
                        children[idx] = child;
                        (
                            Some(SharedPointer::new(Node::Bitmap {
                                bitmap: *bitmap,
                                children,
                            })),
                            status,
                        )
                    }
                    None => {
                        let bitmap = bitmap & !bit;
                        if bitmap == 0 {
                            return (None, status);
                        }
                        let mut children = children.clone();
                        children.remove(idx);
                        (
                            Some(SharedPointer::new(Node::Bitmap { bitmap, children })),
                            status,
                        )
                    }
                }
            }
            Node::Collision(chain) => {
                let Some(pos) = chain.iter().position(|e| e.key().borrow() == key) else {
                    return (Some(this.clone()), Status::Unchanged);
                };
                if chain.len() == 2 {
                    // One entry left: a chain is no longer warranted.
                    let survivor = chain
                        .iter()
                        .nth(1 - pos)
                        .expect("two-entry chain")
                        .clone();
                    return (
                        Some(SharedPointer::new(Node::Leaf(survivor))),
                        Status::Removed,
                    );
                }
                let chain = chain_remove(chain, pos);
                (Some(SharedPointer::new(Node::Collision(chain))), Status::Removed)
            }
        }
    }

    /// Applies `f` to every entry, depth-first and left-to-right over the
    /// bitmap children, stopping at the first error.
    pub(crate) fn for_each<F>(&self, f: &mut F) -> anyhow::Result<()>
    where
        F: FnMut(&K, &V) -> anyhow::Result<()>,
    {
        match self {
            Node::Leaf(entry) => f(entry.key(), entry.value()),
            Node::Bitmap { children, .. } => {
                for child in children {
                    child.for_each(f)?;
                }
                Ok(())
            }
            Node::Collision(chain) => {
                for entry in chain.iter() {
                    f(entry.key(), entry.value())?;
                }
                Ok(())
            }
        }
    }

    /// Conses every reachable entry onto `acc`, sharing the entry cells.
    pub(crate) fn collect_entries(&self, acc: &mut Chain<K, V, P>) {
        match self {
            Node::Leaf(entry) => *acc = acc.cons(entry.clone()),
            Node::Bitmap { children, .. } => {
                for child in children {
                    child.collect_entries(acc);
                }
            }
            Node::Collision(chain) => {
                for entry in chain.iter() {
                    *acc = acc.cons(entry.clone());
                }
            }
        }
    }
}

/// Rebuilds `chain` with the cell at `pos` replaced by `entry`: cells after
/// the match are shared, cells before it are re-consed.
fn chain_replace<K, V, P: SharedPointerKind>(
    chain: &Chain<K, V, P>,
    pos: usize,
    entry: SharedPointer<Entry<K, V>, P>,
) -> Chain<K, V, P> {
    let mut suffix = chain.clone();
    for _ in 0..=pos {
        suffix = suffix.rest().expect("position within the chain");
    }
    let mut rebuilt = suffix.cons(entry);
    let prefix: Vec<_> = chain.iter().take(pos).cloned().collect();
    for cell in prefix.into_iter().rev() {
        rebuilt = rebuilt.cons(cell);
    }
    rebuilt
}

/// Rebuilds `chain` with the cell at `pos` removed: cells after the match
/// are shared, cells before it are re-consed. Removing the head shares the
/// tail outright.
fn chain_remove<K, V, P: SharedPointerKind>(chain: &Chain<K, V, P>, pos: usize) -> Chain<K, V, P> {
    let mut rebuilt = chain.clone();
    for _ in 0..=pos {
        rebuilt = rebuilt.rest().expect("position within the chain");
    }
    let prefix: Vec<_> = chain.iter().take(pos).cloned().collect();
    for cell in prefix.into_iter().rev() {
        rebuilt = rebuilt.cons(cell);
    }
    rebuilt
}
