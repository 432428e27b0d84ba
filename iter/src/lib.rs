// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! A uniform protocol for lazily stepping over immutable collections.
//!
//! A [`Cursor`] bundles a current element with a position inside its source
//! collection. Stepping never mutates: it hands back a *fresh* cursor
//! advanced by one position, so a caller that keeps the original cursor
//! keeps its position. Exhaustion is `None`, which doubles as the terminal
//! indicator for cursors over empty collections, so there is no way to read
//! or step past the end.

use std::iter::FusedIterator;

/// An immutable position in a lazy sequence.
///
/// Each collection in this workspace supplies its own concrete cursor; this
/// trait is what lets callers traverse any of them uniformly.
pub trait Cursor: Sized {
    type Item;

    /// The element at the current position.
    fn value(&self) -> &Self::Item;

    /// A new cursor advanced by one position, or `None` when this cursor
    /// sits on the last element.
    fn step(&self) -> Option<Self>;
}

/// Adapts a cursor (or the terminal indicator) to [`std::iter::Iterator`],
/// yielding owned clones of the traversed elements.
///
/// ```
/// use persistent_iter::{Cursor, Steps};
///
/// #[derive(Clone)]
/// struct Upto {
///     n: u32,
///     limit: u32,
/// }
///
/// impl Cursor for Upto {
///     type Item = u32;
///
///     fn value(&self) -> &u32 {
///         &self.n
///     }
///
///     fn step(&self) -> Option<Self> {
///         (self.n + 1 < self.limit).then(|| Upto { n: self.n + 1, limit: self.limit })
///     }
/// }
///
/// let steps = Steps::new(Some(Upto { n: 0, limit: 3 }));
/// assert_eq!(steps.collect::<Vec<_>>(), vec![0, 1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct Steps<C> {
    cursor: Option<C>,
}

impl<C> Steps<C> {
    pub fn new(cursor: Option<C>) -> Self {
        Steps { cursor }
    }
}

impl<C> Iterator for Steps<C>
where
    C: Cursor,
    C::Item: Clone,
{
    type Item = C::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.take()?;
        let item = cursor.value().clone();
        self.cursor = cursor.step();
        Some(item)
    }
}

impl<C> FusedIterator for Steps<C>
where
    C: Cursor,
    C::Item: Clone,
{
}
