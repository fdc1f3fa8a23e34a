//! Bookkeeping of independent readers over a shared ring store.

use crate::RingStore;
use std::{borrow::Cow, collections::BTreeMap, fmt};
use thiserror::Error;

/// Different types of error that can happen when a reader is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReaderError {
    #[error("Reader {0} has no unread elements")]
    Exhausted(ReaderId),

    #[error("Reader {0} was destroyed")]
    Detached(ReaderId),
}

/// Stable identifier of a reader.
///
/// Identifiers are never reused, so one that outlives its reader is rejected
/// with [`ReaderError::Detached`] instead of aliasing a newer reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReaderId(u64);

impl fmt::Display for ReaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Private read position of a reader.
#[derive(Debug, Clone)]
struct Cursor {
    id: ReaderId,

    // Backing index of the next element this reader will pop.
    pos: usize,

    // pos == write means either caught up or a full lap behind, this tells them apart.
    at_front: bool,
}

/// Sorted collection of reader cursors.
///
/// Cursors are ordered by descending number of unread elements, so index 0 is
/// always the slowest reader. While any reader is registered, the slowest one
/// sits on the oldest element of the store. That is what allows an element to be
/// physically popped once the slowest reader moves past it, and not earlier.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    next_id: u64,
    cursors: Vec<Cursor>,

    // Current index into cursors of every registered reader.
    ranks: BTreeMap<ReaderId, usize>,
}

impl Registry {
    /// Number of registered readers.
    pub(crate) fn len(&self) -> usize {
        self.cursors.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    /// Identifiers of registered readers, slowest first.
    pub(crate) fn ids(&self) -> impl Iterator<Item = ReaderId> + '_ {
        self.cursors.iter().map(|cursor| cursor.id)
    }

    fn rank(&self, id: ReaderId) -> Result<usize, ReaderError> {
        self.ranks
            .get(&id)
            .copied()
            .ok_or(ReaderError::Detached(id))
    }

    fn cursor(&self, id: ReaderId) -> Result<(usize, &Cursor), ReaderError> {
        let rank = self.rank(id)?;
        let cursor = self.cursors.get(rank).ok_or(ReaderError::Detached(id))?;
        Ok((rank, cursor))
    }

    /// Rebuild ranks after cursors were inserted, removed or swapped.
    fn renumber(&mut self) {
        self.ranks.clear();
        for (rank, cursor) in self.cursors.iter().enumerate() {
            self.ranks.insert(cursor.id, rank);
        }
    }

    fn remaining<T>(cursor: &Cursor, store: &RingStore<T>) -> usize {
        if cursor.at_front {
            0
        } else {
            store.distance(cursor.pos, store.write_index())
        }
    }

    /// Whether the reader at `rank` is the only one still holding on to the oldest element.
    fn owns_back<T>(&self, rank: usize, store: &RingStore<T>) -> bool {
        let Some(cursor) = self.cursors.get(rank) else {
            return false;
        };

        let remaining = Self::remaining(cursor, store);
        rank == 0
            && remaining == store.len()
            && self
                .cursors
                .get(1)
                .is_none_or(|next| Self::remaining(next, store) < remaining)
    }

    /// Register a new reader positioned on the oldest element.
    ///
    /// Having read nothing, the new reader is the slowest, tied with every
    /// reader that has not read anything either.
    pub(crate) fn create<T>(&mut self, store: &RingStore<T>) -> ReaderId {
        let id = ReaderId(self.next_id);
        self.next_id += 1;

        let cursor = Cursor {
            id,
            pos: store.read_index(),
            at_front: store.is_empty(),
        };

        self.cursors.insert(0, cursor);
        self.renumber();
        id
    }

    /// Unregister a reader.
    ///
    /// Elements only the destroyed reader was still waiting for are physically
    /// popped from the store. Destroying the last reader leaves the store alone.
    /// Returns the number of elements popped.
    pub(crate) fn destroy<T: Clone>(
        &mut self,
        id: ReaderId,
        store: &mut RingStore<T>,
    ) -> Result<usize, ReaderError> {
        let (rank, cursor) = self.cursor(id)?;

        // Slots between the slowest reader and the next one are pinned only by the slowest.
        let pinned = match self.cursors.get(1) {
            Some(next) if rank == 0 => {
                Self::remaining(cursor, store).saturating_sub(Self::remaining(next, store))
            }
            _ => 0,
        };

        let mut reclaimed = 0;
        while reclaimed < pinned && store.pop().is_ok() {
            reclaimed += 1;
        }

        tracing::trace!(%id, reclaimed, "Reclaimed elements pinned by destroyed reader");

        self.cursors.remove(rank);
        self.renumber();

        if reclaimed > 0 && store.is_empty() {
            self.reset_all(store);
        }

        Ok(reclaimed)
    }

    /// Unregister every reader, returns how many were registered.
    pub(crate) fn destroy_all(&mut self) -> usize {
        let destroyed = self.cursors.len();
        self.cursors.clear();
        self.ranks.clear();
        destroyed
    }

    /// Number of elements a reader has not popped yet.
    pub(crate) fn remaining_of<T>(
        &self,
        id: ReaderId,
        store: &RingStore<T>,
    ) -> Result<usize, ReaderError> {
        let (_, cursor) = self.cursor(id)?;
        Ok(Self::remaining(cursor, store))
    }

    /// Backing indices of the next and last element a reader will pop, both inclusive.
    pub(crate) fn span<T>(
        &self,
        id: ReaderId,
        store: &RingStore<T>,
    ) -> Result<Option<(usize, usize)>, ReaderError> {
        let (_, cursor) = self.cursor(id)?;
        let span = (Self::remaining(cursor, store) > 0)
            .then(|| (cursor.pos, store.prev(store.write_index())));

        Ok(span)
    }

    /// Whether the next element popped by a reader is still shared with other readers.
    ///
    /// A shared element is handed out borrowed, callers must clone it before mutating.
    pub(crate) fn need_copy<T>(
        &self,
        id: ReaderId,
        store: &RingStore<T>,
    ) -> Result<bool, ReaderError> {
        let (rank, _) = self.cursor(id)?;
        Ok(self.cursors.len() > 1 && !self.owns_back(rank, store))
    }

    /// Next element a reader will pop, without popping it.
    pub(crate) fn peek<'s, T>(
        &self,
        id: ReaderId,
        store: &'s RingStore<T>,
    ) -> Result<&'s T, ReaderError> {
        let (_, cursor) = self.cursor(id)?;
        if Self::remaining(cursor, store) == 0 {
            return Err(ReaderError::Exhausted(id));
        }

        store.peek(cursor.pos).ok_or(ReaderError::Exhausted(id))
    }

    /// Pop the next element of a reader.
    ///
    /// The element is physically popped from the store only when no other reader
    /// still needs it, and is then handed out owned. Otherwise the reader only
    /// moves its own cursor and the element is handed out borrowed.
    pub(crate) fn pop<'s, T: Clone>(
        &mut self,
        id: ReaderId,
        store: &'s mut RingStore<T>,
    ) -> Result<Cow<'s, T>, ReaderError> {
        let (rank, cursor) = self.cursor(id)?;
        let pos = cursor.pos;
        if Self::remaining(cursor, store) == 0 {
            return Err(ReaderError::Exhausted(id));
        }

        if self.owns_back(rank, store) {
            let value = store.pop().map_err(|_| ReaderError::Exhausted(id))?;
            if store.is_empty() {
                self.reset_all(store);
            } else if let Some(cursor) = self.cursors.get_mut(rank) {
                cursor.pos = store.read_index();
            }

            // Others had strictly fewer unread elements, so order is intact.
            return Ok(Cow::Owned(value));
        }

        let next = store.next(pos);
        if let Some(cursor) = self.cursors.get_mut(rank) {
            cursor.pos = next;
            cursor.at_front = next == store.write_index();
        }

        self.sift(rank, store);

        let store: &'s RingStore<T> = store;
        store
            .peek(pos)
            .map(Cow::Borrowed)
            .ok_or(ReaderError::Exhausted(id))
    }

    /// Move a reader that just popped past the ones that now have more to read.
    fn sift<T>(&mut self, mut rank: usize, store: &RingStore<T>) {
        let start = rank;
        while let (Some(current), Some(next)) = (self.cursors.get(rank), self.cursors.get(rank + 1))
        {
            if Self::remaining(next, store) <= Self::remaining(current, store) {
                break;
            }

            self.cursors.swap(rank, rank + 1);
            rank += 1;
        }

        for (rank, cursor) in self.cursors.iter().enumerate().take(rank + 1).skip(start) {
            self.ranks.insert(cursor.id, rank);
        }
    }

    /// Account for an element pushed into the store.
    ///
    /// # Arguments
    ///
    /// * `evicted` - Backing index of the element overwritten by the push, if any.
    /// * `store` - Store after the push.
    pub(crate) fn pushed<T>(&mut self, evicted: Option<usize>, store: &RingStore<T>) {
        for cursor in self.cursors.iter_mut() {
            // Readers still waiting on the evicted element skip past it.
            if evicted.is_some_and(|index| !cursor.at_front && cursor.pos == index) {
                cursor.pos = store.next(cursor.pos);
            }

            cursor.at_front = false;
        }
    }

    /// Shift every cursor after the store was rebased.
    ///
    /// # Arguments
    ///
    /// * `delta` - Distance the live region was moved towards index 0.
    /// * `store` - Store after the rebase.
    pub(crate) fn rebase<T>(&mut self, delta: usize, store: &RingStore<T>) {
        let capacity = store.capacity();
        for cursor in self.cursors.iter_mut() {
            cursor.pos = (cursor.pos + capacity - delta) % capacity;
        }
    }

    /// Move every reader back to the oldest element of the store.
    pub(crate) fn reset_all<T>(&mut self, store: &RingStore<T>) {
        for cursor in self.cursors.iter_mut() {
            cursor.pos = store.read_index();
            cursor.at_front = store.is_empty();
        }

        tracing::trace!(readers = self.cursors.len(), "Readers reset to oldest element");
    }
}
