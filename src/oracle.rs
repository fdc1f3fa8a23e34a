//! Reference implementations of ring stores using standard library primitives.

use std::collections::{BTreeMap, VecDeque};

/// A fixed size FIFO backed by [`VecDeque`].
pub(crate) struct Oracle<T> {
    capacity: usize,
    overwrite: bool,
    deque: VecDeque<T>,
}

impl<T> Oracle<T> {
    /// Create a new instance of this reference store.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of items this store can hold.
    /// * `overwrite` - Evict the oldest item when pushing into a full store.
    #[track_caller]
    pub(crate) fn with_capacity(capacity: usize, overwrite: bool) -> Self {
        assert!(capacity > 0, "Capacity must be > 0");

        Self {
            capacity,
            overwrite,
            deque: VecDeque::with_capacity(capacity),
        }
    }

    /// Append an item, returns false if the item was rejected.
    pub(crate) fn push(&mut self, item: T) -> bool {
        if self.deque.len() == self.capacity {
            if !self.overwrite {
                return false;
            }

            self.deque.pop_front();
        }

        self.deque.push_back(item);
        true
    }

    pub(crate) fn pop(&mut self) -> Option<T> {
        self.deque.pop_front()
    }

    pub(crate) fn clear(&mut self) {
        self.deque.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.deque.len()
    }

    /// An iterator to iterate through all the items currently in the store.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.deque.iter()
    }
}

/// A multi reader store that tracks everything by absolute sequence number.
///
/// Every pushed item is kept forever. The physically retained region starts at
/// the slowest reader, or stays where it was when there are no readers. In
/// overwrite mode a push into a full store evicts the front item, and readers
/// that had not read it yet skip it.
pub(crate) struct MultiOracle {
    capacity: u64,
    overwrite: bool,
    next_reader: usize,
    front: u64,
    items: Vec<u64>,
    readers: BTreeMap<usize, u64>,
}

impl MultiOracle {
    pub(crate) fn with_capacity(capacity: usize, overwrite: bool) -> Self {
        Self {
            capacity: capacity as u64,
            overwrite,
            next_reader: 0,
            front: 0,
            items: Vec::new(),
            readers: BTreeMap::new(),
        }
    }

    fn next_seq(&self) -> u64 {
        self.items.len() as u64
    }

    fn resync_front(&mut self) {
        if let Some(min) = self.readers.values().min() {
            self.front = *min;
        }
    }

    pub(crate) fn push(&mut self, item: u64) -> bool {
        if self.len() as u64 == self.capacity {
            if !self.overwrite {
                return false;
            }

            self.front += 1;
            let front = self.front;
            self.readers.values_mut().for_each(|pos| *pos = (*pos).max(front));
        }

        self.items.push(item);
        true
    }

    /// Number of items physically retained.
    pub(crate) fn len(&self) -> usize {
        (self.next_seq() - self.front) as usize
    }

    pub(crate) fn create(&mut self) -> usize {
        let reader = self.next_reader;
        self.next_reader += 1;
        self.readers.insert(reader, self.front);
        reader
    }

    pub(crate) fn remaining(&self, reader: usize) -> Option<usize> {
        let pos = self.readers.get(&reader)?;
        Some((self.next_seq() - pos) as usize)
    }

    pub(crate) fn pop(&mut self, reader: usize) -> Option<u64> {
        let next_seq = self.next_seq();
        let pos = self.readers.get_mut(&reader)?;
        if *pos == next_seq {
            return None;
        }

        let item = self.items[*pos as usize];
        *pos += 1;
        self.resync_front();
        Some(item)
    }

    pub(crate) fn destroy(&mut self, reader: usize) -> bool {
        let destroyed = self.readers.remove(&reader).is_some();
        self.resync_front();
        destroyed
    }

    pub(crate) fn destroy_all(&mut self) {
        self.readers.clear();
    }

    pub(crate) fn clear(&mut self) {
        let next_seq = self.next_seq();
        self.front = next_seq;
        self.readers.values_mut().for_each(|pos| *pos = next_seq);
    }

    /// Items physically retained, oldest first.
    pub(crate) fn content(&self) -> &[u64] {
        &self.items[self.front as usize..]
    }
}
