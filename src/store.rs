//! Definition of a single reader ring store.

use crate::{Capacity, CapacityError, RingConfig};
use std::mem;
use thiserror::Error;

/// Error returned when an element cannot be pushed into a [`RingStore`].
#[derive(Debug, Error)]
pub enum PushError<T> {
    #[error("Ring store is full. Capacity: {capacity}")]
    Full { capacity: usize, value: T },
}

impl<T> PushError<T> {
    /// Take back the element that was rejected.
    pub fn into_inner(self) -> T {
        match self {
            PushError::Full { value, .. } => value,
        }
    }
}

/// Error returned when an element cannot be popped from a [`RingStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PopError {
    #[error("Ring store is empty")]
    Empty,
}

/// A FIFO ring store over a flat backing array.
///
/// Works pretty much like any other ring buffer, few differences:
/// * Backing memory either grows one slot per push up to capacity, or is allocated up front.
/// * Vacated slots are overwritten with a hole, or with the configured fill value.
/// * Raw backing indices are exposed, so that cursors kept elsewhere can address slots.
/// * [`RingStore::rebase`] defragments the store in place so the oldest element sits at index 0.
#[derive(Debug, Clone)]
pub struct RingStore<T> {
    // Maximum number of elements held at once.
    capacity: usize,

    // Index of the oldest element.
    read: usize,

    // Index where the next push will occur.
    // This will wrap around to 0 when next == capacity.
    write: usize,

    // read == write means either empty or full, this tells them apart.
    empty: bool,

    // Settings resolved from the config.
    prealloc: bool,
    overwrite: bool,
    fill: Option<T>,

    // Backing array, never longer than capacity.
    slots: Vec<Option<T>>,
}

impl<T: Clone> RingStore<T> {
    /// Create a new store with default settings.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of elements this store can hold.
    pub fn with_capacity(capacity: usize) -> Result<Self, CapacityError> {
        Self::with_config(RingConfig::new(capacity))
    }

    /// Create a new store from a config.
    ///
    /// # Arguments
    ///
    /// * `config` - Settings of the store.
    pub fn with_config(config: RingConfig<T>) -> Result<Self, CapacityError> {
        let (capacity, prealloc, overwrite, fill) = config.into_parts()?;
        let mut store = Self {
            capacity: capacity.get(),
            read: 0,
            write: 0,
            empty: true,
            prealloc,
            overwrite,
            fill,
            slots: Vec::new(),
        };

        store.reset();
        Ok(store)
    }

    /// Reset to empty with the current settings.
    pub fn erase(&mut self) {
        self.reset();
        tracing::debug!(capacity = self.capacity, "Ring store erased");
    }

    /// Reset to empty with new settings.
    ///
    /// The store is left untouched if the config holds an invalid capacity.
    ///
    /// # Arguments
    ///
    /// * `config` - New settings of the store.
    pub fn erase_with(&mut self, config: RingConfig<T>) -> Result<(), CapacityError> {
        let (capacity, prealloc, overwrite, fill) = config.into_parts()?;
        self.capacity = capacity.get();
        self.prealloc = prealloc;
        self.overwrite = overwrite;
        self.fill = fill;
        self.reset();

        tracing::debug!(
            capacity = self.capacity,
            prealloc,
            overwrite,
            "Ring store erased with new config"
        );

        Ok(())
    }

    /// Reset to empty with a new capacity, keeping every other setting.
    ///
    /// The store is left untouched if the capacity is invalid.
    ///
    /// # Arguments
    ///
    /// * `capacity` - New maximum number of elements, in any form [`Capacity`] converts from.
    pub fn erase_to<C>(&mut self, capacity: C) -> Result<(), CapacityError>
    where
        C: TryInto<Capacity, Error = CapacityError>,
    {
        self.capacity = capacity.try_into()?.get();
        self.reset();

        tracing::debug!(capacity = self.capacity, "Ring store erased to new capacity");
        Ok(())
    }

    fn reset(&mut self) {
        if self.prealloc {
            // Reuse backing memory when it already has the right size.
            if self.slots.len() == self.capacity {
                self.slots.fill(self.fill.clone());
            } else {
                self.slots = vec![self.fill.clone(); self.capacity];
            }
        } else {
            self.slots.clear();
        }

        self.read = 0;
        self.write = 0;
        self.empty = true;
    }

    /// Mark the store empty without touching backing memory.
    ///
    /// # Arguments
    ///
    /// * `free_refs` - Overwrite live slots with the hole value, so nothing stale is retained.
    pub fn fast_erase(&mut self, free_refs: bool) {
        if free_refs {
            let mut index = self.read;
            for _ in 0..self.len() {
                if let Some(slot) = self.slots.get_mut(index) {
                    *slot = self.fill.clone();
                }

                index = self.next(index);
            }
        }

        self.read = 0;
        self.write = 0;
        self.empty = true;
    }

    /// Append an element to the store.
    ///
    /// Returns whatever the slot held before: nothing for a fresh hole, the fill value,
    /// or the oldest element when a full store is configured to overwrite. A full store
    /// that does not overwrite rejects the element with [`PushError::Full`].
    ///
    /// # Arguments
    ///
    /// * `value` - Element to append.
    pub fn push(&mut self, value: T) -> Result<Option<T>, PushError<T>> {
        let full = self.is_full();
        if full && !self.overwrite {
            return Err(PushError::Full {
                capacity: self.capacity,
                value,
            });
        }

        // Backing memory grows one slot at a time till it reaches capacity.
        let prev = match self.slots.get_mut(self.write) {
            Some(slot) => slot.replace(value),
            None => {
                self.slots.push(Some(value));
                None
            }
        };

        // Oldest element was just overwritten.
        if full {
            self.read = self.next(self.read);
        }

        self.write = self.next(self.write);
        self.empty = false;
        Ok(prev)
    }

    /// Remove and return the oldest element.
    ///
    /// The vacated slot is overwritten with the hole value.
    pub fn pop(&mut self) -> Result<T, PopError> {
        if self.empty {
            return Err(PopError::Empty);
        }

        let fill = self.fill.clone();
        let value = self
            .slots
            .get_mut(self.read)
            .and_then(|slot| mem::replace(slot, fill))
            .ok_or(PopError::Empty)?;

        self.read = self.next(self.read);
        self.empty = self.read == self.write;
        Ok(value)
    }

    /// Defragment so that the oldest element sits at backing index 0.
    ///
    /// Returns the index the oldest element was moved from, which is how far every
    /// backing index into the live region has shifted.
    ///
    /// # Arguments
    ///
    /// * `shrink` - Truncate backing memory to the number of elements held.
    pub fn rebase(&mut self, shrink: bool) -> usize {
        let delta = self.read;
        let length = self.len();

        // In-place rotation, live region wraps only when backing memory is at capacity.
        self.slots.rotate_left(delta);
        if shrink {
            self.slots.truncate(length);
            self.slots.shrink_to_fit();
        }

        self.read = 0;
        self.write = if length == self.capacity { 0 } else { length };

        tracing::debug!(delta, length, shrink, "Ring store rebased");
        delta
    }
}

impl<T> RingStore<T> {
    /// Maximum number of elements this store can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of elements currently held.
    #[inline]
    pub fn len(&self) -> usize {
        if self.empty {
            0
        } else {
            self.distance(self.read, self.write)
        }
    }

    /// Whether the store holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Whether the store holds as many elements as its capacity.
    #[inline]
    pub fn is_full(&self) -> bool {
        !self.empty && self.read == self.write
    }

    /// Whether pushing into a full store evicts the oldest element.
    #[inline]
    pub fn is_overwrite(&self) -> bool {
        self.overwrite
    }

    /// Backing index of the oldest element.
    #[inline]
    pub fn read_index(&self) -> usize {
        self.read
    }

    /// Backing index where the next push will occur.
    #[inline]
    pub fn write_index(&self) -> usize {
        self.write
    }

    /// Backing indices of the oldest and newest element, both inclusive.
    pub fn span(&self) -> Option<(usize, usize)> {
        (!self.empty).then(|| (self.read, self.prev(self.write)))
    }

    /// Number of slots currently allocated in backing memory.
    pub fn allocated(&self) -> usize {
        self.slots.len()
    }

    /// Raw access to a backing slot.
    ///
    /// Returns `None` for holes and for indices past allocated memory. Slots outside
    /// the live region hold holes, fill values or stale elements left by
    /// [`RingStore::fast_erase`].
    ///
    /// # Arguments
    ///
    /// * `index` - Backing index, not a logical offset.
    #[inline]
    pub fn peek(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Element at a logical offset, 0 being the oldest.
    pub fn get(&self, offset: usize) -> Option<&T> {
        if offset >= self.len() {
            return None;
        }

        self.peek((self.read + offset) % self.capacity)
    }

    /// Oldest element, if any.
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Elements between two backing indices, both inclusive.
    ///
    /// When `start > end` the range wraps around the end of backing memory.
    /// Indices past allocated memory are clamped to it, holes are skipped.
    pub fn content(&self, start: usize, end: usize) -> Vec<&T> {
        let wraps = start > end;
        let clamp = |index: usize| index.min(self.slots.len());
        let (start, end) = (clamp(start), clamp(end.saturating_add(1)));

        let (head, tail) = if wraps {
            (&self.slots[start..], &self.slots[..end])
        } else {
            (&self.slots[start..end], &[][..])
        };

        head.iter().chain(tail).filter_map(Option::as_ref).collect()
    }

    /// An iterator through all elements currently held, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (head, tail) = self.as_slices();
        head.iter().chain(tail).filter_map(Option::as_ref)
    }

    /// Live region as two discrete chunks of slots, the second is empty unless the region wraps.
    fn as_slices(&self) -> (&[Option<T>], &[Option<T>]) {
        if self.empty {
            return (&[], &[]);
        }

        if self.read < self.write {
            (&self.slots[self.read..self.write], &[])
        } else {
            // Region wraps only when backing memory is at capacity.
            let (tail, head) = self.slots.split_at(self.read);
            (head, &tail[..self.write])
        }
    }

    /// Backing index after `index`.
    #[inline]
    pub(crate) fn next(&self, index: usize) -> usize {
        if index + 1 >= self.capacity { 0 } else { index + 1 }
    }

    /// Backing index before `index`.
    #[inline]
    pub(crate) fn prev(&self, index: usize) -> usize {
        if index == 0 { self.capacity - 1 } else { index - 1 }
    }

    /// Number of slots walked going forward from `from` to `to`.
    ///
    /// Equal indices are a full lap, callers tell that apart from zero.
    #[inline]
    pub(crate) fn distance(&self, from: usize, to: usize) -> usize {
        if to > from {
            to - from
        } else {
            self.capacity - from + to
        }
    }
}
