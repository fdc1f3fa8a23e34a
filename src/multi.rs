//! Definition of a ring store drained by many independent readers.

use crate::{
    Capacity, CapacityError, PushError, Reader, ReaderError, ReaderId, RingConfig, RingStore,
    registry::Registry,
};
use std::borrow::Cow;

/// A [`RingStore`] that any number of readers drain at their own pace.
///
/// Every reader sees every element pushed after the oldest element present when
/// the reader was created. An element is physically popped from the store only
/// once the slowest reader has moved past it. Until then other readers get it
/// borrowed, see [`MultiRing::need_copy`].
///
/// Readers are addressed by [`ReaderId`]. Ids of destroyed readers, or of
/// readers detached by an erase, are rejected with [`ReaderError::Detached`].
#[derive(Debug)]
pub struct MultiRing<T> {
    store: RingStore<T>,
    registry: Registry,
}

impl<T: Clone> MultiRing<T> {
    /// Create a new store with default settings and no readers.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of elements this store can hold.
    pub fn with_capacity(capacity: usize) -> Result<Self, CapacityError> {
        RingStore::with_capacity(capacity).map(Self::from_store)
    }

    /// Create a new store from a config, with no readers.
    ///
    /// # Arguments
    ///
    /// * `config` - Settings of the store.
    pub fn with_config(config: RingConfig<T>) -> Result<Self, CapacityError> {
        RingStore::with_config(config).map(Self::from_store)
    }

    /// Append an element, visible to every registered reader.
    ///
    /// In overwrite mode a reader that had not yet popped the evicted element
    /// skips it.
    ///
    /// # Arguments
    ///
    /// * `value` - Element to append.
    pub fn push(&mut self, value: T) -> Result<Option<T>, PushError<T>> {
        let evicted = self.store.is_full().then(|| self.store.read_index());
        let prev = self.store.push(value)?;
        self.registry.pushed(evicted, &self.store);
        Ok(prev)
    }

    /// Register a new reader positioned on the oldest element.
    pub fn create_reader(&mut self) -> ReaderId {
        let id = self.registry.create(&self.store);
        tracing::debug!(%id, readers = self.registry.len(), "Reader created");
        id
    }

    /// Register a new reader and return a handle to it.
    pub fn spawn_reader(&mut self) -> Reader<'_, T> {
        let id = self.create_reader();
        Reader::new(self, id)
    }

    /// Handle to a registered reader.
    pub fn reader(&mut self, id: ReaderId) -> Result<Reader<'_, T>, ReaderError> {
        self.registry.remaining_of(id, &self.store)?;
        Ok(Reader::new(self, id))
    }

    /// Pop the next element of a reader.
    ///
    /// Returns [`Cow::Owned`] when the element was physically popped from the
    /// store, and [`Cow::Borrowed`] when other readers still need it.
    pub fn pop(&mut self, id: ReaderId) -> Result<Cow<'_, T>, ReaderError> {
        self.registry.pop(id, &mut self.store)
    }

    /// Destroy a reader.
    ///
    /// Elements only this reader was still waiting for are physically popped.
    /// Destroying the last reader leaves every element in the store. Returns the
    /// number of elements popped.
    pub fn destroy(&mut self, id: ReaderId) -> Result<usize, ReaderError> {
        let reclaimed = self.registry.destroy(id, &mut self.store)?;
        tracing::debug!(%id, reclaimed, readers = self.registry.len(), "Reader destroyed");
        Ok(reclaimed)
    }

    /// Destroy every reader, leaving every element in the store.
    ///
    /// Returns the number of readers destroyed.
    pub fn destroy_all(&mut self) -> usize {
        let destroyed = self.registry.destroy_all();
        tracing::debug!(destroyed, "All readers destroyed");
        destroyed
    }

    /// Defragment the store and shift every reader along with it.
    ///
    /// # Arguments
    ///
    /// * `shrink` - Truncate backing memory to the number of elements held.
    pub fn rebase(&mut self, shrink: bool) -> usize {
        let delta = self.store.rebase(shrink);
        self.registry.rebase(delta, &self.store);
        delta
    }

    /// Move every reader back to the oldest element of the store.
    pub fn reset_all(&mut self) {
        self.registry.reset_all(&self.store);
    }

    /// Reset to empty with the current settings, destroying every reader.
    pub fn erase(&mut self) {
        self.destroy_all();
        self.store.erase();
    }

    /// Reset to empty with new settings, destroying every reader.
    ///
    /// Readers and elements are left untouched if the config holds an invalid capacity.
    pub fn erase_with(&mut self, config: RingConfig<T>) -> Result<(), CapacityError> {
        self.store.erase_with(config)?;
        self.destroy_all();
        Ok(())
    }

    /// Reset to empty with a new capacity and the current settings, destroying every reader.
    ///
    /// Readers and elements are left untouched if the capacity is invalid.
    ///
    /// # Arguments
    ///
    /// * `capacity` - New maximum number of elements, in any form [`Capacity`] converts from.
    pub fn erase_to<C>(&mut self, capacity: C) -> Result<(), CapacityError>
    where
        C: TryInto<Capacity, Error = CapacityError>,
    {
        self.store.erase_to(capacity)?;
        self.destroy_all();
        Ok(())
    }

    /// Mark the store empty, readers stay registered with nothing left to read.
    ///
    /// # Arguments
    ///
    /// * `free_refs` - Overwrite live slots with the hole value, so nothing stale is retained.
    pub fn fast_erase(&mut self, free_refs: bool) {
        self.store.fast_erase(free_refs);
        self.registry.reset_all(&self.store);
    }
}

impl<T> MultiRing<T> {
    /// Wrap an existing store, with no readers.
    pub fn from_store(store: RingStore<T>) -> Self {
        Self {
            store,
            registry: Registry::default(),
        }
    }

    /// Detach every reader and hand back the store.
    pub fn into_store(self) -> RingStore<T> {
        self.store
    }

    /// Read-only access to the underlying store.
    pub fn store(&self) -> &RingStore<T> {
        &self.store
    }

    /// Mutable access to the underlying store, only while no reader is registered.
    pub fn store_mut(&mut self) -> Option<&mut RingStore<T>> {
        self.registry.is_empty().then_some(&mut self.store)
    }

    /// Number of elements physically held by the store.
    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the store physically holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Maximum number of elements the store can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Number of registered readers.
    pub fn readers(&self) -> usize {
        self.registry.len()
    }

    /// Registered readers, slowest first.
    pub fn reader_ids(&self) -> impl Iterator<Item = ReaderId> + '_ {
        self.registry.ids()
    }

    /// Number of elements a reader has not popped yet.
    pub fn remaining(&self, id: ReaderId) -> Result<usize, ReaderError> {
        self.registry.remaining_of(id, &self.store)
    }

    /// Next element a reader will pop, without popping it.
    pub fn peek(&self, id: ReaderId) -> Result<&T, ReaderError> {
        self.registry.peek(id, &self.store)
    }

    /// Backing indices of the next and last element a reader will pop, both inclusive.
    pub fn span(&self, id: ReaderId) -> Result<Option<(usize, usize)>, ReaderError> {
        self.registry.span(id, &self.store)
    }

    /// Whether the next element popped by a reader is still needed by other readers.
    ///
    /// When true, [`MultiRing::pop`] hands the element out borrowed and callers that
    /// want to mutate it must clone it first.
    pub fn need_copy(&self, id: ReaderId) -> Result<bool, ReaderError> {
        self.registry.need_copy(id, &self.store)
    }
}
