//! Configuration of a ring store, resolved once at construction.

use std::{num::NonZeroUsize, str::FromStr};
use thiserror::Error;

/// Largest integer a float can represent without losing precision (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Error returned when a requested capacity is not a positive integer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapacityError {
    #[error("Invalid capacity: {0}, must be a positive integer")]
    InvalidCapacity(String),
}

/// Maximum number of elements a ring store can hold.
///
/// A capacity is always a positive integer. Conversions exist from the kinds
/// of values configuration usually arrives as, all of which reject zero,
/// negative, fractional and non-numeric input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Capacity(NonZeroUsize);

impl Capacity {
    /// Number of elements as a plain integer.
    #[inline]
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<usize> for Capacity {
    type Error = CapacityError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        NonZeroUsize::new(value)
            .map(Capacity)
            .ok_or_else(|| CapacityError::InvalidCapacity(value.to_string()))
    }
}

impl TryFrom<i64> for Capacity {
    type Error = CapacityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Capacity)
            .ok_or_else(|| CapacityError::InvalidCapacity(value.to_string()))
    }
}

impl TryFrom<f64> for Capacity {
    type Error = CapacityError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        // NaN and infinities have a NaN fractional part, so they fail here too.
        if value.fract() != 0.0 || !(1.0..=MAX_SAFE_INTEGER).contains(&value) {
            return Err(CapacityError::InvalidCapacity(value.to_string()));
        }

        Capacity::try_from(value as usize)
    }
}

impl TryFrom<&str> for Capacity {
    type Error = CapacityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for Capacity {
    type Err = CapacityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<usize>()
            .map_err(|_| CapacityError::InvalidCapacity(s.to_string()))
            .and_then(Capacity::try_from)
    }
}

/// Settings of a [`RingStore`](crate::RingStore).
///
/// Built with a consuming builder and applied with
/// [`RingStore::with_config`](crate::RingStore::with_config) or
/// [`RingStore::erase_with`](crate::RingStore::erase_with). The capacity is
/// validated when the config is applied, not when it is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingConfig<T> {
    capacity: usize,
    prealloc: bool,
    overwrite: bool,
    fill: Option<T>,
}

impl<T> RingConfig<T> {
    /// A config for a store holding at most `capacity` elements.
    ///
    /// Backing memory grows on demand, pushing into a full store is
    /// rejected and vacated slots become empty holes.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            prealloc: false,
            overwrite: false,
            fill: None,
        }
    }

    /// A config for an already validated capacity, e.g. one parsed from a string.
    pub fn from_capacity(capacity: Capacity) -> Self {
        Self::new(capacity.get())
    }

    /// Allocate every slot up front instead of growing one slot per push.
    pub fn prealloc(mut self, prealloc: bool) -> Self {
        self.prealloc = prealloc;
        self
    }

    /// Evict the oldest element when pushing into a full store.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Value written into every vacated or preallocated slot.
    pub fn fill(mut self, fill: T) -> Self {
        self.fill = Some(fill);
        self
    }

    /// Requested capacity, not yet validated.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether all slots are allocated up front.
    pub fn is_prealloc(&self) -> bool {
        self.prealloc
    }

    /// Whether a full store evicts its oldest element on push.
    pub fn is_overwrite(&self) -> bool {
        self.overwrite
    }

    /// Hole value, if configured.
    pub fn fill_value(&self) -> Option<&T> {
        self.fill.as_ref()
    }

    /// Validate and split the config into its parts.
    pub(crate) fn into_parts(self) -> Result<(Capacity, bool, bool, Option<T>), CapacityError> {
        let capacity = Capacity::try_from(self.capacity)?;
        Ok((capacity, self.prealloc, self.overwrite, self.fill))
    }
}
