//! # Lazyring
//!
//! Lazyring provides a ring store that many independent readers can drain at their own pace.
//!
//! ## RingStore
//!
//! A [`RingStore`] is a fixed capacity FIFO over a flat backing array. Push and pop are O(1),
//! elements can be addressed by raw backing index or by logical offset, and the store can be
//! defragmented in place with [`RingStore::rebase`]. Vacated slots are overwritten with a hole,
//! or a configured fill value, so that popped elements are never retained.
//!
//! ## MultiRing
//!
//! A [`MultiRing`] wraps a store with any number of readers. Every reader sees every element,
//! but an element is physically popped only once the slowest reader moves past it. Faster
//! readers get the elements they pop borrowed, the slowest one gets them owned.
//!
//! ```
//! use lazyring::MultiRing;
//! use std::borrow::Cow;
//!
//! let mut ring = MultiRing::with_capacity(5).unwrap();
//! for value in 1..=5 {
//!     ring.push(value).unwrap();
//! }
//!
//! let r1 = ring.create_reader();
//! let r2 = ring.create_reader();
//!
//! // Still needed by r2, so nothing is physically popped.
//! assert!(matches!(ring.pop(r1), Ok(Cow::Borrowed(1))));
//! assert_eq!(ring.len(), 5);
//!
//! // Nobody needs it any more.
//! assert!(matches!(ring.pop(r2), Ok(Cow::Owned(1))));
//! assert_eq!(ring.len(), 4);
//! ```
//!
//! ## Errors
//!
//! Nothing panics on misuse. Invalid capacities, full stores, empty stores, exhausted readers
//! and readers that were destroyed are all reported as errors.

pub(crate) mod config;
pub(crate) mod multi;
pub(crate) mod reader;
pub(crate) mod registry;
pub(crate) mod store;

#[cfg(test)]
pub(crate) mod oracle;

// Externally exposed types.
pub use config::{Capacity, CapacityError, RingConfig};
pub use multi::MultiRing;
pub use reader::Reader;
pub use registry::{ReaderError, ReaderId};
pub use store::{PopError, PushError, RingStore};
