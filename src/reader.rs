//! Definition of a handle to one reader of a [`MultiRing`].

use crate::{MultiRing, ReaderError, ReaderId};
use std::borrow::Cow;

/// A handle to one reader of a [`MultiRing`].
///
/// The handle holds no position of its own, everything lives in the ring. It only
/// saves passing the [`ReaderId`] around. Obtained with [`MultiRing::reader`] or
/// [`MultiRing::spawn_reader`].
#[derive(Debug)]
pub struct Reader<'a, T> {
    ring: &'a mut MultiRing<T>,
    id: ReaderId,
}

impl<'a, T> Reader<'a, T> {
    pub(crate) fn new(ring: &'a mut MultiRing<T>, id: ReaderId) -> Self {
        Self { ring, id }
    }

    /// Identifier to look this reader up again with [`MultiRing::reader`].
    pub fn id(&self) -> ReaderId {
        self.id
    }

    /// Number of elements this reader has not popped yet.
    pub fn len(&self) -> usize {
        self.ring.remaining(self.id).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Next element this reader will pop, without popping it.
    pub fn peek(&self) -> Option<&T> {
        self.ring.peek(self.id).ok()
    }

    /// Backing index of the next element this reader will pop.
    pub fn start_index(&self) -> Option<usize> {
        self.span().map(|(start, _)| start)
    }

    /// Backing index of the last element this reader will pop.
    pub fn end_index(&self) -> Option<usize> {
        self.span().map(|(_, end)| end)
    }

    fn span(&self) -> Option<(usize, usize)> {
        self.ring.span(self.id).ok().flatten()
    }

    /// Whether the next popped element is still needed by other readers.
    pub fn need_copy(&self) -> bool {
        self.ring.need_copy(self.id).unwrap_or_default()
    }
}

impl<T: Clone> Reader<'_, T> {
    /// Pop the next element, see [`MultiRing::pop`].
    pub fn pop(&mut self) -> Result<Cow<'_, T>, ReaderError> {
        self.ring.pop(self.id)
    }

    /// Destroy this reader, see [`MultiRing::destroy`].
    pub fn destroy(self) -> Result<usize, ReaderError> {
        self.ring.destroy(self.id)
    }
}

impl<T: Clone> Iterator for Reader<'_, T> {
    type Item = T;

    /// Pop the next element as an owned value.
    fn next(&mut self) -> Option<Self::Item> {
        self.pop().ok().map(Cow::into_owned)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.len();
        (len, Some(len))
    }
}
