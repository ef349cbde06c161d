//! Owning iterator for `SegmentedDeque`.

use crate::SegmentedDeque;
use allocator_api2::alloc::Allocator;

/// An owning iterator over elements of a `SegmentedDeque`.
///
/// This struct is created by the `into_iter` method on `SegmentedDeque`
/// (provided by the [`IntoIterator`] trait).
pub struct IntoIter<T, A: Allocator> {
    pub(crate) deque: SegmentedDeque<T, A>,
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.deque.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.deque.len();
        (remaining, Some(remaining))
    }

    #[inline]
    fn count(self) -> usize {
        self.deque.len()
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.deque.pop_back()
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: Allocator> std::iter::FusedIterator for IntoIter<T, A> {}

// Unconsumed elements are dropped with the inner deque.

impl<T: Clone, A: Allocator + Clone> Clone for IntoIter<T, A> {
    fn clone(&self) -> Self {
        IntoIter {
            deque: self.deque.clone(),
        }
    }
}

impl<T: std::fmt::Debug, A: Allocator> std::fmt::Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntoIter")
            .field("remaining", &self.deque.len())
            .finish()
    }
}
