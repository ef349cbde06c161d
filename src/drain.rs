//! Draining iterator for `SegmentedDeque`.

use crate::SegmentedDeque;
use allocator_api2::alloc::Allocator;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

/// A draining iterator for `SegmentedDeque`.
///
/// This struct is created by the [`drain`] method on [`SegmentedDeque`].
///
/// [`drain`]: SegmentedDeque::drain
pub struct Drain<'a, T: 'a, A: Allocator> {
    /// Pointer to the deque being drained
    pub(crate) deque: NonNull<SegmentedDeque<T, A>>,
    /// Flattened index of the next unyielded element
    pub(crate) front: usize,
    /// Flattened index one past the last unyielded element
    pub(crate) back: usize,
    /// Flattened start of the elements behind the drained range
    pub(crate) tail_start: usize,
    /// Number of elements behind the drained range
    pub(crate) tail_len: usize,
    /// Marker for the lifetime
    pub(crate) _marker: PhantomData<&'a mut SegmentedDeque<T, A>>,
}

impl<T, A: Allocator> Iterator for Drain<'_, T, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let deque = unsafe { self.deque.as_ref() };
        let value = unsafe { ptr::read(deque.buf.ptr_at(self.front)) };
        self.front += 1;
        Some(value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T, A: Allocator> DoubleEndedIterator for Drain<'_, T, A> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        let deque = unsafe { self.deque.as_ref() };
        Some(unsafe { ptr::read(deque.buf.ptr_at(self.back)) })
    }
}

impl<T, A: Allocator> ExactSizeIterator for Drain<'_, T, A> {}

impl<T, A: Allocator> std::iter::FusedIterator for Drain<'_, T, A> {}

impl<T, A: Allocator> Drop for Drain<'_, T, A> {
    fn drop(&mut self) {
        let deque = unsafe { self.deque.as_mut() };

        // Drop any elements in the range that weren't consumed.
        unsafe { SegmentedDeque::drop_range(&deque.buf, self.front, self.back) };

        // The deque's tail was parked at the range start; close the gap by
        // moving the elements behind the range forward one by one, since
        // the gap may cross block boundaries.
        let drain_start = deque.tail_cursor();
        let gap = self.tail_start - drain_start;
        if gap > 0 {
            for i in 0..self.tail_len {
                unsafe {
                    let src = deque.buf.ptr_at(self.tail_start + i);
                    let dst = deque.buf.ptr_at(self.tail_start + i - gap);
                    ptr::copy_nonoverlapping(src, dst, 1);
                }
            }
        }
        deque.set_tail_cursor(drain_start + self.tail_len);
    }
}

// Safety: Drain has exclusive access to the drained portion
unsafe impl<T: Sync, A: Allocator + Sync> Sync for Drain<'_, T, A> {}
unsafe impl<T: Send, A: Allocator + Send> Send for Drain<'_, T, A> {}

impl<T: std::fmt::Debug, A: Allocator> std::fmt::Debug for Drain<'_, T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Drain")
            .field("remaining", &(self.back - self.front))
            .field("tail_len", &self.tail_len)
            .finish()
    }
}
