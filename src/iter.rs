//! Iterator implementations for `SegmentedDeque`.

use crate::SegmentedDeque;
use allocator_api2::alloc::Allocator;
use std::ptr::NonNull;

/// An iterator over references to elements of a `SegmentedDeque`.
pub struct Iter<'a, T, A: Allocator> {
    pub(crate) deque: &'a SegmentedDeque<T, A>,
    /// Flattened index of the next element from the front
    pub(crate) front: usize,
    /// Flattened index one past the next element from the back
    pub(crate) back: usize,
}

impl<'a, T, A: Allocator> Iterator for Iter<'a, T, A> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }

        // For ZSTs the cursors only count; every element is the same slot.
        if std::mem::size_of::<T>() == 0 {
            self.front += 1;
            return Some(unsafe { &*NonNull::dangling().as_ptr() });
        }

        let item = unsafe { &*self.deque.buf.ptr_at(self.front) };
        self.front += 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        if n >= self.back - self.front {
            self.front = self.back;
            return None;
        }
        self.front += n;
        self.next()
    }
}

impl<T, A: Allocator> DoubleEndedIterator for Iter<'_, T, A> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;

        if std::mem::size_of::<T>() == 0 {
            return Some(unsafe { &*NonNull::dangling().as_ptr() });
        }

        Some(unsafe { &*self.deque.buf.ptr_at(self.back) })
    }

    #[inline]
    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        if n >= self.back - self.front {
            self.back = self.front;
            return None;
        }
        self.back -= n;
        self.next_back()
    }
}

impl<T, A: Allocator> ExactSizeIterator for Iter<'_, T, A> {}

impl<T, A: Allocator> std::iter::FusedIterator for Iter<'_, T, A> {}

impl<T, A: Allocator> Clone for Iter<'_, T, A> {
    fn clone(&self) -> Self {
        Iter {
            deque: self.deque,
            front: self.front,
            back: self.back,
        }
    }
}

impl<T: std::fmt::Debug, A: Allocator> std::fmt::Debug for Iter<'_, T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Iter")
            .field("remaining", &(self.back - self.front))
            .finish()
    }
}

/// An iterator over mutable references to elements of a `SegmentedDeque`.
pub struct IterMut<'a, T, A: Allocator> {
    pub(crate) deque: &'a mut SegmentedDeque<T, A>,
    /// Flattened index of the next element from the front
    pub(crate) front: usize,
    /// Flattened index one past the next element from the back
    pub(crate) back: usize,
}

impl<'a, T, A: Allocator> Iterator for IterMut<'a, T, A> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }

        if std::mem::size_of::<T>() == 0 {
            self.front += 1;
            return Some(unsafe { &mut *NonNull::dangling().as_ptr() });
        }

        // Each flattened index is visited once, so the references never
        // alias.
        let item = unsafe { &mut *self.deque.buf.ptr_at(self.front) };
        self.front += 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        if n >= self.back - self.front {
            self.front = self.back;
            return None;
        }
        self.front += n;
        self.next()
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IterMut<'_, T, A> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;

        if std::mem::size_of::<T>() == 0 {
            return Some(unsafe { &mut *NonNull::dangling().as_ptr() });
        }

        Some(unsafe { &mut *self.deque.buf.ptr_at(self.back) })
    }

    #[inline]
    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        if n >= self.back - self.front {
            self.back = self.front;
            return None;
        }
        self.back -= n;
        self.next_back()
    }
}

impl<T, A: Allocator> ExactSizeIterator for IterMut<'_, T, A> {}

impl<T, A: Allocator> std::iter::FusedIterator for IterMut<'_, T, A> {}

impl<T: std::fmt::Debug, A: Allocator> std::fmt::Debug for IterMut<'_, T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IterMut")
            .field("remaining", &(self.back - self.front))
            .finish()
    }
}
