//! A double-ended queue backed by fixed-size blocks.
//!
//! Unlike a ring buffer, `SegmentedDeque` never moves an element after it is
//! written: elements live in blocks of ten slots reached through an outer
//! array of block pointers (the map), and growth replaces only the map.
//! Pushing and popping at both ends is amortized O(1) and indexing is O(1).
//!
//! # Example
//!
//! ```
//! use segmented_deque::SegmentedDeque;
//!
//! let mut deque: SegmentedDeque<i32> = SegmentedDeque::new();
//! deque.push_back(2);
//! deque.push_back(3);
//! deque.push_front(1);
//!
//! assert_eq!(deque.len(), 3);
//! assert_eq!(deque[0], 1);
//! assert_eq!(deque.pop_back(), Some(3));
//! assert_eq!(deque.pop_front(), Some(1));
//! ```

mod drain;
mod into_iter;
mod iter;
mod raw_deque;

use allocator_api2::alloc::{handle_alloc_error, Allocator, Global};
pub use drain::Drain;
pub use into_iter::IntoIter;
pub use iter::{Iter, IterMut};

use raw_deque::{RawSegmentedDeque, BLOCK_CAP};
use std::alloc::Layout;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut, Range};
use std::ptr::{self, NonNull};

/// The error type for `try_reserve` operations.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TryReserveError {
    kind: TryReserveErrorKind,
}

#[derive(Clone, PartialEq, Eq, Debug)]
enum TryReserveErrorKind {
    /// The capacity computation overflowed.
    CapacityOverflow,
    /// Memory allocation failed.
    AllocError { layout: Layout },
}

impl std::fmt::Display for TryReserveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            TryReserveErrorKind::CapacityOverflow => {
                write!(f, "memory allocation failed due to capacity overflow")
            }
            TryReserveErrorKind::AllocError { layout } => {
                write!(f, "memory allocation of {} bytes failed", layout.size())
            }
        }
    }
}

impl std::error::Error for TryReserveError {}

impl TryReserveError {
    pub(crate) fn capacity_overflow() -> Self {
        Self {
            kind: TryReserveErrorKind::CapacityOverflow,
        }
    }

    pub(crate) fn alloc_error(layout: Layout) -> Self {
        Self {
            kind: TryReserveErrorKind::AllocError { layout },
        }
    }
}

#[cold]
fn handle_reserve_error(err: TryReserveError) -> ! {
    match err.kind {
        TryReserveErrorKind::CapacityOverflow => panic!("capacity overflow"),
        TryReserveErrorKind::AllocError { layout } => handle_alloc_error(layout),
    }
}

/// A double-ended queue backed by fixed-size blocks.
///
/// `SegmentedDeque` stores elements in blocks reached through an outer array
/// of block pointers (the map). Growth allocates a bigger map and fresh
/// blocks on both ends, then carries the existing block pointers into the
/// middle; the elements themselves never move, so growth copies only
/// pointers.
///
/// The live elements occupy a contiguous range of the flattened slot space,
/// bounded by the `head` and `tail` cursors. The element at logical index
/// `i` lives at flattened index `head + i`, which is block
/// `(head + i) / BLOCK_CAP`, slot `(head + i) % BLOCK_CAP`.
///
/// For zero-sized element types no blocks exist; `head` stays 0 and `tail`
/// equals the length.
pub struct SegmentedDeque<T, A: Allocator = Global> {
    /// Low-level map and block allocation management
    pub(crate) buf: RawSegmentedDeque<T, A>,
    /// Flattened index of the first live element
    head: usize,
    /// Flattened index one past the last live element
    tail: usize,
}

// Constructors using the global allocator
impl<T> SegmentedDeque<T> {
    /// Creates a new empty `SegmentedDeque`.
    ///
    /// Does not allocate until elements are pushed.
    ///
    /// # Example
    ///
    /// ```
    /// use segmented_deque::SegmentedDeque;
    /// let deque: SegmentedDeque<i32> = SegmentedDeque::new();
    /// assert!(deque.is_empty());
    /// ```
    #[inline]
    pub const fn new() -> Self {
        Self::new_in(Global)
    }

    /// Creates a new `SegmentedDeque` with room for at least `capacity`
    /// elements.
    ///
    /// # Example
    ///
    /// ```
    /// use segmented_deque::SegmentedDeque;
    /// let deque: SegmentedDeque<i32> = SegmentedDeque::with_capacity(100);
    /// assert!(deque.capacity() >= 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, Global)
    }

    /// Creates a `SegmentedDeque` holding `n` clones of `elem`.
    ///
    /// # Example
    ///
    /// ```
    /// use segmented_deque::SegmentedDeque;
    /// let deque = SegmentedDeque::from_elem(7, 3);
    /// assert_eq!(deque.len(), 3);
    /// assert!(deque.iter().all(|&x| x == 7));
    /// ```
    pub fn from_elem(elem: T, n: usize) -> Self
    where
        T: Clone,
    {
        let mut deque = Self::new();
        deque.resize(n, elem);
        deque
    }
}

// Core implementation
impl<T, A: Allocator> SegmentedDeque<T, A> {
    /// Creates a new empty `SegmentedDeque` using the given allocator.
    #[inline]
    pub const fn new_in(alloc: A) -> Self {
        Self {
            buf: RawSegmentedDeque::new_in(alloc),
            head: 0,
            tail: 0,
        }
    }

    /// Creates an empty deque with room for at least `capacity` elements,
    /// using the given allocator.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        let mut deque = Self::new_in(alloc);
        deque.reserve_back(capacity);
        deque
    }

    /// Returns the number of elements in the deque.
    #[inline]
    pub const fn len(&self) -> usize {
        self.tail - self.head
    }

    /// Returns `true` if the deque contains no elements.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Returns the total number of slots across all allocated blocks.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Returns a reference to the underlying allocator.
    #[inline]
    pub fn allocator(&self) -> &A {
        self.buf.allocator()
    }

    /// Appends an element to the back of the deque.
    ///
    /// # Panics
    ///
    /// Panics if allocation fails.
    ///
    /// # Example
    ///
    /// ```
    /// use segmented_deque::SegmentedDeque;
    /// let mut deque: SegmentedDeque<i32> = SegmentedDeque::new();
    /// deque.push_back(1);
    /// deque.push_back(2);
    /// assert_eq!(deque.back(), Some(&2));
    /// ```
    #[inline]
    pub fn push_back(&mut self, value: T) {
        // Fast path: a free slot exists behind the last element.
        if self.tail < self.buf.capacity() {
            unsafe {
                ptr::write(self.buf.ptr_at(self.tail), value);
            }
            self.tail += 1;
            return;
        }

        self.push_back_slow(value);
    }

    #[cold]
    #[inline(never)]
    fn push_back_slow(&mut self, value: T) {
        self.reserve_back(1);
        unsafe {
            ptr::write(self.buf.ptr_at(self.tail), value);
        }
        self.tail += 1;
    }

    /// Prepends an element to the front of the deque.
    ///
    /// # Panics
    ///
    /// Panics if allocation fails.
    ///
    /// # Example
    ///
    /// ```
    /// use segmented_deque::SegmentedDeque;
    /// let mut deque: SegmentedDeque<i32> = SegmentedDeque::new();
    /// deque.push_back(4);
    /// deque.push_front(6);
    /// deque.push_front(7);
    /// assert_eq!(deque[0], 7);
    /// assert_eq!(deque[1], 6);
    /// assert_eq!(deque[2], 4);
    /// ```
    #[inline]
    pub fn push_front(&mut self, value: T) {
        // For ZSTs both ends are the same dangling slot.
        if std::mem::size_of::<T>() == 0 {
            self.push_back(value);
            return;
        }

        // Fast path: a free slot exists before the first element.
        if self.head > 0 {
            self.head -= 1;
            unsafe {
                ptr::write(self.buf.ptr_at(self.head), value);
            }
            return;
        }

        self.push_front_slow(value);
    }

    #[cold]
    #[inline(never)]
    fn push_front_slow(&mut self, value: T) {
        self.reserve_front(1);
        self.head -= 1;
        unsafe {
            ptr::write(self.buf.ptr_at(self.head), value);
        }
    }

    /// Removes the last element and returns it, or `None` if empty.
    #[inline]
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.tail -= 1;
        Some(unsafe { ptr::read(self.buf.ptr_at(self.tail)) })
    }

    /// Removes the first element and returns it, or `None` if empty.
    ///
    /// # Example
    ///
    /// ```
    /// use segmented_deque::SegmentedDeque;
    /// let mut deque: SegmentedDeque<i32> = SegmentedDeque::new();
    /// deque.push_front(2);
    /// deque.push_back(3);
    /// deque.push_front(4);
    /// assert_eq!(deque.pop_front(), Some(4));
    /// assert_eq!(deque[0], 2);
    /// assert_eq!(deque.back(), Some(&3));
    /// ```
    #[inline]
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        if std::mem::size_of::<T>() == 0 {
            return self.pop_back();
        }
        let value = unsafe { ptr::read(self.buf.ptr_at(self.head)) };
        self.head += 1;
        Some(value)
    }

    /// Returns a reference to the element at the given index.
    ///
    /// Returns `None` if the index is out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len() {
            Some(unsafe { &*self.buf.ptr_at(self.head + index) })
        } else {
            None
        }
    }

    /// Returns a mutable reference to the element at the given index.
    ///
    /// Returns `None` if the index is out of bounds.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len() {
            Some(unsafe { &mut *self.buf.ptr_at(self.head + index) })
        } else {
            None
        }
    }

    /// Returns a reference to the first element, or `None` if empty.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns a mutable reference to the first element, or `None` if empty.
    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    /// Returns a reference to the last element, or `None` if empty.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        match self.len().checked_sub(1) {
            Some(last) => self.get(last),
            None => None,
        }
    }

    /// Returns a mutable reference to the last element, or `None` if empty.
    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        match self.len().checked_sub(1) {
            Some(last) => self.get_mut(last),
            None => None,
        }
    }

    /// Returns `true` if the deque contains an element equal to the value.
    #[inline]
    pub fn contains(&self, x: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|item| item == x)
    }

    /// Clears the deque, removing all elements.
    ///
    /// Keeps the allocated blocks and recenters the cursors so both ends
    /// regain slack.
    pub fn clear(&mut self) {
        let (head, tail) = (self.head, self.tail);

        // Move the cursors off the range before dropping so a panicking
        // Drop cannot double-drop.
        if std::mem::size_of::<T>() == 0 {
            self.tail = 0;
        } else {
            let mid = self.buf.block_count() / 2 * BLOCK_CAP;
            self.head = mid;
            self.tail = mid;
        }

        unsafe { Self::drop_range(&self.buf, head, tail) };
    }

    /// Shortens the deque, keeping the first `len` elements and dropping
    /// the rest. Has no effect if `len >= self.len()`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len() {
            return;
        }
        let old_tail = self.tail;
        let new_tail = self.head + len;
        self.tail = new_tail;
        unsafe { Self::drop_range(&self.buf, new_tail, old_tail) };
    }

    /// Reserves room for at least `additional` more elements at the back.
    ///
    /// Growth keeps the map symmetric, so this adds slack at the front as
    /// well.
    ///
    /// # Panics
    ///
    /// Panics if the capacity computation overflows or allocation fails.
    pub fn reserve_back(&mut self, additional: usize) {
        if let Err(err) = self.try_reserve_back(additional) {
            handle_reserve_error(err);
        }
    }

    /// Reserves room for at least `additional` more elements at the front.
    ///
    /// # Panics
    ///
    /// Panics if the capacity computation overflows or allocation fails.
    pub fn reserve_front(&mut self, additional: usize) {
        if let Err(err) = self.try_reserve_front(additional) {
            handle_reserve_error(err);
        }
    }

    /// Tries to reserve room for at least `additional` more elements at the
    /// back.
    ///
    /// On error the deque is left exactly as it was.
    pub fn try_reserve_back(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let needed = self
            .tail
            .checked_add(additional)
            .ok_or_else(TryReserveError::capacity_overflow)?;
        if needed <= self.buf.capacity() {
            return Ok(());
        }
        self.grow_for(needed - self.buf.capacity())
    }

    /// Tries to reserve room for at least `additional` more elements at the
    /// front.
    ///
    /// On error the deque is left exactly as it was.
    pub fn try_reserve_front(&mut self, additional: usize) -> Result<(), TryReserveError> {
        if std::mem::size_of::<T>() == 0 {
            return match self.len().checked_add(additional) {
                Some(_) => Ok(()),
                None => Err(TryReserveError::capacity_overflow()),
            };
        }
        if additional <= self.head {
            return Ok(());
        }
        self.grow_for(additional - self.head)
    }

    /// Grows the map so at least `missing` more slots exist on each side.
    fn grow_for(&mut self, missing: usize) -> Result<(), TryReserveError> {
        debug_assert!(missing > 0);
        let request = missing / BLOCK_CAP + 1;
        let side = request.max(2 * self.buf.block_count());
        self.buf.grow(side)?;
        let shift = side * BLOCK_CAP;
        self.head += shift;
        self.tail += shift;
        Ok(())
    }

    /// Shrinks the storage to the blocks overlapping the live range,
    /// releasing all others. An empty deque returns to the unallocated
    /// state.
    pub fn shrink_to_fit(&mut self) {
        if std::mem::size_of::<T>() == 0 {
            return;
        }
        if self.is_empty() {
            unsafe { self.buf.deallocate() };
            self.head = 0;
            self.tail = 0;
            return;
        }
        let first_block = self.head / BLOCK_CAP;
        let span = (self.tail - 1) / BLOCK_CAP - first_block + 1;
        if let Err(err) = self.buf.retain_span(first_block, span) {
            handle_reserve_error(err);
        }
        self.head -= first_block * BLOCK_CAP;
        self.tail -= first_block * BLOCK_CAP;
    }

    /// Resizes the deque to `new_len` elements, filling new slots at the
    /// back with clones of `value`.
    ///
    /// # Example
    ///
    /// ```
    /// use segmented_deque::SegmentedDeque;
    /// let mut deque: SegmentedDeque<i32> = SegmentedDeque::new();
    /// deque.resize(3, 9);
    /// deque.resize(2, 0);
    /// assert_eq!(deque.iter().copied().collect::<Vec<_>>(), vec![9, 9]);
    /// ```
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        if new_len <= self.len() {
            self.truncate(new_len);
            return;
        }
        let additional = new_len - self.len();
        self.reserve_back(additional);
        let start = self.tail;
        unsafe { Self::fill_range(&self.buf, start, start + additional, &value) };
        self.tail = start + additional;
    }

    /// Resizes the deque to `new_len` elements, filling new slots at the
    /// back with values produced by the closure.
    pub fn resize_with<F>(&mut self, new_len: usize, f: F)
    where
        F: FnMut() -> T,
    {
        if new_len <= self.len() {
            self.truncate(new_len);
            return;
        }
        let additional = new_len - self.len();
        self.reserve_back(additional);
        let start = self.tail;
        unsafe { Self::fill_range_with(&self.buf, start, start + additional, f) };
        self.tail = start + additional;
    }

    /// Inserts an element at position `index`, shifting the shorter side of
    /// the deque to make room.
    ///
    /// `insert(len(), value)` is equivalent to `push_back(value)`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    ///
    /// # Example
    ///
    /// ```
    /// use segmented_deque::SegmentedDeque;
    /// let mut deque: SegmentedDeque<i32> = [1, 2, 4].into();
    /// deque.insert(2, 3);
    /// assert_eq!(deque.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    /// ```
    pub fn insert(&mut self, index: usize, value: T) {
        assert!(index <= self.len(), "index out of bounds");

        // Position is meaningless for zero-sized values.
        if std::mem::size_of::<T>() == 0 {
            self.push_back(value);
            return;
        }

        let len = self.len();
        if index == len {
            self.push_back(value);
            return;
        }
        if index == 0 {
            self.push_front(value);
            return;
        }

        if index < len - index {
            // Shift the run in front of the slot one step toward the front.
            if self.head == 0 {
                self.reserve_front(1);
            }
            unsafe {
                let old_head = self.head;
                self.head -= 1;
                for flat in old_head..old_head + index {
                    ptr::copy_nonoverlapping(self.buf.ptr_at(flat), self.buf.ptr_at(flat - 1), 1);
                }
                ptr::write(self.buf.ptr_at(self.head + index), value);
            }
        } else {
            // Shift the run behind the slot one step toward the back.
            if self.tail == self.buf.capacity() {
                self.reserve_back(1);
            }
            unsafe {
                let mut flat = self.tail;
                while flat > self.head + index {
                    ptr::copy_nonoverlapping(self.buf.ptr_at(flat - 1), self.buf.ptr_at(flat), 1);
                    flat -= 1;
                }
                ptr::write(self.buf.ptr_at(self.head + index), value);
            }
            self.tail += 1;
        }
    }

    /// Removes and returns the element at position `index`, shifting the
    /// shorter side of the deque to close the gap.
    ///
    /// Returns `None` if `index >= len()`, so removing at the
    /// one-past-the-end position is a defined no-op.
    ///
    /// # Example
    ///
    /// ```
    /// use segmented_deque::SegmentedDeque;
    /// let mut deque: SegmentedDeque<i32> = [1, 2, 3].into();
    /// assert_eq!(deque.remove(1), Some(2));
    /// assert_eq!(deque.remove(5), None);
    /// assert_eq!(deque.iter().copied().collect::<Vec<_>>(), vec![1, 3]);
    /// ```
    pub fn remove(&mut self, index: usize) -> Option<T> {
        let len = self.len();
        if index >= len {
            return None;
        }

        if std::mem::size_of::<T>() == 0 {
            self.tail -= 1;
            return Some(unsafe { ptr::read(NonNull::dangling().as_ptr()) });
        }

        if index == 0 {
            return self.pop_front();
        }
        if index == len - 1 {
            return self.pop_back();
        }

        let flat = self.head + index;
        let value = unsafe { ptr::read(self.buf.ptr_at(flat)) };

        if index < len - index - 1 {
            // Fewer elements in front of the gap: shift them back by one.
            unsafe {
                for f in (self.head..flat).rev() {
                    ptr::copy_nonoverlapping(self.buf.ptr_at(f), self.buf.ptr_at(f + 1), 1);
                }
            }
            self.head += 1;
        } else {
            unsafe {
                for f in flat + 1..self.tail {
                    ptr::copy_nonoverlapping(self.buf.ptr_at(f), self.buf.ptr_at(f - 1), 1);
                }
            }
            self.tail -= 1;
        }

        Some(value)
    }

    /// Swaps the elements at indices `i` and `j`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn swap(&mut self, i: usize, j: usize) {
        assert!(i < self.len(), "swap index out of bounds");
        assert!(j < self.len(), "swap index out of bounds");
        if i == j {
            return;
        }
        unsafe {
            ptr::swap(
                self.buf.ptr_at(self.head + i),
                self.buf.ptr_at(self.head + j),
            );
        }
    }

    /// Creates a draining iterator that removes the given range and yields
    /// its elements front to back.
    ///
    /// Elements not consumed are dropped when the iterator is dropped. If
    /// the iterator is leaked, the deque keeps only the elements before the
    /// range.
    ///
    /// # Panics
    ///
    /// Panics if the range is inverted or past the end.
    ///
    /// # Example
    ///
    /// ```
    /// use segmented_deque::SegmentedDeque;
    /// let mut deque: SegmentedDeque<i32> = (0..10).collect();
    /// let drained: Vec<i32> = deque.drain(3..7).collect();
    /// assert_eq!(drained, vec![3, 4, 5, 6]);
    /// assert_eq!(deque.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 7, 8, 9]);
    /// ```
    pub fn drain(&mut self, range: Range<usize>) -> Drain<'_, T, A> {
        assert!(range.start <= range.end);
        assert!(range.end <= self.len());

        let drain_start = self.head + range.start;
        let drain_end = self.head + range.end;
        let tail_len = self.tail - drain_end;

        // While the drain is live the deque exposes only the prefix, so a
        // leaked drain cannot leave dead slots inside the live range.
        self.tail = drain_start;

        Drain {
            deque: NonNull::from(self),
            front: drain_start,
            back: drain_end,
            tail_start: drain_end,
            tail_len,
            _marker: PhantomData,
        }
    }

    /// Returns an iterator over references to the elements.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T, A> {
        Iter {
            front: self.head,
            back: self.tail,
            deque: self,
        }
    }

    /// Returns an iterator over mutable references to the elements.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T, A> {
        IterMut {
            front: self.head,
            back: self.tail,
            deque: self,
        }
    }

    #[inline]
    pub(crate) const fn tail_cursor(&self) -> usize {
        self.tail
    }

    #[inline]
    pub(crate) fn set_tail_cursor(&mut self, tail: usize) {
        self.tail = tail;
    }

    /// Drops every element in the flattened range `[start, end)`.
    ///
    /// Splits the range at block boundaries and drops whole runs at a time.
    ///
    /// # Safety
    ///
    /// Every slot in the range must hold a live element, and the caller must
    /// have already moved the cursors off the range.
    pub(crate) unsafe fn drop_range(buf: &RawSegmentedDeque<T, A>, start: usize, end: usize) {
        if !std::mem::needs_drop::<T>() || start >= end {
            return;
        }

        // Zero-sized values all live at the same dangling address.
        if std::mem::size_of::<T>() == 0 {
            for _ in start..end {
                ptr::drop_in_place(NonNull::<T>::dangling().as_ptr());
            }
            return;
        }

        let first_block = start / BLOCK_CAP;
        let last_block = (end - 1) / BLOCK_CAP;

        if first_block == last_block {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(buf.ptr_at(start), end - start));
            return;
        }

        // Partial first block, whole interior blocks, partial last block.
        let first_len = BLOCK_CAP - start % BLOCK_CAP;
        ptr::drop_in_place(ptr::slice_from_raw_parts_mut(buf.ptr_at(start), first_len));
        for block in first_block + 1..last_block {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                buf.block_ptr(block),
                BLOCK_CAP,
            ));
        }
        let last_len = end - last_block * BLOCK_CAP;
        ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
            buf.block_ptr(last_block),
            last_len,
        ));
    }

    /// Fills the flattened range `[start, end)` with clones of `value`.
    ///
    /// # Safety
    ///
    /// Same contract as [`SegmentedDeque::fill_range_with`].
    unsafe fn fill_range(buf: &RawSegmentedDeque<T, A>, start: usize, end: usize, value: &T)
    where
        T: Clone,
    {
        Self::fill_range_with(buf, start, end, || value.clone());
    }

    /// Fills the flattened range `[start, end)` by constructing one value
    /// per slot, walking block-sized runs. If the generator panics, the
    /// constructed prefix is dropped before the panic continues.
    ///
    /// # Safety
    ///
    /// Every slot in the range must be unconstructed and within allocated
    /// capacity. The cursors must not cover the range yet.
    unsafe fn fill_range_with<F>(buf: &RawSegmentedDeque<T, A>, start: usize, end: usize, mut f: F)
    where
        F: FnMut() -> T,
    {
        struct Guard<'a, T, A: Allocator> {
            buf: &'a RawSegmentedDeque<T, A>,
            start: usize,
            cur: usize,
        }

        impl<T, A: Allocator> Drop for Guard<'_, T, A> {
            fn drop(&mut self) {
                unsafe { SegmentedDeque::drop_range(self.buf, self.start, self.cur) };
            }
        }

        let mut guard = Guard { buf, start, cur: start };

        if std::mem::size_of::<T>() == 0 {
            while guard.cur < end {
                ptr::write(NonNull::<T>::dangling().as_ptr(), f());
                guard.cur += 1;
            }
            std::mem::forget(guard);
            return;
        }

        while guard.cur < end {
            let run_end = end.min((guard.cur / BLOCK_CAP + 1) * BLOCK_CAP);
            let mut slot = buf.ptr_at(guard.cur);
            while guard.cur < run_end {
                ptr::write(slot, f());
                slot = slot.add(1);
                guard.cur += 1;
            }
        }
        std::mem::forget(guard);
    }
}

impl<T, A: Allocator> Drop for SegmentedDeque<T, A> {
    fn drop(&mut self) {
        let (head, tail) = (self.head, self.tail);
        self.head = 0;
        self.tail = 0;
        unsafe { Self::drop_range(&self.buf, head, tail) };
        // RawSegmentedDeque frees the blocks and the map.
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for SegmentedDeque<T, A> {
    fn clone(&self) -> Self {
        let mut deque = Self::with_capacity_in(self.len(), self.buf.allocator().clone());
        deque.extend(self.iter().cloned());
        deque
    }

    /// Reuses the existing blocks: clears `self`, then appends every element
    /// of `source` in order.
    fn clone_from(&mut self, source: &Self) {
        self.clear();
        self.extend(source.iter().cloned());
    }
}

impl<T: PartialEq, A: Allocator> PartialEq for SegmentedDeque<T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq, A: Allocator> Eq for SegmentedDeque<T, A> {}

impl<T: PartialOrd, A: Allocator> PartialOrd for SegmentedDeque<T, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord, A: Allocator> Ord for SegmentedDeque<T, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: Hash, A: Allocator> Hash for SegmentedDeque<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for item in self {
            item.hash(state);
        }
    }
}

impl<T: std::fmt::Debug, A: Allocator> std::fmt::Debug for SegmentedDeque<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Default for SegmentedDeque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: Allocator> Index<usize> for SegmentedDeque<T, A> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index).expect("index out of bounds")
    }
}

impl<T, A: Allocator> IndexMut<usize> for SegmentedDeque<T, A> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.get_mut(index).expect("index out of bounds")
    }
}

impl<T, A: Allocator> Extend<T> for SegmentedDeque<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push_back(item);
        }
    }
}

impl<'a, T: Clone + 'a, A: Allocator> Extend<&'a T> for SegmentedDeque<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        for item in iter {
            self.push_back(item.clone());
        }
    }
}

impl<T> FromIterator<T> for SegmentedDeque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut deque = Self::new();
        deque.extend(iter);
        deque
    }
}

impl<T, const N: usize> From<[T; N]> for SegmentedDeque<T> {
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<T, A: Allocator> IntoIterator for SegmentedDeque<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { deque: self }
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a SegmentedDeque<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut SegmentedDeque<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
