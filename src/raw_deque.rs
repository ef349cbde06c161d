//! Raw block and map allocation management for `SegmentedDeque`.
//!
//! This module handles low-level memory allocation for the deque,
//! similar to how `RawVec` works for `Vec` in the standard library.

use std::alloc::Layout;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use allocator_api2::alloc::Allocator;

use crate::TryReserveError;

/// Number of element slots in a single block.
/// Blocks are allocated and released as whole units.
pub(crate) const BLOCK_CAP: usize = 10;

/// Raw segmented deque that handles block allocation without element management.
///
/// This is the low-level allocation primitive used by `SegmentedDeque`.
/// It owns the map (an array of block pointers) and every block, but does
/// not track which slots hold live elements.
pub(crate) struct RawSegmentedDeque<T, A: Allocator> {
    /// Array of block pointers; dangling while `block_count == 0`
    map: NonNull<NonNull<T>>,
    /// Number of allocated blocks
    block_count: usize,
    alloc: A,
    /// Marker for type ownership
    _marker: PhantomData<T>,
}

impl<T, A: Allocator> RawSegmentedDeque<T, A> {
    /// Whether T is a zero-sized type
    const IS_ZST: bool = std::mem::size_of::<T>() == 0;

    /// Layout of one block
    const BLOCK_LAYOUT: Layout = Layout::new::<[T; BLOCK_CAP]>();

    /// Creates a new `RawSegmentedDeque` without allocating.
    #[inline]
    pub(crate) const fn new_in(alloc: A) -> Self {
        Self {
            map: NonNull::dangling(),
            block_count: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Returns the number of allocated blocks.
    #[inline]
    pub(crate) const fn block_count(&self) -> usize {
        self.block_count
    }

    /// Returns the total number of element slots across all blocks.
    #[inline]
    pub(crate) const fn capacity(&self) -> usize {
        if Self::IS_ZST {
            usize::MAX
        } else {
            self.block_count * BLOCK_CAP
        }
    }

    /// Returns a reference to the underlying allocator.
    #[inline]
    pub(crate) fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Returns the base pointer of the block at the given index.
    ///
    /// # Safety
    ///
    /// `index` must be less than `block_count`.
    #[inline]
    pub(crate) unsafe fn block_ptr(&self, index: usize) -> *mut T {
        debug_assert!(index < self.block_count);
        (*self.map.as_ptr().add(index)).as_ptr()
    }

    /// Returns a raw pointer to the slot at the given flattened index.
    ///
    /// # Safety
    ///
    /// `flat` must be within allocated capacity.
    #[inline]
    pub(crate) unsafe fn ptr_at(&self, flat: usize) -> *mut T {
        if Self::IS_ZST {
            return NonNull::dangling().as_ptr();
        }
        debug_assert!(flat < self.block_count * BLOCK_CAP);
        self.block_ptr(flat / BLOCK_CAP).add(flat % BLOCK_CAP)
    }

    /// Replaces the map with a larger one, adding `extra_per_side` fresh
    /// blocks on each end and carrying the existing block pointers into the
    /// middle. The old map array is released only after every new allocation
    /// has succeeded, so an error leaves the deque untouched.
    ///
    /// Flat indices into carried blocks shift up by `extra_per_side * BLOCK_CAP`.
    pub(crate) fn grow(&mut self, extra_per_side: usize) -> Result<(), TryReserveError> {
        debug_assert!(!Self::IS_ZST);
        debug_assert!(extra_per_side > 0);

        let added = extra_per_side
            .checked_mul(2)
            .ok_or_else(TryReserveError::capacity_overflow)?;
        let new_count = self
            .block_count
            .checked_add(added)
            .ok_or_else(TryReserveError::capacity_overflow)?;
        // The flattened index space must stay addressable.
        new_count
            .checked_mul(BLOCK_CAP)
            .ok_or_else(TryReserveError::capacity_overflow)?;

        let new_map = self.alloc_map(new_count)?;
        let back_start = extra_per_side + self.block_count;

        unsafe {
            for i in 0..extra_per_side {
                match self.alloc_block() {
                    Ok(block) => new_map.as_ptr().add(i).write(block),
                    Err(err) => {
                        self.free_blocks(new_map, 0, i);
                        self.dealloc_map(new_map, new_count);
                        return Err(err);
                    }
                }
            }

            ptr::copy_nonoverlapping(
                self.map.as_ptr(),
                new_map.as_ptr().add(extra_per_side),
                self.block_count,
            );

            for i in back_start..new_count {
                match self.alloc_block() {
                    Ok(block) => new_map.as_ptr().add(i).write(block),
                    Err(err) => {
                        self.free_blocks(new_map, 0, extra_per_side);
                        self.free_blocks(new_map, back_start, i);
                        self.dealloc_map(new_map, new_count);
                        return Err(err);
                    }
                }
            }

            // The carried blocks are now owned through the new map.
            if self.block_count > 0 {
                self.dealloc_map(self.map, self.block_count);
            }
        }

        self.map = new_map;
        self.block_count = new_count;
        Ok(())
    }

    /// Shrinks the map to the `span` blocks starting at `first`, releasing
    /// every block outside that range. A span of zero returns the deque to
    /// the unallocated state.
    ///
    /// Does not drop elements - caller must ensure elements outside the
    /// retained span have already been dropped.
    pub(crate) fn retain_span(&mut self, first: usize, span: usize) -> Result<(), TryReserveError> {
        debug_assert!(first + span <= self.block_count);

        if span == self.block_count {
            return Ok(());
        }
        if span == 0 {
            unsafe { self.deallocate() };
            return Ok(());
        }

        let new_map = self.alloc_map(span)?;
        unsafe {
            ptr::copy_nonoverlapping(self.map.as_ptr().add(first), new_map.as_ptr(), span);
            self.free_blocks(self.map, 0, first);
            self.free_blocks(self.map, first + span, self.block_count);
            self.dealloc_map(self.map, self.block_count);
        }

        self.map = new_map;
        self.block_count = span;
        Ok(())
    }

    /// Deallocates all blocks and the map without dropping elements.
    ///
    /// # Safety
    ///
    /// All elements must have been dropped before calling this.
    pub(crate) unsafe fn deallocate(&mut self) {
        if self.block_count == 0 {
            return;
        }
        self.free_blocks(self.map, 0, self.block_count);
        self.dealloc_map(self.map, self.block_count);
        self.map = NonNull::dangling();
        self.block_count = 0;
    }

    fn alloc_block(&self) -> Result<NonNull<T>, TryReserveError> {
        match self.alloc.allocate(Self::BLOCK_LAYOUT) {
            Ok(block) => Ok(block.cast()),
            Err(_) => Err(TryReserveError::alloc_error(Self::BLOCK_LAYOUT)),
        }
    }

    unsafe fn dealloc_block(&self, block: NonNull<T>) {
        self.alloc.deallocate(block.cast(), Self::BLOCK_LAYOUT);
    }

    fn alloc_map(&self, count: usize) -> Result<NonNull<NonNull<T>>, TryReserveError> {
        let layout =
            Layout::array::<NonNull<T>>(count).map_err(|_| TryReserveError::capacity_overflow())?;
        match self.alloc.allocate(layout) {
            Ok(map) => Ok(map.cast()),
            Err(_) => Err(TryReserveError::alloc_error(layout)),
        }
    }

    unsafe fn dealloc_map(&self, map: NonNull<NonNull<T>>, count: usize) {
        let layout = Layout::array::<NonNull<T>>(count).expect("layout overflow");
        self.alloc.deallocate(map.cast(), layout);
    }

    /// Frees the blocks recorded at entries `from..to` of the given map.
    unsafe fn free_blocks(&self, map: NonNull<NonNull<T>>, from: usize, to: usize) {
        for i in from..to {
            self.dealloc_block(*map.as_ptr().add(i));
        }
    }
}

impl<T, A: Allocator> Drop for RawSegmentedDeque<T, A> {
    fn drop(&mut self) {
        // Note: This only frees memory, it doesn't drop elements.
        // SegmentedDeque must drop elements before RawSegmentedDeque is dropped.
        unsafe {
            self.deallocate();
        }
    }
}

// Safety: RawSegmentedDeque owns its allocations and T determines thread safety
unsafe impl<T: Send, A: Allocator + Send> Send for RawSegmentedDeque<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for RawSegmentedDeque<T, A> {}
