//! Buffer Pool
//!
//! Pre-allocated scratch storage for composite buffers, bucketed by
//! power-of-two size class so flushes of similar size reuse the same memory.
//!
//! ```text
//! BufferPool<T>
//!     ├── class 6  → [64-element buffers]
//!     ├── class 7  → [128-element buffers]
//!     └── class 8  → [256-element buffers]
//! ```
//!
//! Pooled memory is write-before-read: a buffer handed out may still hold the
//! previous flush's data and callers must never read what they did not write.

use std::collections::BTreeMap;

use bytemuck::Zeroable;

use crate::foundation::memory::{next_power_of_two, size_class};

/// A power-of-two sized buffer on loan from a [`BufferPool`]
#[derive(Debug)]
pub struct PooledBuffer<T> {
    data: Vec<T>,
}

impl<T> PooledBuffer<T> {
    /// Elements the buffer can hold
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Whole buffer, including stale contents past what was written
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Whole buffer for writing
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

/// Free lists of pooled buffers keyed by size class
#[derive(Debug)]
pub struct BufferPool<T> {
    free: BTreeMap<u32, Vec<Vec<T>>>,
    allocations: usize,
    reuses: usize,
}

impl<T: Zeroable + Clone> BufferPool<T> {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            free: BTreeMap::new(),
            allocations: 0,
            reuses: 0,
        }
    }

    /// Borrow a buffer holding at least `min_len` elements
    ///
    /// The capacity is `min_len` rounded up to a power of two. A free buffer of
    /// that class is preferred, then any larger free buffer, which is handed out
    /// as-is without shrinking.
    pub fn allocate(&mut self, min_len: usize) -> PooledBuffer<T> {
        let capacity = next_power_of_two(min_len);
        let class = size_class(capacity);

        let reused = self
            .free
            .range_mut(class..)
            .find_map(|(_, buffers)| buffers.pop());

        if let Some(data) = reused {
            self.reuses += 1;
            return PooledBuffer { data };
        }

        self.allocations += 1;
        log::debug!(
            "Allocating pooled buffer of {} elements ({} bytes)",
            capacity,
            capacity * std::mem::size_of::<T>()
        );
        PooledBuffer {
            data: vec![T::zeroed(); capacity],
        }
    }

    /// Return a buffer to the pool
    pub fn release(&mut self, buffer: PooledBuffer<T>) {
        let class = size_class(buffer.capacity());
        self.free.entry(class).or_default().push(buffer.data);
    }

    /// Buffers created because no free buffer fit
    pub const fn allocations(&self) -> usize {
        self.allocations
    }

    /// Requests served from a free list
    pub const fn reuses(&self) -> usize {
        self.reuses
    }

    /// Buffers currently waiting in free lists
    pub fn free_count(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }

    /// Drop every free buffer
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

impl<T: Zeroable + Clone> Default for BufferPool<T> {
    fn default() -> Self {
        Self::new()
    }
}
