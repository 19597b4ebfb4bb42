//! # Render Queue
//!
//! Collects borrowed items between flushes. Submission order is the draw
//! order: the batch renderer never reorders queued items.

use super::item::BatchItem;

/// Items waiting for the next flush, in submission order
pub struct RenderQueue<'a, I: ?Sized> {
    items: Vec<&'a I>,
}

impl<'a, I: BatchItem + ?Sized> RenderQueue<'a, I> {
    /// Create a new empty render queue
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create a render queue with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Submit an item for drawing
    pub fn push(&mut self, item: &'a I) {
        self.items.push(item);
    }

    /// Queued items in submission order
    pub fn items(&self) -> &[&'a I] {
        &self.items
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop all queued items, keeping the allocation
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a, I: BatchItem + ?Sized> Default for RenderQueue<'a, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, I: BatchItem + ?Sized> Extend<&'a I> for RenderQueue<'a, I> {
    fn extend<T: IntoIterator<Item = &'a I>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}
