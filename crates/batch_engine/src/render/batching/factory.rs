//! # Batch Factory
//!
//! Partitions an ordered item stream into batches in one greedy left-to-right
//! pass. When the generator rejects an item, the open batch is finalized and
//! the same item is retried against the fresh batch, so boundaries only ever
//! fall where admission fails and no item is reordered or dropped.
//!
//! Batch records are pooled: slot `n` of the pool is reused for the `n`-th
//! batch of every flush. Slots past the current batch count hold stale data
//! and are reset before they are handed out again.

use crate::core::config::BatcherConfig;
use crate::render::item::BatchItem;

use super::batch::Batch;
use super::generator::{AdmissionPolicy, BatchGenerator};

/// Drives the generator across a flush and owns the batch pool
pub struct BatchFactory<I: ?Sized> {
    generator: BatchGenerator<I>,
    pool: Vec<Batch>,
    active: usize,
}

impl<I: BatchItem + ?Sized> BatchFactory<I> {
    /// Create a factory for `config`
    pub fn new(config: &BatcherConfig) -> Self {
        Self {
            generator: BatchGenerator::new(config),
            pool: Vec::new(),
            active: 0,
        }
    }

    /// Replace the generator's admission policy
    pub fn set_policy(&mut self, policy: Box<dyn AdmissionPolicy<I>>) {
        self.generator.set_policy(policy);
    }

    /// Partition `items` into batches, reusing pooled records
    pub fn build(&mut self, items: &[&I]) -> &mut [Batch] {
        self.active = 0;

        let mut batch_start = 0;
        let mut index = 0;
        while index < items.len() {
            let item = items[index];
            if self.generator.put(index, item, item.pipeline_state()) {
                index += 1;
            } else {
                self.finalize_batch(batch_start);
                batch_start = index;
            }
        }

        if !self.generator.is_empty() {
            self.finalize_batch(batch_start);
        }

        &mut self.pool[..self.active]
    }

    /// Batches produced by the last build
    pub fn batches(&self) -> &[Batch] {
        &self.pool[..self.active]
    }

    /// Number of batch records kept for reuse
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Forget the last build; pooled records stay allocated
    pub fn clear(&mut self) {
        self.active = 0;
    }

    fn finalize_batch(&mut self, geometry_offset: usize) {
        if self.active == self.pool.len() {
            self.pool.push(Batch::default());
        }

        let batch = &mut self.pool[self.active];
        self.generator.finalize(batch);
        batch.geometry_offset = geometry_offset;
        self.active += 1;

        log::trace!(
            "Finalized batch {} with {} items starting at {}",
            self.active - 1,
            batch.len(),
            geometry_offset
        );
    }
}
