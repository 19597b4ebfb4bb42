//! # Batch Renderer
//!
//! Drives one flush end to end: queued items are partitioned into batches,
//! packed into a single composite geometry, uploaded once and drawn with one
//! call per batch, in submission order.
//!
//! ## Architecture
//!
//! - **BatchFactory**: Greedy order-preserving partition of the item stream
//! - **GeometryPacker**: Fills the composite buffers through a cached pack plan
//! - **DrawSubmitter**: Backend seam receiving the upload and the draw calls
//!
//! ## Flush Lifecycle
//!
//! ```text
//! RenderQueue ──► validate ──► build batches ──► pack ──► upload ──► draw × N ──► release
//! ```
//!
//! The renderer borrows items only for the duration of a flush. Batch records
//! and composite buffers are pooled and reused by the next flush.

use std::time::Instant;

use crate::core::config::BatcherConfig;
use crate::render::batching::{AdmissionPolicy, Batch, BatchFactory};
use crate::render::drawer::{DrawError, DrawSubmitter};
use crate::render::geometry::{CompositeGeometry, GeometryPacker};
use crate::render::item::BatchItem;
use crate::render::layout::{ElementType, LayoutError, VertexLayout};
use crate::render::render_queue::RenderQueue;

/// Result type for batch rendering operations
pub type BatchResult<T> = Result<T, BatchError>;

/// Errors that fail a flush
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The batching configuration is inconsistent
    #[error("Invalid batch layout: {0}")]
    Layout(#[from] LayoutError),

    /// An item has no data for a configured attribute
    #[error("Item {item} has no data for attribute '{attribute}'")]
    MissingAttribute {
        /// Position of the item in the flushed stream
        item: usize,
        /// Source name of the attribute
        attribute: String,
    },

    /// An item's attribute data has a different element type than configured
    #[error("Item {item} provides {found} data for attribute '{attribute}', expected {expected}")]
    AttributeTypeMismatch {
        /// Position of the item in the flushed stream
        item: usize,
        /// Source name of the attribute
        attribute: String,
        /// Configured source element type
        expected: ElementType,
        /// Element type the item provided
        found: ElementType,
    },

    /// An item references more textures than one item may bind
    #[error("Item {item} references {count} textures, at most {max} allowed per item")]
    TooManyTextures {
        /// Position of the item in the flushed stream
        item: usize,
        /// Textures referenced
        count: usize,
        /// Configured textures per item
        max: u32,
    },

    /// An item has no value for a configured uniform
    #[error("Item {item} has no value for uniform '{uniform}'")]
    MissingUniform {
        /// Position of the item in the flushed stream
        item: usize,
        /// Source name of the uniform
        uniform: String,
    },

    /// A re-based index does not fit the 32-bit index format
    #[error("Item {item} pushes composite indices past u32::MAX")]
    IndexOverflow {
        /// Position of the item in the flushed stream
        item: usize,
    },

    /// The draw submitter failed
    #[error(transparent)]
    Draw(#[from] DrawError),
}

/// Statistics of the last flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Items flushed
    pub total_items: usize,

    /// Batches formed
    pub batch_count: usize,

    /// Composite vertices written
    pub vertex_count: u32,

    /// Composite indices written
    pub index_count: u32,

    /// Draw calls issued
    pub draw_calls: usize,

    /// Time spent validating and batching items (microseconds)
    pub collection_time_us: u64,

    /// Time spent packing composite geometry (microseconds)
    pub packing_time_us: u64,

    /// Time spent in the draw submitter (microseconds)
    pub submission_time_us: u64,
}

impl BatchStats {
    /// Average items per batch
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_items_per_batch(&self) -> f32 {
        if self.batch_count == 0 {
            0.0
        } else {
            self.total_items as f32 / self.batch_count as f32
        }
    }

    /// Total flush time in microseconds
    pub const fn total_time_us(&self) -> u64 {
        self.collection_time_us + self.packing_time_us + self.submission_time_us
    }
}

/// Batches and draws items of type `I`
pub struct BatchRenderer<I: ?Sized> {
    config: BatcherConfig,
    factory: BatchFactory<I>,
    packer: GeometryPacker,
    stats: BatchStats,
}

impl<I: BatchItem + ?Sized> BatchRenderer<I> {
    /// Create a renderer, validating `config` into a vertex layout
    pub fn new(config: BatcherConfig) -> Result<Self, LayoutError> {
        let layout = config.validate()?;
        log::info!(
            "Batch renderer ready: {} attributes, {} bytes per vertex, {} texture units",
            layout.attributes().len(),
            layout.stride(),
            config.texture_unit_budget
        );

        let packer = GeometryPacker::new(&config, layout)?;
        Ok(Self {
            factory: BatchFactory::new(&config),
            packer,
            config,
            stats: BatchStats::default(),
        })
    }

    /// Replace the admission policy consulted for every non-first member
    pub fn set_policy(&mut self, policy: Box<dyn AdmissionPolicy<I>>) {
        self.factory.set_policy(policy);
    }

    /// Configuration the renderer was built with
    pub const fn config(&self) -> &BatcherConfig {
        &self.config
    }

    /// Composite vertex layout
    pub const fn layout(&self) -> &VertexLayout {
        self.packer.layout()
    }

    /// Statistics of the last flush
    pub const fn stats(&self) -> &BatchStats {
        &self.stats
    }

    /// Packer owning the composite buffer pools
    pub const fn packer(&self) -> &GeometryPacker {
        &self.packer
    }

    /// Batches formed by the last flush
    pub fn batches(&self) -> &[Batch] {
        self.factory.batches()
    }

    /// Draw everything queued, then drain the queue
    ///
    /// Flushing an empty queue is a no-op: nothing is uploaded or drawn.
    pub fn flush(
        &mut self,
        queue: &mut RenderQueue<'_, I>,
        drawer: &mut dyn DrawSubmitter,
    ) -> BatchResult<()> {
        let result = self.flush_items(queue.items(), drawer);
        queue.clear();
        result
    }

    /// Draw `items` in order without going through a queue
    pub fn flush_items(&mut self, items: &[&I], drawer: &mut dyn DrawSubmitter) -> BatchResult<()> {
        self.stats = BatchStats::default();
        if items.is_empty() {
            self.factory.clear();
            return Ok(());
        }

        let collection_start = Instant::now();
        if let Err(err) = self.validate_items(items) {
            self.factory.clear();
            return Err(err);
        }
        let batches = self.factory.build(items);
        let collection_time = collection_start.elapsed();

        let packing_start = Instant::now();
        let geometry = self.packer.pack(items, batches)?;
        let packing_time = packing_start.elapsed();

        let submission_start = Instant::now();
        let submitted = submit(drawer, self.factory.batches(), &geometry, self.packer.layout());
        let submission_time = submission_start.elapsed();

        self.stats = BatchStats {
            total_items: items.len(),
            batch_count: self.factory.batches().len(),
            vertex_count: geometry.vertex_count(),
            index_count: geometry.index_count(),
            draw_calls: submitted.as_ref().map_or(0, |calls| *calls),
            collection_time_us: duration_us(collection_time),
            packing_time_us: duration_us(packing_time),
            submission_time_us: duration_us(submission_time),
        };
        self.packer.release(geometry);
        submitted?;

        log::debug!(
            "Flushed {} items in {} batches ({} vertices, {} indices) in {}us",
            self.stats.total_items,
            self.stats.batch_count,
            self.stats.vertex_count,
            self.stats.index_count,
            self.stats.total_time_us()
        );
        Ok(())
    }

    fn validate_items(&self, items: &[&I]) -> BatchResult<()> {
        let max = self.config.textures_per_item;
        for (index, item) in items.iter().enumerate() {
            let count = item.textures().len();
            if count > max as usize {
                return Err(BatchError::TooManyTextures { item: index, count, max });
            }

            for uniform in &self.config.uniforms {
                if item.uniform(&uniform.source).is_none() {
                    return Err(BatchError::MissingUniform {
                        item: index,
                        uniform: uniform.source.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn submit(
    drawer: &mut dyn DrawSubmitter,
    batches: &[Batch],
    geometry: &CompositeGeometry,
    layout: &VertexLayout,
) -> BatchResult<usize> {
    drawer.upload(geometry, layout)?;
    for (index, batch) in batches.iter().enumerate() {
        log::trace!(
            "Drawing batch {}: {} items, {} textures, vertices {}..{}",
            index,
            batch.len(),
            batch.textures().len(),
            batch.vertex_start(),
            batch.vertex_start() + batch.vertex_count()
        );
        drawer.draw(batch, geometry)?;
    }
    Ok(batches.len())
}

fn duration_us(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}
