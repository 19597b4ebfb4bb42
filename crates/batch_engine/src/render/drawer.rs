//! # Draw Submission
//!
//! The boundary between the batch engine and a GPU backend. A flush uploads
//! the composite geometry once, then asks the submitter to draw each batch in
//! order. Backends bind the batch's textures to units `0..n-1`, apply its
//! pipeline state and issue one draw over the batch's range.

use crate::render::batching::Batch;
use crate::render::geometry::CompositeGeometry;
use crate::render::item::UniformValue;
use crate::render::layout::VertexLayout;
use crate::render::pipeline::PipelineState;
use crate::render::texture::TextureId;

/// Result type for draw submission
pub type DrawResult<T> = Result<T, DrawError>;

/// Errors reported by a draw submitter
#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    /// Composite buffers could not be uploaded
    #[error("Geometry upload failed: {0}")]
    Upload(String),

    /// A draw call could not be issued
    #[error("Draw submission failed: {0}")]
    Submit(String),
}

/// Range of the composite buffers one draw covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawRange {
    /// Indexed draw over `count` indices from `first`
    Indexed {
        /// First composite index
        first: u32,
        /// Indices drawn
        count: u32,
    },
    /// Non-indexed draw over `count` vertices from `first`
    Vertices {
        /// First composite vertex
        first: u32,
        /// Vertices drawn
        count: u32,
    },
}

impl DrawRange {
    /// Range a batch covers in `geometry`
    pub const fn of(batch: &Batch, geometry: &CompositeGeometry) -> Self {
        if geometry.has_indices() {
            Self::Indexed {
                first: batch.index_start(),
                count: batch.index_count(),
            }
        } else {
            Self::Vertices {
                first: batch.vertex_start(),
                count: batch.vertex_count(),
            }
        }
    }

    /// Elements drawn
    pub const fn count(&self) -> u32 {
        match *self {
            Self::Indexed { count, .. } | Self::Vertices { count, .. } => count,
        }
    }
}

/// Everything a backend needs to issue one batch
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Composite range drawn
    pub range: DrawRange,
    /// Textures bound to units `0..n-1`
    pub textures: Vec<TextureId>,
    /// Pipeline state applied before drawing
    pub state: PipelineState,
    /// Distinct uniform sets written to the batch's uniform arrays
    pub uniforms: Vec<Vec<UniformValue>>,
}

impl DrawCall {
    /// Describe the draw for `batch`
    pub fn from_batch(batch: &Batch, geometry: &CompositeGeometry) -> Self {
        Self {
            range: DrawRange::of(batch, geometry),
            textures: batch.textures().to_vec(),
            state: batch.pipeline_state(),
            uniforms: batch.uniforms().to_vec(),
        }
    }
}

/// GPU backend seam used by the batch renderer
pub trait DrawSubmitter {
    /// Upload the composite buffers of a flush
    ///
    /// Called once per non-empty flush, before any `draw`.
    fn upload(&mut self, geometry: &CompositeGeometry, layout: &VertexLayout) -> DrawResult<()>;

    /// Draw one finalized batch
    fn draw(&mut self, batch: &Batch, geometry: &CompositeGeometry) -> DrawResult<()>;
}

/// Submitter that records every upload and draw instead of touching a GPU
#[derive(Debug, Default)]
pub struct RecordingDrawer {
    calls: Vec<DrawCall>,
    uploads: usize,
    vertex_bytes: Vec<u8>,
    indices: Vec<u32>,
}

impl RecordingDrawer {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw calls in submission order
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Number of uploads seen
    pub const fn uploads(&self) -> usize {
        self.uploads
    }

    /// Vertex bytes of the last upload
    pub fn vertex_bytes(&self) -> &[u8] {
        &self.vertex_bytes
    }

    /// Indices of the last upload
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Forget everything recorded
    pub fn clear(&mut self) {
        self.calls.clear();
        self.uploads = 0;
        self.vertex_bytes.clear();
        self.indices.clear();
    }
}

impl DrawSubmitter for RecordingDrawer {
    fn upload(&mut self, geometry: &CompositeGeometry, _layout: &VertexLayout) -> DrawResult<()> {
        self.uploads += 1;
        self.vertex_bytes.clear();
        self.vertex_bytes.extend_from_slice(geometry.attribute_bytes());
        self.indices.clear();
        self.indices.extend_from_slice(geometry.indices());
        Ok(())
    }

    fn draw(&mut self, batch: &Batch, geometry: &CompositeGeometry) -> DrawResult<()> {
        self.calls.push(DrawCall::from_batch(batch, geometry));
        Ok(())
    }
}
