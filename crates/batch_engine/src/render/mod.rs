//! # Rendering
//!
//! Batch formation and geometry packing for a single-threaded renderer.
//!
//! ## Architecture
//!
//! - **Items**: Host objects read through the `BatchItem` accessor trait
//! - **Batching**: Greedy, order-preserving partition under texture, state and uniform limits
//! - **Geometry**: Interleaved composite buffers filled by a compiled pack plan
//! - **Drawing**: One upload and one draw call per batch through a `DrawSubmitter`
//!
//! ## Design Goals
//!
//! - **Order Preservation**: Items are drawn exactly in submission order
//! - **Steady State Without Allocation**: Batch records and buffers are pooled across flushes
//! - **Backend Agnostic**: Nothing here touches a graphics API

// Item model
pub mod item;
pub mod pipeline;
pub mod texture;

// Layout description
pub mod layout;

// Flush pipeline
pub mod batching;
pub mod geometry;
pub mod drawer;
pub mod render_queue;
pub mod batch_renderer;

#[cfg(test)]
mod tests;

pub use batch_renderer::{BatchError, BatchRenderer, BatchResult, BatchStats};
pub use batching::{AcceptAll, AdmissionPolicy, Batch, MaxItemsPolicy};
pub use drawer::{DrawCall, DrawError, DrawRange, DrawResult, DrawSubmitter, RecordingDrawer};
pub use geometry::{BufferPool, CompositeGeometry, GeometryPacker};
pub use item::{AttributeData, BatchItem, UniformValue};
pub use layout::{
    AttributeKind, AttributeRedirect, ElementType, LayoutError, LayoutResult, SourceCount,
    UniformRedirect, VertexAttribute, VertexLayout,
};
pub use pipeline::{BlendMode, CullMode, PipelineState, StateFlags};
pub use render_queue::RenderQueue;
pub use texture::{TextureId, TextureRegistry};
