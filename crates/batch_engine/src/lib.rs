//! # Batch Engine
//!
//! Batches many individually specified renderable items into the fewest possible
//! draw calls while preserving their submission order.
//!
//! ## Features
//!
//! - **Greedy Batching**: Order-preserving partition under texture-unit, pipeline-state
//!   and uniform-buffer constraints
//! - **Geometry Packing**: Per-item attribute arrays merged into one interleaved buffer
//!   with re-based index data
//! - **Buffer Pooling**: Power-of-two scratch buffers reused across flushes
//! - **Pluggable Draw Submission**: Any GPU backend behind the `DrawSubmitter` trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use batch_engine::prelude::*;
//!
//! struct Quad {
//!     positions: Vec<f32>,
//!     indices: Vec<u32>,
//!     texture: TextureId,
//! }
//!
//! impl BatchItem for Quad {
//!     fn attribute(&self, source: &str) -> Option<AttributeData<'_>> {
//!         (source == "positions").then(|| AttributeData::from_f32(&self.positions))
//!     }
//!     fn indices(&self) -> Option<&[u32]> {
//!         Some(&self.indices)
//!     }
//!     fn textures(&self) -> &[TextureId] {
//!         std::slice::from_ref(&self.texture)
//!     }
//!     fn pipeline_state(&self) -> PipelineState {
//!         PipelineState::default()
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut textures = TextureRegistry::new();
//!     let texture = textures.register("atlas");
//!
//!     let config = BatcherConfig::default()
//!         .with_attribute(AttributeRedirect::float32("positions", "aVertexPosition", 2))
//!         .with_texture_unit_attribute("aTextureId");
//!     let mut renderer = BatchRenderer::new(config)?;
//!
//!     let quad = Quad {
//!         positions: vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
//!         indices: vec![0, 1, 2, 0, 2, 3],
//!         texture,
//!     };
//!
//!     let mut queue = RenderQueue::new();
//!     queue.push(&quad);
//!     renderer.flush(&mut queue, &mut RecordingDrawer::new())?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod render;

pub use crate::core::config::{BatcherConfig, CountStrategy};
pub use render::{BatchError, BatchRenderer, BatchResult, BatchStats, LayoutError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        core::config::{BatcherConfig, CountStrategy},
        render::{
            AdmissionPolicy, AttributeData, AttributeRedirect, Batch, BatchError, BatchItem,
            BatchRenderer, BatchResult, BatchStats, BlendMode, CompositeGeometry, CullMode,
            DrawCall, DrawError, DrawSubmitter, ElementType, LayoutError, PipelineState,
            RecordingDrawer, RenderQueue, SourceCount, StateFlags, TextureId, TextureRegistry,
            UniformRedirect, UniformValue, VertexLayout,
        },
    };
}
