//! # Batcher Configuration
//!
//! Every knob the batching engine reads is fixed at renderer construction and
//! collected here: the redirect layout, texture and uniform budgets, count
//! override strategies and buffer-pool granularity.
//!
//! ## Design Goals
//!
//! - **Serializable**: Layouts can live in TOML or RON files next to shaders
//! - **Validated Early**: `validate()` surfaces every layout error before the first flush
//! - **Builder Friendly**: `with_*` methods for configuration in code

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::render::layout::{
    AttributeRedirect, ElementType, LayoutResult, UniformRedirect, VertexLayout,
};

/// Default number of texture units a single draw call may bind
pub const DEFAULT_TEXTURE_UNIT_BUDGET: u32 = 16;

/// Default minimum buffer capacity, in vertices for attribute buffers and
/// indices for index buffers
pub const DEFAULT_BUFFER_GRANULE: usize = 64;

/// How the vertex or index count of an item is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountStrategy {
    /// Vertices: first attribute length / its source count. Indices: index array length
    #[default]
    Derived,
    /// Every item has exactly this many
    Constant(u32),
    /// Ask the item, falling back to `Derived` when it has no answer
    Item,
}

/// Construction-time configuration of a batch renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatcherConfig {
    /// Attribute redirects in interleaved order
    pub attributes: Vec<AttributeRedirect>,
    /// Uniform redirects gathered per item
    pub uniforms: Vec<UniformRedirect>,
    /// Attribute receiving resolved texture units, if any
    pub texture_unit_attribute: Option<String>,
    /// Element type of the texture-unit attribute
    pub texture_unit_type: ElementType,
    /// Attribute receiving the per-item uniform slot, if any
    pub uniform_id_attribute: Option<String>,
    /// Element type of the uniform-id attribute
    pub uniform_id_type: ElementType,
    /// Whether items carry index data
    pub use_indices: bool,
    /// Maximum textures a single item references
    pub textures_per_item: u32,
    /// Texture units available to one draw call
    pub texture_unit_budget: u32,
    /// Share a unit between repeated references to one texture
    pub texture_reduction: bool,
    /// Distinct uniform sets one batch can hold; `None` is unbounded
    pub uniform_buffer_size: Option<u32>,
    /// Cap on items per batch; `None` is unbounded
    pub max_items_per_batch: Option<u32>,
    /// Minimum pooled buffer capacity; must be a power of two
    pub buffer_granule: usize,
    /// How vertex counts are determined
    pub vertex_count: CountStrategy,
    /// How index counts are determined
    pub index_count: CountStrategy,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            attributes: Vec::new(),
            uniforms: Vec::new(),
            texture_unit_attribute: None,
            texture_unit_type: ElementType::Float32,
            uniform_id_attribute: None,
            uniform_id_type: ElementType::Float32,
            use_indices: true,
            textures_per_item: 1,
            texture_unit_budget: DEFAULT_TEXTURE_UNIT_BUDGET,
            texture_reduction: true,
            uniform_buffer_size: None,
            max_items_per_batch: None,
            buffer_granule: DEFAULT_BUFFER_GRANULE,
            vertex_count: CountStrategy::Derived,
            index_count: CountStrategy::Derived,
        }
    }
}

impl Config for BatcherConfig {}

impl BatcherConfig {
    /// Append an attribute redirect
    pub fn with_attribute(mut self, redirect: AttributeRedirect) -> Self {
        self.attributes.push(redirect);
        self
    }

    /// Append a uniform redirect
    pub fn with_uniform(mut self, redirect: UniformRedirect) -> Self {
        self.uniforms.push(redirect);
        self
    }

    /// Write resolved texture units into the named attribute
    pub fn with_texture_unit_attribute(mut self, name: impl Into<String>) -> Self {
        self.texture_unit_attribute = Some(name.into());
        self
    }

    /// Write the per-item uniform slot into the named attribute
    pub fn with_uniform_id_attribute(mut self, name: impl Into<String>) -> Self {
        self.uniform_id_attribute = Some(name.into());
        self
    }

    /// Enable or disable index data
    pub fn with_indices(mut self, enabled: bool) -> Self {
        self.use_indices = enabled;
        self
    }

    /// Set the maximum textures one item references
    pub fn with_textures_per_item(mut self, count: u32) -> Self {
        self.textures_per_item = count;
        self
    }

    /// Set the texture units available per draw call
    pub fn with_texture_unit_budget(mut self, budget: u32) -> Self {
        self.texture_unit_budget = budget;
        self
    }

    /// Enable or disable texture reduction
    pub fn with_texture_reduction(mut self, enabled: bool) -> Self {
        self.texture_reduction = enabled;
        self
    }

    /// Bound the distinct uniform sets per batch
    pub fn with_uniform_buffer_size(mut self, size: u32) -> Self {
        self.uniform_buffer_size = Some(size);
        self
    }

    /// Cap the number of items per batch
    pub fn with_max_items_per_batch(mut self, max: u32) -> Self {
        self.max_items_per_batch = Some(max);
        self
    }

    /// Set the minimum pooled buffer capacity
    pub fn with_buffer_granule(mut self, granule: usize) -> Self {
        self.buffer_granule = granule;
        self
    }

    /// Set the vertex count strategy
    pub fn with_vertex_count(mut self, strategy: CountStrategy) -> Self {
        self.vertex_count = strategy;
        self
    }

    /// Set the index count strategy
    pub fn with_index_count(mut self, strategy: CountStrategy) -> Self {
        self.index_count = strategy;
        self
    }

    /// Validate the configuration, returning the composite layout it describes
    pub fn validate(&self) -> LayoutResult<VertexLayout> {
        VertexLayout::from_config(self)
    }
}
