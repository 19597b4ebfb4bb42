//! # Composite Vertex Layout
//!
//! Turns the configured redirects into a fixed interleaved vertex layout: one
//! entry per destination attribute, each at a byte offset within the per-vertex
//! stride. Attribute redirects come first in declared order, followed by the
//! texture-unit attribute and the uniform-id attribute when configured.
//!
//! All layout consistency checks happen here, at renderer construction. A
//! layout that builds successfully never fails at pack time because of its
//! shape; only item data can.

pub mod redirect;

use std::collections::HashSet;

use thiserror::Error;

use crate::core::config::{BatcherConfig, CountStrategy};

pub use redirect::{AttributeRedirect, CopyMode, ElementType, SourceCount, UniformRedirect};

/// Result type for layout construction
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Configuration errors detected while building the composite layout
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// A redirect declares zero source or destination elements
    #[error("Attribute '{destination}' declares zero elements")]
    ZeroCount {
        /// Destination attribute name
        destination: String,
    },

    /// Source and destination counts have no integral relationship
    #[error(
        "Attribute '{destination}' cannot map {source_bytes} source bytes onto {destination_bytes} destination bytes"
    )]
    IncompatibleCounts {
        /// Destination attribute name
        destination: String,
        /// Bytes provided per vertex by the item
        source_bytes: usize,
        /// Bytes required per vertex by the layout
        destination_bytes: usize,
    },

    /// Two layout entries write the same destination
    #[error("Destination '{0}' is written by more than one redirect")]
    DuplicateDestination(String),

    /// The layout writes nothing per vertex
    #[error("Layout has no vertex attributes")]
    EmptyLayout,

    /// Items may need more textures than a batch can bind
    #[error("Textures per item ({textures_per_item}) exceeds the texture unit budget ({budget})")]
    TextureBudgetExceeded {
        /// Configured textures per item
        textures_per_item: u32,
        /// Configured texture unit budget
        budget: u32,
    },

    /// Buffer granule is not a power of two
    #[error("Buffer granule {0} is not a power of two")]
    InvalidGranule(usize),

    /// Vertex count cannot be derived from the first attribute
    #[error("Vertex count cannot be derived from scalar attribute '{0}'; configure an override")]
    UnderivableVertexCount(String),

    /// A uniform-id attribute was requested without any uniform redirects
    #[error("Uniform id attribute '{0}' requires at least one uniform redirect")]
    UniformIdWithoutUniforms(String),

    /// The uniform buffer cannot hold a single uniform set
    #[error("Uniform buffer size must be at least 1")]
    ZeroUniformBuffer,

    /// The per-batch item cap cannot admit a single item
    #[error("Maximum items per batch must be at least 1")]
    ZeroItemCap,
}

/// Role of a composite attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Written by the attribute redirect at this index
    Redirect(usize),
    /// Resolved texture units of the item
    TextureUnit,
    /// Uniform slot of the item within its batch
    UniformId,
}

/// One attribute of the composite vertex
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Attribute name as seen by the shader
    pub name: String,
    /// Stored element type
    pub element: ElementType,
    /// Stored elements per vertex
    pub count: u32,
    /// Normalize integer data on fetch
    pub normalize: bool,
    /// Byte offset within the vertex
    pub offset: usize,
    /// What writes this attribute
    pub kind: AttributeKind,
}

impl VertexAttribute {
    /// Bytes occupied per vertex
    pub const fn size(&self) -> usize {
        self.count as usize * self.element.size()
    }
}

/// Interleaved layout of one composite vertex
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    stride: usize,
}

impl VertexLayout {
    /// Build and validate the layout described by `config`
    pub fn from_config(config: &BatcherConfig) -> LayoutResult<Self> {
        if config.textures_per_item > config.texture_unit_budget {
            return Err(LayoutError::TextureBudgetExceeded {
                textures_per_item: config.textures_per_item,
                budget: config.texture_unit_budget,
            });
        }
        if !config.buffer_granule.is_power_of_two() {
            return Err(LayoutError::InvalidGranule(config.buffer_granule));
        }
        if config.uniform_buffer_size == Some(0) {
            return Err(LayoutError::ZeroUniformBuffer);
        }
        if config.max_items_per_batch == Some(0) {
            return Err(LayoutError::ZeroItemCap);
        }

        let mut builder = LayoutBuilder::default();

        for (index, redirect) in config.attributes.iter().enumerate() {
            redirect.copy_mode()?;
            builder.push(
                &redirect.destination,
                redirect.destination_type,
                redirect.destination_count,
                redirect.normalize,
                AttributeKind::Redirect(index),
            )?;
        }

        if let Some(name) = &config.texture_unit_attribute {
            if config.textures_per_item > 0 {
                builder.push(
                    name,
                    config.texture_unit_type,
                    config.textures_per_item,
                    false,
                    AttributeKind::TextureUnit,
                )?;
            }
        }

        if let Some(name) = &config.uniform_id_attribute {
            if config.uniforms.is_empty() {
                return Err(LayoutError::UniformIdWithoutUniforms(name.clone()));
            }
            builder.push(name, config.uniform_id_type, 1, false, AttributeKind::UniformId)?;
        }

        let mut uniform_names = HashSet::new();
        for uniform in &config.uniforms {
            if !uniform_names.insert(uniform.destination.as_str()) {
                return Err(LayoutError::DuplicateDestination(uniform.destination.clone()));
            }
        }

        if config.vertex_count == CountStrategy::Derived {
            match config.attributes.first() {
                Some(first) if first.is_scalar() => {
                    return Err(LayoutError::UnderivableVertexCount(first.source.clone()));
                }
                None => return Err(LayoutError::EmptyLayout),
                Some(_) => {}
            }
        }

        builder.finish()
    }

    /// Attributes in interleaved order
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Bytes per composite vertex
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Look up an attribute by shader name
    pub fn attribute(&self, name: &str) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    /// The texture-unit attribute, if the layout has one
    pub fn texture_unit_attribute(&self) -> Option<&VertexAttribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.kind == AttributeKind::TextureUnit)
    }

    /// The uniform-id attribute, if the layout has one
    pub fn uniform_id_attribute(&self) -> Option<&VertexAttribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.kind == AttributeKind::UniformId)
    }
}

#[derive(Default)]
struct LayoutBuilder {
    attributes: Vec<VertexAttribute>,
    names: HashSet<String>,
    offset: usize,
}

impl LayoutBuilder {
    fn push(
        &mut self,
        name: &str,
        element: ElementType,
        count: u32,
        normalize: bool,
        kind: AttributeKind,
    ) -> LayoutResult<()> {
        if !self.names.insert(name.to_string()) {
            return Err(LayoutError::DuplicateDestination(name.to_string()));
        }

        let attribute = VertexAttribute {
            name: name.to_string(),
            element,
            count,
            normalize,
            offset: self.offset,
            kind,
        };
        self.offset += attribute.size();
        self.attributes.push(attribute);
        Ok(())
    }

    fn finish(self) -> LayoutResult<VertexLayout> {
        if self.offset == 0 {
            return Err(LayoutError::EmptyLayout);
        }
        Ok(VertexLayout {
            attributes: self.attributes,
            stride: self.offset,
        })
    }
}
