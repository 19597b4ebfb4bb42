//! # Batch Records
//!
//! A batch is a run of consecutive items drawn with one draw call. Records are
//! pooled by the factory and reset, never freed, between flushes.

use std::collections::HashMap;

use crate::render::item::UniformValue;
use crate::render::pipeline::PipelineState;
use crate::render::texture::TextureId;

/// A finalized group of items sharing one draw call
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub(crate) geometry_offset: usize,
    pub(crate) members: Vec<usize>,
    pub(crate) textures: Vec<TextureId>,
    pub(crate) texture_units: HashMap<TextureId, u32>,
    pub(crate) member_units: Vec<u32>,
    pub(crate) member_unit_offsets: Vec<usize>,
    pub(crate) uniforms: Vec<Vec<UniformValue>>,
    pub(crate) member_uniform_ids: Vec<u32>,
    pub(crate) pipeline_state: PipelineState,
    pub(crate) vertex_start: u32,
    pub(crate) vertex_count: u32,
    pub(crate) index_start: u32,
    pub(crate) index_count: u32,
}

impl Batch {
    /// Position of the first member in the flushed item stream
    pub const fn geometry_offset(&self) -> usize {
        self.geometry_offset
    }

    /// Members as positions in the flushed item stream, in draw order
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the batch has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Textures to bind; the index of each entry is its texture unit
    pub fn textures(&self) -> &[TextureId] {
        &self.textures
    }

    /// Unit a texture was first assigned in this batch
    pub fn texture_unit(&self, texture: TextureId) -> Option<u32> {
        self.texture_units.get(&texture).copied()
    }

    /// Texture to unit mapping of the batch
    pub const fn texture_units(&self) -> &HashMap<TextureId, u32> {
        &self.texture_units
    }

    /// Units resolved for the member at `position`, in the item's texture order
    pub fn member_texture_units(&self, position: usize) -> &[u32] {
        match (
            self.member_unit_offsets.get(position),
            self.member_unit_offsets.get(position + 1),
        ) {
            (Some(&start), Some(&end)) => &self.member_units[start..end],
            _ => &[],
        }
    }

    /// Distinct uniform sets; a member's uniform id indexes this list
    pub fn uniforms(&self) -> &[Vec<UniformValue>] {
        &self.uniforms
    }

    /// Uniform slot of the member at `position`
    pub fn member_uniform_id(&self, position: usize) -> Option<u32> {
        self.member_uniform_ids.get(position).copied()
    }

    /// Pipeline state shared by every member
    pub const fn pipeline_state(&self) -> PipelineState {
        self.pipeline_state
    }

    /// First composite vertex of the batch
    pub const fn vertex_start(&self) -> u32 {
        self.vertex_start
    }

    /// Composite vertices written by the batch
    pub const fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// First composite index of the batch
    pub const fn index_start(&self) -> u32 {
        self.index_start
    }

    /// Composite indices written by the batch
    pub const fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Clear the record for reuse, keeping its allocations
    pub(crate) fn reset(&mut self) {
        self.geometry_offset = 0;
        self.members.clear();
        self.textures.clear();
        self.texture_units.clear();
        self.member_units.clear();
        self.member_unit_offsets.clear();
        self.uniforms.clear();
        self.member_uniform_ids.clear();
        self.pipeline_state = PipelineState::default();
        self.vertex_start = 0;
        self.vertex_count = 0;
        self.index_start = 0;
        self.index_count = 0;
    }
}
