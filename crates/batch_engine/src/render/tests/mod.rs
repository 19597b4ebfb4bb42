//! Flush scenarios exercising batching, packing and drawing together

mod flush_properties;

use crate::core::config::BatcherConfig;
use crate::render::item::{AttributeData, BatchItem, UniformValue};
use crate::render::layout::AttributeRedirect;
use crate::render::pipeline::{BlendMode, PipelineState};
use crate::render::texture::{TextureId, TextureRegistry};

/// Quad-like test item whose x coordinates all equal its `tag`
pub(super) struct Shape {
    pub positions: Vec<f32>,
    pub indices: Option<Vec<u32>>,
    pub textures: Vec<TextureId>,
    pub state: PipelineState,
    pub tint: Option<UniformValue>,
}

impl Shape {
    pub fn quad(tag: f32, textures: &[TextureId]) -> Self {
        Self {
            positions: vec![tag, 0.0, tag, 1.0, tag, 2.0, tag, 3.0],
            indices: Some(vec![0, 1, 2, 0, 2, 3]),
            textures: textures.to_vec(),
            state: PipelineState::default(),
            tint: None,
        }
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.state = self.state.with_blend(blend);
        self
    }

    pub fn with_tint(mut self, tint: f32) -> Self {
        self.tint = Some(UniformValue::Float(tint));
        self
    }
}

impl BatchItem for Shape {
    fn attribute(&self, source: &str) -> Option<AttributeData<'_>> {
        (source == "positions").then(|| AttributeData::from_f32(&self.positions))
    }

    fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    fn textures(&self) -> &[TextureId] {
        &self.textures
    }

    fn pipeline_state(&self) -> PipelineState {
        self.state
    }

    fn uniform(&self, source: &str) -> Option<UniformValue> {
        (source == "tint").then_some(self.tint).flatten()
    }
}

pub(super) fn register(count: usize) -> Vec<TextureId> {
    let mut registry = TextureRegistry::new();
    (0..count).map(|i| registry.register(format!("texture{i}"))).collect()
}

pub(super) fn positions_config() -> BatcherConfig {
    BatcherConfig::default()
        .with_attribute(AttributeRedirect::float32("positions", "aVertexPosition", 2))
        .with_texture_unit_attribute("aTextureId")
}

pub(super) fn read_f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
