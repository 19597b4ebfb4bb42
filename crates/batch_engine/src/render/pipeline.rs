//! Pipeline state requirements
//!
//! Items declare the fixed-function GPU state they must be drawn with. Two
//! items can share a draw call only when their states are exactly equal.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Color blending applied when drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// No blending (fully opaque)
    Opaque,
    /// Standard alpha blending
    #[default]
    Alpha,
    /// Pre-multiplied alpha
    Premultiplied,
    /// Additive blending for particles and lights
    Additive,
    /// Multiplicative blending for shadows
    Multiplicative,
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CullMode {
    /// No culling
    #[default]
    None,
    /// Cull front faces
    Front,
    /// Cull back faces
    Back,
}

bitflags! {
    /// Depth and stencil toggles of a pipeline
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct StateFlags: u8 {
        /// Test fragments against the depth buffer
        const DEPTH_TEST = 1;
        /// Write fragment depth
        const DEPTH_WRITE = 1 << 1;
        /// Test fragments against the stencil buffer
        const STENCIL_TEST = 1 << 2;
        /// Clockwise winding is front-facing
        const CLOCKWISE_FRONT = 1 << 3;
    }
}

/// GPU pipeline state an item must be drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PipelineState {
    /// Color blending
    pub blend: BlendMode,
    /// Face culling
    pub cull: CullMode,
    /// Depth/stencil toggles
    pub flags: StateFlags,
}

impl PipelineState {
    /// Alpha-blended 2D state with no depth testing
    pub const fn alpha() -> Self {
        Self {
            blend: BlendMode::Alpha,
            cull: CullMode::None,
            flags: StateFlags::empty(),
        }
    }

    /// Same state with a different blend mode
    pub const fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    /// Same state with a different cull mode
    pub const fn with_cull(mut self, cull: CullMode) -> Self {
        self.cull = cull;
        self
    }

    /// Same state with additional flags set
    pub const fn with_flags(mut self, flags: StateFlags) -> Self {
        self.flags = self.flags.union(flags);
        self
    }
}
