//! # Batchable Items
//!
//! The host's renderable objects are opaque to the engine. Everything the
//! engine needs is pulled through the [`BatchItem`] accessor trait, keyed by
//! the source names declared in the redirects.

use super::layout::ElementType;
use super::pipeline::PipelineState;
use super::texture::TextureId;

/// Borrowed attribute array of one item, tagged with its element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeData<'a> {
    element: ElementType,
    bytes: &'a [u8],
}

macro_rules! attribute_constructors {
    ($($fn_name:ident => $ty:ty, $element:ident;)*) => {
        $(
            #[doc = concat!("Wrap a `", stringify!($ty), "` slice")]
            pub fn $fn_name(data: &'a [$ty]) -> Self {
                Self {
                    element: ElementType::$element,
                    bytes: bytemuck::cast_slice(data),
                }
            }
        )*
    };
}

impl<'a> AttributeData<'a> {
    attribute_constructors! {
        from_i8 => i8, Int8;
        from_u8 => u8, Uint8;
        from_i16 => i16, Int16;
        from_u16 => u16, Uint16;
        from_i32 => i32, Int32;
        from_u32 => u32, Uint32;
        from_f32 => f32, Float32;
    }

    /// Wrap raw bytes holding elements of `element`
    ///
    /// Trailing bytes that do not form a whole element are ignored.
    pub const fn from_bytes(element: ElementType, bytes: &'a [u8]) -> Self {
        Self { element, bytes }
    }

    /// Element type of the data
    pub const fn element(&self) -> ElementType {
        self.element
    }

    /// Raw bytes of the data
    pub const fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Number of whole elements
    pub const fn len(&self) -> usize {
        self.bytes.len() / self.element.size()
    }

    /// Whether the array holds no elements
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A per-item uniform value gathered by a uniform redirect
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Single float
    Float(f32),
    /// Single signed integer
    Int(i32),
    /// Two-component vector
    Vec2([f32; 2]),
    /// Three-component vector
    Vec3([f32; 3]),
    /// Four-component vector
    Vec4([f32; 4]),
    /// Column-major 3x3 matrix
    Mat3([f32; 9]),
}

/// Accessors the engine uses to read a renderable item
///
/// Only `attribute` and `pipeline_state` are mandatory; everything else has a
/// default suited to untextured, non-indexed geometry.
pub trait BatchItem {
    /// Data for the attribute redirect with this source name
    fn attribute(&self, source: &str) -> Option<AttributeData<'_>>;

    /// Item-local index data
    fn indices(&self) -> Option<&[u32]> {
        None
    }

    /// Textures the item samples, in the order their units are written
    fn textures(&self) -> &[TextureId] {
        &[]
    }

    /// Pipeline state the item must be drawn with
    fn pipeline_state(&self) -> PipelineState;

    /// Explicit vertex count, used with `CountStrategy::Item`
    fn vertex_count(&self) -> Option<u32> {
        None
    }

    /// Explicit index count, used with `CountStrategy::Item`
    fn index_count(&self) -> Option<u32> {
        None
    }

    /// Value for the uniform redirect with this source name
    fn uniform(&self, _source: &str) -> Option<UniformValue> {
        None
    }
}
