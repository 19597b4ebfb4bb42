//! # Redirects
//!
//! Declarative mappings from an item's local data fields into slots of the
//! composite vertex layout (attribute redirects) or of a batch's uniform
//! arrays (uniform redirects).

use serde::{Deserialize, Serialize};

use super::{LayoutError, LayoutResult};

/// Numeric element kinds a redirect can read or write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Signed 8-bit integer
    Int8,
    /// Unsigned 8-bit integer
    Uint8,
    /// Signed 16-bit integer
    Int16,
    /// Unsigned 16-bit integer
    Uint16,
    /// Signed 32-bit integer
    Int32,
    /// Unsigned 32-bit integer
    Uint32,
    /// 32-bit IEEE float
    Float32,
}

impl ElementType {
    /// Size of one element in bytes
    pub const fn size(self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
        }
    }

    /// Shader-facing name of the element type
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Float32 => "float32",
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How many source elements an item provides per vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCount {
    /// One per-item value, repeated for every vertex of the item
    Scalar,
    /// `n` elements per vertex, stored contiguously
    Elements(u32),
}

/// How a redirect moves data from source to destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyMode {
    /// Element-by-element numeric conversion (identity when types match)
    Numeric,
    /// Raw byte copy; source and destination spans have equal width
    Reinterpret,
}

/// Maps one item attribute into one slot of the composite vertex
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeRedirect {
    /// Name of the item field the data is read from
    pub source: String,
    /// Name of the composite vertex attribute written
    pub destination: String,
    /// Element type the item provides
    pub source_type: ElementType,
    /// Elements per vertex the item provides
    pub source_count: SourceCount,
    /// Element type stored in the composite buffer
    pub destination_type: ElementType,
    /// Elements per vertex stored in the composite buffer
    pub destination_count: u32,
    /// Whether the GPU should normalize integer data when fetching
    #[serde(default)]
    pub normalize: bool,
}

impl AttributeRedirect {
    /// Create a redirect that copies `count` elements of `element` per vertex unchanged
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        element: ElementType,
        count: u32,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            source_type: element,
            source_count: SourceCount::Elements(count),
            destination_type: element,
            destination_count: count,
            normalize: false,
        }
    }

    /// Create a float32 per-vertex redirect
    pub fn float32(source: impl Into<String>, destination: impl Into<String>, count: u32) -> Self {
        Self::new(source, destination, ElementType::Float32, count)
    }

    /// Create a per-item scalar redirect written once per vertex
    pub fn scalar(
        source: impl Into<String>,
        destination: impl Into<String>,
        element: ElementType,
    ) -> Self {
        Self {
            source_count: SourceCount::Scalar,
            destination_count: 1,
            ..Self::new(source, destination, element, 1)
        }
    }

    /// Override how the data is stored in the composite buffer
    pub fn with_destination(mut self, element: ElementType, count: u32) -> Self {
        self.destination_type = element;
        self.destination_count = count;
        self
    }

    /// Mark the attribute as normalized on fetch
    pub fn normalized(mut self) -> Self {
        self.normalize = true;
        self
    }

    /// Source elements consumed per vertex
    pub const fn source_elements(&self) -> usize {
        match self.source_count {
            SourceCount::Scalar => 1,
            SourceCount::Elements(n) => n as usize,
        }
    }

    /// Distance in source elements between consecutive vertices (0 for scalars)
    pub const fn source_stride(&self) -> usize {
        match self.source_count {
            SourceCount::Scalar => 0,
            SourceCount::Elements(n) => n as usize,
        }
    }

    /// Whether the source is a per-item scalar
    pub const fn is_scalar(&self) -> bool {
        matches!(self.source_count, SourceCount::Scalar)
    }

    /// Bytes written into the composite vertex
    pub const fn destination_bytes(&self) -> usize {
        self.destination_count as usize * self.destination_type.size()
    }

    /// Bytes read from the item per vertex
    pub const fn source_bytes(&self) -> usize {
        self.source_elements() * self.source_type.size()
    }

    /// Resolve the copy mode, rejecting inconsistent count/type combinations
    ///
    /// Matching widths with different types reinterpret bytes; otherwise the
    /// destination must not ask for more elements than the source provides.
    pub fn copy_mode(&self) -> LayoutResult<CopyMode> {
        if self.destination_count == 0 || self.source_elements() == 0 {
            return Err(LayoutError::ZeroCount {
                destination: self.destination.clone(),
            });
        }

        if self.source_type != self.destination_type
            && self.source_bytes() == self.destination_bytes()
        {
            return Ok(CopyMode::Reinterpret);
        }

        if self.destination_count as usize <= self.source_elements() {
            Ok(CopyMode::Numeric)
        } else {
            Err(LayoutError::IncompatibleCounts {
                destination: self.destination.clone(),
                source_bytes: self.source_bytes(),
                destination_bytes: self.destination_bytes(),
            })
        }
    }
}

/// Maps one item field into a named uniform array of the batch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniformRedirect {
    /// Name of the item field the value is read from
    pub source: String,
    /// Name of the uniform array written
    pub destination: String,
}

impl UniformRedirect {
    /// Create a uniform redirect
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}
