//! Composite geometry of one flush

use super::buffer_pool::PooledBuffer;

/// Interleaved vertex data and re-based indices for every batch of a flush
///
/// Backing buffers come from the packer's pools and are usually larger than
/// the data written. Only the valid prefixes exposed by `attribute_bytes` and
/// `indices` hold data; the rest is stale and must not be read.
#[derive(Debug)]
pub struct CompositeGeometry {
    pub(crate) attributes: PooledBuffer<u8>,
    pub(crate) indices: Option<PooledBuffer<u32>>,
    pub(crate) stride: usize,
    pub(crate) vertex_count: u32,
    pub(crate) index_count: u32,
}

impl CompositeGeometry {
    /// Bytes per vertex
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Vertices written
    pub const fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Indices written
    pub const fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Whether the flush carries index data
    pub const fn has_indices(&self) -> bool {
        self.indices.is_some()
    }

    /// Written vertex bytes
    pub fn attribute_bytes(&self) -> &[u8] {
        &self.attributes.as_slice()[..self.vertex_count as usize * self.stride]
    }

    /// Bytes of vertex `index`
    pub fn vertex(&self, index: u32) -> Option<&[u8]> {
        let start = index as usize * self.stride;
        (index < self.vertex_count).then(|| &self.attributes.as_slice()[start..start + self.stride])
    }

    /// Written indices
    pub fn indices(&self) -> &[u32] {
        match &self.indices {
            Some(buffer) => &buffer.as_slice()[..self.index_count as usize],
            None => &[],
        }
    }

    /// Full attribute buffer for upload, stale tail included
    pub fn attribute_buffer(&self) -> &[u8] {
        self.attributes.as_slice()
    }

    /// Full index buffer for upload, stale tail included
    pub fn index_buffer(&self) -> Option<&[u32]> {
        self.indices.as_ref().map(PooledBuffer::as_slice)
    }
}
