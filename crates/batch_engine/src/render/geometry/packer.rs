//! # Geometry Packer
//!
//! Merges the per-item attribute arrays of every batch into one interleaved
//! composite buffer and appends re-based index data.
//!
//! ## Pack Plans
//!
//! The attribute layout is fixed at construction but only known at runtime.
//! On first use the packer compiles it into a [`PackPlan`]: byte offsets,
//! strides and one monomorphized copy kernel per redirect. The plan is cached
//! for the packer's lifetime, so packing never re-examines element types.
//!
//! ## Tolerated Anomalies
//!
//! - Items with zero vertices or indices contribute nothing
//! - A declared index count larger than the index array is clamped to the array
//! - Items without index data in an indexed layout contribute zero indices
//! - Items with indices but zero vertices contribute zero indices
//! - Local indices at or past the item's vertex count are clamped to its last vertex
//! - Source arrays shorter than the vertex count have the missing vertices zeroed
//!
//! Every clamp, drop and zero fill is logged as a warning. Missing attributes,
//! element type mismatches and composite indices past `u32::MAX` fail the flush.

use std::cell::OnceCell;

use crate::core::config::{BatcherConfig, CountStrategy};
use crate::foundation::memory::round_to_granule;
use crate::render::batch_renderer::{BatchError, BatchResult};
use crate::render::batching::Batch;
use crate::render::item::BatchItem;
use crate::render::layout::{
    AttributeKind, AttributeRedirect, CopyMode, ElementType, LayoutResult, VertexLayout,
};

use super::buffer_pool::{BufferPool, PooledBuffer};
use super::composite::CompositeGeometry;
use super::kernels::{select_kernel, select_writer, CopyKernel, ValueWriter};

/// One redirect resolved to offsets and a kernel
struct CompiledRedirect {
    source: String,
    source_type: ElementType,
    source_stride: usize,
    read_bytes: usize,
    offset: usize,
    write_bytes: usize,
    count: usize,
    kernel: CopyKernel,
}

/// An attribute filled with small integers (texture units, uniform ids)
struct IndexSlot {
    offset: usize,
    element_size: usize,
    count: usize,
    writer: ValueWriter,
}

impl IndexSlot {
    fn write(&self, vertex: &mut [u8], values: impl Fn(usize) -> u32) {
        for k in 0..self.count {
            let start = self.offset + k * self.element_size;
            (self.writer)(values(k), &mut vertex[start..start + self.element_size]);
        }
    }
}

/// Specialized packing routine for one layout
pub(crate) struct PackPlan {
    stride: usize,
    redirects: Vec<CompiledRedirect>,
    texture_units: Option<IndexSlot>,
    uniform_id: Option<IndexSlot>,
    vertex_source: Option<(String, usize)>,
    vertex_count: CountStrategy,
    index_count: CountStrategy,
    use_indices: bool,
}

impl PackPlan {
    fn compile(
        layout: &VertexLayout,
        attributes: &[AttributeRedirect],
        modes: &[CopyMode],
        config: &PackSettings,
    ) -> Self {
        let mut redirects = Vec::with_capacity(attributes.len());
        let mut texture_units = None;
        let mut uniform_id = None;

        for attribute in layout.attributes() {
            match attribute.kind {
                AttributeKind::Redirect(index) => {
                    let redirect = &attributes[index];
                    let mode = modes[index];
                    let write_bytes = redirect.destination_bytes();
                    let read_bytes = match mode {
                        CopyMode::Reinterpret => write_bytes,
                        CopyMode::Numeric => {
                            redirect.destination_count as usize * redirect.source_type.size()
                        }
                    };

                    redirects.push(CompiledRedirect {
                        source: redirect.source.clone(),
                        source_type: redirect.source_type,
                        source_stride: redirect.source_stride() * redirect.source_type.size(),
                        read_bytes,
                        offset: attribute.offset,
                        write_bytes,
                        count: redirect.destination_count as usize,
                        kernel: select_kernel(mode, redirect.source_type, redirect.destination_type),
                    });
                }
                AttributeKind::TextureUnit => {
                    texture_units = Some(IndexSlot {
                        offset: attribute.offset,
                        element_size: attribute.element.size(),
                        count: attribute.count as usize,
                        writer: select_writer(attribute.element),
                    });
                }
                AttributeKind::UniformId => {
                    uniform_id = Some(IndexSlot {
                        offset: attribute.offset,
                        element_size: attribute.element.size(),
                        count: 1,
                        writer: select_writer(attribute.element),
                    });
                }
            }
        }

        let vertex_source = attributes
            .first()
            .filter(|first| !first.is_scalar())
            .map(|first| (first.source.clone(), first.source_elements()));

        Self {
            stride: layout.stride(),
            redirects,
            texture_units,
            uniform_id,
            vertex_source,
            vertex_count: config.vertex_count,
            index_count: config.index_count,
            use_indices: config.use_indices,
        }
    }

    /// Vertex and index counts `item` contributes
    fn measure<I: BatchItem + ?Sized>(&self, index: usize, item: &I) -> BatchResult<(usize, usize)> {
        let vertices = match self.vertex_count {
            CountStrategy::Constant(count) => count as usize,
            CountStrategy::Item => match item.vertex_count() {
                Some(count) => count as usize,
                None => self.derived_vertices(index, item)?,
            },
            CountStrategy::Derived => self.derived_vertices(index, item)?,
        };

        if !self.use_indices {
            return Ok((vertices, 0));
        }

        let available = item.indices().map_or(0, <[u32]>::len);
        let declared = match self.index_count {
            CountStrategy::Derived => None,
            CountStrategy::Constant(count) => Some(count as usize),
            CountStrategy::Item => item.index_count().map(|count| count as usize),
        };

        let mut indices = match declared {
            Some(count) if count > available => {
                log::warn!(
                    "Item {} declares {} indices but provides {}; clamping",
                    index,
                    count,
                    available
                );
                available
            }
            Some(count) => count,
            None => available,
        };

        if vertices == 0 && indices > 0 {
            log::warn!("Item {} has {} indices but no vertices; dropping them", index, indices);
            indices = 0;
        }

        Ok((vertices, indices))
    }

    fn derived_vertices<I: BatchItem + ?Sized>(&self, index: usize, item: &I) -> BatchResult<usize> {
        let Some((source, per_vertex)) = &self.vertex_source else {
            log::warn!("Item {} has no vertex count and the layout cannot derive one", index);
            return Ok(0);
        };

        let data = item
            .attribute(source)
            .ok_or_else(|| BatchError::MissingAttribute {
                item: index,
                attribute: source.clone(),
            })?;
        Ok(data.len() / per_vertex)
    }

    /// Write the vertices of one item into `vertices`
    fn write_item<I: BatchItem + ?Sized>(
        &self,
        index: usize,
        item: &I,
        vertices: &mut [u8],
        units: &[u32],
        uniform_id: Option<u32>,
    ) -> BatchResult<()> {
        if vertices.is_empty() {
            return Ok(());
        }

        for redirect in &self.redirects {
            let data = item
                .attribute(&redirect.source)
                .ok_or_else(|| BatchError::MissingAttribute {
                    item: index,
                    attribute: redirect.source.clone(),
                })?;
            if data.element() != redirect.source_type {
                return Err(BatchError::AttributeTypeMismatch {
                    item: index,
                    attribute: redirect.source.clone(),
                    expected: redirect.source_type,
                    found: data.element(),
                });
            }

            let source = data.bytes();
            let mut short = false;
            for (v, vertex) in vertices.chunks_exact_mut(self.stride).enumerate() {
                let dst = &mut vertex[redirect.offset..redirect.offset + redirect.write_bytes];
                let start = v * redirect.source_stride;
                match source.get(start..start + redirect.read_bytes) {
                    Some(src) => (redirect.kernel)(src, dst, redirect.count),
                    None => {
                        dst.fill(0);
                        short = true;
                    }
                }
            }

            if short {
                log::warn!(
                    "Item {} attribute '{}' is shorter than its vertex count; missing vertices zeroed",
                    index,
                    redirect.source
                );
            }
        }

        if let Some(slot) = &self.texture_units {
            let fallback = units.last().copied().unwrap_or(0);
            for vertex in vertices.chunks_exact_mut(self.stride) {
                slot.write(vertex, |k| units.get(k).copied().unwrap_or(fallback));
            }
        }

        if let Some(slot) = &self.uniform_id {
            let id = uniform_id.unwrap_or(0);
            for vertex in vertices.chunks_exact_mut(self.stride) {
                slot.write(vertex, |_| id);
            }
        }

        Ok(())
    }
}

/// Packing settings taken from the batcher configuration
#[derive(Debug, Clone)]
struct PackSettings {
    use_indices: bool,
    vertex_count: CountStrategy,
    index_count: CountStrategy,
    granule: usize,
}

/// Fills composite buffers from batched items
pub struct GeometryPacker {
    layout: VertexLayout,
    attributes: Vec<AttributeRedirect>,
    modes: Vec<CopyMode>,
    settings: PackSettings,
    plan: OnceCell<PackPlan>,
    attribute_pool: BufferPool<u8>,
    index_pool: BufferPool<u32>,
    item_counts: Vec<(usize, usize)>,
}

impl GeometryPacker {
    /// Create a packer for `config`, validating every redirect
    pub fn new(config: &BatcherConfig, layout: VertexLayout) -> LayoutResult<Self> {
        let modes = config
            .attributes
            .iter()
            .map(AttributeRedirect::copy_mode)
            .collect::<LayoutResult<Vec<_>>>()?;

        Ok(Self {
            layout,
            attributes: config.attributes.clone(),
            modes,
            settings: PackSettings {
                use_indices: config.use_indices,
                vertex_count: config.vertex_count,
                index_count: config.index_count,
                granule: config.buffer_granule,
            },
            plan: OnceCell::new(),
            attribute_pool: BufferPool::new(),
            index_pool: BufferPool::new(),
            item_counts: Vec::new(),
        })
    }

    /// Composite vertex layout the packer writes
    pub const fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    /// Whether the pack plan has been compiled
    pub fn is_compiled(&self) -> bool {
        self.plan.get().is_some()
    }

    /// Pool backing attribute buffers
    pub const fn attribute_pool(&self) -> &BufferPool<u8> {
        &self.attribute_pool
    }

    /// Pool backing index buffers
    pub const fn index_pool(&self) -> &BufferPool<u32> {
        &self.index_pool
    }

    /// Pack every batch of a flush into one composite geometry
    ///
    /// Fills in each batch's vertex and index ranges. The returned buffers
    /// belong to the packer's pools and must come back through [`Self::release`].
    pub fn pack<I: BatchItem + ?Sized>(
        &mut self,
        items: &[&I],
        batches: &mut [Batch],
    ) -> BatchResult<CompositeGeometry> {
        let plan = self.plan.get_or_init(|| {
            log::info!(
                "Compiling pack plan: {} attributes, {} bytes per vertex",
                self.layout.attributes().len(),
                self.layout.stride()
            );
            PackPlan::compile(&self.layout, &self.attributes, &self.modes, &self.settings)
        });

        self.item_counts.clear();
        let mut total_vertices = 0;
        let mut total_indices = 0;
        for (index, item) in items.iter().enumerate() {
            let (vertices, indices) = plan.measure(index, *item)?;
            total_vertices += vertices;
            total_indices += indices;
            self.item_counts.push((vertices, indices));
        }

        let vertex_capacity = round_to_granule(total_vertices, self.settings.granule);
        let mut attributes = self.attribute_pool.allocate(vertex_capacity * plan.stride);
        let mut indices = plan.use_indices.then(|| {
            self.index_pool
                .allocate(round_to_granule(total_indices, self.settings.granule))
        });

        let filled = fill(
            plan,
            items,
            batches,
            &self.item_counts,
            &mut attributes,
            indices.as_mut(),
        );

        match filled {
            Ok(()) => Ok(CompositeGeometry {
                attributes,
                indices,
                stride: plan.stride,
                vertex_count: total_vertices as u32,
                index_count: total_indices as u32,
            }),
            Err(err) => {
                self.attribute_pool.release(attributes);
                if let Some(indices) = indices {
                    self.index_pool.release(indices);
                }
                Err(err)
            }
        }
    }

    /// Return a composite geometry's buffers to the pools
    pub fn release(&mut self, geometry: CompositeGeometry) {
        self.attribute_pool.release(geometry.attributes);
        if let Some(indices) = geometry.indices {
            self.index_pool.release(indices);
        }
    }
}

fn fill<I: BatchItem + ?Sized>(
    plan: &PackPlan,
    items: &[&I],
    batches: &mut [Batch],
    item_counts: &[(usize, usize)],
    attributes: &mut PooledBuffer<u8>,
    mut indices: Option<&mut PooledBuffer<u32>>,
) -> BatchResult<()> {
    let stride = plan.stride;
    let mut vertex_cursor = 0;
    let mut index_cursor = 0;

    for batch in batches.iter_mut() {
        let vertex_start = vertex_cursor;
        let index_start = index_cursor;

        for (position, &member) in batch.members.iter().enumerate() {
            let item = items[member];
            let (vertex_count, index_count) = item_counts[member];

            let vertices = &mut attributes.as_mut_slice()
                [vertex_cursor * stride..(vertex_cursor + vertex_count) * stride];
            plan.write_item(
                member,
                item,
                vertices,
                batch.member_texture_units(position),
                batch.member_uniform_id(position),
            )?;

            if let Some(buffer) = indices.as_deref_mut() {
                let dst = &mut buffer.as_mut_slice()[index_cursor..index_cursor + index_count];
                let source = item.indices().unwrap_or(&[]);
                rebase_indices(member, source, dst, vertex_cursor, vertex_count)?;
            }

            vertex_cursor += vertex_count;
            index_cursor += index_count;
        }

        batch.vertex_start = vertex_start as u32;
        batch.vertex_count = (vertex_cursor - vertex_start) as u32;
        batch.index_start = index_start as u32;
        batch.index_count = (index_cursor - index_start) as u32;
    }

    Ok(())
}

/// Copy an item's local indices into `dst`, offset by `base`
///
/// Indices outside the item's own `vertex_count` vertices are clamped to its
/// last vertex so they never reach another item's geometry.
fn rebase_indices(
    item: usize,
    source: &[u32],
    dst: &mut [u32],
    base: usize,
    vertex_count: usize,
) -> BatchResult<()> {
    let overflow = || BatchError::IndexOverflow { item };
    let base = u32::try_from(base).map_err(|_| overflow())?;
    let last = u32::try_from(vertex_count.saturating_sub(1)).map_err(|_| overflow())?;

    let mut clamped = 0;
    for (slot, &local) in dst.iter_mut().zip(source) {
        let local = if local > last {
            clamped += 1;
            last
        } else {
            local
        };
        *slot = base.checked_add(local).ok_or_else(overflow)?;
    }

    if clamped > 0 {
        log::warn!(
            "Item {} has {} indices past its {} vertices; clamped to the last vertex",
            item,
            clamped,
            vertex_count
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::batching::BatchFactory;
    use crate::render::item::{AttributeData, UniformValue};
    use crate::render::layout::UniformRedirect;
    use crate::render::pipeline::PipelineState;
    use crate::render::texture::{TextureId, TextureRegistry};
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct Mesh {
        positions: Vec<f32>,
        colors: Vec<u8>,
        tint: u32,
        indices: Option<Vec<u32>>,
        textures: Vec<TextureId>,
        declared_indices: Option<u32>,
        declared_vertices: Option<u32>,
        transform: Option<UniformValue>,
    }

    impl BatchItem for Mesh {
        fn attribute(&self, source: &str) -> Option<AttributeData<'_>> {
            match source {
                "positions" => Some(AttributeData::from_f32(&self.positions)),
                "colors" => Some(AttributeData::from_u8(&self.colors)),
                "tint" => Some(AttributeData::from_u32(std::slice::from_ref(&self.tint))),
                _ => None,
            }
        }

        fn indices(&self) -> Option<&[u32]> {
            self.indices.as_deref()
        }

        fn textures(&self) -> &[TextureId] {
            &self.textures
        }

        fn pipeline_state(&self) -> PipelineState {
            PipelineState::default()
        }

        fn vertex_count(&self) -> Option<u32> {
            self.declared_vertices
        }

        fn index_count(&self) -> Option<u32> {
            self.declared_indices
        }

        fn uniform(&self, source: &str) -> Option<UniformValue> {
            (source == "transform").then_some(self.transform).flatten()
        }
    }

    fn triangle_mesh(vertices: usize, indices: &[u32]) -> Mesh {
        Mesh {
            positions: (0..vertices * 2).map(|i| i as f32).collect(),
            indices: Some(indices.to_vec()),
            ..Mesh::default()
        }
    }

    fn pack(config: &BatcherConfig, meshes: &[Mesh]) -> (GeometryPacker, CompositeGeometry, Vec<Batch>) {
        let layout = config.validate().unwrap();
        let mut packer = GeometryPacker::new(config, layout).unwrap();
        let items: Vec<&Mesh> = meshes.iter().collect();
        let mut factory = BatchFactory::new(config);
        let batches = factory.build(&items);
        let geometry = packer.pack(&items, batches).unwrap();
        let batches = batches.to_vec();
        (packer, geometry, batches)
    }

    fn read_f32s(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn positions_only() -> BatcherConfig {
        BatcherConfig::default().with_attribute(AttributeRedirect::float32("positions", "aVertexPosition", 2))
    }

    #[test]
    fn test_single_attribute_round_trip() {
        let mesh = Mesh {
            positions: vec![1.0, 2.0, 3.0, 4.0],
            ..Mesh::default()
        };
        let (_, geometry, _) = pack(&positions_only().with_indices(false), &[mesh]);

        assert_eq!(geometry.vertex_count(), 2);
        assert_eq!(geometry.stride(), 8);
        let floats = read_f32s(geometry.attribute_bytes());
        for (actual, expected) in floats.iter().zip([1.0, 2.0, 3.0, 4.0]) {
            assert_relative_eq!(*actual, expected);
        }
        assert!(!geometry.has_indices());
        assert!(geometry.indices().is_empty());
    }

    #[test]
    fn test_indices_are_rebased() {
        let a = triangle_mesh(3, &[0, 1, 2]);
        let b = triangle_mesh(4, &[0, 1, 2, 3, 0, 2]);
        let (_, geometry, batches) = pack(&positions_only(), &[a, b]);

        assert_eq!(geometry.indices(), &[0, 1, 2, 3, 4, 5, 6, 3, 5]);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].vertex_count(), 7);
        assert_eq!(batches[0].index_count(), 9);
    }

    #[test]
    fn test_out_of_range_indices_are_clamped_to_item() {
        let a = triangle_mesh(4, &[0, 1, 2, 0, 2, 3]);
        let b = triangle_mesh(3, &[0, 1, 9, 2, 1, u32::MAX]);
        let (_, geometry, _) = pack(&positions_only(), &[a, b]);

        assert_eq!(geometry.vertex_count(), 7);
        assert_eq!(geometry.indices(), &[0, 1, 2, 0, 2, 3, 4, 5, 6, 6, 5, 6]);
        assert!(geometry.indices().iter().all(|&i| i < geometry.vertex_count()));
    }

    #[test]
    fn test_indices_without_vertices_are_dropped() {
        let a = triangle_mesh(3, &[0, 1, 2]);
        let orphan = triangle_mesh(0, &[0, 1, 2]);
        let b = triangle_mesh(3, &[0, 1, 2]);
        let (_, geometry, batches) = pack(&positions_only(), &[a, orphan, b]);

        assert_eq!(geometry.indices(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(batches[0].index_count(), 6);
    }

    #[test]
    fn test_rebase_overflow_is_an_error() {
        let mut dst = [0u32; 1];
        let result = rebase_indices(7, &[0], &mut dst, u32::MAX as usize + 1, 1);
        assert!(matches!(result, Err(BatchError::IndexOverflow { item: 7 })));

        let result = rebase_indices(7, &[1], &mut dst, u32::MAX as usize, 2);
        assert!(matches!(result, Err(BatchError::IndexOverflow { item: 7 })));
    }

    #[test]
    fn test_item_vertex_count_overrides_and_falls_back() {
        let config = positions_only()
            .with_indices(false)
            .with_vertex_count(CountStrategy::Item);
        let overriding = Mesh {
            positions: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            declared_vertices: Some(2),
            ..Mesh::default()
        };
        let derived = Mesh {
            positions: vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0],
            ..Mesh::default()
        };
        let (_, geometry, batches) = pack(&config, &[overriding, derived]);

        assert_eq!(geometry.vertex_count(), 5);
        assert_eq!(batches[0].vertex_count(), 5);
        assert_eq!(
            read_f32s(geometry.attribute_bytes()),
            vec![1.0, 2.0, 3.0, 4.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0]
        );
    }

    #[test]
    fn test_zero_vertex_item_keeps_cursors_intact() {
        let a = triangle_mesh(3, &[0, 1, 2]);
        let empty = triangle_mesh(0, &[]);
        let b = triangle_mesh(3, &[2, 1, 0]);
        let (_, geometry, _) = pack(&positions_only(), &[a, empty, b]);

        assert_eq!(geometry.vertex_count(), 6);
        assert_eq!(geometry.indices(), &[0, 1, 2, 5, 4, 3]);
        let floats = read_f32s(geometry.vertex(3).unwrap());
        assert_relative_eq!(floats[0], 0.0);
        assert_relative_eq!(floats[1], 1.0);
    }

    #[test]
    fn test_declared_index_count_is_clamped() {
        let mut mesh = triangle_mesh(3, &[0, 1, 2]);
        mesh.declared_indices = Some(6);
        let config = positions_only().with_index_count(CountStrategy::Item);
        let (_, geometry, _) = pack(&config, &[mesh]);

        assert_eq!(geometry.index_count(), 3);
    }

    #[test]
    fn test_scalar_tint_and_texture_units_are_interleaved() {
        let mut registry = TextureRegistry::new();
        let [a, b] = ["a", "b"].map(|name| registry.register(name));
        let config = positions_only()
            .with_attribute(
                AttributeRedirect::scalar("tint", "aColor", ElementType::Uint32)
                    .with_destination(ElementType::Uint8, 4)
                    .normalized(),
            )
            .with_texture_unit_attribute("aTextureId");

        let first = Mesh {
            tint: u32::from_ne_bytes([1, 2, 3, 4]),
            textures: vec![a],
            ..triangle_mesh(2, &[0, 1])
        };
        let second = Mesh {
            tint: u32::from_ne_bytes([5, 6, 7, 8]),
            textures: vec![b],
            ..triangle_mesh(1, &[0])
        };
        let (_, geometry, _) = pack(&config, &[first, second]);

        assert_eq!(geometry.stride(), 16);
        let vertex = geometry.vertex(1).unwrap();
        assert_eq!(&vertex[8..12], &[1, 2, 3, 4]);
        assert_relative_eq!(read_f32s(&vertex[12..16])[0], 0.0);

        let vertex = geometry.vertex(2).unwrap();
        assert_eq!(&vertex[8..12], &[5, 6, 7, 8]);
        assert_relative_eq!(read_f32s(&vertex[12..16])[0], 1.0);
    }

    #[test]
    fn test_packed_channels_reinterpret_as_float() {
        let config = positions_only().with_indices(false).with_attribute(
            AttributeRedirect::new("colors", "aColor", ElementType::Uint8, 4)
                .with_destination(ElementType::Float32, 1),
        );
        let mesh = Mesh {
            positions: vec![0.0, 0.0],
            colors: vec![10, 20, 30, 40],
            ..Mesh::default()
        };
        let (_, geometry, _) = pack(&config, &[mesh]);

        let vertex = geometry.vertex(0).unwrap();
        assert_eq!(&vertex[8..12], &[10, 20, 30, 40]);
    }

    #[test]
    fn test_short_source_is_zero_filled() {
        let config = positions_only()
            .with_indices(false)
            .with_vertex_count(CountStrategy::Constant(2));
        let mesh = Mesh {
            positions: vec![7.0, 8.0],
            ..Mesh::default()
        };
        let (_, geometry, _) = pack(&config, &[mesh]);

        assert_eq!(read_f32s(geometry.attribute_bytes()), vec![7.0, 8.0, 0.0, 0.0]);
    }

    #[test]
    fn test_missing_attribute_fails_and_returns_buffers() {
        let config = positions_only().with_attribute(AttributeRedirect::float32("normals", "aNormal", 3));
        let layout = config.validate().unwrap();
        let mut packer = GeometryPacker::new(&config, layout).unwrap();
        let mesh = triangle_mesh(3, &[0, 1, 2]);
        let items = vec![&mesh];
        let mut factory = BatchFactory::new(&config);
        let batches = factory.build(&items);

        let result = packer.pack(&items, batches);
        assert!(matches!(
            result,
            Err(BatchError::MissingAttribute { item: 0, ref attribute }) if attribute == "normals"
        ));
        assert_eq!(packer.attribute_pool().free_count(), 1);
        assert_eq!(packer.index_pool().free_count(), 1);
    }

    #[test]
    fn test_element_type_mismatch_is_reported() {
        let config = positions_only()
            .with_indices(false)
            .with_attribute(AttributeRedirect::float32("colors", "aColor", 4));
        let layout = config.validate().unwrap();
        let mut packer = GeometryPacker::new(&config, layout).unwrap();
        let mesh = Mesh {
            positions: vec![0.0, 0.0],
            colors: vec![0; 4],
            ..Mesh::default()
        };
        let items = vec![&mesh];
        let mut factory = BatchFactory::new(&config);
        let batches = factory.build(&items);

        assert!(matches!(
            packer.pack(&items, batches),
            Err(BatchError::AttributeTypeMismatch {
                expected: ElementType::Float32,
                found: ElementType::Uint8,
                ..
            })
        ));
    }

    #[test]
    fn test_uniform_ids_are_written_per_vertex() {
        let config = positions_only()
            .with_indices(false)
            .with_uniform(UniformRedirect::new("transform", "uTransforms"))
            .with_uniform_id_attribute("aUniformId");
        let meshes: Vec<Mesh> = [1.0, 2.0, 1.0]
            .into_iter()
            .map(|scale| Mesh {
                positions: vec![0.0, 0.0],
                transform: Some(UniformValue::Float(scale)),
                ..Mesh::default()
            })
            .collect();
        let (_, geometry, batches) = pack(&config, &meshes);

        assert_eq!(batches[0].uniforms().len(), 2);
        let ids: Vec<f32> = (0..3)
            .map(|v| read_f32s(&geometry.vertex(v).unwrap()[8..12])[0])
            .collect();
        assert_eq!(ids, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_plan_compiles_once_and_buffers_are_pooled() {
        let config = positions_only();
        let layout = config.validate().unwrap();
        let mut packer = GeometryPacker::new(&config, layout).unwrap();
        assert!(!packer.is_compiled());

        let mesh = triangle_mesh(3, &[0, 1, 2]);
        let items = vec![&mesh];
        let mut factory = BatchFactory::new(&config);

        for _ in 0..3 {
            let batches = factory.build(&items);
            let geometry = packer.pack(&items, batches).unwrap();
            assert!(geometry.attribute_buffer().len() >= 64 * 8);
            assert!(geometry.index_buffer().unwrap().len() >= 64);
            packer.release(geometry);
        }

        assert!(packer.is_compiled());
        assert_eq!(packer.attribute_pool().allocations(), 1);
        assert_eq!(packer.index_pool().allocations(), 1);
    }
}
