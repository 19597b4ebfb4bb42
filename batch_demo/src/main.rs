//! Sprite batching demo
//!
//! Builds a scene of sprites with random textures, tints and blend modes,
//! flushes it for a few frames through a drawer that logs every call, and
//! prints the batching statistics.
//!
//! Pass a `.toml` or `.ron` batcher configuration as the first argument to
//! override the built-in layout.

use batch_engine::foundation::logging;
use batch_engine::prelude::*;
use rand::Rng;

const SPRITE_COUNT: usize = 2000;
const TEXTURE_COUNT: usize = 24;
const FRAMES: usize = 3;
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];
const QUAD_UVS: [f32; 8] = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Layout(#[from] LayoutError),

    #[error("Flush failed: {0}")]
    Batch(#[from] BatchError),
}

struct Sprite {
    corners: [f32; 8],
    color: u32,
    texture: TextureId,
    blend: BlendMode,
}

impl BatchItem for Sprite {
    fn attribute(&self, source: &str) -> Option<AttributeData<'_>> {
        match source {
            "positions" => Some(AttributeData::from_f32(&self.corners)),
            "uvs" => Some(AttributeData::from_f32(&QUAD_UVS)),
            "color" => Some(AttributeData::from_u32(std::slice::from_ref(&self.color))),
            _ => None,
        }
    }

    fn indices(&self) -> Option<&[u32]> {
        Some(&QUAD_INDICES)
    }

    fn textures(&self) -> &[TextureId] {
        std::slice::from_ref(&self.texture)
    }

    fn pipeline_state(&self) -> PipelineState {
        PipelineState::default().with_blend(self.blend)
    }
}

/// Drawer that logs what a GPU backend would be asked to do
struct LoggingDrawer<'a> {
    registry: &'a TextureRegistry,
    draws: usize,
    uploaded_bytes: usize,
}

impl<'a> LoggingDrawer<'a> {
    fn new(registry: &'a TextureRegistry) -> Self {
        Self {
            registry,
            draws: 0,
            uploaded_bytes: 0,
        }
    }
}

impl DrawSubmitter for LoggingDrawer<'_> {
    fn upload(&mut self, geometry: &CompositeGeometry, layout: &VertexLayout) -> Result<(), DrawError> {
        let bytes = geometry.attribute_buffer().len()
            + geometry.index_buffer().map_or(0, |indices| indices.len() * 4);
        self.uploaded_bytes += bytes;
        log::debug!(
            "Upload: {} vertices x {} bytes, {} indices ({} bytes with pooled slack)",
            geometry.vertex_count(),
            layout.stride(),
            geometry.index_count(),
            bytes
        );
        Ok(())
    }

    fn draw(&mut self, batch: &Batch, geometry: &CompositeGeometry) -> Result<(), DrawError> {
        let call = DrawCall::from_batch(batch, geometry);
        let names: Vec<&str> = call.textures.iter().map(|&id| self.registry.name(id)).collect();
        log::debug!(
            "Draw {}: {:?} with {:?} blend over {} elements, textures {:?}",
            self.draws,
            call.range,
            call.state.blend,
            call.range.count(),
            names
        );
        self.draws += 1;
        Ok(())
    }
}

fn default_config() -> BatcherConfig {
    BatcherConfig::default()
        .with_attribute(AttributeRedirect::float32("positions", "aVertexPosition", 2))
        .with_attribute(AttributeRedirect::float32("uvs", "aTextureCoord", 2))
        .with_attribute(
            AttributeRedirect::scalar("color", "aColor", ElementType::Uint32)
                .with_destination(ElementType::Uint8, 4)
                .normalized(),
        )
        .with_texture_unit_attribute("aTextureId")
        .with_texture_unit_budget(8)
}

fn load_config() -> Result<BatcherConfig, DemoError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading batcher configuration from {}", path);
            Ok(BatcherConfig::load_from_file(&path)?)
        }
        None => Ok(default_config()),
    }
}

fn build_scene(rng: &mut impl Rng, textures: &[TextureId]) -> Vec<Sprite> {
    let mut blend = BlendMode::Alpha;
    (0..SPRITE_COUNT)
        .map(|_| {
            // Blend changes are rare, like layer switches in a real scene
            if rng.gen_bool(0.02) {
                blend = match blend {
                    BlendMode::Alpha => BlendMode::Additive,
                    _ => BlendMode::Alpha,
                };
            }

            let x = rng.gen_range(-100.0..100.0);
            let y = rng.gen_range(-100.0..100.0);
            let size = rng.gen_range(1.0..8.0);
            Sprite {
                corners: [x, y, x + size, y, x + size, y + size, x, y + size],
                color: rng.gen(),
                texture: textures[rng.gen_range(0..textures.len())],
                blend,
            }
        })
        .collect()
}

fn print_stats(frame: usize, stats: &BatchStats) {
    println!(
        "frame {}: {} sprites -> {} batches ({:.1} per batch), {} vertices, {} indices, {} draw calls, {}us",
        frame,
        stats.total_items,
        stats.batch_count,
        stats.avg_items_per_batch(),
        stats.vertex_count,
        stats.index_count,
        stats.draw_calls,
        stats.total_time_us()
    );
}

fn run() -> Result<(), DemoError> {
    let config = load_config()?;
    let mut renderer = BatchRenderer::new(config)?;

    let mut registry = TextureRegistry::new();
    let textures: Vec<TextureId> = (0..TEXTURE_COUNT)
        .map(|i| registry.register(format!("sprite_sheet_{i}")))
        .collect();

    let mut rng = rand::thread_rng();
    let sprites = build_scene(&mut rng, &textures);
    let mut drawer = LoggingDrawer::new(&registry);

    for frame in 0..FRAMES {
        let mut queue = RenderQueue::with_capacity(sprites.len());
        queue.extend(sprites.iter());
        renderer.flush(&mut queue, &mut drawer)?;
        print_stats(frame, renderer.stats());
    }

    let pool = renderer.packer().attribute_pool();
    println!(
        "attribute buffers: {} allocated, {} reused; {} bytes uploaded in total",
        pool.allocations(),
        pool.reuses(),
        drawer.uploaded_bytes
    );
    Ok(())
}

fn main() {
    logging::init();

    if let Err(err) = run() {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
