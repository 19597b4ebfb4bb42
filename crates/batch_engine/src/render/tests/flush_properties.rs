//! End-to-end flush properties: ordering, budgets, state homogeneity,
//! index re-basing, packing round trips and buffer reuse

use super::{positions_config, read_f32s, register, Shape};
use crate::render::batch_renderer::BatchRenderer;
use crate::render::drawer::{DrawRange, RecordingDrawer};
use crate::render::layout::AttributeRedirect;
use crate::render::pipeline::BlendMode;
use crate::render::render_queue::RenderQueue;
use crate::BatcherConfig;
use approx::assert_relative_eq;

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_scene() -> Vec<Shape> {
        let textures = register(5);
        let blends = [BlendMode::Alpha, BlendMode::Additive];
        (0..24)
            .map(|i| {
                Shape::quad(i as f32, &[textures[(i * 7) % 5]]).with_blend(blends[(i / 5) % 2])
            })
            .collect()
    }

    #[test]
    fn test_batches_preserve_submission_order() {
        let shapes = mixed_scene();
        let items: Vec<&Shape> = shapes.iter().collect();
        let mut renderer = BatchRenderer::new(positions_config().with_texture_unit_budget(3)).unwrap();
        let mut drawer = RecordingDrawer::new();
        renderer.flush_items(&items, &mut drawer).unwrap();

        let order: Vec<usize> = renderer
            .batches()
            .iter()
            .flat_map(|batch| batch.members().iter().copied())
            .collect();
        assert_eq!(order, (0..shapes.len()).collect::<Vec<_>>());

        // Every vertex's x coordinate is the tag of the item it came from
        let stride = renderer.layout().stride();
        for (vertex, bytes) in drawer.vertex_bytes().chunks_exact(stride).enumerate() {
            assert_relative_eq!(read_f32s(&bytes[..4])[0], (vertex / 4) as f32);
        }
    }

    #[test]
    fn test_texture_budget_holds_in_every_batch() {
        let shapes = mixed_scene();
        let items: Vec<&Shape> = shapes.iter().collect();
        let mut renderer = BatchRenderer::new(positions_config().with_texture_unit_budget(3)).unwrap();
        let mut drawer = RecordingDrawer::new();
        renderer.flush_items(&items, &mut drawer).unwrap();

        for call in drawer.calls() {
            assert!(!call.textures.is_empty());
            assert!(call.textures.len() <= 3);
        }
    }

    #[test]
    fn test_batches_share_one_pipeline_state() {
        let shapes = mixed_scene();
        let items: Vec<&Shape> = shapes.iter().collect();
        let mut renderer = BatchRenderer::new(positions_config()).unwrap();
        let mut drawer = RecordingDrawer::new();
        renderer.flush_items(&items, &mut drawer).unwrap();

        for (batch, call) in renderer.batches().iter().zip(drawer.calls()) {
            assert_eq!(call.state, batch.pipeline_state());
            for &member in batch.members() {
                assert_eq!(shapes[member].state, batch.pipeline_state());
            }
        }
        // Blend runs of five items each, unlimited by the default budget
        assert_eq!(renderer.stats().batch_count, 5);
    }

    #[test]
    fn test_indices_are_rebased_across_items() {
        let mut a = Shape::quad(0.0, &[]);
        a.positions.truncate(6);
        a.indices = Some(vec![0, 1, 2]);
        let mut b = Shape::quad(1.0, &[]);
        b.indices = Some(vec![0, 1, 2, 3, 0, 2]);

        let mut renderer = BatchRenderer::new(positions_config()).unwrap();
        let mut drawer = RecordingDrawer::new();
        renderer.flush_items(&[&a, &b], &mut drawer).unwrap();

        assert_eq!(drawer.indices(), &[0, 1, 2, 3, 4, 5, 6, 3, 5]);
        assert_eq!(drawer.calls()[0].range, DrawRange::Indexed { first: 0, count: 9 });
    }

    #[test]
    fn test_packing_round_trip() {
        let mut shape = Shape::quad(0.0, &[]);
        shape.positions = vec![1.0, 2.0, 3.0, 4.0];
        shape.indices = None;
        let config = BatcherConfig::default()
            .with_attribute(AttributeRedirect::float32("positions", "aVertexPosition", 2))
            .with_indices(false);

        let mut renderer = BatchRenderer::new(config).unwrap();
        let mut drawer = RecordingDrawer::new();
        renderer.flush_items(&[&shape], &mut drawer).unwrap();

        let floats = read_f32s(drawer.vertex_bytes());
        assert_eq!(floats.len(), 4);
        for (actual, expected) in floats.iter().zip([1.0, 2.0, 3.0, 4.0]) {
            assert_relative_eq!(*actual, expected);
        }
        assert_eq!(drawer.calls()[0].range, DrawRange::Vertices { first: 0, count: 2 });
    }

    #[test]
    fn test_greedy_split_on_texture_budget() {
        let t = register(3);
        let shapes: Vec<Shape> = [t[0], t[1], t[2], t[0]]
            .iter()
            .enumerate()
            .map(|(i, &texture)| Shape::quad(i as f32, &[texture]))
            .collect();
        let items: Vec<&Shape> = shapes.iter().collect();

        let mut renderer = BatchRenderer::new(positions_config().with_texture_unit_budget(2)).unwrap();
        let mut drawer = RecordingDrawer::new();
        renderer.flush_items(&items, &mut drawer).unwrap();

        let bound: Vec<_> = drawer.calls().iter().map(|call| call.textures.clone()).collect();
        assert_eq!(bound, vec![vec![t[0], t[1]], vec![t[2], t[0]]]);
        assert_eq!(drawer.calls()[1].range, DrawRange::Indexed { first: 12, count: 12 });

        // Texture unit attribute follows the per-batch unit assignment
        let stride = renderer.layout().stride();
        let units: Vec<f32> = drawer
            .vertex_bytes()
            .chunks_exact(stride)
            .step_by(4)
            .map(|vertex| read_f32s(&vertex[8..12])[0])
            .collect();
        assert_eq!(units, vec![0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_empty_flush_is_a_no_op() {
        let mut renderer: BatchRenderer<Shape> = BatchRenderer::new(positions_config()).unwrap();
        let mut queue = RenderQueue::new();
        let mut drawer = RecordingDrawer::new();

        renderer.flush(&mut queue, &mut drawer).unwrap();
        renderer.flush(&mut queue, &mut drawer).unwrap();

        assert_eq!(drawer.uploads(), 0);
        assert!(drawer.calls().is_empty());
        assert!(renderer.batches().is_empty());
        assert_eq!(renderer.stats().batch_count, 0);
        assert_eq!(renderer.packer().attribute_pool().allocations(), 0);
    }

    #[test]
    fn test_buffers_are_reused_between_flushes() {
        let t = register(1);
        let shapes: Vec<Shape> = (0..8).map(|i| Shape::quad(i as f32, &t)).collect();
        let mut renderer = BatchRenderer::new(positions_config()).unwrap();
        let mut drawer = RecordingDrawer::new();

        for frame in 0..4 {
            let mut queue = RenderQueue::with_capacity(shapes.len());
            queue.extend(shapes.iter().take(8 - frame));
            renderer.flush(&mut queue, &mut drawer).unwrap();
        }

        assert_eq!(drawer.uploads(), 4);
        assert_eq!(renderer.packer().attribute_pool().allocations(), 1);
        assert_eq!(renderer.packer().attribute_pool().reuses(), 3);
        assert_eq!(renderer.packer().index_pool().allocations(), 1);
    }

    #[test]
    fn test_custom_policy_splits_batches() {
        let shapes: Vec<Shape> = (0..6).map(|i| Shape::quad(i as f32, &[])).collect();
        let items: Vec<&Shape> = shapes.iter().collect();
        let mut renderer = BatchRenderer::new(positions_config()).unwrap();
        renderer.set_policy(Box::new(|shape: &Shape, _: usize| shape.positions[0] != 3.0));

        renderer.flush_items(&items, &mut RecordingDrawer::new()).unwrap();

        let runs: Vec<Vec<usize>> = renderer
            .batches()
            .iter()
            .map(|batch| batch.members().to_vec())
            .collect();
        assert_eq!(runs, vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }
}
