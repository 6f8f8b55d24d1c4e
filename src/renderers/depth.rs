// Copyright @yucwang 2026

use crate::core::encoder::DepthEncoder;
use crate::core::error::MappingError;
use crate::core::intersector::{RayIntersector, RayObserver};
use crate::core::layer::RayMask;
use crate::math::bitmap::DepthImage;
use crate::math::constants::Float;
use crate::sensors::spherical::SampleGrid;
use crate::sensors::viewpoint::Viewpoint;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;

pub use super::renderer::Renderer;

const ROWS_PER_BLOCK: usize = 8;

/// Per-render parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub width: usize,
    pub height: usize,
    pub max_range: Float,
    pub mask: RayMask,
    /// Worker threads; 0 uses the available parallelism.
    pub threads: usize,
    pub show_progress: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 512,
            height: 256,
            max_range: 8.0,
            mask: RayMask::ALL,
            threads: 0,
            show_progress: true,
        }
    }
}

impl RenderSettings {
    fn thread_count(&self) -> usize {
        match self.threads {
            0 => thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            n => n,
        }
    }
}

/// Casts one ray per sample grid cell and encodes the hit distances.
/// The grid is cached and rebuilt only when the resolution changes.
#[derive(Default)]
pub struct DepthMapRenderer {
    grid: Option<SampleGrid>,
}

impl DepthMapRenderer {
    pub fn new() -> Self {
        Self { grid: None }
    }

    pub fn grid(&self) -> Option<&SampleGrid> {
        self.grid.as_ref()
    }

    fn prepare_grid(&mut self, width: usize, height: usize) -> Result<&SampleGrid, MappingError> {
        let stale = match &self.grid {
            Some(grid) => !grid.matches(width, height),
            None => true,
        };
        if stale {
            log::debug!("Building {}x{} sample grid.", width, height);
            self.grid = Some(SampleGrid::build(width, height)?);
        }
        self.grid.as_ref().ok_or(MappingError::InvalidResolution { width, height })
    }

    pub fn render_depth(&mut self,
                        viewpoint: &Viewpoint,
                        settings: &RenderSettings,
                        intersector: &dyn RayIntersector,
                        observer: Option<&dyn RayObserver>) -> Result<DepthImage, MappingError> {
        let encoder = DepthEncoder::new(settings.max_range)?;
        let (width, height) = (settings.width, settings.height);
        let grid = self.prepare_grid(width, height)?;

        let start = Instant::now();
        let total_blocks = (height + ROWS_PER_BLOCK - 1) / ROWS_PER_BLOCK;
        let progress = if settings.show_progress {
            let bar = ProgressBar::new(total_blocks as u64);
            bar.set_style(
                ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} row blocks")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let origin = viewpoint.position;
        let mask = settings.mask;
        let next_block = Arc::new(AtomicUsize::new(0));
        let thread_count = settings.thread_count().min(total_blocks).max(1);
        let (tx, rx) = mpsc::channel::<(usize, Vec<Float>)>();
        let mut output = vec![0.0 as Float; width * height];
        let mut completed = 0usize;

        thread::scope(|scope| {
            let mut workers = Vec::with_capacity(thread_count);
            for _ in 0..thread_count {
                let next_block = Arc::clone(&next_block);
                let tx = tx.clone();
                workers.push(scope.spawn(move || {
                    loop {
                        let block_index = next_block.fetch_add(1, Ordering::Relaxed);
                        if block_index >= total_blocks {
                            break;
                        }

                        let y0 = block_index * ROWS_PER_BLOCK;
                        let y1 = (y0 + ROWS_PER_BLOCK).min(height);
                        let mut block = Vec::with_capacity((y1 - y0) * width);
                        for y in y0..y1 {
                            for x in 0..width {
                                let direction = viewpoint.transform_direction(grid.direction(x, y));
                                let hit = intersector.cast(&origin, &direction, encoder.max_range(), mask);
                                let intensity = encoder.encode(hit);
                                if let Some(observer) = observer {
                                    observer.on_ray(&origin, &direction, hit, intensity);
                                }
                                block.push(intensity);
                            }
                        }
                        if tx.send((y0, block)).is_err() {
                            break;
                        }
                    }
                }));
            }

            drop(tx);
            for (y0, block) in rx.iter() {
                let offset = y0 * width;
                output[offset..offset + block.len()].copy_from_slice(&block);
                completed += 1;
                progress.inc(1);
            }

            // A panicked worker loses the block it was on; joining here keeps
            // the panic from propagating out of the scope.
            for worker in workers {
                if worker.join().is_err() {
                    log::error!("A depth render worker panicked.");
                }
            }
        });
        progress.finish_and_clear();

        if completed != total_blocks {
            return Err(MappingError::RenderIncomplete { completed, expected: total_blocks });
        }

        log::info!("Rendered {}x{} depth map in {} ms.", width, height, start.elapsed().as_millis());
        DepthImage::from_vec(width, height, output)
            .ok_or(MappingError::InvalidResolution { width, height })
    }
}

impl Renderer for DepthMapRenderer {
    fn render(&mut self,
              viewpoint: &Viewpoint,
              settings: &RenderSettings,
              intersector: &dyn RayIntersector) -> Result<DepthImage, MappingError> {
        self.render_depth(viewpoint, settings, intersector, None)
    }

    fn describe(&self) -> String {
        String::from("DepthMapRenderer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::{Scene, SceneObject};
    use crate::math::constants::Vector3f;
    use crate::math::transform::Transform;
    use crate::shapes::cube::Cube;
    use std::sync::Mutex;

    struct ConstantIntersector(Option<Float>);

    impl RayIntersector for ConstantIntersector {
        fn cast(&self, _origin: &Vector3f, _direction: &Vector3f, _max_distance: Float, _mask: RayMask) -> Option<Float> {
            self.0
        }
    }

    struct PanickingIntersector;

    impl RayIntersector for PanickingIntersector {
        fn cast(&self, _origin: &Vector3f, direction: &Vector3f, _max_distance: Float, _mask: RayMask) -> Option<Float> {
            if direction.y < -0.01 {
                panic!("intersector failure");
            }
            None
        }
    }

    #[derive(Default)]
    struct CountingObserver {
        rays: Mutex<usize>,
    }

    impl RayObserver for CountingObserver {
        fn on_ray(&self, _origin: &Vector3f, direction: &Vector3f, _distance: Option<Float>, _intensity: Float) {
            assert!((direction.norm() - 1.0).abs() < 1e-4);
            if let Ok(mut rays) = self.rays.lock() {
                *rays += 1;
            }
        }
    }

    fn settings(width: usize, height: usize) -> RenderSettings {
        RenderSettings { width, height, show_progress: false, threads: 3, ..RenderSettings::default() }
    }

    #[test]
    fn test_no_hit_renders_black() {
        let mut renderer = DepthMapRenderer::new();
        let image = renderer.render(&Viewpoint::default(), &settings(16, 9), &ConstantIntersector(None)).unwrap();
        assert_eq!((image.width(), image.height()), (16, 9));
        assert!(image.pixels().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_hit_at_max_range_renders_black() {
        let mut renderer = DepthMapRenderer::new();
        let image = renderer.render(&Viewpoint::default(), &settings(8, 4), &ConstantIntersector(Some(8.0))).unwrap();
        assert!(image.pixels().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_near_hits_approach_white() {
        let mut renderer = DepthMapRenderer::new();
        let image = renderer.render(&Viewpoint::default(), &settings(8, 4), &ConstantIntersector(Some(1e-5))).unwrap();
        assert!(image.pixels().iter().all(|v| *v > 0.9999 && *v <= 1.0));
    }

    #[test]
    fn test_invalid_range_produces_no_image() {
        let mut renderer = DepthMapRenderer::new();
        for max_range in [0.0, -2.0, Float::NAN] {
            let s = RenderSettings { max_range, ..settings(4, 2) };
            let result = renderer.render(&Viewpoint::default(), &s, &ConstantIntersector(Some(1.0)));
            assert!(matches!(result, Err(MappingError::InvalidRange(_))));
        }
        // Validation happens before any grid is built.
        assert!(renderer.grid().is_none());
    }

    #[test]
    fn test_worker_panic_reports_incomplete_render() {
        // 8 rows per block: rows 0..8 look down and fail, rows 8..16 look up.
        let mut renderer = DepthMapRenderer::new();
        let result = renderer.render(&Viewpoint::default(), &settings(4, 16), &PanickingIntersector);
        assert!(matches!(result, Err(MappingError::RenderIncomplete { completed: 1, expected: 2 })));
    }

    #[test]
    fn test_zero_resolution_is_rejected() {
        let mut renderer = DepthMapRenderer::new();
        let result = renderer.render(&Viewpoint::default(), &settings(0, 2), &ConstantIntersector(None));
        assert!(matches!(result, Err(MappingError::InvalidResolution { .. })));
    }

    #[test]
    fn test_inside_cube_depths() {
        let scene = Scene::with_objects(vec![
            SceneObject::new(Arc::new(Cube::new(Transform::scale(&Vector3f::new(2.0, 2.0, 2.0))))),
        ]);
        let mut renderer = DepthMapRenderer::new();
        let image = renderer.render(&Viewpoint::default(), &settings(32, 16), &scene).unwrap();

        // Bottom row looks straight down at the floor two units away.
        for x in 0..32 {
            assert!((image[(x, 0)] - 0.75).abs() < 1e-4);
        }
        let lowest = 1.0 - 2.0 * (3.0 as Float).sqrt() / 8.0;
        for v in image.pixels() {
            assert!(*v >= lowest - 1e-4 && *v <= 0.75 + 1e-4);
        }
    }

    #[test]
    fn test_observer_sees_every_ray_and_grid_is_reused() {
        let observer = CountingObserver::default();
        let mut renderer = DepthMapRenderer::new();
        renderer.render_depth(&Viewpoint::default(), &settings(10, 5), &ConstantIntersector(Some(2.0)), Some(&observer))
            .unwrap();
        assert_eq!(*observer.rays.lock().unwrap(), 50);
        assert!(renderer.grid().unwrap().matches(10, 5));

        renderer.render(&Viewpoint::default(), &settings(6, 3), &ConstantIntersector(None)).unwrap();
        assert!(renderer.grid().unwrap().matches(6, 3));
    }

    #[test]
    fn test_rotated_viewpoint_changes_forward() {
        // Half a turn about Y swaps the front and back columns.
        let scene = Scene::with_objects(vec![
            SceneObject::new(Arc::new(Cube::new(Transform::translate(&Vector3f::new(0.0, 0.0, 4.0))))),
        ]);
        let s = settings(4, 2);
        let mut renderer = DepthMapRenderer::new();
        let front = renderer.render(&Viewpoint::default(), &s, &scene).unwrap();
        assert!((front[(2, 1)] - 0.625).abs() < 1e-4);
        assert_eq!(front[(0, 1)], 0.0);

        let turned = Viewpoint::from_components([0.0; 3], [0.0, 1.0, 0.0, 0.0], 360.0);
        let back = renderer.render(&turned, &s, &scene).unwrap();
        assert!((back[(0, 1)] - 0.625).abs() < 1e-4);
        assert_eq!(back[(2, 1)], 0.0);
    }
}
