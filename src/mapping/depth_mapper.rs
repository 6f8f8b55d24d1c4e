// Copyright @yucwang 2026

use crate::core::error::MappingError;
use crate::core::intersector::{LogRayObserver, RayIntersector, RayObserver};
use crate::io::image_utils;
use crate::math::bitmap::DepthImage;
use crate::renderers::depth::{DepthMapRenderer, RenderSettings};
use crate::sensors::viewpoint::Viewpoint;

use super::compositor;
use super::localised_image::{LocalisedImage, LocalisedImageList};

use std::path::PathBuf;
use std::time::Instant;

pub const DEFAULT_TEXTURE_NAME: &str = "depthMap";

#[derive(Debug, Clone, PartialEq)]
pub struct DepthMapperSettings {
    pub render: RenderSettings,
    /// Write each depth map to `<texture_name>.jpg`.
    pub save_to_file: bool,
    pub texture_name: String,
    /// Composite each depth map into its target panorama's alpha.
    pub save_to_target: bool,
    pub draw_rays: bool,
}

impl Default for DepthMapperSettings {
    fn default() -> Self {
        Self {
            render: RenderSettings::default(),
            save_to_file: false,
            texture_name: DEFAULT_TEXTURE_NAME.to_string(),
            save_to_target: false,
            draw_rays: false,
        }
    }
}

/// Outcome of one depth pass. Save and composite failures are recorded
/// here rather than failing the render.
#[derive(Debug)]
pub struct RenderReport {
    pub id: Option<String>,
    pub image: DepthImage,
    /// Whether the viewpoint was moved to the target's pose before rendering.
    pub synced: bool,
    pub saved_path: Option<PathBuf>,
    pub save_error: Option<MappingError>,
    pub composited: bool,
}

/// Renders depth maps from a viewpoint and hands them to the file and
/// panorama outputs.
pub struct DepthMapper {
    settings: DepthMapperSettings,
    viewpoint: Viewpoint,
    renderer: DepthMapRenderer,
}

impl DepthMapper {
    pub fn new(settings: DepthMapperSettings, viewpoint: Viewpoint) -> Self {
        Self { settings, viewpoint, renderer: DepthMapRenderer::new() }
    }

    pub fn settings(&self) -> &DepthMapperSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut DepthMapperSettings {
        &mut self.settings
    }

    pub fn viewpoint(&self) -> &Viewpoint {
        &self.viewpoint
    }

    pub fn set_viewpoint(&mut self, viewpoint: Viewpoint) {
        self.viewpoint = viewpoint;
    }

    /// Moves the mapper to the pose `target` was captured from.
    pub fn sync_to_target(&mut self, target: Option<&LocalisedImage>) -> Result<(), MappingError> {
        match target {
            Some(target) => {
                self.viewpoint = target.viewpoint;
                Ok(())
            }
            None => {
                log::warn!("No target image to sync the viewpoint to, keeping the current pose.");
                Err(MappingError::MissingTarget("no target image to sync to".to_string()))
            }
        }
    }

    /// Renders from `target`'s pose (or the current one when `target` is
    /// `None`), then saves and composites as configured.
    pub fn render_depth(&mut self,
                        intersector: &dyn RayIntersector,
                        target: Option<&mut LocalisedImage>) -> Result<RenderReport, MappingError> {
        let stem = self.settings.texture_name.clone();
        self.render_with_stem(intersector, target, stem)
    }

    /// Renders every image of `list` from its own pose. Depth maps are saved
    /// as `<texture_name>_<id>.jpg` when saving is enabled.
    pub fn render_all(&mut self,
                      intersector: &dyn RayIntersector,
                      list: &mut LocalisedImageList) -> Result<Vec<RenderReport>, MappingError> {
        if list.is_empty() {
            return Err(MappingError::EmptySourceSet);
        }

        let start = Instant::now();
        let mut reports = Vec::with_capacity(list.len());
        for image in list.iter_mut() {
            let stem = format!("{}_{}", self.settings.texture_name, image.id);
            reports.push(self.render_with_stem(intersector, Some(image), stem)?);
        }
        log::info!("Rendered {} depth maps in {} ms.", reports.len(), start.elapsed().as_millis());
        Ok(reports)
    }

    fn render_with_stem(&mut self,
                        intersector: &dyn RayIntersector,
                        mut target: Option<&mut LocalisedImage>,
                        stem: String) -> Result<RenderReport, MappingError> {
        // Without a target the current pose is kept and the miss is logged.
        let synced = self.sync_to_target(target.as_deref()).is_ok();
        let id = target.as_deref().map(|t| t.id.clone());

        let log_observer = LogRayObserver;
        let observer: Option<&dyn RayObserver> = if self.settings.draw_rays { Some(&log_observer) } else { None };
        let image = self.renderer.render_depth(&self.viewpoint, &self.settings.render, intersector, observer)?;

        let mut report = RenderReport { id, image, synced, saved_path: None, save_error: None, composited: false };

        if self.settings.save_to_file {
            match image_utils::save_depth_image(&report.image, &stem) {
                Ok(path) => report.saved_path = Some(path),
                Err(err) => {
                    log::error!("Failed to save depth map '{}': {}.", stem, err);
                    report.save_error = Some(err);
                }
            }
        }

        if self.settings.save_to_target {
            match compositor::composite_into(&report.image, target.as_deref_mut()) {
                Ok(()) => report.composited = true,
                Err(err) => log::warn!("Depth map not composited: {}.", err),
            }
        }

        Ok(report)
    }
}
