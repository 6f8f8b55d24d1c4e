// Copyright @yucwang 2021

use crate::core::error::MappingError;
use crate::core::intersector::RayIntersector;
use crate::math::bitmap::DepthImage;
use crate::sensors::viewpoint::Viewpoint;

use super::depth::RenderSettings;

pub trait Renderer {
    fn render(&mut self,
              viewpoint: &Viewpoint,
              settings: &RenderSettings,
              intersector: &dyn RayIntersector) -> Result<DepthImage, MappingError>;

    fn describe(&self) -> String {
        String::from("Renderer")
    }
}
