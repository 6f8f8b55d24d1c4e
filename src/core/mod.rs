// Copyright @yucwang 2021

pub mod bvh;
pub mod encoder;
pub mod error;
pub mod intersector;
pub mod layer;
pub mod scene;
pub mod scene_loader;
pub mod shape;
