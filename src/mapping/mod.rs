// Copyright @yucwang 2026

pub mod compositor;
pub mod depth_mapper;
pub mod localised_image;
