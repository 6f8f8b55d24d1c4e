// Copyright @yucwang 2026

pub mod spherical;
pub mod viewpoint;
