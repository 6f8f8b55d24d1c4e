// Copyright @yucwang 2021

pub mod core;
pub mod io;
pub mod mapping;
pub mod math;
pub mod renderers;
pub mod sensors;
pub mod shapes;
