// Copyright @yucwang 2021

pub mod depth;
pub mod renderer;
