//! Render pipelines.
//!
//! - `basic` is the flat-material Phong pipeline every primitive is drawn with
//! - `light` holds the point light uniform shared by all draws

pub mod basic;
pub mod light;

#[derive(Debug)]
pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
}
