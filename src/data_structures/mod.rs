//! Engine data structures: geometry, models, textures and instances.
//!
//! This module contains the core data types for scene representation:
//!
//! - `model` contains CPU-side geometry, flat materials, primitives and models
//! - `texture` contains the depth texture used by the render pass
//! - `instance` holds the per-instance data written to the GPU each frame

pub mod instance;
pub mod model;
pub mod texture;
