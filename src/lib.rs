//! co2-factory
//!
//! A small real-time demo built on a lightweight wgpu engine core. A factory
//! keeps emitting spinning CO2 molecules; once too many of them are in the air
//! the scene is lost and the sky fills up with molecules.
//!
//! High-level modules
//! - `camera`: camera types, controller and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: engine data models (geometry, primitives, instances, textures)
//! - `error`: typed errors for model loading and scene construction
//! - `flow`: the event loop and the [`flow::GraphicsFlow`] scene abstraction
//! - `game`: molecules, the factory scene controller and its settings
//! - `pipelines`: the flat-material render pipeline and light uniform
//! - `resources`: OBJ/glTF importers producing CPU-side geometry
//! - `render`: draw lists and instanced batches handed to the render pass
//! - `vr`: conversions between VR runtime data types and `cgmath`
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod game;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod vr;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
