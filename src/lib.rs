//! fleet-diorama
//!
//! A small cross-platform 3D diorama rendered with wgpu: an instanced
//! spaceship fleet hovering over a floor, lit by one shadow casting
//! directional light, with an orbit camera and a debug panel to tweak the
//! scene at runtime. Runs natively and on the web.
//!
//! High-level modules
//! - `app`: window setup, the event loop and the per frame render passes
//! - `camera`: orbit camera, controller and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: scene data (fleet, floor, meshes, instances, textures)
//! - `layout`: the ship manifest, placements and scene constants
//! - `panel`: the egui debug panel
//! - `pipelines`: definitions for the render pipelines (basic, cloak, shadow)
//! - `resources`: helpers to load textures/models and create GPU resources
//! - `render`: render composition for efficient pipeline reuse
//!

pub mod app;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod layout;
pub mod panel;
pub mod pipelines;
pub mod resources;
pub mod render;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
pub use wgpu::*;
