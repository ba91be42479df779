//! flow-model
//!
//! Loads 3D asset files (Wavefront OBJ, glTF/GLB) into renderable models and
//! provides a free-look camera to view them with. Import never aborts the
//! caller: broken files give an empty model, broken textures a placeholder id,
//! and both are reported through the `log` facade.
//!
//! High-level modules
//! - `camera`: free-look camera, controller, projection and uniforms
//! - `data_structures`: scene graph, vertices, meshes, textures and models
//! - `error`: import and texture loading errors
//! - `render`: shader seam and wgpu upload / draw helpers
//! - `resources`: importers, mesh conversion and texture loading
//!

pub mod camera;
pub mod data_structures;
pub mod error;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use data_structures::model::{Mesh, Model, Texture, TextureId, TextureKind, Vertex};
pub use resources::load_model;

/// Installs `env_logger` as the `log` backend (configured through `RUST_LOG`).
///
/// Calling this more than once is harmless.
pub fn init_logging() {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }
}
