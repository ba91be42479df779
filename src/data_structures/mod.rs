//! Engine data structures: imported scenes, models and GPU textures.
//!
//! - `scene` is the format-neutral scene graph produced by importers
//! - `model` contains the renderable vertex, mesh, texture and model records
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod model;
pub mod scene;
pub mod texture;
