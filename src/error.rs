//! Recoverable errors of the model import pipeline.
//!
//! Neither error aborts the caller: [`ImportError`] leaves an empty
//! [`Model`](crate::data_structures::model::Model) behind and
//! [`TextureLoadError`] leaves a placeholder texture id.

use thiserror::Error;

/// The importer could not produce a usable scene.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The importer returned no scene at all. Carries the importer's message.
    #[error("importer returned no scene: {0}")]
    NoScene(String),
    /// The scene is flagged incomplete (e.g. it contains no meshes).
    #[error("scene is flagged incomplete")]
    Incomplete,
    #[error("scene has no root node")]
    MissingRoot,
}

/// A single texture could not be turned into a texture id.
#[derive(Debug, Error)]
pub enum TextureLoadError {
    #[error("failed to read texture file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode texture {path}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    /// A `*N` reference pointed at an embedded image the scene does not have.
    #[error("scene has no embedded image for reference {0}")]
    MissingEmbedded(String),
}
