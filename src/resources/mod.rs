//! Everything that turns asset files into models: importers, mesh
//! conversion and texture loading.

use std::path::Path;

use crate::{
    data_structures::{
        model::{Model, TextureCache},
        scene::PostProcess,
    },
    error::ImportError,
    resources::{
        import::{AssetImporter, SceneImporter},
        mesh::MeshBuilder,
        texture::{GpuTextures, TextureLoader},
    },
};

pub mod gltf;
pub mod import;
pub mod mesh;
pub mod obj;
pub mod texture;

impl Model {
    /// Imports the asset at `path`.
    ///
    /// Never fails: an unusable scene is logged and yields an empty model that
    /// renders nothing. Texture failures are logged and leave placeholder ids.
    pub fn load(path: &str, importer: &dyn SceneImporter, loader: &mut dyn TextureLoader) -> Self {
        match Self::try_load(path, importer, loader) {
            Ok(model) => model,
            Err(e) => {
                log::error!("Model {path} could not be imported: {e}");
                Model::default()
            }
        }
    }

    /// Like [`Model::load`] but hands the import error to the caller.
    pub fn try_load(
        path: &str,
        importer: &dyn SceneImporter,
        loader: &mut dyn TextureLoader,
    ) -> Result<Self, ImportError> {
        let scene = importer
            .import(Path::new(path), PostProcess::MODEL)
            .map_err(|e| ImportError::NoScene(format!("{e:#}")))?;
        if scene.incomplete {
            return Err(ImportError::Incomplete);
        }
        let root = scene.root.as_ref().ok_or(ImportError::MissingRoot)?;

        let directory = base_directory(path).to_string();
        let mut textures = TextureCache::default();
        let mut meshes = Vec::with_capacity(root.mesh_reference_count());
        MeshBuilder {
            scene: &scene,
            directory: &directory,
            textures: &mut textures,
            loader,
        }
        .process_node(root, &mut meshes);

        log::info!(
            "Loaded model {path}: {} meshes, {} textures",
            meshes.len(),
            textures.len()
        );
        Ok(Model {
            meshes,
            textures,
            directory,
        })
    }
}

/// Everything before the last `/` of `path`, or `""` when there is none.
///
/// A file directly below the file system root keeps the root as `"/"`.
pub fn base_directory(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(i) => &path[..i],
        None => "",
    }
}

/// Imports `file_name` with the default importer and uploads its textures.
///
/// The returned [`GpuTextures`] owns the uploaded images the model's texture
/// ids refer to and must outlive any rendering of the model.
pub fn load_model(file_name: &str, device: &wgpu::Device, queue: &wgpu::Queue) -> (Model, GpuTextures) {
    let mut textures = GpuTextures::new(device, queue);
    let model = Model::load(file_name, &AssetImporter, &mut textures);
    (model, textures)
}
