use std::path::Path;

use anyhow::anyhow;

use crate::{
    data_structures::scene::{PostProcess, Scene},
    resources::{gltf::GltfImporter, obj::ObjImporter},
};

/// Parses an asset file into a [`Scene`].
///
/// An `Err` means no scene could be produced at all; its message is reported
/// by the model loader. A scene that was parsed but is unusable should be
/// returned with [`Scene::incomplete`] set or without a root node instead.
pub trait SceneImporter {
    fn import(&self, path: &Path, flags: PostProcess) -> anyhow::Result<Scene>;
}

/// Picks the backend by file extension: `.obj`, `.gltf` and `.glb`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AssetImporter;

impl SceneImporter for AssetImporter {
    fn import(&self, path: &Path, flags: PostProcess) -> anyhow::Result<Scene> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "obj" => ObjImporter.import(path, flags),
            "gltf" | "glb" => GltfImporter.import(path, flags),
            _ => Err(anyhow!(
                "unsupported file format '{}' for {}",
                extension,
                path.display()
            )),
        }
    }
}
