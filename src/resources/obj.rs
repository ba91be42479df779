//! Wavefront OBJ/MTL import through `tobj`.

use std::path::Path;

use anyhow::Context;

use crate::{
    data_structures::scene::{Node, PostProcess, Scene, SourceMaterial, SourceMesh},
    resources::import::SceneImporter,
};

/// Imports OBJ files. Every object becomes one mesh on its own child of the root node.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjImporter;

impl SceneImporter for ObjImporter {
    fn import(&self, path: &Path, flags: PostProcess) -> anyhow::Result<Scene> {
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: flags.triangulate,
                single_index: true,
                ignore_points: true,
                ignore_lines: true,
                ..Default::default()
            },
        )
        .with_context(|| format!("failed to parse OBJ file {}", path.display()))?;

        // A broken or missing .mtl leaves the geometry usable.
        let materials = match materials {
            Ok(materials) => materials,
            Err(e) => {
                log::warn!("Materials of {} could not be loaded: {e}", path.display());
                Vec::new()
            }
        };

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("obj");
        let mut root = Node::new(name);
        let mut meshes = Vec::with_capacity(models.len());
        for model in &models {
            // tobj reports an `unnamed_object` even for files without faces
            if model.mesh.indices.is_empty() {
                log::debug!("Skipping object {} of {}: no faces", model.name, path.display());
                continue;
            }
            root.children
                .push(Node::new(model.name.as_str()).with_meshes([meshes.len()]));
            meshes.push(convert_mesh(model));
        }

        let mut scene = Scene {
            incomplete: meshes.is_empty(),
            root: Some(root),
            meshes,
            materials: materials.iter().map(convert_material).collect(),
            images: Vec::new(),
        };
        if flags.flip_uvs {
            scene.flip_uvs();
        }
        Ok(scene)
    }
}

fn convert_mesh(model: &tobj::Model) -> SourceMesh {
    let mesh = &model.mesh;
    let vertex_count = mesh.positions.len() / 3;

    let positions = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();
    let normals = if mesh.normals.len() >= vertex_count * 3 && !mesh.normals.is_empty() {
        mesh.normals
            .chunks_exact(3)
            .take(vertex_count)
            .map(|n| [n[0], n[1], n[2]])
            .collect()
    } else {
        Vec::new()
    };
    let tex_coords = if mesh.texcoords.len() >= vertex_count * 2 && !mesh.texcoords.is_empty() {
        vec![
            mesh.texcoords
                .chunks_exact(2)
                .take(vertex_count)
                .map(|t| [t[0], t[1]])
                .collect(),
        ]
    } else {
        Vec::new()
    };

    SourceMesh {
        name: model.name.clone(),
        positions,
        normals,
        tex_coords,
        indices: mesh.indices.clone(),
        face_arities: mesh.face_arities.clone(),
        material: mesh.material_id,
    }
}

fn convert_material(material: &tobj::Material) -> SourceMaterial {
    SourceMaterial {
        name: material.name.clone(),
        diffuse: material.diffuse_texture.iter().cloned().collect(),
        specular: material.specular_texture.iter().cloned().collect(),
    }
}
