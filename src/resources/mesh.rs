use crate::{
    data_structures::{
        model::{Mesh, TextureCache, TextureKind, Vertex},
        scene::{Node, Scene, SourceMesh},
    },
    resources::texture::{TextureLoader, load_material_textures},
};

/// Shared state while converting the meshes of one scene.
pub(crate) struct MeshBuilder<'s, 'l> {
    pub(crate) scene: &'s Scene,
    pub(crate) directory: &'s str,
    pub(crate) textures: &'s mut TextureCache,
    pub(crate) loader: &'l mut dyn TextureLoader,
}

impl MeshBuilder<'_, '_> {
    /**
     * Depth-first, pre-order: the node's own meshes in listed order, then every
     * child in listed order. The output order of meshes is this visiting order.
     */
    pub(crate) fn process_node(&mut self, node: &Node, meshes: &mut Vec<Mesh>) {
        for &index in &node.meshes {
            match self.scene.meshes.get(index) {
                Some(source) => meshes.push(self.process_mesh(source)),
                None => log::warn!(
                    "Node {} references mesh {index} but the scene only has {} meshes.",
                    node.name,
                    self.scene.meshes.len()
                ),
            }
        }
        for child in &node.children {
            self.process_node(child, meshes);
        }
    }

    pub(crate) fn process_mesh(&mut self, source: &SourceMesh) -> Mesh {
        let uvs = source.tex_coords.first();
        let vertices = source
            .positions
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                Vertex::new(
                    position,
                    source.normals.get(i).copied().unwrap_or_default(),
                    uvs.and_then(|channel| channel.get(i))
                        .copied()
                        .unwrap_or([0.0, 0.0]),
                )
            })
            .collect();

        let mut indices = Vec::with_capacity(source.indices.len());
        for face in source.faces() {
            match face {
                [a, b, c] => indices.extend_from_slice(&[*a, *b, *c]),
                [first, rest @ ..] if rest.len() > 2 => {
                    log::warn!(
                        "Mesh {} has a face with {} indices; fanning it into triangles.",
                        source.name,
                        face.len()
                    );
                    for pair in rest.windows(2) {
                        indices.extend_from_slice(&[*first, pair[0], pair[1]]);
                    }
                }
                _ => log::warn!(
                    "Mesh {} has a degenerate face with {} indices; skipping it.",
                    source.name,
                    face.len()
                ),
            }
        }

        let mut textures = Vec::new();
        if let Some(material) = source.material.and_then(|m| self.scene.materials.get(m)) {
            for kind in TextureKind::ALL {
                textures.extend(load_material_textures(
                    material,
                    kind,
                    self.scene,
                    self.directory,
                    self.textures,
                    self.loader,
                ));
            }
        }

        Mesh::new(source.name.clone(), vertices, indices, textures)
    }
}
