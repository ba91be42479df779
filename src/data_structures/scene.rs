//! Imported scene graph as handed over by a [`SceneImporter`](crate::resources::import::SceneImporter).
//!
//! A [`Scene`] is a transient, format-neutral view of an asset file: a node
//! tree referencing meshes by index, raw mesh attributes and material texture
//! references. The model loader only borrows it while walking the tree and
//! drops it once the [`Model`](crate::data_structures::model::Model) is built.
//!
//! Texture coordinates are stored with a bottom-left origin (the OBJ
//! convention). Backends reading top-left formats convert before returning.

use crate::data_structures::model::TextureKind;

/// Post-processing applied by the importer before the scene is returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PostProcess {
    /// Split every polygon into triangles.
    pub triangulate: bool,
    /// Mirror the V texture axis (`v' = 1 - v`).
    pub flip_uvs: bool,
}

impl PostProcess {
    /// The fixed flags used for model loading.
    pub const MODEL: Self = Self {
        triangulate: true,
        flip_uvs: true,
    };
}

impl Default for PostProcess {
    fn default() -> Self {
        Self::MODEL
    }
}

/// A node of the imported scene graph.
#[derive(Clone, Debug, Default)]
pub struct Node {
    pub name: String,
    /// Indices into [`Scene::meshes`], in listed order.
    pub meshes: Vec<usize>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_meshes(mut self, meshes: impl IntoIterator<Item = usize>) -> Self {
        self.meshes.extend(meshes);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Number of mesh references held by this node and all its descendants.
    pub fn mesh_reference_count(&self) -> usize {
        self.meshes.len()
            + self
                .children
                .iter()
                .map(Node::mesh_reference_count)
                .sum::<usize>()
    }
}

/// Raw geometry of one mesh.
#[derive(Clone, Debug, Default)]
pub struct SourceMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    /// Either empty or one normal per position.
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinate channels; each channel has one entry per position.
    pub tex_coords: Vec<Vec<[f32; 2]>>,
    pub indices: Vec<u32>,
    /// Vertex count per face. Empty means every face is a triangle.
    pub face_arities: Vec<u32>,
    pub material: Option<usize>,
}

impl SourceMesh {
    /// Iterates the faces as index slices, in source order.
    pub fn faces(&self) -> Faces<'_> {
        Faces {
            indices: &self.indices,
            arities: &self.face_arities,
            face: 0,
        }
    }
}

pub struct Faces<'a> {
    indices: &'a [u32],
    arities: &'a [u32],
    face: usize,
}

impl<'a> Iterator for Faces<'a> {
    type Item = &'a [u32];

    fn next(&mut self) -> Option<Self::Item> {
        let arity = if self.arities.is_empty() {
            3
        } else {
            *self.arities.get(self.face)? as usize
        };
        if self.indices.len() < arity {
            return None;
        }
        let (face, rest) = self.indices.split_at(arity);
        self.indices = rest;
        self.face += 1;
        Some(face)
    }
}

/// Texture references of a material, per kind, in the material's order.
///
/// A reference is either a path relative to the asset's directory or `*N`
/// naming the `N`th [`EmbeddedImage`] of the scene.
#[derive(Clone, Debug, Default)]
pub struct SourceMaterial {
    pub name: String,
    pub diffuse: Vec<String>,
    pub specular: Vec<String>,
}

impl SourceMaterial {
    pub fn textures(&self, kind: TextureKind) -> &[String] {
        match kind {
            TextureKind::Diffuse => &self.diffuse,
            TextureKind::Specular => &self.specular,
        }
    }
}

/// Image bytes stored inside the asset file itself (e.g. a GLB buffer view).
#[derive(Clone, Debug)]
pub struct EmbeddedImage {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub root: Option<Node>,
    pub meshes: Vec<SourceMesh>,
    pub materials: Vec<SourceMaterial>,
    pub images: Vec<EmbeddedImage>,
    /// Set when the importer could not produce a complete scene.
    pub incomplete: bool,
}

impl Scene {
    /// Embedded image addressed by a `*N` texture reference.
    pub fn embedded(&self, reference: &str) -> Option<&EmbeddedImage> {
        let index = reference.strip_prefix('*')?.parse::<usize>().ok()?;
        self.images.get(index)
    }

    /// Mirrors the V axis of every texture coordinate channel.
    pub fn flip_uvs(&mut self) {
        for mesh in &mut self.meshes {
            for channel in &mut mesh.tex_coords {
                for uv in channel.iter_mut() {
                    uv[1] = 1.0 - uv[1];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faces_default_to_triangles() {
        let mesh = SourceMesh {
            indices: vec![0, 1, 2, 2, 3, 0],
            ..Default::default()
        };
        let faces: Vec<&[u32]> = mesh.faces().collect();
        assert_eq!(faces, vec![&[0, 1, 2][..], &[2, 3, 0][..]]);
    }

    #[test]
    fn faces_follow_arities() {
        let mesh = SourceMesh {
            indices: vec![0, 1, 2, 3, 4, 5, 6],
            face_arities: vec![4, 3],
            ..Default::default()
        };
        let faces: Vec<&[u32]> = mesh.faces().collect();
        assert_eq!(faces, vec![&[0, 1, 2, 3][..], &[4, 5, 6][..]]);
    }

    #[test]
    fn embedded_reference_lookup() {
        let scene = Scene {
            images: vec![EmbeddedImage {
                bytes: vec![1, 2, 3],
                mime_type: None,
            }],
            ..Default::default()
        };
        assert!(scene.embedded("*0").is_some());
        assert!(scene.embedded("*1").is_none());
        assert!(scene.embedded("0").is_none());
        assert!(scene.embedded("textures/wood.png").is_none());
    }

    #[test]
    fn mesh_references_are_counted_through_the_tree() {
        let root = Node::new("root")
            .with_meshes([0])
            .with_child(Node::new("a").with_meshes([1, 2]))
            .with_child(Node::new("b").with_child(Node::new("c").with_meshes([0])));
        assert_eq!(root.mesh_reference_count(), 4);
    }
}
