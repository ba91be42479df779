//! Renderable model data: vertices, meshes and shared texture records.
//!
//! A [`Model`] is produced once by [`Model::load`] and is read-only
//! afterwards. Its meshes reference textures through [`Arc`] handles into the
//! model-wide texture cache, so two meshes using the same image file share a
//! single [`Texture`].

use std::{collections::HashMap, sync::Arc};

use crate::render::Shader;

/// Interleaved vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
        }
    }

    /**
     * Layout of a vertex in the vertex buffer:
     *
     * location 0: position, location 1: normal, location 2: texture coordinates
     */
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Semantic role of a texture on a material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
}

impl TextureKind {
    /// Kinds in the order their textures are attached to a mesh.
    pub const ALL: [TextureKind; 2] = [TextureKind::Diffuse, TextureKind::Specular];

    /// Sampler name prefix expected by model shaders.
    pub fn uniform_prefix(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
        }
    }
}

/// Opaque handle issued by a [`TextureLoader`](crate::resources::texture::TextureLoader).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

impl TextureId {
    /// Placeholder for textures that failed to load.
    pub const INVALID: TextureId = TextureId(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// A loaded texture: its handle, its role and the reference it was loaded from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    pub id: TextureId,
    pub kind: TextureKind,
    /// The material's texture reference, used as the cache key.
    pub path: String,
}

/// Triangle mesh with the textures it is drawn with.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    /// Triangle list; always a multiple of three long.
    pub indices: Vec<u32>,
    /// Diffuse textures first, then specular ones.
    pub textures: Vec<Arc<Texture>>,
}

impl Mesh {
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        textures: Vec<Arc<Texture>>,
    ) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
            textures,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterates the textures of one kind, in attach order.
    pub fn textures_of(&self, kind: TextureKind) -> impl Iterator<Item = &Arc<Texture>> {
        self.textures.iter().filter(move |t| t.kind == kind)
    }

    /// Sampler name for every texture, paired with the texture unit it binds to.
    ///
    /// Units count from 0 over the whole texture list, names count from 1 per
    /// kind: `texture_diffuse1`, `texture_diffuse2`, `texture_specular1`, ...
    pub fn sampler_bindings(&self) -> Vec<(u32, String, TextureId)> {
        let mut counters: HashMap<TextureKind, u32> = HashMap::new();
        self.textures
            .iter()
            .enumerate()
            .map(|(unit, texture)| {
                let n = counters.entry(texture.kind).or_insert(0);
                *n += 1;
                let name = format!("{}{}", texture.kind.uniform_prefix(), n);
                (unit as u32, name, texture.id)
            })
            .collect()
    }

    /// Binds the textures to their sampler slots and issues one indexed draw.
    pub fn draw<S: Shader + ?Sized>(&self, shader: &mut S) {
        for (unit, name, id) in self.sampler_bindings() {
            shader.bind_texture(unit, &name, id);
        }
        shader.draw_indexed(&self.vertices, &self.indices);
    }
}

/// Path-keyed cache of loaded textures, in load order.
#[derive(Clone, Debug, Default)]
pub struct TextureCache {
    loaded: Vec<Arc<Texture>>,
    by_path: HashMap<String, usize>,
}

impl TextureCache {
    pub fn get(&self, path: &str) -> Option<&Arc<Texture>> {
        self.by_path.get(path).map(|&i| &self.loaded[i])
    }

    /// Inserts a texture unless its path is already cached. Returns the cached entry.
    pub fn insert(&mut self, texture: Texture) -> Arc<Texture> {
        if let Some(existing) = self.get(&texture.path) {
            return existing.clone();
        }
        let texture = Arc::new(texture);
        self.by_path.insert(texture.path.clone(), self.loaded.len());
        self.loaded.push(texture.clone());
        texture
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Texture>> {
        self.loaded.iter()
    }
}

/// All meshes of one asset file plus the textures they share.
#[derive(Clone, Debug, Default)]
pub struct Model {
    pub(crate) meshes: Vec<Mesh>,
    pub(crate) textures: TextureCache,
    pub(crate) directory: String,
}

impl Model {
    /// Meshes in depth-first pre-order of the source node tree.
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    /// Directory texture references were resolved against.
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// `true` when the model carries no geometry, e.g. after a failed import.
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn draw<S: Shader + ?Sized>(&self, shader: &mut S) {
        for mesh in &self.meshes {
            mesh.draw(shader);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(id: u32, kind: TextureKind, path: &str) -> Texture {
        Texture {
            id: TextureId(id),
            kind,
            path: path.to_string(),
        }
    }

    #[test]
    fn vertex_layout_matches_struct_size() {
        assert_eq!(
            Vertex::desc().array_stride,
            std::mem::size_of::<Vertex>() as wgpu::BufferAddress
        );
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn cache_keeps_first_entry_per_path() {
        let mut cache = TextureCache::default();
        let first = cache.insert(texture(1, TextureKind::Diffuse, "wood.png"));
        let second = cache.insert(texture(7, TextureKind::Specular, "wood.png"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.id, TextureId(1));
        assert_eq!(second.kind, TextureKind::Diffuse);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_keys_are_not_normalised() {
        let mut cache = TextureCache::default();
        cache.insert(texture(1, TextureKind::Diffuse, "wood.png"));
        cache.insert(texture(2, TextureKind::Diffuse, "./wood.png"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn sampler_names_count_per_kind() {
        let mesh = Mesh::new(
            "m",
            Vec::new(),
            Vec::new(),
            vec![
                Arc::new(texture(1, TextureKind::Diffuse, "a.png")),
                Arc::new(texture(2, TextureKind::Diffuse, "b.png")),
                Arc::new(texture(3, TextureKind::Specular, "c.png")),
            ],
        );
        let bindings = mesh.sampler_bindings();
        assert_eq!(
            bindings,
            vec![
                (0, "texture_diffuse1".to_string(), TextureId(1)),
                (1, "texture_diffuse2".to_string(), TextureId(2)),
                (2, "texture_specular1".to_string(), TextureId(3)),
            ]
        );
    }

    #[test]
    fn invalid_id_is_not_valid() {
        assert!(!TextureId::INVALID.is_valid());
        assert!(TextureId(3).is_valid());
    }
}
