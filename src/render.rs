//! Drawing models.
//!
//! Two ways are offered:
//!
//! - [`Shader`] is the seam to an externally owned shader program. A
//!   [`Mesh`](crate::data_structures::model::Mesh) binds its textures to
//!   numbered units under the names `texture_diffuse{n}` / `texture_specular{n}`
//!   and issues one indexed draw.
//! - [`GpuModel`] uploads a model to wgpu buffers and draws it inside a
//!   [`wgpu::RenderPass`] through [`DrawMesh`].

use wgpu::util::DeviceExt;

use crate::{
    data_structures::model::{Mesh, Model, TextureId, TextureKind, Vertex},
    resources::texture::{GpuTextures, diffuse_specular_layout},
};

/// A shader program able to sample textures and draw indexed triangles.
pub trait Shader {
    /// Binds `texture` to texture unit `unit` and points the sampler uniform `sampler` at it.
    fn bind_texture(&mut self, unit: u32, sampler: &str, texture: TextureId);
    fn draw_indexed(&mut self, vertices: &[Vertex], indices: &[u32]);
}

/// A mesh resident on the GPU.
///
/// The bind group holds the mesh's first diffuse and first specular texture
/// (bindings 0..=3 of [`diffuse_specular_layout`]).
pub struct GpuMesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub bind_group: wgpu::BindGroup,
}

impl GpuMesh {
    pub fn new(
        device: &wgpu::Device,
        mesh: &Mesh,
        textures: &GpuTextures,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let first = |kind| mesh.textures_of(kind).next().map(|t| t.id);
        let diffuse = textures.get_or_default(first(TextureKind::Diffuse), TextureKind::Diffuse);
        let specular = textures.get_or_default(first(TextureKind::Specular), TextureKind::Specular);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&diffuse.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&specular.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&specular.sampler),
                },
            ],
            label: Some(&format!("{:?} Bind Group", mesh.name)),
        });

        Self {
            name: mesh.name.clone(),
            vertex_buffer,
            index_buffer,
            num_elements: mesh.indices.len() as u32,
            bind_group,
        }
    }
}

/// All meshes of a [`Model`] uploaded to the GPU, in model order.
pub struct GpuModel {
    pub meshes: Vec<GpuMesh>,
    pub layout: wgpu::BindGroupLayout,
}

impl GpuModel {
    pub fn new(device: &wgpu::Device, model: &Model, textures: &GpuTextures) -> Self {
        let layout = diffuse_specular_layout(device);
        let meshes = model
            .meshes()
            .iter()
            .map(|mesh| GpuMesh::new(device, mesh, textures, &layout))
            .collect();
        Self { meshes, layout }
    }
}

/// Draw calls for uploaded meshes. The mesh bind group goes to `group`.
pub trait DrawMesh<'a> {
    fn draw_mesh(&mut self, mesh: &'a GpuMesh, group: u32);
    fn draw_model(&mut self, model: &'a GpuModel, group: u32);
}

impl<'a, 'b> DrawMesh<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b GpuMesh, group: u32) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(group, &mesh.bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }

    fn draw_model(&mut self, model: &'b GpuModel, group: u32) {
        for mesh in &model.meshes {
            self.draw_mesh(mesh, group);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data_structures::model::Texture;

    #[derive(Default)]
    struct RecordingShader {
        bound: Vec<(u32, String, TextureId)>,
        draws: Vec<(usize, usize)>,
    }

    impl Shader for RecordingShader {
        fn bind_texture(&mut self, unit: u32, sampler: &str, texture: TextureId) {
            self.bound.push((unit, sampler.to_string(), texture));
        }

        fn draw_indexed(&mut self, vertices: &[Vertex], indices: &[u32]) {
            self.draws.push((vertices.len(), indices.len()));
        }
    }

    #[test]
    fn mesh_draw_binds_then_draws_once() {
        let mesh = Mesh::new(
            "m",
            vec![Vertex::default(); 3],
            vec![0, 1, 2],
            vec![
                Arc::new(Texture {
                    id: TextureId(4),
                    kind: TextureKind::Diffuse,
                    path: "d.png".to_string(),
                }),
                Arc::new(Texture {
                    id: TextureId::INVALID,
                    kind: TextureKind::Specular,
                    path: "s.png".to_string(),
                }),
            ],
        );
        let mut shader = RecordingShader::default();
        mesh.draw(&mut shader);
        assert_eq!(
            shader.bound,
            vec![
                (0, "texture_diffuse1".to_string(), TextureId(4)),
                (1, "texture_specular1".to_string(), TextureId::INVALID),
            ]
        );
        assert_eq!(shader.draws, vec![(3, 3)]);
    }

    #[test]
    fn empty_model_draws_nothing() {
        let mut shader = RecordingShader::default();
        Model::default().draw(&mut shader);
        assert!(shader.draws.is_empty());
        assert!(shader.bound.is_empty());
    }
}
