#![allow(dead_code)]

use std::sync::Arc;

use flow_model::{Mesh, Texture, TextureKind};

pub const HUT: &str = "tests/fixtures/hut/hut.obj";
pub const TOWER: &str = "tests/fixtures/tower/tower.gltf";
pub const BANNER: &str = "tests/fixtures/banner/banner.gltf";

pub fn setup() {
    flow_model::init_logging();
}

/// `(path, kind)` of every texture attached to `mesh`, in attachment order.
pub fn texture_paths(mesh: &Mesh) -> Vec<(&str, TextureKind)> {
    mesh.textures.iter().map(|t| (t.path.as_str(), t.kind)).collect()
}

pub fn find<'m>(meshes: &'m [Mesh], name: &str) -> &'m Mesh {
    meshes
        .iter()
        .find(|m| m.name == name)
        .unwrap_or_else(|| panic!("no mesh named {name}"))
}

pub fn same_texture(a: &Arc<Texture>, b: &Arc<Texture>) -> bool {
    Arc::ptr_eq(a, b) && a.id == b.id
}

#[cfg(feature = "integration-tests")]
pub async fn headless_device() -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await?;
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("test device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
        })
        .await?;
    Ok((device, queue))
}
