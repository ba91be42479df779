use std::{borrow::Cow, path::Path, sync::Arc};

use crate::{
    data_structures::{
        model::{Texture, TextureCache, TextureId, TextureKind},
        scene::{Scene, SourceMaterial},
        texture::GpuTexture,
    },
    error::TextureLoadError,
};

/// Where the pixels of a texture come from.
#[derive(Clone, Copy, Debug)]
pub enum TextureSource<'a> {
    /// An image file, already resolved against the model's directory.
    File(&'a Path),
    /// Image bytes stored inside the asset file.
    Embedded {
        label: &'a str,
        bytes: &'a [u8],
        mime_type: Option<&'a str>,
    },
}

impl TextureSource<'_> {
    pub fn label(&self) -> String {
        match self {
            TextureSource::File(path) => path.display().to_string(),
            TextureSource::Embedded { label, .. } => label.to_string(),
        }
    }

    /// Reads the encoded image bytes of the source.
    pub fn bytes(&self) -> Result<Cow<'_, [u8]>, TextureLoadError> {
        match self {
            TextureSource::File(path) => read_binary(path).map(Cow::Owned),
            TextureSource::Embedded { bytes, .. } => Ok(Cow::Borrowed(*bytes)),
        }
    }

    fn mime_type(&self) -> Option<&str> {
        match self {
            TextureSource::File(_) => None,
            TextureSource::Embedded { mime_type, .. } => *mime_type,
        }
    }
}

/// Turns image sources into texture ids.
///
/// Ids handed out by a loader must differ from [`TextureId::INVALID`].
pub trait TextureLoader {
    fn load(
        &mut self,
        source: TextureSource<'_>,
        kind: TextureKind,
    ) -> Result<TextureId, TextureLoadError>;
}

pub fn read_binary(path: &Path) -> Result<Vec<u8>, TextureLoadError> {
    std::fs::read(path).map_err(|source| TextureLoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn decode(source: &TextureSource<'_>) -> Result<image::DynamicImage, TextureLoadError> {
    let bytes = source.bytes()?;
    let decode_error = |e| TextureLoadError::Decode {
        path: source.label(),
        source: e,
    };
    match source.mime_type().and_then(image::ImageFormat::from_mime_type) {
        Some(format) => image::load_from_memory_with_format(&bytes, format).map_err(decode_error),
        None => image::load_from_memory(&bytes).map_err(decode_error),
    }
}

fn next_id(len: usize) -> TextureId {
    TextureId(len as u32 + 1)
}

fn index_of(id: TextureId) -> Option<usize> {
    id.0.checked_sub(1).map(|i| i as usize)
}

/// RGBA8 pixels of a texture decoded on the CPU.
#[derive(Clone, Debug)]
pub struct DecodedTexture {
    pub kind: TextureKind,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Texture loader that decodes images into memory without touching the GPU.
///
/// Useful for headless tools and for handing pixel data to a renderer later.
#[derive(Debug, Default)]
pub struct ImageTextures {
    textures: Vec<DecodedTexture>,
}

impl ImageTextures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TextureId) -> Option<&DecodedTexture> {
        self.textures.get(index_of(id)?)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl TextureLoader for ImageTextures {
    fn load(
        &mut self,
        source: TextureSource<'_>,
        kind: TextureKind,
    ) -> Result<TextureId, TextureLoadError> {
        let rgba = decode(&source)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("Decoded {kind:?} texture {} ({width}x{height})", source.label());
        let id = next_id(self.textures.len());
        self.textures.push(DecodedTexture {
            kind,
            width,
            height,
            rgba: rgba.into_raw(),
        });
        Ok(id)
    }
}

/// Texture loader that uploads every image to the GPU.
///
/// Keeps the uploaded textures alive and resolves ids back to them. Invalid or
/// unknown ids resolve to a 1x1 placeholder: white for diffuse, black for specular.
#[derive(Debug)]
pub struct GpuTextures {
    device: wgpu::Device,
    queue: wgpu::Queue,
    textures: Vec<GpuTexture>,
    white: GpuTexture,
    black: GpuTexture,
}

impl GpuTextures {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            white: GpuTexture::solid([255, 255, 255, 255], "default diffuse", device, queue),
            black: GpuTexture::solid([0, 0, 0, 255], "default specular", device, queue),
            device: device.clone(),
            queue: queue.clone(),
            textures: Vec::new(),
        }
    }

    pub fn get(&self, id: TextureId) -> Option<&GpuTexture> {
        self.textures.get(index_of(id)?)
    }

    pub fn get_or_default(&self, id: Option<TextureId>, kind: TextureKind) -> &GpuTexture {
        match id.and_then(|id| self.get(id)) {
            Some(texture) => texture,
            None => match kind {
                TextureKind::Diffuse => &self.white,
                TextureKind::Specular => &self.black,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl TextureLoader for GpuTextures {
    fn load(
        &mut self,
        source: TextureSource<'_>,
        kind: TextureKind,
    ) -> Result<TextureId, TextureLoadError> {
        let img = decode(&source)?;
        // Specular maps hold intensities, not colours.
        let is_linear = kind == TextureKind::Specular;
        let label = source.label();
        let texture =
            GpuTexture::from_image(&self.device, &self.queue, &img, Some(&label), is_linear);
        let id = next_id(self.textures.len());
        self.textures.push(texture);
        Ok(id)
    }
}

/// Bind group layout of a model mesh: diffuse texture + sampler, specular texture + sampler.
pub fn diffuse_specular_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("Model texture_bind_group_layout"),
    })
}

/// Resolves every texture of `kind` on `material`, in the material's order.
///
/// Each reference is looked up in `cache` first. On a miss the texture is
/// loaded through `loader` and cached, even when loading fails: a failed
/// texture is cached with [`TextureId::INVALID`] so it is not retried.
pub fn load_material_textures(
    material: &SourceMaterial,
    kind: TextureKind,
    scene: &Scene,
    directory: &str,
    cache: &mut TextureCache,
    loader: &mut dyn TextureLoader,
) -> Vec<Arc<Texture>> {
    material
        .textures(kind)
        .iter()
        .map(|reference| {
            if let Some(texture) = cache.get(reference) {
                return texture.clone();
            }
            let id = match load_reference(reference, kind, scene, directory, loader) {
                Ok(id) => id,
                Err(e) => {
                    log::warn!(
                        "Texture {reference} of material {} could not be loaded: {e}",
                        material.name
                    );
                    TextureId::INVALID
                }
            };
            cache.insert(Texture {
                id,
                kind,
                path: reference.clone(),
            })
        })
        .collect()
}

fn load_reference(
    reference: &str,
    kind: TextureKind,
    scene: &Scene,
    directory: &str,
    loader: &mut dyn TextureLoader,
) -> Result<TextureId, TextureLoadError> {
    if reference.starts_with('*') {
        let image = scene
            .embedded(reference)
            .ok_or_else(|| TextureLoadError::MissingEmbedded(reference.to_string()))?;
        return loader.load(
            TextureSource::Embedded {
                label: reference,
                bytes: &image.bytes,
                mime_type: image.mime_type.as_deref(),
            },
            kind,
        );
    }
    let path = resolve_path(directory, reference);
    loader.load(TextureSource::File(Path::new(&path)), kind)
}

/// `{directory}/{reference}`, or the bare reference when there is no directory.
pub fn resolve_path(directory: &str, reference: &str) -> String {
    if directory.is_empty() {
        reference.to_string()
    } else if directory.ends_with('/') {
        format!("{directory}{reference}")
    } else {
        format!("{directory}/{reference}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::scene::EmbeddedImage;

    #[derive(Default)]
    struct CountingLoader {
        loaded: Vec<String>,
    }

    impl TextureLoader for CountingLoader {
        fn load(
            &mut self,
            source: TextureSource<'_>,
            _: TextureKind,
        ) -> Result<TextureId, TextureLoadError> {
            self.loaded.push(source.label());
            Ok(TextureId(self.loaded.len() as u32 + 100))
        }
    }

    fn material(diffuse: &[&str], specular: &[&str]) -> SourceMaterial {
        SourceMaterial {
            name: "mat".to_string(),
            diffuse: diffuse.iter().map(|s| s.to_string()).collect(),
            specular: specular.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn paths_resolve_against_directory() {
        assert_eq!(resolve_path("assets/hut", "wood.png"), "assets/hut/wood.png");
        assert_eq!(resolve_path("", "wood.png"), "wood.png");
        assert_eq!(resolve_path("/", "wood.png"), "/wood.png");
    }

    #[test]
    fn repeated_reference_is_loaded_once() {
        let scene = Scene::default();
        let mut cache = TextureCache::default();
        let mut loader = CountingLoader::default();
        let mat = material(&["wood.png", "wood.png"], &[]);

        let textures = load_material_textures(
            &mat,
            TextureKind::Diffuse,
            &scene,
            "dir",
            &mut cache,
            &mut loader,
        );
        assert_eq!(textures.len(), 2);
        assert!(Arc::ptr_eq(&textures[0], &textures[1]));
        assert_eq!(loader.loaded, vec!["dir/wood.png".to_string()]);
    }

    #[test]
    fn failed_texture_gets_placeholder_and_is_not_retried() {
        struct Failing(u32);
        impl TextureLoader for Failing {
            fn load(
                &mut self,
                source: TextureSource<'_>,
                _: TextureKind,
            ) -> Result<TextureId, TextureLoadError> {
                self.0 += 1;
                Err(TextureLoadError::MissingEmbedded(source.label()))
            }
        }

        let scene = Scene::default();
        let mut cache = TextureCache::default();
        let mut loader = Failing(0);
        let mat = material(&[], &["missing.png"]);
        for _ in 0..2 {
            let textures = load_material_textures(
                &mat,
                TextureKind::Specular,
                &scene,
                "",
                &mut cache,
                &mut loader,
            );
            assert_eq!(textures[0].id, TextureId::INVALID);
            assert_eq!(textures[0].kind, TextureKind::Specular);
        }
        assert_eq!(loader.0, 1);
    }

    #[test]
    fn embedded_references_use_scene_images() {
        let scene = Scene {
            images: vec![EmbeddedImage {
                bytes: vec![0u8; 4],
                mime_type: Some("image/png".to_string()),
            }],
            ..Default::default()
        };
        let mut cache = TextureCache::default();
        let mut loader = CountingLoader::default();
        let mat = material(&["*0", "*3"], &[]);
        let textures = load_material_textures(
            &mat,
            TextureKind::Diffuse,
            &scene,
            "dir",
            &mut cache,
            &mut loader,
        );
        assert_eq!(loader.loaded, vec!["*0".to_string()]);
        assert!(textures[0].id.is_valid());
        assert_eq!(textures[1].id, TextureId::INVALID);
    }

    #[test]
    fn image_textures_decode_and_hand_out_ids() {
        let mut png = Vec::new();
        image::RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .expect("encode png");

        let mut textures = ImageTextures::new();
        let id = textures
            .load(
                TextureSource::Embedded {
                    label: "*0",
                    bytes: &png,
                    mime_type: Some("image/png"),
                },
                TextureKind::Diffuse,
            )
            .expect("decode png");
        assert!(id.is_valid());
        let decoded = textures.get(id).expect("texture stored");
        assert_eq!((decoded.width, decoded.height), (2, 3));
        assert_eq!(&decoded.rgba[..4], &[10, 20, 30, 255]);
        assert!(textures.get(TextureId::INVALID).is_none());
    }

    #[test]
    fn image_textures_report_missing_files() {
        let mut textures = ImageTextures::new();
        let err = textures
            .load(
                TextureSource::File(Path::new("definitely/not/here.png")),
                TextureKind::Diffuse,
            )
            .unwrap_err();
        assert!(matches!(err, TextureLoadError::Io { .. }));
        assert!(textures.is_empty());
    }
}
