//! glTF 2.0 / GLB import through the `gltf` crate.
//!
//! Every primitive becomes its own [`SourceMesh`]; a node referencing a glTF
//! mesh references all of that mesh's primitives. The scene's root nodes hang
//! below a synthetic root node.

use std::path::Path;

use anyhow::Context;
use base64::{Engine, engine::general_purpose::STANDARD};

use crate::data_structures::scene::{
    EmbeddedImage, Node, PostProcess, Scene, SourceMaterial, SourceMesh,
};
use crate::resources::import::SceneImporter;

#[derive(Clone, Copy, Debug, Default)]
pub struct GltfImporter;

impl SceneImporter for GltfImporter {
    fn import(&self, path: &Path, flags: PostProcess) -> anyhow::Result<Scene> {
        let gltf::Gltf { document, blob } = gltf::Gltf::open(path)
            .with_context(|| format!("failed to parse glTF file {}", path.display()))?;
        let buffers = gltf::import_buffers(&document, path.parent(), blob)
            .with_context(|| format!("failed to load buffers of {}", path.display()))?;

        // glTF mesh index -> indices of its converted primitives
        let mut primitives_of = Vec::new();
        let mut meshes = Vec::new();
        for mesh in document.meshes() {
            let mut converted = Vec::new();
            for primitive in mesh.primitives() {
                match convert_primitive(&mesh, &primitive, &buffers) {
                    Ok(source) => {
                        converted.push(meshes.len());
                        meshes.push(source);
                    }
                    Err(Skipped::NoPositions) => log::warn!(
                        "Skipping primitive {} of mesh {:?}: no POSITION attribute",
                        primitive.index(),
                        mesh.name()
                    ),
                    Err(Skipped::NotTriangles(mode)) => log::warn!(
                        "Skipping primitive {} of mesh {:?}: {mode:?} cannot be triangulated",
                        primitive.index(),
                        mesh.name()
                    ),
                }
            }
            primitives_of.push(converted);
        }

        let images = document
            .images()
            .map(|image| match image.source() {
                gltf::image::Source::View { view, mime_type } => {
                    let bytes = buffers
                        .get(view.buffer().index())
                        .and_then(|data| data.0.get(view.offset()..view.offset() + view.length()))
                        .map(<[u8]>::to_vec)
                        .unwrap_or_default();
                    EmbeddedImage {
                        bytes,
                        mime_type: Some(mime_type.to_string()),
                    }
                }
                gltf::image::Source::Uri { uri, mime_type } => match parse_data_uri(uri) {
                    Some(Ok((data_mime, bytes))) => EmbeddedImage {
                        bytes,
                        mime_type: mime_type.or(data_mime).map(str::to_string),
                    },
                    Some(Err(e)) => {
                        // left empty, loading it fails and the slot gets a placeholder
                        log::warn!("Image {} has an undecodable data URI: {e}", image.index());
                        EmbeddedImage {
                            bytes: Vec::new(),
                            mime_type: mime_type.map(str::to_string),
                        }
                    }
                    None => EmbeddedImage {
                        bytes: Vec::new(),
                        mime_type: mime_type.map(str::to_string),
                    },
                },
            })
            .collect();

        let materials = document.materials().map(convert_material).collect();

        let root = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .map(|scene| {
                let mut root = Node::new(scene.name().unwrap_or("scene"));
                root.children = scene
                    .nodes()
                    .map(|node| convert_node(&node, &primitives_of))
                    .collect();
                root
            });

        let mut scene = Scene {
            incomplete: meshes.is_empty(),
            root,
            meshes,
            materials,
            images,
        };
        // glTF puts the UV origin top-left; bring it to the bottom-left convention
        // first so that the requested flip means the same for every format.
        scene.flip_uvs();
        if flags.flip_uvs {
            scene.flip_uvs();
        }
        Ok(scene)
    }
}

fn convert_node(node: &gltf::Node, primitives_of: &[Vec<usize>]) -> Node {
    let meshes = node
        .mesh()
        .and_then(|mesh| primitives_of.get(mesh.index()))
        .cloned()
        .unwrap_or_default();
    Node {
        name: node.name().unwrap_or("node").to_string(),
        meshes,
        children: node
            .children()
            .map(|child| convert_node(&child, primitives_of))
            .collect(),
    }
}

/// Why a primitive did not become a mesh.
#[derive(Debug, PartialEq)]
enum Skipped {
    NoPositions,
    NotTriangles(gltf::mesh::Mode),
}

fn convert_primitive(
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
) -> Result<SourceMesh, Skipped> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or(Skipped::NoPositions)?
        .collect();
    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|n| n.collect())
        .unwrap_or_default();
    let tex_coords: Vec<Vec<[f32; 2]>> = reader
        .read_tex_coords(0)
        .map(|t| vec![t.into_f32().collect()])
        .unwrap_or_default();
    let raw: Vec<u32> = reader
        .read_indices()
        .map(|i| i.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    let indices =
        triangle_list(primitive.mode(), &raw).ok_or(Skipped::NotTriangles(primitive.mode()))?;

    Ok(SourceMesh {
        name: mesh.name().unwrap_or("mesh").to_string(),
        positions,
        normals,
        tex_coords,
        indices,
        face_arities: Vec::new(),
        material: primitive.material().index(),
    })
}

/// Converts the index stream of a primitive into a triangle list.
///
/// Returns `None` for point and line primitives.
fn triangle_list(mode: gltf::mesh::Mode, indices: &[u32]) -> Option<Vec<u32>> {
    use gltf::mesh::Mode;
    match mode {
        Mode::Triangles => Some(indices[..indices.len() - indices.len() % 3].to_vec()),
        Mode::TriangleStrip => Some(
            indices
                .windows(3)
                .enumerate()
                .flat_map(|(i, w)| {
                    // keep the winding consistent on every other triangle
                    if i % 2 == 0 {
                        [w[0], w[1], w[2]]
                    } else {
                        [w[1], w[0], w[2]]
                    }
                })
                .collect(),
        ),
        Mode::TriangleFan => Some(match indices.split_first() {
            Some((&first, rest)) => rest
                .windows(2)
                .flat_map(|w| [first, w[0], w[1]])
                .collect(),
            None => Vec::new(),
        }),
        Mode::Points | Mode::Lines | Mode::LineLoop | Mode::LineStrip => None,
    }
}

/// Splits a `data:[<mime>][;base64],<payload>` URI into its mime type and bytes.
///
/// Returns `None` when `uri` is not a data URI.
fn parse_data_uri(uri: &str) -> Option<anyhow::Result<(Option<&str>, Vec<u8>)>> {
    uri.strip_prefix("data:").map(decode_data_uri)
}

fn decode_data_uri(rest: &str) -> anyhow::Result<(Option<&str>, Vec<u8>)> {
    let (header, payload) = rest
        .split_once(',')
        .context("missing ',' in data URI")?;
    let (mime, bytes) = match header.strip_suffix(";base64") {
        Some(mime) => (
            mime,
            STANDARD
                .decode(payload)
                .context("invalid base64 payload")?,
        ),
        None => (header, payload.as_bytes().to_vec()),
    };
    Ok(((!mime.is_empty()).then_some(mime), bytes))
}

fn texture_reference(info: gltf::texture::Info) -> Option<String> {
    let image = info.texture().source();
    match image.source() {
        gltf::image::Source::View { .. } => Some(format!("*{}", image.index())),
        gltf::image::Source::Uri { uri, .. } if uri.starts_with("data:") => {
            Some(format!("*{}", image.index()))
        }
        gltf::image::Source::Uri { uri, .. } => Some(uri.to_string()),
    }
}

fn convert_material(material: gltf::Material) -> SourceMaterial {
    let spec_gloss = material.pbr_specular_glossiness();
    let diffuse = material
        .pbr_metallic_roughness()
        .base_color_texture()
        .or_else(|| spec_gloss.as_ref().and_then(|sg| sg.diffuse_texture()))
        .and_then(texture_reference);
    let specular = spec_gloss
        .as_ref()
        .and_then(|sg| sg.specular_glossiness_texture())
        .and_then(texture_reference);

    SourceMaterial {
        name: material.name().unwrap_or("material").to_string(),
        diffuse: diffuse.into_iter().collect(),
        specular: specular.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gltf::mesh::Mode;

    const TRIANGLE_AND_LINE: &str = r#"{
        "asset": { "version": "2.0" },
        "buffers": [{ "byteLength": 36 }],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "accessors": [{
            "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
            "min": [0, 0, 0], "max": [0, 0, 0]
        }],
        "meshes": [{
            "name": "mixed",
            "primitives": [
                { "attributes": { "POSITION": 0 } },
                { "attributes": { "POSITION": 0 }, "mode": 1 }
            ]
        }]
    }"#;

    fn convert_all(buffers: &[gltf::buffer::Data]) -> Vec<Result<usize, Skipped>> {
        let gltf = gltf::Gltf::from_slice(TRIANGLE_AND_LINE.as_bytes()).expect("valid glTF");
        let mesh = gltf.document.meshes().next().expect("one mesh");
        mesh.primitives()
            .map(|p| convert_primitive(&mesh, &p, buffers).map(|m| m.indices.len()))
            .collect()
    }

    #[test]
    fn skipped_primitives_report_their_cause() {
        let buffers = [gltf::buffer::Data(vec![0u8; 36])];
        assert_eq!(
            convert_all(&buffers),
            vec![Ok(3), Err(Skipped::NotTriangles(Mode::Lines))]
        );
        // no buffer data means the positions cannot be read
        assert_eq!(
            convert_all(&[]),
            vec![Err(Skipped::NoPositions), Err(Skipped::NoPositions)]
        );
    }

    #[test]
    fn data_uris_are_decoded() {
        let (mime, bytes) = parse_data_uri("data:image/png;base64,AAEC")
            .expect("is a data URI")
            .expect("valid base64");
        assert_eq!(mime, Some("image/png"));
        assert_eq!(bytes, vec![0, 1, 2]);

        assert!(parse_data_uri("textures/wood.png").is_none());
        assert!(parse_data_uri("data:image/png;base64,@@@").expect("is a data URI").is_err());
        assert!(parse_data_uri("data:image/png;base64").expect("is a data URI").is_err());
    }

    #[test]
    fn strips_and_fans_become_triangle_lists() {
        assert_eq!(
            triangle_list(Mode::TriangleStrip, &[0, 1, 2, 3]),
            Some(vec![0, 1, 2, 2, 1, 3])
        );
        assert_eq!(
            triangle_list(Mode::TriangleFan, &[0, 1, 2, 3]),
            Some(vec![0, 1, 2, 0, 2, 3])
        );
        assert_eq!(triangle_list(Mode::Triangles, &[0, 1, 2, 3]), Some(vec![0, 1, 2]));
        assert_eq!(triangle_list(Mode::Lines, &[0, 1]), None);
    }
}
