//! glTF 2.0 import.
//!
//! The node hierarchy of the default scene is walked depth first and every
//! triangle primitive is flattened into one [`Geometry`], with the node's
//! world transform baked into its vertices.

use std::path::Path;

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3, Vector4};

use crate::{
    data_structures::model::{Geometry, Material, Model, ModelVertex},
    error::LoadError,
    resources::load_binary,
};

pub async fn load_model_gltf(path: &Path) -> Result<Model, LoadError> {
    let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let bytes = load_binary(path).await?;
    let gltf = gltf::Gltf::from_slice(&bytes)?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            // Buffer indices must stay aligned with `buffer_data`.
            gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                Some(blob) => buffer_data.push(blob.to_vec()),
                None => {
                    log::warn!(
                        "Buffer {} of {} has no uri and no binary chunk",
                        buffer.index(),
                        path.display()
                    );
                    buffer_data.push(Vec::new());
                }
            },
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                return Err(LoadError::UnsupportedFormat(format!(
                    "embedded data URI in {}",
                    path.display()
                )));
            }
            gltf::buffer::Source::Uri(uri) => {
                buffer_data.push(load_binary(&directory.join(uri)).await?);
            }
        }
    }

    let mut geometries = Vec::new();
    if let Some(scene) = gltf.default_scene().or_else(|| gltf.scenes().next()) {
        for node in scene.nodes() {
            collect_node(&node, Matrix4::identity(), &buffer_data, &mut geometries)?;
        }
    }
    log::info!("Loaded {} with {} meshes", path.display(), geometries.len());
    Ok(Model::from_geometries(geometries, Some(directory)))
}

fn collect_node(
    node: &gltf::Node,
    parent: Matrix4<f32>,
    buffers: &[Vec<u8>],
    geometries: &mut Vec<Geometry>,
) -> Result<(), LoadError> {
    let world = parent * Matrix4::from(node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh
            .name()
            .or(node.name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh{}", mesh.index()));
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping primitive {} of {}: only triangles are supported",
                    primitive.index(),
                    mesh_name
                );
                continue;
            }
            let name = format!("{}#{}", mesh_name, primitive.index());
            geometries.push(to_geometry(&primitive, name, world, buffers)?);
        }
    }
    for child in node.children() {
        collect_node(&child, world, buffers, geometries)?;
    }
    Ok(())
}

fn to_geometry(
    primitive: &gltf::Primitive,
    name: String,
    world: Matrix4<f32>,
    buffers: &[Vec<u8>],
) -> Result<Geometry, LoadError> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| LoadError::MissingPositions(name.clone()))?
        .collect();
    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|n| n.collect());
    let tex_coords: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().collect())
        .unwrap_or_default();
    let indices: Vec<u32> = reader
        .read_indices()
        .map(|i| i.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    let normal_matrix = normal_matrix(&world);
    let mut vertices: Vec<ModelVertex> = positions
        .iter()
        .enumerate()
        .map(|(i, position)| {
            let position = world * Vector4::new(position[0], position[1], position[2], 1.0);
            let normal = normals
                .as_ref()
                .and_then(|normals| normals.get(i))
                .map(|n| normal_matrix * Vector3::from(*n))
                .filter(|n| n.magnitude2() > 0.0)
                .map(|n| n.normalize().into())
                .unwrap_or([0.0; 3]);
            ModelVertex {
                position: position.truncate().into(),
                tex_coords: tex_coords.get(i).copied().unwrap_or([0.0; 2]),
                normal,
            }
        })
        .collect();

    if normals.is_none() {
        Geometry::generate_normals(&mut vertices, &indices);
    }

    Ok(Geometry::new(
        name,
        vertices,
        indices,
        to_material(&primitive.material()),
    ))
}

fn normal_matrix(world: &Matrix4<f32>) -> Matrix3<f32> {
    let linear = Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
    linear
        .invert()
        .map(|inverse| inverse.transpose())
        .unwrap_or_else(Matrix3::identity)
}

/// Derive a flat Phong material from the PBR parameters.
fn to_material(material: &gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();
    let diffuse = Vector3::new(r, g, b);
    let gloss = 1.0 - pbr.roughness_factor().clamp(0.0, 1.0);
    Material {
        ambient: diffuse * 0.1,
        diffuse,
        specular: Vector3::new(gloss, gloss, gloss) * 0.5,
        shininess: (gloss * 128.0).max(1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_matrix_of_uniform_scale_keeps_directions() {
        let world = Matrix4::from_scale(2.0);
        let n = normal_matrix(&world) * Vector3::unit_y();
        assert!((n.normalize() - Vector3::unit_y()).magnitude() < 1e-6);
    }

    #[test]
    fn singular_world_falls_back_to_identity_normals() {
        let world = Matrix4::from_nonuniform_scale(1.0, 0.0, 1.0);
        assert_eq!(normal_matrix(&world), Matrix3::identity());
    }

    #[tokio::test]
    async fn missing_gltf_file_is_an_io_error() {
        let err = load_model_gltf(Path::new("does/not/exist.gltf"))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
