use cgmath::Vector3;

use crate::data_structures::model::{Geometry, Material, ModelVertex};

/**
 * Converts OBJ meshes into geometry.
 *
 * OBJ files often come without normals; those are generated from the faces
 * so the flat shading still has something to work with. Meshes without any
 * triangles are dropped.
 */
pub fn to_geometries(models: Vec<tobj::Model>, materials: &[tobj::Material]) -> Vec<Geometry> {
    models
        .into_iter()
        .enumerate()
        .filter_map(|(idx, m)| {
            if m.mesh.positions.is_empty() || m.mesh.indices.is_empty() {
                log::warn!("Mesh {} ({}) has no triangles, skipping it", idx, m.name);
                return None;
            }
            let has_normals = !m.mesh.normals.is_empty();
            let mut vertices = (0..m.mesh.positions.len() / 3)
                .map(|i| ModelVertex {
                    position: [
                        m.mesh.positions[i * 3],
                        m.mesh.positions[i * 3 + 1],
                        m.mesh.positions[i * 3 + 2],
                    ],
                    tex_coords: [
                        m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                        1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                    ],
                    normal: [
                        m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                        m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                        m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
                    ],
                })
                .collect::<Vec<_>>();

            if !has_normals {
                Geometry::generate_normals(&mut vertices, &m.mesh.indices);
            }

            let material = m
                .mesh
                .material_id
                .and_then(|id| materials.get(id))
                .map(to_material)
                .unwrap_or_default();

            // The indices are for positions, texels, and normals because `single_index` is set
            Some(Geometry::new(m.name, vertices, m.mesh.indices, material))
        })
        .collect()
}

/// Map an MTL material onto the flat material. Missing terms keep their defaults.
pub fn to_material(m: &tobj::Material) -> Material {
    let default = Material::default();
    Material {
        ambient: m.ambient.map_or(default.ambient, Vector3::from),
        diffuse: m.diffuse.map_or(default.diffuse, Vector3::from),
        specular: m.specular.map_or(default.specular, Vector3::from),
        shininess: m.shininess.unwrap_or(default.shininess),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(normals: Vec<f32>) -> tobj::Model {
        let mesh = tobj::Mesh {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            normals,
            texcoords: vec![0.0, 0.25, 1.0, 0.25, 1.0, 1.0, 0.0, 1.0],
            indices: vec![0, 1, 2, 0, 2, 3],
            material_id: Some(0),
            ..Default::default()
        };
        tobj::Model::new(mesh, "Quad".to_string())
    }

    #[test]
    fn flips_v_and_keeps_given_normals() {
        let normals = [0.0, 0.0, -1.0].repeat(4);
        let geometries = to_geometries(vec![quad(normals)], &[]);
        let vertices = &geometries[0].vertices;
        assert_eq!(vertices[0].tex_coords, [0.0, 0.75]);
        assert_eq!(vertices[0].normal, [0.0, 0.0, -1.0]);
        // material_id points nowhere, so the default material is used
        assert_eq!(geometries[0].material, Material::default());
    }

    #[test]
    fn generates_missing_normals() {
        let geometries = to_geometries(vec![quad(Vec::new())], &[]);
        for vertex in &geometries[0].vertices {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn skips_meshes_without_triangles() {
        let empty = tobj::Model::new(tobj::Mesh::default(), "Empty".to_string());
        assert!(to_geometries(vec![empty], &[]).is_empty());
    }

    #[test]
    fn converts_mtl_terms_and_keeps_defaults_for_missing_ones() {
        let mtl = tobj::Material {
            diffuse: Some([0.8, 0.1, 0.1]),
            shininess: Some(64.0),
            ..Default::default()
        };
        let material = to_material(&mtl);
        assert_eq!(material.diffuse, Vector3::new(0.8, 0.1, 0.1));
        assert_eq!(material.shininess, 64.0);
        assert_eq!(material.ambient, Material::default().ambient);
    }
}
