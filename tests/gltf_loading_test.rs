use std::path::PathBuf;

use co2_factory::{data_structures::model::Model, resources::load_model};

use crate::common::test_utils::asset_root;

mod common;

fn hierarchy_path() -> String {
    format!("{}/hierarchy/hierarchy.gltf", asset_root())
}

#[tokio::test]
async fn root_and_child_meshes_are_collected_depth_first() {
    let model = Model::load(hierarchy_path()).await.unwrap();
    let names: Vec<_> = model
        .primitives
        .iter()
        .map(|p| p.geometry.name.as_str())
        .collect();
    assert_eq!(names, ["RootTri#0", "ChildTri#0"]);
    assert!(model.directory.as_ref().unwrap().ends_with("hierarchy"));
}

#[tokio::test]
async fn node_transforms_are_baked_into_vertices() {
    let model = load_model(hierarchy_path()).await.unwrap();

    let root: Vec<_> = model.primitives[0]
        .geometry
        .vertices
        .iter()
        .map(|v| v.position)
        .collect();
    assert_eq!(root, [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);

    // Parent T(10, 0, 0) times child T(0, 5, 0).
    let child: Vec<_> = model.primitives[1]
        .geometry
        .vertices
        .iter()
        .map(|v| v.position)
        .collect();
    assert_eq!(child, [[10.0, 5.0, 0.0], [11.0, 5.0, 0.0], [10.0, 6.0, 0.0]]);
    assert_eq!(model.primitives[1].geometry.indices, [0, 1, 2]);
}

#[tokio::test]
async fn missing_normals_are_generated() {
    let model = load_model(hierarchy_path()).await.unwrap();
    for primitive in &model.primitives {
        for vertex in &primitive.geometry.vertices {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        }
    }
}

#[tokio::test]
async fn uri_less_buffer_keeps_later_buffers_in_place() {
    let dir: PathBuf = std::env::temp_dir().join(format!("co2-gltf-{}", std::process::id()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let bin = tokio::fs::read(format!("{}/hierarchy/hierarchy.bin", asset_root()))
        .await
        .unwrap();
    tokio::fs::write(dir.join("b.bin"), &bin).await.unwrap();

    // Buffer 0 has neither a uri nor a binary chunk; the mesh data lives in buffer 1.
    let gltf = format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [{{ "mesh": 0 }}],
  "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1 }}] }}],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
       "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ],
  "bufferViews": [
    {{ "buffer": 1, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 1, "byteOffset": 36, "byteLength": 6 }}
  ],
  "buffers": [{{ "byteLength": 4 }}, {{ "uri": "b.bin", "byteLength": {} }}]
}}"#,
        bin.len()
    );
    let path = dir.join("split.gltf");
    tokio::fs::write(&path, gltf).await.unwrap();

    let model = load_model(&path).await.unwrap();
    assert_eq!(model.primitives.len(), 1);
    assert_eq!(
        model.primitives[0].geometry.vertices[1].position,
        [1.0, 0.0, 0.0]
    );

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}
