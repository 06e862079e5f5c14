//! Loading of model files into CPU-side geometry.
//!
//! Nothing in here touches the GPU. Geometry is uploaded lazily on the first
//! draw, see [`Geometry::upload`](crate::data_structures::model::Geometry::upload).

use std::{
    io::{BufReader, Cursor},
    path::{Path, PathBuf},
};

use crate::{
    data_structures::model::{Geometry, Model},
    error::LoadError,
};

pub mod gltf_scene;
pub mod mesh;

/// Environment variable overriding the asset root.
pub const ASSET_DIR_ENV: &str = "CO2_ASSET_DIR";

/// The directory assets are looked up in: `$CO2_ASSET_DIR` or `./assets`.
pub fn asset_root() -> PathBuf {
    std::env::var_os(ASSET_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new("./").join("assets"))
}

pub async fn load_string(path: &Path) -> Result<String, LoadError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

pub async fn load_binary(path: &Path) -> Result<Vec<u8>, LoadError> {
    tokio::fs::read(path).await.map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Import the model at `path`, picking the importer by file extension.
pub async fn load_model(path: impl AsRef<Path>) -> Result<Model, LoadError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "obj" => load_model_obj(path).await,
        "gltf" | "glb" => gltf_scene::load_model_gltf(path).await,
        _ => Err(LoadError::UnsupportedFormat(path.display().to_string())),
    }
}

pub async fn load_model_obj(path: &Path) -> Result<Model, LoadError> {
    let directory = parent_dir(path);
    let obj_text = load_string(path).await?;
    let geometries = parse_obj(&obj_text, &directory).await?;
    log::info!("Loaded {} with {} meshes", path.display(), geometries.len());
    Ok(Model::from_geometries(geometries, Some(directory)))
}

/// Parse OBJ text. Material libraries are resolved against `directory`.
///
/// A missing or broken material library is not fatal: the affected meshes
/// fall back to the default material.
pub async fn parse_obj(obj_text: &str, directory: &Path) -> Result<Vec<Geometry>, LoadError> {
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| {
            let mtl_path = directory.join(p);
            async move {
                match tokio::fs::read_to_string(&mtl_path).await {
                    Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                    Err(e) => {
                        log::warn!("Material library {} not found: {}", mtl_path.display(), e);
                        Err(tobj::LoadError::OpenFileFailed)
                    }
                }
            }
        },
    )
    .await?;

    let materials = obj_materials.unwrap_or_else(|e| {
        log::warn!("Falling back to default materials: {}", e);
        Vec::new()
    });

    Ok(mesh::to_geometries(models, &materials))
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "o Tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    #[tokio::test]
    async fn parses_obj_without_material_library() {
        let geometries = parse_obj(TRIANGLE, Path::new(".")).await.unwrap();
        assert_eq!(geometries.len(), 1);
        assert_eq!(geometries[0].name, "Tri");
        assert_eq!(geometries[0].indices, vec![0, 1, 2]);
        // Normals are generated when the file has none.
        assert_eq!(geometries[0].vertices[0].normal, [0.0, 0.0, 1.0]);
    }

    #[tokio::test]
    async fn missing_material_library_falls_back_to_default_material() {
        let obj = format!("mtllib nowhere.mtl\nusemtl Gone\n{TRIANGLE}");
        let geometries = parse_obj(&obj, Path::new("/definitely/not/here"))
            .await
            .unwrap();
        assert_eq!(geometries.len(), 1);
        assert_eq!(geometries[0].material, Default::default());
    }

    #[tokio::test]
    async fn unknown_extension_is_rejected() {
        let err = load_model("factory.fbx").await.unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(_)));
    }

    #[test]
    fn asset_root_defaults_to_assets_dir() {
        if std::env::var_os(ASSET_DIR_ENV).is_none() {
            assert!(asset_root().ends_with("assets"));
        }
    }
}
