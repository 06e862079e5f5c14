//! Typed errors at the model-loading and scene-construction boundaries.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while importing a model file.
///
/// A failed import never takes the application down by itself. Callers that
/// can live with an invisible model use [`Model::load_or_empty`], which logs
/// the error and carries on with no primitives.
///
/// [`Model::load_or_empty`]: crate::data_structures::model::Model::load_or_empty
#[derive(Debug, Error)]
pub enum LoadError {
    /// The asset (or one of its buffers) could not be read from disk.
    #[error("Failed to read asset {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The OBJ importer rejected the file.
    #[error("Failed to parse OBJ: {0}")]
    Obj(#[from] tobj::LoadError),

    /// The glTF importer rejected the file.
    #[error("Failed to parse glTF: {0}")]
    Gltf(#[from] gltf::Error),

    /// The file extension does not belong to a supported importer.
    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),

    /// A mesh came without vertex positions.
    #[error("Mesh {0} has no vertex positions")]
    MissingPositions(String),
}

/// Errors raised while setting up the molecule scene.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The molecule template geometry was already loaded into this slot.
    ///
    /// Templates are loaded exactly once; reuse the loaded ones instead.
    #[error("Molecule templates are already loaded")]
    TemplatesAlreadyLoaded,

    #[error(transparent)]
    Load(#[from] LoadError),
}
