use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed glTF: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("Unsupported glTF feature: {0}")]
    Unsupported(String),
    #[error("Model contains no scene nodes")]
    Empty,
    #[error("Load task ended without a result")]
    Cancelled,
}

pub type AssetResult<T> = Result<T, AssetError>;
