//! Asset loading: glTF/GLB model import into a detached node tree and the
//! single-shot background load task.

pub mod error;
pub mod gltf_model;
pub mod task;

pub use error::AssetError;
pub use gltf_model::{load_model, load_model_from_slice, prepare_model};
pub use task::{AssetTask, LoadRequest};
