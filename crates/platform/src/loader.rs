//! Attaching the cottage model once its background load finishes.

use asset::{AssetError, AssetTask, LoadRequest, prepare_model};
use asset::error::AssetResult;
use corelib::scene::{NodeId, NodeTree, Scene};

pub const MODEL_URL: &str = "/models/cottage.glb";
pub const DECODER_PATH: &str = "/draco/";
/// Forced onto every node of the loaded model.
pub const MODEL_INTENSITY: f32 = 80.0;

pub fn model_request() -> LoadRequest {
    LoadRequest::new(MODEL_URL, DECODER_PATH)
}

/// Where asset load failures are reported.
pub trait DiagnosticSink {
    fn asset_load_failed(&mut self, url: &str, error: &AssetError);
}

/// Reports through the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn asset_load_failed(&mut self, url: &str, error: &AssetError) {
        log::error!("Failed to load {}: {}", url, error);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Attached(NodeId),
    Failed,
}

/// Prepare and attach a loaded model under the scene root, or report the
/// failure and leave the scene as it is.
pub fn attach_loaded(
    scene: &mut Scene,
    url: &str,
    result: AssetResult<NodeTree>,
    sink: &mut impl DiagnosticSink,
) -> LoadOutcome {
    match result {
        Ok(mut tree) => {
            prepare_model(&mut tree, MODEL_INTENSITY);
            let nodes = tree.node_count();
            let id = scene.attach_tree(scene.root(), tree);
            log::info!("Attached {} ({} nodes)", url, nodes);
            LoadOutcome::Attached(id)
        }
        Err(error) => {
            sink.asset_load_failed(url, &error);
            LoadOutcome::Failed
        }
    }
}

/// Drive a pending task: attach on completion. Returns `None` while the
/// load is still running or after it has been consumed.
pub fn poll_task(
    task: &mut AssetTask,
    scene: &mut Scene,
    sink: &mut impl DiagnosticSink,
) -> Option<LoadOutcome> {
    let result = task.poll()?;
    let url = task.url().to_owned();
    Some(attach_loaded(scene, &url, result, sink))
}
