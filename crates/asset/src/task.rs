//! Single-shot background model load.
//!
//! The load runs on its own thread and delivers exactly one result over a
//! oneshot channel. There is no retry, timeout or cancellation: once
//! spawned, the load runs to completion even if the task handle is dropped.

use std::path::{Path, PathBuf};
use std::thread;

use corelib::scene::NodeTree;
use futures::channel::oneshot;

use crate::error::{AssetError, AssetResult};
use crate::gltf_model::load_model;

/// A model request: web-style absolute paths resolved under a public root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    pub url: String,
    /// Where a Draco decoder would be served from. No decoder is ever read
    /// from it: files requiring `KHR_draco_mesh_compression` fail with
    /// [`AssetError::Unsupported`]. The path is only reported in logs.
    pub decoder_path: String,
}

impl LoadRequest {
    pub fn new(url: impl Into<String>, decoder_path: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            decoder_path: decoder_path.into(),
        }
    }

    /// `/models/a.glb` under `public` becomes `public/models/a.glb`.
    pub fn resolve(&self, public_dir: &Path) -> PathBuf {
        public_dir.join(self.url.trim_start_matches('/'))
    }

    /// The decoder directory under the same root, for diagnostics.
    pub fn decoder_dir(&self, public_dir: &Path) -> PathBuf {
        public_dir.join(self.decoder_path.trim_start_matches('/'))
    }
}

/// Handle to an in-flight load.
pub struct AssetTask {
    url: String,
    rx: Option<oneshot::Receiver<AssetResult<NodeTree>>>,
}

impl AssetTask {
    /// Start loading `request` on a background thread.
    pub fn spawn(request: &LoadRequest, public_dir: &Path) -> Self {
        let path = request.resolve(public_dir);
        log::debug!(
            "Loading {:?}; Draco decoder dir {:?} is not used",
            path,
            request.decoder_dir(public_dir)
        );
        Self::spawn_with(request.url.clone(), move || load_model(&path))
    }

    /// Run an arbitrary loader on a background thread.
    pub fn spawn_with<F>(url: impl Into<String>, load: F) -> Self
    where
        F: FnOnce() -> AssetResult<NodeTree> + Send + 'static,
    {
        let url = url.into();
        let (tx, rx) = oneshot::channel();
        let thread_url = url.clone();
        let spawned = thread::Builder::new()
            .name("asset-load".into())
            .spawn(move || {
                let result = load();
                if tx.send(result).is_err() {
                    log::debug!("Load of {} finished after its handle was dropped", thread_url);
                }
            });
        if let Err(e) = spawned {
            log::error!("Failed to start load thread for {}: {}", url, e);
            // rx resolves to Canceled because tx was dropped with the closure.
        }
        Self { url, rx: Some(rx) }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Non-blocking check. Yields the result exactly once; afterwards the
    /// task is finished and keeps returning `None`.
    pub fn poll(&mut self) -> Option<AssetResult<NodeTree>> {
        let rx = self.rx.as_mut()?;
        match rx.try_recv() {
            Ok(Some(result)) => {
                self.rx = None;
                Some(result)
            }
            Ok(None) => None,
            Err(oneshot::Canceled) => {
                self.rx = None;
                Some(Err(AssetError::Cancelled))
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.rx.is_none()
    }

    /// Block until the load completes.
    pub fn wait(mut self) -> AssetResult<NodeTree> {
        match self.rx.take() {
            Some(rx) => pollster::block_on(rx).unwrap_or(Err(AssetError::Cancelled)),
            None => Err(AssetError::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::scene::Node;

    #[test]
    fn resolve_strips_leading_slash() {
        let req = LoadRequest::new("/models/cottage.glb", "/draco/");
        assert_eq!(
            req.resolve(Path::new("public")),
            PathBuf::from("public/models/cottage.glb")
        );
        assert_eq!(req.decoder_dir(Path::new("public")), PathBuf::from("public/draco/"));
    }

    #[test]
    fn wait_returns_loader_result() {
        let task = AssetTask::spawn_with("mem", || Ok(NodeTree::leaf(Node::group("m"))));
        let tree = task.wait().expect("load");
        assert_eq!(tree.node.name, "m");
    }

    #[test]
    fn poll_yields_result_once() {
        let mut task = AssetTask::spawn_with("mem", || Err(AssetError::Empty));
        let result = loop {
            if let Some(r) = task.poll() {
                break r;
            }
            thread::yield_now();
        };
        assert!(matches!(result, Err(AssetError::Empty)));
        assert!(task.is_finished());
        assert!(task.poll().is_none());
    }

    #[test]
    fn missing_file_fails_through_task() {
        let req = LoadRequest::new("/models/cottage.glb", "/draco/");
        let task = AssetTask::spawn(&req, Path::new("/nonexistent-public-root"));
        assert_eq!(task.url(), "/models/cottage.glb");
        assert!(matches!(task.wait(), Err(AssetError::Io { .. })));
    }
}
