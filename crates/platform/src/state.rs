//! Application state shared by the frame scheduler and the event handlers.

use asset::AssetTask;
use corelib::camera::{CameraView, PerspectiveCamera};
use corelib::parallax::{CursorState, ParallaxRig};
use corelib::scene::{NodeKind, Scene};
use corelib::viewport::{ResizeSignal, Viewport};

use crate::config::Config;
use crate::debug::DebugPanel;
use crate::loader::{DiagnosticSink, LoadOutcome, poll_task};
use crate::setup::{SceneHandles, build_scene, particle_rotation};

pub struct AppState {
    pub scene: Scene,
    pub handles: SceneHandles,
    pub viewport: Viewport,
    pub cursor: CursorState,
    pub parallax: ParallaxRig,
    pub resize_signal: ResizeSignal,
    pub panel: DebugPanel,
    model: Option<AssetTask>,
}

impl AppState {
    /// Build the scene sized for the configured window at scale 1.
    pub fn new(config: &Config) -> Self {
        let viewport = Viewport::from_physical(config.width, config.height, 1.0);
        let (scene, handles) = build_scene(viewport.aspect());
        Self {
            scene,
            handles,
            viewport,
            cursor: CursorState::default(),
            parallax: ParallaxRig::default(),
            resize_signal: config.resize_signal,
            panel: DebugPanel::new(config.debug),
            model: None,
        }
    }

    /// Viewport sizing policy: re-read surface size, update camera aspect
    /// and capped pixel density. Returns the render-target size.
    pub fn apply_viewport(&mut self, width: u32, height: u32, scale_factor: f64) -> (u32, u32) {
        self.viewport.resize(width, height, scale_factor);
        let aspect = self.viewport.aspect();
        if let Some(cam) = self.camera_mut() {
            cam.set_aspect(aspect);
        }
        log::debug!(
            "Viewport {:.0}x{:.0} @{}x, aspect {:.3}",
            self.viewport.width,
            self.viewport.height,
            self.viewport.pixel_ratio,
            aspect
        );
        self.viewport.physical_size()
    }

    /// A real window resize. Runs the sizing policy only when resizes
    /// drive it, returning the new render-target size.
    pub fn on_window_resized(
        &mut self,
        width: u32,
        height: u32,
        scale_factor: f64,
    ) -> Option<(u32, u32)> {
        match self.resize_signal {
            ResizeSignal::Resize => Some(self.apply_viewport(width, height, scale_factor)),
            ResizeSignal::Reset => None,
        }
    }

    /// The custom `reset` signal. Runs the sizing policy only when it is
    /// the configured driver.
    pub fn on_reset_signal(
        &mut self,
        width: u32,
        height: u32,
        scale_factor: f64,
    ) -> Option<(u32, u32)> {
        match self.resize_signal {
            ResizeSignal::Reset => Some(self.apply_viewport(width, height, scale_factor)),
            ResizeSignal::Resize => None,
        }
    }

    /// Record the pointer position against the surface's pixel size.
    pub fn on_pointer_move(&mut self, x: f64, y: f64, surface_width: u32, surface_height: u32) {
        self.cursor =
            CursorState::from_pointer(x, y, surface_width as f64, surface_height as f64);
    }

    /// Fixed-formula spins on the decorative nodes.
    pub fn animate(&mut self, elapsed: f32) {
        let h = self.handles;
        if let Some(node) = self.scene.node_mut(h.particles) {
            let angle = particle_rotation(elapsed);
            node.transform.rotation_euler.x = angle;
            node.transform.rotation_euler.y = angle;
        }
        if let Some(node) = self.scene.node_mut(h.test_mesh) {
            node.transform.rotation_euler.y = elapsed * 0.5;
        }
        if let Some(node) = self.scene.node_mut(h.torus) {
            node.transform.rotation_euler.x = elapsed.sin() * 0.5;
            node.transform.rotation_euler.z = elapsed.cos() * 0.25;
        }
    }

    /// Ease the camera rig towards the cursor-derived target.
    pub fn follow_cursor(&mut self, delta: f32) {
        let (parallax, cursor) = (self.parallax, self.cursor);
        if let Some(rig) = self.scene.node_mut(self.handles.rig) {
            rig.transform.translation = parallax.step(rig.transform.translation, cursor, delta);
        }
    }

    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        match self.scene.node(self.handles.camera).map(|n| &n.kind) {
            Some(NodeKind::Camera(cam)) => Some(cam),
            _ => None,
        }
    }

    pub fn camera_mut(&mut self) -> Option<&mut PerspectiveCamera> {
        match self.scene.node_mut(self.handles.camera).map(|n| &mut n.kind) {
            Some(NodeKind::Camera(cam)) => Some(cam),
            _ => None,
        }
    }

    pub fn camera_view(&self) -> CameraView {
        let cam = self.camera().copied().unwrap_or_default();
        CameraView::from_world(self.scene.world_matrix(self.handles.camera), &cam)
    }

    pub fn start_model_load(&mut self, task: AssetTask) {
        log::info!("Requesting {}", task.url());
        self.model = Some(task);
    }

    pub fn model_pending(&self) -> bool {
        self.model.is_some()
    }

    /// Attach the model (or report its failure) once its load completes.
    pub fn poll_assets(&mut self, sink: &mut impl DiagnosticSink) -> Option<LoadOutcome> {
        let task = self.model.as_mut()?;
        let outcome = poll_task(task, &mut self.scene, sink)?;
        self.model = None;
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn resize_updates_camera_aspect() {
        let mut state = AppState::new(&Config::default());
        let size = state.apply_viewport(1920, 1080, 3.0);
        let cam = state.camera().unwrap();
        assert!((cam.aspect - 1920.0 / 1080.0).abs() < 1e-5);
        assert_eq!(state.viewport.pixel_ratio, 2.0);
        assert_eq!(size, (1280, 720));
    }

    #[test]
    fn window_resize_leaves_camera_alone_under_reset_signal() {
        let mut state = AppState::new(&Config::default());
        let before = state.camera().unwrap().aspect;
        let viewport = state.viewport;

        assert_eq!(state.on_window_resized(600, 900, 1.0), None);
        assert_eq!(state.camera().unwrap().aspect, before);
        assert_eq!(state.viewport, viewport);

        // Only the reset signal runs the policy.
        assert_eq!(state.on_reset_signal(600, 900, 1.0), Some((600, 900)));
        assert!((state.camera().unwrap().aspect - 600.0 / 900.0).abs() < 1e-5);
    }

    #[test]
    fn window_resize_updates_camera_under_resize_signal() {
        let config = Config {
            resize_signal: ResizeSignal::Resize,
            ..Config::default()
        };
        let mut state = AppState::new(&config);

        assert_eq!(state.on_window_resized(1800, 600, 3.0), Some((1200, 400)));
        assert!((state.camera().unwrap().aspect - 3.0).abs() < 1e-5);
        assert_eq!(state.viewport.pixel_ratio, 2.0);

        let aspect = state.camera().unwrap().aspect;
        assert_eq!(state.on_reset_signal(100, 100, 1.0), None);
        assert_eq!(state.camera().unwrap().aspect, aspect);
    }

    #[test]
    fn particle_rotation_golden_values() {
        let mut state = AppState::new(&Config::default());
        for (t, expected) in [(0.0, 0.0), (1.0, PI * 0.01), (10.0, PI * 0.1)] {
            state.animate(t);
            let r = state.scene.node(state.handles.particles).unwrap().transform.rotation_euler;
            assert!((r.x - expected).abs() < 1e-6, "t={t}");
            assert!((r.y - expected).abs() < 1e-6, "t={t}");
        }
    }

    #[test]
    fn pointer_move_drives_rig_target() {
        let mut state = AppState::new(&Config::default());
        state.on_pointer_move(1280.0, 0.0, 1280, 720);
        assert_eq!(state.cursor, CursorState { x: 0.5, y: -0.5 });
        for _ in 0..600 {
            state.follow_cursor(1.0 / 60.0);
        }
        let rig = state.scene.node(state.handles.rig).unwrap().transform.translation;
        assert!((rig.x - 0.25).abs() < 1e-4);
        assert!((rig.y - 0.25).abs() < 1e-4);
        assert_eq!(rig.z, 0.0);
    }
}
