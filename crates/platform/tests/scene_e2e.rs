//! Scene + loader + frame loop together, without a window.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use asset::{AssetError, AssetTask};
use corelib::camera::CameraView;
use corelib::clock::FrameTime;
use corelib::scene::{NodeKind, Scene};
use platform::loader::{DiagnosticSink, LoadOutcome, MODEL_INTENSITY, model_request};
use platform::{AppState, Config, DrawTarget, FrameLoop};

fn fixture_public_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/public")
}

#[derive(Default)]
struct Recorder(Vec<String>);

impl DiagnosticSink for Recorder {
    fn asset_load_failed(&mut self, url: &str, error: &AssetError) {
        self.0.push(format!("{url}: {error}"));
    }
}

#[derive(Default)]
struct CountingTarget {
    draws: u32,
    last_node_count: usize,
}

impl DrawTarget for CountingTarget {
    fn draw(&mut self, scene: &Scene, _camera: &CameraView) -> Result<()> {
        self.draws += 1;
        self.last_node_count = scene.len();
        Ok(())
    }
}

/// Tick at 60 Hz until the model load resolves, or give up after 5 s.
fn run_until_loaded(
    state: &mut AppState,
    frames: &mut FrameLoop,
    target: &mut CountingTarget,
    sink: &mut Recorder,
) -> Option<LoadOutcome> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut t = 0.0f32;
    while Instant::now() < deadline {
        if let Some(outcome) = state.poll_assets(sink) {
            return Some(outcome);
        }
        frames
            .tick_at(FrameTime::at(t + 1.0 / 60.0, t), state, target)
            .expect("tick");
        t += 1.0 / 60.0;
        std::thread::sleep(Duration::from_millis(2));
    }
    None
}

#[test]
fn cottage_loads_and_attaches_prepared() {
    let mut state = AppState::new(&Config::default());
    let root_children = state.scene.children(state.scene.root()).len();
    let nodes_before = state.scene.len();

    state.start_model_load(AssetTask::spawn(&model_request(), &fixture_public_dir()));
    let mut frames = FrameLoop::new();
    let mut target = CountingTarget::default();
    let mut sink = Recorder::default();

    let outcome = run_until_loaded(&mut state, &mut frames, &mut target, &mut sink);
    let Some(LoadOutcome::Attached(model)) = outcome else {
        panic!("expected attach, got {outcome:?} ({:?})", sink.0);
    };
    assert!(sink.0.is_empty());
    assert!(!state.model_pending());

    let root = state.scene.root();
    assert_eq!(state.scene.children(root).len(), root_children + 1);
    assert_eq!(state.scene.parent(model), Some(root));
    // Cottage -> House -> Walls, Roof
    assert_eq!(state.scene.len(), nodes_before + 4);

    let mut meshes = 0;
    for id in std::iter::once(model).chain(state.scene.descendants(model)) {
        let node = state.scene.node(id).unwrap();
        assert_eq!(node.intensity, MODEL_INTENSITY, "{}", node.name);
        if let NodeKind::Mesh {
            cast_shadow,
            receive_shadow,
            ..
        } = node.kind
        {
            assert!(cast_shadow && receive_shadow, "{}", node.name);
            meshes += 1;
        }
    }
    assert_eq!(meshes, 2);
    assert!(state.scene.find("Roof").is_some());

    frames
        .tick_at(FrameTime::at(10.0, 9.9), &mut state, &mut target)
        .unwrap();
    assert_eq!(target.last_node_count, state.scene.len());
}

#[test]
fn missing_model_reports_once_and_scene_keeps_rendering() {
    let empty = std::env::temp_dir().join(format!("cottage3d-missing-{}", std::process::id()));
    let mut state = AppState::new(&Config::default());
    let nodes_before = state.scene.len();

    state.start_model_load(AssetTask::spawn(&model_request(), &empty));
    let mut frames = FrameLoop::new();
    let mut target = CountingTarget::default();
    let mut sink = Recorder::default();

    let outcome = run_until_loaded(&mut state, &mut frames, &mut target, &mut sink);
    assert_eq!(outcome, Some(LoadOutcome::Failed));
    assert_eq!(sink.0.len(), 1);
    assert!(sink.0[0].starts_with("/models/cottage.glb"));
    assert_eq!(state.scene.len(), nodes_before);

    // Nothing further is reported and frames keep coming.
    let drawn = target.draws;
    for i in 0..10 {
        assert!(state.poll_assets(&mut sink).is_none());
        let t = 20.0 + i as f32 / 60.0;
        frames
            .tick_at(FrameTime::at(t, t - 1.0 / 60.0), &mut state, &mut target)
            .unwrap();
    }
    assert_eq!(sink.0.len(), 1);
    assert_eq!(target.draws, drawn + 10);
}

#[test]
fn cursor_moves_camera_rig_over_frames() {
    let mut state = AppState::new(&Config::default());
    let mut frames = FrameLoop::new();
    let mut target = CountingTarget::default();

    // Right edge, top edge.
    state.on_pointer_move(1280.0, 0.0, 1280, 720);
    let target_pos = state.parallax.target(state.cursor);
    let mut t = 0.0f32;
    for _ in 0..600 {
        frames
            .tick_at(FrameTime::at(t + 1.0 / 60.0, t), &mut state, &mut target)
            .unwrap();
        t += 1.0 / 60.0;
    }
    let rig = state.scene.node(state.handles.rig).unwrap();
    assert!((rig.transform.translation - target_pos).length() < 1e-3);
    assert_eq!(target.draws, 600);
}
