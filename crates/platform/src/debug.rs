//! Debug control panel: declarative bindings from named controls to live
//! scene fields, drawn with egui.

use corelib::scene::{Light, NodeKind, Scene};

use crate::setup::SceneHandles;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Control {
    Slider { min: f32, max: f32, step: f32 },
    Color,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// A scene field a control writes into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamTarget {
    CameraFov,
    CameraDistance,
    AmbientColor,
    AmbientIntensity,
    SunColor,
    SunIntensity,
    SunPosition(Axis),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Scalar(f32),
    Color([f32; 3]),
}

#[derive(Clone, Copy, Debug)]
pub struct Binding {
    pub folder: &'static str,
    pub label: &'static str,
    pub control: Control,
    pub target: ParamTarget,
}

const fn slider(
    folder: &'static str,
    label: &'static str,
    min: f32,
    max: f32,
    step: f32,
    target: ParamTarget,
) -> Binding {
    Binding {
        folder,
        label,
        control: Control::Slider { min, max, step },
        target,
    }
}

const fn color(folder: &'static str, label: &'static str, target: ParamTarget) -> Binding {
    Binding {
        folder,
        label,
        control: Control::Color,
        target,
    }
}

pub const FOLDERS: [&str; 2] = ["Camera", "Lights"];

pub const BINDINGS: [Binding; 9] = [
    slider("Camera", "fov", 10.0, 90.0, 0.1, ParamTarget::CameraFov),
    slider("Camera", "distance", 2.0, 20.0, 0.01, ParamTarget::CameraDistance),
    color("Lights", "ambientColor", ParamTarget::AmbientColor),
    slider("Lights", "ambientIntensity", 0.0, 10.0, 0.001, ParamTarget::AmbientIntensity),
    color("Lights", "directionalColor", ParamTarget::SunColor),
    slider("Lights", "directionalIntensity", 0.0, 10.0, 0.001, ParamTarget::SunIntensity),
    slider("Lights", "lightX", -5.0, 5.0, 0.001, ParamTarget::SunPosition(Axis::X)),
    slider("Lights", "lightY", -5.0, 5.0, 0.001, ParamTarget::SunPosition(Axis::Y)),
    slider("Lights", "lightZ", -5.0, 5.0, 0.001, ParamTarget::SunPosition(Axis::Z)),
];

impl ParamTarget {
    pub fn read(self, scene: &Scene, h: &SceneHandles) -> Option<ParamValue> {
        match self {
            ParamTarget::CameraFov => match &scene.node(h.camera)?.kind {
                NodeKind::Camera(cam) => Some(ParamValue::Scalar(cam.fov_y_deg)),
                _ => None,
            },
            ParamTarget::CameraDistance => Some(ParamValue::Scalar(
                scene.node(h.camera)?.transform.translation.z,
            )),
            ParamTarget::AmbientColor | ParamTarget::SunColor => match &scene.node(self.light(h)?)?.kind {
                NodeKind::Light(light) => Some(ParamValue::Color(light.color())),
                _ => None,
            },
            ParamTarget::AmbientIntensity | ParamTarget::SunIntensity => {
                match &scene.node(self.light(h)?)?.kind {
                    NodeKind::Light(
                        Light::Ambient { intensity, .. } | Light::Directional { intensity, .. },
                    ) => Some(ParamValue::Scalar(*intensity)),
                    _ => None,
                }
            }
            ParamTarget::SunPosition(axis) => {
                let p = scene.node(h.sun)?.transform.translation;
                Some(ParamValue::Scalar(match axis {
                    Axis::X => p.x,
                    Axis::Y => p.y,
                    Axis::Z => p.z,
                }))
            }
        }
    }

    /// Write straight into the bound field. Returns false when the value
    /// kind does not fit the target or the node is missing.
    pub fn write(self, scene: &mut Scene, h: &SceneHandles, value: ParamValue) -> bool {
        match (self, value) {
            (ParamTarget::CameraFov, ParamValue::Scalar(v)) => {
                match scene.node_mut(h.camera).map(|n| &mut n.kind) {
                    Some(NodeKind::Camera(cam)) => {
                        cam.fov_y_deg = v;
                        true
                    }
                    _ => false,
                }
            }
            (ParamTarget::CameraDistance, ParamValue::Scalar(v)) => {
                scene
                    .node_mut(h.camera)
                    .map(|n| n.transform.translation.z = v)
                    .is_some()
            }
            (ParamTarget::AmbientColor | ParamTarget::SunColor, ParamValue::Color(c)) => {
                self.with_light(scene, h, |light| *light.color_mut() = c)
            }
            (ParamTarget::AmbientIntensity | ParamTarget::SunIntensity, ParamValue::Scalar(v)) => {
                self.with_light(scene, h, |light| *light.intensity_mut() = v)
            }
            (ParamTarget::SunPosition(axis), ParamValue::Scalar(v)) => scene
                .node_mut(h.sun)
                .map(|n| {
                    let p = &mut n.transform.translation;
                    match axis {
                        Axis::X => p.x = v,
                        Axis::Y => p.y = v,
                        Axis::Z => p.z = v,
                    }
                })
                .is_some(),
            _ => false,
        }
    }

    fn light(self, h: &SceneHandles) -> Option<corelib::scene::NodeId> {
        match self {
            ParamTarget::AmbientColor | ParamTarget::AmbientIntensity => Some(h.ambient),
            ParamTarget::SunColor | ParamTarget::SunIntensity => Some(h.sun),
            _ => None,
        }
    }

    fn with_light(self, scene: &mut Scene, h: &SceneHandles, f: impl FnOnce(&mut Light)) -> bool {
        let Some(id) = self.light(h) else {
            return false;
        };
        match scene.node_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Light(light)) => {
                f(light);
                true
            }
            _ => false,
        }
    }
}

pub struct DebugPanel {
    visible: bool,
}

impl DebugPanel {
    pub fn new(visible: bool) -> Self {
        Self { visible }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::debug!("Debug panel {}", if self.visible { "shown" } else { "hidden" });
    }

    /// Run one egui pass over `raw`. Input is consumed either way so
    /// nothing queues up while the panel is hidden.
    pub fn run(
        &self,
        ctx: &egui::Context,
        raw: egui::RawInput,
        scene: &mut Scene,
        handles: &SceneHandles,
    ) -> Option<egui::FullOutput> {
        if !self.visible {
            return None;
        }
        Some(ctx.run(raw, |ctx| self.ui(ctx, scene, handles)))
    }

    /// Draw the panel; edits land in the scene before the next draw.
    pub fn ui(&self, ctx: &egui::Context, scene: &mut Scene, handles: &SceneHandles) {
        if !self.visible {
            return;
        }
        egui::Window::new("Debug")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ctx, |ui| {
                for folder in FOLDERS {
                    egui::CollapsingHeader::new(folder)
                        .default_open(true)
                        .show(ui, |ui| {
                            for binding in BINDINGS.iter().filter(|b| b.folder == folder) {
                                binding_ui(ui, binding, scene, handles);
                            }
                        });
                }
            });
    }
}

fn binding_ui(ui: &mut egui::Ui, binding: &Binding, scene: &mut Scene, handles: &SceneHandles) {
    let Some(current) = binding.target.read(scene, handles) else {
        return;
    };
    match (binding.control, current) {
        (Control::Slider { min, max, step }, ParamValue::Scalar(mut v)) => {
            let response = ui.add(
                egui::Slider::new(&mut v, min..=max)
                    .step_by(step as f64)
                    .text(binding.label),
            );
            if response.changed() {
                binding.target.write(scene, handles, ParamValue::Scalar(v));
            }
        }
        (Control::Color, ParamValue::Color(mut c)) => {
            ui.horizontal(|ui| {
                if ui.color_edit_button_rgb(&mut c).changed() {
                    binding.target.write(scene, handles, ParamValue::Color(c));
                }
                ui.label(binding.label);
            });
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::build_scene;

    #[test]
    fn every_binding_resolves() {
        let (scene, h) = build_scene(1.0);
        for b in &BINDINGS {
            let value = b.target.read(&scene, &h).unwrap_or_else(|| panic!("{}", b.label));
            match (b.control, value) {
                (Control::Slider { .. }, ParamValue::Scalar(_)) | (Control::Color, ParamValue::Color(_)) => {}
                other => panic!("{}: control/value mismatch {other:?}", b.label),
            }
            assert!(FOLDERS.contains(&b.folder));
        }
    }

    #[test]
    fn writes_land_in_scene_nodes() {
        let (mut scene, h) = build_scene(1.0);
        assert!(ParamTarget::AmbientIntensity.write(&mut scene, &h, ParamValue::Scalar(1.5)));
        assert!(ParamTarget::SunColor.write(&mut scene, &h, ParamValue::Color([1.0, 0.0, 0.0])));
        assert!(ParamTarget::SunPosition(Axis::Y).write(&mut scene, &h, ParamValue::Scalar(-2.0)));
        assert!(ParamTarget::CameraFov.write(&mut scene, &h, ParamValue::Scalar(50.0)));

        match scene.node(h.ambient).unwrap().kind {
            NodeKind::Light(Light::Ambient { intensity, .. }) => assert_eq!(intensity, 1.5),
            _ => unreachable!(),
        }
        assert_eq!(
            ParamTarget::SunColor.read(&scene, &h),
            Some(ParamValue::Color([1.0, 0.0, 0.0]))
        );
        assert_eq!(scene.node(h.sun).unwrap().transform.translation.y, -2.0);
        assert_eq!(
            ParamTarget::CameraFov.read(&scene, &h),
            Some(ParamValue::Scalar(50.0))
        );
    }

    #[test]
    fn mismatched_value_kind_is_rejected() {
        let (mut scene, h) = build_scene(1.0);
        assert!(!ParamTarget::CameraFov.write(&mut scene, &h, ParamValue::Color([0.0; 3])));
    }

    #[test]
    fn hidden_panel_swallows_input_without_a_pass() {
        let (mut scene, h) = build_scene(1.0);
        let ctx = egui::Context::default();
        let mut panel = DebugPanel::new(false);
        let raw = egui::RawInput {
            events: vec![egui::Event::PointerMoved(egui::pos2(10.0, 10.0)); 64],
            ..Default::default()
        };
        assert!(panel.run(&ctx, raw, &mut scene, &h).is_none());

        panel.toggle();
        let out = panel.run(&ctx, egui::RawInput::default(), &mut scene, &h);
        assert!(out.is_some());
    }

    #[test]
    fn panel_starts_hidden_by_default() {
        let mut panel = DebugPanel::new(false);
        assert!(!panel.is_visible());
        panel.toggle();
        assert!(panel.is_visible());
    }
}
