//! egui output handed to the renderer for the debug panel.

/// Tessellated egui frame plus the texture changes it needs.
pub struct OverlayFrame {
    pub paint_jobs: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    /// Surface pixels per egui point, at the capped pixel ratio the
    /// surface is sized with.
    pub pixels_per_point: f32,
}
