//! Window + event loop (winit 0.30 `ApplicationHandler`).

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use asset::AssetTask;
use corelib::camera::CameraView;
use corelib::scene::Scene;
use corelib::viewport::{ResizeSignal, Viewport, capped_pixel_ratio};
use renderer::{GpuState, OverlayFrame};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::Config;
use crate::frame::{DrawTarget, FrameLoop};
use crate::loader::{LogSink, model_request};
use crate::state::AppState;

/// Custom events delivered through the event loop proxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppEvent {
    /// Runs the viewport sizing policy when `--resize-signal=reset`.
    Reset,
}

struct Graphics {
    window: Arc<Window>,
    gpu: GpuState,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
}

struct App {
    config: Config,
    state: AppState,
    frame_loop: FrameLoop,
    gfx: Option<Graphics>,
    sink: LogSink,
    error: Option<anyhow::Error>,
}

/// Draws through the GPU; surface hiccups are absorbed here.
struct GpuTarget<'a> {
    gpu: &'a mut GpuState,
    overlay: Option<&'a OverlayFrame>,
}

impl DrawTarget for GpuTarget<'_> {
    fn draw(&mut self, scene: &Scene, camera: &CameraView) -> Result<()> {
        match self.gpu.render(scene, camera, self.overlay) {
            Ok(()) => Ok(()),
            Err(e) if GpuState::is_surface_lost(&e) => {
                log::warn!("Surface {e}; reconfiguring");
                self.gpu.recreate_surface();
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(anyhow!("GPU out of memory")),
            Err(e) => {
                log::error!("Frame skipped: {e}");
                Ok(())
            }
        }
    }
}

/// Open the window and run until it is closed.
pub fn run(config: Config) -> Result<()> {
    let event_loop = EventLoop::<AppEvent>::with_user_event()
        .build()
        .context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    if config.resize_signal == ResizeSignal::Reset {
        log::warn!(
            "Viewport follows the custom `reset` signal, which nothing emits; \
             window resizes will not update the camera (use --resize-signal=resize)"
        );
    }

    let mut state = AppState::new(&config);
    state.start_model_load(AssetTask::spawn(&model_request(), &config.public_dir));

    let mut app = App {
        config,
        state,
        frame_loop: FrameLoop::new(),
        gfx: None,
        sink: LogSink,
        error: None,
    };
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow!("Event loop error: {e:?}"))?;

    log::info!("Rendered {} frames", app.frame_loop.frames());
    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

impl App {
    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<Graphics> {
        let attrs = Window::default_attributes()
            .with_title("webgl")
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("Failed to create window")?,
        );
        let size = window.inner_size();
        log::info!("Window created: {}x{}", size.width, size.height);

        // Startup sizing always runs, whatever the resize signal.
        let (width, height) =
            self.state
                .apply_viewport(size.width, size.height, window.scale_factor());
        let gpu = pollster::block_on(GpuState::new(
            window.clone(),
            self.config.backends,
            PhysicalSize::new(width, height),
        ))
        .context("Failed to initialise renderer")?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window.as_ref(),
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        Ok(Graphics {
            window,
            gpu,
            egui_ctx,
            egui_state,
        })
    }

    /// Route a size change through the state; the swapchain follows the
    /// window either way.
    fn handle_resize(&mut self, from_reset: bool) {
        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };
        let size = gfx.window.inner_size();
        let scale = gfx.window.scale_factor();
        let applied = if from_reset {
            self.state.on_reset_signal(size.width, size.height, scale)
        } else {
            self.state.on_window_resized(size.width, size.height, scale)
        };
        match applied {
            Some((w, h)) => {
                gfx.gpu.resize(w, h);
                log::info!("Viewport resized: {}x{}", w, h);
            }
            None if from_reset => {}
            None => {
                // Camera keeps its aspect; only the swapchain tracks the window.
                let (w, h) = Viewport::from_physical(size.width, size.height, scale).physical_size();
                gfx.gpu.resize(w, h);
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.state.poll_assets(&mut self.sink);

        let Self {
            state,
            gfx,
            frame_loop,
            error,
            ..
        } = self;
        let Some(gfx) = gfx.as_mut() else {
            return;
        };

        // Drained every frame, shown or not.
        let raw = gfx.egui_state.take_egui_input(&gfx.window);
        let pixels_per_point = capped_pixel_ratio(gfx.window.scale_factor()) as f32;
        let overlay = state
            .panel
            .run(&gfx.egui_ctx, raw, &mut state.scene, &state.handles)
            .map(|full| {
                gfx.egui_state
                    .handle_platform_output(&gfx.window, full.platform_output);
                OverlayFrame {
                    paint_jobs: gfx.egui_ctx.tessellate(full.shapes, pixels_per_point),
                    textures_delta: full.textures_delta,
                    pixels_per_point,
                }
            });

        let mut target = GpuTarget {
            gpu: &mut gfx.gpu,
            overlay: overlay.as_ref(),
        };
        if let Err(e) = frame_loop.tick(state, &mut target) {
            log::error!("Render loop stopped: {e:#}");
            frame_loop.stop_handle().stop();
            *error = Some(e);
            event_loop.exit();
        }
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gfx.is_some() {
            return;
        }
        match self.init_graphics(event_loop) {
            Ok(gfx) => self.gfx = Some(gfx),
            Err(e) => {
                log::error!("{e:#}");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Reset => self.handle_resize(true),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let consumed = match self.gfx.as_mut() {
            Some(gfx) => gfx.egui_state.on_window_event(&gfx.window, &event).consumed,
            None => false,
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                self.frame_loop.stop_handle().stop();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                log::debug!("Resized: {}x{}", new_size.width, new_size.height);
                self.handle_resize(false);
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(gfx) = self.gfx.as_ref() {
                    let size = gfx.window.inner_size();
                    self.state
                        .on_pointer_move(position.x, position.y, size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } if !consumed => {
                if event.state == ElementState::Pressed
                    && !event.repeat
                    && event.physical_key == PhysicalKey::Code(KeyCode::KeyH)
                {
                    self.state.panel.toggle();
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.frame_loop.is_stopped() {
            event_loop.exit();
            return;
        }
        if let Some(gfx) = self.gfx.as_ref() {
            gfx.window.request_redraw();
        }
    }
}
