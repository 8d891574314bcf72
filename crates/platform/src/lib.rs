//! Platform layer: application state, scene setup, frame scheduling and
//! the winit event loop that drives them.

pub mod app;
pub mod config;
pub mod debug;
pub mod frame;
pub mod loader;
pub mod setup;
pub mod state;

pub use app::{AppEvent, run};
pub use config::Config;
pub use frame::{DrawTarget, FrameLoop, StopHandle};
pub use state::AppState;
