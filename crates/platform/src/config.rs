use std::path::PathBuf;

use corelib::viewport::ResizeSignal;

/// Startup configuration, filled from CLI flags by the binary.
#[derive(Clone, Debug)]
pub struct Config {
    pub backends: wgpu::Backends,
    pub width: u32,
    pub height: u32,
    /// Root that web-style asset paths (`/models/...`) resolve under.
    pub public_dir: PathBuf,
    /// Debug panel visible at startup.
    pub debug: bool,
    pub resize_signal: ResizeSignal,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            width: 1280,
            height: 720,
            public_dir: PathBuf::from("public"),
            debug: false,
            resize_signal: ResizeSignal::default(),
        }
    }
}
