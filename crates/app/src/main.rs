//! Entry point for cottage3d.

use std::path::PathBuf;

use anyhow::Result;
use corelib::viewport::ResizeSignal;

fn parse_backend_arg() -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all();
    for arg in std::env::args() {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    log::warn!("Unknown backend '{}', falling back to auto.", other);
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

fn parse_debug_arg() -> bool {
    // --debug[=on|off], off by default
    for arg in std::env::args() {
        if arg == "--debug" {
            return true;
        }
        if let Some(val) = arg.strip_prefix("--debug=") {
            return matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
    }
    false
}

fn parse_resize_signal_arg() -> ResizeSignal {
    let mut signal = ResizeSignal::default();
    for arg in std::env::args() {
        if let Some(val) = arg.strip_prefix("--resize-signal=") {
            signal = match val.to_ascii_lowercase().as_str() {
                "reset" => ResizeSignal::Reset,
                "resize" => ResizeSignal::Resize,
                other => {
                    log::warn!("Unknown resize signal '{}', using 'reset'.", other);
                    ResizeSignal::Reset
                }
            };
        }
    }
    signal
}

fn parse_public_dir_arg() -> PathBuf {
    std::env::args()
        .filter_map(|arg| arg.strip_prefix("--public-dir=").map(PathBuf::from))
        .last()
        .unwrap_or_else(|| PathBuf::from("public"))
}

fn parse_size_args() -> (u32, u32) {
    let mut w: Option<u32> = None;
    let mut h: Option<u32> = None;

    for arg in std::env::args() {
        if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                    w = Some(pw);
                    h = Some(ph);
                }
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            if let Ok(pw) = v.parse::<u32>() {
                w = Some(pw);
            }
        } else if let Some(v) = arg.strip_prefix("--height=") {
            if let Ok(ph) = v.parse::<u32>() {
                h = Some(ph);
            }
        }
    }

    let ww = w.unwrap_or(1280).max(1);
    let hh = h.unwrap_or(720).max(1);
    (ww, hh)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (width, height) = parse_size_args();
    let config = platform::Config {
        backends: parse_backend_arg(),
        width,
        height,
        public_dir: parse_public_dir_arg(),
        debug: parse_debug_arg(),
        resize_signal: parse_resize_signal_arg(),
    };
    log::info!(
        "Starting cottage3d. Backend: {:?}, debug={}, resize_signal={:?}, window_size={}x{}, public_dir={}",
        config.backends,
        config.debug,
        config.resize_signal,
        config.width,
        config.height,
        config.public_dir.display()
    );

    platform::run(config)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
