//! Entry point for the anatomy viewer.
//! Logging, configuration flags, then hand over to the platform loop.

use std::path::PathBuf;

use anyhow::Result;
use platform::ViewerConfig;

fn parse_backend_arg<I: IntoIterator<Item = String>>(args: I) -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all(); // default = auto
    for arg in args {
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

fn parse_size_args<I: IntoIterator<Item = String>>(args: I) -> (u32, u32) {
    let mut w: Option<u32> = None;
    let mut h: Option<u32> = None;

    for arg in args {
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

/// Last `--<name>=<path>` wins.
fn parse_path_arg<I: IntoIterator<Item = String>>(args: I, name: &str) -> Option<PathBuf> {
    let prefix = format!("--{name}=");
    args.into_iter()
        .filter_map(|arg| arg.strip_prefix(&prefix).map(PathBuf::from))
        .last()
}

fn parse_config(args: &[String]) -> ViewerConfig {
    let defaults = ViewerConfig::default();
    let (width, height) = parse_size_args(args.iter().cloned());
    ViewerConfig {
        backends: parse_backend_arg(args.iter().cloned()),
        width,
        height,
        model_path: parse_path_arg(args.iter().cloned(), "model").unwrap_or(defaults.model_path),
        texture_path: parse_path_arg(args.iter().cloned(), "texture")
            .unwrap_or(defaults.texture_path),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = parse_config(&args);
    log::info!(
        "Starting viewer. Backend: {:?}, window_size={}x{}, model={}, texture={}",
        config.backends,
        config.width,
        config.height,
        config.model_path.display(),
        config.texture_path.display()
    );

    platform::run(config)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_flags_gives_defaults() {
        assert_eq!(parse_config(&[]), ViewerConfig::default());
    }

    #[test]
    fn size_flag_and_clamping() {
        assert_eq!(parse_size_args(args(&["--size=800x600"])), (800, 600));
        assert_eq!(parse_size_args(args(&["--size=640X480"])), (640, 480));
        assert_eq!(parse_size_args(args(&["--width=0", "--height=300"])), (1, 300));
        assert_eq!(parse_size_args(args(&["--size=bogus"])), (1280, 720));
    }

    #[test]
    fn backend_flag() {
        assert_eq!(
            parse_backend_arg(args(&["--gpu-backend=Vulkan"])),
            wgpu::Backends::VULKAN
        );
        assert_eq!(
            parse_backend_arg(args(&["--gpu-backend=nope"])),
            wgpu::Backends::all()
        );
    }

    #[test]
    fn asset_paths() {
        let config = parse_config(&args(&[
            "--model=body.obj",
            "--texture=skin.png",
            "--model=other.obj",
        ]));
        assert_eq!(config.model_path, PathBuf::from("other.obj"));
        assert_eq!(config.texture_path, PathBuf::from("skin.png"));
    }
}
