//! Platform layer: windowing & event loop.
//!
//! The viewer context owns the window and GPU state; winit drives it through
//! [`ApplicationHandler`]: resize events go to [`GpuState::resize`], redraws to
//! [`GpuState::render`], and close ends the loop.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use asset::{obj::load_model_from_path, texture::TextureData};
use renderer::{GpuState, SceneAssets};
use wgpu::{Backends, SurfaceError};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

pub const WINDOW_TITLE: &str = "Human Anatomy Viewer";
const WINDOW_POSITION: PhysicalPosition<i32> = PhysicalPosition::new(500, 300);

/// Everything [`run`] needs to open the window and find its assets.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    pub backends: Backends,
    pub width: u32,
    pub height: u32,
    pub model_path: PathBuf,
    pub texture_path: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            backends: Backends::all(),
            width: 1280,
            height: 720,
            model_path: PathBuf::from("threehuman.obj"),
            texture_path: PathBuf::from("skinTexture.jpg"),
        }
    }
}

/// Explicit viewer context. Replaces ambient globals: the resize handler and the frame
/// loop both reach the GPU state through `&mut self`.
struct Viewer {
    config: ViewerConfig,
    assets: SceneAssets,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    fatal: Option<anyhow::Error>,
}

impl Viewer {
    fn new(config: ViewerConfig, assets: SceneAssets) -> Self {
        Self {
            config,
            assets,
            window: None,
            gpu: None,
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn create_window(&self, event_loop: &ActiveEventLoop) -> Result<Arc<Window>> {
        let attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_position(WINDOW_POSITION)
            .with_resizable(true);
        let window = event_loop
            .create_window(attributes)
            .map_err(|e| anyhow!("window can not be created: {e}"))?;
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );
        Ok(Arc::new(window))
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if gpu.is_minimised() {
            return;
        }
        match gpu.render() {
            Ok(()) => {}
            Err(err) if GpuState::is_surface_lost(&err) => {
                log::warn!("Surface {err:?}, reconfiguring");
                gpu.recreate_surface();
            }
            Err(SurfaceError::OutOfMemory) => {
                self.fail(event_loop, anyhow!("GPU out of memory while presenting"));
            }
            Err(err) => log::warn!("Skipping frame: {err:?}"),
        }
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match self.create_window(event_loop) {
            Ok(window) => window,
            Err(err) => return self.fail(event_loop, err),
        };
        let gpu = pollster::block_on(GpuState::new(
            window.clone(),
            self.config.backends,
            &self.assets,
        ));
        match gpu {
            Ok(gpu) => {
                self.gpu = Some(gpu);
                self.window = Some(window);
            }
            Err(err) => self.fail(event_loop, err.context("GPU initialization failed")),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                log::info!("Resized: {}x{}", new_size.width, new_size.height);
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Continuous animation while visible; sleep until the next event while minimised.
        let animating = self.gpu.as_ref().is_some_and(|gpu| !gpu.is_minimised());
        event_loop.set_control_flow(control_flow_for(animating));
        if animating {
            if let Some(window) = self.window.as_ref() {
                window.request_redraw();
            }
        }
    }
}

fn control_flow_for(animating: bool) -> ControlFlow {
    if animating {
        ControlFlow::Poll
    } else {
        ControlFlow::Wait
    }
}

/// Load the model and texture named by `config`.
pub fn load_assets(config: &ViewerConfig) -> Result<SceneAssets> {
    let model = load_model_from_path(&config.model_path)?;
    let texture = TextureData::load(&config.texture_path)?;
    Ok(SceneAssets { model, texture })
}

/// Open the viewer window and render until it is closed.
pub fn run(config: ViewerConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("windowing subsystem can not be initialized")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let assets = load_assets(&config)?;
    let mut viewer = Viewer::new(config, assets);

    event_loop
        .run_app(&mut viewer)
        .map_err(|e| anyhow!("Event loop error: {e:?}"))?;

    match viewer.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_demo() {
        let config = ViewerConfig::default();
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.model_path, PathBuf::from("threehuman.obj"));
        assert_eq!(config.texture_path, PathBuf::from("skinTexture.jpg"));
        assert_eq!(config.backends, Backends::all());
    }

    #[test]
    fn loop_sleeps_unless_animating() {
        assert_eq!(control_flow_for(true), ControlFlow::Poll);
        assert_eq!(control_flow_for(false), ControlFlow::Wait);
    }

    #[test]
    fn missing_assets_are_reported() {
        let config = ViewerConfig {
            model_path: PathBuf::from("/definitely/not/here.obj"),
            ..ViewerConfig::default()
        };
        let err = match load_assets(&config) {
            Ok(_) => panic!("expected missing model to fail"),
            Err(err) => err,
        };
        assert!(format!("{err:#}").contains("here.obj"));
    }
}
