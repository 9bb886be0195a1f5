//! # Graphics Resources Builder
//!
//! Creates the window and the WebGPU context the viewer renders with.
//!
//! The main components are:
//! - `Graphics`: Holds all graphics-related resources
//! - `GraphicsBuilder`: Builds them once and hands them to the event loop
//! - `GraphicsEvent`: The user event carrying the result, or the startup failure

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{info, warn};
use wgpu::{Device, Instance, Queue, Surface, SurfaceConfiguration};
use winit::{
    dpi::LogicalSize,
    event_loop::{ActiveEventLoop, EventLoopProxy},
    window::{CursorGrabMode, Window},
};

use crate::error::EngineError;

/// Title of the viewer window.
pub const WINDOW_TITLE: &str = "Voxel Terrain";
/// Initial window width in logical pixels.
pub const WINDOW_WIDTH: u32 = 960;
/// Initial window height in logical pixels.
pub const WINDOW_HEIGHT: u32 = 540;
/// Location of the terrain shader.
pub const SHADER_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/shaders/terrain.wgsl");

/// The user event sent once graphics creation has finished.
pub type GraphicsEvent = Result<Graphics, EngineError>;

/// Contains all graphics-related resources required by the application.
pub struct Graphics {
    /// The viewer window
    pub window: Arc<Window>,
    /// The configured surface of the window
    pub surface: Surface<'static>,
    /// Configuration the surface was configured with
    pub surface_config: SurfaceConfiguration,
    /// The WebGPU device
    pub device: Device,
    /// The WebGPU queue
    pub queue: Queue,
    /// WGSL source of the terrain shader
    pub shader_source: String,
}

/// Creates the window, surface and device and loads the shader.
///
/// # Arguments
/// * `event_loop` - The active event loop used to create the window
fn create_graphics(event_loop: &ActiveEventLoop) -> GraphicsEvent {
    let window_attrs = Window::default_attributes()
        .with_title(WINDOW_TITLE)
        .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));
    let window = Arc::new(event_loop.create_window(window_attrs)?);
    grab_cursor(&window);

    // Backends::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
    let instance = Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        flags: wgpu::InstanceFlags::empty(),
        backend_options: wgpu::BackendOptions::from_env_or_default(),
    });

    let surface = instance.create_surface(window.clone())?;

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: Some(&surface),
        force_fallback_adapter: false,
    }))?;
    info!("Using adapter {}", adapter.get_info().name);

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::default(),
        label: None,
        memory_hints: wgpu::MemoryHints::MemoryUsage,
        trace: wgpu::Trace::Off,
    }))?;

    let size = window.inner_size();
    let surface_caps = surface.get_capabilities(&adapter);
    let surface_format = surface_caps
        .formats
        .iter()
        .find(|f| f.is_srgb())
        .or_else(|| surface_caps.formats.first())
        .copied()
        .ok_or(EngineError::UnsupportedSurface)?;
    let surface_config = SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: surface_format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: surface_caps
            .present_modes
            .first()
            .copied()
            .unwrap_or(wgpu::PresentMode::Fifo),
        alpha_mode: surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };
    surface.configure(&device, &surface_config);

    let shader_source = load_shader(Path::new(SHADER_PATH))?;

    Ok(Graphics {
        window,
        surface,
        surface_config,
        device,
        queue,
        shader_source,
    })
}

/// Confines and hides the cursor so mouse motion turns the camera.
///
/// Platforms support either confining or locking; a window that allows neither still works,
/// with a visible cursor able to leave it.
fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Confined)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked));
    if let Err(error) = grabbed {
        warn!("Could not grab the cursor: {}", error);
    }
    window.set_cursor_visible(false);
}

fn load_shader(path: &Path) -> Result<String, EngineError> {
    std::fs::read_to_string(path).map_err(|source| EngineError::ShaderLoad {
        path: PathBuf::from(path),
        source,
    })
}

/// Builds the graphics resources once and sends them to the event loop.
pub struct GraphicsBuilder {
    event_loop_proxy: Option<EventLoopProxy<GraphicsEvent>>,
}

impl GraphicsBuilder {
    /// Creates a new GraphicsBuilder with the specified event loop proxy.
    ///
    /// # Arguments
    /// * `event_loop_proxy` - Used to send the initialized graphics resources back to the main thread
    pub fn new(event_loop_proxy: EventLoopProxy<GraphicsEvent>) -> Self {
        Self {
            event_loop_proxy: Some(event_loop_proxy),
        }
    }

    /// Creates the graphics resources and sends the result to the event loop.
    ///
    /// Does nothing after the first call.
    pub fn build_and_send(&mut self, event_loop: &ActiveEventLoop) {
        let Some(event_loop_proxy) = self.event_loop_proxy.take() else {
            // event_loop_proxy is already spent - we already constructed Graphics
            return;
        };

        let graphics = create_graphics(event_loop);
        if event_loop_proxy.send_event(graphics).is_err() {
            warn!("Event loop closed before graphics were ready");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terrain_shader_ships_with_the_crate() {
        let source = load_shader(Path::new(SHADER_PATH)).unwrap();
        assert!(source.contains("fn vs_main"));
        assert!(source.contains("fn fs_main"));
    }

    #[test]
    fn missing_shader_is_a_load_error() {
        let result = load_shader(Path::new("/nonexistent/terrain.wgsl"));
        assert!(matches!(result, Err(EngineError::ShaderLoad { .. })));
    }
}
