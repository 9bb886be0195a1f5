//! Rendering system for the terrain viewer.
//!
//! Each frame the render manager picks up chunks published since the last frame, uploads
//! their faces into the shared face buffer, selects the chunks within render distance and
//! draws them with the terrain pipeline.

use cgmath::Point3;
use log::{debug, warn};
use pipeline_manager::PipelineManager;
use render_feeder::RenderFeeder;
use wgpu::{Device, Queue, Surface, SurfaceConfiguration};

use crate::{
    config::EngineConfig,
    core::StResource,
    error::EngineError,
};

use super::{
    buffer_state::BufferState,
    camera_state::camera::{self, CameraUniform},
    voxels::chunk_store::ChunkStore,
};
use meshing::FACE_BUFFER_NAME;

mod bind_group_state;
pub mod meshing;
mod pipeline_manager;
pub mod render_feeder;
mod texture;

/// Name of the GPU buffer used for camera uniform data
pub const CAMERA_BUFFER_NAME: &str = "camera_buffer";
/// Size the face buffer starts out with, in bytes
pub const INITIAL_FACE_BUFFER_SIZE: u64 = 1 << 20;

/// Manages the entire rendering pipeline of the terrain viewer.
///
/// Owns the surface and every GPU resource. Lives on the render thread only.
pub struct MeshRendererManager {
    /// The WebGPU surface being rendered to
    pub surface: Surface<'static>,
    /// Configuration for the surface (size, format, etc.)
    pub surface_config: SurfaceConfiguration,
    /// The WebGPU device used for creating GPU resources
    pub device: StResource<Device>,
    /// The WebGPU queue for submitting command buffers
    pub queue: StResource<Queue>,
    /// Registry of the camera and face buffers
    pub buffer_state: BufferState,
    /// Manages the rendering pipeline and shaders
    pub pipeline_manager: PipelineManager,
    /// Camera projection settings
    pub camera_projection: camera::Projection,
    /// Tracks which chunks are uploaded and which to draw
    feeder: RenderFeeder,
    /// Chunks published by the generation workers
    store: ChunkStore,
    /// Largest face buffer the device can bind
    face_buffer_limit: u64,
    /// Whether chunks in range did not fit during the last sync
    saturated: bool,
}

impl MeshRendererManager {
    /// Creates the camera and face buffers and the terrain pipeline.
    ///
    /// # Arguments
    /// * `surface` - The configured surface to render to
    /// * `surface_config` - Configuration the surface was configured with
    /// * `device` - The WebGPU device
    /// * `queue` - The WebGPU queue
    /// * `shader_string` - WGSL source of the terrain shader
    /// * `camera_projection` - Initial camera projection settings
    /// * `camera_uniform` - Initial camera data
    /// * `store` - Chunk store the workers publish into
    /// * `config` - Engine configuration
    ///
    /// # Returns
    /// The render manager, or the error of a missing pipeline resource
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        surface: Surface<'static>,
        surface_config: SurfaceConfiguration,
        device: StResource<Device>,
        queue: StResource<Queue>,
        shader_string: &str,
        camera_projection: camera::Projection,
        camera_uniform: &CameraUniform,
        store: ChunkStore,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        let face_buffer_limit = {
            let limits = device.get().limits();
            (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size)
        };

        let mut buffer_state = BufferState::new(device.clone(), queue.clone());
        buffer_state.create_buffer_init(
            CAMERA_BUFFER_NAME,
            wgpu::util::BufferInitDescriptor {
                label: Some(CAMERA_BUFFER_NAME),
                contents: bytemuck::cast_slice(&[*camera_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );
        buffer_state.create_buffer(
            FACE_BUFFER_NAME,
            wgpu::BufferDescriptor {
                label: Some(FACE_BUFFER_NAME),
                size: INITIAL_FACE_BUFFER_SIZE.min(face_buffer_limit),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            },
        );

        let pipeline_manager = PipelineManager::new(
            &device.get(),
            &surface_config,
            surface_config.format,
            buffer_state.get_buffer(CAMERA_BUFFER_NAME)?,
            buffer_state.get_buffer(FACE_BUFFER_NAME)?,
            shader_string,
        )?;

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            buffer_state,
            pipeline_manager,
            camera_projection,
            feeder: RenderFeeder::new(config.chunk_dimension, config.render_distance),
            store,
            face_buffer_limit,
            saturated: false,
        })
    }

    /// Handles window resize events.
    ///
    /// Updates the surface configuration, camera projection, and depth texture. A zero
    /// sized window (minimized) is ignored.
    ///
    /// # Arguments
    /// * `size` - The new window size in physical pixels
    pub fn resize_surface(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }

        self.surface_config.width = size.width;
        self.surface_config.height = size.height;
        self.surface.configure(&self.device.get(), &self.surface_config);

        self.camera_projection.resize(size.width, size.height);
        self.pipeline_manager
            .resize(&self.device.get(), &self.surface_config);
    }

    /// Uploads new camera data.
    pub fn write_camera(&self, camera_uniform: &CameraUniform) -> Result<(), EngineError> {
        self.buffer_state
            .write_buffer(CAMERA_BUFFER_NAME, 0, bytemuck::cast_slice(&[*camera_uniform]))
    }

    /// Uploads the faces of every chunk within render distance that is not resident yet.
    ///
    /// Grows the face buffer as needed. At the device limit, chunks that fell out of range
    /// make room for new ones in range.
    ///
    /// # Arguments
    /// * `camera_position` - Position the render distance is measured from
    pub fn sync_chunks(&mut self, camera_position: Point3<f32>) -> Result<(), EngineError> {
        let jobs = self
            .feeder
            .intake(&self.store, camera_position, self.face_buffer_limit);

        let unplaced = self.feeder.unplaced();
        if unplaced > 0 && !self.saturated {
            warn!(
                "Face buffer is full at {} bytes, {} chunks in range are not drawn",
                self.feeder.required_bytes(),
                unplaced
            );
        }
        self.saturated = unplaced > 0;

        if jobs.is_empty() {
            return Ok(());
        }

        let grown = self.buffer_state.ensure_capacity(
            FACE_BUFFER_NAME,
            self.feeder.required_bytes(),
            self.face_buffer_limit,
        )?;
        if grown {
            let face_buffer = self.buffer_state.get_buffer(FACE_BUFFER_NAME)?;
            self.pipeline_manager
                .rebind_faces(&self.device.get(), face_buffer);
        }

        for job in jobs.iter().filter(|job| !job.chunk.faces.is_empty()) {
            self.buffer_state
                .write_buffer(FACE_BUFFER_NAME, job.byte_offset(), job.bytes())?;
        }

        debug!(
            "Uploaded {} chunks, {} faces in {} resident chunks",
            jobs.len(),
            self.feeder.face_total(),
            self.feeder.resident().len()
        );
        Ok(())
    }

    /// Renders a new frame.
    ///
    /// Lost or outdated surfaces are reconfigured and the frame is skipped.
    ///
    /// # Arguments
    /// * `camera_position` - Position the render distance is measured from
    ///
    /// # Errors
    /// [`EngineError::SurfaceOutOfMemory`] if no frame can be acquired for lack of memory,
    /// or the error of a failed upload
    pub fn render(&mut self, camera_position: Point3<f32>) -> Result<(), EngineError> {
        self.sync_chunks(camera_position)?;

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device.get(), &self.surface_config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(EngineError::SurfaceOutOfMemory),
            Err(error) => {
                warn!("Skipping frame: {}", error);
                return Ok(());
            }
        };

        let draws = self.feeder.visible_draws(camera_position);
        self.pipeline_manager
            .render(frame, &self.device.get(), &self.queue.get(), &draws)
    }
}
