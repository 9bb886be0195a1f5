//! # Engine State Module
//!
//! Wires the terrain viewer together once the window and GPU exist.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container for the running viewer
//! * `buffer_state` - Registry of named GPU buffers
//! * `camera_state` - Camera movement and the view shared with the workers
//! * `rendering` - Face upload, visibility and the terrain pipeline
//! * `task_management` - The generation worker pool
//! * `voxels` - Density, chunks, meshing input and the chunk store
//!
//! ## Threads
//!
//! The render thread owns everything in this module except the chunk store and the
//! published camera view, which the generation workers share. The workers start last,
//! after every GPU resource has been created, and are joined by [`EngineState::shutdown`].

use std::{sync::Arc, time::Duration};

use camera_state::{camera, CameraState};
use log::info;
use rendering::MeshRendererManager;
use task_management::TaskManager;
use voxels::{
    chunk_spawner::ChunkSpawner, chunk_store::ChunkStore,
    tasks::chunk_generation_task::ChunkGenerationTask,
};
use wgpu::{Device, Queue, Surface, SurfaceConfiguration};
use winit::keyboard::KeyCode;

use crate::{
    application_state::input_state::ProcessedInputState,
    config::EngineConfig,
    core::StResource,
    error::EngineError,
};

mod buffer_state;
pub mod camera_state;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// The state of the running terrain viewer.
///
/// # Examples
///
/// ```rust,ignore
/// let mut engine_state = EngineState::new(
///     surface,
///     surface_config,
///     device,
///     queue,
///     &shader_string,
///     &config,
/// )?;
///
/// // Each frame
/// engine_state.set_input_commands(processed_input);
/// engine_state.process_input(delta_time)?;
/// engine_state.render()?;
///
/// // On exit
/// engine_state.shutdown();
/// ```
pub struct EngineState {
    /// Camera state managing position, orientation and movement
    pub camera_state: CameraState,
    /// Current player actions derived from input
    pub player_actions: PlayerAction,
    /// Manager for terrain rendering
    pub render_manager: MeshRendererManager,
    /// The generation worker pool
    pub task_manager: TaskManager,
    /// Every chunk generated so far
    pub chunk_store: ChunkStore,
}

impl EngineState {
    /// Creates every subsystem and starts the generation workers.
    ///
    /// # Arguments
    ///
    /// * `surface` - The configured rendering surface
    /// * `surface_config` - Configuration of the surface
    /// * `device` - The GPU device
    /// * `queue` - The GPU command queue
    /// * `shader_string` - WGSL source of the terrain shader
    /// * `config` - Engine configuration
    ///
    /// # Errors
    ///
    /// A GPU resource that could not be set up, or a worker thread that could not be
    /// spawned
    pub fn new(
        surface: Surface<'static>,
        surface_config: SurfaceConfiguration,
        device: Device,
        queue: Queue,
        shader_string: &str,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        let device = StResource::new(device);
        let queue = StResource::new(queue);
        let chunk_store = ChunkStore::new();

        let camera_projection = camera::Projection::new(
            surface_config.width,
            surface_config.height,
            cgmath::Deg(camera::DEFAULT_FOV),
            camera::Z_NEAR,
            camera::Z_FAR,
        );
        let camera_state = CameraState::new(&camera_projection);

        let render_manager = MeshRendererManager::new(
            surface,
            surface_config,
            device,
            queue,
            shader_string,
            camera_projection,
            &camera_state.camera_uniform,
            chunk_store.clone(),
            config,
        )?;

        let spawner = Arc::new(ChunkSpawner::with_perlin_terrain(chunk_store.clone(), config));
        let task = Arc::new(ChunkGenerationTask::new(
            spawner,
            camera_state.shared_view(),
            config.base_search_radius,
        ));
        let task_manager = TaskManager::new(
            task,
            config.worker_count,
            Duration::from_millis(config.worker_interval_ms),
        )?;

        Ok(Self {
            camera_state,
            player_actions: PlayerAction::default(),
            render_manager,
            task_manager,
            chunk_store,
        })
    }

    /// Resizes the rendering surface when the window size changes
    pub fn resize_surface(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        self.render_manager.resize_surface(size);
    }

    /// Uploads new chunks and draws the frame
    pub fn render(&mut self) -> Result<(), EngineError> {
        self.render_manager
            .render(self.camera_state.camera.position)
    }

    /// Moves the camera by this frame's input, publishes its view to the workers and
    /// uploads the new camera uniform.
    ///
    /// # Arguments
    ///
    /// * `wait_duration` - The time elapsed since the last frame
    pub fn process_input(&mut self, wait_duration: web_time::Duration) -> Result<(), EngineError> {
        self.camera_state.intake_actions(&self.player_actions);
        // Motion and scroll apply once; held keys keep applying until the next input.
        self.player_actions.rotate_view = None;
        self.player_actions.zoom = 0.0;

        let camera_uniform = *self
            .camera_state
            .update(wait_duration, &mut self.render_manager.camera_projection);
        self.render_manager.write_camera(&camera_uniform)
    }

    /// Sets the input commands for the next [`EngineState::process_input`].
    pub fn set_input_commands(&mut self, input: ProcessedInputState) {
        self.player_actions = translate_processed_input(&input);
    }

    /// Stops and joins the generation workers. Idempotent.
    pub fn shutdown(&mut self) {
        if self.task_manager.is_shut_down() {
            return;
        }

        self.task_manager.shutdown();
        let buffer_state = &self.render_manager.buffer_state;
        info!(
            "Shut down with {} chunks generated, {} of {} GPU bytes used over {} writes",
            self.chunk_store.len(),
            buffer_state.get_total_used_memory(),
            buffer_state.get_total_allocated_memory(),
            buffer_state.get_total_writes()
        );
    }
}

/// Translates one frame of processed input into player actions.
pub fn translate_processed_input(input: &ProcessedInputState) -> PlayerAction {
    PlayerAction {
        move_forward: input.get_key_state(KeyCode::KeyW).is_active(),
        move_backward: input.get_key_state(KeyCode::KeyS).is_active(),
        move_left: input.get_key_state(KeyCode::KeyA).is_active(),
        move_right: input.get_key_state(KeyCode::KeyD).is_active(),
        sprint: input.get_key_state(KeyCode::ShiftLeft).is_active(),
        fly: input.get_key_state(KeyCode::ControlLeft).is_active(),
        rotate_view: input.get_mouse_delta(),
        zoom: input.scroll_lines,
    }
}

/// Represents player actions derived from input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerAction {
    /// Move along the view direction
    pub move_forward: bool,
    /// Move against the view direction
    pub move_backward: bool,
    /// Strafe left
    pub move_left: bool,
    /// Strafe right
    pub move_right: bool,
    /// Move at sprint speed
    pub sprint: bool,
    /// Move at fly speed, wins over sprint
    pub fly: bool,

    /// Mouse motion to turn the view by
    pub rotate_view: Option<(f64, f64)>,

    /// Scroll lines to narrow the field of view by
    pub zoom: f32,
}
