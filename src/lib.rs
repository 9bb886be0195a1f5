#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Terrain
//!
//! A real-time voxel terrain viewer built with Rust and WGPU.
//!
//! Terrain is generated from Perlin noise in fixed-size chunks by a pool of background
//! workers that follow a free-flying camera. Each chunk is reduced to the faces between
//! solid and empty voxels and streamed to the GPU, where every face is drawn as one
//! instanced quad.
//!
//! ## Key Modules
//!
//! * `application_state` - Window, graphics initialization and input
//! * `config` - Startup tunables with an optional JSON override
//! * `core` - Shared-ownership containers shared by the render thread and the workers
//! * `engine_state` - Camera, chunk generation, worker pool and rendering
//! * `error` - The crate error type
//!
//! ## Usage
//!
//! ```rust,no_run
//! fn main() {
//!     if let Err(error) = voxel_terrain::run() {
//!         eprintln!("{error}");
//!     }
//! }
//! ```

use application_state::{graphics_resources_builder::GraphicsBuilder, ApplicationState};
use config::EngineConfig;
use error::EngineError;
use log::info;
use winit::event_loop::EventLoop;

mod application_state;
pub mod config;
mod core;
mod engine_state;
pub mod error;

/// Runs the viewer until the window is closed.
///
/// Initializes logging, loads the configuration, then drives the event loop. The
/// generation workers are joined before this returns.
///
/// # Errors
///
/// Any startup failure (configuration, window, GPU context, shader, worker threads) and
/// any fatal render failure
pub fn run() -> Result<(), EngineError> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    let config = EngineConfig::load()?;
    info!(
        "Starting with {}³ chunks, {} materials, {} workers every {} ms, render distance {}",
        config.chunk_dimension,
        config.material_count,
        config.worker_count,
        config.worker_interval_ms,
        config.render_distance
    );

    let event_loop = EventLoop::with_user_event().build()?;
    let mut state = ApplicationState::new(GraphicsBuilder::new(event_loop.create_proxy()), config);

    let loop_result = event_loop.run_app(&mut state);
    let state_result = state.into_result();
    info!("Viewer stopped");

    loop_result?;
    state_result
}
