//! # Engine Errors
//!
//! Every failure the terrain viewer can report. All of them are fatal at startup: the
//! concurrent generation core never starts when one of these is returned from
//! [`crate::run`].
//!
//! Contention between generation workers and a spawner that finds nothing to build are
//! not errors and never show up here.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures surfaced by startup, configuration and the render loop.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The winit event loop could not be created or exited abnormally.
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The operating system refused to create the window.
    #[error("Window creation failed: {0}")]
    WindowCreation(#[from] winit::error::OsError),

    /// The window could not be turned into a wgpu surface.
    #[error("Surface creation failed: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    /// No adapter is compatible with the window surface.
    #[error("No compatible graphics adapter: {0}")]
    AdapterRequest(#[from] wgpu::RequestAdapterError),

    /// The adapter rejected the device descriptor.
    #[error("Device request failed: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// The surface reports no texture format for the adapter.
    #[error("Surface is not supported by the selected adapter")]
    UnsupportedSurface,

    /// A shader file was missing or unreadable.
    #[error("Failed to load shader {path:?}: {source}")]
    ShaderLoad {
        /// Path the shader was read from
        path: PathBuf,
        /// Underlying io failure
        source: io::Error,
    },

    /// The config override file could not be read.
    #[error("Failed to read config {path:?}: {source}")]
    ConfigRead {
        /// Path named by the override variable
        path: PathBuf,
        /// Underlying io failure
        source: io::Error,
    },

    /// The config override file is not valid JSON for [`crate::config::EngineConfig`].
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A config value is outside the range the engine supports.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// A generation worker thread could not be spawned.
    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] io::Error),

    /// A named GPU buffer or bind group was used before it was created.
    #[error("No GPU resource named '{0}'")]
    MissingResource(&'static str),

    /// A buffer write would run past the end of the buffer.
    #[error("Write of {len} bytes at offset {offset} overflows buffer '{name}' of {size} bytes")]
    BufferOverflow {
        /// Registry name of the buffer
        name: &'static str,
        /// Byte offset of the write
        offset: u64,
        /// Length of the write in bytes
        len: u64,
        /// Allocated size of the buffer
        size: u64,
    },

    /// The surface ran out of memory while acquiring a frame.
    #[error("Surface out of memory")]
    SurfaceOutOfMemory,
}
