//! Chunk meshing and the renderer that draws the resulting faces.

pub mod mesh;
mod renderer;

pub use renderer::*;

/// Name of the storage buffer holding every resident face
pub const FACE_BUFFER_NAME: &str = "face_buffer";
