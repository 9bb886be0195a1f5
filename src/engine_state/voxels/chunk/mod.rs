//! # Chunk Module
//!
//! A chunk is a `CHUNK_DIMENSION`³ cube of voxel space and the unit of generation,
//! storage and drawing. Only the chunk's visible faces outlive generation; the dense
//! occupancy grid (`VoxelGrid`) is sampled, meshed and dropped inside one spawner call.
//!
//! Chunks are generated on a single layer, so the Y component of every chunk position
//! is 0. World position of a chunk is `position * chunk_dimension`.

use cgmath::Point3;

use crate::engine_state::rendering::meshing::mesh::face::Face;

pub mod voxel_grid;

/// The dimension (width, height, depth) of a chunk in voxels.
pub const CHUNK_DIMENSION: i32 = 32;

/// A generated chunk: its position in chunk coordinates and its visible faces.
///
/// Immutable once built. The store hands out `Arc<Chunk>` to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not voxel coordinates).
    pub position: Point3<i32>,

    /// Visible faces in scan order, positions already in world voxel coordinates.
    pub faces: Vec<Face>,
}

impl Chunk {
    /// Creates a chunk from its position and meshed faces.
    pub fn new(position: Point3<i32>, faces: Vec<Face>) -> Self {
        Self { position, faces }
    }
}

/// World voxel coordinate of the minimum corner of the chunk at `position`.
pub fn chunk_origin(position: Point3<i32>, chunk_dimension: i32) -> Point3<i32> {
    Point3::new(
        position.x * chunk_dimension,
        position.y * chunk_dimension,
        position.z * chunk_dimension,
    )
}
