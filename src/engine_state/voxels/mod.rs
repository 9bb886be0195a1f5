//! # Voxel Terrain Core
//!
//! Everything between a world coordinate and a list of visible faces.
//!
//! ## Architecture
//!
//! * **Density**: Pure function deciding whether a world voxel is solid
//! * **Block**: Face directions and the material field
//! * **Chunk**: Fixed-size cubes of voxels and their dense occupancy grid
//! * **ChunkStore**: Shared, insert-only registry of generated chunks
//! * **ChunkSpawner**: Picks chunks around the camera and generates them
//! * **Tasks**: The recurring generation work run by the worker pool
//!
//! ## Data Flow
//!
//! 1. A worker reads the latest camera view
//! 2. The spawner picks missing chunks near or in front of the camera
//! 3. Each chunk is sampled into a `VoxelGrid` and meshed into faces
//! 4. The finished chunk is inserted into the store, first writer wins
//! 5. The render thread picks new chunks up from the store and uploads their faces
//!
//! ## Thread Safety
//!
//! * Density and material fields are immutable and shared freely
//! * Voxel grids are private to one generation call
//! * Published chunks are immutable behind `Arc`

pub mod block;
pub mod chunk;
pub mod chunk_spawner;
pub mod chunk_store;
pub mod density;
pub mod tasks;
