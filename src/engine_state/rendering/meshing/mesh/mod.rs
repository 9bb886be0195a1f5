//! Conversion of voxel occupancy into GPU-ready face records.
//!
//! # Architecture
//! - [`face::Face`]: one visible quad, four `i32`s, uploaded unchanged to a storage buffer
//! - [`culled::ChunkMesher`]: per-voxel, per-side emission with neighbour culling
//!
//! Faces are never merged: the vertex shader expands each record into a unit quad.

pub mod culled;
pub mod face;
