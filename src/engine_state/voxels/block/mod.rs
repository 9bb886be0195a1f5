//! # Block Module
//!
//! Per-voxel properties: which side of a voxel a face covers and which material it
//! shows.

pub mod block_side;
pub mod material;
