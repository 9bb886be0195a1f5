//! # Voxel Task System
//!
//! Background work on the voxel world, run by the worker pool.

pub mod chunk_generation_task;
