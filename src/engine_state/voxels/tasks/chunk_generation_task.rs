//! # Chunk Generation Task
//!
//! The recurring work of a generation worker: read the latest camera, then let the
//! spawner fill in missing chunks around it.

use std::sync::Arc;

use crate::{
    core::MtResource,
    engine_state::{
        camera_state::camera::CameraView, task_management::task::Task,
        voxels::chunk_spawner::ChunkSpawner,
    },
};

/// Generates chunks around the most recently published camera.
///
/// One instance is shared by every worker.
pub struct ChunkGenerationTask {
    /// Spawner shared with the other workers
    spawner: Arc<ChunkSpawner>,
    /// Camera state published by the render thread once per frame
    camera: MtResource<CameraView>,
    /// Radius each tick starts searching with
    search_radius: i32,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `spawner` - The spawner chunks are generated with
    /// * `camera` - Camera view kept current by the render thread
    /// * `search_radius` - Starting kernel radius of every tick
    pub fn new(spawner: Arc<ChunkSpawner>, camera: MtResource<CameraView>, search_radius: i32) -> Self {
        ChunkGenerationTask {
            spawner,
            camera,
            search_radius,
        }
    }
}

impl Task for ChunkGenerationTask {
    fn process(&self) -> bool {
        // Copy out so the lock is not held while generating.
        let camera = self.camera.snapshot();
        self.spawner.spawn_nearby(&camera, self.search_radius)
    }
}
