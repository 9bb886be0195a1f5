//! # Chunk Spawner Module
//!
//! Decides which chunks to generate around the camera and generates them.
//!
//! ## Policy
//!
//! One pass walks a square kernel of chunk coordinates centred on the camera's chunk
//! (on the generation layer, Y = 0). A candidate missing from the store is generated when
//! it is *render-worthy*:
//! - closer than the proximity threshold to the camera chunk, so the camera is never left
//!   in a void, or
//! - in the camera's forward hemisphere, judged by the direction to the chunk centre
//!
//! When a pass inserts nothing the kernel widens by a fixed step until the ceiling is
//! reached; then the call gives up and the worker's next tick tries again.
//!
//! Chunks far away *and* behind the camera are left alone until the camera turns towards
//! them.

use std::sync::Arc;

use cgmath::{InnerSpace, MetricSpace, Point3, Vector3};
use log::{debug, trace};
use web_time::Instant;

use crate::{
    config::EngineConfig,
    engine_state::{
        camera_state::camera::CameraView,
        rendering::meshing::mesh::culled::ChunkMesher,
    },
};

use super::{
    block::material::MaterialField,
    chunk::{voxel_grid::VoxelGrid, Chunk},
    chunk_store::ChunkStore,
    density::{DensityField, PerlinDensityField},
};

/// Kernel radius a worker starts each search with.
pub const BASE_SEARCH_RADIUS: i32 = 1;
/// Radius added each time a pass spawns nothing.
pub const SEARCH_RADIUS_STEP: i32 = 4;
/// The kernel stops widening once its radius reaches this value.
pub const SEARCH_RADIUS_CEILING: i32 = 20;
/// Chunks closer than this (in chunk coordinates) are generated whatever the facing.
pub const PROXIMITY_THRESHOLD: f32 = 20.0;

/// Generates chunks around the camera into a shared [`ChunkStore`].
///
/// Shared between all generation workers; every method takes `&self`.
pub struct ChunkSpawner {
    store: ChunkStore,
    density: Arc<dyn DensityField>,
    mesher: ChunkMesher,
    chunk_dimension: i32,
    proximity_threshold: f32,
    radius_step: i32,
    radius_ceiling: i32,
}

impl ChunkSpawner {
    /// Creates a spawner over an arbitrary density field.
    ///
    /// # Arguments
    /// * `store` - Registry generated chunks are inserted into
    /// * `density` - Field deciding which voxels are solid
    /// * `config` - Chunk size, material and search tunables
    pub fn new(store: ChunkStore, density: Arc<dyn DensityField>, config: &EngineConfig) -> Self {
        let materials =
            MaterialField::new(config.seed, config.material_frequency, config.material_count);
        let mesher = ChunkMesher::new(density.clone(), materials);

        Self {
            store,
            density,
            mesher,
            chunk_dimension: config.chunk_dimension,
            proximity_threshold: config.proximity_threshold,
            radius_step: config.search_radius_step,
            radius_ceiling: config.search_radius_ceiling,
        }
    }

    /// Creates a spawner over the stock Perlin terrain described by `config`.
    pub fn with_perlin_terrain(store: ChunkStore, config: &EngineConfig) -> Self {
        let density = Arc::new(PerlinDensityField::new(
            config.seed,
            config.noise_frequency,
            config.noise_amplitude,
            config.chunk_dimension,
        ));
        Self::new(store, density, config)
    }

    /// The store this spawner inserts into.
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Chunk coordinate under the camera, projected onto the generation layer.
    pub fn camera_chunk(&self, camera: &CameraView) -> Point3<i32> {
        let dimension = self.chunk_dimension as f32;
        Point3::new(
            (camera.position.x / dimension).floor() as i32,
            0,
            (camera.position.z / dimension).floor() as i32,
        )
    }

    /// Whether `candidate` should be generated for this camera.
    ///
    /// # Arguments
    /// * `camera` - Camera position and forward direction
    /// * `camera_chunk` - Result of [`ChunkSpawner::camera_chunk`] for the same camera
    /// * `candidate` - Chunk coordinate under consideration
    pub fn is_render_worthy(
        &self,
        camera: &CameraView,
        camera_chunk: Point3<i32>,
        candidate: Point3<i32>,
    ) -> bool {
        let camera_chunk_f = Point3::new(
            camera_chunk.x as f32,
            camera_chunk.y as f32,
            camera_chunk.z as f32,
        );
        let candidate_f = Point3::new(candidate.x as f32, candidate.y as f32, candidate.z as f32);
        if camera_chunk_f.distance(candidate_f) < self.proximity_threshold {
            return true;
        }

        let half = (self.chunk_dimension / 2) as f32;
        let dimension = self.chunk_dimension as f32;
        let chunk_center = Point3::new(
            candidate_f.x * dimension + half,
            candidate_f.y * dimension + half,
            candidate_f.z * dimension + half,
        );
        let to_chunk: Vector3<f32> = (chunk_center - camera.position).normalize();

        camera.front.dot(to_chunk) > 0.0
    }

    /// Samples and meshes the chunk at `position`. Does not touch the store.
    pub fn generate(&self, position: Point3<i32>) -> Chunk {
        let grid = VoxelGrid::sample(self.density.as_ref(), position, self.chunk_dimension);
        let faces = self.mesher.mesh(&grid, position);
        Chunk::new(position, faces)
    }

    /// Generates missing render-worthy chunks near the camera.
    ///
    /// Runs one pass over the kernel of `search_radius`; while a pass inserts nothing and
    /// the radius is below the ceiling, widens the kernel by the step and runs another.
    ///
    /// # Arguments
    /// * `camera` - Camera position and forward direction
    /// * `search_radius` - Radius of the first kernel; it covers `(2r + 1)²` chunks
    ///
    /// # Returns
    /// `true` if at least one chunk was inserted into the store
    pub fn spawn_nearby(&self, camera: &CameraView, search_radius: i32) -> bool {
        let mut radius = search_radius;

        loop {
            if self.spawn_pass(camera, radius) {
                return true;
            }
            if radius >= self.radius_ceiling {
                trace!("Nothing to spawn up to radius {}", radius);
                return false;
            }
            radius += self.radius_step;
        }
    }

    fn spawn_pass(&self, camera: &CameraView, radius: i32) -> bool {
        let camera_chunk = self.camera_chunk(camera);
        let mut spawned = false;

        for offset_z in -radius..=radius {
            for offset_x in -radius..=radius {
                let candidate = Point3::new(camera_chunk.x + offset_x, 0, camera_chunk.z + offset_z);

                if self.store.contains(candidate)
                    || !self.is_render_worthy(camera, camera_chunk, candidate)
                {
                    continue;
                }

                let start = Instant::now();
                let chunk = self.generate(candidate);
                let face_count = chunk.faces.len();

                // Losing a race to another worker is expected; the duplicate is dropped.
                if self.store.insert(chunk) {
                    debug!(
                        "Spawned chunk {:?} with {} faces in {:?}",
                        candidate,
                        face_count,
                        start.elapsed()
                    );
                    spawned = true;
                }
            }
        }

        spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashSet, sync::Barrier, thread};

    const DIMENSION: i32 = 4;

    fn test_config() -> EngineConfig {
        EngineConfig {
            chunk_dimension: DIMENSION,
            material_count: 1,
            ..EngineConfig::default()
        }
    }

    fn air_spawner(config: &EngineConfig) -> ChunkSpawner {
        let air: Arc<dyn DensityField> = Arc::new(|_: Point3<i32>| false);
        ChunkSpawner::new(ChunkStore::new(), air, config)
    }

    /// High above the layer and looking straight up: nothing is in front of the camera.
    fn camera_looking_away() -> CameraView {
        CameraView {
            position: Point3::new(2.0, 1000.0, 2.0),
            front: Vector3::new(0.0, 1.0, 0.0),
        }
    }

    fn within_proximity(radius: i32) -> HashSet<Point3<i32>> {
        let mut expected = HashSet::new();
        for z in -radius..=radius {
            for x in -radius..=radius {
                if (((x * x + z * z) as f32).sqrt()) < PROXIMITY_THRESHOLD {
                    expected.insert(Point3::new(x, 0, z));
                }
            }
        }
        expected
    }

    fn stored_positions(spawner: &ChunkSpawner) -> Vec<Point3<i32>> {
        spawner.store().snapshot().iter().map(|c| c.position).collect()
    }

    #[test]
    fn camera_chunk_floors_and_ignores_height() {
        let spawner = air_spawner(&test_config());
        let camera = CameraView {
            position: Point3::new(-0.5, 77.0, 9.0),
            front: Vector3::new(1.0, 0.0, 0.0),
        };
        assert_eq!(spawner.camera_chunk(&camera), Point3::new(-1, 0, 2));
    }

    #[test]
    fn proximity_overrides_facing() {
        let spawner = air_spawner(&test_config());
        let camera = camera_looking_away();

        assert!(spawner.spawn_nearby(&camera, 20));

        let stored: HashSet<_> = stored_positions(&spawner).into_iter().collect();
        assert_eq!(stored, within_proximity(20));
        assert!(!stored.contains(&Point3::new(20, 0, 0)));
        assert!(stored.contains(&Point3::new(19, 0, 0)));
    }

    #[test]
    fn worthiness_is_measured_from_a_distant_camera_chunk() {
        let spawner = air_spawner(&test_config());
        let camera = CameraView {
            position: Point3::new(-400.0, 1000.0, 1200.0),
            front: Vector3::new(0.0, 1.0, 0.0),
        };
        let camera_chunk = spawner.camera_chunk(&camera);
        assert_eq!(camera_chunk, Point3::new(-100, 0, 300));

        let worthy = |offset: Vector3<i32>| {
            spawner.is_render_worthy(&camera, camera_chunk, camera_chunk + offset)
        };
        assert!(worthy(Vector3::new(0, 0, 0)));
        assert!(worthy(Vector3::new(-19, 0, 0)));
        assert!(worthy(Vector3::new(12, 0, -15)));
        assert!(!worthy(Vector3::new(0, 0, 20)));
        assert!(!spawner.is_render_worthy(&camera, camera_chunk, Point3::new(0, 0, 0)));
    }

    #[test]
    fn respawning_a_full_neighbourhood_is_a_no_op() {
        let spawner = air_spawner(&test_config());
        let camera = camera_looking_away();
        spawner.spawn_nearby(&camera, 20);
        let before = spawner.store().len();

        assert!(!spawner.spawn_nearby(&camera, BASE_SEARCH_RADIUS));
        assert!(!spawner.spawn_nearby(&camera, 20));
        assert_eq!(spawner.store().len(), before);
    }

    #[test]
    fn far_chunks_need_to_be_in_front() {
        let config = EngineConfig {
            proximity_threshold: 0.0,
            ..test_config()
        };
        let spawner = air_spawner(&config);
        let camera = CameraView {
            position: Point3::new(2.0, 2.0, 2.0),
            front: Vector3::new(1.0, 0.0, 0.0),
        };

        assert!(spawner.spawn_nearby(&camera, 2));
        for position in stored_positions(&spawner) {
            assert!(position.x >= 1, "{:?} is behind the camera", position);
        }
        // x = 1 and x = 2 columns of the radius-2 kernel.
        assert_eq!(spawner.store().len(), 10);
    }

    #[test]
    fn search_widens_when_the_kernel_is_full() {
        let spawner = air_spawner(&test_config());
        let camera = camera_looking_away();
        for z in -1..=1 {
            for x in -1..=1 {
                spawner.store().insert(spawner.generate(Point3::new(x, 0, z)));
            }
        }

        assert!(spawner.spawn_nearby(&camera, 1));

        let positions = stored_positions(&spawner);
        assert_eq!(positions.len(), 11 * 11);
        assert!(positions.iter().all(|p| p.x.abs() <= 5 && p.z.abs() <= 5));
    }

    #[test]
    fn gives_up_when_nothing_is_worthy() {
        let config = EngineConfig {
            proximity_threshold: 0.0,
            ..test_config()
        };
        let spawner = air_spawner(&config);

        assert!(!spawner.spawn_nearby(&camera_looking_away(), BASE_SEARCH_RADIUS));
        assert_eq!(spawner.store().len(), 0);
    }

    #[test]
    fn generated_faces_are_in_world_space() {
        let config = test_config();
        let block: Arc<dyn DensityField> = Arc::new(|p: Point3<i32>| p == Point3::new(9, 1, -3));
        let spawner = ChunkSpawner::new(ChunkStore::new(), block, &config);

        let chunk = spawner.generate(Point3::new(2, 0, -1));
        assert_eq!(chunk.faces.len(), 6);
        assert!(chunk.faces.iter().all(|f| f.position() == Point3::new(9, 1, -3)));
    }

    #[test]
    fn racing_workers_build_each_chunk_once() {
        let spawner = Arc::new(air_spawner(&test_config()));
        let barrier = Arc::new(Barrier::new(2));
        let camera = camera_looking_away();

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let spawner = spawner.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    spawner.spawn_nearby(&camera, 20)
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let positions = stored_positions(&spawner);
        let unique: HashSet<_> = positions.iter().copied().collect();
        assert_eq!(unique.len(), positions.len(), "duplicate chunk in store");
        assert_eq!(unique, within_proximity(20));
    }
}
