//! # Render Feeder
//!
//! Turns the chunk store into GPU work for the render thread.
//!
//! Published chunks never change, so a chunk is uploaded once and stays resident while it
//! is within render distance. Chunks outside the render distance are not uploaded. When a
//! chunk in range no longer fits in the face buffer, residents that fell out of range are
//! evicted and the ones still in range are packed again from the start of the buffer.
//!
//! ## Layout
//!
//! A resident chunk's faces occupy instances `first_instance..first_instance + face_count`;
//! the shader reads face `instance_index`.

use std::sync::Arc;

use cgmath::{MetricSpace, Point3};
use wgpu::util::DrawIndirectArgs;

use crate::engine_state::{
    rendering::meshing::mesh::face::Face,
    voxels::{
        chunk::{chunk_origin, Chunk},
        chunk_store::ChunkStore,
    },
};

/// Chunks whose origin is this far or farther from the camera (XZ plane) are not drawn.
pub const RENDER_DISTANCE: f32 = 500.0;
/// Vertices per face quad, drawn as a triangle strip.
pub const VERTICES_PER_FACE: u32 = 4;

const FACE_SIZE: u64 = std::mem::size_of::<Face>() as u64;

/// Where a resident chunk's faces live in the face buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidentChunk {
    /// Chunk coordinate
    pub position: Point3<i32>,
    /// Index of the chunk's first face in the face buffer
    pub first_instance: u32,
    /// Number of faces
    pub face_count: u32,
    /// Index into the feeder's list of known chunks
    index: usize,
}

/// A chunk that still has to be written into the face buffer.
pub struct UploadJob {
    /// The chunk to upload
    pub chunk: Arc<Chunk>,
    /// Index of the chunk's first face in the face buffer
    pub first_instance: u32,
}

impl UploadJob {
    /// Byte offset of the chunk's faces in the face buffer.
    pub fn byte_offset(&self) -> u64 {
        self.first_instance as u64 * FACE_SIZE
    }

    /// The chunk's faces as bytes.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.chunk.faces)
    }
}

/// Tracks which chunks are resident on the GPU and which of them to draw.
#[derive(Debug)]
pub struct RenderFeeder {
    /// Every chunk taken from the store, in store order
    chunks: Vec<Arc<Chunk>>,
    /// Whether the chunk at the same index in `chunks` is resident
    is_resident: Vec<bool>,
    resident: Vec<ResidentChunk>,
    face_total: u32,
    unplaced: usize,
    chunk_dimension: i32,
    render_distance: f32,
}

impl RenderFeeder {
    /// Creates a feeder with nothing resident.
    ///
    /// # Arguments
    /// * `chunk_dimension` - Voxels per chunk edge
    /// * `render_distance` - Draw cutoff in world units
    pub fn new(chunk_dimension: i32, render_distance: f32) -> Self {
        Self {
            chunks: Vec::new(),
            is_resident: Vec::new(),
            resident: Vec::new(),
            face_total: 0,
            unplaced: 0,
            chunk_dimension,
            render_distance,
        }
    }

    /// Takes in newly published chunks and assigns buffer ranges to every chunk within
    /// render distance that is not resident yet.
    ///
    /// If a chunk in range would push the face buffer past `max_bytes`, residents out of
    /// range are evicted and the rest are packed again, which re-uploads them. In-range
    /// chunks that still do not fit are counted by [`RenderFeeder::unplaced`] and offered
    /// again by the next call.
    ///
    /// # Arguments
    /// * `store` - The chunk store to read from
    /// * `camera_position` - Position the render distance is measured from
    /// * `max_bytes` - Largest face buffer the device can bind
    ///
    /// # Returns
    /// The chunks to write into the face buffer, later jobs overwriting earlier ones
    pub fn intake(
        &mut self,
        store: &ChunkStore,
        camera_position: Point3<f32>,
        max_bytes: u64,
    ) -> Vec<UploadJob> {
        let new_chunks = store.snapshot_since(self.chunks.len());
        self.is_resident.resize(self.is_resident.len() + new_chunks.len(), false);
        self.chunks.extend(new_chunks);

        let camera_xz = flatten(camera_position);
        let max_faces = max_bytes / FACE_SIZE;
        let mut jobs = Vec::new();
        let mut compacted = false;
        self.unplaced = 0;

        for index in 0..self.chunks.len() {
            if self.is_resident[index] || !self.in_range(self.chunks[index].position, camera_xz) {
                continue;
            }

            let face_count = self.chunks[index].faces.len() as u64;
            if self.face_total as u64 + face_count > max_faces && !compacted {
                compacted = true;
                if let Some(repacked) = self.compact(camera_xz) {
                    jobs = repacked;
                }
            }
            if self.face_total as u64 + face_count > max_faces {
                self.unplaced += 1;
                continue;
            }

            jobs.push(self.place(index));
        }

        jobs
    }

    /// Makes the chunk at `index` resident after the current last one.
    fn place(&mut self, index: usize) -> UploadJob {
        let chunk = Arc::clone(&self.chunks[index]);
        let first_instance = self.face_total;
        let face_count = chunk.faces.len() as u32;

        self.is_resident[index] = true;
        self.resident.push(ResidentChunk {
            position: chunk.position,
            first_instance,
            face_count,
            index,
        });
        self.face_total += face_count;

        UploadJob {
            chunk,
            first_instance,
        }
    }

    /// Evicts residents out of range and packs the remaining ones from the buffer start.
    ///
    /// Returns `None`, changing nothing, when every resident is still in range.
    fn compact(&mut self, camera_xz: Point3<f32>) -> Option<Vec<UploadJob>> {
        let mut kept: Vec<usize> = self
            .resident
            .iter()
            .filter(|resident| self.in_range(resident.position, camera_xz))
            .map(|resident| resident.index)
            .collect();
        if kept.len() == self.resident.len() {
            return None;
        }

        for resident in self.resident.drain(..) {
            self.is_resident[resident.index] = false;
        }
        self.face_total = 0;

        kept.sort_unstable();
        Some(kept.into_iter().map(|index| self.place(index)).collect())
    }

    fn in_range(&self, position: Point3<i32>, camera_xz: Point3<f32>) -> bool {
        let origin = chunk_origin(position, self.chunk_dimension);
        let origin = Point3::new(origin.x as f32, origin.y as f32, origin.z as f32);
        origin.distance(camera_xz) < self.render_distance
    }

    /// Chunks currently in the face buffer.
    pub fn resident(&self) -> &[ResidentChunk] {
        &self.resident
    }

    /// Chunks in range that did not fit into the face buffer during the last intake.
    pub fn unplaced(&self) -> usize {
        self.unplaced
    }

    /// Faces currently in the face buffer.
    pub fn face_total(&self) -> u32 {
        self.face_total
    }

    /// Bytes the face buffer needs to hold every resident face.
    pub fn required_bytes(&self) -> u64 {
        self.face_total as u64 * FACE_SIZE
    }

    /// Draw commands for this frame.
    ///
    /// A chunk is drawn if it is resident, has faces and its world origin lies strictly
    /// within the render distance of the camera projected onto Y = 0.
    pub fn visible_draws(&self, camera_position: Point3<f32>) -> Vec<DrawIndirectArgs> {
        let camera_xz = flatten(camera_position);

        self.resident
            .iter()
            .filter(|chunk| chunk.face_count > 0)
            .filter(|chunk| self.in_range(chunk.position, camera_xz))
            .map(|chunk| DrawIndirectArgs {
                vertex_count: VERTICES_PER_FACE,
                instance_count: chunk.face_count,
                first_vertex: 0,
                first_instance: chunk.first_instance,
            })
            .collect()
    }
}

fn flatten(position: Point3<f32>) -> Point3<f32> {
    Point3::new(position.x, 0.0, position.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_side::BlockSide;

    const ORIGIN: Point3<f32> = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    fn chunk(position: Point3<i32>, face_count: usize) -> Chunk {
        let faces = (0..face_count)
            .map(|i| Face::new(Point3::new(i as i32, 0, 0), BlockSide::TOP, 0))
            .collect();
        Chunk::new(position, faces)
    }

    fn offsets(jobs: &[UploadJob]) -> Vec<(i32, u32)> {
        jobs.iter()
            .map(|job| (job.chunk.position.x, job.first_instance))
            .collect()
    }

    #[test]
    fn intake_packs_new_chunks_back_to_back() {
        let store = ChunkStore::new();
        store.insert(chunk(Point3::new(0, 0, 0), 3));
        store.insert(chunk(Point3::new(1, 0, 0), 0));
        store.insert(chunk(Point3::new(2, 0, 0), 5));

        let mut feeder = RenderFeeder::new(32, RENDER_DISTANCE);
        let jobs = feeder.intake(&store, ORIGIN, u64::MAX);

        assert_eq!(offsets(&jobs), vec![(0, 0), (1, 3), (2, 3)]);
        assert_eq!(jobs[2].byte_offset(), 48);
        assert_eq!(jobs[2].bytes().len(), 80);
        assert_eq!(feeder.face_total(), 8);
        assert_eq!(feeder.required_bytes(), 128);

        store.insert(chunk(Point3::new(3, 0, 0), 2));
        let jobs = feeder.intake(&store, ORIGIN, u64::MAX);
        assert_eq!(offsets(&jobs), vec![(3, 8)]);

        assert!(feeder.intake(&store, ORIGIN, u64::MAX).is_empty());
        assert_eq!(feeder.resident().len(), 4);
    }

    #[test]
    fn chunk_that_does_not_fit_is_offered_again() {
        let store = ChunkStore::new();
        store.insert(chunk(Point3::new(0, 0, 0), 2));
        store.insert(chunk(Point3::new(1, 0, 0), 2));
        store.insert(chunk(Point3::new(2, 0, 0), 1));

        let mut feeder = RenderFeeder::new(32, RENDER_DISTANCE);
        let jobs = feeder.intake(&store, ORIGIN, 48);
        assert_eq!(offsets(&jobs), vec![(0, 0), (2, 2)]);
        assert_eq!(feeder.unplaced(), 1);

        let jobs = feeder.intake(&store, ORIGIN, 80);
        assert_eq!(offsets(&jobs), vec![(1, 3)]);
        assert_eq!(feeder.unplaced(), 0);
        assert_eq!(feeder.required_bytes(), 80);
    }

    #[test]
    fn distant_chunks_upload_once_the_camera_is_near() {
        let store = ChunkStore::new();
        store.insert(chunk(Point3::new(0, 0, 0), 4));
        store.insert(chunk(Point3::new(1, 0, 0), 0));
        store.insert(chunk(Point3::new(20, 0, 0), 6));
        store.insert(chunk(Point3::new(-1, 0, -1), 2));

        let mut feeder = RenderFeeder::new(32, RENDER_DISTANCE);
        let camera = Point3::new(10.0, 0.0, 10.0);

        // Chunk (20, 0, 0) has its origin at x = 640, beyond the cutoff.
        let jobs = feeder.intake(&store, camera, u64::MAX);
        assert_eq!(offsets(&jobs), vec![(0, 0), (1, 4), (-1, 4)]);

        let draws = feeder.visible_draws(camera);
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].vertex_count, 4);
        assert_eq!(draws[0].instance_count, 4);
        assert_eq!(draws[0].first_instance, 0);
        assert_eq!(draws[1].instance_count, 2);
        assert_eq!(draws[1].first_instance, 4);

        let camera = Point3::new(600.0, 0.0, 0.0);
        let jobs = feeder.intake(&store, camera, u64::MAX);
        assert_eq!(offsets(&jobs), vec![(20, 6)]);

        let draws = feeder.visible_draws(camera);
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].first_instance, 6);
    }

    #[test]
    fn full_buffer_evicts_distant_chunks_for_new_nearby_ones() {
        let store = ChunkStore::new();
        for x in 0..4 {
            store.insert(chunk(Point3::new(x, 0, 0), 10));
        }
        let budget = 4 * 10 * FACE_SIZE;

        let mut feeder = RenderFeeder::new(32, RENDER_DISTANCE);
        assert_eq!(feeder.intake(&store, ORIGIN, budget).len(), 4);
        assert_eq!(feeder.required_bytes(), budget);

        store.insert(chunk(Point3::new(100, 0, 0), 10));
        let far_away = Point3::new(3216.0, 0.0, 16.0);
        let jobs = feeder.intake(&store, far_away, budget);
        assert_eq!(offsets(&jobs), vec![(100, 0)]);
        for _ in 0..100 {
            assert!(feeder.intake(&store, far_away, budget).is_empty());
        }

        let draws = feeder.visible_draws(far_away);
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].instance_count, 10);
        assert_eq!(draws[0].first_instance, 0);

        // Coming back evicts chunk (100, 0, 0) and packs the first four again.
        let jobs = feeder.intake(&store, ORIGIN, budget);
        assert_eq!(offsets(&jobs), vec![(0, 0), (1, 10), (2, 20), (3, 30)]);
        assert_eq!(feeder.visible_draws(ORIGIN).len(), 4);
        assert!(feeder.visible_draws(far_away).is_empty());
        assert_eq!(feeder.unplaced(), 0);
    }

    #[test]
    fn chunks_in_range_beyond_the_budget_are_counted() {
        let store = ChunkStore::new();
        store.insert(chunk(Point3::new(0, 0, 0), 10));
        store.insert(chunk(Point3::new(0, 0, 1), 10));

        let mut feeder = RenderFeeder::new(32, RENDER_DISTANCE);
        let jobs = feeder.intake(&store, ORIGIN, 15 * FACE_SIZE);
        assert_eq!(jobs.len(), 1);
        assert_eq!(feeder.unplaced(), 1);
        assert_eq!(feeder.resident().len(), 1);
    }

    #[test]
    fn cutoff_ignores_camera_height_and_is_strict() {
        let store = ChunkStore::new();
        store.insert(chunk(Point3::new(0, 0, 0), 1));
        let mut feeder = RenderFeeder::new(32, 100.0);
        feeder.intake(&store, ORIGIN, u64::MAX);

        assert_eq!(feeder.visible_draws(Point3::new(0.0, 10_000.0, 0.0)).len(), 1);
        assert!(feeder.visible_draws(Point3::new(100.0, 0.0, 0.0)).is_empty());
        assert_eq!(feeder.visible_draws(Point3::new(99.5, 0.0, 0.0)).len(), 1);
    }
}
