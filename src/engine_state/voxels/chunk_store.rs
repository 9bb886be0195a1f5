//! # Chunk Store Module
//!
//! The registry of generated chunks, shared by every generation worker and the render
//! thread.
//!
//! ## Consistency
//!
//! All access goes through one read-write lock:
//! - `insert` takes the write lock, re-checks the coordinate and only then appends, so two
//!   workers racing on the same coordinate can never both succeed
//! - chunks are fully built before `insert` is called and wrapped in `Arc`, so readers
//!   never see a half-filled face list
//! - the chunk list is append-only; a snapshot is a prefix of every later snapshot
//!
//! The render thread only takes the read lock for as long as it takes to clone the `Arc`s.

use std::{collections::HashSet, sync::Arc};

use cgmath::Point3;

use crate::core::MtResource;

use super::chunk::Chunk;

#[derive(Default)]
struct ChunkRegistry {
    positions: HashSet<Point3<i32>>,
    chunks: Vec<Arc<Chunk>>,
}

/// Shared registry of generated chunks, at most one per chunk coordinate.
///
/// Cloning hands out another handle to the same registry.
///
/// # Examples
///
/// ```rust,ignore
/// let store = ChunkStore::new();
/// assert!(store.insert(Chunk::new(Point3::new(0, 0, 0), faces)));
/// assert!(store.contains(Point3::new(0, 0, 0)));
/// assert!(!store.insert(Chunk::new(Point3::new(0, 0, 0), other_faces)));
/// ```
#[derive(Clone)]
pub struct ChunkStore {
    registry: MtResource<ChunkRegistry>,
}

impl ChunkStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            registry: MtResource::new(ChunkRegistry::default()),
        }
    }

    /// Whether a chunk with this coordinate has been inserted.
    pub fn contains(&self, position: Point3<i32>) -> bool {
        self.registry.get().positions.contains(&position)
    }

    /// Inserts `chunk` unless its coordinate is already taken.
    ///
    /// The check and the append happen under the same write lock. A rejected chunk is
    /// dropped; the chunk already in the store is never replaced.
    ///
    /// # Returns
    /// `true` if the chunk was added, `false` if another chunk already held the coordinate
    pub fn insert(&self, chunk: Chunk) -> bool {
        let mut registry = self.registry.get_mut();
        if !registry.positions.insert(chunk.position) {
            return false;
        }
        registry.chunks.push(Arc::new(chunk));
        true
    }

    /// Every chunk in insertion order.
    pub fn snapshot(&self) -> Vec<Arc<Chunk>> {
        self.registry.get().chunks.clone()
    }

    /// Chunks inserted after the first `start`, in insertion order.
    ///
    /// Since the store is append-only this is the tail a reader that already holds
    /// `start` chunks is missing.
    pub fn snapshot_since(&self, start: usize) -> Vec<Arc<Chunk>> {
        let registry = self.registry.get();
        registry.chunks.get(start..).map(<[_]>::to_vec).unwrap_or_default()
    }

    /// Number of chunks in the store.
    pub fn len(&self) -> usize {
        self.registry.get().chunks.len()
    }
}

impl Default for ChunkStore {
    fn default() -> Self {
        Self::new()
    }
}
