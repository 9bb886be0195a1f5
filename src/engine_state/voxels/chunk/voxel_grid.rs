//! # Voxel Grid Module
//!
//! Dense occupancy of one chunk, one bit per voxel.
//!
//! ## Layout
//!
//! Bits are linearised as `x + y * D + z * D²` (x fastest). Sampling walks the chunk in
//! that order so the bit vector is filled by plain pushes.
//!
//! The grid is scoped to one generation call: sampled from a `DensityField`, handed to
//! the mesher by reference and dropped before the chunk is published.

use bitvec::prelude::BitVec;
use cgmath::Point3;

use crate::engine_state::voxels::{chunk::chunk_origin, density::DensityField};

/// Occupancy flags for exactly `dimension³` voxels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelGrid {
    dimension: i32,
    solid_array: BitVec,
}

impl VoxelGrid {
    /// Samples the density field over the chunk at `chunk_position`.
    ///
    /// # Arguments
    /// * `density` - Field deciding occupancy of world voxels
    /// * `chunk_position` - Chunk coordinate of the grid
    /// * `dimension` - Voxels per chunk edge
    ///
    /// # Returns
    /// The filled grid, local voxel `p` holding `density.is_solid(origin + p)`
    pub fn sample(density: &dyn DensityField, chunk_position: Point3<i32>, dimension: i32) -> Self {
        let origin = chunk_origin(chunk_position, dimension);
        let mut solid_array = BitVec::with_capacity(Self::size_for(dimension));

        for z in 0..dimension {
            for y in 0..dimension {
                for x in 0..dimension {
                    solid_array.push(density.is_solid(Point3::new(
                        origin.x + x,
                        origin.y + y,
                        origin.z + z,
                    )));
                }
            }
        }

        Self {
            dimension,
            solid_array,
        }
    }

    fn size_for(dimension: i32) -> usize {
        let edge = dimension.max(0) as usize;
        edge * edge * edge
    }

    /// Voxels per edge.
    pub fn dimension(&self) -> i32 {
        self.dimension
    }

    /// Whether `local` lies inside `[0, dimension)` on every axis.
    pub fn contains(&self, local: Point3<i32>) -> bool {
        let range = 0..self.dimension;
        range.contains(&local.x) && range.contains(&local.y) && range.contains(&local.z)
    }

    fn index(&self, local: Point3<i32>) -> usize {
        (local.x + local.y * self.dimension + local.z * self.dimension * self.dimension) as usize
    }

    /// Occupancy of a local voxel, `None` outside the grid.
    pub fn get(&self, local: Point3<i32>) -> Option<bool> {
        if !self.contains(local) {
            return None;
        }
        self.solid_array.get(self.index(local)).map(|bit| *bit)
    }
}

#[cfg(test)]
impl VoxelGrid {
    fn empty(dimension: i32) -> Self {
        Self {
            dimension,
            solid_array: BitVec::repeat(false, Self::size_for(dimension)),
        }
    }

    /// Out-of-bounds writes are ignored.
    fn set(&mut self, local: Point3<i32>, solid: bool) {
        if self.contains(local) {
            let index = self.index(local);
            self.solid_array.set(index, solid);
        }
    }

    fn solid_count(&self) -> usize {
        self.solid_array.count_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_uses_world_coordinates() {
        // Solid exactly on the world plane x == 9, which is local x == 1 of chunk (2, 0, 0).
        let plane = |position: Point3<i32>| position.x == 9;
        let grid = VoxelGrid::sample(&plane, Point3::new(2, 0, 0), 4);

        assert_eq!(grid.solid_count(), 16);
        for y in 0..4 {
            for z in 0..4 {
                assert_eq!(grid.get(Point3::new(1, y, z)), Some(true));
                assert_eq!(grid.get(Point3::new(0, y, z)), Some(false));
            }
        }
    }

    #[test]
    fn linearisation_is_x_fastest() {
        let mut grid = VoxelGrid::empty(3);
        grid.set(Point3::new(1, 2, 0), true);
        assert_eq!(grid.index(Point3::new(1, 2, 0)), 7);
        assert_eq!(grid.index(Point3::new(0, 0, 1)), 9);
        assert_eq!(grid.solid_array.iter_ones().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn out_of_bounds_is_none() {
        let mut grid = VoxelGrid::empty(4);
        grid.set(Point3::new(4, 0, 0), true);
        assert_eq!(grid.solid_count(), 0);
        assert_eq!(grid.get(Point3::new(-1, 0, 0)), None);
        assert_eq!(grid.get(Point3::new(0, 4, 0)), None);
        assert_eq!(grid.get(Point3::new(3, 3, 3)), Some(false));
    }
}
