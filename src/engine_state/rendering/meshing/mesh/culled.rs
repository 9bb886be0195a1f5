//! Culled per-voxel meshing.
//!
//! Every solid voxel emits one quad per side whose neighbour is empty. Interior voxels
//! emit nothing, which is what keeps a chunk's face list sparse.
//!
//! Neighbours past the chunk border are resolved by sampling the density field in the
//! adjacent chunk's space rather than assuming air or rock, so chunk borders mesh
//! exactly as if the world were one grid.

use std::sync::Arc;

use cgmath::Point3;

use crate::engine_state::voxels::{
    block::{block_side::BlockSide, material::MaterialField},
    chunk::{chunk_origin, voxel_grid::VoxelGrid},
    density::DensityField,
};

use super::face::Face;

/// Number of distinct face materials.
pub const MATERIAL_COUNT: u32 = 6;
/// Per-axis frequency of the material noise.
pub const MATERIAL_FREQUENCY: [f64; 3] = [0.4684, 0.684, 0.4684];

/// Turns a chunk's occupancy grid into its visible faces.
pub struct ChunkMesher {
    density: Arc<dyn DensityField>,
    materials: MaterialField,
}

impl ChunkMesher {
    /// Creates a mesher.
    ///
    /// # Arguments
    /// * `density` - Field consulted for neighbours outside the chunk
    /// * `materials` - Field tagging each face with a material
    pub fn new(density: Arc<dyn DensityField>, materials: MaterialField) -> Self {
        Self { density, materials }
    }

    /// Meshes one chunk.
    ///
    /// Scans voxels with x fastest, then y, then z, and visits sides in [`BlockSide::all`]
    /// order, so the output order is stable for a given grid.
    ///
    /// # Arguments
    /// * `grid` - Occupancy of the chunk, sampled from the same density field
    /// * `chunk_position` - Chunk coordinate the grid belongs to
    ///
    /// # Returns
    /// Faces with world voxel positions
    pub fn mesh(&self, grid: &VoxelGrid, chunk_position: Point3<i32>) -> Vec<Face> {
        let dimension = grid.dimension();
        let origin = chunk_origin(chunk_position, dimension);
        let mut faces = Vec::new();

        for z in 0..dimension {
            for y in 0..dimension {
                for x in 0..dimension {
                    let local = Point3::new(x, y, z);
                    if grid.get(local) != Some(true) {
                        continue;
                    }

                    let world = Point3::new(origin.x + x, origin.y + y, origin.z + z);
                    for side in BlockSide::all() {
                        let neighbour = local + side.normal();
                        let neighbour_solid = match grid.get(neighbour) {
                            Some(solid) => solid,
                            None => self.density.is_solid(world + side.normal()),
                        };

                        if !neighbour_solid {
                            faces.push(Face::new(world, side, self.materials.material_at(local)));
                        }
                    }
                }
            }
        }

        faces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::density::{
        PerlinDensityField, NOISE_AMPLITUDE, PERLIN_SCALE_FACTOR,
    };

    fn mesher_for(density: Arc<dyn DensityField>) -> ChunkMesher {
        ChunkMesher::new(density, MaterialField::new(0, MATERIAL_FREQUENCY, 1))
    }

    fn mesh_chunk(density: Arc<dyn DensityField>, position: Point3<i32>, dimension: i32) -> Vec<Face> {
        let grid = VoxelGrid::sample(density.as_ref(), position, dimension);
        mesher_for(density).mesh(&grid, position)
    }

    fn count_side(faces: &[Face], side: BlockSide) -> usize {
        faces.iter().filter(|face| face.side() == Some(side)).count()
    }

    #[test]
    fn isolated_slab_emits_its_whole_surface() {
        // A 4x4x2 slab filling the bottom half of chunk (0, 0, 0), air everywhere else.
        let slab: Arc<dyn DensityField> = Arc::new(|p: Point3<i32>| {
            (0..4).contains(&p.x) && (0..4).contains(&p.z) && (0..2).contains(&p.y)
        });
        let faces = mesh_chunk(slab, Point3::new(0, 0, 0), 4);

        assert_eq!(faces.len(), 64);
        assert_eq!(count_side(&faces, BlockSide::TOP), 16);
        assert_eq!(count_side(&faces, BlockSide::BOTTOM), 16);
        assert_eq!(count_side(&faces, BlockSide::LEFT), 8);
        assert_eq!(count_side(&faces, BlockSide::RIGHT), 8);
        assert_eq!(count_side(&faces, BlockSide::BACK), 8);
        assert_eq!(count_side(&faces, BlockSide::FRONT), 8);

        for face in &faces {
            let p = face.position();
            assert_eq!(face.material(), 0);
            match face.side() {
                Some(BlockSide::TOP) => assert_eq!(p.y, 1),
                Some(BlockSide::BOTTOM) => assert_eq!(p.y, 0),
                Some(BlockSide::LEFT) => assert_eq!(p.x, 0),
                Some(BlockSide::RIGHT) => assert_eq!(p.x, 3),
                Some(BlockSide::BACK) => assert_eq!(p.z, 0),
                Some(BlockSide::FRONT) => assert_eq!(p.z, 3),
                None => panic!("face without a side"),
            }
        }

        // Scan order: voxel (0,0,0) first, its sides in enumeration order, then (1,0,0).
        let head: Vec<_> = faces[..5].iter().map(|f| (f.position(), f.side())).collect();
        assert_eq!(
            head,
            vec![
                (Point3::new(0, 0, 0), Some(BlockSide::LEFT)),
                (Point3::new(0, 0, 0), Some(BlockSide::BOTTOM)),
                (Point3::new(0, 0, 0), Some(BlockSide::BACK)),
                (Point3::new(1, 0, 0), Some(BlockSide::BOTTOM)),
                (Point3::new(1, 0, 0), Some(BlockSide::BACK)),
            ]
        );
    }

    #[test]
    fn infinite_floor_only_shows_its_top() {
        // Solid for y < 2 everywhere: neighbours across the border are solid too.
        let floor: Arc<dyn DensityField> = Arc::new(|p: Point3<i32>| p.y < 2);
        let faces = mesh_chunk(floor, Point3::new(0, 0, 0), 4);

        assert_eq!(faces.len(), 16);
        assert!(faces.iter().all(|f| f.side() == Some(BlockSide::TOP) && f.position().y == 1));
    }

    #[test]
    fn interior_voxels_emit_nothing() {
        let solid: Arc<dyn DensityField> = Arc::new(|_: Point3<i32>| true);
        assert!(mesh_chunk(solid, Point3::new(3, 0, -2), 5).is_empty());

        // A single hole in the middle exposes exactly its six neighbours, one face each.
        let hole: Arc<dyn DensityField> = Arc::new(|p: Point3<i32>| p != Point3::new(2, 2, 2));
        let faces = mesh_chunk(hole, Point3::new(0, 0, 0), 5);
        assert_eq!(faces.len(), 6);
        for face in &faces {
            let side = face.side().unwrap();
            assert_eq!(face.position() + side.normal(), Point3::new(2, 2, 2));
        }
    }

    #[test]
    fn one_face_per_empty_neighbour() {
        let seed = fastrand::u32(..);
        let noisy: Arc<dyn DensityField> = Arc::new(move |p: Point3<i32>| {
            let hash = (p.x.wrapping_mul(73_856_093) ^ p.y.wrapping_mul(19_349_663)
                ^ p.z.wrapping_mul(83_492_791)) as u32;
            (hash ^ seed) % 3 == 0
        });
        let position = Point3::new(-1, 0, 2);
        let dimension = 6;
        let faces = mesh_chunk(noisy.clone(), position, dimension);

        let origin = chunk_origin(position, dimension);
        let mut expected = Vec::new();
        for z in 0..dimension {
            for y in 0..dimension {
                for x in 0..dimension {
                    let world = Point3::new(origin.x + x, origin.y + y, origin.z + z);
                    if !noisy.is_solid(world) {
                        continue;
                    }
                    for side in BlockSide::all() {
                        if !noisy.is_solid(world + side.normal()) {
                            expected.push((world, side));
                        }
                    }
                }
            }
        }

        let produced: Vec<_> = faces
            .iter()
            .map(|f| (f.position(), f.side().unwrap()))
            .collect();
        assert_eq!(produced, expected);
    }

    #[test]
    fn borders_agree_with_every_horizontal_neighbour() {
        let dimension = 16;
        let field: Arc<dyn DensityField> = Arc::new(PerlinDensityField::new(
            0,
            PERLIN_SCALE_FACTOR,
            NOISE_AMPLITUDE,
            dimension,
        ));
        let a = Point3::new(1, 0, -1);
        let origin = chunk_origin(a, dimension);
        let grid_a = VoxelGrid::sample(field.as_ref(), a, dimension);
        let faces_a = mesher_for(field.clone()).mesh(&grid_a, a);

        for side in [BlockSide::LEFT, BlockSide::RIGHT, BlockSide::BACK, BlockSide::FRONT] {
            let normal = side.normal();
            let grid_b = VoxelGrid::sample(field.as_ref(), a + normal, dimension);

            let mut checked = 0;
            for z in 0..dimension {
                for y in 0..dimension {
                    for x in 0..dimension {
                        let local = Point3::new(x, y, z);
                        if grid_a.get(local) != Some(true) || grid_a.contains(local + normal) {
                            continue;
                        }
                        let world = Point3::new(origin.x + x, origin.y + y, origin.z + z);
                        let has_face = faces_a
                            .iter()
                            .any(|f| f.position() == world && f.side() == Some(side));
                        // The same voxel seen from the neighbouring chunk's local space.
                        let across = local + normal - normal * dimension;
                        let neighbour_solid = grid_b.get(across).unwrap();
                        assert_eq!(has_face, !neighbour_solid, "{:?} border at {:?}", side, local);
                        checked += 1;
                    }
                }
            }
            assert!(checked > 0, "{:?} border should contain solid voxels", side);
        }
    }

    #[test]
    fn half_spaces_close_only_towards_air() {
        // Air at x < 0: the whole -X border faces out, the +X border stays shut.
        let east: Arc<dyn DensityField> = Arc::new(|p: Point3<i32>| p.x >= 0);
        let faces = mesh_chunk(east, Point3::new(0, 0, 0), 4);
        assert_eq!(faces.len(), 16);
        assert!(faces.iter().all(|f| f.side() == Some(BlockSide::LEFT) && f.position().x == 0));

        // Air at z >= 0 seen from chunk (0, 0, -1): only its +Z border faces out.
        let south: Arc<dyn DensityField> = Arc::new(|p: Point3<i32>| p.z < 0);
        let faces = mesh_chunk(south, Point3::new(0, 0, -1), 4);
        assert_eq!(faces.len(), 16);
        assert!(faces.iter().all(|f| f.side() == Some(BlockSide::FRONT) && f.position().z == -1));
        assert_eq!(count_side(&faces, BlockSide::BACK), 0);
    }

    #[test]
    fn materials_come_from_the_material_field() {
        let solid_cube: Arc<dyn DensityField> =
            Arc::new(|p: Point3<i32>| (0..3).contains(&p.x) && (0..3).contains(&p.y) && (0..3).contains(&p.z));
        let grid = VoxelGrid::sample(solid_cube.as_ref(), Point3::new(0, 0, 0), 3);
        let materials = MaterialField::new(0, MATERIAL_FREQUENCY, MATERIAL_COUNT);
        let reference = MaterialField::new(0, MATERIAL_FREQUENCY, MATERIAL_COUNT);
        let faces = ChunkMesher::new(solid_cube, materials).mesh(&grid, Point3::new(0, 0, 0));

        for face in faces {
            assert!(face.material() < MATERIAL_COUNT);
            assert_eq!(face.material(), reference.material_at(face.position()));
        }
    }
}
