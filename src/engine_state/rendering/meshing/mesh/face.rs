use cgmath::Point3;

use crate::engine_state::voxels::block::block_side::BlockSide;

/// Number of low bits of `packed` holding the direction code.
pub const DIRECTION_BITS: u32 = 3;
/// Mask selecting the direction code from `packed`.
pub const DIRECTION_MASK: i32 = (1 << DIRECTION_BITS) - 1;

/// One visible unit quad, laid out for direct upload into a GPU storage buffer.
///
/// Four 32-bit integers: the world voxel position the face belongs to and a bitfield
/// with the direction code in the low three bits and the material index above them.
/// The shader reads the buffer as `array<vec4<i32>>`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Face {
    /// World voxel coordinate of the voxel owning this face
    pub position: [i32; 3],
    /// `direction | material << 3`
    pub packed: i32,
}

impl Face {
    /// Creates a face record.
    ///
    /// # Arguments
    /// * `position` - World voxel coordinate of the owning voxel
    /// * `side` - Which side of the voxel the face covers
    /// * `material` - Material index, must fit in 28 bits
    pub fn new(position: Point3<i32>, side: BlockSide, material: u32) -> Self {
        Self {
            position: [position.x, position.y, position.z],
            packed: (side.code() | (material << DIRECTION_BITS)) as i32,
        }
    }

    /// World voxel coordinate of the owning voxel.
    pub fn position(&self) -> Point3<i32> {
        Point3::new(self.position[0], self.position[1], self.position[2])
    }

    /// The side of the voxel this face covers.
    pub fn side(&self) -> Option<BlockSide> {
        BlockSide::from_code((self.packed & DIRECTION_MASK) as u32)
    }

    /// Material index of this face.
    pub fn material(&self) -> u32 {
        (self.packed as u32) >> DIRECTION_BITS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_four_integers() {
        assert_eq!(std::mem::size_of::<Face>(), 16);
        let face = Face::new(Point3::new(-3, 7, 40), BlockSide::BACK, 5);
        let words: &[i32] = bytemuck::cast_slice(std::slice::from_ref(&face));
        assert_eq!(words, &[-3, 7, 40, 4 | (5 << 3)]);
    }

    #[test]
    fn unpacks_side_and_material() {
        let face = Face::new(Point3::new(0, 0, 0), BlockSide::TOP, 2);
        assert_eq!(face.side(), Some(BlockSide::TOP));
        assert_eq!(face.material(), 2);
        assert_eq!(face.position(), Point3::new(0, 0, 0));
    }
}
