//! # Block Side Module
//!
//! The six axis-aligned faces of a voxel, in the order the mesher visits them and with
//! the codes packed into GPU face records.

use cgmath::Vector3;
use num_derive::FromPrimitive;

/// One of the six faces of a voxel block.
///
/// The discriminant is the direction code stored in the low three bits of a packed face.
/// The order is: [LEFT, RIGHT, BOTTOM, TOP, BACK, FRONT]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, FromPrimitive)]
pub enum BlockSide {
    /// Facing negative X
    LEFT = 0,

    /// Facing positive X
    RIGHT = 1,

    /// Facing negative Y
    BOTTOM = 2,

    /// Facing positive Y
    TOP = 3,

    /// Facing negative Z
    BACK = 4,

    /// Facing positive Z
    FRONT = 5,
}

impl BlockSide {
    /// Returns all six sides in enumeration order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::LEFT,
            BlockSide::RIGHT,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::BACK,
            BlockSide::FRONT,
        ]
    }

    /// Unit vector pointing out of the block through this side.
    pub fn normal(self) -> Vector3<i32> {
        match self {
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::BACK => Vector3::new(0, 0, -1),
            BlockSide::FRONT => Vector3::new(0, 0, 1),
        }
    }

    /// Direction code as packed into face records.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Decodes a direction code, `None` for anything above 5.
    pub fn from_code(code: u32) -> Option<BlockSide> {
        num_traits::FromPrimitive::from_u32(code)
    }
}
