//! # Material Module
//!
//! Assigns a material index to every emitted face from a second, high-frequency Perlin
//! field. The field is evaluated at the voxel's chunk-local coordinate, so the material
//! pattern repeats from chunk to chunk.

use cgmath::Point3;
use noise::{NoiseFn, Perlin};

/// Deterministic mapping from a chunk-local voxel coordinate to a material index.
pub struct MaterialField {
    perlin: Perlin,
    frequency: [f64; 3],
    material_count: u32,
}

impl MaterialField {
    /// Creates a material field.
    ///
    /// # Arguments
    /// * `seed` - Perlin seed
    /// * `frequency` - Per-axis scale applied before sampling
    /// * `material_count` - Number of materials, indices land in `[0, material_count)`
    pub fn new(seed: u32, frequency: [f64; 3], material_count: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            frequency,
            material_count: material_count.max(1),
        }
    }

    /// Material of the voxel at `local`.
    ///
    /// Maps the noise value `n` through `floor((n + 1) / 2 * material_count)`. A noise
    /// value of exactly 1 would land one past the end and is clamped to the last index.
    pub fn material_at(&self, local: Point3<i32>) -> u32 {
        let noise = self.perlin.get([
            local.x as f64 * self.frequency[0],
            local.y as f64 * self.frequency[1],
            local.z as f64 * self.frequency[2],
        ]);
        let scaled = ((noise + 1.0) * 0.5 * self.material_count as f64).floor();

        (scaled.max(0.0) as u32).min(self.material_count - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materials_stay_in_range() {
        let field = MaterialField::new(0, [0.4684, 0.684, 0.4684], 6);
        for _ in 0..2000 {
            let local = Point3::new(
                fastrand::i32(-64..64),
                fastrand::i32(-64..64),
                fastrand::i32(-64..64),
            );
            assert!(field.material_at(local) < 6);
        }
    }

    #[test]
    fn single_material_is_always_zero() {
        let field = MaterialField::new(3, [0.4684, 0.684, 0.4684], 1);
        for x in 0..8 {
            for y in 0..8 {
                assert_eq!(field.material_at(Point3::new(x, y, x + y)), 0);
            }
        }
    }
}
