//! # Density Module
//!
//! Occupancy of world voxels. Terrain comes from 3D Perlin noise biased by a cubic
//! vertical falloff across one chunk height, which turns isotropic noise blobs into a
//! single layered surface.
//!
//! The field is a pure function of the world coordinate, so any voxel can be sampled
//! from any chunk. The mesher relies on this to look across chunk borders.

use cgmath::Point3;
use noise::{NoiseFn, Perlin};

/// Scaling factor applied to world coordinates when sampling Perlin noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.02;
/// Weight of the noise term against the vertical falloff.
pub const NOISE_AMPLITUDE: f64 = 0.1;

/// Maps a world voxel coordinate to occupied or empty.
///
/// Implementations must be deterministic: the same coordinate always gives the same
/// answer, from any thread.
pub trait DensityField: Send + Sync {
    /// Whether the voxel at `position` (world coordinates) is filled.
    fn is_solid(&self, position: Point3<i32>) -> bool;
}

impl<F> DensityField for F
where
    F: Fn(Point3<i32>) -> bool + Send + Sync,
{
    fn is_solid(&self, position: Point3<i32>) -> bool {
        self(position)
    }
}

/// The stock terrain: Perlin noise plus a cubic vertical bias.
///
/// A voxel is solid iff `amplitude * noise(p * frequency) + vertical < 0`, where
/// `vertical = -(y / chunk_dimension - 0.5)^3`.
pub struct PerlinDensityField {
    perlin: Perlin,
    frequency: f64,
    amplitude: f64,
    chunk_dimension: i32,
}

impl PerlinDensityField {
    /// Creates the terrain field.
    ///
    /// # Arguments
    /// * `seed` - Perlin seed
    /// * `frequency` - Scale applied to world coordinates
    /// * `amplitude` - Weight of the noise term
    /// * `chunk_dimension` - Height over which the vertical bias sweeps from +0.125 to -0.125
    pub fn new(seed: u32, frequency: f64, amplitude: f64, chunk_dimension: i32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            frequency,
            amplitude,
            chunk_dimension,
        }
    }

    /// Raw field value; negative means solid.
    pub fn density(&self, position: Point3<i32>) -> f64 {
        let noise = self.perlin.get([
            position.x as f64 * self.frequency,
            position.y as f64 * self.frequency,
            position.z as f64 * self.frequency,
        ]);
        let vertical = -((position.y as f64 / self.chunk_dimension as f64) - 0.5);

        self.amplitude * noise + vertical * vertical * vertical
    }
}

impl DensityField for PerlinDensityField {
    fn is_solid(&self, position: Point3<i32>) -> bool {
        self.density(position) < 0.0
    }
}
