//! Shared tracing infrastructure
//!
//! Accumulation buffers for direct and indirect light, the deterministic
//! per-texel random source, and the rayon striping helper used by both
//! baking passes.
//!
//! Author: Moroya Sakamoto

use glam::{Vec2, Vec3, Vec4};
use rayon::prelude::*;

pub mod direct;
pub mod indirect;

// ---------------------------------------------------------------------------
// Accumulation buffers
// ---------------------------------------------------------------------------

/// Accumulated direct light for one lightmap, linear RGB per texel.
#[derive(Debug, Clone)]
pub struct BakedDirect {
    /// Lightmap this buffer belongs to.
    pub lightmap_index: u32,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Accumulated light per texel.
    pub light: Vec<Vec3>,
}

impl BakedDirect {
    /// Create a zeroed buffer.
    pub fn new(lightmap_index: u32, size: u32) -> Self {
        Self {
            lightmap_index,
            width: size,
            height: size,
            light: vec![Vec3::ZERO; (size * size) as usize],
        }
    }

    /// Nearest-texel sample at a normalized UV. UVs are clamped to the map.
    pub fn sample_nearest(&self, uv: Vec2) -> Vec3 {
        let x = ((uv.x * self.width as f32) as i64).clamp(0, self.width as i64 - 1) as usize;
        let y = ((uv.y * self.height as f32) as i64).clamp(0, self.height as i64 - 1) as usize;
        self.light[x + y * self.width as usize]
    }
}

/// Accumulated indirect light for one lightmap.
///
/// RGB carries summed radiance, W the sample count; `normalize` folds the
/// count into the average. `light_swap` is scratch for the filter passes.
#[derive(Debug, Clone)]
pub struct BakedIndirect {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Accumulated light and sample count per texel.
    pub light: Vec<Vec4>,
    /// Secondary buffer for ping-pong filtering.
    pub light_swap: Vec<Vec4>,
}

impl BakedIndirect {
    /// Create a zeroed buffer.
    pub fn new(size: u32) -> Self {
        let texels = (size * size) as usize;
        Self {
            width: size,
            height: size,
            light: vec![Vec4::ZERO; texels],
            light_swap: vec![Vec4::ZERO; texels],
        }
    }

    /// Divide accumulated light by the sample count stored in W.
    pub fn normalize(&mut self) {
        for texel in &mut self.light {
            if texel.w > 0.0 {
                *texel /= texel.w;
                texel.w = 1.0;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Parallel driver
// ---------------------------------------------------------------------------

/// Split `data` into `num_tasks` contiguous stripes and process them on the
/// rayon pool. `callback` receives the stripe and the index of its first
/// element.
pub fn parallel_stripes<T, F>(data: &mut [T], num_tasks: u32, callback: F)
where
    T: Send,
    F: Fn(&mut [T], usize) + Sync,
{
    if data.is_empty() {
        return;
    }
    let chunk_len = data.len().div_ceil(num_tasks.max(1) as usize);
    data.par_chunks_mut(chunk_len)
        .enumerate()
        .for_each(|(chunk, stripe)| callback(stripe, chunk * chunk_len));
}

// ---------------------------------------------------------------------------
// Random sampling
// ---------------------------------------------------------------------------

/// Deterministic per-texel random source (splitmix64 core).
///
/// Seeded from the texel index so repeated bakes of the same scene produce
/// identical lightmaps regardless of thread scheduling.
#[derive(Debug, Clone)]
pub struct TexelRng {
    state: u64,
}

impl TexelRng {
    /// Seed from a texel index.
    pub fn new(texel_index: u64) -> Self {
        Self {
            state: texel_index.wrapping_mul(0x9e37_79b9_7f4a_7c15).wrapping_add(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform float in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 * (1.0 / (1u64 << 24) as f32)
    }
}

/// Cosine-weighted hemisphere direction around `normal`.
pub fn random_hemisphere_direction(normal: Vec3, rng: &mut TexelRng) -> Vec3 {
    let u1 = rng.next_f32();
    let u2 = rng.next_f32();

    let radius = u1.sqrt();
    let theta = 2.0 * std::f32::consts::PI * u2;
    let local = Vec3::new(
        radius * theta.cos(),
        radius * theta.sin(),
        (1.0 - u1).max(0.0).sqrt(),
    );

    let (tangent, bitangent) = orthonormal_basis(normal);
    (tangent * local.x + bitangent * local.y + normal * local.z).normalize_or_zero()
}

/// Branchless orthonormal basis around a unit vector.
fn orthonormal_basis(normal: Vec3) -> (Vec3, Vec3) {
    let sign = if normal.z >= 0.0 { 1.0 } else { -1.0 };
    let a = -1.0 / (sign + normal.z);
    let b = normal.x * normal.y * a;
    (
        Vec3::new(1.0 + sign * normal.x * normal.x * a, sign * b, -sign * normal.x),
        Vec3::new(b, sign + normal.y * normal.y * a, -normal.y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_nearest_picks_the_owning_texel() {
        let mut direct = BakedDirect::new(0, 4);
        direct.light[1 + 2 * 4] = Vec3::new(0.5, 0.25, 1.0);
        let sample = direct.sample_nearest(Vec2::new(0.3, 0.6));
        assert_eq!(sample, Vec3::new(0.5, 0.25, 1.0));

        // Out-of-range UVs clamp instead of wrapping.
        assert_eq!(direct.sample_nearest(Vec2::new(-1.0, 5.0)), direct.light[12]);
    }

    #[test]
    fn normalize_averages_by_sample_count() {
        let mut indirect = BakedIndirect::new(2);
        indirect.light[0] = Vec4::new(4.0, 2.0, 0.0, 4.0);
        indirect.normalize();
        assert_eq!(indirect.light[0], Vec4::new(1.0, 0.5, 0.0, 1.0));
        // Untouched texels stay zero.
        assert_eq!(indirect.light[1], Vec4::ZERO);
    }

    #[test]
    fn parallel_stripes_visits_every_element_once() {
        let mut data = vec![0u32; 1000];
        parallel_stripes(&mut data, 7, |stripe, first| {
            for (offset, value) in stripe.iter_mut().enumerate() {
                *value = (first + offset) as u32 + 1;
            }
        });
        for (index, value) in data.iter().enumerate() {
            assert_eq!(*value, index as u32 + 1);
        }
    }

    #[test]
    fn texel_rng_is_deterministic_per_seed() {
        let mut a = TexelRng::new(42);
        let mut b = TexelRng::new(42);
        let mut c = TexelRng::new(43);
        let first_a = a.next_f32();
        assert_eq!(first_a, b.next_f32());
        assert_ne!(first_a, c.next_f32());
        assert!((0.0..1.0).contains(&first_a));
    }

    #[test]
    fn hemisphere_directions_stay_above_the_surface() {
        let normal = Vec3::new(0.3, -0.5, 0.8).normalize();
        let mut rng = TexelRng::new(7);
        for _ in 0..256 {
            let direction = random_hemisphere_direction(normal, &mut rng);
            assert!(direction.dot(normal) >= -1e-4);
            assert!((direction.length() - 1.0).abs() < 1e-4);
        }
    }
}
