//! Seam stitching
//!
//! UV unwraps split connected surfaces into islands, and filtering makes
//! the two sides of such a split drift apart. Stitching walks every
//! recorded seam and relaxes both sides toward their midpoint over a few
//! iterations, hiding the discontinuity.
//!
//! Author: Moroya Sakamoto

use crate::geometry::LightmapSeam;
use crate::settings::StitchingSettings;
use glam::{Vec2, Vec4};

/// Reusable scratch for stitching lightmaps of one size.
///
/// Each iteration reads from the snapshot and writes into the live buffer,
/// so the outcome does not depend on seam order.
pub struct StitchingContext {
    size: u32,
    scratch: Vec<Vec4>,
}

impl StitchingContext {
    /// Create a context for square lightmaps of the given edge length.
    pub fn new(size: u32) -> Self {
        Self {
            size,
            scratch: vec![Vec4::ZERO; (size * size) as usize],
        }
    }

    /// Lightmap edge length this context serves.
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    fn texel_index(&self, position: Vec2) -> usize {
        let x = (position.x as i64).clamp(0, self.size as i64 - 1) as usize;
        let y = (position.y as i64).clamp(0, self.size as i64 - 1) as usize;
        x + y * self.size as usize
    }

    /// Blend both sides of every seam toward their midpoint.
    ///
    /// `data` is the texel buffer of one lightmap, `size * size` entries.
    pub fn stitch_seams(
        &mut self,
        data: &mut [Vec4],
        seams: &[LightmapSeam],
        settings: &StitchingSettings,
    ) {
        debug_assert_eq!(data.len(), self.scratch.len());
        if seams.is_empty() {
            return;
        }

        for _ in 0..settings.num_iterations {
            self.scratch.copy_from_slice(data);
            for seam in seams {
                self.stitch_one(data, seam, settings.blend_factor);
            }
        }
    }

    fn stitch_one(&self, data: &mut [Vec4], seam: &LightmapSeam, blend_factor: f32) {
        let length = seam.positions[0]
            .distance(seam.positions[1])
            .max(seam.other_positions[0].distance(seam.other_positions[1]));
        let steps = (length.ceil() as usize).max(1);

        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let a = seam.positions[0].lerp(seam.positions[1], t);
            let b = seam.other_positions[0].lerp(seam.other_positions[1], t);

            let index_a = self.texel_index(a);
            let index_b = self.texel_index(b);
            if index_a == index_b {
                continue;
            }

            let midpoint = (self.scratch[index_a] + self.scratch[index_b]) * 0.5;
            data[index_a] = self.scratch[index_a].lerp(midpoint, blend_factor);
            data[index_b] = self.scratch[index_b].lerp(midpoint, blend_factor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertical_seam() -> LightmapSeam {
        // Same 3D edge charted at x = 2 and x = 12.
        LightmapSeam {
            positions: [Vec2::new(2.5, 1.0), Vec2::new(2.5, 14.0)],
            other_positions: [Vec2::new(12.5, 1.0), Vec2::new(12.5, 14.0)],
        }
    }

    #[test]
    fn seam_sides_converge() {
        let mut context = StitchingContext::new(16);
        let mut data = vec![Vec4::ZERO; 256];
        // Left island dark, right island bright.
        for y in 0..16 {
            data[2 + y * 16] = Vec4::new(0.0, 0.0, 0.0, 1.0);
            data[12 + y * 16] = Vec4::new(1.0, 1.0, 1.0, 1.0);
        }

        let settings = StitchingSettings {
            num_iterations: 8,
            blend_factor: 0.6,
        };
        context.stitch_seams(&mut data, &[vertical_seam()], &settings);

        let left = data[2 + 7 * 16].x;
        let right = data[12 + 7 * 16].x;
        assert!(
            (left - right).abs() < 0.05,
            "Seam sides did not converge: {left} vs {right}"
        );
        assert!(left > 0.3 && left < 0.7);
    }

    #[test]
    fn no_seams_is_a_no_op() {
        let mut context = StitchingContext::new(4);
        let mut data = vec![Vec4::new(0.25, 0.5, 0.75, 1.0); 16];
        let before = data.clone();
        context.stitch_seams(&mut data, &[], &StitchingSettings::default());
        assert_eq!(data, before);
    }

    #[test]
    fn texels_away_from_the_seam_are_untouched() {
        let mut context = StitchingContext::new(16);
        let mut data = vec![Vec4::new(0.5, 0.5, 0.5, 1.0); 256];
        data[8 + 8 * 16] = Vec4::new(9.0, 9.0, 9.0, 1.0);

        context.stitch_seams(&mut data, &[vertical_seam()], &StitchingSettings::default());
        assert_eq!(data[8 + 8 * 16], Vec4::new(9.0, 9.0, 9.0, 1.0));
    }

    #[test]
    fn degenerate_seam_on_one_texel_is_stable() {
        let mut context = StitchingContext::new(4);
        let mut data = vec![Vec4::new(1.0, 0.0, 0.0, 1.0); 16];
        let seam = LightmapSeam {
            positions: [Vec2::new(1.5, 1.5), Vec2::new(1.5, 1.5)],
            other_positions: [Vec2::new(1.5, 1.5), Vec2::new(1.5, 1.5)],
        };
        context.stitch_seams(&mut data, &[seam], &StitchingSettings::default());
        assert_eq!(data[5], Vec4::new(1.0, 0.0, 0.0, 1.0));
    }
}
