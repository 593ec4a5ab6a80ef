// Particle buffer builder.
// Visual: the painting appears as a dense grid of dots; the leftovers become a
// shell of colored stars that only shows up once a hand turns on the galaxy.

use crate::config::{
    IMAGE_SIZE_BASE, IMAGE_SIZE_JITTER, OPAQUE_ALPHA, PLACEHOLDER_Z, PROBE_ALPHA, PROBE_ATTEMPTS,
    SHELL_INNER_RADIUS, SHELL_THICKNESS,
};
use crate::types::{GpuParticle, ParticleKind, SampledImage};
use rand::Rng;
use std::f32::consts::TAU;

/// Fixed-capacity particle attributes, index-aligned, one `GpuParticle` per slot.
/// Slots `0..image_count` are image particles, the rest are extras.
pub struct ParticleSet {
    particles: Vec<GpuParticle>,
    image_count: usize,
    opaque_count: usize,
}

impl ParticleSet {
    /// Allocate `capacity` slots once; `rebuild` only ever overwrites them.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { particles: vec![GpuParticle::default(); capacity], image_count: 0, opaque_count: 0 }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Partition point: first extra particle index.
    pub fn image_count(&self) -> usize {
        self.image_count
    }

    /// Visible image particles (samples above the alpha threshold).
    pub fn opaque_count(&self) -> usize {
        self.opaque_count
    }

    pub fn as_slice(&self) -> &[GpuParticle] {
        &self.particles
    }

    /// Repopulate every slot from `image`, in place.
    pub fn rebuild(&mut self, image: &SampledImage, rng: &mut impl Rng) {
        let (w, h) = (image.width, image.height);
        let start_x = -(w as f32) / 2.0;
        let start_y = h as f32 / 2.0;
        let capacity = self.particles.len();

        // 1) Image particles: one slot per sample, row-major.
        let mut index = 0;
        let mut opaque = 0;
        'scan: for y in 0..h {
            for x in 0..w {
                if index == capacity {
                    break 'scan;
                }
                let [r, g, b, a] = image.rgba(x, y);
                let slot = &mut self.particles[index];
                slot.is_extra = 0.0;

                if a as f32 / 255.0 > OPAQUE_ALPHA {
                    slot.position = [start_x + x as f32, start_y - y as f32, 0.0];
                    slot.color = [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0];
                    slot.size = IMAGE_SIZE_BASE + rng.random::<f32>() * IMAGE_SIZE_JITTER;
                    opaque += 1;
                } else {
                    // Invisible placeholder keeps one slot per sample.
                    slot.position = [0.0, 0.0, PLACEHOLDER_Z];
                    slot.color = [0.0; 3];
                    slot.size = 0.0;
                }
                index += 1;
            }
        }
        self.image_count = index;
        self.opaque_count = opaque;

        // 2) Extras fill whatever is left.
        for slot in &mut self.particles[index..] {
            *slot = GpuParticle {
                position: shell_point(rng),
                color: probe_color(image, rng),
                is_extra: 1.0,
                size: galaxy_size(rng),
            };
        }
        debug_assert!(self.particles[..index].iter().all(|p| p.kind() == ParticleKind::Image));
    }
}

/// Up to PROBE_ATTEMPTS random samples; first one opaque enough wins, else white.
fn probe_color(image: &SampledImage, rng: &mut impl Rng) -> [f32; 3] {
    for _ in 0..PROBE_ATTEMPTS {
        let x = rng.random_range(0..image.width);
        let y = rng.random_range(0..image.height);
        let [r, g, b, a] = image.rgba(x, y);
        if a > PROBE_ALPHA {
            return [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0];
        }
    }
    [1.0; 3]
}

/// Tiered sizes: a few giant planets, some medium stars, mostly dust.
fn galaxy_size(rng: &mut impl Rng) -> f32 {
    let roll: f32 = rng.random();
    if roll > 0.98 {
        10.0 + rng.random::<f32>() * 10.0
    } else if roll > 0.8 {
        6.0 + rng.random::<f32>() * 4.0
    } else {
        2.0 + rng.random::<f32>() * 3.0
    }
}

/// Uniform direction (acos keeps the poles from bunching) at a random shell radius.
fn shell_point(rng: &mut impl Rng) -> [f32; 3] {
    let u: f32 = rng.random();
    let v: f32 = rng.random();
    let theta = TAU * u;
    let phi = (2.0 * v - 1.0).clamp(-1.0, 1.0).acos();
    let radius = SHELL_INNER_RADIUS + rng.random::<f32>() * SHELL_THICKNESS;
    [
        radius * phi.sin() * theta.cos(),
        radius * phi.sin() * theta.sin(),
        radius * phi.cos(),
    ]
}
