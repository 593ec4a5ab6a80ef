// Core types shared by the sampler, the particle builder, the renderer and the window.

use bytemuck::{Pod, Zeroable};

#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// Black frame of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    /// Resize in place (contents become black). No-op when the size already matches.
    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, 0);
    }
}

/// A painting letterboxed into a square RGBA grid.
/// Immutable once produced; cached for the whole session.
#[derive(Clone, Debug)]
pub struct SampledImage {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>, // row-major, 4 bytes per pixel (r, g, b, a)
}

impl SampledImage {
    /// RGBA of the sample at (x, y).
    #[inline]
    pub fn rgba(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }
}

/// Which of the two particle populations a slot belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleKind {
    /// Sourced from a pixel of the current painting.
    Image,
    /// Galaxy filler, not tied to any pixel.
    Extra,
}

/// One particle as the GPU sees it. Both kinds share this 32-byte stride;
/// `is_extra` (0.0 / 1.0) is the discriminant the vertex shader branches on.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuParticle {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub is_extra: f32,
    pub size: f32,
}

impl GpuParticle {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn kind(&self) -> ParticleKind {
        if self.is_extra > 0.5 { ParticleKind::Extra } else { ParticleKind::Image }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn particle_stride_is_eight_floats() {
        assert_eq!(GpuParticle::SIZE, 32);
    }

    #[test]
    fn kind_follows_flag() {
        let mut p = GpuParticle::default();
        assert_eq!(p.kind(), ParticleKind::Image);
        p.is_extra = 1.0;
        assert_eq!(p.kind(), ParticleKind::Extra);
    }

    #[test]
    fn rgba_reads_row_major() {
        let img = SampledImage {
            name: "t".into(),
            width: 2,
            height: 2,
            pixels: (0u8..16).collect(),
        };
        assert_eq!(img.rgba(1, 1), [12, 13, 14, 15]);
        assert_eq!(img.rgba(1, 0), [4, 5, 6, 7]);
    }

    #[test]
    fn frame_resize_reallocates_to_new_area() {
        let mut fb = FrameBuffer::new(4, 3);
        fb.pixels[0] = 0x00FF_FFFF;
        fb.resize(5, 5);
        assert_eq!(fb.pixels.len(), 25);
        assert!(fb.pixels.iter().all(|&p| p == 0));
    }
}
