// CPU compositing of the final window image.
// Visual: mirrored webcam filling the window, dimmed so the dots pop,
// with the GPU particle layer laid over it.

use crate::error::Error;
use crate::types::FrameBuffer;

#[inline]
fn unpack(px: u32) -> (u32, u32, u32) {
    ((px >> 16) & 0xFF, (px >> 8) & 0xFF, px & 0xFF)
}

#[inline]
fn pack(r: u32, g: u32, b: u32) -> u32 {
    (r << 16) | (g << 8) | b
}

/// Scale `src` to cover `dst` (cropping the overflow, keeping aspect) and
/// flip it horizontally, like looking into a mirror.
pub fn fill_cover_mirrored(src: &FrameBuffer, dst: &mut FrameBuffer) {
    // 1) Nothing to show: black.
    if src.width == 0 || src.height == 0 || src.pixels.len() < src.width * src.height {
        dst.pixels.fill(0);
        return;
    }

    // 2) Cover scale and the centered crop offset, in source pixels.
    let scale = (dst.width as f32 / src.width as f32).max(dst.height as f32 / src.height as f32);
    let crop_x = (src.width as f32 - dst.width as f32 / scale) * 0.5;
    let crop_y = (src.height as f32 - dst.height as f32 / scale) * 0.5;

    // 3) Column lookup once per frame; rows reuse it.
    let cols: Vec<usize> = (0..dst.width)
        .map(|x| {
            let mirrored = dst.width - 1 - x;
            let sx = crop_x + (mirrored as f32 + 0.5) / scale;
            (sx as usize).min(src.width - 1)
        })
        .collect();

    for y in 0..dst.height {
        let sy = ((crop_y + (y as f32 + 0.5) / scale) as usize).min(src.height - 1);
        let src_row = &src.pixels[sy * src.width..(sy + 1) * src.width];
        let dst_row = &mut dst.pixels[y * dst.width..(y + 1) * dst.width];
        for (out, &sx) in dst_row.iter_mut().zip(&cols) {
            *out = src_row[sx];
        }
    }
}

/// Multiply every channel by `1 - amount` (amount 0.6 = 60% darker).
pub fn darken_in_place(fb: &mut FrameBuffer, amount: f32) {
    let keep = ((1.0 - amount.clamp(0.0, 1.0)) * 256.0) as u32; // 8.8 fixed point
    for px in &mut fb.pixels {
        let (r, g, b) = unpack(*px);
        *px = pack((r * keep) >> 8, (g * keep) >> 8, (b * keep) >> 8);
    }
}

/// Lay the particle layer over `fb`. The layer comes straight from alpha
/// blending onto a transparent clear, so its color is already weighted by
/// alpha: out = layer + background * (1 - alpha).
pub fn composite_premultiplied(fb: &mut FrameBuffer, rgba: &[u8]) -> Result<(), Error> {
    if rgba.len() != fb.width * fb.height * 4 {
        return Err(Error::Render(format!(
            "particle layer is {} bytes, window needs {}x{}",
            rgba.len(),
            fb.width,
            fb.height
        )));
    }

    for (px, layer) in fb.pixels.iter_mut().zip(rgba.chunks_exact(4)) {
        let a = layer[3] as u32;
        if a == 0 {
            continue; // most of the screen
        }
        let inv = 255 - a;
        let (r, g, b) = unpack(*px);
        let mix = |top: u8, bottom: u32| (top as u32 + (bottom * inv + 127) / 255).min(255);
        *px = pack(mix(layer[0], r), mix(layer[1], g), mix(layer[2], b));
    }
    Ok(())
}
