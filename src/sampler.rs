// Paintings -> fixed square RGBA sample grids.
// Visual expectation: each painting ends up centered on a black square, never stretched.

use crate::config::Artwork;
use crate::error::Error;
use crate::types::SampledImage;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

/// Anything that can hand us decoded pixels + a display name.
pub trait ImageSource {
    fn name(&self) -> &str;
    fn decode(&self) -> Result<DynamicImage, Error>;
}

impl ImageSource for Artwork {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self) -> Result<DynamicImage, Error> {
        image::open(&self.path).map_err(|e| Error::ImageLoad {
            name: self.name.clone(),
            reason: format!("{}: {e}", self.path.display()),
        })
    }
}

/// Loading progress after each attempted painting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: usize,
    pub attempted: usize,
    pub total: usize,
}

/// Letterbox `img` into a `size`×`size` canvas over opaque black.
/// Wide images span the full width, tall (or square) ones the full height.
pub fn sample_image(name: &str, img: &DynamicImage, size: u32) -> SampledImage {
    let (w, h) = (img.width().max(1), img.height().max(1));
    let aspect = w as f32 / h as f32;

    // 1) Fit inside the square, keep the aspect ratio, center on the short axis.
    let (draw_w, draw_h) = if aspect > 1.0 {
        (size as f32, size as f32 / aspect)
    } else {
        (size as f32 * aspect, size as f32)
    };
    let draw_w = (draw_w.round() as u32).clamp(1, size);
    let draw_h = (draw_h.round() as u32).clamp(1, size);
    let offset_x = (size - draw_w) / 2;
    let offset_y = (size - draw_h) / 2;

    // 2) Black background first, then the scaled painting on top (alpha-blended,
    //    so anything translucent ends up composited over black).
    let mut canvas = RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 255]));
    let scaled = imageops::resize(&img.to_rgba8(), draw_w, draw_h, FilterType::Triangle);
    imageops::overlay(&mut canvas, &scaled, offset_x as i64, offset_y as i64);

    SampledImage {
        name: name.to_string(),
        width: size,
        height: size,
        pixels: canvas.into_raw(),
    }
}

/// Decode + sample every source in order. Failing sources are skipped;
/// only an entirely failed catalog is an error.
pub fn load_catalog<S: ImageSource>(
    sources: &[S],
    size: u32,
    mut on_progress: impl FnMut(LoadProgress),
) -> Result<Vec<SampledImage>, Error> {
    let total = sources.len();
    let mut images = Vec::with_capacity(total);

    for (i, source) in sources.iter().enumerate() {
        match source.decode() {
            Ok(img) => {
                images.push(sample_image(source.name(), &img, size));
                log::info!("Loaded `{}` ({}/{})", source.name(), images.len(), total);
            }
            Err(e) => log::warn!("Skipping `{}`: {e}", source.name()),
        }
        on_progress(LoadProgress { loaded: images.len(), attempted: i + 1, total });
    }

    if images.is_empty() {
        return Err(Error::NoImagesLoaded { attempted: total });
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fake {
        name: &'static str,
        img: Option<DynamicImage>,
    }

    impl ImageSource for Fake {
        fn name(&self) -> &str {
            self.name
        }
        fn decode(&self) -> Result<DynamicImage, Error> {
            self.img.clone().ok_or_else(|| Error::ImageLoad {
                name: self.name.into(),
                reason: "unreachable".into(),
            })
        }
    }

    fn solid(w: u32, h: u32, px: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba(px)))
    }

    #[test]
    fn output_is_always_square() {
        let s = sample_image("wide", &solid(37, 11, [9, 9, 9, 255]), 50);
        assert_eq!((s.width, s.height), (50, 50));
        assert_eq!(s.pixels.len(), 50 * 50 * 4);
    }

    #[test]
    fn wide_image_is_letterboxed_top_and_bottom() {
        // 2:1 red image into 20x20 -> 20x10 band, rows 5..15
        let s = sample_image("wide", &solid(40, 20, [255, 0, 0, 255]), 20);
        assert_eq!(s.rgba(10, 0), [0, 0, 0, 255]);
        assert_eq!(s.rgba(10, 19), [0, 0, 0, 255]);
        assert_eq!(s.rgba(10, 10), [255, 0, 0, 255]);
        assert_eq!(s.rgba(0, 10), [255, 0, 0, 255]);
    }

    #[test]
    fn tall_image_is_pillarboxed_left_and_right() {
        let s = sample_image("tall", &solid(10, 20, [0, 0, 255, 255]), 20);
        assert_eq!(s.rgba(0, 10), [0, 0, 0, 255]);
        assert_eq!(s.rgba(19, 10), [0, 0, 0, 255]);
        assert_eq!(s.rgba(10, 0), [0, 0, 255, 255]);
    }

    #[test]
    fn transparent_pixels_land_on_opaque_black() {
        let s = sample_image("ghost", &solid(8, 8, [200, 200, 200, 0]), 8);
        assert_eq!(s.rgba(3, 3), [0, 0, 0, 255]);
    }

    #[test]
    fn partial_failure_keeps_the_survivors() {
        let sources = [
            Fake { name: "broken", img: None },
            Fake { name: "fine", img: Some(solid(4, 4, [1, 2, 3, 255])) },
        ];
        let mut last = None;
        let images = load_catalog(&sources, 8, |p| last = Some(p)).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].name, "fine");
        assert_eq!(last, Some(LoadProgress { loaded: 1, attempted: 2, total: 2 }));
    }

    #[test]
    fn all_failing_is_fatal() {
        let sources = [Fake { name: "a", img: None }, Fake { name: "b", img: None }];
        let err = load_catalog(&sources, 8, |_| {}).unwrap_err();
        assert!(matches!(err, Error::NoImagesLoaded { attempted: 2 }));
        assert!(err.is_fatal());
    }

    #[test]
    fn missing_file_reports_image_load() {
        let art = Artwork { name: "nowhere".into(), path: "/definitely/not/here.png".into() };
        assert!(matches!(art.decode(), Err(Error::ImageLoad { .. })));
    }
}
