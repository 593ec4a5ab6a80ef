// Tunables + command line options.
// Visual: every number here changes how the paintings and the galaxy look or move.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/* ---------- Particle field ---------- */

/// Fixed particle capacity; image particles first, galaxy extras fill the rest.
pub const PARTICLE_COUNT: usize = 60_000;
/// Edge length of the square sample grid every painting is letterboxed into.
pub const SAMPLE_SIZE: u32 = 200;

/// Normalized alpha above which a sample becomes a visible image particle.
pub const OPAQUE_ALPHA: f32 = 0.1;
/// Raw alpha byte an extra particle's color probe must exceed.
pub const PROBE_ALPHA: u8 = 20;
pub const PROBE_ATTEMPTS: usize = 5;
/// Where non-opaque samples are parked (far behind the camera).
pub const PLACEHOLDER_Z: f32 = 5000.0;

pub const IMAGE_SIZE_BASE: f32 = 3.0;
pub const IMAGE_SIZE_JITTER: f32 = 2.0;

pub const SHELL_INNER_RADIUS: f32 = 80.0;
pub const SHELL_THICKNESS: f32 = 150.0;

/* ---------- Interpolation ---------- */

pub const MIX_STEP: f32 = 0.08; // per frame
pub const HAND_SMOOTHING: f32 = 0.2; // lerp factor per frame
pub const TIME_STEP: f32 = 0.01; // per frame, not wall clock
/// Normalized camera space -> world units.
pub const HAND_SCALE: f32 = 120.0;
/// MediaPipe hand landmark used as the tracked point (middle finger MCP, palm center).
pub const PALM_CENTER_LANDMARK: usize = 9;

/* ---------- View ---------- */

pub const FOV_Y_DEGREES: f32 = 60.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 1000.0;
pub const CAMERA_DISTANCE: f32 = 300.0;
/// Sprite size numerator: pixels = size * POINT_SCALE / depth.
pub const POINT_SCALE: f32 = 300.0;

/* ---------- Presentation ---------- */

pub const WINDOW_TITLE: &str = "Masterpiece AR";
/// How much black is laid over the camera feed so the particles read as solid.
pub const BACKDROP_DARKEN: f32 = 0.6;
pub const CAMERA_WIDTH: u32 = 640;
pub const CAMERA_HEIGHT: u32 = 480;

/// The curated paintings, looked up as `<art-dir>/<file>`.
pub const DEFAULT_ARTWORKS: [(&str, &str); 5] = [
    ("The Great Wave off Kanagawa", "great_wave.jpg"),
    ("Sunflowers (Vincent van Gogh)", "sunflowers.jpg"),
    ("The Starry Night (Vincent van Gogh)", "starry_night.jpg"),
    ("Water Lilies (Claude Monet)", "water_lilies.jpg"),
    ("The Scream (Edvard Munch)", "the_scream.jpg"),
];

/// One entry of the image catalog: what we show as the title + where the pixels live.
#[derive(Clone, Debug, PartialEq)]
pub struct Artwork {
    pub name: String,
    pub path: PathBuf,
}

/// Parse `NAME=PATH` (a bare path uses its file stem as the name).
fn parse_artwork(raw: &str) -> Result<Artwork, String> {
    match raw.split_once('=') {
        Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => Ok(Artwork {
            name: name.trim().to_string(),
            path: PathBuf::from(path.trim()),
        }),
        Some(_) => Err(format!("expected NAME=PATH, got `{raw}`")),
        None => {
            let path = PathBuf::from(raw);
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| format!("cannot derive a name from `{raw}`"))?
                .to_string();
            Ok(Artwork { name, path })
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "masterpiece-particles")]
#[command(about = "Famous paintings as particles that swirl into a galaxy around your hand")]
pub struct Args {
    /// Initial window width in pixels
    #[arg(long, default_value_t = 1280)]
    pub width: usize,

    /// Initial window height in pixels
    #[arg(long, default_value_t = 720)]
    pub height: usize,

    /// Camera device index used for the live backdrop
    #[arg(long, default_value_t = 0)]
    pub camera: u32,

    /// Skip the camera and draw particles over black
    #[arg(long)]
    pub no_camera: bool,

    /// Directory holding the default paintings
    #[arg(long, default_value = "assets/paintings")]
    pub art_dir: PathBuf,

    /// Replace the default set: NAME=PATH (repeatable, shown in order)
    #[arg(long = "image", value_parser = parse_artwork)]
    pub images: Vec<Artwork>,

    /// JSON-lines hand landmark stream (`-` for stdin). Without it, hold the
    /// left mouse button to act as the hand.
    #[arg(long)]
    pub landmarks: Option<PathBuf>,

    /// How often an unavailable tracker is polled, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub poll_ms: u64,

    /// Seed for particle jitter and the galaxy layout
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Args {
    /// The image catalog in display order.
    pub fn artworks(&self) -> Vec<Artwork> {
        if !self.images.is_empty() {
            return self.images.clone();
        }
        DEFAULT_ARTWORKS
            .iter()
            .map(|(name, file)| Artwork {
                name: (*name).to_string(),
                path: self.art_dir.join(file),
            })
            .collect()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_flag_accepts_name_and_path() {
        let art = parse_artwork("Night Cafe=/tmp/cafe.png").unwrap();
        assert_eq!(art.name, "Night Cafe");
        assert_eq!(art.path, PathBuf::from("/tmp/cafe.png"));
    }

    #[test]
    fn bare_path_uses_file_stem() {
        let art = parse_artwork("art/irises.jpg").unwrap();
        assert_eq!(art.name, "irises");
    }

    #[test]
    fn empty_halves_are_rejected() {
        assert!(parse_artwork("=x.png").is_err());
        assert!(parse_artwork("name=").is_err());
    }

    #[test]
    fn default_catalog_lives_under_art_dir() {
        let args = Args::parse_from(["masterpiece-particles", "--art-dir", "pics"]);
        let works = args.artworks();
        assert_eq!(works.len(), DEFAULT_ARTWORKS.len());
        assert_eq!(works[0].path, PathBuf::from("pics").join("great_wave.jpg"));
    }

    #[test]
    fn explicit_images_replace_defaults() {
        let args = Args::parse_from([
            "masterpiece-particles",
            "--image",
            "A=a.png",
            "--image",
            "B=b.png",
        ]);
        let names: Vec<_> = args.artworks().into_iter().map(|a| a.name).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn particle_budget_covers_the_sample_grid() {
        assert!(PARTICLE_COUNT >= (SAMPLE_SIZE * SAMPLE_SIZE) as usize);
    }
}
