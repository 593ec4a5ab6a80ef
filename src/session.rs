// One running experience: the cached paintings, the particle field, the
// smoothed input state and the little state machine that cycles paintings.
// Visual: show a hand -> galaxy; take it away -> next painting assembles.

use crate::interp::Interpolation;
use crate::particles::ParticleSet;
use crate::tracking::TrackingUpdate;
use crate::types::SampledImage;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Hand posture as reported to the HUD. Detection only ever yields `Open`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandPosture {
    Unknown,
    Open,
}

/// Display cycle: ImageStatic -> Galaxy -> Switching -> ImageStatic(next) -> ...
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayPhase {
    /// Painting at rest, no hand.
    ImageStatic,
    /// Hand in view, field swirls around it.
    Galaxy,
    /// Hand just left; the next painting is settling back in.
    Switching,
}

pub struct Session {
    images: Vec<SampledImage>,
    current: usize,
    particles: ParticleSet,
    /// Bumped after every complete rebuild; the renderer uploads when it changes.
    particles_version: u64,
    pub interp: Interpolation,
    posture: HandPosture,
    phase: DisplayPhase,
    switches: u64,
    rng: StdRng,
}

impl Session {
    /// Build the first painting's particles. `images` must be non-empty
    /// (the catalog loader guarantees it).
    pub fn new(images: Vec<SampledImage>, capacity: usize, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let mut particles = ParticleSet::with_capacity(capacity);
        if let Some(first) = images.first() {
            particles.rebuild(first, &mut rng);
        }
        Self {
            images,
            current: 0,
            particles,
            particles_version: 1,
            interp: Interpolation::default(),
            posture: HandPosture::Unknown,
            phase: DisplayPhase::ImageStatic,
            switches: 0,
            rng,
        }
    }

    /// Tracking update: one painting switch per hand the sink saw leave,
    /// then the newest sample drives the hand target.
    pub fn on_tracking(&mut self, update: TrackingUpdate, aspect: f32) {
        for _ in 0..update.hands_lost {
            self.advance_image();
            self.posture = HandPosture::Unknown;
            self.phase = DisplayPhase::Switching;
        }

        let Some(sample) = update.sample else { return };
        if sample.palm.is_some() {
            self.posture = HandPosture::Open;
            self.phase = DisplayPhase::Galaxy;
        }
        self.interp.track(sample.palm, aspect);
    }

    /// Frame update: ease the uniforms, settle the switch once the galaxy has faded.
    pub fn on_frame(&mut self) {
        self.interp.step();
        if self.phase == DisplayPhase::Switching && self.interp.current_mix <= 0.0 {
            self.phase = DisplayPhase::ImageStatic;
        }
    }

    fn advance_image(&mut self) {
        if self.images.len() <= 1 {
            return;
        }
        self.current = (self.current + 1) % self.images.len();
        let image = &self.images[self.current];
        self.particles.rebuild(image, &mut self.rng);
        self.particles_version += 1;
        self.switches += 1;
        log::info!(
            "Switched to `{}` ({}/{}), {} visible dots",
            image.name,
            self.current + 1,
            self.images.len(),
            self.particles.opaque_count()
        );
    }

    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    pub fn particles_version(&self) -> u64 {
        self.particles_version
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn current_name(&self) -> &str {
        self.images.get(self.current).map(|i| i.name.as_str()).unwrap_or("")
    }

    pub fn posture(&self) -> HandPosture {
        self.posture
    }

    pub fn phase(&self) -> DisplayPhase {
        self.phase
    }

    pub fn switches(&self) -> u64 {
        self.switches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::{HandSample, TrackingSink};
    use glam::Vec2;

    fn flat(name: &str, rgba: [u8; 4]) -> SampledImage {
        SampledImage { name: name.into(), width: 4, height: 4, pixels: rgba.repeat(16) }
    }

    fn session(n: usize) -> Session {
        let images = (0..n).map(|i| flat(&format!("img{i}"), [i as u8 * 40, 0, 0, 255])).collect();
        Session::new(images, 64, Some(42))
    }

    fn hand() -> HandSample {
        HandSample { palm: Some(Vec2::new(0.3, 0.6)) }
    }

    fn gone() -> HandSample {
        HandSample { palm: None }
    }

    /// Post one sample and drain it straight into the session, like a frame
    /// that keeps pace with the tracker.
    fn track(s: &mut Session, sink: &TrackingSink, sample: HandSample) {
        sink.post(sample);
        s.on_tracking(sink.drain(), 1.0);
    }

    #[test]
    fn hand_lost_between_frames_still_switches() {
        let mut s = session(3);
        let sink = TrackingSink::new();
        sink.post(hand());
        sink.post(gone());
        s.on_tracking(sink.drain(), 1.0);
        s.on_frame();
        assert_eq!(s.switches(), 1);
        assert_eq!(s.current_index(), 1);
        assert_eq!(s.posture(), HandPosture::Unknown);
    }

    #[test]
    fn several_lost_hands_in_one_drain_switch_each_time() {
        let mut s = session(3);
        let sink = TrackingSink::new();
        for sample in [hand(), gone(), hand(), gone()] {
            sink.post(sample);
        }
        s.on_tracking(sink.drain(), 1.0);
        assert_eq!(s.switches(), 2);
        assert_eq!(s.current_index(), 2);
    }

    #[test]
    fn empty_drain_changes_nothing() {
        let mut s = session(2);
        let sink = TrackingSink::new();
        track(&mut s, &sink, hand());
        s.on_tracking(sink.drain(), 1.0);
        assert_eq!(s.phase(), DisplayPhase::Galaxy);
        assert!(s.interp.hand_active);
    }

    #[test]
    fn one_switch_per_lost_hand() {
        let mut s = session(3);
        let sink = TrackingSink::new();
        track(&mut s, &sink, hand());
        track(&mut s, &sink, hand());
        assert_eq!(s.current_index(), 0);

        track(&mut s, &sink, gone());
        assert_eq!(s.current_index(), 1);
        // absence repeated on later frames is not another transition
        track(&mut s, &sink, gone());
        track(&mut s, &sink, gone());
        assert_eq!(s.current_index(), 1);
        assert_eq!(s.switches(), 1);
    }

    #[test]
    fn index_wraps_around() {
        let mut s = session(2);
        let sink = TrackingSink::new();
        for _ in 0..3 {
            track(&mut s, &sink, hand());
            track(&mut s, &sink, gone());
        }
        assert_eq!(s.current_index(), 1);
        assert_eq!(s.switches(), 3);
    }

    #[test]
    fn never_seen_hand_never_switches() {
        let mut s = session(3);
        let sink = TrackingSink::new();
        for _ in 0..10 {
            track(&mut s, &sink, gone());
        }
        assert_eq!(s.current_index(), 0);
    }

    #[test]
    fn single_image_catalog_does_not_rebuild() {
        let mut s = session(1);
        let sink = TrackingSink::new();
        let v = s.particles_version();
        track(&mut s, &sink, hand());
        track(&mut s, &sink, gone());
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.particles_version(), v);
    }

    #[test]
    fn switch_rebuilds_with_next_painting() {
        let mut s = session(2);
        let sink = TrackingSink::new();
        let v = s.particles_version();
        track(&mut s, &sink, hand());
        track(&mut s, &sink, gone());
        assert_eq!(s.particles_version(), v + 1);
        assert_eq!(s.current_name(), "img1");
        let c = s.particles().as_slice()[0].color;
        assert!((c[0] - 40.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn phases_follow_the_hand() {
        let mut s = session(2);
        let sink = TrackingSink::new();
        assert_eq!(s.phase(), DisplayPhase::ImageStatic);
        assert_eq!(s.posture(), HandPosture::Unknown);

        track(&mut s, &sink, hand());
        assert_eq!(s.phase(), DisplayPhase::Galaxy);
        assert_eq!(s.posture(), HandPosture::Open);
        for _ in 0..20 {
            s.on_frame();
        }
        assert_eq!(s.interp.current_mix, 1.0);

        track(&mut s, &sink, gone());
        assert_eq!(s.phase(), DisplayPhase::Switching);
        assert_eq!(s.posture(), HandPosture::Unknown);
        for _ in 0..20 {
            s.on_frame();
        }
        assert_eq!(s.phase(), DisplayPhase::ImageStatic);
    }

    #[test]
    fn full_cycle_restores_partition() {
        let mut s = session(3);
        let sink = TrackingSink::new();
        let partition = s.particles().image_count();
        let first: Vec<_> = s.particles().as_slice()[..partition].iter().map(|p| p.color).collect();
        for _ in 0..3 {
            track(&mut s, &sink, hand());
            track(&mut s, &sink, gone());
        }
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.particles().image_count(), partition);
        let again: Vec<_> = s.particles().as_slice()[..partition].iter().map(|p| p.color).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn seeded_sessions_are_reproducible() {
        let mut a = session(2);
        let mut b = session(2);
        assert_eq!(a.particles().as_slice(), b.particles().as_slice());
        for s in [&mut a, &mut b] {
            let sink = TrackingSink::new();
            track(s, &sink, hand());
            track(s, &sink, gone());
        }
        assert_eq!(a.particles().as_slice(), b.particles().as_slice());
    }
}
