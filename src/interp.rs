// Smoothed per-frame state fed to the shader as uniforms.
// Visual: `current_mix` fades the field between painting (0) and galaxy (1);
// `smoothed_hand` makes the swarm trail the hand instead of snapping to it.

use crate::config::{HAND_SCALE, HAND_SMOOTHING, MIX_STEP, TIME_STEP};
use glam::{Vec2, Vec3};

#[derive(Clone, Debug)]
pub struct Interpolation {
    pub target_mix: f32,
    pub current_mix: f32,
    pub hand_target: Vec3,
    pub smoothed_hand: Vec3,
    pub hand_active: bool,
    /// Frame-count clock: advances by TIME_STEP per frame regardless of wall time.
    pub time: f32,
}

impl Default for Interpolation {
    fn default() -> Self {
        Self {
            target_mix: 0.0,
            current_mix: 0.0,
            hand_target: Vec3::ZERO,
            smoothed_hand: Vec3::ZERO,
            hand_active: false,
            time: 0.0,
        }
    }
}

/// Normalized camera coordinates -> world units. Both axes flip: the camera
/// image is shown mirrored, and screen y grows downwards.
pub fn palm_to_world(palm: Vec2, aspect: f32) -> Vec3 {
    Vec3::new(
        (palm.x - 0.5) * -2.0 * aspect * HAND_SCALE,
        (palm.y - 0.5) * -2.0 * HAND_SCALE,
        0.0,
    )
}

impl Interpolation {
    /// Tracking side: a hand was seen at `palm` (normalized), or not at all.
    pub fn track(&mut self, palm: Option<Vec2>, aspect: f32) {
        match palm {
            Some(p) => {
                self.hand_target = palm_to_world(p, aspect);
                self.hand_active = true;
                self.target_mix = 1.0;
            }
            None => {
                self.hand_active = false;
                self.target_mix = 0.0;
            }
        }
    }

    /// Frame side: step mix, ease the hand, tick the clock.
    pub fn step(&mut self) {
        let target = self.target_mix.clamp(0.0, 1.0);
        if self.current_mix < target {
            self.current_mix = (self.current_mix + MIX_STEP).min(target);
        } else if self.current_mix > target {
            self.current_mix = (self.current_mix - MIX_STEP).max(target);
        }
        self.smoothed_hand = self.smoothed_hand.lerp(self.hand_target, HAND_SMOOTHING);
        self.time += TIME_STEP;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn full_fade_in_takes_thirteen_frames() {
        let mut s = Interpolation::default();
        s.track(Some(Vec2::new(0.5, 0.5)), 1.0);
        let mut frames = 0;
        let mut last = s.current_mix;
        while s.current_mix < 1.0 {
            s.step();
            frames += 1;
            assert!(s.current_mix >= last, "mix went backwards");
            assert!(s.current_mix <= 1.0);
            last = s.current_mix;
            assert!(frames <= 13, "took too long");
        }
        assert_eq!(frames, 13);
    }

    #[test]
    fn fade_out_never_undershoots() {
        let mut s = Interpolation { current_mix: 0.05, ..Default::default() };
        s.track(None, 1.0);
        s.step();
        assert_eq!(s.current_mix, 0.0);
        s.step();
        assert_eq!(s.current_mix, 0.0);
    }

    #[test]
    fn mix_steps_by_fixed_amount() {
        let mut s = Interpolation::default();
        s.target_mix = 1.0;
        s.step();
        assert_relative_eq!(s.current_mix, MIX_STEP);
        s.step();
        assert_relative_eq!(s.current_mix, 2.0 * MIX_STEP);
    }

    #[test]
    fn palm_mapping_mirrors_and_scales() {
        assert_eq!(palm_to_world(Vec2::new(0.5, 0.5), 1.6), Vec3::ZERO);
        let left_top = palm_to_world(Vec2::new(0.0, 0.0), 2.0);
        assert_relative_eq!(left_top.x, 240.0);
        assert_relative_eq!(left_top.y, 120.0);
        let right_bottom = palm_to_world(Vec2::new(1.0, 1.0), 1.0);
        assert_relative_eq!(right_bottom.x, -120.0);
        assert_relative_eq!(right_bottom.y, -120.0);
    }

    #[test]
    fn hand_eases_toward_target() {
        let mut s = Interpolation::default();
        s.track(Some(Vec2::new(0.0, 0.5)), 1.0); // x' = 120
        s.step();
        assert_relative_eq!(s.smoothed_hand.x, 24.0, epsilon = 1e-4);
        s.step();
        assert_relative_eq!(s.smoothed_hand.x, 43.2, epsilon = 1e-4);
    }

    #[test]
    fn losing_the_hand_keeps_last_target() {
        let mut s = Interpolation::default();
        s.track(Some(Vec2::new(0.25, 0.5)), 1.0);
        let seen = s.hand_target;
        s.track(None, 1.0);
        assert!(!s.hand_active);
        assert_eq!(s.target_mix, 0.0);
        assert_eq!(s.hand_target, seen);
    }

    #[test]
    fn clock_counts_frames() {
        let mut s = Interpolation::default();
        for _ in 0..100 {
            s.step();
        }
        assert_relative_eq!(s.time, 1.0, epsilon = 1e-4);
    }
}
