// Perspective camera looking down -z at the painting plane.
// Visual: a 200-unit painting fills roughly the middle of the window.

use crate::config::{CAMERA_DISTANCE, FAR_PLANE, FOV_Y_DEGREES, NEAR_PLANE};
use glam::{Mat4, Vec3};

#[derive(Clone, Copy, Debug)]
pub struct ViewCamera {
    pub fov_y: f32, // radians
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub eye: Vec3,
}

impl ViewCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            fov_y: FOV_Y_DEGREES.to_radians(),
            aspect: aspect_of(width, height),
            near: NEAR_PLANE,
            far: FAR_PLANE,
            eye: Vec3::new(0.0, 0.0, CAMERA_DISTANCE),
        }
    }

    /// Keep the projection in step with the window.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = aspect_of(width, height);
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, Vec3::ZERO, Vec3::Y)
    }

    /// wgpu clip space (depth 0..1).
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }
}

fn aspect_of(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec4;

    fn to_ndc(cam: &ViewCamera, p: Vec3) -> Vec3 {
        let clip = cam.projection() * cam.view() * p.extend(1.0);
        clip.truncate() / clip.w
    }

    #[test]
    fn origin_lands_in_the_middle() {
        let cam = ViewCamera::new(1280, 720);
        let ndc = to_ndc(&cam, Vec3::ZERO);
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn painting_plane_is_three_hundred_units_away() {
        let cam = ViewCamera::new(800, 600);
        let v = cam.view() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(v.z, -300.0, epsilon = 1e-4);
    }

    #[test]
    fn top_edge_of_frustum_at_plane() {
        // half-height at distance 300 with 60° fov = 300 * tan(30°)
        let cam = ViewCamera::new(1000, 1000);
        let half = 300.0 * 30f32.to_radians().tan();
        let ndc = to_ndc(&cam, Vec3::new(0.0, half, 0.0));
        assert_relative_eq!(ndc.y, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn resize_only_changes_aspect() {
        let mut cam = ViewCamera::new(100, 100);
        cam.set_viewport(200, 100);
        assert_relative_eq!(cam.aspect, 2.0);
        cam.set_viewport(0, 0);
        assert_relative_eq!(cam.aspect, 1.0);
    }

    #[test]
    fn placeholder_depth_is_behind_the_eye() {
        let cam = ViewCamera::new(640, 480);
        let v = cam.view() * Vec4::new(0.0, 0.0, 5000.0, 1.0);
        assert!(v.z > 0.0);
    }
}
