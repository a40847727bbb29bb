// camera.rs — 视角参数（yaw / pitch / fov）与投影

use glam::{Mat4, Vec2, Vec3};

use crate::ray::Ray;

const NEAR: f32 = 0.1;
const FAR: f32 = 1000.0;

/// Perspective camera sitting at the centre of the current room.
#[derive(Debug, Clone)]
pub struct TourCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub sensitivity_scale: f32,
    projection: Mat4,
}

impl TourCamera {
    pub fn new(fov: f32, aspect: f32) -> Self {
        let mut camera = Self {
            yaw: 0.0,
            pitch: 0.0,
            fov,
            aspect,
            sensitivity_scale: 1.0,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }

    /// Recompute the projection matrix after `fov` or `aspect` changed.
    pub fn update_projection(&mut self) {
        let fov = self.fov.clamp(1.0, 179.0).to_radians();
        let aspect = if self.aspect > 0.0 { self.aspect } else { 1.0 };
        self.projection = Mat4::perspective_rh(fov, aspect, NEAR, FAR);
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
        self.update_projection();
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
            self.update_projection();
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::ZERO
    }

    /// Viewing direction. yaw = 0, pitch = 0 looks down -Z.
    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(-yaw.sin() * pitch.cos(), pitch.sin(), -yaw.cos() * pitch.cos()).normalize()
    }

    pub fn right(&self) -> Vec3 {
        let right = self.forward().cross(Vec3::Y);
        if right.length_squared() < 1e-8 {
            // 正上/正下方时退化为 yaw 方向
            let yaw = self.yaw.to_radians();
            Vec3::new(yaw.cos(), 0.0, -yaw.sin())
        } else {
            right.normalize()
        }
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward()).normalize()
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.position(), self.forward(), self.up())
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection * self.view()
    }

    /// Ray from the camera through a point given in normalized device
    /// coordinates ([-1, 1] on both axes, +Y up).
    pub fn ray_through(&self, ndc: Vec2) -> Ray {
        let inv = self.view_proj().inverse();
        let far = inv.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray::new(self.position(), far - self.position())
    }

    /// Project a world point to NDC. `None` when it lies behind the camera.
    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        if (point - self.position()).dot(self.forward()) <= 0.0 {
            return None;
        }
        let p = self.view_proj().project_point3(point);
        Some(Vec2::new(p.x, p.y))
    }

    /// Drag rotation: converts a pointer delta in pixels into yaw/pitch so
    /// the panorama follows the pointer at any zoom level.
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let v_f = self.fov.to_radians();
        let aspect = width / height;
        let h_f = 2.0 * ((v_f / 2.0).tan() * aspect).atan();

        let yaw_per_px_deg = (h_f / width).to_degrees();
        let pitch_per_px_deg = (v_f / height).to_degrees();

        self.yaw -= dx * yaw_per_px_deg * self.sensitivity_scale;
        self.pitch = (self.pitch + dy * pitch_per_px_deg * self.sensitivity_scale).clamp(-89.0, 89.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_default_looks_down_negative_z() {
        let camera = TourCamera::new(75.0, 16.0 / 9.0);
        assert!((camera.forward() - Vec3::NEG_Z).length() < EPS);
        assert!((camera.right() - Vec3::X).length() < EPS);
        assert!((camera.up() - Vec3::Y).length() < EPS);
    }

    #[test]
    fn test_center_ray_is_forward() {
        let mut camera = TourCamera::new(75.0, 1.5);
        camera.yaw = 30.0;
        camera.pitch = -10.0;
        let ray = camera.ray_through(Vec2::ZERO);
        assert!((ray.direction - camera.forward()).length() < EPS);
    }

    #[test]
    fn test_project_then_ray_hits_point() {
        let camera = TourCamera::new(75.0, 16.0 / 9.0);
        let target = Vec3::new(200.0, 0.0, -400.0);
        let ndc = camera.project(target).unwrap();
        assert!(ndc.x > 0.0 && ndc.x < 1.0);
        assert!(ndc.y.abs() < EPS);

        let ray = camera.ray_through(ndc);
        assert!((ray.direction - target.normalize()).length() < 1e-3);
    }

    #[test]
    fn test_points_behind_do_not_project() {
        let camera = TourCamera::new(75.0, 1.0);
        assert!(camera.project(Vec3::new(0.0, 0.0, 100.0)).is_none());
    }

    #[test]
    fn test_drag_rotation_clamps_pitch() {
        let mut camera = TourCamera::new(75.0, 1.0);
        camera.rotate_by_pixels(0.0, 100_000.0, 800.0, 800.0);
        assert_eq!(camera.pitch, 89.0);
        camera.rotate_by_pixels(100.0, 0.0, 800.0, 800.0);
        assert!(camera.yaw < 0.0);
    }
}
