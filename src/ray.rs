// ray.rs — 射线与朝向相机的公告板求交

use glam::Vec3;

const EPSILON: f32 = 1e-6;

/// A ray in 3D space, defined by an origin point and a direction vector.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3, // Always normalized
}

/// Camera-facing rectangle, the shape a hotspot marker presents to the pointer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Billboard {
    pub center: Vec3,
    pub width: f32,
    pub height: f32,
}

impl Ray {
    /// Creates a new ray with the given origin and direction.
    /// The direction will be normalized automatically.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Returns a point along the ray at parameter t.
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersects the ray with a billboard spanned by the camera's `right`
    /// and `up` axes.
    ///
    /// Returns the distance along the ray, or `None` on a miss or when the
    /// billboard is behind the ray origin.
    pub fn intersect_billboard(&self, billboard: &Billboard, right: Vec3, up: Vec3) -> Option<f32> {
        let normal = right.cross(up);
        let denom = self.direction.dot(normal);

        // Ray parallel to the billboard plane
        if denom.abs() < EPSILON {
            return None;
        }

        let t = (billboard.center - self.origin).dot(normal) / denom;
        if t <= EPSILON {
            return None;
        }

        let local = self.point_at(t) - billboard.center;
        let x = local.dot(right);
        let y = local.dot(up);

        if x.abs() <= billboard.width * 0.5 && y.abs() <= billboard.height * 0.5 {
            Some(t)
        } else {
            None
        }
    }
}
