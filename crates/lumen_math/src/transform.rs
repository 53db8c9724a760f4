// Transform utilities for Mat4
//
// glam::Mat4 already provides transform_point3(), transform_vector3() and
// inverse(); these cover boxes and surface normals.

use glam::{Mat4, Vec3};
use crate::Aabb;

/// Extension trait for Mat4 used when placing geometry with a transform.
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box.
    ///
    /// Encloses all 8 transformed corners. Mapping only `min` and `max` would
    /// under-size the result as soon as the matrix rotates.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// Transform a surface normal with the inverse transpose of `self`.
    ///
    /// `self` is expected to be the world-to-object matrix (the inverse of
    /// the placement), so only a transpose is applied here.
    fn transform_normal3(&self, normal: Vec3) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::EMPTY;
        }

        let lo = aabb.min();
        let hi = aabb.max();

        let mut result_min = Vec3::splat(f32::INFINITY);
        let mut result_max = Vec3::splat(f32::NEG_INFINITY);
        for corner in 0..8 {
            let p = Vec3::new(
                if corner & 1 == 0 { lo.x } else { hi.x },
                if corner & 2 == 0 { lo.y } else { hi.y },
                if corner & 4 == 0 { lo.z } else { hi.z },
            );
            let transformed = self.transform_point3(p);
            result_min = result_min.min(transformed);
            result_max = result_max.max(transformed);
        }

        Aabb::from_points(result_min, result_max)
    }

    fn transform_normal3(&self, normal: Vec3) -> Vec3 {
        self.transpose().transform_vector3(normal).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 0.001
    }

    #[test]
    fn test_transform_aabb_identity() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let transformed = Mat4::IDENTITY.transform_aabb(&aabb);

        assert!(approx(transformed.min(), aabb.min()));
        assert!(approx(transformed.max(), aabb.max()));
    }

    #[test]
    fn test_transform_aabb_translation() {
        let mat = Mat4::from_translation(Vec3::splat(5.0));
        let transformed = mat.transform_aabb(&Aabb::from_points(Vec3::ZERO, Vec3::ONE));

        assert!(approx(transformed.min(), Vec3::splat(5.0)));
        assert!(approx(transformed.max(), Vec3::splat(6.0)));
    }

    #[test]
    fn test_transform_aabb_rotation_uses_all_corners() {
        // A 45 degree turn about z widens a unit cube to sqrt(2) in x and y.
        let mat = Mat4::from_rotation_z(PI / 4.0);
        let aabb = Aabb::from_points(Vec3::splat(-0.5), Vec3::splat(0.5));
        let transformed = mat.transform_aabb(&aabb);

        let half_diag = 0.5 * 2.0_f32.sqrt();
        assert!(approx(transformed.min(), Vec3::new(-half_diag, -half_diag, -0.5)));
        assert!(approx(transformed.max(), Vec3::new(half_diag, half_diag, 0.5)));

        // The box must still contain every rotated corner.
        let corner = mat.transform_point3(Vec3::new(0.5, -0.5, 0.5));
        assert!(transformed.x.contains(corner.x));
        assert!(transformed.y.contains(corner.y));
    }

    #[test]
    fn test_transform_normal_under_nonuniform_scale() {
        // Plane x + y = 0 has normal (1, 1, 0); squashing x by 2 tilts it.
        let placement = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let world_to_object = placement.inverse();
        let n = world_to_object.transform_normal3(Vec3::new(1.0, 1.0, 0.0).normalize());

        // A tangent of the plane maps to (2, -1, 0) and must stay orthogonal.
        let tangent = placement.transform_vector3(Vec3::new(1.0, -1.0, 0.0));
        assert!(n.dot(tangent).abs() < 1e-5);
        assert!((n.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_transform_empty_box_stays_empty() {
        let mat = Mat4::from_rotation_y(PI / 3.0);
        assert!(mat.transform_aabb(&Aabb::EMPTY).is_empty());
    }
}
