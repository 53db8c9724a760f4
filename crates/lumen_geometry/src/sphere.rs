//! Sphere primitive for ray tracing.

use crate::{
    hittable::{HitRecord, Hittable, MaterialId},
    sampling::{random_to_sphere, random_unit_vector, Onb},
    GeometryError, GeometryResult, Ray,
};
use lumen_math::{Aabb, Interval, Vec3};
use rand::RngCore;
use std::f32::consts::PI;

/// A sphere primitive.
#[derive(Debug, Clone)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material: MaterialId,
    bbox: Aabb,
}

impl Sphere {
    /// Create a new sphere. The radius must be positive.
    pub fn new(center: Vec3, radius: f32, material: MaterialId) -> GeometryResult<Self> {
        if radius.is_nan() || radius <= 0.0 {
            return Err(GeometryError::NonPositiveRadius(radius));
        }
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        Ok(Self {
            center,
            radius,
            material,
            bbox,
        })
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Get the UV coordinates for a point on the unit sphere.
    fn get_sphere_uv(p: Vec3) -> (f32, f32) {
        // theta: angle down from +Y
        // phi: angle around Y axis from +X
        let theta = (-p.y).acos();
        let phi = (-p.z).atan2(p.x) + PI;

        (phi / (2.0 * PI), theta / PI)
    }
}

impl Hittable for Sphere {
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        let oc = self.center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return false;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return false;
            }
        }

        rec.t = root;
        rec.p = ray.at(root);
        let outward_normal = (rec.p - self.center) / self.radius;
        rec.set_face_normal(ray, outward_normal);
        (rec.u, rec.v) = Self::get_sphere_uv(outward_normal);
        rec.material = Some(self.material);

        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        let mut rec = HitRecord::default();
        let probe = Ray::new_simple(origin, direction);
        if !self.hit(&probe, Interval::new(0.001, f32::INFINITY), &mut rec) {
            return 0.0;
        }

        let distance_squared = (self.center - origin).length_squared();
        let r2 = self.radius * self.radius;
        if distance_squared <= r2 {
            // Inside: every direction hits
            return 1.0 / (4.0 * PI);
        }
        let cos_theta_max = (1.0 - r2 / distance_squared).sqrt();
        let solid_angle = 2.0 * PI * (1.0 - cos_theta_max);

        1.0 / solid_angle
    }

    fn random_direction(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let direction = self.center - origin;
        let distance_squared = direction.length_squared();
        if distance_squared <= self.radius * self.radius {
            return random_unit_vector(rng);
        }
        let uvw = Onb::new(direction);
        uvw.transform(random_to_sphere(self.radius, distance_squared, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn unit_sphere() -> Sphere {
        Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, MaterialId(7)).unwrap()
    }

    #[test]
    fn test_sphere_hit() {
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();

        assert!(unit_sphere().hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert!((rec.t - 0.5).abs() < 0.001);
        assert!(rec.front_face);
        assert_eq!(rec.material, Some(MaterialId(7)));
        assert!((rec.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_sphere_miss() {
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        let mut rec = HitRecord::default();
        assert!(!unit_sphere().hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert_eq!(rec, HitRecord::default());
    }

    #[test]
    fn test_sphere_far_root_when_near_is_outside() {
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();

        // Start past the near surface: the far one is an exit.
        assert!(unit_sphere().hit(&ray, Interval::new(0.75, f32::INFINITY), &mut rec));
        assert!((rec.t - 1.5).abs() < 0.001);
        assert!(!rec.front_face);
    }

    #[test]
    fn test_sphere_rejects_bad_radius() {
        assert_eq!(
            Sphere::new(Vec3::ZERO, 0.0, MaterialId(0)).unwrap_err(),
            GeometryError::NonPositiveRadius(0.0)
        );
        assert!(Sphere::new(Vec3::ZERO, -1.0, MaterialId(0)).is_err());
        assert!(Sphere::new(Vec3::ZERO, f32::NAN, MaterialId(0)).is_err());
    }

    #[test]
    fn test_sphere_bbox_area_and_centroid() {
        let s = Sphere::new(Vec3::ONE, 2.0, MaterialId(0)).unwrap();
        let bbox = s.bounding_box();

        // 6 faces of side 2r
        assert!((bbox.surface_area() - 96.0).abs() < 1e-4);
        assert_eq!(bbox.centroid(), Vec3::ONE);
    }

    #[test]
    fn test_sphere_sampling_is_consistent() {
        let s = Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0, MaterialId(0)).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..64 {
            let d = s.random_direction(Vec3::ZERO, &mut rng);
            assert!(s.pdf_value(Vec3::ZERO, d) > 0.0);
        }
        assert_eq!(s.pdf_value(Vec3::ZERO, Vec3::Z), 0.0);
    }
}
