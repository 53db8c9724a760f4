//! Parallelogram primitive, typically used for walls and area lights.

use crate::{
    hittable::{HitRecord, Hittable, MaterialId},
    Ray,
};
use lumen_math::{Aabb, Interval, Vec3};
use rand::{Rng, RngCore};

/// A parallelogram spanned by `u` and `v` from corner `q`.
///
/// The outward side is `u × v`.
#[derive(Debug, Clone)]
pub struct Quad {
    q: Vec3,
    u: Vec3,
    v: Vec3,
    /// `n / (n · n)`, projects plane points onto (alpha, beta)
    w: Vec3,
    normal: Vec3,
    /// Plane offset: `normal · q`
    d: f32,
    area: f32,
    material: MaterialId,
    bbox: Aabb,
}

impl Quad {
    pub fn new(q: Vec3, u: Vec3, v: Vec3, material: MaterialId) -> Self {
        let n = u.cross(v);
        let normal = n.normalize();
        let bbox_diagonal1 = Aabb::from_points(q, q + u + v);
        let bbox_diagonal2 = Aabb::from_points(q + u, q + v);

        Self {
            q,
            u,
            v,
            w: n / n.dot(n),
            normal,
            d: normal.dot(q),
            area: n.length(),
            material,
            bbox: Aabb::surrounding(&bbox_diagonal1, &bbox_diagonal2),
        }
    }

    pub fn area(&self) -> f32 {
        self.area
    }
}

impl Hittable for Quad {
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        let denom = self.normal.dot(ray.direction());

        // Parallel to the plane
        if denom.abs() < 1e-8 {
            return false;
        }

        let t = (self.d - self.normal.dot(ray.origin())) / denom;
        if !ray_t.surrounds(t) {
            return false;
        }

        let intersection = ray.at(t);
        let planar = intersection - self.q;
        let alpha = self.w.dot(planar.cross(self.v));
        let beta = self.w.dot(self.u.cross(planar));
        if !(0.0..=1.0).contains(&alpha) || !(0.0..=1.0).contains(&beta) {
            return false;
        }

        rec.t = t;
        rec.p = intersection;
        rec.u = alpha;
        rec.v = beta;
        rec.material = Some(self.material);
        rec.set_face_normal(ray, self.normal);

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

        let distance_squared = rec.t * rec.t * direction.length_squared();
        let cosine = (direction.dot(rec.normal) / direction.length()).abs();
        if cosine <= 0.0 {
            return 0.0;
        }

        distance_squared / (cosine * self.area)
    }

    fn random_direction(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let p = self.q + rng.gen::<f32>() * self.u + rng.gen::<f32>() * self.v;
        p - origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn floor() -> Quad {
        // 2x2 square at y=0 facing +y
        Quad::new(
            Vec3::new(-1.0, 0.0, 1.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -2.0),
            MaterialId(1),
        )
    }

    #[test]
    fn test_quad_hit_and_uv() {
        let ray = Ray::new_simple(Vec3::new(0.5, 2.0, 0.0), -Vec3::Y);
        let mut rec = HitRecord::default();

        assert!(floor().hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert!((rec.t - 2.0).abs() < 1e-5);
        assert!(rec.front_face);
        assert!((rec.normal - Vec3::Y).length() < 1e-5);
        assert!((rec.u - 0.75).abs() < 1e-5);
        assert!((rec.v - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_quad_miss_outside_and_parallel() {
        let mut rec = HitRecord::default();
        let outside = Ray::new_simple(Vec3::new(3.0, 2.0, 0.0), -Vec3::Y);
        assert!(!floor().hit(&outside, Interval::new(0.001, f32::INFINITY), &mut rec));

        let parallel = Ray::new_simple(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        assert!(!floor().hit(&parallel, Interval::new(0.001, f32::INFINITY), &mut rec));
    }

    #[test]
    fn test_quad_bbox_and_area() {
        let quad = floor();
        assert!((quad.area() - 4.0).abs() < 1e-5);
        let bbox = quad.bounding_box();
        assert_eq!(bbox.x.min, -1.0);
        assert_eq!(bbox.x.max, 1.0);
        assert_eq!(bbox.z.min, -1.0);
        assert!(bbox.y.size() > 0.0);
    }

    #[test]
    fn test_quad_pdf_straight_down() {
        // Straight above the center at height 2: pdf = d² / (cos · A) = 4 / 4
        let pdf = floor().pdf_value(Vec3::new(0.0, 2.0, 0.0), -Vec3::Y);
        assert!((pdf - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_quad_samples_hit_the_quad() {
        let quad = floor();
        let origin = Vec3::new(0.2, 3.0, -0.1);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..32 {
            let d = quad.random_direction(origin, &mut rng);
            assert!(quad.pdf_value(origin, d) > 0.0);
        }
    }
}
