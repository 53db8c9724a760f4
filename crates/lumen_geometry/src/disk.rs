//! Flat circular disk.

use crate::{
    hittable::{HitRecord, Hittable, MaterialId},
    sampling::Onb,
    GeometryError, GeometryResult, Ray,
};
use lumen_math::{Aabb, Interval, Vec3};
use std::f32::consts::PI;

/// Half-size along each axis of a disk of `radius` with unit `normal`.
pub(crate) fn disk_extent(normal: Vec3, radius: f32) -> Vec3 {
    let axis = |n: f32| radius * (1.0 - n * n).max(0.0).sqrt();
    Vec3::new(axis(normal.x), axis(normal.y), axis(normal.z))
}

/// A disk of `radius` centered at `center`, outward side along `normal`.
#[derive(Debug, Clone)]
pub struct Disk {
    center: Vec3,
    normal: Vec3,
    radius: f32,
    basis: Onb,
    material: MaterialId,
    bbox: Aabb,
}

impl Disk {
    pub fn new(center: Vec3, normal: Vec3, radius: f32, material: MaterialId) -> GeometryResult<Self> {
        if radius.is_nan() || radius <= 0.0 {
            return Err(GeometryError::NonPositiveRadius(radius));
        }
        if normal.length_squared() == 0.0 {
            return Err(GeometryError::DegenerateAxis);
        }

        let normal = normal.normalize();
        let extent = disk_extent(normal, radius);

        Ok(Self {
            center,
            normal,
            radius,
            basis: Onb::new(normal),
            material,
            bbox: Aabb::from_points(center - extent, center + extent),
        })
    }
}

impl Hittable for Disk {
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        let denom = self.normal.dot(ray.direction());
        if denom.abs() < 1e-8 {
            return false;
        }

        let t = self.normal.dot(self.center - ray.origin()) / denom;
        if !ray_t.surrounds(t) {
            return false;
        }

        let p = ray.at(t);
        let radial = p - self.center;
        let dist_sq = radial.length_squared();
        if dist_sq > self.radius * self.radius {
            return false;
        }

        // Angle around the normal in the disk's own frame, and distance out
        let local_x = radial.dot(self.basis.transform(Vec3::X));
        let local_y = radial.dot(self.basis.transform(Vec3::Y));
        let phi = local_y.atan2(local_x) + PI;

        rec.t = t;
        rec.p = p;
        rec.u = phi / (2.0 * PI);
        rec.v = dist_sq.sqrt() / self.radius;
        rec.material = Some(self.material);
        rec.set_face_normal(ray, self.normal);

        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
