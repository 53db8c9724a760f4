//! Closed finite cylinder along an arbitrary axis.

use crate::{
    disk::disk_extent,
    hittable::{HitRecord, Hittable, MaterialId},
    sampling::Onb,
    GeometryError, GeometryResult, Ray,
};
use lumen_math::{Aabb, Interval, Vec3};
use std::f32::consts::PI;

/// Which part of the cylinder a candidate root lies on.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Surface {
    Side,
    BaseCap,
    ApexCap,
}

/// A solid cylinder from `base` to `apex` with both ends capped.
#[derive(Debug, Clone)]
pub struct Cylinder {
    base: Vec3,
    /// Unit vector from base to apex
    axis: Vec3,
    height: f32,
    radius: f32,
    basis: Onb,
    material: MaterialId,
    bbox: Aabb,
}

impl Cylinder {
    pub fn new(base: Vec3, apex: Vec3, radius: f32, material: MaterialId) -> GeometryResult<Self> {
        if radius.is_nan() || radius <= 0.0 {
            return Err(GeometryError::NonPositiveRadius(radius));
        }
        let span = apex - base;
        let height = span.length();
        if height == 0.0 {
            return Err(GeometryError::DegenerateAxis);
        }

        let axis = span / height;
        let extent = disk_extent(axis, radius);
        let bbox = Aabb::from_points(base.min(apex) - extent, base.max(apex) + extent);

        Ok(Self {
            base,
            axis,
            height,
            radius,
            basis: Onb::new(axis),
            material,
            bbox,
        })
    }

    /// Remove the axial component of `v`.
    #[inline]
    fn perpendicular(&self, v: Vec3) -> Vec3 {
        v - v.dot(self.axis) * self.axis
    }

    /// Angle of a radial vector around the axis, mapped to [0, 1].
    fn angle_of(&self, radial: Vec3) -> f32 {
        let x = radial.dot(self.basis.transform(Vec3::X));
        let y = radial.dot(self.basis.transform(Vec3::Y));
        (y.atan2(x) + PI) / (2.0 * PI)
    }
}

impl Hittable for Cylinder {
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        let oc = ray.origin() - self.base;
        let d = ray.direction();
        let oc_perp = self.perpendicular(oc);
        let d_perp = self.perpendicular(d);
        let r2 = self.radius * self.radius;

        let mut best: Option<(f32, Surface)> = None;
        let mut consider = |t: f32, surface: Surface| {
            if ray_t.surrounds(t) && best.map_or(true, |(closest, _)| t < closest) {
                best = Some((t, surface));
            }
        };

        // Curved side: |oc_perp + t d_perp|² = r², limited to the axial span
        let a = d_perp.length_squared();
        if a > 1e-12 {
            let h = oc_perp.dot(d_perp);
            let c = oc_perp.length_squared() - r2;
            let discriminant = h * h - a * c;
            if discriminant >= 0.0 {
                let sqrtd = discriminant.sqrt();
                for t in [(-h - sqrtd) / a, (-h + sqrtd) / a] {
                    let s = (oc + t * d).dot(self.axis);
                    if (0.0..=self.height).contains(&s) {
                        consider(t, Surface::Side);
                    }
                }
            }
        }

        // End caps
        let denom = d.dot(self.axis);
        if denom.abs() > 1e-12 {
            let along = oc.dot(self.axis);
            for (plane, surface) in [(0.0, Surface::BaseCap), (self.height, Surface::ApexCap)] {
                let t = (plane - along) / denom;
                if (oc_perp + t * d_perp).length_squared() <= r2 {
                    consider(t, surface);
                }
            }
        }

        let Some((t, surface)) = best else {
            return false;
        };

        let p = ray.at(t);
        let local = p - self.base;
        let radial = self.perpendicular(local);
        let (outward_normal, u, v) = match surface {
            Surface::Side => (
                radial / self.radius,
                self.angle_of(radial),
                local.dot(self.axis) / self.height,
            ),
            Surface::BaseCap => (-self.axis, self.angle_of(radial), radial.length() / self.radius),
            Surface::ApexCap => (self.axis, self.angle_of(radial), radial.length() / self.radius),
        };

        rec.t = t;
        rec.p = p;
        rec.u = u;
        rec.v = v;
        rec.material = Some(self.material);
        rec.set_face_normal(ray, outward_normal);

        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn z_cylinder() -> Cylinder {
        Cylinder::new(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 1.0), 1.0, MaterialId(4)).unwrap()
    }

    #[test]
    fn test_cylinder_cap_hit() {
        let ray = Ray::new_simple(Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();

        assert!(z_cylinder().hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert!((rec.p - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5);
        assert!((rec.t - 1.0).abs() < 1e-5);
        assert!((rec.normal - Vec3::Z).length() < 1e-5);
        assert!(rec.front_face);
        assert_eq!(rec.material, Some(MaterialId(4)));
    }

    #[test]
    fn test_cylinder_side_hit() {
        let ray = Ray::new_simple(Vec3::new(5.0, 0.0, 0.5), -Vec3::X);
        let mut rec = HitRecord::default();

        assert!(z_cylinder().hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert!((rec.t - 4.0).abs() < 1e-5);
        assert!((rec.normal - Vec3::X).length() < 1e-5);
        assert!(rec.front_face);
        assert!((rec.v - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_cylinder_exit_from_inside() {
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::Y);
        let mut rec = HitRecord::default();

        assert!(z_cylinder().hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert!((rec.t - 1.0).abs() < 1e-5);
        assert!(!rec.front_face);
        assert!((rec.normal - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_cylinder_misses_past_the_ends() {
        let mut rec = HitRecord::default();
        let above = Ray::new_simple(Vec3::new(5.0, 0.0, 1.5), -Vec3::X);
        assert!(!z_cylinder().hit(&above, Interval::new(0.001, f32::INFINITY), &mut rec));

        let beside = Ray::new_simple(Vec3::new(1.5, 0.0, 5.0), -Vec3::Z);
        assert!(!z_cylinder().hit(&beside, Interval::new(0.001, f32::INFINITY), &mut rec));
    }

    #[test]
    fn test_cylinder_bbox() {
        let bbox = z_cylinder().bounding_box();
        assert!((bbox.min() - Vec3::new(-1.0, -1.0, -1.0)).length() < 1e-5);
        assert!((bbox.max() - Vec3::new(1.0, 1.0, 1.0)).length() < 1e-5);

        let slanted = Cylinder::new(Vec3::ZERO, Vec3::new(3.0, 4.0, 0.0), 0.5, MaterialId(0)).unwrap();
        let bbox = slanted.bounding_box();
        assert!(bbox.x.min < 0.0 && bbox.x.max > 3.0);
        assert!((bbox.z.max - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_cylinder_rejects_degenerate_input() {
        assert!(matches!(
            Cylinder::new(Vec3::ZERO, Vec3::Z, -1.0, MaterialId(0)),
            Err(GeometryError::NonPositiveRadius(_))
        ));
        assert!(matches!(
            Cylinder::new(Vec3::ONE, Vec3::ONE, 1.0, MaterialId(0)),
            Err(GeometryError::DegenerateAxis)
        ));
    }
}
