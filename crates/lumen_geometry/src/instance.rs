//! Placed copies of shared geometry.
//!
//! One prototype (a shape, a BVH, a CSG node) is stored once behind an `Arc`
//! and tested in its own space. Each [`Instance`] maps incoming rays into that
//! space and maps hits back out, so a hundred placements of a large mesh cost
//! a hundred matrices rather than a hundred copies of the mesh.

use crate::{
    hittable::{HitRecord, Hittable},
    GeometryError, GeometryResult, Ray,
};
use lumen_math::{Aabb, Interval, Mat4, Mat4Ext};
use std::sync::Arc;

/// A shared primitive placed in the world by an affine transform.
pub struct Instance {
    object: Arc<dyn Hittable>,
    /// Object-to-world
    transform: Mat4,
    /// World-to-object
    inv_transform: Mat4,
    /// World-space bounds of the placed object
    bbox: Aabb,
}

impl Instance {
    /// Place `object` with the object-to-world `transform`.
    pub fn new(object: Arc<dyn Hittable>, transform: Mat4) -> GeometryResult<Self> {
        let det = transform.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(GeometryError::SingularTransform);
        }

        let local_bbox = object.bounding_box();
        let bbox = local_bbox.transformed(&transform);

        log::info!(
            "Created Instance: local bbox {:?} -> world bbox {:?}",
            local_bbox,
            bbox
        );

        Ok(Self {
            object,
            transform,
            inv_transform: transform.inverse(),
            bbox,
        })
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn object(&self) -> &Arc<dyn Hittable> {
        &self.object
    }
}

impl Hittable for Instance {
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        if !self.bbox.hit(ray, ray_t) {
            return false;
        }

        // The direction is not renormalized, so t means the same in both spaces
        let local_ray = Ray::new(
            self.inv_transform.transform_point3(ray.origin()),
            self.inv_transform.transform_vector3(ray.direction()),
            ray.time(),
        );

        let mut local_rec = HitRecord::default();
        if !self.object.hit(&local_ray, ray_t, &mut local_rec) {
            return false;
        }

        rec.t = local_rec.t;
        rec.p = self.transform.transform_point3(local_rec.p);
        rec.normal = self.inv_transform.transform_normal3(local_rec.normal);
        rec.front_face = local_rec.front_face;
        rec.material = local_rec.material;
        rec.u = local_rec.u;
        rec.v = local_rec.v;

        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
