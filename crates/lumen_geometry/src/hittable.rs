//! Hittable trait and HitRecord for ray-object intersection.

use crate::Ray;
use lumen_math::{Aabb, Interval, Vec3};
use rand::{Rng, RngCore};
use std::sync::Arc;

/// Opaque handle to a material owned by the shading layer.
///
/// Shapes carry one and hits report it unchanged; nothing in this crate
/// looks inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

/// Record of a ray-object intersection.
///
/// While a query is in flight `normal` is the outward geometric normal and
/// `front_face` says which side the ray came from; composites (CSG in
/// particular) rely on that. [`HitRecord::finalize`] turns the normal to face
/// the ray once the outermost query is done.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at intersection
    pub normal: Vec3,
    /// Material of the surface that was hit
    pub material: Option<MaterialId>,
    /// UV texture coordinates
    pub u: f32,
    pub v: f32,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl Default for HitRecord {
    fn default() -> Self {
        Self {
            p: Vec3::ZERO,
            normal: Vec3::ZERO,
            material: None,
            u: 0.0,
            v: 0.0,
            t: f32::INFINITY,
            front_face: false,
        }
    }
}

impl HitRecord {
    /// Store the outward normal and note which side the ray arrived from.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction().dot(outward_normal) < 0.0;
        self.normal = outward_normal;
    }

    /// Swap inside and outside: negate the normal and the front-face flag.
    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.front_face = !self.front_face;
    }

    /// Orient the normal against the ray. Call once, after the outermost query.
    pub fn finalize(&mut self) {
        if !self.front_face {
            self.normal = -self.normal;
        }
    }
}

/// Trait for objects that can be hit by rays.
///
/// Leaves and composites (lists, BVHs, CSG nodes) all implement it, so a
/// composite can hold any mix of the others.
pub trait Hittable: Send + Sync {
    /// Test if a ray hits this object strictly inside `ray_t`.
    ///
    /// `ray_t.max` is the closest hit found so far. Implementations write into
    /// `rec` only when they find something closer and never search beyond
    /// `ray_t.max`. The normal is left outward; see [`HitRecord::finalize`].
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool;

    /// Get the axis-aligned bounding box of this object.
    fn bounding_box(&self) -> Aabb;

    /// Solid-angle density of sampling `direction` from `origin` toward this
    /// object. Objects that cannot be sampled report zero.
    fn pdf_value(&self, _origin: Vec3, _direction: Vec3) -> f32 {
        0.0
    }

    /// Sample a direction from `origin` toward this object.
    fn random_direction(&self, _origin: Vec3, _rng: &mut dyn RngCore) -> Vec3 {
        Vec3::X
    }

    /// Top-level query: nearest hit in `ray_t` with the normal facing the ray.
    fn closest_hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let mut rec = HitRecord::default();
        if self.hit(ray, ray_t, &mut rec) {
            rec.finalize();
            Some(rec)
        } else {
            None
        }
    }
}

impl<T: Hittable + ?Sized> Hittable for Arc<T> {
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        (**self).hit(ray, ray_t, rec)
    }

    fn bounding_box(&self) -> Aabb {
        (**self).bounding_box()
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        (**self).pdf_value(origin, direction)
    }

    fn random_direction(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        (**self).random_direction(origin, rng)
    }
}

/// A list of hittable objects, tested one after another.
///
/// Fine for a handful of objects (or a set of lights to sample); use
/// [`crate::BvhTree`] for anything larger.
pub struct HittableList {
    objects: Vec<Box<dyn Hittable>>,
    bbox: Aabb,
}

impl HittableList {
    /// Create a new empty hittable list.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            bbox: Aabb::EMPTY,
        }
    }

    /// Add an object to the list.
    pub fn add(&mut self, object: Box<dyn Hittable>) {
        self.bbox = Aabb::surrounding(&self.bbox, &object.bounding_box());
        self.objects.push(object);
    }

    /// Clear all objects from the list.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.bbox = Aabb::EMPTY;
    }

    /// Get the number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for HittableList {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<Box<dyn Hittable>>> for HittableList {
    fn from(objects: Vec<Box<dyn Hittable>>) -> Self {
        let bbox = objects
            .iter()
            .fold(Aabb::EMPTY, |acc, o| Aabb::surrounding(&acc, &o.bounding_box()));
        Self { objects, bbox }
    }
}

impl Hittable for HittableList {
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        let mut hit_anything = false;
        let mut closest_so_far = ray_t.max;

        for object in &self.objects {
            if object.hit(ray, ray_t.with_max(closest_so_far), rec) {
                hit_anything = true;
                closest_so_far = rec.t;
            }
        }

        hit_anything
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        if self.objects.is_empty() {
            return 0.0;
        }
        let weight = 1.0 / self.objects.len() as f32;
        self.objects
            .iter()
            .map(|o| weight * o.pdf_value(origin, direction))
            .sum()
    }

    fn random_direction(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        if self.objects.is_empty() {
            return Vec3::X;
        }
        let index = rng.gen_range(0..self.objects.len());
        self.objects[index].random_direction(origin, rng)
    }
}
