//! Lumen geometry - ray intersection core
//!
//! Every scene primitive implements [`Hittable`]: leaf shapes, the linear
//! [`HittableList`], the SAH-built [`BvhTree`], boolean [`CsgPrimitive`]
//! nodes and transformed [`Instance`]s. Composites hold any mix of the
//! others, so a CSG side can be a whole BVH and a BVH leaf can be a CSG node.
//!
//! Shading is somebody else's job: hits carry an opaque [`MaterialId`] and
//! nothing more.

mod bvh;
mod config;
mod csg;
mod cylinder;
mod disk;
mod error;
mod hittable;
mod instance;
mod mesh;
mod quad;
mod sah;
mod sampling;
mod sphere;
mod triangle;

pub use bvh::{BvhNode, BvhTree};
pub use config::{BvhConfig, MAX_BUCKETS, MAX_DEPTH};
pub use csg::{csg_action, Classification, CsgAction, CsgOperation, CsgPrimitive, CSG_EPSILON};
pub use cylinder::Cylinder;
pub use disk::Disk;
pub use error::{GeometryError, GeometryResult};
pub use hittable::{HitRecord, Hittable, HittableList, MaterialId};
pub use instance::Instance;
pub use mesh::{Mesh, MeshTriangle};
pub use quad::Quad;
pub use sphere::Sphere;
pub use triangle::Triangle;

/// Re-export the math types every caller needs from lumen_math
pub use lumen_math::{Aabb, Interval, Mat4, Ray, Vec3};
