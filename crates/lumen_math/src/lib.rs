//! Lumen math - vectors, intervals, rays and bounding boxes.
//!
//! Re-exports glam so downstream crates share one vector type.

pub use glam::*;

mod aabb;
mod interval;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::Mat4Ext;
