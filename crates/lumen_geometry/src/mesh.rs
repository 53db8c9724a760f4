//! Indexed triangle meshes.
//!
//! A [`Mesh`] owns the vertex data once; each [`MeshTriangle`] is a cheap
//! handle (shared mesh + face index) so a loader can hand thousands of faces
//! to a [`crate::BvhTree`] without copying vertices.

use crate::{
    hittable::{HitRecord, Hittable, MaterialId},
    triangle::{intersect_triangle, triangle_bounds},
    GeometryError, GeometryResult, Ray,
};
use lumen_math::{Aabb, Interval, Vec3};
use std::sync::Arc;

/// Vertex positions, optional per-vertex UVs, and triangle index triples.
#[derive(Clone, Debug)]
pub struct Mesh {
    positions: Vec<Vec3>,
    uvs: Option<Vec<[f32; 2]>>,
    faces: Vec<[u32; 3]>,
    bounds: Aabb,
}

impl Mesh {
    /// Create a mesh, checking that every face index names a vertex.
    pub fn new(positions: Vec<Vec3>, faces: Vec<[u32; 3]>) -> GeometryResult<Self> {
        Self::new_with_uvs(positions, faces, None)
    }

    /// Create a mesh with one UV per vertex.
    pub fn new_with_uvs(
        positions: Vec<Vec3>,
        faces: Vec<[u32; 3]>,
        uvs: Option<Vec<[f32; 2]>>,
    ) -> GeometryResult<Self> {
        if let Some(uvs) = &uvs {
            if uvs.len() != positions.len() {
                return Err(GeometryError::MismatchedUvs {
                    uvs: uvs.len(),
                    vertices: positions.len(),
                });
            }
        }

        for (face, indices) in faces.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
                return Err(GeometryError::IndexOutOfRange {
                    face,
                    index,
                    vertex_count: positions.len(),
                });
            }
        }

        let bounds = Self::compute_bounds(&positions);
        Ok(Self {
            positions,
            uvs,
            faces,
            bounds,
        })
    }

    fn compute_bounds(positions: &[Vec3]) -> Aabb {
        if positions.is_empty() {
            return Aabb::EMPTY;
        }

        let (min, max) = positions.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), p| (min.min(*p), max.max(*p)),
        );
        Aabb::from_points(min, max)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    fn vertices(&self, face: usize) -> [Vec3; 3] {
        let [a, b, c] = self.faces[face];
        [
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        ]
    }

    /// Texture coordinates at barycentric `(u, v)` on `face`.
    fn uv_at(&self, face: usize, u: f32, v: f32) -> (f32, f32) {
        match &self.uvs {
            Some(uvs) => {
                let [a, b, c] = self.faces[face];
                let (ta, tb, tc) = (uvs[a as usize], uvs[b as usize], uvs[c as usize]);
                let w = 1.0 - u - v;
                (
                    w * ta[0] + u * tb[0] + v * tc[0],
                    w * ta[1] + u * tb[1] + v * tc[1],
                )
            }
            None => (u, v),
        }
    }

    /// One primitive per face, all sharing this mesh.
    pub fn triangles(self: &Arc<Self>, material: MaterialId) -> Vec<Box<dyn Hittable>> {
        (0..self.faces.len())
            .map(|face| Box::new(MeshTriangle::new(Arc::clone(self), face, material)) as Box<dyn Hittable>)
            .collect()
    }
}

/// One face of a shared [`Mesh`].
#[derive(Debug, Clone)]
pub struct MeshTriangle {
    mesh: Arc<Mesh>,
    face: usize,
    material: MaterialId,
    bbox: Aabb,
}

impl MeshTriangle {
    /// `face` must be below `mesh.face_count()`.
    pub fn new(mesh: Arc<Mesh>, face: usize, material: MaterialId) -> Self {
        let [v0, v1, v2] = mesh.vertices(face);
        Self {
            mesh,
            face,
            material,
            bbox: triangle_bounds(v0, v1, v2),
        }
    }
}

impl Hittable for MeshTriangle {
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        let [v0, v1, v2] = self.mesh.vertices(self.face);
        let Some((t, u, v)) = intersect_triangle(v0, v1, v2, ray, ray_t) else {
            return false;
        };

        rec.t = t;
        rec.p = ray.at(t);
        rec.set_face_normal(ray, (v1 - v0).cross(v2 - v0).normalize());
        (rec.u, rec.v) = self.mesh.uv_at(self.face, u, v);
        rec.material = Some(self.material);

        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit square in the XY plane at z=0 facing +z, split into two faces.
    fn square(uvs: bool) -> Arc<Mesh> {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 2, 3]];
        let uvs = uvs.then(|| vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        Arc::new(Mesh::new_with_uvs(positions, faces, uvs).unwrap())
    }

    #[test]
    fn test_mesh_triangles_cover_faces() {
        let mesh = square(false);
        let triangles = mesh.triangles(MaterialId(5));
        assert_eq!(triangles.len(), 2);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.bounds().x.max, 1.0);
        // Shared, not copied
        assert_eq!(Arc::strong_count(&mesh), 3);
    }

    #[test]
    fn test_mesh_triangle_hit_interpolates_uv() {
        let mesh = square(true);
        let tri = MeshTriangle::new(Arc::clone(&mesh), 0, MaterialId(5));
        let ray = Ray::new_simple(Vec3::new(0.75, 0.25, 1.0), -Vec3::Z);
        let mut rec = HitRecord::default();

        assert!(tri.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert!((rec.t - 1.0).abs() < 1e-5);
        assert!(rec.front_face);
        assert!((rec.u - 0.75).abs() < 1e-5);
        assert!((rec.v - 0.25).abs() < 1e-5);
        assert_eq!(rec.material, Some(MaterialId(5)));
    }

    #[test]
    fn test_mesh_triangle_miss_other_half() {
        let tri = MeshTriangle::new(square(false), 0, MaterialId(0));
        let ray = Ray::new_simple(Vec3::new(0.25, 0.75, 1.0), -Vec3::Z);
        let mut rec = HitRecord::default();
        assert!(!tri.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
    }

    #[test]
    fn test_mesh_rejects_bad_indices() {
        let err = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2], [0, 1, 7]]).unwrap_err();
        assert_eq!(
            err,
            GeometryError::IndexOutOfRange {
                face: 1,
                index: 7,
                vertex_count: 3
            }
        );
    }

    #[test]
    fn test_mesh_rejects_mismatched_uvs() {
        let err = Mesh::new_with_uvs(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2]], Some(vec![[0.0, 0.0]]))
            .unwrap_err();
        assert_eq!(err, GeometryError::MismatchedUvs { uvs: 1, vertices: 3 });
    }
}
