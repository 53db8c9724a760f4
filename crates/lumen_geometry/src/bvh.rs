//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Nodes live in one flat array. An inner node's left child is always the
//! next slot; its right child index is stored explicitly. Construction uses
//! binned SAH (see [`crate::sah`]) and reorders the primitives in place so
//! every leaf references a contiguous range. Traversal is iterative with a
//! fixed-size stack.

use crate::{
    config::{BvhConfig, MAX_DEPTH},
    hittable::{HitRecord, Hittable},
    sah::{bucket_index, find_best_split, SahSplit},
    GeometryError, GeometryResult, Ray,
};
use lumen_math::{Aabb, Interval};
use std::ops::Range;

/// Centroid bounds smaller than this on every axis count as co-located.
const COLOCATED_EPSILON: f32 = 1e-6;

/// One entry of the flat node array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhNode {
    bbox: Aabb,
    /// Leaf: first primitive. Inner: index of the right child.
    offset: usize,
    /// Leaf: number of primitives (always > 0). Inner: 0.
    count: usize,
    /// Inner: axis the children were split on.
    axis: u8,
}

impl BvhNode {
    fn leaf(bbox: Aabb, start: usize, count: usize) -> Self {
        Self {
            bbox,
            offset: start,
            count,
            axis: 0,
        }
    }

    fn inner(bbox: Aabb, axis: usize) -> Self {
        Self {
            bbox,
            offset: 0,
            count: 0,
            axis: axis as u8,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.count > 0
    }

    #[inline]
    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    /// Primitive indices covered by a leaf. Empty for inner nodes.
    #[inline]
    pub fn primitive_range(&self) -> Range<usize> {
        self.offset..self.offset + self.count
    }

    /// Right child of an inner node. The left child is `own index + 1`.
    #[inline]
    pub fn right_child(&self) -> Option<usize> {
        (!self.is_leaf()).then_some(self.offset)
    }
}

/// A BVH over owned primitives, itself a [`Hittable`].
///
/// Immutable once built, so one tree can serve concurrent queries as long as
/// each query brings its own [`HitRecord`].
pub struct BvhTree {
    nodes: Vec<BvhNode>,
    primitives: Vec<Box<dyn Hittable>>,
    depth: usize,
}

impl BvhTree {
    /// Build with [`BvhConfig::default`].
    pub fn new(primitives: Vec<Box<dyn Hittable>>) -> GeometryResult<Self> {
        Self::with_config(primitives, BvhConfig::default())
    }

    /// Build a tree over `primitives`, taking ownership and reordering them.
    pub fn with_config(mut primitives: Vec<Box<dyn Hittable>>, config: BvhConfig) -> GeometryResult<Self> {
        config.validate()?;
        if primitives.is_empty() {
            return Err(GeometryError::EmptyPrimitiveSet);
        }

        let n = primitives.len();
        let mut boxes: Vec<Aabb> = primitives.iter().map(|p| p.bounding_box()).collect();

        let mut builder = BvhBuilder {
            primitives: &mut primitives,
            boxes: &mut boxes,
            nodes: Vec::with_capacity(2 * n - 1),
            config,
            depth: 0,
            capped_leaves: 0,
        };
        builder.build(0, n, 0);

        let BvhBuilder {
            nodes,
            depth,
            capped_leaves,
            ..
        } = builder;

        if capped_leaves > 0 {
            log::warn!(
                "BVH hit max depth {} on {} leaves; traversal may slow down",
                config.max_depth,
                capped_leaves
            );
        }
        log::debug!(
            "BVH built: {} primitives, {} nodes, {} leaves, depth {}",
            n,
            nodes.len(),
            nodes.iter().filter(|node| node.is_leaf()).count(),
            depth
        );

        Ok(Self {
            nodes,
            primitives,
            depth,
        })
    }

    /// The flat node array; index 0 is the root.
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Primitives in tree order.
    pub fn primitives(&self) -> &[Box<dyn Hittable>] {
        &self.primitives
    }

    /// Number of primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Always false: empty trees cannot be built.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Depth of the deepest node (the root is depth 0).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Sum of primitive counts over all leaves.
    pub fn leaf_primitive_total(&self) -> usize {
        self.nodes.iter().map(|node| node.count).sum()
    }
}

/// Recursive range builder. Lives only for the duration of one build.
struct BvhBuilder<'a> {
    primitives: &'a mut Vec<Box<dyn Hittable>>,
    /// Parallel to `primitives`; swapped in lockstep.
    boxes: &'a mut Vec<Aabb>,
    nodes: Vec<BvhNode>,
    config: BvhConfig,
    depth: usize,
    capped_leaves: usize,
}

impl BvhBuilder<'_> {
    /// Build the subtree for `[left, right)` and return its node index.
    fn build(&mut self, left: usize, right: usize, depth: usize) -> usize {
        let node_index = self.nodes.len();
        self.depth = self.depth.max(depth);
        let count = right - left;

        let (bbox, centroid_bounds) = self.boxes[left..right].iter().fold(
            (Aabb::EMPTY, Aabb::EMPTY),
            |(bbox, mut centroids), b| {
                centroids.include_point(b.centroid());
                (Aabb::surrounding(&bbox, b), centroids)
            },
        );

        if count <= self.config.max_leaf_size
            || centroid_bounds.extent().max_element() < COLOCATED_EPSILON
        {
            return self.emit_leaf(bbox, left, count);
        }
        if depth >= self.config.max_depth {
            self.capped_leaves += 1;
            return self.emit_leaf(bbox, left, count);
        }

        let split = match find_best_split(
            &self.boxes[left..right],
            &centroid_bounds,
            &bbox,
            self.config.bucket_count,
        ) {
            Some(split) if split.cost < count as f32 => split,
            // Splitting would cost more than testing everything here
            _ => return self.emit_leaf(bbox, left, count),
        };

        let mid = self.partition(left, right, &centroid_bounds, split);
        if mid == left || mid == right {
            return self.emit_leaf(bbox, left, count);
        }

        self.nodes.push(BvhNode::inner(bbox, split.axis));
        self.build(left, mid, depth + 1);
        let right_child = self.nodes.len();
        self.nodes[node_index].offset = right_child;
        self.build(mid, right, depth + 1);

        node_index
    }

    fn emit_leaf(&mut self, bbox: Aabb, start: usize, count: usize) -> usize {
        self.nodes.push(BvhNode::leaf(bbox, start, count));
        self.nodes.len() - 1
    }

    /// Single forward pass: primitives whose bucket is at or below the split
    /// bucket are swapped into the next left slot. Returns the first index of
    /// the right part.
    fn partition(&mut self, left: usize, right: usize, centroid_bounds: &Aabb, split: SahSplit) -> usize {
        let bucket_count = self.config.bucket_count;
        // The last bucket would leave the right side empty
        let split_bucket = split.bucket.min(bucket_count - 2);

        let mut next = left;
        for i in left..right {
            let bucket = bucket_index(centroid_bounds, self.boxes[i].centroid(), split.axis, bucket_count);
            if bucket <= split_bucket {
                self.primitives.swap(i, next);
                self.boxes.swap(i, next);
                next += 1;
            }
        }
        next
    }
}

impl Hittable for BvhTree {
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        // Each pop pushes at most two, and the tree is at most MAX_DEPTH deep
        let mut stack = [0usize; 2 * MAX_DEPTH];
        let mut stack_len = 1;

        let mut hit_anything = false;
        let mut closest = ray_t.max;

        while stack_len > 0 {
            stack_len -= 1;
            let index = stack[stack_len];
            let node = &self.nodes[index];

            if !node.bbox.hit(ray, ray_t.with_max(closest)) {
                continue;
            }

            if node.is_leaf() {
                for primitive in &self.primitives[node.primitive_range()] {
                    if primitive.hit(ray, ray_t.with_max(closest), rec) {
                        hit_anything = true;
                        closest = rec.t;
                    }
                }
            } else {
                let left = index + 1;
                let right = node.offset;
                // Push the far child first so the near one is popped next
                let (near, far) = if ray.direction()[node.axis as usize] < 0.0 {
                    (right, left)
                } else {
                    (left, right)
                };
                stack[stack_len] = far;
                stack[stack_len + 1] = near;
                stack_len += 2;
            }
        }

        hit_anything
    }

    fn bounding_box(&self) -> Aabb {
        self.nodes[0].bbox
    }
}
