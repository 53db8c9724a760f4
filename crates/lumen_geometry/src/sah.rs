//! Binned surface area heuristic used by the BVH builder.
//!
//! Primitive centroids are dropped into a fixed number of buckets along each
//! axis; every boundary between two buckets is a candidate split, costed as
//! `(left_area / area) * left_count + (right_area / area) * right_count`.
//! Traversal and intersection unit costs are both 1 and left out.

use crate::config::MAX_BUCKETS;
use lumen_math::{Aabb, Vec3};

/// Per-bucket accumulator for one axis.
///
/// `left_*` cover buckets `0..=i`, `right_*` cover buckets `i + 1..`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SahBucket {
    pub bbox: Aabb,
    pub count: usize,
    pub left_area: f32,
    pub left_count: usize,
    pub right_area: f32,
    pub right_count: usize,
}

impl Default for SahBucket {
    fn default() -> Self {
        Self {
            bbox: Aabb::EMPTY,
            count: 0,
            left_area: 0.0,
            left_count: 0,
            right_area: 0.0,
            right_count: 0,
        }
    }
}

/// Cheapest split found: primitives in buckets `0..=bucket` along `axis` go left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SahSplit {
    pub axis: usize,
    pub bucket: usize,
    pub cost: f32,
}

/// Bucket a centroid falls in along `axis`.
#[inline]
pub(crate) fn bucket_index(centroid_bounds: &Aabb, centroid: Vec3, axis: usize, bucket_count: usize) -> usize {
    let offset = centroid_bounds.offset(centroid)[axis];
    ((offset * bucket_count as f32) as usize).min(bucket_count - 1)
}

/// Fill `buckets` for one axis and run both sweeps.
fn fill_buckets(
    boxes: &[Aabb],
    centroid_bounds: &Aabb,
    axis: usize,
    buckets: &mut [SahBucket],
) {
    let bucket_count = buckets.len();
    for bbox in boxes {
        let b = bucket_index(centroid_bounds, bbox.centroid(), axis, bucket_count);
        buckets[b].bbox = Aabb::surrounding(&buckets[b].bbox, bbox);
        buckets[b].count += 1;
    }

    let mut running = Aabb::EMPTY;
    let mut count = 0;
    for bucket in buckets.iter_mut() {
        running = Aabb::surrounding(&running, &bucket.bbox);
        count += bucket.count;
        bucket.left_area = running.surface_area();
        bucket.left_count = count;
    }

    running = Aabb::EMPTY;
    count = 0;
    for i in (0..bucket_count).rev() {
        buckets[i].right_area = running.surface_area();
        buckets[i].right_count = count;
        running = Aabb::surrounding(&running, &buckets[i].bbox);
        count += buckets[i].count;
    }
}

/// Evaluate every bucket boundary on all three axes.
///
/// Returns `None` when no boundary leaves primitives on both sides, which
/// happens when every centroid lands in one bucket.
pub(crate) fn find_best_split(
    boxes: &[Aabb],
    centroid_bounds: &Aabb,
    node_bounds: &Aabb,
    bucket_count: usize,
) -> Option<SahSplit> {
    let total_area = node_bounds.surface_area();
    if total_area <= 0.0 {
        return None;
    }

    let extent = centroid_bounds.extent();
    let mut best: Option<SahSplit> = None;

    for axis in 0..3 {
        if extent[axis] <= 0.0 {
            continue;
        }

        let mut storage = [SahBucket::default(); MAX_BUCKETS];
        let buckets = &mut storage[..bucket_count];
        fill_buckets(boxes, centroid_bounds, axis, buckets);

        // The last bucket has nothing to its right, so it is never a boundary.
        for (bucket, b) in buckets[..bucket_count - 1].iter().enumerate() {
            if b.left_count == 0 || b.right_count == 0 {
                continue;
            }
            let cost = (b.left_area / total_area) * b.left_count as f32
                + (b.right_area / total_area) * b.right_count as f32;
            if best.map_or(true, |s| cost < s.cost) {
                best = Some(SahSplit { axis, bucket, cost });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_at(x: f32) -> Aabb {
        Aabb::from_points(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 1.0, 1.0))
    }

    fn centroid_bounds(boxes: &[Aabb]) -> Aabb {
        boxes.iter().fold(Aabb::EMPTY, |mut acc, b| {
            acc.include_point(b.centroid());
            acc
        })
    }

    fn node_bounds(boxes: &[Aabb]) -> Aabb {
        boxes.iter().fold(Aabb::EMPTY, |acc, b| Aabb::surrounding(&acc, b))
    }

    #[test]
    fn test_bucket_index_spans_range() {
        let bounds = Aabb::from_points(Vec3::ZERO, Vec3::new(8.0, 1.0, 1.0));
        assert_eq!(bucket_index(&bounds, Vec3::new(0.0, 0.5, 0.5), 0, 8), 0);
        assert_eq!(bucket_index(&bounds, Vec3::new(3.5, 0.5, 0.5), 0, 8), 3);
        // The max edge folds into the last bucket
        assert_eq!(bucket_index(&bounds, Vec3::new(8.0, 0.5, 0.5), 0, 8), 7);
    }

    #[test]
    fn test_sweeps_accumulate_counts() {
        let boxes: Vec<Aabb> = (0..4).map(|i| unit_box_at(i as f32 * 3.0)).collect();
        let cb = centroid_bounds(&boxes);
        let mut buckets = [SahBucket::default(); 4];
        fill_buckets(&boxes, &cb, 0, &mut buckets);

        let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 1, 1]);
        assert_eq!(buckets[1].left_count, 2);
        assert_eq!(buckets[1].right_count, 2);
        assert_eq!(buckets[3].right_count, 0);
        assert_eq!(buckets[3].right_area, 0.0);
        // Left half spans x in [0, 4]: 2 * (4 + 1 + 4)
        assert!((buckets[1].left_area - 18.0).abs() < 1e-4);
    }

    #[test]
    fn test_split_separates_two_clusters() {
        let mut boxes: Vec<Aabb> = (0..4).map(|i| unit_box_at(i as f32 * 0.1)).collect();
        boxes.extend((0..4).map(|i| unit_box_at(100.0 + i as f32 * 0.1)));
        let split = find_best_split(&boxes, &centroid_bounds(&boxes), &node_bounds(&boxes), 16).unwrap();

        assert_eq!(split.axis, 0);
        assert!(split.cost < boxes.len() as f32);

        let left = boxes
            .iter()
            .filter(|b| bucket_index(&centroid_bounds(&boxes), b.centroid(), 0, 16) <= split.bucket)
            .count();
        assert_eq!(left, 4);
    }

    #[test]
    fn test_no_split_when_colocated() {
        let boxes = vec![unit_box_at(0.0); 5];
        assert_eq!(
            find_best_split(&boxes, &centroid_bounds(&boxes), &node_bounds(&boxes), 16),
            None
        );
    }
}
