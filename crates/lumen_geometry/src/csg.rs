//! Constructive solid geometry with Kensler's single-hit algorithm.
//!
//! Each side is queried for its nearest hit and classified as entering,
//! exiting or missing. [`csg_action`] maps the two classifications to an
//! action; the loop in [`CsgPrimitive::hit`] either returns one side's hit or
//! advances a side past its current hit and classifies again.
//!
//! Sides must be closed solids and must leave their normals outward (the
//! [`Hittable::hit`] contract), since classification reads `front_face`.

use crate::{
    hittable::{HitRecord, Hittable},
    Ray,
};
use lumen_math::{Aabb, Interval};
use serde::{Deserialize, Serialize};

/// How far past a hit an advanced side resumes searching.
pub const CSG_EPSILON: f32 = 1e-4;

/// Boolean operator combining the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsgOperation {
    Union,
    Intersection,
    /// Left minus right.
    Difference,
}

/// Outcome of one side's nearest-hit query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Enter,
    Exit,
    Miss,
}

impl Classification {
    fn of(hit: bool, rec: &HitRecord) -> Self {
        match (hit, rec.front_face) {
            (false, _) => Self::Miss,
            (true, true) => Self::Enter,
            (true, false) => Self::Exit,
        }
    }
}

/// What to do for a pair of classifications.
///
/// "Closer" compares the two current hit parameters. In the
/// return-or-advance actions a tie advances, so coincident surfaces never
/// produce a zero-thickness sliver. In [`CsgAction::ReturnCloser`] and
/// [`CsgAction::ReturnFarther`] a tie returns the left hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CsgAction {
    ReturnMiss,
    ReturnLeft,
    ReturnRight,
    ReturnCloser,
    ReturnFarther,
    ReturnLeftIfCloserElseAdvanceRight,
    ReturnRightIfCloserElseAdvanceLeft,
    ReturnLeftIfCloserElseReturnFlippedRight,
    ReturnFlippedRightIfCloserElseAdvanceLeft,
    AdvanceCloser,
}

/// The action table.
pub fn csg_action(op: CsgOperation, left: Classification, right: Classification) -> CsgAction {
    use Classification::{Enter, Exit, Miss};
    use CsgAction::*;

    match op {
        CsgOperation::Union => match (left, right) {
            (Enter, Enter) => ReturnCloser,
            (Enter, Exit) => ReturnRightIfCloserElseAdvanceLeft,
            (Exit, Enter) => ReturnLeftIfCloserElseAdvanceRight,
            (Exit, Exit) => ReturnFarther,
            (Enter | Exit, Miss) => ReturnLeft,
            (Miss, Enter | Exit) => ReturnRight,
            (Miss, Miss) => ReturnMiss,
        },
        CsgOperation::Intersection => match (left, right) {
            (Enter, Enter) => AdvanceCloser,
            (Enter, Exit) => ReturnLeftIfCloserElseAdvanceRight,
            (Exit, Enter) => ReturnRightIfCloserElseAdvanceLeft,
            (Exit, Exit) => ReturnCloser,
            (_, Miss) | (Miss, _) => ReturnMiss,
        },
        CsgOperation::Difference => match (left, right) {
            (Enter, Enter) => ReturnLeftIfCloserElseAdvanceRight,
            (Enter, Exit) => AdvanceCloser,
            (Exit, Enter) => ReturnLeftIfCloserElseReturnFlippedRight,
            (Exit, Exit) => ReturnFlippedRightIfCloserElseAdvanceLeft,
            (Enter | Exit, Miss) => ReturnLeft,
            (Miss, _) => ReturnMiss,
        },
    }
}

/// An action resolved against the two hit parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CsgStep {
    Miss,
    Left { flip: bool },
    Right { flip: bool },
    AdvanceLeft,
    AdvanceRight,
}

impl CsgAction {
    fn resolve(self, t_left: f32, t_right: f32) -> CsgStep {
        use CsgAction::*;
        use CsgStep::*;

        let left = Left { flip: false };
        let right = Right { flip: false };
        match self {
            ReturnMiss => Miss,
            ReturnLeft => left,
            ReturnRight => right,
            ReturnCloser => {
                if t_left <= t_right {
                    left
                } else {
                    right
                }
            }
            ReturnFarther => {
                if t_left >= t_right {
                    left
                } else {
                    right
                }
            }
            ReturnLeftIfCloserElseAdvanceRight => {
                if t_left < t_right {
                    left
                } else {
                    AdvanceRight
                }
            }
            ReturnRightIfCloserElseAdvanceLeft => {
                if t_right < t_left {
                    right
                } else {
                    AdvanceLeft
                }
            }
            ReturnLeftIfCloserElseReturnFlippedRight => {
                if t_left <= t_right {
                    left
                } else {
                    Right { flip: true }
                }
            }
            ReturnFlippedRightIfCloserElseAdvanceLeft => {
                if t_right < t_left {
                    Right { flip: true }
                } else {
                    AdvanceLeft
                }
            }
            AdvanceCloser => {
                if t_left <= t_right {
                    AdvanceLeft
                } else {
                    AdvanceRight
                }
            }
        }
    }
}

/// One side of the combination plus its current query state.
struct Side<'a> {
    object: &'a dyn Hittable,
    t_min: f32,
    rec: HitRecord,
    class: Classification,
}

impl<'a> Side<'a> {
    fn start(object: &'a dyn Hittable, ray: &Ray, t_min: f32) -> Self {
        let mut side = Self {
            object,
            t_min,
            rec: HitRecord::default(),
            class: Classification::Miss,
        };
        side.query(ray);
        side
    }

    /// Nearest hit beyond `t_min`. The caller's upper bound is ignored so the
    /// classification reflects the whole ray.
    fn query(&mut self, ray: &Ray) {
        self.rec = HitRecord::default();
        let hit = self
            .object
            .hit(ray, Interval::new(self.t_min, f32::INFINITY), &mut self.rec);
        self.class = Classification::of(hit, &self.rec);
    }

    fn advance(&mut self, ray: &Ray) {
        self.t_min = self.rec.t + CSG_EPSILON;
        self.query(ray);
    }

    /// Hit parameter, infinite on a miss.
    fn t(&self) -> f32 {
        match self.class {
            Classification::Miss => f32::INFINITY,
            _ => self.rec.t,
        }
    }
}

/// Two primitives combined by a boolean operator.
///
/// Either side may itself be a composite (a BVH, a list, another CSG node).
pub struct CsgPrimitive {
    left: Box<dyn Hittable>,
    right: Box<dyn Hittable>,
    op: CsgOperation,
    bbox: Aabb,
}

impl CsgPrimitive {
    pub fn new(left: Box<dyn Hittable>, right: Box<dyn Hittable>, op: CsgOperation) -> Self {
        let (l, r) = (left.bounding_box(), right.bounding_box());
        let bbox = match op {
            CsgOperation::Union => Aabb::surrounding(&l, &r),
            CsgOperation::Intersection => Aabb::intersection(&l, &r),
            // Carving can only remove surface, so the left box still bounds it
            CsgOperation::Difference => l,
        };
        Self { left, right, op, bbox }
    }

    pub fn union(left: Box<dyn Hittable>, right: Box<dyn Hittable>) -> Self {
        Self::new(left, right, CsgOperation::Union)
    }

    pub fn intersection(left: Box<dyn Hittable>, right: Box<dyn Hittable>) -> Self {
        Self::new(left, right, CsgOperation::Intersection)
    }

    pub fn difference(left: Box<dyn Hittable>, right: Box<dyn Hittable>) -> Self {
        Self::new(left, right, CsgOperation::Difference)
    }

    pub fn operation(&self) -> CsgOperation {
        self.op
    }
}

impl Hittable for CsgPrimitive {
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        if !self.bbox.hit(ray, ray_t) {
            return false;
        }

        let mut left = Side::start(self.left.as_ref(), ray, ray_t.min);
        let mut right = Side::start(self.right.as_ref(), ray, ray_t.min);

        loop {
            let action = csg_action(self.op, left.class, right.class);
            let (mut found, flip) = match action.resolve(left.t(), right.t()) {
                CsgStep::Miss => return false,
                CsgStep::Left { flip } => (left.rec, flip),
                CsgStep::Right { flip } => (right.rec, flip),
                CsgStep::AdvanceLeft => {
                    left.advance(ray);
                    continue;
                }
                CsgStep::AdvanceRight => {
                    right.advance(ray);
                    continue;
                }
            };

            if !ray_t.surrounds(found.t) {
                return false;
            }
            if flip {
                found.flip();
            }
            *rec = found;
            return true;
        }
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
