// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Query primitives for spatial searches.
//!
//! These shapes parameterize the [`AabbTree`](crate::AabbTree) traversals.
//! The box-overlap tests here are candidate filters: a `true` answer means
//! the box may be hit and the caller's predicate should run the exact test.
//! Linear primitives use the slab method and are exact up to floating-point
//! rounding; triangles are filtered through their own bounding box.

use crate::{BoundingBox, Point, Vector};

const SLAB_EPSILON: f64 = 1e-30;

/// A segment between two points.
#[derive(Debug, Clone)]
pub struct Segment<const D: usize> {
    pub p0: Point<D>,
    pub p1: Point<D>,
}

impl<const D: usize> Segment<D> {
    pub fn new(p0: Point<D>, p1: Point<D>) -> Self {
        Self { p0, p1 }
    }

    pub fn direction(&self) -> Vector<D> {
        self.p1 - self.p0
    }
}

/// A half-line starting at `origin`.
#[derive(Debug, Clone)]
pub struct Ray<const D: usize> {
    pub origin: Point<D>,
    pub direction: Vector<D>,
}

impl<const D: usize> Ray<D> {
    pub fn new(origin: Point<D>, direction: Vector<D>) -> Self {
        Self { origin, direction }
    }
}

/// An infinite line through `origin`.
#[derive(Debug, Clone)]
pub struct InfiniteLine<const D: usize> {
    pub origin: Point<D>,
    pub direction: Vector<D>,
}

impl<const D: usize> InfiniteLine<D> {
    pub fn new(origin: Point<D>, direction: Vector<D>) -> Self {
        Self { origin, direction }
    }
}

/// A triangle given by its three vertices.
#[derive(Debug, Clone)]
pub struct Triangle<const D: usize> {
    pub vertices: [Point<D>; 3],
}

impl<const D: usize> Triangle<D> {
    pub fn new(v0: Point<D>, v1: Point<D>, v2: Point<D>) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Returns the tightest box enclosing the triangle.
    pub fn bounding_box(&self) -> BoundingBox<D> {
        BoundingBox::from_points(self.vertices.iter())
    }
}

/// Slab test: clips the parameter interval `[t_min, t_max]` of
/// `origin + t * direction` against every axis slab of `bbox`.
fn slab_overlap<const D: usize>(
    bbox: &BoundingBox<D>,
    origin: &Point<D>,
    direction: &Vector<D>,
    mut t_min: f64,
    mut t_max: f64,
) -> bool {
    for i in 0..D {
        let d = direction[i];
        if d.abs() < SLAB_EPSILON {
            if origin[i] < bbox.min()[i] || origin[i] > bbox.max()[i] {
                return false;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (bbox.min()[i] - origin[i]) * inv;
        let mut t1 = (bbox.max()[i] - origin[i]) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return false;
        }
    }
    true
}

impl<const D: usize> BoundingBox<D> {
    /// Returns `true` if the ray hits the box.
    pub fn intersects_ray(&self, ray: &Ray<D>) -> bool {
        slab_overlap(self, &ray.origin, &ray.direction, 0.0, f64::INFINITY)
    }

    /// Returns `true` if the infinite line crosses the box.
    pub fn intersects_line(&self, line: &InfiniteLine<D>) -> bool {
        slab_overlap(
            self,
            &line.origin,
            &line.direction,
            f64::NEG_INFINITY,
            f64::INFINITY,
        )
    }

    /// Returns `true` if the segment crosses the box.
    pub fn intersects_segment(&self, segment: &Segment<D>) -> bool {
        slab_overlap(self, &segment.p0, &segment.direction(), 0.0, 1.0)
    }

    /// Returns `true` if the triangle's bounding box overlaps this box.
    pub fn intersects_triangle(&self, triangle: &Triangle<D>) -> bool {
        self.intersects(&triangle.bounding_box())
    }
}
