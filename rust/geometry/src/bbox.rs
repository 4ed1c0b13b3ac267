// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned bounding boxes.

use crate::Point;

/// An axis-aligned bounding box in `D` dimensions.
///
/// A freshly created box is empty (inverted): `min > max` on every axis.
/// Adding points or boxes grows it. Containment and intersection tests on an
/// empty box are always `false`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox<const D: usize> {
    min: Point<D>,
    max: Point<D>,
}

impl<const D: usize> Default for BoundingBox<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize> BoundingBox<D> {
    /// Creates an empty (inverted) bounding box.
    pub fn new() -> Self {
        Self {
            min: Point::from([f64::INFINITY; D]),
            max: Point::from([f64::NEG_INFINITY; D]),
        }
    }

    /// Creates a bounding box from explicit corners.
    pub fn from_min_max(min: Point<D>, max: Point<D>) -> Self {
        Self { min, max }
    }

    /// Creates the tightest box enclosing all given points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point<D>>) -> Self {
        let mut bbox = Self::new();
        for point in points {
            bbox.add_point(point);
        }
        bbox
    }

    pub fn min(&self) -> &Point<D> {
        &self.min
    }

    pub fn max(&self) -> &Point<D> {
        &self.max
    }

    /// Returns `true` if the box encloses at least one point.
    pub fn is_valid(&self) -> bool {
        (0..D).all(|i| self.min[i] <= self.max[i])
    }

    /// Expands the box to include `point`.
    pub fn add_point(&mut self, point: &Point<D>) {
        for i in 0..D {
            self.min[i] = self.min[i].min(point[i]);
            self.max[i] = self.max[i].max(point[i]);
        }
    }

    /// Expands the box to include `other`.
    pub fn add_box(&mut self, other: &Self) {
        for i in 0..D {
            self.min[i] = self.min[i].min(other.min[i]);
            self.max[i] = self.max[i].max(other.max[i]);
        }
    }

    /// Returns `true` if `point` lies inside or on the boundary of the box.
    pub fn contains(&self, point: &Point<D>) -> bool {
        (0..D).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }

    /// Returns `true` if the two boxes overlap (boundary contact included).
    pub fn intersects(&self, other: &Self) -> bool {
        (0..D).all(|i| self.max[i] >= other.min[i] && other.max[i] >= self.min[i])
    }

    /// Returns the center of the box.
    pub fn center(&self) -> Point<D> {
        let mut center = Point::from([0.0; D]);
        for i in 0..D {
            center[i] = (self.min[i] + self.max[i]) * 0.5;
        }
        center
    }

    /// Returns the extent along each axis.
    pub fn extent(&self) -> [f64; D] {
        let mut extent = [0.0; D];
        for i in 0..D {
            extent[i] = self.max[i] - self.min[i];
        }
        extent
    }

    /// Returns the index of the longest axis.
    pub fn longest_axis(&self) -> usize {
        let extent = self.extent();
        let mut axis = 0;
        for i in 1..D {
            if extent[i] > extent[axis] {
                axis = i;
            }
        }
        axis
    }

    /// Returns the distance from `point` to the box, `0` if inside.
    pub fn distance_to(&self, point: &Point<D>) -> f64 {
        let mut dist2 = 0.0;
        for i in 0..D {
            let d = (self.min[i] - point[i]).max(0.0).max(point[i] - self.max[i]);
            dist2 += d * d;
        }
        dist2.sqrt()
    }

    /// Returns a copy grown by `padding` in every direction.
    pub fn padded(&self, padding: f64) -> Self {
        let mut min = self.min;
        let mut max = self.max;
        for i in 0..D {
            min[i] -= padding;
            max[i] += padding;
        }
        Self { min, max }
    }
}
