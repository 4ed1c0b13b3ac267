// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BRep-Lite Geometry
//!
//! Bounding boxes, query primitives and axis-aligned bounding-box trees.
//!
//! The dimension is a const generic (`const D: usize`); `2` and `3` are the
//! supported values and get convenience aliases. All coordinates are `f64`.
//! Boxes with non-finite coordinates are a precondition violation: comparisons
//! on NaN propagate into the tree queries undetected.

pub mod aabb;
pub mod bbox;
pub mod primitives;

pub use aabb::AabbTree;
pub use bbox::BoundingBox;
pub use primitives::{InfiniteLine, Ray, Segment, Triangle};

/// A point in `D`-dimensional space.
pub type Point<const D: usize> = nalgebra::Point<f64, D>;
/// A vector in `D`-dimensional space.
pub type Vector<const D: usize> = nalgebra::SVector<f64, D>;

pub type Point2 = Point<2>;
pub type Point3 = Point<3>;
pub type BoundingBox2D = BoundingBox<2>;
pub type BoundingBox3D = BoundingBox<3>;
pub type AabbTree2D = AabbTree<2>;
pub type AabbTree3D = AabbTree<3>;
