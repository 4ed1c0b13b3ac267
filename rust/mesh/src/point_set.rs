// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Point sets: vertices with positions but no connectivity.

use brep_lite_geometry::{BoundingBox, Point};

use crate::attributes::AttributeStore;
use crate::MeshVertices;

/// A set of located vertices. Corner meshes are point sets with one point.
#[derive(Debug)]
pub struct PointSet<const D: usize> {
    points: Vec<Point<D>>,
    attributes: AttributeStore,
}

impl<const D: usize> Default for PointSet<D> {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            attributes: AttributeStore::new(),
        }
    }
}

impl<const D: usize> PointSet<D> {
    /// Creates an empty point set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a point and returns its vertex id.
    pub fn create_point(&mut self, point: Point<D>) -> u32 {
        let id = self.points.len() as u32;
        self.points.push(point);
        self.attributes.resize(id + 1);
        id
    }

    /// Returns the position of a vertex.
    pub fn point(&self, vertex: u32) -> Option<&Point<D>> {
        self.points.get(vertex as usize)
    }

    /// Returns the box enclosing all points.
    pub fn bounding_box(&self) -> BoundingBox<D> {
        BoundingBox::from_points(self.points.iter())
    }
}

impl<const D: usize> MeshVertices for PointSet<D> {
    fn nb_vertices(&self) -> u32 {
        self.points.len() as u32
    }

    fn vertex_attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    fn vertex_attributes_mut(&mut self) -> &mut AttributeStore {
        &mut self.attributes
    }
}
