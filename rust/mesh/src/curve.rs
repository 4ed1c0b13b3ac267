// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Edged curves: located vertices chained by explicit edges.

use brep_lite_geometry::{BoundingBox, Point};

use crate::attributes::AttributeStore;
use crate::error::{Error, Result};
use crate::MeshVertices;

/// A curve mesh: points plus edges between them. Line components carry one.
#[derive(Debug)]
pub struct EdgedCurve<const D: usize> {
    points: Vec<Point<D>>,
    edges: Vec<[u32; 2]>,
    attributes: AttributeStore,
}

impl<const D: usize> Default for EdgedCurve<D> {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            edges: Vec::new(),
            attributes: AttributeStore::new(),
        }
    }
}

impl<const D: usize> EdgedCurve<D> {
    /// Creates an empty curve.
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

    /// Appends an edge between two existing vertices and returns its id.
    pub fn create_edge(&mut self, v0: u32, v1: u32) -> Result<u32> {
        let nb_vertices = self.nb_vertices();
        for vertex in [v0, v1] {
            if vertex >= nb_vertices {
                return Err(Error::VertexOutOfRange {
                    vertex,
                    nb_vertices,
                });
            }
        }
        let id = self.edges.len() as u32;
        self.edges.push([v0, v1]);
        Ok(id)
    }

    pub fn nb_edges(&self) -> u32 {
        self.edges.len() as u32
    }

    /// Returns the two vertex ids of an edge.
    pub fn edge_vertices(&self, edge: u32) -> Option<[u32; 2]> {
        self.edges.get(edge as usize).copied()
    }

    /// Returns the position of a vertex.
    pub fn point(&self, vertex: u32) -> Option<&Point<D>> {
        self.points.get(vertex as usize)
    }

    /// Returns the box enclosing the curve.
    pub fn bounding_box(&self) -> BoundingBox<D> {
        BoundingBox::from_points(self.points.iter())
    }

    /// Returns the box enclosing one edge.
    pub fn edge_bounding_box(&self, edge: u32) -> Option<BoundingBox<D>> {
        let [v0, v1] = self.edge_vertices(edge)?;
        let mut bbox = BoundingBox::new();
        bbox.add_point(self.point(v0)?);
        bbox.add_point(self.point(v1)?);
        Some(bbox)
    }
}

impl<const D: usize> MeshVertices for EdgedCurve<D> {
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
