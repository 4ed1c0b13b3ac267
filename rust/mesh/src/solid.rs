// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tetrahedral solid meshes.

use brep_lite_geometry::{BoundingBox, Point};

use crate::attributes::AttributeStore;
use crate::error::{Error, Result};
use crate::MeshVertices;

/// A tetrahedral volume mesh. Block components carry one; solids are 3D only.
#[derive(Debug, Default)]
pub struct TetrahedralSolid {
    points: Vec<Point<3>>,
    tetrahedra: Vec<[u32; 4]>,
    attributes: AttributeStore,
}

impl TetrahedralSolid {
    /// Creates an empty solid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a point and returns its vertex id.
    pub fn create_point(&mut self, point: Point<3>) -> u32 {
        let id = self.points.len() as u32;
        self.points.push(point);
        self.attributes.resize(id + 1);
        id
    }

    /// Appends a tetrahedron over existing vertices and returns its id.
    pub fn create_tetrahedron(&mut self, vertices: [u32; 4]) -> Result<u32> {
        let nb_vertices = self.nb_vertices();
        for vertex in vertices {
            if vertex >= nb_vertices {
                return Err(Error::VertexOutOfRange {
                    vertex,
                    nb_vertices,
                });
            }
        }
        let id = self.tetrahedra.len() as u32;
        self.tetrahedra.push(vertices);
        Ok(id)
    }

    pub fn nb_tetrahedra(&self) -> u32 {
        self.tetrahedra.len() as u32
    }

    /// Returns the four vertex ids of a tetrahedron.
    pub fn tetrahedron_vertices(&self, tetrahedron: u32) -> Option<[u32; 4]> {
        self.tetrahedra.get(tetrahedron as usize).copied()
    }

    /// Returns the position of a vertex.
    pub fn point(&self, vertex: u32) -> Option<&Point<3>> {
        self.points.get(vertex as usize)
    }

    /// Returns the box enclosing the solid.
    pub fn bounding_box(&self) -> BoundingBox<3> {
        BoundingBox::from_points(self.points.iter())
    }
}

impl MeshVertices for TetrahedralSolid {
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
