// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BRep-Lite Mesh
//!
//! Mesh containers for the modeling layer: bare vertex sets, point sets,
//! edged curves, polygonal surface meshes and tetrahedral solids. Every
//! container carries an [`AttributeStore`] for its vertices, a dense-indexed
//! typed key-value store that higher layers use to attach identification data
//! without the mesh knowing about it.
//!
//! Vertex, edge and polygon indices are dense `u32` values local to one mesh.

pub mod attributes;
pub mod curve;
pub mod error;
pub mod point_set;
pub mod solid;
pub mod surface;
pub mod vertex_set;

pub use attributes::AttributeStore;
pub use curve::EdgedCurve;
pub use error::{Error, Result};
pub use point_set::PointSet;
pub use solid::TetrahedralSolid;
pub use surface::{PolygonEdge, PolygonVertex, SurfaceMesh};
pub use vertex_set::VertexSet;

/// Capability every mesh exposes to the identification layer: a vertex count
/// and the vertex attribute store.
pub trait MeshVertices {
    fn nb_vertices(&self) -> u32;
    fn vertex_attributes(&self) -> &AttributeStore;
    fn vertex_attributes_mut(&mut self) -> &mut AttributeStore;
}
