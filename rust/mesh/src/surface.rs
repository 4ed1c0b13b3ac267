// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygonal surface meshes with edge adjacency.
//!
//! A surface mesh stores polygons as vertex loops plus, per polygon edge, the
//! index of the polygon on the other side (`None` on a border). Edge `e` of a
//! polygon connects local vertices `e` and `e + 1` (mod the loop length).
//!
//! Every vertex keeps an association hint: one polygon corner it belongs to.
//! [`SurfaceMesh::polygons_around_vertex`] walks the adjacency from that hint
//! and returns only the corners reachable without crossing a border or an
//! unset adjacency: the vertex's connected polygon fan. Splitting algorithms
//! rely on this: unsetting adjacencies shrinks the reachable fan, and
//! re-associating the vertex moves it to another fan.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use brep_lite_geometry::{BoundingBox, Point};

use crate::attributes::AttributeStore;
use crate::error::{Error, Result};
use crate::MeshVertices;

/// One corner of a polygon: the polygon id and the local vertex index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolygonVertex {
    pub polygon_id: u32,
    pub vertex_id: u32,
}

impl PolygonVertex {
    pub fn new(polygon_id: u32, vertex_id: u32) -> Self {
        Self {
            polygon_id,
            vertex_id,
        }
    }
}

/// One edge of a polygon: the polygon id and the local edge index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolygonEdge {
    pub polygon_id: u32,
    pub edge_id: u32,
}

impl PolygonEdge {
    pub fn new(polygon_id: u32, edge_id: u32) -> Self {
        Self {
            polygon_id,
            edge_id,
        }
    }
}

#[derive(Debug)]
struct Polygon {
    vertices: SmallVec<[u32; 4]>,
    adjacents: SmallVec<[Option<u32>; 4]>,
}

/// A polygonal surface mesh.
#[derive(Debug)]
pub struct SurfaceMesh<const D: usize> {
    points: Vec<Point<D>>,
    polygons: Vec<Polygon>,
    /// One polygon corner per vertex, used as the fan-walk seed. `None` for
    /// vertices not referenced by any polygon.
    associations: Vec<Option<PolygonVertex>>,
    attributes: AttributeStore,
}

impl<const D: usize> Default for SurfaceMesh<D> {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            polygons: Vec::new(),
            associations: Vec::new(),
            attributes: AttributeStore::new(),
        }
    }
}

impl<const D: usize> SurfaceMesh<D> {
    /// Creates an empty surface mesh.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Queries ---

    pub fn nb_polygons(&self) -> u32 {
        self.polygons.len() as u32
    }

    /// Returns the position of a vertex.
    pub fn point(&self, vertex: u32) -> Option<&Point<D>> {
        self.points.get(vertex as usize)
    }

    /// Returns the number of vertices in a polygon's loop.
    pub fn nb_polygon_vertices(&self, polygon: u32) -> u32 {
        self.polygons
            .get(polygon as usize)
            .map_or(0, |p| p.vertices.len() as u32)
    }

    /// Returns the global vertex id at a polygon corner.
    pub fn polygon_vertex(&self, corner: &PolygonVertex) -> Option<u32> {
        self.polygons
            .get(corner.polygon_id as usize)?
            .vertices
            .get(corner.vertex_id as usize)
            .copied()
    }

    /// Returns the vertex loop of a polygon.
    pub fn polygon_vertices(&self, polygon: u32) -> Option<&[u32]> {
        self.polygons
            .get(polygon as usize)
            .map(|p| p.vertices.as_slice())
    }

    /// Returns the two global vertex ids of a polygon edge, in loop order.
    pub fn polygon_edge_vertices(&self, edge: &PolygonEdge) -> Option<(u32, u32)> {
        let polygon = self.polygons.get(edge.polygon_id as usize)?;
        let n = polygon.vertices.len() as u32;
        if edge.edge_id >= n {
            return None;
        }
        let from = polygon.vertices[edge.edge_id as usize];
        let to = polygon.vertices[((edge.edge_id + 1) % n) as usize];
        Some((from, to))
    }

    /// Returns the polygon on the other side of an edge, `None` on a border.
    pub fn polygon_adjacent(&self, edge: &PolygonEdge) -> Option<u32> {
        self.polygons
            .get(edge.polygon_id as usize)?
            .adjacents
            .get(edge.edge_id as usize)
            .copied()
            .flatten()
    }

    /// Returns `true` if no polygon lies on the other side of the edge.
    pub fn is_edge_on_border(&self, edge: &PolygonEdge) -> bool {
        self.polygon_adjacent(edge).is_none()
    }

    /// Returns the corner of `vertex` inside `polygon`, if any.
    pub fn polygon_corner(&self, polygon: u32, vertex: u32) -> Option<PolygonVertex> {
        let vertices = self.polygon_vertices(polygon)?;
        vertices
            .iter()
            .position(|&v| v == vertex)
            .map(|local| PolygonVertex::new(polygon, local as u32))
    }

    /// Returns the polygon corners reachable around `vertex` from its
    /// association hint, without crossing a border or unset adjacency.
    ///
    /// Walks one rotational direction until a border or a full loop, then the
    /// other direction. Vertices with no association yield an empty fan.
    pub fn polygons_around_vertex(&self, vertex: u32) -> Vec<PolygonVertex> {
        let Some(Some(seed)) = self.associations.get(vertex as usize).copied() else {
            return Vec::new();
        };
        debug_assert_eq!(
            self.polygon_vertex(&seed),
            Some(vertex),
            "stale association hint for vertex {vertex}"
        );

        let total_corners: usize = self.polygons.iter().map(|p| p.vertices.len()).sum();
        let mut fan = vec![seed];
        let mut full_loop = false;

        // Cross the edge arriving at the corner (previous edge).
        let mut current = seed;
        while fan.len() <= total_corners {
            let n = self.nb_polygon_vertices(current.polygon_id);
            let previous_edge =
                PolygonEdge::new(current.polygon_id, (current.vertex_id + n - 1) % n);
            let Some(adjacent) = self.polygon_adjacent(&previous_edge) else {
                break;
            };
            let Some(corner) = self.polygon_corner(adjacent, vertex) else {
                break;
            };
            if corner == seed {
                full_loop = true;
                break;
            }
            fan.push(corner);
            current = corner;
        }

        if !full_loop {
            // Cross the edge leaving the corner (next edge).
            current = seed;
            while fan.len() <= total_corners {
                let next_edge = PolygonEdge::new(current.polygon_id, current.vertex_id);
                let Some(adjacent) = self.polygon_adjacent(&next_edge) else {
                    break;
                };
                let Some(corner) = self.polygon_corner(adjacent, vertex) else {
                    break;
                };
                fan.push(corner);
                current = corner;
            }
        }

        fan
    }

    /// Returns the box enclosing the mesh.
    pub fn bounding_box(&self) -> BoundingBox<D> {
        BoundingBox::from_points(self.points.iter())
    }

    /// Returns the box enclosing one polygon.
    pub fn polygon_bounding_box(&self, polygon: u32) -> Option<BoundingBox<D>> {
        let vertices = self.polygon_vertices(polygon)?;
        let mut bbox = BoundingBox::new();
        for &v in vertices {
            bbox.add_point(self.point(v)?);
        }
        Some(bbox)
    }

    // --- Structural mutation ---

    /// Appends a point and returns its vertex id. Vertex attributes grow
    /// with the mesh.
    pub fn create_point(&mut self, point: Point<D>) -> u32 {
        let id = self.points.len() as u32;
        self.points.push(point);
        self.associations.push(None);
        self.attributes.resize(id + 1);
        id
    }

    /// Appends a polygon over existing vertices. Adjacencies start unset;
    /// call [`Self::compute_polygon_adjacencies`] once all polygons exist.
    pub fn create_polygon(&mut self, vertices: &[u32]) -> Result<u32> {
        if vertices.len() < 3 {
            return Err(Error::DegeneratePolygon(vertices.len()));
        }
        let nb_vertices = self.nb_vertices();
        for &vertex in vertices {
            if vertex >= nb_vertices {
                return Err(Error::VertexOutOfRange {
                    vertex,
                    nb_vertices,
                });
            }
        }
        let polygon_id = self.polygons.len() as u32;
        self.polygons.push(Polygon {
            vertices: SmallVec::from_slice(vertices),
            adjacents: SmallVec::from_elem(None, vertices.len()),
        });
        for (local, &vertex) in vertices.iter().enumerate() {
            let slot = &mut self.associations[vertex as usize];
            if slot.is_none() {
                *slot = Some(PolygonVertex::new(polygon_id, local as u32));
            }
        }
        Ok(polygon_id)
    }

    /// Links every pair of polygon edges sharing the same two vertices in
    /// opposite orientation. Edges shared by more than two polygons or with
    /// matching orientation stay unset.
    pub fn compute_polygon_adjacencies(&mut self) {
        let mut directed: FxHashMap<(u32, u32), SmallVec<[PolygonEdge; 1]>> = FxHashMap::default();
        for (polygon_id, polygon) in self.polygons.iter().enumerate() {
            let n = polygon.vertices.len();
            for edge_id in 0..n {
                let from = polygon.vertices[edge_id];
                let to = polygon.vertices[(edge_id + 1) % n];
                directed
                    .entry((from, to))
                    .or_default()
                    .push(PolygonEdge::new(polygon_id as u32, edge_id as u32));
            }
        }
        for (polygon_id, polygon) in self.polygons.iter_mut().enumerate() {
            let n = polygon.vertices.len();
            for edge_id in 0..n {
                let from = polygon.vertices[edge_id];
                let to = polygon.vertices[(edge_id + 1) % n];
                let here = directed.get(&(from, to)).map_or(0, SmallVec::len);
                let opposite = directed.get(&(to, from));
                polygon.adjacents[edge_id] = match (here, opposite) {
                    (1, Some(others)) if others.len() == 1 => {
                        let other = others[0];
                        debug_assert_ne!(other.polygon_id, polygon_id as u32);
                        Some(other.polygon_id)
                    }
                    _ => None,
                };
            }
        }
    }

    /// Removes the adjacency on one side of a polygon edge.
    pub fn unset_polygon_adjacent(&mut self, edge: &PolygonEdge) {
        if let Some(polygon) = self.polygons.get_mut(edge.polygon_id as usize) {
            if let Some(slot) = polygon.adjacents.get_mut(edge.edge_id as usize) {
                *slot = None;
            }
        }
    }

    /// Redirects the polygon fan currently reachable from `old` to `new`:
    /// each corner in the fan now references `new`, `new` is associated with
    /// the first of them, and `old` loses its association.
    ///
    /// Corners in fans that were not reachable keep referencing `old`; use
    /// [`Self::associate_polygon_vertex_to_vertex`] to hand `old` one of them.
    pub fn replace_vertex(&mut self, old: u32, new: u32) {
        let fan = self.polygons_around_vertex(old);
        for corner in &fan {
            self.polygons[corner.polygon_id as usize].vertices[corner.vertex_id as usize] = new;
        }
        self.associations[new as usize] = fan.first().copied();
        self.associations[old as usize] = None;
    }

    /// Sets the association hint of `vertex` to `corner`. The corner must
    /// currently reference `vertex`.
    pub fn associate_polygon_vertex_to_vertex(&mut self, corner: PolygonVertex, vertex: u32) {
        debug_assert_eq!(
            self.polygon_vertex(&corner),
            Some(vertex),
            "corner does not reference vertex {vertex}"
        );
        self.associations[vertex as usize] = Some(corner);
    }
}

impl<const D: usize> MeshVertices for SurfaceMesh<D> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use brep_lite_geometry::Point2;

    /// Two triangles sharing the edge (1, 2):
    ///
    /// ```text
    ///   3 --- 2
    ///   |  B / |
    ///   |  / A |
    ///   1 --- 0   (triangle A: 0,2,1 / triangle B: 1,2,3)
    /// ```
    fn two_triangles() -> SurfaceMesh<2> {
        let mut mesh = SurfaceMesh::new();
        mesh.create_point(Point2::new(1.0, 0.0));
        mesh.create_point(Point2::new(0.0, 0.0));
        mesh.create_point(Point2::new(1.0, 1.0));
        mesh.create_point(Point2::new(0.0, 1.0));
        mesh.create_polygon(&[0, 2, 1]).unwrap();
        mesh.create_polygon(&[1, 2, 3]).unwrap();
        mesh.compute_polygon_adjacencies();
        mesh
    }

    #[test]
    fn adjacency_links_shared_edge() {
        let mesh = two_triangles();
        // Edge (2, 1) in polygon 0 faces edge (1, 2) in polygon 1.
        assert_eq!(mesh.polygon_adjacent(&PolygonEdge::new(0, 1)), Some(1));
        assert_eq!(mesh.polygon_adjacent(&PolygonEdge::new(1, 0)), Some(0));
        assert!(mesh.is_edge_on_border(&PolygonEdge::new(0, 0)));
        assert!(mesh.is_edge_on_border(&PolygonEdge::new(1, 1)));
    }

    #[test]
    fn polygon_edge_vertices_follow_loop_order() {
        let mesh = two_triangles();
        assert_eq!(
            mesh.polygon_edge_vertices(&PolygonEdge::new(0, 2)),
            Some((1, 0))
        );
        assert!(mesh.polygon_edge_vertices(&PolygonEdge::new(0, 3)).is_none());
    }

    #[test]
    fn fan_covers_both_triangles() {
        let mesh = two_triangles();
        // Vertex 1 belongs to both triangles; the fan crosses the shared edge.
        let fan = mesh.polygons_around_vertex(1);
        let polygons: Vec<u32> = fan.iter().map(|c| c.polygon_id).collect();
        assert_eq!(fan.len(), 2);
        assert!(polygons.contains(&0) && polygons.contains(&1));
        for corner in &fan {
            assert_eq!(mesh.polygon_vertex(corner), Some(1));
        }
    }

    #[test]
    fn unset_adjacency_shrinks_fan() {
        let mut mesh = two_triangles();
        mesh.unset_polygon_adjacent(&PolygonEdge::new(0, 1));
        mesh.unset_polygon_adjacent(&PolygonEdge::new(1, 0));

        let fan = mesh.polygons_around_vertex(1);
        assert_eq!(fan.len(), 1);
    }

    #[test]
    fn closed_fan_walks_full_loop() {
        // Four triangles around a central vertex 0, closed umbrella.
        let mut mesh = SurfaceMesh::<2>::new();
        mesh.create_point(Point2::new(0.0, 0.0));
        mesh.create_point(Point2::new(1.0, 0.0));
        mesh.create_point(Point2::new(0.0, 1.0));
        mesh.create_point(Point2::new(-1.0, 0.0));
        mesh.create_point(Point2::new(0.0, -1.0));
        mesh.create_polygon(&[0, 1, 2]).unwrap();
        mesh.create_polygon(&[0, 2, 3]).unwrap();
        mesh.create_polygon(&[0, 3, 4]).unwrap();
        mesh.create_polygon(&[0, 4, 1]).unwrap();
        mesh.compute_polygon_adjacencies();

        let fan = mesh.polygons_around_vertex(0);
        assert_eq!(fan.len(), 4);
    }

    #[test]
    fn replace_vertex_moves_reachable_fan() {
        let mut mesh = two_triangles();
        // Disconnect the triangles, then move vertex 1's reachable fan to a
        // duplicate point.
        mesh.unset_polygon_adjacent(&PolygonEdge::new(0, 1));
        mesh.unset_polygon_adjacent(&PolygonEdge::new(1, 0));
        let duplicate = mesh.create_point(*mesh.point(1).unwrap());

        let before = mesh.polygons_around_vertex(1);
        assert_eq!(before.len(), 1);
        let moved_polygon = before[0].polygon_id;

        mesh.replace_vertex(1, duplicate);
        assert_eq!(mesh.polygons_around_vertex(1).len(), 0);

        let new_fan = mesh.polygons_around_vertex(duplicate);
        assert_eq!(new_fan.len(), 1);
        assert_eq!(new_fan[0].polygon_id, moved_polygon);

        // Hand vertex 1 a corner of the other triangle.
        let other_polygon = 1 - moved_polygon;
        let corner = mesh.polygon_corner(other_polygon, 1).unwrap();
        mesh.associate_polygon_vertex_to_vertex(corner, 1);
        assert_eq!(mesh.polygons_around_vertex(1).len(), 1);
    }

    #[test]
    fn degenerate_polygon_rejected() {
        let mut mesh = SurfaceMesh::<2>::new();
        mesh.create_point(Point2::new(0.0, 0.0));
        mesh.create_point(Point2::new(1.0, 0.0));
        assert!(matches!(
            mesh.create_polygon(&[0, 1]),
            Err(Error::DegeneratePolygon(2))
        ));
        assert!(matches!(
            mesh.create_polygon(&[0, 1, 9]),
            Err(Error::VertexOutOfRange { vertex: 9, .. })
        ));
    }

    #[test]
    fn attributes_grow_with_created_points() {
        let mut mesh = SurfaceMesh::<2>::new();
        mesh.vertex_attributes_mut()
            .find_or_create_attribute("id", u32::MAX)
            .unwrap();
        mesh.create_point(Point2::new(0.0, 0.0));

        assert_eq!(
            mesh.vertex_attributes().attribute_value::<u32>("id", 0).unwrap(),
            u32::MAX
        );
    }
}
