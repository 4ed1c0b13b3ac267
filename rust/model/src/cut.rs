// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cutting surfaces along their internal lines.
//!
//! An internal line marks a discontinuity inside a surface whose mesh
//! vertices were welded across it. Cutting restores the separation: polygon
//! adjacencies across the line are unset, and every vertex whose polygon
//! corners fall into several disconnected fans is duplicated until each fan
//! owns its own mesh vertex. Vertices where three or more fans meet get one
//! duplicate per extra fan.
//!
//! Surfaces are independent (each task mutates only its own surface mesh and
//! reads the model's lines, relations and identifier), so the whole-model
//! entry point fans out one task per surface and joins before touching shared
//! state. The commit into the identifier runs after the join, on the calling
//! thread: each duplicated vertex gets a fresh unique vertex, while the
//! unique vertex it was split from keeps the fan that stayed on the original
//! mesh vertex.

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use brep_lite_mesh::{MeshVertices, PolygonEdge, PolygonVertex, SurfaceMesh};

use crate::component::{ComponentId, ComponentType, MeshComponentVertex};
use crate::error::{Error, Result};
use crate::identifier::{VertexIdentifier, NO_ID};
use crate::model::{Line, Model, Surface};
use crate::relations::RelationGraph;

/// One vertex duplication performed by a cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitVertex {
    /// The duplicated vertex on the surface mesh.
    pub component_vertex: MeshComponentVertex,
    /// The unique vertex the original mesh vertex identified to when the
    /// split happened (`NO_ID` if it was never identified).
    pub split_from: u32,
    /// The fresh unique vertex assigned at commit.
    pub unique_vertex: u32,
}

/// Record produced by the per-surface phase, before unique vertices exist.
type SplitRecord = (MeshComponentVertex, u32);

/// Cuts every surface of the model along its internal lines.
///
/// Per-surface work runs in parallel; the unique-vertex commit is sequential
/// and only happens once every surface finished. A failing surface aborts
/// the whole operation with its mesh edits applied but nothing committed to
/// the identifier.
pub fn cut_all_surfaces<const D: usize>(model: &mut Model<D>) -> Result<Vec<SplitVertex>> {
    let records: Vec<SplitRecord> = {
        let lines = &model.lines;
        let relations = &model.relations;
        let identifier = &model.identifier;
        let surfaces: Vec<&mut Surface<D>> = model.surfaces.values_mut().collect();
        let per_surface: Result<Vec<Vec<SplitRecord>>> = surfaces
            .into_par_iter()
            .map(|surface| split_surface_points(surface, lines, relations, identifier))
            .collect();
        per_surface?.into_iter().flatten().collect()
    };
    commit(model, records)
}

/// Cuts a single surface along its internal lines and commits immediately.
pub fn cut_surface<const D: usize>(
    model: &mut Model<D>,
    surface_id: &ComponentId,
) -> Result<Vec<SplitVertex>> {
    let records = {
        let lines = &model.lines;
        let relations = &model.relations;
        let identifier = &model.identifier;
        let surface = model
            .surfaces
            .get_mut(surface_id)
            .ok_or(Error::ComponentNotFound(*surface_id))?;
        split_surface_points(surface, lines, relations, identifier)?
    };
    commit(model, records)
}

fn commit<const D: usize>(
    model: &mut Model<D>,
    records: Vec<SplitRecord>,
) -> Result<Vec<SplitVertex>> {
    let mut splits = Vec::with_capacity(records.len());
    for (component_vertex, split_from) in records {
        let unique_vertex = model.create_unique_vertex();
        model.set_unique_vertex(component_vertex, unique_vertex)?;
        splits.push(SplitVertex {
            component_vertex,
            split_from,
            unique_vertex,
        });
    }
    Ok(splits)
}

fn split_surface_points<const D: usize>(
    surface: &mut Surface<D>,
    lines: &FxHashMap<ComponentId, Line<D>>,
    relations: &RelationGraph,
    identifier: &VertexIdentifier,
) -> Result<Vec<SplitRecord>> {
    let edges = internal_line_edges(surface, lines, relations, identifier)?;
    for edge in &edges {
        surface.mesh.unset_polygon_adjacent(edge);
    }
    duplicate_points(surface, identifier)
}

/// Collects every polygon edge of the surface lying along one of its
/// internal lines, both sides included, matched through unique vertices.
fn internal_line_edges<const D: usize>(
    surface: &Surface<D>,
    lines: &FxHashMap<ComponentId, Line<D>>,
    relations: &RelationGraph,
    identifier: &VertexIdentifier,
) -> Result<Vec<PolygonEdge>> {
    let surface_id = surface.id();
    let mesh = &surface.mesh;

    // Surface polygon edges keyed by their unordered endpoint pair.
    let mut edge_map: FxHashMap<(u32, u32), Vec<PolygonEdge>> = FxHashMap::default();
    for polygon in 0..mesh.nb_polygons() {
        for edge_id in 0..mesh.nb_polygon_vertices(polygon) {
            let edge = PolygonEdge::new(polygon, edge_id);
            if let Some((from, to)) = mesh.polygon_edge_vertices(&edge) {
                let key = (from.min(to), from.max(to));
                edge_map.entry(key).or_default().push(edge);
            }
        }
    }

    let mut collected = FxHashSet::default();
    for internal in relations.internals_of(&surface_id) {
        if internal.component_type() != ComponentType::Line {
            continue;
        }
        let line = lines.get(internal).ok_or(Error::ComponentNotFound(*internal))?;
        for edge in 0..line.mesh.nb_edges() {
            let Some([l0, l1]) = line.mesh.edge_vertices(edge) else {
                continue;
            };
            let u0 = identifier.unique_vertex(&MeshComponentVertex::new(line.id(), l0))?;
            let u1 = identifier.unique_vertex(&MeshComponentVertex::new(line.id(), l1))?;
            if u0 == NO_ID || u1 == NO_ID {
                continue;
            }
            let s0 = identifier.component_mesh_vertices(u0, &surface_id)?;
            let s1 = identifier.component_mesh_vertices(u1, &surface_id)?;
            for &a in &s0 {
                for &b in &s1 {
                    if let Some(edges) = edge_map.get(&(a.min(b), a.max(b))) {
                        collected.extend(edges.iter().copied());
                    }
                }
            }
        }
    }
    Ok(collected.into_iter().collect())
}

struct SurfaceInfo {
    /// All polygon corners per vertex, whatever the connectivity.
    polygon_vertices: Vec<Vec<PolygonVertex>>,
    /// Vertices touched by at least one border edge.
    vertices_to_check: Vec<u32>,
}

fn compute_surface_info<const D: usize>(mesh: &SurfaceMesh<D>) -> SurfaceInfo {
    let nb_vertices = mesh.nb_vertices() as usize;
    let mut polygon_vertices = vec![Vec::new(); nb_vertices];
    let mut to_check = vec![false; nb_vertices];
    for polygon in 0..mesh.nb_polygons() {
        for local in 0..mesh.nb_polygon_vertices(polygon) {
            let corner = PolygonVertex::new(polygon, local);
            let Some(vertex) = mesh.polygon_vertex(&corner) else {
                continue;
            };
            if mesh.is_edge_on_border(&PolygonEdge::new(polygon, local)) {
                to_check[vertex as usize] = true;
            }
            polygon_vertices[vertex as usize].push(corner);
        }
    }
    let vertices_to_check = to_check
        .iter()
        .enumerate()
        .filter(|(_, &check)| check)
        .map(|(vertex, _)| vertex as u32)
        .collect();
    SurfaceInfo {
        polygon_vertices,
        vertices_to_check,
    }
}

fn duplicate_points<const D: usize>(
    surface: &mut Surface<D>,
    identifier: &VertexIdentifier,
) -> Result<Vec<SplitRecord>> {
    let surface_id = surface.id();
    let mesh = &mut surface.mesh;
    let info = compute_surface_info(mesh);
    let mut mapping = Vec::new();
    for &vertex_id in &info.vertices_to_check {
        let mut polygons_around = mesh.polygons_around_vertex(vertex_id);
        let polygon_vertices = &info.polygon_vertices[vertex_id as usize];
        debug_assert!(
            polygons_around.len() <= polygon_vertices.len(),
            "reachable fan larger than the vertex's corner set"
        );
        let mut nb_polygons_around = polygons_around.len();
        let mut total_polygons: Vec<PolygonVertex> = Vec::new();
        while nb_polygons_around != polygon_vertices.len() {
            total_polygons.extend(polygons_around.iter().copied());
            mapping.push(split_fan(
                surface_id,
                mesh,
                identifier,
                vertex_id,
                &total_polygons,
                polygon_vertices,
            )?);
            polygons_around = mesh.polygons_around_vertex(vertex_id);
            nb_polygons_around += polygons_around.len();
        }
    }
    Ok(mapping)
}

/// Moves the currently reachable fan of `vertex_id` onto a duplicated point
/// and re-associates `vertex_id` with a corner of a fan not yet visited.
fn split_fan<const D: usize>(
    surface_id: ComponentId,
    mesh: &mut SurfaceMesh<D>,
    identifier: &VertexIdentifier,
    vertex_id: u32,
    total_polygons: &[PolygonVertex],
    polygon_vertices: &[PolygonVertex],
) -> Result<SplitRecord> {
    let point = *mesh.point(vertex_id).ok_or(brep_lite_mesh::Error::VertexOutOfRange {
        vertex: vertex_id,
        nb_vertices: mesh.nb_vertices(),
    })?;
    let new_vertex_id = mesh.create_point(point);
    mesh.replace_vertex(vertex_id, new_vertex_id);
    for corner in polygon_vertices {
        if !total_polygons.contains(corner) {
            mesh.associate_polygon_vertex_to_vertex(*corner, vertex_id);
            break;
        }
    }
    debug_assert!(
        !mesh.polygons_around_vertex(vertex_id).is_empty(),
        "lost every polygon around vertex {vertex_id} while splitting"
    );
    let unique_vertex =
        identifier.unique_vertex(&MeshComponentVertex::new(surface_id, vertex_id))?;
    Ok((
        MeshComponentVertex::new(surface_id, new_vertex_id),
        unique_vertex,
    ))
}
