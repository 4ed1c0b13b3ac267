// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The unique-vertex registry.
//!
//! A model-wide unique vertex is an abstract identity shared by vertices of
//! several component meshes: the corner of a line touching two surfaces is
//! one unique vertex with three component vertices behind it. The
//! [`VertexIdentifier`] owns both directions of that mapping:
//!
//! - **forward**: per registered component, a dense table `local vertex →
//!   unique vertex id` (`NO_ID` while unset). The same table is mirrored on
//!   the component mesh as the reserved vertex attribute
//!   [`UNIQUE_VERTICES_ATTRIBUTE`], so mesh consumers see it too.
//! - **reverse**: per unique vertex, the list of component vertices mapped to
//!   it, stored as the [`COMPONENT_VERTICES_ATTRIBUTE`] attribute of an
//!   internal pseudo-mesh whose vertices are the unique vertices themselves.
//!
//! Unique vertex ids form a dense space that only grows; there is no
//! compaction. The identifier is single-writer: callers serialize all
//! mutating calls.

use rustc_hash::FxHashMap;

use brep_lite_mesh::{AttributeStore, MeshVertices, VertexSet};

use crate::component::{ComponentId, ComponentType, MeshComponentVertex};
use crate::error::{Error, Result};

/// Sentinel for "no unique vertex assigned yet".
pub const NO_ID: u32 = u32::MAX;

/// Reserved per-mesh vertex attribute holding the forward mapping.
pub const UNIQUE_VERTICES_ATTRIBUTE: &str = "unique vertices";

/// Reserved pseudo-mesh attribute holding the reverse mapping.
pub(crate) const COMPONENT_VERTICES_ATTRIBUTE: &str = "component vertices";

/// Registry mapping component vertices to model-wide unique vertices.
pub struct VertexIdentifier {
    /// Pseudo-mesh with one vertex per unique vertex; its attribute store
    /// carries the reverse lists.
    pub(crate) unique_vertices: VertexSet,
    /// Forward tables of every registered component.
    pub(crate) forward: FxHashMap<ComponentId, Vec<u32>>,
}

impl Default for VertexIdentifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VertexIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexIdentifier")
            .field("nb_unique_vertices", &self.nb_unique_vertices())
            .field("nb_components", &self.forward.len())
            .finish()
    }
}

impl VertexIdentifier {
    /// Creates an empty registry.
    pub fn new() -> Self {
        let mut unique_vertices = VertexSet::new();
        unique_vertices
            .vertex_attributes_mut()
            .find_or_create_attribute(
                COMPONENT_VERTICES_ATTRIBUTE,
                Vec::<MeshComponentVertex>::new(),
            )
            .expect("fresh attribute store has no attribute name collisions");
        Self {
            unique_vertices,
            forward: FxHashMap::default(),
        }
    }

    /// Number of unique vertices registered so far.
    pub fn nb_unique_vertices(&self) -> u32 {
        self.unique_vertices.nb_vertices()
    }

    /// Returns `true` if the component currently has a forward table.
    pub fn is_registered(&self, component_id: &ComponentId) -> bool {
        self.forward.contains_key(component_id)
    }

    /// Ids of every registered component.
    pub fn registered_components(&self) -> impl Iterator<Item = &ComponentId> {
        self.forward.keys()
    }

    /// Registers a component, attaching the reserved forward attribute to its
    /// mesh.
    ///
    /// Re-registering an already known component replaces its mesh attribute:
    /// the old table is copied index-by-index when the vertex count still
    /// matches; otherwise a warning is logged and the table is reset to
    /// `NO_ID` (lossy on purpose: the mesh was rebuilt under the component).
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` if the reserved attribute already exists on
    /// the mesh of a component seen for the first time: something else claims
    /// the name and silently sharing it would alias unrelated data.
    pub fn register_component<M: MeshVertices>(
        &mut self,
        component_id: ComponentId,
        mesh: &mut M,
    ) -> Result<()> {
        let nb_vertices = mesh.nb_vertices();
        let attributes = mesh.vertex_attributes_mut();
        if let Some(table) = self.forward.get_mut(&component_id) {
            attributes.find_or_create_attribute(UNIQUE_VERTICES_ATTRIBUTE, NO_ID)?;
            if table.len() == nb_vertices as usize {
                for (vertex, &unique_id) in table.iter().enumerate() {
                    attributes.set_attribute_value(
                        UNIQUE_VERTICES_ATTRIBUTE,
                        vertex as u32,
                        unique_id,
                    )?;
                }
            } else {
                tracing::warn!(
                    component = %component_id,
                    old_nb_vertices = table.len(),
                    new_nb_vertices = nb_vertices,
                    "re-registering component with a different vertex count, \
                     identification data reset"
                );
                table.clear();
                table.resize(nb_vertices as usize, NO_ID);
                for vertex in 0..nb_vertices {
                    attributes.set_attribute_value(UNIQUE_VERTICES_ATTRIBUTE, vertex, NO_ID)?;
                }
            }
        } else {
            if attributes.attribute_exists(UNIQUE_VERTICES_ATTRIBUTE) {
                return Err(Error::PreconditionViolation(format!(
                    "attribute {UNIQUE_VERTICES_ATTRIBUTE:?} already exists on the mesh of \
                     component {component_id} at first registration"
                )));
            }
            attributes.find_or_create_attribute(UNIQUE_VERTICES_ATTRIBUTE, NO_ID)?;
            self.forward
                .insert(component_id, vec![NO_ID; nb_vertices as usize]);
        }
        Ok(())
    }

    /// Unregisters a component: deletes the reserved mesh attribute, drops
    /// the forward table and purges the component from every reverse list.
    ///
    /// The purge scans all unique vertices; component removal is rare next to
    /// lookups, so the linear cost stays off the hot paths.
    pub fn remove_component<M: MeshVertices>(&mut self, component_id: ComponentId, mesh: &mut M) {
        mesh.vertex_attributes_mut()
            .delete_attribute(UNIQUE_VERTICES_ATTRIBUTE);
        self.forward.remove(&component_id);
        self.filter_component_vertices(component_id);
    }

    /// Returns the unique vertex of a component vertex, `NO_ID` if the vertex
    /// has not been identified yet.
    ///
    /// # Errors
    ///
    /// `ComponentNotRegistered` if the component has no forward table; a
    /// missing registration is a caller bug, never silently defaulted.
    pub fn unique_vertex(&self, component_vertex: &MeshComponentVertex) -> Result<u32> {
        let table = self
            .forward
            .get(&component_vertex.component_id)
            .ok_or(Error::ComponentNotRegistered(component_vertex.component_id))?;
        // Vertices created after registration read as unidentified.
        Ok(table
            .get(component_vertex.vertex as usize)
            .copied()
            .unwrap_or(NO_ID))
    }

    /// Allocates one fresh unique vertex and returns its id.
    pub fn create_unique_vertex(&mut self) -> u32 {
        self.unique_vertices.create_vertex()
    }

    /// Allocates `nb` fresh unique vertices and returns the first id.
    pub fn create_unique_vertices(&mut self, nb: u32) -> u32 {
        self.unique_vertices.create_vertices(nb)
    }

    /// Maps `component_vertex` to `unique_vertex_id`, keeping both directions
    /// and the mesh-side attribute (`attributes`) consistent.
    ///
    /// Idempotent: mapping a vertex to its current unique vertex is a no-op.
    /// Otherwise the vertex is removed from its old reverse list (swap-remove,
    /// list order is not preserved) and appended to the new one unless already
    /// present.
    pub fn set_unique_vertex(
        &mut self,
        component_vertex: MeshComponentVertex,
        unique_vertex_id: u32,
        attributes: &mut AttributeStore,
    ) -> Result<()> {
        if unique_vertex_id >= self.nb_unique_vertices() {
            return Err(Error::UniqueVertexNotFound(unique_vertex_id));
        }
        let table = self
            .forward
            .get_mut(&component_vertex.component_id)
            .ok_or(Error::ComponentNotRegistered(component_vertex.component_id))?;
        // The mesh may have grown since registration.
        if table.len() <= component_vertex.vertex as usize {
            table.resize(component_vertex.vertex as usize + 1, NO_ID);
        }
        let old_unique_id = table[component_vertex.vertex as usize];
        if old_unique_id == unique_vertex_id {
            return Ok(());
        }

        if old_unique_id != NO_ID {
            self.unique_vertices
                .vertex_attributes_mut()
                .modify_attribute_value(
                    COMPONENT_VERTICES_ATTRIBUTE,
                    old_unique_id,
                    |vertices: &mut Vec<MeshComponentVertex>| {
                        if let Some(position) =
                            vertices.iter().position(|v| *v == component_vertex)
                        {
                            vertices.swap_remove(position);
                        }
                    },
                )?;
        }
        table[component_vertex.vertex as usize] = unique_vertex_id;
        self.unique_vertices
            .vertex_attributes_mut()
            .modify_attribute_value(
                COMPONENT_VERTICES_ATTRIBUTE,
                unique_vertex_id,
                |vertices: &mut Vec<MeshComponentVertex>| {
                    if !vertices.contains(&component_vertex) {
                        vertices.push(component_vertex);
                    }
                },
            )?;
        attributes.set_attribute_value(
            UNIQUE_VERTICES_ATTRIBUTE,
            component_vertex.vertex,
            unique_vertex_id,
        )?;
        Ok(())
    }

    /// Returns every component vertex mapped to a unique vertex.
    pub fn mesh_component_vertices(&self, unique_vertex_id: u32) -> Result<&[MeshComponentVertex]> {
        if unique_vertex_id >= self.nb_unique_vertices() {
            return Err(Error::UniqueVertexNotFound(unique_vertex_id));
        }
        let vertices = self
            .unique_vertices
            .vertex_attributes()
            .attribute_ref::<Vec<MeshComponentVertex>>(
                COMPONENT_VERTICES_ATTRIBUTE,
                unique_vertex_id,
            )?;
        Ok(vertices.as_slice())
    }

    /// Returns the component vertices of a unique vertex, restricted to one
    /// component kind.
    pub fn mesh_component_vertices_of_type(
        &self,
        unique_vertex_id: u32,
        component_type: ComponentType,
    ) -> Result<Vec<MeshComponentVertex>> {
        Ok(self
            .mesh_component_vertices(unique_vertex_id)?
            .iter()
            .filter(|v| v.component_id.component_type() == component_type)
            .copied()
            .collect())
    }

    /// Returns the local vertex ids one component maps to a unique vertex.
    pub fn component_mesh_vertices(
        &self,
        unique_vertex_id: u32,
        component_id: &ComponentId,
    ) -> Result<Vec<u32>> {
        Ok(self
            .mesh_component_vertices(unique_vertex_id)?
            .iter()
            .filter(|v| v.component_id == *component_id)
            .map(|v| v.vertex)
            .collect())
    }

    fn filter_component_vertices(&mut self, component_id: ComponentId) {
        for unique_id in 0..self.nb_unique_vertices() {
            // The reserved attribute exists since construction; the entry is
            // in range by the loop bound.
            let _ = self
                .unique_vertices
                .vertex_attributes_mut()
                .modify_attribute_value(
                    COMPONENT_VERTICES_ATTRIBUTE,
                    unique_id,
                    |vertices: &mut Vec<MeshComponentVertex>| {
                        vertices.retain(|v| v.component_id != component_id);
                    },
                );
        }
    }
}
