// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary-representation models.
//!
//! A [`Model`] owns its components, each component owning its mesh, plus the
//! relation graph and the vertex identifier. Structural mutation goes through
//! the model's methods so that a component is registered with the identifier
//! exactly while it is part of the model, and relations never outlive the
//! components they mention.
//!
//! [`Section`] (2D) and [`BRep`] (3D) are the two instantiations. Blocks only
//! carry meaning in 3D; a section simply has none.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use brep_lite_mesh::{EdgedCurve, MeshVertices, PointSet, SurfaceMesh, TetrahedralSolid};

use crate::component::{ComponentId, ComponentType, MeshComponentVertex};
use crate::error::{Error, Result};
use crate::identifier::{VertexIdentifier, NO_ID, UNIQUE_VERTICES_ATTRIBUTE};
use crate::relations::RelationGraph;

/// A corner component: one identified location.
#[derive(Debug)]
pub struct Corner<const D: usize> {
    id: ComponentId,
    pub mesh: PointSet<D>,
}

/// A line component backed by an edged curve.
#[derive(Debug)]
pub struct Line<const D: usize> {
    id: ComponentId,
    pub mesh: EdgedCurve<D>,
}

/// A surface component backed by a polygonal mesh.
#[derive(Debug)]
pub struct Surface<const D: usize> {
    id: ComponentId,
    pub mesh: SurfaceMesh<D>,
}

/// A block component backed by a tetrahedral solid (3D models only).
#[derive(Debug)]
pub struct Block {
    id: ComponentId,
    pub mesh: TetrahedralSolid,
}

impl<const D: usize> Corner<D> {
    pub fn id(&self) -> ComponentId {
        self.id
    }
}

impl<const D: usize> Line<D> {
    pub fn id(&self) -> ComponentId {
        self.id
    }
}

impl<const D: usize> Surface<D> {
    pub fn id(&self) -> ComponentId {
        self.id
    }
}

impl Block {
    pub fn id(&self) -> ComponentId {
        self.id
    }
}

/// A model of dimension `D`: components, relations and the vertex registry.
#[derive(Debug, Default)]
pub struct Model<const D: usize> {
    pub(crate) corners: FxHashMap<ComponentId, Corner<D>>,
    pub(crate) lines: FxHashMap<ComponentId, Line<D>>,
    pub(crate) surfaces: FxHashMap<ComponentId, Surface<D>>,
    pub(crate) blocks: FxHashMap<ComponentId, Block>,
    pub(crate) relations: RelationGraph,
    pub(crate) identifier: VertexIdentifier,
}

/// A 2D model: corners, lines and surfaces.
pub type Section = Model<2>;
/// A 3D model: corners, lines, surfaces and blocks.
pub type BRep = Model<3>;

impl<const D: usize> Model<D> {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Component access ---

    pub fn nb_corners(&self) -> u32 {
        self.corners.len() as u32
    }

    pub fn nb_lines(&self) -> u32 {
        self.lines.len() as u32
    }

    pub fn nb_surfaces(&self) -> u32 {
        self.surfaces.len() as u32
    }

    pub fn nb_blocks(&self) -> u32 {
        self.blocks.len() as u32
    }

    pub fn corners(&self) -> impl Iterator<Item = &Corner<D>> {
        self.corners.values()
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line<D>> {
        self.lines.values()
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &Surface<D>> {
        self.surfaces.values()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn corner(&self, id: &ComponentId) -> Result<&Corner<D>> {
        self.corners.get(id).ok_or(Error::ComponentNotFound(*id))
    }

    pub fn line(&self, id: &ComponentId) -> Result<&Line<D>> {
        self.lines.get(id).ok_or(Error::ComponentNotFound(*id))
    }

    pub fn surface(&self, id: &ComponentId) -> Result<&Surface<D>> {
        self.surfaces.get(id).ok_or(Error::ComponentNotFound(*id))
    }

    pub fn block(&self, id: &ComponentId) -> Result<&Block> {
        self.blocks.get(id).ok_or(Error::ComponentNotFound(*id))
    }

    /// Returns `true` if a component with this id belongs to the model.
    pub fn has_component(&self, id: &ComponentId) -> bool {
        match id.component_type() {
            ComponentType::Corner => self.corners.contains_key(id),
            ComponentType::Line => self.lines.contains_key(id),
            ComponentType::Surface => self.surfaces.contains_key(id),
            ComponentType::Block => self.blocks.contains_key(id),
        }
    }

    // --- Structural mutation ---

    /// Adds a corner with the given mesh, registering it with the vertex
    /// identifier. Returns the new component id.
    pub fn add_corner(&mut self, mesh: PointSet<D>) -> Result<ComponentId> {
        let id = ComponentId::new(ComponentType::Corner);
        let mut corner = Corner { id, mesh };
        self.identifier.register_component(id, &mut corner.mesh)?;
        self.corners.insert(id, corner);
        Ok(id)
    }

    /// Adds a line with the given mesh. Returns the new component id.
    pub fn add_line(&mut self, mesh: EdgedCurve<D>) -> Result<ComponentId> {
        let id = ComponentId::new(ComponentType::Line);
        let mut line = Line { id, mesh };
        self.identifier.register_component(id, &mut line.mesh)?;
        self.lines.insert(id, line);
        Ok(id)
    }

    /// Adds a surface with the given mesh. Returns the new component id.
    pub fn add_surface(&mut self, mesh: SurfaceMesh<D>) -> Result<ComponentId> {
        let id = ComponentId::new(ComponentType::Surface);
        let mut surface = Surface { id, mesh };
        self.identifier.register_component(id, &mut surface.mesh)?;
        self.surfaces.insert(id, surface);
        Ok(id)
    }

    /// Adds a block with the given mesh. Returns the new component id.
    pub fn add_block(&mut self, mesh: TetrahedralSolid) -> Result<ComponentId> {
        let id = ComponentId::new(ComponentType::Block);
        let mut block = Block { id, mesh };
        self.identifier.register_component(id, &mut block.mesh)?;
        self.blocks.insert(id, block);
        Ok(id)
    }

    /// Removes a corner, its relations and its identification data.
    pub fn remove_corner(&mut self, id: &ComponentId) -> Result<()> {
        let mut corner = self.corners.remove(id).ok_or(Error::ComponentNotFound(*id))?;
        self.identifier.remove_component(*id, &mut corner.mesh);
        self.relations.remove_component(id);
        Ok(())
    }

    /// Removes a line, its relations and its identification data.
    pub fn remove_line(&mut self, id: &ComponentId) -> Result<()> {
        let mut line = self.lines.remove(id).ok_or(Error::ComponentNotFound(*id))?;
        self.identifier.remove_component(*id, &mut line.mesh);
        self.relations.remove_component(id);
        Ok(())
    }

    /// Removes a surface, its relations and its identification data.
    pub fn remove_surface(&mut self, id: &ComponentId) -> Result<()> {
        let mut surface = self
            .surfaces
            .remove(id)
            .ok_or(Error::ComponentNotFound(*id))?;
        self.identifier.remove_component(*id, &mut surface.mesh);
        self.relations.remove_component(id);
        Ok(())
    }

    /// Removes a block, its relations and its identification data.
    pub fn remove_block(&mut self, id: &ComponentId) -> Result<()> {
        let mut block = self.blocks.remove(id).ok_or(Error::ComponentNotFound(*id))?;
        self.identifier.remove_component(*id, &mut block.mesh);
        self.relations.remove_component(id);
        Ok(())
    }

    // --- Relations ---

    /// Records that `boundary` bounds `incidence`. Both must belong to the
    /// model.
    pub fn add_boundary_relation(
        &mut self,
        boundary: ComponentId,
        incidence: ComponentId,
    ) -> Result<()> {
        for id in [&boundary, &incidence] {
            if !self.has_component(id) {
                return Err(Error::ComponentNotFound(*id));
            }
        }
        self.relations.add_boundary_relation(boundary, incidence);
        Ok(())
    }

    /// Records that `internal` is embedded in `embedding`. Both must belong
    /// to the model.
    pub fn add_internal_relation(
        &mut self,
        internal: ComponentId,
        embedding: ComponentId,
    ) -> Result<()> {
        for id in [&internal, &embedding] {
            if !self.has_component(id) {
                return Err(Error::ComponentNotFound(*id));
            }
        }
        self.relations.add_internal_relation(internal, embedding);
        Ok(())
    }

    /// Number of components this component bounds.
    pub fn nb_incidences(&self, id: &ComponentId) -> u32 {
        self.relations.nb_incidences(id)
    }

    /// Number of components this component is embedded in.
    pub fn nb_embeddings(&self, id: &ComponentId) -> u32 {
        self.relations.nb_embeddings(id)
    }

    /// Ids of the lines embedded in a surface as internal discontinuities.
    pub fn internal_lines(&self, surface: &ComponentId) -> Vec<ComponentId> {
        self.relations
            .internals_of(surface)
            .iter()
            .filter(|id| id.component_type() == ComponentType::Line)
            .copied()
            .collect()
    }

    // --- Unique vertices ---

    pub fn nb_unique_vertices(&self) -> u32 {
        self.identifier.nb_unique_vertices()
    }

    /// Returns the unique vertex of a component vertex.
    pub fn unique_vertex(&self, component_vertex: &MeshComponentVertex) -> Result<u32> {
        self.identifier.unique_vertex(component_vertex)
    }

    /// Allocates one fresh unique vertex.
    pub fn create_unique_vertex(&mut self) -> u32 {
        self.identifier.create_unique_vertex()
    }

    /// Allocates `nb` fresh unique vertices, returning the first id.
    pub fn create_unique_vertices(&mut self, nb: u32) -> u32 {
        self.identifier.create_unique_vertices(nb)
    }

    /// Returns every component vertex mapped to a unique vertex.
    pub fn mesh_component_vertices(&self, unique_vertex_id: u32) -> Result<&[MeshComponentVertex]> {
        self.identifier.mesh_component_vertices(unique_vertex_id)
    }

    /// Maps a component vertex to a unique vertex, resolving the component's
    /// attribute store for the identifier.
    pub fn set_unique_vertex(
        &mut self,
        component_vertex: MeshComponentVertex,
        unique_vertex_id: u32,
    ) -> Result<()> {
        let id = &component_vertex.component_id;
        let attributes = match id.component_type() {
            ComponentType::Corner => self
                .corners
                .get_mut(id)
                .map(|c| c.mesh.vertex_attributes_mut()),
            ComponentType::Line => self.lines.get_mut(id).map(|l| l.mesh.vertex_attributes_mut()),
            ComponentType::Surface => self
                .surfaces
                .get_mut(id)
                .map(|s| s.mesh.vertex_attributes_mut()),
            ComponentType::Block => self
                .blocks
                .get_mut(id)
                .map(|b| b.mesh.vertex_attributes_mut()),
        }
        .ok_or(Error::ComponentNotFound(*id))?;
        self.identifier
            .set_unique_vertex(component_vertex, unique_vertex_id, attributes)
    }

    // --- Registry persistence ---

    /// Saves the unique-vertex registry into `directory` and returns the
    /// written file path.
    pub fn save_unique_vertices(&self, directory: &Path) -> Result<PathBuf> {
        self.identifier.save(directory)
    }

    /// Loads the unique-vertex registry from `directory`, replacing the
    /// current one and refreshing the forward attribute on every component
    /// mesh the registry mentions.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing or invalid, or if the registry mentions a
    /// component the model does not have.
    pub fn load_unique_vertices(&mut self, directory: &Path) -> Result<()> {
        let identifier = VertexIdentifier::load(directory)?;
        for component_id in identifier.registered_components() {
            if !self.has_component(component_id) {
                return Err(Error::ComponentNotFound(*component_id));
            }
        }
        self.identifier = identifier;
        let component_ids: Vec<ComponentId> =
            self.identifier.registered_components().copied().collect();
        for component_id in component_ids {
            self.refresh_forward_attribute(&component_id)?;
        }
        Ok(())
    }

    fn refresh_forward_attribute(&mut self, component_id: &ComponentId) -> Result<()> {
        let table = self
            .identifier
            .forward
            .get(component_id)
            .ok_or(Error::ComponentNotRegistered(*component_id))?;
        let attributes = match component_id.component_type() {
            ComponentType::Corner => self
                .corners
                .get_mut(component_id)
                .map(|c| c.mesh.vertex_attributes_mut()),
            ComponentType::Line => self
                .lines
                .get_mut(component_id)
                .map(|l| l.mesh.vertex_attributes_mut()),
            ComponentType::Surface => self
                .surfaces
                .get_mut(component_id)
                .map(|s| s.mesh.vertex_attributes_mut()),
            ComponentType::Block => self
                .blocks
                .get_mut(component_id)
                .map(|b| b.mesh.vertex_attributes_mut()),
        }
        .ok_or(Error::ComponentNotFound(*component_id))?;
        attributes.find_or_create_attribute(UNIQUE_VERTICES_ATTRIBUTE, NO_ID)?;
        let nb_entries = attributes.nb_entries();
        if table.len() != nb_entries as usize {
            tracing::warn!(
                component = %component_id,
                table_len = table.len(),
                nb_vertices = nb_entries,
                "registry table does not match the component mesh size"
            );
        }
        for (vertex, &unique_id) in table.iter().enumerate() {
            if (vertex as u32) < nb_entries {
                attributes.set_attribute_value(
                    UNIQUE_VERTICES_ATTRIBUTE,
                    vertex as u32,
                    unique_id,
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brep_lite_geometry::{Point2, Point3};

    fn corner_mesh_2d() -> PointSet<2> {
        let mut mesh = PointSet::new();
        mesh.create_point(Point2::new(0.0, 0.0));
        mesh
    }

    fn line_mesh_2d() -> EdgedCurve<2> {
        let mut mesh = EdgedCurve::new();
        let v0 = mesh.create_point(Point2::new(0.0, 0.0));
        let v1 = mesh.create_point(Point2::new(1.0, 0.0));
        mesh.create_edge(v0, v1).unwrap();
        mesh
    }

    #[test]
    fn components_register_on_add_and_unregister_on_remove() {
        let mut model = Section::new();
        let corner = model.add_corner(corner_mesh_2d()).unwrap();
        let line = model.add_line(line_mesh_2d()).unwrap();

        assert_eq!(model.nb_corners(), 1);
        assert_eq!(model.nb_lines(), 1);
        assert!(model.identifier.is_registered(&corner));
        assert!(model.identifier.is_registered(&line));

        model.remove_corner(&corner).unwrap();
        assert_eq!(model.nb_corners(), 0);
        assert!(!model.identifier.is_registered(&corner));
        assert!(matches!(
            model.corner(&corner),
            Err(Error::ComponentNotFound(_))
        ));
    }

    #[test]
    fn set_unique_vertex_through_the_model() {
        let mut model = Section::new();
        let corner = model.add_corner(corner_mesh_2d()).unwrap();
        let line = model.add_line(line_mesh_2d()).unwrap();

        let unique = model.create_unique_vertex();
        model
            .set_unique_vertex(MeshComponentVertex::new(corner, 0), unique)
            .unwrap();
        model
            .set_unique_vertex(MeshComponentVertex::new(line, 0), unique)
            .unwrap();

        assert_eq!(
            model
                .unique_vertex(&MeshComponentVertex::new(line, 0))
                .unwrap(),
            unique
        );
        assert_eq!(model.mesh_component_vertices(unique).unwrap().len(), 2);
    }

    #[test]
    fn relations_require_existing_components() {
        let mut model = Section::new();
        let line = model.add_line(line_mesh_2d()).unwrap();
        let ghost = ComponentId::new(ComponentType::Surface);

        assert!(matches!(
            model.add_internal_relation(line, ghost),
            Err(Error::ComponentNotFound(_))
        ));
    }

    #[test]
    fn internal_lines_filters_by_type() {
        let mut model = Section::new();
        let line = model.add_line(line_mesh_2d()).unwrap();
        let corner = model.add_corner(corner_mesh_2d()).unwrap();
        let mut surface_mesh = SurfaceMesh::<2>::new();
        surface_mesh.create_point(Point2::new(0.0, 0.0));
        surface_mesh.create_point(Point2::new(1.0, 0.0));
        surface_mesh.create_point(Point2::new(0.0, 1.0));
        surface_mesh.create_polygon(&[0, 1, 2]).unwrap();
        let surface = model.add_surface(surface_mesh).unwrap();

        model.add_internal_relation(line, surface).unwrap();
        model.add_internal_relation(corner, surface).unwrap();

        assert_eq!(model.internal_lines(&surface), [line]);
    }

    #[test]
    fn registry_round_trip_through_the_model() {
        let mut model = BRep::new();
        let mut mesh = PointSet::<3>::new();
        mesh.create_point(Point3::new(0.0, 0.0, 0.0));
        let corner = model.add_corner(mesh).unwrap();

        let unique = model.create_unique_vertex();
        model
            .set_unique_vertex(MeshComponentVertex::new(corner, 0), unique)
            .unwrap();

        let directory = tempfile::tempdir().unwrap();
        model.save_unique_vertices(directory.path()).unwrap();

        // Forget the mapping, then restore it from disk.
        let replacement = model.create_unique_vertex();
        model
            .set_unique_vertex(MeshComponentVertex::new(corner, 0), replacement)
            .unwrap();

        model.load_unique_vertices(directory.path()).unwrap();
        assert_eq!(
            model
                .unique_vertex(&MeshComponentVertex::new(corner, 0))
                .unwrap(),
            unique
        );
        let attribute = model
            .corner(&corner)
            .unwrap()
            .mesh
            .vertex_attributes()
            .attribute_value::<u32>(UNIQUE_VERTICES_ATTRIBUTE, 0)
            .unwrap();
        assert_eq!(attribute, unique);
    }

    #[test]
    fn loading_registry_for_missing_component_fails() {
        let mut source = BRep::new();
        let mut mesh = PointSet::<3>::new();
        mesh.create_point(Point3::new(0.0, 0.0, 0.0));
        source.add_corner(mesh).unwrap();

        let directory = tempfile::tempdir().unwrap();
        source.save_unique_vertices(directory.path()).unwrap();

        let mut other = BRep::new();
        assert!(matches!(
            other.load_unique_vertices(directory.path()),
            Err(Error::ComponentNotFound(_))
        ));
    }
}
