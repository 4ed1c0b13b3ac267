// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bare vertex sets: a count of vertices plus their attributes, no geometry.
//!
//! This is the lightest mesh there is. The identification layer uses one as
//! its unique-vertex pseudo-mesh: vertices exist only to anchor attributes.

use crate::attributes::AttributeStore;
use crate::MeshVertices;

/// A set of vertices with attributes and nothing else.
#[derive(Debug, Default)]
pub struct VertexSet {
    attributes: AttributeStore,
}

impl VertexSet {
    /// Creates an empty vertex set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one vertex and returns its id.
    pub fn create_vertex(&mut self) -> u32 {
        self.create_vertices(1)
    }

    /// Appends `nb` vertices and returns the id of the first one.
    pub fn create_vertices(&mut self, nb: u32) -> u32 {
        let first = self.attributes.nb_entries();
        self.attributes.resize(first + nb);
        first
    }
}

impl MeshVertices for VertexSet {
    fn nb_vertices(&self) -> u32 {
        self.attributes.nb_entries()
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

    #[test]
    fn batch_creation_returns_first_id() {
        let mut set = VertexSet::new();
        assert_eq!(set.create_vertex(), 0);
        assert_eq!(set.create_vertices(3), 1);
        assert_eq!(set.nb_vertices(), 4);
    }

    #[test]
    fn attributes_grow_with_vertices() {
        let mut set = VertexSet::new();
        set.vertex_attributes_mut()
            .find_or_create_attribute("mark", 0u32)
            .unwrap();
        set.create_vertices(2);

        assert_eq!(
            set.vertex_attributes().attribute_value::<u32>("mark", 1).unwrap(),
            0
        );
    }
}
