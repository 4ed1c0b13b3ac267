// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Incidence and embedding relations between components.
//!
//! Two relation kinds tie a model together:
//!
//! - **boundary**: a component bounds another (a line bounds a surface). The
//!   bounded side is the *incidence* of the boundary.
//! - **internal**: a component lies inside another without bounding it (an
//!   internal line embedded in a surface). The enclosing side is the
//!   *embedding* of the internal component.
//!
//! Both directions are indexed, so "what does this line bound" and "what are
//! this surface's boundaries" are equally cheap.

use rustc_hash::FxHashMap;

use crate::component::ComponentId;

/// Bidirectional index of boundary and internal relations.
#[derive(Debug, Default)]
pub struct RelationGraph {
    /// boundary component → components it bounds
    incidences: FxHashMap<ComponentId, Vec<ComponentId>>,
    /// component → its boundary components
    boundaries: FxHashMap<ComponentId, Vec<ComponentId>>,
    /// internal component → components embedding it
    embeddings: FxHashMap<ComponentId, Vec<ComponentId>>,
    /// component → its internal components
    internals: FxHashMap<ComponentId, Vec<ComponentId>>,
}

fn push_unique(map: &mut FxHashMap<ComponentId, Vec<ComponentId>>, key: ComponentId, value: ComponentId) {
    let entry = map.entry(key).or_default();
    if !entry.contains(&value) {
        entry.push(value);
    }
}

fn as_slice<'a>(
    map: &'a FxHashMap<ComponentId, Vec<ComponentId>>,
    key: &ComponentId,
) -> &'a [ComponentId] {
    map.get(key).map_or(&[], Vec::as_slice)
}

impl RelationGraph {
    /// Creates an empty relation graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `boundary` bounds `incidence`.
    pub fn add_boundary_relation(&mut self, boundary: ComponentId, incidence: ComponentId) {
        push_unique(&mut self.incidences, boundary, incidence);
        push_unique(&mut self.boundaries, incidence, boundary);
    }

    /// Records that `internal` is embedded in `embedding`.
    pub fn add_internal_relation(&mut self, internal: ComponentId, embedding: ComponentId) {
        push_unique(&mut self.embeddings, internal, embedding);
        push_unique(&mut self.internals, embedding, internal);
    }

    /// Number of components this component bounds.
    pub fn nb_incidences(&self, component: &ComponentId) -> u32 {
        as_slice(&self.incidences, component).len() as u32
    }

    /// Number of components this component is embedded in.
    pub fn nb_embeddings(&self, component: &ComponentId) -> u32 {
        as_slice(&self.embeddings, component).len() as u32
    }

    /// Components bounded by this component.
    pub fn incidences_of(&self, component: &ComponentId) -> &[ComponentId] {
        as_slice(&self.incidences, component)
    }

    /// Boundary components of this component.
    pub fn boundaries_of(&self, component: &ComponentId) -> &[ComponentId] {
        as_slice(&self.boundaries, component)
    }

    /// Components embedding this component.
    pub fn embeddings_of(&self, component: &ComponentId) -> &[ComponentId] {
        as_slice(&self.embeddings, component)
    }

    /// Internal components of this component.
    pub fn internals_of(&self, component: &ComponentId) -> &[ComponentId] {
        as_slice(&self.internals, component)
    }

    /// Removes every relation the component participates in.
    pub fn remove_component(&mut self, component: &ComponentId) {
        for map in [
            &mut self.incidences,
            &mut self.boundaries,
            &mut self.embeddings,
            &mut self.internals,
        ] {
            map.remove(component);
            for values in map.values_mut() {
                values.retain(|id| id != component);
            }
        }
    }
}
