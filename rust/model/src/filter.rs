// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Removal of uncoupled components.
//!
//! A component participating in no incidence and no embedding relation is
//! disconnected from the model and carries no structure. The filter removes
//! such components collection by collection, in dependency order: surfaces
//! (in 3D models, where blocks are the top level), then lines, then corners.
//! Removing a surface frees its lines before the line pass runs, so one call
//! catches the cascade within that order. The filter is single-pass by
//! design: orphans only revealed by a later pass, like a corner freed by a
//! line that a *previous call* removed, need the caller to invoke it again.

use crate::component::ComponentId;
use crate::error::Result;
use crate::model::Model;

/// Ids removed by one filter call, per collection.
#[derive(Debug, Default)]
pub struct FilterResult {
    pub removed_surfaces: Vec<ComponentId>,
    pub removed_lines: Vec<ComponentId>,
    pub removed_corners: Vec<ComponentId>,
}

impl FilterResult {
    /// Total number of removed components.
    pub fn nb_removed(&self) -> usize {
        self.removed_surfaces.len() + self.removed_lines.len() + self.removed_corners.len()
    }
}

fn uncoupled<'a, const D: usize>(
    model: &Model<D>,
    components: impl Iterator<Item = &'a ComponentId>,
) -> Vec<ComponentId> {
    components
        .filter(|id| model.nb_incidences(id) == 0 && model.nb_embeddings(id) == 0)
        .copied()
        .collect()
}

/// Removes every component with zero incidences and zero embeddings.
///
/// Surfaces are only filtered in 3D models: in a section, surfaces are the
/// top-level components and legitimately bound nothing.
pub fn filter_uncoupled_components<const D: usize>(model: &mut Model<D>) -> Result<FilterResult> {
    let mut result = FilterResult::default();

    if D == 3 {
        result.removed_surfaces = uncoupled(model, model.surfaces.keys());
        for id in &result.removed_surfaces {
            model.remove_surface(id)?;
        }
    }

    result.removed_lines = uncoupled(model, model.lines.keys());
    for id in &result.removed_lines {
        model.remove_line(id)?;
    }

    result.removed_corners = uncoupled(model, model.corners.keys());
    for id in &result.removed_corners {
        model.remove_corner(id)?;
    }

    if result.nb_removed() > 0 {
        tracing::debug!(
            nb_surfaces = result.removed_surfaces.len(),
            nb_lines = result.removed_lines.len(),
            nb_corners = result.removed_corners.len(),
            "filtered uncoupled components"
        );
    }
    Ok(result)
}
