// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BRep-Lite Model
//!
//! Boundary-representation models made of topological components (corners,
//! lines, surfaces, blocks), each carrying its own mesh, linked by incidence
//! and embedding relations and identified through a model-wide unique-vertex
//! registry.
//!
//! The [`VertexIdentifier`] is the heart of the crate: it maintains the
//! bidirectional mapping between per-component mesh vertices and unique
//! vertices under every structural mutation: component registration and
//! removal, vertex reassignment, surface splitting. The algorithms on top
//! ([`cut_all_surfaces`], [`filter_uncoupled_components`]) go through it to
//! keep the mapping consistent.

pub mod component;
pub mod cut;
pub mod error;
pub mod filter;
pub mod identifier;
pub mod model;
pub mod relations;
pub mod serialization;

pub use component::{ComponentId, ComponentType, MeshComponentVertex};
pub use cut::{cut_all_surfaces, cut_surface, SplitVertex};
pub use error::{Error, Result};
pub use filter::{filter_uncoupled_components, FilterResult};
pub use identifier::{VertexIdentifier, NO_ID, UNIQUE_VERTICES_ATTRIBUTE};
pub use model::{BRep, Block, Corner, Line, Model, Section, Surface};
pub use relations::RelationGraph;
