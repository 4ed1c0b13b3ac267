// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for mesh operations.

/// Result type alias for mesh operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during mesh operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An attribute was accessed under a name that does not exist.
    #[error("attribute not found: {0:?}")]
    AttributeNotFound(String),

    /// An attribute exists but holds a different value type.
    #[error("attribute type mismatch: {0:?}")]
    AttributeTypeMismatch(String),

    /// An entry index is past the end of the store.
    #[error("entry {index} out of range: store has {nb_entries} entries")]
    EntryOutOfRange { index: u32, nb_entries: u32 },

    /// A vertex index is past the end of the mesh.
    #[error("vertex {vertex} out of range: mesh has {nb_vertices} vertices")]
    VertexOutOfRange { vertex: u32, nb_vertices: u32 },

    /// A polygon needs at least three vertices.
    #[error("polygon with {0} vertices is degenerate")]
    DegeneratePolygon(usize),
}
