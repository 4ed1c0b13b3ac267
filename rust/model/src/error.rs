// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for model operations.

use std::path::PathBuf;

use crate::component::ComponentId;

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during model operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An operation was called in a state it forbids. Fatal to the calling
    /// operation, never retried.
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// A component id does not belong to this model.
    #[error("component not found: {0}")]
    ComponentNotFound(ComponentId),

    /// A component was used with the identification layer before being
    /// registered.
    #[error("component not registered: {0}")]
    ComponentNotRegistered(ComponentId),

    /// A unique vertex id past the registered id space.
    #[error("unique vertex {0} does not exist")]
    UniqueVertexNotFound(u32),

    /// An underlying mesh operation failed.
    #[error(transparent)]
    Mesh(#[from] brep_lite_mesh::Error),

    /// A registry file could not be opened, read or written.
    #[error("cannot access registry file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A registry file is corrupt, truncated or structurally inconsistent.
    #[error("invalid registry file {path:?}: {reason}")]
    InvalidRegistry { path: PathBuf, reason: String },
}
