// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed component identities.
//!
//! Every topological component gets a [`ComponentId`]: a fresh v4 uuid tagged
//! with the component kind. Ids are stable for the lifetime of a model and
//! survive serialization, which is why they key the registry rather than any
//! in-memory handle.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of a topological component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentType {
    Corner = 0,
    Line = 1,
    Surface = 2,
    Block = 3,
}

impl ComponentType {
    /// Returns the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Corner => "Corner",
            ComponentType::Line => "Line",
            ComponentType::Surface => "Surface",
            ComponentType::Block => "Block",
        }
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity of one component: its kind plus a unique uuid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentId {
    component_type: ComponentType,
    id: Uuid,
}

impl ComponentId {
    /// Creates a fresh identity of the given kind.
    pub fn new(component_type: ComponentType) -> Self {
        Self {
            component_type,
            id: Uuid::new_v4(),
        }
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.component_type, self.id)
    }
}

/// One vertex inside one component's mesh.
///
/// Many component vertices may identify to the same unique vertex; each
/// component vertex identifies to at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshComponentVertex {
    pub component_id: ComponentId,
    pub vertex: u32,
}

impl MeshComponentVertex {
    pub fn new(component_id: ComponentId, vertex: u32) -> Self {
        Self {
            component_id,
            vertex,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_distinct() {
        let a = ComponentId::new(ComponentType::Line);
        let b = ComponentId::new(ComponentType::Line);
        assert_ne!(a, b);
        assert_eq!(a.component_type(), ComponentType::Line);
    }

    #[test]
    fn type_names() {
        assert_eq!(ComponentType::Corner.as_str(), "Corner");
        assert_eq!(ComponentType::Line.as_str(), "Line");
        assert_eq!(ComponentType::Surface.as_str(), "Surface");
        assert_eq!(ComponentType::Block.as_str(), "Block");
    }

    #[test]
    fn component_vertex_equality_is_by_value() {
        let id = ComponentId::new(ComponentType::Surface);
        assert_eq!(
            MeshComponentVertex::new(id, 3),
            MeshComponentVertex::new(id, 3)
        );
        assert_ne!(
            MeshComponentVertex::new(id, 3),
            MeshComponentVertex::new(id, 4)
        );
    }
}
