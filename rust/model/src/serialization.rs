// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary serialization of the unique-vertex registry.
//!
//! The registry is written to a single file named `vertices` inside a model's
//! save directory:
//!
//! 1. **Magic bytes**: `BLVX` (4 bytes)
//! 2. **Version**: `u32` little-endian (currently 1)
//! 3. **Flags**: `u32` little-endian, reserved
//! 4. **Payload**: bincode-encoded [`RegistrySnapshot`]
//!
//! Loading validates the header, decodes the payload and checks the snapshot
//! for structural consistency (table ranges, forward/reverse agreement)
//! before any state is installed. A truncated or corrupt file is rejected as
//! a whole; there is no partial load.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use brep_lite_mesh::MeshVertices;

use crate::component::{ComponentId, MeshComponentVertex};
use crate::error::{Error, Result};
use crate::identifier::{VertexIdentifier, COMPONENT_VERTICES_ATTRIBUTE, NO_ID};

/// Magic bytes identifying a registry file.
pub const REGISTRY_MAGIC: [u8; 4] = *b"BLVX";

/// Current registry format version.
pub const REGISTRY_VERSION: u32 = 1;

/// Name of the registry file inside a save directory.
pub const REGISTRY_FILENAME: &str = "vertices";

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct RegistrySnapshot {
    nb_unique_vertices: u32,
    /// Reverse lists, one per unique vertex.
    component_vertices: Vec<Vec<MeshComponentVertex>>,
    /// Forward tables keyed by component id, sorted by uuid for stable
    /// output.
    forward_tables: Vec<(ComponentId, Vec<u32>)>,
}

impl RegistrySnapshot {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.component_vertices.len() != self.nb_unique_vertices as usize {
            return Err(format!(
                "{} reverse lists for {} unique vertices",
                self.component_vertices.len(),
                self.nb_unique_vertices
            ));
        }
        for (component_id, table) in &self.forward_tables {
            for (vertex, &unique_id) in table.iter().enumerate() {
                if unique_id != NO_ID && unique_id >= self.nb_unique_vertices {
                    return Err(format!(
                        "component {component_id} maps vertex {vertex} to unknown unique \
                         vertex {unique_id}"
                    ));
                }
            }
        }
        for (unique_id, vertices) in self.component_vertices.iter().enumerate() {
            for component_vertex in vertices {
                let Some((_, table)) = self
                    .forward_tables
                    .iter()
                    .find(|(id, _)| *id == component_vertex.component_id)
                else {
                    return Err(format!(
                        "unique vertex {unique_id} references unregistered component {}",
                        component_vertex.component_id
                    ));
                };
                let mapped = table.get(component_vertex.vertex as usize).copied();
                if mapped != Some(unique_id as u32) {
                    return Err(format!(
                        "unique vertex {unique_id} and component {} disagree on vertex {}",
                        component_vertex.component_id, component_vertex.vertex
                    ));
                }
            }
        }
        Ok(())
    }
}

fn write_header<W: Write>(writer: &mut W) -> std::io::Result<()> {
    writer.write_all(&REGISTRY_MAGIC)?;
    writer.write_all(&REGISTRY_VERSION.to_le_bytes())?;
    writer.write_all(&0u32.to_le_bytes())?;
    Ok(())
}

fn read_and_check_header<R: Read>(reader: &mut R, path: &Path) -> Result<()> {
    let mut magic = [0u8; 4];
    let mut version = [0u8; 4];
    let mut flags = [0u8; 4];
    for buffer in [&mut magic, &mut version, &mut flags] {
        reader.read_exact(buffer).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }
    if magic != REGISTRY_MAGIC {
        return Err(Error::InvalidRegistry {
            path: path.to_path_buf(),
            reason: format!("bad magic bytes {magic:?}"),
        });
    }
    let version = u32::from_le_bytes(version);
    if version != REGISTRY_VERSION {
        return Err(Error::InvalidRegistry {
            path: path.to_path_buf(),
            reason: format!("unsupported version {version}"),
        });
    }
    Ok(())
}

impl VertexIdentifier {
    /// Writes the whole registry to `directory/vertices` and returns the file
    /// path.
    pub fn save(&self, directory: &Path) -> Result<PathBuf> {
        let path = directory.join(REGISTRY_FILENAME);
        let snapshot = self.to_snapshot()?;
        let file = File::create(&path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        write_header(&mut writer).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        bincode::serialize_into(&mut writer, &snapshot).map_err(|e| Error::InvalidRegistry {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        writer.flush().map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Reads a registry back from `directory/vertices`.
    ///
    /// # Errors
    ///
    /// `Io` when the file cannot be opened or read, `InvalidRegistry` when
    /// the header, payload or cross-table consistency checks fail.
    pub fn load(directory: &Path) -> Result<Self> {
        let path = directory.join(REGISTRY_FILENAME);
        let file = File::open(&path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        read_and_check_header(&mut reader, &path)?;
        let snapshot: RegistrySnapshot =
            bincode::deserialize_from(&mut reader).map_err(|e| Error::InvalidRegistry {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        snapshot
            .validate()
            .map_err(|reason| Error::InvalidRegistry {
                path: path.clone(),
                reason,
            })?;
        Self::from_snapshot(snapshot)
    }

    fn to_snapshot(&self) -> Result<RegistrySnapshot> {
        let nb_unique_vertices = self.nb_unique_vertices();
        let mut component_vertices = Vec::with_capacity(nb_unique_vertices as usize);
        for unique_id in 0..nb_unique_vertices {
            component_vertices.push(self.mesh_component_vertices(unique_id)?.to_vec());
        }
        let mut forward_tables: Vec<(ComponentId, Vec<u32>)> = self
            .forward
            .iter()
            .map(|(id, table)| (*id, table.clone()))
            .collect();
        forward_tables.sort_by_key(|(id, _)| id.id());
        Ok(RegistrySnapshot {
            nb_unique_vertices,
            component_vertices,
            forward_tables,
        })
    }

    fn from_snapshot(snapshot: RegistrySnapshot) -> Result<Self> {
        let mut identifier = Self::new();
        identifier
            .unique_vertices
            .create_vertices(snapshot.nb_unique_vertices);
        for (unique_id, vertices) in snapshot.component_vertices.into_iter().enumerate() {
            identifier
                .unique_vertices
                .vertex_attributes_mut()
                .set_attribute_value(COMPONENT_VERTICES_ATTRIBUTE, unique_id as u32, vertices)?;
        }
        identifier.forward = snapshot.forward_tables.into_iter().collect();
        Ok(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentType;
    use brep_lite_geometry::Point3;
    use brep_lite_mesh::{MeshVertices, PointSet};

    fn populated_identifier() -> (VertexIdentifier, ComponentId, ComponentId) {
        let mut identifier = VertexIdentifier::new();
        let mut line_mesh = PointSet::<3>::new();
        let mut corner_mesh = PointSet::<3>::new();
        for i in 0..3 {
            line_mesh.create_point(Point3::new(f64::from(i), 0.0, 0.0));
        }
        corner_mesh.create_point(Point3::new(0.0, 0.0, 0.0));

        let line = ComponentId::new(ComponentType::Line);
        let corner = ComponentId::new(ComponentType::Corner);
        identifier.register_component(line, &mut line_mesh).unwrap();
        identifier
            .register_component(corner, &mut corner_mesh)
            .unwrap();

        let first = identifier.create_unique_vertices(3);
        for vertex in 0..3 {
            identifier
                .set_unique_vertex(
                    MeshComponentVertex::new(line, vertex),
                    first + vertex,
                    line_mesh.vertex_attributes_mut(),
                )
                .unwrap();
        }
        identifier
            .set_unique_vertex(
                MeshComponentVertex::new(corner, 0),
                first,
                corner_mesh.vertex_attributes_mut(),
            )
            .unwrap();
        (identifier, line, corner)
    }

    #[test]
    fn save_load_round_trip() {
        let (identifier, line, corner) = populated_identifier();
        let directory = tempfile::tempdir().unwrap();

        let path = identifier.save(directory.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), REGISTRY_FILENAME);

        let restored = VertexIdentifier::load(directory.path()).unwrap();
        assert_eq!(restored.nb_unique_vertices(), 3);
        assert!(restored.is_registered(&line));
        assert!(restored.is_registered(&corner));
        assert_eq!(
            restored
                .unique_vertex(&MeshComponentVertex::new(corner, 0))
                .unwrap(),
            0
        );
        let mut vertices = restored.mesh_component_vertices(0).unwrap().to_vec();
        vertices.sort_by_key(|v| v.component_id.id());
        let mut expected = vec![
            MeshComponentVertex::new(line, 0),
            MeshComponentVertex::new(corner, 0),
        ];
        expected.sort_by_key(|v| v.component_id.id());
        assert_eq!(vertices, expected);
    }

    #[test]
    fn empty_registry_round_trip() {
        let identifier = VertexIdentifier::new();
        let directory = tempfile::tempdir().unwrap();
        identifier.save(directory.path()).unwrap();

        let restored = VertexIdentifier::load(directory.path()).unwrap();
        assert_eq!(restored.nb_unique_vertices(), 0);
        assert_eq!(restored.registered_components().count(), 0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let directory = tempfile::tempdir().unwrap();
        assert!(matches!(
            VertexIdentifier::load(directory.path()),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let directory = tempfile::tempdir().unwrap();
        std::fs::write(directory.path().join(REGISTRY_FILENAME), b"NOPE12345678").unwrap();

        assert!(matches!(
            VertexIdentifier::load(directory.path()),
            Err(Error::InvalidRegistry { .. })
        ));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let directory = tempfile::tempdir().unwrap();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&REGISTRY_MAGIC);
        bytes.extend_from_slice(&99u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        std::fs::write(directory.path().join(REGISTRY_FILENAME), bytes).unwrap();

        let result = VertexIdentifier::load(directory.path());
        assert!(matches!(result, Err(Error::InvalidRegistry { .. })));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let (identifier, _, _) = populated_identifier();
        let directory = tempfile::tempdir().unwrap();
        let path = identifier.save(directory.path()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 5]).unwrap();

        assert!(matches!(
            VertexIdentifier::load(directory.path()),
            Err(Error::InvalidRegistry { .. })
        ));
    }

    #[test]
    fn inconsistent_snapshot_is_rejected() {
        // A reverse list pointing at a component with no forward table.
        let snapshot = RegistrySnapshot {
            nb_unique_vertices: 1,
            component_vertices: vec![vec![MeshComponentVertex::new(
                ComponentId::new(ComponentType::Line),
                0,
            )]],
            forward_tables: Vec::new(),
        };
        assert!(snapshot.validate().is_err());
    }
}
