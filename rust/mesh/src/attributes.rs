// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dense-indexed typed attribute storage.
//!
//! An [`AttributeStore`] holds any number of named attributes over the same
//! dense index space (one entry per mesh vertex, say). Each attribute is a
//! plain `Vec<T>` behind type erasure; the store grows every attribute in
//! lockstep when the mesh gains entries, filling new slots with the
//! attribute's default value.
//!
//! Accessing an attribute under the wrong type is an error, not a panic:
//! callers own the naming discipline, the store only enforces it.

use std::any::Any;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

/// Value types storable as attributes.
pub trait AttributeValue: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> AttributeValue for T {}

trait ErasedAttribute: Send + Sync {
    fn resize(&mut self, nb_entries: usize);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct TypedAttribute<T: AttributeValue> {
    values: Vec<T>,
    default: T,
}

impl<T: AttributeValue> ErasedAttribute for TypedAttribute<T> {
    fn resize(&mut self, nb_entries: usize) {
        self.values.resize(nb_entries, self.default.clone());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A set of named, typed attributes sharing one dense index space.
#[derive(Default)]
pub struct AttributeStore {
    nb_entries: u32,
    attributes: FxHashMap<String, Box<dyn ErasedAttribute>>,
}

impl std::fmt::Debug for AttributeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("AttributeStore")
            .field("nb_entries", &self.nb_entries)
            .field("attributes", &names)
            .finish()
    }
}

impl AttributeStore {
    /// Creates an empty store with zero entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries every attribute covers.
    pub fn nb_entries(&self) -> u32 {
        self.nb_entries
    }

    /// Resizes every attribute to `nb_entries`, filling new slots with each
    /// attribute's default.
    pub fn resize(&mut self, nb_entries: u32) {
        self.nb_entries = nb_entries;
        for attribute in self.attributes.values_mut() {
            attribute.resize(nb_entries as usize);
        }
    }

    /// Returns `true` if an attribute with this name exists, whatever its type.
    pub fn attribute_exists(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Creates the attribute if absent, filled with `default`. An existing
    /// attribute of the same type keeps its values.
    ///
    /// # Errors
    ///
    /// Returns an error if an attribute with this name exists under another
    /// value type.
    pub fn find_or_create_attribute<T: AttributeValue>(
        &mut self,
        name: &str,
        default: T,
    ) -> Result<()> {
        if let Some(existing) = self.attributes.get(name) {
            if existing.as_any().downcast_ref::<TypedAttribute<T>>().is_none() {
                return Err(Error::AttributeTypeMismatch(name.to_owned()));
            }
            return Ok(());
        }
        let values = vec![default.clone(); self.nb_entries as usize];
        self.attributes
            .insert(name.to_owned(), Box::new(TypedAttribute { values, default }));
        Ok(())
    }

    /// Returns a copy of the value at `index`.
    pub fn attribute_value<T: AttributeValue>(&self, name: &str, index: u32) -> Result<T> {
        self.attribute_ref(name, index).cloned()
    }

    /// Returns a reference to the value at `index`.
    pub fn attribute_ref<T: AttributeValue>(&self, name: &str, index: u32) -> Result<&T> {
        let attribute = self.typed::<T>(name)?;
        attribute
            .values
            .get(index as usize)
            .ok_or(Error::EntryOutOfRange {
                index,
                nb_entries: self.nb_entries,
            })
    }

    /// Overwrites the value at `index`.
    pub fn set_attribute_value<T: AttributeValue>(
        &mut self,
        name: &str,
        index: u32,
        value: T,
    ) -> Result<()> {
        self.modify_attribute_value(name, index, |slot| *slot = value)
    }

    /// Edits the value at `index` in place.
    pub fn modify_attribute_value<T: AttributeValue>(
        &mut self,
        name: &str,
        index: u32,
        edit: impl FnOnce(&mut T),
    ) -> Result<()> {
        let nb_entries = self.nb_entries;
        let attribute = self.typed_mut::<T>(name)?;
        let slot = attribute
            .values
            .get_mut(index as usize)
            .ok_or(Error::EntryOutOfRange { index, nb_entries })?;
        edit(slot);
        Ok(())
    }

    /// Removes the attribute. Returns `false` if no attribute had this name.
    pub fn delete_attribute(&mut self, name: &str) -> bool {
        self.attributes.remove(name).is_some()
    }

    fn typed<T: AttributeValue>(&self, name: &str) -> Result<&TypedAttribute<T>> {
        let attribute = self
            .attributes
            .get(name)
            .ok_or_else(|| Error::AttributeNotFound(name.to_owned()))?;
        attribute
            .as_any()
            .downcast_ref()
            .ok_or_else(|| Error::AttributeTypeMismatch(name.to_owned()))
    }

    fn typed_mut<T: AttributeValue>(&mut self, name: &str) -> Result<&mut TypedAttribute<T>> {
        let attribute = self
            .attributes
            .get_mut(name)
            .ok_or_else(|| Error::AttributeNotFound(name.to_owned()))?;
        attribute
            .as_any_mut()
            .downcast_mut()
            .ok_or_else(|| Error::AttributeTypeMismatch(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_read_back() {
        let mut store = AttributeStore::new();
        store.resize(3);
        store.find_or_create_attribute("weight", 1.5f64).unwrap();

        assert!(store.attribute_exists("weight"));
        assert_eq!(store.attribute_value::<f64>("weight", 0).unwrap(), 1.5);

        store.set_attribute_value("weight", 1, 4.0f64).unwrap();
        assert_eq!(store.attribute_value::<f64>("weight", 1).unwrap(), 4.0);
        assert_eq!(store.attribute_value::<f64>("weight", 2).unwrap(), 1.5);
    }

    #[test]
    fn find_keeps_existing_values() {
        let mut store = AttributeStore::new();
        store.resize(2);
        store.find_or_create_attribute("id", 0u32).unwrap();
        store.set_attribute_value("id", 0, 7u32).unwrap();

        // Second call with a different default must not reset anything.
        store.find_or_create_attribute("id", 99u32).unwrap();
        assert_eq!(store.attribute_value::<u32>("id", 0).unwrap(), 7);
        assert_eq!(store.attribute_value::<u32>("id", 1).unwrap(), 0);
    }

    #[test]
    fn type_mismatch_is_an_error() {
        let mut store = AttributeStore::new();
        store.find_or_create_attribute("id", 0u32).unwrap();

        assert!(matches!(
            store.find_or_create_attribute("id", 0.0f64),
            Err(Error::AttributeTypeMismatch(_))
        ));
        assert!(matches!(
            store.attribute_value::<f64>("id", 0),
            Err(Error::AttributeTypeMismatch(_))
        ));
    }

    #[test]
    fn missing_attribute_is_an_error() {
        let store = AttributeStore::new();
        assert!(matches!(
            store.attribute_value::<u32>("nope", 0),
            Err(Error::AttributeNotFound(_))
        ));
    }

    #[test]
    fn out_of_range_entry() {
        let mut store = AttributeStore::new();
        store.resize(1);
        store.find_or_create_attribute("id", 0u32).unwrap();

        assert!(matches!(
            store.attribute_value::<u32>("id", 5),
            Err(Error::EntryOutOfRange { index: 5, .. })
        ));
    }

    #[test]
    fn resize_fills_with_default() {
        let mut store = AttributeStore::new();
        store.find_or_create_attribute("tag", -1i64).unwrap();
        store.resize(4);

        assert_eq!(store.attribute_value::<i64>("tag", 3).unwrap(), -1);
    }

    #[test]
    fn delete_attribute() {
        let mut store = AttributeStore::new();
        store.find_or_create_attribute("tag", 0u8).unwrap();

        assert!(store.delete_attribute("tag"));
        assert!(!store.attribute_exists("tag"));
        assert!(!store.delete_attribute("tag"));
    }

    #[test]
    fn vector_valued_attributes() {
        let mut store = AttributeStore::new();
        store.resize(2);
        store
            .find_or_create_attribute("links", Vec::<u32>::new())
            .unwrap();
        store
            .modify_attribute_value("links", 0, |links: &mut Vec<u32>| links.push(42))
            .unwrap();

        assert_eq!(store.attribute_ref::<Vec<u32>>("links", 0).unwrap(), &[42]);
        assert!(store.attribute_ref::<Vec<u32>>("links", 1).unwrap().is_empty());
    }
}
