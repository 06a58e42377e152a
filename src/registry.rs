//! Registration-time table of resource types and their relationship fields.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;
use crate::types::RelationshipField;

fn default_id_field() -> String {
    "id".to_string()
}

/// Everything known about one registered resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInformation {
    /// JSON:API type name, e.g. `authors`.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Class name carried by resource objects of this type, e.g. `Author`.
    pub class: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default)]
    pub relationships: Vec<RelationshipField>,
}

impl ResourceInformation {
    pub fn new(resource_type: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            class: class.into(),
            id_field: default_id_field(),
            relationships: Vec::new(),
        }
    }

    pub fn id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn relationship(mut self, field: RelationshipField) -> Self {
        self.relationships.push(field);
        self
    }

    /// Fill in wire names left blank in a document.
    fn normalize(&mut self) {
        for field in &mut self.relationships {
            if field.json_name.is_empty() {
                field.json_name = field.underlying_name.clone();
            }
        }
    }
}

/// Lookup of resource information by type name and by class name.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    entries: Vec<ResourceInformation>,
    by_type: HashMap<String, usize>,
    by_class: HashMap<String, usize>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource type.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError` if the type name or class is already registered.
    pub fn register(&mut self, mut information: ResourceInformation) -> Result<(), DocumentError> {
        if self.by_type.contains_key(&information.resource_type) {
            return Err(DocumentError::DuplicateType {
                resource_type: information.resource_type,
            });
        }
        if self.by_class.contains_key(&information.class) {
            return Err(DocumentError::DuplicateClass {
                class: information.class,
            });
        }

        information.normalize();
        let index = self.entries.len();
        self.by_type
            .insert(information.resource_type.clone(), index);
        self.by_class.insert(information.class.clone(), index);
        self.entries.push(information);
        Ok(())
    }

    pub fn get_entry(&self, resource_type: &str) -> Option<&ResourceInformation> {
        self.by_type.get(resource_type).map(|&i| &self.entries[i])
    }

    pub fn get_entry_by_class(&self, class: &str) -> Option<&ResourceInformation> {
        self.by_class.get(class).map(|&i| &self.entries[i])
    }

    /// Relationship fields of a type; empty when the type is unknown.
    pub fn relationship_fields(&self, resource_type: &str) -> &[RelationshipField] {
        self.get_entry(resource_type)
            .map(|entry| entry.relationships.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
