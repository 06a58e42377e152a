//! Resource documents: a registry and a resource graph described in JSON.
//!
//! ```json
//! {
//!   "types": [
//!     { "type": "authors", "class": "Author",
//!       "relationships": [{ "name": "books" }] }
//!   ],
//!   "resources": [
//!     { "key": "a1", "class": "Author",
//!       "properties": { "id": 1, "books": [{ "ref": "b1" }] } }
//!   ]
//! }
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::LoadError;
use crate::graph::{GraphAccessor, ResourceGraph};
use crate::registry::{ResourceInformation, ResourceRegistry};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    #[serde(default)]
    types: Vec<ResourceInformation>,
    #[serde(default)]
    resources: Vec<RawResource>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawResource {
    key: String,
    class: String,
    #[serde(default)]
    properties: Map<String, Value>,
}

/// A registry together with the resource graph it types.
#[derive(Debug, Clone, Default)]
pub struct ResourceDocument {
    pub registry: ResourceRegistry,
    pub graph: ResourceGraph,
}

impl ResourceDocument {
    /// Build a document from its JSON form.
    ///
    /// Resources are added before any property is read, so references may
    /// point forwards and form cycles.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidDocument` for structurally invalid JSON and
    /// `LoadError::Document` for duplicate registrations, duplicate keys or
    /// dangling references.
    pub fn from_value(value: &Value) -> Result<Self, LoadError> {
        let raw: RawDocument =
            serde_json::from_value(value.clone()).map_err(|e| LoadError::InvalidDocument {
                message: e.to_string(),
            })?;

        let mut registry = ResourceRegistry::new();
        for information in raw.types {
            registry.register(information)?;
        }

        let mut graph = ResourceGraph::new();
        let mut handles = Vec::with_capacity(raw.resources.len());
        for resource in &raw.resources {
            handles.push(graph.add(resource.key.clone(), resource.class.clone())?);
        }
        for (resource, handle) in raw.resources.iter().zip(handles) {
            graph.set_properties(handle, &resource.properties)?;
        }

        Ok(Self { registry, graph })
    }

    pub fn accessor(&self) -> GraphAccessor<'_> {
        GraphAccessor::new(&self.registry, &self.graph)
    }
}
