//! In-memory resource graph and its metadata accessor.
//!
//! Resources live in an arena and refer to each other by [`NodeId`], so a
//! cyclic object graph is just a set of indices. Object identity is the
//! arena slot: two nodes with the same type and id are still distinct objects.

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::{DocumentError, ExtractError};
use crate::metadata::{Related, ResourceMetadata};
use crate::registry::{ResourceInformation, ResourceRegistry};
use crate::types::{json_type_name, RelationshipField};

/// Key of a relationship reference object: `{ "ref": "<resource key>" }`.
pub const REF_KEY: &str = "ref";

/// Identity handle of a resource within a [`ResourceGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A property value held by a resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Value(Value),
    One(NodeId),
    Many(Vec<NodeId>),
}

/// A resource object: its class and its properties.
#[derive(Debug, Clone)]
pub struct Node {
    pub key: String,
    pub class: String,
    pub properties: HashMap<String, Property>,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    nodes: Vec<Node>,
    keys: HashMap<String, NodeId>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource object of the given class.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::DuplicateKey` if `key` is already in use.
    pub fn add(
        &mut self,
        key: impl Into<String>,
        class: impl Into<String>,
    ) -> Result<NodeId, DocumentError> {
        let key = key.into();
        if self.keys.contains_key(&key) {
            return Err(DocumentError::DuplicateKey { key });
        }
        let id = NodeId(self.nodes.len());
        self.keys.insert(key.clone(), id);
        self.nodes.push(Node {
            key,
            class: class.into(),
            properties: HashMap::new(),
        });
        Ok(id)
    }

    /// Set a plain property value (use `Value::Null` for an empty relationship).
    pub fn set(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
        value: Value,
    ) -> Result<(), DocumentError> {
        self.put(node, name.into(), Property::Value(value))
    }

    /// Point a to-one relationship property at `target`.
    pub fn link(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
        target: NodeId,
    ) -> Result<(), DocumentError> {
        self.check(target)?;
        self.put(node, name.into(), Property::One(target))
    }

    /// Point a to-many relationship property at `targets`.
    pub fn link_many(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
        targets: impl IntoIterator<Item = NodeId>,
    ) -> Result<(), DocumentError> {
        let targets: Vec<NodeId> = targets.into_iter().collect();
        for &target in &targets {
            self.check(target)?;
        }
        self.put(node, name.into(), Property::Many(targets))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Handle of the resource stored under `key`.
    pub fn find(&self, key: &str) -> Option<NodeId> {
        self.keys.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Set properties from a JSON object, resolving `{"ref": ...}` references.
    ///
    /// An array made only of references becomes a to-many relationship.
    /// Anything else is stored as a plain value.
    pub fn set_properties(
        &mut self,
        node: NodeId,
        properties: &Map<String, Value>,
    ) -> Result<(), DocumentError> {
        self.check(node)?;
        for (name, value) in properties {
            let property = self.to_property(node, name, value)?;
            self.put(node, name.clone(), property)?;
        }
        Ok(())
    }

    fn to_property(
        &self,
        node: NodeId,
        name: &str,
        value: &Value,
    ) -> Result<Property, DocumentError> {
        if let Some(target) = reference_key(value) {
            return Ok(Property::One(self.resolve_ref(node, name, target)?));
        }

        if let Value::Array(items) = value {
            if !items.is_empty() && items.iter().all(|item| reference_key(item).is_some()) {
                let targets = items
                    .iter()
                    .filter_map(reference_key)
                    .map(|target| self.resolve_ref(node, name, target))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Property::Many(targets));
            }
        }

        Ok(Property::Value(value.clone()))
    }

    fn resolve_ref(&self, node: NodeId, name: &str, target: &str) -> Result<NodeId, DocumentError> {
        self.find(target)
            .ok_or_else(|| DocumentError::DanglingReference {
                from: self.nodes[node.0].key.clone(),
                property: name.to_string(),
                target: target.to_string(),
            })
    }

    fn put(&mut self, node: NodeId, name: String, property: Property) -> Result<(), DocumentError> {
        let entry = self
            .nodes
            .get_mut(node.0)
            .ok_or_else(|| DocumentError::UnknownNode {
                handle: node.to_string(),
            })?;
        entry.properties.insert(name, property);
        Ok(())
    }

    fn check(&self, node: NodeId) -> Result<(), DocumentError> {
        if node.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(DocumentError::UnknownNode {
                handle: node.to_string(),
            })
        }
    }
}

/// Target key of a `{"ref": "<key>"}` object.
fn reference_key(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get(REF_KEY).and_then(Value::as_str),
        _ => None,
    }
}

/// [`ResourceMetadata`] over a graph, typed through a registry.
#[derive(Debug, Clone, Copy)]
pub struct GraphAccessor<'a> {
    registry: &'a ResourceRegistry,
    graph: &'a ResourceGraph,
}

impl<'a> GraphAccessor<'a> {
    pub fn new(registry: &'a ResourceRegistry, graph: &'a ResourceGraph) -> Self {
        Self { registry, graph }
    }

    fn node(&self, resource: NodeId) -> Result<&'a Node, ExtractError> {
        self.graph
            .node(resource)
            .ok_or_else(|| ExtractError::UnknownResource {
                handle: resource.to_string(),
            })
    }

    fn information(&self, node: &Node) -> Option<&'a ResourceInformation> {
        self.registry.get_entry_by_class(&node.class)
    }
}

impl ResourceMetadata for GraphAccessor<'_> {
    type Handle = NodeId;

    fn type_name_of(&self, resource: NodeId) -> Option<&str> {
        let node = self.graph.node(resource)?;
        self.information(node)
            .map(|information| information.resource_type.as_str())
    }

    fn relationship_fields_of(&self, resource_type: &str) -> &[RelationshipField] {
        self.registry.relationship_fields(resource_type)
    }

    fn id_value_of(&self, resource: NodeId) -> Result<String, ExtractError> {
        let node = self.node(resource)?;
        let information =
            self.information(node)
                .ok_or_else(|| ExtractError::UnknownResource {
                    handle: resource.to_string(),
                })?;

        let property = node.properties.get(&information.id_field).ok_or_else(|| {
            ExtractError::PropertyNotFound {
                resource_type: information.resource_type.clone(),
                property: information.id_field.clone(),
            }
        })?;

        match property {
            Property::Value(Value::String(id)) => Ok(id.clone()),
            Property::Value(Value::Number(id)) => Ok(id.to_string()),
            Property::Value(other) => Err(ExtractError::InvalidId {
                resource_type: information.resource_type.clone(),
                actual: json_type_name(other).to_string(),
            }),
            Property::One(_) | Property::Many(_) => Err(ExtractError::InvalidId {
                resource_type: information.resource_type.clone(),
                actual: "relationship".to_string(),
            }),
        }
    }

    fn property_value_of(
        &self,
        resource: NodeId,
        field: &RelationshipField,
    ) -> Result<Option<Related<NodeId>>, ExtractError> {
        let node = self.node(resource)?;
        let resource_type = self
            .information(node)
            .map(|information| information.resource_type.as_str())
            .unwrap_or(node.class.as_str());

        let property = node.properties.get(&field.underlying_name).ok_or_else(|| {
            ExtractError::PropertyNotFound {
                resource_type: resource_type.to_string(),
                property: field.underlying_name.clone(),
            }
        })?;

        match property {
            Property::One(target) => Ok(Some(Related::One(*target))),
            Property::Many(targets) => Ok(Some(Related::Many(targets.clone()))),
            Property::Value(Value::Null) => Ok(None),
            Property::Value(Value::Array(items)) if items.is_empty() => {
                Ok(Some(Related::Many(Vec::new())))
            }
            Property::Value(other) => Err(ExtractError::NotARelationship {
                resource_type: resource_type.to_string(),
                property: field.underlying_name.clone(),
                actual: json_type_name(other).to_string(),
            }),
        }
    }
}
