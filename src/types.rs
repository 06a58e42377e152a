//! Core types for included-relationship resolution.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Walks stop silently once they reach this recurrence level.
pub const MAX_RECURRENCE_LEVEL: usize = 42;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Identity key of a resource: its JSON:API type and id.
///
/// Two resources with the same digest are the same logical resource and
/// occupy a single entry in [`IncludedResources`], however many paths reach them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceDigest {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
}

impl ResourceDigest {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ResourceDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.id)
    }
}

/// Which traversal phase produced an included entry.
///
/// Metadata for the serializer only; never part of the identity key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Segment {
    /// Default relation found directly on the root.
    Top,
    /// Default relation one level below a top-level default.
    IncludedDefault,
    /// Default relation two or more levels deep.
    IncludedDefaultNested,
    /// Reached by an explicitly requested include path.
    IncludedNested,
}

impl Segment {
    /// Segment handed to the children of a default-included resource.
    ///
    /// `IncludedNested` belongs to the explicit walk and is left untouched.
    pub fn promote(self) -> Self {
        match self {
            Segment::Top => Segment::IncludedDefault,
            Segment::IncludedDefault => Segment::IncludedDefaultNested,
            Segment::IncludedDefaultNested => Segment::IncludedDefaultNested,
            Segment::IncludedNested => Segment::IncludedNested,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Top => "TOP",
            Segment::IncludedDefault => "INCLUDED_DEFAULT",
            Segment::IncludedDefaultNested => "INCLUDED_DEFAULT_NESTED",
            Segment::IncludedNested => "INCLUDED_NESTED",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one relationship field of a resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipField {
    /// Property name on the underlying resource.
    #[serde(rename = "name")]
    pub underlying_name: String,
    /// Name used on the wire and in include paths.
    #[serde(default)]
    pub json_name: String,
    #[serde(default)]
    pub include_by_default: bool,
}

impl RelationshipField {
    /// Create a field whose wire name equals its underlying name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            json_name: name.clone(),
            underlying_name: name,
            include_by_default: false,
        }
    }

    pub fn json_name(mut self, json_name: impl Into<String>) -> Self {
        self.json_name = json_name.into();
        self
    }

    pub fn include_by_default(mut self, include_by_default: bool) -> Self {
        self.include_by_default = include_by_default;
        self
    }
}

/// A resource selected for inclusion, tagged for the serializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionEntry<H> {
    pub resource: H,
    pub segment: Segment,
    /// Wire name of the relationship that led to this resource, when known.
    pub field_name: Option<String>,
}

impl<H> InclusionEntry<H> {
    pub fn new(resource: H, segment: Segment) -> Self {
        Self {
            resource,
            segment,
            field_name: None,
        }
    }

    pub fn with_field(resource: H, segment: Segment, field_name: impl Into<String>) -> Self {
        Self {
            resource,
            segment,
            field_name: Some(field_name.into()),
        }
    }
}

/// Included resources keyed by digest. Later inserts overwrite earlier ones.
pub type IncludedResources<H> = HashMap<ResourceDigest, InclusionEntry<H>>;
