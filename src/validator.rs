//! Resource document validation.
//!
//! Checks a document's shape against an embedded JSON Schema, then its
//! referential integrity by building the registry and graph.

use serde_json::{json, Value};

use crate::document::ResourceDocument;
use crate::error::{LoadError, SchemaError, ValidateError};

/// JSON Schema for resource documents.
pub fn document_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "types": {
                "type": "array",
                "items": { "$ref": "#/$defs/type" }
            },
            "resources": {
                "type": "array",
                "items": { "$ref": "#/$defs/resource" }
            }
        },
        "$defs": {
            "type": {
                "type": "object",
                "required": ["type", "class"],
                "properties": {
                    "type": { "type": "string", "minLength": 1 },
                    "class": { "type": "string", "minLength": 1 },
                    "idField": { "type": "string", "minLength": 1 },
                    "relationships": {
                        "type": "array",
                        "items": { "$ref": "#/$defs/relationship" }
                    }
                }
            },
            "relationship": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": { "type": "string", "minLength": 1 },
                    "jsonName": { "type": "string" },
                    "includeByDefault": { "type": "boolean" }
                }
            },
            "resource": {
                "type": "object",
                "required": ["key", "class"],
                "additionalProperties": false,
                "properties": {
                    "key": { "type": "string", "minLength": 1 },
                    "class": { "type": "string" },
                    "properties": { "type": "object" }
                }
            }
        }
    })
}

/// Validate a resource document and build it.
///
/// # Errors
///
/// Returns `ValidateError::Invalid` with every schema violation, or
/// `ValidateError::Load` if the document is well-formed but inconsistent
/// (duplicate keys or types, dangling references).
pub fn validate_document(document: &Value) -> Result<ResourceDocument, ValidateError> {
    let schema = document_schema();
    let validator = jsonschema::validator_for(&schema).map_err(|e| {
        ValidateError::Load(LoadError::InvalidDocument {
            message: e.to_string(),
        })
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(document)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if !errors.is_empty() {
        return Err(ValidateError::Invalid { errors });
    }

    Ok(ResourceDocument::from_value(document)?)
}
