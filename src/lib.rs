//! JSON:API Included Relationship Resolution
//!
//! Decides which related resources a JSON:API response embeds in its
//! `included` member.
//!
//! Given a root resource and the client's `include` parameters, the extractor
//! collects every related resource that is either marked include-by-default
//! or reachable through a requested relationship path. The result is keyed by
//! `(type, id)`, so a resource reached along several paths appears once, and
//! cyclic graphs terminate.
//!
//! # Example
//!
//! ```
//! use jsonapi_include::{
//!     GraphAccessor, IncludeParams, IncludedRelationshipExtractor, RelationshipField,
//!     RequestContext, ResourceDigest, ResourceGraph, ResourceInformation, ResourceRegistry,
//!     Segment,
//! };
//! use serde_json::json;
//!
//! let mut registry = ResourceRegistry::new();
//! registry.register(
//!     ResourceInformation::new("authors", "Author")
//!         .relationship(RelationshipField::new("books")),
//! ).unwrap();
//! registry.register(ResourceInformation::new("books", "Book")).unwrap();
//!
//! let mut graph = ResourceGraph::new();
//! let author = graph.add("a1", "Author").unwrap();
//! graph.set(author, "id", json!(1)).unwrap();
//! let book = graph.add("b1", "Book").unwrap();
//! graph.set(book, "id", json!(7)).unwrap();
//! graph.link_many(author, "books", [book]).unwrap();
//!
//! let params = IncludeParams::parse("include[authors]=books", None).unwrap();
//! let context = RequestContext::new(params).element_name("authors");
//!
//! let accessor = GraphAccessor::new(&registry, &graph);
//! let included = IncludedRelationshipExtractor::new(&accessor).extract(Some(author), &context);
//!
//! let entry = &included[&ResourceDigest::new("books", "7")];
//! assert_eq!(entry.segment, Segment::IncludedNested);
//! assert_eq!(entry.field_name.as_deref(), Some("books"));
//! ```
//!
//! # Segments
//!
//! | Segment | Meaning |
//! |---------|---------|
//! | `TOP` | Default relation of the root |
//! | `INCLUDED_DEFAULT` | Default relation of a top-level default or requested relation |
//! | `INCLUDED_DEFAULT_NESTED` | Default relation two or more levels deep |
//! | `INCLUDED_NESTED` | Reached through a requested include path |

mod defaults;
mod document;
mod error;
mod explicit;
mod extractor;
mod graph;
mod loader;
mod metadata;
mod params;
mod registry;
mod render;
mod types;
mod validator;

pub use document::ResourceDocument;
pub use error::{DocumentError, ExtractError, LoadError, ParamsError, SchemaError, ValidateError};
pub use extractor::IncludedRelationshipExtractor;
pub use graph::{GraphAccessor, Node, NodeId, Property, ResourceGraph, REF_KEY};
pub use loader::{is_url, load_document, load_json, load_json_auto, load_json_str};
pub use metadata::{Related, ResourceMetadata};
pub use params::{IncludeParams, Inclusion, RequestContext};
pub use registry::{ResourceInformation, ResourceRegistry};
pub use render::render_included;
pub use types::{
    json_type_name, IncludedResources, InclusionEntry, RelationshipField, ResourceDigest, Segment,
    MAX_RECURRENCE_LEVEL,
};
pub use validator::{document_schema, validate_document};

#[cfg(feature = "remote")]
pub use loader::load_json_url;
