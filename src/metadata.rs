//! The capability interface the walkers use to inspect resources.

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::ExtractError;
use crate::types::{RelationshipField, ResourceDigest};

/// Value of a relationship field: a single resource or a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Related<H> {
    One(H),
    Many(Vec<H>),
}

impl<H> Related<H> {
    /// The related handles as a slice, one element for a to-one relationship.
    pub fn handles(&self) -> &[H] {
        match self {
            Related::One(handle) => std::slice::from_ref(handle),
            Related::Many(handles) => handles,
        }
    }
}

/// Read-only access to resource types, ids and relationship values.
///
/// `Handle` is an identity token: two handles are equal only when they
/// denote the same resource object, regardless of type or id.
pub trait ResourceMetadata {
    type Handle: Copy + Eq + Hash + Debug;

    /// Registered type name of a resource, `None` when it is not registered.
    fn type_name_of(&self, resource: Self::Handle) -> Option<&str>;

    /// Relationship fields declared for a type (empty for unknown types).
    fn relationship_fields_of(&self, resource_type: &str) -> &[RelationshipField];

    fn id_value_of(&self, resource: Self::Handle) -> Result<String, ExtractError>;

    /// Current value of a relationship field; `Ok(None)` when it is null.
    fn property_value_of(
        &self,
        resource: Self::Handle,
        field: &RelationshipField,
    ) -> Result<Option<Related<Self::Handle>>, ExtractError>;

    /// Digest of a resource, `None` when its type is not registered.
    fn digest_of(&self, resource: Self::Handle) -> Result<Option<ResourceDigest>, ExtractError> {
        let Some(resource_type) = self.type_name_of(resource) else {
            return Ok(None);
        };
        let id = self.id_value_of(resource)?;
        Ok(Some(ResourceDigest::new(resource_type, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn related_handles_one() {
        let related = Related::One(3usize);
        assert_eq!(related.handles(), &[3]);
    }

    #[test]
    fn related_handles_many() {
        let related = Related::Many(vec![1usize, 2, 5]);
        assert_eq!(related.handles(), &[1, 2, 5]);

        let empty: Related<usize> = Related::Many(Vec::new());
        assert!(empty.handles().is_empty());
    }
}
