//! Explicit-inclusion pass.
//!
//! Follows the relationship paths the client requested, one path segment per
//! resource type, and includes every resource it reaches below the root.

use std::collections::HashSet;

use tracing::trace;

use crate::error::ExtractError;
use crate::metadata::ResourceMetadata;
use crate::params::IncludeParams;
use crate::types::{
    InclusionEntry, IncludedResources, ResourceDigest, Segment, MAX_RECURRENCE_LEVEL,
};

pub(crate) struct ExplicitWalker<'a, M: ResourceMetadata> {
    metadata: &'a M,
    include: &'a IncludeParams,
    included: &'a mut IncludedResources<M::Handle>,
    /// Resources whose children were already expanded during this walk.
    visited: HashSet<M::Handle>,
}

impl<'a, M: ResourceMetadata> ExplicitWalker<'a, M> {
    pub(crate) fn new(
        metadata: &'a M,
        include: &'a IncludeParams,
        included: &'a mut IncludedResources<M::Handle>,
    ) -> Self {
        Self {
            metadata,
            include,
            included,
            visited: HashSet::new(),
        }
    }

    /// Walk the requested relationships of `resource`.
    ///
    /// `field_name` is the wire name of the relationship that led here;
    /// `None` for the root.
    pub(crate) fn walk(
        &mut self,
        resource: Option<M::Handle>,
        field_name: Option<&str>,
        recurrence_level: usize,
    ) -> Result<(), ExtractError> {
        if recurrence_level >= MAX_RECURRENCE_LEVEL {
            trace!(recurrence_level, "explicit walk reached recurrence ceiling");
            return Ok(());
        }
        let Some(resource) = resource else {
            return Ok(());
        };

        let metadata = self.metadata;
        let include = self.include;
        let Some(resource_type) = metadata.type_name_of(resource) else {
            trace!(?resource, "skipping unregistered resource");
            return Ok(());
        };

        // Tagged on every path that reaches it, expanded only once.
        if recurrence_level > 1 {
            let id = metadata.id_value_of(resource)?;
            let digest = ResourceDigest::new(resource_type, id);
            trace!(%digest, field = field_name, "including requested relation");
            let entry = match field_name {
                Some(name) => InclusionEntry::with_field(resource, Segment::IncludedNested, name),
                None => InclusionEntry::new(resource, Segment::IncludedNested),
            };
            self.included.insert(digest, entry);
        }

        if !self.visited.insert(resource) {
            return Ok(());
        }

        let Some(inclusions) = include.get(resource_type) else {
            trace!(resource_type, "resource type does not specify included fields");
            return Ok(());
        };

        for field in metadata.relationship_fields_of(resource_type) {
            let requested = inclusions
                .iter()
                .any(|inclusion| inclusion.path() == field.json_name);
            if !requested {
                trace!(
                    field = %field.json_name,
                    resource_type,
                    "field not included"
                );
                continue;
            }

            let Some(related) = metadata.property_value_of(resource, field)? else {
                trace!(field = %field.json_name, "requested relation is null");
                continue;
            };

            for &item in related.handles() {
                self.walk(Some(item), Some(field.json_name.as_str()), recurrence_level + 1)?;
            }
        }

        Ok(())
    }
}
