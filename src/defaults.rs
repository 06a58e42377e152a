//! Default-inclusion pass.
//!
//! Walks every relationship marked include-by-default, at any depth, whether
//! or not the client asked for it. Relationships the client requested on the
//! root are walked too (without being included here) so that defaults nested
//! beneath them are found.

use tracing::trace;

use crate::error::ExtractError;
use crate::metadata::ResourceMetadata;
use crate::params::RequestContext;
use crate::types::{InclusionEntry, IncludedResources, Segment, MAX_RECURRENCE_LEVEL};

pub(crate) struct DefaultWalker<'a, M: ResourceMetadata> {
    metadata: &'a M,
    context: &'a RequestContext,
    included: &'a mut IncludedResources<M::Handle>,
}

impl<'a, M: ResourceMetadata> DefaultWalker<'a, M> {
    pub(crate) fn new(
        metadata: &'a M,
        context: &'a RequestContext,
        included: &'a mut IncludedResources<M::Handle>,
    ) -> Self {
        Self {
            metadata,
            context,
            included,
        }
    }

    /// Walk the default relationships of `resource`.
    ///
    /// There is no visited set here; cycles are cut by the recurrence ceiling
    /// and repeated resources collapse onto their digest. A metadata failure
    /// abandons only the branch it occurs on.
    pub(crate) fn walk(
        &mut self,
        resource: Option<M::Handle>,
        segment: Segment,
        recurrence_level: usize,
    ) {
        if recurrence_level >= MAX_RECURRENCE_LEVEL {
            trace!(recurrence_level, "default walk reached recurrence ceiling");
            return;
        }
        let Some(resource) = resource else {
            return;
        };

        let metadata = self.metadata;
        let Some(resource_type) = metadata.type_name_of(resource) else {
            trace!(?resource, "skipping unregistered resource");
            return;
        };

        for field in metadata.relationship_fields_of(resource_type) {
            // Requested on the root: the explicit pass includes it, we only
            // look underneath for defaults.
            let requested = segment == Segment::Top
                && self.context.is_top_level_field_included(&field.json_name);
            if !field.include_by_default && !requested {
                continue;
            }

            let related = match metadata.property_value_of(resource, field) {
                Ok(Some(related)) => related,
                Ok(None) => continue,
                Err(e) => {
                    trace!(error = %e, field = %field.json_name, "abandoning default branch");
                    continue;
                }
            };

            for &item in related.handles() {
                if field.include_by_default {
                    if let Err(e) = self.include(item, segment) {
                        trace!(error = %e, resource = ?item, "abandoning default branch");
                        continue;
                    }
                }
                self.walk(Some(item), segment.promote(), recurrence_level + 1);
            }
        }
    }

    fn include(&mut self, resource: M::Handle, segment: Segment) -> Result<(), ExtractError> {
        match self.metadata.digest_of(resource)? {
            Some(digest) => {
                trace!(%digest, %segment, "including default relation");
                self.included
                    .insert(digest, InclusionEntry::new(resource, segment));
            }
            None => trace!(?resource, "unregistered resource is not includable"),
        }
        Ok(())
    }
}
