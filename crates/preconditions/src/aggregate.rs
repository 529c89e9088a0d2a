//! Aggregation of many version sources into one precondition.
//!
//! Used when a single response represents several underlying entities, such
//! as a list or a composite document. Both reductions (XOR of row versions,
//! maximum of timestamps) are commutative, so the aggregate does not depend
//! on the order members were fetched in.

use chrono::{DateTime, Utc};

use crate::tag::{self, EntityTag, TagSource};
use crate::validators::ResponseValidators;
use crate::{PreconditionError, Result, VersionDescriptor};

/// A version descriptor synthesized from several members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatePrecondition {
    descriptor: VersionDescriptor,
    members: usize,
}

impl AggregatePrecondition {
    /// The synthesized descriptor.
    pub fn descriptor(&self) -> &VersionDescriptor {
        &self.descriptor
    }

    /// Consume into the synthesized descriptor.
    pub fn into_descriptor(self) -> VersionDescriptor {
        self.descriptor
    }

    /// Number of members that went into the aggregate.
    pub fn members(&self) -> usize {
        self.members
    }

    /// Whether the aggregate carries no version information at all.
    pub fn is_empty(&self) -> bool {
        !self.descriptor.is_known()
    }

    /// Entity tag of the aggregate, if one can be derived.
    pub fn etag(&self) -> Option<EntityTag> {
        tag::derive(&TagSource::Descriptor(&self.descriptor)).ok()
    }

    /// `ETag` and `Last-Modified` values for the composite response.
    pub fn validators(&self) -> ResponseValidators {
        ResponseValidators::from_descriptor(&self.descriptor)
    }
}

/// Aggregate descriptors member by member.
///
/// The row version is the XOR of every member's row version and is only
/// present when every member has one. The modification time is the latest
/// of the members' times. Row versions of unequal width are an error rather
/// than being truncated.
pub fn aggregate_descriptors(descriptors: &[VersionDescriptor]) -> Result<AggregatePrecondition> {
    let versions: Vec<Option<&[u8]>> = descriptors
        .iter()
        .map(VersionDescriptor::effective_row_version)
        .collect();

    let row_version = match tag::xor_combine(&versions) {
        Ok(combined) => Some(combined),
        Err(PreconditionError::EmptySource | PreconditionError::MissingRowVersion { .. }) => None,
        Err(e) => return Err(e),
    };

    let modified_on = descriptors.iter().filter_map(|d| d.modified_on).max();

    Ok(AggregatePrecondition {
        descriptor: VersionDescriptor {
            row_version,
            modified_on,
        },
        members: descriptors.len(),
    })
}

/// Aggregate bare modification times.
///
/// The row version is the timestamp tag of the latest time. An empty input
/// yields an aggregate with no version information.
pub fn aggregate_timestamps(timestamps: &[DateTime<Utc>]) -> Result<AggregatePrecondition> {
    let Some(latest) = timestamps.iter().max().copied() else {
        return Ok(AggregatePrecondition {
            descriptor: VersionDescriptor::unknown(),
            members: 0,
        });
    };

    let etag = tag::derive(&TagSource::Timestamp(latest)).map_err(|e| {
        PreconditionError::Invariant(format!("timestamp tag derivation failed: {}", e))
    })?;

    Ok(AggregatePrecondition {
        descriptor: VersionDescriptor {
            row_version: Some(etag.into_bytes()),
            modified_on: Some(latest),
        },
        members: timestamps.len(),
    })
}
