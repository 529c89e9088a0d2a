//! Server-side version information for a resource.

use chrono::{DateTime, Utc};

/// What the server currently knows about a resource's version.
///
/// Built by the caller from its storage layer for each request. A non-empty
/// `row_version` takes priority over `modified_on` when deriving a tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionDescriptor {
    /// Opaque change token assigned by the store
    pub row_version: Option<Vec<u8>>,
    /// Last modification time, `None` when never recorded
    pub modified_on: Option<DateTime<Utc>>,
}

impl VersionDescriptor {
    /// Descriptor with neither a row version nor a modification time.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Descriptor carrying only a row version.
    pub fn from_row_version(row_version: impl Into<Vec<u8>>) -> Self {
        Self {
            row_version: Some(row_version.into()),
            modified_on: None,
        }
    }

    /// Descriptor carrying only a modification time.
    pub fn from_modified(modified_on: DateTime<Utc>) -> Self {
        Self {
            row_version: None,
            modified_on: Some(modified_on),
        }
    }

    /// Set the row version.
    #[must_use]
    pub fn with_row_version(mut self, row_version: impl Into<Vec<u8>>) -> Self {
        self.row_version = Some(row_version.into());
        self
    }

    /// Set the modification time.
    #[must_use]
    pub fn with_modified(mut self, modified_on: DateTime<Utc>) -> Self {
        self.modified_on = Some(modified_on);
        self
    }

    /// Row version bytes, if present and non-empty.
    pub fn effective_row_version(&self) -> Option<&[u8]> {
        self.row_version.as_deref().filter(|v| !v.is_empty())
    }

    /// Whether a modification time was recorded.
    pub fn has_modified(&self) -> bool {
        self.modified_on.is_some()
    }

    /// Whether anything usable for a tag is present.
    pub fn is_known(&self) -> bool {
        self.effective_row_version().is_some() || self.has_modified()
    }
}
