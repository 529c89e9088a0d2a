//! Response validator headers.

use http::header::{HeaderMap, HeaderValue, ETAG, LAST_MODIFIED};

use crate::tag::{self, TagSource};
use crate::{http_date, VersionDescriptor};

/// `ETag` and `Last-Modified` values derived from a descriptor.
///
/// Set these on 200, 304 and 412 responses alike so the client can retry
/// with current validators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseValidators {
    /// Quoted entity tag
    pub etag: Option<String>,
    /// HTTP-date of the last modification
    pub last_modified: Option<String>,
}

impl ResponseValidators {
    /// Derive validators the same way the evaluator derives its local tag.
    pub fn from_descriptor(descriptor: &VersionDescriptor) -> Self {
        Self {
            etag: tag::derive(&TagSource::Descriptor(descriptor))
                .ok()
                .map(|etag| etag.to_quoted()),
            last_modified: descriptor.modified_on.map(http_date::format),
        }
    }

    /// Whether there is nothing to emit.
    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }

    /// Write the validators into `headers`, replacing existing values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        // Both values are ASCII by construction
        if let Some(value) = self.etag.as_deref().and_then(|v| HeaderValue::from_str(v).ok()) {
            headers.insert(ETAG, value);
        }
        if let Some(value) = self
            .last_modified
            .as_deref()
            .and_then(|v| HeaderValue::from_str(v).ok())
        {
            headers.insert(LAST_MODIFIED, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_from_descriptor() {
        let descriptor = VersionDescriptor::from_row_version([0xca, 0xfe])
            .with_modified(Utc.with_ymd_and_hms(2017, 9, 29, 14, 32, 10).unwrap());
        let validators = ResponseValidators::from_descriptor(&descriptor);
        assert_eq!(validators.etag.as_deref(), Some("\"CAFE\""));
        assert_eq!(validators.last_modified.as_deref(), Some("Fri, 29 Sep 2017 14:32:10 GMT"));
    }

    #[test]
    fn test_apply() {
        let descriptor = VersionDescriptor::from_row_version([1]);
        let mut headers = HeaderMap::new();
        headers.insert(ETAG, HeaderValue::from_static("\"stale\""));

        ResponseValidators::from_descriptor(&descriptor).apply(&mut headers);
        assert_eq!(headers.get(ETAG).unwrap(), "\"01\"");
        assert!(headers.get(LAST_MODIFIED).is_none());
    }

    #[test]
    fn test_unknown_descriptor_is_empty() {
        assert!(ResponseValidators::from_descriptor(&VersionDescriptor::unknown()).is_empty());
    }
}
