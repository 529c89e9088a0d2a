//! Entity tag derivation and wire encoding.
//!
//! Tags are raw bytes. On the wire they are rendered as uppercase hex wrapped
//! in double quotes; only strong tags are ever emitted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use std::fmt;

use crate::aggregate::aggregate_descriptors;
use crate::{PreconditionError, Result, VersionDescriptor};

/// Width of an encoded timestamp in bytes.
pub const TIMESTAMP_TAG_LEN: usize = 8;

/// Anything an entity tag can be derived from.
#[derive(Debug, Clone)]
pub enum TagSource<'a> {
    /// Opaque version bytes
    Bytes(&'a [u8]),
    /// A modification time
    Timestamp(DateTime<Utc>),
    /// Row version, falling back to modification time
    Descriptor(&'a VersionDescriptor),
    /// Row versions combined with XOR; `None` marks a member without one
    RowVersions(Vec<Option<&'a [u8]>>),
    /// Modification times reduced to their maximum
    Timestamps(&'a [DateTime<Utc>]),
    /// Descriptors aggregated member by member
    Descriptors(&'a [VersionDescriptor]),
}

/// A strong entity tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityTag(Vec<u8>);

impl EntityTag {
    /// Wrap raw tag bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Decode a tag from its wire form. See [`parse`].
    pub fn parse(value: &str) -> Option<Self> {
        parse(value).map(Self)
    }

    /// Raw tag bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Uppercase hex, two characters per byte.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }

    /// Quoted form for `ETag` and comparison against `If-Match` tokens.
    pub fn to_quoted(&self) -> String {
        format!("\"{}\"", self.to_hex())
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_quoted())
    }
}

impl From<Vec<u8>> for EntityTag {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Derive an entity tag from a version source.
///
/// Fails with [`PreconditionError::EmptySource`] when the source carries no
/// version information, [`PreconditionError::MissingRowVersion`] when a row
/// version collection has a gap, and [`PreconditionError::LengthMismatch`]
/// when row versions of different widths would be combined.
pub fn derive(source: &TagSource<'_>) -> Result<EntityTag> {
    match source {
        TagSource::Bytes(bytes) => {
            if bytes.is_empty() {
                return Err(PreconditionError::EmptySource);
            }
            Ok(EntityTag::from_bytes(*bytes))
        }
        TagSource::Timestamp(ts) => Ok(EntityTag::from_bytes(encode_timestamp(*ts))),
        TagSource::Descriptor(descriptor) => {
            if let Some(row_version) = descriptor.effective_row_version() {
                Ok(EntityTag::from_bytes(row_version))
            } else if let Some(modified_on) = descriptor.modified_on {
                Ok(EntityTag::from_bytes(encode_timestamp(modified_on)))
            } else {
                Err(PreconditionError::EmptySource)
            }
        }
        TagSource::RowVersions(versions) => xor_combine(versions).map(EntityTag::from),
        TagSource::Timestamps(timestamps) => timestamps
            .iter()
            .max()
            .map(|ts| EntityTag::from_bytes(encode_timestamp(*ts)))
            .ok_or(PreconditionError::EmptySource),
        TagSource::Descriptors(descriptors) => {
            let aggregate = aggregate_descriptors(descriptors)?;
            derive(&TagSource::Descriptor(aggregate.descriptor()))
        }
    }
}

/// Wrap a tag string in double quotes.
pub fn format(tag: &str) -> Result<String> {
    if tag.trim().is_empty() {
        return Err(PreconditionError::invalid_argument("entity tag must not be blank"));
    }
    Ok(format!("\"{}\"", tag))
}

/// Decode a tag string, quoted or raw.
///
/// Even-length input is tried as hex first; anything hex cannot decode is
/// tried as standard base64. Returns `None` when neither applies.
pub fn parse(value: &str) -> Option<Vec<u8>> {
    let value = value.trim();
    let value = value.strip_prefix("W/").unwrap_or(value);
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);

    if value.is_empty() {
        return None;
    }

    if value.len() % 2 == 0 {
        if let Ok(bytes) = hex::decode(value) {
            return Some(bytes);
        }
    }

    STANDARD.decode(value).ok()
}

/// Little-endian milliseconds since the Unix epoch.
pub fn encode_timestamp(ts: DateTime<Utc>) -> [u8; TIMESTAMP_TAG_LEN] {
    ts.timestamp_millis().to_le_bytes()
}

/// Inverse of [`encode_timestamp`].
pub fn decode_timestamp(bytes: &[u8]) -> Option<DateTime<Utc>> {
    let raw: [u8; TIMESTAMP_TAG_LEN] = bytes.try_into().ok()?;
    DateTime::from_timestamp_millis(i64::from_le_bytes(raw))
}

/// XOR equal-length row versions together.
pub(crate) fn xor_combine(versions: &[Option<&[u8]>]) -> Result<Vec<u8>> {
    let mut members = versions.iter().enumerate();

    let (_, first) = members.next().ok_or(PreconditionError::EmptySource)?;
    let mut combined = first
        .ok_or(PreconditionError::MissingRowVersion { index: 0 })?
        .to_vec();
    if combined.is_empty() {
        return Err(PreconditionError::EmptySource);
    }

    for (index, version) in members {
        let version = version.ok_or(PreconditionError::MissingRowVersion { index })?;
        if version.len() != combined.len() {
            return Err(PreconditionError::LengthMismatch {
                index,
                expected: combined.len(),
                actual: version.len(),
            });
        }
        for (acc, byte) in combined.iter_mut().zip(version) {
            *acc ^= byte;
        }
    }

    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 9, 29, 14, 32, 10).unwrap()
    }

    #[test]
    fn test_bytes_hex_uppercase() {
        let tag = derive(&TagSource::Bytes(&[0xab, 0x01, 0xff])).unwrap();
        assert_eq!(tag.to_hex(), "AB01FF");
        assert_eq!(tag.to_quoted(), "\"AB01FF\"");
    }

    #[test]
    fn test_empty_bytes_rejected() {
        assert!(matches!(
            derive(&TagSource::Bytes(&[])),
            Err(PreconditionError::EmptySource)
        ));
    }

    #[test]
    fn test_timestamp_tag_is_fixed() {
        let tag = derive(&TagSource::Timestamp(sample_time())).unwrap();
        assert_eq!(tag.to_hex(), "10460DCE5E010000");
        assert_eq!(tag, derive(&TagSource::Timestamp(sample_time())).unwrap());
    }

    #[test]
    fn test_timestamp_millisecond_resolution() {
        let later = sample_time() + chrono::Duration::milliseconds(1);
        let tag = derive(&TagSource::Timestamp(later)).unwrap();
        assert_eq!(tag.to_hex(), "11460DCE5E010000");
    }

    #[test]
    fn test_timestamp_roundtrip_drops_sub_millis() {
        let ts = sample_time() + chrono::Duration::microseconds(1_500);
        let decoded = decode_timestamp(&encode_timestamp(ts)).unwrap();
        assert_eq!(decoded, sample_time() + chrono::Duration::milliseconds(1));
    }

    #[test]
    fn test_descriptor_prefers_row_version() {
        let descriptor = VersionDescriptor::from_row_version([1, 2, 3]).with_modified(sample_time());
        let tag = derive(&TagSource::Descriptor(&descriptor)).unwrap();
        assert_eq!(tag.to_hex(), "010203");
    }

    #[test]
    fn test_descriptor_falls_back_to_timestamp() {
        let descriptor = VersionDescriptor::from_row_version(Vec::new()).with_modified(sample_time());
        let tag = derive(&TagSource::Descriptor(&descriptor)).unwrap();
        assert_eq!(tag.to_hex(), "10460DCE5E010000");
    }

    #[test]
    fn test_unknown_descriptor_has_no_tag() {
        let descriptor = VersionDescriptor::unknown();
        assert!(derive(&TagSource::Descriptor(&descriptor)).is_err());
    }

    #[test]
    fn test_row_versions_xor() {
        let a = [0b1100u8, 0xff];
        let b = [0b1010u8, 0x0f];
        let tag = derive(&TagSource::RowVersions(vec![Some(&a[..]), Some(&b[..])])).unwrap();
        assert_eq!(tag.as_bytes(), &[0b0110, 0xf0]);
    }

    #[test]
    fn test_row_versions_failures() {
        assert!(matches!(
            derive(&TagSource::RowVersions(Vec::new())),
            Err(PreconditionError::EmptySource)
        ));

        let a = [1u8, 2];
        assert!(matches!(
            derive(&TagSource::RowVersions(vec![Some(&a[..]), None])),
            Err(PreconditionError::MissingRowVersion { index: 1 })
        ));

        let short = [1u8];
        assert!(matches!(
            derive(&TagSource::RowVersions(vec![Some(&a[..]), Some(&short[..])])),
            Err(PreconditionError::LengthMismatch { index: 1, expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_row_versions_empty_member_has_no_tag() {
        let empty: [u8; 0] = [];
        assert!(matches!(
            derive(&TagSource::RowVersions(vec![Some(&empty[..])])),
            Err(PreconditionError::EmptySource)
        ));

        let a = [1u8, 2];
        assert!(matches!(
            derive(&TagSource::RowVersions(vec![Some(&empty[..]), Some(&a[..])])),
            Err(PreconditionError::EmptySource)
        ));
        assert!(matches!(
            derive(&TagSource::RowVersions(vec![Some(&a[..]), Some(&empty[..])])),
            Err(PreconditionError::LengthMismatch { index: 1, expected: 2, actual: 0 })
        ));
    }

    #[test]
    fn test_descriptors_xor_row_versions() {
        let members = [
            VersionDescriptor::from_row_version([0x0f, 0xa0]).with_modified(sample_time()),
            VersionDescriptor::from_row_version([0xf0, 0x0a]),
        ];
        let tag = derive(&TagSource::Descriptors(&members)).unwrap();
        assert_eq!(tag.to_quoted(), "\"FFAA\"");
    }

    #[test]
    fn test_descriptors_fall_back_to_latest_time() {
        let late = sample_time() + chrono::Duration::minutes(5);
        let members = [
            VersionDescriptor::from_row_version([1, 2]).with_modified(sample_time()),
            VersionDescriptor::from_modified(late),
        ];
        let tag = derive(&TagSource::Descriptors(&members)).unwrap();
        assert_eq!(tag, derive(&TagSource::Timestamp(late)).unwrap());
    }

    #[test]
    fn test_descriptors_failures() {
        let members = [
            VersionDescriptor::from_row_version([1, 2, 3]),
            VersionDescriptor::from_row_version([1]),
        ];
        assert!(matches!(
            derive(&TagSource::Descriptors(&members)),
            Err(PreconditionError::LengthMismatch { index: 1, expected: 3, actual: 1 })
        ));
        assert!(matches!(
            derive(&TagSource::Descriptors(&[])),
            Err(PreconditionError::EmptySource)
        ));
    }

    #[test]
    fn test_entity_tag_parse() {
        let tag = EntityTag::parse("\"0A0B\"").unwrap();
        assert_eq!(tag.as_bytes(), &[0x0a, 0x0b]);
        assert_eq!(tag.to_quoted(), "\"0A0B\"");
        assert!(EntityTag::parse("???").is_none());
    }

    #[test]
    fn test_timestamps_take_max() {
        let early = sample_time();
        let late = early + chrono::Duration::hours(1);
        let tag = derive(&TagSource::Timestamps(&[late, early])).unwrap();
        assert_eq!(tag, derive(&TagSource::Timestamp(late)).unwrap());
        assert!(derive(&TagSource::Timestamps(&[])).is_err());
    }

    #[test]
    fn test_format() {
        assert_eq!(format("ABC").unwrap(), "\"ABC\"");
        assert!(matches!(format("  "), Err(PreconditionError::InvalidArgument(_))));
        assert!(format("").is_err());
    }

    #[test]
    fn test_parse_hex_quoted_and_raw() {
        assert_eq!(parse("\"0102\""), Some(vec![1, 2]));
        assert_eq!(parse("0102"), Some(vec![1, 2]));
        assert_eq!(parse("abcd"), Some(vec![0xab, 0xcd]));
    }

    #[test]
    fn test_parse_falls_back_to_base64() {
        assert_eq!(parse("AQIDBAUGBwg="), Some(vec![1, 2, 3, 4, 5, 6, 7, 8]));
        assert_eq!(parse("\"//79\""), Some(vec![0xff, 0xfe, 0xfd]));
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("\"\""), None);
        assert_eq!(parse("not a tag!"), None);
        assert_eq!(parse("xyz"), None);
    }
}
