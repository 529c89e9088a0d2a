//! HTTP-date parsing and formatting.

use chrono::{DateTime, NaiveDateTime, Utc};

const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Obsolete forms recipients must still accept.
const RFC_850: &str = "%A, %d-%b-%y %H:%M:%S GMT";
const ASCTIME: &str = "%a %b %e %H:%M:%S %Y";

/// Parse an HTTP-date.
///
/// Accepts IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`), the obsolete
/// RFC 850 and asctime forms, and, for convenience, RFC 3339. Anything else
/// yields `None`.
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            [RFC_850, ASCTIME]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|naive| naive.and_utc())
        })
}

/// Format as IMF-fixdate. Sub-second precision is dropped.
pub fn format(ts: DateTime<Utc>) -> String {
    ts.format(IMF_FIXDATE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_imf_fixdate() {
        let parsed = parse("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap());
    }

    #[test]
    fn test_parse_rfc3339() {
        let parsed = parse("2017-09-29T14:32:10Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2017, 9, 29, 14, 32, 10).unwrap());
    }

    #[test]
    fn test_parse_obsolete_forms() {
        let expected = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(parse("Sunday, 06-Nov-94 08:49:37 GMT"), Some(expected));
        assert_eq!(parse("Sun Nov  6 08:49:37 1994"), Some(expected));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse("yesterday").is_none());
        assert!(parse("").is_none());
    }

    #[test]
    fn test_format() {
        let ts = Utc.with_ymd_and_hms(2017, 9, 29, 14, 32, 10).unwrap()
            + chrono::Duration::milliseconds(750);
        assert_eq!(format(ts), "Fri, 29 Sep 2017 14:32:10 GMT");
    }
}
