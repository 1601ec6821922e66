use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a vendor timestamp. AssemblyAI omits the offset; those are taken as UTC.
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_rfc3339_with_offset() {
        let parsed = parse_timestamp("2024-05-01T12:00:00+02:00").unwrap();
        assert_eq!(parsed.hour(), 10);
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let parsed = parse_timestamp("2023-11-09T17:24:01.409565").unwrap();
        assert_eq!(parsed.day(), 9);
        assert_eq!(parsed.hour(), 17);
    }

    #[test]
    fn test_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
    }
}
