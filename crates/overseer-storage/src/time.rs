//! Timestamp encoding for TEXT columns.
//!
//! Fixed-width RFC 3339 with microseconds and a `Z` suffix, so that
//! lexicographic order in SQL matches chronological order.

use chrono::{DateTime, SecondsFormat, Utc};

use overseer_core::errors::{OverseerResult, StorageError};

pub fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_ts(column: &str, value: &str) -> OverseerResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| {
            StorageError::InvalidColumn {
                column: column.to_string(),
                value: value.to_string(),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn encoding_sorts_chronologically() {
        let a = Utc::now();
        let b = a + Duration::microseconds(1);
        let c = a + Duration::days(400);
        assert!(fmt_ts(a) < fmt_ts(b));
        assert!(fmt_ts(b) < fmt_ts(c));
        assert_eq!(fmt_ts(a).len(), fmt_ts(c).len());
    }

    #[test]
    fn roundtrips_at_microsecond_precision() {
        let now = Utc::now();
        let parsed = parse_ts("created_at", &fmt_ts(now)).unwrap();
        assert_eq!((parsed - now).num_microseconds().unwrap().abs(), 0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_ts("created_at", "yesterday").is_err());
    }
}
