//! Recency boost for freshly ingested chunks.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::types::ChunkMetadata;

/// Boost per second of age. Negative, so older chunks score lower.
pub const RECENCY_PER_SECOND: f64 = -1e-7;

/// Source of "now" for recency scoring.
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Parse an ingestion timestamp.
///
/// Accepts RFC 3339, naive ISO-8601 date-times and bare dates. Naive values
/// are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Additive boost from `ingested_at`: `age_seconds * -1e-7`.
///
/// Missing or unparsable timestamps give `0.0`. Timestamps in the future
/// give a small positive boost.
pub fn recency_boost(metadata: &ChunkMetadata, now: DateTime<Utc>) -> f64 {
    let Some(ingested_at) = metadata.ingested_at.as_deref().and_then(parse_timestamp) else {
        return 0.0;
    };
    let age = now.signed_duration_since(ingested_at);
    let seconds = age.num_milliseconds() as f64 / 1000.0;
    seconds * RECENCY_PER_SECOND
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn meta(ts: &str) -> ChunkMetadata {
        ChunkMetadata::default().with_ingested_at(ts)
    }

    #[test]
    fn test_missing_or_bad_timestamp_is_zero() {
        assert_eq!(recency_boost(&ChunkMetadata::default(), now()), 0.0);
        assert_eq!(recency_boost(&meta("yesterday"), now()), 0.0);
        assert_eq!(recency_boost(&meta(""), now()), 0.0);
    }

    #[test]
    fn test_one_day_old() {
        let boost = recency_boost(&meta("2025-05-31T12:00:00"), now());
        assert!((boost - (-0.00864)).abs() < 1e-6);
    }

    #[test]
    fn test_accepts_offsets_and_fractions() {
        let a = recency_boost(&meta("2025-05-31T14:00:00+02:00"), now());
        let b = recency_boost(&meta("2025-05-31T12:00:00Z"), now());
        let c = recency_boost(&meta("2025-05-31T12:00:00.000"), now());
        assert!((a - b).abs() < 1e-9);
        assert!((b - c).abs() < 1e-9);
    }

    #[test]
    fn test_bare_date() {
        let boost = recency_boost(&meta("2025-06-01"), now());
        assert!((boost - (-0.00432)).abs() < 1e-6);
    }

    #[test]
    fn test_monotone_in_age() {
        let newer = (now() - Duration::hours(1)).to_rfc3339();
        let older = (now() - Duration::days(30)).to_rfc3339();
        assert!(recency_boost(&meta(&newer), now()) >= recency_boost(&meta(&older), now()));
    }

    #[test]
    fn test_future_timestamp_is_positive() {
        let future = (now() + Duration::hours(10)).to_rfc3339();
        assert!(recency_boost(&meta(&future), now()) > 0.0);
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock(now()).now(), now());
    }
}
