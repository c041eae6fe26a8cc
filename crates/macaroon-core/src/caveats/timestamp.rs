//! Expiry caveats: `time < <timestamp>`

use crate::verifier::GeneralCaveatVerifier;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

const CAVEAT_PREFIX: &str = "time < ";

/// Accepted timestamp layouts besides RFC 3339, interpreted as UTC
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Satisfies `time < T` when the verification instant is strictly before `T`
///
/// `T` may be RFC 3339 (`2042-01-01T00:00:00Z`) or a UTC
/// `YYYY-MM-DDTHH:MM[:SS]` timestamp. Unparseable timestamps are not
/// satisfied.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampCaveatVerifier {
    now: Option<DateTime<Utc>>,
}

impl TimestampCaveatVerifier {
    /// Compare against the wall clock at verification time
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare against a fixed instant
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Some(now) }
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

impl GeneralCaveatVerifier for TimestampCaveatVerifier {
    fn verify_caveat(&self, predicate: &str) -> bool {
        predicate
            .strip_prefix(CAVEAT_PREFIX)
            .and_then(parse_timestamp)
            .is_some_and(|deadline| self.now() < deadline)
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}
