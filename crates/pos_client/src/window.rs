//! Business date → UTC `created_at` window.
//!
//! The POS filters receipts by UTC creation time while the mall counts a
//! calendar day in local time. Local midnight and 23:59:59 are resolved in
//! an IANA zone, so DST transition days get their real length.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

pub const DEFAULT_TIMEZONE: &str = "Asia/Kuala_Lumpur";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Inclusive UTC bounds of one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// `[date 00:00:00, date 23:59:59]` in `timezone`, converted to UTC.
    pub fn for_business_date(date: NaiveDate, timezone: Tz) -> Self {
        let start_local = date.and_time(NaiveTime::MIN);
        let end_local = start_local + Duration::seconds(86_399);
        Self {
            start: resolve_local(timezone, start_local),
            end: resolve_local(timezone, end_local),
        }
    }

    pub fn created_at_min(&self) -> String {
        self.start.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn created_at_max(&self) -> String {
        self.end.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Earliest instant for an ambiguous local time. A time inside a DST gap
/// takes the offset in force at that wall-clock reading.
fn resolve_local(timezone: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match timezone.from_local_datetime(&local).earliest() {
        Some(instant) => instant.with_timezone(&Utc),
        None => {
            let offset = timezone.offset_from_utc_datetime(&local).fix();
            (local - Duration::seconds(offset.local_minus_utc() as i64)).and_utc()
        }
    }
}

pub fn default_timezone() -> Tz {
    chrono_tz::Asia::Kuala_Lumpur
}

/// Today's calendar date as seen in `timezone`.
pub fn today(timezone: Tz) -> NaiveDate {
    Utc::now().with_timezone(&timezone).date_naive()
}

/// Parse an IANA zone name (`Asia/Kuala_Lumpur`, `UTC`, `Etc/GMT-8`).
pub fn parse_timezone(s: &str) -> Result<Tz, String> {
    let name = s.trim();
    name.parse::<Tz>().map_err(|_| {
        format!("unknown timezone {:?} (expected an IANA name such as {})", name, DEFAULT_TIMEZONE)
    })
}
