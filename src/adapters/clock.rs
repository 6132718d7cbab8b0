//! Clock adapter contract (spec §2, §4.2 preamble).

use time::OffsetDateTime;

/// Supplies current UTC time. Returns 0 when no RTC is present (spec §2).
pub trait ClockAdapter {
    fn now_unix(&self) -> i64;
}

/// `ClockAdapter` backed by the host's real-time clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockAdapter for SystemClock {
    fn now_unix(&self) -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// RFC 7231 IMF-fixdate, for the HTTP `Date`/`Last-Modified` headers.
/// Grounded on the teacher's `systemtime_to_httpdate` (`util.rs`), rebuilt
/// by hand since this crate doesn't carry the teacher's `headers` crate.
pub fn http_date(unix_secs: i64) -> String {
    let dt = OffsetDateTime::from_unix_timestamp(unix_secs).unwrap_or(OffsetDateTime::UNIX_EPOCH);
    let weekday = WEEKDAYS[dt.weekday().number_days_from_monday() as usize];
    let month = MONTHS[dt.month() as u8 as usize - 1];
    format!(
        "{}, {:02} {} {:04} {:02}:{:02}:{:02} GMT",
        weekday,
        dt.day(),
        month,
        dt.year(),
        dt.hour(),
        dt.minute(),
        dt.second()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_unix_epoch() {
        assert_eq!(http_date(0), "Thu, 01 Jan 1970 00:00:00 GMT");
    }
}
