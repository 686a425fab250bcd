use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a date as written in the feed or the configuration
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DD HH:MM:SS` and plain
/// `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(datetime) = DateTime::parse_from_rfc3339(input) {
        return Some(datetime.with_timezone(&Utc));
    }

    if let Ok(datetime) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return Some(datetime.and_utc());
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}
