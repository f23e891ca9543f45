//! Date strings of the form `D:YYYYMMDDHHmmSSOHH'mm'`.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Timelike};

/// Render a date in the canonical `D:` form.
///
/// ```
/// use chrono::{FixedOffset, TimeZone};
/// use folio_util::date::format_date;
///
/// let tz = FixedOffset::east_opt(2 * 3600).unwrap();
/// let date = tz.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
/// assert_eq!(format_date(&date), "D:20240309140500+02'00'");
/// ```
pub fn format_date(date: &DateTime<FixedOffset>) -> String {
    let offset = date.offset().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let offset = offset.abs();
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}{}{:02}'{:02}'",
        date.year(),
        date.month(),
        date.day(),
        date.hour(),
        date.minute(),
        date.second(),
        sign,
        offset / 3600,
        (offset % 3600) / 60
    )
}

/// Parse a date string; every field after the year is optional.
///
/// Missing month/day default to `1`, missing time fields to `0` and a
/// missing offset to UTC. Returns `None` for anything malformed.
pub fn parse_date(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.strip_prefix("D:").unwrap_or(text);
    let bytes = text.as_bytes();
    let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits < 4 || digits % 2 != 0 || digits > 14 {
        return None;
    }
    let field = |start: usize, len: usize, default: u32| -> Option<u32> {
        if start + len <= digits {
            text[start..start + len].parse().ok()
        } else {
            Some(default)
        }
    };
    let year = field(0, 4, 0)? as i32;
    let month = field(4, 2, 1)?;
    let day = field(6, 2, 1)?;
    let hour = field(8, 2, 0)?;
    let minute = field(10, 2, 0)?;
    let second = field(12, 2, 0)?;

    let offset = parse_offset(&text[digits..])?;
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    offset.from_local_datetime(&naive).single()
}

fn parse_offset(rest: &str) -> Option<FixedOffset> {
    let mut chars = rest.chars();
    let sign = match chars.next() {
        None | Some('Z') => return FixedOffset::east_opt(0),
        Some('+') => 1,
        Some('-') => -1,
        Some(_) => return None,
    };
    let body: String = chars.filter(|c| *c != '\'').collect();
    if body.is_empty() {
        return FixedOffset::east_opt(0);
    }
    let hours: i32 = body.get(0..2)?.parse().ok()?;
    let minutes: i32 = match body.get(2..4) {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
