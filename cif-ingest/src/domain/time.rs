//! Schedule time formatting.
//!
//! CIF feeds carry times of day as compact 4-digit strings ("0743"),
//! optionally suffixed with `H` to mark the half minute ("0743H" means
//! 07:43:30). Downstream consumers expect "HH:MM"; the half-minute marker
//! is stripped and carries no further meaning.

/// Format a raw CIF time as "HH:MM".
///
/// Accepts `HHMM` and `HHMMH` (half-minute marker). Anything else is
/// returned unchanged: event mapping must never fail on a malformed time,
/// so this degrades to passing the raw value through.
///
/// # Examples
///
/// ```
/// use cif_ingest::domain::format_schedule_time;
///
/// assert_eq!(format_schedule_time("0743"), "07:43");
/// assert_eq!(format_schedule_time("0743H"), "07:43");
/// assert_eq!(format_schedule_time("not a time"), "not a time");
/// ```
pub fn format_schedule_time(raw: &str) -> String {
    let trimmed = raw.trim();
    let bytes = trimmed.as_bytes();

    let digits = match bytes.len() {
        4 => bytes,
        5 if bytes[4] == b'H' => &bytes[..4],
        _ => return raw.to_string(),
    };

    let Some(hour) = parse_two_digits(&digits[0..2]) else {
        return raw.to_string();
    };
    let Some(minute) = parse_two_digits(&digits[2..4]) else {
        return raw.to_string();
    };
    if hour > 23 || minute > 59 {
        return raw.to_string();
    }

    format!("{hour:02}:{minute:02}")
}

/// Parse exactly two ASCII digits, returning None on any other input.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 || !bytes[0].is_ascii_digit() || !bytes[1].is_ascii_digit() {
        return None;
    }
    Some(u32::from(bytes[0] - b'0') * 10 + u32::from(bytes[1] - b'0'))
}
