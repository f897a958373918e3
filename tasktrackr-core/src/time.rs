//! Time utilities: local wall-clock timestamps as tasks store them.
//!
//! Tasks carry naive local times (no offset). That is what the user types at
//! the prompt and what the task file has always contained.

use chrono::{Local, NaiveDate, NaiveDateTime, SubsecRound, Timelike};

/// Prompt and display format, e.g. "2026-02-20 23:59".
pub const INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

const ISO_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Current local time, truncated to microseconds so it survives a save/load cycle.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}

/// Parse a prompt-style local time like "2026-02-20 23:59".
pub fn parse_input(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), INPUT_FORMAT).ok()
}

pub fn format_display(dt: NaiveDateTime) -> String {
    dt.format(INPUT_FORMAT).to_string()
}

/// Parse an ISO-8601 local timestamp. Accepts `T` or space as the separator,
/// optional seconds and fractional seconds, or a bare date (midnight).
pub fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    ISO_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Format as ISO-8601; the fraction is only written when non-zero.
pub fn to_iso(dt: NaiveDateTime) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prompt_format() {
        let dt = parse_input(" 2026-02-20 23:59 ").unwrap();
        assert_eq!(format_display(dt), "2026-02-20 23:59");
        assert!(parse_input("20/02/2026").is_none());
        assert!(parse_input("2026-02-30 10:00").is_none());
    }

    #[test]
    fn iso_accepts_fraction_separator_and_bare_date() {
        let a = parse_iso("2026-02-20T23:59:00").unwrap();
        let b = parse_iso("2026-02-20 23:59:00.250000").unwrap();
        let c = parse_iso("2026-02-20").unwrap();
        assert_eq!(to_iso(a), "2026-02-20T23:59:00");
        assert_eq!(to_iso(b), "2026-02-20T23:59:00.250000");
        assert_eq!(to_iso(c), "2026-02-20T00:00:00");
        assert!(parse_iso("yesterday").is_none());
    }

    #[test]
    fn now_round_trips_through_iso() {
        let t = now();
        assert_eq!(parse_iso(&to_iso(t)), Some(t));
    }
}
