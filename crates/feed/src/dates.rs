// ABOUTME: Flexible datetime parsing for the date fields found in feeds.
// ABOUTME: Tries RFC 3339, RFC 2822, named timezones, then progressively looser formats.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Parses a feed datetime in any of the formats seen in the wild, normalized
/// to UTC. Returns None when nothing matches; callers leave the field unset.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // Atom and OPDS use RFC 3339.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // RSS pubDate is RFC 2822 when well-behaved.
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(dt) = parse_named_timezone(s) {
        return Some(dt);
    }

    // Numeric-offset variants chrono's RFC parsers reject.
    const OFFSET_FORMATS: &[&str] = &[
        "%a, %d %b %Y %H:%M:%S %z",
        "%a, %e %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M:%S %z",
        "%e %b %Y %H:%M:%S %z",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%dT%H:%M:%S%z",
    ];
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    // No timezone at all: assume UTC.
    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%d %b %Y %H:%M:%S",
        "%e %b %Y %H:%M:%S",
        "%d %b %Y",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&midnight));
    }

    None
}

/// Offsets for timezone abbreviations chrono's `%Z` cannot parse.
/// Ambiguous abbreviations (CST, IST) resolve to the US/European reading,
/// which is what English-language feeds overwhelmingly mean.
const TZ_OFFSETS: &[(&str, i32)] = &[
    ("GMT", 0),
    ("UTC", 0),
    ("EST", -5 * 3600),
    ("EDT", -4 * 3600),
    ("CST", -6 * 3600),
    ("CDT", -5 * 3600),
    ("MST", -7 * 3600),
    ("MDT", -6 * 3600),
    ("PST", -8 * 3600),
    ("PDT", -7 * 3600),
    ("AKST", -9 * 3600),
    ("AKDT", -8 * 3600),
    ("HST", -10 * 3600),
    ("AST", -4 * 3600),
    ("ADT", -3 * 3600),
    ("NST", -(3 * 3600 + 30 * 60)),
    ("NDT", -(2 * 3600 + 30 * 60)),
    ("WET", 0),
    ("WEST", 3600),
    ("CET", 3600),
    ("CEST", 2 * 3600),
    ("EET", 2 * 3600),
    ("EEST", 3 * 3600),
    ("BST", 3600),
    ("IST", 3600),
    ("JST", 9 * 3600),
    ("KST", 9 * 3600),
    ("AEST", 10 * 3600),
    ("AEDT", 11 * 3600),
    ("AWST", 8 * 3600),
    ("NZST", 12 * 3600),
    ("NZDT", 13 * 3600),
];

fn parse_named_timezone(s: &str) -> Option<DateTime<Utc>> {
    let (abbrev, offset_secs) = TZ_OFFSETS
        .iter()
        .find(|(name, _)| s.ends_with(name))
        .copied()?;
    let base = s.trim_end_matches(abbrev).trim_end();

    const BASE_FORMATS: &[&str] = &[
        "%a, %d %b %Y %H:%M:%S",
        "%a, %e %b %Y %H:%M:%S",
        "%d %b %Y %H:%M:%S",
        "%e %b %Y %H:%M:%S",
    ];
    for fmt in BASE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(base, fmt) {
            let offset = FixedOffset::east_opt(offset_secs)?;
            let dt = offset.from_local_datetime(&naive).single()?;
            return Some(dt.with_timezone(&Utc));
        }
    }
    None
}
