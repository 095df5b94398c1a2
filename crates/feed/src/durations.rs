// ABOUTME: Duration parsing for podcast episode lengths.
// ABOUTME: Accepts integer seconds, HH:MM:SS, MM:SS, and Go-style duration strings.

/// Parses a duration string into whole seconds.
/// Returns None when parsing fails or the value does not fit in u32.
pub fn parse_seconds(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(secs) = s.parse::<u64>() {
        return u32::try_from(secs).ok();
    }

    if s.contains(':') {
        return parse_colon_format(s);
    }

    // "1h30m" style, via the parse_duration crate.
    if let Ok(duration) = parse_duration::parse(s) {
        return u32::try_from(duration.as_secs()).ok();
    }

    None
}

fn parse_colon_format(s: &str) -> Option<u32> {
    let parts: Vec<&str> = s.split(':').collect();
    let total = match parts.as_slice() {
        [mins, secs] => {
            let mins: u64 = mins.trim().parse().ok()?;
            let secs: u64 = secs.trim().parse().ok()?;
            mins * 60 + secs
        }
        [hours, mins, secs] => {
            let hours: u64 = hours.trim().parse().ok()?;
            let mins: u64 = mins.trim().parse().ok()?;
            let secs: u64 = secs.trim().parse().ok()?;
            hours * 3600 + mins * 60 + secs
        }
        _ => return None,
    };
    u32::try_from(total).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_seconds() {
        assert_eq!(parse_seconds("90"), Some(90));
        assert_eq!(parse_seconds("0"), Some(0));
    }

    #[test]
    fn test_colon_formats() {
        assert_eq!(parse_seconds("45:30"), Some(2730));
        assert_eq!(parse_seconds("01:02:03"), Some(3723));
        assert_eq!(parse_seconds("0:30"), Some(30));
    }

    #[test]
    fn test_go_style() {
        assert_eq!(parse_seconds("1h30m"), Some(5400));
        assert_eq!(parse_seconds("45m"), Some(2700));
    }

    #[test]
    fn test_invalid() {
        assert!(parse_seconds("").is_none());
        assert!(parse_seconds("a:b").is_none());
        assert!(parse_seconds("1:2:3:4").is_none());
        assert!(parse_seconds("soon").is_none());
    }
}
