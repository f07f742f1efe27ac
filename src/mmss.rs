//! `mm:ss` text for durations.

/// Round to whole seconds (negative clamps to zero) and format as `MM:SS`.
/// Minutes are not wrapped into hours.
pub fn format_mmss(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.max(0.0).round() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Parse `m:ss` or a bare number of seconds. Anything else (including
/// negative values) yields `fallback`.
pub fn parse_mmss(text: &str, fallback: u32) -> u32 {
    try_parse_mmss(text).unwrap_or(fallback)
}

fn try_parse_mmss(text: &str) -> Option<u32> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    match parts.as_slice() {
        [minutes, seconds] => {
            let minutes: u32 = minutes.trim().parse().ok()?;
            let seconds: u32 = seconds.trim().parse().ok()?;
            minutes.checked_mul(60)?.checked_add(seconds)
        }
        [seconds] => seconds.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_rounded_seconds() {
        assert_eq!(format_mmss(0.0), "00:00");
        assert_eq!(format_mmss(59.6), "01:00");
        assert_eq!(format_mmss(300.0), "05:00");
        assert_eq!(format_mmss(-4.0), "00:00");
        assert_eq!(format_mmss(6001.0), "100:01");
    }

    #[test]
    fn parses_minutes_and_seconds() {
        assert_eq!(parse_mmss("05:00", 1), 300);
        assert_eq!(parse_mmss(" 1:30 ", 1), 90);
        assert_eq!(parse_mmss("0:75", 1), 75);
        assert_eq!(parse_mmss("120", 1), 120);
    }

    #[test]
    fn invalid_text_keeps_last_good_value() {
        assert_eq!(parse_mmss("", 300), 300);
        assert_eq!(parse_mmss("abc", 300), 300);
        assert_eq!(parse_mmss("1:2:3", 300), 300);
        assert_eq!(parse_mmss("-1:00", 300), 300);
        assert_eq!(parse_mmss("1.5", 300), 300);
    }
}
