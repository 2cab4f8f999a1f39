/// Parses `hh:mm:ss.mmm`, `mm:ss.mmm` (WebVTT) or `hh:mm:ss,mmm` (SRT) into seconds.
pub fn parse_timestamp(raw: &str) -> Option<f64> {
    let raw = raw.trim().replace(',', ".");
    let mut parts: Vec<&str> = raw.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }

    let seconds: f64 = parts.pop()?.parse().ok()?;
    let minutes: u64 = parts.pop()?.parse().ok()?;
    let hours: u64 = match parts.pop() {
        Some(h) => h.parse().ok()?,
        None => 0,
    };

    if !(0.0..60.0).contains(&seconds) || minutes >= 60 {
        return None;
    }

    let whole = hours.checked_mul(3600)?.checked_add(minutes * 60)?;
    Some(whole as f64 + seconds)
}

/// `00:00:01,000` style timestamp; `None` for negative or non-finite input.
pub fn format_srt_timestamp(seconds: f64) -> Option<String> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let total_ms = (seconds * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let s = (total_ms / 1000) % 60;
    let m = (total_ms / 60_000) % 60;
    let h = total_ms / 3_600_000;
    Some(format!("{h:02}:{m:02}:{s:02},{ms:03}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_separators() {
        assert_eq!(parse_timestamp("00:00:01,500"), Some(1.5));
        assert_eq!(parse_timestamp("01:02:03.250"), Some(3723.25));
        assert_eq!(parse_timestamp("02:03.000"), Some(123.0));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp("abc"), None);
        assert_eq!(parse_timestamp("1.5"), None);
        assert_eq!(parse_timestamp("00:61:00.000"), None);
        assert_eq!(parse_timestamp("9999999999999999:00:00.000"), None);
        assert_eq!(parse_timestamp(&format!("{}:00:00,000", u64::MAX)), None);
    }

    #[test]
    fn formats_srt_style() {
        assert_eq!(format_srt_timestamp(3723.25).as_deref(), Some("01:02:03,250"));
        assert_eq!(format_srt_timestamp(f64::NAN), None);
    }
}
