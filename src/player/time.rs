//! Clock display.

/// Formats seconds as zero-padded `MM:SS`.
///
/// NaN, infinite and negative inputs render as `00:00`. There is no hour field:
/// minutes keep counting past 59, so 75 minutes renders as `75:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }
    let whole = seconds.floor() as u64;
    let minutes = whole / 60;
    let secs = whole % 60;
    format!("{minutes:02}:{secs:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(format_time(f64::NAN), "00:00");
        assert_eq!(format_time(f64::INFINITY), "00:00");
        assert_eq!(format_time(-4.0), "00:00");
    }

    #[test]
    fn test_padding() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(5.9), "00:05");
        assert_eq!(format_time(65.0), "01:05");
        assert_eq!(format_time(599.99), "09:59");
    }

    #[test]
    fn test_no_hour_component() {
        assert_eq!(format_time(3600.0), "60:00");
        assert_eq!(format_time(4503.0), "75:03");
    }
}
