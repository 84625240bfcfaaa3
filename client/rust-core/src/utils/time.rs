/// Formats a millisecond duration as `HH:MM:SS` for the results view.
pub fn format_hms(total_ms: u64) -> String {
    let total_secs = total_ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_zero() {
        assert_eq!(format_hms(0), "00:00:00");
    }

    #[test]
    fn formats_sub_second_as_zero() {
        assert_eq!(format_hms(999), "00:00:00");
    }

    #[test]
    fn formats_minutes_and_hours() {
        assert_eq!(format_hms(61_000), "00:01:01");
        assert_eq!(format_hms(3_600_000), "01:00:00");
        assert_eq!(format_hms(86_399_000), "23:59:59");
    }
}
