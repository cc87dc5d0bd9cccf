//! 时间显示格式

/// 把毫秒格式化为 `mm:ss`，满一小时后为 `hh:mm:ss`
pub fn format_time(milliseconds: u64) -> String {
    let total_secs = milliseconds / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(999), "00:00");
        assert_eq!(format_time(65_000), "01:05");
        assert_eq!(format_time(3_599_999), "59:59");
        assert_eq!(format_time(3_600_000), "01:00:00");
        assert_eq!(format_time(3_661_000), "01:01:01");
        assert_eq!(format_time(90_000_000), "25:00:00");
    }
}
