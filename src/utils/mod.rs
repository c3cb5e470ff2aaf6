//! Common utilities and helpers

pub mod logging;

use std::time::Duration;

/// Utility functions for VidClip
pub struct Utils;

impl Utils {
    /// Format duration for display
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{:02}:{:02}", minutes, seconds)
        }
    }

    /// Format file size for display
    pub fn format_file_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Speed factor rounded to two decimals without trailing zeros: `1.5`, `2`, `0.25`
    pub fn format_speed_factor(speed: f64) -> String {
        let fixed = format!("{:.2}", speed);
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(Utils::format_duration(Duration::from_secs(75)), "01:15");
        assert_eq!(Utils::format_duration(Duration::from_secs(3725)), "01:02:05");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(Utils::format_file_size(512), "512 B");
        assert_eq!(Utils::format_file_size(1536), "1.50 KB");
        assert_eq!(Utils::format_file_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_format_speed_factor() {
        assert_eq!(Utils::format_speed_factor(1.5), "1.5");
        assert_eq!(Utils::format_speed_factor(2.0), "2");
        assert_eq!(Utils::format_speed_factor(0.25), "0.25");
        assert_eq!(Utils::format_speed_factor(1.0 / 3.0), "0.33");
    }
}
