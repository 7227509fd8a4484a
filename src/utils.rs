//! Small display helpers

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Render a byte count with decimal (1000-based) units, e.g. `1.5 KB`
pub fn bytes_human_readable(bytes: u64) -> String {
    if bytes < 1000 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    // 999.96 would round to "1000.0"; show it as the next unit instead
    if (value * 10.0).round() >= 10_000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    let rendered = format!("{:.1}", value);
    let rendered = rendered.strip_suffix(".0").unwrap_or(&rendered);
    format!("{} {}", rendered, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_human_readable() {
        assert_eq!(bytes_human_readable(0), "0 B");
        assert_eq!(bytes_human_readable(17), "17 B");
        assert_eq!(bytes_human_readable(999), "999 B");
        assert_eq!(bytes_human_readable(1000), "1 KB");
        assert_eq!(bytes_human_readable(1500), "1.5 KB");
        assert_eq!(bytes_human_readable(4_096), "4.1 KB");
        assert_eq!(bytes_human_readable(2_000_000), "2 MB");
        assert_eq!(bytes_human_readable(3_240_000_000), "3.2 GB");
        assert_eq!(bytes_human_readable(5_000_000_000_000_000), "5000 TB");
    }

    #[test]
    fn test_rounding_promotes_to_next_unit() {
        assert_eq!(bytes_human_readable(999_999), "1 MB");
        assert_eq!(bytes_human_readable(999_960_000), "1 GB");
        assert_eq!(bytes_human_readable(999_940), "999.9 KB");
    }
}
