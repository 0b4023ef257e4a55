use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use time::{OffsetDateTime, UtcOffset};
use time::macros::format_description;

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_owned();
    }

    let mut value = bytes as f64;
    let mut unit = 0usize;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    // 1023.999 KB would print as "1024.00 KB".
    if unit > 0 && unit < UNITS.len() - 1 && (value * 100.0).round() >= 1024.0 * 100.0 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// Resolves the local UTC offset. `time` refuses to do this once other threads exist,
/// so call it at startup before anything is spawned.
pub fn capture_local_offset() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
}

/// Local wall-clock time as `HH:MM:SS`, in UTC if the offset was never captured.
pub fn wall_clock() -> String {
    let offset = LOCAL_OFFSET.get().copied().unwrap_or(UtcOffset::UTC);
    clock_at(OffsetDateTime::now_utc().to_offset(offset))
}

fn clock_at(moment: OffsetDateTime) -> String {
    moment
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default()
}

pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_bytes_boundaries() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1), "1 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.00 GB");
    }

    #[test]
    fn test_format_bytes_rounding_moves_to_next_unit() {
        assert_eq!(format_bytes(1024 * 1024 - 1), "1.00 MB");
        assert_eq!(format_bytes(1024 * 1024 - 6000), "1018.14 KB");
        assert_eq!(format_bytes(1024 * 1024 * 1024 - 1), "1.00 GB");
    }

    #[test]
    fn test_format_bytes_caps_at_largest_unit() {
        let huge = 2048u64 * 1024 * 1024 * 1024 * 1024;
        assert_eq!(format_bytes(huge), "2048.00 TB");
    }

    #[test]
    fn test_format_count_groups_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_wall_clock_shape() {
        let clock = wall_clock();
        assert_eq!(clock.len(), 8);
        assert_eq!(clock.matches(':').count(), 2);
    }

    #[test]
    fn test_clock_uses_the_given_offset() {
        let moment = OffsetDateTime::from_unix_timestamp(3_600 * 5 + 61).unwrap();
        assert_eq!(clock_at(moment), "05:01:01");

        let plus_two = UtcOffset::from_hms(2, 0, 0).unwrap();
        assert_eq!(clock_at(moment.to_offset(plus_two)), "07:01:01");
    }

    #[test]
    fn test_captured_offset_is_stable() {
        assert_eq!(capture_local_offset(), capture_local_offset());
    }

    #[test]
    fn test_stable_pair_is_deterministic() {
        assert_eq!(stable_pair("router"), stable_pair("router"));
        let (x, y) = stable_pair("client10");
        assert!((-1.0..=1.0).contains(&x));
        assert!((-1.0..=1.0).contains(&y));
    }

    proptest! {
        #[test]
        fn prop_small_values_use_base_unit(bytes in 1u64..1024) {
            prop_assert_eq!(format_bytes(bytes), format!("{bytes} B"));
        }

        #[test]
        fn prop_larger_values_have_two_decimals(bytes in 1024u64..u64::MAX / 2) {
            let formatted = format_bytes(bytes);
            let (number, unit) = formatted.split_once(' ').unwrap();
            prop_assert_ne!(unit, "B");
            let (_, decimals) = number.split_once('.').unwrap();
            prop_assert_eq!(decimals.len(), 2);
            if unit != "TB" {
                prop_assert!(number.parse::<f64>().unwrap() < 1024.0);
            }
        }
    }
}
