//! Display helpers shared by the frontends

use chrono::Duration;

use crate::api::Time;

/// `999`, `1.2K`, `3.4M`, `5B`
///
/// Rounds down, so that a count never looks bigger than it is.
pub fn compact_count(n: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_000_000_000, "B"), (1_000_000, "M"), (1_000, "K")];
    for (size, suffix) in UNITS {
        if n >= size {
            let tenths = n / (size / 10);
            return match tenths % 10 {
                0 => format!("{}{suffix}", tenths / 10),
                d => format!("{}.{d}{suffix}", tenths / 10),
            };
        }
    }
    n.to_string()
}

/// Age of `t` as seen at `now`, eg. `5m` or `Mar 4` when older than a week
pub fn relative_time(t: Time, now: Time) -> String {
    let age = now - t;
    if age < Duration::minutes(1) {
        // includes dates slightly in the future, from clock skew
        String::from("just now")
    } else if age < Duration::hours(1) {
        format!("{}m", age.num_minutes())
    } else if age < Duration::days(1) {
        format!("{}h", age.num_hours())
    } else if age < Duration::weeks(1) {
        format!("{}d", age.num_days())
    } else {
        t.format("%b %-d").to_string()
    }
}

/// Remaining lifetime of a nook, eg. `2h 15m left`
pub fn time_left(expires_at: Time, now: Time) -> String {
    let left = expires_at - now;
    if left <= Duration::zero() {
        return String::from("Expired");
    }
    let hours = left.num_hours();
    let minutes = left.num_minutes() % 60;
    match hours {
        0 if minutes == 0 => String::from("<1m left"),
        0 => format!("{minutes}m left"),
        h => format!("{h}h {minutes}m left"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn counts() {
        assert_eq!(compact_count(0), "0");
        assert_eq!(compact_count(999), "999");
        assert_eq!(compact_count(1000), "1K");
        assert_eq!(compact_count(1250), "1.2K");
        assert_eq!(compact_count(999_999), "999.9K");
        assert_eq!(compact_count(3_400_000), "3.4M");
        assert_eq!(compact_count(5_000_000_000), "5B");
    }

    #[test]
    fn relative() {
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        assert_eq!(relative_time(now, now), "just now");
        assert_eq!(relative_time(now + Duration::seconds(5), now), "just now");
        assert_eq!(relative_time(now - Duration::minutes(5), now), "5m");
        assert_eq!(relative_time(now - Duration::minutes(200), now), "3h");
        assert_eq!(relative_time(now - Duration::hours(50), now), "2d");
        assert_eq!(
            relative_time(Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap(), now),
            "Mar 4"
        );
    }

    #[test]
    fn remaining() {
        let now = Utc::now();
        assert_eq!(time_left(now + Duration::minutes(135), now), "2h 15m left");
        assert_eq!(time_left(now + Duration::minutes(45), now), "45m left");
        assert_eq!(time_left(now + Duration::seconds(20), now), "<1m left");
        assert_eq!(time_left(now, now), "Expired");
        assert_eq!(time_left(now - Duration::hours(1), now), "Expired");
    }
}
