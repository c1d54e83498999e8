//! Display formatting helpers.

use chrono::{DateTime, Utc};
use num_format::{Locale, ToFormattedString};

use marketfeed_core::constants::CURRENCY_PREFIX;

/// Units used by [`time_ago`], largest first, in seconds.
const TIME_UNITS: [(&str, i64); 7] = [
    ("year", 31_536_000),
    ("month", 2_592_000),
    ("week", 604_800),
    ("day", 86_400),
    ("hour", 3_600),
    ("minute", 60),
    ("second", 1),
];

/// Describes how long before `now` the instant `then` was, e.g. "3 hours ago".
///
/// Uses the largest unit with a whole count of at least one, rounding down.
/// Anything under a second, or in the future, is "Just now".
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();

    TIME_UNITS
        .iter()
        .find_map(|&(unit, unit_secs)| {
            let count = seconds / unit_secs;
            (count >= 1).then(|| {
                let plural = if count == 1 { "" } else { "s" };
                format!("{count} {unit}{plural} ago")
            })
        })
        .unwrap_or_else(|| "Just now".to_string())
}

/// Formats `value` with comma thousands separators: `1250000` -> `"1,250,000"`.
pub fn format_thousands(value: u64) -> String {
    value.to_formatted_string(&Locale::en)
}

/// Formats an amount in the marketplace currency: `"R$ 1,250,000"`.
pub fn format_currency(amount: u64) -> String {
    format!("{CURRENCY_PREFIX} {}", format_thousands(amount))
}

/// Arrow and magnitude of a price change: `"↑ 5.2%"` or `"↓ 2.1%"`.
///
/// Only strictly positive changes get the up arrow.
pub fn price_change_label(percent: f64) -> String {
    let arrow = if percent > 0.0 { '↑' } else { '↓' };
    format!("{arrow} {}%", percent.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use test_case::test_case;

    #[test_case(0, "Just now")]
    #[test_case(1, "1 second ago")]
    #[test_case(45, "45 seconds ago")]
    #[test_case(90, "1 minute ago")]
    #[test_case(120, "2 minutes ago")]
    #[test_case(3_600, "1 hour ago")]
    #[test_case(86_400 * 2, "2 days ago")]
    #[test_case(604_800, "1 week ago")]
    #[test_case(2_592_000 * 3, "3 months ago")]
    #[test_case(31_536_000, "1 year ago")]
    #[test_case(-30, "Just now" ; "future instant")]
    fn test_time_ago(seconds_before: i64, expected: &str) {
        let now = Utc::now();
        let then = now - Duration::seconds(seconds_before);
        assert_eq!(time_ago(then, now), expected);
    }

    #[test]
    fn test_time_ago_ignores_sub_second() {
        let now = Utc::now();
        assert_eq!(time_ago(now - Duration::milliseconds(999), now), "Just now");
    }

    #[test_case(0, "0")]
    #[test_case(999, "999")]
    #[test_case(1_000, "1,000")]
    #[test_case(65_000, "65,000")]
    #[test_case(1_250_000, "1,250,000")]
    #[test_case(u64::MAX, "18,446,744,073,709,551,615" ; "max")]
    fn test_format_thousands(value: u64, expected: &str) {
        assert_eq!(format_thousands(value), expected);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1_250_000), "R$ 1,250,000");
        assert_eq!(format_currency(0), "R$ 0");
    }

    #[test_case(5.2, "↑ 5.2%")]
    #[test_case(-2.1, "↓ 2.1%")]
    #[test_case(0.0, "↓ 0%" ; "flat counts as down")]
    fn test_price_change_label(percent: f64, expected: &str) {
        assert_eq!(price_change_label(percent), expected);
    }
}
