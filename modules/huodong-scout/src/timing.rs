//! Relative progress text → absolute timestamps.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, TimeDelta, Timelike, Utc};
use regex::Regex;
use tracing::warn;

use crate::types::Status;

/// Crawl times are reported in UTC+8.
pub const CRAWL_OFFSET_SECS: i32 = 8 * 3600;

static RE_DAYS_HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)天(\d+)小时").expect("valid regex"));
static RE_DAYS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)天").expect("valid regex"));
static RE_HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)小时").expect("valid regex"));

pub fn crawl_offset() -> FixedOffset {
    FixedOffset::east_opt(CRAWL_OFFSET_SECS).expect("UTC+8 is a valid offset")
}

/// `now` in UTC+8 with minutes, seconds and sub-seconds cleared.
pub fn crawl_time_at(now: DateTime<Utc>) -> DateTime<FixedOffset> {
    let local = now.with_timezone(&crawl_offset());
    local
        .with_nanosecond(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_minute(0))
        .unwrap_or(local)
}

pub fn crawl_time_now() -> DateTime<FixedOffset> {
    crawl_time_at(Utc::now())
}

/// Parse progress text such as `21天后结束`, `5天后开始`, `已结束3天` or
/// `还剩下2天5小时` into a signed whole-hour delta. Negative when the status
/// text says the activity has ended. `None` when no time was found or the
/// numbers do not fit.
pub fn parse_time_delta(progress: &str, status: &str) -> Option<TimeDelta> {
    let total_hours = match total_hours(progress) {
        Ok(hours) => hours,
        Err(reason) => {
            warn!(progress, reason, "Could not parse progress time");
            return None;
        }
    };
    if total_hours == 0 {
        return None;
    }

    let signed = if status.contains(Status::ENDED_MARKER) {
        -total_hours
    } else {
        total_hours
    };

    let delta = TimeDelta::try_hours(signed);
    if delta.is_none() {
        warn!(progress, hours = signed, "Progress time out of range");
    }
    delta
}

fn total_hours(progress: &str) -> Result<i64, &'static str> {
    let (days, hours) = if let Some(caps) = RE_DAYS_HOURS.captures(progress) {
        (parse_number(&caps[1])?, parse_number(&caps[2])?)
    } else {
        let days = match RE_DAYS.captures(progress) {
            Some(caps) => parse_number(&caps[1])?,
            None => 0,
        };
        let hours = match RE_HOURS.captures(progress) {
            Some(caps) => parse_number(&caps[1])?,
            None => 0,
        };
        (days, hours)
    };

    days.checked_mul(24)
        .and_then(|h| h.checked_add(hours))
        .ok_or("hour total overflows")
}

/// `\d` matches any Unicode decimal digit; ASCII and full-width forms
/// (U+FF10..=U+FF19) are folded to their values.
fn parse_number(digits: &str) -> Result<i64, &'static str> {
    digits.chars().try_fold(0i64, |acc, c| {
        let digit = digit_value(c).ok_or("unsupported digit")?;
        acc.checked_mul(10)
            .and_then(|n| n.checked_add(i64::from(digit)))
            .ok_or("number too large")
    })
}

fn digit_value(c: char) -> Option<u32> {
    match c {
        '０'..='９' => Some(c as u32 - '０' as u32),
        _ => c.to_digit(10),
    }
}

/// Start and end time for an activity given its status and resolved delta.
/// Upcoming activities get a start time, ongoing and ended ones an end time.
pub fn resolve_times(
    crawl_time: DateTime<FixedOffset>,
    status: Status,
    delta: Option<TimeDelta>,
) -> (Option<DateTime<FixedOffset>>, Option<DateTime<FixedOffset>>) {
    let Some(at) = delta.and_then(|d| crawl_time.checked_add_signed(d)) else {
        return (None, None);
    };
    match status {
        Status::Upcoming => (Some(at), None),
        Status::Ongoing | Status::Ended => (None, Some(at)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    #[test]
    fn days_until_end() {
        assert_eq!(parse_time_delta("21天后结束", "进行中"), Some(TimeDelta::days(21)));
    }

    #[test]
    fn days_and_hours_combined() {
        assert_eq!(
            parse_time_delta("还剩下2天5小时", "进行中"),
            Some(TimeDelta::hours(53))
        );
    }

    #[test]
    fn hours_only() {
        assert_eq!(parse_time_delta("7小时后开始", "未开始"), Some(TimeDelta::hours(7)));
    }

    #[test]
    fn ended_flips_sign() {
        assert_eq!(parse_time_delta("已结束3天", "已结束"), Some(TimeDelta::days(-3)));
    }

    #[test]
    fn no_number_is_none() {
        assert_eq!(parse_time_delta("活动说明", "进行中"), None);
        assert_eq!(parse_time_delta("", "进行中"), None);
    }

    #[test]
    fn full_width_digits_resolve() {
        assert_eq!(parse_time_delta("２１天后结束", "进行中"), Some(TimeDelta::days(21)));
        assert_eq!(
            parse_time_delta("还剩下２天５小时", "进行中"),
            Some(TimeDelta::hours(53))
        );
        assert_eq!(parse_time_delta("已结束３天", "已结束"), Some(TimeDelta::days(-3)));
    }

    #[test]
    fn explicit_zero_is_none() {
        assert_eq!(parse_time_delta("0天0小时", "进行中"), None);
    }

    #[test]
    fn oversized_numbers_are_none() {
        assert_eq!(parse_time_delta("99999999999999999999天后结束", "进行中"), None);
        assert_eq!(parse_time_delta("999999999999999999天后结束", "进行中"), None);
    }

    #[test]
    fn crawl_time_truncates_to_hour_in_utc8() {
        let now = DateTime::parse_from_rfc3339("2024-01-01T17:42:13.5Z")
            .unwrap()
            .with_timezone(&Utc);
        let crawl = crawl_time_at(now);
        assert_eq!(crawl, at("2024-01-02T01:00:00+08:00"));
        assert_eq!(crawl.offset().local_minus_utc(), CRAWL_OFFSET_SECS);
        assert_eq!(crawl.to_rfc3339(), "2024-01-02T01:00:00+08:00");
    }

    #[test]
    fn ongoing_resolves_end_time() {
        let crawl = at("2024-01-01T00:00:00+08:00");
        let delta = parse_time_delta("21天后结束", "进行中");
        let (start, end) = resolve_times(crawl, Status::Ongoing, delta);
        assert_eq!(start, None);
        assert_eq!(end, Some(at("2024-01-22T00:00:00+08:00")));
    }

    #[test]
    fn ended_resolves_end_time_in_the_past() {
        let crawl = at("2024-01-01T00:00:00+08:00");
        let delta = parse_time_delta("已结束3天", "已结束");
        let (start, end) = resolve_times(crawl, Status::Ended, delta);
        assert_eq!(start, None);
        assert_eq!(end, Some(at("2023-12-29T00:00:00+08:00")));
    }

    #[test]
    fn upcoming_resolves_start_time() {
        let crawl = at("2024-01-01T00:00:00+08:00");
        let delta = parse_time_delta("5天后开始", "未开始");
        let (start, end) = resolve_times(crawl, Status::Upcoming, delta);
        assert_eq!(start, Some(at("2024-01-06T00:00:00+08:00")));
        assert_eq!(end, None);
    }

    #[test]
    fn missing_delta_leaves_both_absent() {
        let crawl = at("2024-01-01T00:00:00+08:00");
        assert_eq!(resolve_times(crawl, Status::Ongoing, None), (None, None));
        assert_eq!(resolve_times(crawl, Status::Upcoming, None), (None, None));
    }
}
