use regex::Regex;
use std::sync::OnceLock;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

/// Turns human-readable age text into a unix timestamp, relative to `now`.
/// `None` means the text wasn't understood; callers pick their own fallback.
pub trait DateParser: Send + Sync {
    fn parse(&self, text: &str, now: OffsetDateTime) -> Option<i64>;
}

/// English relative ages as rendered by the listing ("3 hours ago", "an hour ago",
/// "yesterday"), plus RFC 3339 and `YYYY-MM-DD` absolute dates.
///
/// Months count as 30 days and years as 365.
#[derive(Clone, Copy, Debug, Default)]
pub struct RelativeAgeParser;

fn relative_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+|an?|one)\s+(second|sec|minute|min|hour|day|week|month|year)s?\s+ago$")
            .expect("relative age regex")
    })
}

impl DateParser for RelativeAgeParser {
    fn parse(&self, text: &str, now: OffsetDateTime) -> Option<i64> {
        let s = text.trim().to_lowercase();
        match s.as_str() {
            "" => return None,
            "just now" | "now" | "today" => return Some(now.unix_timestamp()),
            "yesterday" => return Some((now - Duration::days(1)).unix_timestamp()),
            _ => {}
        }

        if let Some(caps) = relative_re().captures(&s) {
            let n: i64 = match &caps[1] {
                "a" | "an" | "one" => 1,
                digits => digits.parse().ok()?,
            };
            let unit = match &caps[2] {
                "second" | "sec" => Duration::seconds(1),
                "minute" | "min" => Duration::minutes(1),
                "hour" => Duration::hours(1),
                "day" => Duration::days(1),
                "week" => Duration::weeks(1),
                "month" => Duration::days(30),
                "year" => Duration::days(365),
                _ => return None,
            };
            let delta = unit.checked_mul(i32::try_from(n).ok()?)?;
            return now.checked_sub(delta).map(|t| t.unix_timestamp());
        }

        if let Ok(t) = OffsetDateTime::parse(text.trim(), &Rfc3339) {
            return Some(t.unix_timestamp());
        }
        if let Ok(d) = Date::parse(text.trim(), format_description!("[year]-[month]-[day]")) {
            return Some(d.midnight().assume_utc().unix_timestamp());
        }
        None
    }
}
