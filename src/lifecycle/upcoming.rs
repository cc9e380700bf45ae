//! "What's next" prediction from the live status header.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDateTime};
use tracing::debug;

use crate::config::Schedule;
use crate::events::rules::Rule;

/// A minutes countdown inside the status header, e.g. "45 minutes.".
static HEADER_MINUTES: LazyLock<Rule> =
    LazyLock::new(|| Rule::new(r"(?i)(\d+) ?min(?:ute)?s?\.?"));

static HOURS: LazyLock<Rule> = LazyLock::new(|| Rule::new(r"(\d+) (hour|hr)"));
static MINUTES: LazyLock<Rule> = LazyLock::new(|| Rule::new(r"(\d+) (minute|min|mn)"));
static SECONDS: LazyLock<Rule> = LazyLock::new(|| Rule::new(r"(\d+) (second)"));

const CASTLE_EVENT: &str = "Battle for Minewind";

/// Hour and minute parts of a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub hours: i64,
    pub minutes: i64,
}

impl Countdown {
    pub fn from_minutes(total: i64) -> Self {
        Self {
            hours: total / 60,
            minutes: total % 60,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hours > 0 && self.minutes > 0 {
            write!(f, "{} hr and {} min", self.hours, self.minutes)
        } else if self.hours > 0 {
            write!(f, "{} hr", self.hours)
        } else {
            write!(f, "{} min", self.minutes)
        }
    }
}

/// Predictor output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upcoming {
    /// The header carries a countdown.
    Countdown { event_name: String, time_string: String },
    /// A non-empty header with no countdown in it, shown as-is.
    Status { text: String },
    /// No header; guess the last event repeats after the next reset.
    ResetGuess { last_title: String, time_string: String },
    Unknown,
}

impl Upcoming {
    /// Text sent to the game chat.
    pub fn display(&self) -> String {
        match self {
            Self::Countdown { event_name, time_string } => format!("{} {}", event_name, time_string),
            Self::Status { text } => text.clone(),
            Self::ResetGuess { last_title, time_string } => format!(
                "Most Recent Event was {}. Potential repeat after reset ({}).",
                last_title, time_string
            ),
            Self::Unknown => "Unable to determine upcoming event".to_string(),
        }
    }

    pub fn event_name(&self) -> Option<&str> {
        match self {
            Self::Countdown { event_name, .. } => Some(event_name),
            Self::ResetGuess { last_title, .. } => Some(last_title),
            Self::Status { .. } | Self::Unknown => None,
        }
    }

    pub fn time_string(&self) -> Option<&str> {
        match self {
            Self::Countdown { time_string, .. } | Self::ResetGuess { time_string, .. } => {
                Some(time_string)
            }
            Self::Status { .. } | Self::Unknown => None,
        }
    }
}

/// Predict the next event from the status header and the last started event.
pub fn predict(header: &str, last_title: Option<&str>, now: NaiveDateTime, schedule: &Schedule) -> Upcoming {
    let header = header.trim();
    let last_title = last_title.filter(|t| !t.is_empty());

    if !header.is_empty() {
        let Some(caps) = HEADER_MINUTES.captures(header) else {
            return Upcoming::Status {
                text: header.to_string(),
            };
        };
        let (Some(phrase), Some(total)) = (caps.get(0), caps.get(1)) else {
            return Upcoming::Status {
                text: header.to_string(),
            };
        };
        let Ok(total) = total.as_str().parse::<i64>() else {
            return Upcoming::Status {
                text: header.to_string(),
            };
        };

        let mut event_name = format!("{}{}", &header[..phrase.start()], &header[phrase.end()..])
            .trim()
            .to_string();
        if now.weekday() == schedule.castle_day && event_name.contains(CASTLE_EVENT) {
            if let Some(title) = last_title {
                event_name = event_name.replacen(CASTLE_EVENT, &format!("{} (+ {})", CASTLE_EVENT, title), 1);
            }
        }
        return Upcoming::Countdown {
            event_name,
            time_string: Countdown::from_minutes(total).to_string(),
        };
    }

    match last_title {
        Some(title) => Upcoming::ResetGuess {
            last_title: title.to_string(),
            time_string: until_next_reset(now, schedule).to_string(),
        },
        None => Upcoming::Unknown,
    }
}

/// Time from `now` to the next scheduled reset, rounded down to minutes.
pub fn until_next_reset(now: NaiveDateTime, schedule: &Schedule) -> Countdown {
    let today = now.date();
    let mut reset = today.and_time(schedule.reset_on(today.weekday()));
    if reset <= now {
        let tomorrow = today + Duration::days(1);
        reset = tomorrow.and_time(schedule.reset_on(tomorrow.weekday()));
    }
    Countdown::from_minutes((reset - now).num_minutes())
}

/// Absolute unix time of a free-form duration phrase from `now_unix`.
///
/// Hour, minute and second amounts are summed (first occurrence of each).
/// Returns `None` when no unit is recognized or the result overflows; a
/// zero duration resolves to `now_unix`.
pub fn time_string_to_unix(text: &str, now_unix: i64) -> Option<i64> {
    let mut matched = false;
    let mut delta = 0i64;
    for (rule, scale) in [(&*HOURS, 3600i64), (&*MINUTES, 60), (&*SECONDS, 1)] {
        if let Some(amount) = rule.capture(text, 1).and_then(|n| n.parse::<i64>().ok()) {
            matched = true;
            delta = amount.checked_mul(scale).and_then(|d| delta.checked_add(d))?;
        }
    }
    debug!("Converted '{}' to a delta of {}s", text, delta);
    if !matched {
        return None;
    }
    now_unix.checked_add(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScheduleConfig;
    use chrono::NaiveDate;

    fn schedule() -> Schedule {
        ScheduleConfig::default().resolve().unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    // 2024-06-12 is a Wednesday, 2024-06-15 a Saturday.
    fn weekday_noon() -> NaiveDateTime {
        at(2024, 6, 12, 12, 0)
    }

    #[test]
    fn test_countdown_formatting() {
        assert_eq!(Countdown { hours: 0, minutes: 5 }.to_string(), "5 min");
        assert_eq!(Countdown { hours: 2, minutes: 0 }.to_string(), "2 hr");
        assert_eq!(Countdown { hours: 1, minutes: 15 }.to_string(), "1 hr and 15 min");
        assert_eq!(Countdown::from_minutes(135).to_string(), "2 hr and 15 min");
    }

    #[test]
    fn test_header_countdown_is_stripped() {
        let upcoming = predict(
            "Battle for Minewind begins in 45 minutes.",
            None,
            weekday_noon(),
            &schedule(),
        );
        assert_eq!(
            upcoming,
            Upcoming::Countdown {
                event_name: "Battle for Minewind begins in".to_string(),
                time_string: "45 min".to_string(),
            }
        );
    }

    #[test]
    fn test_header_countdown_over_an_hour() {
        let upcoming = predict("Fox Hunt in 90 min", None, weekday_noon(), &schedule());
        assert_eq!(upcoming.event_name(), Some("Fox Hunt in"));
        assert_eq!(upcoming.time_string(), Some("1 hr and 30 min"));
    }

    #[test]
    fn test_castle_day_hint() {
        let saturday = at(2024, 6, 15, 12, 0);
        let upcoming = predict(
            "Battle for Minewind begins in 45 minutes.",
            Some("Beef"),
            saturday,
            &schedule(),
        );
        assert_eq!(upcoming.event_name(), Some("Battle for Minewind (+ Beef) begins in"));

        let wednesday = predict(
            "Battle for Minewind begins in 45 minutes.",
            Some("Beef"),
            weekday_noon(),
            &schedule(),
        );
        assert_eq!(wednesday.event_name(), Some("Battle for Minewind begins in"));
    }

    #[test]
    fn test_header_without_countdown_passes_through() {
        let upcoming = predict("Welcome to Minewind", Some("Beef"), weekday_noon(), &schedule());
        assert_eq!(upcoming.display(), "Welcome to Minewind");
        assert_eq!(upcoming.time_string(), None);
    }

    #[test]
    fn test_reset_guess_on_ordinary_day() {
        let upcoming = predict("", Some("Beef"), weekday_noon(), &schedule());
        assert_eq!(upcoming.time_string(), Some("5 hr and 30 min"));
        let display = upcoming.display();
        assert!(display.contains("Most Recent Event was Beef"));
        assert!(display.ends_with("Potential repeat after reset (5 hr and 30 min)."));
    }

    #[test]
    fn test_reset_guess_rolls_to_next_day() {
        // Friday 18:00 -> Saturday 19:00 castle reset
        let friday = at(2024, 6, 14, 18, 0);
        assert_eq!(until_next_reset(friday, &schedule()), Countdown { hours: 25, minutes: 0 });
        // Wednesday 18:00 -> Thursday 17:30
        let evening = at(2024, 6, 12, 18, 0);
        assert_eq!(until_next_reset(evening, &schedule()), Countdown { hours: 23, minutes: 30 });
    }

    #[test]
    fn test_reset_differs_on_castle_day() {
        let saturday = at(2024, 6, 15, 18, 0);
        assert_eq!(until_next_reset(saturday, &schedule()), Countdown { hours: 1, minutes: 0 });
    }

    #[test]
    fn test_unknown_without_header_or_title() {
        let upcoming = predict("", None, weekday_noon(), &schedule());
        assert_eq!(upcoming, Upcoming::Unknown);
        assert_eq!(upcoming.display(), "Unable to determine upcoming event");
        assert_eq!(predict("  ", Some(""), weekday_noon(), &schedule()), Upcoming::Unknown);
    }

    #[test]
    fn test_time_string_to_unix_sums_units() {
        let now = 1_000_000;
        assert_eq!(time_string_to_unix("1 hour", now), Some(now + 3600));
        assert_eq!(time_string_to_unix("1 hr and 15 min", now), Some(now + 4500));
        assert_eq!(time_string_to_unix("in 10 seconds", now), Some(now + 10));
        assert_eq!(time_string_to_unix("5 mn", now), Some(now + 300));
    }

    #[test]
    fn test_time_string_difference() {
        let now = 1_000_000;
        let long = time_string_to_unix("1 hour 30 minutes", now).unwrap();
        let short = time_string_to_unix("30 minutes", now).unwrap();
        assert_eq!(long - short, 3600);
    }

    #[test]
    fn test_zero_duration_is_not_unparseable() {
        assert_eq!(time_string_to_unix("0 minutes", 50), Some(50));
        assert_eq!(time_string_to_unix("soon", 50), None);
        assert_eq!(time_string_to_unix("", 50), None);
    }

    #[test]
    fn test_oversized_duration_is_unparseable() {
        assert_eq!(time_string_to_unix("999999999999999999 minutes", 0), None);
        assert_eq!(time_string_to_unix("10 seconds", i64::MAX), None);
    }
}
