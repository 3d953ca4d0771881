//! Natural-language schedule parser
//!
//! The input is split into a note and a schedule clause, then scanned by four
//! independent axis matchers in fixed precedence order:
//!
//! 1. relative duration (`in 20m`, `in 2 hours`) - determines the instant on
//!    its own; later axes are still stripped from the note but not applied
//! 2. explicit date - ISO (`2025-12-15`) or day + month name (`15 dec`,
//!    `3 sept 2026`); a month-date without a year that already passed rolls
//!    forward one year
//! 3. relative day token (`tomorrow`, `tmrw`, `tmr`)
//! 4. time of day (`17:00`, `9:30pm`, `5pm`) - combines with axis 2 or 3
//!
//! A date without a time defaults to 09:00 and flags the result; a bare time
//! that already passed today rolls to tomorrow. Whatever text survives token
//! stripping becomes the note.
//!
//! Note separation uses the last comma in the input: if non-empty text
//! follows it, that text is the schedule clause and everything before is the
//! note verbatim. Notes that themselves contain commas ahead of the time
//! clause can therefore lose their tail; the test suite pins this behavior.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Accept bare m/h/d duration units
//! - 1.0.0: Initial axis-matcher implementation

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Default hour applied when a date is given without a time of day.
const DEFAULT_HOUR: u32 = 9;

/// A fully resolved schedule clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    /// Absolute instant in the configured zone. Always after the anchor.
    pub due_at: DateTime<Tz>,
    /// What to say when the schedule fires.
    pub note: String,
    /// True when the 09:00 default supplied the time of day.
    pub time_was_defaulted: bool,
}

/// Why a schedule clause could not be resolved. Messages are user-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("I need a time - try `in 15m`, `in 2 hours`, or `at 14:30`.")]
    NoTimeFound,
    #[error("I couldn't parse that date.")]
    UnparsableDate,
    #[error("That time doesn't look right.")]
    UnparsableTime,
    #[error("Tell me what to remind you about after the time.")]
    EmptyNote,
    #[error("That time already passed - give me something in the future.")]
    InThePast,
}

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bin\s*(\d+)\s*(minutes?|mins?|m|hours?|hrs?|h|days?|d)\b")
            .expect("hard-coded pattern")
    })
}

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:on\s+)?(\d{4})-(\d{2})-(\d{2})\b").expect("hard-coded pattern")
    })
}

fn month_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:on\s+)?(\d{1,2})(?:st|nd|rd|th)?(?:\s|[-/])?(jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)\b(?:\s*(\d{4}))?",
        )
        .expect("hard-coded pattern")
    })
}

fn tomorrow_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:tomorrow|tmrw|tmr)\b").expect("hard-coded pattern"))
}

fn clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:\bat\b\s*)?(\d{1,2}):(\d{2})(\s*[ap]m)?\b").expect("hard-coded pattern")
    })
}

fn bare_hour_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:\bat\b\s*)?(\d{1,2})(\s*[ap]m)\b").expect("hard-coded pattern")
    })
}

fn month_number(token: &str) -> Option<u32> {
    let key = if token == "sept" { "sep" } else { &token[..token.len().min(3)] };
    match key {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

/// Collapse whitespace, drop a leading "to ", and trim trailing punctuation.
fn sanitize_note(text: &str) -> String {
    static SPACES: OnceLock<Regex> = OnceLock::new();
    let spaces = SPACES.get_or_init(|| Regex::new(r"\s{2,}").expect("hard-coded pattern"));

    let collapsed = spaces.replace_all(text, " ");
    let trimmed = collapsed.trim();
    let without_lead = trimmed
        .strip_prefix("to ")
        .or_else(|| trimmed.strip_prefix("To "))
        .unwrap_or(trimmed);
    without_lead
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | ';' | ':' | '-'))
        .to_string()
}

/// Midnight-anchored date in the zone, or `UnparsableDate` for impossible
/// calendar dates (and local times erased by a zone transition).
fn local_date(zone: Tz, year: i32, month: u32, day: u32) -> Result<DateTime<Tz>, ParseError> {
    zone.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .ok_or(ParseError::UnparsableDate)
}

/// Same wall-clock time on the next calendar day.
fn next_day(instant: DateTime<Tz>) -> Result<DateTime<Tz>, ParseError> {
    let shifted = instant.naive_local() + Duration::days(1);
    instant
        .timezone()
        .from_local_datetime(&shifted)
        .earliest()
        .ok_or(ParseError::UnparsableDate)
}

fn at_clock(instant: DateTime<Tz>, hour: u32, minute: u32) -> Option<DateTime<Tz>> {
    instant
        .with_hour(hour)
        .and_then(|t| t.with_minute(minute))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
}

/// Resolve a free-text schedule clause against a fixed "now" anchor.
///
/// Pure: all arithmetic happens in the zone carried by `now`, and nothing is
/// read from the environment.
pub fn parse_schedule(input: &str, now: DateTime<Tz>) -> Result<Schedule, ParseError> {
    let zone = now.timezone();
    let trimmed = input.trim();

    // Note/schedule split on the last comma, when text follows it.
    let (note_portion, schedule_portion, note_separated) = match trimmed.rfind(',') {
        Some(index) => {
            let before = trimmed[..index].trim();
            let after = trimmed[index + 1..].trim();
            if after.is_empty() {
                (trimmed, trimmed, false)
            } else {
                (before, after, true)
            }
        }
        None => (trimmed, trimmed, false),
    };

    let mut working = schedule_portion.to_string();
    let mut scheduled: Option<DateTime<Tz>> = None;
    let mut defaulted_time = false;

    // Axis 1: relative duration.
    let mut duration_locked = false;
    if let Some(caps) = duration_re().captures(&working) {
        let whole = caps[0].to_string();
        let amount: i64 = caps[1].parse().map_err(|_| ParseError::UnparsableTime)?;
        let span = match caps[2]
            .chars()
            .next()
            .map(|c| c.to_ascii_lowercase())
        {
            Some('m') => Duration::minutes(amount),
            Some('h') => Duration::hours(amount),
            Some('d') => Duration::days(amount),
            _ => return Err(ParseError::UnparsableTime),
        };
        scheduled = Some(
            now.checked_add_signed(span)
                .ok_or(ParseError::UnparsableTime)?,
        );
        duration_locked = true;
        working = working.replacen(&whole, "", 1);
    }

    // Axis 2: explicit calendar date, ISO form first.
    let mut explicit_date: Option<DateTime<Tz>> = None;
    if let Some(caps) = iso_date_re().captures(&working) {
        let whole = caps[0].to_string();
        let year: i32 = caps[1].parse().map_err(|_| ParseError::UnparsableDate)?;
        let month: u32 = caps[2].parse().map_err(|_| ParseError::UnparsableDate)?;
        let day: u32 = caps[3].parse().map_err(|_| ParseError::UnparsableDate)?;
        explicit_date = Some(local_date(zone, year, month, day)?);
        working = working.replacen(&whole, "", 1);
    }

    if explicit_date.is_none() {
        if let Some(caps) = month_date_re().captures(&working) {
            let whole = caps[0].to_string();
            let day: u32 = caps[1].parse().map_err(|_| ParseError::UnparsableDate)?;
            let month = month_number(&caps[2].to_ascii_lowercase())
                .ok_or(ParseError::UnparsableDate)?;
            if day == 0 || day > 31 {
                return Err(ParseError::UnparsableDate);
            }

            let explicit_year: Option<i32> = match caps.get(3) {
                Some(m) => Some(m.as_str().parse().map_err(|_| ParseError::UnparsableDate)?),
                None => None,
            };
            let year = explicit_year.unwrap_or_else(|| now.year());

            let mut candidate = local_date(zone, year, month, day)?;
            if explicit_year.is_none() && candidate.date_naive() < now.date_naive() {
                candidate = local_date(zone, year + 1, month, day)?;
            }

            explicit_date = Some(candidate);
            working = working.replacen(&whole, "", 1);
        }
    }

    // Axis 3: relative day token.
    let mut tomorrow = false;
    if let Some(matched) = tomorrow_re().find(&working) {
        let whole = matched.as_str().to_string();
        tomorrow = true;
        working = working.replacen(&whole, "", 1);
    }

    // Axis 4: time of day. HH:MM takes precedence over a bare hour, which
    // requires an am/pm suffix and always means minute zero.
    let clock = clock_re()
        .captures(&working)
        .map(|caps| {
            (
                caps[0].to_string(),
                caps[1].to_string(),
                caps[2].to_string(),
                caps.get(3).map(|m| m.as_str().trim().to_ascii_lowercase()),
            )
        })
        .or_else(|| {
            bare_hour_re().captures(&working).map(|caps| {
                (
                    caps[0].to_string(),
                    caps[1].to_string(),
                    "0".to_string(),
                    caps.get(2).map(|m| m.as_str().trim().to_ascii_lowercase()),
                )
            })
        });

    if let Some((whole, hour_raw, minute_raw, suffix)) = clock {
        let mut hour: u32 = hour_raw.parse().map_err(|_| ParseError::UnparsableTime)?;
        let minute: u32 = minute_raw.parse().map_err(|_| ParseError::UnparsableTime)?;
        if hour > 23 || minute > 59 {
            return Err(ParseError::UnparsableTime);
        }

        if let Some(suffix) = suffix.as_deref() {
            if hour == 12 {
                hour = if suffix == "am" { 0 } else { 12 };
            } else if suffix == "pm" {
                hour += 12;
            }
        }

        if !duration_locked {
            let base = explicit_date.unwrap_or(now);
            let mut at = at_clock(base, hour, minute).ok_or(ParseError::UnparsableTime)?;

            if explicit_date.is_none() {
                if tomorrow {
                    at = next_day(at)?;
                } else if at <= now {
                    at = next_day(at)?;
                }
            } else if tomorrow {
                at = next_day(at)?;
            }

            scheduled = Some(at);
        }
        working = working.replacen(&whole, "", 1);
    }

    // Date or day token without a time falls back to the default hour.
    if scheduled.is_none() {
        if let Some(date) = explicit_date {
            scheduled =
                Some(at_clock(date, DEFAULT_HOUR, 0).ok_or(ParseError::UnparsableDate)?);
            defaulted_time = true;
        } else if tomorrow {
            let morning = at_clock(now, DEFAULT_HOUR, 0).ok_or(ParseError::UnparsableDate)?;
            scheduled = Some(next_day(morning)?);
            defaulted_time = true;
        }
    }

    let due_at = scheduled.ok_or(ParseError::NoTimeFound)?;

    let note = if note_separated {
        sanitize_note(note_portion)
    } else {
        sanitize_note(&working)
    };
    if note.is_empty() {
        return Err(ParseError::EmptyNote);
    }

    if due_at <= now {
        return Err(ParseError::InThePast);
    }

    Ok(Schedule {
        due_at,
        note,
        time_was_defaulted: defaulted_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Kolkata;

    fn anchor() -> DateTime<Tz> {
        Kolkata.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
    }

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        Kolkata.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_relative_duration_minutes() {
        let parsed = parse_schedule("ship release in 20m", anchor()).unwrap();
        assert_eq!(parsed.due_at, local(2025, 1, 1, 10, 20));
        assert_eq!(parsed.note, "ship release");
        assert!(!parsed.time_was_defaulted);
    }

    #[test]
    fn test_relative_duration_units() {
        let hours = parse_schedule("stretch in 2 hours", anchor()).unwrap();
        assert_eq!(hours.due_at, local(2025, 1, 1, 12, 0));

        let days = parse_schedule("rotate keys in 3 days", anchor()).unwrap();
        assert_eq!(days.due_at, local(2025, 1, 4, 10, 0));

        let minutes = parse_schedule("check oven in 45 minutes", anchor()).unwrap();
        assert_eq!(minutes.due_at, local(2025, 1, 1, 10, 45));
    }

    #[test]
    fn test_duration_wins_over_other_axes() {
        // Duration alone fixes the instant; the time token is only stripped.
        let parsed = parse_schedule("call mom in 10 minutes at 17:00", anchor()).unwrap();
        assert_eq!(parsed.due_at, local(2025, 1, 1, 10, 10));
        assert_eq!(parsed.note, "call mom");
    }

    #[test]
    fn test_clock_same_day() {
        let at = Kolkata.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let parsed = parse_schedule("prep release notes at 17:00", at).unwrap();
        assert_eq!(parsed.due_at, local(2025, 1, 1, 17, 0));
        assert!(!parsed.time_was_defaulted);
    }

    #[test]
    fn test_passed_clock_rolls_to_tomorrow() {
        let parsed = parse_schedule("morning stretch at 9:00", anchor()).unwrap();
        assert_eq!(parsed.due_at, local(2025, 1, 2, 9, 0));
    }

    #[test]
    fn test_bare_hour_needs_suffix_and_zeroes_minutes() {
        let parsed = parse_schedule("standup 5pm", anchor()).unwrap();
        assert_eq!(parsed.due_at, local(2025, 1, 1, 17, 0));
        assert_eq!(parsed.due_at.minute(), 0);

        // A bare hour without am/pm is not a time at all.
        assert_eq!(
            parse_schedule("standup at 5", anchor()),
            Err(ParseError::NoTimeFound)
        );
    }

    #[test]
    fn test_twelve_hour_edge_cases() {
        let noon = parse_schedule("lunch 12pm", anchor()).unwrap();
        assert_eq!(noon.due_at, local(2025, 1, 1, 12, 0));

        let midnight = parse_schedule("backup 12am", anchor()).unwrap();
        // 00:00 already passed at the 10:00 anchor, so it rolls a day.
        assert_eq!(midnight.due_at, local(2025, 1, 2, 0, 0));
    }

    #[test]
    fn test_tomorrow_always_adds_a_day() {
        // The tomorrow token is literal: it adds a day whether or not the
        // given time has already passed today.
        let parsed = parse_schedule("ship it tmrw 8am", anchor()).unwrap();
        assert_eq!(parsed.due_at, local(2025, 1, 2, 8, 0));

        let late = parse_schedule("ship it tomorrow 23:00", anchor()).unwrap();
        assert_eq!(late.due_at, local(2025, 1, 2, 23, 0));
    }

    #[test]
    fn test_tomorrow_without_time_defaults() {
        let parsed = parse_schedule("water the plants tomorrow", anchor()).unwrap();
        assert_eq!(parsed.due_at, local(2025, 1, 2, 9, 0));
        assert!(parsed.time_was_defaulted);
    }

    #[test]
    fn test_iso_date_defaults_time() {
        let parsed = parse_schedule("update roadmap on 2025-12-15", anchor()).unwrap();
        assert_eq!(parsed.due_at, local(2025, 12, 15, 9, 0));
        assert_eq!(parsed.note, "update roadmap");
        assert!(parsed.time_was_defaulted);
    }

    #[test]
    fn test_iso_date_with_clock() {
        let parsed = parse_schedule("demo on 2025-12-15 at 16:30", anchor()).unwrap();
        assert_eq!(parsed.due_at, local(2025, 12, 15, 16, 30));
        assert!(!parsed.time_was_defaulted);
    }

    #[test]
    fn test_month_name_date() {
        let parsed = parse_schedule("pay rent on 15 dec", anchor()).unwrap();
        assert_eq!(parsed.due_at, local(2025, 12, 15, 9, 0));
        assert!(parsed.time_was_defaulted);
    }

    #[test]
    fn test_month_name_sept_alias() {
        let parsed = parse_schedule("renew cert on 3 sept", anchor()).unwrap();
        assert_eq!(parsed.due_at, local(2025, 9, 3, 9, 0));
    }

    #[test]
    fn test_past_month_date_rolls_to_next_year() {
        let december = Kolkata.with_ymd_and_hms(2025, 12, 20, 10, 0, 0).unwrap();
        let parsed = parse_schedule("plan offsite on 15 dec", december).unwrap();
        assert_eq!(parsed.due_at, local(2026, 12, 15, 9, 0));
    }

    #[test]
    fn test_explicit_year_never_rolls() {
        assert_eq!(
            parse_schedule("review on 1 jan 2024", anchor()),
            Err(ParseError::InThePast)
        );
    }

    #[test]
    fn test_comma_separates_note_from_schedule() {
        let parsed = parse_schedule("prepare the deck, tomorrow 9am", anchor()).unwrap();
        assert_eq!(parsed.note, "prepare the deck");
        assert_eq!(parsed.due_at, local(2025, 1, 2, 9, 0));
    }

    #[test]
    fn test_comma_heuristic_limitation_with_embedded_commas() {
        // Known limitation: the split happens at the LAST comma, so a note
        // that itself contains commas before the time clause loses its tail.
        let parsed = parse_schedule("buy eggs, milk at 5pm", anchor()).unwrap();
        assert_eq!(parsed.note, "buy eggs");
        assert_eq!(parsed.due_at, local(2025, 1, 1, 17, 0));
    }

    #[test]
    fn test_leading_to_is_stripped_from_note() {
        let parsed = parse_schedule("to water plants in 1 hour", anchor()).unwrap();
        assert_eq!(parsed.note, "water plants");
    }

    #[test]
    fn test_empty_note_rejected() {
        assert_eq!(
            parse_schedule("in 5 minutes", anchor()),
            Err(ParseError::EmptyNote)
        );
        assert_eq!(
            parse_schedule("  , tomorrow", anchor()),
            Err(ParseError::EmptyNote)
        );
    }

    #[test]
    fn test_no_time_found() {
        assert_eq!(
            parse_schedule("water the plants", anchor()),
            Err(ParseError::NoTimeFound)
        );
    }

    #[test]
    fn test_invalid_clock_rejected() {
        assert_eq!(
            parse_schedule("ping at 99:99", anchor()),
            Err(ParseError::UnparsableTime)
        );
        assert_eq!(
            parse_schedule("ping at 13pm", anchor()),
            Err(ParseError::UnparsableTime)
        );
        assert_eq!(
            parse_schedule("ping at 10:75", anchor()),
            Err(ParseError::UnparsableTime)
        );
    }

    #[test]
    fn test_invalid_calendar_date_rejected() {
        assert_eq!(
            parse_schedule("audit on 2025-02-31", anchor()),
            Err(ParseError::UnparsableDate)
        );
    }

    #[test]
    fn test_past_instant_rejected() {
        // 09:00 default on today's date is already behind the 10:00 anchor.
        assert_eq!(
            parse_schedule("review notes on 2025-01-01", anchor()),
            Err(ParseError::InThePast)
        );
    }
}
