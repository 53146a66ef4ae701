//! Five-field cron expression subset: minute, hour, day-of-month, month,
//! day-of-week. Supports `*`, literals, `A-B` ranges, comma lists, and
//! `*/step`. Day-of-week accepts 0-7 with both 0 and 7 meaning Sunday.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CronParseError {
    #[error("expected 5 fields, got {0}")]
    FieldCount(usize),

    #[error("invalid {field} field '{value}'")]
    Field { field: &'static str, value: String },
}

/// Allowed values for one cron field, as a bitmask over the field's range.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FieldSet(u64);

impl FieldSet {
    fn contains(&self, value: u32) -> bool {
        value < 64 && self.0 & (1 << value) != 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CronExpr {
    minute: FieldSet,
    hour: FieldSet,
    day_of_month: FieldSet,
    month: FieldSet,
    /// 0 = Sunday .. 6 = Saturday
    day_of_week: FieldSet,
}

impl CronExpr {
    pub fn parse(expr: &str) -> Result<CronExpr, CronParseError> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(CronParseError::FieldCount(fields.len()));
        }

        Ok(CronExpr {
            minute: parse_field(fields[0], 0, 59, "minute")?,
            hour: parse_field(fields[1], 0, 23, "hour")?,
            day_of_month: parse_field(fields[2], 1, 31, "day-of-month")?,
            month: parse_field(fields[3], 1, 12, "month")?,
            day_of_week: parse_dow_field(fields[4])?,
        })
    }

    /// True when `at`'s minute matches every field.
    pub fn matches(&self, at: DateTime<Utc>) -> bool {
        self.matches_date(at.date_naive())
            && self.hour.contains(at.hour())
            && self.minute.contains(at.minute())
    }

    fn matches_date(&self, date: NaiveDate) -> bool {
        self.month.contains(date.month())
            && self.day_of_month.contains(date.day())
            && self.day_of_week.contains(date.weekday().num_days_from_sunday())
    }

    /// The next matching minute strictly after `after`, scanning up to a year
    /// ahead. `None` means the expression never fires within that horizon.
    pub fn next_occurrence(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = minute_start(after) + Duration::minutes(1);

        for day_offset in 0..=366 {
            let date = start.date_naive() + Duration::days(day_offset);
            if !self.matches_date(date) {
                continue;
            }

            for hour in 0..24u32 {
                if !self.hour.contains(hour) {
                    continue;
                }
                for minute in 0..60u32 {
                    if !self.minute.contains(minute) {
                        continue;
                    }
                    let candidate = date.and_hms_opt(hour, minute, 0)?.and_utc();
                    if candidate >= start {
                        return Some(candidate);
                    }
                }
            }
        }

        None
    }
}

/// Truncate to the start of the minute.
pub fn minute_start(at: DateTime<Utc>) -> DateTime<Utc> {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

fn parse_field(
    raw: &str,
    min: u32,
    max: u32,
    name: &'static str,
) -> Result<FieldSet, CronParseError> {
    let err = || CronParseError::Field {
        field: name,
        value: raw.to_string(),
    };

    let mut mask: u64 = 0;
    for part in raw.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step.parse().map_err(|_| err())?;
                if step == 0 {
                    return Err(err());
                }
                (range, step)
            }
            None => (part, 1),
        };

        let (lo, hi) = if range == "*" {
            (min, max)
        } else if let Some((lo, hi)) = range.split_once('-') {
            (lo.parse().map_err(|_| err())?, hi.parse().map_err(|_| err())?)
        } else {
            let value: u32 = range.parse().map_err(|_| err())?;
            (value, value)
        };

        if lo < min || hi > max || lo > hi {
            return Err(err());
        }

        let mut value = lo;
        while value <= hi {
            mask |= 1 << value;
            value += step;
        }
    }

    if mask == 0 {
        return Err(err());
    }
    Ok(FieldSet(mask))
}

fn parse_dow_field(raw: &str) -> Result<FieldSet, CronParseError> {
    let parsed = parse_field(raw, 0, 7, "day-of-week")?;
    // Fold 7 (cron Sunday) onto 0
    let mut mask = parsed.0 & !(1 << 7);
    if parsed.0 & (1 << 7) != 0 {
        mask |= 1;
    }
    Ok(FieldSet(mask))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn weekday_morning_expression() {
        let cron = CronExpr::parse("0 8 * * 1-5").unwrap();
        // 2026-08-04 is a Tuesday
        assert!(cron.matches(at(2026, 8, 4, 8, 0)));
        assert!(!cron.matches(at(2026, 8, 4, 8, 1)));
        assert!(!cron.matches(at(2026, 8, 4, 9, 0)));
        // Saturday
        assert!(!cron.matches(at(2026, 8, 8, 8, 0)));
    }

    #[test]
    fn lists_steps_and_sunday_alias() {
        let cron = CronExpr::parse("*/15 9,17 * * 7").unwrap();
        // 2026-08-09 is a Sunday
        assert!(cron.matches(at(2026, 8, 9, 9, 45)));
        assert!(cron.matches(at(2026, 8, 9, 17, 0)));
        assert!(!cron.matches(at(2026, 8, 9, 9, 10)));
        // 0 also means Sunday
        let zero = CronExpr::parse("*/15 9,17 * * 0").unwrap();
        assert_eq!(cron, zero);
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!(CronExpr::parse("not-a-cron").is_err());
        assert!(CronExpr::parse("0 8 * *").is_err());
        assert!(CronExpr::parse("61 8 * * 1").is_err());
        assert!(CronExpr::parse("0 8 * * 9").is_err());
        assert!(CronExpr::parse("*/0 * * * *").is_err());
        assert!(CronExpr::parse("5-2 * * * *").is_err());
    }

    #[test]
    fn next_occurrence_skips_to_matching_day() {
        let cron = CronExpr::parse("0 8 * * 1-5").unwrap();
        // Friday 08:30 -> Monday 08:00
        let next = cron.next_occurrence(at(2026, 8, 7, 8, 30)).unwrap();
        assert_eq!(next, at(2026, 8, 10, 8, 0));
        // Exactly at a firing minute, next is the following weekday
        let next = cron.next_occurrence(at(2026, 8, 4, 8, 0)).unwrap();
        assert_eq!(next, at(2026, 8, 5, 8, 0));
    }

    #[test]
    fn minute_start_truncates_seconds() {
        let now = Utc.with_ymd_and_hms(2026, 8, 4, 8, 0, 42).unwrap();
        assert_eq!(minute_start(now), at(2026, 8, 4, 8, 0));
    }
}
