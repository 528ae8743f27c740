use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::models::PregameTurn;

/// Weekday labels in bucket order (Monday first).
pub const WEEKDAY_LABELS: [&str; 7] = [
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
    "Domingo",
];

/// Current calendar day in the club's timezone.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Parse the date of a turn record. Accepts plain `YYYY-MM-DD` as well as
/// ISO datetimes; anything after the date part is ignored.
pub fn parse_turn_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Bucket index of a date, Monday = 0 .. Sunday = 6.
pub fn weekday_bucket(date: NaiveDate) -> usize {
    date.weekday().num_days_from_monday() as usize
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Every day from `from` to `to`, both inclusive. Empty when `from > to`.
pub fn days_inclusive(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days().take_while(|d| *d <= to).collect()
}

pub fn days_ago(today: NaiveDate, days: i64) -> NaiveDate {
    today - Duration::days(days)
}

/// Turns grouped by calendar day, days ascending, turns within a day ordered
/// by start time. Turns without a parseable date are dropped.
pub fn group_by_date(turns: &[PregameTurn]) -> BTreeMap<NaiveDate, Vec<&PregameTurn>> {
    let mut days: BTreeMap<NaiveDate, Vec<&PregameTurn>> = BTreeMap::new();
    for turn in turns {
        if let Some(day) = turn.day() {
            days.entry(day).or_default().push(turn);
        }
    }
    for list in days.values_mut() {
        list.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    }
    days
}
