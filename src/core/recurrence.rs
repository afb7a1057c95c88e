use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Repeat rule for a task's due date.
///
/// - `interval`: every N days/weeks/months/years (0 is treated as 1)
/// - `days_of_week`: 0-6 for Sunday-Saturday, weekly rules only
/// - `day_of_month`: 1-31, monthly rules only; clamped to the month's length
/// - `end_date`: no occurrence is produced after this instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl RecurrencePattern {
    pub fn every(frequency: Frequency, interval: u32) -> Self {
        Self {
            frequency,
            interval,
            days_of_week: None,
            day_of_month: None,
            end_date: None,
        }
    }

    fn step(&self) -> u32 {
        self.interval.max(1)
    }

    /// Next due instant after `due`, keeping its time of day. `None` once the
    /// rule has ended or the next date falls outside the calendar range.
    pub fn next_due(&self, due: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let date = due.date_naive();
        let next_date = match self.frequency {
            Frequency::Daily => date.checked_add_days(Days::new(u64::from(self.step())))?,
            Frequency::Weekly => self.next_weekly(date)?,
            Frequency::Monthly => {
                let shifted = add_months(date, self.step())?;
                match self.day_of_month {
                    Some(day) => with_day_clamped(shifted, day),
                    None => shifted,
                }
            }
            Frequency::Yearly => add_months(date, self.step().checked_mul(12)?)?,
        };

        let next = next_date.and_time(due.time()).and_utc();
        match self.end_date {
            Some(end) if next > end => None,
            _ => Some(next),
        }
    }

    fn next_weekly(&self, date: NaiveDate) -> Option<NaiveDate> {
        let mut days: Vec<u32> = self
            .days_of_week
            .iter()
            .flatten()
            .filter(|d| **d < 7)
            .map(|d| *d as u32)
            .collect();
        days.sort_unstable();
        days.dedup();

        let weeks = u64::from(self.step());
        let Some(&first) = days.first() else {
            return date.checked_add_days(Days::new(weeks * 7));
        };

        let weekday = date.weekday().num_days_from_sunday();
        if let Some(&later) = days.iter().find(|d| **d > weekday) {
            return date.checked_add_days(Days::new(u64::from(later - weekday)));
        }
        // Wrap to the first listed day of the next active week.
        let to_next_week = u64::from(7 - weekday + first);
        date.checked_add_days(Days::new(to_next_week + (weeks - 1) * 7))
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.frequency {
            Frequency::Daily => "day",
            Frequency::Weekly => "week",
            Frequency::Monthly => "month",
            Frequency::Yearly => "year",
        };
        match self.step() {
            1 => write!(f, "every {}", unit),
            n => write!(f, "every {} {}s", n, unit),
        }
    }
}

fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let total_months = date.month0().checked_add(months)?;
    let new_year = date.year().checked_add(i32::try_from(total_months / 12).ok()?)?;
    let new_month = (total_months % 12) + 1;
    let new_day = date.day().min(days_in_month(new_year, new_month));
    NaiveDate::from_ymd_opt(new_year, new_month, new_day)
}

fn with_day_clamped(date: NaiveDate, day: u32) -> NaiveDate {
    let day = day.clamp(1, days_in_month(date.year(), date.month()));
    date.with_day(day).unwrap_or(date)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}
